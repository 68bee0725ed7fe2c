//! JavaScript value representation
//!
//! The core `JsValue` type, property keys and descriptors, and the heap-resident
//! `JsObject` cell together with its exotic variants.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::completion::ThrowCompletionOr;
use crate::gc::{Gc, Guard, Reset, Traceable};
use crate::interpreter::Interpreter;
use crate::interpreter::builtins::array_from_async::FromAsyncTask;

/// Trait for types that have cheap (O(1), reference-counted) clones.
///
/// Makes it explicit at the call site that a clone only bumps a reference
/// count (`JsString`) or copies a handle (`Gc`).
pub trait CheapClone: Clone {
    fn cheap_clone(&self) -> Self {
        self.clone()
    }
}

impl<T: ?Sized> CheapClone for Rc<T> {}
impl<T> CheapClone for Gc<T> {}

/// Largest integer representable without loss (2^53 - 1)
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Largest array length (2^32 - 1)
pub const MAX_ARRAY_LENGTH: u64 = u32::MAX as u64;

/// A JavaScript value
#[derive(Clone, Default)]
pub enum JsValue {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Symbol(JsSymbol),
    Object(JsObjectRef),
}

impl CheapClone for JsValue {}

impl JsValue {
    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    /// Check if this value is null or undefined
    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, JsValue::Null | JsValue::Undefined)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    pub fn as_object(&self) -> Option<JsObjectRef> {
        match self {
            JsValue::Object(obj) => Some(*obj),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            JsValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&JsString> {
        match self {
            JsValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Convert to boolean (ToBoolean)
    pub fn to_boolean(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
            JsValue::String(s) => !s.is_empty(),
            JsValue::Symbol(_) | JsValue::Object(_) => true,
        }
    }

    /// Strict equality (===)
    pub fn strict_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            // NaN !== NaN, +0 === -0
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Symbol(a), JsValue::Symbol(b)) => a == b,
            (JsValue::Object(a), JsValue::Object(b)) => Gc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{}", b),
            JsValue::Number(n) => write!(f, "{}", n),
            JsValue::String(s) => write!(f, "\"{}\"", s.as_str()),
            JsValue::Symbol(s) => write!(f, "{}", s),
            JsValue::Object(obj) => write!(f, "[object #{}]", obj.id()),
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::Number(n)
    }
}

impl From<i32> for JsValue {
    fn from(n: i32) -> Self {
        JsValue::Number(n as f64)
    }
}

impl From<u32> for JsValue {
    fn from(n: u32) -> Self {
        JsValue::Number(n as f64)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<JsString> for JsValue {
    fn from(s: JsString) -> Self {
        JsValue::String(s)
    }
}

impl From<JsObjectRef> for JsValue {
    fn from(obj: JsObjectRef) -> Self {
        JsValue::Object(obj)
    }
}

/// Reference-counted string
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct JsString(Rc<str>);

impl CheapClone for JsString {}

impl JsString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl AsRef<str> for JsString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for JsString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString(s.into())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString(s.into())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// JavaScript Symbol primitive, compared by id
#[derive(Clone, Debug)]
pub struct JsSymbol {
    id: u64,
    pub description: Option<JsString>,
}

impl JsSymbol {
    pub fn new(id: u64, description: Option<JsString>) -> Self {
        Self { id, description }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl PartialEq for JsSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for JsSymbol {}

impl std::hash::Hash for JsSymbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for JsSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(desc) => write!(f, "Symbol({})", desc),
            None => write!(f, "Symbol()"),
        }
    }
}

/// Property key (string, array index, or symbol).
///
/// Canonical array indices (`0 ..= 2^32 - 2`) are always stored as `Index`, so
/// `"1"` and `1` name the same property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(JsString),
    Index(u32),
    Symbol(JsSymbol),
}

impl PropertyKey {
    /// Key for an integer index that may exceed the array-index range
    pub fn from_u64(index: u64) -> Self {
        if index < u32::MAX as u64 {
            PropertyKey::Index(index as u32)
        } else {
            PropertyKey::String(JsString::from(index.to_string()))
        }
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, PropertyKey::Symbol(_))
    }

    pub fn as_index(&self) -> Option<u32> {
        match self {
            PropertyKey::Index(i) => Some(*i),
            _ => None,
        }
    }

    /// Check if this key equals a string literal (avoids allocation)
    #[inline]
    pub fn eq_str(&self, s: &str) -> bool {
        match self {
            PropertyKey::String(js_str) => js_str.as_str() == s,
            PropertyKey::Index(_) | PropertyKey::Symbol(_) => false,
        }
    }

    /// The key as a value (strings for indices, as `Reflect.ownKeys` reports them)
    pub fn to_value(&self) -> JsValue {
        match self {
            PropertyKey::String(s) => JsValue::String(s.cheap_clone()),
            PropertyKey::Index(i) => JsValue::String(JsString::from(i.to_string())),
            PropertyKey::Symbol(s) => JsValue::Symbol(s.clone()),
        }
    }
}

fn canonical_index(s: &str) -> Option<u32> {
    let first = s.bytes().next()?;
    if !first.is_ascii_digit() || (first == b'0' && s.len() > 1) {
        return None;
    }
    s.parse::<u32>().ok().filter(|&idx| idx != u32::MAX)
}

impl From<&str> for PropertyKey {
    #[inline]
    fn from(s: &str) -> Self {
        match canonical_index(s) {
            Some(idx) => PropertyKey::Index(idx),
            None => PropertyKey::String(JsString::from(s)),
        }
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::from(s.as_str())
    }
}

impl From<JsString> for PropertyKey {
    #[inline]
    fn from(s: JsString) -> Self {
        match canonical_index(s.as_str()) {
            Some(idx) => PropertyKey::Index(idx),
            None => PropertyKey::String(s),
        }
    }
}

impl From<u32> for PropertyKey {
    fn from(idx: u32) -> Self {
        PropertyKey::from_u64(idx as u64)
    }
}

impl From<JsSymbol> for PropertyKey {
    fn from(sym: JsSymbol) -> Self {
        PropertyKey::Symbol(sym)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{}", s),
            PropertyKey::Index(i) => write!(f, "{}", i),
            PropertyKey::Symbol(s) => write!(f, "{}", s),
        }
    }
}

/// Data or accessor half of a property
#[derive(Debug, Clone)]
pub enum PropertyKind {
    Data { value: JsValue, writable: bool },
    Accessor {
        get: Option<JsObjectRef>,
        set: Option<JsObjectRef>,
    },
}

/// A fully populated own property
#[derive(Debug, Clone)]
pub struct Property {
    pub kind: PropertyKind,
    pub enumerable: bool,
    pub configurable: bool,
}

impl Property {
    /// Writable, enumerable, configurable data property
    pub fn data(value: JsValue) -> Self {
        Self::with_attributes(value, true, true, true)
    }

    /// Writable, non-enumerable, configurable: the shape of builtin methods
    pub fn method(value: JsValue) -> Self {
        Self::with_attributes(value, true, false, true)
    }

    pub fn with_attributes(
        value: JsValue,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Self {
            kind: PropertyKind::Data { value, writable },
            enumerable,
            configurable,
        }
    }

    pub fn accessor(
        get: Option<JsObjectRef>,
        set: Option<JsObjectRef>,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Self {
            kind: PropertyKind::Accessor { get, set },
            enumerable,
            configurable,
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self.kind, PropertyKind::Accessor { .. })
    }

    /// The stored value of a data property
    pub fn value(&self) -> Option<&JsValue> {
        match &self.kind {
            PropertyKind::Data { value, .. } => Some(value),
            PropertyKind::Accessor { .. } => None,
        }
    }

    pub fn writable(&self) -> bool {
        matches!(self.kind, PropertyKind::Data { writable: true, .. })
    }

    pub fn getter(&self) -> Option<JsObjectRef> {
        match self.kind {
            PropertyKind::Accessor { get, .. } => get,
            PropertyKind::Data { .. } => None,
        }
    }

    pub fn setter(&self) -> Option<JsObjectRef> {
        match self.kind {
            PropertyKind::Accessor { set, .. } => set,
            PropertyKind::Data { .. } => None,
        }
    }
}

/// A possibly partial descriptor, as passed to `[[DefineOwnProperty]]`.
///
/// `get`/`set` hold `Some(None)` for an explicit `undefined`.
#[derive(Debug, Clone, Default)]
pub struct PropertyDescriptor {
    pub value: Option<JsValue>,
    pub writable: Option<bool>,
    pub get: Option<Option<JsObjectRef>>,
    pub set: Option<Option<JsObjectRef>>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    /// `{ value, writable: true, enumerable: true, configurable: true }`
    pub fn data(value: JsValue) -> Self {
        Self {
            value: Some(value),
            writable: Some(true),
            enumerable: Some(true),
            configurable: Some(true),
            ..Default::default()
        }
    }

    /// `{ value }` alone
    pub fn value_only(value: JsValue) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn is_accessor_descriptor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    pub fn is_data_descriptor(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    pub fn is_generic_descriptor(&self) -> bool {
        !self.is_accessor_descriptor() && !self.is_data_descriptor()
    }

    /// Fill absent fields with defaults to produce a concrete property
    pub fn to_property(&self) -> Property {
        let enumerable = self.enumerable.unwrap_or(false);
        let configurable = self.configurable.unwrap_or(false);
        if self.is_accessor_descriptor() {
            Property::accessor(
                self.get.flatten(),
                self.set.flatten(),
                enumerable,
                configurable,
            )
        } else {
            Property::with_attributes(
                self.value.clone().unwrap_or_default(),
                self.writable.unwrap_or(false),
                enumerable,
                configurable,
            )
        }
    }
}

impl From<&Property> for PropertyDescriptor {
    fn from(prop: &Property) -> Self {
        match &prop.kind {
            PropertyKind::Data { value, writable } => Self {
                value: Some(value.clone()),
                writable: Some(*writable),
                enumerable: Some(prop.enumerable),
                configurable: Some(prop.configurable),
                ..Default::default()
            },
            PropertyKind::Accessor { get, set } => Self {
                get: Some(*get),
                set: Some(*set),
                enumerable: Some(prop.enumerable),
                configurable: Some(prop.configurable),
                ..Default::default()
            },
        }
    }
}

/// Ordered own-property storage
pub type PropertyMap = IndexMap<PropertyKey, Property, FxBuildHasher>;

/// Reference to a heap-allocated object
pub type JsObjectRef = Gc<JsObject>;

/// A JavaScript object
#[derive(Debug)]
pub struct JsObject {
    /// Prototype link (lookup only; liveness comes from reachability)
    pub prototype: Option<JsObjectRef>,
    /// Whether the object can have properties added
    pub extensible: bool,
    /// Own properties in insertion order
    pub properties: PropertyMap,
    /// Exotic object behavior
    pub exotic: ExoticObject,
}

impl JsObject {
    pub fn new() -> Self {
        Self::with_prototype(None)
    }

    pub fn with_prototype(prototype: Option<JsObjectRef>) -> Self {
        Self {
            prototype,
            extensible: true,
            properties: PropertyMap::default(),
            exotic: ExoticObject::Ordinary,
        }
    }

    pub fn with_exotic(prototype: Option<JsObjectRef>, exotic: ExoticObject) -> Self {
        Self {
            exotic,
            ..Self::with_prototype(prototype)
        }
    }

    pub fn is_callable(&self) -> bool {
        match &self.exotic {
            ExoticObject::Function(_) => true,
            ExoticObject::Proxy(data) => data.callable,
            _ => false,
        }
    }

    pub fn is_constructor(&self) -> bool {
        match &self.exotic {
            ExoticObject::Function(func) => func.has_constructor(),
            ExoticObject::Proxy(data) => data.constructor,
            _ => false,
        }
    }

    /// Array exotic object (proxies are not; see `is_array`)
    pub fn is_array_exotic(&self) -> bool {
        matches!(self.exotic, ExoticObject::Array { .. })
    }

    pub fn array_length(&self) -> Option<u32> {
        match self.exotic {
            ExoticObject::Array { length, .. } => Some(length),
            _ => None,
        }
    }

    /// Insert or replace an own property without any validation (bootstrap use)
    pub fn define_property(&mut self, key: PropertyKey, prop: Property) {
        self.properties.insert(key, prop);
    }

    pub fn get_own_property(&self, key: &PropertyKey) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn has_own_property(&self, key: &PropertyKey) -> bool {
        self.properties.contains_key(key)
    }

    pub fn function(&self) -> Option<&JsFunction> {
        match &self.exotic {
            ExoticObject::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn function_mut(&mut self) -> Option<&mut JsFunction> {
        match &mut self.exotic {
            ExoticObject::Function(func) => Some(func),
            _ => None,
        }
    }
}

impl Default for JsObject {
    fn default() -> Self {
        Self::new()
    }
}

impl Reset for JsObject {
    fn reset(&mut self) {
        self.prototype = None;
        self.extensible = true;
        self.properties.clear();
        self.exotic = ExoticObject::Ordinary;
    }
}

pub(crate) fn trace_value<F: FnMut(JsObjectRef)>(value: &JsValue, visitor: &mut F) {
    if let JsValue::Object(obj) = value {
        visitor(*obj);
    }
}

impl Traceable for JsObject {
    fn trace<F: FnMut(Gc<Self>)>(&self, mut visitor: F) {
        if let Some(proto) = self.prototype {
            visitor(proto);
        }
        for prop in self.properties.values() {
            match &prop.kind {
                PropertyKind::Data { value, .. } => trace_value(value, &mut visitor),
                PropertyKind::Accessor { get, set } => {
                    get.iter().chain(set.iter()).for_each(|f| visitor(*f));
                }
            }
        }
        match &self.exotic {
            ExoticObject::Ordinary | ExoticObject::Array { .. } | ExoticObject::Error => {}
            ExoticObject::Function(JsFunction::Native(native)) => {
                for slot in &native.slots {
                    trace_value(slot, &mut visitor);
                }
            }
            ExoticObject::Function(JsFunction::Host(host)) => {
                for slot in &host.slots {
                    trace_value(slot, &mut visitor);
                }
            }
            ExoticObject::Proxy(data) => {
                data.target.iter().chain(data.handler.iter()).for_each(|o| visitor(*o));
            }
            ExoticObject::Promise(state) => state.trace(&mut visitor),
            ExoticObject::PrimitiveWrapper(value) => trace_value(value, &mut visitor),
            ExoticObject::ArrayIterator(state) => {
                if let Some(iterated) = &state.iterated {
                    trace_value(iterated, &mut visitor);
                }
            }
            ExoticObject::StringIterator(_) => {}
            ExoticObject::AsyncFromTask(task) => task.trace(&mut visitor),
        }
    }
}

/// Exotic object behavior
#[derive(Debug)]
pub enum ExoticObject {
    Ordinary,
    /// Array exotic object; `length` is a virtual own property
    Array { length: u32, length_writable: bool },
    Function(JsFunction),
    Proxy(ProxyData),
    Promise(PromiseState),
    /// Carries `[[ErrorData]]`
    Error,
    /// String/Number/Boolean/Symbol wrapper produced by ToObject
    PrimitiveWrapper(JsValue),
    ArrayIterator(ArrayIteratorState),
    StringIterator(StringIteratorState),
    /// Suspended `Array.fromAsync` continuation
    AsyncFromTask(Box<FromAsyncTask>),
}

// =============================================================================
// Functions
// =============================================================================

/// Builtin call behaviour: `(interp, this, args)`
pub type NativeFn = fn(&mut Interpreter, JsValue, &[JsValue]) -> ThrowCompletionOr<JsValue>;

/// Builtin construct behaviour: `(interp, args, new_target)`
pub type NativeConstructFn =
    fn(&mut Interpreter, &[JsValue], JsObjectRef) -> ThrowCompletionOr<JsObjectRef>;

/// Host closure call behaviour
pub type HostCallFn = dyn Fn(&mut Interpreter, JsValue, &[JsValue]) -> ThrowCompletionOr<JsValue>;

/// Host closure construct behaviour
pub type HostConstructFn =
    dyn Fn(&mut Interpreter, &[JsValue], JsObjectRef) -> ThrowCompletionOr<JsObjectRef>;

/// A callable. Every function supports `call`; `construct` is a separate,
/// optional capability.
#[derive(Debug, Clone)]
pub enum JsFunction {
    Native(NativeFunction),
    Host(HostFunction),
}

impl JsFunction {
    pub fn name(&self) -> &JsString {
        match self {
            JsFunction::Native(f) => &f.name,
            JsFunction::Host(f) => &f.name,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            JsFunction::Native(f) => f.arity,
            JsFunction::Host(f) => f.arity,
        }
    }

    pub fn has_constructor(&self) -> bool {
        match self {
            JsFunction::Native(f) => f.construct.is_some(),
            JsFunction::Host(f) => f.construct.is_some(),
        }
    }
}

/// Builtin function. `slots` hold internal state (captured values of
/// resolving functions, continuations) and are traced.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: JsString,
    pub arity: usize,
    pub func: NativeFn,
    pub construct: Option<NativeConstructFn>,
    pub slots: Vec<JsValue>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("constructor", &self.construct.is_some())
            .finish()
    }
}

/// Function backed by a host closure.
///
/// The closure's own captures are not traced. Heap values it needs go in
/// `slots`, which are traced like [`NativeFunction::slots`] and read back
/// with `Interpreter::active_slot`.
#[derive(Clone)]
pub struct HostFunction {
    pub name: JsString,
    pub arity: usize,
    pub call: Rc<HostCallFn>,
    pub construct: Option<Rc<HostConstructFn>>,
    pub slots: Vec<JsValue>,
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("constructor", &self.construct.is_some())
            .finish()
    }
}

// =============================================================================
// Proxy
// =============================================================================

/// `[[ProxyTarget]]` / `[[ProxyHandler]]`; both `None` once revoked
#[derive(Debug, Clone)]
pub struct ProxyData {
    pub target: Option<JsObjectRef>,
    pub handler: Option<JsObjectRef>,
    pub callable: bool,
    pub constructor: bool,
}

// =============================================================================
// Promise
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseStatus {
    Pending,
    Fulfilled,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Fulfill,
    Reject,
}

#[derive(Debug, Clone)]
pub struct PromiseCapability {
    pub promise: JsObjectRef,
    pub resolve: JsObjectRef,
    pub reject: JsObjectRef,
}

impl PromiseCapability {
    pub(crate) fn trace<F: FnMut(JsObjectRef)>(&self, visitor: &mut F) {
        visitor(self.promise);
        visitor(self.resolve);
        visitor(self.reject);
    }
}

/// A pending `then` registration. Without a capability the handler is an
/// internal continuation whose result is discarded.
#[derive(Debug, Clone)]
pub struct PromiseReaction {
    pub capability: Option<PromiseCapability>,
    pub kind: ReactionKind,
    pub handler: Option<JsObjectRef>,
}

impl PromiseReaction {
    pub(crate) fn trace<F: FnMut(JsObjectRef)>(&self, visitor: &mut F) {
        if let Some(cap) = &self.capability {
            cap.trace(visitor);
        }
        if let Some(handler) = self.handler {
            visitor(handler);
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromiseState {
    pub status: PromiseStatus,
    pub result: JsValue,
    pub fulfill_reactions: Vec<PromiseReaction>,
    pub reject_reactions: Vec<PromiseReaction>,
    pub is_handled: bool,
}

impl PromiseState {
    pub fn pending() -> Self {
        Self {
            status: PromiseStatus::Pending,
            result: JsValue::Undefined,
            fulfill_reactions: Vec::new(),
            reject_reactions: Vec::new(),
            is_handled: false,
        }
    }

    fn trace<F: FnMut(JsObjectRef)>(&self, visitor: &mut F) {
        trace_value(&self.result, visitor);
        for reaction in self.fulfill_reactions.iter().chain(&self.reject_reactions) {
            reaction.trace(visitor);
        }
    }
}

// =============================================================================
// Iterators
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationKind {
    Keys,
    Values,
    Entries,
}

/// `%ArrayIteratorPrototype%` instance state; `iterated` is cleared when done
#[derive(Debug, Clone)]
pub struct ArrayIteratorState {
    pub iterated: Option<JsValue>,
    pub next_index: u64,
    pub kind: IterationKind,
}

/// `%StringIteratorPrototype%` instance state (byte position into the string)
#[derive(Debug, Clone)]
pub struct StringIteratorState {
    pub string: Option<JsString>,
    pub position: usize,
}

impl Guard<JsObject> {
    /// Root a value if it holds an object
    pub fn guard_value(&self, value: &JsValue) {
        if let JsValue::Object(obj) = value {
            self.guard(*obj);
        }
    }
}
