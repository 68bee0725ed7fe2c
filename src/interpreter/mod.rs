//! The interpreter: heap, realm, dispatch and job scheduling
//!
//! `Interpreter` is the context every native operation receives. It owns the
//! object heap and the realm, implements the call/construct dispatch protocol,
//! and drives the microtask queue that `Array.fromAsync` and promises schedule
//! their continuations on.

pub mod builtins;
pub mod conversions;
pub mod iteration;
pub mod jobs;
pub mod json_bridge;
pub mod object_ops;

use std::rc::Rc;

use crate::completion::{Completion, ThrowCompletionOr};
use crate::error::JsError;
use crate::gc::{DEFAULT_GC_THRESHOLD, GcStats, Guard, Heap};
use crate::realm::Realm;
use crate::value::{
    CheapClone, ExoticObject, HostFunction, JsFunction, JsObject, JsObjectRef, JsString, JsSymbol,
    JsValue, NativeConstructFn, NativeFn, NativeFunction, Property, PropertyKey,
};

use jobs::{Job, JobQueue, MicrotaskQueue};

/// Maximum nesting of call/construct before a RangeError is raised
pub const MAX_CALL_DEPTH: usize = 512;

/// Sparse arrays longer than this are refused by `value_to_json`
pub const DEFAULT_MAX_JSON_ARRAY_LENGTH: u64 = 1 << 24;

/// Runtime knobs
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Net allocations between threshold collections (0 disables them)
    pub gc_threshold: usize,
    /// Jobs run per `run_jobs` checkpoint (0 = until the queue is empty)
    pub max_jobs_per_checkpoint: usize,
    /// Longest array `value_to_json` will expand
    pub max_json_array_length: u64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            gc_threshold: DEFAULT_GC_THRESHOLD,
            max_jobs_per_checkpoint: 0,
            max_json_array_length: DEFAULT_MAX_JSON_ARRAY_LENGTH,
        }
    }
}

/// Well-known symbols shared by the realm
#[derive(Debug, Clone)]
pub struct WellKnownSymbols {
    pub iterator: JsSymbol,
    pub async_iterator: JsSymbol,
    pub species: JsSymbol,
    pub to_primitive: JsSymbol,
    pub to_string_tag: JsSymbol,
}

impl WellKnownSymbols {
    fn new(next_id: &mut u64) -> Self {
        let mut make = |name: &str| {
            *next_id += 1;
            JsSymbol::new(*next_id, Some(JsString::from(name)))
        };
        Self {
            iterator: make("Symbol.iterator"),
            async_iterator: make("Symbol.asyncIterator"),
            species: make("Symbol.species"),
            to_primitive: make("Symbol.toPrimitive"),
            to_string_tag: make("Symbol.toStringTag"),
        }
    }
}

/// The runtime context
pub struct Interpreter {
    /// Object heap
    pub heap: Heap<JsObject>,
    /// Intrinsics and global object
    pub realm: Realm,
    pub symbols: WellKnownSymbols,
    next_symbol_id: u64,
    jobs: Box<dyn JobQueue>,
    /// Functions currently executing, innermost last
    execution_stack: Vec<JsObjectRef>,
    config: InterpreterConfig,
}

impl Interpreter {
    /// Create an interpreter with a fully initialized realm
    pub fn new() -> ThrowCompletionOr<Self> {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> ThrowCompletionOr<Self> {
        let mut heap = Heap::new();
        heap.set_gc_threshold(config.gc_threshold);
        let realm = Realm::new(&mut heap);
        let mut next_symbol_id = 0;
        let symbols = WellKnownSymbols::new(&mut next_symbol_id);

        let mut interp = Self {
            heap,
            realm,
            symbols,
            next_symbol_id,
            jobs: Box::new(MicrotaskQueue::default()),
            execution_stack: Vec::new(),
            config,
        };
        builtins::initialize_realm(&mut interp)?;
        log::debug!(
            "interpreter ready: {} objects after bootstrap",
            interp.heap.stats().live_objects
        );
        Ok(interp)
    }

    /// Replace the job queue (hosts with their own event loop). Jobs already
    /// pending move to the new queue in order.
    pub fn set_job_queue(&mut self, mut queue: Box<dyn JobQueue>) {
        while let Some(job) = self.jobs.dequeue() {
            queue.enqueue(job);
        }
        self.jobs = queue;
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    // =========================================================================
    // Heap access
    // =========================================================================

    /// Borrow a live object
    pub fn object(&self, obj: JsObjectRef) -> ThrowCompletionOr<&JsObject> {
        self.heap.get(obj).ok_or_else(|| stale_handle(obj))
    }

    /// Mutably borrow a live object
    pub fn object_mut(&mut self, obj: JsObjectRef) -> ThrowCompletionOr<&mut JsObject> {
        self.heap.get_mut(obj).ok_or_else(|| stale_handle(obj))
    }

    /// Create a guard for values the host holds across safe points
    pub fn create_guard(&self) -> Guard<JsObject> {
        self.heap.create_guard()
    }

    /// Allocate an ordinary object inheriting from `%Object.prototype%`
    pub fn create_object(&mut self) -> JsObjectRef {
        let proto = self.realm.intrinsics.object_prototype;
        self.heap.alloc(JsObject::with_prototype(Some(proto)))
    }

    pub fn create_object_with_proto(&mut self, proto: Option<JsObjectRef>) -> JsObjectRef {
        self.heap.alloc(JsObject::with_prototype(proto))
    }

    /// CreateArrayFromList
    pub fn create_array_from(&mut self, values: Vec<JsValue>) -> JsObjectRef {
        let length = u32::try_from(values.len()).unwrap_or(u32::MAX);
        let mut array = JsObject::with_exotic(
            Some(self.realm.intrinsics.array_prototype),
            ExoticObject::Array {
                length,
                length_writable: true,
            },
        );
        for (index, value) in (0..length).zip(values) {
            array.define_property(PropertyKey::Index(index), Property::data(value));
        }
        self.heap.alloc(array)
    }

    /// Create a fresh, unique symbol
    pub fn create_symbol(&mut self, description: Option<&str>) -> JsSymbol {
        self.next_symbol_id += 1;
        JsSymbol::new(self.next_symbol_id, description.map(JsString::from))
    }

    // =========================================================================
    // Function creation
    // =========================================================================

    fn create_function(&mut self, func: JsFunction) -> JsObjectRef {
        let name = func.name().cheap_clone();
        let arity = func.arity();
        let mut obj = JsObject::with_exotic(
            Some(self.realm.intrinsics.function_prototype),
            ExoticObject::Function(func),
        );
        install_function_metadata(&mut obj, name, arity);
        self.heap.alloc(obj)
    }

    /// Create a builtin function without a constructor capability
    pub fn create_native_function(&mut self, name: &str, func: NativeFn, arity: usize) -> JsObjectRef {
        self.create_native_closure(name, func, arity, Vec::new())
    }

    /// Create a builtin function carrying internal slots
    pub fn create_native_closure(
        &mut self,
        name: &str,
        func: NativeFn,
        arity: usize,
        slots: Vec<JsValue>,
    ) -> JsObjectRef {
        self.create_function(JsFunction::Native(NativeFunction {
            name: JsString::from(name),
            arity,
            func,
            construct: None,
            slots,
        }))
    }

    /// Create a builtin function with a constructor capability
    pub fn create_native_constructor(
        &mut self,
        name: &str,
        func: NativeFn,
        construct: NativeConstructFn,
        arity: usize,
    ) -> JsObjectRef {
        self.create_function(JsFunction::Native(NativeFunction {
            name: JsString::from(name),
            arity,
            func,
            construct: Some(construct),
            slots: Vec::new(),
        }))
    }

    /// Turn a pre-allocated intrinsic shell into a builtin constructor
    pub(crate) fn make_intrinsic_constructor(
        &mut self,
        shell: JsObjectRef,
        name: &str,
        func: NativeFn,
        construct: Option<NativeConstructFn>,
        arity: usize,
    ) -> ThrowCompletionOr<()> {
        let obj = self.object_mut(shell)?;
        obj.exotic = ExoticObject::Function(JsFunction::Native(NativeFunction {
            name: JsString::from(name),
            arity,
            func,
            construct,
            slots: Vec::new(),
        }));
        install_function_metadata(obj, JsString::from(name), arity);
        Ok(())
    }

    /// Create a callable backed by a host closure
    pub fn create_host_function<F>(&mut self, name: &str, arity: usize, call: F) -> JsObjectRef
    where
        F: Fn(&mut Interpreter, JsValue, &[JsValue]) -> ThrowCompletionOr<JsValue> + 'static,
    {
        self.create_host_function_with_slots(name, arity, Vec::new(), call)
    }

    /// Create a host closure whose heap state lives in traced slots.
    ///
    /// The closure reads them with [`Interpreter::active_slot`].
    pub fn create_host_function_with_slots<F>(
        &mut self,
        name: &str,
        arity: usize,
        slots: Vec<JsValue>,
        call: F,
    ) -> JsObjectRef
    where
        F: Fn(&mut Interpreter, JsValue, &[JsValue]) -> ThrowCompletionOr<JsValue> + 'static,
    {
        self.create_function(JsFunction::Host(HostFunction {
            name: JsString::from(name),
            arity,
            call: Rc::new(call),
            construct: None,
            slots,
        }))
    }

    /// Create a constructor backed by host closures.
    ///
    /// `construct` receives `(interp, args, new_target)` and returns the new object.
    pub fn create_host_constructor<F, C>(
        &mut self,
        name: &str,
        arity: usize,
        call: F,
        construct: C,
    ) -> JsObjectRef
    where
        F: Fn(&mut Interpreter, JsValue, &[JsValue]) -> ThrowCompletionOr<JsValue> + 'static,
        C: Fn(&mut Interpreter, &[JsValue], JsObjectRef) -> ThrowCompletionOr<JsObjectRef>
            + 'static,
    {
        let ctor = self.create_function(JsFunction::Host(HostFunction {
            name: JsString::from(name),
            arity,
            call: Rc::new(call),
            construct: Some(Rc::new(construct)),
            slots: Vec::new(),
        }));
        let proto = self.create_object();
        if let Some(obj) = self.heap.get_mut(ctor) {
            obj.define_property(
                PropertyKey::from("prototype"),
                Property::with_attributes(JsValue::Object(proto), true, false, false),
            );
        }
        if let Some(obj) = self.heap.get_mut(proto) {
            obj.define_property(
                PropertyKey::from("constructor"),
                Property::method(JsValue::Object(ctor)),
            );
        }
        ctor
    }

    /// Register a native method as a non-enumerable own property
    pub fn register_method(
        &mut self,
        obj: JsObjectRef,
        name: &str,
        func: NativeFn,
        arity: usize,
    ) -> ThrowCompletionOr<()> {
        let f = self.create_native_function(name, func, arity);
        self.object_mut(obj)?
            .define_property(PropertyKey::from(name), Property::method(JsValue::Object(f)));
        Ok(())
    }

    /// Register a native method under a symbol key (`[Symbol.iterator]`)
    pub fn register_symbol_method(
        &mut self,
        obj: JsObjectRef,
        symbol: JsSymbol,
        name: &str,
        func: NativeFn,
        arity: usize,
    ) -> ThrowCompletionOr<JsObjectRef> {
        let f = self.create_native_function(name, func, arity);
        self.object_mut(obj)?
            .define_property(PropertyKey::Symbol(symbol), Property::method(JsValue::Object(f)));
        Ok(f)
    }

    /// Register a configurable, non-enumerable accessor with only a getter
    pub fn register_getter(
        &mut self,
        obj: JsObjectRef,
        key: PropertyKey,
        name: &str,
        getter: NativeFn,
    ) -> ThrowCompletionOr<()> {
        let f = self.create_native_function(&format!("get {}", name), getter, 0);
        self.object_mut(obj)?
            .define_property(key, Property::accessor(Some(f), None, false, true));
        Ok(())
    }

    // =========================================================================
    // Call / construct dispatch
    // =========================================================================

    pub fn is_callable(&self, value: &JsValue) -> bool {
        match value {
            JsValue::Object(obj) => self.heap.get(*obj).is_some_and(JsObject::is_callable),
            _ => false,
        }
    }

    pub fn is_constructor(&self, value: &JsValue) -> bool {
        match value {
            JsValue::Object(obj) => self.heap.get(*obj).is_some_and(JsObject::is_constructor),
            _ => false,
        }
    }

    /// Call(F, V, args)
    pub fn call(
        &mut self,
        callee: &JsValue,
        this: JsValue,
        args: &[JsValue],
    ) -> ThrowCompletionOr<JsValue> {
        let JsValue::Object(func) = callee else {
            return Err(JsError::type_error(format!("{:?} is not a function", callee)));
        };
        self.call_function(*func, this, args)
    }

    /// Invoke the `[[Call]]` behaviour of `func`
    pub fn call_function(
        &mut self,
        func: JsObjectRef,
        this: JsValue,
        args: &[JsValue],
    ) -> ThrowCompletionOr<JsValue> {
        enum Target {
            Native(NativeFn),
            Host(HostFunction),
            Proxy,
        }

        let target = match &self.object(func)?.exotic {
            ExoticObject::Function(JsFunction::Native(native)) => Target::Native(native.func),
            ExoticObject::Function(JsFunction::Host(host)) => Target::Host(host.clone()),
            ExoticObject::Proxy(data) if data.callable => Target::Proxy,
            _ => return Err(JsError::type_error("object is not a function")),
        };

        self.enter(func)?;
        let result = match target {
            Target::Native(f) => f(self, this, args),
            Target::Host(host) => (host.call)(self, this, args),
            Target::Proxy => builtins::proxy::proxy_call(self, func, this, args),
        };
        self.execution_stack.pop();
        result
    }

    /// Construct(F, args, newTarget). `new_target` defaults to `ctor`.
    pub fn construct(
        &mut self,
        ctor: JsObjectRef,
        args: &[JsValue],
        new_target: Option<JsObjectRef>,
    ) -> ThrowCompletionOr<JsObjectRef> {
        enum Target {
            Native(NativeConstructFn),
            Host(Rc<crate::value::HostConstructFn>),
            Proxy,
        }

        let new_target = new_target.unwrap_or(ctor);
        let target = match &self.object(ctor)?.exotic {
            ExoticObject::Function(JsFunction::Native(NativeFunction {
                construct: Some(construct),
                ..
            })) => Target::Native(*construct),
            ExoticObject::Function(JsFunction::Host(HostFunction {
                construct: Some(construct),
                ..
            })) => Target::Host(construct.clone()),
            ExoticObject::Proxy(data) if data.constructor => Target::Proxy,
            _ => return Err(JsError::type_error("object is not a constructor")),
        };

        self.enter(ctor)?;
        let result = match target {
            Target::Native(f) => f(self, args, new_target),
            Target::Host(f) => f(self, args, new_target),
            Target::Proxy => builtins::proxy::proxy_construct(self, ctor, args, new_target),
        };
        self.execution_stack.pop();
        result
    }

    fn enter(&mut self, func: JsObjectRef) -> ThrowCompletionOr<()> {
        if self.execution_stack.len() >= MAX_CALL_DEPTH {
            return Err(JsError::range_error("Maximum call stack size exceeded"));
        }
        self.execution_stack.push(func);
        Ok(())
    }

    /// The function whose body is currently running
    pub fn active_function(&self) -> ThrowCompletionOr<JsObjectRef> {
        self.execution_stack
            .last()
            .copied()
            .ok_or_else(|| JsError::internal_error("no active function"))
    }

    /// Read internal slot `index` of a native or host closure
    pub fn function_slot(&self, func: JsObjectRef, index: usize) -> ThrowCompletionOr<JsValue> {
        let slots = match self.object(func)?.function() {
            Some(JsFunction::Native(native)) => &native.slots,
            Some(JsFunction::Host(host)) => &host.slots,
            None => return Err(JsError::internal_error("function has no slots")),
        };
        slots
            .get(index)
            .cloned()
            .ok_or_else(|| JsError::internal_error(format!("missing function slot {}", index)))
    }

    pub fn set_function_slot(
        &mut self,
        func: JsObjectRef,
        index: usize,
        value: JsValue,
    ) -> ThrowCompletionOr<()> {
        let slots = match self.object_mut(func)?.function_mut() {
            Some(JsFunction::Native(native)) => &mut native.slots,
            Some(JsFunction::Host(host)) => &mut host.slots,
            None => return Err(JsError::internal_error("function has no slots")),
        };
        match slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(JsError::internal_error(format!(
                "missing function slot {}",
                index
            ))),
        }
    }

    /// Slot `index` of the running native closure
    pub fn active_slot(&self, index: usize) -> ThrowCompletionOr<JsValue> {
        self.function_slot(self.active_function()?, index)
    }

    /// Call at the host boundary, materializing a throw into a script value
    pub fn call_completion(
        &mut self,
        callee: &JsValue,
        this: JsValue,
        args: &[JsValue],
    ) -> Completion {
        match self.call(callee, this, args) {
            Ok(value) => Completion::Normal(value),
            Err(err) => Completion::Throw(self.error_to_value(err)),
        }
    }

    // =========================================================================
    // Errors
    // =========================================================================

    /// Materialize an engine error as a realm Error object
    pub fn error_to_value(&mut self, err: JsError) -> JsValue {
        let intrinsics = &self.realm.intrinsics;
        let (proto, message) = match err {
            JsError::Thrown(value) => return value,
            JsError::TypeError { message } => (intrinsics.type_error_prototype, message),
            JsError::RangeError { message } => (intrinsics.range_error_prototype, message),
            JsError::Internal(message) => (intrinsics.error_prototype, message),
        };
        JsValue::Object(self.create_error(proto, &message))
    }

    /// Allocate an Error instance with the given prototype and message
    pub fn create_error(&mut self, proto: JsObjectRef, message: &str) -> JsObjectRef {
        let mut obj = JsObject::with_exotic(Some(proto), ExoticObject::Error);
        if !message.is_empty() {
            obj.define_property(PropertyKey::from("message"), Property::method(JsValue::from(message)));
        }
        self.heap.alloc(obj)
    }

    // =========================================================================
    // Jobs and garbage collection
    // =========================================================================

    pub fn enqueue_job(&mut self, job: Job) {
        self.jobs.enqueue(job);
    }

    pub fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Microtask checkpoint: run queued jobs in FIFO order.
    ///
    /// Collection may run between jobs; values the host holds across this call
    /// must be rooted with a [`Guard`]. Returns the number of jobs run. A job
    /// that fails does not stop the checkpoint; the first failure is returned
    /// once it ends.
    pub fn run_jobs(&mut self) -> ThrowCompletionOr<usize> {
        let mut ran = 0;
        let mut first_error = None;
        while let Some(job) = self.jobs.dequeue() {
            log::trace!("running job {} ({} pending)", ran, self.jobs.len());
            if let Err(err) = builtins::promise::run_job(self, job) {
                log::debug!("job {} failed: {}", ran, err);
                first_error.get_or_insert(err);
            }
            ran += 1;
            self.maybe_collect_garbage();
            if self.config.max_jobs_per_checkpoint > 0 && ran >= self.config.max_jobs_per_checkpoint
            {
                break;
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(ran),
        }
    }

    fn gc_roots(&self) -> Vec<JsObjectRef> {
        let mut roots: Vec<JsObjectRef> = self.realm.roots().collect();
        roots.extend(self.execution_stack.iter().copied());
        self.jobs.trace_jobs(&mut |obj| roots.push(obj));
        roots
    }

    /// Run a collection now. Skipped while any call is in progress.
    pub fn collect_garbage(&mut self) -> usize {
        if !self.execution_stack.is_empty() {
            log::trace!("gc skipped: {} active calls", self.execution_stack.len());
            return 0;
        }
        let roots = self.gc_roots();
        self.heap.collect(roots)
    }

    /// Collect if the allocation threshold has been reached
    pub fn maybe_collect_garbage(&mut self) -> usize {
        if self.heap.should_collect() {
            self.collect_garbage()
        } else {
            0
        }
    }

    /// Objects reachable from the realm, pending jobs and guards
    pub fn reachable_objects(&mut self) -> Vec<JsObjectRef> {
        let roots = self.gc_roots();
        self.heap.reachable(roots)
    }

    pub fn set_gc_threshold(&mut self, threshold: usize) {
        self.config.gc_threshold = threshold;
        self.heap.set_gc_threshold(threshold);
    }

    pub fn gc_stats(&self) -> GcStats {
        self.heap.stats()
    }
}

/// `length` then `name`, both non-writable, non-enumerable, configurable
fn install_function_metadata(obj: &mut JsObject, name: JsString, arity: usize) {
    obj.define_property(
        PropertyKey::from("length"),
        Property::with_attributes(JsValue::Number(arity as f64), false, false, true),
    );
    obj.define_property(
        PropertyKey::from("name"),
        Property::with_attributes(JsValue::String(name), false, false, true),
    );
}

fn stale_handle(obj: JsObjectRef) -> JsError {
    JsError::internal_error(format!("use of collected object #{}", obj.id()))
}
