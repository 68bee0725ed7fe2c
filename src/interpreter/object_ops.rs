//! Object internal methods and the abstract operations built on them
//!
//! Each internal method first checks for a proxy and forwards to its trap;
//! otherwise it runs the ordinary algorithm, with the Array exotic `length`
//! handled as a virtual own property.

use rustc_hash::FxHashSet;

use crate::completion::ThrowCompletionOr;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::interpreter::builtins::proxy;
use crate::interpreter::conversions::same_value;
use crate::value::{
    ExoticObject, JsObject, JsObjectRef, JsValue, Property, PropertyDescriptor, PropertyKey,
    PropertyKind,
};

/// A live proxy's `(target, handler)`
pub(crate) type ProxyParts = (JsObjectRef, JsObjectRef);

impl Interpreter {
    /// `Some((target, handler))` for a proxy, TypeError if it was revoked
    pub(crate) fn proxy_parts(&self, obj: JsObjectRef) -> ThrowCompletionOr<Option<ProxyParts>> {
        match &self.object(obj)?.exotic {
            ExoticObject::Proxy(data) => match (data.target, data.handler) {
                (Some(target), Some(handler)) => Ok(Some((target, handler))),
                _ => Err(JsError::type_error(
                    "Cannot perform operation on a revoked proxy",
                )),
            },
            _ => Ok(None),
        }
    }

    // =========================================================================
    // Internal methods
    // =========================================================================

    /// [[GetPrototypeOf]]
    pub fn get_prototype_of(&mut self, obj: JsObjectRef) -> ThrowCompletionOr<Option<JsObjectRef>> {
        if let Some(parts) = self.proxy_parts(obj)? {
            return proxy::proxy_get_prototype_of(self, parts);
        }
        Ok(self.object(obj)?.prototype)
    }

    /// [[SetPrototypeOf]]: fails on non-extensible objects and on cycles
    pub fn set_prototype_of(
        &mut self,
        obj: JsObjectRef,
        proto: Option<JsObjectRef>,
    ) -> ThrowCompletionOr<bool> {
        if let Some((target, _)) = self.proxy_parts(obj)? {
            return self.set_prototype_of(target, proto);
        }
        let current = self.object(obj)?;
        if current.prototype == proto {
            return Ok(true);
        }
        if !current.extensible {
            return Ok(false);
        }
        let mut p = proto;
        while let Some(link) = p {
            if link == obj {
                return Ok(false);
            }
            let link_obj = self.object(link)?;
            if matches!(link_obj.exotic, ExoticObject::Proxy(_)) {
                break;
            }
            p = link_obj.prototype;
        }
        self.object_mut(obj)?.prototype = proto;
        Ok(true)
    }

    /// [[IsExtensible]]
    pub fn is_extensible(&mut self, obj: JsObjectRef) -> ThrowCompletionOr<bool> {
        if let Some((target, _)) = self.proxy_parts(obj)? {
            return self.is_extensible(target);
        }
        Ok(self.object(obj)?.extensible)
    }

    /// [[PreventExtensions]]
    pub fn prevent_extensions(&mut self, obj: JsObjectRef) -> ThrowCompletionOr<bool> {
        if let Some((target, _)) = self.proxy_parts(obj)? {
            return self.prevent_extensions(target);
        }
        self.object_mut(obj)?.extensible = false;
        Ok(true)
    }

    /// [[GetOwnProperty]]
    pub fn get_own_property(
        &mut self,
        obj: JsObjectRef,
        key: &PropertyKey,
    ) -> ThrowCompletionOr<Option<Property>> {
        if let Some(parts) = self.proxy_parts(obj)? {
            return proxy::proxy_get_own_property(self, parts, key);
        }
        Ok(ordinary_get_own_property(self.object(obj)?, key))
    }

    /// [[DefineOwnProperty]]
    pub fn define_own_property(
        &mut self,
        obj: JsObjectRef,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> ThrowCompletionOr<bool> {
        if let Some(parts) = self.proxy_parts(obj)? {
            return proxy::proxy_define_own_property(self, parts, key, desc);
        }
        let array_length = self.object(obj)?.array_length();
        match (array_length, key.as_index()) {
            (Some(_), _) if key.eq_str("length") => self.array_set_length(obj, desc),
            (Some(length), Some(index)) => self.array_define_index(obj, index, length, desc),
            _ => self.ordinary_define_own_property(obj, key, desc),
        }
    }

    fn ordinary_define_own_property(
        &mut self,
        obj: JsObjectRef,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> ThrowCompletionOr<bool> {
        let object = self.object(obj)?;
        let current = ordinary_get_own_property(object, key);
        let extensible = object.extensible;
        let Some(property) = validate_and_apply(extensible, &desc, current) else {
            return Ok(false);
        };
        self.object_mut(obj)?.properties.insert(key.clone(), property);
        Ok(true)
    }

    /// ArrayDefineOwnProperty for an array index
    fn array_define_index(
        &mut self,
        obj: JsObjectRef,
        index: u32,
        length: u32,
        desc: PropertyDescriptor,
    ) -> ThrowCompletionOr<bool> {
        let length_writable = matches!(
            self.object(obj)?.exotic,
            ExoticObject::Array {
                length_writable: true,
                ..
            }
        );
        if index >= length && !length_writable {
            return Ok(false);
        }
        if !self.ordinary_define_own_property(obj, &PropertyKey::Index(index), desc)? {
            return Ok(false);
        }
        if index >= length {
            if let ExoticObject::Array { length, .. } = &mut self.object_mut(obj)?.exotic {
                *length = index + 1;
            }
        }
        Ok(true)
    }

    /// ArraySetLength(A, Desc)
    fn array_set_length(
        &mut self,
        obj: JsObjectRef,
        desc: PropertyDescriptor,
    ) -> ThrowCompletionOr<bool> {
        let Some(value) = desc.value.clone() else {
            return self.apply_length_attributes(obj, &desc, None);
        };
        let new_len = self.to_uint32(&value)?;
        let number_len = self.to_number(&value)?;
        if f64::from(new_len) != number_len {
            return Err(JsError::range_error("Invalid array length"));
        }

        let (old_len, length_writable) = array_state(self.object(obj)?);
        if new_len >= old_len {
            return self.apply_length_attributes(obj, &desc, Some(new_len));
        }
        if !length_writable {
            return Ok(false);
        }
        // Validate attribute changes before deleting anything
        if validate_and_apply(false, &desc, Some(length_property(old_len, true))).is_none() {
            return Ok(false);
        }

        let new_writable = desc.writable != Some(false);
        let mut doomed: Vec<u32> = self
            .object(obj)?
            .properties
            .keys()
            .filter_map(PropertyKey::as_index)
            .filter(|&i| i >= new_len)
            .collect();
        doomed.sort_unstable_by(|a, b| b.cmp(a));

        for index in doomed {
            let key = PropertyKey::Index(index);
            let object = self.object_mut(obj)?;
            let configurable = object
                .properties
                .get(&key)
                .is_none_or(|prop| prop.configurable);
            if configurable {
                object.properties.shift_remove(&key);
            } else {
                set_array_state(object, index + 1, new_writable);
                return Ok(false);
            }
        }
        set_array_state(self.object_mut(obj)?, new_len, new_writable);
        Ok(true)
    }

    /// Attribute-only (or growing) update of the virtual `length` property
    fn apply_length_attributes(
        &mut self,
        obj: JsObjectRef,
        desc: &PropertyDescriptor,
        new_len: Option<u32>,
    ) -> ThrowCompletionOr<bool> {
        let (old_len, length_writable) = array_state(self.object(obj)?);
        let mut check = desc.clone();
        if let Some(len) = new_len {
            check.value = Some(JsValue::Number(f64::from(len)));
        }
        match validate_and_apply(false, &check, Some(length_property(old_len, length_writable))) {
            Some(_) => {
                let writable = length_writable && desc.writable != Some(false);
                set_array_state(self.object_mut(obj)?, new_len.unwrap_or(old_len), writable);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// [[HasProperty]]
    pub fn has_property(&mut self, obj: JsObjectRef, key: &PropertyKey) -> ThrowCompletionOr<bool> {
        let mut current = obj;
        loop {
            if let Some(parts) = self.proxy_parts(current)? {
                return proxy::proxy_has(self, parts, key);
            }
            let object = self.object(current)?;
            if ordinary_get_own_property(object, key).is_some() {
                return Ok(true);
            }
            match object.prototype {
                Some(parent) => current = parent,
                None => return Ok(false),
            }
        }
    }

    /// [[Get]](P, Receiver)
    pub fn get_with_receiver(
        &mut self,
        obj: JsObjectRef,
        key: &PropertyKey,
        receiver: &JsValue,
    ) -> ThrowCompletionOr<JsValue> {
        let mut current = obj;
        loop {
            if let Some(parts) = self.proxy_parts(current)? {
                return proxy::proxy_get(self, parts, key, receiver);
            }
            let object = self.object(current)?;
            match ordinary_get_own_property(object, key) {
                Some(Property {
                    kind: PropertyKind::Data { value, .. },
                    ..
                }) => return Ok(value),
                Some(Property {
                    kind: PropertyKind::Accessor { get, .. },
                    ..
                }) => {
                    return match get {
                        Some(getter) => self.call_function(getter, receiver.clone(), &[]),
                        None => Ok(JsValue::Undefined),
                    };
                }
                None => match object.prototype {
                    Some(parent) => current = parent,
                    None => return Ok(JsValue::Undefined),
                },
            }
        }
    }

    /// [[Set]](P, V, Receiver)
    pub fn set_with_receiver(
        &mut self,
        obj: JsObjectRef,
        key: &PropertyKey,
        value: JsValue,
        receiver: &JsValue,
    ) -> ThrowCompletionOr<bool> {
        let mut current = obj;
        let own = loop {
            if let Some(parts) = self.proxy_parts(current)? {
                return proxy::proxy_set(self, parts, key, value, receiver);
            }
            let object = self.object(current)?;
            if let Some(prop) = ordinary_get_own_property(object, key) {
                break prop;
            }
            match object.prototype {
                Some(parent) => current = parent,
                None => break Property::data(JsValue::Undefined),
            }
        };

        match own.kind {
            PropertyKind::Data { writable, .. } => {
                if !writable {
                    return Ok(false);
                }
                let JsValue::Object(receiver) = receiver else {
                    return Ok(false);
                };
                match self.get_own_property(*receiver, key)? {
                    Some(existing) => {
                        if existing.is_accessor() || !existing.writable() {
                            return Ok(false);
                        }
                        self.define_own_property(
                            *receiver,
                            key,
                            PropertyDescriptor::value_only(value),
                        )
                    }
                    None => self.create_data_property(*receiver, key, value),
                }
            }
            PropertyKind::Accessor { set, .. } => match set {
                Some(setter) => {
                    self.call_function(setter, receiver.clone(), &[value])?;
                    Ok(true)
                }
                None => Ok(false),
            },
        }
    }

    /// [[Delete]]
    pub fn delete(&mut self, obj: JsObjectRef, key: &PropertyKey) -> ThrowCompletionOr<bool> {
        if let Some(parts) = self.proxy_parts(obj)? {
            return proxy::proxy_delete(self, parts, key);
        }
        let object = self.object_mut(obj)?;
        match ordinary_get_own_property(object, key) {
            None => Ok(true),
            Some(prop) if prop.configurable => {
                object.properties.shift_remove(key);
                Ok(true)
            }
            Some(_) => Ok(false),
        }
    }

    /// [[OwnPropertyKeys]]: indices ascending, then strings, then symbols,
    /// each in insertion order
    pub fn own_property_keys(&mut self, obj: JsObjectRef) -> ThrowCompletionOr<Vec<PropertyKey>> {
        if let Some(parts) = self.proxy_parts(obj)? {
            return proxy::proxy_own_keys(self, parts);
        }
        let object = self.object(obj)?;
        let mut indices: Vec<u32> = object
            .properties
            .keys()
            .filter_map(PropertyKey::as_index)
            .collect();
        let mut strings = Vec::new();

        match &object.exotic {
            ExoticObject::Array { .. } => strings.push(PropertyKey::from("length")),
            ExoticObject::PrimitiveWrapper(JsValue::String(s)) => {
                let count = s.as_str().encode_utf16().count() as u32;
                indices.extend(0..count);
                strings.push(PropertyKey::from("length"));
            }
            _ => {}
        }
        indices.sort_unstable();
        indices.dedup();

        strings.extend(
            object
                .properties
                .keys()
                .filter(|k| matches!(k, PropertyKey::String(_)))
                .cloned(),
        );
        let symbols = object.properties.keys().filter(|k| k.is_symbol()).cloned();

        let mut keys: Vec<PropertyKey> = indices.into_iter().map(PropertyKey::Index).collect();
        keys.extend(strings);
        keys.extend(symbols);
        Ok(keys)
    }

    // =========================================================================
    // Abstract operations
    // =========================================================================

    /// Get(O, P)
    pub fn get(&mut self, obj: JsObjectRef, key: &PropertyKey) -> ThrowCompletionOr<JsValue> {
        self.get_with_receiver(obj, key, &JsValue::Object(obj))
    }

    /// GetV(V, P): property lookup on any value
    pub fn get_v(&mut self, value: &JsValue, key: &PropertyKey) -> ThrowCompletionOr<JsValue> {
        let obj = self.to_object(value)?;
        self.get_with_receiver(obj, key, value)
    }

    /// GetMethod(V, P): `None` for undefined/null, TypeError if not callable
    pub fn get_method(
        &mut self,
        value: &JsValue,
        key: &PropertyKey,
    ) -> ThrowCompletionOr<Option<JsObjectRef>> {
        let func = self.get_v(value, key)?;
        if func.is_null_or_undefined() {
            return Ok(None);
        }
        match func {
            JsValue::Object(obj) if self.is_callable(&func) => Ok(Some(obj)),
            _ => Err(JsError::type_error(format!("{} is not a function", key))),
        }
    }

    /// Set(O, P, V, Throw)
    pub fn set(
        &mut self,
        obj: JsObjectRef,
        key: &PropertyKey,
        value: JsValue,
        throw: bool,
    ) -> ThrowCompletionOr<()> {
        let success = self.set_with_receiver(obj, key, value, &JsValue::Object(obj))?;
        if !success && throw {
            return Err(JsError::type_error(format!(
                "Cannot assign to read only property '{}'",
                key
            )));
        }
        Ok(())
    }

    /// CreateDataProperty(O, P, V)
    pub fn create_data_property(
        &mut self,
        obj: JsObjectRef,
        key: &PropertyKey,
        value: JsValue,
    ) -> ThrowCompletionOr<bool> {
        self.define_own_property(obj, key, PropertyDescriptor::data(value))
    }

    /// CreateDataPropertyOrThrow(O, P, V)
    pub fn create_data_property_or_throw(
        &mut self,
        obj: JsObjectRef,
        key: &PropertyKey,
        value: JsValue,
    ) -> ThrowCompletionOr<()> {
        if !self.create_data_property(obj, key, value)? {
            return Err(JsError::type_error(format!(
                "Cannot define property '{}'",
                key
            )));
        }
        Ok(())
    }

    /// DefinePropertyOrThrow(O, P, desc)
    pub fn define_property_or_throw(
        &mut self,
        obj: JsObjectRef,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> ThrowCompletionOr<()> {
        if !self.define_own_property(obj, key, desc)? {
            return Err(JsError::type_error(format!(
                "Cannot redefine property: {}",
                key
            )));
        }
        Ok(())
    }

    /// DeletePropertyOrThrow(O, P)
    pub fn delete_property_or_throw(
        &mut self,
        obj: JsObjectRef,
        key: &PropertyKey,
    ) -> ThrowCompletionOr<()> {
        if !self.delete(obj, key)? {
            return Err(JsError::type_error(format!(
                "Cannot delete property '{}'",
                key
            )));
        }
        Ok(())
    }

    /// HasOwnProperty(O, P)
    pub fn has_own_property(
        &mut self,
        obj: JsObjectRef,
        key: &PropertyKey,
    ) -> ThrowCompletionOr<bool> {
        Ok(self.get_own_property(obj, key)?.is_some())
    }

    /// LengthOfArrayLike(obj)
    pub fn length_of_array_like(&mut self, obj: JsObjectRef) -> ThrowCompletionOr<u64> {
        let len = self.get(obj, &PropertyKey::from("length"))?;
        self.to_length(&len)
    }

    /// CreateListFromArrayLike(obj)
    pub fn create_list_from_array_like(
        &mut self,
        value: &JsValue,
    ) -> ThrowCompletionOr<Vec<JsValue>> {
        let JsValue::Object(obj) = value else {
            return Err(JsError::type_error(
                "CreateListFromArrayLike called on non-object",
            ));
        };
        let len = self.length_of_array_like(*obj)?;
        let mut list = Vec::new();
        for index in 0..len {
            list.push(self.get(*obj, &PropertyKey::from_u64(index))?);
        }
        Ok(list)
    }

    /// GetPrototypeFromConstructor: `constructor.prototype` if it is an
    /// object, else the realm's `default_proto`
    pub fn get_prototype_from_constructor(
        &mut self,
        constructor: JsObjectRef,
        default_proto: JsObjectRef,
    ) -> ThrowCompletionOr<JsObjectRef> {
        match self.get(constructor, &PropertyKey::from("prototype"))? {
            JsValue::Object(proto) => Ok(proto),
            _ => Ok(default_proto),
        }
    }

    /// OrdinaryCreateFromConstructor
    pub fn ordinary_create_from_constructor(
        &mut self,
        constructor: JsObjectRef,
        default_proto: JsObjectRef,
        exotic: ExoticObject,
    ) -> ThrowCompletionOr<JsObjectRef> {
        let proto = self.get_prototype_from_constructor(constructor, default_proto)?;
        Ok(self.heap.alloc(JsObject::with_exotic(Some(proto), exotic)))
    }

    /// SpeciesConstructor(O, defaultConstructor)
    pub fn species_constructor(
        &mut self,
        obj: JsObjectRef,
        default_constructor: JsObjectRef,
    ) -> ThrowCompletionOr<JsObjectRef> {
        let ctor = match self.get(obj, &PropertyKey::from("constructor"))? {
            JsValue::Undefined => return Ok(default_constructor),
            JsValue::Object(ctor) => ctor,
            _ => return Err(JsError::type_error("object.constructor is not an object")),
        };
        let species = PropertyKey::Symbol(self.symbols.species.clone());
        match self.get(ctor, &species)? {
            JsValue::Undefined | JsValue::Null => Ok(default_constructor),
            value @ JsValue::Object(s) if self.is_constructor(&value) => Ok(s),
            _ => Err(JsError::type_error("object.constructor[Symbol.species] is not a constructor")),
        }
    }

    /// IsArray(argument): Array exotic objects, seen through proxies
    pub fn is_array(&mut self, value: &JsValue) -> ThrowCompletionOr<bool> {
        let &JsValue::Object(mut obj) = value else {
            return Ok(false);
        };
        let mut seen = FxHashSet::default();
        loop {
            if !seen.insert(obj) {
                return Ok(false);
            }
            let object = self.object(obj)?;
            match &object.exotic {
                ExoticObject::Array { .. } => return Ok(true),
                ExoticObject::Proxy(data) => match data.target {
                    Some(target) if data.handler.is_some() => obj = target,
                    _ => {
                        return Err(JsError::type_error(
                            "Cannot perform 'IsArray' on a proxy that has been revoked",
                        ));
                    }
                },
                _ => return Ok(false),
            }
        }
    }

    /// ToPropertyDescriptor(Obj)
    pub fn to_property_descriptor(
        &mut self,
        value: &JsValue,
    ) -> ThrowCompletionOr<PropertyDescriptor> {
        let JsValue::Object(obj) = value else {
            return Err(JsError::type_error(
                "Property description must be an object",
            ));
        };
        let obj = *obj;
        let mut desc = PropertyDescriptor::default();

        let field = |interp: &mut Interpreter, name: &str| -> ThrowCompletionOr<Option<JsValue>> {
            let key = PropertyKey::from(name);
            if interp.has_property(obj, &key)? {
                Ok(Some(interp.get(obj, &key)?))
            } else {
                Ok(None)
            }
        };

        desc.enumerable = field(self, "enumerable")?.map(|v| v.to_boolean());
        desc.configurable = field(self, "configurable")?.map(|v| v.to_boolean());
        desc.value = field(self, "value")?;
        desc.writable = field(self, "writable")?.map(|v| v.to_boolean());
        for (name, slot) in [("get", &mut desc.get), ("set", &mut desc.set)] {
            if let Some(accessor) = field(self, name)? {
                *slot = match accessor {
                    JsValue::Undefined => Some(None),
                    JsValue::Object(f) if self.is_callable(&accessor) => Some(Some(f)),
                    _ => {
                        return Err(JsError::type_error(format!(
                            "Getter/setter must be a function: {:?}",
                            accessor
                        )));
                    }
                };
            }
        }
        if desc.is_accessor_descriptor() && desc.is_data_descriptor() {
            return Err(JsError::type_error(
                "Invalid property descriptor. Cannot both specify accessors and a value or writable attribute",
            ));
        }
        Ok(desc)
    }

    /// FromPropertyDescriptor(Desc)
    pub fn from_property_descriptor(&mut self, desc: Option<&PropertyDescriptor>) -> JsValue {
        let Some(desc) = desc else {
            return JsValue::Undefined;
        };
        let obj = self.create_object();
        let mut fields: Vec<(&str, JsValue)> = Vec::new();
        if let Some(value) = &desc.value {
            fields.push(("value", value.clone()));
        }
        if let Some(writable) = desc.writable {
            fields.push(("writable", JsValue::Boolean(writable)));
        }
        if let Some(get) = desc.get {
            fields.push(("get", get.map_or(JsValue::Undefined, JsValue::Object)));
        }
        if let Some(set) = desc.set {
            fields.push(("set", set.map_or(JsValue::Undefined, JsValue::Object)));
        }
        if let Some(enumerable) = desc.enumerable {
            fields.push(("enumerable", JsValue::Boolean(enumerable)));
        }
        if let Some(configurable) = desc.configurable {
            fields.push(("configurable", JsValue::Boolean(configurable)));
        }
        if let Some(object) = self.heap.get_mut(obj) {
            for (name, value) in fields {
                object.define_property(PropertyKey::from(name), Property::data(value));
            }
        }
        JsValue::Object(obj)
    }
}

/// OrdinaryGetOwnProperty, plus the virtual own properties of arrays and
/// String wrappers
pub(crate) fn ordinary_get_own_property(obj: &JsObject, key: &PropertyKey) -> Option<Property> {
    match &obj.exotic {
        ExoticObject::Array {
            length,
            length_writable,
        } if key.eq_str("length") => Some(length_property(*length, *length_writable)),
        ExoticObject::PrimitiveWrapper(JsValue::String(s)) => {
            if key.eq_str("length") {
                let len = s.as_str().encode_utf16().count();
                return Some(Property::with_attributes(
                    JsValue::Number(len as f64),
                    false,
                    false,
                    false,
                ));
            }
            if let Some(index) = key.as_index() {
                let unit = s.as_str().encode_utf16().nth(index as usize);
                if let Some(unit) = unit {
                    let ch = String::from_utf16_lossy(&[unit]);
                    return Some(Property::with_attributes(
                        JsValue::from(ch),
                        false,
                        true,
                        false,
                    ));
                }
            }
            obj.properties.get(key).cloned()
        }
        _ => obj.properties.get(key).cloned(),
    }
}

fn length_property(length: u32, writable: bool) -> Property {
    Property::with_attributes(JsValue::Number(f64::from(length)), writable, false, false)
}

fn array_state(obj: &JsObject) -> (u32, bool) {
    match obj.exotic {
        ExoticObject::Array {
            length,
            length_writable,
        } => (length, length_writable),
        _ => (0, false),
    }
}

fn set_array_state(obj: &mut JsObject, new_length: u32, writable: bool) {
    if let ExoticObject::Array {
        length,
        length_writable,
    } = &mut obj.exotic
    {
        *length = new_length;
        *length_writable = writable;
    }
}

/// ValidateAndApplyPropertyDescriptor.
///
/// Returns the property to store, or `None` if the definition is rejected.
pub(crate) fn validate_and_apply(
    extensible: bool,
    desc: &PropertyDescriptor,
    current: Option<Property>,
) -> Option<Property> {
    let Some(current) = current else {
        if !extensible {
            return None;
        }
        return Some(desc.to_property());
    };

    if !current.configurable {
        if desc.configurable == Some(true) {
            return None;
        }
        if desc.enumerable.is_some_and(|e| e != current.enumerable) {
            return None;
        }
        if !desc.is_generic_descriptor() && desc.is_accessor_descriptor() != current.is_accessor() {
            return None;
        }
        match &current.kind {
            PropertyKind::Accessor { get, set } => {
                if desc.get.is_some_and(|g| g != *get) || desc.set.is_some_and(|s| s != *set) {
                    return None;
                }
            }
            PropertyKind::Data { value, writable } => {
                if !*writable {
                    if desc.writable == Some(true) {
                        return None;
                    }
                    if desc.value.as_ref().is_some_and(|v| !same_value(v, value)) {
                        return None;
                    }
                }
            }
        }
    }

    let enumerable = desc.enumerable.unwrap_or(current.enumerable);
    let configurable = desc.configurable.unwrap_or(current.configurable);
    let kind = match current.kind {
        PropertyKind::Data { value, writable } => {
            if desc.is_accessor_descriptor() {
                PropertyKind::Accessor {
                    get: desc.get.flatten(),
                    set: desc.set.flatten(),
                }
            } else {
                PropertyKind::Data {
                    value: desc.value.clone().unwrap_or(value),
                    writable: desc.writable.unwrap_or(writable),
                }
            }
        }
        PropertyKind::Accessor { get, set } => {
            if desc.is_data_descriptor() {
                PropertyKind::Data {
                    value: desc.value.clone().unwrap_or_default(),
                    writable: desc.writable.unwrap_or(false),
                }
            } else {
                PropertyKind::Accessor {
                    get: desc.get.unwrap_or(get),
                    set: desc.set.unwrap_or(set),
                }
            }
        }
    };
    Some(Property {
        kind,
        enumerable,
        configurable,
    })
}
