//! Host interchange with `serde_json`
//!
//! Hosts build input graphs from JSON and read results back without walking
//! the heap by hand.

use rustc_hash::FxHashSet;
use serde_json::{Map, Number, Value as JsonValue};

use crate::completion::ThrowCompletionOr;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{JsObjectRef, JsValue, Property, PropertyKey};

impl Interpreter {
    /// Build a value from JSON: objects and arrays get realm prototypes
    pub fn value_from_json(&mut self, json: &JsonValue) -> JsValue {
        match json {
            JsonValue::Null => JsValue::Null,
            JsonValue::Bool(b) => JsValue::Boolean(*b),
            JsonValue::Number(n) => JsValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => JsValue::from(s.as_str()),
            JsonValue::Array(items) => {
                let values: Vec<JsValue> = items.iter().map(|item| self.value_from_json(item)).collect();
                JsValue::Object(self.create_array_from(values))
            }
            JsonValue::Object(map) => {
                let obj = self.create_object();
                for (key, item) in map {
                    let value = self.value_from_json(item);
                    if let Some(object) = self.heap.get_mut(obj) {
                        object.define_property(PropertyKey::from(key.as_str()), Property::data(value));
                    }
                }
                JsValue::Object(obj)
            }
        }
    }

    /// Read a value back as JSON (own enumerable properties, getters run).
    ///
    /// Arrays expand holes to `null`, so lengths above
    /// `InterpreterConfig::max_json_array_length` fail with a RangeError.
    pub fn value_to_json(&mut self, value: &JsValue) -> ThrowCompletionOr<JsonValue> {
        let mut stack = FxHashSet::default();
        Ok(self.serialize_json(value, &mut stack)?.unwrap_or(JsonValue::Null))
    }

    /// `None` for values JSON cannot represent (undefined, functions, symbols)
    fn serialize_json(
        &mut self,
        value: &JsValue,
        stack: &mut FxHashSet<JsObjectRef>,
    ) -> ThrowCompletionOr<Option<JsonValue>> {
        let obj = match value {
            JsValue::Undefined | JsValue::Symbol(_) => return Ok(None),
            JsValue::Null => return Ok(Some(JsonValue::Null)),
            JsValue::Boolean(b) => return Ok(Some(JsonValue::Bool(*b))),
            JsValue::Number(n) => {
                return Ok(Some(Number::from_f64(*n).map_or(JsonValue::Null, JsonValue::Number)));
            }
            JsValue::String(s) => return Ok(Some(JsonValue::String(s.to_string()))),
            JsValue::Object(obj) => *obj,
        };
        if self.is_callable(value) {
            return Ok(None);
        }
        if !stack.insert(obj) {
            return Err(JsError::type_error("Converting circular structure to JSON"));
        }

        let result = if self.is_array(value)? {
            let len = self.length_of_array_like(obj)?;
            if len > self.config().max_json_array_length {
                return Err(JsError::range_error(format!(
                    "array of length {} is too long for JSON interchange",
                    len
                )));
            }
            let mut items = Vec::new();
            for index in 0..len {
                let item = self.get(obj, &PropertyKey::from_u64(index))?;
                items.push(self.serialize_json(&item, stack)?.unwrap_or(JsonValue::Null));
            }
            JsonValue::Array(items)
        } else {
            let mut map = Map::new();
            for key in self.own_property_keys(obj)? {
                if key.is_symbol() {
                    continue;
                }
                let enumerable = self
                    .get_own_property(obj, &key)?
                    .is_some_and(|prop| prop.enumerable);
                if !enumerable {
                    continue;
                }
                let item = self.get(obj, &key)?;
                if let Some(json) = self.serialize_json(&item, stack)? {
                    map.insert(key.to_string(), json);
                }
            }
            JsonValue::Object(map)
        };

        stack.remove(&obj);
        Ok(Some(result))
    }
}
