//! Iteration protocol operations (GetIterator, IteratorStepValue, IteratorClose)

use crate::completion::ThrowCompletionOr;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{JsObjectRef, JsValue, Property, PropertyKey};

/// An open iterator: the iterator object, its cached `next` and a done flag
#[derive(Debug, Clone)]
pub struct IteratorRecord {
    pub iterator: JsObjectRef,
    pub next_method: JsValue,
    pub done: bool,
}

impl Interpreter {
    /// GetIteratorFromMethod(obj, method)
    pub fn get_iterator_from_method(
        &mut self,
        obj: &JsValue,
        method: JsObjectRef,
    ) -> ThrowCompletionOr<IteratorRecord> {
        let iterator = self.call_function(method, obj.clone(), &[])?;
        let JsValue::Object(iterator) = iterator else {
            return Err(JsError::type_error("Result of the Symbol.iterator method is not an object"));
        };
        let next_method = self.get(iterator, &PropertyKey::from("next"))?;
        Ok(IteratorRecord {
            iterator,
            next_method,
            done: false,
        })
    }

    /// GetIterator(obj, sync)
    pub fn get_iterator(&mut self, obj: &JsValue) -> ThrowCompletionOr<IteratorRecord> {
        let key = PropertyKey::Symbol(self.symbols.iterator.clone());
        match self.get_method(obj, &key)? {
            Some(method) => self.get_iterator_from_method(obj, method),
            None => Err(JsError::type_error(format!("{:?} is not iterable", obj))),
        }
    }

    /// IteratorNext(record, value?)
    pub fn iterator_next(
        &mut self,
        record: &IteratorRecord,
        value: Option<JsValue>,
    ) -> ThrowCompletionOr<JsObjectRef> {
        let args: Vec<JsValue> = value.into_iter().collect();
        let result = self.call(
            &record.next_method,
            JsValue::Object(record.iterator),
            &args,
        )?;
        match result {
            JsValue::Object(obj) => Ok(obj),
            other => Err(JsError::type_error(format!(
                "Iterator result {:?} is not an object",
                other
            ))),
        }
    }

    /// IteratorComplete(iterResult)
    pub fn iterator_complete(&mut self, result: JsObjectRef) -> ThrowCompletionOr<bool> {
        Ok(self.get(result, &PropertyKey::from("done"))?.to_boolean())
    }

    /// IteratorValue(iterResult)
    pub fn iterator_value(&mut self, result: JsObjectRef) -> ThrowCompletionOr<JsValue> {
        self.get(result, &PropertyKey::from("value"))
    }

    /// IteratorStepValue(record): `None` once the iterator is exhausted.
    ///
    /// Any abrupt completion marks the record done.
    pub fn iterator_step_value(
        &mut self,
        record: &mut IteratorRecord,
    ) -> ThrowCompletionOr<Option<JsValue>> {
        let step = self.iterator_next(record, None).and_then(|result| {
            if self.iterator_complete(result)? {
                return Ok(None);
            }
            self.iterator_value(result).map(Some)
        });
        if !matches!(step, Ok(Some(_))) {
            record.done = true;
        }
        step
    }

    /// IteratorClose(record, completion).
    ///
    /// When `completion` is a throw, errors from `return()` are swallowed and
    /// the original completion wins.
    pub fn iterator_close<T>(
        &mut self,
        iterator: JsObjectRef,
        completion: ThrowCompletionOr<T>,
    ) -> ThrowCompletionOr<T> {
        let iterator_value = JsValue::Object(iterator);
        let inner = match self.get_method(&iterator_value, &PropertyKey::from("return")) {
            Ok(None) => return completion,
            Ok(Some(return_method)) => self.call_function(return_method, iterator_value, &[]),
            Err(err) => Err(err),
        };
        if let Err(original) = completion {
            if let Err(suppressed) = inner {
                log::debug!("iterator close failed after abrupt completion: {}", suppressed);
            }
            return Err(original);
        }
        if !inner?.is_object() {
            return Err(JsError::type_error("iterator.return() did not return an object"));
        }
        completion
    }

    /// CreateIterResultObject(value, done)
    pub fn create_iter_result_object(&mut self, value: JsValue, done: bool) -> JsObjectRef {
        let obj = self.create_object();
        if let Some(object) = self.heap.get_mut(obj) {
            object.define_property(PropertyKey::from("value"), Property::data(value));
            object.define_property(PropertyKey::from("done"), Property::data(JsValue::Boolean(done)));
        }
        obj
    }

    /// IteratorToList(GetIterator(value))
    pub fn iterable_to_list(&mut self, value: &JsValue) -> ThrowCompletionOr<Vec<JsValue>> {
        let mut record = self.get_iterator(value)?;
        let mut values = Vec::new();
        while let Some(next) = self.iterator_step_value(&mut record)? {
            values.push(next);
        }
        Ok(values)
    }
}
