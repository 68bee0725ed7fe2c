//! Array and String iterators
//!
//! `%IteratorPrototype%`, `%ArrayIteratorPrototype%`, `%StringIteratorPrototype%`
//! and the methods that hand them out (`Array.prototype.values`,
//! `String.prototype[@@iterator]`, ...). These make arrays and strings iterable
//! for `Array.from`.

use crate::completion::ThrowCompletionOr;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{
    ArrayIteratorState, ExoticObject, IterationKind, JsObject, JsObjectRef, JsString, JsValue,
    Property, PropertyKey, StringIteratorState,
};

/// Initialize the iterator prototypes and the iterator-producing methods
pub fn initialize(interp: &mut Interpreter) -> ThrowCompletionOr<()> {
    interp.realm.mark_initialized("ArrayIterator")?;
    let intrinsics = interp.realm.intrinsics.clone();
    let symbols = interp.symbols.clone();

    // %IteratorPrototype%[@@iterator] and %AsyncIteratorPrototype%[@@asyncIterator]
    interp.register_symbol_method(
        intrinsics.iterator_prototype,
        symbols.iterator.clone(),
        "[Symbol.iterator]",
        return_this,
        0,
    )?;
    interp.register_symbol_method(
        intrinsics.async_iterator_prototype,
        symbols.async_iterator.clone(),
        "[Symbol.asyncIterator]",
        return_this,
        0,
    )?;

    interp.register_method(intrinsics.array_iterator_prototype, "next", array_iterator_next, 0)?;
    interp.register_method(intrinsics.string_iterator_prototype, "next", string_iterator_next, 0)?;
    for (proto, tag) in [
        (intrinsics.array_iterator_prototype, "Array Iterator"),
        (intrinsics.string_iterator_prototype, "String Iterator"),
    ] {
        interp.object_mut(proto)?.define_property(
            PropertyKey::Symbol(symbols.to_string_tag.clone()),
            Property::with_attributes(JsValue::from(tag), false, false, true),
        );
    }

    // Array.prototype.values is also Array.prototype[@@iterator]
    let array_proto = intrinsics.array_prototype;
    interp.register_method(array_proto, "keys", array_keys, 0)?;
    interp.register_method(array_proto, "entries", array_entries, 0)?;
    let values = interp.create_native_function("values", array_values, 0);
    let values_obj = interp.object_mut(array_proto)?;
    values_obj.define_property(PropertyKey::from("values"), Property::method(JsValue::Object(values)));
    values_obj.define_property(
        PropertyKey::Symbol(symbols.iterator.clone()),
        Property::method(JsValue::Object(values)),
    );

    interp.register_symbol_method(
        intrinsics.string_prototype,
        symbols.iterator,
        "[Symbol.iterator]",
        string_iterator,
        0,
    )?;
    Ok(())
}

fn return_this(
    _interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    Ok(this)
}

/// CreateArrayIterator(array, kind)
pub fn create_array_iterator(
    interp: &mut Interpreter,
    iterated: JsValue,
    kind: IterationKind,
) -> JsObjectRef {
    let proto = interp.realm.intrinsics.array_iterator_prototype;
    interp.heap.alloc(JsObject::with_exotic(
        Some(proto),
        ExoticObject::ArrayIterator(ArrayIteratorState {
            iterated: Some(iterated),
            next_index: 0,
            kind,
        }),
    ))
}

fn iterate_array(
    interp: &mut Interpreter,
    this: JsValue,
    kind: IterationKind,
) -> ThrowCompletionOr<JsValue> {
    let obj = interp.to_object(&this)?;
    Ok(JsValue::Object(create_array_iterator(
        interp,
        JsValue::Object(obj),
        kind,
    )))
}

/// Array.prototype.values() / Array.prototype[@@iterator]()
pub fn array_values(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    iterate_array(interp, this, IterationKind::Values)
}

/// Array.prototype.keys()
pub fn array_keys(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    iterate_array(interp, this, IterationKind::Keys)
}

/// Array.prototype.entries()
pub fn array_entries(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    iterate_array(interp, this, IterationKind::Entries)
}

/// %ArrayIteratorPrototype%.next()
pub fn array_iterator_next(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let JsValue::Object(iter) = this else {
        return Err(JsError::type_error("next called on non-object"));
    };
    let (iterated, index, kind) = match &interp.object(iter)?.exotic {
        ExoticObject::ArrayIterator(state) => (state.iterated.clone(), state.next_index, state.kind),
        _ => {
            return Err(JsError::type_error(
                "next method called on incompatible receiver",
            ));
        }
    };
    let Some(JsValue::Object(array)) = iterated else {
        return Ok(JsValue::Object(
            interp.create_iter_result_object(JsValue::Undefined, true),
        ));
    };

    let len = interp.length_of_array_like(array)?;
    if index >= len {
        set_array_iterator_state(interp, iter, None, index)?;
        return Ok(JsValue::Object(
            interp.create_iter_result_object(JsValue::Undefined, true),
        ));
    }
    set_array_iterator_state(interp, iter, Some(JsValue::Object(array)), index + 1)?;

    let value = match kind {
        IterationKind::Keys => JsValue::Number(index as f64),
        IterationKind::Values => interp.get(array, &PropertyKey::from_u64(index))?,
        IterationKind::Entries => {
            let element = interp.get(array, &PropertyKey::from_u64(index))?;
            JsValue::Object(interp.create_array_from(vec![JsValue::Number(index as f64), element]))
        }
    };
    Ok(JsValue::Object(interp.create_iter_result_object(value, false)))
}

fn set_array_iterator_state(
    interp: &mut Interpreter,
    iter: JsObjectRef,
    iterated: Option<JsValue>,
    next_index: u64,
) -> ThrowCompletionOr<()> {
    if let ExoticObject::ArrayIterator(state) = &mut interp.object_mut(iter)?.exotic {
        state.iterated = iterated;
        state.next_index = next_index;
    }
    Ok(())
}

/// String.prototype[@@iterator](): iterates code points
pub fn string_iterator(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    if this.is_null_or_undefined() {
        return Err(JsError::type_error(
            "String.prototype[Symbol.iterator] called on null or undefined",
        ));
    }
    let string = interp.to_string(&this)?;
    let proto = interp.realm.intrinsics.string_iterator_prototype;
    Ok(JsValue::Object(interp.heap.alloc(JsObject::with_exotic(
        Some(proto),
        ExoticObject::StringIterator(StringIteratorState {
            string: Some(string),
            position: 0,
        }),
    ))))
}

/// %StringIteratorPrototype%.next()
pub fn string_iterator_next(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let JsValue::Object(iter) = this else {
        return Err(JsError::type_error("next called on non-object"));
    };
    let next = match &mut interp.object_mut(iter)?.exotic {
        ExoticObject::StringIterator(state) => {
            let ch = state
                .string
                .as_ref()
                .and_then(|s| s.as_str().get(state.position..))
                .and_then(|rest| rest.chars().next());
            match ch {
                Some(ch) => {
                    state.position += ch.len_utf8();
                    Some(ch)
                }
                None => {
                    state.string = None;
                    None
                }
            }
        }
        _ => {
            return Err(JsError::type_error(
                "next method called on incompatible receiver",
            ));
        }
    };
    let result = match next {
        Some(ch) => interp.create_iter_result_object(JsValue::String(JsString::from(ch.to_string())), false),
        None => interp.create_iter_result_object(JsValue::Undefined, true),
    };
    Ok(JsValue::Object(result))
}
