//! Array constructor: `Array(...)`, `Array.from`, `Array.fromAsync`,
//! `Array.isArray`, `Array.of` and `Array[@@species]`

use crate::completion::ThrowCompletionOr;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::interpreter::iteration::IteratorRecord;
use crate::value::{
    ExoticObject, JsObject, JsObjectRef, JsValue, MAX_ARRAY_LENGTH, MAX_SAFE_INTEGER, PropertyKey,
};

use super::{arg, array_from_async, link_constructor};

/// Initialize %Array% and mark %Array.prototype% as an Array exotic object
pub fn initialize(interp: &mut Interpreter) -> ThrowCompletionOr<()> {
    interp.realm.mark_initialized("Array")?;
    let ctor = interp.realm.intrinsics.array_constructor;
    let proto = interp.realm.intrinsics.array_prototype;

    interp.make_intrinsic_constructor(ctor, "Array", array_call, Some(array_construct), 1)?;
    link_constructor(interp, ctor, proto)?;
    interp.object_mut(proto)?.exotic = ExoticObject::Array {
        length: 0,
        length_writable: true,
    };

    interp.register_method(ctor, "from", array_from, 1)?;
    interp.register_method(ctor, "fromAsync", array_from_async::array_from_async, 1)?;
    interp.register_method(ctor, "isArray", array_is_array, 1)?;
    interp.register_method(ctor, "of", array_of, 0)?;

    let species = PropertyKey::Symbol(interp.symbols.species.clone());
    interp.register_getter(ctor, species, "[Symbol.species]", array_species_getter)?;
    log::trace!("Array constructor initialized");
    Ok(())
}

/// `Array(...)` without `new` behaves as `new Array(...)`
fn array_call(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let new_target = interp.active_function()?;
    Ok(JsValue::Object(array_construct(interp, args, new_target)?))
}

/// `new Array(...)`
pub fn array_construct(
    interp: &mut Interpreter,
    args: &[JsValue],
    new_target: JsObjectRef,
) -> ThrowCompletionOr<JsObjectRef> {
    let default_proto = interp.realm.intrinsics.array_prototype;
    let proto = interp.get_prototype_from_constructor(new_target, default_proto)?;

    match args {
        [] => array_create(interp, 0, Some(proto)),
        [JsValue::Number(len)] => {
            let int_len = interp.to_uint32(&JsValue::Number(*len))?;
            if f64::from(int_len) != *len {
                return Err(JsError::range_error("Invalid array length"));
            }
            array_create(interp, u64::from(int_len), Some(proto))
        }
        [only] => {
            let array = array_create(interp, 0, Some(proto))?;
            interp.create_data_property_or_throw(array, &PropertyKey::Index(0), only.clone())?;
            Ok(array)
        }
        _ => {
            let array = array_create(interp, args.len() as u64, Some(proto))?;
            for (index, value) in args.iter().enumerate() {
                interp.create_data_property_or_throw(
                    array,
                    &PropertyKey::from_u64(index as u64),
                    value.clone(),
                )?;
            }
            Ok(array)
        }
    }
}

/// ArrayCreate(length, proto): a length-only array, RangeError above 2^32-1
pub fn array_create(
    interp: &mut Interpreter,
    length: u64,
    proto: Option<JsObjectRef>,
) -> ThrowCompletionOr<JsObjectRef> {
    if length > MAX_ARRAY_LENGTH {
        return Err(JsError::range_error("Invalid array length"));
    }
    let length = u32::try_from(length).map_err(|_| JsError::range_error("Invalid array length"))?;
    let proto = proto.unwrap_or(interp.realm.intrinsics.array_prototype);
    Ok(interp.heap.alloc(JsObject::with_exotic(
        Some(proto),
        ExoticObject::Array {
            length,
            length_writable: true,
        },
    )))
}

/// ArraySpeciesCreate(originalArray, length)
pub fn array_species_create(
    interp: &mut Interpreter,
    original: JsObjectRef,
    length: u64,
) -> ThrowCompletionOr<JsObjectRef> {
    if !interp.is_array(&JsValue::Object(original))? {
        return array_create(interp, length, None);
    }
    let mut ctor = interp.get(original, &PropertyKey::from("constructor"))?;
    if let JsValue::Object(c) = ctor {
        let species = PropertyKey::Symbol(interp.symbols.species.clone());
        ctor = match interp.get(c, &species)? {
            JsValue::Null => JsValue::Undefined,
            other => other,
        };
    }
    match ctor {
        JsValue::Undefined => array_create(interp, length, None),
        JsValue::Object(c) if interp.is_constructor(&ctor) => {
            interp.construct(c, &[JsValue::Number(length as f64)], None)
        }
        _ => Err(JsError::type_error("object.constructor[Symbol.species] is not a constructor")),
    }
}

/// Array.isArray(arg)
pub fn array_is_array(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    Ok(JsValue::Boolean(interp.is_array(&arg(args, 0))?))
}

/// get Array[@@species]
pub fn array_species_getter(
    _interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    if !this.is_object() {
        return Err(JsError::type_error(
            "Array[Symbol.species] getter called on non-object",
        ));
    }
    Ok(this)
}

/// The optional `mapFn` argument: callable or undefined
pub(crate) fn mapping_function(
    interp: &Interpreter,
    map_fn: &JsValue,
) -> ThrowCompletionOr<Option<JsObjectRef>> {
    match map_fn {
        JsValue::Undefined => Ok(None),
        JsValue::Object(f) if interp.is_callable(map_fn) => Ok(Some(*f)),
        other => Err(JsError::type_error(format!("{:?} is not a function", other))),
    }
}

/// `Construct(C, args)` when `this` is a constructor, else ArrayCreate(length)
pub(crate) fn construct_this_or_array(
    interp: &mut Interpreter,
    this: &JsValue,
    args: &[JsValue],
    length: u64,
) -> ThrowCompletionOr<JsObjectRef> {
    match this {
        JsValue::Object(ctor) if interp.is_constructor(this) => interp.construct(*ctor, args, None),
        _ => array_create(interp, length, None),
    }
}

/// Array.from(items, mapFn, thisArg)
pub fn array_from(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let items = arg(args, 0);
    let this_arg = arg(args, 2);
    let mapper = mapping_function(interp, &arg(args, 1))?;

    let iterator_key = PropertyKey::Symbol(interp.symbols.iterator.clone());
    if let Some(using_iterator) = interp.get_method(&items, &iterator_key)? {
        let target = construct_this_or_array(interp, &this, &[], 0)?;
        let mut record = interp.get_iterator_from_method(&items, using_iterator)?;
        let filled = fill_from_iterator(interp, target, &mut record, mapper, &this_arg);
        let length = interp.iterator_close_on_error(record.iterator, filled)?;
        interp.set(
            target,
            &PropertyKey::from("length"),
            JsValue::Number(length as f64),
            true,
        )?;
        return Ok(JsValue::Object(target));
    }

    // Not iterable: array-like
    let array_like = interp.to_object(&items)?;
    let length = interp.length_of_array_like(array_like)?;
    let target = construct_this_or_array(interp, &this, &[JsValue::Number(length as f64)], length)?;
    for index in 0..length {
        let key = PropertyKey::from_u64(index);
        let value = interp.get(array_like, &key)?;
        let value = match mapper {
            Some(f) => interp.call_function(
                f,
                this_arg.clone(),
                &[value, JsValue::Number(index as f64)],
            )?,
            None => value,
        };
        interp.create_data_property_or_throw(target, &key, value)?;
    }
    interp.set(
        target,
        &PropertyKey::from("length"),
        JsValue::Number(length as f64),
        true,
    )?;
    Ok(JsValue::Object(target))
}

/// Drain an iterator into `target`, returning the number of elements defined
fn fill_from_iterator(
    interp: &mut Interpreter,
    target: JsObjectRef,
    record: &mut IteratorRecord,
    mapper: Option<JsObjectRef>,
    this_arg: &JsValue,
) -> ThrowCompletionOr<u64> {
    let mut index: u64 = 0;
    loop {
        if index as f64 >= MAX_SAFE_INTEGER {
            return Err(JsError::type_error("Array.from: too many elements"));
        }
        let Some(value) = interp.iterator_step_value(record)? else {
            return Ok(index);
        };
        let value = match mapper {
            Some(f) => interp.call_function(
                f,
                this_arg.clone(),
                &[value, JsValue::Number(index as f64)],
            )?,
            None => value,
        };
        interp.create_data_property_or_throw(target, &PropertyKey::from_u64(index), value)?;
        index += 1;
    }
}

impl Interpreter {
    /// Close `iterator` if `completion` is abrupt; close errors are swallowed
    fn iterator_close_on_error<T>(
        &mut self,
        iterator: JsObjectRef,
        completion: ThrowCompletionOr<T>,
    ) -> ThrowCompletionOr<T> {
        match completion {
            Ok(value) => Ok(value),
            Err(err) => self.iterator_close(iterator, Err(err)),
        }
    }
}

/// Array.of(...items)
pub fn array_of(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let length = args.len() as u64;
    let target = construct_this_or_array(interp, &this, &[JsValue::Number(length as f64)], length)?;
    for (index, value) in args.iter().enumerate() {
        interp.create_data_property_or_throw(
            target,
            &PropertyKey::from_u64(index as u64),
            value.clone(),
        )?;
    }
    interp.set(
        target,
        &PropertyKey::from("length"),
        JsValue::Number(length as f64),
        true,
    )?;
    Ok(JsValue::Object(target))
}
