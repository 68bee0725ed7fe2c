//! Object.prototype methods and primitive wrapper `valueOf`

use crate::completion::ThrowCompletionOr;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{ExoticObject, JsString, JsValue, PropertyKey};

use super::arg;

/// Initialize Object.prototype with hasOwnProperty, toString and valueOf,
/// and the wrapper prototypes with their `valueOf`.
pub fn initialize(interp: &mut Interpreter) -> ThrowCompletionOr<()> {
    interp.realm.mark_initialized("Object.prototype")?;
    let intrinsics = interp.realm.intrinsics.clone();
    let proto = intrinsics.object_prototype;

    interp.register_method(proto, "hasOwnProperty", object_has_own_property, 1)?;
    interp.register_method(proto, "toString", object_to_string, 0)?;
    interp.register_method(proto, "valueOf", object_value_of, 0)?;

    for wrapper_proto in [
        intrinsics.string_prototype,
        intrinsics.number_prototype,
        intrinsics.boolean_prototype,
    ] {
        interp.register_method(wrapper_proto, "valueOf", primitive_value_of, 0)?;
    }
    Ok(())
}

/// Object.prototype.hasOwnProperty(V)
pub fn object_has_own_property(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let key = interp.to_property_key(&arg(args, 0))?;
    let obj = interp.to_object(&this)?;
    Ok(JsValue::Boolean(interp.has_own_property(obj, &key)?))
}

/// Object.prototype.toString(): `[object Tag]`, honoring @@toStringTag
pub fn object_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let builtin_tag = match &this {
        JsValue::Undefined => return Ok(JsValue::from("[object Undefined]")),
        JsValue::Null => return Ok(JsValue::from("[object Null]")),
        _ => {
            if interp.is_array(&this)? {
                "Array"
            } else {
                let obj = interp.to_object(&this)?;
                match &interp.object(obj)?.exotic {
                    ExoticObject::Function(_) => "Function",
                    ExoticObject::Proxy(data) if data.callable => "Function",
                    ExoticObject::Error => "Error",
                    ExoticObject::PrimitiveWrapper(JsValue::Boolean(_)) => "Boolean",
                    ExoticObject::PrimitiveWrapper(JsValue::Number(_)) => "Number",
                    ExoticObject::PrimitiveWrapper(JsValue::String(_)) => "String",
                    _ => "Object",
                }
            }
        }
    };

    let tag_key = PropertyKey::Symbol(interp.symbols.to_string_tag.clone());
    let tag = match interp.get_v(&this, &tag_key)? {
        JsValue::String(tag) => tag,
        _ => JsString::from(builtin_tag),
    };
    Ok(JsValue::from(format!("[object {}]", tag)))
}

/// Object.prototype.valueOf(): ToObject(this)
pub fn object_value_of(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    Ok(JsValue::Object(interp.to_object(&this)?))
}

/// String/Number/Boolean.prototype.valueOf(): thisPrimitiveValue
fn primitive_value_of(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    match &this {
        JsValue::String(_) | JsValue::Number(_) | JsValue::Boolean(_) => Ok(this),
        JsValue::Object(obj) => match &interp.object(*obj)?.exotic {
            ExoticObject::PrimitiveWrapper(value) => Ok(value.clone()),
            _ => Err(JsError::type_error("valueOf called on incompatible receiver")),
        },
        _ => Err(JsError::type_error("valueOf called on incompatible receiver")),
    }
}
