//! Error, TypeError and RangeError constructors

use crate::completion::ThrowCompletionOr;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{
    ExoticObject, JsObjectRef, JsString, JsValue, NativeConstructFn, Property, PropertyKey,
};

use super::{arg, link_constructor};

/// Initialize %Error%, %TypeError%, %RangeError% and their prototypes
pub fn initialize(interp: &mut Interpreter) -> ThrowCompletionOr<()> {
    interp.realm.mark_initialized("Error")?;
    let intrinsics = interp.realm.intrinsics.clone();

    let kinds: [(&str, JsObjectRef, JsObjectRef, NativeConstructFn); 3] = [
        (
            "Error",
            intrinsics.error_constructor,
            intrinsics.error_prototype,
            error_construct,
        ),
        (
            "TypeError",
            intrinsics.type_error_constructor,
            intrinsics.type_error_prototype,
            type_error_construct,
        ),
        (
            "RangeError",
            intrinsics.range_error_constructor,
            intrinsics.range_error_prototype,
            range_error_construct,
        ),
    ];

    for (name, ctor, proto, construct) in kinds {
        interp.make_intrinsic_constructor(ctor, name, error_call, Some(construct), 1)?;
        link_constructor(interp, ctor, proto)?;
        let proto_obj = interp.object_mut(proto)?;
        proto_obj.define_property(PropertyKey::from("name"), Property::method(JsValue::from(name)));
        proto_obj.define_property(PropertyKey::from("message"), Property::method(JsValue::from("")));
    }

    interp.register_method(intrinsics.error_prototype, "toString", error_to_string, 0)?;
    Ok(())
}

/// Called without `new`: behaves as `new` with the active function as new_target
fn error_call(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let ctor = interp.active_function()?;
    Ok(JsValue::Object(interp.construct(ctor, args, None)?))
}

fn error_construct(
    interp: &mut Interpreter,
    args: &[JsValue],
    new_target: JsObjectRef,
) -> ThrowCompletionOr<JsObjectRef> {
    let proto = interp.realm.intrinsics.error_prototype;
    construct_error(interp, args, new_target, proto)
}

fn type_error_construct(
    interp: &mut Interpreter,
    args: &[JsValue],
    new_target: JsObjectRef,
) -> ThrowCompletionOr<JsObjectRef> {
    let proto = interp.realm.intrinsics.type_error_prototype;
    construct_error(interp, args, new_target, proto)
}

fn range_error_construct(
    interp: &mut Interpreter,
    args: &[JsValue],
    new_target: JsObjectRef,
) -> ThrowCompletionOr<JsObjectRef> {
    let proto = interp.realm.intrinsics.range_error_prototype;
    construct_error(interp, args, new_target, proto)
}

fn construct_error(
    interp: &mut Interpreter,
    args: &[JsValue],
    new_target: JsObjectRef,
    default_proto: JsObjectRef,
) -> ThrowCompletionOr<JsObjectRef> {
    let obj = interp.ordinary_create_from_constructor(new_target, default_proto, ExoticObject::Error)?;
    let message = arg(args, 0);
    if !message.is_undefined() {
        let message = interp.to_string(&message)?;
        interp.object_mut(obj)?.define_property(
            PropertyKey::from("message"),
            Property::method(JsValue::String(message)),
        );
    }
    Ok(obj)
}

/// Error.prototype.toString(): "name: message", or whichever part is non-empty
pub fn error_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let JsValue::Object(obj) = this else {
        return Err(JsError::type_error(
            "Error.prototype.toString called on non-object",
        ));
    };

    let name = match interp.get(obj, &PropertyKey::from("name"))? {
        JsValue::Undefined => JsString::from("Error"),
        other => interp.to_string(&other)?,
    };
    let message = match interp.get(obj, &PropertyKey::from("message"))? {
        JsValue::Undefined => JsString::from(""),
        other => interp.to_string(&other)?,
    };

    let text = match (name.is_empty(), message.is_empty()) {
        (_, true) => name.to_string(),
        (true, false) => message.to_string(),
        (false, false) => format!("{}: {}", name, message),
    };
    Ok(JsValue::from(text))
}
