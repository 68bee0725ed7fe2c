//! Built-in objects of the realm

pub mod array;
pub mod array_from_async;
pub mod array_iterator;
pub mod error;
pub mod function;
pub mod object;
pub mod promise;
pub mod proxy;

use crate::completion::ThrowCompletionOr;
use crate::interpreter::Interpreter;
use crate::value::{JsObjectRef, JsValue, Property, PropertyKey};

/// Wire every intrinsic of the realm, prototypes before constructors
pub fn initialize_realm(interp: &mut Interpreter) -> ThrowCompletionOr<()> {
    function::initialize(interp)?;
    object::initialize(interp)?;
    error::initialize(interp)?;
    array_iterator::initialize(interp)?;
    array::initialize(interp)?;
    promise::initialize(interp)?;
    proxy::initialize(interp)?;

    let intrinsics = interp.realm.intrinsics.clone();
    for (name, ctor) in [
        ("Array", intrinsics.array_constructor),
        ("Error", intrinsics.error_constructor),
        ("TypeError", intrinsics.type_error_constructor),
        ("RangeError", intrinsics.range_error_constructor),
        ("Promise", intrinsics.promise_constructor),
        ("Proxy", intrinsics.proxy_constructor),
    ] {
        install_global(interp, name, JsValue::Object(ctor))?;
    }
    log::debug!("realm initialized");
    Ok(())
}

/// Define a writable, non-enumerable, configurable global binding
pub fn install_global(interp: &mut Interpreter, name: &str, value: JsValue) -> ThrowCompletionOr<()> {
    let global = interp.realm.global_object;
    interp
        .object_mut(global)?
        .define_property(PropertyKey::from(name), Property::method(value));
    Ok(())
}

/// `ctor.prototype = proto` (fixed) and `proto.constructor = ctor`
pub(crate) fn link_constructor(
    interp: &mut Interpreter,
    ctor: JsObjectRef,
    proto: JsObjectRef,
) -> ThrowCompletionOr<()> {
    interp.object_mut(ctor)?.define_property(
        PropertyKey::from("prototype"),
        Property::with_attributes(JsValue::Object(proto), false, false, false),
    );
    interp.object_mut(proto)?.define_property(
        PropertyKey::from("constructor"),
        Property::method(JsValue::Object(ctor)),
    );
    Ok(())
}

/// Argument `index`, or undefined when absent
pub(crate) fn arg(args: &[JsValue], index: usize) -> JsValue {
    args.get(index).cloned().unwrap_or_default()
}
