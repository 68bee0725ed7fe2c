//! Proxy constructor and proxy internal methods
//!
//! Each internal method looks up its trap on the handler and falls back to the
//! target when the trap is undefined. Trap result invariants are not enforced
//! beyond the type checks ECMAScript performs first.

use crate::completion::ThrowCompletionOr;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::interpreter::object_ops::ProxyParts;
use crate::value::{
    ExoticObject, JsObject, JsObjectRef, JsValue, Property, PropertyDescriptor, PropertyKey,
    ProxyData,
};

use super::arg;

/// Initialize %Proxy% and Proxy.revocable
pub fn initialize(interp: &mut Interpreter) -> ThrowCompletionOr<()> {
    interp.realm.mark_initialized("Proxy")?;
    let ctor = interp.realm.intrinsics.proxy_constructor;
    interp.make_intrinsic_constructor(ctor, "Proxy", proxy_call_without_new, Some(proxy_constructor), 2)?;
    interp.register_method(ctor, "revocable", proxy_revocable, 2)?;
    Ok(())
}

fn proxy_call_without_new(
    _interp: &mut Interpreter,
    _this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    Err(JsError::type_error("Constructor Proxy requires 'new'"))
}

fn proxy_constructor(
    interp: &mut Interpreter,
    args: &[JsValue],
    _new_target: JsObjectRef,
) -> ThrowCompletionOr<JsObjectRef> {
    create_proxy(interp, &arg(args, 0), &arg(args, 1))
}

/// ProxyCreate(target, handler)
pub fn create_proxy(
    interp: &mut Interpreter,
    target: &JsValue,
    handler: &JsValue,
) -> ThrowCompletionOr<JsObjectRef> {
    let (JsValue::Object(target_obj), JsValue::Object(handler_obj)) = (target, handler) else {
        return Err(JsError::type_error(
            "Cannot create proxy with a non-object as target or handler",
        ));
    };
    let data = ProxyData {
        target: Some(*target_obj),
        handler: Some(*handler_obj),
        callable: interp.is_callable(target),
        constructor: interp.is_constructor(target),
    };
    Ok(interp.heap.alloc(JsObject::with_exotic(None, ExoticObject::Proxy(data))))
}

/// Proxy.revocable(target, handler) -> { proxy, revoke }
fn proxy_revocable(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let proxy = create_proxy(interp, &arg(args, 0), &arg(args, 1))?;
    let revoke = interp.create_native_closure("", proxy_revoke, 0, vec![JsValue::Object(proxy)]);
    let result = interp.create_object();
    let obj = interp.object_mut(result)?;
    obj.define_property(PropertyKey::from("proxy"), Property::data(JsValue::Object(proxy)));
    obj.define_property(PropertyKey::from("revoke"), Property::data(JsValue::Object(revoke)));
    Ok(JsValue::Object(result))
}

fn proxy_revoke(
    interp: &mut Interpreter,
    _this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let func = interp.active_function()?;
    let JsValue::Object(proxy) = interp.function_slot(func, 0)? else {
        return Ok(JsValue::Undefined);
    };
    interp.set_function_slot(func, 0, JsValue::Null)?;
    if let ExoticObject::Proxy(data) = &mut interp.object_mut(proxy)?.exotic {
        data.target = None;
        data.handler = None;
    }
    Ok(JsValue::Undefined)
}

// =============================================================================
// Proxy Trap Implementations
// =============================================================================

/// Get a trap from the handler, or None if it is undefined/null
fn get_trap(
    interp: &mut Interpreter,
    handler: JsObjectRef,
    name: &str,
) -> ThrowCompletionOr<Option<JsObjectRef>> {
    interp.get_method(&JsValue::Object(handler), &PropertyKey::from(name))
}

fn call_trap(
    interp: &mut Interpreter,
    trap: JsObjectRef,
    handler: JsObjectRef,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    interp.call_function(trap, JsValue::Object(handler), args)
}

/// Proxy [[GetPrototypeOf]]
pub fn proxy_get_prototype_of(
    interp: &mut Interpreter,
    (target, handler): ProxyParts,
) -> ThrowCompletionOr<Option<JsObjectRef>> {
    let Some(trap) = get_trap(interp, handler, "getPrototypeOf")? else {
        return interp.get_prototype_of(target);
    };
    match call_trap(interp, trap, handler, &[JsValue::Object(target)])? {
        JsValue::Object(proto) => Ok(Some(proto)),
        JsValue::Null => Ok(None),
        _ => Err(JsError::type_error(
            "'getPrototypeOf' on proxy: trap returned neither object nor null",
        )),
    }
}

/// Proxy [[GetOwnProperty]]
pub fn proxy_get_own_property(
    interp: &mut Interpreter,
    (target, handler): ProxyParts,
    key: &PropertyKey,
) -> ThrowCompletionOr<Option<Property>> {
    let Some(trap) = get_trap(interp, handler, "getOwnPropertyDescriptor")? else {
        return interp.get_own_property(target, key);
    };
    let result = call_trap(interp, trap, handler, &[JsValue::Object(target), key.to_value()])?;
    match result {
        JsValue::Undefined => Ok(None),
        JsValue::Object(_) => Ok(Some(interp.to_property_descriptor(&result)?.to_property())),
        _ => Err(JsError::type_error(
            "'getOwnPropertyDescriptor' on proxy: trap returned neither object nor undefined",
        )),
    }
}

/// Proxy [[DefineOwnProperty]]
pub fn proxy_define_own_property(
    interp: &mut Interpreter,
    (target, handler): ProxyParts,
    key: &PropertyKey,
    desc: PropertyDescriptor,
) -> ThrowCompletionOr<bool> {
    let Some(trap) = get_trap(interp, handler, "defineProperty")? else {
        return interp.define_own_property(target, key, desc);
    };
    let desc_obj = interp.from_property_descriptor(Some(&desc));
    let result = call_trap(
        interp,
        trap,
        handler,
        &[JsValue::Object(target), key.to_value(), desc_obj],
    )?;
    Ok(result.to_boolean())
}

/// Proxy [[HasProperty]]
pub fn proxy_has(
    interp: &mut Interpreter,
    (target, handler): ProxyParts,
    key: &PropertyKey,
) -> ThrowCompletionOr<bool> {
    let Some(trap) = get_trap(interp, handler, "has")? else {
        return interp.has_property(target, key);
    };
    let result = call_trap(interp, trap, handler, &[JsValue::Object(target), key.to_value()])?;
    Ok(result.to_boolean())
}

/// Proxy [[Get]]
pub fn proxy_get(
    interp: &mut Interpreter,
    (target, handler): ProxyParts,
    key: &PropertyKey,
    receiver: &JsValue,
) -> ThrowCompletionOr<JsValue> {
    let Some(trap) = get_trap(interp, handler, "get")? else {
        return interp.get_with_receiver(target, key, receiver);
    };
    call_trap(
        interp,
        trap,
        handler,
        &[JsValue::Object(target), key.to_value(), receiver.clone()],
    )
}

/// Proxy [[Set]]
pub fn proxy_set(
    interp: &mut Interpreter,
    (target, handler): ProxyParts,
    key: &PropertyKey,
    value: JsValue,
    receiver: &JsValue,
) -> ThrowCompletionOr<bool> {
    let Some(trap) = get_trap(interp, handler, "set")? else {
        return interp.set_with_receiver(target, key, value, receiver);
    };
    let result = call_trap(
        interp,
        trap,
        handler,
        &[JsValue::Object(target), key.to_value(), value, receiver.clone()],
    )?;
    Ok(result.to_boolean())
}

/// Proxy [[Delete]]
pub fn proxy_delete(
    interp: &mut Interpreter,
    (target, handler): ProxyParts,
    key: &PropertyKey,
) -> ThrowCompletionOr<bool> {
    let Some(trap) = get_trap(interp, handler, "deleteProperty")? else {
        return interp.delete(target, key);
    };
    let result = call_trap(interp, trap, handler, &[JsValue::Object(target), key.to_value()])?;
    Ok(result.to_boolean())
}

/// Proxy [[OwnPropertyKeys]]
pub fn proxy_own_keys(
    interp: &mut Interpreter,
    (target, handler): ProxyParts,
) -> ThrowCompletionOr<Vec<PropertyKey>> {
    let Some(trap) = get_trap(interp, handler, "ownKeys")? else {
        return interp.own_property_keys(target);
    };
    let result = call_trap(interp, trap, handler, &[JsValue::Object(target)])?;
    let list = interp.create_list_from_array_like(&result)?;
    list.into_iter()
        .map(|value| match value {
            JsValue::String(s) => Ok(PropertyKey::from(s)),
            JsValue::Symbol(sym) => Ok(PropertyKey::Symbol(sym)),
            other => Err(JsError::type_error(format!(
                "{:?} is not a valid property name",
                other
            ))),
        })
        .collect()
}

/// Proxy [[Call]]
pub fn proxy_call(
    interp: &mut Interpreter,
    proxy: JsObjectRef,
    this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let Some((target, handler)) = interp.proxy_parts(proxy)? else {
        return Err(JsError::internal_error("proxy_call on a non-proxy"));
    };
    let Some(trap) = get_trap(interp, handler, "apply")? else {
        return interp.call_function(target, this, args);
    };
    let args_array = interp.create_array_from(args.to_vec());
    call_trap(
        interp,
        trap,
        handler,
        &[JsValue::Object(target), this, JsValue::Object(args_array)],
    )
}

/// Proxy [[Construct]]
pub fn proxy_construct(
    interp: &mut Interpreter,
    proxy: JsObjectRef,
    args: &[JsValue],
    new_target: JsObjectRef,
) -> ThrowCompletionOr<JsObjectRef> {
    let Some((target, handler)) = interp.proxy_parts(proxy)? else {
        return Err(JsError::internal_error("proxy_construct on a non-proxy"));
    };
    let Some(trap) = get_trap(interp, handler, "construct")? else {
        return interp.construct(target, args, Some(new_target));
    };
    let args_array = interp.create_array_from(args.to_vec());
    match call_trap(
        interp,
        trap,
        handler,
        &[
            JsValue::Object(target),
            JsValue::Object(args_array),
            JsValue::Object(new_target),
        ],
    )? {
        JsValue::Object(obj) => Ok(obj),
        _ => Err(JsError::type_error(
            "proxy [[Construct]] must return an object",
        )),
    }
}
