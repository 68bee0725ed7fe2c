//! Tests for Proxy traps and forwarding

use std::cell::RefCell;
use std::rc::Rc;

use super::{array_values, call_array_method, create_test_runtime, define, get, numbers};
use js_object_model::interpreter::builtins::proxy::create_proxy;
use js_object_model::{JsError, JsValue, PropertyDescriptor, PropertyKey};

#[test]
fn test_proxy_requires_new() {
    let mut interp = create_test_runtime();
    let proxy_ctor = JsValue::Object(interp.realm.intrinsics.proxy_constructor);
    let target = JsValue::Object(interp.create_object());
    let handler = JsValue::Object(interp.create_object());
    let err = interp
        .call(&proxy_ctor, JsValue::Undefined, &[target.clone(), handler.clone()])
        .unwrap_err();
    assert!(err.is_type_error());

    let ctor = interp.realm.intrinsics.proxy_constructor;
    assert!(interp.construct(ctor, &[target.clone(), handler], None).is_ok());
    let err = interp.construct(ctor, &[target, JsValue::Null], None).unwrap_err();
    assert!(err.is_type_error());
}

#[test]
fn test_missing_traps_forward_to_target() {
    let mut interp = create_test_runtime();
    let target = interp.create_object();
    define(&mut interp, target, "x", JsValue::Number(1.0));
    let handler = JsValue::Object(interp.create_object());
    let proxy = create_proxy(&mut interp, &JsValue::Object(target), &handler).unwrap();

    assert_eq!(interp.get(proxy, &PropertyKey::from("x")).unwrap(), JsValue::Number(1.0));
    interp.set(proxy, &PropertyKey::from("y"), JsValue::Number(2.0), true).unwrap();
    assert_eq!(interp.get(target, &PropertyKey::from("y")).unwrap(), JsValue::Number(2.0));
    assert!(interp.has_property(proxy, &PropertyKey::from("y")).unwrap());
    assert!(interp.delete(proxy, &PropertyKey::from("y")).unwrap());
    assert!(!interp.has_own_property(target, &PropertyKey::from("y")).unwrap());
    assert_eq!(
        interp.own_property_keys(proxy).unwrap(),
        vec![PropertyKey::from("x")]
    );
    assert_eq!(
        interp.get_prototype_of(proxy).unwrap(),
        Some(interp.realm.intrinsics.object_prototype)
    );
}

#[test]
fn test_get_trap_receives_target_key_and_receiver() {
    let mut interp = create_test_runtime();
    let target = JsValue::Object(interp.create_object());
    let handler = interp.create_object();
    let seen: Rc<RefCell<Vec<Vec<JsValue>>>> = Rc::default();
    let record = seen.clone();
    let trap = interp.create_host_function("get", 3, move |_interp, _this, args| {
        record.borrow_mut().push(args.to_vec());
        Ok(JsValue::from("trapped"))
    });
    define(&mut interp, handler, "get", JsValue::Object(trap));
    let proxy = create_proxy(&mut interp, &target, &JsValue::Object(handler)).unwrap();

    assert_eq!(
        interp.get(proxy, &PropertyKey::from("anything")).unwrap(),
        JsValue::from("trapped")
    );
    assert_eq!(
        seen.borrow().as_slice(),
        &[vec![target, JsValue::from("anything"), JsValue::Object(proxy)]]
    );
}

#[test]
fn test_apply_and_construct_traps() {
    let mut interp = create_test_runtime();
    let target = interp.realm.intrinsics.array_constructor;
    let handler = interp.create_object();
    let apply = interp.create_host_function("apply", 3, |interp, _this, args| {
        // Return the argument list array unchanged
        let list = args.get(2).cloned().unwrap_or_default();
        let len = interp.length_of_array_like(list.as_object().unwrap_or(interp.realm.global_object))?;
        Ok(JsValue::Number(len as f64))
    });
    define(&mut interp, handler, "apply", JsValue::Object(apply));
    let proxy = create_proxy(&mut interp, &JsValue::Object(target), &JsValue::Object(handler)).unwrap();

    assert!(interp.is_callable(&JsValue::Object(proxy)));
    assert!(interp.is_constructor(&JsValue::Object(proxy)));
    let result = interp
        .call(&JsValue::Object(proxy), JsValue::Undefined, &numbers(&[1.0, 2.0]))
        .unwrap();
    assert_eq!(result, JsValue::Number(2.0));

    // No construct trap: forwards to %Array% with the proxy as new_target
    let constructed = interp.construct(proxy, &numbers(&[4.0]), None).unwrap();
    assert_eq!(interp.length_of_array_like(constructed).unwrap(), 4);

    let bad = interp.create_host_function("construct", 3, |_, _, _| Ok(JsValue::Number(1.0)));
    define(&mut interp, handler, "construct", JsValue::Object(bad));
    let err = interp.construct(proxy, &[], None).unwrap_err();
    assert!(err.is_type_error());
}

#[test]
fn test_non_callable_target_makes_non_callable_proxy() {
    let mut interp = create_test_runtime();
    let target = JsValue::Object(interp.create_object());
    let handler = JsValue::Object(interp.create_object());
    let proxy = JsValue::Object(create_proxy(&mut interp, &target, &handler).unwrap());
    assert!(!interp.is_callable(&proxy));
    assert!(!interp.is_constructor(&proxy));
    let err = interp.call(&proxy, JsValue::Undefined, &[]).unwrap_err();
    assert!(err.is_type_error());
}

#[test]
fn test_define_property_trap_sees_descriptor_object() {
    let mut interp = create_test_runtime();
    let target = JsValue::Object(interp.create_object());
    let handler = interp.create_object();
    let writable = Rc::new(RefCell::new(JsValue::Undefined));
    let record = writable.clone();
    let trap = interp.create_host_function("defineProperty", 3, move |interp, _this, args| {
        let desc = args.get(2).cloned().unwrap_or_default();
        *record.borrow_mut() = interp.get_v(&desc, &PropertyKey::from("writable"))?;
        Ok(JsValue::Boolean(false))
    });
    define(&mut interp, handler, "defineProperty", JsValue::Object(trap));
    let proxy = create_proxy(&mut interp, &target, &JsValue::Object(handler)).unwrap();

    let err = interp
        .create_data_property_or_throw(proxy, &PropertyKey::from("k"), JsValue::Null)
        .unwrap_err();
    assert!(err.is_type_error());
    assert_eq!(*writable.borrow(), JsValue::Boolean(true));
}

#[test]
fn test_get_own_property_descriptor_trap() {
    let mut interp = create_test_runtime();
    let target = JsValue::Object(interp.create_object());
    let handler = interp.create_object();
    let trap = interp.create_host_function("getOwnPropertyDescriptor", 2, |interp, _this, _args| {
        let desc = interp.from_property_descriptor(Some(&PropertyDescriptor::data(JsValue::Number(9.0))));
        Ok(desc)
    });
    define(&mut interp, handler, "getOwnPropertyDescriptor", JsValue::Object(trap));
    let proxy = create_proxy(&mut interp, &target, &JsValue::Object(handler)).unwrap();

    let prop = interp.get_own_property(proxy, &PropertyKey::from("z")).unwrap().unwrap();
    assert_eq!(prop.value(), Some(&JsValue::Number(9.0)));
    assert!(prop.writable() && prop.enumerable && prop.configurable);
}

#[test]
fn test_array_from_over_proxied_array_like() {
    let mut interp = create_test_runtime();
    let target = super::from_json(&mut interp, serde_json::json!({"length": 2, "0": 1, "1": 2}));
    let handler = interp.create_object();
    let trap = interp.create_host_function("get", 3, |interp, _this, args| {
        let target = args.first().cloned().unwrap_or_default();
        let key = args.get(1).cloned().unwrap_or_default();
        let key = interp.to_property_key(&key)?;
        // Only elements are scaled; `length` passes through
        match (&key, interp.get_v(&target, &key)?) {
            (PropertyKey::Index(_), JsValue::Number(n)) => Ok(JsValue::Number(n * 10.0)),
            (_, other) => Ok(other),
        }
    });
    define(&mut interp, handler, "get", JsValue::Object(trap));
    let proxy = create_proxy(&mut interp, &target, &JsValue::Object(handler)).unwrap();

    let array = call_array_method(&mut interp, "from", &[JsValue::Object(proxy)]).unwrap();
    assert_eq!(array_values(&mut interp, &array), numbers(&[10.0, 20.0]));
    assert_eq!(get(&mut interp, &array, "length"), JsValue::Number(2.0));
}

#[test]
fn test_trap_errors_propagate() {
    let mut interp = create_test_runtime();
    let target = JsValue::Object(interp.create_object());
    let handler = interp.create_object();
    let trap = interp.create_host_function("has", 2, |_, _, _| {
        Err(JsError::thrown(JsValue::from("no")))
    });
    define(&mut interp, handler, "has", JsValue::Object(trap));
    let proxy = create_proxy(&mut interp, &target, &JsValue::Object(handler)).unwrap();
    let err = interp.has_property(proxy, &PropertyKey::from("a")).unwrap_err();
    assert!(matches!(err, JsError::Thrown(_)));
}
