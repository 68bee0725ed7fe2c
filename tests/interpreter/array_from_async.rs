//! Tests for Array.fromAsync
//!
//! Every promise a test inspects after `run_jobs` is guarded first.

use std::cell::RefCell;
use std::rc::Rc;

use super::{
    IteratorScript, array_values, call_array_method, call_method, create_test_runtime, from_json,
    get, numbers, recording_constructor, run_jobs, scripted_iterable, settled,
};
use js_object_model::interpreter::builtins::promise::{new_intrinsic_capability, promise_resolve};
use js_object_model::value::PromiseStatus;
use js_object_model::{Interpreter, JsError, JsValue};

fn resolved(interp: &mut Interpreter, value: JsValue) -> JsValue {
    let ctor = interp.realm.intrinsics.promise_constructor;
    JsValue::Object(promise_resolve(interp, ctor, value).unwrap())
}

fn rejected(interp: &mut Interpreter, reason: JsValue) -> JsValue {
    let ctor = JsValue::Object(interp.realm.intrinsics.promise_constructor);
    call_method(interp, &ctor, "reject", ctor.clone(), &[reason]).unwrap()
}

#[test]
fn test_returns_promise_of_array_like() {
    let mut interp = create_test_runtime();
    let guard = interp.create_guard();
    let items = from_json(&mut interp, serde_json::json!({"length": 2, "0": "a", "1": "b"}));
    let promise = call_array_method(&mut interp, "fromAsync", &[items]).unwrap();
    guard.guard_value(&promise);

    assert_eq!(settled(&interp, &promise).0, PromiseStatus::Pending);
    run_jobs(&mut interp);

    let (status, array) = settled(&interp, &promise);
    assert_eq!(status, PromiseStatus::Fulfilled);
    assert!(interp.is_array(&array).unwrap());
    assert_eq!(
        array_values(&mut interp, &array),
        vec![JsValue::from("a"), JsValue::from("b")]
    );
}

#[test]
fn test_steps_run_in_input_order_not_settlement_order() {
    let mut interp = create_test_runtime();
    let guard = interp.create_guard();

    let first = new_intrinsic_capability(&mut interp).unwrap();
    guard.guard(first.promise);
    guard.guard(first.resolve);
    let second = resolved(&mut interp, JsValue::from("second"));
    let items = JsValue::Object(interp.create_array_from(vec![JsValue::Object(first.promise), second]));

    let order: Rc<RefCell<Vec<JsValue>>> = Rc::default();
    let record = order.clone();
    let mapper = interp.create_host_function("map", 2, move |_interp, _this, args| {
        record.borrow_mut().push(args.get(1).cloned().unwrap_or_default());
        Ok(args.first().cloned().unwrap_or_default())
    });

    let promise = call_array_method(&mut interp, "fromAsync", &[items, JsValue::Object(mapper)]).unwrap();
    guard.guard_value(&promise);

    run_jobs(&mut interp);
    interp.collect_garbage();
    assert_eq!(settled(&interp, &promise).0, PromiseStatus::Pending);
    assert!(order.borrow().is_empty(), "step 1 must wait for step 0");

    interp
        .call(
            &JsValue::Object(first.resolve),
            JsValue::Undefined,
            &[JsValue::from("first")],
        )
        .unwrap();
    run_jobs(&mut interp);

    let (status, array) = settled(&interp, &promise);
    assert_eq!(status, PromiseStatus::Fulfilled);
    assert_eq!(
        array_values(&mut interp, &array),
        vec![JsValue::from("first"), JsValue::from("second")]
    );
    assert_eq!(order.borrow().as_slice(), &numbers(&[0.0, 1.0])[..]);
}

#[test]
fn test_async_iterator() {
    let mut interp = create_test_runtime();
    let guard = interp.create_guard();
    let script = IteratorScript {
        is_async: true,
        closable: true,
        ..Default::default()
    };
    let (iterable, log) = scripted_iterable(&mut interp, numbers(&[1.0, 2.0, 3.0]), script);
    let promise = call_array_method(&mut interp, "fromAsync", &[JsValue::Object(iterable)]).unwrap();
    guard.guard_value(&promise);
    run_jobs(&mut interp);

    let (status, array) = settled(&interp, &promise);
    assert_eq!(status, PromiseStatus::Fulfilled);
    assert_eq!(array_values(&mut interp, &array), numbers(&[1.0, 2.0, 3.0]));
    assert_eq!(log.next_calls.get(), 4);
    assert_eq!(log.return_calls.get(), 0);
}

#[test]
fn test_sync_iterator_values_are_awaited() {
    let mut interp = create_test_runtime();
    let guard = interp.create_guard();
    let one = resolved(&mut interp, JsValue::Number(1.0));
    let (iterable, _log) = scripted_iterable(
        &mut interp,
        vec![one, JsValue::Number(2.0)],
        IteratorScript::default(),
    );
    let promise = call_array_method(&mut interp, "fromAsync", &[JsValue::Object(iterable)]).unwrap();
    guard.guard_value(&promise);
    run_jobs(&mut interp);

    let (status, array) = settled(&interp, &promise);
    assert_eq!(status, PromiseStatus::Fulfilled);
    assert_eq!(array_values(&mut interp, &array), numbers(&[1.0, 2.0]));
}

#[test]
fn test_mapped_promises_are_awaited() {
    let mut interp = create_test_runtime();
    let guard = interp.create_guard();
    let mapper = interp.create_host_function("map", 2, |interp, _this, args| {
        let value = interp.to_number(&args.first().cloned().unwrap_or_default())?;
        let ctor = interp.realm.intrinsics.promise_constructor;
        Ok(JsValue::Object(promise_resolve(interp, ctor, JsValue::Number(value * 2.0))?))
    });
    let items = JsValue::Object(interp.create_array_from(numbers(&[1.0, 2.0])));
    let promise = call_array_method(&mut interp, "fromAsync", &[items, JsValue::Object(mapper)]).unwrap();
    guard.guard_value(&promise);
    run_jobs(&mut interp);

    let (status, array) = settled(&interp, &promise);
    assert_eq!(status, PromiseStatus::Fulfilled);
    assert_eq!(array_values(&mut interp, &array), numbers(&[2.0, 4.0]));
}

#[test]
fn test_non_callable_map_fn_rejects_instead_of_throwing() {
    let mut interp = create_test_runtime();
    let guard = interp.create_guard();
    let items = JsValue::Object(interp.create_array_from(numbers(&[1.0])));
    let promise = call_array_method(&mut interp, "fromAsync", &[items, JsValue::from("nope")]).unwrap();
    guard.guard_value(&promise);
    run_jobs(&mut interp);

    let (status, reason) = settled(&interp, &promise);
    assert_eq!(status, PromiseStatus::Rejected);
    let reason_obj = reason.as_object().unwrap();
    assert_eq!(
        interp.get_prototype_of(reason_obj).unwrap(),
        Some(interp.realm.intrinsics.type_error_prototype)
    );
}

#[test]
fn test_map_fn_failure_closes_async_iterator() {
    let mut interp = create_test_runtime();
    let guard = interp.create_guard();
    let script = IteratorScript {
        is_async: true,
        closable: true,
        ..Default::default()
    };
    let (iterable, log) = scripted_iterable(&mut interp, numbers(&[1.0, 2.0, 3.0]), script);
    let mapper = interp.create_host_function("map", 2, |_interp, _this, args| match args.get(1) {
        Some(JsValue::Number(n)) if *n >= 1.0 => Err(JsError::thrown(JsValue::from("map failed"))),
        _ => Ok(JsValue::Undefined),
    });
    let promise = call_array_method(
        &mut interp,
        "fromAsync",
        &[JsValue::Object(iterable), JsValue::Object(mapper)],
    )
    .unwrap();
    guard.guard_value(&promise);
    run_jobs(&mut interp);

    let (status, reason) = settled(&interp, &promise);
    assert_eq!(status, PromiseStatus::Rejected);
    assert_eq!(reason, JsValue::from("map failed"));
    assert_eq!(log.next_calls.get(), 2, "nothing after the failing step");
    assert_eq!(log.return_calls.get(), 1);
}

#[test]
fn test_failing_next_rejects_without_close() {
    let mut interp = create_test_runtime();
    let guard = interp.create_guard();
    let script = IteratorScript {
        is_async: true,
        closable: true,
        throw_on_next: Some(2),
    };
    let (iterable, log) = scripted_iterable(&mut interp, numbers(&[1.0, 2.0]), script);
    let promise = call_array_method(&mut interp, "fromAsync", &[JsValue::Object(iterable)]).unwrap();
    guard.guard_value(&promise);
    run_jobs(&mut interp);

    let (status, reason) = settled(&interp, &promise);
    assert_eq!(status, PromiseStatus::Rejected);
    assert_eq!(reason, JsValue::from("next failed"));
    assert_eq!(log.return_calls.get(), 0);
}

#[test]
fn test_rejected_sync_value_closes_iterator() {
    let mut interp = create_test_runtime();
    let guard = interp.create_guard();
    let bad = rejected(&mut interp, JsValue::from("bad"));
    let script = IteratorScript {
        closable: true,
        ..Default::default()
    };
    let (iterable, log) = scripted_iterable(&mut interp, vec![bad, JsValue::Number(1.0)], script);
    let promise = call_array_method(&mut interp, "fromAsync", &[JsValue::Object(iterable)]).unwrap();
    guard.guard_value(&promise);
    run_jobs(&mut interp);

    let (status, reason) = settled(&interp, &promise);
    assert_eq!(status, PromiseStatus::Rejected);
    assert_eq!(reason, JsValue::from("bad"));
    assert_eq!(log.next_calls.get(), 1);
    assert_eq!(log.return_calls.get(), 1);
}

#[test]
fn test_rejected_array_like_element_rejects() {
    let mut interp = create_test_runtime();
    let guard = interp.create_guard();
    let bad = rejected(&mut interp, JsValue::from("bad"));
    let items = JsValue::Object(interp.create_array_from(vec![JsValue::Number(0.0), bad]));
    // Plain arrays are iterable; hide @@iterator to force the array-like path
    let items_obj = items.as_object().unwrap();
    let symbol = interp.symbols.iterator.clone();
    super::define(&mut interp, items_obj, symbol, JsValue::Undefined);

    let promise = call_array_method(&mut interp, "fromAsync", &[items]).unwrap();
    guard.guard_value(&promise);
    run_jobs(&mut interp);

    let (status, reason) = settled(&interp, &promise);
    assert_eq!(status, PromiseStatus::Rejected);
    assert_eq!(reason, JsValue::from("bad"));
}

#[test]
fn test_constructor_receiver() {
    let mut interp = create_test_runtime();
    let guard = interp.create_guard();
    let (ctor, calls) = recording_constructor(&mut interp);
    guard.guard(ctor);
    let holder = super::array_ctor(&interp);

    let iterable = JsValue::Object(interp.create_array_from(numbers(&[1.0])));
    let from_iterable =
        call_method(&mut interp, &holder, "fromAsync", JsValue::Object(ctor), &[iterable]).unwrap();
    guard.guard_value(&from_iterable);

    let array_like = from_json(&mut interp, serde_json::json!({"length": 1, "0": 2}));
    let from_array_like =
        call_method(&mut interp, &holder, "fromAsync", JsValue::Object(ctor), &[array_like]).unwrap();
    guard.guard_value(&from_array_like);
    run_jobs(&mut interp);

    assert_eq!(calls.borrow().as_slice(), &[vec![], numbers(&[1.0])]);
    for promise in [from_iterable, from_array_like] {
        let (status, result) = settled(&interp, &promise);
        assert_eq!(status, PromiseStatus::Fulfilled);
        assert!(!interp.is_array(&result).unwrap());
        assert_eq!(get(&mut interp, &result, "length"), JsValue::Number(1.0));
    }
}

#[test]
fn test_empty_input_resolves_empty_array() {
    let mut interp = create_test_runtime();
    let guard = interp.create_guard();
    let items = JsValue::Object(interp.create_array_from(vec![]));
    let promise = call_array_method(&mut interp, "fromAsync", &[items]).unwrap();
    guard.guard_value(&promise);
    run_jobs(&mut interp);

    let (status, array) = settled(&interp, &promise);
    assert_eq!(status, PromiseStatus::Fulfilled);
    assert!(array_values(&mut interp, &array).is_empty());
}
