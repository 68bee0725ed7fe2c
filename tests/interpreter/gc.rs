//! Tests for garbage collection through the interpreter
//!
//! Collection only runs when nothing is executing, so these tests collect
//! explicitly or between jobs.

use super::{
    IteratorScript, array_values, call_array_method, create_test_runtime, define, numbers,
    run_jobs, scripted_iterable, settled,
};
use js_object_model::interpreter::builtins::promise::new_intrinsic_capability;
use js_object_model::value::PromiseStatus;
use js_object_model::{JsError, JsValue, PropertyKey};

#[test]
fn test_unguarded_objects_are_collected() {
    let mut interp = create_test_runtime();
    interp.collect_garbage();
    let before = interp.gc_stats().live_objects;
    for _ in 0..10 {
        interp.create_object();
    }
    assert_eq!(interp.gc_stats().live_objects, before + 10);

    let collected = interp.collect_garbage();
    assert_eq!(collected, 10);
    assert_eq!(interp.gc_stats().live_objects, before);
    assert_eq!(interp.gc_stats().allocs_since_gc, 0);
}

#[test]
fn test_guard_keeps_object_graph_alive() {
    let mut interp = create_test_runtime();
    let guard = interp.create_guard();
    let parent = interp.create_object();
    let child = interp.create_object();
    let array = interp.create_array_from(vec![JsValue::Object(child)]);
    define(&mut interp, parent, "array", JsValue::Object(array));
    guard.guard(parent);

    interp.collect_garbage();
    let reachable = interp.reachable_objects();
    for obj in [parent, array, child] {
        assert!(reachable.contains(&obj));
    }
    assert_eq!(
        interp.get(array, &PropertyKey::Index(0)).unwrap(),
        JsValue::Object(child)
    );

    drop(guard);
    interp.collect_garbage();
    assert!(!interp.reachable_objects().contains(&parent));
}

#[test]
fn test_prototype_edges_are_traced() {
    let mut interp = create_test_runtime();
    let guard = interp.create_guard();
    let proto = interp.create_object();
    let obj = interp.create_object_with_proto(Some(proto));
    guard.guard(obj);

    interp.collect_garbage();
    assert_eq!(interp.get_prototype_of(obj).unwrap(), Some(proto));
    assert!(interp.reachable_objects().contains(&proto));
}

#[test]
fn test_stale_handle_is_internal_error() {
    let mut interp = create_test_runtime();
    let obj = interp.create_object();
    interp.collect_garbage();

    let err = interp.object(obj).unwrap_err();
    assert!(matches!(err, JsError::Internal(_)));
    let err = interp.get(obj, &PropertyKey::from("x")).unwrap_err();
    assert!(matches!(err, JsError::Internal(_)));

    // The slot is reused with a new generation; the old handle stays stale
    let fresh = interp.create_object();
    assert_ne!(fresh, obj);
    assert!(interp.object(obj).is_err());
    assert!(interp.object(fresh).is_ok());
}

#[test]
fn test_intrinsics_survive_collection() {
    let mut interp = create_test_runtime();
    interp.collect_garbage();
    let array = call_array_method(&mut interp, "of", &numbers(&[1.0])).unwrap();
    assert_eq!(array_values(&mut interp, &array), numbers(&[1.0]));
}

#[test]
fn test_pending_from_async_survives_collection() {
    let mut interp = create_test_runtime();
    interp.set_gc_threshold(1);
    let guard = interp.create_guard();

    let deferred = new_intrinsic_capability(&mut interp).unwrap();
    guard.guard(deferred.promise);
    guard.guard(deferred.resolve);
    let items = interp.create_array_from(vec![JsValue::Object(deferred.promise)]);
    let promise = call_array_method(&mut interp, "fromAsync", &[JsValue::Object(items)]).unwrap();
    guard.guard_value(&promise);

    // Only the awaited promise's reaction list refers to the suspended task
    let collected = interp.collect_garbage();
    assert!(collected > 0, "temporaries of the first step are garbage");
    assert_eq!(settled(&interp, &promise).0, PromiseStatus::Pending);

    interp
        .call(&JsValue::Object(deferred.resolve), JsValue::Undefined, &[JsValue::from("late")])
        .unwrap();
    run_jobs(&mut interp);

    let (status, array) = settled(&interp, &promise);
    assert_eq!(status, PromiseStatus::Fulfilled);
    assert_eq!(array_values(&mut interp, &array), vec![JsValue::from("late")]);
}

#[test]
fn test_collection_runs_between_jobs() {
    let mut interp = create_test_runtime();
    interp.set_gc_threshold(1);
    let guard = interp.create_guard();
    let script = IteratorScript {
        is_async: true,
        ..Default::default()
    };
    let (iterable, _log) = scripted_iterable(&mut interp, numbers(&[1.0, 2.0, 3.0]), script);
    let promise = call_array_method(&mut interp, "fromAsync", &[JsValue::Object(iterable)]).unwrap();
    guard.guard_value(&promise);

    let before = interp.gc_stats().collections;
    run_jobs(&mut interp);
    assert!(interp.gc_stats().collections > before);

    let (status, array) = settled(&interp, &promise);
    assert_eq!(status, PromiseStatus::Fulfilled);
    assert_eq!(array_values(&mut interp, &array), numbers(&[1.0, 2.0, 3.0]));
}

#[test]
fn test_host_function_slots_are_traced() {
    let mut interp = create_test_runtime();
    let guard = interp.create_guard();
    let captured = interp.create_object();
    define(&mut interp, captured, "tag", JsValue::from("kept"));
    let read_tag = interp.create_host_function_with_slots(
        "readTag",
        0,
        vec![JsValue::Object(captured)],
        |interp, _this, _args| {
            let held = interp.active_slot(0)?;
            interp.get_v(&held, &PropertyKey::from("tag"))
        },
    );
    guard.guard(read_tag);

    interp.collect_garbage();
    assert!(interp.reachable_objects().contains(&captured));
    let result = interp
        .call(&JsValue::Object(read_tag), JsValue::Undefined, &[])
        .unwrap();
    assert_eq!(result, JsValue::from("kept"));

    // Clearing the slot drops the only edge
    interp.set_function_slot(read_tag, 0, JsValue::Null).unwrap();
    interp.collect_garbage();
    assert!(interp.object(captured).is_err());
}
