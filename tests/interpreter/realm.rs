//! Tests for realm bootstrap and intrinsic wiring

use super::{create_test_runtime, get};
use js_object_model::interpreter::builtins;
use js_object_model::{Interpreter, JsError, JsValue, PropertyKey};

#[test]
fn test_globals_are_installed() {
    let mut interp = create_test_runtime();
    let global = interp.realm.global_object;
    let intrinsics = interp.realm.intrinsics.clone();
    for (name, ctor) in [
        ("Array", intrinsics.array_constructor),
        ("Error", intrinsics.error_constructor),
        ("TypeError", intrinsics.type_error_constructor),
        ("RangeError", intrinsics.range_error_constructor),
        ("Promise", intrinsics.promise_constructor),
        ("Proxy", intrinsics.proxy_constructor),
    ] {
        let prop = interp
            .get_own_property(global, &PropertyKey::from(name))
            .unwrap()
            .unwrap();
        assert_eq!(prop.value(), Some(&JsValue::Object(ctor)), "{}", name);
        assert!(prop.writable() && !prop.enumerable && prop.configurable, "{}", name);
    }
}

#[test]
fn test_constructor_prototype_links() {
    let mut interp = create_test_runtime();
    let intrinsics = interp.realm.intrinsics.clone();
    for (ctor, proto) in [
        (intrinsics.array_constructor, intrinsics.array_prototype),
        (intrinsics.promise_constructor, intrinsics.promise_prototype),
        (intrinsics.type_error_constructor, intrinsics.type_error_prototype),
    ] {
        let prototype = interp
            .get_own_property(ctor, &PropertyKey::from("prototype"))
            .unwrap()
            .unwrap();
        assert_eq!(prototype.value(), Some(&JsValue::Object(proto)));
        assert!(!prototype.writable() && !prototype.enumerable && !prototype.configurable);

        let constructor = interp
            .get_own_property(proto, &PropertyKey::from("constructor"))
            .unwrap()
            .unwrap();
        assert_eq!(constructor.value(), Some(&JsValue::Object(ctor)));
        assert!(constructor.writable() && !constructor.enumerable);
    }
}

#[test]
fn test_intrinsic_prototype_chains() {
    let mut interp = create_test_runtime();
    let intrinsics = interp.realm.intrinsics.clone();
    let parent = |interp: &mut Interpreter, obj| interp.get_prototype_of(obj).unwrap();

    assert_eq!(parent(&mut interp, intrinsics.object_prototype), None);
    assert_eq!(
        parent(&mut interp, intrinsics.array_prototype),
        Some(intrinsics.object_prototype)
    );
    assert_eq!(
        parent(&mut interp, intrinsics.array_constructor),
        Some(intrinsics.function_prototype)
    );
    assert_eq!(
        parent(&mut interp, intrinsics.type_error_prototype),
        Some(intrinsics.error_prototype)
    );
    assert_eq!(
        parent(&mut interp, intrinsics.array_iterator_prototype),
        Some(intrinsics.iterator_prototype)
    );
}

#[test]
fn test_intrinsics_initialize_once() {
    let mut interp = create_test_runtime();
    assert!(interp.realm.is_initialized("Array"));
    let err = builtins::array::initialize(&mut interp).unwrap_err();
    assert!(matches!(err, JsError::Internal(_)));
    let err = interp.realm.mark_initialized("Promise").unwrap_err();
    assert!(matches!(err, JsError::Internal(_)));
}

#[test]
fn test_separate_interpreters_do_not_share_intrinsics() {
    let mut first = create_test_runtime();
    let mut second = create_test_runtime();
    let array_ctor = first.realm.intrinsics.array_constructor;

    // Mutating one realm's intrinsic is invisible in the other
    let marker = JsValue::from("patched");
    first
        .set(array_ctor, &PropertyKey::from("marker"), marker.clone(), true)
        .unwrap();
    assert_eq!(get(&mut first, &JsValue::Object(array_ctor), "marker"), marker);
    let other_ctor = JsValue::Object(second.realm.intrinsics.array_constructor);
    assert_eq!(get(&mut second, &other_ctor, "marker"), JsValue::Undefined);
}

#[test]
fn test_array_iterator_is_wired() {
    let mut interp = create_test_runtime();
    let array = JsValue::Object(interp.create_array_from(vec![JsValue::Number(1.0), JsValue::Number(2.0)]));
    let values = interp.iterable_to_list(&array).unwrap();
    assert_eq!(values, vec![JsValue::Number(1.0), JsValue::Number(2.0)]);
}
