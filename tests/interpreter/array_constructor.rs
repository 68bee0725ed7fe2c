//! Tests for `Array(...)` / `new Array(...)` and the constructor's own properties

use super::{array_ctor, array_values, create_test_runtime, get, json, numbers};
use js_object_model::{JsValue, PropertyKey};

#[test]
fn test_call_and_construct_are_equivalent() {
    let mut interp = create_test_runtime();
    let ctor = array_ctor(&interp);
    let ctor_obj = interp.realm.intrinsics.array_constructor;

    let called = interp.call(&ctor, JsValue::Undefined, &[JsValue::Number(3.0)]).unwrap();
    let constructed = interp.construct(ctor_obj, &[JsValue::Number(3.0)], None).unwrap();

    let called_obj = called.as_object().unwrap();
    assert_eq!(interp.length_of_array_like(called_obj).unwrap(), 3);
    assert_eq!(interp.length_of_array_like(constructed).unwrap(), 3);
    assert_eq!(
        interp.get_prototype_of(called_obj).unwrap(),
        interp.get_prototype_of(constructed).unwrap()
    );
}

#[test]
fn test_single_number_creates_sparse_array() {
    let mut interp = create_test_runtime();
    let ctor = interp.realm.intrinsics.array_constructor;
    let array = interp.construct(ctor, &[JsValue::Number(3.0)], None).unwrap();

    assert_eq!(interp.length_of_array_like(array).unwrap(), 3);
    for index in 0..3 {
        assert!(
            !interp.has_own_property(array, &PropertyKey::Index(index)).unwrap(),
            "index {} should be a hole",
            index
        );
    }
    assert_eq!(
        interp.own_property_keys(array).unwrap(),
        vec![PropertyKey::from("length")]
    );
}

#[test]
fn test_invalid_lengths_throw_range_error() {
    let mut interp = create_test_runtime();
    let ctor = interp.realm.intrinsics.array_constructor;
    for len in [-1.0, 4_294_967_296.0, 1.5, f64::NAN, f64::INFINITY] {
        let err = interp.construct(ctor, &[JsValue::Number(len)], None).unwrap_err();
        assert!(err.is_range_error(), "length {} gave {:?}", len, err);
    }
}

#[test]
fn test_max_length_is_accepted() {
    let mut interp = create_test_runtime();
    let ctor = interp.realm.intrinsics.array_constructor;
    let array = interp.construct(ctor, &[JsValue::Number(4_294_967_295.0)], None).unwrap();
    assert_eq!(interp.length_of_array_like(array).unwrap(), 4_294_967_295);
}

#[test]
fn test_non_number_single_argument_is_an_element() {
    let mut interp = create_test_runtime();
    let ctor = interp.realm.intrinsics.array_constructor;
    let array = interp.construct(ctor, &[JsValue::from("3")], None).unwrap();
    assert_eq!(json(&mut interp, &JsValue::Object(array)), serde_json::json!(["3"]));
}

#[test]
fn test_multiple_arguments_become_elements() {
    let mut interp = create_test_runtime();
    let ctor = array_ctor(&interp);
    let array = interp.call(&ctor, JsValue::Undefined, &numbers(&[1.0, 2.0, 3.0])).unwrap();
    assert_eq!(array_values(&mut interp, &array), numbers(&[1.0, 2.0, 3.0]));

    let empty = interp.call(&ctor, JsValue::Undefined, &[]).unwrap();
    assert!(array_values(&mut interp, &empty).is_empty());
}

#[test]
fn test_new_target_selects_prototype() {
    let mut interp = create_test_runtime();
    let array_ctor = interp.realm.intrinsics.array_constructor;
    let array_proto = interp.realm.intrinsics.array_prototype;

    // class SubArray extends Array {}
    let (sub, _) = super::recording_constructor(&mut interp);
    let sub_proto = get(&mut interp, &JsValue::Object(sub), "prototype").as_object().unwrap();
    interp.set_prototype_of(sub_proto, Some(array_proto)).unwrap();

    let array = interp.construct(array_ctor, &numbers(&[1.0, 2.0]), Some(sub)).unwrap();
    assert_eq!(interp.get_prototype_of(array).unwrap(), Some(sub_proto));
    assert!(interp.is_array(&JsValue::Object(array)).unwrap());
}

#[test]
fn test_new_target_without_object_prototype_falls_back() {
    let mut interp = create_test_runtime();
    let array_ctor = interp.realm.intrinsics.array_constructor;
    let array_proto = interp.realm.intrinsics.array_prototype;

    let (sub, _) = super::recording_constructor(&mut interp);
    interp
        .set(sub, &PropertyKey::from("prototype"), JsValue::Number(1.0), true)
        .unwrap();
    let array = interp.construct(array_ctor, &[], Some(sub)).unwrap();
    assert_eq!(interp.get_prototype_of(array).unwrap(), Some(array_proto));
}

#[test]
fn test_static_methods_are_non_enumerable_writable_configurable() {
    let mut interp = create_test_runtime();
    let ctor = interp.realm.intrinsics.array_constructor;
    for (name, arity) in [("from", 1.0), ("fromAsync", 1.0), ("isArray", 1.0), ("of", 0.0)] {
        let prop = interp
            .get_own_property(ctor, &PropertyKey::from(name))
            .unwrap()
            .unwrap_or_else(|| panic!("Array.{} missing", name));
        assert!(prop.writable() && !prop.enumerable && prop.configurable, "Array.{}", name);

        let func = prop.value().cloned().unwrap();
        assert!(interp.is_callable(&func));
        assert!(!interp.is_constructor(&func), "Array.{} is not a constructor", name);
        assert_eq!(get(&mut interp, &func, "length"), JsValue::Number(arity));
        assert_eq!(get(&mut interp, &func, "name"), JsValue::from(name));
    }
}

#[test]
fn test_species_accessor() {
    let mut interp = create_test_runtime();
    let ctor = interp.realm.intrinsics.array_constructor;
    let species = PropertyKey::Symbol(interp.symbols.species.clone());

    let prop = interp.get_own_property(ctor, &species).unwrap().unwrap();
    assert!(prop.is_accessor());
    assert!(!prop.enumerable && prop.configurable);
    assert!(prop.setter().is_none());

    let getter = JsValue::Object(prop.getter().unwrap());
    assert_eq!(get(&mut interp, &getter, "name"), JsValue::from("get [Symbol.species]"));

    // Returns the exact receiver
    let other = JsValue::Object(interp.create_object());
    assert_eq!(interp.call(&getter, other.clone(), &[]).unwrap(), other);
    assert_eq!(interp.get(ctor, &species).unwrap(), JsValue::Object(ctor));

    for receiver in [JsValue::Undefined, JsValue::Number(1.0), JsValue::from("x")] {
        let err = interp.call(&getter, receiver, &[]).unwrap_err();
        assert!(err.is_type_error());
    }
}

#[test]
fn test_species_is_overridable() {
    let mut interp = create_test_runtime();
    let ctor = interp.realm.intrinsics.array_constructor;
    let species = PropertyKey::Symbol(interp.symbols.species.clone());

    let replacement = interp.create_host_function("get [Symbol.species]", 0, |_, _, _| {
        Ok(JsValue::Undefined)
    });
    let redefined = interp
        .define_own_property(
            ctor,
            &species,
            js_object_model::PropertyDescriptor {
                get: Some(Some(replacement)),
                ..Default::default()
            },
        )
        .unwrap();
    assert!(redefined);
    assert_eq!(interp.get(ctor, &species).unwrap(), JsValue::Undefined);
}

#[test]
fn test_array_species_create_uses_constructor_species() {
    use js_object_model::interpreter::builtins::array::array_species_create;

    let mut interp = create_test_runtime();
    let ctor = interp.realm.intrinsics.array_constructor;
    let (recorder, calls) = super::recording_constructor(&mut interp);

    // Plain arrays use %Array%
    let original = interp.create_array_from(numbers(&[1.0]));
    let derived = array_species_create(&mut interp, original, 2).unwrap();
    assert_eq!(interp.length_of_array_like(derived).unwrap(), 2);

    // constructor[@@species] substitutes the result constructor
    let species_holder = interp.create_object();
    let species = interp.symbols.species.clone();
    super::define(&mut interp, species_holder, species, JsValue::Object(recorder));
    super::define(&mut interp, original, "constructor", JsValue::Object(species_holder));
    let derived = array_species_create(&mut interp, original, 4).unwrap();
    assert!(!interp.is_array(&JsValue::Object(derived)).unwrap());
    assert_eq!(calls.borrow().as_slice(), &[numbers(&[4.0])]);

    // Non-arrays ignore constructor entirely
    let plain = interp.create_object();
    super::define(&mut interp, plain, "constructor", JsValue::Number(1.0));
    let derived = array_species_create(&mut interp, plain, 0).unwrap();
    assert!(interp.is_array(&JsValue::Object(derived)).unwrap());

    // A non-constructor species is a TypeError
    super::define(&mut interp, original, "constructor", JsValue::Object(ctor));
    let species = PropertyKey::Symbol(interp.symbols.species.clone());
    interp
        .define_own_property(
            ctor,
            &species,
            js_object_model::PropertyDescriptor::data(JsValue::Number(1.0)),
        )
        .unwrap();
    let err = array_species_create(&mut interp, original, 0).unwrap_err();
    assert!(err.is_type_error());
}

#[test]
fn test_length_property_attributes() {
    let mut interp = create_test_runtime();
    let array = interp.create_array_from(numbers(&[1.0, 2.0]));
    let length = interp
        .get_own_property(array, &PropertyKey::from("length"))
        .unwrap()
        .unwrap();
    assert!(length.writable());
    assert!(!length.enumerable);
    assert!(!length.configurable);
    assert_eq!(length.value(), Some(&JsValue::Number(2.0)));

    let proto = JsValue::Object(interp.realm.intrinsics.array_prototype);
    let ctor = get(&mut interp, &proto, "constructor");
    assert_eq!(ctor, array_ctor(&interp));
}
