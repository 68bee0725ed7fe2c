//! Tests for property storage, lookup and conversions

use super::{create_test_runtime, define, get, json};
use js_object_model::{JsValue, Property, PropertyDescriptor, PropertyKey};

#[test]
fn test_get_walks_prototype_chain() {
    let mut interp = create_test_runtime();
    let grandparent = interp.create_object();
    define(&mut interp, grandparent, "inherited", JsValue::from("deep"));
    let parent = interp.create_object_with_proto(Some(grandparent));
    let child = interp.create_object_with_proto(Some(parent));

    let key = PropertyKey::from("inherited");
    assert_eq!(interp.get(child, &key).unwrap(), JsValue::from("deep"));
    assert!(interp.has_property(child, &key).unwrap());
    assert!(!interp.has_own_property(child, &key).unwrap());

    // Assignment creates an own property on the receiver, shadowing the chain
    interp.set(child, &key, JsValue::from("own"), true).unwrap();
    assert_eq!(interp.get(child, &key).unwrap(), JsValue::from("own"));
    assert_eq!(interp.get(grandparent, &key).unwrap(), JsValue::from("deep"));
}

#[test]
fn test_accessors_receive_the_receiver() {
    let mut interp = create_test_runtime();
    let proto = interp.create_object();
    let getter = interp.create_host_function("get value", 0, |interp, this, _args| {
        interp.get_v(&this, &PropertyKey::from("_value"))
    });
    let setter = interp.create_host_function("set value", 1, |interp, this, args| {
        let JsValue::Object(obj) = this else {
            return Ok(JsValue::Undefined);
        };
        let value = args.first().cloned().unwrap_or_default();
        interp.create_data_property_or_throw(obj, &PropertyKey::from("_value"), value)?;
        Ok(JsValue::Undefined)
    });
    interp
        .object_mut(proto)
        .unwrap()
        .define_property(PropertyKey::from("value"), Property::accessor(Some(getter), Some(setter), false, true));

    let obj = interp.create_object_with_proto(Some(proto));
    interp.set(obj, &PropertyKey::from("value"), JsValue::Number(5.0), true).unwrap();
    assert!(interp.has_own_property(obj, &PropertyKey::from("_value")).unwrap());
    assert!(!interp.has_own_property(proto, &PropertyKey::from("_value")).unwrap());
    assert_eq!(get(&mut interp, &JsValue::Object(obj), "value"), JsValue::Number(5.0));
}

#[test]
fn test_getter_only_accessor_rejects_assignment() {
    let mut interp = create_test_runtime();
    let obj = interp.create_object();
    let getter = interp.create_host_function("get x", 0, |_, _, _| Ok(JsValue::Number(1.0)));
    interp
        .object_mut(obj)
        .unwrap()
        .define_property(PropertyKey::from("x"), Property::accessor(Some(getter), None, true, true));

    let key = PropertyKey::from("x");
    assert!(interp.set(obj, &key, JsValue::Null, false).is_ok());
    assert!(interp.set(obj, &key, JsValue::Null, true).unwrap_err().is_type_error());
    assert_eq!(interp.get(obj, &key).unwrap(), JsValue::Number(1.0));
}

#[test]
fn test_own_keys_order() {
    let mut interp = create_test_runtime();
    let obj = interp.create_object();
    let symbol = interp.create_symbol(Some("tag"));
    define(&mut interp, obj, "b", JsValue::Null);
    define(&mut interp, obj, symbol.clone(), JsValue::Null);
    define(&mut interp, obj, "10", JsValue::Null);
    define(&mut interp, obj, "a", JsValue::Null);
    define(&mut interp, obj, "2", JsValue::Null);

    assert_eq!(
        interp.own_property_keys(obj).unwrap(),
        vec![
            PropertyKey::Index(2),
            PropertyKey::Index(10),
            PropertyKey::from("b"),
            PropertyKey::from("a"),
            PropertyKey::Symbol(symbol),
        ]
    );
}

#[test]
fn test_array_length_tracks_indices() {
    let mut interp = create_test_runtime();
    let array = interp.create_array_from(vec![]);
    let value = JsValue::Object(array);

    interp.set(array, &PropertyKey::Index(4), JsValue::from("e"), true).unwrap();
    assert_eq!(get(&mut interp, &value, "length"), JsValue::Number(5.0));

    interp.set(array, &PropertyKey::from("length"), JsValue::Number(2.0), true).unwrap();
    assert!(!interp.has_own_property(array, &PropertyKey::Index(4)).unwrap());
    assert_eq!(json(&mut interp, &value), serde_json::json!([null, null]));

    let err = interp
        .set(array, &PropertyKey::from("length"), JsValue::Number(-1.0), true)
        .unwrap_err();
    assert!(err.is_range_error());
}

#[test]
fn test_non_writable_length_blocks_growth() {
    let mut interp = create_test_runtime();
    let array = interp.create_array_from(vec![JsValue::Number(1.0)]);
    let frozen_length = PropertyDescriptor {
        writable: Some(false),
        ..Default::default()
    };
    assert!(interp
        .define_own_property(array, &PropertyKey::from("length"), frozen_length)
        .unwrap());

    assert!(!interp
        .create_data_property(array, &PropertyKey::Index(1), JsValue::Null)
        .unwrap());
    let err = interp
        .set(array, &PropertyKey::from("length"), JsValue::Number(0.0), true)
        .unwrap_err();
    assert!(err.is_type_error());
    assert_eq!(interp.length_of_array_like(array).unwrap(), 1);
}

#[test]
fn test_non_extensible_object() {
    let mut interp = create_test_runtime();
    let obj = interp.create_object();
    define(&mut interp, obj, "kept", JsValue::Number(1.0));
    assert!(interp.prevent_extensions(obj).unwrap());
    assert!(!interp.is_extensible(obj).unwrap());

    assert!(!interp
        .create_data_property(obj, &PropertyKey::from("added"), JsValue::Null)
        .unwrap());
    // Existing properties stay writable
    interp.set(obj, &PropertyKey::from("kept"), JsValue::Number(2.0), true).unwrap();
    assert_eq!(get(&mut interp, &JsValue::Object(obj), "kept"), JsValue::Number(2.0));
    // And the prototype is fixed
    let other = interp.create_object();
    assert!(!interp.set_prototype_of(obj, Some(other)).unwrap());
}

#[test]
fn test_prototype_cycles_are_rejected() {
    let mut interp = create_test_runtime();
    let a = interp.create_object();
    let b = interp.create_object_with_proto(Some(a));
    assert!(!interp.set_prototype_of(a, Some(b)).unwrap());
    assert!(!interp.set_prototype_of(a, Some(a)).unwrap());
    assert!(interp.set_prototype_of(a, None).unwrap());
    assert_eq!(interp.get_prototype_of(a).unwrap(), None);
}

#[test]
fn test_delete_respects_configurable() {
    let mut interp = create_test_runtime();
    let obj = interp.create_object();
    define(&mut interp, obj, "loose", JsValue::Null);
    interp
        .object_mut(obj)
        .unwrap()
        .define_property(PropertyKey::from("fixed"), Property::with_attributes(JsValue::Null, true, true, false));

    assert!(interp.delete(obj, &PropertyKey::from("loose")).unwrap());
    assert!(interp.delete(obj, &PropertyKey::from("missing")).unwrap());
    assert!(!interp.delete(obj, &PropertyKey::from("fixed")).unwrap());
    assert!(interp
        .delete_property_or_throw(obj, &PropertyKey::from("fixed"))
        .unwrap_err()
        .is_type_error());
}

#[test]
fn test_descriptor_objects_round_trip() {
    let mut interp = create_test_runtime();
    let desc = PropertyDescriptor {
        value: Some(JsValue::Number(1.0)),
        writable: Some(false),
        ..Default::default()
    };
    let obj = interp.from_property_descriptor(Some(&desc));
    assert_eq!(
        json(&mut interp, &obj),
        serde_json::json!({"value": 1.0, "writable": false})
    );
    let back = interp.to_property_descriptor(&obj).unwrap();
    assert_eq!(back.value, Some(JsValue::Number(1.0)));
    assert_eq!(back.writable, Some(false));
    assert_eq!(back.enumerable, None);

    let both = super::from_json(&mut interp, serde_json::json!({"value": 1, "get": null}));
    assert!(interp.to_property_descriptor(&both).unwrap_err().is_type_error());
    assert!(interp
        .to_property_descriptor(&JsValue::Number(1.0))
        .unwrap_err()
        .is_type_error());
}

#[test]
fn test_conversions() {
    let mut interp = create_test_runtime();
    assert_eq!(interp.to_length(&JsValue::Number(-5.0)).unwrap(), 0);
    assert_eq!(interp.to_length(&JsValue::Number(3.7)).unwrap(), 3);
    assert_eq!(
        interp.to_length(&JsValue::Number(f64::INFINITY)).unwrap(),
        9_007_199_254_740_991
    );
    assert_eq!(interp.to_length(&JsValue::from("12")).unwrap(), 12);
    assert_eq!(interp.to_uint32(&JsValue::Number(-1.0)).unwrap(), u32::MAX);

    // Objects convert through valueOf
    let obj = interp.create_object();
    let value_of = interp.create_host_function("valueOf", 0, |_, _, _| Ok(JsValue::Number(8.0)));
    define(&mut interp, obj, "valueOf", JsValue::Object(value_of));
    assert_eq!(interp.to_number(&JsValue::Object(obj)).unwrap(), 8.0);

    assert_eq!(
        interp.to_property_key(&JsValue::Number(1.0)).unwrap(),
        PropertyKey::Index(1)
    );
    assert!(interp.to_object(&JsValue::Null).unwrap_err().is_type_error());
    let wrapper = interp.to_object(&JsValue::from("hi")).unwrap();
    assert_eq!(interp.length_of_array_like(wrapper).unwrap(), 2);
}

#[test]
fn test_json_refuses_huge_sparse_arrays() {
    let mut interp = create_test_runtime();
    let ctor = interp.realm.intrinsics.array_constructor;
    let small = interp.construct(ctor, &[JsValue::Number(3.0)], None).unwrap();
    assert_eq!(
        json(&mut interp, &JsValue::Object(small)),
        serde_json::json!([null, null, null])
    );

    let huge = interp
        .construct(ctor, &[JsValue::Number(4_294_967_295.0)], None)
        .unwrap();
    let err = interp.value_to_json(&JsValue::Object(huge)).unwrap_err();
    assert!(err.is_range_error());
}
