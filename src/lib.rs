//! Garbage-collected object model for an ECMAScript runtime
//!
//! The crate provides the pieces a bytecode interpreter sits on: an arena heap
//! with explicit tracing, objects with ordered properties and prototype links,
//! a realm of intrinsics, call/construct dispatch, a microtask queue, and the
//! Array constructor family (`Array`, `Array.from`, `Array.fromAsync`,
//! `Array.isArray`, `Array.of`, `Array[@@species]`).
//!
//! # Example
//!
//! ```
//! use js_object_model::{Interpreter, JsValue, PropertyKey};
//!
//! let mut interp = Interpreter::new().unwrap();
//! let array_ctor = JsValue::Object(interp.realm.intrinsics.array_constructor);
//! let from = interp.get_v(&array_ctor, &PropertyKey::from("from")).unwrap();
//!
//! let source = interp.value_from_json(&serde_json::json!({"length": 2, "0": "a", "1": "b"}));
//! let array = interp.call(&from, array_ctor, &[source]).unwrap();
//! assert_eq!(
//!     interp.value_to_json(&array).unwrap(),
//!     serde_json::json!(["a", "b"])
//! );
//! ```

pub mod completion;
pub mod error;
pub mod gc;
pub mod interpreter;
pub mod realm;
pub mod value;

pub use completion::{Completion, ThrowCompletionOr};
pub use error::JsError;
pub use gc::{Gc, GcStats, Guard, Heap};
pub use interpreter::{Interpreter, InterpreterConfig};
pub use realm::{Intrinsics, Realm};
pub use value::{
    CheapClone, JsObject, JsObjectRef, JsString, JsSymbol, JsValue, Property, PropertyDescriptor,
    PropertyKey,
};
