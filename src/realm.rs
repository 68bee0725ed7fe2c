//! Realm and intrinsics
//!
//! A realm owns every built-in prototype and constructor plus the global
//! object. The intrinsic objects are allocated as empty shells up front so that
//! initializers can link them to each other in any order; each builtin module
//! then fills its shells in exactly once.

use rustc_hash::FxHashSet;

use crate::completion::ThrowCompletionOr;
use crate::error::JsError;
use crate::gc::Heap;
use crate::value::{JsObject, JsObjectRef};

/// The intrinsic objects of a realm (`%Array%`, `%Array.prototype%`, ...)
#[derive(Debug, Clone)]
pub struct Intrinsics {
    pub object_prototype: JsObjectRef,
    pub function_prototype: JsObjectRef,
    pub array_prototype: JsObjectRef,
    pub iterator_prototype: JsObjectRef,
    pub async_iterator_prototype: JsObjectRef,
    pub array_iterator_prototype: JsObjectRef,
    pub string_iterator_prototype: JsObjectRef,
    pub string_prototype: JsObjectRef,
    pub number_prototype: JsObjectRef,
    pub boolean_prototype: JsObjectRef,
    pub symbol_prototype: JsObjectRef,
    pub error_prototype: JsObjectRef,
    pub type_error_prototype: JsObjectRef,
    pub range_error_prototype: JsObjectRef,
    pub promise_prototype: JsObjectRef,

    pub array_constructor: JsObjectRef,
    pub error_constructor: JsObjectRef,
    pub type_error_constructor: JsObjectRef,
    pub range_error_constructor: JsObjectRef,
    pub promise_constructor: JsObjectRef,
    pub proxy_constructor: JsObjectRef,
}

impl Intrinsics {
    fn allocate(heap: &mut Heap<JsObject>) -> Self {
        let object_prototype = heap.alloc(JsObject::new());
        let mut proto = || heap.alloc(JsObject::with_prototype(Some(object_prototype)));

        let function_prototype = proto();
        let array_prototype = proto();
        let iterator_prototype = proto();
        let async_iterator_prototype = proto();
        let string_prototype = proto();
        let number_prototype = proto();
        let boolean_prototype = proto();
        let symbol_prototype = proto();
        let error_prototype = proto();
        let promise_prototype = proto();

        let array_iterator_prototype = heap.alloc(JsObject::with_prototype(Some(iterator_prototype)));
        let string_iterator_prototype =
            heap.alloc(JsObject::with_prototype(Some(iterator_prototype)));
        let type_error_prototype = heap.alloc(JsObject::with_prototype(Some(error_prototype)));
        let range_error_prototype = heap.alloc(JsObject::with_prototype(Some(error_prototype)));

        // Constructor shells; `initialize` turns them into functions
        let mut ctor = || heap.alloc(JsObject::with_prototype(Some(function_prototype)));
        let array_constructor = ctor();
        let error_constructor = ctor();
        let promise_constructor = ctor();
        let proxy_constructor = ctor();

        // NativeError constructors inherit from %Error%
        let type_error_constructor = heap.alloc(JsObject::with_prototype(Some(error_constructor)));
        let range_error_constructor = heap.alloc(JsObject::with_prototype(Some(error_constructor)));

        Self {
            object_prototype,
            function_prototype,
            array_prototype,
            iterator_prototype,
            async_iterator_prototype,
            array_iterator_prototype,
            string_iterator_prototype,
            string_prototype,
            number_prototype,
            boolean_prototype,
            symbol_prototype,
            error_prototype,
            type_error_prototype,
            range_error_prototype,
            promise_prototype,
            array_constructor,
            error_constructor,
            type_error_constructor,
            range_error_constructor,
            promise_constructor,
            proxy_constructor,
        }
    }

    /// Every intrinsic, for rooting
    pub fn all(&self) -> [JsObjectRef; 21] {
        [
            self.object_prototype,
            self.function_prototype,
            self.array_prototype,
            self.iterator_prototype,
            self.async_iterator_prototype,
            self.array_iterator_prototype,
            self.string_iterator_prototype,
            self.string_prototype,
            self.number_prototype,
            self.boolean_prototype,
            self.symbol_prototype,
            self.error_prototype,
            self.type_error_prototype,
            self.range_error_prototype,
            self.promise_prototype,
            self.array_constructor,
            self.error_constructor,
            self.type_error_constructor,
            self.range_error_constructor,
            self.promise_constructor,
            self.proxy_constructor,
        ]
    }
}

/// An isolated set of intrinsics sharing one heap
#[derive(Debug)]
pub struct Realm {
    pub intrinsics: Intrinsics,
    pub global_object: JsObjectRef,
    initialized: FxHashSet<&'static str>,
}

impl Realm {
    /// Allocate the intrinsic shells and the global object
    pub fn new(heap: &mut Heap<JsObject>) -> Self {
        let intrinsics = Intrinsics::allocate(heap);
        let global_object = heap.alloc(JsObject::with_prototype(Some(intrinsics.object_prototype)));
        log::debug!("realm allocated: {} intrinsics", intrinsics.all().len());
        Self {
            intrinsics,
            global_object,
            initialized: FxHashSet::default(),
        }
    }

    /// Record that the intrinsic `name` has been wired up.
    ///
    /// Intrinsics are initialized once per realm; a second attempt is an error.
    pub fn mark_initialized(&mut self, name: &'static str) -> ThrowCompletionOr<()> {
        if !self.initialized.insert(name) {
            return Err(JsError::internal_error(format!(
                "intrinsic {} is already initialized",
                name
            )));
        }
        log::trace!("initialized intrinsic {}", name);
        Ok(())
    }

    pub fn is_initialized(&self, name: &str) -> bool {
        self.initialized.contains(name)
    }

    /// Objects the realm keeps alive
    pub fn roots(&self) -> impl Iterator<Item = JsObjectRef> + '_ {
        self.intrinsics
            .all()
            .into_iter()
            .chain(std::iter::once(self.global_object))
    }
}
