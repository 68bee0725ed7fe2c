//! Promise constructor, `then`, and the job machinery behind `await`
//!
//! Reactions never run synchronously: settling a promise enqueues one
//! `Job::PromiseReaction` per registered reaction, and `Interpreter::run_jobs`
//! runs them in FIFO order.

use crate::completion::ThrowCompletionOr;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::interpreter::jobs::Job;
use crate::value::{
    ExoticObject, JsObjectRef, JsValue, PromiseCapability, PromiseReaction, PromiseState,
    PromiseStatus, Property, PropertyKey, ReactionKind,
};

use super::{arg, link_constructor};

// Slots of the resolving functions
const SLOT_PROMISE: usize = 0;
const SLOT_ALREADY_RESOLVED: usize = 1;
const SLOT_PARTNER: usize = 2;

/// Initialize %Promise% and %Promise.prototype%
pub fn initialize(interp: &mut Interpreter) -> ThrowCompletionOr<()> {
    interp.realm.mark_initialized("Promise")?;
    let ctor = interp.realm.intrinsics.promise_constructor;
    let proto = interp.realm.intrinsics.promise_prototype;

    interp.make_intrinsic_constructor(ctor, "Promise", promise_call, Some(promise_construct), 1)?;
    link_constructor(interp, ctor, proto)?;
    interp.register_method(ctor, "resolve", promise_resolve_static, 1)?;
    interp.register_method(ctor, "reject", promise_reject_static, 1)?;
    interp.register_method(proto, "then", promise_then, 2)?;

    let tag = PropertyKey::Symbol(interp.symbols.to_string_tag.clone());
    interp.object_mut(proto)?.define_property(
        tag,
        Property::with_attributes(JsValue::from("Promise"), false, false, true),
    );
    Ok(())
}

pub fn is_promise(interp: &Interpreter, value: &JsValue) -> bool {
    match value {
        JsValue::Object(obj) => interp
            .heap
            .get(*obj)
            .is_some_and(|o| matches!(o.exotic, ExoticObject::Promise(_))),
        _ => false,
    }
}

fn promise_call(
    _interp: &mut Interpreter,
    _this: JsValue,
    _args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    Err(JsError::type_error("Promise constructor cannot be invoked without 'new'"))
}

/// new Promise(executor)
fn promise_construct(
    interp: &mut Interpreter,
    args: &[JsValue],
    new_target: JsObjectRef,
) -> ThrowCompletionOr<JsObjectRef> {
    let executor = arg(args, 0);
    if !interp.is_callable(&executor) {
        return Err(JsError::type_error("Promise resolver is not a function"));
    }
    let default_proto = interp.realm.intrinsics.promise_prototype;
    let promise = interp.ordinary_create_from_constructor(
        new_target,
        default_proto,
        ExoticObject::Promise(PromiseState::pending()),
    )?;
    let (resolve, reject) = create_resolving_functions(interp, promise)?;
    let completion = interp.call(
        &executor,
        JsValue::Undefined,
        &[JsValue::Object(resolve), JsValue::Object(reject)],
    );
    if let Err(err) = completion {
        let reason = interp.error_to_value(err);
        interp.call_function(reject, JsValue::Undefined, &[reason])?;
    }
    Ok(promise)
}

/// CreateResolvingFunctions(promise): the pair shares an already-resolved flag
pub fn create_resolving_functions(
    interp: &mut Interpreter,
    promise: JsObjectRef,
) -> ThrowCompletionOr<(JsObjectRef, JsObjectRef)> {
    let slots = |partner: JsValue| vec![JsValue::Object(promise), JsValue::Boolean(false), partner];
    let resolve =
        interp.create_native_closure("", promise_resolve_function, 1, slots(JsValue::Undefined));
    let reject = interp.create_native_closure(
        "",
        promise_reject_function,
        1,
        slots(JsValue::Object(resolve)),
    );
    interp.set_function_slot(resolve, SLOT_PARTNER, JsValue::Object(reject))?;
    Ok((resolve, reject))
}

/// Mark both resolving functions as used; `false` if they already were
fn claim_resolution(interp: &mut Interpreter) -> ThrowCompletionOr<Option<JsObjectRef>> {
    let func = interp.active_function()?;
    if interp.function_slot(func, SLOT_ALREADY_RESOLVED)?.to_boolean() {
        return Ok(None);
    }
    interp.set_function_slot(func, SLOT_ALREADY_RESOLVED, JsValue::Boolean(true))?;
    if let JsValue::Object(partner) = interp.function_slot(func, SLOT_PARTNER)? {
        interp.set_function_slot(partner, SLOT_ALREADY_RESOLVED, JsValue::Boolean(true))?;
    }
    match interp.function_slot(func, SLOT_PROMISE)? {
        JsValue::Object(promise) => Ok(Some(promise)),
        _ => Err(JsError::internal_error("resolving function without promise")),
    }
}

/// Promise resolve function
fn promise_resolve_function(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let Some(promise) = claim_resolution(interp)? else {
        return Ok(JsValue::Undefined);
    };
    resolve_promise(interp, promise, arg(args, 0))?;
    Ok(JsValue::Undefined)
}

/// Promise reject function
fn promise_reject_function(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let Some(promise) = claim_resolution(interp)? else {
        return Ok(JsValue::Undefined);
    };
    reject_promise(interp, promise, arg(args, 0))?;
    Ok(JsValue::Undefined)
}

/// The body of a resolve function: fulfill, or adopt a thenable via a job
fn resolve_promise(
    interp: &mut Interpreter,
    promise: JsObjectRef,
    resolution: JsValue,
) -> ThrowCompletionOr<()> {
    let JsValue::Object(thenable) = resolution else {
        return fulfill_promise(interp, promise, resolution);
    };
    if thenable == promise {
        let reason = interp.error_to_value(JsError::type_error(
            "Chaining cycle detected for promise",
        ));
        return reject_promise(interp, promise, reason);
    }
    let then = match interp.get(thenable, &PropertyKey::from("then")) {
        Ok(then) => then,
        Err(err) => {
            let reason = interp.error_to_value(err);
            return reject_promise(interp, promise, reason);
        }
    };
    match then {
        JsValue::Object(then) if interp.is_callable(&JsValue::Object(then)) => {
            interp.enqueue_job(Job::PromiseResolveThenable {
                promise,
                thenable,
                then,
            });
            Ok(())
        }
        _ => fulfill_promise(interp, promise, JsValue::Object(thenable)),
    }
}

fn settle_promise(
    interp: &mut Interpreter,
    promise: JsObjectRef,
    status: PromiseStatus,
    value: JsValue,
) -> ThrowCompletionOr<()> {
    let reactions = match &mut interp.object_mut(promise)?.exotic {
        ExoticObject::Promise(state) => {
            if state.status != PromiseStatus::Pending {
                return Ok(());
            }
            state.status = status;
            state.result = value.clone();
            let fulfill = std::mem::take(&mut state.fulfill_reactions);
            let reject = std::mem::take(&mut state.reject_reactions);
            if status == PromiseStatus::Fulfilled {
                fulfill
            } else {
                reject
            }
        }
        _ => return Err(JsError::type_error("not a promise")),
    };
    for reaction in reactions {
        interp.enqueue_job(Job::PromiseReaction {
            reaction,
            argument: value.clone(),
        });
    }
    Ok(())
}

/// FulfillPromise(promise, value)
pub fn fulfill_promise(
    interp: &mut Interpreter,
    promise: JsObjectRef,
    value: JsValue,
) -> ThrowCompletionOr<()> {
    settle_promise(interp, promise, PromiseStatus::Fulfilled, value)
}

/// RejectPromise(promise, reason)
pub fn reject_promise(
    interp: &mut Interpreter,
    promise: JsObjectRef,
    reason: JsValue,
) -> ThrowCompletionOr<()> {
    settle_promise(interp, promise, PromiseStatus::Rejected, reason)
}

/// Executor used by NewPromiseCapability for non-intrinsic constructors
fn capability_executor(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let func = interp.active_function()?;
    if !interp.function_slot(func, 0)?.is_undefined()
        || !interp.function_slot(func, 1)?.is_undefined()
    {
        return Err(JsError::type_error("Promise executor has already been invoked"));
    }
    interp.set_function_slot(func, 0, arg(args, 0))?;
    interp.set_function_slot(func, 1, arg(args, 1))?;
    Ok(JsValue::Undefined)
}

/// NewPromiseCapability(C)
pub fn new_promise_capability(
    interp: &mut Interpreter,
    constructor: &JsValue,
) -> ThrowCompletionOr<PromiseCapability> {
    let JsValue::Object(ctor) = constructor else {
        return Err(JsError::type_error("Promise capability constructor is not an object"));
    };
    if !interp.is_constructor(constructor) {
        return Err(JsError::type_error("Promise capability target is not a constructor"));
    }
    let executor = interp.create_native_closure(
        "",
        capability_executor,
        2,
        vec![JsValue::Undefined, JsValue::Undefined],
    );
    let promise = interp.construct(*ctor, &[JsValue::Object(executor)], None)?;
    let resolve = interp.function_slot(executor, 0)?;
    let reject = interp.function_slot(executor, 1)?;
    match (resolve, reject) {
        (JsValue::Object(resolve), JsValue::Object(reject))
            if interp.is_callable(&JsValue::Object(resolve))
                && interp.is_callable(&JsValue::Object(reject)) =>
        {
            Ok(PromiseCapability {
                promise,
                resolve,
                reject,
            })
        }
        _ => Err(JsError::type_error("Promise resolve or reject function is not callable")),
    }
}

/// NewPromiseCapability(%Promise%)
pub fn new_intrinsic_capability(interp: &mut Interpreter) -> ThrowCompletionOr<PromiseCapability> {
    let ctor = JsValue::Object(interp.realm.intrinsics.promise_constructor);
    new_promise_capability(interp, &ctor)
}

/// PerformPromiseThen(promise, onFulfilled, onRejected, resultCapability)
pub fn perform_then(
    interp: &mut Interpreter,
    promise: JsObjectRef,
    on_fulfilled: Option<JsObjectRef>,
    on_rejected: Option<JsObjectRef>,
    capability: Option<PromiseCapability>,
) -> ThrowCompletionOr<()> {
    let fulfill_reaction = PromiseReaction {
        capability: capability.clone(),
        kind: ReactionKind::Fulfill,
        handler: on_fulfilled,
    };
    let reject_reaction = PromiseReaction {
        capability,
        kind: ReactionKind::Reject,
        handler: on_rejected,
    };

    let settled = match &mut interp.object_mut(promise)?.exotic {
        ExoticObject::Promise(state) => {
            state.is_handled = true;
            match state.status {
                PromiseStatus::Pending => {
                    state.fulfill_reactions.push(fulfill_reaction);
                    state.reject_reactions.push(reject_reaction);
                    None
                }
                PromiseStatus::Fulfilled => Some((fulfill_reaction, state.result.clone())),
                PromiseStatus::Rejected => Some((reject_reaction, state.result.clone())),
            }
        }
        _ => return Err(JsError::type_error("not a promise")),
    };
    if let Some((reaction, argument)) = settled {
        interp.enqueue_job(Job::PromiseReaction { reaction, argument });
    }
    Ok(())
}

/// Promise.prototype.then(onFulfilled, onRejected)
pub fn promise_then(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    if !is_promise(interp, &this) {
        return Err(JsError::type_error("Promise.prototype.then called on incompatible receiver"));
    }
    let JsValue::Object(promise) = this else {
        return Err(JsError::type_error("Promise.prototype.then called on incompatible receiver"));
    };
    let default_ctor = interp.realm.intrinsics.promise_constructor;
    let ctor = interp.species_constructor(promise, default_ctor)?;
    let capability = new_promise_capability(interp, &JsValue::Object(ctor))?;
    let callable = |interp: &Interpreter, value: JsValue| match value {
        JsValue::Object(f) if interp.is_callable(&value) => Some(f),
        _ => None,
    };
    let on_fulfilled = callable(interp, arg(args, 0));
    let on_rejected = callable(interp, arg(args, 1));
    let result = capability.promise;
    perform_then(interp, promise, on_fulfilled, on_rejected, Some(capability))?;
    Ok(JsValue::Object(result))
}

/// PromiseResolve(C, x)
pub fn promise_resolve(
    interp: &mut Interpreter,
    constructor: JsObjectRef,
    value: JsValue,
) -> ThrowCompletionOr<JsObjectRef> {
    if let JsValue::Object(obj) = value {
        if is_promise(interp, &value) {
            let value_ctor = interp.get(obj, &PropertyKey::from("constructor"))?;
            if value_ctor == JsValue::Object(constructor) {
                return Ok(obj);
            }
        }
    }
    let capability = new_promise_capability(interp, &JsValue::Object(constructor))?;
    interp.call_function(capability.resolve, JsValue::Undefined, &[value])?;
    Ok(capability.promise)
}

/// Promise.resolve(x)
fn promise_resolve_static(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let JsValue::Object(ctor) = this else {
        return Err(JsError::type_error("Promise.resolve called on non-object"));
    };
    Ok(JsValue::Object(promise_resolve(interp, ctor, arg(args, 0))?))
}

/// Promise.reject(r)
fn promise_reject_static(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let capability = new_promise_capability(interp, &this)?;
    interp.call_function(capability.reject, JsValue::Undefined, &[arg(args, 0)])?;
    Ok(JsValue::Object(capability.promise))
}

/// Await(value): resume with `on_fulfilled(v)` or `on_rejected(reason)` from
/// a later job
pub fn await_value(
    interp: &mut Interpreter,
    value: JsValue,
    on_fulfilled: JsObjectRef,
    on_rejected: JsObjectRef,
) -> ThrowCompletionOr<()> {
    let ctor = interp.realm.intrinsics.promise_constructor;
    let promise = promise_resolve(interp, ctor, value)?;
    perform_then(interp, promise, Some(on_fulfilled), Some(on_rejected), None)
}

/// Run one queued job
pub fn run_job(interp: &mut Interpreter, job: Job) -> ThrowCompletionOr<()> {
    match job {
        Job::PromiseReaction { reaction, argument } => {
            let handler_result = match reaction.handler {
                Some(handler) => interp
                    .call_function(handler, JsValue::Undefined, &[argument])
                    .map_err(|err| interp.error_to_value(err)),
                None => match reaction.kind {
                    ReactionKind::Fulfill => Ok(argument),
                    ReactionKind::Reject => Err(argument),
                },
            };
            let Some(capability) = reaction.capability else {
                // Internal continuations settle through their own state
                if let Err(reason) = handler_result {
                    log::debug!("continuation failed: {:?}", reason);
                }
                return Ok(());
            };
            match handler_result {
                Ok(value) => interp.call_function(capability.resolve, JsValue::Undefined, &[value])?,
                Err(reason) => interp.call_function(capability.reject, JsValue::Undefined, &[reason])?,
            };
            Ok(())
        }
        Job::PromiseResolveThenable {
            promise,
            thenable,
            then,
        } => {
            let (resolve, reject) = create_resolving_functions(interp, promise)?;
            let completion = interp.call_function(
                then,
                JsValue::Object(thenable),
                &[JsValue::Object(resolve), JsValue::Object(reject)],
            );
            if let Err(err) = completion {
                let reason = interp.error_to_value(err);
                interp.call_function(reject, JsValue::Undefined, &[reason])?;
            }
            Ok(())
        }
    }
}

/// Settlement of a promise, for hosts and tests
pub fn promise_state(
    interp: &Interpreter,
    promise: JsObjectRef,
) -> ThrowCompletionOr<(PromiseStatus, JsValue)> {
    match &interp.object(promise)?.exotic {
        ExoticObject::Promise(state) => Ok((state.status, state.result.clone())),
        _ => Err(JsError::type_error("not a promise")),
    }
}
