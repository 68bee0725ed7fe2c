//! Array.fromAsync(asyncItems, mapFn, thisArg)
//!
//! The operation is a small state machine stored in a heap cell
//! (`ExoticObject::AsyncFromTask`). Every await hands the cell's two
//! continuation functions to `PerformPromiseThen`; the job that settles the
//! awaited promise resumes the machine with the settled value. Only one await
//! is outstanding at a time, so steps run strictly in input order.

use crate::completion::ThrowCompletionOr;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::interpreter::iteration::IteratorRecord;
use crate::value::{
    ExoticObject, JsObject, JsObjectRef, JsValue, MAX_SAFE_INTEGER, PromiseCapability, PropertyKey,
    trace_value,
};

use super::array::{construct_this_or_array, mapping_function};
use super::{arg, promise};

/// Where the values come from
#[derive(Debug, Clone)]
enum FromAsyncSource {
    /// `@@asyncIterator`, or `@@iterator` whose values are awaited
    Iterator { record: IteratorRecord, is_async: bool },
    ArrayLike { object: JsObjectRef, length: u64 },
}

/// What the outstanding await will deliver
#[derive(Debug, Clone)]
enum Phase {
    /// Result object of an async iterator's `next()`
    AwaitingNext,
    /// An element (array-like or sync iterator value)
    AwaitingValue,
    /// The result of `mapFn`
    AwaitingMapped,
    /// The result of an async iterator's `return()`; rejects with `error` after
    Closing { error: JsValue },
    Done,
}

/// Suspended state of one `Array.fromAsync` call
#[derive(Debug, Clone)]
pub struct FromAsyncTask {
    capability: PromiseCapability,
    mapper: Option<JsObjectRef>,
    this_arg: JsValue,
    target: JsObjectRef,
    source: FromAsyncSource,
    index: u64,
    phase: Phase,
    on_fulfilled: JsObjectRef,
    on_rejected: JsObjectRef,
}

impl FromAsyncTask {
    pub(crate) fn trace<F: FnMut(JsObjectRef)>(&self, visitor: &mut F) {
        self.capability.trace(visitor);
        if let Some(mapper) = self.mapper {
            visitor(mapper);
        }
        trace_value(&self.this_arg, visitor);
        visitor(self.target);
        match &self.source {
            FromAsyncSource::Iterator { record, .. } => {
                visitor(record.iterator);
                trace_value(&record.next_method, visitor);
            }
            FromAsyncSource::ArrayLike { object, .. } => visitor(*object),
        }
        if let Phase::Closing { error } = &self.phase {
            trace_value(error, visitor);
        }
        visitor(self.on_fulfilled);
        visitor(self.on_rejected);
    }

    /// How a failed await in the current phase ends the operation
    fn await_failed(&self, error: JsValue) -> Step {
        match &self.phase {
            Phase::Closing { error: original } => Step::Reject(original.clone()),
            Phase::AwaitingValue | Phase::AwaitingMapped => Step::Fail { error, close: true },
            Phase::AwaitingNext | Phase::Done => Step::Fail {
                error,
                close: false,
            },
        }
    }
}

/// Outcome of running the machine until it blocks
enum Step {
    /// Suspend until `value` settles
    Await(JsValue),
    /// Set `length` and resolve with the target
    Finish(u64),
    /// Abrupt completion; `close` requests closing an open iterator first
    Fail { error: JsValue, close: bool },
    /// Reject the result promise
    Reject(JsValue),
    /// Nothing left to do
    Idle,
}

enum Resume {
    Start,
    Fulfilled(JsValue),
    Rejected(JsValue),
}

/// Array.fromAsync(asyncItems, mapFn, thisArg): always returns a promise
pub fn array_from_async(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let capability = promise::new_intrinsic_capability(interp)?;
    let result = capability.promise;
    if let Err(err) = start(interp, &this, args, capability.clone()) {
        let reason = interp.error_to_value(err);
        interp.call_function(capability.reject, JsValue::Undefined, &[reason])?;
    }
    Ok(JsValue::Object(result))
}

fn start(
    interp: &mut Interpreter,
    this: &JsValue,
    args: &[JsValue],
    capability: PromiseCapability,
) -> ThrowCompletionOr<()> {
    let items = arg(args, 0);
    let this_arg = arg(args, 2);
    let mapper = mapping_function(interp, &arg(args, 1))?;

    let async_key = PropertyKey::Symbol(interp.symbols.async_iterator.clone());
    let sync_key = PropertyKey::Symbol(interp.symbols.iterator.clone());
    let method = match interp.get_method(&items, &async_key)? {
        Some(method) => Some((method, true)),
        None => interp.get_method(&items, &sync_key)?.map(|method| (method, false)),
    };

    let (target, source) = match method {
        Some((method, is_async)) => {
            let target = construct_this_or_array(interp, this, &[], 0)?;
            let record = interp.get_iterator_from_method(&items, method)?;
            (target, FromAsyncSource::Iterator { record, is_async })
        }
        None => {
            let object = interp.to_object(&items)?;
            let length = interp.length_of_array_like(object)?;
            let target =
                construct_this_or_array(interp, this, &[JsValue::Number(length as f64)], length)?;
            (target, FromAsyncSource::ArrayLike { object, length })
        }
    };

    let on_fulfilled =
        interp.create_native_closure("", from_async_fulfilled, 1, vec![JsValue::Undefined]);
    let on_rejected =
        interp.create_native_closure("", from_async_rejected, 1, vec![JsValue::Undefined]);
    let task = FromAsyncTask {
        capability,
        mapper,
        this_arg,
        target,
        source,
        index: 0,
        phase: Phase::AwaitingValue,
        on_fulfilled,
        on_rejected,
    };
    let task_obj = interp.heap.alloc(JsObject::with_exotic(
        None,
        ExoticObject::AsyncFromTask(Box::new(task)),
    ));
    interp.set_function_slot(on_fulfilled, 0, JsValue::Object(task_obj))?;
    interp.set_function_slot(on_rejected, 0, JsValue::Object(task_obj))?;

    drive(interp, task_obj, Resume::Start)
}

fn from_async_fulfilled(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let task_obj = active_task(interp)?;
    continue_task(interp, task_obj, Resume::Fulfilled(arg(args, 0)))?;
    Ok(JsValue::Undefined)
}

fn from_async_rejected(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> ThrowCompletionOr<JsValue> {
    let task_obj = active_task(interp)?;
    continue_task(interp, task_obj, Resume::Rejected(arg(args, 0)))?;
    Ok(JsValue::Undefined)
}

/// Resume the machine from a job. Errors that escape the machine reject the
/// result promise so it never stays pending.
fn continue_task(
    interp: &mut Interpreter,
    task_obj: JsObjectRef,
    input: Resume,
) -> ThrowCompletionOr<()> {
    let Err(err) = drive(interp, task_obj, input) else {
        return Ok(());
    };
    log::debug!("fromAsync: continuation failed: {}", err);
    let mut task = load_task(interp, task_obj)?;
    task.phase = Phase::Done;
    store_task(interp, task_obj, &task)?;
    let reason = interp.error_to_value(err);
    settle(interp, task.capability.reject, reason)
}

fn active_task(interp: &Interpreter) -> ThrowCompletionOr<JsObjectRef> {
    match interp.active_slot(0)? {
        JsValue::Object(task) => Ok(task),
        _ => Err(JsError::internal_error("fromAsync continuation without a task")),
    }
}

fn load_task(interp: &Interpreter, task_obj: JsObjectRef) -> ThrowCompletionOr<FromAsyncTask> {
    match &interp.object(task_obj)?.exotic {
        ExoticObject::AsyncFromTask(task) => Ok(task.as_ref().clone()),
        _ => Err(JsError::internal_error("not a fromAsync task")),
    }
}

fn store_task(
    interp: &mut Interpreter,
    task_obj: JsObjectRef,
    task: &FromAsyncTask,
) -> ThrowCompletionOr<()> {
    interp.object_mut(task_obj)?.exotic = ExoticObject::AsyncFromTask(Box::new(task.clone()));
    Ok(())
}

/// Run the machine from `input` until it awaits or settles the result promise
fn drive(interp: &mut Interpreter, task_obj: JsObjectRef, input: Resume) -> ThrowCompletionOr<()> {
    let mut task = load_task(interp, task_obj)?;
    let mut step = match input {
        _ if matches!(task.phase, Phase::Done) => Step::Idle,
        Resume::Start => advance(interp, &mut task),
        Resume::Fulfilled(value) => resume(interp, &mut task, value),
        Resume::Rejected(reason) => task.await_failed(reason),
    };

    loop {
        match step {
            Step::Await(value) => {
                log::trace!("fromAsync: await at index {} ({:?})", task.index, task.phase);
                store_task(interp, task_obj, &task)?;
                match promise::await_value(interp, value, task.on_fulfilled, task.on_rejected) {
                    Ok(()) => return Ok(()),
                    Err(err) => {
                        let error = interp.error_to_value(err);
                        step = task.await_failed(error);
                    }
                }
            }
            Step::Finish(length) => {
                task.phase = Phase::Done;
                store_task(interp, task_obj, &task)?;
                let set_length = interp.set(
                    task.target,
                    &PropertyKey::from("length"),
                    JsValue::Number(length as f64),
                    true,
                );
                return match set_length {
                    Ok(()) => {
                        log::trace!("fromAsync: resolved with {} elements", length);
                        let target = JsValue::Object(task.target);
                        settle(interp, task.capability.resolve, target)
                    }
                    Err(err) => {
                        let reason = interp.error_to_value(err);
                        settle(interp, task.capability.reject, reason)
                    }
                };
            }
            Step::Fail { error, close } => {
                step = fail(interp, &mut task, error, close);
            }
            Step::Reject(error) => {
                log::trace!("fromAsync: rejected at index {}", task.index);
                task.phase = Phase::Done;
                store_task(interp, task_obj, &task)?;
                return settle(interp, task.capability.reject, error);
            }
            Step::Idle => return store_task(interp, task_obj, &task),
        }
    }
}

fn settle(interp: &mut Interpreter, func: JsObjectRef, value: JsValue) -> ThrowCompletionOr<()> {
    interp.call_function(func, JsValue::Undefined, &[value])?;
    Ok(())
}

fn abrupt(interp: &mut Interpreter, err: JsError, close: bool) -> Step {
    Step::Fail {
        error: interp.error_to_value(err),
        close,
    }
}

/// Continue after an await fulfilled
fn resume(interp: &mut Interpreter, task: &mut FromAsyncTask, value: JsValue) -> Step {
    match &task.phase {
        Phase::AwaitingNext => after_next(interp, task, value),
        Phase::AwaitingValue => after_value(interp, task, value),
        Phase::AwaitingMapped => define(interp, task, value),
        Phase::Closing { error } => Step::Reject(error.clone()),
        Phase::Done => Step::Idle,
    }
}

/// Request the next element
fn advance(interp: &mut Interpreter, task: &mut FromAsyncTask) -> Step {
    match &task.source {
        FromAsyncSource::ArrayLike { object, length } => {
            if task.index >= *length {
                return Step::Finish(*length);
            }
            let object = *object;
            match interp.get(object, &PropertyKey::from_u64(task.index)) {
                Ok(value) => {
                    task.phase = Phase::AwaitingValue;
                    Step::Await(value)
                }
                Err(err) => abrupt(interp, err, false),
            }
        }
        FromAsyncSource::Iterator { record, is_async } => {
            if task.index as f64 >= MAX_SAFE_INTEGER {
                return abrupt(
                    interp,
                    JsError::type_error("Array.fromAsync: too many elements"),
                    true,
                );
            }
            let is_async = *is_async;
            let next = interp.call(
                &record.next_method.clone(),
                JsValue::Object(record.iterator),
                &[],
            );
            match next {
                Ok(result) if is_async => {
                    task.phase = Phase::AwaitingNext;
                    Step::Await(result)
                }
                Ok(result) => after_next(interp, task, result),
                Err(err) => abrupt(interp, err, false),
            }
        }
    }
}

/// Inspect an iterator result object
fn after_next(interp: &mut Interpreter, task: &mut FromAsyncTask, result: JsValue) -> Step {
    let JsValue::Object(result) = result else {
        return abrupt(
            interp,
            JsError::type_error("Iterator result is not an object"),
            false,
        );
    };
    match interp.iterator_complete(result) {
        Ok(true) => return Step::Finish(task.index),
        Ok(false) => {}
        Err(err) => return abrupt(interp, err, false),
    }
    let value = match interp.iterator_value(result) {
        Ok(value) => value,
        Err(err) => return abrupt(interp, err, false),
    };
    match task.source {
        FromAsyncSource::Iterator { is_async: true, .. } => after_value(interp, task, value),
        _ => {
            task.phase = Phase::AwaitingValue;
            Step::Await(value)
        }
    }
}

/// Apply `mapFn` to an element, or define it directly
fn after_value(interp: &mut Interpreter, task: &mut FromAsyncTask, value: JsValue) -> Step {
    let Some(mapper) = task.mapper else {
        return define(interp, task, value);
    };
    let args = [value, JsValue::Number(task.index as f64)];
    match interp.call_function(mapper, task.this_arg.clone(), &args) {
        Ok(mapped) => {
            task.phase = Phase::AwaitingMapped;
            Step::Await(mapped)
        }
        Err(err) => abrupt(interp, err, true),
    }
}

fn define(interp: &mut Interpreter, task: &mut FromAsyncTask, value: JsValue) -> Step {
    let key = PropertyKey::from_u64(task.index);
    if let Err(err) = interp.create_data_property_or_throw(task.target, &key, value) {
        return abrupt(interp, err, true);
    }
    task.index += 1;
    advance(interp, task)
}

/// Close an open iterator (when requested) before rejecting
fn fail(interp: &mut Interpreter, task: &mut FromAsyncTask, error: JsValue, close: bool) -> Step {
    let FromAsyncSource::Iterator { record, is_async } = &task.source else {
        return Step::Reject(error);
    };
    if !close {
        return Step::Reject(error);
    }
    let iterator = record.iterator;

    if !*is_async {
        let closed: ThrowCompletionOr<()> =
            interp.iterator_close(iterator, Err(JsError::thrown(error)));
        let reason = match closed {
            Ok(()) => JsValue::Undefined,
            Err(err) => interp.error_to_value(err),
        };
        return Step::Reject(reason);
    }

    let iterator_value = JsValue::Object(iterator);
    let inner = match interp.get_method(&iterator_value, &PropertyKey::from("return")) {
        Ok(Some(return_method)) => interp.call_function(return_method, iterator_value, &[]),
        Ok(None) => return Step::Reject(error),
        Err(err) => Err(err),
    };
    match inner {
        Ok(result) => {
            task.phase = Phase::Closing { error };
            Step::Await(result)
        }
        Err(suppressed) => {
            log::debug!("async iterator close failed after abrupt completion: {}", suppressed);
            Step::Reject(error)
        }
    }
}
