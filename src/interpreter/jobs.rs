//! Job scheduling
//!
//! Promise reactions and `Array.fromAsync` continuations are queued as jobs and
//! run at microtask checkpoints (`Interpreter::run_jobs`). Hosts with their own
//! event loop can plug in a different [`JobQueue`].

use std::collections::VecDeque;

use crate::value::{JsObjectRef, JsValue, PromiseReaction, trace_value};

/// A unit of deferred work
#[derive(Debug, Clone)]
pub enum Job {
    /// NewPromiseReactionJob: run `reaction` with the settled value
    PromiseReaction {
        reaction: PromiseReaction,
        argument: JsValue,
    },
    /// NewPromiseResolveThenableJob: adopt the state of a thenable
    PromiseResolveThenable {
        promise: JsObjectRef,
        thenable: JsObjectRef,
        then: JsObjectRef,
    },
}

impl Job {
    /// Pass every object the job references to `visitor`
    pub fn trace<F: FnMut(JsObjectRef)>(&self, visitor: &mut F) {
        match self {
            Job::PromiseReaction { reaction, argument } => {
                reaction.trace(visitor);
                trace_value(argument, visitor);
            }
            Job::PromiseResolveThenable {
                promise,
                thenable,
                then,
            } => {
                visitor(*promise);
                visitor(*thenable);
                visitor(*then);
            }
        }
    }
}

/// The scheduling contract between the runtime and its host.
///
/// Queued jobs are GC roots: `trace_jobs` must report every object they hold.
pub trait JobQueue {
    fn enqueue(&mut self, job: Job);

    fn dequeue(&mut self) -> Option<Job>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn trace_jobs(&self, visitor: &mut dyn FnMut(JsObjectRef));
}

/// FIFO microtask queue
#[derive(Debug, Default)]
pub struct MicrotaskQueue {
    queue: VecDeque<Job>,
}

impl JobQueue for MicrotaskQueue {
    fn enqueue(&mut self, job: Job) {
        self.queue.push_back(job);
    }

    fn dequeue(&mut self) -> Option<Job> {
        self.queue.pop_front()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }

    fn trace_jobs(&self, visitor: &mut dyn FnMut(JsObjectRef)) {
        for job in &self.queue {
            job.trace(&mut |obj| visitor(obj));
        }
    }
}
