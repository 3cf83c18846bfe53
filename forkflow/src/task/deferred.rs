//! Deferred computation with at-most-once execution.

use crate::cancellation::FlowContext;
use crate::errors::ForkflowError;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::trace;

type TaskFn<T> = Box<dyn FnOnce(FlowContext) -> BoxFuture<'static, anyhow::Result<T>> + Send>;

type Outcome<T> = Result<T, ForkflowError>;

/// Lifecycle of a [`Task`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Constructed, not started.
    Pending,
    /// The function is running.
    Running,
    /// The function ran and produced an outcome.
    Completed,
    /// Cancelled before it started; the function never ran.
    Cancelled,
}

enum Slot<T> {
    Pending(TaskFn<T>),
    Running(FlowContext),
    Completed,
    Cancelled,
}

impl<T> Slot<T> {
    const fn state(&self) -> TaskState {
        match self {
            Self::Pending(_) => TaskState::Pending,
            Self::Running(_) => TaskState::Running,
            Self::Completed => TaskState::Completed,
            Self::Cancelled => TaskState::Cancelled,
        }
    }
}

struct Inner<T> {
    slot: Mutex<Slot<T>>,
    outcome: watch::Sender<Option<Outcome<T>>>,
}

/// A one-shot unit of asynchronous work.
///
/// Constructing a task does not start it. The first call to [`Task::run`]
/// starts the function on its own tokio task; every other caller, and every
/// caller of [`Task::outcome`], waits for the same memoized outcome.
pub struct Task<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Task<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Task<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a task from a function. The function does not run until the
    /// task is driven.
    pub fn new<F, Fut>(func: F) -> Self
    where
        F: FnOnce(FlowContext) -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let func: TaskFn<T> = Box::new(move |ctx| Box::pin(func(ctx)));
        Self::with_slot(Slot::Pending(func), None)
    }

    /// Creates a task that is already resolved with `outcome`.
    #[must_use]
    pub fn completed(outcome: Outcome<T>) -> Self {
        Self::with_slot(Slot::Completed, Some(outcome))
    }

    fn with_slot(slot: Slot<T>, outcome: Option<Outcome<T>>) -> Self {
        let (tx, _rx) = watch::channel(outcome);
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(slot),
                outcome: tx,
            }),
        }
    }

    /// Starts the task if it has not started yet, then waits for its outcome.
    ///
    /// Safe to call from many callers at once; the function runs at most once.
    pub async fn run(&self, ctx: &FlowContext) -> Outcome<T> {
        self.start(ctx);
        self.outcome().await
    }

    /// Waits for the task to resolve without starting it.
    pub async fn outcome(&self) -> Outcome<T> {
        let mut rx = self.inner.outcome.subscribe();
        let resolved = match rx.wait_for(Option::is_some).await {
            Ok(resolved) => Ok(resolved.clone()),
            Err(_) => Err(ForkflowError::Panicked("task dropped before resolving".into())),
        };
        resolved?.unwrap_or_else(|| {
            Err(ForkflowError::Panicked("task resolved without an outcome".into()))
        })
    }

    /// Returns the outcome if the task has already resolved.
    #[must_use]
    pub fn try_outcome(&self) -> Option<Outcome<T>> {
        self.inner.outcome.borrow().clone()
    }

    /// Returns the successful value, or `default` if the task has not
    /// resolved or resolved with an error.
    #[must_use]
    pub fn result_or_default(&self, default: T) -> T {
        match &*self.inner.outcome.borrow() {
            Some(Ok(value)) => value.clone(),
            _ => default,
        }
    }

    /// Cancels the task.
    ///
    /// A pending task resolves immediately with
    /// [`ForkflowError::TaskCancelled`] and its function never runs. A running
    /// task has its context cancelled with the same error and keeps whatever
    /// outcome its function returns. A resolved task is left alone.
    pub fn cancel_with_reason(&self, reason: ForkflowError) {
        let mut slot = self.inner.slot.lock();
        match &*slot {
            Slot::Pending(_) => {
                *slot = Slot::Cancelled;
                self.inner
                    .outcome
                    .send_replace(Some(Err(ForkflowError::task_cancelled(reason))));
            }
            Slot::Running(ctx) => ctx.cancel_with_cause(ForkflowError::task_cancelled(reason)),
            Slot::Completed | Slot::Cancelled => {}
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TaskState {
        self.inner.slot.lock().state()
    }

    /// Returns true once the task has an outcome.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.inner.outcome.borrow().is_some()
    }

    fn start(&self, ctx: &FlowContext) {
        let task_ctx = ctx.child();
        let func = {
            let mut slot = self.inner.slot.lock();
            match std::mem::replace(&mut *slot, Slot::Running(task_ctx.clone())) {
                Slot::Pending(func) => func,
                other => {
                    *slot = other;
                    return;
                }
            }
        };

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(func(task_ctx)).catch_unwind().await {
                Ok(result) => result.map_err(ForkflowError::from_anyhow),
                Err(panic) => Err(ForkflowError::Panicked(panic_message(panic.as_ref()))),
            };

            *inner.slot.lock() = Slot::Completed;
            inner.outcome.send_replace(Some(outcome));
            trace!("Task resolved");
        });
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

impl<T> std::fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.slot.lock().state();
        f.debug_struct("Task").field("state", &state).finish()
    }
}
