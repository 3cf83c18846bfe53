//! Executor adapters.
//!
//! An executor wraps one component instance in the uniform contract the
//! scheduler drives. It holds up to three tasks: a loading task, and one of
//! a synchronous or an asynchronous executing task.
//!
//! The set of executors is closed: the [`Executor`] trait is sealed and only
//! implemented by [`ComponentExecutor`], [`LoadingExecutor`] and
//! [`GeneralExecutor`].

mod component_executor;
mod factory;
mod general;
mod loading;

pub use component_executor::ComponentExecutor;
pub use factory::{
    create_async_executor, create_sync_executor, create_sync_executor_with_loading,
    create_sync_orchestrating_executor, create_sync_orchestrating_executor_with_result,
};
pub use general::GeneralExecutor;
pub use loading::LoadingExecutor;

use crate::cancellation::FlowContext;
use crate::errors::ForkflowError;
use crate::task::Task;
use async_trait::async_trait;

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// The invocation contract the scheduler relies on.
#[async_trait]
pub trait Executor: sealed::Sealed + Send + Sync {
    /// Drives the synchronous executing task, if any, and returns its error.
    ///
    /// Only called from a branch's sequential walk.
    async fn invoke_sync_task(&self, ctx: &FlowContext) -> Result<(), ForkflowError>;

    /// Returns whether part of this executor can run concurrently.
    fn can_be_invoked_async(&self) -> bool;

    /// Drives the concurrent part of this executor.
    ///
    /// A loading task takes priority and its error is never returned; the
    /// executing step that consumes it decides. Otherwise the asynchronous
    /// executing task is driven and its error is returned.
    async fn invoke_async_task(&self, ctx: &FlowContext) -> Result<(), ForkflowError>;

    /// Cancels every task this executor holds that has not started yet.
    ///
    /// Idempotent.
    fn cancel(&self, reason: &ForkflowError);

    /// Drives whichever executing task this executor holds.
    async fn invoke_executing_task(&self, ctx: &FlowContext) -> Result<(), ForkflowError>;
}

/// The executing half of an executor: synchronous or asynchronous, never both.
#[derive(Debug)]
pub enum ExecutingTask<T> {
    /// Runs in the branch's sequential walk.
    Sync(Task<T>),
    /// Runs concurrently.
    Async(Task<T>),
}

impl<T> ExecutingTask<T> {
    /// Returns the underlying task regardless of how it is scheduled.
    #[must_use]
    pub const fn task(&self) -> &Task<T> {
        match self {
            Self::Sync(task) | Self::Async(task) => task,
        }
    }

    /// Returns the task if it runs in the sequential walk.
    #[must_use]
    pub const fn as_sync(&self) -> Option<&Task<T>> {
        match self {
            Self::Sync(task) => Some(task),
            Self::Async(_) => None,
        }
    }

    /// Returns the task if it runs concurrently.
    #[must_use]
    pub const fn as_async(&self) -> Option<&Task<T>> {
        match self {
            Self::Async(task) => Some(task),
            Self::Sync(_) => None,
        }
    }
}

impl<T> Clone for ExecutingTask<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Sync(task) => Self::Sync(task.clone()),
            Self::Async(task) => Self::Async(task.clone()),
        }
    }
}

/// Drives a task and keeps only its error.
pub(crate) async fn drive<T>(task: &Task<T>, ctx: &FlowContext) -> Result<(), ForkflowError>
where
    T: Clone + Send + Sync + 'static,
{
    task.run(ctx).await.map(|_| ())
}
