//! Executor with all three task slots.

use super::{drive, sealed, ComponentExecutor, ExecutingTask, Executor, LoadingExecutor};
use crate::cancellation::FlowContext;
use crate::errors::ForkflowError;
use crate::task::Task;
use async_trait::async_trait;

/// An executor that may hold a loading task and either executing task.
///
/// The two executing slots stay mutually exclusive through
/// [`ExecutingTask`]. When both a loading task and an asynchronous executing
/// task are present, the loading task takes priority in
/// [`Executor::invoke_async_task`].
pub struct GeneralExecutor<V, T> {
    loading: Option<Task<V>>,
    executing: Option<ExecutingTask<T>>,
}

impl<V, T> GeneralExecutor<V, T>
where
    V: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Creates an executor from optional slots.
    #[must_use]
    pub const fn new(loading: Option<Task<V>>, executing: Option<ExecutingTask<T>>) -> Self {
        Self { loading, executing }
    }

    /// Returns the executing task, if any.
    #[must_use]
    pub fn get_executing_task(&self) -> Option<&Task<T>> {
        self.executing.as_ref().map(ExecutingTask::task)
    }

    /// Returns the loading task, if any.
    #[must_use]
    pub const fn loading_task(&self) -> Option<&Task<V>> {
        self.loading.as_ref()
    }
}

impl<T> From<ComponentExecutor<T>> for GeneralExecutor<(), T>
where
    T: Clone + Send + Sync + 'static,
{
    fn from(executor: ComponentExecutor<T>) -> Self {
        Self::new(None, Some(executor.executing().clone()))
    }
}

impl<V, T> From<LoadingExecutor<V, T>> for GeneralExecutor<V, T>
where
    V: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn from(executor: LoadingExecutor<V, T>) -> Self {
        Self::new(
            Some(executor.loading_task().clone()),
            Some(ExecutingTask::Sync(executor.get_executing_task().clone())),
        )
    }
}

impl<V, T> Clone for GeneralExecutor<V, T> {
    fn clone(&self) -> Self {
        Self {
            loading: self.loading.clone(),
            executing: self.executing.clone(),
        }
    }
}

impl<V, T> std::fmt::Debug for GeneralExecutor<V, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneralExecutor")
            .field("loading", &self.loading)
            .field(
                "executing_sync",
                &self.executing.as_ref().and_then(ExecutingTask::as_sync),
            )
            .field(
                "executing_async",
                &self.executing.as_ref().and_then(ExecutingTask::as_async),
            )
            .finish()
    }
}

impl<V, T> sealed::Sealed for GeneralExecutor<V, T> {}

#[async_trait]
impl<V, T> Executor for GeneralExecutor<V, T>
where
    V: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    async fn invoke_sync_task(&self, ctx: &FlowContext) -> Result<(), ForkflowError> {
        match self.executing.as_ref().and_then(ExecutingTask::as_sync) {
            Some(task) => drive(task, ctx).await,
            None => Ok(()),
        }
    }

    fn can_be_invoked_async(&self) -> bool {
        self.loading.is_some()
            || self
                .executing
                .as_ref()
                .and_then(ExecutingTask::as_async)
                .is_some()
    }

    async fn invoke_async_task(&self, ctx: &FlowContext) -> Result<(), ForkflowError> {
        // Errors from loading tasks are handled by sync components
        if let Some(loading) = &self.loading {
            let _ = loading.run(ctx).await;
            return Ok(());
        }

        // Errors from async tasks stop the entire flow
        match self.executing.as_ref().and_then(ExecutingTask::as_async) {
            Some(task) => drive(task, ctx).await,
            None => Ok(()),
        }
    }

    fn cancel(&self, reason: &ForkflowError) {
        if let Some(loading) = &self.loading {
            loading.cancel_with_reason(reason.clone());
        }

        if let Some(executing) = &self.executing {
            executing.task().cancel_with_reason(reason.clone());
        }
    }

    async fn invoke_executing_task(&self, ctx: &FlowContext) -> Result<(), ForkflowError> {
        match self.get_executing_task() {
            Some(task) => drive(task, ctx).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskState;

    #[tokio::test]
    async fn test_empty_executor_is_noop() {
        let executor: GeneralExecutor<(), ()> = GeneralExecutor::new(None, None);
        let ctx = FlowContext::new();

        assert!(!executor.can_be_invoked_async());
        assert!(executor.invoke_sync_task(&ctx).await.is_ok());
        assert!(executor.invoke_async_task(&ctx).await.is_ok());
        assert!(executor.invoke_executing_task(&ctx).await.is_ok());
        assert!(executor.get_executing_task().is_none());
    }

    #[tokio::test]
    async fn test_loading_takes_priority_over_async() {
        let async_task = Task::new(|_ctx| async { Err::<i32, _>(anyhow::anyhow!("not yet")) });
        let executor = GeneralExecutor::new(
            Some(Task::completed(Ok("configs"))),
            Some(ExecutingTask::Async(async_task.clone())),
        );

        assert!(executor.can_be_invoked_async());
        assert!(executor.invoke_async_task(&FlowContext::new()).await.is_ok());
        assert_eq!(async_task.state(), TaskState::Pending);
    }

    #[tokio::test]
    async fn test_async_error_is_returned() {
        let err = ForkflowError::component(anyhow::anyhow!("async failed"));
        let executing = ExecutingTask::Async(Task::completed(Err(err.clone())));
        let executor: GeneralExecutor<(), i32> = GeneralExecutor::new(None, Some(executing));

        let actual = executor.invoke_async_task(&FlowContext::new()).await.unwrap_err();
        assert!(actual.same_as(&err));
        assert!(executor.invoke_sync_task(&FlowContext::new()).await.is_ok());
    }

    #[tokio::test]
    async fn test_from_loading_executor() {
        let loading = LoadingExecutor::new(Task::completed(Ok(1)), Task::completed(Ok(2)));
        let executor = GeneralExecutor::from(loading);

        assert!(executor.can_be_invoked_async());
        assert!(executor.loading_task().is_some());
        assert_eq!(executor.get_executing_task().map(|t| t.result_or_default(0)), Some(2));
    }

    #[tokio::test]
    async fn test_cancel_all_slots() {
        let executor = GeneralExecutor::new(
            Some(Task::new(|_ctx| async { Ok(1) })),
            Some(ExecutingTask::Sync(Task::new(|_ctx| async { Ok(2) }))),
        );

        executor.cancel(&ForkflowError::ContextCancelled);
        executor.cancel(&ForkflowError::ContextCancelled);

        assert_eq!(executor.loading_task().map(Task::state), Some(TaskState::Cancelled));
        assert_eq!(executor.get_executing_task().map(Task::state), Some(TaskState::Cancelled));
    }
}
