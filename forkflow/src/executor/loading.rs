//! Executor for synchronous components with a loading step.

use super::{drive, sealed, Executor};
use crate::cancellation::FlowContext;
use crate::errors::ForkflowError;
use crate::task::Task;
use async_trait::async_trait;

/// Wraps a [`SyncComponentWithLoading`](crate::component::SyncComponentWithLoading).
///
/// The loading task runs concurrently and never fails the flow by itself;
/// the synchronous executing task consumes its outcome.
pub struct LoadingExecutor<V, T> {
    loading: Task<V>,
    executing_sync: Task<T>,
}

impl<V, T> LoadingExecutor<V, T>
where
    V: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    /// Creates an executor from an already wired pair of tasks.
    ///
    /// The executing task is expected to wait for `loading` itself.
    #[must_use]
    pub const fn new(loading: Task<V>, executing_sync: Task<T>) -> Self {
        Self {
            loading,
            executing_sync,
        }
    }

    /// Returns the executing task, to read the component's output once the
    /// flow has completed.
    #[must_use]
    pub const fn get_executing_task(&self) -> &Task<T> {
        &self.executing_sync
    }

    /// Returns the loading task.
    #[must_use]
    pub const fn loading_task(&self) -> &Task<V> {
        &self.loading
    }
}

impl<V, T> Clone for LoadingExecutor<V, T> {
    fn clone(&self) -> Self {
        Self {
            loading: self.loading.clone(),
            executing_sync: self.executing_sync.clone(),
        }
    }
}

impl<V, T> std::fmt::Debug for LoadingExecutor<V, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingExecutor")
            .field("loading", &self.loading)
            .field("executing_sync", &self.executing_sync)
            .finish()
    }
}

impl<V, T> sealed::Sealed for LoadingExecutor<V, T> {}

#[async_trait]
impl<V, T> Executor for LoadingExecutor<V, T>
where
    V: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    async fn invoke_sync_task(&self, ctx: &FlowContext) -> Result<(), ForkflowError> {
        drive(&self.executing_sync, ctx).await
    }

    fn can_be_invoked_async(&self) -> bool {
        true
    }

    async fn invoke_async_task(&self, ctx: &FlowContext) -> Result<(), ForkflowError> {
        // Loading errors are handled by the executing step.
        let _ = self.loading.run(ctx).await;
        Ok(())
    }

    fn cancel(&self, reason: &ForkflowError) {
        self.loading.cancel_with_reason(reason.clone());
        self.executing_sync.cancel_with_reason(reason.clone());
    }

    async fn invoke_executing_task(&self, ctx: &FlowContext) -> Result<(), ForkflowError> {
        drive(&self.executing_sync, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskState;

    #[tokio::test]
    async fn test_load_error_is_swallowed() {
        let executor = LoadingExecutor::new(
            Task::<i32>::completed(Err(ForkflowError::component(anyhow::anyhow!("load failed")))),
            Task::completed(Ok(1)),
        );
        let ctx = FlowContext::new();

        assert!(executor.can_be_invoked_async());
        assert!(executor.invoke_async_task(&ctx).await.is_ok());
        assert!(executor.invoke_sync_task(&ctx).await.is_ok());
    }

    #[tokio::test]
    async fn test_sync_error_is_returned() {
        let err = ForkflowError::component(anyhow::anyhow!("execute failed"));
        let executor = LoadingExecutor::new(
            Task::completed(Ok(1)),
            Task::<i32>::completed(Err(err.clone())),
        );

        let actual = executor.invoke_sync_task(&FlowContext::new()).await.unwrap_err();
        assert!(actual.same_as(&err));
    }

    #[tokio::test]
    async fn test_cancel_reaches_both_tasks() {
        let executor = LoadingExecutor::new(
            Task::new(|_ctx| async { Ok(1) }),
            Task::new(|_ctx| async { Ok(2) }),
        );

        executor.cancel(&ForkflowError::ContextCancelled);

        assert_eq!(executor.loading_task().state(), TaskState::Cancelled);
        assert_eq!(executor.get_executing_task().state(), TaskState::Cancelled);
    }
}
