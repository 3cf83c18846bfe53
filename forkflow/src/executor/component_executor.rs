//! Executor for components without a loading step.

use super::{drive, sealed, ExecutingTask, Executor};
use crate::cancellation::FlowContext;
use crate::errors::ForkflowError;
use crate::task::Task;
use async_trait::async_trait;

/// Wraps a [`SyncComponent`](crate::component::SyncComponent) or an
/// [`AsyncComponent`](crate::component::AsyncComponent).
///
/// Errors from either executing task stop the entire flow.
pub struct ComponentExecutor<T> {
    executing: ExecutingTask<T>,
}

impl<T> ComponentExecutor<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates an executor whose task runs in the sequential walk.
    #[must_use]
    pub const fn from_sync_task(task: Task<T>) -> Self {
        Self {
            executing: ExecutingTask::Sync(task),
        }
    }

    /// Creates an executor whose task runs concurrently.
    #[must_use]
    pub const fn from_async_task(task: Task<T>) -> Self {
        Self {
            executing: ExecutingTask::Async(task),
        }
    }

    /// Returns the executing task, to read the component's output once the
    /// flow has completed.
    #[must_use]
    pub const fn get_executing_task(&self) -> &Task<T> {
        self.executing.task()
    }

    /// Returns the executing task together with how it is scheduled.
    #[must_use]
    pub const fn executing(&self) -> &ExecutingTask<T> {
        &self.executing
    }
}

impl<T> Clone for ComponentExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            executing: self.executing.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ComponentExecutor<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.executing {
            ExecutingTask::Sync(_) => "sync",
            ExecutingTask::Async(_) => "async",
        };
        f.debug_struct("ComponentExecutor")
            .field("kind", &kind)
            .field("task", self.executing.task())
            .finish()
    }
}

impl<T> sealed::Sealed for ComponentExecutor<T> {}

#[async_trait]
impl<T> Executor for ComponentExecutor<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn invoke_sync_task(&self, ctx: &FlowContext) -> Result<(), ForkflowError> {
        match self.executing.as_sync() {
            Some(task) => drive(task, ctx).await,
            None => Ok(()),
        }
    }

    fn can_be_invoked_async(&self) -> bool {
        self.executing.as_async().is_some()
    }

    async fn invoke_async_task(&self, ctx: &FlowContext) -> Result<(), ForkflowError> {
        match self.executing.as_async() {
            Some(task) => drive(task, ctx).await,
            None => Ok(()),
        }
    }

    fn cancel(&self, reason: &ForkflowError) {
        self.executing.task().cancel_with_reason(reason.clone());
    }

    async fn invoke_executing_task(&self, ctx: &FlowContext) -> Result<(), ForkflowError> {
        drive(self.executing.task(), ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskState;

    #[tokio::test]
    async fn test_sync_executor_contract() {
        let err = ForkflowError::component(anyhow::anyhow!("sync failed"));
        let executor = ComponentExecutor::from_sync_task(Task::<i32>::completed(Err(err.clone())));
        let ctx = FlowContext::new();

        assert!(!executor.can_be_invoked_async());
        assert!(executor.invoke_async_task(&ctx).await.is_ok());

        let actual = executor.invoke_sync_task(&ctx).await.unwrap_err();
        assert!(actual.same_as(&err));
    }

    #[tokio::test]
    async fn test_async_executor_contract() {
        let executor = ComponentExecutor::from_async_task(Task::new(|_ctx| async { Ok(1) }));
        let ctx = FlowContext::new();

        assert!(executor.can_be_invoked_async());
        assert!(executor.invoke_sync_task(&ctx).await.is_ok());
        assert_eq!(executor.get_executing_task().state(), TaskState::Pending);

        assert!(executor.invoke_async_task(&ctx).await.is_ok());
        assert_eq!(executor.get_executing_task().result_or_default(0), 1);
    }

    #[tokio::test]
    async fn test_cancel_twice_keeps_first_reason() {
        let executor = ComponentExecutor::from_sync_task(Task::new(|_ctx| async { Ok(1) }));
        let first = ForkflowError::component(anyhow::anyhow!("first"));

        executor.cancel(&first);
        executor.cancel(&ForkflowError::ContextCancelled);

        let err = executor.invoke_executing_task(&FlowContext::new()).await.unwrap_err();
        assert!(err.is_cancellation_echo());
        assert!(err.root_cause().same_as(&first));
    }
}
