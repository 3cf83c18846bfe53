//! Construction functions turning components into executors.

use super::{ComponentExecutor, LoadingExecutor};
use crate::cancellation::FlowContext;
use crate::component::{AsyncComponent, LoadData, SyncComponent, SyncComponentWithLoading};
use crate::task::Task;
use std::future::Future;
use std::sync::Arc;

/// Wraps a [`SyncComponent`] into an executor whose task runs in the
/// branch's sequential walk.
pub fn create_sync_executor<T, C>(component: C) -> ComponentExecutor<T>
where
    T: Clone + Send + Sync + 'static,
    C: SyncComponent<T> + 'static,
{
    ComponentExecutor::from_sync_task(Task::new(move |ctx: FlowContext| async move {
        component.execute_sync(&ctx).await
    }))
}

/// Wraps an [`AsyncComponent`] into an executor whose task runs concurrently.
pub fn create_async_executor<T, C>(component: C) -> ComponentExecutor<T>
where
    T: Clone + Send + Sync + 'static,
    C: AsyncComponent<T> + 'static,
{
    ComponentExecutor::from_async_task(Task::new(move |ctx: FlowContext| async move {
        component.execute(&ctx).await
    }))
}

/// Wraps a [`SyncComponentWithLoading`] into an executor whose loading task
/// runs concurrently and whose executing task runs in the sequential walk.
///
/// The executing task waits for the loading task and hands its outcome to
/// the component as [`LoadData`].
pub fn create_sync_executor_with_loading<V, T, C>(component: C) -> LoadingExecutor<V, T>
where
    V: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
    C: SyncComponentWithLoading<V, T> + 'static,
{
    let component = Arc::new(component);

    let loader = Arc::clone(&component);
    let loading = Task::new(move |ctx: FlowContext| async move { loader.load(&ctx).await });

    let load_outcome = loading.clone();
    let executing_sync = Task::new(move |ctx: FlowContext| async move {
        // Block & wait; drives the load if nobody has yet.
        let data = LoadData::new(load_outcome.run(&ctx).await);
        component.execute_sync(&ctx, data).await
    });

    LoadingExecutor::new(loading, executing_sync)
}

/// Wraps orchestration logic that produces no value into a synchronous
/// executor.
pub fn create_sync_orchestrating_executor<F, Fut>(func: F) -> ComponentExecutor<()>
where
    F: FnOnce(FlowContext) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    ComponentExecutor::from_sync_task(Task::new(func))
}

/// Wraps orchestration logic that produces a value into a synchronous
/// executor. The returned task is a read handle on that value.
pub fn create_sync_orchestrating_executor_with_result<T, F, Fut>(
    func: F,
) -> (ComponentExecutor<T>, Task<T>)
where
    T: Clone + Send + Sync + 'static,
    F: FnOnce(FlowContext) -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
{
    let task = Task::new(func);
    (ComponentExecutor::from_sync_task(task.clone()), task)
}
