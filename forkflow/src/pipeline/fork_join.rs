//! Fail-fast fork-join scheduler.
//!
//! Branches run in parallel. Inside a branch, every executor with a
//! concurrent part gets its own worker and one sequential walker drives the
//! synchronous executing tasks in order. The first business error of a
//! branch cancels what has not started yet and is returned immediately;
//! cancellation echoes caused by that cascade are swallowed.

use super::config::{CascadePolicy, ForkJoinConfig};
use super::flow::ExecutionFlow;
use crate::cancellation::FlowContext;
use crate::errors::ForkflowError;
use futures::future::join_all;
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, debug_span, trace, warn, Instrument};
use uuid::Uuid;

/// Runs `flow` with the default [`ForkJoinConfig`].
///
/// # Errors
///
/// Returns the first business error reported by any branch, or the
/// context's error if `ctx` is cancelled or its deadline passes first.
pub async fn fork_join_failing_fast(
    ctx: &FlowContext,
    flow: &ExecutionFlow,
) -> Result<(), ForkflowError> {
    ForkJoin::default().run(ctx, flow).await
}

/// The scheduler.
#[derive(Debug, Clone, Default)]
pub struct ForkJoin {
    config: ForkJoinConfig,
}

impl ForkJoin {
    /// Creates a scheduler.
    #[must_use]
    pub const fn new(config: ForkJoinConfig) -> Self {
        Self { config }
    }

    /// Returns the config.
    #[must_use]
    pub const fn config(&self) -> &ForkJoinConfig {
        &self.config
    }

    /// Runs every branch of `flow` and waits until all succeed, one fails,
    /// or `ctx` is done.
    ///
    /// Returning early does not stop workers that are still running unless
    /// [`ForkJoinConfig::cancel_on_return`] is set.
    ///
    /// # Errors
    ///
    /// Returns the first business error reported by any branch, or the
    /// context's error if `ctx` is cancelled or its deadline passes first.
    pub async fn run(&self, ctx: &FlowContext, flow: &ExecutionFlow) -> Result<(), ForkflowError> {
        let span = debug_span!(
            "fork_join",
            run_id = %Uuid::new_v4(),
            branches = flow.branch_count(),
            executors = flow.executor_count(),
        );

        async {
            debug!("Running flow");
            let result = self.run_flow(ctx, flow).await;

            match &result {
                Ok(()) => debug!("Flow completed"),
                Err(err) => {
                    debug!(error = %err, "Flow failed");
                    if self.config.cancel_on_return {
                        flow.cancel(0, err);
                    }
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_flow(&self, ctx: &FlowContext, flow: &ExecutionFlow) -> Result<(), ForkflowError> {
        let cascade = self.config.cascade;

        if flow.is_empty() {
            return Ok(());
        }

        match flow.branch_count() {
            0 => Ok(()),
            1 => run_branch(ctx.clone(), flow.clone(), 0, cascade).await,
            count => {
                let (tx, mut results) = mpsc::channel(count);
                for branch in 0..count {
                    let tx = tx.clone();
                    let ctx = ctx.clone();
                    let flow = flow.clone();
                    tokio::spawn(
                        async move {
                            let _ = tx.send(run_branch(ctx, flow, branch, cascade).await).await;
                        }
                        .in_current_span(),
                    );
                }
                drop(tx);

                let mut succeeded = 0;
                loop {
                    tokio::select! {
                        biased;
                        err = ctx.done() => return Err(err),
                        result = results.recv() => match result {
                            Some(Ok(())) => {
                                succeeded += 1;
                                if succeeded == count {
                                    return Ok(());
                                }
                            }
                            Some(Err(err)) => return Err(err),
                            None => {
                                return Err(ForkflowError::Panicked(
                                    "branch worker exited without reporting".into(),
                                ))
                            }
                        },
                    }
                }
            }
        }
    }
}

/// Records the first business error of a branch and cascades cancellation.
#[derive(Clone)]
struct BranchFailure {
    first: Arc<OnceLock<ForkflowError>>,
    tx: mpsc::Sender<ForkflowError>,
    flow: ExecutionFlow,
    branch: usize,
    cascade: CascadePolicy,
}

impl BranchFailure {
    fn report(&self, position: usize, err: ForkflowError) {
        if self.first.set(err.clone()).is_ok() {
            warn!(
                branch = self.branch,
                position,
                error = %err,
                "Branch failed, cancelling pending executors"
            );
            // Wake the branch race before cascading.
            // Capacity 1 and a single successful set: never full.
            let _ = self.tx.try_send(err.clone());
        }
        self.flow.cancel(self.cascade.first_branch(self.branch), &err);
    }
}

async fn run_branch(
    ctx: FlowContext,
    flow: ExecutionFlow,
    branch: usize,
    cascade: CascadePolicy,
) -> Result<(), ForkflowError> {
    let executors = flow.branch(branch);
    if executors.is_empty() {
        return Ok(());
    }
    debug!(branch, executors = executors.len(), "Running branch");

    let (tx, mut errors) = mpsc::channel(1);
    let failure = BranchFailure {
        first: Arc::new(OnceLock::new()),
        tx,
        flow: flow.clone(),
        branch,
        cascade,
    };

    let mut workers: Vec<JoinHandle<()>> = executors
        .iter()
        .enumerate()
        .filter(|(_, executor)| executor.can_be_invoked_async())
        .map(|(position, executor)| {
            let executor = Arc::clone(executor);
            let ctx = ctx.clone();
            let failure = failure.clone();
            tokio::spawn(
                async move {
                    match executor.invoke_async_task(&ctx).await {
                        Ok(()) => {}
                        Err(err) if err.is_cancellation_echo() => {
                            trace!(branch, position, "Async task was cancelled");
                        }
                        Err(err) => failure.report(position, err),
                    }
                }
                .in_current_span(),
            )
        })
        .collect();

    let walker_ctx = ctx.clone();
    let walker_flow = flow.clone();
    let walker_failure = failure;
    workers.push(tokio::spawn(
        async move {
            for (position, executor) in walker_flow.branch(branch).iter().enumerate() {
                match executor.invoke_sync_task(&walker_ctx).await {
                    Ok(()) => {}
                    Err(err) if err.is_cancellation_echo() => {
                        trace!(branch, position, "Sync task was cancelled");
                        break;
                    }
                    Err(err) => {
                        walker_failure.report(position, err);
                        return;
                    }
                }
            }
        }
        .in_current_span(),
    ));

    let mut done = std::pin::pin!(join_all(workers));

    tokio::select! {
        biased;
        err = ctx.done() => Err(err),
        Some(err) = errors.recv() => Err(err),
        joined = done.as_mut() => match joined.into_iter().find_map(Result::err) {
            Some(join_err) => Err(ForkflowError::Panicked(join_err.to_string())),
            None => {
                debug!(branch, "Branch completed");
                Ok(())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{ComponentExecutor, LoadingExecutor};
    use crate::pipeline::ExecutionFlowBuilder;
    use crate::task::{Task, TaskState};

    #[tokio::test]
    async fn test_empty_flows_succeed() {
        let ctx = FlowContext::new();

        assert!(fork_join_failing_fast(&ctx, &ExecutionFlow::default()).await.is_ok());
        assert!(fork_join_failing_fast(&ctx, &ExecutionFlowBuilder::new().build()).await.is_ok());
        let no_executors = ExecutionFlowBuilder::new().next_branch().next_branch().build();
        assert!(fork_join_failing_fast(&ctx, &no_executors).await.is_ok());
    }

    #[tokio::test]
    async fn test_completed_sync_error_is_returned() {
        let err = ForkflowError::component(anyhow::anyhow!("error from sync task"));
        let flow = ExecutionFlowBuilder::new()
            .append(LoadingExecutor::new(
                Task::completed(Ok(1)),
                Task::<i32>::completed(Err(err.clone())),
            ))
            .build();

        let actual = fork_join_failing_fast(&FlowContext::new(), &flow).await.unwrap_err();
        assert!(actual.same_as(&err));
    }

    #[tokio::test]
    async fn test_completed_async_error_is_returned() {
        let err = ForkflowError::component(anyhow::anyhow!("error from async task"));
        let flow = ExecutionFlowBuilder::new()
            .append(ComponentExecutor::from_async_task(Task::<i32>::completed(Err(err.clone()))))
            .build();

        let actual = fork_join_failing_fast(&FlowContext::new(), &flow).await.unwrap_err();
        assert!(actual.same_as(&err));
    }

    #[tokio::test]
    async fn test_load_error_does_not_fail_flow() {
        let flow = ExecutionFlowBuilder::new()
            .append(LoadingExecutor::new(
                Task::<i32>::completed(Err(ForkflowError::component(anyhow::anyhow!("load")))),
                Task::completed(Ok(1)),
            ))
            .build();

        assert!(fork_join_failing_fast(&FlowContext::new(), &flow).await.is_ok());
    }

    #[tokio::test]
    async fn test_failure_cancels_pending_executors() {
        let later = ComponentExecutor::from_sync_task(Task::new(|_ctx| async { Ok(3) }));
        let flow = ExecutionFlowBuilder::new()
            .append(ComponentExecutor::from_sync_task(Task::new(|_ctx| async {
                Err::<i32, _>(anyhow::anyhow!("fail"))
            })))
            .append(later.clone())
            .build();

        let err = fork_join_failing_fast(&FlowContext::new(), &flow).await.unwrap_err();

        assert_eq!(err.to_string(), "fail");
        assert_eq!(later.get_executing_task().state(), TaskState::Cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_context_wins() {
        let ctx = FlowContext::new();
        ctx.cancel();

        let flow = ExecutionFlowBuilder::new()
            .append(ComponentExecutor::from_sync_task(Task::new(|ctx: FlowContext| async move {
                Err::<(), _>(anyhow::Error::new(ctx.done().await))
            })))
            .next_branch()
            .build();

        let err = fork_join_failing_fast(&ctx, &flow).await.unwrap_err();
        assert!(matches!(err, ForkflowError::ContextCancelled));
    }

    #[tokio::test]
    async fn test_report_sends_first_error_once_and_cascades() {
        let pending = ComponentExecutor::from_sync_task(Task::new(|_ctx| async { Ok(1) }));
        let flow = ExecutionFlowBuilder::new()
            .append(pending.clone())
            .next_branch()
            .build();
        let (tx, mut errors) = mpsc::channel(1);
        let failure = BranchFailure {
            first: Arc::new(OnceLock::new()),
            tx,
            flow,
            branch: 0,
            cascade: CascadePolicy::Downstream,
        };
        let first = ForkflowError::component(anyhow::anyhow!("first"));

        failure.report(0, first.clone());
        failure.report(1, ForkflowError::component(anyhow::anyhow!("second")));

        assert!(errors.try_recv().unwrap().same_as(&first));
        assert!(errors.try_recv().is_err());
        assert_eq!(pending.get_executing_task().state(), TaskState::Cancelled);
    }

    #[tokio::test]
    async fn test_config_accessor() {
        let config = ForkJoinConfig::new().with_cancel_on_return(true);
        let scheduler = ForkJoin::new(config.clone());

        assert_eq!(scheduler.config(), &config);
    }
}
