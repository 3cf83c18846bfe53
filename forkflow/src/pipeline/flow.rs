//! Immutable branch layout handed to the scheduler.

use crate::errors::ForkflowError;
use crate::executor::Executor;
use std::sync::Arc;

/// Shared handle on a type-erased executor.
pub type SharedExecutor = Arc<dyn Executor>;

/// An ordered list of branches, each an ordered list of executors.
///
/// Branches run in parallel with each other. Within a branch, synchronous
/// executing tasks run in order while asynchronous and loading tasks run
/// concurrently. Cloning is cheap; clones share the same executors.
#[derive(Clone, Default)]
pub struct ExecutionFlow {
    branches: Arc<Vec<Vec<SharedExecutor>>>,
}

impl ExecutionFlow {
    /// Creates a flow from explicit branches.
    #[must_use]
    pub fn new(branches: Vec<Vec<SharedExecutor>>) -> Self {
        Self {
            branches: Arc::new(branches),
        }
    }

    /// Returns the number of branches, including empty ones.
    #[must_use]
    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    /// Returns the executors of a branch, or an empty slice when out of range.
    #[must_use]
    pub fn branch(&self, index: usize) -> &[SharedExecutor] {
        self.branches.get(index).map_or(&[], Vec::as_slice)
    }

    /// Returns the number of executors in a branch.
    #[must_use]
    pub fn branch_len(&self, index: usize) -> usize {
        self.branch(index).len()
    }

    /// Returns the number of executors across all branches.
    #[must_use]
    pub fn executor_count(&self) -> usize {
        self.branches.iter().map(Vec::len).sum()
    }

    /// Returns true when no branch holds an executor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.executor_count() == 0
    }

    /// Cancels every executor in `first_branch` and all later branches.
    ///
    /// Tasks that already started or resolved keep their outcome.
    pub fn cancel(&self, first_branch: usize, reason: &ForkflowError) {
        for executor in self.branches.iter().skip(first_branch).flatten() {
            executor.cancel(reason);
        }
    }
}

impl std::fmt::Debug for ExecutionFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lens: Vec<usize> = self.branches.iter().map(Vec::len).collect();
        f.debug_struct("ExecutionFlow").field("branches", &lens).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ComponentExecutor;
    use crate::task::{Task, TaskState};

    fn pending() -> ComponentExecutor<i32> {
        ComponentExecutor::from_sync_task(Task::new(|_ctx| async { Ok(1) }))
    }

    #[test]
    fn test_introspection() {
        let flow = ExecutionFlow::new(vec![
            vec![Arc::new(pending()), Arc::new(pending())],
            vec![],
            vec![Arc::new(pending())],
        ]);

        assert_eq!(flow.branch_count(), 3);
        assert_eq!(flow.branch_len(0), 2);
        assert_eq!(flow.branch_len(1), 0);
        assert_eq!(flow.branch_len(9), 0);
        assert_eq!(flow.executor_count(), 3);
        assert!(!flow.is_empty());
        assert!(ExecutionFlow::default().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_skips_earlier_branches() {
        let first = pending();
        let second = pending();
        let third = pending();
        let flow = ExecutionFlow::new(vec![
            vec![Arc::new(first.clone())],
            vec![Arc::new(second.clone())],
            vec![Arc::new(third.clone())],
        ]);

        flow.cancel(1, &ForkflowError::ContextCancelled);

        assert_eq!(first.get_executing_task().state(), TaskState::Pending);
        assert_eq!(second.get_executing_task().state(), TaskState::Cancelled);
        assert_eq!(third.get_executing_task().state(), TaskState::Cancelled);
    }
}
