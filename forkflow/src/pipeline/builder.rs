//! Fluent construction of execution flows.

use super::flow::{ExecutionFlow, SharedExecutor};
use crate::executor::Executor;
use std::sync::Arc;

/// Builder for [`ExecutionFlow`].
///
/// Starts with one open branch. Executors are appended to the open branch
/// and [`next_branch`](Self::next_branch) opens a new one.
#[derive(Clone)]
pub struct ExecutionFlowBuilder {
    branches: Vec<Vec<SharedExecutor>>,
}

impl Default for ExecutionFlowBuilder {
    fn default() -> Self {
        Self {
            branches: vec![Vec::new()],
        }
    }
}

impl ExecutionFlowBuilder {
    /// Creates a builder with one empty branch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an executor to the open branch.
    #[must_use]
    pub fn append(self, executor: impl Executor + 'static) -> Self {
        self.append_shared(Arc::new(executor))
    }

    /// Appends an already shared executor to the open branch.
    #[must_use]
    pub fn append_shared(mut self, executor: SharedExecutor) -> Self {
        self.open_branch().push(executor);
        self
    }

    /// Appends several executors to the open branch, in order.
    #[must_use]
    pub fn append_all(mut self, executors: impl IntoIterator<Item = SharedExecutor>) -> Self {
        self.open_branch().extend(executors);
        self
    }

    /// Closes the open branch and opens a new, empty one.
    #[must_use]
    pub fn next_branch(mut self) -> Self {
        self.branches.push(Vec::new());
        self
    }

    /// Returns the number of branches, counting the open one.
    #[must_use]
    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    /// Returns the number of executors in the open branch.
    #[must_use]
    pub fn current_branch_len(&self) -> usize {
        self.branches.last().map_or(0, Vec::len)
    }

    /// Builds the flow.
    #[must_use]
    pub fn build(self) -> ExecutionFlow {
        ExecutionFlow::new(self.branches)
    }

    fn open_branch(&mut self) -> &mut Vec<SharedExecutor> {
        if self.branches.is_empty() {
            self.branches.push(Vec::new());
        }
        let last = self.branches.len() - 1;
        &mut self.branches[last]
    }
}

impl std::fmt::Debug for ExecutionFlowBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lens: Vec<usize> = self.branches.iter().map(Vec::len).collect();
        f.debug_struct("ExecutionFlowBuilder").field("branches", &lens).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ComponentExecutor;
    use crate::task::Task;
    use pretty_assertions::assert_eq;

    fn executor() -> ComponentExecutor<()> {
        ComponentExecutor::from_sync_task(Task::completed(Ok(())))
    }

    #[test]
    fn test_new_builder_has_one_open_branch() {
        let builder = ExecutionFlowBuilder::new();

        assert_eq!(builder.branch_count(), 1);
        assert_eq!(builder.current_branch_len(), 0);

        let flow = builder.build();
        assert_eq!(flow.branch_count(), 1);
        assert!(flow.is_empty());
    }

    #[test]
    fn test_append_and_next_branch() {
        let flow = ExecutionFlowBuilder::new()
            .append(executor())
            .append(executor())
            .next_branch()
            .append(executor())
            .build();

        assert_eq!(flow.branch_count(), 2);
        assert_eq!(flow.branch_len(0), 2);
        assert_eq!(flow.branch_len(1), 1);
    }

    #[test]
    fn test_append_all_keeps_order() {
        let first: SharedExecutor = Arc::new(executor());
        let second: SharedExecutor = Arc::new(executor());

        let builder = ExecutionFlowBuilder::new()
            .next_branch()
            .append_all([Arc::clone(&first), Arc::clone(&second)]);
        assert_eq!(builder.current_branch_len(), 2);

        let flow = builder.build();
        assert!(Arc::ptr_eq(&flow.branch(1)[0], &first));
        assert!(Arc::ptr_eq(&flow.branch(1)[1], &second));
    }

    #[test]
    fn test_trailing_empty_branch_is_kept() {
        let flow = ExecutionFlowBuilder::new().append(executor()).next_branch().build();

        assert_eq!(flow.branch_count(), 2);
        assert_eq!(flow.executor_count(), 1);
    }
}
