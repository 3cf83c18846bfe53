//! Test assertions for flow outcomes.

use crate::errors::ForkflowError;
use crate::task::Task;

/// Asserts that a flow succeeded.
pub fn assert_flow_succeeded(result: &Result<(), ForkflowError>) {
    assert!(result.is_ok(), "Expected success, got error: {result:?}");
}

/// Asserts that a flow failed with an error whose message is `expected`.
pub fn assert_flow_failed_with(result: &Result<(), ForkflowError>, expected: &str) {
    match result {
        Ok(()) => panic!("Expected failure '{expected}', got success"),
        Err(err) => assert_eq!(
            err.to_string(),
            expected,
            "Expected error '{expected}', got '{err}'"
        ),
    }
}

/// Asserts that a task resolved with a cancellation echo.
pub fn assert_task_cancelled<T>(task: &Task<T>)
where
    T: Clone + Send + Sync + 'static,
{
    match task.try_outcome() {
        Some(Err(err)) => assert!(
            err.is_cancellation_echo(),
            "Expected cancellation, got error: {err}"
        ),
        Some(Ok(_)) => panic!("Expected cancellation, got a value"),
        None => panic!("Expected cancellation, task has not resolved"),
    }
}

/// Asserts that a task resolved with `expected`.
pub fn assert_task_value<T>(task: &Task<T>, expected: &T)
where
    T: Clone + Send + Sync + PartialEq + std::fmt::Debug + 'static,
{
    match task.try_outcome() {
        Some(Ok(value)) => assert_eq!(&value, expected),
        Some(Err(err)) => panic!("Expected {expected:?}, got error: {err}"),
        None => panic!("Expected {expected:?}, task has not resolved"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_assertions() {
        assert_flow_succeeded(&Ok(()));
        assert_flow_failed_with(&Err(ForkflowError::ContextCancelled), "context canceled");
    }

    #[test]
    #[should_panic(expected = "Expected success")]
    fn test_flow_succeeded_panics_on_error() {
        assert_flow_succeeded(&Err(ForkflowError::DeadlineExceeded));
    }

    #[test]
    fn test_task_assertions() {
        assert_task_value(&Task::completed(Ok(4)), &4);

        let task = Task::<i32>::new(|_ctx| async { Ok(1) });
        task.cancel_with_reason(ForkflowError::ContextCancelled);
        assert_task_cancelled(&task);
    }
}
