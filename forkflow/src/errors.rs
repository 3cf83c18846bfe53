//! Error types for the forkflow engine.
//!
//! Four kinds of failure travel through a flow:
//!
//! - business errors returned by a component's executing step, which stop the flow;
//! - loading errors, which never stop the flow and only reach the dependent
//!   executing step through [`LoadData`](crate::component::LoadData);
//! - cancellation echoes, produced when a task that was cancelled before it
//!   started is driven or awaited;
//! - the caller's own context cancellation or deadline.

use std::sync::Arc;
use thiserror::Error;

/// The main error type for forkflow operations.
///
/// Cloneable so a memoized task outcome can be handed to every awaiter.
#[derive(Debug, Clone, Error)]
pub enum ForkflowError {
    /// A component's executing step failed.
    #[error("{0}")]
    Component(Arc<anyhow::Error>),

    /// A task was cancelled before it started. Carries the error that caused
    /// the cancellation.
    #[error("task cancelled with reason: {reason}")]
    TaskCancelled {
        /// The failure that triggered the cancellation.
        reason: Arc<ForkflowError>,
    },

    /// The caller's context was cancelled.
    #[error("context canceled")]
    ContextCancelled,

    /// The caller's context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// A component panicked or a worker exited without reporting.
    #[error("task panicked: {0}")]
    Panicked(String),
}

impl ForkflowError {
    /// Wraps a business error returned by a component.
    #[must_use]
    pub fn component(err: impl Into<anyhow::Error>) -> Self {
        Self::Component(Arc::new(err.into()))
    }

    /// Creates the error a cancelled task resolves with.
    #[must_use]
    pub fn task_cancelled(reason: Self) -> Self {
        Self::TaskCancelled {
            reason: Arc::new(reason),
        }
    }

    /// Converts an error returned by component code.
    ///
    /// Errors that already are a `ForkflowError` (for instance a component
    /// returning `ctx.err()`) keep their kind so echoes stay recognizable.
    /// A `ForkflowError` wrapped with extra context stays a business error
    /// carrying that context, unless it wraps an echo or a context error.
    #[must_use]
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        let top_level = err
            .chain()
            .next()
            .and_then(|top| top.downcast_ref::<Self>())
            .cloned();
        if let Some(kind) = top_level {
            return kind;
        }
        match err.downcast_ref::<Self>() {
            Some(inner) if inner.is_cancellation_echo() || inner.is_context_error() => {
                inner.clone()
            }
            _ => Self::Component(Arc::new(err)),
        }
    }

    /// Returns true if this is the echo of a sibling's failure.
    #[must_use]
    pub const fn is_cancellation_echo(&self) -> bool {
        matches!(self, Self::TaskCancelled { .. })
    }

    /// Returns true if this error came from the caller's context.
    #[must_use]
    pub const fn is_context_error(&self) -> bool {
        matches!(self, Self::ContextCancelled | Self::DeadlineExceeded)
    }

    /// Returns the error that started a chain of cancellations.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::TaskCancelled { reason } => reason.root_cause(),
            other => other,
        }
    }

    /// Returns true if both errors are the same failure.
    ///
    /// Business errors compare by identity, so two clones of one component
    /// failure are equal while two failures with the same message are not.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Component(a), Self::Component(b)) => Arc::ptr_eq(a, b),
            (Self::TaskCancelled { reason: a }, Self::TaskCancelled { reason: b }) => a.same_as(b),
            (Self::ContextCancelled, Self::ContextCancelled)
            | (Self::DeadlineExceeded, Self::DeadlineExceeded) => true,
            (Self::Panicked(a), Self::Panicked(b)) => a == b,
            _ => false,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T, E = ForkflowError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_error_display() {
        let err = ForkflowError::component(anyhow::anyhow!("map service is down"));
        assert_eq!(err.to_string(), "map service is down");
        assert!(!err.is_cancellation_echo());
    }

    #[test]
    fn test_task_cancelled_display_and_root_cause() {
        let cause = ForkflowError::component(anyhow::anyhow!("boom"));
        let echo = ForkflowError::task_cancelled(cause.clone());
        let nested = ForkflowError::task_cancelled(echo.clone());

        assert_eq!(echo.to_string(), "task cancelled with reason: boom");
        assert!(echo.is_cancellation_echo());
        assert!(nested.root_cause().same_as(&cause));
    }

    #[test]
    fn test_from_anyhow_preserves_kind() {
        let echo = ForkflowError::task_cancelled(ForkflowError::ContextCancelled);
        let converted = ForkflowError::from_anyhow(anyhow::Error::new(echo));
        assert!(converted.is_cancellation_echo());

        let plain = ForkflowError::from_anyhow(anyhow::anyhow!("plain"));
        assert!(matches!(plain, ForkflowError::Component(_)));
    }

    #[test]
    fn test_from_anyhow_keeps_added_context() {
        let load_err = ForkflowError::component(anyhow::anyhow!("config store is down"));
        let wrapped = anyhow::Error::new(load_err).context("pricing failed");

        let converted = ForkflowError::from_anyhow(wrapped);

        assert_eq!(converted.to_string(), "pricing failed");
        let ForkflowError::Component(inner) = converted else {
            panic!("expected a business error");
        };
        assert_eq!(format!("{inner:#}"), "pricing failed: config store is down");
    }

    #[test]
    fn test_from_anyhow_unwraps_context_around_echo() {
        let echo = ForkflowError::task_cancelled(ForkflowError::ContextCancelled);
        let wrapped = anyhow::Error::new(echo).context("while loading");

        assert!(ForkflowError::from_anyhow(wrapped).is_cancellation_echo());
    }

    #[test]
    fn test_same_as_uses_identity_for_component_errors() {
        let a = ForkflowError::component(anyhow::anyhow!("same text"));
        let b = ForkflowError::component(anyhow::anyhow!("same text"));

        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
        assert!(ForkflowError::ContextCancelled.same_as(&ForkflowError::ContextCancelled));
        assert!(ForkflowError::DeadlineExceeded.is_context_error());
    }
}
