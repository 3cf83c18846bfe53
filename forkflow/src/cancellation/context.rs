//! Cancellation context shared by the scheduler and components.

use crate::errors::ForkflowError;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A cloneable cancellation context.
///
/// Cancellation is idempotent: only the first cause is kept. Child contexts
/// observe their parent's cancellation and deadline, but cancelling a child
/// never reaches the parent.
#[derive(Clone, Default)]
pub struct FlowContext {
    /// Fires when this context or an ancestor is cancelled.
    token: CancellationToken,
    /// The cause this context was cancelled with (first one wins).
    cause: Arc<RwLock<Option<ForkflowError>>>,
    /// Point in time after which the context counts as done.
    deadline: Option<Instant>,
    /// The context this one was derived from.
    parent: Option<Arc<FlowContext>>,
}

impl FlowContext {
    /// Creates a root context that is never done unless cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives a child context.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            cause: Arc::new(RwLock::new(None)),
            deadline: self.deadline,
            parent: Some(Arc::new(self.clone())),
        }
    }

    /// Derives a child context that is done once `timeout` has elapsed.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derives a child context that is done at `deadline`.
    ///
    /// A deadline later than the parent's has no effect.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let mut child = self.child();
        child.deadline = Some(child.deadline.map_or(deadline, |d| d.min(deadline)));
        child
    }

    /// Cancels the context.
    pub fn cancel(&self) {
        self.cancel_with_cause(ForkflowError::ContextCancelled);
    }

    /// Cancels the context, recording why.
    ///
    /// This is idempotent - only the first cause is kept.
    pub fn cancel_with_cause(&self, cause: ForkflowError) {
        {
            let mut slot = self.cause.write();
            if slot.is_none() && !self.token.is_cancelled() {
                *slot = Some(cause);
            }
        }
        self.token.cancel();
    }

    /// Returns whether the context is cancelled or past its deadline.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.err().is_some()
    }

    /// Returns why the context is done, if it is.
    #[must_use]
    pub fn err(&self) -> Option<ForkflowError> {
        if let Some(cause) = self.cause.read().clone() {
            return Some(cause);
        }

        if let Some(err) = self.parent.as_ref().and_then(|p| p.err()) {
            return Some(err);
        }

        if self.token.is_cancelled() {
            return Some(ForkflowError::ContextCancelled);
        }

        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ForkflowError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Returns the deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Waits until the context is cancelled or its deadline passes, then
    /// returns the reason.
    pub async fn done(&self) -> ForkflowError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.token.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.token.cancelled().await,
        }

        self.err().unwrap_or(ForkflowError::ContextCancelled)
    }
}

impl std::fmt::Debug for FlowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowContext")
            .field("cancelled", &self.token.is_cancelled())
            .field("cause", &self.cause.read())
            .field("deadline", &self.deadline)
            .finish()
    }
}
