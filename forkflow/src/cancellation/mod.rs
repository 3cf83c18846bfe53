//! Cooperative cancellation for flows.
//!
//! [`FlowContext`] is what callers hand to the scheduler and what every
//! component receives. It can be cancelled explicitly, with a cause, or by a
//! deadline.

mod context;

pub use context::FlowContext;
