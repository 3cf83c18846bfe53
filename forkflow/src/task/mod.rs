//! One-shot, memoized, cancellable units of asynchronous work.
//!
//! Executors hold their loading and executing steps as [`Task`]s; the
//! scheduler only ever drives, awaits or cancels them.

mod deferred;

pub use deferred::{Task, TaskState};
