//! Flow building and execution.
//!
//! This module provides:
//! - The branch layout of a flow and its builder
//! - The fail-fast fork-join scheduler and its config

mod builder;
mod config;
mod flow;
mod fork_join;


pub use builder::ExecutionFlowBuilder;
pub use config::{CascadePolicy, ForkJoinConfig};
pub use flow::{ExecutionFlow, SharedExecutor};
pub use fork_join::{fork_join_failing_fast, ForkJoin};
