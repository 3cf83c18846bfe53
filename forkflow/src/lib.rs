//! # Forkflow
//!
//! A fork-join engine that composes independently written components into
//! a flow and runs them with maximal safe concurrency.
//!
//! Forkflow provides:
//!
//! - **Components**: synchronous, asynchronous, and synchronous with a
//!   concurrent loading step
//! - **Executors**: a uniform contract wrapping each component in one-shot,
//!   memoized tasks
//! - **Flows**: ordered branches of executors built with a fluent builder
//! - **Fail-fast scheduling**: the first business error cancels what has not
//!   started yet and is returned immediately
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use forkflow::prelude::*;
//!
//! let routing = create_async_executor(RoutingComponent::new(map_service));
//! let route = routing.get_executing_task().clone();
//! let fare = create_sync_executor_with_loading(FareComponent::new(route));
//!
//! let flow = ExecutionFlowBuilder::new()
//!     .append(routing.clone())
//!     .append(fare.clone())
//!     .build();
//!
//! fork_join_failing_fast(&FlowContext::new(), &flow).await?;
//! let fare = fare.get_executing_task().result_or_default(0.0);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod component;
pub mod errors;
pub mod executor;
pub mod pipeline;
pub mod task;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::FlowContext;
    pub use crate::component::{AsyncComponent, LoadData, SyncComponent, SyncComponentWithLoading};
    pub use crate::errors::{ForkflowError, Result};
    pub use crate::executor::{
        create_async_executor, create_sync_executor, create_sync_executor_with_loading,
        create_sync_orchestrating_executor, create_sync_orchestrating_executor_with_result,
        ComponentExecutor, ExecutingTask, Executor, GeneralExecutor, LoadingExecutor,
    };
    pub use crate::pipeline::{
        fork_join_failing_fast, CascadePolicy, ExecutionFlow, ExecutionFlowBuilder, ForkJoin,
        ForkJoinConfig,
    };
    pub use crate::task::{Task, TaskState};
}
