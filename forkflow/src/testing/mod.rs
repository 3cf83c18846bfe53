//! Testing utilities for forkflow flows.
//!
//! This module provides:
//! - Mock components with shared, inspectable state
//! - Assertions for flow and task outcomes

mod assertions;
mod mocks;

pub use assertions::{
    assert_flow_failed_with, assert_flow_succeeded, assert_task_cancelled, assert_task_value,
};
pub use mocks::{EchoLoader, FailingComponent, Recorder, RecordingComponent, SlowComponent};
