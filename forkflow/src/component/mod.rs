//! Component capability contracts.
//!
//! A component is a unit of business logic. It declares how it may be
//! scheduled by which trait it implements:
//!
//! - [`SyncComponent`] runs in its branch's sequential walk, in append order.
//! - [`AsyncComponent`] runs concurrently with everything else.
//! - [`SyncComponentWithLoading`] loads concurrently, then executes in the
//!   sequential walk once its load has resolved.
//!
//! The engine never looks inside a component; it only cares about its shape.

use crate::cancellation::FlowContext;
use crate::errors::ForkflowError;
use async_trait::async_trait;

/// A component that may run concurrently with other components.
///
/// Its error is authoritative and stops the flow.
#[async_trait]
pub trait AsyncComponent<T>: Send + Sync {
    /// Executes the component. Invoked at most once per executor.
    async fn execute(&self, ctx: &FlowContext) -> anyhow::Result<T>;
}

/// A component that must run sequentially with the other synchronous
/// components of its branch.
///
/// Use [`SyncComponentWithLoading`] instead if some loading has to happen
/// before the main logic.
#[async_trait]
pub trait SyncComponent<T>: Send + Sync {
    /// Executes the component. Invoked at most once per executor.
    async fn execute_sync(&self, ctx: &FlowContext) -> anyhow::Result<T>;
}

/// A synchronous component whose loading step runs concurrently ahead of
/// the sequential walk.
///
/// The component decides how to react to a failed load; a failed load never
/// prevents [`execute_sync`](Self::execute_sync) from being invoked.
#[async_trait]
pub trait SyncComponentWithLoading<V, T>: Send + Sync {
    /// Loads the data the executing step needs.
    async fn load(&self, ctx: &FlowContext) -> anyhow::Result<V>;

    /// Executes the component with whatever the loading step produced.
    async fn execute_sync(&self, ctx: &FlowContext, data: LoadData<V>) -> anyhow::Result<T>;
}

/// The materialized outcome of a loading step.
#[derive(Debug, Clone)]
pub struct LoadData<V> {
    result: Result<V, ForkflowError>,
}

impl<V> LoadData<V> {
    /// Wraps a loading outcome.
    #[must_use]
    pub const fn new(result: Result<V, ForkflowError>) -> Self {
        Self { result }
    }

    /// Returns the loaded data, if loading succeeded.
    #[must_use]
    pub fn data(&self) -> Option<&V> {
        self.result.as_ref().ok()
    }

    /// Returns the loading error, if loading failed.
    #[must_use]
    pub fn error(&self) -> Option<&ForkflowError> {
        self.result.as_ref().err()
    }

    /// Returns true if loading failed.
    #[must_use]
    pub const fn is_err(&self) -> bool {
        self.result.is_err()
    }

    /// Returns the loaded data or `default` if loading failed.
    pub fn data_or(self, default: V) -> V {
        self.result.unwrap_or(default)
    }

    /// Converts into the underlying result.
    pub fn into_result(self) -> Result<V, ForkflowError> {
        self.result
    }
}

impl<V> From<Result<V, ForkflowError>> for LoadData<V> {
    fn from(result: Result<V, ForkflowError>) -> Self {
        Self::new(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_data_success() {
        let data = LoadData::new(Ok(3));

        assert_eq!(data.data(), Some(&3));
        assert!(data.error().is_none());
        assert!(!data.is_err());
        assert_eq!(data.data_or(0), 3);
    }

    #[test]
    fn test_load_data_failure() {
        let data: LoadData<i32> =
            Err(ForkflowError::component(anyhow::anyhow!("store down"))).into();

        assert!(data.data().is_none());
        assert_eq!(data.error().map(ToString::to_string), Some("store down".to_string()));
        assert_eq!(data.clone().data_or(9), 9);
        assert!(data.into_result().is_err());
    }
}
