//! Mock components for testing flows.
//!
//! Every component is cheap to clone and clones share their recorded state,
//! so a test can move one clone into an executor and inspect another.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

use crate::cancellation::FlowContext;
use crate::component::{AsyncComponent, LoadData, SyncComponent, SyncComponentWithLoading};

/// Shared record of which [`RecordingComponent`]s ran, in order.
#[derive(Debug, Default)]
pub struct Recorder {
    value: Mutex<usize>,
    observed: Mutex<Vec<usize>>,
}

impl Recorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns the index written last.
    #[must_use]
    pub fn value(&self) -> usize {
        *self.value.lock()
    }

    /// Returns every index written, in execution order.
    #[must_use]
    pub fn observed(&self) -> Vec<usize> {
        self.observed.lock().clone()
    }

    fn record(&self, index: usize) {
        *self.value.lock() = index;
        self.observed.lock().push(index);
    }
}

/// A component that writes its index into a shared [`Recorder`] and
/// returns it.
#[derive(Debug, Clone)]
pub struct RecordingComponent {
    index: usize,
    recorder: Arc<Recorder>,
}

impl RecordingComponent {
    /// Creates a component writing `index`.
    #[must_use]
    pub fn new(index: usize, recorder: &Arc<Recorder>) -> Self {
        Self {
            index,
            recorder: Arc::clone(recorder),
        }
    }
}

#[async_trait]
impl SyncComponent<usize> for RecordingComponent {
    async fn execute_sync(&self, _ctx: &FlowContext) -> anyhow::Result<usize> {
        self.recorder.record(self.index);
        Ok(self.index)
    }
}

#[async_trait]
impl AsyncComponent<usize> for RecordingComponent {
    async fn execute(&self, _ctx: &FlowContext) -> anyhow::Result<usize> {
        self.recorder.record(self.index);
        Ok(self.index)
    }
}

/// A component that fails with a fixed message, optionally after a delay.
///
/// The delay ignores cancellation.
#[derive(Debug, Clone)]
pub struct FailingComponent {
    message: String,
    delay: Duration,
    calls: Arc<Mutex<usize>>,
}

impl FailingComponent {
    /// Creates a component that fails immediately.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Fails only after `delay`.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of times the component ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }

    async fn fail(&self) -> anyhow::Result<()> {
        *self.calls.lock() += 1;
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Err(anyhow::anyhow!("{}", self.message))
    }
}

#[async_trait]
impl SyncComponent<()> for FailingComponent {
    async fn execute_sync(&self, _ctx: &FlowContext) -> anyhow::Result<()> {
        self.fail().await
    }
}

#[async_trait]
impl AsyncComponent<()> for FailingComponent {
    async fn execute(&self, _ctx: &FlowContext) -> anyhow::Result<()> {
        self.fail().await
    }
}

/// A component that returns a value after a delay, or the context's error
/// if the context is done first.
#[derive(Debug, Clone)]
pub struct SlowComponent<T> {
    value: T,
    delay: Duration,
    contexts: Arc<Mutex<Vec<FlowContext>>>,
}

impl<T> SlowComponent<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a component returning `value` after `delay`.
    #[must_use]
    pub fn new(value: T, delay: Duration) -> Self {
        Self {
            value,
            delay,
            contexts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns the contexts the component was invoked with.
    #[must_use]
    pub fn contexts(&self) -> Vec<FlowContext> {
        self.contexts.lock().clone()
    }

    async fn wait(&self, ctx: &FlowContext) -> anyhow::Result<T> {
        self.contexts.lock().push(ctx.clone());
        tokio::select! {
            () = tokio::time::sleep(self.delay) => Ok(self.value.clone()),
            err = ctx.done() => Err(err.into()),
        }
    }
}

#[async_trait]
impl<T> SyncComponent<T> for SlowComponent<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn execute_sync(&self, ctx: &FlowContext) -> anyhow::Result<T> {
        self.wait(ctx).await
    }
}

#[async_trait]
impl<T> AsyncComponent<T> for SlowComponent<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn execute(&self, ctx: &FlowContext) -> anyhow::Result<T> {
        self.wait(ctx).await
    }
}

/// A loading component whose executing step returns the [`LoadData`] it
/// was handed.
#[derive(Debug, Clone)]
pub struct EchoLoader<V> {
    load: Result<V, String>,
}

impl<V> EchoLoader<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a loader whose load succeeds with `value`.
    #[must_use]
    pub const fn loading(value: V) -> Self {
        Self { load: Ok(value) }
    }

    /// Creates a loader whose load fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            load: Err(message.into()),
        }
    }
}

#[async_trait]
impl<V> SyncComponentWithLoading<V, LoadData<V>> for EchoLoader<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn load(&self, _ctx: &FlowContext) -> anyhow::Result<V> {
        self.load.clone().map_err(|message| anyhow::anyhow!(message))
    }

    async fn execute_sync(
        &self,
        _ctx: &FlowContext,
        data: LoadData<V>,
    ) -> anyhow::Result<LoadData<V>> {
        Ok(data)
    }
}
