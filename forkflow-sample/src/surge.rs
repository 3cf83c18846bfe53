//! Surge multiplier, fetched asynchronously.

use crate::dto::{FareCalculationRequest, Location};
use crate::random::simulate_outage;
use async_trait::async_trait;
use forkflow::prelude::*;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{info, warn};

const FALLBACK_SURGE: f64 = 1.0;

#[async_trait]
pub trait SurgeEngine: Send + Sync {
    async fn fetch_surge(
        &self,
        ctx: &FlowContext,
        vehicle_type_id: i64,
        pick_up: Location,
        pick_up_time: SystemTime,
    ) -> anyhow::Result<f64>;
}

/// A surge engine that is down part of the time.
#[derive(Debug, Clone)]
pub struct SimulatedSurgeEngine {
    outage_probability: f64,
}

impl SimulatedSurgeEngine {
    pub const fn new(outage_probability: f64) -> Self {
        Self { outage_probability }
    }
}

#[async_trait]
impl SurgeEngine for SimulatedSurgeEngine {
    async fn fetch_surge(
        &self,
        _ctx: &FlowContext,
        vehicle_type_id: i64,
        pick_up: Location,
        pick_up_time: SystemTime,
    ) -> anyhow::Result<f64> {
        info!(vehicle_type_id, ?pick_up, ?pick_up_time, "Fetching surge");

        if simulate_outage(self.outage_probability) {
            anyhow::bail!("surge engine is down");
        }
        Ok(1.5)
    }
}

pub struct SurgeComponent {
    surge_engine: Arc<dyn SurgeEngine>,
    request: FareCalculationRequest,
}

impl SurgeComponent {
    pub fn new(surge_engine: Arc<dyn SurgeEngine>, request: FareCalculationRequest) -> Self {
        Self {
            surge_engine,
            request,
        }
    }
}

#[async_trait]
impl AsyncComponent<f64> for SurgeComponent {
    async fn execute(&self, ctx: &FlowContext) -> anyhow::Result<f64> {
        let surge = self
            .surge_engine
            .fetch_surge(
                ctx,
                self.request.vehicle_type_id,
                self.request.pick_up,
                self.request.pick_up_time,
            )
            .await
            .unwrap_or_else(|err| {
                warn!(error = %err, fallback = FALLBACK_SURGE, "Error fetching surge");
                FALLBACK_SURGE
            });
        Ok(surge)
    }
}

/// Read handle on the surge result.
#[derive(Debug, Clone)]
pub struct SurgeFuture {
    task: Task<f64>,
}

impl SurgeFuture {
    /// Waits for the surge. Zero if the component failed.
    pub async fn surge(&self) -> f64 {
        self.task.outcome().await.unwrap_or_default()
    }
}

pub fn executor_future(
    surge_engine: Arc<dyn SurgeEngine>,
    request: FareCalculationRequest,
) -> (ComponentExecutor<f64>, SurgeFuture) {
    let executor = create_async_executor(SurgeComponent::new(surge_engine, request));
    let future = SurgeFuture {
        task: executor.get_executing_task().clone(),
    };
    (executor, future)
}
