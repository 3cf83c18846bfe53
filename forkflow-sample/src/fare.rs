//! Fare calculation: loads fare configs concurrently, then prices the ride
//! in the sequential walk once routing and surge are known.

use crate::dto::RunningFare;
use crate::random::simulate_outage;
use crate::routing::RoutingFuture;
use crate::surge::SurgeFuture;
use anyhow::Context;
use async_trait::async_trait;
use forkflow::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_FARE_TABLE: &str = r#"[
    {"vehicle_type_id": 123, "starting_fare": 1.5, "per_km_fare": 2.0, "per_minute_fare": 3.0},
    {"vehicle_type_id": 456, "starting_fare": 3.0, "per_km_fare": 2.5, "per_minute_fare": 1.0}
]"#;

/// Pricing parameters for one vehicle type.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FareConfigs {
    pub vehicle_type_id: i64,
    pub starting_fare: f64,
    pub per_km_fare: f64,
    pub per_minute_fare: f64,
}

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn fetch_configs(
        &self,
        ctx: &FlowContext,
        vehicle_type_id: i64,
    ) -> anyhow::Result<FareConfigs>;
}

/// A config store backed by a JSON fare table that is down part of the time.
#[derive(Debug, Clone)]
pub struct SimulatedConfigStore {
    table: HashMap<i64, FareConfigs>,
    outage_probability: f64,
}

impl SimulatedConfigStore {
    /// Creates a store over the built-in fare table.
    pub fn new(outage_probability: f64) -> anyhow::Result<Self> {
        Self::from_json(DEFAULT_FARE_TABLE, outage_probability)
    }

    /// Creates a store over a JSON array of [`FareConfigs`].
    pub fn from_json(json: &str, outage_probability: f64) -> anyhow::Result<Self> {
        let rows: Vec<FareConfigs> = serde_json::from_str(json).context("invalid fare table")?;
        Ok(Self {
            table: rows.into_iter().map(|row| (row.vehicle_type_id, row)).collect(),
            outage_probability,
        })
    }
}

#[async_trait]
impl ConfigStore for SimulatedConfigStore {
    async fn fetch_configs(
        &self,
        _ctx: &FlowContext,
        vehicle_type_id: i64,
    ) -> anyhow::Result<FareConfigs> {
        info!(vehicle_type_id, "Fetching fare configs");

        if simulate_outage(self.outage_probability) {
            anyhow::bail!("config store is down");
        }
        self.table
            .get(&vehicle_type_id)
            .copied()
            .with_context(|| format!("no fare configs for vehicle {vehicle_type_id}"))
    }
}

/// The configs that were applied to the fare.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub applied_starting_fare: f64,
    pub applied_per_km_fare: f64,
    pub applied_per_minute_fare: f64,
}

/// What the fare component reads from the rest of the flow.
#[derive(Debug, Clone)]
pub struct FareInput {
    pub vehicle_type_id: i64,
    pub routing: RoutingFuture,
    pub surge: SurgeFuture,
    pub running_fare: RunningFare,
}

pub struct FareComponent {
    config_store: Arc<dyn ConfigStore>,
    input: FareInput,
}

impl FareComponent {
    pub fn new(config_store: Arc<dyn ConfigStore>, input: FareInput) -> Self {
        Self { config_store, input }
    }
}

#[async_trait]
impl SyncComponentWithLoading<FareConfigs, Metadata> for FareComponent {
    async fn load(&self, ctx: &FlowContext) -> anyhow::Result<FareConfigs> {
        self.config_store.fetch_configs(ctx, self.input.vehicle_type_id).await
    }

    async fn execute_sync(
        &self,
        _ctx: &FlowContext,
        data: LoadData<FareConfigs>,
    ) -> anyhow::Result<Metadata> {
        let configs = data.into_result().map_err(|err| {
            warn!(
                vehicle_type_id = self.input.vehicle_type_id,
                error = %err,
                "Error fetching fare configs"
            );
            err
        })?;

        // Blocks until routing and surge have resolved.
        let plan = self.input.routing.travel_plan().await;
        let surge = self.input.surge.surge().await;

        let km_fare = configs.per_km_fare * plan.distance_km;
        let minute_fare = configs.per_minute_fare * plan.duration_secs / 60.0;
        let fare_before_surge = configs.starting_fare + km_fare + minute_fare;

        self.input.running_fare.set_amount(fare_before_surge * surge);

        Ok(Metadata {
            applied_starting_fare: configs.starting_fare,
            applied_per_km_fare: configs.per_km_fare,
            applied_per_minute_fare: configs.per_minute_fare,
        })
    }
}

/// Read handle on the applied configs.
#[derive(Debug, Clone)]
pub struct FareFuture {
    task: Task<Metadata>,
}

impl FareFuture {
    /// Returns the applied configs, or defaults if pricing has not succeeded.
    pub fn metadata(&self) -> Metadata {
        self.task.result_or_default(Metadata::default())
    }
}

pub fn executor_future(
    config_store: Arc<dyn ConfigStore>,
    input: FareInput,
) -> (LoadingExecutor<FareConfigs, Metadata>, FareFuture) {
    let executor = create_sync_executor_with_loading(FareComponent::new(config_store, input));
    let future = FareFuture {
        task: executor.get_executing_task().clone(),
    };
    (executor, future)
}
