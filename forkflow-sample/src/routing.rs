//! Travel distance and duration, fetched asynchronously.

use crate::dto::{FareCalculationRequest, Location};
use crate::random::simulate_outage;
use async_trait::async_trait;
use forkflow::prelude::*;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{info, warn};

const FALLBACK_SPEED_KM_PER_HOUR: f64 = 20.0;

/// Distance and duration to travel between two points.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TravelPlan {
    pub distance_km: f64,
    pub duration_secs: f64,
}

#[async_trait]
pub trait MapService: Send + Sync {
    async fn fetch_travel_plan(
        &self,
        ctx: &FlowContext,
        vehicle_type_id: i64,
        pick_up: Location,
        drop_off: Location,
        pick_up_time: SystemTime,
    ) -> anyhow::Result<TravelPlan>;
}

/// A map service that is down part of the time.
#[derive(Debug, Clone)]
pub struct SimulatedMapService {
    outage_probability: f64,
}

impl SimulatedMapService {
    pub const fn new(outage_probability: f64) -> Self {
        Self { outage_probability }
    }
}

#[async_trait]
impl MapService for SimulatedMapService {
    async fn fetch_travel_plan(
        &self,
        _ctx: &FlowContext,
        vehicle_type_id: i64,
        pick_up: Location,
        drop_off: Location,
        pick_up_time: SystemTime,
    ) -> anyhow::Result<TravelPlan> {
        info!(
            vehicle_type_id,
            ?pick_up,
            ?drop_off,
            ?pick_up_time,
            "Fetching travel plan"
        );

        if simulate_outage(self.outage_probability) {
            anyhow::bail!("map service is down");
        }

        Ok(TravelPlan {
            distance_km: 7.5,
            duration_secs: 30.0 * 60.0,
        })
    }
}

/// Fetches the travel plan, falling back to a straight-line estimate when
/// the map service fails.
pub struct RoutingComponent {
    map_service: Arc<dyn MapService>,
    request: FareCalculationRequest,
}

impl RoutingComponent {
    pub fn new(map_service: Arc<dyn MapService>, request: FareCalculationRequest) -> Self {
        Self {
            map_service,
            request,
        }
    }

    fn fallback_travel_plan(&self) -> TravelPlan {
        let distance_km = geo_distance_km(self.request.pick_up, self.request.drop_off);
        TravelPlan {
            distance_km,
            duration_secs: distance_km / FALLBACK_SPEED_KM_PER_HOUR * 3600.0,
        }
    }
}

#[async_trait]
impl AsyncComponent<TravelPlan> for RoutingComponent {
    async fn execute(&self, ctx: &FlowContext) -> anyhow::Result<TravelPlan> {
        let plan = match self
            .map_service
            .fetch_travel_plan(
                ctx,
                self.request.vehicle_type_id,
                self.request.pick_up,
                self.request.drop_off,
                self.request.pick_up_time,
            )
            .await
        {
            Ok(plan) => plan,
            Err(err) => {
                warn!(error = %err, "Error fetching travel plan, using straight-line estimate");
                self.fallback_travel_plan()
            }
        };
        Ok(plan)
    }
}

/// Read handle on the routing result.
#[derive(Debug, Clone)]
pub struct RoutingFuture {
    task: Task<TravelPlan>,
}

impl RoutingFuture {
    /// Waits for routing to finish. Falls back to an empty plan if it failed.
    pub async fn travel_plan(&self) -> TravelPlan {
        self.task.outcome().await.unwrap_or_default()
    }
}

pub fn executor_future(
    map_service: Arc<dyn MapService>,
    request: FareCalculationRequest,
) -> (ComponentExecutor<TravelPlan>, RoutingFuture) {
    let executor = create_async_executor(RoutingComponent::new(map_service, request));
    let future = RoutingFuture {
        task: executor.get_executing_task().clone(),
    };
    (executor, future)
}

/// Great-circle distance between two points, in kilometres.
pub fn geo_distance_km(from: Location, to: Location) -> f64 {
    let from_lat = from.lat.to_radians();
    let to_lat = to.lat.to_radians();
    let theta = (from.lng - to.lng).to_radians();

    let cos_angle = from_lat.sin().mul_add(
        to_lat.sin(),
        from_lat.cos() * to_lat.cos() * theta.cos(),
    );
    let degrees = cos_angle.min(1.0).acos().to_degrees();

    // Nautical miles to statute miles to kilometres.
    degrees * 60.0 * 1.1515 * 1.609_344
}
