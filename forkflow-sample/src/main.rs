//! Prices one ride by wiring routing, surge, fare and rounding components
//! into a single flow.
//!
//! Set `FORKFLOW_CONFIG` to a JSON [`ForkJoinConfig`] to change how the
//! scheduler cascades failures, and `RUST_LOG` to control log output.

mod dto;
mod fare;
mod random;
mod rounding;
mod routing;
mod surge;

use anyhow::Context;
use dto::{FareCalculationRequest, Location, RunningFare};
use fare::{ConfigStore, FareInput, Metadata, SimulatedConfigStore};
use forkflow::prelude::*;
use routing::{MapService, SimulatedMapService};
use std::sync::Arc;
use std::time::SystemTime;
use surge::{SimulatedSurgeEngine, SurgeEngine};

const OUTAGE_PROBABILITY: f64 = 0.5;

/// External services the components depend on.
struct Dependencies {
    map_service: Arc<dyn MapService>,
    surge_engine: Arc<dyn SurgeEngine>,
    config_store: Arc<dyn ConfigStore>,
}

/// The priced ride.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Quote {
    amount: f64,
    metadata: Metadata,
}

async fn calculate_fare(
    scheduler: &ForkJoin,
    deps: &Dependencies,
    request: FareCalculationRequest,
) -> Result<Quote> {
    let running_fare = RunningFare::default();

    let (routing_executor, routing_future) =
        routing::executor_future(Arc::clone(&deps.map_service), request.clone());
    let (surge_executor, surge_future) =
        surge::executor_future(Arc::clone(&deps.surge_engine), request.clone());

    // Fare waits on routing and surge through their futures.
    let (fare_executor, fare_future) = fare::executor_future(
        Arc::clone(&deps.config_store),
        FareInput {
            vehicle_type_id: request.vehicle_type_id,
            routing: routing_future,
            surge: surge_future,
            running_fare: running_fare.clone(),
        },
    );
    let rounding_executor = rounding::executor(running_fare.clone());

    // Synchronous steps run in append order.
    let flow = ExecutionFlowBuilder::new()
        .append(routing_executor)
        .append(surge_executor)
        .append(fare_executor)
        .append(rounding_executor)
        .build();

    scheduler.run(&FlowContext::new(), &flow).await?;

    Ok(Quote {
        amount: running_fare.amount(),
        metadata: fare_future.metadata(),
    })
}

fn load_config() -> anyhow::Result<ForkJoinConfig> {
    match std::env::var("FORKFLOW_CONFIG") {
        Ok(json) => serde_json::from_str(&json).context("invalid FORKFLOW_CONFIG"),
        Err(_) => Ok(ForkJoinConfig::default()),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let deps = Dependencies {
        map_service: Arc::new(SimulatedMapService::new(OUTAGE_PROBABILITY)),
        surge_engine: Arc::new(SimulatedSurgeEngine::new(OUTAGE_PROBABILITY)),
        config_store: Arc::new(SimulatedConfigStore::new(OUTAGE_PROBABILITY)?),
    };
    let scheduler = ForkJoin::new(load_config()?);

    let request = FareCalculationRequest {
        vehicle_type_id: 123,
        pick_up: Location {
            lat: 1.314_863_9,
            lng: 103.758_908_1,
        },
        drop_off: Location {
            lat: 1.354_492_4,
            lng: 103.983_730_6,
        },
        pick_up_time: SystemTime::now(),
    };

    match calculate_fare(&scheduler, &deps, request).await {
        Ok(quote) => {
            println!("calculated fare: {}", quote.amount);
            println!("applied fare configs: {}", serde_json::to_string(&quote.metadata)?);
        }
        Err(err) => println!("ending execution flow early due to error: {err}"),
    }
    Ok(())
}
