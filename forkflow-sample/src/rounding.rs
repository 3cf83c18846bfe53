//! Rounds the running fare.

use crate::dto::RunningFare;
use async_trait::async_trait;
use forkflow::prelude::*;

const DECIMAL_PLACES: i32 = 2;

pub struct RoundingComponent {
    running_fare: RunningFare,
}

#[async_trait]
impl SyncComponent<()> for RoundingComponent {
    async fn execute_sync(&self, _ctx: &FlowContext) -> anyhow::Result<()> {
        self.running_fare.update(|amount| round_to(amount, DECIMAL_PLACES));
        Ok(())
    }
}

pub fn executor(running_fare: RunningFare) -> ComponentExecutor<()> {
    create_sync_executor(RoundingComponent { running_fare })
}

fn round_to(amount: f64, decimal_places: i32) -> f64 {
    let pow = 10_f64.powi(decimal_places);
    (amount * pow).round() / pow
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rounds_running_fare() {
        let fare = RunningFare::default();
        fare.set_amount(12.345_67);

        let executor = executor(fare.clone());
        assert!(executor.invoke_sync_task(&FlowContext::new()).await.is_ok());

        assert!((fare.amount() - 12.35).abs() < 1e-9);
    }
}
