//! Request and shared value types.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::SystemTime;

/// A point on the map, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

/// One ride to price.
#[derive(Debug, Clone)]
pub struct FareCalculationRequest {
    pub vehicle_type_id: i64,
    pub pick_up: Location,
    pub drop_off: Location,
    pub pick_up_time: SystemTime,
}

/// The fare being computed, shared by the components that write it.
#[derive(Debug, Clone, Default)]
pub struct RunningFare {
    amount: Arc<Mutex<f64>>,
}

impl RunningFare {
    pub fn amount(&self) -> f64 {
        *self.amount.lock()
    }

    pub fn set_amount(&self, amount: f64) {
        *self.amount.lock() = amount;
    }

    pub fn update(&self, f: impl FnOnce(f64) -> f64) {
        let mut amount = self.amount.lock();
        *amount = f(*amount);
    }
}
