//! Simulated outages for the demo dependencies.

use rand::Rng;

/// Returns true with the given probability, clamped to `[0, 1]`.
pub fn simulate_outage(probability: f64) -> bool {
    rand::thread_rng().gen_bool(probability.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(!simulate_outage(0.0));
        assert!(simulate_outage(1.0));
        assert!(!simulate_outage(-3.0));
    }
}
