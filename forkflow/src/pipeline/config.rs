//! Scheduler configuration.

use serde::{Deserialize, Serialize};

/// Which executors are cancelled when a branch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePolicy {
    /// The failing branch and every branch after it. Earlier branches keep
    /// running.
    #[default]
    Downstream,
    /// Every branch of the flow.
    AllBranches,
}

impl CascadePolicy {
    /// Index of the first branch to cancel when branch `failing` fails.
    #[must_use]
    pub const fn first_branch(self, failing: usize) -> usize {
        match self {
            Self::Downstream => failing,
            Self::AllBranches => 0,
        }
    }
}

/// Configuration for [`ForkJoin`](super::ForkJoin).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForkJoinConfig {
    /// Cascade applied when a branch reports an error.
    pub cascade: CascadePolicy,
    /// Cancel every remaining executor when the scheduler returns an error.
    ///
    /// Off by default: workers that are still running when the scheduler
    /// returns keep running in the background.
    pub cancel_on_return: bool,
}

impl ForkJoinConfig {
    /// Creates the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cascade policy.
    #[must_use]
    pub const fn with_cascade(mut self, cascade: CascadePolicy) -> Self {
        self.cascade = cascade;
        self
    }

    /// Sets whether remaining executors are cancelled on an error return.
    #[must_use]
    pub const fn with_cancel_on_return(mut self, cancel_on_return: bool) -> Self {
        self.cancel_on_return = cancel_on_return;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ForkJoinConfig::new();

        assert_eq!(config.cascade, CascadePolicy::Downstream);
        assert!(!config.cancel_on_return);
    }

    #[test]
    fn test_first_branch() {
        assert_eq!(CascadePolicy::Downstream.first_branch(2), 2);
        assert_eq!(CascadePolicy::AllBranches.first_branch(2), 0);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ForkJoinConfig =
            serde_json::from_str(r#"{"cascade": "all_branches"}"#).unwrap();

        assert_eq!(
            config,
            ForkJoinConfig::new().with_cascade(CascadePolicy::AllBranches)
        );
    }
}
