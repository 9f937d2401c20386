//! Engine construction parameters

use std::time::Duration;

use crate::types::{AdmissionPolicy, SimulationConfig};

/// Simulated delays used by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotTimings {
    /// Length of one time unit; the arrival rate is expressed per unit
    pub time_unit: Duration,
    /// Gate hold time on entry
    pub entry_transit: Duration,
    /// Gate hold time on exit
    pub exit_transit: Duration,
    /// Shortest dwell (inclusive)
    pub min_dwell: Duration,
    /// Longest dwell (exclusive, unless equal to `min_dwell`)
    pub max_dwell: Duration,
}

impl Default for LotTimings {
    fn default() -> Self {
        Self {
            time_unit: Duration::from_secs(1),
            entry_transit: Duration::from_millis(500),
            exit_transit: Duration::from_millis(500),
            min_dwell: Duration::from_secs(3),
            max_dwell: Duration::from_secs(5),
        }
    }
}

impl LotTimings {
    /// Fixed dwell instead of a range
    pub fn with_fixed_dwell(mut self, dwell: Duration) -> Self {
        self.min_dwell = dwell;
        self.max_dwell = dwell;
        self
    }

    /// Set both transit delays
    pub fn with_transit(mut self, transit: Duration) -> Self {
        self.entry_transit = transit;
        self.exit_transit = transit;
        self
    }
}

impl From<&SimulationConfig> for LotTimings {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            time_unit: config.time_unit(),
            entry_transit: config.units_to_duration(config.entry_transit_units),
            exit_transit: config.units_to_duration(config.exit_transit_units),
            min_dwell: config.units_to_duration(config.min_dwell_units),
            max_dwell: config.units_to_duration(config.max_dwell_units),
        }
    }
}

/// Everything needed to build a [`super::ParkingLot`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LotConfig {
    /// Number of spots
    pub capacity: usize,
    /// Simulated delays
    pub timings: LotTimings,
    /// Admission policy
    pub policy: AdmissionPolicy,
    /// Seed for dwell and arrival draws
    pub seed: Option<u64>,
}

impl LotConfig {
    /// Default timings and policy for a lot of `capacity` spots
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            timings: LotTimings::default(),
            policy: AdmissionPolicy::default(),
            seed: None,
        }
    }

    /// Replace the timings
    pub fn with_timings(mut self, timings: LotTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Replace the admission policy
    pub fn with_policy(mut self, policy: AdmissionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Seed the random draws
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl From<&SimulationConfig> for LotConfig {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            capacity: config.capacity,
            timings: LotTimings::from(config),
            policy: config.admission_policy,
            seed: config.seed,
        }
    }
}
