//! Identifier types for the parking lot simulator
//!
//! Vehicles are identified by a sequential integer handed out by the arrival
//! generator. The identifier serializes as a bare integer so event payloads
//! stay compact for downstream consumers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub u64);

impl VehicleId {
    /// Create a vehicle ID from a raw integer
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw integer value
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The ID that follows this one in the generator sequence
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl From<u64> for VehicleId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VEH_{}", self.0)
    }
}
