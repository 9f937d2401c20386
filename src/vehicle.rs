//! Vehicle entity
//!
//! A vehicle is a disposable identity moving through one entry, dwell and exit
//! cycle. It carries no shared state; dwell timing is owned by the lot.

use crate::types::VehicleId;
use std::fmt;

/// A vehicle arriving at the lot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Vehicle {
    /// Identity assigned by the arrival generator
    pub id: VehicleId,
}

impl Vehicle {
    /// Create a vehicle from a raw sequence number
    pub fn new(id: u64) -> Self {
        Self { id: VehicleId::new(id) }
    }
}

impl From<VehicleId> for Vehicle {
    fn from(id: VehicleId) -> Self {
        Self { id }
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}
