//! Parking events
//!
//! One event is published per state transition. The serialized shape is the
//! boundary contract with presentation layers:
//! `{ "id", "spot", "status", "queuePosition" }`, where `spot` is present only
//! for `parked`/`left` and `queuePosition` only for `waiting in queue`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{VehicleId, VehicleStatus};

/// A single occupancy transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingEvent {
    /// Vehicle the transition applies to
    pub id: VehicleId,
    /// Spot index for `Parked` and `Left`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spot: Option<usize>,
    /// What happened
    pub status: VehicleStatus,
    /// 1-based queue position for `WaitingInQueue`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
}

impl ParkingEvent {
    /// Vehicle joined the waiting queue at `queue_position`
    pub fn waiting(id: VehicleId, queue_position: usize) -> Self {
        Self {
            id,
            spot: None,
            status: VehicleStatus::WaitingInQueue,
            queue_position: Some(queue_position),
        }
    }

    /// Vehicle parked at `spot`
    pub fn parked(id: VehicleId, spot: usize) -> Self {
        Self { id, spot: Some(spot), status: VehicleStatus::Parked, queue_position: None }
    }

    /// Vehicle left `spot`
    pub fn left(id: VehicleId, spot: usize) -> Self {
        Self { id, spot: Some(spot), status: VehicleStatus::Left, queue_position: None }
    }

    /// Serialize as a single JSON line
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for ParkingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, self.spot, self.queue_position) {
            (VehicleStatus::WaitingInQueue, _, Some(position)) => {
                write!(f, "{} waiting (parking full), queue position {}", self.id, position)
            }
            (VehicleStatus::Parked, Some(spot), _) => write!(f, "{} parked at spot {}", self.id, spot),
            (VehicleStatus::Left, Some(spot), _) => write!(f, "{} left spot {}", self.id, spot),
            (status, _, _) => write!(f, "{} {}", self.id, status),
        }
    }
}
