//! Enumeration types for the parking lot simulator
//!
//! This module contains the vehicle status reported in events and the
//! admission policy used by the engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status carried by every published parking event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleStatus {
    /// Lot was full on arrival; the vehicle joined the waiting queue
    #[serde(rename = "waiting in queue")]
    WaitingInQueue,
    /// Vehicle passed the gate and occupies a spot
    #[serde(rename = "parked")]
    Parked,
    /// Vehicle passed the gate on its way out and freed its spot
    #[serde(rename = "left")]
    Left,
}

impl VehicleStatus {
    /// Wire representation of the status
    pub const fn as_str(self) -> &'static str {
        match self {
            VehicleStatus::WaitingInQueue => "waiting in queue",
            VehicleStatus::Parked => "parked",
            VehicleStatus::Left => "left",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "waiting in queue" | "waiting" => Ok(VehicleStatus::WaitingInQueue),
            "parked" => Ok(VehicleStatus::Parked),
            "left" => Ok(VehicleStatus::Left),
            _ => Err(format!("Unknown vehicle status: {}", s)),
        }
    }
}

/// How the engine decides between admitting and queueing an arriving vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionPolicy {
    /// Capacity check and reserve-or-enqueue happen in one critical section.
    /// Freed spots are handed directly to the head of the waiting queue.
    #[default]
    Atomic,
    /// Capacity check and enqueue are separate lock acquisitions, and the spot
    /// search happens only after the gate. Concurrent arrivals can over-admit
    /// and lose the spot race.
    Legacy,
}

impl fmt::Display for AdmissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionPolicy::Atomic => write!(f, "atomic"),
            AdmissionPolicy::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for AdmissionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "atomic" => Ok(AdmissionPolicy::Atomic),
            "legacy" => Ok(AdmissionPolicy::Legacy),
            _ => Err(format!("Unknown admission policy: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_status_display() {
        assert_eq!(VehicleStatus::WaitingInQueue.to_string(), "waiting in queue");
        assert_eq!(VehicleStatus::Parked.to_string(), "parked");
        assert_eq!(VehicleStatus::Left.to_string(), "left");
    }

    #[test]
    fn test_vehicle_status_serialization_matches_display() {
        for status in [VehicleStatus::WaitingInQueue, VehicleStatus::Parked, VehicleStatus::Left] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
        }
    }

    #[test]
    fn test_vehicle_status_from_str() {
        assert_eq!("Parked".parse::<VehicleStatus>().unwrap(), VehicleStatus::Parked);
        assert_eq!(
            "waiting in queue".parse::<VehicleStatus>().unwrap(),
            VehicleStatus::WaitingInQueue
        );
        assert!("towed".parse::<VehicleStatus>().is_err());
    }

    #[test]
    fn test_admission_policy_parsing() {
        assert_eq!("atomic".parse::<AdmissionPolicy>().unwrap(), AdmissionPolicy::Atomic);
        assert_eq!("LEGACY".parse::<AdmissionPolicy>().unwrap(), AdmissionPolicy::Legacy);
        assert!("fifo".parse::<AdmissionPolicy>().is_err());
        assert_eq!(AdmissionPolicy::default(), AdmissionPolicy::Atomic);
    }
}
