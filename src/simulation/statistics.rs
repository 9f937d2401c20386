//! Statistics collection and reporting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::types::AdmissionPolicy;

/// Counters and occupancy figures for one simulation run
///
/// `arrivals` counts fresh arrivals only; vehicles released from the queue
/// retry entry without being counted again. A vehicle can therefore appear in
/// both `queued` and `parked`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStatistics {
    /// Number of spots
    pub capacity: usize,
    /// Admission policy the run used
    pub policy: AdmissionPolicy,
    /// Vehicles produced by the arrival process or passed to `try_enter`
    pub arrivals: u64,
    /// `parked` events published
    pub parked: u64,
    /// `waiting in queue` events published
    pub queued: u64,
    /// `left` events published
    pub departed: u64,
    /// Entry attempts cut short by shutdown
    pub abandoned: u64,
    /// Vehicles that found no free spot after passing the gate
    pub lost: u64,
    /// Highest number of occupied spots seen
    pub peak_occupancy: usize,
    /// Longest waiting queue seen
    pub peak_queue_length: usize,
    /// Occupied spots when the statistics were taken
    pub final_occupancy: usize,
    /// Waiting vehicles when the statistics were taken
    pub final_queue_length: usize,
    /// When the lot was created
    pub started_at: DateTime<Utc>,
    /// Wall-clock time since the lot was created
    pub simulation_duration: Duration,
}

impl SimulationStatistics {
    /// Final occupancy as a percentage of capacity
    pub fn occupancy_percentage(&self) -> f64 {
        percentage(self.final_occupancy as u64, self.capacity as u64)
    }

    /// Peak occupancy as a percentage of capacity
    pub fn peak_occupancy_percentage(&self) -> f64 {
        percentage(self.peak_occupancy as u64, self.capacity as u64)
    }

    /// Share of arrivals that had to wait
    pub fn queued_percentage(&self) -> f64 {
        percentage(self.queued, self.arrivals)
    }

    /// Arrivals per wall-clock second
    pub fn arrivals_per_second(&self) -> f64 {
        let secs = self.simulation_duration.as_secs_f64();
        if secs > 0.0 {
            self.arrivals as f64 / secs
        } else {
            0.0
        }
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "Lot Summary: {} arrivals | Parked: {} | Queued: {} ({:.1}%) | Departed: {} | Abandoned: {} | Lost: {} | Occupancy: {}/{} ({:.1}%)",
            self.arrivals,
            self.parked,
            self.queued,
            self.queued_percentage(),
            self.departed,
            self.abandoned,
            self.lost,
            self.final_occupancy,
            self.capacity,
            self.occupancy_percentage()
        )
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl fmt::Display for SimulationStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulation Statistics:")?;
        writeln!(f, "  Started: {}", self.started_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f, "  Duration: {:.2}s", self.simulation_duration.as_secs_f64())?;
        writeln!(f, "  Capacity: {} spots ({} admission)", self.capacity, self.policy)?;
        writeln!(f, "  Arrivals: {} ({:.2}/s)", self.arrivals, self.arrivals_per_second())?;
        writeln!(f, "  Parked: {}", self.parked)?;
        writeln!(f, "  Queued: {} ({:.1}%)", self.queued, self.queued_percentage())?;
        writeln!(f, "  Departed: {}", self.departed)?;
        writeln!(f, "  Abandoned on shutdown: {}", self.abandoned)?;
        if self.lost > 0 {
            writeln!(f, "  Lost after gate: {}", self.lost)?;
        }
        writeln!(
            f,
            "  Peak occupancy: {} ({:.1}%)",
            self.peak_occupancy,
            self.peak_occupancy_percentage()
        )?;
        writeln!(f, "  Peak queue length: {}", self.peak_queue_length)?;
        write!(
            f,
            "  Final state: {} parked, {} waiting",
            self.final_occupancy, self.final_queue_length
        )
    }
}
