//! Error types and handling
//!
//! This module contains error types for the parking lot simulation. Vehicles
//! that are abandoned on shutdown or lose the spot race are not errors; they
//! are reported through [`crate::lot::EntryOutcome`] and the statistics.

use thiserror::Error;

use crate::lot::{InvariantViolation, VacateError};
use crate::types::{ConfigValidationError, VehicleId};

/// Errors that can occur during simulation
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Lot constructed without any spots
    #[error("Capacity must be greater than 0, got {0}")]
    InvalidCapacity(usize),

    /// Arrival rate not usable for an exponential distribution
    #[error("Arrival rate must be a positive finite number, got {0}")]
    InvalidArrivalRate(f64),

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ConfigurationError(String),

    /// A departure named a spot the vehicle does not hold
    #[error("{vehicle} cannot leave: {source}")]
    InvalidDeparture {
        /// Vehicle attempting to leave
        vehicle: VehicleId,
        /// Why the spot could not be vacated
        #[source]
        source: VacateError,
    },

    /// Occupancy bookkeeping is inconsistent
    #[error("Lot invariant violated: {0}")]
    InvariantViolation(#[from] InvariantViolation),

    /// In-flight vehicles did not drain before the shutdown deadline
    #[error("Shutdown timed out with {pending} task(s) still in flight")]
    ShutdownTimeout {
        /// Tasks still running at the deadline
        pending: usize,
    },

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<ConfigValidationError> for SimulationError {
    fn from(error: ConfigValidationError) -> Self {
        SimulationError::ConfigurationError(error.to_string())
    }
}

impl SimulationError {
    /// Check if the simulation can keep running after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            SimulationError::InvalidCapacity(_) => false,
            SimulationError::InvalidArrivalRate(_) => false,
            SimulationError::ConfigurationError(_) => false,
            SimulationError::InvalidDeparture { .. } => true,
            SimulationError::InvariantViolation(_) => false,
            SimulationError::ShutdownTimeout { .. } => true,
            SimulationError::IoError(_) => true,
            SimulationError::SerializationError(_) => true,
        }
    }

    /// Get the error category
    pub fn category(&self) -> &'static str {
        match self {
            SimulationError::InvalidCapacity(_)
            | SimulationError::InvalidArrivalRate(_)
            | SimulationError::ConfigurationError(_) => "Configuration",
            SimulationError::InvalidDeparture { .. } => "Departure",
            SimulationError::InvariantViolation(_) => "Invariant",
            SimulationError::ShutdownTimeout { .. } => "Shutdown",
            SimulationError::IoError(_) => "IO",
            SimulationError::SerializationError(_) => "Serialization",
        }
    }
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;
