//! Parking Lot Simulator
//!
//! A concurrent admission engine for a capacity-bounded parking lot behind a
//! single-lane gate, driven by a Poisson arrival process.
//!
//! # Overview
//!
//! Vehicles arrive at random intervals and try to enter. The lot either admits
//! them through the gate to the first free spot, or appends them to a FIFO
//! waiting queue when it is full. Parked vehicles leave after a random dwell
//! time, which releases the head of the queue. Every transition is published
//! to registered observers as a [`ParkingEvent`].
//!
//! ## Key Features
//!
//! - **Single-lane gate**: At most one vehicle is in entry or exit transit at a time
//! - **Atomic admission**: Capacity check and reserve-or-enqueue happen in one critical section
//! - **FIFO hand-over**: A freed spot goes to the longest-waiting vehicle
//! - **Observer fan-out**: Synchronous, channel, JSON-lines and buffered observers
//! - **Clean shutdown**: Every wait races a cancellation token; in-flight tasks are drained
//!
//! ## Quick Start
//!
//! ```rust
//! use parking_lot_simulator::*;
//!
//! let config = SimulationConfig {
//!     capacity: 10,
//!     arrival_rate: 1.0,
//!     duration_secs: Some(30),
//!     ..Default::default()
//! };
//!
//! let orchestrator = SimulationOrchestrator::new(config)?;
//! println!("Simulating a lot of {} spots", orchestrator.lot().capacity());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`types`]: Identifiers, status enums and configuration
//! - [`vehicle`]: The vehicle record
//! - [`events`]: Event payload, observer traits and concrete observers
//! - [`lot`]: Occupancy bookkeeping and the admission engine
//! - [`simulation`]: Arrival process, orchestration, statistics, errors and logging
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐    ┌─────────────┐    ┌─────────────┐
//! │ Simulation  │    │     Lot     │    │   Events    │
//! │             │    │             │    │             │
//! │ Orchestrator├───►│ ParkingLot  ├───►│ Registry    │
//! │ Arrivals    │    │ Gate        │    │ Observers   │
//! │ Statistics  │    │ LotState    │    │ ParkingEvent│
//! └─────────────┘    └─────────────┘    └─────────────┘
//!        │                  │                   │
//!        ▼                  ▼                   ▼
//! ┌─────────────────────────────────────────────────────┐
//! │ Types: VehicleId, VehicleStatus, SimulationConfig   │
//! └─────────────────────────────────────────────────────┘
//! ```
#![warn(missing_docs, missing_debug_implementations, unreachable_pub)]

pub mod events;
pub mod lot;
pub mod simulation;
pub mod types;
pub mod vehicle;

// Core types and identifiers
pub use types::{
    AdmissionPolicy, ConfigValidationError, SimulationConfig, VehicleId, VehicleStatus,
};

pub use vehicle::Vehicle;

// Events and observers
pub use events::{Observer, ObserverRegistry, ParkingEvent, Subject};

// Admission engine
pub use lot::{DepartureOutcome, EntryOutcome, LotConfig, LotSnapshot, LotTimings, ParkingLot};

// Simulation types and functionality
pub use simulation::{
    ArrivalGenerator, SimulationError, SimulationOrchestrator, SimulationResult,
    SimulationStatistics,
};
