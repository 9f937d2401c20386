//! Simulation orchestration and control
//!
//! # Overview
//!
//! - **SimulationOrchestrator**: Wires configuration, lot and observers, then runs and drains
//! - **ArrivalGenerator**: Poisson arrival process feeding the lot
//! - **SimulationStatistics**: Counters and occupancy figures for a run
//! - **SimulationError**: Error handling for simulation operations
//! - **LoggingConfig**: Global tracing subscriber setup
//!
//! # Usage Example
//!
//! ```rust
//! use parking_lot_simulator::simulation::*;
//! use parking_lot_simulator::types::*;
//!
//! let config = SimulationConfig {
//!     capacity: 5,
//!     arrival_rate: 1.0,
//!     duration_secs: Some(10),
//!     ..Default::default()
//! };
//!
//! let orchestrator = SimulationOrchestrator::new(config).unwrap();
//! assert_eq!(orchestrator.lot().capacity(), 5);
//! ```

pub mod error;
pub mod generator;
pub mod logging;
pub mod orchestrator;
pub mod statistics;

// Re-export all public types for convenience
pub use error::*;
pub use generator::*;
pub use logging::*;
pub use orchestrator::*;
pub use statistics::*;
