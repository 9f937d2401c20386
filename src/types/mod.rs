//! Core types and identifiers for the parking lot simulator
//!
//! This module contains fundamental types, identifiers, and configuration structures
//! used throughout the simulation system.
//!
//! # Overview
//!
//! - **Identifiers**: Sequential vehicle identifiers
//! - **Enums**: Vehicle status and admission policy
//! - **Configuration**: Simulation configuration with validation and CLI support
//!
//! # Usage Example
//!
//! ```rust
//! use parking_lot_simulator::types::*;
//!
//! let id = VehicleId::new(1);
//! assert_eq!(id.to_string(), "VEH_1");
//!
//! let config = SimulationConfig {
//!     capacity: 5,
//!     arrival_rate: 1.5,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod enums;
pub mod identifiers;

// Re-export all public types for convenience
pub use config::*;
pub use enums::*;
pub use identifiers::*;
