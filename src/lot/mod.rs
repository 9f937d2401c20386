//! The admission engine
//!
//! # Overview
//!
//! - **ParkingLot**: Shared handle owning the spot map, waiting queue, gate and observers
//! - **LotState**: Lock-free-of-its-own occupancy bookkeeping and invariant checks
//! - **LotConfig / LotTimings**: Capacity, admission policy, seed and simulated delays
//!
//! # Usage Example
//!
//! ```rust
//! use std::sync::Arc;
//! use parking_lot_simulator::events::{RecordingObserver, Subject};
//! use parking_lot_simulator::lot::{EntryOutcome, ParkingLot};
//! use parking_lot_simulator::vehicle::Vehicle;
//!
//! # tokio_test_main();
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn tokio_test_main() {
//! let lot = ParkingLot::new(1).unwrap();
//! let recorder = Arc::new(RecordingObserver::new());
//! lot.register(recorder.clone());
//!
//! tokio::time::pause();
//! assert_eq!(lot.try_enter(Vehicle::new(1)).await, EntryOutcome::Parked { spot: 0 });
//! assert_eq!(lot.try_enter(Vehicle::new(2)).await, EntryOutcome::Queued { position: 1 });
//!
//! lot.shutdown(std::time::Duration::from_secs(1)).await.unwrap();
//! assert_eq!(recorder.len(), 2);
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod state;

pub use config::*;
pub use engine::*;
pub use state::*;
