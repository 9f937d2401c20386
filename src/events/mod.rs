//! Parking events and the observer plumbing that delivers them
//!
//! # Overview
//!
//! - **ParkingEvent**: One occupancy transition (`waiting in queue`, `parked`, `left`)
//! - **Observer / Subject**: The publish/subscribe contract between the lot and its consumers
//! - **ObserverRegistry**: Ordered observer list with copy-before-dispatch delivery
//! - **Observers**: Logging, channel, recording, JSON lines and buffered adapters
//!
//! # Usage Example
//!
//! ```rust
//! use std::sync::Arc;
//! use parking_lot_simulator::events::*;
//! use parking_lot_simulator::types::VehicleId;
//!
//! let registry = ObserverRegistry::new();
//! let recorder = Arc::new(RecordingObserver::new());
//! registry.register(recorder.clone());
//!
//! registry.notify_all(&ParkingEvent::parked(VehicleId::new(1), 0));
//! assert_eq!(recorder.len(), 1);
//! ```

pub mod observer;
pub mod observers;
pub mod parking_event;

// Re-export all public types for convenience
pub use observer::*;
pub use observers::*;
pub use parking_event::*;
