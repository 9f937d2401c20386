//! Subject/Observer contract
//!
//! The lot publishes every transition through a [`Subject`]. Observers are
//! invoked synchronously, in registration order, on the task that produced the
//! transition. The registry copies its observer list before dispatch so that no
//! lock is held while observer code runs; an observer may therefore call back
//! into the lot (including registering further observers) without deadlocking.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use super::ParkingEvent;

/// A consumer of parking events
pub trait Observer: Send + Sync {
    /// Receive one event
    fn update(&self, event: &ParkingEvent);
}

impl<F> Observer for F
where
    F: Fn(&ParkingEvent) + Send + Sync,
{
    fn update(&self, event: &ParkingEvent) {
        self(event)
    }
}

/// A publisher of parking events
pub trait Subject {
    /// Subscribe an observer. No deduplication is performed.
    fn register(&self, observer: Arc<dyn Observer>);

    /// Deliver `event` to every registered observer
    fn notify_all(&self, event: &ParkingEvent);
}

/// Ordered set of observers with copy-before-dispatch delivery
#[derive(Default)]
pub struct ObserverRegistry {
    observers: RwLock<Vec<Arc<dyn Observer>>>,
}

impl ObserverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered observers
    pub fn len(&self) -> usize {
        self.observers.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether no observer is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<Arc<dyn Observer>> {
        self.observers.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Subject for ObserverRegistry {
    fn register(&self, observer: Arc<dyn Observer>) {
        self.observers.write().unwrap_or_else(PoisonError::into_inner).push(observer);
    }

    fn notify_all(&self, event: &ParkingEvent) {
        for observer in self.snapshot() {
            observer.update(event);
        }
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry").field("observers", &self.len()).finish()
    }
}
