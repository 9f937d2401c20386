//! Admission engine
//!
//! [`ParkingLot`] owns all shared mutable state: the spot map and waiting queue
//! (behind one read/write lock), the single-lane gate (a one-permit semaphore),
//! the observer registry and the shutdown token. It is a cheap handle; clones
//! share the same lot.
//!
//! Lock discipline: the state lock is only ever held for a handful of
//! non-blocking bookkeeping steps and never across an `.await`. The gate is
//! held across the simulated transit delay and released before any event is
//! published. Observers run with no lock held.
//!
//! Every wait (gate acquisition, transit, dwell) races against the shutdown
//! token, so [`ParkingLot::stop`] unblocks all in-flight vehicles promptly.
//! A vehicle that loses that race is abandoned: no spot, no event, no retry.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{watch, Semaphore, SemaphorePermit};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{Admission, InvariantViolation, LotConfig, LotSnapshot, LotState, LotTimings};
use crate::events::{Observer, ObserverRegistry, ParkingEvent, Subject};
use crate::simulation::{ArrivalGenerator, SimulationError, SimulationResult, SimulationStatistics};
use crate::types::{AdmissionPolicy, VehicleId};
use crate::vehicle::Vehicle;

/// What happened to an entry attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Vehicle parked at this spot; its departure is scheduled
    Parked {
        /// Spot index
        spot: usize,
    },
    /// Lot full; vehicle queued at this 1-based position
    Queued {
        /// Queue position
        position: usize,
    },
    /// Shutdown won the race; nothing was published
    Abandoned,
    /// No free spot was found after passing the gate; nothing was published
    Lost,
}

/// What happened to a departure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartureOutcome {
    /// Vehicle left its spot
    Left {
        /// Spot that was freed
        spot: usize,
        /// Waiting vehicle released to retry entry, if any
        next: Option<VehicleId>,
    },
    /// Shutdown won the race; the vehicle still holds its spot
    Abandoned,
}

/// Result of the critical section that turns a gate passage into a spot
enum Claim {
    Spot(usize),
    NoFreeSpot,
    Cancelled,
}

/// Counts tasks spawned by the lot so shutdown can wait for them
struct InFlight {
    count: AtomicUsize,
    notifier: watch::Sender<()>,
}

impl InFlight {
    fn new() -> Arc<Self> {
        let (notifier, _) = watch::channel(());
        Arc::new(Self { count: AtomicUsize::new(0), notifier })
    }

    fn enter(self: &Arc<Self>) -> InFlightGuard {
        self.count.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(Arc::clone(self))
    }

    fn pending(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    async fn drained(&self) {
        let mut completion = self.notifier.subscribe();
        while self.pending() > 0 {
            if completion.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Decrements the in-flight counter on drop, including when the task is aborted
struct InFlightGuard(Arc<InFlight>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.notifier.send_replace(());
        }
    }
}

#[derive(Default)]
struct LotCounters {
    arrivals: AtomicU64,
    parked: AtomicU64,
    queued: AtomicU64,
    departed: AtomicU64,
    abandoned: AtomicU64,
    lost: AtomicU64,
    peak_occupied: AtomicUsize,
    peak_waiting: AtomicUsize,
}

impl LotCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn observe(&self, state: &LotState) {
        self.peak_occupied.fetch_max(state.occupied(), Ordering::Relaxed);
        self.peak_waiting.fetch_max(state.waiting_len(), Ordering::Relaxed);
    }
}

struct LotInner {
    capacity: usize,
    timings: LotTimings,
    policy: AdmissionPolicy,
    seed: Option<u64>,
    state: RwLock<LotState>,
    gate: Semaphore,
    observers: ObserverRegistry,
    shutdown: CancellationToken,
    stop_requested: AtomicBool,
    in_flight: Arc<InFlight>,
    rng: Mutex<StdRng>,
    counters: LotCounters,
    started_at: DateTime<Utc>,
    started: Instant,
}

/// Capacity-bounded parking lot behind a single-lane gate
#[derive(Clone)]
pub struct ParkingLot {
    inner: Arc<LotInner>,
}

impl ParkingLot {
    /// Lot with `capacity` spots and default timings
    pub fn new(capacity: usize) -> SimulationResult<Self> {
        Self::with_config(LotConfig::new(capacity))
    }

    /// Lot built from a full configuration
    pub fn with_config(config: LotConfig) -> SimulationResult<Self> {
        if config.capacity == 0 {
            return Err(SimulationError::InvalidCapacity(config.capacity));
        }

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            capacity = config.capacity,
            policy = %config.policy,
            "Parking lot created"
        );

        Ok(Self {
            inner: Arc::new(LotInner {
                capacity: config.capacity,
                timings: config.timings,
                policy: config.policy,
                seed: config.seed,
                state: RwLock::new(LotState::new(config.capacity)),
                gate: Semaphore::new(1),
                observers: ObserverRegistry::new(),
                shutdown: CancellationToken::new(),
                stop_requested: AtomicBool::new(false),
                in_flight: InFlight::new(),
                rng: Mutex::new(rng),
                counters: LotCounters::default(),
                started_at: Utc::now(),
                started: Instant::now(),
            }),
        })
    }

    /// Number of spots
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Admission policy in effect
    pub fn policy(&self) -> AdmissionPolicy {
        self.inner.policy
    }

    /// Simulated delays in effect
    pub fn timings(&self) -> LotTimings {
        self.inner.timings
    }

    fn read_state(&self) -> RwLockReadGuard<'_, LotState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, LotState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attempt to admit an arriving vehicle
    ///
    /// Returns once the vehicle is parked, queued, abandoned or lost. A parked
    /// vehicle's departure is scheduled in the background after a random
    /// dwell time.
    pub async fn try_enter(&self, vehicle: Vehicle) -> EntryOutcome {
        LotCounters::bump(&self.inner.counters.arrivals);
        self.admit(vehicle).await
    }

    async fn admit(&self, vehicle: Vehicle) -> EntryOutcome {
        if self.is_stopped() {
            return self.abandon(vehicle, false);
        }

        match self.inner.policy {
            AdmissionPolicy::Atomic => {
                let admission = {
                    let mut state = self.write_state();
                    let admission = state.admit_or_enqueue(vehicle.id);
                    self.inner.counters.observe(&state);
                    admission
                };
                match admission {
                    Admission::Queued(position) => self.queued(vehicle, position),
                    Admission::Reserved => self.pass_gate(vehicle, true).await,
                }
            }
            AdmissionPolicy::Legacy => {
                // Check and enqueue are separate lock acquisitions on purpose:
                // concurrent arrivals can all see a free spot.
                let full = self.read_state().is_full();
                if full {
                    let position = {
                        let mut state = self.write_state();
                        let position = state.enqueue(vehicle.id);
                        self.inner.counters.observe(&state);
                        position
                    };
                    self.queued(vehicle, position)
                } else {
                    self.pass_gate(vehicle, false).await
                }
            }
        }
    }

    fn queued(&self, vehicle: Vehicle, position: usize) -> EntryOutcome {
        LotCounters::bump(&self.inner.counters.queued);
        debug!(vehicle = %vehicle, position, "Lot full, vehicle queued");
        self.publish(ParkingEvent::waiting(vehicle.id, position));
        EntryOutcome::Queued { position }
    }

    fn abandon(&self, vehicle: Vehicle, reserved: bool) -> EntryOutcome {
        if reserved {
            self.write_state().release_reservation();
        }
        LotCounters::bump(&self.inner.counters.abandoned);
        debug!(vehicle = %vehicle, "Entry abandoned on shutdown");
        EntryOutcome::Abandoned
    }

    async fn acquire_gate(&self) -> Option<SemaphorePermit<'_>> {
        tokio::select! {
            biased;
            _ = self.inner.shutdown.cancelled() => None,
            permit = self.inner.gate.acquire() => permit.ok(),
        }
    }

    /// Sleep for `duration` unless shutdown comes first. Returns `false` on shutdown.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.inner.shutdown.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    async fn pass_gate(&self, vehicle: Vehicle, reserved: bool) -> EntryOutcome {
        let Some(permit) = self.acquire_gate().await else {
            return self.abandon(vehicle, reserved);
        };

        if !self.pause(self.inner.timings.entry_transit).await {
            drop(permit);
            return self.abandon(vehicle, reserved);
        }

        let claim = {
            let mut state = self.write_state();
            if self.is_stopped() {
                Claim::Cancelled
            } else {
                let claim = match state.claim_first_free(vehicle.id, reserved) {
                    Some(spot) => Claim::Spot(spot),
                    None => Claim::NoFreeSpot,
                };
                self.inner.counters.observe(&state);
                claim
            }
        };
        drop(permit);

        match claim {
            Claim::Spot(spot) => {
                LotCounters::bump(&self.inner.counters.parked);
                debug!(vehicle = %vehicle, spot, "Vehicle entering spot");
                self.publish(ParkingEvent::parked(vehicle.id, spot));
                self.schedule_departure(vehicle, spot);
                EntryOutcome::Parked { spot }
            }
            Claim::NoFreeSpot => {
                LotCounters::bump(&self.inner.counters.lost);
                warn!(vehicle = %vehicle, "No free spot after passing the gate, vehicle lost");
                EntryOutcome::Lost
            }
            Claim::Cancelled => self.abandon(vehicle, reserved),
        }
    }

    fn sample_dwell(&self) -> Duration {
        let LotTimings { min_dwell, max_dwell, .. } = self.inner.timings;
        if max_dwell <= min_dwell {
            return min_dwell;
        }
        self.inner.rng.lock().unwrap_or_else(PoisonError::into_inner).gen_range(min_dwell..max_dwell)
    }

    fn schedule_departure(&self, vehicle: Vehicle, spot: usize) {
        let dwell = self.sample_dwell();
        let lot = self.clone();
        self.spawn_tracked(async move {
            if !lot.pause(dwell).await {
                debug!(vehicle = %vehicle, spot, "Departure cancelled on shutdown");
                return;
            }
            if let Err(e) = lot.leave(vehicle, spot).await {
                warn!(vehicle = %vehicle, spot, error = %e, "Scheduled departure failed");
            }
        });
    }

    /// Take `vehicle` out of `spot` through the gate
    ///
    /// The head of the waiting queue, if any, is released and retries entry
    /// on its own task.
    pub async fn leave(&self, vehicle: Vehicle, spot: usize) -> SimulationResult<DepartureOutcome> {
        let Some(permit) = self.acquire_gate().await else {
            debug!(vehicle = %vehicle, spot, "Departure abandoned on shutdown");
            return Ok(DepartureOutcome::Abandoned);
        };

        if !self.pause(self.inner.timings.exit_transit).await {
            debug!(vehicle = %vehicle, spot, "Departure abandoned on shutdown");
            return Ok(DepartureOutcome::Abandoned);
        }

        let next = {
            let mut state = self.write_state();
            state
                .vacate(spot, vehicle.id)
                .map_err(|source| SimulationError::InvalidDeparture { vehicle: vehicle.id, source })?;
            match self.inner.policy {
                AdmissionPolicy::Atomic => state.hand_over_to_next(),
                AdmissionPolicy::Legacy => state.pop_waiting(),
            }
        };
        drop(permit);

        LotCounters::bump(&self.inner.counters.departed);
        debug!(vehicle = %vehicle, spot, "Vehicle leaving spot");
        self.publish(ParkingEvent::left(vehicle.id, spot));

        if let Some(next_id) = next {
            debug!(vehicle = %next_id, "Releasing next vehicle from the queue");
            let lot = self.clone();
            let reserved = self.inner.policy == AdmissionPolicy::Atomic;
            self.spawn_tracked(async move {
                let next_vehicle = Vehicle::from(next_id);
                if reserved {
                    lot.pass_gate(next_vehicle, true).await;
                } else {
                    lot.admit(next_vehicle).await;
                }
            });
        }

        Ok(DepartureOutcome::Left { spot, next })
    }

    /// Start an entry attempt on its own task without waiting for it
    pub fn dispatch(&self, vehicle: Vehicle) {
        let lot = self.clone();
        self.spawn_tracked(async move {
            lot.try_enter(vehicle).await;
        });
    }

    fn spawn_tracked<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = self.inner.in_flight.enter();
        tokio::spawn(async move {
            let _guard = guard;
            task.await;
        });
    }

    fn publish(&self, event: ParkingEvent) {
        self.inner.observers.notify_all(&event);
    }

    /// Run the Poisson arrival generator until [`ParkingLot::stop`] is called
    pub async fn run(&self, arrival_rate: f64) -> SimulationResult<()> {
        let mut generator = ArrivalGenerator::new(arrival_rate, self.inner.timings.time_unit)?;
        if let Some(seed) = self.inner.seed {
            generator = generator.with_seed(seed.wrapping_add(1));
        }
        info!(arrival_rate, capacity = self.inner.capacity, "Simulation running");
        generator.run(self).await;
        info!(
            generated = generator.generated(),
            "Arrival generator stopped"
        );
        Ok(())
    }

    /// Trigger shutdown. Safe to call any number of times; returns `true` only
    /// for the call that actually triggered it.
    ///
    /// This only signals. On a multi-threaded runtime an entry that claimed its
    /// spot just before the signal may still publish its `parked` event after
    /// `stop` returns. Use [`ParkingLot::shutdown`] to also wait for in-flight
    /// tasks; once it returns `Ok`, no further events are published.
    pub fn stop(&self) -> bool {
        let first = !self.inner.stop_requested.swap(true, Ordering::SeqCst);
        if first {
            info!("Stopping parking lot simulation");
        }
        self.inner.shutdown.cancel();
        first
    }

    /// Whether shutdown has been triggered
    pub fn is_stopped(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    /// Resolves once shutdown has been triggered
    pub async fn stopped(&self) {
        self.inner.shutdown.cancelled().await
    }

    /// Number of spawned entry, departure and re-entry tasks still running
    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.pending()
    }

    /// Stop and wait up to `timeout` for every in-flight task to finish
    pub async fn shutdown(&self, timeout: Duration) -> SimulationResult<()> {
        self.stop();
        match tokio::time::timeout(timeout, self.inner.in_flight.drained()).await {
            Ok(()) => {
                info!("All in-flight vehicles drained");
                Ok(())
            }
            Err(_) => {
                let pending = self.in_flight();
                warn!(pending, "Shutdown deadline passed with tasks still in flight");
                Err(SimulationError::ShutdownTimeout { pending })
            }
        }
    }

    /// Copy of the current occupancy state
    pub fn snapshot(&self) -> LotSnapshot {
        self.read_state().snapshot()
    }

    /// Verify the occupancy invariants against the current state
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.read_state().check_invariants()
    }

    /// Counters and occupancy figures collected so far
    pub fn statistics(&self) -> SimulationStatistics {
        let counters = &self.inner.counters;
        let (occupied, waiting) = {
            let state = self.read_state();
            (state.occupied(), state.waiting_len())
        };

        SimulationStatistics {
            capacity: self.inner.capacity,
            policy: self.inner.policy,
            arrivals: counters.arrivals.load(Ordering::Relaxed),
            parked: counters.parked.load(Ordering::Relaxed),
            queued: counters.queued.load(Ordering::Relaxed),
            departed: counters.departed.load(Ordering::Relaxed),
            abandoned: counters.abandoned.load(Ordering::Relaxed),
            lost: counters.lost.load(Ordering::Relaxed),
            peak_occupancy: counters.peak_occupied.load(Ordering::Relaxed),
            peak_queue_length: counters.peak_waiting.load(Ordering::Relaxed),
            final_occupancy: occupied,
            final_queue_length: waiting,
            started_at: self.inner.started_at,
            simulation_duration: self.inner.started.elapsed(),
        }
    }
}

impl Subject for ParkingLot {
    fn register(&self, observer: Arc<dyn Observer>) {
        self.inner.observers.register(observer);
    }

    fn notify_all(&self, event: &ParkingEvent) {
        self.inner.observers.notify_all(event);
    }
}

impl fmt::Debug for ParkingLot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParkingLot")
            .field("capacity", &self.inner.capacity)
            .field("policy", &self.inner.policy)
            .field("observers", &self.inner.observers.len())
            .field("stopped", &self.is_stopped())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(ParkingLot::new(0), Err(SimulationError::InvalidCapacity(0))));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let lot = ParkingLot::new(1).unwrap();
        assert!(!lot.is_stopped());
        assert!(lot.stop());
        assert!(!lot.stop());
        assert!(!lot.stop());
        assert!(lot.is_stopped());
    }

    #[test]
    fn test_fixed_dwell_sampling() {
        let timings = LotTimings::default().with_fixed_dwell(Duration::from_secs(4));
        let lot = ParkingLot::with_config(LotConfig::new(1).with_timings(timings)).unwrap();
        assert_eq!(lot.sample_dwell(), Duration::from_secs(4));
    }

    #[test]
    fn test_dwell_within_range() {
        let lot = ParkingLot::with_config(LotConfig::new(1).with_seed(5)).unwrap();
        for _ in 0..100 {
            let dwell = lot.sample_dwell();
            assert!(dwell >= Duration::from_secs(3) && dwell < Duration::from_secs(5));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_drains_after_stop() {
        let lot = ParkingLot::new(1).unwrap();
        lot.dispatch(Vehicle::new(1));
        assert_eq!(lot.in_flight(), 1);

        lot.shutdown(Duration::from_secs(1)).await.unwrap();
        assert_eq!(lot.in_flight(), 0);
    }
}
