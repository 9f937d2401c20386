//! Occupancy bookkeeping
//!
//! [`LotState`] is the data behind the lot's state lock: the spot map, the
//! occupied count, outstanding reservations and the FIFO waiting queue. It has
//! no locking or timing of its own; every method is one step of a critical
//! section taken by the engine.
//!
//! Invariants maintained by every method:
//!
//! - `occupied == spots.filter(Some).count()`
//! - `occupied + reserved <= capacity`
//! - no vehicle in the waiting queue occupies a spot, and no vehicle is queued twice

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

use crate::types::VehicleId;

/// Outcome of an atomic admission decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Capacity was reserved for the vehicle; it may proceed to the gate
    Reserved,
    /// Lot full; the vehicle was queued at this 1-based position
    Queued(usize),
}

/// A broken occupancy invariant
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// `occupied` disagrees with the spot map
    #[error("occupied count {recorded} does not match {actual} occupied spots")]
    OccupiedCountMismatch {
        /// Value of the counter
        recorded: usize,
        /// Number of occupied entries in the spot map
        actual: usize,
    },

    /// More spots in use or promised than exist
    #[error("{occupied} occupied + {reserved} reserved exceeds capacity {capacity}")]
    OverCapacity {
        /// Occupied spots
        occupied: usize,
        /// Outstanding reservations
        reserved: usize,
        /// Lot capacity
        capacity: usize,
    },

    /// A vehicle is both parked and waiting
    #[error("{0} is queued while holding a spot")]
    QueuedWhileParked(VehicleId),

    /// A vehicle appears twice in the waiting queue
    #[error("{0} is queued more than once")]
    DuplicateInQueue(VehicleId),

    /// A vehicle occupies more than one spot
    #[error("{0} occupies more than one spot")]
    DuplicateOccupant(VehicleId),
}

/// Point-in-time copy of the lot state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotSnapshot {
    /// Number of spots
    pub capacity: usize,
    /// Occupant of each spot, by index
    pub occupants: Vec<Option<VehicleId>>,
    /// Number of occupied spots
    pub occupied_count: usize,
    /// Vehicles admitted but not yet through the gate
    pub reserved: usize,
    /// Waiting queue, head first
    pub waiting: Vec<VehicleId>,
}

impl LotSnapshot {
    /// Occupancy flags, `true` meaning occupied
    pub fn spots(&self) -> Vec<bool> {
        self.occupants.iter().map(Option::is_some).collect()
    }

    /// Whether no spot is occupied and nobody is waiting
    pub fn is_empty(&self) -> bool {
        self.occupied_count == 0 && self.waiting.is_empty()
    }
}

/// Spot map, reservations and waiting queue
#[derive(Debug, Clone)]
pub struct LotState {
    capacity: usize,
    spots: Vec<Option<VehicleId>>,
    occupied: usize,
    reserved: usize,
    waiting: VecDeque<VehicleId>,
}

impl LotState {
    /// Empty lot with `capacity` spots
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            spots: vec![None; capacity],
            occupied: 0,
            reserved: 0,
            waiting: VecDeque::new(),
        }
    }

    /// Number of spots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Occupied spots
    pub fn occupied(&self) -> usize {
        self.occupied
    }

    /// Outstanding reservations
    pub fn reserved(&self) -> usize {
        self.reserved
    }

    /// Vehicles waiting
    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    /// Whether every spot is occupied
    pub fn is_full(&self) -> bool {
        self.occupied >= self.capacity
    }

    /// Whether every spot is occupied or promised
    pub fn is_committed(&self) -> bool {
        self.occupied + self.reserved >= self.capacity
    }

    /// Whether `vehicle` holds a spot
    pub fn is_parked(&self, vehicle: VehicleId) -> bool {
        self.spot_of(vehicle).is_some()
    }

    /// Spot held by `vehicle`, if any
    pub fn spot_of(&self, vehicle: VehicleId) -> Option<usize> {
        self.spots.iter().position(|occupant| *occupant == Some(vehicle))
    }

    /// Whether `vehicle` is in the waiting queue
    pub fn is_waiting(&self, vehicle: VehicleId) -> bool {
        self.waiting.contains(&vehicle)
    }

    /// Reserve capacity for `vehicle` or, when everything is occupied or
    /// promised, append it to the waiting queue
    pub fn admit_or_enqueue(&mut self, vehicle: VehicleId) -> Admission {
        if self.is_committed() {
            Admission::Queued(self.enqueue(vehicle))
        } else {
            self.reserved += 1;
            Admission::Reserved
        }
    }

    /// Append `vehicle` to the waiting queue, returning its 1-based position
    pub fn enqueue(&mut self, vehicle: VehicleId) -> usize {
        self.waiting.push_back(vehicle);
        self.waiting.len()
    }

    /// Remove and return the head of the waiting queue
    pub fn pop_waiting(&mut self) -> Option<VehicleId> {
        self.waiting.pop_front()
    }

    /// Pop the head of the waiting queue and hand it a reservation
    pub fn hand_over_to_next(&mut self) -> Option<VehicleId> {
        if self.is_committed() {
            return None;
        }
        let next = self.waiting.pop_front()?;
        self.reserved += 1;
        Some(next)
    }

    /// Give back a reservation that will not be used
    pub fn release_reservation(&mut self) {
        self.reserved = self.reserved.saturating_sub(1);
    }

    /// Occupy the lowest free spot for `vehicle`, consuming a reservation when
    /// `reserved` is set. Returns `None` when no spot is free; the reservation
    /// is still consumed in that case.
    pub fn claim_first_free(&mut self, vehicle: VehicleId, reserved: bool) -> Option<usize> {
        if reserved {
            self.release_reservation();
        }
        let spot = self.spots.iter().position(Option::is_none)?;
        self.spots[spot] = Some(vehicle);
        self.occupied += 1;
        Some(spot)
    }

    /// Free `spot`, which must be held by `vehicle`
    pub fn vacate(&mut self, spot: usize, vehicle: VehicleId) -> Result<(), VacateError> {
        match self.spots.get(spot).copied() {
            None => Err(VacateError::OutOfRange { spot, capacity: self.capacity }),
            Some(Some(occupant)) if occupant == vehicle => {
                self.spots[spot] = None;
                self.occupied -= 1;
                Ok(())
            }
            Some(occupant) => Err(VacateError::NotHeld { spot, vehicle, occupant }),
        }
    }

    /// Verify every occupancy invariant
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let actual = self.spots.iter().filter(|occupant| occupant.is_some()).count();
        if actual != self.occupied {
            return Err(InvariantViolation::OccupiedCountMismatch {
                recorded: self.occupied,
                actual,
            });
        }

        if self.occupied + self.reserved > self.capacity || self.spots.len() != self.capacity {
            return Err(InvariantViolation::OverCapacity {
                occupied: self.occupied,
                reserved: self.reserved,
                capacity: self.capacity,
            });
        }

        let mut parked: Vec<VehicleId> = self.spots.iter().flatten().copied().collect();
        parked.sort_unstable();
        if let Some(pair) = parked.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(InvariantViolation::DuplicateOccupant(pair[0]));
        }

        let mut queued: Vec<VehicleId> = self.waiting.iter().copied().collect();
        queued.sort_unstable();
        if let Some(pair) = queued.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(InvariantViolation::DuplicateInQueue(pair[0]));
        }
        if let Some(vehicle) = queued.iter().find(|vehicle| parked.binary_search(*vehicle).is_ok()) {
            return Err(InvariantViolation::QueuedWhileParked(*vehicle));
        }

        Ok(())
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> LotSnapshot {
        LotSnapshot {
            capacity: self.capacity,
            occupants: self.spots.clone(),
            occupied_count: self.occupied,
            reserved: self.reserved,
            waiting: self.waiting.iter().copied().collect(),
        }
    }
}

/// Why a spot could not be vacated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VacateError {
    /// Spot index beyond capacity
    #[error("spot {spot} does not exist (capacity {capacity})")]
    OutOfRange {
        /// Requested spot
        spot: usize,
        /// Lot capacity
        capacity: usize,
    },

    /// Spot empty or held by someone else
    #[error("spot {spot} is not held by {vehicle} (occupant: {occupant:?})")]
    NotHeld {
        /// Requested spot
        spot: usize,
        /// Vehicle asking to leave
        vehicle: VehicleId,
        /// Actual occupant
        occupant: Option<VehicleId>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u64) -> VehicleId {
        VehicleId::new(raw)
    }

    #[test]
    fn test_new_state_is_empty() {
        let state = LotState::new(3);
        assert_eq!(state.capacity(), 3);
        assert_eq!(state.occupied(), 0);
        assert_eq!(state.snapshot().spots(), vec![false, false, false]);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_admit_until_committed_then_queue() {
        let mut state = LotState::new(2);
        assert_eq!(state.admit_or_enqueue(id(1)), Admission::Reserved);
        assert_eq!(state.admit_or_enqueue(id(2)), Admission::Reserved);
        assert_eq!(state.admit_or_enqueue(id(3)), Admission::Queued(1));
        assert_eq!(state.admit_or_enqueue(id(4)), Admission::Queued(2));
        assert_eq!(state.reserved(), 2);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_claims_scan_left_to_right() {
        let mut state = LotState::new(3);
        assert_eq!(state.claim_first_free(id(1), false), Some(0));
        assert_eq!(state.claim_first_free(id(2), false), Some(1));
        state.vacate(0, id(1)).unwrap();
        assert_eq!(state.claim_first_free(id(3), false), Some(0));
        assert_eq!(state.occupied(), 2);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_claim_fails_when_full() {
        let mut state = LotState::new(1);
        assert_eq!(state.claim_first_free(id(1), false), Some(0));
        assert_eq!(state.claim_first_free(id(2), false), None);
        assert_eq!(state.occupied(), 1);
    }

    #[test]
    fn test_claim_consumes_reservation() {
        let mut state = LotState::new(1);
        assert_eq!(state.admit_or_enqueue(id(1)), Admission::Reserved);
        assert_eq!(state.claim_first_free(id(1), true), Some(0));
        assert_eq!(state.reserved(), 0);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_hand_over_keeps_fifo_order() {
        let mut state = LotState::new(1);
        state.admit_or_enqueue(id(1));
        state.claim_first_free(id(1), true);
        state.admit_or_enqueue(id(2));
        state.admit_or_enqueue(id(3));

        state.vacate(0, id(1)).unwrap();
        assert_eq!(state.hand_over_to_next(), Some(id(2)));
        assert_eq!(state.reserved(), 1);
        // Capacity is promised to VEH_2, so a fresh arrival must queue behind VEH_3
        assert_eq!(state.admit_or_enqueue(id(4)), Admission::Queued(2));
        assert_eq!(state.snapshot().waiting, vec![id(3), id(4)]);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_hand_over_with_empty_queue() {
        let mut state = LotState::new(1);
        assert_eq!(state.hand_over_to_next(), None);
        assert_eq!(state.reserved(), 0);
    }

    #[test]
    fn test_vacate_rejects_wrong_vehicle() {
        let mut state = LotState::new(2);
        state.claim_first_free(id(1), false);

        assert_eq!(
            state.vacate(0, id(2)),
            Err(VacateError::NotHeld { spot: 0, vehicle: id(2), occupant: Some(id(1)) })
        );
        assert_eq!(
            state.vacate(1, id(1)),
            Err(VacateError::NotHeld { spot: 1, vehicle: id(1), occupant: None })
        );
        assert_eq!(state.vacate(5, id(1)), Err(VacateError::OutOfRange { spot: 5, capacity: 2 }));
        assert_eq!(state.occupied(), 1);
    }

    #[test]
    fn test_release_reservation_saturates() {
        let mut state = LotState::new(1);
        state.release_reservation();
        assert_eq!(state.reserved(), 0);
    }

    #[test]
    fn test_invariant_detects_queued_while_parked() {
        let mut state = LotState::new(2);
        state.claim_first_free(id(1), false);
        state.enqueue(id(1));
        assert_eq!(state.check_invariants(), Err(InvariantViolation::QueuedWhileParked(id(1))));
    }

    #[test]
    fn test_invariant_detects_duplicate_queue_entry() {
        let mut state = LotState::new(1);
        state.enqueue(id(7));
        state.enqueue(id(7));
        assert_eq!(state.check_invariants(), Err(InvariantViolation::DuplicateInQueue(id(7))));
    }

    #[test]
    fn test_round_trip_returns_to_empty() {
        let mut state = LotState::new(2);
        for raw in 1..=10 {
            assert_eq!(state.admit_or_enqueue(id(raw)), Admission::Reserved);
            let spot = state.claim_first_free(id(raw), true).unwrap();
            state.vacate(spot, id(raw)).unwrap();
        }
        let snapshot = state.snapshot();
        assert_eq!(snapshot.occupied_count, 0);
        assert!(snapshot.spots().iter().all(|occupied| !occupied));
        assert!(snapshot.is_empty());
    }
}
