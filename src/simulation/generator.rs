//! Poisson arrival generator
//!
//! Inter-arrival delays are drawn from an exponential distribution with rate
//! λ arrivals per time unit, which makes the number of arrivals in any window
//! Poisson distributed. Each arrival gets the next sequential vehicle ID and is
//! dispatched as an independent entry attempt; the generator never waits on the
//! outcome.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument};

use crate::lot::ParkingLot;
use crate::simulation::{SimulationError, SimulationResult};
use crate::types::{scale_duration, VehicleId};
use crate::vehicle::Vehicle;

/// Background source of stochastic arrivals
#[derive(Debug)]
pub struct ArrivalGenerator {
    /// Mean arrivals per time unit
    rate: f64,
    /// Wall-clock length of one time unit
    time_unit: Duration,
    /// ID for the next vehicle
    next_id: VehicleId,
    /// Number of vehicles generated so far
    generated: u64,
    rng: StdRng,
}

impl ArrivalGenerator {
    /// Generator with rate `rate` per `time_unit`, seeded from entropy
    pub fn new(rate: f64, time_unit: Duration) -> SimulationResult<Self> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(SimulationError::InvalidArrivalRate(rate));
        }

        Ok(Self {
            rate,
            time_unit,
            next_id: VehicleId::new(1),
            generated: 0,
            rng: StdRng::from_entropy(),
        })
    }

    /// Use a deterministic random sequence
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Mean arrivals per time unit
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Number of vehicles generated so far
    pub fn generated(&self) -> u64 {
        self.generated
    }

    /// Draw the next inter-arrival delay, in time units
    pub fn next_interval_units(&mut self) -> f64 {
        // Inverse CDF of Exp(λ); 1 - u lies in (0, 1] so the log is finite
        let u: f64 = self.rng.gen();
        -(1.0 - u).ln() / self.rate
    }

    /// Draw the next inter-arrival delay as wall-clock time
    pub fn next_interval(&mut self) -> Duration {
        scale_duration(self.time_unit, self.next_interval_units())
    }

    /// Create the next vehicle in the sequence
    pub fn next_vehicle(&mut self) -> Vehicle {
        let vehicle = Vehicle::from(self.next_id);
        self.next_id = self.next_id.next();
        self.generated += 1;
        vehicle
    }

    /// Feed arrivals into `lot` until it is stopped
    #[instrument(skip(self, lot), fields(rate = self.rate))]
    pub async fn run(&mut self, lot: &ParkingLot) {
        loop {
            if lot.is_stopped() {
                break;
            }

            let delay = self.next_interval();
            tokio::select! {
                biased;
                _ = lot.stopped() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            let vehicle = self.next_vehicle();
            debug!(vehicle = %vehicle, delay_ms = delay.as_millis() as u64, "Vehicle arrived");
            lot.dispatch(vehicle);
        }
    }
}
