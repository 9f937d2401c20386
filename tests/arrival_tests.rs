//! Tests for the Poisson arrival process driving a lot

use parking_lot_simulator::events::{RecordingObserver, Subject};
use parking_lot_simulator::lot::{LotConfig, LotTimings, ParkingLot};
use parking_lot_simulator::simulation::{ArrivalGenerator, SimulationError};
use parking_lot_simulator::types::VehicleStatus;
use std::sync::Arc;
use std::time::Duration;

fn fast_lot(capacity: usize, seed: u64) -> ParkingLot {
    let timings = LotTimings {
        time_unit: Duration::from_millis(10),
        entry_transit: Duration::from_millis(5),
        exit_transit: Duration::from_millis(5),
        min_dwell: Duration::from_millis(30),
        max_dwell: Duration::from_millis(50),
    };
    ParkingLot::with_config(LotConfig::new(capacity).with_timings(timings).with_seed(seed)).unwrap()
}

/// Over 200 time units at λ = 0.5 about 100 vehicles arrive
#[tokio::test(start_paused = true)]
async fn test_arrival_count_tracks_rate() {
    let lot = fast_lot(50, 1);

    let runner = lot.clone();
    let generator = tokio::spawn(async move { runner.run(0.5).await });
    tokio::time::sleep(Duration::from_secs(2)).await;
    lot.shutdown(Duration::from_secs(1)).await.unwrap();
    generator.await.unwrap().unwrap();

    let arrivals = lot.statistics().arrivals;
    assert!((50..=200).contains(&arrivals), "{arrivals} arrivals");
}

/// Vehicle IDs are handed out sequentially starting at 1
#[tokio::test(start_paused = true)]
async fn test_generated_ids_are_sequential() {
    let lot = fast_lot(1_000, 2);
    let recorder = Arc::new(RecordingObserver::new());
    lot.register(recorder.clone());

    let runner = lot.clone();
    let generator = tokio::spawn(async move { runner.run(0.2).await });
    tokio::time::sleep(Duration::from_secs(2)).await;
    lot.shutdown(Duration::from_secs(1)).await.unwrap();
    generator.await.unwrap().unwrap();

    // With room for everyone, every arrival parks in order of arrival
    let mut ids: Vec<u64> =
        recorder.with_status(VehicleStatus::Parked).iter().map(|event| event.id.value()).collect();
    ids.sort_unstable();
    let expected: Vec<u64> = (1..=ids.len() as u64).collect();
    assert!(!ids.is_empty());
    assert_eq!(ids, expected);
}

#[tokio::test(start_paused = true)]
async fn test_same_seed_same_history() {
    async fn history(seed: u64) -> Vec<String> {
        let lot = fast_lot(2, seed);
        let recorder = Arc::new(RecordingObserver::new());
        lot.register(recorder.clone());

        let runner = lot.clone();
        let generator = tokio::spawn(async move { runner.run(0.8).await });
        tokio::time::sleep(Duration::from_secs(1)).await;
        lot.shutdown(Duration::from_secs(1)).await.unwrap();
        generator.await.unwrap().unwrap();

        recorder.events().iter().map(ToString::to_string).collect()
    }

    let first = history(11).await;
    assert!(!first.is_empty());
    assert_eq!(first, history(11).await);
}

#[tokio::test]
async fn test_invalid_rate_is_rejected() {
    let lot = fast_lot(1, 3);
    assert!(matches!(lot.run(0.0).await, Err(SimulationError::InvalidArrivalRate(_))));
    assert!(matches!(
        ArrivalGenerator::new(-1.0, Duration::from_secs(1)),
        Err(SimulationError::InvalidArrivalRate(_))
    ));
}

/// A vanishingly small rate just means nobody arrives before the stop
#[tokio::test(start_paused = true)]
async fn test_tiny_rate_runs_until_stopped() {
    let lot = fast_lot(1, 4);

    let runner = lot.clone();
    let generator = tokio::spawn(async move { runner.run(1e-300).await });
    tokio::time::sleep(Duration::from_secs(5)).await;
    lot.shutdown(Duration::from_secs(1)).await.unwrap();

    generator.await.unwrap().unwrap();
    assert_eq!(lot.statistics().arrivals, 0);
}
