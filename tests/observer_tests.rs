//! Tests for event delivery from the lot to its observers

use parking_lot_simulator::events::{
    BufferedObserver, ChannelObserver, JsonLinesObserver, Observer, ParkingEvent,
    RecordingObserver, Subject,
};
use parking_lot_simulator::lot::{EntryOutcome, LotConfig, LotTimings, ParkingLot};
use parking_lot_simulator::types::VehicleId;
use parking_lot_simulator::vehicle::Vehicle;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn lot(capacity: usize) -> ParkingLot {
    let timings = LotTimings::default().with_fixed_dwell(Duration::from_secs(4));
    ParkingLot::with_config(LotConfig::new(capacity).with_timings(timings)).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_every_observer_sees_every_event_in_order() {
    let lot = lot(1);
    let first = Arc::new(RecordingObserver::new());
    let second = Arc::new(RecordingObserver::new());
    lot.register(first.clone());
    lot.register(second.clone());

    lot.try_enter(Vehicle::new(1)).await;
    lot.try_enter(Vehicle::new(2)).await;

    let expected = vec![
        ParkingEvent::parked(VehicleId::new(1), 0),
        ParkingEvent::waiting(VehicleId::new(2), 1),
    ];
    assert_eq!(first.events(), expected);
    assert_eq!(second.events(), expected);

    lot.shutdown(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_registration_delivers_twice() {
    let lot = lot(2);
    let recorder = Arc::new(RecordingObserver::new());
    lot.register(recorder.clone());
    lot.register(recorder.clone());

    lot.try_enter(Vehicle::new(1)).await;
    assert_eq!(recorder.len(), 2);

    lot.shutdown(Duration::from_secs(1)).await.unwrap();
}

/// An observer may call back into the lot while an event is being delivered
#[tokio::test(start_paused = true)]
async fn test_observer_can_register_during_dispatch() {
    let lot = lot(3);
    let late = Arc::new(RecordingObserver::new());
    let registrations = Arc::new(AtomicUsize::new(0));

    let subject = lot.clone();
    let late_observer = late.clone();
    let count = registrations.clone();
    lot.register(Arc::new(move |_: &ParkingEvent| {
        if count.fetch_add(1, Ordering::SeqCst) == 0 {
            subject.register(late_observer.clone());
        }
        // Reading state from inside an observer must not deadlock either
        let _ = subject.snapshot();
    }));

    lot.try_enter(Vehicle::new(1)).await;
    lot.try_enter(Vehicle::new(2)).await;

    // The late observer missed the event that registered it
    assert_eq!(late.events(), vec![ParkingEvent::parked(VehicleId::new(2), 1)]);

    lot.shutdown(Duration::from_secs(1)).await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_notify_all_reaches_observers_directly() {
    let lot = lot(1);
    let (observer, mut receiver) = ChannelObserver::new();
    lot.register(Arc::new(observer));

    let event = ParkingEvent::left(VehicleId::new(9), 0);
    lot.notify_all(&event);
    assert_eq!(receiver.recv().await, Some(event));
}

#[tokio::test(start_paused = true)]
async fn test_json_lines_match_event_contract() {
    let lot = lot(1);
    let writer = Arc::new(JsonLinesObserver::new(Vec::new()));
    lot.register(writer.clone());

    assert_eq!(lot.try_enter(Vehicle::new(1)).await, EntryOutcome::Parked { spot: 0 });
    assert_eq!(lot.try_enter(Vehicle::new(2)).await, EntryOutcome::Queued { position: 1 });
    lot.shutdown(Duration::from_secs(1)).await.unwrap();

    assert_eq!(writer.written(), 2);
    drop(lot);
    let writer = Arc::try_unwrap(writer).expect("lot released its observers");
    let output = String::from_utf8(writer.into_inner()).unwrap();
    assert_eq!(
        output,
        "{\"id\":1,\"spot\":0,\"status\":\"parked\"}\n{\"id\":2,\"status\":\"waiting in queue\",\"queuePosition\":1}\n"
    );
}

/// A slow observer behind a buffer does not hold up the lot
#[tokio::test(start_paused = true)]
async fn test_buffered_observer_isolates_slow_consumer() {
    let lot = lot(4);
    let recorder = Arc::new(RecordingObserver::new());
    let buffered = Arc::new(BufferedObserver::new(recorder.clone(), 16));
    lot.register(buffered.clone());

    for n in 1..=4 {
        lot.try_enter(Vehicle::new(n)).await;
    }
    // Delivery happens on the buffer's own task
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(recorder.len(), 4);
    assert_eq!(buffered.dropped(), 0);

    lot.shutdown(Duration::from_secs(1)).await.unwrap();
}

#[test]
fn test_closures_are_observers() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let observer: Arc<dyn Observer> = Arc::new(move |_: &ParkingEvent| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    observer.update(&ParkingEvent::parked(VehicleId::new(1), 0));
    assert_eq!(seen.load(Ordering::SeqCst), 1);
}
