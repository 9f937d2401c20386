//! Ready-made observers
//!
//! - [`LogObserver`] writes every transition to the tracing subscriber
//! - [`ChannelObserver`] forwards events into a tokio channel
//! - [`RecordingObserver`] keeps every event in memory
//! - [`JsonLinesObserver`] writes one JSON object per line to any writer
//! - [`BufferedObserver`] gives a wrapped observer its own bounded queue and
//!   delivery task, so a slow consumer cannot stall the lot

use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{Observer, ParkingEvent};
use crate::types::VehicleStatus;

/// Logs every transition
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl LogObserver {
    /// Create a log observer
    pub fn new() -> Self {
        Self
    }
}

impl Observer for LogObserver {
    fn update(&self, event: &ParkingEvent) {
        match event.status {
            VehicleStatus::WaitingInQueue => info!(
                vehicle = %event.id,
                queue_position = event.queue_position,
                "Vehicle waiting (parking full)"
            ),
            VehicleStatus::Parked => {
                info!(vehicle = %event.id, spot = event.spot, "Vehicle parked")
            }
            VehicleStatus::Left => info!(vehicle = %event.id, spot = event.spot, "Vehicle left"),
        }
    }
}

/// Forwards events into an unbounded tokio channel
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    sender: mpsc::UnboundedSender<ParkingEvent>,
}

impl ChannelObserver {
    /// Create the observer together with the receiving end
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ParkingEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Observer for ChannelObserver {
    fn update(&self, event: &ParkingEvent) {
        // A dropped receiver just means nobody is listening any more
        let _ = self.sender.send(*event);
    }
}

/// Keeps every delivered event in arrival order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ParkingEvent>>,
}

impl RecordingObserver {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events recorded so far
    pub fn events(&self) -> Vec<ParkingEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Recorded events with the given status
    pub fn with_status(&self, status: VehicleStatus) -> Vec<ParkingEvent> {
        self.events().into_iter().filter(|event| event.status == status).collect()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Observer for RecordingObserver {
    fn update(&self, event: &ParkingEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(*event);
    }
}

/// Writes each event as one JSON line
pub struct JsonLinesObserver<W: Write + Send> {
    writer: Mutex<W>,
    written: AtomicU64,
}

impl<W: Write + Send> JsonLinesObserver<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        Self { writer: Mutex::new(writer), written: AtomicU64::new(0) }
    }

    /// Number of lines successfully written
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// Flush the underlying writer
    pub fn flush(&self) -> std::io::Result<()> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner).flush()
    }

    /// Unwrap the writer
    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Observer for JsonLinesObserver<W> {
    fn update(&self, event: &ParkingEvent) {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let result = serde_json::to_writer(&mut *writer, event)
            .map_err(std::io::Error::from)
            .and_then(|()| writer.write_all(b"\n"));

        match result {
            Ok(()) => {
                self.written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => warn!(vehicle = %event.id, error = %e, "Failed to write event"),
        }
    }
}

impl<W: Write + Send> fmt::Debug for JsonLinesObserver<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonLinesObserver").field("written", &self.written()).finish()
    }
}

/// Delivers to a wrapped observer through a bounded queue drained by its own task
///
/// When the queue is full the event is dropped for this observer only and
/// counted in [`BufferedObserver::dropped`]. Must be created inside a tokio
/// runtime. The delivery task ends once the observer is dropped and the queue
/// has drained.
pub struct BufferedObserver {
    sender: mpsc::Sender<ParkingEvent>,
    dropped: AtomicU64,
}

impl BufferedObserver {
    /// Wrap `inner` with a queue holding up to `capacity` pending events
    pub fn new(inner: Arc<dyn Observer>, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<ParkingEvent>(capacity.max(1));

        tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                inner.update(&event);
            }
            debug!("Buffered observer delivery task finished");
        });

        Self { sender, dropped: AtomicU64::new(0) }
    }

    /// Events discarded because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Observer for BufferedObserver {
    fn update(&self, event: &ParkingEvent) {
        match self.sender.try_send(*event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(vehicle = %event.id, status = %event.status, "Observer queue full, event dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Observer delivery task gone, event discarded");
            }
        }
    }
}

impl fmt::Debug for BufferedObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedObserver")
            .field("capacity", &self.sender.max_capacity())
            .field("dropped", &self.dropped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VehicleId;
    use std::time::Duration;

    #[test]
    fn test_json_lines_observer_writes_one_line_per_event() {
        let observer = JsonLinesObserver::new(Vec::new());
        observer.update(&ParkingEvent::parked(VehicleId::new(1), 0));
        observer.update(&ParkingEvent::left(VehicleId::new(1), 0));

        assert_eq!(observer.written(), 2);
        let output = String::from_utf8(observer.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines, vec![
            r#"{"id":1,"spot":0,"status":"parked"}"#,
            r#"{"id":1,"spot":0,"status":"left"}"#,
        ]);
    }

    #[test]
    fn test_recording_observer_filters_by_status() {
        let observer = RecordingObserver::new();
        observer.update(&ParkingEvent::parked(VehicleId::new(1), 0));
        observer.update(&ParkingEvent::waiting(VehicleId::new(2), 1));

        assert_eq!(observer.len(), 2);
        assert_eq!(observer.with_status(VehicleStatus::WaitingInQueue).len(), 1);
    }

    #[tokio::test]
    async fn test_channel_observer_forwards() {
        let (observer, mut receiver) = ChannelObserver::new();
        observer.update(&ParkingEvent::parked(VehicleId::new(5), 2));
        assert_eq!(receiver.recv().await, Some(ParkingEvent::parked(VehicleId::new(5), 2)));

        drop(receiver);
        // No panic once the receiver is gone
        observer.update(&ParkingEvent::left(VehicleId::new(5), 2));
    }

    #[tokio::test]
    async fn test_buffered_observer_delivers_in_order() {
        let (channel, mut receiver) = ChannelObserver::new();
        let buffered = BufferedObserver::new(Arc::new(channel), 8);

        for id in 1..=3 {
            buffered.update(&ParkingEvent::parked(VehicleId::new(id), 0));
        }

        for id in 1..=3 {
            let event = tokio::time::timeout(Duration::from_secs(1), receiver.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(event.id, VehicleId::new(id));
        }
        assert_eq!(buffered.dropped(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_buffered_observer_drops_when_full() {
        let (channel, _receiver) = ChannelObserver::new();
        let buffered = BufferedObserver::new(Arc::new(channel), 2);

        // The delivery task cannot run before we yield, so the queue fills up
        for id in 1..=5 {
            buffered.update(&ParkingEvent::parked(VehicleId::new(id), 0));
        }

        assert_eq!(buffered.dropped(), 3);
    }
}
