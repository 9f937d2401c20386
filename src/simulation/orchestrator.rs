//! Main simulation orchestrator
//!
//! Wires a validated [`SimulationConfig`] into a [`ParkingLot`], attaches the
//! configured observers, runs the arrival process until the run limit or an
//! interrupt, drains in-flight vehicles and returns the final statistics.

use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::events::{BufferedObserver, JsonLinesObserver, LogObserver, Observer, Subject};
use crate::lot::{LotConfig, ParkingLot};
use crate::simulation::{SimulationResult, SimulationStatistics};
use crate::types::SimulationConfig;

type EventLog = JsonLinesObserver<BufWriter<File>>;

/// Main simulation orchestrator that coordinates all components
pub struct SimulationOrchestrator {
    config: SimulationConfig,
    lot: ParkingLot,
    /// Observers waiting to be attached when the run starts
    pending_observers: Vec<Arc<dyn Observer>>,
    event_log: Option<Arc<EventLog>>,
    handle_interrupts: bool,
}

impl SimulationOrchestrator {
    /// Validate `config` and build the lot
    ///
    /// Creates the events output file, if configured, right away so a bad path
    /// fails before the simulation starts.
    #[instrument(skip(config), fields(capacity = config.capacity, arrival_rate = config.arrival_rate))]
    pub fn new(config: SimulationConfig) -> SimulationResult<Self> {
        config.validate()?;
        let lot = ParkingLot::with_config(LotConfig::from(&config))?;

        let mut pending_observers: Vec<Arc<dyn Observer>> = vec![Arc::new(LogObserver::new())];

        let event_log = match &config.events_output {
            Some(path) => {
                let file = File::create(path)?;
                let log = Arc::new(JsonLinesObserver::new(BufWriter::new(file)));
                pending_observers.push(log.clone());
                info!(path = %path, "Writing events as JSON lines");
                Some(log)
            }
            None => None,
        };

        if let Some(seed) = config.seed {
            info!(seed, "Using deterministic seed");
        }

        Ok(Self { config, lot, pending_observers, event_log, handle_interrupts: true })
    }

    /// Whether Ctrl-C stops the run (enabled by default)
    pub fn with_interrupt_handling(mut self, enabled: bool) -> Self {
        self.handle_interrupts = enabled;
        self
    }

    /// Add an observer; it is attached when [`SimulationOrchestrator::run`] starts
    pub fn register_observer(&mut self, observer: Arc<dyn Observer>) {
        self.pending_observers.push(observer);
    }

    /// Configuration in effect
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// The lot being simulated
    pub fn lot(&self) -> &ParkingLot {
        &self.lot
    }

    fn attach_observers(&mut self) {
        for observer in self.pending_observers.drain(..) {
            match self.config.observer_buffer {
                Some(capacity) => self.lot.register(Arc::new(BufferedObserver::new(observer, capacity))),
                None => self.lot.register(observer),
            }
        }
    }

    /// Run until the configured limit, an interrupt or an external `stop`
    #[instrument(skip(self), fields(policy = %self.config.admission_policy))]
    pub async fn run(&mut self) -> SimulationResult<SimulationStatistics> {
        self.attach_observers();

        let lot = self.lot.clone();
        let run_limit = self.config.run_limit();
        let handle_interrupts = self.handle_interrupts;

        info!(
            capacity = self.config.capacity,
            arrival_rate = self.config.arrival_rate,
            run_limit_secs = run_limit.map(|limit| limit.as_secs()),
            "Starting parking lot simulation"
        );

        tokio::select! {
            result = lot.run(self.config.arrival_rate) => result?,
            _ = run_limit_elapsed(run_limit) => info!("Run limit reached"),
            _ = interrupted(handle_interrupts) => info!("Interrupt received"),
        }

        lot.stop();
        if let Err(e) = lot.shutdown(self.config.shutdown_timeout()).await {
            if !e.is_recoverable() {
                return Err(e);
            }
            warn!(error = %e, category = e.category(), "Continuing with vehicles still in flight");
        }
        lot.check_invariants()?;

        if let Some(log) = &self.event_log {
            log.flush()?;
            debug!(written = log.written(), "Event log flushed");
        }

        let statistics = lot.statistics();
        info!("{}", statistics.summary());
        Ok(statistics)
    }
}

impl fmt::Debug for SimulationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationOrchestrator")
            .field("config", &self.config)
            .field("lot", &self.lot)
            .field("pending_observers", &self.pending_observers.len())
            .field("event_log", &self.event_log)
            .field("handle_interrupts", &self.handle_interrupts)
            .finish()
    }
}

async fn run_limit_elapsed(limit: Option<Duration>) {
    match limit {
        Some(limit) => tokio::time::sleep(limit).await,
        None => std::future::pending().await,
    }
}

async fn interrupted(enabled: bool) {
    if !enabled {
        return std::future::pending().await;
    }
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Unable to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
