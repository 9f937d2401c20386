//! Configuration structures for the parking lot simulator
//!
//! This module contains the simulation configuration structure and validation logic
//! used to control the behavior and parameters of the simulation system.

use super::AdmissionPolicy;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default timing constants, expressed in simulation time units
pub mod defaults {
    /// Number of parking spots
    pub const CAPACITY: usize = 20;

    /// Mean arrivals per time unit (Poisson rate λ)
    pub const ARRIVAL_RATE: f64 = 0.5;

    /// Wall-clock length of one time unit in milliseconds
    pub const TIME_UNIT_MS: u64 = 1_000;

    /// Time a vehicle holds the gate while entering
    pub const ENTRY_TRANSIT_UNITS: f64 = 0.5;

    /// Time a vehicle holds the gate while exiting
    pub const EXIT_TRANSIT_UNITS: f64 = 0.5;

    /// Lower bound (inclusive) of the dwell time
    pub const MIN_DWELL_UNITS: f64 = 3.0;

    /// Upper bound (exclusive) of the dwell time
    pub const MAX_DWELL_UNITS: f64 = 5.0;

    /// How long shutdown waits for in-flight vehicles to drain
    pub const SHUTDOWN_TIMEOUT_MS: u64 = 5_000;
}

/// Command line arguments structure
#[derive(Debug, Clone, Parser)]
#[command(
    name = "parking-lot-simulator",
    version = "0.1.0",
    about = "Parking Lot Simulator - Poisson arrivals into a capacity-bounded lot behind a single-lane gate",
    long_about = "Simulates vehicles arriving at a parking lot at random intervals. Vehicles pass a single-lane gate one at a time, park for a random dwell time and leave. When the lot is full, arrivals wait in a FIFO queue and are admitted as spots free up. Every transition is published as an event.

EXAMPLES:
    # Run with default settings until Ctrl-C
    parking-lot-simulator

    # Run a small lot for 30 seconds
    parking-lot-simulator --capacity 3 --arrival-rate 1.5 --duration-secs 30

    # Speed up simulated time tenfold and write events as JSON lines
    parking-lot-simulator --time-unit-ms 100 --events-output events.jsonl

    # Reproduce the source's racy admission check
    parking-lot-simulator --admission-policy legacy

    # Generate configuration template
    parking-lot-simulator --print-config > my-config.json

    # Validate configuration without running
    parking-lot-simulator --config my-config.json --dry-run

CONFIGURATION:
    Configuration can be provided via:
    1. Command line arguments (highest priority)
    2. Configuration file (--config flag)
    3. Default values (lowest priority)

    Supported configuration file formats: JSON (.json)

    Use --print-config to generate a template configuration file."
)]
pub struct CliArgs {
    /// Configuration file path (JSON format)
    #[arg(
        short,
        long,
        help = "Configuration file path (JSON format)",
        long_help = "Path to a JSON configuration file. CLI arguments will override file settings."
    )]
    pub config: Option<String>,

    /// Number of parking spots
    #[arg(
        long,
        help = "Number of parking spots",
        long_help = "Total number of parking spots. Must be greater than 0. Default: 20"
    )]
    pub capacity: Option<usize>,

    /// Mean arrivals per time unit
    #[arg(
        long,
        help = "Mean arrivals per time unit (Poisson rate)",
        long_help = "Rate parameter of the Poisson arrival process. Inter-arrival delays are exponentially distributed with this rate. Must be positive. Default: 0.5"
    )]
    pub arrival_rate: Option<f64>,

    /// Wall-clock milliseconds per simulated time unit
    #[arg(long, help = "Milliseconds per simulated time unit")]
    pub time_unit_ms: Option<u64>,

    /// Gate transit time on entry, in time units
    #[arg(long, help = "Entry transit time in time units")]
    pub entry_transit_units: Option<f64>,

    /// Gate transit time on exit, in time units
    #[arg(long, help = "Exit transit time in time units")]
    pub exit_transit_units: Option<f64>,

    /// Minimum dwell time, in time units
    #[arg(long, help = "Minimum dwell time in time units")]
    pub min_dwell_units: Option<f64>,

    /// Maximum dwell time, in time units
    #[arg(long, help = "Maximum dwell time in time units")]
    pub max_dwell_units: Option<f64>,

    /// Admission policy
    #[arg(
        long,
        help = "Admission policy (atomic or legacy)",
        long_help = "atomic: capacity check and reserve-or-enqueue are one critical section and freed spots go to the head of the queue. legacy: reproduces the separate check-then-enqueue steps, which may over-admit under contention. Default: atomic"
    )]
    pub admission_policy: Option<AdmissionPolicy>,

    /// Random seed for reproducible results
    #[arg(long, help = "Random seed for reproducible results")]
    pub seed: Option<u64>,

    /// Stop automatically after this many wall-clock seconds
    #[arg(
        long,
        help = "Stop after this many seconds",
        long_help = "Stop the simulation after this many wall-clock seconds. Without it the simulation runs until Ctrl-C."
    )]
    pub duration_secs: Option<u64>,

    /// Per-observer delivery queue size
    #[arg(
        long,
        help = "Per-observer delivery queue size",
        long_help = "Deliver events to each observer through its own bounded queue and task, so a slow observer cannot stall the lot. Events are dropped for an observer whose queue is full."
    )]
    pub observer_buffer: Option<usize>,

    /// Output path for events in JSON lines format
    #[arg(long, help = "Output path for events JSONL file")]
    pub events_output: Option<String>,

    /// Shutdown drain timeout in milliseconds
    #[arg(long, help = "Shutdown drain timeout in milliseconds")]
    pub shutdown_timeout_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(short, long, help = "Enable debug logging")]
    pub debug: bool,

    /// Dry run mode - validate configuration without running simulation
    #[arg(long, help = "Validate configuration without running simulation")]
    pub dry_run: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in JSON format and exit")]
    pub print_config: bool,

    /// Print final statistics as JSON
    #[arg(long, help = "Print final statistics as JSON")]
    pub json_stats: bool,

    /// Emit log records as JSON
    #[arg(long, help = "Emit log records as JSON")]
    pub json_logs: bool,

    /// Also write logs to daily rolling files in this directory
    #[arg(long, help = "Directory for daily rolling log files")]
    pub log_dir: Option<String>,
}

/// Configuration file structure (allows partial configuration)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigFile {
    /// Number of parking spots
    pub capacity: Option<usize>,

    /// Mean arrivals per time unit
    pub arrival_rate: Option<f64>,

    /// Wall-clock milliseconds per simulated time unit
    pub time_unit_ms: Option<u64>,

    /// Gate transit time on entry, in time units
    pub entry_transit_units: Option<f64>,

    /// Gate transit time on exit, in time units
    pub exit_transit_units: Option<f64>,

    /// Minimum dwell time, in time units
    pub min_dwell_units: Option<f64>,

    /// Maximum dwell time, in time units
    pub max_dwell_units: Option<f64>,

    /// Admission policy
    pub admission_policy: Option<AdmissionPolicy>,

    /// Random seed for reproducible results
    pub seed: Option<u64>,

    /// Stop automatically after this many wall-clock seconds
    pub duration_secs: Option<u64>,

    /// Per-observer delivery queue size
    pub observer_buffer: Option<usize>,

    /// Output path for events in JSON lines format
    pub events_output: Option<String>,

    /// Shutdown drain timeout in milliseconds
    pub shutdown_timeout_ms: Option<u64>,
}

/// Configuration for the parking lot simulation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    /// Number of parking spots
    pub capacity: usize,

    /// Mean arrivals per time unit (Poisson rate λ)
    pub arrival_rate: f64,

    /// Wall-clock milliseconds per simulated time unit
    pub time_unit_ms: u64,

    /// Gate transit time on entry, in time units
    pub entry_transit_units: f64,

    /// Gate transit time on exit, in time units
    pub exit_transit_units: f64,

    /// Minimum dwell time (inclusive), in time units
    pub min_dwell_units: f64,

    /// Maximum dwell time (exclusive), in time units
    pub max_dwell_units: f64,

    /// Admission policy
    pub admission_policy: AdmissionPolicy,

    /// Random seed for reproducible results
    pub seed: Option<u64>,

    /// Stop automatically after this many wall-clock seconds
    pub duration_secs: Option<u64>,

    /// Per-observer delivery queue size; `None` delivers synchronously
    pub observer_buffer: Option<usize>,

    /// Output path for events in JSON lines format
    pub events_output: Option<String>,

    /// Shutdown drain timeout in milliseconds
    pub shutdown_timeout_ms: u64,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Configuration file read error
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    /// JSON parsing error
    #[error("Failed to parse JSON configuration: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Unsupported configuration file format
    #[error("Unsupported configuration file format: {0} (supported: .json)")]
    UnsupportedFormat(String),
}

/// Validation errors for simulation configuration
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigValidationError {
    /// Capacity is invalid
    #[error("Capacity must be greater than 0, got {0}")]
    InvalidCapacity(usize),

    /// Arrival rate is invalid
    #[error("Arrival rate must be a positive finite number, got {0}")]
    InvalidArrivalRate(f64),

    /// Time unit is invalid
    #[error("Time unit must be greater than 0 ms, got {0}")]
    InvalidTimeUnit(u64),

    /// A transit time is invalid
    #[error("Invalid {field}: {value} (must be a finite number >= 0)")]
    InvalidTransit {
        /// Name of the offending field
        field: String,
        /// The invalid value
        value: f64,
    },

    /// Dwell range is invalid
    #[error("Invalid dwell range: min ({0}) must be > 0 and <= max ({1})")]
    InvalidDwellRange(f64, f64),

    /// Observer buffer is invalid
    #[error("Observer buffer must be greater than 0 when set")]
    InvalidObserverBuffer,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            capacity: defaults::CAPACITY,
            arrival_rate: defaults::ARRIVAL_RATE,
            time_unit_ms: defaults::TIME_UNIT_MS,
            entry_transit_units: defaults::ENTRY_TRANSIT_UNITS,
            exit_transit_units: defaults::EXIT_TRANSIT_UNITS,
            min_dwell_units: defaults::MIN_DWELL_UNITS,
            max_dwell_units: defaults::MAX_DWELL_UNITS,
            admission_policy: AdmissionPolicy::default(),
            seed: None,
            duration_secs: None,
            observer_buffer: None,
            events_output: None,
            shutdown_timeout_ms: defaults::SHUTDOWN_TIMEOUT_MS,
        }
    }
}

impl SimulationConfig {
    /// Create a new configuration from command line arguments and optional config file
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::from_cli_args(args)
    }

    /// Create configuration from parsed CLI arguments
    pub fn from_cli_args(args: CliArgs) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(config_path) = &args.config {
            config = Self::from_file(config_path)?;
        }

        // CLI takes precedence over the file
        Self::apply_cli_overrides(&mut config, args);

        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let config_file: ConfigFile = serde_json::from_str(&content)?;
                Ok(Self::from_config_file(config_file))
            }
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::UnsupportedFormat("no extension".to_string())),
        }
    }

    /// Create configuration from a config file, merging with defaults
    fn from_config_file(config_file: ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            capacity: config_file.capacity.unwrap_or(defaults.capacity),
            arrival_rate: config_file.arrival_rate.unwrap_or(defaults.arrival_rate),
            time_unit_ms: config_file.time_unit_ms.unwrap_or(defaults.time_unit_ms),
            entry_transit_units: config_file
                .entry_transit_units
                .unwrap_or(defaults.entry_transit_units),
            exit_transit_units: config_file
                .exit_transit_units
                .unwrap_or(defaults.exit_transit_units),
            min_dwell_units: config_file.min_dwell_units.unwrap_or(defaults.min_dwell_units),
            max_dwell_units: config_file.max_dwell_units.unwrap_or(defaults.max_dwell_units),
            admission_policy: config_file
                .admission_policy
                .unwrap_or(defaults.admission_policy),
            seed: config_file.seed.or(defaults.seed),
            duration_secs: config_file.duration_secs.or(defaults.duration_secs),
            observer_buffer: config_file.observer_buffer.or(defaults.observer_buffer),
            events_output: config_file.events_output.or(defaults.events_output),
            shutdown_timeout_ms: config_file
                .shutdown_timeout_ms
                .unwrap_or(defaults.shutdown_timeout_ms),
        }
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(config: &mut Self, args: CliArgs) {
        if let Some(value) = args.capacity {
            config.capacity = value;
        }
        if let Some(value) = args.arrival_rate {
            config.arrival_rate = value;
        }
        if let Some(value) = args.time_unit_ms {
            config.time_unit_ms = value;
        }
        if let Some(value) = args.entry_transit_units {
            config.entry_transit_units = value;
        }
        if let Some(value) = args.exit_transit_units {
            config.exit_transit_units = value;
        }
        if let Some(value) = args.min_dwell_units {
            config.min_dwell_units = value;
        }
        if let Some(value) = args.max_dwell_units {
            config.max_dwell_units = value;
        }
        if let Some(value) = args.admission_policy {
            config.admission_policy = value;
        }
        if let Some(value) = args.seed {
            config.seed = Some(value);
        }
        if let Some(value) = args.duration_secs {
            config.duration_secs = Some(value);
        }
        if let Some(value) = args.observer_buffer {
            config.observer_buffer = Some(value);
        }
        if let Some(value) = args.events_output {
            config.events_output = Some(value);
        }
        if let Some(value) = args.shutdown_timeout_ms {
            config.shutdown_timeout_ms = value;
        }
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Print configuration as JSON
    pub fn print_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.capacity == 0 {
            return Err(ConfigValidationError::InvalidCapacity(self.capacity));
        }

        if !self.arrival_rate.is_finite() || self.arrival_rate <= 0.0 {
            return Err(ConfigValidationError::InvalidArrivalRate(self.arrival_rate));
        }

        if self.time_unit_ms == 0 {
            return Err(ConfigValidationError::InvalidTimeUnit(self.time_unit_ms));
        }

        self.validate_transit("entry_transit_units", self.entry_transit_units)?;
        self.validate_transit("exit_transit_units", self.exit_transit_units)?;

        let dwell_ok = self.min_dwell_units.is_finite()
            && self.max_dwell_units.is_finite()
            && self.min_dwell_units > 0.0
            && self.min_dwell_units <= self.max_dwell_units;
        if !dwell_ok {
            return Err(ConfigValidationError::InvalidDwellRange(
                self.min_dwell_units,
                self.max_dwell_units,
            ));
        }

        if self.observer_buffer == Some(0) {
            return Err(ConfigValidationError::InvalidObserverBuffer);
        }

        Ok(())
    }

    /// Helper method to validate transit times
    fn validate_transit(&self, field: &str, value: f64) -> Result<(), ConfigValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigValidationError::InvalidTransit { field: field.to_string(), value });
        }
        Ok(())
    }

    /// Wall-clock length of one simulated time unit
    pub fn time_unit(&self) -> Duration {
        Duration::from_millis(self.time_unit_ms)
    }

    /// Convert a number of time units into wall-clock time
    pub fn units_to_duration(&self, units: f64) -> Duration {
        scale_duration(self.time_unit(), units)
    }

    /// Optional run limit as a duration
    pub fn run_limit(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::from_secs)
    }

    /// Shutdown drain timeout as a duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// Multiply `unit` by `factor`, saturating at `Duration::MAX`
///
/// Negative and NaN factors yield zero. Unlike `Duration::mul_f64` this never
/// panics, so arbitrarily large unit counts or tiny arrival rates are safe.
pub fn scale_duration(unit: Duration, factor: f64) -> Duration {
    let secs = unit.as_secs_f64() * factor.max(0.0);
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_args() -> CliArgs {
        CliArgs::try_parse_from(["test"]).unwrap()
    }

    #[test]
    fn test_simulation_config_default() {
        let config = SimulationConfig::default();

        assert_eq!(config.capacity, 20);
        assert_eq!(config.arrival_rate, 0.5);
        assert_eq!(config.time_unit_ms, 1_000);
        assert_eq!(config.entry_transit_units, 0.5);
        assert_eq!(config.exit_transit_units, 0.5);
        assert_eq!(config.min_dwell_units, 3.0);
        assert_eq!(config.max_dwell_units, 5.0);
        assert_eq!(config.admission_policy, AdmissionPolicy::Atomic);
        assert!(config.seed.is_none());
        assert!(config.duration_secs.is_none());
        assert!(config.observer_buffer.is_none());
    }

    #[test]
    fn test_config_file_loading() {
        use std::io::Write;
        use tempfile::Builder;

        let mut temp_file = Builder::new().suffix(".json").tempfile().unwrap();
        let config_json = r#"{
            "capacity": 3,
            "arrival_rate": 2.0,
            "time_unit_ms": 10,
            "admission_policy": "legacy",
            "seed": 12345
        }"#;

        temp_file.write_all(config_json.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = SimulationConfig::from_file(temp_file.path()).unwrap();

        assert_eq!(config.capacity, 3);
        assert_eq!(config.arrival_rate, 2.0);
        assert_eq!(config.time_unit_ms, 10);
        assert_eq!(config.admission_policy, AdmissionPolicy::Legacy);
        assert_eq!(config.seed, Some(12345));
        // Fields missing from the file keep their defaults
        assert_eq!(config.min_dwell_units, 3.0);
        assert_eq!(config.shutdown_timeout_ms, 5_000);
    }

    #[test]
    fn test_config_file_unsupported_extension() {
        let temp_file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        match SimulationConfig::from_file(temp_file.path()) {
            Err(ConfigError::UnsupportedFormat(ext)) => assert_eq!(ext, "yaml"),
            other => panic!("Expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_config_file_not_found() {
        match SimulationConfig::from_file("/definitely/not/here.json") {
            Err(ConfigError::FileNotFound(_)) => {}
            other => panic!("Expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_overrides() {
        let args = CliArgs::try_parse_from([
            "test",
            "--capacity",
            "7",
            "--arrival-rate",
            "1.25",
            "--admission-policy",
            "legacy",
            "--seed",
            "54321",
            "--observer-buffer",
            "32",
        ])
        .unwrap();

        let config = SimulationConfig::from_cli_args(args).unwrap();

        assert_eq!(config.capacity, 7);
        assert_eq!(config.arrival_rate, 1.25);
        assert_eq!(config.admission_policy, AdmissionPolicy::Legacy);
        assert_eq!(config.seed, Some(54321));
        assert_eq!(config.observer_buffer, Some(32));
        // Default values should remain for non-overridden fields
        assert_eq!(config.time_unit_ms, 1_000);
    }

    #[test]
    fn test_no_overrides_yields_defaults() {
        let config = SimulationConfig::from_cli_args(empty_args()).unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn test_simulation_config_validation_success() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_capacity() {
        let config = SimulationConfig { capacity: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidCapacity(0)));
    }

    #[test]
    fn test_validation_rejects_bad_arrival_rate() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = SimulationConfig { arrival_rate: rate, ..Default::default() };
            assert!(matches!(
                config.validate(),
                Err(ConfigValidationError::InvalidArrivalRate(_))
            ));
        }
    }

    #[test]
    fn test_validation_rejects_bad_timings() {
        let config = SimulationConfig { time_unit_ms: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidTimeUnit(0)));

        let config = SimulationConfig { exit_transit_units: -0.1, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigValidationError::InvalidTransit { .. })));

        let config =
            SimulationConfig { min_dwell_units: 6.0, max_dwell_units: 5.0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidDwellRange(6.0, 5.0)));

        let config = SimulationConfig { observer_buffer: Some(0), ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidObserverBuffer));
    }

    #[test]
    fn test_unit_conversion() {
        let config = SimulationConfig { time_unit_ms: 200, ..Default::default() };
        assert_eq!(config.time_unit(), Duration::from_millis(200));
        assert_eq!(config.units_to_duration(0.5), Duration::from_millis(100));
        assert_eq!(config.units_to_duration(-3.0), Duration::ZERO);
    }

    #[test]
    fn test_huge_unit_counts_saturate() {
        let config = SimulationConfig {
            max_dwell_units: 1e300,
            entry_transit_units: 1e300,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.units_to_duration(config.max_dwell_units), Duration::MAX);
        assert_eq!(config.units_to_duration(f64::NAN), Duration::ZERO);
        assert_eq!(scale_duration(Duration::MAX, 2.0), Duration::MAX);
    }

    #[test]
    fn test_simulation_config_serialization_round_trip() {
        let config = SimulationConfig { seed: Some(9), ..Default::default() };
        let json = config.print_json().unwrap();
        assert!(json.contains("\"admission_policy\": \"atomic\""));
        let parsed: SimulationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
