// Parking Lot Simulator - Main Entry Point
//
// You can run it via Cargo:
//
// ```console
// $ cargo build --release
// $ ./target/release/parking-lot-simulator
// ```
//
// Or with custom configuration:
//
// ```console
// $ ./target/release/parking-lot-simulator --capacity 5 --arrival-rate 2 --duration-secs 60 --verbose
// ```

use anyhow::Context;
use clap::Parser;
use parking_lot_simulator::simulation::{LoggingConfig, SimulationOrchestrator, SimulationStatistics};
use parking_lot_simulator::types::config::CliArgs;
use parking_lot_simulator::types::SimulationConfig;
use std::process;
use tracing::{error, info};

fn main() {
    // Parse CLI arguments first to check for special flags
    let args = CliArgs::parse();

    // Handle special CLI flags that don't require full initialization
    if args.print_config {
        match SimulationConfig::default().print_json() {
            Ok(json) => {
                println!("{}", json);
                return;
            }
            Err(e) => {
                eprintln!("Failed to serialize default configuration: {}", e);
                process::exit(1);
            }
        }
    }

    // Held for the rest of main so file logs keep flushing
    let _logging = match logging_config(&args).init() {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            process::exit(1);
        }
    };

    info!("Starting Parking Lot Simulator");

    // Load configuration from CLI arguments and optional config file
    let config = match SimulationConfig::from_cli_args(args.clone()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            eprintln!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("Configuration validation failed: {}", e);
        process::exit(1);
    }

    info!("Configuration loaded and validated successfully");

    // Handle dry run mode
    if args.dry_run {
        eprintln!("Configuration validation successful!");
        eprintln!("Dry run mode - simulation will not be executed.");
        print_configuration_summary(&config);
        return;
    }

    print_startup_banner(&config);

    let statistics = match run_simulation(config) {
        Ok(statistics) => statistics,
        Err(e) => {
            error!("Simulation failed: {:#}", e);
            eprintln!("Simulation failed: {:#}", e);
            process::exit(1);
        }
    };

    if args.json_stats {
        match statistics.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize statistics: {}", e);
                process::exit(1);
            }
        }
    } else {
        print_final_statistics(&statistics);
    }

    info!("Parking Lot Simulator completed successfully");
}

/// Console logging is WARN unless `--verbose` or `--debug` is given
fn logging_config(args: &CliArgs) -> LoggingConfig {
    let mut logging = if args.debug {
        LoggingConfig::debug()
    } else if args.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::quiet()
    };

    if args.json_logs {
        logging = logging.with_json_format().without_ansi();
    }
    if let Some(directory) = &args.log_dir {
        logging = logging.with_file_logging(directory);
    }
    logging
}

/// Build the runtime and run the simulation to completion
fn run_simulation(config: SimulationConfig) -> anyhow::Result<SimulationStatistics> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    let events_output = config.events_output.clone();
    let mut orchestrator = SimulationOrchestrator::new(config)
        .with_context(|| match &events_output {
            Some(path) => format!("Failed to initialize simulation (events output: {})", path),
            None => "Failed to initialize simulation".to_string(),
        })?;

    eprintln!("Simulation running. Press Ctrl-C to stop.");
    let statistics = runtime
        .block_on(orchestrator.run())
        .context("Simulation did not complete cleanly")?;

    if let Some(path) = events_output {
        eprintln!("Events written to: {}", path);
    }
    Ok(statistics)
}

/// Print startup banner and configuration summary
fn print_startup_banner(config: &SimulationConfig) {
    eprintln!("Parking Lot Simulator");
    eprintln!("=====================");
    eprintln!("Poisson arrivals into a capacity-bounded lot behind a single-lane gate");
    eprintln!();

    print_configuration_summary(config);
}

/// Print configuration summary
fn print_configuration_summary(config: &SimulationConfig) {
    eprintln!("Configuration:");
    eprintln!("  Capacity: {} spots", config.capacity);
    eprintln!("  Arrival Rate: {} per time unit", config.arrival_rate);
    eprintln!("  Time Unit: {} ms", config.time_unit_ms);
    eprintln!(
        "  Gate Transit: {} in / {} out (time units)",
        config.entry_transit_units, config.exit_transit_units
    );
    eprintln!(
        "  Dwell: {} - {} time units",
        config.min_dwell_units, config.max_dwell_units
    );
    eprintln!("  Admission Policy: {}", config.admission_policy);
    match config.duration_secs {
        Some(secs) => eprintln!("  Run Limit: {}s", secs),
        None => eprintln!("  Run Limit: until Ctrl-C"),
    }
    if let Some(buffer) = config.observer_buffer {
        eprintln!("  Observer Queue: {} events", buffer);
    }
    if let Some(seed) = config.seed {
        eprintln!("  Random Seed: {}", seed);
    }
    eprintln!();
}

/// Print the final statistics in human-readable form
fn print_final_statistics(statistics: &SimulationStatistics) {
    eprintln!();
    eprintln!("Simulation Complete!");
    eprintln!("====================");
    println!("{}", statistics);
    eprintln!();
    eprintln!("{}", statistics.summary());
}
