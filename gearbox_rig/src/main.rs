//! # Gearbox Rig Binary
//!
//! Runs the shift controller and spectral analysis loop on the selected
//! driver until both touch sensors are pressed or Ctrl-C is received.
//!
//! # Usage
//!
//! ```bash
//! # Simulated rig, as fast as possible
//! gearbox_rig config/rig.toml
//!
//! # Simulated rig in wall-clock time, verbose
//! gearbox_rig config/rig.toml --realtime -v
//!
//! # Smoke run
//! gearbox_rig --max-ticks 500 --json
//! ```

#![deny(warnings)]

use clap::Parser;
use gearbox_common::clock::{Clock, MonotonicClock, VirtualClock};
use gearbox_common::config::{ConfigError, LogLevel, RigConfig};
use gearbox_common::consts::DEFAULT_CONFIG_PATH;
use gearbox_rig::cycle::RigRunner;
use gearbox_rig::driver_registry::DriverRegistry;
use gearbox_rig::observer::TracingObserver;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Gearbox rig controller with per-gear vibration spectrum analysis
#[derive(Parser, Debug)]
#[command(name = "gearbox_rig")]
#[command(version)]
#[command(about = "Gearbox rig shift controller and vibration spectrum analyzer")]
#[command(long_about = None)]
struct Args {
    /// Path to the rig configuration file
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Driver to run on
    #[arg(short, long, default_value = "simulation")]
    driver: String,

    /// Run on the wall clock instead of virtual time
    #[arg(long)]
    realtime: bool,

    /// Stop after this many ticks
    #[arg(long, value_name = "N")]
    max_ticks: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = run() {
        error!("Gearbox rig failed: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = RigConfig::load_validated(&args.config);
    let log_level = loaded
        .as_ref()
        .map(|c| c.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("Gearbox rig v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(config) => {
            info!("Loaded configuration from {}", args.config.display());
            config
        }
        Err(ConfigError::FileNotFound) if args.config == PathBuf::from(DEFAULT_CONFIG_PATH) => {
            warn!(
                "No configuration at {}, using built-in defaults",
                args.config.display()
            );
            RigConfig::default()
        }
        Err(e) => return Err(e.into()),
    };

    let clock: Arc<dyn Clock> = if args.realtime {
        info!("Using wall clock");
        Arc::new(MonotonicClock::new())
    } else {
        info!("Using virtual clock");
        Arc::new(VirtualClock::new())
    };

    let registry = DriverRegistry::with_builtin_drivers();
    info!("Available drivers: {:?}", registry.list_drivers());
    let driver = registry.create_driver(&args.driver, Arc::clone(&clock))?;

    let mut runner =
        RigRunner::new(config, driver, clock, TracingObserver).with_max_ticks(args.max_ticks);

    let running = runner.running_flag();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    let summary = runner.run()?;
    info!(
        "Run complete ({}): gear {}, {} ticks, {} shifts, {} analyses, {} speed samples over {:.1}s, longest tick {:?}",
        summary.reason,
        summary.gear,
        summary.stats.ticks,
        summary.stats.shifts,
        summary.stats.analyses,
        summary.speed_samples,
        summary.run_time_s,
        summary.stats.max_tick
    );
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        match configured {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
