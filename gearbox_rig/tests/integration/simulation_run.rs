//! Integration test: full demo run on the built-in simulation driver.
//!
//! Drives the reference rider script (four upshifts, four downshifts, both
//! buttons) through the registry-built driver and a TOML configuration,
//! the same path the binary takes.

use gearbox_common::clock::{Clock, VirtualClock};
use gearbox_common::config::{ConfigLoader, RigConfig};
use gearbox_rig::cycle::RigRunner;
use gearbox_rig::driver_registry::DriverRegistry;
use gearbox_rig::drivers::simulation::SimulationConfig;
use gearbox_rig::observer::{RecordingObserver, TracingObserver};
use gearbox_rig::state::gearbox::Gear;
use gearbox_rig::state::run::StopReason;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

const VIBRATION_HZ: [f64; 5] = [2.0, 3.0, 4.5, 6.0, 8.0];

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn default_script_shifts_through_all_gears_and_back() {
    let clock = VirtualClock::new();
    let registry = DriverRegistry::with_builtin_drivers();
    let driver = registry
        .create_driver("simulation", Arc::new(clock.clone()))
        .unwrap();

    let mut rig = RigRunner::new(
        RigConfig::default(),
        driver,
        Arc::new(clock.clone()),
        (RecordingObserver::new(), TracingObserver),
    );
    let summary = rig.run().unwrap();

    assert_eq!(summary.reason, StopReason::BothPressed);
    assert_eq!(summary.gear, Gear::FIRST);
    assert_eq!(summary.stats.shifts, 8);
    assert_eq!(summary.stats.limit_presses, 0);
    assert!(clock.now_secs() > 27.0);

    let recorded = &rig.observer().0;
    let gears: Vec<u8> = recorded.shifts.iter().map(|p| p.to.number()).collect();
    assert_eq!(gears, vec![2, 3, 4, 5, 4, 3, 2, 1]);

    // Backlash only on the first downshift.
    let backlash: Vec<f64> = recorded.shifts.iter().map(|p| p.backlash_degrees).collect();
    assert_eq!(backlash, vec![0.0, 0.0, 0.0, 0.0, 20.0, 0.0, 0.0, 0.0]);

    // One analysis per shift; each window carries the gear left behind.
    assert_eq!(recorded.analyses.len(), 8);
    for (plan, report) in recorded.shifts.iter().zip(&recorded.analyses) {
        assert_eq!(report.gear, plan.to);
        let expected = VIBRATION_HZ[usize::from(plan.from.number() - 1)];
        let peak = report.dominant_frequency().unwrap();
        assert!(
            (peak - expected).abs() <= 1.5 * report.spectrum.bin_width(),
            "{} -> {}: peak {peak:.3} Hz, expected {expected} Hz",
            plan.from,
            plan.to
        );
    }

    // Drive at -100 with 160 rpm at full power.
    assert!(summary.speed_samples >= 20);
    for sample in rig.sampler().speeds() {
        assert!(sample.rpm > 150.0 && sample.rpm < 170.0, "rpm {}", sample.rpm);
    }
    assert!(rig.sampler().speeds().windows(2).all(|w| w[0].time_s < w[1].time_s));
}

#[test]
fn simulation_section_from_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[drive]
power = 50

[driver_config.simulation]
io_latency_us = 4000
drive_rpm = 120.0

[[driver_config.simulation.presses]]
sensor = "up"
at_s = 2.0
hold_s = 0.1

[[driver_config.simulation.presses]]
sensor = "both"
at_s = 3.5
hold_s = 0.2
"#
    )
    .unwrap();
    let config = RigConfig::load_validated(file.path()).unwrap();

    let clock = VirtualClock::new();
    let driver = DriverRegistry::with_builtin_drivers()
        .create_driver("simulation", Arc::new(clock.clone()))
        .unwrap();
    let mut rig = RigRunner::new(config, driver, Arc::new(clock), RecordingObserver::new());
    let summary = rig.run().unwrap();

    assert_eq!(summary.reason, StopReason::BothPressed);
    assert_eq!(summary.gear.number(), 2);
    // Half power on a 120 rpm drive.
    for sample in rig.sampler().speeds() {
        assert!((sample.rpm - 60.0).abs() < 3.0, "rpm {}", sample.rpm);
    }
}

#[test]
fn invalid_simulation_section_fails_at_start() {
    let config = RigConfig::from_toml("[driver_config.simulation]\nio_latency_us = 0").unwrap();
    let clock = VirtualClock::new();
    let driver = DriverRegistry::with_builtin_drivers()
        .create_driver("simulation", Arc::new(clock.clone()))
        .unwrap();
    let mut rig = RigRunner::new(config, driver, Arc::new(clock), RecordingObserver::new());
    assert!(rig.run().is_err());
}

#[test]
fn shipped_config_matches_builtin_defaults() {
    let path = std::path::Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/config/rig.toml"));
    let config = RigConfig::load_validated(path).unwrap();

    let mut without_driver = config.clone();
    without_driver.driver_config.clear();
    assert_eq!(without_driver, RigConfig::default());
    assert_eq!(
        SimulationConfig::from_rig(&config).unwrap(),
        SimulationConfig::default()
    );
}
