//! Integration test: spectral analysis on loop timing.
//!
//! The simulated light sensor vibrates at a per-gear frequency. The window
//! handed to the analyzer after a shift holds the previous gear's signal, so
//! its peak must sit at that gear's frequency even though the loop has no
//! fixed period and speed samples stretch some ticks.

use gearbox_common::clock::VirtualClock;
use gearbox_common::config::RigConfig;
use gearbox_rig::cycle::RigRunner;
use gearbox_rig::drivers::simulation::{PressEvent, PressTarget, SimulationConfig, SimulationDriver};
use gearbox_rig::observer::RecordingObserver;
use gearbox_rig::spectral::AnalysisReport;
use std::sync::Arc;

// ── Helpers ─────────────────────────────────────────────────────────

fn simulated(
    config: RigConfig,
    sim: SimulationConfig,
) -> RigRunner<SimulationDriver, RecordingObserver> {
    let clock = VirtualClock::new();
    let driver = SimulationDriver::with_config(Arc::new(clock.clone()), sim);
    RigRunner::new(config, Box::new(driver), Arc::new(clock), RecordingObserver::new())
        .with_max_ticks(Some(20_000))
}

fn assert_peak_near(report: &AnalysisReport, expected_hz: f64) {
    let peak = report.dominant_frequency().unwrap();
    let tolerance = 1.5 * report.spectrum.bin_width();
    assert!(
        (peak - expected_hz).abs() <= tolerance,
        "gear {}: peak {peak:.3} Hz, expected {expected_hz} Hz ± {tolerance:.3}",
        report.gear
    );
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn peaks_follow_previous_gear_vibration() {
    let sim = SimulationConfig {
        io_latency_us: 5_000,
        vibration_hz: [2.0, 3.0, 4.5, 6.0, 8.0],
        presses: vec![
            PressEvent::new(PressTarget::Up, 4.0, 0.1),
            PressEvent::new(PressTarget::Up, 8.0, 0.1),
            PressEvent::new(PressTarget::Both, 12.0, 0.5),
        ],
        ..SimulationConfig::default()
    };
    let mut rig = simulated(RigConfig::default(), sim);
    rig.run().unwrap();

    let analyses = &rig.observer().analyses;
    assert_eq!(analyses.len(), 2);

    assert_eq!(analyses[0].gear.number(), 2);
    assert_peak_near(&analyses[0], 2.0);
    assert_eq!(analyses[1].gear.number(), 3);
    assert_peak_near(&analyses[1], 3.0);

    for report in analyses {
        // 15 ms per idle tick
        assert!((report.sampling_hz - 1.0 / 0.015).abs() < 1.0);
        assert_eq!(report.spectrum.len(), report.centered.len() / 2 + 1);
        assert_eq!(report.timestamps.len(), report.centered.len());
        assert!(report.timestamps.windows(2).all(|w| w[0] < w[1]));
        assert!(report.centered.len() > 100);
    }
}

#[test]
fn short_window_is_not_analysed_and_keeps_growing() {
    let sim = SimulationConfig {
        io_latency_us: 5_000,
        presses: vec![
            // ~60 samples in first gear
            PressEvent::new(PressTarget::Up, 0.9, 0.05),
            PressEvent::new(PressTarget::Both, 2.0, 0.5),
        ],
        ..SimulationConfig::default()
    };
    let mut rig = simulated(RigConfig::default(), sim);
    rig.start().unwrap();

    while rig.stats().shifts == 0 {
        let report = rig.tick().unwrap();
        assert!(!report.analyzed);
    }
    assert!(rig.observer().analyses.is_empty());
    let after_shift = rig.sampler().window().len();
    assert!(after_shift > 0 && after_shift <= 100);

    rig.tick().unwrap();
    assert_eq!(rig.sampler().window().len(), after_shift + 1);
}

#[test]
fn threshold_is_configurable() {
    let sim = SimulationConfig {
        io_latency_us: 5_000,
        presses: vec![
            PressEvent::new(PressTarget::Up, 0.9, 0.05),
            PressEvent::new(PressTarget::Both, 2.0, 0.5),
        ],
        ..SimulationConfig::default()
    };
    let mut config = RigConfig::default();
    config.analyzer.min_samples = 20;
    let mut rig = simulated(config, sim);
    rig.run().unwrap();
    assert_eq!(rig.observer().analyses.len(), 1);
    assert_eq!(rig.stats().analyses, 1);
}
