//! Integration test: startup posture and shutdown sequence.
//!
//! Validates:
//! 1. Startup order: init → illumination → brake hold → drive reset → drive run
//! 2. Shutdown: drive idle → shift idle → illumination off → driver shutdown, once
//! 3. The shutdown sequence also runs after hardware faults and shift timeouts

use gearbox_common::clock::VirtualClock;
use gearbox_common::config::RigConfig;
use gearbox_common::hal::driver::HalError;
use gearbox_rig::RigError;
use gearbox_rig::drivers::simulation::PressTarget;
use gearbox_rig::state::gearbox::Gear;
use gearbox_rig::state::run::{RunState, StopReason};
use std::time::Duration;

use super::support::{Command, Faults, ScriptedDriver, press, scripted_runner};

// ── Helpers ─────────────────────────────────────────────────────────

const SHUTDOWN_SEQUENCE: [Command; 4] = [
    Command::DriveIdle,
    Command::ShiftIdle,
    Command::Illumination(false),
    Command::Shutdown,
];

fn assert_shut_down_once(log: &[Command]) {
    assert!(
        log.ends_with(&SHUTDOWN_SEQUENCE),
        "log tail: {:?}",
        &log[log.len().saturating_sub(6)..]
    );
    for command in SHUTDOWN_SEQUENCE {
        assert_eq!(log.iter().filter(|c| **c == command).count(), 1, "{command:?}");
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn startup_posture_in_order() {
    let clock = VirtualClock::new();
    let driver = ScriptedDriver::new(clock.clone(), vec![]);
    let mut rig = scripted_runner(RigConfig::default(), driver, clock);
    rig.start().unwrap();
    assert_eq!(
        rig.driver().log,
        vec![
            Command::Init,
            Command::Illumination(true),
            Command::BrakeHold(true),
            Command::DriveReset,
            Command::DriveRun(-100),
        ]
    );
}

#[test]
fn both_pressed_runs_shutdown_sequence_once() {
    let clock = VirtualClock::new();
    let driver = ScriptedDriver::new(clock.clone(), vec![press(PressTarget::Both, 0.3)]);
    let mut rig = scripted_runner(RigConfig::default(), driver, clock);

    let summary = rig.run().unwrap();
    assert_eq!(summary.reason, StopReason::BothPressed);
    assert_shut_down_once(&rig.driver().log);

    // A second shutdown is a no-op.
    rig.shutdown().unwrap();
    assert_shut_down_once(&rig.driver().log);
    assert_eq!(rig.state(), RunState::Stopped(StopReason::BothPressed));
}

#[test]
fn hardware_fault_still_shuts_down() {
    let clock = VirtualClock::new();
    let faults = Faults {
        light_read: Some(50),
        ..Faults::default()
    };
    let driver = ScriptedDriver::with_faults(clock.clone(), vec![], faults);
    let mut rig = scripted_runner(RigConfig::default(), driver, clock);

    let err = rig.run().unwrap_err();
    assert!(matches!(err, RigError::Hardware(HalError::CommunicationError(_))));
    assert_eq!(rig.state(), RunState::Stopped(StopReason::Fault));
    assert_eq!(rig.stats().ticks, 50);
    assert_shut_down_once(&rig.driver().log);
}

#[test]
fn init_failure_touches_nothing() {
    let clock = VirtualClock::new();
    let faults = Faults {
        init: Some(HalError::InitFailed("no brick on USB".into())),
        ..Faults::default()
    };
    let driver = ScriptedDriver::with_faults(clock.clone(), vec![], faults);
    let mut rig = scripted_runner(RigConfig::default(), driver, clock);

    let err = rig.run().unwrap_err();
    assert!(matches!(err, RigError::Hardware(HalError::InitFailed(_))));
    assert!(rig.driver().log.is_empty());
    assert_eq!(rig.state(), RunState::Stopped(StopReason::Fault));
}

#[test]
fn invalid_config_is_rejected_before_init() {
    use gearbox_common::config::{ConfigError, ConfigLoader};
    let config = RigConfig::from_toml("[gearbox]\nshift_power = -128").unwrap();
    let clock = VirtualClock::new();
    let driver = ScriptedDriver::new(clock.clone(), vec![press(PressTarget::Up, 0.2)]);
    let mut rig = scripted_runner(config, driver, clock);

    let err = rig.run().unwrap_err();
    assert!(matches!(err, RigError::Config(ConfigError::ValidationError(_))));
    assert!(rig.driver().log.is_empty());
    assert_eq!(rig.state(), RunState::Stopped(StopReason::Fault));
    assert_eq!(rig.stats().ticks, 0);
}

#[test]
fn shift_timeout_reports_gears_and_shuts_down() {
    let clock = VirtualClock::new();
    let faults = Faults {
        shift_timeout: Some(Duration::from_millis(800)),
        ..Faults::default()
    };
    let presses = vec![press(PressTarget::Up, 0.2)];
    let driver = ScriptedDriver::with_faults(clock.clone(), presses, faults);
    let mut config = RigConfig::default();
    config.gearbox.shift_timeout_ms = 800;
    let mut rig = scripted_runner(config, driver, clock);

    let err = rig.run().unwrap_err();
    match err {
        RigError::ShiftTimeout { from, to, timeout } => {
            assert_eq!(from, Gear::FIRST);
            assert_eq!(to.number(), 2);
            assert_eq!(timeout, Duration::from_millis(800));
        }
        other => panic!("expected shift timeout, got {other:?}"),
    }

    // Gear already moved; the direction of an unfinished shift is not kept.
    assert_eq!(rig.gear().number(), 2);
    assert_eq!(rig.last_shift(), None);
    assert_eq!(rig.driver().count(Command::Tone), 0);
    assert_shut_down_once(&rig.driver().log);
}
