//! Integration test: shift sequences through the full loop.
//!
//! Validates gear stepping, backlash on reversals, end-of-travel presses
//! and the simultaneous-press stop using the scripted driver's command log.

use gearbox_common::clock::VirtualClock;
use gearbox_common::config::RigConfig;
use gearbox_rig::RunSummary;
use gearbox_rig::drivers::simulation::{PressEvent, PressTarget};
use gearbox_rig::state::gearbox::{Gear, ShiftDirection};
use gearbox_rig::state::run::{RunState, StopReason};

use super::support::{Command, ScriptedDriver, press, scripted_runner};

// ── Helpers ─────────────────────────────────────────────────────────

fn run_script(presses: Vec<PressEvent>) -> (RunSummary, Vec<(f64, i8)>, Vec<u8>, usize) {
    let clock = VirtualClock::new();
    let driver = ScriptedDriver::new(clock.clone(), presses);
    let mut rig = scripted_runner(RigConfig::default(), driver, clock);
    let summary = rig.run().unwrap();
    assert!(matches!(rig.state(), RunState::Stopped(_)));

    let gears = rig
        .observer()
        .shifts
        .iter()
        .map(|plan| plan.to.number())
        .collect();
    let tones = rig.driver().count(Command::Tone);
    (summary, rig.driver().shift_turns(), gears, tones)
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn up_down_up_with_backlash_and_limits() {
    use PressTarget::{Both, Down, Up};
    let presses = vec![
        press(Up, 0.5),
        press(Up, 1.0),
        press(Down, 1.5),
        press(Down, 2.0),
        press(Down, 2.5), // already in first
        press(Up, 3.0),
        press(Up, 3.5),
        press(Up, 4.0),
        press(Up, 4.5),
        press(Up, 5.0), // already in top
        press(Both, 5.5),
    ];

    let (summary, turns, gears, tones) = run_script(presses);

    assert_eq!(
        turns,
        vec![
            (120.0, -30),
            (105.0, -30),
            (125.0, 30),
            (120.0, 30),
            (140.0, -30),
            (105.0, -30),
            (110.0, -30),
            (100.0, -30),
        ]
    );
    assert_eq!(gears, vec![2, 3, 2, 1, 2, 3, 4, 5]);
    assert_eq!(tones, 8);
    assert_eq!(summary.reason, StopReason::BothPressed);
    assert_eq!(summary.gear, Gear::TOP);
    assert_eq!(summary.stats.shifts, 8);
    assert_eq!(summary.stats.limit_presses, 2);
}

#[test]
fn simultaneous_press_issues_no_motor_command() {
    let (summary, turns, gears, tones) = run_script(vec![press(PressTarget::Both, 0.5)]);
    assert_eq!(summary.reason, StopReason::BothPressed);
    assert!(turns.is_empty());
    assert!(gears.is_empty());
    assert_eq!(tones, 0);
    assert_eq!(summary.gear, Gear::FIRST);
}

#[test]
fn second_button_during_debounce_aborts_shift() {
    let presses = vec![
        PressEvent::new(PressTarget::Up, 0.5, 1.0),
        PressEvent::new(PressTarget::Down, 0.8, 1.0),
    ];
    let (summary, turns, _, tones) = run_script(presses);
    assert_eq!(summary.reason, StopReason::BothPressed);
    assert!(turns.is_empty());
    assert_eq!(tones, 0);
    assert_eq!(summary.gear, Gear::FIRST);
}

#[test]
fn last_direction_follows_completed_shifts() {
    let clock = VirtualClock::new();
    let driver = ScriptedDriver::new(
        clock.clone(),
        vec![
            press(PressTarget::Up, 0.2),
            press(PressTarget::Down, 0.6),
            press(PressTarget::Both, 1.0),
        ],
    );
    let mut rig = scripted_runner(RigConfig::default(), driver, clock);
    rig.start().unwrap();
    assert_eq!(rig.last_shift(), None);

    while rig.stats().shifts < 1 {
        rig.tick().unwrap();
    }
    assert_eq!(rig.last_shift(), Some(ShiftDirection::Up));
    assert_eq!(rig.gear().number(), 2);

    while rig.stats().shifts < 2 {
        rig.tick().unwrap();
    }
    assert_eq!(rig.last_shift(), Some(ShiftDirection::Down));
    assert_eq!(rig.gear(), Gear::FIRST);

    let summary = rig.run().unwrap();
    assert_eq!(summary.reason, StopReason::BothPressed);
}
