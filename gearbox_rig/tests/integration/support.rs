//! Scripted fake driver shared by the integration tests.
//!
//! Every call costs 1 ms of virtual time. Motor and LED commands are
//! appended to a log; sensor reads are not.

use gearbox_common::clock::{Clock, VirtualClock};
use gearbox_common::config::RigConfig;
use gearbox_common::hal::driver::{HalError, RigDriver};
use gearbox_common::hal::types::{ShiftHandle, TouchSensor};
use gearbox_rig::cycle::RigRunner;
use gearbox_rig::drivers::simulation::{PressEvent, PressScript, PressTarget};
use gearbox_rig::observer::RecordingObserver;
use std::sync::Arc;
use std::time::Duration;

/// Logged driver command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Init,
    Shutdown,
    DriveRun(i8),
    DriveIdle,
    DriveReset,
    ShiftTurn { degrees: f64, power: i8 },
    ShiftWait,
    BrakeHold(bool),
    ShiftIdle,
    Illumination(bool),
    Tone,
}

/// Failure injected into a `ScriptedDriver`.
#[derive(Debug, Clone, Default)]
pub struct Faults {
    pub init: Option<HalError>,
    /// Fail the light read with this index (0-based).
    pub light_read: Option<usize>,
    /// `shift_wait` times out after this long.
    pub shift_timeout: Option<Duration>,
}

pub struct ScriptedDriver {
    clock: VirtualClock,
    script: PressScript,
    faults: Faults,
    next_handle: u32,
    light_reads: usize,
    pub log: Vec<Command>,
}

impl ScriptedDriver {
    pub fn new(clock: VirtualClock, presses: Vec<PressEvent>) -> Self {
        Self::with_faults(clock, presses, Faults::default())
    }

    pub fn with_faults(clock: VirtualClock, presses: Vec<PressEvent>, faults: Faults) -> Self {
        Self {
            clock,
            script: PressScript::new(presses),
            faults,
            next_handle: 0,
            light_reads: 0,
            log: Vec::new(),
        }
    }

    /// Every `ShiftTurn` in order as `(degrees, power)`.
    pub fn shift_turns(&self) -> Vec<(f64, i8)> {
        self.log
            .iter()
            .filter_map(|c| match c {
                Command::ShiftTurn { degrees, power } => Some((*degrees, *power)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, command: Command) -> usize {
        self.log.iter().filter(|c| **c == command).count()
    }

    fn step(&self) -> f64 {
        self.clock.advance(Duration::from_millis(1));
        self.clock.now_secs()
    }

    fn record(&mut self, command: Command) -> Result<(), HalError> {
        self.step();
        self.log.push(command);
        Ok(())
    }
}

impl RigDriver for ScriptedDriver {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn version(&self) -> &'static str {
        "0.0.0"
    }

    fn init(&mut self, _config: &RigConfig) -> Result<(), HalError> {
        if let Some(e) = self.faults.init.clone() {
            return Err(e);
        }
        self.log.push(Command::Init);
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        self.log.push(Command::Shutdown);
        Ok(())
    }

    fn drive_run(&mut self, power: i8) -> Result<(), HalError> {
        self.record(Command::DriveRun(power))
    }

    fn drive_idle(&mut self) -> Result<(), HalError> {
        self.record(Command::DriveIdle)
    }

    fn drive_reset_position(&mut self) -> Result<(), HalError> {
        self.record(Command::DriveReset)
    }

    fn drive_position(&mut self) -> Result<f64, HalError> {
        self.step();
        Ok(-960.0)
    }

    fn shift_turn(&mut self, degrees: f64, power: i8) -> Result<ShiftHandle, HalError> {
        self.record(Command::ShiftTurn { degrees, power })?;
        self.next_handle += 1;
        Ok(ShiftHandle(self.next_handle))
    }

    fn shift_wait(
        &mut self,
        handle: ShiftHandle,
        timeout: Option<Duration>,
    ) -> Result<(), HalError> {
        self.record(Command::ShiftWait)?;
        if let (Some(after), Some(limit)) = (self.faults.shift_timeout, timeout) {
            self.clock.advance(after);
            return Err(HalError::Timeout {
                handle,
                timeout: limit,
            });
        }
        self.clock.advance(Duration::from_millis(100));
        Ok(())
    }

    fn shift_set_brake_hold(&mut self, hold: bool) -> Result<(), HalError> {
        self.record(Command::BrakeHold(hold))
    }

    fn shift_idle(&mut self) -> Result<(), HalError> {
        self.record(Command::ShiftIdle)
    }

    fn is_pressed(&mut self, sensor: TouchSensor) -> Result<bool, HalError> {
        let t = self.step();
        Ok(self.script.is_pressed(sensor, t))
    }

    fn light_level(&mut self) -> Result<f64, HalError> {
        let t = self.step();
        let index = self.light_reads;
        self.light_reads += 1;
        if self.faults.light_read == Some(index) {
            return Err(HalError::CommunicationError("light sensor unplugged".into()));
        }
        Ok(50.0 + 5.0 * (std::f64::consts::TAU * 5.0 * t).sin())
    }

    fn set_illumination(&mut self, on: bool) -> Result<(), HalError> {
        self.record(Command::Illumination(on))
    }

    fn play_tone(&mut self, _frequency_hz: u32, _duration_ms: u32) -> Result<(), HalError> {
        self.record(Command::Tone)
    }
}

pub fn press(sensor: PressTarget, at_s: f64) -> PressEvent {
    PressEvent::new(sensor, at_s, 0.05)
}

/// Runner over a scripted driver with a recording observer.
pub fn scripted_runner(
    config: RigConfig,
    driver: ScriptedDriver,
    clock: VirtualClock,
) -> RigRunner<ScriptedDriver, RecordingObserver> {
    RigRunner::new(
        config,
        Box::new(driver),
        Arc::new(clock),
        RecordingObserver::new(),
    )
    .with_max_ticks(Some(100_000))
}
