//! Simulation driver implementation.
//!
//! The `SimulationDriver` implements the `RigDriver` trait with software
//! motors, a scripted rider and a light sensor that vibrates at a per-gear
//! frequency, for development and testing without the brick.
//!
//! Every call first sleeps the configured I/O latency on the injected clock
//! and then evaluates the rig at the new time. With a `VirtualClock` this is
//! the only thing that moves time forward, so the control loop's sampling
//! rate is set by the number of driver calls per tick.

use super::config::SimulationConfig;
use super::physics::{DriveMotor, ShiftMotor};
use super::script::PressScript;
use gearbox_common::clock::Clock;
use gearbox_common::config::RigConfig;
use gearbox_common::consts::{MAX_GEAR, MIN_GEAR};
use gearbox_common::hal::driver::{HalError, RigDriver};
use gearbox_common::hal::types::{ShiftHandle, TouchSensor};
use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Light reading scale with the LED off.
const DARK_FACTOR: f64 = 0.2;

/// Simulation driver implementing the RigDriver trait.
pub struct SimulationDriver {
    /// Driver name
    name: &'static str,
    /// Driver version
    version: &'static str,
    /// Time source shared with the control loop
    clock: Arc<dyn Clock>,
    /// Explicit parameters; when `None`, `init()` reads the rig config
    preset: Option<SimulationConfig>,
    /// Active parameters
    config: SimulationConfig,
    /// Initialized flag
    initialized: bool,
    /// Clock reading at init
    origin_s: f64,
    drive: DriveMotor,
    shift: ShiftMotor,
    script: PressScript,
    /// Gear the simulated selector sits in
    gear: u8,
    illuminated: bool,
    shift_moves: usize,
    tones: usize,
}

impl SimulationDriver {
    /// Create a driver configured from `[driver_config.simulation]` at init.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::build(clock, None)
    }

    /// Create a driver with explicit parameters; the rig config section is ignored.
    pub fn with_config(clock: Arc<dyn Clock>, config: SimulationConfig) -> Self {
        Self::build(clock, Some(config))
    }

    fn build(clock: Arc<dyn Clock>, preset: Option<SimulationConfig>) -> Self {
        let config = preset.clone().unwrap_or_default();
        Self {
            name: "simulation",
            version: env!("CARGO_PKG_VERSION"),
            clock,
            drive: DriveMotor::new(config.drive_rpm),
            shift: ShiftMotor::new(config.shift_deg_per_s_per_power),
            script: PressScript::new(config.presses.clone()),
            preset,
            config,
            initialized: false,
            origin_s: 0.0,
            gear: MIN_GEAR,
            illuminated: false,
            shift_moves: 0,
            tones: 0,
        }
    }

    /// Active parameters.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Gear the simulated selector sits in.
    pub fn gear(&self) -> u8 {
        self.gear
    }

    /// Number of `shift_turn` calls.
    pub fn shift_moves(&self) -> usize {
        self.shift_moves
    }

    /// Number of `play_tone` calls.
    pub fn tones(&self) -> usize {
        self.tones
    }

    /// Light sensor LED state.
    pub fn illuminated(&self) -> bool {
        self.illuminated
    }

    /// Current drive power.
    pub fn drive_power(&self) -> i8 {
        self.drive.power()
    }

    /// Shift motor brake and hold state.
    pub fn brake_hold(&self) -> bool {
        self.shift.brake_hold()
    }

    /// Time the scripted rider releases the last button [s].
    pub fn script_end_s(&self) -> f64 {
        self.script.end_s()
    }

    /// Seconds since init, without advancing the clock.
    fn elapsed_s(&self) -> f64 {
        self.clock.now_secs() - self.origin_s
    }

    /// One I/O round trip; returns the rig time after it.
    fn io(&self) -> Result<f64, HalError> {
        if !self.initialized {
            return Err(HalError::CommunicationError(
                "simulation driver not initialized".to_string(),
            ));
        }
        self.clock.sleep(Duration::from_micros(self.config.io_latency_us));
        Ok(self.elapsed_s())
    }

    fn vibration_hz(&self) -> f64 {
        let idx = usize::from(self.gear.clamp(MIN_GEAR, MAX_GEAR) - MIN_GEAR);
        self.config.vibration_hz[idx]
    }

    /// Move the selector one gear in the direction of `power`.
    fn engage(&mut self, power: i8) {
        self.gear = if power < 0 {
            (self.gear + 1).min(MAX_GEAR)
        } else {
            self.gear.saturating_sub(1).max(MIN_GEAR)
        };
        debug!("Simulated selector now in gear {}", self.gear);
    }
}

impl RigDriver for SimulationDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self, config: &RigConfig) -> Result<(), HalError> {
        let sim = match &self.preset {
            Some(preset) => {
                preset.validate()?;
                preset.clone()
            }
            None => SimulationConfig::from_rig(config)?,
        };

        info!(
            "Initializing simulation driver: latency {}µs, drive {} rpm, {} scripted presses",
            sim.io_latency_us,
            sim.drive_rpm,
            sim.presses.len()
        );

        self.drive = DriveMotor::new(sim.drive_rpm);
        self.shift = ShiftMotor::new(sim.shift_deg_per_s_per_power);
        self.script = PressScript::new(sim.presses.clone());
        self.config = sim;
        self.gear = MIN_GEAR;
        self.illuminated = false;
        self.origin_s = self.clock.now_secs();
        self.initialized = true;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        info!("Shutting down simulation driver");
        self.drive.set_power(0, self.elapsed_s());
        self.shift.idle();
        self.illuminated = false;
        self.initialized = false;
        Ok(())
    }

    fn drive_run(&mut self, power: i8) -> Result<(), HalError> {
        let t = self.io()?;
        self.drive.set_power(power, t);
        Ok(())
    }

    fn drive_idle(&mut self) -> Result<(), HalError> {
        let t = self.io()?;
        self.drive.set_power(0, t);
        Ok(())
    }

    fn drive_reset_position(&mut self) -> Result<(), HalError> {
        let t = self.io()?;
        self.drive.reset_position(t);
        Ok(())
    }

    fn drive_position(&mut self) -> Result<f64, HalError> {
        let t = self.io()?;
        Ok(self.drive.position(t))
    }

    fn shift_turn(&mut self, degrees: f64, power: i8) -> Result<ShiftHandle, HalError> {
        let t = self.io()?;
        let m = self.shift.start(degrees, power, t);
        self.shift_moves += 1;
        debug!(
            "Simulated {} started: {:.1}° at power {}, done at {:.3}s",
            m.handle, degrees, power, m.ends_at_s
        );
        Ok(m.handle)
    }

    fn shift_wait(
        &mut self,
        handle: ShiftHandle,
        timeout: Option<Duration>,
    ) -> Result<(), HalError> {
        let t = self.io()?;
        let m = self.shift.pending(handle).ok_or_else(|| {
            HalError::CommunicationError(format!("no shift move in flight for {handle}"))
        })?;

        let remaining = (m.ends_at_s - t).max(0.0);
        if let Some(limit) = timeout {
            if remaining > limit.as_secs_f64() {
                self.clock.sleep(limit);
                return Err(HalError::Timeout {
                    handle,
                    timeout: limit,
                });
            }
        }
        if !remaining.is_finite() {
            return Err(HalError::CommunicationError(format!(
                "{handle} issued at zero power never completes"
            )));
        }

        let wait = Duration::try_from_secs_f64(remaining).map_err(|e| {
            HalError::CommunicationError(format!("{handle} wait of {remaining}s: {e}"))
        })?;
        self.clock.sleep(wait);
        if let Some(done) = self.shift.finish(handle) {
            self.engage(done.power);
        }
        Ok(())
    }

    fn shift_set_brake_hold(&mut self, hold: bool) -> Result<(), HalError> {
        self.io()?;
        self.shift.set_brake_hold(hold);
        Ok(())
    }

    fn shift_idle(&mut self) -> Result<(), HalError> {
        self.io()?;
        self.shift.idle();
        Ok(())
    }

    fn is_pressed(&mut self, sensor: TouchSensor) -> Result<bool, HalError> {
        let t = self.io()?;
        Ok(self.script.is_pressed(sensor, t))
    }

    fn light_level(&mut self) -> Result<f64, HalError> {
        let t = self.io()?;
        let level = if self.illuminated {
            self.config.light_base
                + self.config.light_amplitude * (TAU * self.vibration_hz() * t).sin()
        } else {
            self.config.light_base * DARK_FACTOR
        };
        trace!("Simulated light {level:.3} at {t:.4}s");
        Ok(level)
    }

    fn set_illumination(&mut self, on: bool) -> Result<(), HalError> {
        self.io()?;
        self.illuminated = on;
        Ok(())
    }

    fn play_tone(&mut self, frequency_hz: u32, duration_ms: u32) -> Result<(), HalError> {
        self.io()?;
        self.tones += 1;
        debug!("Simulated tone {frequency_hz} Hz for {duration_ms} ms");
        Ok(())
    }
}
