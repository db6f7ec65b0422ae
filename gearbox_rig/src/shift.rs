//! Touch-sensor shift controller.
//!
//! One `check()` per sensor per tick:
//! 1. Poll the sensor once; not pressed → nothing to do.
//! 2. Debounce wait: block while it stays pressed, watching the other sensor.
//!    Other sensor pressed → `BothPressed`, no motor command.
//! 3. Ask the gearbox for a shift; at the end of travel the press is consumed.
//! 4. Turn the shift motor, block until done, play the confirmation tone.
//!
//! Both waits block the whole control loop, so sampling pauses while the
//! rider holds a button or the shift motor is moving.

use gearbox_common::clock::Clock;
use gearbox_common::config::RigConfig;
use gearbox_common::hal::driver::{HalError, RigDriver};
use gearbox_common::hal::types::TouchSensor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::RigError;
use crate::state::gearbox::{Gear, GearboxStateMachine, ShiftDecision, ShiftDirection, ShiftPlan};

/// Result of checking one touch sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShiftOutcome {
    /// Sensor not pressed.
    Idle,
    /// Shift motor moved; the gear changed.
    Shifted(ShiftPlan),
    /// Press consumed at the end of travel.
    AtLimit(Gear),
    /// Other sensor pressed during the debounce wait.
    BothPressed,
    /// Stop requested during the debounce wait.
    StopRequested,
}

impl ShiftOutcome {
    /// True if the loop must stop.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::BothPressed | Self::StopRequested)
    }
}

/// How a debounce wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Debounce {
    Released,
    BothPressed,
    StopRequested,
}

/// Debounces the touch sensors and drives the shift motor.
#[derive(Debug, Clone)]
pub struct ShiftController {
    gearbox: GearboxStateMachine,
    shift_power: i8,
    shift_timeout: Option<Duration>,
    tone_hz: u32,
    tone_ms: u32,
    debounce_poll: Duration,
}

impl ShiftController {
    /// Build from the rig configuration; starts in first gear.
    pub fn from_config(config: &RigConfig) -> Self {
        Self {
            gearbox: GearboxStateMachine::from_config(&config.gearbox),
            shift_power: config.gearbox.shift_power,
            shift_timeout: config.gearbox.shift_timeout(),
            tone_hz: config.feedback.tone_hz,
            tone_ms: config.feedback.tone_ms,
            debounce_poll: config.input.debounce_poll(),
        }
    }

    /// Gear state.
    #[inline]
    pub fn gearbox(&self) -> &GearboxStateMachine {
        &self.gearbox
    }

    /// Handle one sensor for this tick.
    ///
    /// `running` is the external stop flag; clearing it ends a debounce wait.
    pub fn check<D: RigDriver + ?Sized>(
        &mut self,
        sensor: TouchSensor,
        driver: &mut D,
        clock: &dyn Clock,
        running: &AtomicBool,
    ) -> Result<ShiftOutcome, RigError> {
        if !driver.is_pressed(sensor)? {
            return Ok(ShiftOutcome::Idle);
        }

        match self.debounce(sensor, driver, clock, running)? {
            Debounce::Released => {}
            Debounce::BothPressed => {
                info!("Both sensors pressed while debouncing {sensor}");
                return Ok(ShiftOutcome::BothPressed);
            }
            Debounce::StopRequested => return Ok(ShiftOutcome::StopRequested),
        }

        let direction = match sensor {
            TouchSensor::Up => ShiftDirection::Up,
            TouchSensor::Down => ShiftDirection::Down,
        };

        match self.gearbox.begin_shift(direction) {
            ShiftDecision::AtLimit(gear) => {
                debug!("Shift {direction} ignored in gear {gear}");
                Ok(ShiftOutcome::AtLimit(gear))
            }
            ShiftDecision::Shift(plan) => {
                self.actuate(&plan, driver)?;
                Ok(ShiftOutcome::Shifted(plan))
            }
        }
    }

    /// Block while `sensor` stays pressed.
    fn debounce<D: RigDriver + ?Sized>(
        &self,
        sensor: TouchSensor,
        driver: &mut D,
        clock: &dyn Clock,
        running: &AtomicBool,
    ) -> Result<Debounce, HalError> {
        while driver.is_pressed(sensor)? {
            if driver.is_pressed(sensor.other())? {
                return Ok(Debounce::BothPressed);
            }
            if !running.load(Ordering::SeqCst) {
                return Ok(Debounce::StopRequested);
            }
            clock.sleep(self.debounce_poll);
        }
        Ok(Debounce::Released)
    }

    /// Turn the shift motor for an accepted plan and wait for it.
    fn actuate<D: RigDriver + ?Sized>(
        &mut self,
        plan: &ShiftPlan,
        driver: &mut D,
    ) -> Result<(), RigError> {
        let power = plan.direction.motor_power(self.shift_power);
        debug!(
            "Shifting {} {} -> {}: {:.1}° (table {:.1}°, backlash {:.1}°) at power {}",
            plan.direction,
            plan.from,
            plan.to,
            plan.degrees(),
            plan.table_degrees,
            plan.backlash_degrees,
            power
        );

        let handle = driver.shift_turn(plan.degrees(), power)?;
        match driver.shift_wait(handle, self.shift_timeout) {
            Ok(()) => {}
            Err(HalError::Timeout { timeout, .. }) => {
                return Err(RigError::ShiftTimeout {
                    from: plan.from,
                    to: plan.to,
                    timeout,
                });
            }
            Err(e) => return Err(e.into()),
        }

        driver.play_tone(self.tone_hz, self.tone_ms)?;
        self.gearbox.complete_shift(plan);
        Ok(())
    }
}
