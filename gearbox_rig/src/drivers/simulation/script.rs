//! Scripted touch sensor presses.

use gearbox_common::hal::types::TouchSensor;
use serde::{Deserialize, Serialize};

/// Which buttons a scripted press holds down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressTarget {
    /// Sensor 1.
    Up,
    /// Sensor 2.
    Down,
    /// Both sensors at once.
    Both,
}

impl PressTarget {
    /// True if this press holds `sensor` down.
    #[inline]
    pub fn holds(self, sensor: TouchSensor) -> bool {
        match self {
            Self::Both => true,
            Self::Up => sensor == TouchSensor::Up,
            Self::Down => sensor == TouchSensor::Down,
        }
    }
}

/// One button press on the simulated rig.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PressEvent {
    /// Button(s) pressed.
    pub sensor: PressTarget,
    /// Press time [s since driver init].
    pub at_s: f64,
    /// How long the button is held [s].
    pub hold_s: f64,
}

impl PressEvent {
    /// Build a press.
    pub const fn new(sensor: PressTarget, at_s: f64, hold_s: f64) -> Self {
        Self { sensor, at_s, hold_s }
    }

    /// True while the button is down at `t`: `[at_s, at_s + hold_s)`.
    #[inline]
    pub fn active_at(&self, t: f64) -> bool {
        t >= self.at_s && t < self.at_s + self.hold_s
    }
}

/// Evaluates a press script against elapsed time.
#[derive(Debug, Clone, Default)]
pub struct PressScript {
    presses: Vec<PressEvent>,
}

impl PressScript {
    /// Wrap a list of presses.
    pub fn new(presses: Vec<PressEvent>) -> Self {
        Self { presses }
    }

    /// State of `sensor` at `t`.
    pub fn is_pressed(&self, sensor: TouchSensor, t: f64) -> bool {
        self.presses
            .iter()
            .any(|p| p.sensor.holds(sensor) && p.active_at(t))
    }

    /// Time the last press is released, 0 for an empty script.
    pub fn end_s(&self) -> f64 {
        self.presses
            .iter()
            .map(|p| p.at_s + p.hold_s)
            .fold(0.0, f64::max)
    }
}
