//! Simulation driver configuration (`[driver_config.simulation]`).

use gearbox_common::config::RigConfig;
use gearbox_common::consts::MAX_GEAR;
use gearbox_common::hal::driver::HalError;
use serde::{Deserialize, Serialize};
use toml::Value;

use super::script::{PressEvent, PressTarget};

/// Section name in `driver_config`.
pub const SECTION: &str = "simulation";

fn default_io_latency_us() -> u64 {
    5_000
}

fn default_light_base() -> f64 {
    50.0
}

fn default_light_amplitude() -> f64 {
    8.0
}

fn default_vibration_hz() -> [f64; MAX_GEAR as usize] {
    [2.0, 3.0, 4.5, 6.0, 8.0]
}

fn default_drive_rpm() -> f64 {
    160.0
}

fn default_shift_deg_per_s_per_power() -> f64 {
    12.0
}

/// Rider script for the reference demo: four upshifts, four downshifts,
/// then both buttons to stop.
fn default_presses() -> Vec<PressEvent> {
    let up = [3.0, 6.0, 9.0, 12.0].map(|at_s| PressEvent::new(PressTarget::Up, at_s, 0.2));
    let down = [15.0, 18.0, 21.0, 24.0].map(|at_s| PressEvent::new(PressTarget::Down, at_s, 0.2));
    up.into_iter()
        .chain(down)
        .chain(std::iter::once(PressEvent::new(PressTarget::Both, 27.0, 0.5)))
        .collect()
}

/// Simulated rig parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Time every driver call takes [µs]; must be > 0 so time advances.
    #[serde(default = "default_io_latency_us")]
    pub io_latency_us: u64,

    /// Light reading with the vibration removed.
    #[serde(default = "default_light_base")]
    pub light_base: f64,

    /// Vibration amplitude on the light reading.
    #[serde(default = "default_light_amplitude")]
    pub light_amplitude: f64,

    /// Vibration frequency per gear, first gear first [Hz].
    #[serde(default = "default_vibration_hz")]
    pub vibration_hz: [f64; MAX_GEAR as usize],

    /// Output shaft speed at full drive power [rpm].
    #[serde(default = "default_drive_rpm")]
    pub drive_rpm: f64,

    /// Shift motor speed per unit of power [deg/s].
    #[serde(default = "default_shift_deg_per_s_per_power")]
    pub shift_deg_per_s_per_power: f64,

    /// Scripted button presses.
    #[serde(default = "default_presses")]
    pub presses: Vec<PressEvent>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            io_latency_us: default_io_latency_us(),
            light_base: default_light_base(),
            light_amplitude: default_light_amplitude(),
            vibration_hz: default_vibration_hz(),
            drive_rpm: default_drive_rpm(),
            shift_deg_per_s_per_power: default_shift_deg_per_s_per_power(),
            presses: default_presses(),
        }
    }
}

impl SimulationConfig {
    /// Read `[driver_config.simulation]`, falling back to defaults when absent.
    pub fn from_rig(config: &RigConfig) -> Result<Self, HalError> {
        let sim = match config.driver_section(SECTION) {
            Some(section) => Value::try_into::<Self>(section.clone())
                .map_err(|e| HalError::ConfigError(format!("[driver_config.{SECTION}]: {e}")))?,
            None => Self::default(),
        };
        sim.validate()?;
        Ok(sim)
    }

    /// Check parameter ranges.
    pub fn validate(&self) -> Result<(), HalError> {
        if self.io_latency_us == 0 {
            return Err(HalError::ConfigError(
                "io_latency_us must be greater than 0".to_string(),
            ));
        }
        if let Some((gear, hz)) = self
            .vibration_hz
            .iter()
            .enumerate()
            .find(|(_, hz)| !hz.is_finite() || **hz <= 0.0)
        {
            return Err(HalError::ConfigError(format!(
                "vibration_hz for gear {} must be positive, got {hz}",
                gear + 1
            )));
        }
        if !self.drive_rpm.is_finite() || self.drive_rpm < 0.0 {
            return Err(HalError::ConfigError(format!(
                "drive_rpm must be >= 0, got {}",
                self.drive_rpm
            )));
        }
        if !self.shift_deg_per_s_per_power.is_finite() || self.shift_deg_per_s_per_power <= 0.0 {
            return Err(HalError::ConfigError(format!(
                "shift_deg_per_s_per_power must be positive, got {}",
                self.shift_deg_per_s_per_power
            )));
        }
        for (idx, press) in self.presses.iter().enumerate() {
            if !press.at_s.is_finite() || press.at_s < 0.0 {
                return Err(HalError::ConfigError(format!(
                    "presses[{idx}].at_s must be >= 0, got {}",
                    press.at_s
                )));
            }
            if !press.hold_s.is_finite() || press.hold_s <= 0.0 {
                return Err(HalError::ConfigError(format!(
                    "presses[{idx}].hold_s must be positive, got {}",
                    press.hold_s
                )));
            }
        }
        Ok(())
    }
}
