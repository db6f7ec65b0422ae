//! Simulation driver module.
//!
//! This module provides a software rig for development and testing
//! without the brick: motor models, a scripted rider and a light sensor
//! whose vibration frequency depends on the engaged gear.

mod config;
mod driver;
mod physics;
mod script;

pub use config::SimulationConfig;
pub use driver::SimulationDriver;
pub use physics::{DriveMotor, ShiftMotor, ShiftMove};
pub use script::{PressEvent, PressScript, PressTarget};

use gearbox_common::clock::Clock;
use gearbox_common::hal::driver::RigDriver;
use std::sync::Arc;

/// Factory function to create a simulation driver instance.
pub fn create_driver(clock: Arc<dyn Clock>) -> Box<dyn RigDriver> {
    Box::new(SimulationDriver::new(clock))
}
