//! Rig state machines.
//!
//! - [`gearbox`] - Gear, last shift direction, backlash-compensated angles
//! - [`run`] - Control loop lifecycle

pub mod gearbox;
pub mod run;
