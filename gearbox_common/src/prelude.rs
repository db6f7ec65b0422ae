//! Prelude module for common re-exports.
//!
//! Consumers can do `use gearbox_common::prelude::*;` and get the most
//! important types without listing individual paths.

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, RigConfig};

// ─── Gear Limits ────────────────────────────────────────────────────
pub use crate::consts::{GEAR_PAIRS, MAX_GEAR, MIN_GEAR};

// ─── Hardware ───────────────────────────────────────────────────────
pub use crate::hal::driver::{DriverFactory, HalError, RigDriver};
pub use crate::hal::types::{ShiftHandle, TouchSensor};

// ─── Time ───────────────────────────────────────────────────────────
pub use crate::clock::{Clock, MonotonicClock, VirtualClock};
