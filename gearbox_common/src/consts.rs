//! System-wide constants for the gearbox rig workspace.
//!
//! Single source of truth for gear limits and default tuning values.
//! Imported by all crates; do not duplicate these values elsewhere.

use static_assertions::const_assert_eq;

/// Lowest selectable gear.
pub const MIN_GEAR: u8 = 1;

/// Highest selectable gear.
pub const MAX_GEAR: u8 = 5;

/// Number of adjacent gear pairs (1↔2, 2↔3, 3↔4, 4↔5).
pub const GEAR_PAIRS: usize = 4;

const_assert_eq!(GEAR_PAIRS, (MAX_GEAR - MIN_GEAR) as usize);

/// Default shift angle per gear pair [degrees].
pub const DEFAULT_SHIFT_DEGREES: [f64; GEAR_PAIRS] = [120.0, 105.0, 110.0, 100.0];

/// Default extra travel when the shift direction reverses [degrees].
pub const DEFAULT_BACKLASH_DEGREES: f64 = 20.0;

/// Default shift motor power magnitude [%].
pub const DEFAULT_SHIFT_POWER: i8 = 30;

/// Default drive motor power [%]. Negative runs the output shaft forward on the reference rig.
pub const DEFAULT_DRIVE_POWER: i8 = -100;

/// Default speed measurement interval [s].
pub const DEFAULT_SPEED_INTERVAL_S: f64 = 1.0;

/// Spectral analysis runs only when the window holds more than this many samples.
pub const DEFAULT_MIN_SAMPLES: usize = 100;

/// Confirmation tone frequency [Hz].
pub const DEFAULT_TONE_HZ: u32 = 1200;

/// Confirmation tone duration [ms].
pub const DEFAULT_TONE_MS: u32 = 200;

/// Conversion from degrees per second to revolutions per minute.
pub const DEG_PER_S_TO_RPM: f64 = 60.0 / 360.0;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/rig.toml";
