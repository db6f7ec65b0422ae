//! HAL I/O identifiers and handles.
//!
//! - `TouchSensor` - The two shift request buttons
//! - `ShiftHandle` - Ticket for an in-flight shift motor move

use serde::{Deserialize, Serialize};
use std::fmt;

/// Touch sensor identifier.
///
/// Sensor 1 requests an upshift, sensor 2 a downshift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TouchSensor {
    /// Sensor port 1, upshift request.
    Up,
    /// Sensor port 2, downshift request.
    Down,
}

impl TouchSensor {
    /// The opposing sensor, watched during a debounce wait.
    #[inline]
    pub const fn other(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// Physical sensor port number on the brick.
    #[inline]
    pub const fn port(self) -> u8 {
        match self {
            Self::Up => 1,
            Self::Down => 2,
        }
    }
}

impl fmt::Display for TouchSensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "touch_{} (up)", self.port()),
            Self::Down => write!(f, "touch_{} (down)", self.port()),
        }
    }
}

/// Handle for a shift motor move issued via `RigDriver::shift_turn`.
///
/// Handles are issued in increasing order by the driver and consumed by
/// `RigDriver::shift_wait`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShiftHandle(pub u32);

impl fmt::Display for ShiftHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shift#{}", self.0)
    }
}
