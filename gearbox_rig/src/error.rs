//! Rig controller error type.
//!
//! Boundary presses and the simultaneous-press stop are not errors; they are
//! reported through `ShiftOutcome` and `StopReason`.

use gearbox_common::config::ConfigError;
use gearbox_common::hal::driver::HalError;
use std::time::Duration;
use thiserror::Error;

use crate::state::gearbox::Gear;

/// Errors that end a rig run.
#[derive(Debug, Clone, Error)]
pub enum RigError {
    /// A driver call failed (including hardware unavailable at init).
    #[error("hardware error: {0}")]
    Hardware(#[from] HalError),

    /// Configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Shift motor did not finish a move within the configured limit.
    ///
    /// The gear state already reflects `to`.
    #[error("shift {from} -> {to} did not complete within {timeout:?}")]
    ShiftTimeout {
        /// Gear before the move.
        from: Gear,
        /// Gear the move was heading for.
        to: Gear,
        /// Configured limit.
        timeout: Duration,
    },

    /// `run()` or `start()` called on a loop that already stopped.
    #[error("run loop already stopped")]
    AlreadyStopped,
}
