//! Rig driver trait and error types.
//!
//! This module defines:
//! - `RigDriver` trait - Interface for pluggable rig drivers (motors, sensors, tone)
//! - `HalError` enum - Error types for HAL operations
//! - `DriverFactory` type alias - Factory function type

use crate::clock::Clock;
use crate::config::RigConfig;
use crate::hal::types::{ShiftHandle, TouchSensor};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Error types for HAL operations.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Driver initialization failed (hardware unavailable).
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Hardware communication error
    #[error("Hardware communication error: {0}")]
    CommunicationError(String),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Shift motor did not report completion in time
    #[error("Shift {handle} did not complete within {timeout:?}")]
    Timeout {
        /// Move that timed out.
        handle: ShiftHandle,
        /// Configured limit.
        timeout: Duration,
    },
}

/// Factory function type for creating driver instances.
///
/// The clock is the one the control loop runs on; drivers use it for
/// shift timeouts and, in simulation, to model I/O latency.
pub type DriverFactory = fn(Arc<dyn Clock>) -> Box<dyn RigDriver>;

/// Trait defining the interface for rig drivers.
///
/// The rig controller manages the hardware exclusively through this trait,
/// enabling pluggable backends (simulation, brick over USB, etc.).
///
/// # Lifecycle
///
/// 1. `init()` - Called once before the control loop starts
/// 2. Motor / sensor / tone calls - Issued from the single control thread
/// 3. `shutdown()` - Called after the rig has been put into its safe state
///
/// # Blocking Contracts
///
/// | Operation | Blocks | Notes |
/// |-----------|--------|-------|
/// | `init()` | Yes | May take seconds to find the brick |
/// | `shift_wait()` | Yes | Until the move completes or `timeout` expires |
/// | everything else | No | One I/O round trip |
///
/// Drivers are owned by the control thread; no `Sync` bound is required.
pub trait RigDriver: Send {
    /// Returns the driver's unique identifier (e.g., "simulation").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Initialize the driver with the rig configuration.
    ///
    /// # Errors
    /// Return `HalError::InitFailed` if the hardware cannot be reached.
    fn init(&mut self, config: &RigConfig) -> Result<(), HalError>;

    /// Graceful shutdown of the driver (close connections, release resources).
    fn shutdown(&mut self) -> Result<(), HalError>;

    // ── Drive motor ──

    /// Run the drive motor continuously at `power` [-100, 100].
    fn drive_run(&mut self, power: i8) -> Result<(), HalError>;

    /// Let the drive motor coast.
    fn drive_idle(&mut self) -> Result<(), HalError>;

    /// Zero the drive motor's position counter.
    fn drive_reset_position(&mut self) -> Result<(), HalError>;

    /// Signed drive motor angle since the last reset [degrees].
    fn drive_position(&mut self) -> Result<f64, HalError>;

    // ── Shift motor ──

    /// Start turning the shift motor by `degrees` at `power`.
    ///
    /// The sign of `power` selects the direction; `degrees` is a magnitude.
    fn shift_turn(&mut self, degrees: f64, power: i8) -> Result<ShiftHandle, HalError>;

    /// Block until the move identified by `handle` completes.
    ///
    /// `None` waits forever.
    ///
    /// # Errors
    /// Returns `HalError::Timeout` if `timeout` expires first.
    fn shift_wait(
        &mut self,
        handle: ShiftHandle,
        timeout: Option<Duration>,
    ) -> Result<(), HalError>;

    /// Engage or release the shift motor's brake and position hold.
    fn shift_set_brake_hold(&mut self, hold: bool) -> Result<(), HalError>;

    /// Let the shift motor coast, releasing brake and hold.
    fn shift_idle(&mut self) -> Result<(), HalError>;

    // ── Sensors ──

    /// Current state of a touch sensor.
    fn is_pressed(&mut self, sensor: TouchSensor) -> Result<bool, HalError>;

    /// Current light sensor reading (raw lightness units).
    fn light_level(&mut self) -> Result<f64, HalError>;

    /// Switch the light sensor's LED.
    fn set_illumination(&mut self, on: bool) -> Result<(), HalError>;

    // ── Feedback ──

    /// Fire-and-forget tone.
    fn play_tone(&mut self, frequency_hz: u32, duration_ms: u32) -> Result<(), HalError>;
}
