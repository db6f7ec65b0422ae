//! # Gearbox Rig Library
//!
//! Control loop for a two-motor gearbox test rig: a drive motor turns the
//! output shaft continuously, a shift motor selects one of five gears, two
//! touch sensors request upshift and downshift, and a light sensor picks up
//! the rig's vibration. After every gear change the light signal collected
//! in the previous gear is turned into a power spectrum.
//!
//! ## Modules
//!
//! - [`state`] - Gear selection state machine and loop lifecycle
//! - [`shift`] - Debounced touch sensor handling and shift motor actuation
//! - [`sampling`] - Light window and drive speed measurement
//! - [`spectral`] - Power spectrum of the light window
//! - [`cycle`] - The run loop tying everything together
//! - [`observer`] - Event sink for speed, gear and spectrum reports
//! - [`driver_registry`] / [`drivers`] - Driver lookup and the simulation rig
//!
//! ## Single Thread
//!
//! Debounce waits and shift motor waits block the loop. Sampling pauses
//! with them, and the spectral analyzer estimates its sampling rate from
//! the median gap so those pauses do not skew it.

pub mod cycle;
pub mod driver_registry;
pub mod drivers;
pub mod error;
pub mod observer;
pub mod sampling;
pub mod shift;
pub mod spectral;
pub mod state;

pub use cycle::{CycleStats, RigRunner, RunSummary, TickReport};
pub use error::RigError;
pub use observer::{RecordingObserver, RigObserver, TracingObserver};
