//! Light signal window and drive speed sampling.
//!
//! Every tick appends `(time, light)` to the window. Once the current speed
//! interval exceeds its threshold, the drive position delta is converted to
//! rpm, the position counter is zeroed and a new interval starts.
//!
//! Timestamps are `run_time + time since interval start`, where `run_time`
//! is the sum of all completed intervals. The short gap between reading the
//! interval length and restarting the interval clock is not accounted for.

use gearbox_common::clock::Clock;
use gearbox_common::consts::DEG_PER_S_TO_RPM;
use gearbox_common::hal::driver::{HalError, RigDriver};
use tracing::trace;

/// One drive speed measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedSample {
    /// End of the measurement interval [s since loop start].
    pub time_s: f64,
    /// Output shaft speed, always non-negative [rpm].
    pub rpm: f64,
}

/// Parallel timestamp / light reading buffers.
///
/// Both sequences always have the same length; timestamps strictly increase
/// as long as the clock advances between ticks.
#[derive(Debug, Clone, Default)]
pub struct SampleWindow {
    timestamps: Vec<f64>,
    light: Vec<f64>,
}

impl SampleWindow {
    /// Empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample.
    #[inline]
    pub fn push(&mut self, time_s: f64, light: f64) {
        self.timestamps.push(time_s);
        self.light.push(light);
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// True if no samples are held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Sample times [s].
    #[inline]
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Light readings.
    #[inline]
    pub fn light(&self) -> &[f64] {
        &self.light
    }

    /// Move both sequences out, leaving the window empty.
    pub fn take(&mut self) -> (Vec<f64>, Vec<f64>) {
        (
            std::mem::take(&mut self.timestamps),
            std::mem::take(&mut self.light),
        )
    }

    /// Drop all samples.
    pub fn clear(&mut self) {
        self.timestamps.clear();
        self.light.clear();
    }
}

/// Per-tick light capture and interval-based speed measurement.
#[derive(Debug, Clone)]
pub struct Sampler {
    window: SampleWindow,
    speeds: Vec<SpeedSample>,
    speed_interval_s: f64,
    run_time_s: f64,
    interval_start_s: f64,
}

impl Sampler {
    /// New sampler; call [`Self::restart`] when the drive starts.
    pub fn new(speed_interval_s: f64) -> Self {
        Self {
            window: SampleWindow::new(),
            speeds: Vec::new(),
            speed_interval_s,
            run_time_s: 0.0,
            interval_start_s: 0.0,
        }
    }

    /// Start the first interval now.
    pub fn restart(&mut self, clock: &dyn Clock) {
        self.run_time_s = 0.0;
        self.interval_start_s = clock.now_secs();
    }

    /// Record this tick's light reading and, if the interval elapsed, a speed sample.
    pub fn capture<D: RigDriver + ?Sized>(
        &mut self,
        driver: &mut D,
        clock: &dyn Clock,
    ) -> Result<Option<SpeedSample>, HalError> {
        let interval_s = clock.now_secs() - self.interval_start_s;
        let time_s = self.run_time_s + interval_s;
        let light = driver.light_level()?;
        self.window.push(time_s, light);
        trace!("sample t={time_s:.4}s light={light:.2}");

        if interval_s <= self.speed_interval_s {
            return Ok(None);
        }

        let position = driver.drive_position()?;
        let sample = SpeedSample {
            time_s: self.run_time_s + interval_s,
            rpm: (position / interval_s).abs() * DEG_PER_S_TO_RPM,
        };
        self.speeds.push(sample);
        self.run_time_s += interval_s;
        driver.drive_reset_position()?;
        self.interval_start_s = clock.now_secs();
        Ok(Some(sample))
    }

    /// Current light window.
    #[inline]
    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    /// Hand the window to the analyzer and start a fresh one.
    pub fn take_window(&mut self) -> (Vec<f64>, Vec<f64>) {
        self.window.take()
    }

    /// All speed samples of the run.
    #[inline]
    pub fn speeds(&self) -> &[SpeedSample] {
        &self.speeds
    }

    /// Sum of completed speed intervals [s].
    #[inline]
    pub fn run_time_s(&self) -> f64 {
        self.run_time_s
    }
}
