//! Light signal power spectrum.
//!
//! One pass over a sample window:
//! 1. Subtract the mean (removes the 0 Hz component that would dominate).
//! 2. Sampling frequency = 1 / median of successive timestamp gaps; the
//!    loop has no fixed period, and the median ignores the long gaps left
//!    by shifts and debounce waits.
//! 3. Real-input DFT, one-sided: ⌊N/2⌋ + 1 bins.
//! 4. Power = |X[k]|².
//! 5. Frequency axis = bins spaced evenly over [0, fs/2] inclusive.
//!
//! The axis in step 5 spans Nyquist with `bins - 1` steps, so its spacing is
//! `fs / (2 * (bins - 1))` instead of the exact `fs / N`. For odd N the two
//! differ slightly; the approximation is kept so results stay comparable
//! with earlier runs of the rig.

use rustfft::FftPlanner;
use rustfft::num_complex::Complex64;
use std::fmt;
use thiserror::Error;

use crate::state::gearbox::Gear;

/// Errors from a single analysis pass.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Not enough samples to estimate a sampling interval.
    #[error("need at least {required} samples, got {len}")]
    TooFewSamples {
        /// Samples available.
        len: usize,
        /// Samples required.
        required: usize,
    },

    /// Timestamp and light buffers differ in length.
    #[error("{timestamps} timestamps but {light} light readings")]
    LengthMismatch {
        /// Timestamp count.
        timestamps: usize,
        /// Light reading count.
        light: usize,
    },

    /// Median sample interval is zero, negative or not finite.
    #[error("degenerate median sample interval {0}s")]
    DegenerateTiming(f64),
}

/// One-sided power spectrum.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpectrumResult {
    /// Bin frequencies, ascending from 0 to Nyquist [Hz].
    pub frequencies: Vec<f64>,
    /// Power per bin.
    pub power: Vec<f64>,
}

impl SpectrumResult {
    /// Number of bins.
    #[inline]
    pub fn len(&self) -> usize {
        self.power.len()
    }

    /// True if there are no bins.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Spacing of the frequency axis [Hz].
    pub fn bin_width(&self) -> f64 {
        match self.frequencies.as_slice() {
            [first, second, ..] => second - first,
            _ => 0.0,
        }
    }

    /// Highest-power bin above DC as `(frequency, power)`.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.frequencies
            .iter()
            .zip(&self.power)
            .skip(1)
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(f, p)| (*f, *p))
    }
}

/// Everything one analysis pass produced, handed to observers.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// Gear engaged after the shift that triggered the pass.
    pub gear: Gear,
    /// Sample times of the analysed window [s].
    pub timestamps: Vec<f64>,
    /// Mean-centred light readings.
    pub centered: Vec<f64>,
    /// Estimated sampling frequency [Hz].
    pub sampling_hz: f64,
    /// Power spectrum of `centered`.
    pub spectrum: SpectrumResult,
}

impl AnalysisReport {
    /// Strongest non-DC frequency [Hz].
    pub fn dominant_frequency(&self) -> Option<f64> {
        self.spectrum.peak().map(|(f, _)| f)
    }
}

/// Runs power spectrum passes; keeps FFT plans between passes.
pub struct SpectralAnalyzer {
    min_samples: usize,
    planner: FftPlanner<f64>,
}

impl fmt::Debug for SpectralAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpectralAnalyzer")
            .field("min_samples", &self.min_samples)
            .finish()
    }
}

impl SpectralAnalyzer {
    /// Analyzer that runs once the window holds more than `min_samples`.
    pub fn new(min_samples: usize) -> Self {
        Self {
            min_samples,
            planner: FftPlanner::new(),
        }
    }

    /// Window size threshold.
    #[inline]
    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// A pass is due after a shift once the window exceeds the threshold.
    #[inline]
    pub fn is_due(&self, window_len: usize, shifted: bool) -> bool {
        shifted && window_len > self.min_samples
    }

    /// Analyse one window.
    pub fn analyze(
        &mut self,
        gear: Gear,
        timestamps: Vec<f64>,
        light: &[f64],
    ) -> Result<AnalysisReport, AnalysisError> {
        if timestamps.len() != light.len() {
            return Err(AnalysisError::LengthMismatch {
                timestamps: timestamps.len(),
                light: light.len(),
            });
        }
        if light.len() < 2 {
            return Err(AnalysisError::TooFewSamples {
                len: light.len(),
                required: 2,
            });
        }

        let offset = mean(light);
        let centered: Vec<f64> = light.iter().map(|l| l - offset).collect();

        let mut gaps: Vec<f64> = timestamps.windows(2).map(|w| w[1] - w[0]).collect();
        let interval = median(&mut gaps).unwrap_or(0.0);
        if !interval.is_finite() || interval <= 0.0 {
            return Err(AnalysisError::DegenerateTiming(interval));
        }
        let sampling_hz = 1.0 / interval;

        let power = self.power_spectrum(&centered);
        let frequencies: Vec<f64> = linspace(0.0, 1.0, power.len())
            .into_iter()
            .map(|x| x * sampling_hz / 2.0)
            .collect();

        Ok(AnalysisReport {
            gear,
            timestamps,
            centered,
            sampling_hz,
            spectrum: SpectrumResult { frequencies, power },
        })
    }

    /// |X[k]|² for k in 0..=N/2 of a real signal.
    pub fn power_spectrum(&mut self, signal: &[f64]) -> Vec<f64> {
        let n = signal.len();
        if n == 0 {
            return Vec::new();
        }
        let fft = self.planner.plan_fft_forward(n);
        let mut buffer: Vec<Complex64> = signal.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        fft.process(&mut buffer);
        buffer.truncate(n / 2 + 1);
        buffer.iter().map(|c| c.norm_sqr()).collect()
    }
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Median, averaging the middle pair for even counts. Sorts `values` in place.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// `n` evenly spaced values from `start` to `stop` inclusive.
///
/// A single point is `start`.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}
