//! Run loop observers.
//!
//! The loop reports speed samples, gear changes and analysis results
//! through [`RigObserver`]. [`TracingObserver`] logs them; the
//! [`RecordingObserver`] keeps them in memory for tests and post-run
//! inspection. A pair of observers fans out to both.

use tracing::info;

use crate::sampling::SpeedSample;
use crate::spectral::AnalysisReport;
use crate::state::gearbox::ShiftPlan;

/// Receives run loop events. All methods default to no-ops.
pub trait RigObserver {
    /// A drive speed measurement completed.
    fn on_speed_sample(&mut self, _sample: &SpeedSample) {}

    /// A shift was carried out this tick.
    fn on_gear_changed(&mut self, _plan: &ShiftPlan) {}

    /// A spectral analysis pass completed.
    fn on_analysis(&mut self, _report: &AnalysisReport) {}
}

impl<O: RigObserver + ?Sized> RigObserver for &mut O {
    fn on_speed_sample(&mut self, sample: &SpeedSample) {
        (**self).on_speed_sample(sample);
    }

    fn on_gear_changed(&mut self, plan: &ShiftPlan) {
        (**self).on_gear_changed(plan);
    }

    fn on_analysis(&mut self, report: &AnalysisReport) {
        (**self).on_analysis(report);
    }
}

impl<A: RigObserver, B: RigObserver> RigObserver for (A, B) {
    fn on_speed_sample(&mut self, sample: &SpeedSample) {
        self.0.on_speed_sample(sample);
        self.1.on_speed_sample(sample);
    }

    fn on_gear_changed(&mut self, plan: &ShiftPlan) {
        self.0.on_gear_changed(plan);
        self.1.on_gear_changed(plan);
    }

    fn on_analysis(&mut self, report: &AnalysisReport) {
        self.0.on_analysis(report);
        self.1.on_analysis(report);
    }
}

/// Logs every event at `info`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RigObserver for TracingObserver {
    fn on_speed_sample(&mut self, sample: &SpeedSample) {
        info!("Speed {:.1} rpm at {:.2}s", sample.rpm, sample.time_s);
    }

    fn on_gear_changed(&mut self, plan: &ShiftPlan) {
        info!("Gear {}", plan.to);
    }

    fn on_analysis(&mut self, report: &AnalysisReport) {
        let peak = report
            .dominant_frequency()
            .map(|f| format!("{f:.2} Hz"))
            .unwrap_or_else(|| "none".to_string());
        info!(
            "Spectrum for gear {}: {} samples at {:.1} Hz, peak {}",
            report.gear,
            report.centered.len(),
            report.sampling_hz,
            peak
        );
    }
}

/// Keeps every event.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    /// Speed samples in arrival order.
    pub speeds: Vec<SpeedSample>,
    /// Completed shifts in order.
    pub shifts: Vec<ShiftPlan>,
    /// Analysis passes in order.
    pub analyses: Vec<AnalysisReport>,
}

impl RecordingObserver {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RigObserver for RecordingObserver {
    fn on_speed_sample(&mut self, sample: &SpeedSample) {
        self.speeds.push(*sample);
    }

    fn on_gear_changed(&mut self, plan: &ShiftPlan) {
        self.shifts.push(*plan);
    }

    fn on_analysis(&mut self, report: &AnalysisReport) {
        self.analyses.push(report.clone());
    }
}
