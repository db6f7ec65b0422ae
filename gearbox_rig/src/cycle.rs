//! Control loop: sample → shift checks → gear report → analysis.
//!
//! ## Startup
//! 1. Configuration validated; nothing is commanded if it is invalid.
//! 2. `RigDriver::init` (hardware unavailable is fatal here).
//! 3. Illumination on, shift motor brake and hold on.
//! 4. Drive position reset, drive started at the configured power.
//!
//! ## Tick
//! 1. Stop flag / tick budget check.
//! 2. Light capture; speed sample if the interval elapsed.
//! 3. Sensor 1 (upshift) check, then sensor 2 (downshift) check.
//! 4. Gear change report for each shift carried out.
//! 5. Spectral analysis if a shift happened and the window is large enough.
//!
//! A simultaneous press seen during a debounce wait ends the tick at once;
//! nothing else in that tick runs.
//!
//! ## Shutdown
//! Drive idle, shift motor idle, illumination off, `RigDriver::shutdown`.
//! Runs once, also after a failed tick.

use gearbox_common::clock::Clock;
use gearbox_common::config::RigConfig;
use gearbox_common::hal::driver::RigDriver;
use gearbox_common::hal::types::TouchSensor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::RigError;
use crate::observer::RigObserver;
use crate::sampling::{Sampler, SpeedSample};
use crate::shift::{ShiftController, ShiftOutcome};
use crate::spectral::SpectralAnalyzer;
use crate::state::gearbox::{Gear, ShiftDirection, ShiftPlan};
use crate::state::run::{RunState, StopReason};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Per-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CycleStats {
    /// Ticks executed.
    pub ticks: u64,
    /// Shifts carried out.
    pub shifts: u64,
    /// Presses consumed at the end of travel.
    pub limit_presses: u64,
    /// Analysis passes completed.
    pub analyses: u64,
    /// Analysis passes skipped for degenerate input.
    pub skipped_analyses: u64,
    /// Longest tick, including debounce and shift waits.
    pub max_tick: Duration,
}

impl CycleStats {
    /// Record one tick's duration.
    #[inline]
    pub fn record_tick(&mut self, duration: Duration) {
        self.ticks += 1;
        if duration > self.max_tick {
            self.max_tick = duration;
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Speed sample taken this tick.
    pub speed: Option<SpeedSample>,
    /// Shifts carried out, upshift check first.
    pub shifts: Vec<ShiftPlan>,
    /// True if an analysis pass ran (or was attempted and skipped).
    pub analyzed: bool,
    /// Set when the tick ended the run.
    pub stop: Option<StopReason>,
}

/// Outcome of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Why the loop stopped.
    pub reason: StopReason,
    /// Gear at shutdown.
    pub gear: Gear,
    /// Loop counters.
    pub stats: CycleStats,
    /// Sum of completed speed intervals [s].
    pub run_time_s: f64,
    /// Number of speed samples taken.
    pub speed_samples: usize,
}

// ─── Runner ─────────────────────────────────────────────────────────

/// Owns the driver, the controllers and all per-run state.
pub struct RigRunner<D: RigDriver + ?Sized, O: RigObserver> {
    config: RigConfig,
    driver: Box<D>,
    clock: Arc<dyn Clock>,
    observer: O,
    shifter: ShiftController,
    sampler: Sampler,
    analyzer: SpectralAnalyzer,
    state: RunState,
    stats: CycleStats,
    running: Arc<AtomicBool>,
    max_ticks: Option<u64>,
    driver_ready: bool,
}

impl<D: RigDriver + ?Sized, O: RigObserver> RigRunner<D, O> {
    /// Assemble a runner; nothing touches the hardware until [`Self::start`].
    pub fn new(config: RigConfig, driver: Box<D>, clock: Arc<dyn Clock>, observer: O) -> Self {
        Self {
            shifter: ShiftController::from_config(&config),
            sampler: Sampler::new(config.sampler.speed_interval_s),
            analyzer: SpectralAnalyzer::new(config.analyzer.min_samples),
            config,
            driver,
            clock,
            observer,
            state: RunState::Running,
            stats: CycleStats::default(),
            running: Arc::new(AtomicBool::new(true)),
            max_ticks: None,
            driver_ready: false,
        }
    }

    /// Stop after `max_ticks` ticks.
    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Flag that keeps the loop running; clear it to request a stop.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Bring the rig into its running posture.
    ///
    /// The configuration is validated first; an invalid one fails before
    /// the driver is touched.
    pub fn start(&mut self) -> Result<(), RigError> {
        if !self.state.is_running() {
            return Err(RigError::AlreadyStopped);
        }
        if self.driver_ready {
            return Ok(());
        }

        self.config.validate()?;
        self.driver.init(&self.config)?;
        self.driver_ready = true;
        info!(
            "Driver {} v{} ready",
            self.driver.name(),
            self.driver.version()
        );

        self.driver.set_illumination(true)?;
        self.driver.shift_set_brake_hold(true)?;
        self.driver.drive_reset_position()?;
        self.driver.drive_run(self.config.drive.power)?;
        self.sampler.restart(self.clock.as_ref());

        info!(
            "Rig running in gear {} at drive power {}",
            self.shifter.gearbox().gear(),
            self.config.drive.power
        );
        Ok(())
    }

    /// Execute one tick.
    pub fn tick(&mut self) -> Result<TickReport, RigError> {
        let mut report = TickReport::default();
        if !self.state.is_running() {
            report.stop = self.stop_reason();
            return Ok(report);
        }

        if !self.running.load(Ordering::SeqCst) {
            return Ok(self.terminate(report, StopReason::Requested));
        }
        if self.max_ticks.is_some_and(|max| self.stats.ticks >= max) {
            return Ok(self.terminate(report, StopReason::TickLimit));
        }

        let tick_start = self.clock.now();

        report.speed = self.sampler.capture(self.driver.as_mut(), self.clock.as_ref())?;
        if let Some(sample) = &report.speed {
            self.observer.on_speed_sample(sample);
        }

        for sensor in [TouchSensor::Up, TouchSensor::Down] {
            let outcome = self.shifter.check(
                sensor,
                self.driver.as_mut(),
                self.clock.as_ref(),
                &self.running,
            )?;
            match outcome {
                ShiftOutcome::Idle => {}
                ShiftOutcome::Shifted(plan) => {
                    self.stats.shifts += 1;
                    report.shifts.push(plan);
                }
                ShiftOutcome::AtLimit(_) => self.stats.limit_presses += 1,
                ShiftOutcome::BothPressed => {
                    self.stats.record_tick(self.clock.now().saturating_sub(tick_start));
                    return Ok(self.terminate(report, StopReason::BothPressed));
                }
                ShiftOutcome::StopRequested => {
                    self.stats.record_tick(self.clock.now().saturating_sub(tick_start));
                    return Ok(self.terminate(report, StopReason::Requested));
                }
            }
        }

        for plan in &report.shifts {
            self.observer.on_gear_changed(plan);
        }

        if self
            .analyzer
            .is_due(self.sampler.window().len(), !report.shifts.is_empty())
        {
            report.analyzed = true;
            self.analyze();
        }

        self.stats.record_tick(self.clock.now().saturating_sub(tick_start));
        Ok(report)
    }

    /// Start if needed, tick until a stop condition, then shut down.
    ///
    /// A failing tick still runs the shutdown sequence; its error is
    /// returned in preference to any shutdown error.
    pub fn run(&mut self) -> Result<RunSummary, RigError> {
        if let Err(e) = self.start() {
            if !matches!(e, RigError::AlreadyStopped) {
                self.fail(&e);
            }
            return Err(e);
        }

        while self.state.is_running() {
            if let Err(e) = self.tick() {
                self.fail(&e);
                return Err(e);
            }
        }

        self.shutdown()?;
        Ok(self.summary())
    }

    /// Put the rig into its safe posture. Does nothing once stopped.
    ///
    /// Every step is attempted; the first failure is returned.
    pub fn shutdown(&mut self) -> Result<(), RigError> {
        if matches!(self.state, RunState::Stopped(_)) {
            return Ok(());
        }
        self.state.stop(StopReason::Requested);
        if !self.driver_ready {
            return Ok(());
        }
        self.driver_ready = false;

        let steps = [
            ("drive idle", self.driver.drive_idle()),
            ("shift idle", self.driver.shift_idle()),
            ("illumination off", self.driver.set_illumination(false)),
            ("driver shutdown", self.driver.shutdown()),
        ];

        let mut first_error = None;
        for (step, result) in steps {
            if let Err(e) = result {
                warn!("Shutdown step '{step}' failed: {e}");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        info!(
            "Rig stopped ({}) in gear {} after {} ticks",
            self.stop_reason().unwrap_or(StopReason::Requested),
            self.shifter.gearbox().gear(),
            self.stats.ticks
        );

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    // ── Accessors ──

    /// Loop state.
    #[inline]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Loop counters.
    #[inline]
    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Engaged gear.
    #[inline]
    pub fn gear(&self) -> Gear {
        self.shifter.gearbox().gear()
    }

    /// Direction of the last completed shift.
    #[inline]
    pub fn last_shift(&self) -> Option<ShiftDirection> {
        self.shifter.gearbox().last_shift()
    }

    /// Light window and speed history.
    #[inline]
    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// The driver.
    #[inline]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// The observer.
    #[inline]
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Summary of the run so far.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            reason: self.stop_reason().unwrap_or(StopReason::Requested),
            gear: self.gear(),
            stats: self.stats,
            run_time_s: self.sampler.run_time_s(),
            speed_samples: self.sampler.speeds().len(),
        }
    }

    // ── Internals ──

    fn stop_reason(&self) -> Option<StopReason> {
        match self.state {
            RunState::Running => None,
            RunState::Terminating(reason) | RunState::Stopped(reason) => Some(reason),
        }
    }

    fn terminate(&mut self, mut report: TickReport, reason: StopReason) -> TickReport {
        info!("Stopping: {reason}");
        self.state.terminate(reason);
        report.stop = Some(reason);
        report
    }

    /// Analyse and clear the window; a degenerate window is dropped.
    fn analyze(&mut self) {
        let gear = self.shifter.gearbox().gear();
        let (timestamps, light) = self.sampler.take_window();
        match self.analyzer.analyze(gear, timestamps, &light) {
            Ok(report) => {
                self.stats.analyses += 1;
                self.observer.on_analysis(&report);
            }
            Err(e) => {
                self.stats.skipped_analyses += 1;
                warn!("Analysis for gear {gear} skipped: {e}");
            }
        }
    }

    /// Record a fault and run the shutdown sequence.
    fn fail(&mut self, cause: &RigError) {
        error!("Rig fault: {cause}");
        self.state.terminate(StopReason::Fault);
        if let Err(e) = self.shutdown() {
            warn!("Shutdown after fault incomplete: {e}");
        }
    }
}
