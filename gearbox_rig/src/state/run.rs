//! Control loop lifecycle: Running → Terminating → Stopped.
//!
//! Stopped is terminal; there is no restart.

use std::fmt;

/// Why the loop left `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Both touch sensors seen pressed during a debounce wait.
    BothPressed,
    /// External stop request (signal handler).
    Requested,
    /// Tick budget from the command line exhausted.
    TickLimit,
    /// A driver call failed or the shift motor timed out.
    Fault,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BothPressed => write!(f, "both sensors pressed"),
            Self::Requested => write!(f, "stop requested"),
            Self::TickLimit => write!(f, "tick limit reached"),
            Self::Fault => write!(f, "fault"),
        }
    }
}

/// Run loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Ticking.
    #[default]
    Running,
    /// Stop condition seen; shutdown sequence pending.
    Terminating(StopReason),
    /// Actuators idle, illumination off.
    Stopped(StopReason),
}

impl RunState {
    /// True while ticks may still execute.
    #[inline]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Enter `Terminating`. Ignored unless currently `Running`.
    pub fn terminate(&mut self, reason: StopReason) {
        if self.is_running() {
            *self = Self::Terminating(reason);
        }
    }

    /// Enter `Stopped`, keeping the first recorded reason.
    pub fn stop(&mut self, fallback: StopReason) {
        let reason = match *self {
            Self::Running => fallback,
            Self::Terminating(reason) | Self::Stopped(reason) => reason,
        };
        *self = Self::Stopped(reason);
    }
}
