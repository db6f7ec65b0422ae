//! Motor models for the simulated rig.
//!
//! - Drive motor: constant speed proportional to power, no inertia
//! - Shift motor: one move at a time, duration = degrees / speed
//!
//! All times are seconds since driver init.

use gearbox_common::hal::types::ShiftHandle;

/// Degrees per second at 1 rpm.
const RPM_TO_DEG_PER_S: f64 = 360.0 / 60.0;

/// Output shaft drive motor.
#[derive(Debug, Clone)]
pub struct DriveMotor {
    rpm_at_full_power: f64,
    power: i8,
    /// Position folded in at `since_s`.
    settled_deg: f64,
    since_s: f64,
}

impl DriveMotor {
    /// Stopped motor at position 0.
    pub fn new(rpm_at_full_power: f64) -> Self {
        Self {
            rpm_at_full_power,
            power: 0,
            settled_deg: 0.0,
            since_s: 0.0,
        }
    }

    /// Signed speed at the current power [deg/s].
    #[inline]
    pub fn speed_deg_per_s(&self) -> f64 {
        self.rpm_at_full_power * f64::from(self.power) / 100.0 * RPM_TO_DEG_PER_S
    }

    /// Current power.
    #[inline]
    pub fn power(&self) -> i8 {
        self.power
    }

    /// Position at `now_s` [degrees].
    pub fn position(&self, now_s: f64) -> f64 {
        self.settled_deg + self.speed_deg_per_s() * (now_s - self.since_s)
    }

    /// Change power at `now_s`; 0 coasts to an immediate stop.
    pub fn set_power(&mut self, power: i8, now_s: f64) {
        self.settled_deg = self.position(now_s);
        self.since_s = now_s;
        self.power = power;
    }

    /// Zero the position counter at `now_s`.
    pub fn reset_position(&mut self, now_s: f64) {
        self.settled_deg = 0.0;
        self.since_s = now_s;
    }
}

/// A shift motor move in flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftMove {
    /// Ticket handed to the caller.
    pub handle: ShiftHandle,
    /// Signed power the move was issued with.
    pub power: i8,
    /// Commanded travel [degrees].
    pub degrees: f64,
    /// Completion time.
    pub ends_at_s: f64,
}

/// Gear selection motor.
#[derive(Debug, Clone)]
pub struct ShiftMotor {
    deg_per_s_per_power: f64,
    next_handle: u32,
    pending: Option<ShiftMove>,
    brake_hold: bool,
}

impl ShiftMotor {
    /// Idle motor.
    pub fn new(deg_per_s_per_power: f64) -> Self {
        Self {
            deg_per_s_per_power,
            next_handle: 1,
            pending: None,
            brake_hold: false,
        }
    }

    /// Start a move at `now_s`. A move still in flight is superseded.
    ///
    /// Zero power never completes.
    pub fn start(&mut self, degrees: f64, power: i8, now_s: f64) -> ShiftMove {
        let speed = f64::from(power.unsigned_abs()) * self.deg_per_s_per_power;
        let duration = if speed > 0.0 {
            degrees.abs() / speed
        } else {
            f64::INFINITY
        };
        let handle = ShiftHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        let shift = ShiftMove {
            handle,
            power,
            degrees,
            ends_at_s: now_s + duration,
        };
        self.pending = Some(shift);
        shift
    }

    /// Move in flight for `handle`.
    pub fn pending(&self, handle: ShiftHandle) -> Option<ShiftMove> {
        self.pending.filter(|m| m.handle == handle)
    }

    /// Mark the move for `handle` done.
    pub fn finish(&mut self, handle: ShiftHandle) -> Option<ShiftMove> {
        match self.pending {
            Some(m) if m.handle == handle => self.pending.take(),
            _ => None,
        }
    }

    /// Drop any move in flight and release the brake.
    pub fn idle(&mut self) {
        self.pending = None;
        self.brake_hold = false;
    }

    /// Brake and position hold state.
    #[inline]
    pub fn brake_hold(&self) -> bool {
        self.brake_hold
    }

    /// Engage or release the brake.
    #[inline]
    pub fn set_brake_hold(&mut self, hold: bool) {
        self.brake_hold = hold;
    }
}
