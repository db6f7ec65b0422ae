//! Gear selection state: current gear, last shift direction, shift angles.
//!
//! Gear moves by exactly one position per shift and never leaves
//! [`MIN_GEAR`, `MAX_GEAR`]. Reversing the shift direction adds the
//! backlash offset to the commanded angle.
//!
//! The machine is pure state; actuator calls live in `crate::shift`.

use gearbox_common::config::GearboxConfig;
use gearbox_common::consts::{GEAR_PAIRS, MAX_GEAR, MIN_GEAR};
use std::fmt;

/// Engaged gear, always within [`MIN_GEAR`, `MAX_GEAR`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Gear(u8);

impl Gear {
    /// First gear, the assumed position at startup.
    pub const FIRST: Self = Self(MIN_GEAR);
    /// Top gear.
    pub const TOP: Self = Self(MAX_GEAR);

    /// Validate a gear number.
    pub const fn new(number: u8) -> Option<Self> {
        if number >= MIN_GEAR && number <= MAX_GEAR {
            Some(Self(number))
        } else {
            None
        }
    }

    /// Gear number (1-based).
    #[inline]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Next gear up, `None` at top gear.
    #[inline]
    pub const fn up(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    /// Next gear down, `None` in first gear.
    #[inline]
    pub const fn down(self) -> Option<Self> {
        Self::new(self.0.saturating_sub(1))
    }
}

impl Default for Gear {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for Gear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shift direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftDirection {
    /// Toward a higher gear.
    Up,
    /// Toward a lower gear.
    Down,
}

impl ShiftDirection {
    /// Signed shift motor power; negative turns toward higher gears.
    #[inline]
    pub const fn motor_power(self, magnitude: i8) -> i8 {
        match self {
            Self::Up => -magnitude,
            Self::Down => magnitude,
        }
    }

    /// True if shifting this way after `last` reverses direction.
    ///
    /// No previous shift is not a reversal.
    #[inline]
    pub fn reverses(self, last: Option<ShiftDirection>) -> bool {
        matches!(last, Some(prev) if prev != self)
    }
}

impl fmt::Display for ShiftDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Shift motor travel per adjacent gear pair, indexed by the lower gear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftTable {
    degrees: [f64; GEAR_PAIRS],
}

impl ShiftTable {
    /// Build from per-pair angles (1↔2, 2↔3, 3↔4, 4↔5).
    pub const fn new(degrees: [f64; GEAR_PAIRS]) -> Self {
        Self { degrees }
    }

    /// Travel between `lower` and the gear above it.
    ///
    /// `lower` is never top gear when called from a planned shift; top gear
    /// clamps to the last pair.
    #[inline]
    pub fn degrees_above(&self, lower: Gear) -> f64 {
        let idx = usize::from(lower.number() - MIN_GEAR).min(GEAR_PAIRS - 1);
        self.degrees[idx]
    }
}

/// A shift that has been accepted and must be carried out by the actuator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftPlan {
    /// Direction of travel.
    pub direction: ShiftDirection,
    /// Gear before the shift.
    pub from: Gear,
    /// Gear after the shift.
    pub to: Gear,
    /// Table travel for the gear pair [degrees].
    pub table_degrees: f64,
    /// Backlash added on reversal, 0 otherwise [degrees].
    pub backlash_degrees: f64,
}

impl ShiftPlan {
    /// Total commanded shift motor travel [degrees].
    #[inline]
    pub fn degrees(&self) -> f64 {
        self.table_degrees + self.backlash_degrees
    }
}

/// Outcome of a shift request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShiftDecision {
    /// Shift accepted.
    Shift(ShiftPlan),
    /// Already at the end of travel; press consumed, nothing changes.
    AtLimit(Gear),
}

/// Gear and last-shift-direction state for one gearbox.
#[derive(Debug, Clone)]
pub struct GearboxStateMachine {
    gear: Gear,
    last_shift: Option<ShiftDirection>,
    table: ShiftTable,
    backlash_degrees: f64,
}

impl GearboxStateMachine {
    /// Start in first gear with no shift history.
    pub fn new(table: ShiftTable, backlash_degrees: f64) -> Self {
        Self {
            gear: Gear::FIRST,
            last_shift: None,
            table,
            backlash_degrees,
        }
    }

    /// Build from the `[gearbox]` config section.
    pub fn from_config(config: &GearboxConfig) -> Self {
        Self::new(ShiftTable::new(config.shift_degrees), config.backlash_degrees)
    }

    /// Currently engaged gear.
    #[inline]
    pub fn gear(&self) -> Gear {
        self.gear
    }

    /// Direction of the last completed shift.
    #[inline]
    pub fn last_shift(&self) -> Option<ShiftDirection> {
        self.last_shift
    }

    /// Evaluate a shift request without changing state.
    pub fn plan(&self, direction: ShiftDirection) -> ShiftDecision {
        let target = match direction {
            ShiftDirection::Up => self.gear.up(),
            ShiftDirection::Down => self.gear.down(),
        };
        let Some(to) = target else {
            return ShiftDecision::AtLimit(self.gear);
        };

        let lower = self.gear.min(to);
        let backlash_degrees = if direction.reverses(self.last_shift) {
            self.backlash_degrees
        } else {
            0.0
        };

        ShiftDecision::Shift(ShiftPlan {
            direction,
            from: self.gear,
            to,
            table_degrees: self.table.degrees_above(lower),
            backlash_degrees,
        })
    }

    /// Accept a shift request: the gear moves now, before the actuator runs.
    ///
    /// The last direction is only recorded by [`Self::complete_shift`], so an
    /// aborted move does not change backlash compensation.
    pub fn begin_shift(&mut self, direction: ShiftDirection) -> ShiftDecision {
        let decision = self.plan(direction);
        if let ShiftDecision::Shift(plan) = decision {
            self.gear = plan.to;
        }
        decision
    }

    /// Record that the actuator finished `plan`.
    pub fn complete_shift(&mut self, plan: &ShiftPlan) {
        self.last_shift = Some(plan.direction);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
