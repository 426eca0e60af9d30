use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

// ---------------------------------------------------------------------------
// SimTime
// ---------------------------------------------------------------------------

/// Integer-nanosecond simulation clock value.
///
/// Host step times are converted to `SimTime` once at the boundary so the
/// sub-step clock can advance in exact integer increments.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SimTime {
    nanos: u64,
}

impl SimTime {
    pub const ZERO: Self = Self { nanos: 0 };

    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Create a `SimTime` from seconds. Negative inputs clamp to zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_secs(secs: f64) -> Self {
        Self {
            nanos: (secs.max(0.0) * NANOS_PER_SEC).round() as u64,
        }
    }

    #[must_use]
    pub const fn nanos(&self) -> u64 {
        self.nanos
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn secs_f64(&self) -> f64 {
        self.nanos as f64 / NANOS_PER_SEC
    }

    /// Time elapsed since `earlier`. Zero if `earlier` is ahead.
    #[must_use]
    pub const fn elapsed_since(&self, earlier: Self) -> Duration {
        Duration::from_nanos(self.nanos.saturating_sub(earlier.nanos))
    }
}

impl Add<Duration> for SimTime {
    type Output = Self;

    #[allow(clippy::cast_possible_truncation)]
    fn add(self, rhs: Duration) -> Self {
        Self {
            nanos: self.nanos.saturating_add(rhs.as_nanos() as u64),
        }
    }
}

impl AddAssign<Duration> for SimTime {
    fn add_assign(&mut self, rhs: Duration) {
        *self = *self + rhs;
    }
}

impl Sub for SimTime {
    type Output = Duration;

    /// Saturating: never underflows.
    fn sub(self, rhs: Self) -> Duration {
        self.elapsed_since(rhs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.nanos / 1_000_000_000;
        let remaining_nanos = self.nanos % 1_000_000_000;
        let millis = remaining_nanos / 1_000_000;
        let micros = (remaining_nanos % 1_000_000) / 1_000;
        write!(f, "{total_secs}.{millis:03}{micros:03}s")
    }
}

// ---------------------------------------------------------------------------
// SubstepClock
// ---------------------------------------------------------------------------

/// Fixed-increment clock that trails the host time.
///
/// `last_tick` only ever moves forward by whole `delta` increments, so after
/// any number of host steps `last_tick - origin` is an exact multiple of
/// `delta`. The remainder `now - last_tick` (always `< delta` after draining)
/// carries over to the next host step.
#[derive(Debug, Clone)]
pub struct SubstepClock {
    last_tick: SimTime,
    delta: Duration,
}

impl SubstepClock {
    /// Create a clock whose first tick is due at `start + delta`.
    ///
    /// A zero `delta` is bumped to one nanosecond so the clock always
    /// terminates.
    pub fn new(start: SimTime, delta: Duration) -> Self {
        Self {
            last_tick: start,
            delta: delta.max(Duration::from_nanos(1)),
        }
    }

    /// Returns `true` if a full `delta` has elapsed since the last tick at
    /// host time `now`. Does not advance the clock.
    pub fn is_due(&self, now: SimTime) -> bool {
        now.elapsed_since(self.last_tick) >= self.delta
    }

    /// Advance the last tick by exactly one `delta`.
    pub fn tick(&mut self) {
        self.last_tick += self.delta;
    }

    /// Number of ticks due at `now`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn pending(&self, now: SimTime) -> u64 {
        (now.elapsed_since(self.last_tick).as_nanos() / self.delta.as_nanos()) as u64
    }

    /// Advance the last tick by `ticks` whole increments at once.
    #[allow(clippy::cast_possible_truncation)]
    pub fn skip(&mut self, ticks: u64) {
        let nanos = self.delta.as_nanos() as u64;
        self.last_tick = SimTime::from_nanos(
            self.last_tick
                .nanos()
                .saturating_add(ticks.saturating_mul(nanos)),
        );
    }

    pub const fn last_tick(&self) -> SimTime {
        self.last_tick
    }

    pub const fn delta(&self) -> Duration {
        self.delta
    }

    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Change the increment. Already elapsed ticks keep their old spacing.
    pub fn set_delta(&mut self, delta: Duration) {
        self.delta = delta.max(Duration::from_nanos(1));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
