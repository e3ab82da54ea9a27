use serde::{Deserialize, Serialize};

use crate::F;

/// Simulated time in seconds since the Unix epoch.
pub type Time = f64;

pub const SECONDS_PER_DAY: F = 86_400.0;

/// Closed interval `[start, end]` of simulated time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: Time,
    pub end: Time,
}

impl TimeSpan {
    pub fn new(start: Time, end: Time) -> Self {
        debug_assert!(start <= end, "inverted span [{start}, {end}]");
        Self { start, end }
    }

    pub fn contains(&self, t: Time) -> bool {
        self.start <= t && t <= self.end
    }

    /// Smallest span holding both `self` and `other`.
    pub fn union(self, other: TimeSpan) -> TimeSpan {
        TimeSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn duration(&self) -> Time {
        self.end - self.start
    }

    /// Elapsed days from the start of the span to `t`.
    pub fn days_since_start(&self, t: Time) -> F {
        (t - self.start) / SECONDS_PER_DAY
    }
}
