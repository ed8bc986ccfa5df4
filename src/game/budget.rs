use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Remaining thinking time for one side.
///
/// Kept in microseconds so that many short moves add up exactly as one long
/// one would; reported in whole milliseconds. The remainder is signed:
/// charging past zero is recorded rather than clamped, and callers check
/// `is_exhausted` right after `charge`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TimeBudget {
    remaining_us: i64,
}

impl TimeBudget {
    pub fn from_millis(ms: i64) -> Self {
        Self {
            remaining_us: ms.saturating_mul(1_000),
        }
    }

    /// Whole milliseconds left, rounded down (an overdraft of 1 µs reads -1)
    pub fn remaining_ms(&self) -> i64 {
        self.remaining_us.div_euclid(1_000)
    }

    /// Deduct time spent on a move; returns the new remainder in milliseconds
    pub fn charge(&mut self, elapsed: Duration) -> i64 {
        let elapsed_us = i64::try_from(elapsed.as_micros()).unwrap_or(i64::MAX);
        self.remaining_us = self.remaining_us.saturating_sub(elapsed_us);
        self.remaining_ms()
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining_us < 0
    }

    /// Time the side may still spend, zero once exhausted
    pub fn allowance(&self) -> Duration {
        Duration::from_micros(self.remaining_us.max(0) as u64)
    }
}

impl fmt::Display for TimeBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ms", self.remaining_ms())
    }
}
