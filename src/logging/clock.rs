//! Wall-clock access and day-boundary arithmetic.
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

/// Source of the current time.
///
/// Every date the logger derives (file names, record timestamps, retention
/// ages, rotation deadlines) reads this clock.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync {
    /// Return the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl fmt::Debug for dyn Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock").finish_non_exhaustive()
    }
}

/// Return the UTC calendar day of `now`.
#[must_use]
pub fn utc_day(now: DateTime<Utc>) -> NaiveDate {
    now.date_naive()
}

/// Return the time remaining until the next UTC midnight after `now`.
///
/// The result is always positive: at exactly midnight it is one full day.
/// The boundary is computed from the calendar, not by adding a fixed period,
/// so it stays correct when the clock is adjusted between calls.
#[must_use]
pub fn next_midnight_delay(now: DateTime<Utc>) -> Duration {
    let next_day = utc_day(now)
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc());
    let Some(midnight) = next_day else {
        return Duration::from_secs(86_400);
    };
    (midnight - now)
        .max(TimeDelta::milliseconds(1))
        .to_std()
        .unwrap_or(Duration::from_millis(1))
}
