//! Time source for note timestamps.

use time::{Duration, OffsetDateTime};

/// Supplies the current time to the store.
pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Drops seconds and sub-second precision.
///
/// # Examples
///
/// ```
/// use cnote::clock::truncate_to_minute;
/// use time::macros::datetime;
///
/// assert_eq!(
///     truncate_to_minute(datetime!(2024-05-01 10:42:59.5 UTC)),
///     datetime!(2024-05-01 10:42 UTC)
/// );
/// ```
pub fn truncate_to_minute(t: OffsetDateTime) -> OffsetDateTime {
    t - Duration::seconds(i64::from(t.second())) - Duration::nanoseconds(i64::from(t.nanosecond()))
}
