//! Time source for due-date maths.
//!
//! Due dates are stored as naive `YYYY-MM-DD HH:MM:SS` strings in the site's
//! local offset, but every comparison happens on absolute instants.

use chrono::{Datelike, Duration, NaiveDateTime, Offset, TimeZone};

use crate::types::*;

/// Storage format for `next_due_at`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Last year [`DATETIME_FORMAT`] renders without a sign.
const MAX_YEAR: i32 = 9999;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Site timezone used when rendering stored timestamps.
    fn offset(&self) -> FixedOffset;

    /// Render an instant in site-local time using [`DATETIME_FORMAT`].
    fn format(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.offset())
            .format(DATETIME_FORMAT)
            .to_string()
    }

    /// Parse a stored site-local timestamp back into an instant.
    fn parse(&self, raw: &str) -> Option<DateTime<Utc>> {
        let naive = NaiveDateTime::parse_from_str(raw.trim(), DATETIME_FORMAT).ok()?;
        self.offset()
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Wall clock with a configured site offset.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Clock pinned to a single instant. Used by tests and dry runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    at: DateTime<Utc>,
    offset: FixedOffset,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { at, offset }
    }

    pub fn utc(at: DateTime<Utc>) -> Self {
        Self::new(at, Utc.fix())
    }

    /// Move the pinned instant forward (or back, for negative spans).
    pub fn advance(&mut self, by: Duration) {
        self.at += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.at
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// `from + days * 86400s`, or `None` once the result leaves the four-digit
/// years the stored timestamp format can round-trip.
pub fn days_after(from: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    let due = days
        .checked_mul(SECONDS_PER_DAY)
        .and_then(Duration::try_seconds)
        .and_then(|span| from.checked_add_signed(span))?;
    (1..=MAX_YEAR).contains(&due.year()).then_some(due)
}
