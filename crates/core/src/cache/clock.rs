//! Time source for cache freshness decisions.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Debug;

/// Clock abstraction so TTL boundaries can be tested without sleeping.
pub trait Clock: Send + Sync + Debug {
    /// Current time in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock using system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Storage format for `cached_at`.
///
/// Fixed microsecond precision with a `Z` suffix keeps lexicographic order
/// equal to chronological order, which the freshness queries rely on.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
