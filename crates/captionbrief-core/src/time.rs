//! Time types for extracted events.
//!
//! This module provides [`EventWindow`], the resolved start/end pair of an
//! event found in a caption. Both ends are local wall-clock times in the
//! configured timezone; conversion to absolute time only happens where a
//! consumer needs it (invites, calendar links).

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Length of an extracted event in minutes. Captions rarely state a duration.
pub const DEFAULT_EVENT_MINUTES: i64 = 60;

/// Hour of day used when a caption names a date but no clock time.
pub const DEFAULT_START_HOUR: u32 = 9;

/// Timezone used when none is configured.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Toronto;

/// Compact local timestamp layout used by calendar documents and links.
pub const COMPACT_FORMAT: &str = "%Y%m%dT%H%M%S";

/// The resolved time span of an extracted event.
///
/// Holding both ends in one value guarantees that an item either has a
/// start and an end, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventWindow {
    /// Local wall-clock start.
    pub start: NaiveDateTime,
    /// Local wall-clock end.
    pub end: NaiveDateTime,
}

impl EventWindow {
    /// Creates a window of the default duration starting at `start`.
    pub fn starting_at(start: NaiveDateTime) -> Self {
        Self {
            start,
            end: start + Duration::minutes(DEFAULT_EVENT_MINUTES),
        }
    }

    /// Creates a window on `date`, at `time` or at the default start hour.
    pub fn on_date(date: NaiveDate, time: Option<NaiveTime>) -> Self {
        let time = time.unwrap_or_else(default_start_time);
        Self::starting_at(date.and_time(time))
    }

    /// Returns the length of the window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns the start as an absolute instant in the given zone.
    pub fn start_utc(&self, tz: &Tz) -> DateTime<Utc> {
        local_to_utc(self.start, tz)
    }

    /// Returns the end as an absolute instant in the given zone.
    pub fn end_utc(&self, tz: &Tz) -> DateTime<Utc> {
        local_to_utc(self.end, tz)
    }
}

fn default_start_time() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_START_HOUR, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Converts a local wall-clock time in `tz` to UTC.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times
/// inside a DST gap do not exist and are shifted forward by one hour.
pub fn local_to_utc(local: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => tz
            .from_local_datetime(&(local + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| local.and_utc()),
    }
}

/// Returns the local wall-clock time in `tz` for the instant `now`.
pub fn local_now(now: DateTime<Utc>, tz: &Tz) -> NaiveDateTime {
    now.with_timezone(tz).naive_local()
}

/// Parses an IANA timezone name (e.g. `America/Toronto`).
pub fn parse_timezone(name: &str) -> Option<Tz> {
    name.trim().parse().ok()
}
