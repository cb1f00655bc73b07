//! Shared builders for unit tests.

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::item::{EnrichedItem, EventFields, Importance, RawPost};
use crate::time::EventWindow;

pub(crate) fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

/// Builds an item with the given tier and optional start time.
pub(crate) fn item(
    account: &str,
    shortcode: &str,
    importance: Importance,
    start: Option<NaiveDateTime>,
) -> EnrichedItem {
    let post = RawPost::new(
        account,
        shortcode,
        format!("https://www.instagram.com/p/{shortcode}/"),
        Utc.with_ymd_and_hms(2026, 10, 15, 18, 0, 0).unwrap(),
    );
    let schedule = start.map(EventWindow::starting_at);
    let fields = EventFields {
        date_hint: start
            .map(|s| s.format("%b %d").to_string())
            .unwrap_or_default(),
        time_hint: start
            .map(|s| s.format("%H:%M").to_string())
            .unwrap_or_default(),
        schedule,
        ..Default::default()
    };
    let when = match start {
        Some(s) => format!(" ({})", s.format("%b %d, %H:%M")),
        None => String::new(),
    };
    EnrichedItem {
        post,
        summary: format!("Summary of {shortcode}."),
        importance,
        fields,
        event_title: format!("@{account} — Event{when}"),
    }
}
