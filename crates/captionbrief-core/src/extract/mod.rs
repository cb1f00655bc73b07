//! Event field extraction from normalized caption text.
//!
//! Every detector is independent, takes the first match it finds and
//! falls back to an empty value. Nothing here can fail.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use captionbrief_core::extract::extract;
//!
//! let now = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap().and_hms_opt(8, 0, 0).unwrap();
//! let fields = extract("Workshop tomorrow at 3pm in Room 204", "engsoc", now);
//! assert_eq!(fields.date_hint, "Oct 17");
//! assert_eq!(fields.time_hint, "15:00");
//! assert_eq!(fields.venue_hint, "Room 204");
//! ```

pub mod dates;

use std::sync::LazyLock;

use chrono::{NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::classify::IMPORTANCE_RULES;
use crate::item::EventFields;
use crate::summarize::CALL_TO_ACTION_KEYWORDS;
use crate::time::EventWindow;

pub use dates::{DateMention, find_dates, has_date_expression, pick_date};

/// Regex for 12-hour clock times (`3pm`, `10:30 am`).
pub(crate) static TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?::(\d{2}))?\s?(am|pm)\b").expect("Invalid time regex")
});

/// Venue keywords, in priority order for matches at the same position.
pub const VENUE_KEYWORDS: &[&str] = &[
    r"room\s?[a-z]?\d{1,4}",
    "hall",
    "auditorium",
    "center",
    "centre",
    "building",
    "lab",
    "theatre",
    "theater",
    "atrium",
    "lobby",
    "boat",
    "cruise",
    "field",
    "gym",
    "court",
    "campus",
];

/// Capitalised words that never name a venue, on top of the call-to-action
/// and importance keywords.
const VENUE_PREFIX_STOPWORDS: &[&str] =
    &["at", "in", "the", "our", "to", "come", "meet", "visit", "see", "head", "find"];

/// Regex for a venue keyword, optionally preceded by one capitalised word.
static VENUE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let keywords = VENUE_KEYWORDS.join("|");
    Regex::new(&format!(r"(?:\b([A-Z][A-Za-z'&-]*)\s+)?\b((?i:{keywords}))\b"))
        .expect("Invalid venue regex")
});

/// Regex for prices in dollars or the word `free`.
static PRICE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\$|\bCAD\s?)\s?\d{1,3}(?:,\d{3})*(?:\.\d{2})?|\bfree\b")
        .expect("Invalid price regex")
});

/// Regex for email addresses.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}").expect("Invalid email regex")
});

/// Regex for http(s) URLs.
static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("Invalid URL regex"));

/// Regex for "link in bio" style pointers.
static LINK_IN_BIO_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:link\s+in\s+(?:our\s+|my\s+|the\s+)?bio|see\s+bio|bio\s+link)\b")
        .expect("Invalid link-in-bio regex")
});

/// Extracts event fields from normalized text.
///
/// `now` is the local wall-clock time of the run and anchors relative
/// dates such as `tomorrow` or `friday`.
pub fn extract(text: &str, account: &str, now: NaiveDateTime) -> EventFields {
    let today = now.date();
    let date = pick_date(&find_dates(text, today), today);
    let time = find_time(text);

    let fields = EventFields {
        date_hint: date.map(|d| d.format("%b %d").to_string()).unwrap_or_default(),
        time_hint: time.map(|t| t.format("%H:%M").to_string()).unwrap_or_default(),
        venue_hint: find_venue(text).unwrap_or_default(),
        price_hint: find_price(text).unwrap_or_default(),
        contact_hint: find_email(text).unwrap_or_default(),
        url_found: find_url(text).unwrap_or_default(),
        link_in_bio: LINK_IN_BIO_REGEX.is_match(text),
        schedule: date.map(|d| EventWindow::on_date(d, time)),
    };

    tracing::trace!(
        account = %account,
        date = %fields.date_hint,
        time = %fields.time_hint,
        venue = %fields.venue_hint,
        "Extracted event fields"
    );

    fields
}

/// Returns the first clock time in `text`, converted to 24-hour time.
///
/// Only the first match is considered; if it is out of range there is no
/// time at all.
pub fn find_time(text: &str) -> Option<NaiveTime> {
    let caps = TIME_REGEX.captures(text)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = match caps.get(2) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    if !(1..=12).contains(&hour) {
        return None;
    }
    let hour = match (caps[3].to_ascii_lowercase().as_str(), hour) {
        ("am", 12) => 0,
        ("pm", h) if h != 12 => h + 12,
        (_, h) => h,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Returns the first venue phrase.
///
/// A leading capitalised word is kept as part of the name (`Main Hall`)
/// unless it is an imperative or keyword such as `Join` or `Tickets`.
pub fn find_venue(text: &str) -> Option<String> {
    let caps = VENUE_REGEX.captures(text)?;
    let keep_prefix = caps.get(1).is_some_and(|prefix| !is_venue_stopword(prefix.as_str()));
    let found = if keep_prefix { caps.get(0) } else { caps.get(2) };
    found.map(|m| m.as_str().to_string())
}

fn is_venue_stopword(word: &str) -> bool {
    let lowered = word.to_lowercase();
    VENUE_PREFIX_STOPWORDS.contains(&lowered.as_str())
        || CALL_TO_ACTION_KEYWORDS.contains(&lowered.as_str())
        || IMPORTANCE_RULES
            .iter()
            .any(|rule| rule.keywords.contains(&lowered.as_str()))
}

/// Returns the first price, with any spelling of `free` normalized to `Free`.
pub fn find_price(text: &str) -> Option<String> {
    let found = PRICE_REGEX.find(text)?.as_str();
    if found.eq_ignore_ascii_case("free") {
        Some("Free".to_string())
    } else {
        Some(found.to_string())
    }
}

/// Returns the first email address.
pub fn find_email(text: &str) -> Option<String> {
    EMAIL_REGEX.find(text).map(|m| m.as_str().to_string())
}

/// Returns the first URL with trailing punctuation removed.
pub fn find_url(text: &str) -> Option<String> {
    URL_REGEX
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', ')', ']']))
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}
