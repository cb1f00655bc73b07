//! Date mention detection and resolution.
//!
//! Recognised forms:
//! - `Oct 17`, `October 17th`, `Oct. 17, 2026`
//! - `17 Oct`, `17th of October 2026`
//! - `2026-10-17`
//! - `10/17`, `10/17/26`, `10/17/2026` (month first)
//! - `today`, `tonight`, `tomorrow`, `tmrw`, `tmr`
//! - `friday`, `this friday`, `next friday`
//!
//! Mentions without a year resolve to the occurrence nearest to `today`.
//! A lowercase `may` is read as the verb unless a year follows it, and a
//! `1/2` followed by a word like `price` or `off` is a fraction.

use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use regex::Regex;

const MONTH_NAMES: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

static MONTH_DAY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTH_NAMES})\b\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}})\b)?"
    ))
    .expect("Invalid month-day regex")
});

static DAY_MONTH_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({MONTH_NAMES})\b\.?(?:,?\s+(\d{{4}})\b)?"
    ))
    .expect("Invalid day-month regex")
});

static ISO_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("Invalid ISO date regex")
});

static NUMERIC_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})/(\d{1,2})(?:/(\d{4}|\d{2}))?\b").expect("Invalid numeric date regex")
});

/// Words that make a preceding `M/D` a fraction rather than a date.
const FRACTION_WORDS: &[&str] = &[
    "price", "prices", "priced", "off", "discount", "portion", "portions", "share", "size",
];

static RELATIVE_DAY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(today|tonight|tomorrow|tmrw|tmr)\b").expect("Invalid relative day regex")
});

static WEEKDAY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:(this|next)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
    .expect("Invalid weekday regex")
});

/// A resolved date and the byte offset where it was mentioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateMention {
    pub date: NaiveDate,
    pub offset: usize,
}

/// Finds every resolvable date mention in `text`, in order of appearance.
///
/// Mentions that name an impossible date (`Feb 30`, `13/45`) are dropped.
pub fn find_dates(text: &str, today: NaiveDate) -> Vec<DateMention> {
    let mut mentions = Vec::new();
    let mut month_day_spans = Vec::new();

    for caps in MONTH_DAY_REGEX.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        month_day_spans.push(whole.range());
        let year = caps.get(3).and_then(|y| y.as_str().parse::<i32>().ok());
        if is_modal_may(&caps[1], year) {
            continue;
        }
        let month = month_number(&caps[1]);
        let day = caps[2].parse::<u32>().ok();
        if let (Some(month), Some(day)) = (month, day)
            && let Some(date) = resolve(year, month, day, today)
        {
            mentions.push(DateMention { date, offset: whole.start() });
        }
    }

    for caps in DAY_MONTH_REGEX.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        // "Oct 17 Nov 3" must not also yield "17 Nov".
        if month_day_spans
            .iter()
            .any(|span| span.start < whole.end() && whole.start() < span.end)
        {
            continue;
        }
        let year = caps.get(3).and_then(|y| y.as_str().parse::<i32>().ok());
        if is_modal_may(&caps[2], year) {
            continue;
        }
        let day = caps[1].parse::<u32>().ok();
        let month = month_number(&caps[2]);
        if let (Some(month), Some(day)) = (month, day)
            && let Some(date) = resolve(year, month, day, today)
        {
            mentions.push(DateMention { date, offset: whole.start() });
        }
    }

    for caps in ISO_DATE_REGEX.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let parts = (
            caps[1].parse::<i32>(),
            caps[2].parse::<u32>(),
            caps[3].parse::<u32>(),
        );
        if let (Ok(year), Ok(month), Ok(day)) = parts
            && let Some(date) = NaiveDate::from_ymd_opt(year, month, day)
        {
            mentions.push(DateMention { date, offset: whole.start() });
        }
    }

    for caps in NUMERIC_DATE_REGEX.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if caps.get(3).is_none() && is_fraction(&text[whole.end()..]) {
            continue;
        }
        let month = caps[1].parse::<u32>().ok();
        let day = caps[2].parse::<u32>().ok();
        let year = caps.get(3).and_then(|y| {
            let raw = y.as_str();
            let value: i32 = raw.parse().ok()?;
            Some(if raw.len() == 2 { 2000 + value } else { value })
        });
        if let (Some(month), Some(day)) = (month, day)
            && let Some(date) = resolve(year, month, day, today)
        {
            mentions.push(DateMention { date, offset: whole.start() });
        }
    }

    for caps in RELATIVE_DAY_REGEX.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let ahead = match caps[1].to_lowercase().as_str() {
            "today" | "tonight" => 0,
            _ => 1,
        };
        if let Some(date) = today.checked_add_days(Days::new(ahead)) {
            mentions.push(DateMention { date, offset: whole.start() });
        }
    }

    for caps in WEEKDAY_REGEX.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let strictly_after = caps
            .get(1)
            .is_some_and(|m| m.as_str().eq_ignore_ascii_case("next"));
        if let Ok(weekday) = caps[2].parse::<Weekday>()
            && let Some(date) = next_weekday(today, weekday, strictly_after)
        {
            mentions.push(DateMention { date, offset: whole.start() });
        }
    }

    mentions.sort_by_key(|m| m.offset);
    mentions
}

/// Picks the date an event most likely refers to.
///
/// Returns the earliest mention on or after `today`; if every mention is in
/// the past, the most distant past one.
pub fn pick_date(mentions: &[DateMention], today: NaiveDate) -> Option<NaiveDate> {
    let upcoming = mentions.iter().map(|m| m.date).filter(|d| *d >= today).min();
    upcoming.or_else(|| mentions.iter().map(|m| m.date).min())
}

/// Returns true if `text` contains anything shaped like a date.
pub fn has_date_expression(text: &str) -> bool {
    MONTH_DAY_REGEX.is_match(text)
        || DAY_MONTH_REGEX.is_match(text)
        || ISO_DATE_REGEX.is_match(text)
        || NUMERIC_DATE_REGEX.is_match(text)
        || RELATIVE_DAY_REGEX.is_match(text)
        || WEEKDAY_REGEX.is_match(text)
}

/// `may` in lowercase without a year is far more often the verb.
fn is_modal_may(month: &str, year: Option<i32>) -> bool {
    year.is_none() && month.eq_ignore_ascii_case("may") && month.starts_with('m')
}

fn is_fraction(rest: &str) -> bool {
    let word: String = rest
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_lowercase();
    FRACTION_WORDS.contains(&word.as_str())
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn resolve(year: Option<i32>, month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    match year {
        Some(year) => NaiveDate::from_ymd_opt(year, month, day),
        None => nearest_occurrence(month, day, today),
    }
}

/// Picks the year for a month/day pair so the date lands nearest to `today`.
/// Ties go to the future.
fn nearest_occurrence(month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
    let year = today.year();
    [year - 1, year, year + 1]
        .into_iter()
        .filter_map(|y| NaiveDate::from_ymd_opt(y, month, day))
        .min_by_key(|d| ((*d - today).num_days().abs(), *d < today))
}

fn next_weekday(today: NaiveDate, weekday: Weekday, strictly_after: bool) -> Option<NaiveDate> {
    let current = today.weekday().num_days_from_monday();
    let target = weekday.num_days_from_monday();
    let mut ahead = (target + 7 - current) % 7;
    if ahead == 0 && strictly_after {
        ahead = 7;
    }
    today.checked_add_days(Days::new(u64::from(ahead)))
}
