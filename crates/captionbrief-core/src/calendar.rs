//! iCalendar (RFC 5545) encoding of scheduled items.
//!
//! Three document shapes are produced:
//! - a combined `METHOD:PUBLISH` document with every scheduled item,
//! - one `METHOD:PUBLISH` document per item, for hosting or attaching,
//! - one `METHOD:REQUEST` invite per item, addressed to an attendee.
//!
//! Published documents carry local times with a `TZID` parameter and a
//! matching `VTIMEZONE`; invites carry UTC times so any client places them
//! correctly. Items without a schedule are skipped everywhere.
//!
//! Every `encode*` method has an `*_at` variant taking the `DTSTAMP`
//! explicitly, which keeps output deterministic in tests.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};
use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike, Property};

use crate::item::EnrichedItem;
use crate::time::{COMPACT_FORMAT, DEFAULT_TIMEZONE};

/// Default `PRODID` value.
pub const DEFAULT_PROD_ID: &str = "-//Caption Brief//EN";

/// Domain part of every `UID`.
pub const UID_DOMAIN: &str = "captionbrief";

/// The `METHOD` of a calendar document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarMethod {
    /// Informational calendar content.
    Publish,
    /// A meeting request expecting a reply.
    Request,
}

impl CalendarMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Publish => "PUBLISH",
            Self::Request => "REQUEST",
        }
    }
}

/// Organizer and attendee of an invite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteParties {
    /// Organizer email address.
    pub organizer: String,
    /// Attendee email address.
    pub attendee: String,
    /// Optional display name for the organizer.
    pub organizer_name: Option<String>,
}

impl InviteParties {
    pub fn new(organizer: impl Into<String>, attendee: impl Into<String>) -> Self {
        Self {
            organizer: organizer.into(),
            attendee: attendee.into(),
            organizer_name: None,
        }
    }

    #[must_use]
    pub fn with_organizer_name(mut self, name: impl Into<String>) -> Self {
        self.organizer_name = Some(name.into());
        self
    }
}

/// A rendered `VCALENDAR` document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDocument {
    method: CalendarMethod,
    uids: Vec<String>,
    ics: String,
}

impl CalendarDocument {
    pub fn method(&self) -> CalendarMethod {
        self.method
    }

    /// UIDs of the contained events, in order.
    pub fn uids(&self) -> &[String] {
        &self.uids
    }

    /// Returns true if the document has no events.
    pub fn is_empty(&self) -> bool {
        self.uids.is_empty()
    }

    /// Returns the number of events.
    pub fn len(&self) -> usize {
        self.uids.len()
    }

    /// The document text, with CRLF line endings and folded long lines.
    pub fn render(&self) -> &str {
        &self.ics
    }

    /// Renders the document as UTF-8 bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.ics.clone().into_bytes()
    }
}

impl fmt::Display for CalendarDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.ics)
    }
}

/// Encodes enriched items into calendar documents.
#[derive(Debug, Clone)]
pub struct CalendarEncoder {
    tz: Tz,
    prod_id: String,
}

impl Default for CalendarEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}

impl CalendarEncoder {
    /// Creates an encoder for local times in `tz`.
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            prod_id: DEFAULT_PROD_ID.to_string(),
        }
    }

    /// Sets the `PRODID` value.
    #[must_use]
    pub fn with_prod_id(mut self, prod_id: impl Into<String>) -> Self {
        self.prod_id = prod_id.into();
        self
    }

    /// Encodes all scheduled items into one published document.
    pub fn encode(&self, items: &[EnrichedItem]) -> CalendarDocument {
        self.encode_at(items, Utc::now())
    }

    /// Like [`Self::encode`] with a fixed `DTSTAMP`.
    pub fn encode_at(&self, items: &[EnrichedItem], stamp: DateTime<Utc>) -> CalendarDocument {
        let scheduled: Vec<&EnrichedItem> = items.iter().filter(|i| i.is_scheduled()).collect();
        self.document(CalendarMethod::Publish, &scheduled, stamp, None)
    }

    /// Encodes each scheduled item into its own published document, keyed
    /// by [`event_identifier`].
    pub fn encode_each(&self, items: &[EnrichedItem]) -> Vec<(String, CalendarDocument)> {
        self.encode_each_at(items, Utc::now())
    }

    /// Like [`Self::encode_each`] with a fixed `DTSTAMP`.
    pub fn encode_each_at(
        &self,
        items: &[EnrichedItem],
        stamp: DateTime<Utc>,
    ) -> Vec<(String, CalendarDocument)> {
        items
            .iter()
            .filter_map(|item| {
                let id = event_identifier(item)?;
                Some((id, self.document(CalendarMethod::Publish, &[item], stamp, None)))
            })
            .collect()
    }

    /// Encodes each scheduled item into an invite from the organizer to
    /// the attendee.
    pub fn encode_invites(
        &self,
        items: &[EnrichedItem],
        parties: &InviteParties,
    ) -> Vec<(String, CalendarDocument)> {
        self.encode_invites_at(items, parties, Utc::now())
    }

    /// Like [`Self::encode_invites`] with a fixed `DTSTAMP`.
    pub fn encode_invites_at(
        &self,
        items: &[EnrichedItem],
        parties: &InviteParties,
        stamp: DateTime<Utc>,
    ) -> Vec<(String, CalendarDocument)> {
        items
            .iter()
            .filter_map(|item| {
                let id = event_identifier(item)?;
                let doc = self.document(CalendarMethod::Request, &[item], stamp, Some(parties));
                Some((id, doc))
            })
            .collect()
    }

    /// Builds a document from items that all carry a schedule.
    fn document(
        &self,
        method: CalendarMethod,
        items: &[&EnrichedItem],
        stamp: DateTime<Utc>,
        parties: Option<&InviteParties>,
    ) -> CalendarDocument {
        let mut calendar = Calendar::empty();
        calendar
            .append_property(Property::new("VERSION", "2.0"))
            .append_property(Property::new("PRODID", self.prod_id.as_str()))
            .append_property(Property::new("CALSCALE", "GREGORIAN"))
            .append_property(Property::new("METHOD", method.as_str()));

        let mut uids = Vec::with_capacity(items.len());
        for item in items {
            if let Some((uid, event)) = self.event(item, stamp, parties) {
                uids.push(uid);
                calendar.push(event);
            }
        }

        let mut ics = calendar.to_string();
        if parties.is_none()
            && let Some(years) = event_years(items)
            && let Some(at) = ics.find("BEGIN:VEVENT")
        {
            ics.insert_str(at, &vtimezone(&self.tz, years.0 - 1, years.1));
        }

        CalendarDocument { method, uids, ics }
    }

    fn event(
        &self,
        item: &EnrichedItem,
        stamp: DateTime<Utc>,
        parties: Option<&InviteParties>,
    ) -> Option<(String, Event)> {
        let window = item.schedule()?;
        let uid = event_uid(item.shortcode(), window.start);
        let description = format!("{}\n\nPost: {}", item.summary, item.post.url);

        let mut event = Event::new();
        event
            .uid(&uid)
            .timestamp(stamp)
            .summary(&item.event_title)
            .description(&description);

        match parties {
            None => {
                let tzid = self.tz.name().to_string();
                event
                    .starts(CalendarDateTime::WithTimezone {
                        date_time: window.start,
                        tzid: tzid.clone(),
                    })
                    .ends(CalendarDateTime::WithTimezone {
                        date_time: window.end,
                        tzid,
                    });
            }
            Some(parties) => {
                event
                    .starts(CalendarDateTime::Utc(window.start_utc(&self.tz)))
                    .ends(CalendarDateTime::Utc(window.end_utc(&self.tz)));
                add_parties(&mut event, parties);
            }
        }

        if !item.fields.venue_hint.is_empty() {
            event.add_property("LOCATION", item.fields.venue_hint.as_str());
        }
        if !item.post.url.is_empty() {
            event.add_property("URL", item.post.url.as_str());
        }
        Some((uid, event.done()))
    }
}

fn add_parties(event: &mut Event, parties: &InviteParties) {
    let mut organizer = Property::new("ORGANIZER", &format!("mailto:{}", parties.organizer));
    if let Some(name) = &parties.organizer_name {
        organizer.add_parameter("CN", name);
    }
    let attendee = Property::new("ATTENDEE", &format!("mailto:{}", parties.attendee))
        .add_parameter("ROLE", "REQ-PARTICIPANT")
        .add_parameter("PARTSTAT", "NEEDS-ACTION")
        .add_parameter("RSVP", "TRUE")
        .done();
    event
        .append_property(organizer)
        .append_property(attendee)
        .add_property("SEQUENCE", "0")
        .add_property("STATUS", "CONFIRMED");
}

/// Returns the stable identifier of a scheduled item, `{shortcode}-{start}`.
pub fn event_identifier(item: &EnrichedItem) -> Option<String> {
    item.start_at()
        .map(|start| format!("{}-{}", item.shortcode(), start.format(COMPACT_FORMAT)))
}

fn event_uid(shortcode: &str, start: NaiveDateTime) -> String {
    format!("{shortcode}-{}@{UID_DOMAIN}", start.format(COMPACT_FORMAT))
}

/// Returns the file name of the combined calendar for a run date.
pub fn combined_filename(date: NaiveDate) -> String {
    format!("captionbrief-{}.ics", date.format("%Y%m%d"))
}

/// First and last year any of the items start in.
fn event_years(items: &[&EnrichedItem]) -> Option<(i32, i32)> {
    use chrono::Datelike;

    let years = items.iter().filter_map(|i| i.start_at()).map(|s| s.year());
    let (min, max) = years.fold(None, |acc: Option<(i32, i32)>, y| match acc {
        Some((lo, hi)) => Some((lo.min(y), hi.max(y))),
        None => Some((y, y)),
    })?;
    Some((min, max))
}

/// A UTC offset change found in the zone's rules.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Transition {
    /// Local wall-clock time of the change, in the offset before it.
    onset: NaiveDateTime,
    from: i32,
    to: i32,
    name: String,
    daylight: bool,
}

fn offset_seconds(tz: &Tz, utc: NaiveDateTime) -> i32 {
    tz.offset_from_utc_datetime(&utc).fix().local_minus_utc()
}

/// Scans `first_year..=last_year` hour by hour for offset changes and
/// narrows each one down to the minute.
fn transitions(tz: &Tz, first_year: i32, last_year: i32) -> Vec<Transition> {
    let (Some(start), Some(end)) = (
        NaiveDate::from_ymd_opt(first_year, 1, 1),
        NaiveDate::from_ymd_opt(last_year + 1, 1, 1),
    ) else {
        return Vec::new();
    };
    let end = end.and_time(NaiveTime::MIN);
    let mut hour = start.and_time(NaiveTime::MIN);
    let mut offset = offset_seconds(tz, hour);
    let mut found = Vec::new();

    while hour < end {
        let next = hour + Duration::hours(1);
        let next_offset = offset_seconds(tz, next);
        if next_offset != offset {
            let (mut lo, mut hi) = (0i64, 60i64);
            while hi - lo > 1 {
                let mid = (lo + hi) / 2;
                if offset_seconds(tz, hour + Duration::minutes(mid)) == offset {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            let at = hour + Duration::minutes(hi);
            let zone_offset = tz.offset_from_utc_datetime(&at);
            found.push(Transition {
                onset: at + Duration::seconds(i64::from(offset)),
                from: offset,
                to: next_offset,
                name: zone_offset.to_string(),
                daylight: zone_offset.dst_offset() != Duration::zero(),
            });
            offset = next_offset;
        }
        hour = next;
    }
    found
}

fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.unsigned_abs();
    format!("{sign}{:02}{:02}", abs / 3600, abs % 3600 / 60)
}

/// Builds the `VTIMEZONE` block for `tz` covering the given years.
///
/// The calendar crate has no timezone component, so the block is written
/// as plain content lines. Every line is short and free of TEXT escapes.
fn vtimezone(tz: &Tz, first_year: i32, last_year: i32) -> String {
    let mut rules = transitions(tz, first_year, last_year);
    if rules.is_empty() {
        let jan_first = NaiveDate::from_ymd_opt(last_year, 1, 1)
            .unwrap_or_default()
            .and_time(NaiveTime::MIN);
        let offset = offset_seconds(tz, jan_first);
        rules.push(Transition {
            onset: NaiveDateTime::default(),
            from: offset,
            to: offset,
            name: tz.offset_from_utc_datetime(&jan_first).to_string(),
            daylight: false,
        });
    }

    let mut block = format!("BEGIN:VTIMEZONE\r\nTZID:{}\r\n", tz.name());
    for rule in &rules {
        let kind = if rule.daylight { "DAYLIGHT" } else { "STANDARD" };
        block.push_str(&format!(
            "BEGIN:{kind}\r\nDTSTART:{}\r\nTZOFFSETFROM:{}\r\nTZOFFSETTO:{}\r\nTZNAME:{}\r\nEND:{kind}\r\n",
            rule.onset.format(COMPACT_FORMAT),
            format_offset(rule.from),
            format_offset(rule.to),
            rule.name,
        ));
    }
    block.push_str("END:VTIMEZONE\r\n");
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{item, local};
    use crate::item::Importance;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn items() -> Vec<EnrichedItem> {
        vec![
            item("engsoc", "A1", Importance::TimeSensitive, Some(local(2026, 10, 17, 15, 0))),
            item("engsoc", "B2", Importance::Fyi, None),
            item("careers", "C3", Importance::Critical, Some(local(2026, 10, 20, 10, 0))),
        ]
    }

    fn unfolded(ics: &str) -> String {
        ics.replace("\r\n ", "")
    }

    mod encoding {
        use super::*;

        #[test]
        fn escapes_text_values() {
            let mut with_venue = items();
            with_venue[0].fields.venue_hint = "Room 204; Hall, East".to_string();
            let ics = unfolded(CalendarEncoder::default().encode_at(&with_venue, stamp()).render());
            assert!(ics.contains(r"LOCATION:Room 204\; Hall\, East"));
            assert!(ics.contains(r"Summary of A1.\n\nPost: https://www.instagram.com/p/A1/"));
        }

        #[test]
        fn folds_long_lines() {
            let mut long = items();
            long[0].event_title = format!("@engsoc {}", "x".repeat(200));
            let ics = CalendarEncoder::default().encode_at(&long, stamp()).render().to_string();
            assert!(ics.contains("\r\n "));
            assert!(unfolded(&ics).contains(&format!("SUMMARY:@engsoc {}\r\n", "x".repeat(200))));
        }

        #[test]
        fn every_line_ends_with_crlf() {
            let doc = CalendarEncoder::default().encode_at(&items(), stamp());
            assert!(!doc.render().replace("\r\n", "").contains('\n'));
            assert!(doc.render().ends_with("END:VCALENDAR\r\n"));
        }

        #[test]
        fn parses_back() {
            let doc = CalendarEncoder::default().encode_at(&items(), stamp());
            let parsed: Calendar = doc.render().parse().unwrap();
            let uids: Vec<String> = parsed
                .iter()
                .filter_map(|component| match component {
                    icalendar::CalendarComponent::Event(event) => event.get_uid().map(str::to_string),
                    _ => None,
                })
                .collect();
            assert_eq!(uids, doc.uids());
        }
    }

    mod publish {
        use super::*;

        #[test]
        fn combined_document() {
            let doc = CalendarEncoder::default().encode_at(&items(), stamp());
            assert_eq!(doc.len(), 2);
            assert_eq!(doc.method(), CalendarMethod::Publish);
            assert_eq!(
                doc.uids(),
                ["A1-20261017T150000@captionbrief", "C3-20261020T100000@captionbrief"]
            );

            let ics = unfolded(doc.render());
            assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
            assert!(ics.contains("VERSION:2.0\r\n"));
            assert!(ics.contains("PRODID:-//Caption Brief//EN\r\n"));
            assert!(ics.contains("CALSCALE:GREGORIAN\r\n"));
            assert!(ics.contains("METHOD:PUBLISH\r\n"));
            assert!(ics.contains("UID:A1-20261017T150000@captionbrief\r\n"));
            assert!(ics.contains("DTSTAMP:20261016T120000Z\r\n"));
            assert!(ics.contains("DTSTART;TZID=America/Toronto:20261017T150000\r\n"));
            assert!(ics.contains("DTEND;TZID=America/Toronto:20261017T160000\r\n"));
            assert!(ics.contains("SUMMARY:@engsoc — Event (Oct 17"));
            assert!(!ics.contains("B2"));
            assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        }

        #[test]
        fn carries_matching_timezone() {
            let ics = CalendarEncoder::default().encode_at(&items(), stamp()).to_string();
            assert_eq!(ics.matches("BEGIN:VTIMEZONE").count(), 1);
            assert!(ics.contains("TZID:America/Toronto\r\n"));
            assert!(ics.find("END:VTIMEZONE").unwrap() < ics.find("BEGIN:VEVENT").unwrap());
            // 2026 daylight time starts on March 8 and ends on November 1.
            assert!(ics.contains(
                "BEGIN:DAYLIGHT\r\nDTSTART:20260308T020000\r\nTZOFFSETFROM:-0500\r\nTZOFFSETTO:-0400\r\nTZNAME:EDT\r\n"
            ));
            assert!(ics.contains(
                "BEGIN:STANDARD\r\nDTSTART:20261101T020000\r\nTZOFFSETFROM:-0400\r\nTZOFFSETTO:-0500\r\nTZNAME:EST\r\n"
            ));
        }

        #[test]
        fn fixed_offset_zone_has_single_rule() {
            let ics = CalendarEncoder::new(chrono_tz::Asia::Tokyo).encode_at(&items(), stamp()).to_string();
            assert_eq!(ics.matches("BEGIN:STANDARD").count(), 1);
            assert!(!ics.contains("BEGIN:DAYLIGHT"));
            assert!(ics.contains("TZOFFSETFROM:+0900\r\nTZOFFSETTO:+0900\r\n"));
        }

        #[test]
        fn location_only_when_known() {
            let mut with_venue = items();
            with_venue[0].fields.venue_hint = "Room 204".to_string();
            let ics = CalendarEncoder::default().encode_at(&with_venue, stamp()).to_string();
            assert_eq!(ics.matches("LOCATION:").count(), 1);
            assert!(ics.contains("LOCATION:Room 204\r\n"));
        }

        #[test]
        fn no_scheduled_items() {
            let unscheduled = vec![item("a", "X", Importance::Fyi, None)];
            let doc = CalendarEncoder::default().encode_at(&unscheduled, stamp());
            assert!(doc.is_empty());
            assert!(!doc.render().contains("VTIMEZONE"));
            assert!(CalendarEncoder::default().encode_each_at(&unscheduled, stamp()).is_empty());
        }

        #[test]
        fn encode_each_count_matches_scheduled_items() {
            let all = items();
            let each = CalendarEncoder::default().encode_each_at(&all, stamp());
            let scheduled = all.iter().filter(|i| i.is_scheduled()).count();
            assert_eq!(each.len(), scheduled);
            assert_eq!(each[0].0, "A1-20261017T150000");
            assert_eq!(each[1].0, "C3-20261020T100000");
            assert!(each.iter().all(|(_, doc)| doc.len() == 1));
        }

        #[test]
        fn custom_timezone_and_prod_id() {
            let encoder = CalendarEncoder::new(chrono_tz::Europe::Paris).with_prod_id("-//Test//EN");
            let ics = encoder.encode_at(&items(), stamp()).to_string();
            assert!(ics.contains("PRODID:-//Test//EN\r\n"));
            assert!(ics.contains("DTSTART;TZID=Europe/Paris:20261017T150000\r\n"));
            assert!(ics.contains("TZID:Europe/Paris\r\n"));
        }

        #[test]
        fn filename_for_run_date() {
            let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
            assert_eq!(combined_filename(date), "captionbrief-20261016.ics");
        }
    }

    mod invites {
        use super::*;

        #[test]
        fn request_with_utc_times() {
            let parties = InviteParties::new("bot@example.com", "me@example.com");
            let invites = CalendarEncoder::default().encode_invites_at(&items(), &parties, stamp());
            assert_eq!(invites.len(), 2);
            assert_eq!(invites[0].1.method(), CalendarMethod::Request);

            let ics = unfolded(invites[0].1.render());
            assert!(ics.contains("METHOD:REQUEST\r\n"));
            // 15:00 in Toronto during daylight time is 19:00 UTC.
            assert!(ics.contains("DTSTART:20261017T190000Z\r\n"));
            assert!(ics.contains("DTEND:20261017T200000Z\r\n"));
            assert!(ics.contains("ORGANIZER:mailto:bot@example.com\r\n"));

            let attendee = ics.lines().find(|l| l.starts_with("ATTENDEE")).unwrap();
            assert!(attendee.contains(";ROLE=REQ-PARTICIPANT"));
            assert!(attendee.contains(";PARTSTAT=NEEDS-ACTION"));
            assert!(attendee.contains(";RSVP=TRUE"));
            assert!(attendee.ends_with(":mailto:me@example.com"));
            assert!(!ics.contains("TZID"));
            assert!(!ics.contains("VTIMEZONE"));
        }

        #[test]
        fn organizer_name() {
            let parties = InviteParties::new("bot@example.com", "me@example.com")
                .with_organizer_name("Caption Brief");
            let invites = CalendarEncoder::default().encode_invites_at(&items(), &parties, stamp());
            let ics = unfolded(invites[0].1.render());
            let organizer = ics.lines().find(|l| l.starts_with("ORGANIZER")).unwrap();
            assert!(organizer.contains("CN="));
            assert!(organizer.contains("Caption Brief"));
            assert!(organizer.ends_with(":mailto:bot@example.com"));
        }

        #[test]
        fn same_uid_as_published_event() {
            let parties = InviteParties::new("bot@example.com", "me@example.com");
            let encoder = CalendarEncoder::default();
            let invites = encoder.encode_invites_at(&items(), &parties, stamp());
            let each = encoder.encode_each_at(&items(), stamp());
            assert_eq!(invites[0].1.uids(), each[0].1.uids());
        }
    }
}
