//! HTML digest rendering.
//!
//! Styles are inlined since most email clients drop `<style>` blocks.

use std::fmt::Write as _;

use super::{DigestOptions, EMPTY_DIGEST, PARTIAL_FAILURE_NOTICE, TierSection, facts};
use crate::calendar::event_identifier;
use crate::item::EnrichedItem;
use crate::text::html_escape;
use crate::time::COMPACT_FORMAT;

const GOOGLE_CALENDAR_URL: &str = "https://calendar.google.com/calendar/render";

/// Builds an "add to Google Calendar" template link for a scheduled item.
///
/// Times are passed as local wall-clock values with a `ctz` zone so Google
/// resolves them the same way the digest displays them.
pub fn google_calendar_link(item: &EnrichedItem, options: &DigestOptions) -> Option<String> {
    let window = item.schedule()?;
    let details = format!("{}\n\n{}", item.summary, item.post.url);
    let mut link = format!(
        "{GOOGLE_CALENDAR_URL}?action=TEMPLATE&text={}&dates={}/{}&details={}&location={}&ctz={}",
        urlencoding::encode(&item.event_title),
        window.start.format(COMPACT_FORMAT),
        window.end.format(COMPACT_FORMAT),
        urlencoding::encode(&details),
        urlencoding::encode(&item.fields.venue_hint),
        urlencoding::encode(options.timezone.name()),
    );
    if let Some(authuser) = options.gcal_authuser.as_deref().filter(|a| !a.is_empty()) {
        let _ = write!(link, "&authuser={}", urlencoding::encode(authuser));
    }
    Some(link)
}

/// Returns the hosted `.ics` URL for a scheduled item, if hosting is set up.
fn hosted_ics_link(item: &EnrichedItem, options: &DigestOptions) -> Option<String> {
    let base = options.ics_base_url.as_deref()?;
    let id = event_identifier(item)?;
    Some(format!("{base}/{id}.ics"))
}

pub(super) fn render(sections: &[TierSection<'_>], options: &DigestOptions) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"></head>\n");
    out.push_str(
        "<body style=\"font-family:-apple-system,Segoe UI,Helvetica,Arial,sans-serif;\
         color:#222;max-width:680px;margin:0 auto;padding:16px;\">\n",
    );
    let _ = writeln!(out, "<h1 style=\"font-size:22px;\">{}</h1>", html_escape(&options.heading()));

    if options.partial_failure {
        let _ = writeln!(
            out,
            "<div style=\"background:#fff4e5;border-left:4px solid #d68910;padding:8px 12px;\
             margin-bottom:16px;\">{}</div>",
            html_escape(PARTIAL_FAILURE_NOTICE)
        );
    }

    if sections.is_empty() {
        let _ = writeln!(out, "<p style=\"color:#666;\">{}</p>", html_escape(EMPTY_DIGEST));
    }

    for section in sections {
        let _ = writeln!(
            out,
            "<h2 style=\"font-size:18px;color:{};\">{} ({})</h2>",
            section.tier.accent_color(),
            html_escape(section.tier.label()),
            section.items.len()
        );
        for item in &section.items {
            render_item(item, options, &mut out);
        }
    }

    out.push_str("</body>\n</html>\n");
    out
}

fn render_item(item: &EnrichedItem, options: &DigestOptions, out: &mut String) {
    let accent = item.importance.accent_color();
    let _ = writeln!(
        out,
        "<div style=\"border-left:4px solid {accent};padding:8px 12px;margin-bottom:12px;\">"
    );
    let _ = writeln!(
        out,
        "<h3 style=\"font-size:16px;margin:0 0 4px;\">{} \
         <span style=\"font-size:12px;color:{accent};\">{}</span></h3>",
        html_escape(&item.event_title),
        html_escape(item.importance.label())
    );

    let facts = facts(item);
    if !facts.is_empty() {
        out.push_str("<ul style=\"margin:4px 0;padding-left:18px;\">\n");
        for (label, value) in &facts {
            let _ = writeln!(out, "<li><b>{label}:</b> {}</li>", html_escape(value));
        }
        out.push_str("</ul>\n");
    }

    let _ = writeln!(out, "<p style=\"margin:4px 0;\">{}</p>", html_escape(&item.summary));

    let mut links = vec![format!(
        "<a href=\"{}\">View post</a>",
        html_escape(&item.post.url)
    )];
    if !item.fields.url_found.is_empty() {
        let url = html_escape(&item.fields.url_found);
        links.push(format!("<a href=\"{url}\">{url}</a>"));
    }
    if let Some(link) = google_calendar_link(item, options) {
        links.push(format!("<a href=\"{}\">Add to Google Calendar</a>", html_escape(&link)));
    }
    if let Some(link) = hosted_ics_link(item, options) {
        links.push(format!("<a href=\"{}\">Download .ics</a>", html_escape(&link)));
    }
    let _ = writeln!(out, "<p style=\"margin:4px 0;\">{}</p>", links.join(" · "));

    if item.fields.link_in_bio {
        out.push_str("<p style=\"margin:4px 0;color:#666;\"><i>More details via the link in bio</i></p>\n");
    }
    out.push_str("</div>\n");
}
