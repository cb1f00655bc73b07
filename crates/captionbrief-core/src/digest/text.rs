//! Plaintext digest rendering.

use super::{DigestOptions, EMPTY_DIGEST, PARTIAL_FAILURE_NOTICE, TierSection, facts};
use crate::item::EnrichedItem;

pub(super) fn render(sections: &[TierSection<'_>], options: &DigestOptions) -> String {
    let mut lines = vec![format!("# {}", options.heading()), String::new()];

    if options.partial_failure {
        lines.push(format!("> {PARTIAL_FAILURE_NOTICE}"));
        lines.push(String::new());
    }

    if sections.is_empty() {
        lines.push(EMPTY_DIGEST.to_string());
        lines.push(String::new());
    }

    for section in sections {
        lines.push(format!("## {} ({})", section.tier.label(), section.items.len()));
        lines.push(String::new());
        for item in &section.items {
            render_item(item, &mut lines);
            lines.push(String::new());
        }
    }

    let mut out = lines.join("\n");
    let trimmed = out.trim_end().len();
    out.truncate(trimmed);
    out.push('\n');
    out
}

fn render_item(item: &EnrichedItem, lines: &mut Vec<String>) {
    lines.push(format!("- **{}** [{}]", item.event_title, item.importance.label()));

    let facts = facts(item);
    if !facts.is_empty() {
        let joined = facts
            .iter()
            .map(|(label, value)| format!("{label}: {value}"))
            .collect::<Vec<_>>()
            .join(" | ");
        lines.push(format!("  {joined}"));
    }

    lines.push(format!("  {}", item.summary));
    lines.push(format!("  Post: {}", item.post.url));
    if !item.fields.url_found.is_empty() {
        lines.push(format!("  Link: {}", item.fields.url_found));
    }
    if item.fields.link_in_bio {
        lines.push("  More details via the link in bio".to_string());
    }
}
