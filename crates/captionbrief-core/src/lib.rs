//! Core of captionbrief: caption analysis, the seen ledger, digest and
//! calendar rendering.

pub mod analyze;
pub mod calendar;
pub mod classify;
pub mod digest;
pub mod extract;
pub mod item;
pub mod ledger;
pub mod summarize;
pub mod text;
pub mod time;
pub mod title;
pub mod tracing;

#[cfg(test)]
mod fixtures;

pub use analyze::{Analyzer, analyze, analyze_all};
pub use calendar::{
    CalendarDocument, CalendarEncoder, CalendarMethod, InviteParties, combined_filename,
    event_identifier,
};
pub use classify::{IMPORTANCE_RULES, ImportanceRule, classify};
pub use digest::{Digest, DigestOptions, assemble};
pub use extract::extract;
pub use item::{EnrichedItem, EventFields, Importance, RawPost};
pub use ledger::SeenLedger;
pub use summarize::summarize;
pub use text::normalize;
pub use time::{DEFAULT_TIMEZONE, EventWindow, local_now, parse_timezone};
pub use title::build_title;
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
