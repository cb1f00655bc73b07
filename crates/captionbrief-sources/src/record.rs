//! Raw post records and their validation.
//!
//! A [`RawPostRecord`] is whatever a source handed back, with every field
//! optional. [`RawPostRecord::validate`] is the single place where records
//! become [`RawPost`] values; nothing downstream re-checks them.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use captionbrief_core::RawPost;

/// Canonical post URL, used when a record carries none.
pub fn post_url(shortcode: &str) -> String {
    format!("https://www.instagram.com/p/{shortcode}/")
}

/// The capture time of a record as it appeared in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordTime {
    /// Seconds since the Unix epoch.
    Unix(i64),
    /// RFC 3339, or an ISO datetime without offset taken as UTC.
    Text(String),
}

impl RecordTime {
    /// Resolves the timestamp to UTC.
    pub fn to_utc(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Unix(secs) => DateTime::from_timestamp(*secs, 0),
            Self::Text(text) => {
                let text = text.trim();
                if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                    return Some(dt.with_timezone(&Utc));
                }
                NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            }
        }
    }
}

impl From<DateTime<Utc>> for RecordTime {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Text(dt.to_rfc3339())
    }
}

impl From<&str> for RecordTime {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<i64> for RecordTime {
    fn from(secs: i64) -> Self {
        Self::Unix(secs)
    }
}

/// A post as delivered by a source, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPostRecord {
    #[serde(default, alias = "code")]
    pub shortcode: Option<String>,
    #[serde(default, alias = "username")]
    pub account: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "timestamp", alias = "taken_at_timestamp")]
    pub taken_at: Option<RecordTime>,
    #[serde(default)]
    pub caption: Option<String>,
}

/// Why a record was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record has no shortcode")]
    MissingShortcode,

    #[error("invalid shortcode {0:?}")]
    InvalidShortcode(String),

    #[error("record {0} has no timestamp")]
    MissingTimestamp(String),

    #[error("record {shortcode} has an unreadable timestamp")]
    InvalidTimestamp { shortcode: String },

    #[error("record {shortcode} belongs to @{found}, expected @{expected}")]
    AccountMismatch {
        shortcode: String,
        expected: String,
        found: String,
    },

    #[error("record {shortcode} has an invalid url {url:?}")]
    InvalidUrl { shortcode: String, url: String },
}

impl RawPostRecord {
    pub fn new(shortcode: impl Into<String>, taken_at: impl Into<RecordTime>) -> Self {
        Self {
            shortcode: Some(shortcode.into()),
            taken_at: Some(taken_at.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Turns the record into a [`RawPost`] owned by `account`.
    ///
    /// The shortcode must be non-empty and made of ASCII letters, digits,
    /// `_` or `-`. A record naming another account is rejected. A missing
    /// URL falls back to [`post_url`]; a present one must be http(s).
    /// Captions are trimmed, and a missing caption is empty.
    ///
    /// # Errors
    ///
    /// Returns the first [`RecordError`] found.
    pub fn validate(self, account: &str) -> Result<RawPost, RecordError> {
        let shortcode = self
            .shortcode
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(RecordError::MissingShortcode)?;
        if !shortcode
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(RecordError::InvalidShortcode(shortcode));
        }

        if let Some(found) = self.account.as_deref().map(|a| a.trim().trim_start_matches('@'))
            && !found.is_empty()
            && !found.eq_ignore_ascii_case(account)
        {
            return Err(RecordError::AccountMismatch {
                shortcode,
                expected: account.to_string(),
                found: found.to_string(),
            });
        }

        let taken_at = match &self.taken_at {
            None => return Err(RecordError::MissingTimestamp(shortcode)),
            Some(time) => time
                .to_utc()
                .ok_or_else(|| RecordError::InvalidTimestamp { shortcode: shortcode.clone() })?,
        };

        let url = match self.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
            None => post_url(&shortcode),
            Some(raw) => match Url::parse(raw) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed.to_string(),
                _ => {
                    return Err(RecordError::InvalidUrl {
                        shortcode,
                        url: raw.to_string(),
                    });
                }
            },
        };

        let caption = self.caption.as_deref().map(str::trim).unwrap_or_default();
        Ok(RawPost::new(account, shortcode, url, taken_at).with_caption(caption))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod record_time {
        use super::*;

        #[test]
        fn rfc3339() {
            let time = RecordTime::from("2026-10-15T10:00:00-04:00");
            assert_eq!(time.to_utc().unwrap().to_rfc3339(), "2026-10-15T14:00:00+00:00");
        }

        #[test]
        fn naive_iso_is_utc() {
            let time = RecordTime::from("2026-10-15T10:00:00");
            assert_eq!(time.to_utc().unwrap().to_rfc3339(), "2026-10-15T10:00:00+00:00");
        }

        #[test]
        fn unix_seconds() {
            let time = RecordTime::from(1_760_000_000_i64);
            assert_eq!(time.to_utc().unwrap().timestamp(), 1_760_000_000);
        }

        #[test]
        fn garbage() {
            assert!(RecordTime::from("last tuesday").to_utc().is_none());
        }
    }

    mod deserialize {
        use super::*;

        #[test]
        fn full_record() {
            let record: RawPostRecord = serde_json::from_str(
                r#"{"account":"engsoc","shortcode":"ABC","url":"https://www.instagram.com/p/ABC/",
                    "taken_at":"2026-10-15T10:00:00","caption":"Hello"}"#,
            )
            .unwrap();
            assert_eq!(record.shortcode.as_deref(), Some("ABC"));
            assert_eq!(record.taken_at, Some(RecordTime::Text("2026-10-15T10:00:00".into())));
        }

        #[test]
        fn aliases_and_unix_time() {
            let record: RawPostRecord =
                serde_json::from_str(r#"{"code":"XYZ","timestamp":1760000000}"#).unwrap();
            assert_eq!(record.shortcode.as_deref(), Some("XYZ"));
            assert_eq!(record.taken_at, Some(RecordTime::Unix(1_760_000_000)));
            assert!(record.caption.is_none());
        }
    }

    mod validate {
        use super::*;

        fn record() -> RawPostRecord {
            RawPostRecord::new("ABC_1-x", "2026-10-15T10:00:00Z")
        }

        #[test]
        fn fills_defaults() {
            let post = record().validate("engsoc").unwrap();
            assert_eq!(post.account, "engsoc");
            assert_eq!(post.shortcode, "ABC_1-x");
            assert_eq!(post.url, "https://www.instagram.com/p/ABC_1-x/");
            assert_eq!(post.caption, "");
        }

        #[test]
        fn trims_caption() {
            let post = record().with_caption("  Workshop tomorrow \n").validate("engsoc").unwrap();
            assert_eq!(post.caption, "Workshop tomorrow");
        }

        #[test]
        fn missing_shortcode() {
            let rec = RawPostRecord {
                shortcode: Some("  ".into()),
                ..record()
            };
            assert_eq!(rec.validate("engsoc"), Err(RecordError::MissingShortcode));
        }

        #[test]
        fn invalid_shortcode() {
            let rec = RawPostRecord::new("../etc", "2026-10-15T10:00:00Z");
            assert!(matches!(
                rec.validate("engsoc"),
                Err(RecordError::InvalidShortcode(_))
            ));
        }

        #[test]
        fn missing_timestamp() {
            let rec = RawPostRecord {
                taken_at: None,
                ..record()
            };
            assert!(matches!(
                rec.validate("engsoc"),
                Err(RecordError::MissingTimestamp(_))
            ));
        }

        #[test]
        fn account_mismatch() {
            let rec = record().with_account("careers");
            assert!(matches!(
                rec.validate("engsoc"),
                Err(RecordError::AccountMismatch { .. })
            ));
        }

        #[test]
        fn account_match_ignores_at_and_case() {
            assert!(record().with_account("@EngSoc").validate("engsoc").is_ok());
        }

        #[test]
        fn rejects_non_http_url() {
            let rec = record().with_url("javascript:alert(1)");
            assert!(matches!(
                rec.validate("engsoc"),
                Err(RecordError::InvalidUrl { .. })
            ));
        }

        #[test]
        fn keeps_given_url() {
            let post = record()
                .with_url("https://www.instagram.com/reel/ABC/")
                .validate("engsoc")
                .unwrap();
            assert_eq!(post.url, "https://www.instagram.com/reel/ABC/");
        }
    }
}
