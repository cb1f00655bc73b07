//! Digest delivery.
//!
//! A run assembles one [`DeliveryPayload`] and hands it to every configured
//! [`Delivery`]. Failures are reported per channel and never undo the run.

use std::path::{Path, PathBuf};

use tracing::info;

use captionbrief_sources::BoxFuture;

use crate::error::{RunnerError, RunnerResult};

/// MIME type of calendar documents.
pub const CALENDAR_MIME: &str = "text/calendar; charset=utf-8";

/// File names used by the outbox.
pub const OUTBOX_TEXT_FILE: &str = "digest.md";
pub const OUTBOX_HTML_FILE: &str = "digest.html";
pub const OUTBOX_EVENTS_DIR: &str = "events";

/// A file attached to the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl Attachment {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            mime: mime.into(),
        }
    }

    /// A calendar attachment.
    pub fn calendar(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(filename, bytes, CALENDAR_MIME)
    }
}

/// A per-event invite (`METHOD:REQUEST` calendar document).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invite {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Everything a delivery channel needs.
#[derive(Debug, Clone, Default)]
pub struct DeliveryPayload {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub attachments: Vec<Attachment>,
    pub invites: Vec<Invite>,
}

/// A channel the digest is delivered through.
pub trait Delivery: Send + Sync {
    /// Returns the name of the channel (e.g. `outbox`, `smtp`).
    fn name(&self) -> &str;

    /// Delivers one payload.
    ///
    /// # Errors
    ///
    /// Returns `RunnerError` if the payload could not be delivered.
    fn deliver<'a>(&'a self, payload: &'a DeliveryPayload) -> BoxFuture<'a, RunnerResult<()>>;
}

/// Rejects names that are not a plain file name.
pub(crate) fn checked_file_name<'a>(channel: &str, name: &'a str) -> RunnerResult<&'a str> {
    let plain = Path::new(name)
        .file_name()
        .is_some_and(|file| file == name);
    if name.is_empty() || name.starts_with('.') || !plain {
        return Err(RunnerError::delivery(channel, format!("invalid file name {name:?}")));
    }
    Ok(name)
}

/// Writes the digest into a directory.
///
/// Layout:
/// - `digest.md`, `digest.html`
/// - every attachment under its own name
/// - every invite under `events/`, ready to be published as hosted `.ics`
#[derive(Debug, Clone)]
pub struct OutboxDelivery {
    dir: PathBuf,
}

impl OutboxDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn write_all(&self, payload: &DeliveryPayload) -> RunnerResult<()> {
        let events_dir = self.dir.join(OUTBOX_EVENTS_DIR);
        tokio::fs::create_dir_all(&events_dir).await?;

        tokio::fs::write(self.dir.join(OUTBOX_TEXT_FILE), &payload.text_body).await?;
        tokio::fs::write(self.dir.join(OUTBOX_HTML_FILE), &payload.html_body).await?;
        for attachment in &payload.attachments {
            let name = checked_file_name(self.name(), &attachment.filename)?;
            tokio::fs::write(self.dir.join(name), &attachment.bytes).await?;
        }
        for invite in &payload.invites {
            let name = checked_file_name(self.name(), &invite.filename)?;
            tokio::fs::write(events_dir.join(name), &invite.bytes).await?;
        }

        info!(
            dir = %self.dir.display(),
            attachments = payload.attachments.len(),
            invites = payload.invites.len(),
            "wrote digest to outbox"
        );
        Ok(())
    }
}

impl Delivery for OutboxDelivery {
    fn name(&self) -> &str {
        "outbox"
    }

    fn deliver<'a>(&'a self, payload: &'a DeliveryPayload) -> BoxFuture<'a, RunnerResult<()>> {
        Box::pin(self.write_all(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn payload() -> DeliveryPayload {
        DeliveryPayload {
            subject: "Caption Brief — 2026-10-16".to_string(),
            html_body: "<p>hi</p>".to_string(),
            text_body: "hi\n".to_string(),
            attachments: vec![Attachment::calendar("captionbrief-20261016.ics", b"BEGIN:VCALENDAR".to_vec())],
            invites: vec![Invite {
                filename: "C3-20261020T100000.ics".to_string(),
                bytes: b"METHOD:REQUEST".to_vec(),
            }],
        }
    }

    #[tokio::test]
    async fn outbox_layout() {
        let dir = tempdir().unwrap();
        let outbox = OutboxDelivery::new(dir.path().join("dist"));
        outbox.deliver(&payload()).await.unwrap();

        let root = dir.path().join("dist");
        assert_eq!(std::fs::read_to_string(root.join("digest.md")).unwrap(), "hi\n");
        assert_eq!(std::fs::read_to_string(root.join("digest.html")).unwrap(), "<p>hi</p>");
        assert!(root.join("captionbrief-20261016.ics").exists());
        assert_eq!(
            std::fs::read(root.join("events/C3-20261020T100000.ics")).unwrap(),
            b"METHOD:REQUEST"
        );
    }

    #[tokio::test]
    async fn outbox_rejects_path_in_filename() {
        let dir = tempdir().unwrap();
        let outbox = OutboxDelivery::new(dir.path());
        let mut bad = payload();
        bad.attachments[0].filename = "../escape.ics".to_string();
        let result = outbox.deliver(&bad).await;
        assert!(matches!(result, Err(RunnerError::Delivery { .. })));
        assert!(!dir.path().parent().unwrap().join("escape.ics").exists());
    }

    #[test]
    fn checked_names() {
        assert!(checked_file_name("t", "a.ics").is_ok());
        assert!(checked_file_name("t", "").is_err());
        assert!(checked_file_name("t", ".hidden").is_err());
        assert!(checked_file_name("t", "a/b.ics").is_err());
    }

    #[test]
    fn calendar_attachment_mime() {
        let attachment = Attachment::calendar("x.ics", vec![]);
        assert_eq!(attachment.mime, "text/calendar; charset=utf-8");
    }
}
