//! SMTP delivery.

use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use captionbrief_sources::BoxFuture;

use crate::delivery::{CALENDAR_MIME, Delivery, DeliveryPayload};
use crate::error::{RunnerError, RunnerResult};

const CHANNEL: &str = "smtp";

/// Port that speaks TLS from the first byte. Anything else uses STARTTLS.
pub const IMPLICIT_TLS_PORT: u16 = 465;

/// Connection and addressing settings for [`SmtpDelivery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
}

/// Sends the digest as a multipart email.
///
/// The body is `multipart/alternative` (plain text and HTML); attachments
/// and invites follow as separate parts.
pub struct SmtpDelivery {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl std::fmt::Debug for SmtpDelivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpDelivery")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

fn parse_mailbox(address: &str) -> RunnerResult<Mailbox> {
    address
        .parse()
        .map_err(|e| RunnerError::config(format!("invalid email address {address:?}: {e}")))
}

fn content_type(mime: &str) -> RunnerResult<ContentType> {
    ContentType::parse(mime)
        .map_err(|e| RunnerError::delivery(CHANNEL, format!("invalid content type {mime:?}: {e}")))
}

impl SmtpDelivery {
    /// Builds the transport. No connection is made until the first send.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unusable host, sender or
    /// recipient list.
    pub fn new(settings: &SmtpSettings) -> RunnerResult<Self> {
        if settings.to.is_empty() {
            return Err(RunnerError::config("email delivery needs at least one recipient"));
        }
        let from = parse_mailbox(&settings.from)?;
        let to = settings
            .to
            .iter()
            .map(|address| parse_mailbox(address))
            .collect::<RunnerResult<Vec<_>>>()?;

        let builder = if settings.port == IMPLICIT_TLS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
        }
        .map_err(|e| RunnerError::config(format!("invalid SMTP host {:?}: {e}", settings.host)))?;

        let mailer = builder
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        Ok(Self { mailer, from, to })
    }

    /// Builds the message for a payload.
    pub fn build_message(&self, payload: &DeliveryPayload) -> RunnerResult<Message> {
        let mut body = MultiPart::mixed().multipart(MultiPart::alternative_plain_html(
            payload.text_body.clone(),
            payload.html_body.clone(),
        ));
        for attachment in &payload.attachments {
            body = body.singlepart(
                MailAttachment::new(attachment.filename.clone())
                    .body(attachment.bytes.clone(), content_type(&attachment.mime)?),
            );
        }
        let invite_type = content_type(&format!("{CALENDAR_MIME}; method=REQUEST"))?;
        for invite in &payload.invites {
            body = body.singlepart(
                MailAttachment::new(invite.filename.clone())
                    .body(invite.bytes.clone(), invite_type.clone()),
            );
        }

        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(payload.subject.clone());
        for to in &self.to {
            builder = builder.to(to.clone());
        }
        builder
            .multipart(body)
            .map_err(|e| RunnerError::delivery(CHANNEL, format!("failed to build message: {e}")))
    }

    async fn send(&self, payload: &DeliveryPayload) -> RunnerResult<()> {
        let message = self.build_message(payload)?;
        self.mailer
            .send(message)
            .await
            .map_err(|e| RunnerError::delivery(CHANNEL, e.to_string()))?;
        info!(recipients = self.to.len(), subject = %payload.subject, "sent digest email");
        Ok(())
    }
}

impl Delivery for SmtpDelivery {
    fn name(&self) -> &str {
        CHANNEL
    }

    fn deliver<'a>(&'a self, payload: &'a DeliveryPayload) -> BoxFuture<'a, RunnerResult<()>> {
        Box::pin(self.send(payload))
    }
}
