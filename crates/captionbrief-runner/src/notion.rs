//! Notion delivery.
//!
//! Each run creates one child page under a configured parent page. The
//! page title is the digest subject and the body is built from the
//! plaintext digest, one block per line:
//! - `## Tier (n)` becomes a heading
//! - `- entry` becomes a bulleted list item
//! - `> notice` becomes a quote
//! - anything else becomes a paragraph
//!
//! The top-level `# title` line is dropped since it repeats the page title.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use captionbrief_sources::BoxFuture;

use crate::delivery::{Delivery, DeliveryPayload};
use crate::error::{RunnerError, RunnerResult};

const CHANNEL: &str = "notion";

/// Endpoint that creates pages.
pub const NOTION_PAGES_URL: &str = "https://api.notion.com/v1/pages";

/// API version sent in the `Notion-Version` header.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Longest text allowed in one rich text object.
const RICH_TEXT_LIMIT: usize = 2000;

/// Most children accepted when creating a page.
const MAX_BLOCKS: usize = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials and target of [`NotionDelivery`].
#[derive(Clone, PartialEq, Eq)]
pub struct NotionSettings {
    /// Integration token.
    pub token: String,
    /// Page the digest pages are created under.
    pub parent_page_id: String,
}

impl std::fmt::Debug for NotionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionSettings")
            .field("token", &"<redacted>")
            .field("parent_page_id", &self.parent_page_id)
            .finish()
    }
}

/// Posts the digest as a new Notion page.
#[derive(Debug)]
pub struct NotionDelivery {
    client: Client,
    settings: NotionSettings,
    pages_url: String,
}

impl NotionDelivery {
    /// Builds the HTTP client. No request is made until the first delivery.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the token or parent page is empty.
    pub fn new(settings: NotionSettings) -> RunnerResult<Self> {
        if settings.token.trim().is_empty() {
            return Err(RunnerError::config("notion delivery needs a token"));
        }
        if settings.parent_page_id.trim().is_empty() {
            return Err(RunnerError::config("notion delivery needs a parent page id"));
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("captionbrief/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RunnerError::config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            settings,
            pages_url: NOTION_PAGES_URL.to_string(),
        })
    }

    /// Sends pages to another endpoint.
    #[must_use]
    pub fn with_pages_url(mut self, url: impl Into<String>) -> Self {
        self.pages_url = url.into();
        self
    }

    /// Returns the JSON body of the create-page request for a payload.
    pub fn request_body(&self, payload: &DeliveryPayload) -> Value {
        let mut children: Vec<Value> = payload.text_body.lines().filter_map(block).collect();
        if children.len() > MAX_BLOCKS {
            warn!(blocks = children.len(), limit = MAX_BLOCKS, "notion page truncated");
            children.truncate(MAX_BLOCKS - 1);
            children.push(text_block("paragraph", "(digest truncated, see the email or outbox copy)"));
        }
        json!({
            "parent": { "page_id": self.settings.parent_page_id },
            "properties": {
                "title": [{ "type": "text", "text": { "content": payload.subject } }]
            },
            "children": children,
        })
    }

    async fn send(&self, payload: &DeliveryPayload) -> RunnerResult<()> {
        let body = self.request_body(payload);
        debug!(url = %self.pages_url, "creating notion page");

        let response = self
            .client
            .post(&self.pages_url)
            .bearer_auth(&self.settings.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| RunnerError::delivery(CHANNEL, format!("request failed: {e}")))?;

        let status = response.status();
        match status {
            s if s.is_success() => {
                info!(subject = %payload.subject, "created notion page");
                Ok(())
            }
            StatusCode::UNAUTHORIZED => Err(RunnerError::delivery(CHANNEL, "token rejected")),
            StatusCode::NOT_FOUND => Err(RunnerError::delivery(
                CHANNEL,
                "parent page not found or not shared with the integration",
            )),
            s => {
                let text = response.text().await.unwrap_or_default();
                Err(RunnerError::delivery(CHANNEL, format!("unexpected status {s}: {text}")))
            }
        }
    }
}

impl Delivery for NotionDelivery {
    fn name(&self) -> &str {
        CHANNEL
    }

    fn deliver<'a>(&'a self, payload: &'a DeliveryPayload) -> BoxFuture<'a, RunnerResult<()>> {
        Box::pin(self.send(payload))
    }
}

/// Maps one line of the plaintext digest to a block.
fn block(line: &str) -> Option<Value> {
    let trimmed = line.trim();
    if trimmed.is_empty() || (trimmed.starts_with("# ") && !line.starts_with(' ')) {
        return None;
    }
    let (kind, text) = if let Some(rest) = trimmed.strip_prefix("## ") {
        ("heading_2", rest)
    } else if let Some(rest) = trimmed.strip_prefix("- ").filter(|_| !line.starts_with(' ')) {
        ("bulleted_list_item", rest)
    } else if let Some(rest) = trimmed.strip_prefix("> ") {
        ("quote", rest)
    } else {
        ("paragraph", trimmed)
    };
    Some(text_block(kind, &text.replace("**", "")))
}

fn text_block(kind: &str, text: &str) -> Value {
    let mut block = Map::new();
    block.insert("object".to_string(), json!("block"));
    block.insert("type".to_string(), json!(kind));
    block.insert(kind.to_string(), json!({ "rich_text": rich_text(text) }));
    Value::Object(block)
}

/// Splits text into rich text objects within the per-object limit.
fn rich_text(text: &str) -> Vec<Value> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(RICH_TEXT_LIMIT)
        .map(|chunk| {
            let content: String = chunk.iter().collect();
            json!({ "type": "text", "text": { "content": content } })
        })
        .collect()
}
