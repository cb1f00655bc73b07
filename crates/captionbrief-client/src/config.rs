//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/captionbrief/config.toml` by default.
//!
//! SMTP credentials (`username`, `password`) and the Notion token support
//! secret references:
//! - `pass::path/in/store` resolved via `pass show`
//! - `env::VAR_NAME` resolved from the environment
//! - plain text used as-is

use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use captionbrief_core::digest::DEFAULT_TITLE;
use captionbrief_core::summarize::DEFAULT_SUMMARY_CHARS;
use captionbrief_core::{DEFAULT_TIMEZONE, DigestOptions, InviteParties, parse_timezone};
use captionbrief_runner::{IMPLICIT_TLS_PORT, NotionSettings, RunConfig, SmtpSettings};
use captionbrief_sources::{DEFAULT_LOOKBACK_DAYS, FetchOptions};

use crate::error::{ClientError, ClientResult};
use crate::secret;

/// Environment variables consulted when `[digest]` names no repository.
const GITHUB_REPOSITORY_ENV: &str = "GITHUB_REPOSITORY";
const GITHUB_REF_ENV: &str = "GITHUB_REF_NAME";
const DEFAULT_GITHUB_REF: &str = "main";

// ---------------------------------------------------------------------------
// CaptionConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for captionbrief.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    pub general: GeneralSettings,
    pub fetch: FetchSettings,
    pub digest: DigestSettings,
    /// Outbox delivery; disabled when absent.
    pub outbox: Option<OutboxSettings>,
    /// Email delivery; disabled when absent.
    pub email: Option<EmailSettings>,
    /// Notion delivery; disabled when absent.
    pub notion: Option<NotionConfig>,
    /// Per-event invites; published events when absent.
    pub invites: Option<InviteSettings>,
}

/// Paths and zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Account list, one handle per line.
    pub accounts_file: Option<PathBuf>,
    /// Ledger, run lock and run record.
    pub data_dir: Option<PathBuf>,
    /// IANA zone for all local times.
    pub timezone: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            accounts_file: None,
            data_dir: None,
            timezone: DEFAULT_TIMEZONE.name().to_string(),
        }
    }
}

/// Source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Directory of `<account>.json` exports.
    pub export_dir: Option<PathBuf>,
    pub lookback_days: i64,
    pub max_posts_per_account: Option<usize>,
    /// Pause between accounts, in milliseconds.
    pub account_delay_ms: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            export_dir: None,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            max_posts_per_account: None,
            account_delay_ms: 0,
        }
    }
}

/// Digest rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestSettings {
    pub title: String,
    pub summary_chars: usize,
    /// Google account selector for calendar links.
    pub gcal_authuser: Option<String>,
    /// Where the outbox `events/` directory is published.
    pub ics_base_url: Option<String>,
    /// `owner/repo` hosting the published outbox, used when no base URL is set.
    pub github_repository: Option<String>,
    pub github_ref: Option<String>,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            summary_chars: DEFAULT_SUMMARY_CHARS,
            gcal_authuser: None,
            ics_base_url: None,
            github_repository: None,
            github_ref: None,
        }
    }
}

/// Outbox directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxSettings {
    pub dir: PathBuf,
}

/// SMTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Supports `pass::` and `env::` prefixes.
    pub username: String,
    /// Supports `pass::` and `env::` prefixes.
    pub password: String,
    pub from: String,
    pub to: Vec<String>,
}

fn default_smtp_port() -> u16 {
    IMPLICIT_TLS_PORT
}

impl EmailSettings {
    /// Resolves secret references into runner settings.
    pub fn resolve(&self) -> ClientResult<SmtpSettings> {
        Ok(SmtpSettings {
            host: self.host.clone(),
            port: self.port,
            username: secret::read(&self.username, "email.username")?,
            password: secret::read(&self.password, "email.password")?,
            from: self.from.clone(),
            to: self.to.clone(),
        })
    }
}

/// Notion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Integration token. Supports `pass::` and `env::` prefixes.
    pub token: String,
    /// Page the digest pages are created under.
    pub page_id: String,
}

impl NotionConfig {
    pub fn resolve(&self) -> ClientResult<NotionSettings> {
        Ok(NotionSettings {
            token: secret::read(&self.token, "notion.token")?,
            parent_page_id: self.page_id.trim().to_string(),
        })
    }
}

/// Invite parties.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteSettings {
    pub organizer: String,
    pub attendee: String,
    pub organizer_name: Option<String>,
}

impl InviteSettings {
    pub fn parties(&self) -> InviteParties {
        let parties = InviteParties::new(&self.organizer, &self.attendee);
        match &self.organizer_name {
            Some(name) => parties.with_organizer_name(name),
            None => parties,
        }
    }
}

impl CaptionConfig {
    /// Loads configuration from the default path, or defaults if it does
    /// not exist.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ClientResult<Self> {
        toml::from_str(content).map_err(|e| ClientError::Config(format!("failed to parse config: {e}")))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("captionbrief")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("captionbrief")
    }

    pub fn accounts_file(&self) -> PathBuf {
        self.general
            .accounts_file
            .clone()
            .unwrap_or_else(|| Self::default_config_dir().join("accounts.txt"))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.general
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.fetch
            .export_dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("exports"))
    }

    pub fn timezone(&self) -> ClientResult<Tz> {
        parse_timezone(&self.general.timezone)
            .ok_or_else(|| ClientError::Config(format!("unknown timezone {:?}", self.general.timezone)))
    }

    pub fn fetch_options(&self) -> ClientResult<FetchOptions> {
        if self.fetch.lookback_days <= 0 {
            return Err(ClientError::Config("fetch.lookback_days must be positive".to_string()));
        }
        let mut options = FetchOptions::new()
            .with_lookback(chrono::Duration::days(self.fetch.lookback_days))
            .with_account_delay(StdDuration::from_millis(self.fetch.account_delay_ms));
        if let Some(max) = self.fetch.max_posts_per_account {
            options = options.with_max_posts_per_account(max);
        }
        Ok(options)
    }

    /// Returns the hosted `.ics` base URL, from `ics_base_url` or derived
    /// from the GitHub repository and ref.
    pub fn ics_base_url(&self) -> Option<String> {
        self.ics_base_url_with(|name| std::env::var(name).ok())
    }

    /// Like [`Self::ics_base_url`] with an explicit environment lookup.
    pub fn ics_base_url_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        if let Some(base) = non_empty(self.digest.ics_base_url.clone()) {
            return Some(base.trim_end_matches('/').to_string());
        }
        let repository = non_empty(self.digest.github_repository.clone())
            .or_else(|| non_empty(env(GITHUB_REPOSITORY_ENV)))?;
        let git_ref = non_empty(self.digest.github_ref.clone())
            .or_else(|| non_empty(env(GITHUB_REF_ENV)))
            .unwrap_or_else(|| DEFAULT_GITHUB_REF.to_string());
        Some(format!(
            "https://raw.githubusercontent.com/{repository}/{git_ref}/dist/events"
        ))
    }

    pub fn digest_options(&self) -> DigestOptions {
        let mut options = DigestOptions::default().with_title(&self.digest.title);
        if let Some(authuser) = self.digest.gcal_authuser.as_deref().filter(|a| !a.is_empty()) {
            options = options.with_gcal_authuser(authuser);
        }
        if let Some(base) = self.ics_base_url() {
            options = options.with_ics_base_url(base);
        }
        options
    }

    /// Builds the run configuration for `accounts`.
    pub fn run_config(&self, accounts: Vec<String>, dry_run: bool) -> ClientResult<RunConfig> {
        let mut config = RunConfig::new(accounts, self.data_dir())
            .with_timezone(self.timezone()?)
            .with_fetch(self.fetch_options()?)
            .with_digest(self.digest_options())
            .with_summary_chars(self.digest.summary_chars)
            .with_dry_run(dry_run);
        if let Some(invites) = &self.invites {
            config = config.with_invites(invites.parties());
        }
        Ok(config)
    }

    /// Checks every setting that can be checked without network access.
    pub fn validate(&self) -> ClientResult<()> {
        self.timezone()?;
        self.fetch_options()?;
        if self.digest.summary_chars < 2 {
            return Err(ClientError::Config("digest.summary_chars must be at least 2".to_string()));
        }
        if let Some(email) = &self.email {
            if email.host.trim().is_empty() {
                return Err(ClientError::Config("email.host must not be empty".to_string()));
            }
            if email.to.is_empty() {
                return Err(ClientError::Config("email.to must list at least one recipient".to_string()));
            }
        }
        if let Some(notion) = &self.notion
            && (notion.token.trim().is_empty() || notion.page_id.trim().is_empty())
        {
            return Err(ClientError::Config(
                "notion.token and notion.page_id must both be set".to_string(),
            ));
        }
        if let Some(invites) = &self.invites
            && (invites.organizer.trim().is_empty() || invites.attendee.trim().is_empty())
        {
            return Err(ClientError::Config(
                "invites.organizer and invites.attendee must both be set".to_string(),
            ));
        }
        Ok(())
    }
}
