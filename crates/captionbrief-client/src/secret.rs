//! Credentials that may live outside `config.toml`.
//!
//! A credential setting is read as one of:
//! - `pass::entry`: the first line of `pass show entry`
//! - `env::NAME`: the value of `$NAME`
//! - anything else: the value itself

use std::process::Command;

use crate::error::{ClientError, ClientResult};

/// Where a credential setting points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource<'a> {
    PassStore(&'a str),
    Environment(&'a str),
    Inline(&'a str),
}

impl<'a> SecretSource<'a> {
    pub fn parse(value: &'a str) -> Self {
        match value.split_once("::") {
            Some(("pass", entry)) => Self::PassStore(entry),
            Some(("env", name)) => Self::Environment(name),
            _ => Self::Inline(value),
        }
    }

    /// Returns true when the credential is kept outside the config file.
    pub fn is_external(&self) -> bool {
        !matches!(self, Self::Inline(_))
    }

    /// Reads the credential. `field` names the setting in error messages,
    /// e.g. `email.password`.
    pub fn read(&self, field: &str) -> ClientResult<String> {
        let failed = |reason: String| ClientError::Config(format!("cannot read {field}: {reason}"));
        match *self {
            Self::Inline(value) => Ok(value.to_string()),
            Self::Environment(name) => std::env::var(name)
                .map_err(|_| failed(format!("environment variable `{name}` is not set"))),
            Self::PassStore(entry) => pass_show(entry).map_err(failed),
        }
    }
}

/// Reads a credential setting, resolving any reference.
pub fn read(value: &str, field: &str) -> ClientResult<String> {
    SecretSource::parse(value).read(field)
}

fn pass_show(entry: &str) -> Result<String, String> {
    let output = Command::new("pass")
        .args(["show", entry])
        .output()
        .map_err(|e| format!("`pass` could not be started: {e}"))?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    match (output.status.success(), stdout.lines().next()) {
        (true, Some(first)) => Ok(first.to_string()),
        (true, None) => Err(format!("pass entry `{entry}` is empty")),
        (false, _) => Err(format!(
            "`pass show {entry}` exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )),
    }
}
