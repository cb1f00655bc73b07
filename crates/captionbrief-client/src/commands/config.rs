//! Configuration commands.

use std::path::Path;

use crate::config::CaptionConfig;
use crate::error::{ClientError, ClientResult};
use crate::secret::SecretSource;

/// Dump the current configuration to stdout.
pub fn dump(config: &CaptionConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {e}")))?;
    println!("# config.toml ({})", path.display());
    println!("{toml_str}");
    Ok(())
}

/// Validate the configuration.
pub fn validate(config: &CaptionConfig) -> ClientResult<()> {
    config.validate()?;

    let accounts_file = config.accounts_file();
    if !accounts_file.exists() {
        println!("warning: account list {} does not exist", accounts_file.display());
    }

    if let Some(email) = &config.email {
        email.resolve()?;
        if SecretSource::parse(&email.password).is_external() {
            println!("Email credentials resolved.");
        }
    }

    if let Some(notion) = &config.notion {
        notion.resolve()?;
        println!("Notion delivery: page {}", notion.page_id.trim());
    }

    match config.ics_base_url() {
        Some(base) => println!("Hosted .ics links: {base}/<event>.ics"),
        None => println!("Hosted .ics links: disabled"),
    }
    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_round_trips() {
        let config = CaptionConfig::parse("[digest]\ntitle = \"Club Brief\"\n").unwrap();
        let dumped = toml::to_string_pretty(&config).unwrap();
        let parsed = CaptionConfig::parse(&dumped).unwrap();
        assert_eq!(parsed.digest.title, "Club Brief");
        assert!(dump(&config, Path::new("config.toml")).is_ok());
    }

    #[test]
    fn validate_reports_errors() {
        let config = CaptionConfig::parse("[general]\ntimezone = \"Nowhere/Land\"\n").unwrap();
        assert!(validate(&config).is_err());
    }
}
