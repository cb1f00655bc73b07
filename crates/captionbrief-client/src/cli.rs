//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// captionbrief - A daily brief of what your tracked accounts posted
#[derive(Debug, Parser)]
#[command(name = "captionbrief")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CAPTIONBRIEF_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log as JSON lines (for scheduled jobs)
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch new posts, build the digest and deliver it
    Run {
        /// Print the digest instead of saving the ledger and delivering
        #[arg(long)]
        dry_run: bool,
    },

    /// Analyze a single caption and print the result as JSON
    Analyze {
        /// Caption text, or `-` to read from stdin
        caption: String,

        /// Account the caption belongs to
        #[arg(long, default_value = "account")]
        account: String,
    },

    /// Inspect the seen ledger
    Ledger {
        #[command(subcommand)]
        action: LedgerAction,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Ledger actions.
#[derive(Debug, Subcommand)]
pub enum LedgerAction {
    /// Show ledger size and the last run
    Stats,

    /// Tell whether a post has already been processed
    Check {
        /// Post shortcode
        shortcode: String,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run() {
        let cli = Cli::try_parse_from(["captionbrief", "run", "--dry-run"]).unwrap();
        assert!(matches!(cli.command, Command::Run { dry_run: true }));
        assert!(!cli.debug);
    }

    #[test]
    fn parses_analyze() {
        let cli = Cli::try_parse_from(["captionbrief", "analyze", "-", "--account", "engsoc"]).unwrap();
        match cli.command {
            Command::Analyze { caption, account } => {
                assert_eq!(caption, "-");
                assert_eq!(account, "engsoc");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_ledger_check() {
        let cli = Cli::try_parse_from(["captionbrief", "ledger", "check", "ABC", "--debug"]).unwrap();
        assert!(cli.debug);
        assert!(matches!(
            cli.command,
            Command::Ledger { action: LedgerAction::Check { ref shortcode } } if shortcode == "ABC"
        ));
    }

    #[test]
    fn global_config_flag() {
        let cli = Cli::try_parse_from(["captionbrief", "config", "path", "--config", "/tmp/c.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
    }

    #[test]
    fn command_required() {
        assert!(Cli::try_parse_from(["captionbrief"]).is_err());
    }
}
