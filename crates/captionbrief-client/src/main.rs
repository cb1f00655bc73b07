//! captionbrief CLI entry point.

use std::process::ExitCode;

use clap::Parser;

use captionbrief_client::cli::{Cli, Command, ConfigAction, LedgerAction};
use captionbrief_client::commands;
use captionbrief_client::config::CaptionConfig;
use captionbrief_client::error::ClientResult;
use captionbrief_core::{TracingConfig, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing_config = if cli.debug {
        TracingConfig::cli_debug()
    } else if cli.json_logs {
        TracingConfig::batch()
    } else {
        TracingConfig::default()
    };
    if let Err(e) = init_tracing(tracing_config) {
        eprintln!("warning: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(CaptionConfig::default_path);
    let config = if cli.config.is_some() {
        CaptionConfig::load_from(&config_path)?
    } else {
        CaptionConfig::load()?
    };

    match cli.command {
        Command::Run { dry_run } => commands::run::run(&config, dry_run).await,
        Command::Analyze { caption, account } => commands::analyze::run(&config, &caption, &account),
        Command::Ledger { action } => match action {
            LedgerAction::Stats => commands::ledger::stats(&config),
            LedgerAction::Check { shortcode } => commands::ledger::check(&config, &shortcode),
        },
        Command::Config { action } => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config_path),
        },
    }
}
