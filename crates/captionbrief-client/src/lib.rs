//! CLI, configuration and commands
//!
//! This crate provides the `captionbrief` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use config::CaptionConfig;
pub use error::{ClientError, ClientResult};
