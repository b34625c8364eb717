//! CLI command definitions and dispatch.

pub mod hooks;
pub mod inspect;
pub mod validate;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use mcpguard_core::config::{AppConfig, DocumentFormat};
use mcpguard_core::error::AppError;

/// MCP Guard: inspect JSON-RPC traffic through a configurable plugin chain
#[derive(Debug, Parser)]
#[command(name = "mcpguard", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a plugin configuration document
    Validate(validate::ValidateArgs),
    /// Show the plugin chain of every hook
    Hooks(hooks::HooksArgs),
    /// Run one message through the plugin chain
    Inspect(inspect::InspectArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Validate(args) => validate::execute(args, &config, self.format).await,
            Commands::Hooks(args) => hooks::execute(args, &config, self.format).await,
            Commands::Inspect(args) => inspect::execute(args, &config).await,
        }
    }
}

/// Helper: the document path and format to use, preferring the command line
pub fn document_source(plugins: Option<&str>, config: &AppConfig) -> (String, DocumentFormat) {
    match plugins {
        Some(path) => (path.to_string(), DocumentFormat::Auto),
        None => (
            config.pipeline.plugins_path.clone(),
            config.pipeline.format,
        ),
    }
}
