//! `inspect`: run a single message through the pipeline and print the
//! transport action.

use std::collections::BTreeMap;

use clap::Args;
use tokio::io::AsyncReadExt;

use crate::output;
use mcpguard_core::config::AppConfig;
use mcpguard_core::error::AppError;

/// Arguments for the inspect command
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Plugin document; defaults to `pipeline.plugins_path`
    #[arg(short, long)]
    pub plugins: Option<String>,

    /// File holding the request body; read from stdin when absent
    #[arg(short, long)]
    pub body: Option<String>,

    /// Request header as `name=value`, repeatable
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// File holding the response body; runs the post hook instead
    #[arg(short, long)]
    pub response: Option<String>,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("invalid header '{raw}', expected name=value"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

async fn read_file(path: &str) -> Result<String, AppError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| AppError::validation(format!("Cannot read '{}': {}", path, e)))
}

async fn read_stdin() -> Result<String, AppError> {
    let mut body = String::new();
    tokio::io::stdin()
        .read_to_string(&mut body)
        .await
        .map_err(|e| AppError::internal(format!("Cannot read stdin: {}", e)))?;
    Ok(body)
}

/// Execute the inspect command
pub async fn execute(args: &InspectArgs, config: &AppConfig) -> Result<(), AppError> {
    let (path, doc_format) = super::document_source(args.plugins.as_deref(), config);
    let manager = mcpguard::pipeline(config.pipeline.clone())?;
    manager.reload_from_path(&path, doc_format).await?;

    let request = match &args.body {
        Some(file) => read_file(file).await?,
        None => read_stdin().await?,
    };
    let headers: BTreeMap<String, String> = args.headers.iter().cloned().collect();

    let action = match &args.response {
        Some(file) => {
            let response = read_file(file).await?;
            manager.process_response(&request, &response, &headers).await
        }
        None => manager.process_request(&request, &headers).await,
    };

    output::print_item(&action);
    Ok(())
}
