//! `hooks`: load a plugin document and show each hook's chain.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use mcpguard_core::config::AppConfig;
use mcpguard_core::error::AppError;
use mcpguard_plugin::HookIndex;
use mcpguard_plugin::hooks::HookPoint;

/// Arguments for the hooks command
#[derive(Debug, Args)]
pub struct HooksArgs {
    /// Plugin document; defaults to `pipeline.plugins_path`
    #[arg(short, long)]
    pub plugins: Option<String>,
}

/// One plugin's position in a hook chain
#[derive(Debug, Serialize, Tabled)]
pub struct ChainRow {
    #[tabled(rename = "Hook")]
    pub hook: String,
    #[tabled(rename = "#")]
    pub order: usize,
    #[tabled(rename = "Plugin")]
    pub plugin: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Mode")]
    pub mode: String,
    #[tabled(rename = "Priority")]
    pub priority: i64,
}

/// Flattens an index into rows, hooks in canonical order.
pub fn chain_rows(index: &HookIndex) -> Vec<ChainRow> {
    HookPoint::ALL
        .into_iter()
        .flat_map(|hook| {
            index
                .chain(hook)
                .iter()
                .enumerate()
                .map(move |(position, bound)| ChainRow {
                    hook: hook.to_string(),
                    order: position + 1,
                    plugin: bound.name().to_string(),
                    kind: bound.descriptor.kind.clone(),
                    mode: bound.mode().to_string(),
                    priority: bound.priority(),
                })
        })
        .collect()
}

/// Execute the hooks command
pub async fn execute(
    args: &HooksArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (path, doc_format) = super::document_source(args.plugins.as_deref(), config);
    let manager = mcpguard::pipeline(config.pipeline.clone())?;
    let summary = manager.reload_from_path(&path, doc_format).await?;

    for error in &summary.errors {
        output::print_warning(error);
    }
    for skipped in &summary.skipped {
        output::print_warning(&format!("plugin '{}' skipped: {}", skipped.name, skipped.reason));
    }

    let index = manager.snapshot().await;
    output::print_list(&chain_rows(&index), format);
    Ok(())
}
