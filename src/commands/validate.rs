//! `validate`: check a plugin document without installing it.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use mcpguard_core::config::AppConfig;
use mcpguard_core::error::AppError;
use mcpguard_plugin::PluginDescriptor;
use mcpguard_plugin::config::validate;
use mcpguard_plugin::ConfigDocument;

/// Arguments for the validate command
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Plugin document; defaults to `pipeline.plugins_path`
    #[arg(short, long)]
    pub plugins: Option<String>,
}

/// One accepted plugin entry
#[derive(Debug, Serialize, Tabled)]
pub struct PluginRow {
    /// Plugin name
    #[tabled(rename = "Name")]
    pub name: String,
    /// Implementation kind
    #[tabled(rename = "Kind")]
    pub kind: String,
    /// Declared hooks
    #[tabled(rename = "Hooks")]
    pub hooks: String,
    /// Mode
    #[tabled(rename = "Mode")]
    pub mode: String,
    /// Priority
    #[tabled(rename = "Priority")]
    pub priority: i64,
}

impl From<&PluginDescriptor> for PluginRow {
    fn from(descriptor: &PluginDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            kind: descriptor.kind.clone(),
            hooks: descriptor
                .hooks
                .iter()
                .map(|hook| hook.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            mode: descriptor.mode.to_string(),
            priority: descriptor.priority,
        }
    }
}

/// Execute the validate command
pub async fn execute(
    args: &ValidateArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let (path, doc_format) = super::document_source(args.plugins.as_deref(), config);
    let document = ConfigDocument::read(&path, doc_format).await?;
    let report = validate(&document.entries);

    let registry = mcpguard::builtin_registry()?;
    let unknown: Vec<&PluginDescriptor> = report
        .descriptors
        .iter()
        .filter(|d| !registry.contains(&d.kind))
        .collect();

    let rows: Vec<PluginRow> = report.descriptors.iter().map(PluginRow::from).collect();
    output::print_list(&rows, format);

    for error in &report.errors {
        output::print_warning(error);
    }
    for descriptor in &unknown {
        output::print_warning(&format!(
            "plugin '{}': no implementation registered for kind '{}'",
            descriptor.name, descriptor.kind
        ));
    }

    println!("Document '{}':", path);
    output::print_kv("Entries", &document.len().to_string());
    output::print_kv("Accepted", &report.accepted().to_string());
    output::print_kv("Rejected", &report.rejected().to_string());

    if report.rejected() > 0 {
        return Err(AppError::validation(format!(
            "{} of {} plugin entries rejected",
            report.rejected(),
            document.len()
        )));
    }

    output::print_success(&format!("Plugin document '{}' is valid", path));
    Ok(())
}
