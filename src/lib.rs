//! # mcpguard
//!
//! Wires the built-in plugin modules into a registry and exposes the
//! pipeline crates to the `mcpguard` binary.

use std::sync::Arc;

use mcpguard_core::config::PipelineConfig;
use mcpguard_core::error::AppError;
use mcpguard_plugin::{PipelineManager, PluginRegistry};

pub use mcpguard_core;
pub use mcpguard_plugin;

/// Builds a registry holding every built-in plugin kind.
pub fn builtin_registry() -> Result<PluginRegistry, AppError> {
    let mut registry = PluginRegistry::new();
    registry
        .register(plugin_pii::KIND, Arc::new(plugin_pii::PiiModule::new()))
        .map_err(AppError::internal)?;
    registry
        .register(
            plugin_sql_sanitizer::KIND,
            Arc::new(plugin_sql_sanitizer::SqlSanitizerModule::new()),
        )
        .map_err(AppError::internal)?;
    Ok(registry)
}

/// Creates a pipeline manager over the built-in registry.
pub fn pipeline(config: PipelineConfig) -> Result<PipelineManager, AppError> {
    Ok(PipelineManager::new(Arc::new(builtin_registry()?), config))
}
