//! SQL sanitizer plugin module: registers under `plugins.sql_sanitizer`.
//!
//! The `tool_pre_invoke` handler looks at the tool arguments first; the
//! generic handler, used for every other hook, looks at the whole body.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use mcpguard_plugin::prelude::*;

use crate::analyzer::{Analysis, SqlAnalyzer};
use crate::config::SqlConfig;
use crate::extract;

/// Kind this module registers under.
pub const KIND: &str = "plugins.sql_sanitizer";

/// Factory for SQL sanitizer instances.
#[derive(Debug, Default)]
pub struct SqlSanitizerModule;

impl SqlSanitizerModule {
    /// Creates the module.
    pub fn new() -> Self {
        Self
    }
}

impl PluginModule for SqlSanitizerModule {
    fn instantiate(&self, descriptor: &PluginDescriptor) -> Result<PluginHandlers, PluginError> {
        let config: SqlConfig = descriptor.config_as()?;
        let analyzer = SqlAnalyzer::new(&config).map_err(|e| {
            PluginError::invalid_config(&descriptor.name, format!("invalid blocked pattern: {e}"))
        })?;

        debug!(
            plugin = %descriptor.name,
            patterns = config.blocked_patterns.len(),
            block_on_violation = config.block_on_violation,
            "SQL sanitizer configured"
        );

        let sanitizer = Arc::new(SqlSanitizer {
            name: descriptor.name.clone(),
            config,
            analyzer,
        });

        Ok(PluginHandlers::new()
            .on_tool_pre_invoke(Arc::new(ToolArguments(sanitizer.clone())))
            .process(sanitizer))
    }
}

/// One configured SQL sanitizer.
#[derive(Debug)]
pub struct SqlSanitizer {
    name: String,
    config: SqlConfig,
    analyzer: SqlAnalyzer,
}

impl SqlSanitizer {
    fn inspect(&self, ctx: &ExecutionContext, candidates: Vec<String>) -> PluginOutput {
        if candidates.is_empty() {
            return PluginOutput::Allow(true);
        }

        let analysis = self.analyzer.analyze(&candidates);
        self.verdict(ctx, analysis).into()
    }

    fn verdict(&self, ctx: &ExecutionContext, analysis: Analysis) -> PluginVerdict {
        let verdict = PluginVerdict::allow()
            .with_metadata("sqlViolations", json!(analysis.violations))
            .with_metadata("sqlStatementsChecked", json!(analysis.statements));

        if analysis.is_clean() {
            return verdict;
        }

        info!(
            plugin = %self.name,
            hook = %ctx.hook,
            violations = ?analysis.violations,
            "SQL policy violation"
        );

        if self.config.block_on_violation {
            PluginVerdict {
                allow: Some(false),
                error: Some(analysis.violations.join("; ")),
                ..verdict
            }
        } else {
            PluginVerdict {
                warnings: analysis.violations,
                ..verdict
            }
        }
    }
}

#[async_trait]
impl HookHandler for SqlSanitizer {
    async fn handle(&self, ctx: &ExecutionContext) -> Result<PluginOutput, PluginError> {
        let candidates = extract::candidates(&ctx.body, &self.config.fields);
        Ok(self.inspect(ctx, candidates))
    }
}

/// `tool_pre_invoke` handler: checks the tool arguments of the body as
/// earlier plugins left it, falling back to the whole body when the
/// arguments hold no SQL.
#[derive(Debug)]
struct ToolArguments(Arc<SqlSanitizer>);

#[async_trait]
impl HookHandler for ToolArguments {
    async fn handle(&self, ctx: &ExecutionContext) -> Result<PluginOutput, PluginError> {
        let candidates = extract::tool_candidates(
            &ctx.body,
            ctx.get_metadata("toolArguments"),
            &self.0.config.fields,
        );
        Ok(self.0.inspect(ctx, candidates))
    }
}
