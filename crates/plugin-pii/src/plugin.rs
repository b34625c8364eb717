//! PII plugin module: registers under `plugins.pii` and inspects bodies on
//! every hook it is bound to.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use mcpguard_plugin::prelude::*;

use crate::patterns::{Detection, PiiScanner};

/// Kind this module registers under.
pub const KIND: &str = "plugins.pii";

/// What to do when PII is found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PiiAction {
    /// Replace every match and let the request through.
    #[default]
    Redact,
    /// Report the detection without rewriting the body.
    Log,
    /// Deny the request.
    Block,
}

/// Settings read from the descriptor's `config`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PiiConfig {
    /// Action on detection.
    #[serde(default)]
    pub action: PiiAction,
}

/// Factory for PII redactor instances.
#[derive(Debug, Default)]
pub struct PiiModule;

impl PiiModule {
    /// Creates the module.
    pub fn new() -> Self {
        Self
    }
}

impl PluginModule for PiiModule {
    fn instantiate(&self, descriptor: &PluginDescriptor) -> Result<PluginHandlers, PluginError> {
        let config: PiiConfig = descriptor.config_as()?;
        let scanner = PiiScanner::new()
            .map_err(|e| PluginError::invalid_config(&descriptor.name, e.to_string()))?;

        debug!(plugin = %descriptor.name, action = ?config.action, "PII redactor configured");

        Ok(PluginHandlers::new().process(Arc::new(PiiRedactor {
            name: descriptor.name.clone(),
            action: config.action,
            scanner,
        })))
    }
}

/// One configured PII redactor.
#[derive(Debug)]
pub struct PiiRedactor {
    name: String,
    action: PiiAction,
    scanner: PiiScanner,
}

impl PiiRedactor {
    fn verdict(&self, ctx: &ExecutionContext, detection: Detection) -> PluginVerdict {
        let types: Vec<&str> = detection.types.iter().map(|t| t.as_str()).collect();
        info!(
            plugin = %self.name,
            hook = %ctx.hook,
            types = ?types,
            count = detection.count,
            "PII detected"
        );

        let verdict = PluginVerdict::allow()
            .with_metadata("piiDetected", Value::Bool(true))
            .with_metadata("piiTypes", json!(types))
            .with_metadata("piiRedactions", json!(detection.count));

        match self.action {
            PiiAction::Redact => verdict.with_body(detection.redacted),
            PiiAction::Log => verdict,
            PiiAction::Block => PluginVerdict {
                allow: Some(false),
                error: Some(format!("PII detected: {}", types.join(", "))),
                ..verdict
            },
        }
    }
}

#[async_trait]
impl HookHandler for PiiRedactor {
    async fn handle(&self, ctx: &ExecutionContext) -> Result<PluginOutput, PluginError> {
        let Some(detection) = self.scanner.scan(&ctx.body) else {
            return Ok(PluginOutput::Allow(true));
        };

        Ok(self.verdict(ctx, detection).into())
    }
}
