//! Plugin executor: runs a hook's chain against one request.
//!
//! Plugins are called in index order. Each plugin sees the body produced by
//! the previous one and the metadata accumulated so far. A negative verdict
//! is treated according to the plugin's mode:
//! - `enforce`: the request is blocked and the chain stops.
//! - `warn`: a warning is recorded and the chain continues.
//! - `monitor`: the verdict is logged only.
//!
//! Handler errors and panics count as negative verdicts.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{debug, info, warn};

use crate::error::PluginError;
use crate::hooks::definitions::{ExecutionContext, ExecutionResult, HookPoint, PluginMode};
use crate::hooks::registry::{BoundPlugin, HookIndex};

/// Walks plugin chains and produces pipeline verdicts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PluginExecutor;

impl PluginExecutor {
    /// Creates a new executor.
    pub fn new() -> Self {
        Self
    }

    /// Runs the chain for `hook` and returns the pipeline result.
    pub async fn execute(
        &self,
        hook: HookPoint,
        mut context: ExecutionContext,
        index: &HookIndex,
    ) -> ExecutionResult {
        let chain = index.chain(hook);
        if chain.is_empty() {
            debug!(hook = %hook, "No plugins for hook");
            let mut result = ExecutionResult::allowed(context.body);
            result.metadata = context.metadata;
            return result;
        }

        debug!(hook = %hook, plugins = chain.len(), "Executing plugin chain");

        let mut warnings: Vec<String> = Vec::new();
        let mut block: Option<(String, String)> = None;

        for plugin in chain {
            match invoke(plugin, &context).await {
                Ok(outcome) => {
                    context.metadata.extend(outcome.metadata);
                    warnings.extend(outcome.warnings);

                    if outcome.modified_body != context.body {
                        debug!(hook = %hook, plugin = %plugin.name(), "Plugin modified body");
                        context.body = outcome.modified_body;
                    }

                    if outcome.allow {
                        continue;
                    }

                    let reason = outcome.error;
                    match plugin.mode() {
                        PluginMode::Enforce => {
                            let reason = reason.unwrap_or_else(|| {
                                format!("Blocked by plugin '{}'", plugin.name())
                            });
                            info!(hook = %hook, plugin = %plugin.name(), reason = %reason, "Request blocked");
                            block = Some((plugin.name().to_string(), reason));
                            break;
                        }
                        PluginMode::Warn => {
                            let reason = reason.unwrap_or_else(|| "denied".to_string());
                            warn!(hook = %hook, plugin = %plugin.name(), reason = %reason, "Plugin denied request");
                            warnings.push(format!("{}: {reason}", plugin.name()));
                        }
                        PluginMode::Monitor => {
                            debug!(
                                hook = %hook,
                                plugin = %plugin.name(),
                                reason = ?reason,
                                "Monitor plugin would deny request"
                            );
                        }
                    }
                }
                Err(err) => match plugin.mode() {
                    PluginMode::Enforce => {
                        let reason = format!("Plugin '{}' failed: {err}", plugin.name());
                        warn!(hook = %hook, plugin = %plugin.name(), error = %err, "Enforcing plugin failed");
                        block = Some((plugin.name().to_string(), reason));
                        break;
                    }
                    PluginMode::Warn | PluginMode::Monitor => {
                        warn!(hook = %hook, plugin = %plugin.name(), error = %err, "Plugin failed");
                        warnings.push(format!("{}: plugin error: {err}", plugin.name()));
                    }
                },
            }
        }

        let (blocked_by, error) = match block {
            Some((name, reason)) => (Some(name), Some(reason)),
            None => (None, None),
        };

        ExecutionResult {
            allow: blocked_by.is_none(),
            modified_body: context.body,
            error,
            warnings,
            metadata: context.metadata,
            blocked_by,
        }
    }
}

/// Calls one handler and normalizes its output, converting panics.
async fn invoke(
    plugin: &BoundPlugin,
    context: &ExecutionContext,
) -> Result<ExecutionResult, PluginError> {
    let output = AssertUnwindSafe(plugin.handler.handle(context))
        .catch_unwind()
        .await
        .map_err(|panic| PluginError::Panicked(panic_message(panic.as_ref())))??;

    Ok(output.normalize(&context.body))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
