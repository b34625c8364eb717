//! Shared test helpers for integration tests.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mcpguard::mcpguard_core::config::{DocumentFormat, PipelineConfig};
use mcpguard::mcpguard_plugin::prelude::*;
use mcpguard::mcpguard_plugin::traits::FnModule;
use mcpguard::mcpguard_plugin::{PipelineManager, PluginRegistry, TransportAction};

/// Pipeline manager over the built-in registry
pub async fn builtin_manager(document: &str) -> PipelineManager {
    let manager = mcpguard::pipeline(PipelineConfig::default()).expect("Failed to build pipeline");
    manager
        .reload_from_str(document, DocumentFormat::Auto, None)
        .await
        .expect("Failed to load plugin document");
    manager
}

/// Registry with the built-in kinds plus small test kinds:
/// - `test.tag` appends `|<name>` to the body
/// - `test.deny` denies with reason `<name> says no`
/// - `test.panic` panics
/// - `test.counted` allows and bumps `instances` each time it is instantiated
/// - `test.rewrite` replaces config `from` with config `to` in the body
pub fn test_registry(instances: Arc<AtomicUsize>) -> Arc<PluginRegistry> {
    let mut registry = mcpguard::builtin_registry().expect("Failed to build registry");

    registry
        .register(
            "test.tag",
            Arc::new(FnModule::new(|descriptor| {
                let tag = format!("|{}", descriptor.name);
                Ok(PluginHandlers::new().process(FnHandler::shared("tag", move |ctx| {
                    Ok(PluginOutput::Body(format!("{}{}", ctx.body, tag)))
                })))
            })),
        )
        .expect("register test.tag");

    registry
        .register(
            "test.deny",
            Arc::new(FnModule::new(|descriptor| {
                let reason = format!("{} says no", descriptor.name);
                Ok(PluginHandlers::new().process(FnHandler::shared("deny", move |_| {
                    Ok(PluginVerdict::deny(reason.clone()).into())
                })))
            })),
        )
        .expect("register test.deny");

    registry
        .register(
            "test.panic",
            Arc::new(FnModule::new(|_| {
                Ok(PluginHandlers::new().process(FnHandler::shared("panic", |_| {
                    panic!("handler exploded")
                })))
            })),
        )
        .expect("register test.panic");

    registry
        .register(
            "test.counted",
            Arc::new(FnModule::new(move |_| {
                instances.fetch_add(1, Ordering::SeqCst);
                Ok(PluginHandlers::new().process(FnHandler::shared("counted", |_| {
                    Ok(PluginOutput::Allow(true))
                })))
            })),
        )
        .expect("register test.counted");

    registry
        .register(
            "test.rewrite",
            Arc::new(FnModule::new(|descriptor| {
                let text = |key: &str| {
                    descriptor
                        .config
                        .get(key)
                        .and_then(serde_json::Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                };
                let (from, to) = (text("from"), text("to"));
                Ok(PluginHandlers::new().process(FnHandler::shared("rewrite", move |ctx| {
                    Ok(PluginOutput::Body(ctx.body.replace(&from, &to)))
                })))
            })),
        )
        .expect("register test.rewrite");

    Arc::new(registry)
}

/// Pipeline manager over [`test_registry`] with `document` installed
pub async fn test_manager(document: &str) -> PipelineManager {
    let manager = PipelineManager::new(
        test_registry(Arc::new(AtomicUsize::new(0))),
        PipelineConfig::default(),
    );
    manager
        .reload_from_str(document, DocumentFormat::Json, None)
        .await
        .expect("Failed to load plugin document");
    manager
}

/// No request headers
pub fn no_headers() -> BTreeMap<String, String> {
    BTreeMap::new()
}

/// A `tools/call` request with the given arguments
pub fn tool_call(id: u64, arguments: serde_json::Value) -> String {
    serde_json::json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": "run", "arguments": arguments}
    })
    .to_string()
}

/// Parses the body of a reject action
pub fn reject_body(action: &TransportAction) -> (u16, serde_json::Value) {
    match action {
        TransportAction::Reject { status, body, .. } => (
            *status,
            serde_json::from_str(body).expect("reject body is JSON"),
        ),
        other => panic!("expected reject, got {:?}", other),
    }
}
