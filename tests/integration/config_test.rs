//! Plugin document loading, validation and reload.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use serde_json::json;

use mcpguard::mcpguard_core::config::{DocumentFormat, PipelineConfig};
use mcpguard::mcpguard_plugin::hooks::{HookPoint, PluginMode};
use mcpguard::mcpguard_plugin::{ConfigDocument, PipelineManager};
use mcpguard::mcpguard_plugin::config::validate;

use crate::helpers;

const YAML_DOC: &str = r#"
# guard chain
plugins:
  - name: redactor
    kind: plugins.pii
    hooks: [tool_pre_invoke, prompt_pre_fetch]
    mode: enforce
    priority: 10
    config:
      action: redact

  - name: "sql guard"
    kind: plugins.sql_sanitizer
    hooks:
      - tool_pre_invoke
    mode: warn
    priority: 5
    config:
      fields: [query]
      block_on_violation: false
"#;

#[test]
fn test_missing_priority_is_dropped_with_one_error() {
    let document = ConfigDocument::parse(
        r#"[
            {"name":"ok","kind":"plugins.pii","hooks":["tool_pre_invoke"],"mode":"monitor","priority":1},
            {"name":"nopri","kind":"plugins.pii","hooks":["tool_pre_invoke"],"mode":"monitor"}
        ]"#,
        DocumentFormat::Json,
        None,
    )
    .unwrap();

    let report = validate(&document.entries);

    assert_eq!(report.accepted(), 1);
    assert_eq!(report.descriptors[0].name, "ok");
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("nopri"));
    assert!(report.errors[0].contains("priority"));
}

#[tokio::test]
async fn test_yaml_document_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plugins.yaml");
    tokio::fs::write(&path, YAML_DOC).await.unwrap();

    let manager = mcpguard::pipeline(PipelineConfig::default()).unwrap();
    let summary = manager
        .reload_from_path(&path, DocumentFormat::Auto)
        .await
        .unwrap();

    assert_eq!(summary.accepted, 2);
    assert_eq!(summary.rejected, 0);
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.hooks.get(&HookPoint::ToolPreInvoke), Some(&2));
    assert_eq!(summary.hooks.get(&HookPoint::PromptPreFetch), Some(&1));

    let index = manager.snapshot().await;
    let chain = index.chain(HookPoint::ToolPreInvoke);
    assert_eq!(chain[0].name(), "sql guard");
    assert_eq!(chain[0].mode(), PluginMode::Warn);
    assert_eq!(chain[0].descriptor.config.get("fields"), Some(&json!(["query"])));
    assert_eq!(chain[1].name(), "redactor");
}

#[tokio::test]
async fn test_shipped_documents_are_valid() {
    for (path, plugins) in [
        ("config/plugins.yaml", 3),
        ("config/plugins.example.json", 2),
    ] {
        let document = ConfigDocument::read(path, DocumentFormat::Auto).await.unwrap();
        let report = validate(&document.entries);
        assert_eq!(report.accepted(), plugins, "{path}");
        assert!(report.errors.is_empty(), "{path}: {:?}", report.errors);

        let registry = mcpguard::builtin_registry().unwrap();
        assert!(report.descriptors.iter().all(|d| registry.contains(&d.kind)));
    }
}

#[tokio::test]
async fn test_unknown_kind_is_skipped() {
    let manager = helpers::test_manager(
        r#"[
            {"name":"ghost","kind":"plugins.nope","hooks":["tool_pre_invoke"],"mode":"enforce","priority":1},
            {"name":"tag","kind":"test.tag","hooks":["tool_pre_invoke"],"mode":"monitor","priority":2}
        ]"#,
    )
    .await;

    let index = manager.snapshot().await;
    assert_eq!(index.plugin_count(), 1);
    assert_eq!(index.chain(HookPoint::ToolPreInvoke)[0].name(), "tag");
}

#[tokio::test]
async fn test_invalid_plugin_config_is_skipped() {
    let manager = mcpguard::pipeline(PipelineConfig::default()).unwrap();
    let summary = manager
        .reload_from_str(
            r#"[{"name":"sql","kind":"plugins.sql_sanitizer","hooks":["tool_pre_invoke"],"mode":"enforce","priority":1,"config":{"blocked_patterns":["(oops"]}}]"#,
            DocumentFormat::Json,
            None,
        )
        .await
        .unwrap();

    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.active(), 0);
    assert!(manager.snapshot().await.is_empty());
}

#[tokio::test]
async fn test_reload_swaps_index_and_bad_reload_keeps_it() {
    let manager = PipelineManager::new(
        helpers::test_registry(Arc::new(AtomicUsize::new(0))),
        PipelineConfig::default(),
    );
    let body = helpers::tool_call(1, json!({}));

    manager
        .reload_from_str(
            r#"[{"name":"gate","kind":"test.deny","hooks":["tool_pre_invoke"],"mode":"enforce","priority":1}]"#,
            DocumentFormat::Json,
            None,
        )
        .await
        .unwrap();
    let before = manager.snapshot().await;
    assert!(!manager.process_request(&body, &helpers::no_headers()).await.is_forward());

    manager
        .reload_from_str(
            "plugins:\n  - name: tag\n    kind: test.tag\n    hooks: [tool_pre_invoke]\n    mode: monitor\n    priority: 1\n",
            DocumentFormat::Yaml,
            None,
        )
        .await
        .unwrap();
    let action = manager.process_request(&body, &helpers::no_headers()).await;
    assert_eq!(action.body(), format!("{body}|tag"));

    // a held snapshot is unaffected by the swap
    assert_eq!(before.chain(HookPoint::ToolPreInvoke)[0].name(), "gate");

    assert!(
        manager
            .reload_from_str("plugins:\n  - name: &anchor x\n", DocumentFormat::Yaml, None)
            .await
            .is_err()
    );
    let action = manager.process_request(&body, &helpers::no_headers()).await;
    assert_eq!(action.body(), format!("{body}|tag"));
}

#[tokio::test]
async fn test_empty_document_passes_everything() {
    let manager = helpers::builtin_manager("plugins:\n").await;
    let body = helpers::tool_call(1, json!({"sql": "DROP TABLE users", "email": "a@b.com"}));
    assert_eq!(
        manager.process_request(&body, &helpers::no_headers()).await,
        mcpguard::mcpguard_plugin::TransportAction::forward(body.clone())
    );
}
