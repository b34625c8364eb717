//! End-to-end pipeline behavior over the built-in and test plugins.

use serde_json::{Value, json};

use mcpguard::mcpguard_plugin::TransportAction;
use mcpguard::mcpguard_plugin::hooks::HookPoint;
use mcpguard::mcpguard_plugin::manager::Inspection;

use crate::helpers;

fn verdict(inspection: Inspection) -> mcpguard::mcpguard_plugin::ExecutionResult {
    match inspection {
        Inspection::Verdict { result, .. } => result,
        Inspection::PassThrough { .. } => panic!("expected the chain to run"),
    }
}

#[tokio::test]
async fn test_pii_monitor_redacts_email() {
    let manager = helpers::builtin_manager(
        r#"[{"name":"PII","kind":"plugins.pii","hooks":["tool_pre_invoke"],"mode":"monitor","priority":10}]"#,
    )
    .await;
    let body = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"arguments":{"email":"a@b.com"}}}"#;

    let result = verdict(manager.inspect(body, &helpers::no_headers()).await.unwrap());

    assert!(result.allow);
    assert!(result.modified_body.contains("[REDACTED_EMAIL]"));
    assert!(!result.modified_body.contains("a@b.com"));
    assert_eq!(result.metadata.get("piiDetected"), Some(&Value::Bool(true)));
}

#[tokio::test]
async fn test_sql_enforce_blocks_delete_without_where() {
    let manager = helpers::builtin_manager(
        r#"[{"name":"SQL","kind":"plugins.sql_sanitizer","hooks":["tool_pre_invoke"],"mode":"enforce","priority":5,"config":{"block_delete_without_where":true}}]"#,
    )
    .await;
    let body = helpers::tool_call(7, json!({"sql": "DELETE FROM users"}));

    let action = manager.process_request(&body, &helpers::no_headers()).await;
    let (status, envelope) = helpers::reject_body(&action);

    assert_eq!(status, 403);
    assert_eq!(envelope["id"], json!(7));
    assert_eq!(envelope["error"]["code"], json!(-32000));
    let reason = envelope["error"]["data"]["reason"].as_str().unwrap();
    assert!(reason.contains("DELETE statement without WHERE"));
    assert_eq!(envelope["error"]["data"]["blockedBy"], json!("SQL"));
    assert_eq!(envelope["error"]["data"]["hook"], json!("tool_pre_invoke"));
}

#[tokio::test]
async fn test_list_method_passes_through() {
    let manager = helpers::builtin_manager(
        r#"[{"name":"PII","kind":"plugins.pii","hooks":["tool_pre_invoke"],"mode":"enforce","priority":1,"config":{"action":"block"}}]"#,
    )
    .await;
    let body = r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#;

    let inspection = manager.inspect(body, &helpers::no_headers()).await.unwrap();
    assert!(matches!(&inspection, Inspection::PassThrough { body: b } if b == body));
    assert_eq!(
        manager.process_request(body, &helpers::no_headers()).await,
        TransportAction::forward(body)
    );
}

#[tokio::test]
async fn test_non_json_and_unknown_methods_pass_through() {
    let manager = helpers::test_manager(
        r#"[{"name":"gate","kind":"test.deny","hooks":["tool_pre_invoke","prompt_pre_fetch"],"mode":"enforce","priority":1}]"#,
    )
    .await;

    for body in [
        "not json at all",
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#,
        r#"{"jsonrpc":"2.0","id":1,"method":"prompts/list"}"#,
    ] {
        let action = manager.process_request(body, &helpers::no_headers()).await;
        assert_eq!(action, TransportAction::forward(body), "{body}");
    }
}

#[tokio::test]
async fn test_equal_priorities_keep_document_order() {
    let manager = helpers::test_manager(
        r#"[
            {"name":"c","kind":"test.tag","hooks":["tool_pre_invoke"],"mode":"monitor","priority":2},
            {"name":"a","kind":"test.tag","hooks":["tool_pre_invoke"],"mode":"monitor","priority":1},
            {"name":"b","kind":"test.tag","hooks":["tool_pre_invoke"],"mode":"monitor","priority":1},
            {"name":"z","kind":"test.tag","hooks":["tool_pre_invoke"],"mode":"monitor","priority":-3}
        ]"#,
    )
    .await;

    let body = helpers::tool_call(1, json!({}));
    let result = verdict(manager.inspect(&body, &helpers::no_headers()).await.unwrap());
    assert_eq!(result.modified_body, format!("{body}|z|a|b|c"));

    let index = manager.snapshot().await;
    let names: Vec<&str> = index
        .chain(HookPoint::ToolPreInvoke)
        .iter()
        .map(|p| p.name())
        .collect();
    assert_eq!(names, vec!["z", "a", "b", "c"]);
}

#[tokio::test]
async fn test_enforce_block_stops_the_chain() {
    let manager = helpers::test_manager(
        r#"[
            {"name":"first","kind":"test.tag","hooks":["tool_pre_invoke"],"mode":"monitor","priority":1},
            {"name":"gate","kind":"test.deny","hooks":["tool_pre_invoke"],"mode":"enforce","priority":2},
            {"name":"after","kind":"test.tag","hooks":["tool_pre_invoke"],"mode":"monitor","priority":3}
        ]"#,
    )
    .await;

    let body = helpers::tool_call(1, json!({}));
    let result = verdict(manager.inspect(&body, &helpers::no_headers()).await.unwrap());

    assert!(!result.allow);
    assert_eq!(result.error.as_deref(), Some("gate says no"));
    assert_eq!(result.blocked_by.as_deref(), Some("gate"));
    assert!(result.modified_body.ends_with("|first"));
    assert!(!result.modified_body.contains("|after"));
}

#[tokio::test]
async fn test_warn_and_monitor_never_block() {
    let manager = helpers::test_manager(
        r#"[
            {"name":"watch","kind":"test.deny","hooks":["prompt_pre_fetch"],"mode":"monitor","priority":1},
            {"name":"nag","kind":"test.deny","hooks":["prompt_pre_fetch"],"mode":"warn","priority":2},
            {"name":"boom","kind":"test.panic","hooks":["prompt_pre_fetch"],"mode":"warn","priority":3}
        ]"#,
    )
    .await;

    let body = r#"{"jsonrpc":"2.0","id":3,"method":"prompts/get","params":{"name":"p"}}"#;
    let result = verdict(manager.inspect(body, &helpers::no_headers()).await.unwrap());

    assert!(result.allow);
    assert_eq!(result.modified_body, body);
    assert_eq!(result.warnings.len(), 2);
    assert_eq!(result.warnings[0], "nag: nag says no");
    assert!(result.warnings[1].starts_with("boom: plugin error:"));
}

#[tokio::test]
async fn test_panicking_enforce_plugin_blocks() {
    let manager = helpers::test_manager(
        r#"[{"name":"boom","kind":"test.panic","hooks":["tool_pre_invoke"],"mode":"enforce","priority":1}]"#,
    )
    .await;

    let body = helpers::tool_call(4, json!({}));
    let action = manager.process_request(&body, &helpers::no_headers()).await;
    let (status, envelope) = helpers::reject_body(&action);

    assert_eq!(status, 403);
    let reason = envelope["error"]["data"]["reason"].as_str().unwrap();
    assert!(reason.starts_with("Plugin 'boom' failed:"));
}

#[tokio::test]
async fn test_mutations_compose_across_plugins() {
    let manager = helpers::builtin_manager(
        r#"[
            {"name":"pii","kind":"plugins.pii","hooks":["tool_pre_invoke"],"mode":"enforce","priority":1},
            {"name":"sql","kind":"plugins.sql_sanitizer","hooks":["tool_pre_invoke"],"mode":"warn","priority":2,"config":{"block_on_violation":false}}
        ]"#,
    )
    .await;

    let body = helpers::tool_call(
        5,
        json!({"sql": "UPDATE users SET email = 'x@y.org'", "ssn": "123-45-6789"}),
    );
    let result = verdict(manager.inspect(&body, &helpers::no_headers()).await.unwrap());

    assert!(result.allow);
    assert!(result.modified_body.contains("[REDACTED_EMAIL]"));
    assert!(result.modified_body.contains("[REDACTED_SSN]"));
    assert_eq!(
        result.warnings,
        vec!["UPDATE statement without WHERE clause".to_string()]
    );
    assert_eq!(result.metadata.get("piiDetected"), Some(&json!(true)));
    assert_eq!(result.metadata.get("sqlStatementsChecked"), Some(&json!(1)));
}

#[tokio::test]
async fn test_sql_sanitizer_judges_the_rewritten_arguments() {
    let manager = helpers::test_manager(
        r#"[
            {"name":"fixer","kind":"test.rewrite","hooks":["tool_pre_invoke"],"mode":"monitor","priority":1,
             "config":{"from":"DELETE FROM users","to":"DELETE FROM users WHERE id = 1"}},
            {"name":"sql","kind":"plugins.sql_sanitizer","hooks":["tool_pre_invoke"],"mode":"enforce","priority":2}
        ]"#,
    )
    .await;

    let body = helpers::tool_call(11, json!({"sql": "DELETE FROM users"}));
    let action = manager.process_request(&body, &helpers::no_headers()).await;

    let TransportAction::Forward { body: forwarded, .. } = action else {
        panic!("expected forward, got {action:?}");
    };
    assert!(forwarded.contains("DELETE FROM users WHERE id = 1"));
}

#[tokio::test]
async fn test_sql_sanitizer_blocks_injected_statement() {
    let manager = helpers::test_manager(
        r#"[
            {"name":"injector","kind":"test.rewrite","hooks":["tool_pre_invoke"],"mode":"monitor","priority":1,
             "config":{"from":"SELECT 1","to":"DROP TABLE users"}},
            {"name":"sql","kind":"plugins.sql_sanitizer","hooks":["tool_pre_invoke"],"mode":"enforce","priority":2}
        ]"#,
    )
    .await;

    let body = helpers::tool_call(12, json!({"sql": "SELECT 1"}));
    let action = manager.process_request(&body, &helpers::no_headers()).await;
    let (status, envelope) = helpers::reject_body(&action);

    assert_eq!(status, 403);
    assert_eq!(envelope["error"]["data"]["blockedBy"], json!("sql"));
    let reason = envelope["error"]["data"]["reason"].as_str().unwrap();
    assert!(reason.contains("blocked pattern"));
}

#[tokio::test]
async fn test_sql_sanitizer_sees_redacted_arguments() {
    let manager = helpers::builtin_manager(
        r#"[
            {"name":"pii","kind":"plugins.pii","hooks":["tool_pre_invoke"],"mode":"enforce","priority":1},
            {"name":"sql","kind":"plugins.sql_sanitizer","hooks":["tool_pre_invoke"],"mode":"enforce","priority":2,
             "config":{"blocked_patterns":["[a-z]+@[a-z]+\\.com"]}}
        ]"#,
    )
    .await;

    let body = helpers::tool_call(
        13,
        json!({"sql": "SELECT * FROM users WHERE email = 'a@b.com'"}),
    );
    let result = verdict(manager.inspect(&body, &helpers::no_headers()).await.unwrap());

    assert!(result.allow, "{:?}", result.error);
    assert!(result.modified_body.contains("[REDACTED_EMAIL]"));
    assert_eq!(result.metadata.get("sqlViolations"), Some(&json!([])));
    assert_eq!(result.metadata.get("sqlStatementsChecked"), Some(&json!(1)));
}

#[tokio::test]
async fn test_content_length_counts_utf8_bytes() {
    let manager = helpers::builtin_manager(
        r#"[{"name":"pii","kind":"plugins.pii","hooks":["tool_pre_invoke"],"mode":"enforce","priority":1}]"#,
    )
    .await;

    let body = helpers::tool_call(6, json!({"note": "café für ana@example.com"}));
    let action = manager.process_request(&body, &helpers::no_headers()).await;

    let TransportAction::Forward {
        body: forwarded,
        content_length,
    } = action
    else {
        panic!("expected forward");
    };
    assert!(forwarded.contains("[REDACTED_EMAIL]"));
    assert_eq!(content_length, forwarded.len());
    assert!(content_length > forwarded.chars().count());
}

#[tokio::test]
async fn test_response_runs_post_hook() {
    let manager = helpers::builtin_manager(
        r#"[{"name":"pii","kind":"plugins.pii","hooks":["tool_post_invoke"],"mode":"enforce","priority":1}]"#,
    )
    .await;

    let request = helpers::tool_call(8, json!({}));
    let response = r#"{"jsonrpc":"2.0","id":8,"result":{"content":[{"type":"text","text":"SSN 123-45-6789"}]}}"#;

    let action = manager
        .process_response(&request, response, &helpers::no_headers())
        .await;
    assert!(action.is_forward());
    assert!(action.body().contains("[REDACTED_SSN]"));

    let error = r#"{"jsonrpc":"2.0","id":8,"error":{"code":-1,"message":"ssn 123-45-6789"}}"#;
    let action = manager
        .process_response(&request, error, &helpers::no_headers())
        .await;
    assert_eq!(action, TransportAction::forward(error));
}

#[tokio::test]
async fn test_headers_reach_plugins_lowercased() {
    use std::sync::Arc;

    use mcpguard::mcpguard_core::config::{DocumentFormat, PipelineConfig};
    use mcpguard::mcpguard_plugin::prelude::*;
    use mcpguard::mcpguard_plugin::traits::FnModule;
    use mcpguard::mcpguard_plugin::{PipelineManager, PluginRegistry};

    let mut registry = PluginRegistry::new();
    registry
        .register(
            "test.tenant",
            Arc::new(FnModule::new(|_| {
                Ok(PluginHandlers::new().process(FnHandler::shared("tenant", |ctx| {
                    let allow = ctx.header("x-tenant") == Some("acme");
                    Ok(PluginOutput::Allow(allow))
                })))
            })),
        )
        .unwrap();
    let manager = PipelineManager::new(Arc::new(registry), PipelineConfig::default());
    manager
        .reload_from_str(
            r#"[{"name":"tenant","kind":"test.tenant","hooks":["tool_pre_invoke"],"mode":"enforce","priority":1}]"#,
            DocumentFormat::Json,
            None,
        )
        .await
        .unwrap();

    let body = helpers::tool_call(9, json!({}));
    let mut headers = helpers::no_headers();
    headers.insert("X-Tenant".to_string(), "acme".to_string());
    assert!(manager.process_request(&body, &headers).await.is_forward());

    let action = manager.process_request(&body, &helpers::no_headers()).await;
    let (_, envelope) = helpers::reject_body(&action);
    assert_eq!(
        envelope["error"]["data"]["reason"],
        json!("Blocked by plugin 'tenant'")
    );
}
