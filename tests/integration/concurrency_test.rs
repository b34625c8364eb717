//! Lazy initialization and concurrent inspection.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use serde_json::json;

use mcpguard::mcpguard_core::config::{DocumentFormat, PipelineConfig};
use mcpguard::mcpguard_plugin::{PipelineManager, TransportAction};

use crate::helpers;

const COUNTED_DOC: &str = r#"[{"name":"counted","kind":"test.counted","hooks":["tool_pre_invoke"],"mode":"monitor","priority":1}]"#;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_requests_initialize_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plugins.json");
    tokio::fs::write(&path, COUNTED_DOC).await.unwrap();

    let instances = Arc::new(AtomicUsize::new(0));
    let manager = Arc::new(PipelineManager::new(
        helpers::test_registry(instances.clone()),
        PipelineConfig {
            plugins_path: path.to_string_lossy().into_owned(),
            format: DocumentFormat::Auto,
            lazy_init: true,
        },
    ));

    let requests = (0..16).map(|id| {
        let manager = manager.clone();
        tokio::spawn(async move {
            let body = helpers::tool_call(id, json!({"n": id}));
            let action = manager.process_request(&body, &helpers::no_headers()).await;
            (body, action)
        })
    });

    for joined in join_all(requests).await {
        let (body, action) = joined.unwrap();
        assert_eq!(action, TransportAction::forward(body));
    }
    assert!(manager.is_initialized());
    assert_eq!(instances.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_document_is_internal_error() {
    let manager = PipelineManager::new(
        helpers::test_registry(Arc::new(AtomicUsize::new(0))),
        PipelineConfig {
            plugins_path: "does/not/exist.json".to_string(),
            format: DocumentFormat::Auto,
            lazy_init: true,
        },
    );

    let action = manager
        .process_request(&helpers::tool_call(3, json!({})), &helpers::no_headers())
        .await;
    let (status, envelope) = helpers::reject_body(&action);
    assert_eq!(status, 500);
    assert_eq!(envelope["id"], json!(3));
    assert_eq!(envelope["error"]["code"], json!(-32603));
    assert!(envelope["error"].get("data").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reload_during_traffic_never_mixes_indexes() {
    let manager = Arc::new(
        helpers::test_manager(
            r#"[{"name":"one","kind":"test.tag","hooks":["tool_pre_invoke"],"mode":"monitor","priority":1}]"#,
        )
        .await,
    );
    let body = helpers::tool_call(1, json!({}));

    let traffic = (0..32).map(|_| {
        let manager = manager.clone();
        let body = body.clone();
        tokio::spawn(async move { manager.process_request(&body, &helpers::no_headers()).await })
    });
    let reload = {
        let manager = manager.clone();
        tokio::spawn(async move {
            manager
                .reload_from_str(
                    r#"[
                        {"name":"two","kind":"test.tag","hooks":["tool_pre_invoke"],"mode":"monitor","priority":1},
                        {"name":"three","kind":"test.tag","hooks":["tool_pre_invoke"],"mode":"monitor","priority":2}
                    ]"#,
                    DocumentFormat::Json,
                    None,
                )
                .await
        })
    };

    let actions = join_all(traffic).await;
    reload.await.unwrap().unwrap();

    for action in actions {
        let forwarded = action.unwrap().body().to_string();
        assert!(
            forwarded == format!("{body}|one") || forwarded == format!("{body}|two|three"),
            "{forwarded}"
        );
    }
}
