//! Hook dispatcher: classifies JSON-RPC traffic and builds execution
//! contexts.
//!
//! Requests:
//! - `tools/call`, `prompts/get` and `resources/read` map to their
//!   category's pre hook.
//! - Any other method under `tools/`, `prompts/` or `resources/` maps to the
//!   same pre hook, except the list operations.
//! - Everything else, including malformed bodies, passes through.
//!
//! Responses map to the post hook of the request's category. The dispatcher
//! never blocks or mutates anything.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use super::definitions::{ExecutionContext, HookPoint, Metadata, MethodCategory};

/// Methods that enumerate rather than act; never inspected.
const LIST_METHODS: [&str; 4] = [
    "tools/list",
    "prompts/list",
    "resources/list",
    "resources/templates/list",
];

/// A classified message ready for the executor.
#[derive(Debug, Clone)]
pub struct Dispatch {
    /// Hook the message maps to.
    pub hook: HookPoint,
    /// Context for the plugin chain.
    pub context: ExecutionContext,
}

/// A parsed JSON-RPC 2.0 request envelope.
struct Envelope {
    method: String,
    params: Value,
    id: Option<Value>,
}

/// Maps inbound JSON-RPC messages to hooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct HookDispatcher;

impl HookDispatcher {
    /// Creates a new hook dispatcher.
    pub fn new() -> Self {
        Self
    }

    /// Returns the pre hook a method maps to, if any.
    pub fn classify(&self, method: &str) -> Option<HookPoint> {
        match method {
            "tools/call" => return Some(HookPoint::ToolPreInvoke),
            "prompts/get" => return Some(HookPoint::PromptPreFetch),
            "resources/read" => return Some(HookPoint::ResourcePreFetch),
            m if LIST_METHODS.contains(&m) => return None,
            _ => {}
        }

        MethodCategory::ALL
            .into_iter()
            .find(|category| method.starts_with(category.prefix()))
            .map(|category| category.pre_hook())
    }

    /// Classifies a request body and builds its context.
    ///
    /// Returns `None` when the body should pass through untouched.
    pub fn dispatch(&self, raw_body: &str, headers: &BTreeMap<String, String>) -> Option<Dispatch> {
        let envelope = parse_request(raw_body)?;
        let Some(hook) = self.classify(&envelope.method) else {
            debug!(method = %envelope.method, "Method not inspected");
            return None;
        };

        let metadata = request_metadata(&envelope, hook.category(), headers);
        let mut context =
            ExecutionContext::new(hook, envelope.method, envelope.params, raw_body);
        context.metadata = metadata;

        debug!(
            hook = %hook,
            method = %context.method,
            request_id = %context.request_id,
            "Request classified"
        );

        Some(Dispatch { hook, context })
    }

    /// Classifies a response to a previously seen request.
    ///
    /// The context carries the request's metadata, `params` holds the
    /// response `result`, and the body is the response body. Error
    /// responses and unparseable responses pass through.
    pub fn dispatch_response(
        &self,
        request_body: &str,
        response_body: &str,
        headers: &BTreeMap<String, String>,
    ) -> Option<Dispatch> {
        let envelope = parse_request(request_body)?;
        let category = self.classify(&envelope.method)?.category();
        let hook = category.post_hook();

        let response = match serde_json::from_str::<Value>(response_body) {
            Ok(Value::Object(map)) => map,
            _ => {
                debug!(hook = %hook, "Response is not a JSON object");
                return None;
            }
        };
        if response.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            return None;
        }
        let result = response.get("result")?.clone();

        let metadata = request_metadata(&envelope, category, headers);
        let mut context = ExecutionContext::new(hook, envelope.method, result, response_body);
        context.metadata = metadata;

        debug!(
            hook = %hook,
            method = %context.method,
            request_id = %context.request_id,
            "Response classified"
        );

        Some(Dispatch { hook, context })
    }
}

fn parse_request(raw_body: &str) -> Option<Envelope> {
    let Ok(Value::Object(mut map)) = serde_json::from_str::<Value>(raw_body) else {
        return None;
    };

    if map.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return None;
    }
    let Some(Value::String(method)) = map.remove("method") else {
        return None;
    };

    Some(Envelope {
        method,
        params: map.remove("params").unwrap_or(Value::Null),
        id: map.remove("id"),
    })
}

fn request_metadata(
    envelope: &Envelope,
    category: MethodCategory,
    headers: &BTreeMap<String, String>,
) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("method".to_string(), Value::String(envelope.method.clone()));

    let headers: Map<String, Value> = headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), Value::String(value.clone())))
        .collect();
    metadata.insert("headers".to_string(), Value::Object(headers));

    if let Some(id) = &envelope.id {
        metadata.insert("requestId".to_string(), id.clone());
    }

    let facts: &[(&str, &str)] = match category {
        MethodCategory::Tool => &[("toolName", "name"), ("toolArguments", "arguments")],
        MethodCategory::Prompt => &[("promptName", "name"), ("promptArguments", "arguments")],
        MethodCategory::Resource => &[("resourceUri", "uri")],
    };
    for (meta_key, param_key) in facts {
        if let Some(value) = envelope.params.get(*param_key) {
            metadata.insert((*meta_key).to_string(), value.clone());
        }
    }

    metadata
}
