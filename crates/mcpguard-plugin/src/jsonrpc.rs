//! JSON-RPC 2.0 error envelopes returned to the caller when a request is
//! rejected.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::hooks::definitions::{ExecutionResult, HookPoint};

/// Implementation-defined server error used for policy blocks.
pub const POLICY_VIOLATION: i64 = -32000;

/// Standard JSON-RPC internal error.
pub const INTERNAL_ERROR: i64 = -32603;

/// The `error` member of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Short description.
    pub message: String,
    /// Structured detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// A policy block raised by the plugin chain.
    pub fn policy_violation(hook: HookPoint, result: &ExecutionResult) -> Self {
        let reason = result
            .error
            .clone()
            .unwrap_or_else(|| "Request blocked".to_string());

        Self {
            code: POLICY_VIOLATION,
            message: format!("Request blocked by policy: {reason}"),
            data: Some(json!({
                "reason": reason,
                "hook": hook.as_str(),
                "warnings": result.warnings,
                "blockedBy": result.blocked_by,
            })),
        }
    }

    /// A fault in the pipeline itself. Carries no detail.
    pub fn internal() -> Self {
        Self {
            code: INTERNAL_ERROR,
            message: "Internal error".to_string(),
            data: None,
        }
    }
}

/// A JSON-RPC error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always `2.0`.
    pub jsonrpc: String,
    /// The request id, or null when unknown.
    pub id: Value,
    /// The error.
    pub error: JsonRpcError,
}

impl ErrorEnvelope {
    /// Wraps an error for the request with `id`.
    pub fn new(id: Option<Value>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            error,
        }
    }

    /// Serializes the envelope.
    pub fn to_body(&self) -> String {
        // A struct of strings and JSON values always serializes.
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"Internal error"}}"#
                .to_string()
        })
    }
}

/// Extracts the id of a JSON-RPC request body, if there is one.
pub fn request_id(body: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(mut map)) => map.remove("id"),
        _ => None,
    }
}
