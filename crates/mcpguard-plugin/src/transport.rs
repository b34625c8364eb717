//! What the host proxy should do with a message after inspection.

use serde::Serialize;
use serde_json::Value;

use crate::hooks::definitions::{ExecutionResult, HookPoint};
use crate::jsonrpc::{ErrorEnvelope, JsonRpcError};

/// HTTP status for a policy block.
pub const STATUS_FORBIDDEN: u16 = 403;

/// HTTP status for a pipeline fault.
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Instruction for the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TransportAction {
    /// Send `body` on to its destination.
    Forward {
        /// Final body.
        body: String,
        /// UTF-8 byte length of `body`.
        content_length: usize,
    },
    /// Answer the caller directly with a JSON-RPC error.
    Reject {
        /// HTTP status code.
        status: u16,
        /// JSON-RPC error envelope.
        body: String,
        /// UTF-8 byte length of `body`.
        content_length: usize,
    },
}

impl TransportAction {
    /// Forwards `body` unchanged.
    pub fn forward(body: impl Into<String>) -> Self {
        let body = body.into();
        Self::Forward {
            content_length: body.len(),
            body,
        }
    }

    /// Renders a pipeline verdict.
    pub fn from_result(hook: HookPoint, request_id: Option<Value>, result: ExecutionResult) -> Self {
        if result.allow {
            return Self::forward(result.modified_body);
        }

        let envelope = ErrorEnvelope::new(request_id, JsonRpcError::policy_violation(hook, &result));
        Self::reject(STATUS_FORBIDDEN, envelope.to_body())
    }

    /// Rejects with a bare internal error.
    pub fn internal_error(request_id: Option<Value>) -> Self {
        let envelope = ErrorEnvelope::new(request_id, JsonRpcError::internal());
        Self::reject(STATUS_INTERNAL_ERROR, envelope.to_body())
    }

    fn reject(status: u16, body: String) -> Self {
        Self::Reject {
            status,
            content_length: body.len(),
            body,
        }
    }

    /// Returns the body to send.
    pub fn body(&self) -> &str {
        match self {
            Self::Forward { body, .. } | Self::Reject { body, .. } => body,
        }
    }

    /// Returns the content length to announce.
    pub fn content_length(&self) -> usize {
        match self {
            Self::Forward { content_length, .. } | Self::Reject { content_length, .. } => {
                *content_length
            }
        }
    }

    /// Returns true for [`TransportAction::Forward`].
    pub fn is_forward(&self) -> bool {
        matches!(self, Self::Forward { .. })
    }
}
