//! Hook point definitions, plugin modes, and the per-request context and
//! result types that flow through a plugin chain.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Shallow key-value map carried alongside a request.
pub type Metadata = serde_json::Map<String, Value>;

/// The six recognized points in the RPC lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    /// Before a tool is invoked.
    ToolPreInvoke,
    /// After a tool returned a result.
    ToolPostInvoke,
    /// Before a prompt is fetched.
    PromptPreFetch,
    /// After a prompt was fetched.
    PromptPostFetch,
    /// Before a resource is read.
    ResourcePreFetch,
    /// After a resource was read.
    ResourcePostFetch,
}

impl HookPoint {
    /// Every hook point, in canonical order.
    pub const ALL: [HookPoint; 6] = [
        Self::ToolPreInvoke,
        Self::ToolPostInvoke,
        Self::PromptPreFetch,
        Self::PromptPostFetch,
        Self::ResourcePreFetch,
        Self::ResourcePostFetch,
    ];

    /// Returns the string name of this hook point.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToolPreInvoke => "tool_pre_invoke",
            Self::ToolPostInvoke => "tool_post_invoke",
            Self::PromptPreFetch => "prompt_pre_fetch",
            Self::PromptPostFetch => "prompt_post_fetch",
            Self::ResourcePreFetch => "resource_pre_fetch",
            Self::ResourcePostFetch => "resource_post_fetch",
        }
    }

    /// Returns the category this hook belongs to.
    pub fn category(&self) -> MethodCategory {
        match self {
            Self::ToolPreInvoke | Self::ToolPostInvoke => MethodCategory::Tool,
            Self::PromptPreFetch | Self::PromptPostFetch => MethodCategory::Prompt,
            Self::ResourcePreFetch | Self::ResourcePostFetch => MethodCategory::Resource,
        }
    }
}

impl std::fmt::Display for HookPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HookPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|hook| hook.as_str() == s)
            .ok_or_else(|| format!("unknown hook '{s}'"))
    }
}

/// Resource category addressed by a JSON-RPC method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodCategory {
    /// `tools/*`
    Tool,
    /// `prompts/*`
    Prompt,
    /// `resources/*`
    Resource,
}

impl MethodCategory {
    /// All categories, checked in this order when classifying a method.
    pub const ALL: [MethodCategory; 3] = [Self::Tool, Self::Prompt, Self::Resource];

    /// Method-name prefix for this category.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Tool => "tools/",
            Self::Prompt => "prompts/",
            Self::Resource => "resources/",
        }
    }

    /// Hook fired before the call.
    pub fn pre_hook(&self) -> HookPoint {
        match self {
            Self::Tool => HookPoint::ToolPreInvoke,
            Self::Prompt => HookPoint::PromptPreFetch,
            Self::Resource => HookPoint::ResourcePreFetch,
        }
    }

    /// Hook fired on the call's result.
    pub fn post_hook(&self) -> HookPoint {
        match self {
            Self::Tool => HookPoint::ToolPostInvoke,
            Self::Prompt => HookPoint::PromptPostFetch,
            Self::Resource => HookPoint::ResourcePostFetch,
        }
    }
}

/// How a plugin's negative verdict is treated by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginMode {
    /// A negative verdict blocks the request and stops the chain.
    Enforce,
    /// A negative verdict is observed only.
    Monitor,
    /// A negative verdict becomes a warning on the final result.
    Warn,
}

impl PluginMode {
    /// Returns the configuration name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enforce => "enforce",
            Self::Monitor => "monitor",
            Self::Warn => "warn",
        }
    }
}

impl std::fmt::Display for PluginMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PluginMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enforce" => Ok(Self::Enforce),
            "monitor" => Ok(Self::Monitor),
            "warn" => Ok(Self::Warn),
            other => Err(format!("unknown mode '{other}'")),
        }
    }
}

/// Per-request state handed to every plugin in a chain.
///
/// The executor keeps `body` and `metadata` current: each plugin sees the
/// body produced by the previous plugin and the metadata accumulated so far.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext {
    /// Unique id assigned when the request was classified.
    pub request_id: Uuid,
    /// When the request was classified.
    pub received_at: DateTime<Utc>,
    /// The hook this context was built for.
    pub hook: HookPoint,
    /// JSON-RPC method of the request.
    pub method: String,
    /// JSON-RPC params (or the response `result` for post hooks).
    pub params: Value,
    /// The serialized body exactly as received.
    pub original_body: String,
    /// The body as produced by the plugins executed so far.
    pub body: String,
    /// Request-derived facts plus anything plugins attached.
    pub metadata: Metadata,
}

impl ExecutionContext {
    /// Creates a context whose current body equals the original body.
    pub fn new(hook: HookPoint, method: impl Into<String>, params: Value, body: impl Into<String>) -> Self {
        let body = body.into();
        Self {
            request_id: Uuid::new_v4(),
            received_at: Utc::now(),
            hook,
            method: method.into(),
            params,
            original_body: body.clone(),
            body,
            metadata: Metadata::new(),
        }
    }

    /// Inserts a metadata value.
    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Gets a metadata value by key.
    pub fn get_metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Gets a string metadata value.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    /// Gets a request header by lower-cased name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.metadata
            .get("headers")
            .and_then(|h| h.get(name.to_ascii_lowercase()))
            .and_then(|v| v.as_str())
    }
}

/// Structured verdict a plugin may return. Unset fields take defaults:
/// allow, body unchanged, no error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginVerdict {
    /// Allow flag; `None` means allow.
    pub allow: Option<bool>,
    /// Replacement body; `None` keeps the current body.
    pub modified_body: Option<String>,
    /// Reason attached to a negative verdict.
    pub error: Option<String>,
    /// Warnings to append to the pipeline result.
    pub warnings: Vec<String>,
    /// Metadata to overlay onto the accumulated map.
    pub metadata: Metadata,
}

impl PluginVerdict {
    /// An allowing verdict with no changes.
    pub fn allow() -> Self {
        Self::default()
    }

    /// A negative verdict carrying a reason.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allow: Some(false),
            error: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Sets a replacement body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.modified_body = Some(body.into());
        self
    }

    /// Appends a warning.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Inserts a metadata value.
    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Anything a handler may return, normalized by the executor into an
/// [`ExecutionResult`].
#[derive(Debug, Clone, PartialEq)]
pub enum PluginOutput {
    /// Body replacement, allow.
    Body(String),
    /// Allow flag, body unchanged.
    Allow(bool),
    /// Structured verdict with defaults for unset fields.
    Verdict(PluginVerdict),
    /// Loosely-typed JSON output.
    Value(Value),
}

impl PluginOutput {
    /// Normalizes this output against the body the plugin was given.
    pub fn normalize(self, current_body: &str) -> ExecutionResult {
        match self {
            Self::Body(body) => ExecutionResult::allowed(body),
            Self::Allow(allow) => ExecutionResult {
                allow,
                ..ExecutionResult::allowed(current_body)
            },
            Self::Verdict(verdict) => ExecutionResult {
                allow: verdict.allow.unwrap_or(true),
                modified_body: verdict
                    .modified_body
                    .unwrap_or_else(|| current_body.to_string()),
                error: verdict.error,
                warnings: verdict.warnings,
                metadata: verdict.metadata,
                blocked_by: None,
            },
            Self::Value(value) => normalize_value(value, current_body),
        }
    }
}

impl From<String> for PluginOutput {
    fn from(body: String) -> Self {
        Self::Body(body)
    }
}

impl From<&str> for PluginOutput {
    fn from(body: &str) -> Self {
        Self::Body(body.to_string())
    }
}

impl From<bool> for PluginOutput {
    fn from(allow: bool) -> Self {
        Self::Allow(allow)
    }
}

impl From<PluginVerdict> for PluginOutput {
    fn from(verdict: PluginVerdict) -> Self {
        Self::Verdict(verdict)
    }
}

impl From<Value> for PluginOutput {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

fn normalize_value(value: Value, current_body: &str) -> ExecutionResult {
    match value {
        Value::String(body) => ExecutionResult::allowed(body),
        Value::Bool(allow) => ExecutionResult {
            allow,
            ..ExecutionResult::allowed(current_body)
        },
        Value::Object(mut map) => {
            let body = map
                .remove("modifiedBody")
                .or_else(|| map.remove("modified_body"))
                .or_else(|| map.remove("body"));

            ExecutionResult {
                allow: map.get("allow").and_then(Value::as_bool).unwrap_or(true),
                modified_body: match body {
                    Some(Value::String(body)) => body,
                    _ => current_body.to_string(),
                },
                error: map
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                warnings: map
                    .get("warnings")
                    .and_then(Value::as_array)
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|w| w.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default(),
                metadata: match map.remove("metadata") {
                    Some(Value::Object(metadata)) => metadata,
                    _ => Metadata::new(),
                },
                blocked_by: None,
            }
        }
        _ => ExecutionResult::allowed(current_body),
    }
}

/// Outcome of one plugin invocation, and of a whole chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// False iff the request is blocked.
    pub allow: bool,
    /// Body after all executed plugins.
    pub modified_body: String,
    /// Block reason, if any.
    pub error: Option<String>,
    /// Accumulated warnings.
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Final merged metadata.
    #[serde(default)]
    pub metadata: Metadata,
    /// Name of the plugin that blocked the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<String>,
}

impl ExecutionResult {
    /// An allowing result carrying `body`.
    pub fn allowed(body: impl Into<String>) -> Self {
        Self {
            allow: true,
            modified_body: body.into(),
            error: None,
            warnings: Vec::new(),
            metadata: Metadata::new(),
            blocked_by: None,
        }
    }
}
