//! # mcpguard-plugin
//!
//! Request-inspection pipeline for MCP Guard. Provides:
//!
//! - Plugin configuration parsing (JSON and a minimal YAML subset) and
//!   per-entry validation
//! - Plugin registry mapping a `kind` to its implementation module
//! - Immutable per-hook index with priority-ordered chains
//! - JSON-RPC hook dispatcher for requests and responses
//! - Plugin executor with enforce/monitor/warn semantics
//! - Pipeline manager with atomic reload and the transport contract

pub mod config;
pub mod error;
pub mod executor;
pub mod hooks;
pub mod jsonrpc;
pub mod manager;
pub mod prelude;
pub mod registry;
pub mod traits;
pub mod transport;

pub use config::{ConfigDocument, PluginDescriptor, ValidationReport};
pub use error::PluginError;
pub use executor::PluginExecutor;
pub use hooks::definitions::{
    ExecutionContext, ExecutionResult, HookPoint, PluginMode, PluginOutput, PluginVerdict,
};
pub use hooks::dispatcher::HookDispatcher;
pub use hooks::registry::HookIndex;
pub use manager::{Inspection, LoadSummary, PipelineManager};
pub use registry::PluginRegistry;
pub use transport::TransportAction;
