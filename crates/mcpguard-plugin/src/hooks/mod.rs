//! Hook system: typed hook definitions, the per-hook plugin index, and the
//! JSON-RPC dispatcher.

pub mod definitions;
pub mod dispatcher;
pub mod registry;

pub use definitions::{
    ExecutionContext, ExecutionResult, HookPoint, Metadata, MethodCategory, PluginMode,
    PluginOutput, PluginVerdict,
};
pub use dispatcher::{Dispatch, HookDispatcher};
pub use registry::{BoundPlugin, HookHandler, HookIndex};
