//! Prelude for plugin implementations.

pub use async_trait::async_trait;

pub use crate::config::descriptor::PluginDescriptor;
pub use crate::error::PluginError;
pub use crate::hooks::definitions::{
    ExecutionContext, HookPoint, Metadata, PluginMode, PluginOutput, PluginVerdict,
};
pub use crate::hooks::registry::HookHandler;
pub use crate::traits::{FnHandler, PluginHandlers, PluginModule};
