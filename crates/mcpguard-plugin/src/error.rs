//! Errors raised by plugin modules and handlers.

use mcpguard_core::error::AppError;
use thiserror::Error;

use crate::hooks::definitions::HookPoint;

/// Error type for plugin instantiation and handler execution.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The descriptor's `config` could not be bound to the plugin.
    #[error("invalid config for plugin '{plugin}': {reason}")]
    InvalidConfig {
        /// Plugin name from the descriptor.
        plugin: String,
        /// What was wrong.
        reason: String,
    },

    /// The implementation has no handler for a hook the descriptor declares.
    #[error("no handler for hook '{hook}'")]
    MissingHandler {
        /// The unresolved hook.
        hook: HookPoint,
    },

    /// A handler failed while inspecting a request.
    #[error("{0}")]
    Handler(String),

    /// A handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

impl PluginError {
    /// Convenience constructor for handler failures.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }

    /// Convenience constructor for config binding failures.
    pub fn invalid_config(plugin: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            plugin: plugin.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<PluginError> for AppError {
    fn from(err: PluginError) -> Self {
        AppError::plugin(err.to_string())
    }
}
