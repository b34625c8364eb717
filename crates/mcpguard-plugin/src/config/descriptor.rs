//! Validated plugin descriptors.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PluginError;
use crate::hooks::definitions::{HookPoint, Metadata, PluginMode};

/// One validated entry of the plugin configuration document.
///
/// Immutable after validation; each descriptor becomes exactly one plugin
/// instance when the index is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Unique plugin name.
    pub name: String,
    /// Identifier of the registered implementation, e.g. `plugins.pii`.
    pub kind: String,
    /// Hooks this plugin participates in, without duplicates.
    pub hooks: Vec<HookPoint>,
    /// How negative verdicts are treated.
    pub mode: PluginMode,
    /// Ordering key; lower runs earlier.
    pub priority: i64,
    /// Plugin-specific settings.
    #[serde(default)]
    pub config: Metadata,
}

impl PluginDescriptor {
    /// Creates a descriptor with an empty config.
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        hooks: &[HookPoint],
        mode: PluginMode,
        priority: i64,
    ) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            hooks: hooks.to_vec(),
            mode,
            priority,
            config: Metadata::new(),
        }
    }

    /// Replaces the config map.
    pub fn with_config(mut self, config: Metadata) -> Self {
        self.config = config;
        self
    }

    /// Deserializes the config map into a plugin's typed settings.
    pub fn config_as<T: DeserializeOwned>(&self) -> Result<T, PluginError> {
        serde_json::from_value(Value::Object(self.config.clone()))
            .map_err(|e| PluginError::invalid_config(&self.name, e.to_string()))
    }
}
