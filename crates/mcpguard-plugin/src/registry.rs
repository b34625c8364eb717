//! Plugin registry: maps a plugin `kind` to its implementation module and
//! builds hook indexes from validated descriptors.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::descriptor::PluginDescriptor;
use crate::error::PluginError;
use crate::hooks::definitions::HookPoint;
use crate::hooks::registry::{HookHandler, HookIndex};
use crate::traits::PluginModule;

/// A descriptor that could not be turned into a plugin instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPlugin {
    /// Plugin name from the descriptor.
    pub name: String,
    /// Requested kind.
    pub kind: String,
    /// Why the descriptor was skipped.
    pub reason: String,
}

/// Result of building an index from descriptors.
#[derive(Debug)]
pub struct IndexBuild {
    /// The new index.
    pub index: HookIndex,
    /// Descriptors left out of the index.
    pub skipped: Vec<SkippedPlugin>,
}

/// Registry of plugin implementation modules, keyed by kind.
///
/// Populated at startup, then shared read-only.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    /// Kind → implementation module.
    modules: HashMap<String, Arc<dyn PluginModule>>,
}

impl PluginRegistry {
    /// Creates a new empty plugin registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an implementation module under `kind`.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        module: Arc<dyn PluginModule>,
    ) -> Result<(), String> {
        let kind = kind.into();
        if self.modules.contains_key(&kind) {
            return Err(format!("Plugin kind '{kind}' is already registered"));
        }

        info!(kind = %kind, "Registering plugin module");
        self.modules.insert(kind, module);
        Ok(())
    }

    /// Checks whether a kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.modules.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.modules.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Returns module count.
    pub fn count(&self) -> usize {
        self.modules.len()
    }

    /// Instantiates every descriptor and indexes the instances per hook.
    ///
    /// Descriptors with an unknown kind, a failing instantiation, or a hook
    /// the instance cannot handle are skipped; nothing here is fatal.
    pub fn load(&self, descriptors: &[PluginDescriptor]) -> IndexBuild {
        let mut builder = HookIndex::builder();
        let mut skipped = Vec::new();

        for descriptor in descriptors {
            match self.bind(descriptor) {
                Ok(handlers) => {
                    info!(
                        plugin = %descriptor.name,
                        kind = %descriptor.kind,
                        priority = descriptor.priority,
                        mode = %descriptor.mode,
                        hooks = handlers.len(),
                        "Plugin instantiated"
                    );
                    builder.add(Arc::new(descriptor.clone()), handlers);
                }
                Err(reason) => {
                    warn!(
                        plugin = %descriptor.name,
                        kind = %descriptor.kind,
                        reason = %reason,
                        "Skipping plugin"
                    );
                    skipped.push(SkippedPlugin {
                        name: descriptor.name.clone(),
                        kind: descriptor.kind.clone(),
                        reason,
                    });
                }
            }
        }

        let index = builder.build();
        info!(
            plugins = index.plugin_count(),
            skipped = skipped.len(),
            "Hook index built"
        );

        IndexBuild { index, skipped }
    }

    fn bind(
        &self,
        descriptor: &PluginDescriptor,
    ) -> Result<Vec<(HookPoint, Arc<dyn HookHandler>)>, String> {
        let module = self
            .modules
            .get(&descriptor.kind)
            .ok_or_else(|| format!("unknown plugin kind '{}'", descriptor.kind))?;

        let handlers = module
            .instantiate(descriptor)
            .map_err(|e| format!("instantiation failed: {e}"))?;

        descriptor
            .hooks
            .iter()
            .map(|hook| {
                handlers
                    .resolve(*hook)
                    .map(|handler| (*hook, handler))
                    .ok_or_else(|| PluginError::MissingHandler { hook: *hook }.to_string())
            })
            .collect()
    }
}
