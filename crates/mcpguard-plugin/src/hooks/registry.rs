//! Hook index: per-hook chains of bound plugin handlers in priority order.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::definitions::{ExecutionContext, HookPoint, PluginMode, PluginOutput};
use crate::config::descriptor::PluginDescriptor;
use crate::error::PluginError;

/// Trait for hook handler implementations.
#[async_trait]
pub trait HookHandler: Send + Sync + std::fmt::Debug {
    /// Inspects a request and returns the plugin's output.
    async fn handle(&self, ctx: &ExecutionContext) -> Result<PluginOutput, PluginError>;
}

/// A plugin instance bound to the handler it runs for one hook.
#[derive(Debug, Clone)]
pub struct BoundPlugin {
    /// The validated descriptor the instance was built from.
    pub descriptor: Arc<PluginDescriptor>,
    /// The resolved handler.
    pub handler: Arc<dyn HookHandler>,
}

impl BoundPlugin {
    /// Plugin name.
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Plugin mode.
    pub fn mode(&self) -> PluginMode {
        self.descriptor.mode
    }

    /// Plugin priority.
    pub fn priority(&self) -> i64 {
        self.descriptor.priority
    }
}

/// Immutable snapshot of every hook's plugin chain.
///
/// Built wholesale from a descriptor list and never modified afterwards;
/// a reload produces a new index.
#[derive(Debug, Default)]
pub struct HookIndex {
    /// Hook point → chain sorted by priority, ties in insertion order.
    chains: HashMap<HookPoint, Vec<BoundPlugin>>,
    /// Number of distinct plugin instances in the index.
    plugin_count: usize,
}

impl HookIndex {
    /// An index with no plugins; every request passes through.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Starts building an index.
    pub fn builder() -> HookIndexBuilder {
        HookIndexBuilder::default()
    }

    /// Returns the chain for a hook, in execution order.
    pub fn chain(&self, hook: HookPoint) -> &[BoundPlugin] {
        self.chains.get(&hook).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns whether any plugin is bound to a hook.
    pub fn has_plugins(&self, hook: HookPoint) -> bool {
        !self.chain(hook).is_empty()
    }

    /// Returns the number of plugins bound to a hook.
    pub fn handler_count(&self, hook: HookPoint) -> usize {
        self.chain(hook).len()
    }

    /// Returns the hooks with at least one plugin, in canonical order.
    pub fn registered_hooks(&self) -> Vec<HookPoint> {
        HookPoint::ALL
            .into_iter()
            .filter(|hook| self.has_plugins(*hook))
            .collect()
    }

    /// Number of distinct plugin instances.
    pub fn plugin_count(&self) -> usize {
        self.plugin_count
    }

    /// Returns true when no plugin is bound to any hook.
    pub fn is_empty(&self) -> bool {
        self.chains.values().all(Vec::is_empty)
    }
}

/// Accumulates bound plugins and produces a sorted [`HookIndex`].
#[derive(Debug, Default)]
pub struct HookIndexBuilder {
    chains: HashMap<HookPoint, Vec<BoundPlugin>>,
    plugin_count: usize,
}

impl HookIndexBuilder {
    /// Adds one plugin instance with its handler for each declared hook.
    pub fn add(
        &mut self,
        descriptor: Arc<PluginDescriptor>,
        handlers: Vec<(HookPoint, Arc<dyn HookHandler>)>,
    ) -> &mut Self {
        for (hook, handler) in handlers {
            debug!(
                hook = %hook,
                plugin = %descriptor.name,
                priority = descriptor.priority,
                mode = %descriptor.mode,
                "Binding plugin to hook"
            );
            self.chains.entry(hook).or_default().push(BoundPlugin {
                descriptor: descriptor.clone(),
                handler,
            });
        }
        self.plugin_count += 1;
        self
    }

    /// Sorts every chain by priority and freezes the index.
    pub fn build(self) -> HookIndex {
        let mut chains = self.chains;
        for chain in chains.values_mut() {
            // Stable: equal priorities keep insertion order.
            chain.sort_by_key(BoundPlugin::priority);
        }
        HookIndex {
            chains,
            plugin_count: self.plugin_count,
        }
    }
}
