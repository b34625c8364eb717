//! Plugin module contract and closure-based helpers.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::descriptor::PluginDescriptor;
use crate::error::PluginError;
use crate::hooks::definitions::{ExecutionContext, HookPoint, PluginOutput};
use crate::hooks::registry::HookHandler;

/// A plugin implementation registered under a `kind`.
///
/// The registry calls [`PluginModule::instantiate`] once per descriptor of
/// that kind; the module binds the descriptor's config into a fresh
/// instance and returns its handlers.
pub trait PluginModule: Send + Sync + std::fmt::Debug {
    /// Builds one plugin instance for `descriptor`.
    fn instantiate(&self, descriptor: &PluginDescriptor) -> Result<PluginHandlers, PluginError>;
}

/// Handler table of one plugin instance.
#[derive(Debug, Clone, Default)]
pub struct PluginHandlers {
    /// Hook-specific handlers.
    by_hook: HashMap<HookPoint, Arc<dyn HookHandler>>,
    /// Generic handler used for hooks without a specific one.
    process: Option<Arc<dyn HookHandler>>,
}

impl PluginHandlers {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the handler for one hook.
    pub fn on(mut self, hook: HookPoint, handler: Arc<dyn HookHandler>) -> Self {
        self.by_hook.insert(hook, handler);
        self
    }

    /// Sets the generic `process` handler.
    pub fn process(mut self, handler: Arc<dyn HookHandler>) -> Self {
        self.process = Some(handler);
        self
    }

    /// Sets the `tool_pre_invoke` handler.
    pub fn on_tool_pre_invoke(self, handler: Arc<dyn HookHandler>) -> Self {
        self.on(HookPoint::ToolPreInvoke, handler)
    }

    /// Resolves the handler for a hook: the hook-specific one, else `process`.
    pub fn resolve(&self, hook: HookPoint) -> Option<Arc<dyn HookHandler>> {
        self.by_hook
            .get(&hook)
            .cloned()
            .or_else(|| self.process.clone())
    }
}

type HandlerFuture = Pin<Box<dyn Future<Output = Result<PluginOutput, PluginError>> + Send>>;

type BoxedHandlerFn = Arc<dyn Fn(&ExecutionContext) -> HandlerFuture + Send + Sync>;

/// A closure-based hook handler.
pub struct FnHandler {
    /// Label used in debug output.
    label: String,
    handler: BoxedHandlerFn,
}

impl std::fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler")
            .field("label", &self.label)
            .field("handler", &"<closure>")
            .finish()
    }
}

impl FnHandler {
    /// Wraps an async closure. The closure gets a clone of the context so
    /// the returned future may own it.
    pub fn new<F, Fut>(label: &str, handler: F) -> Self
    where
        F: Fn(ExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<PluginOutput, PluginError>> + Send + 'static,
    {
        Self {
            label: label.to_string(),
            handler: Arc::new(move |ctx: &ExecutionContext| -> HandlerFuture {
                Box::pin(handler(ctx.clone()))
            }),
        }
    }

    /// Wraps a synchronous closure.
    pub fn sync<F>(label: &str, handler: F) -> Self
    where
        F: Fn(&ExecutionContext) -> Result<PluginOutput, PluginError> + Send + Sync + 'static,
    {
        Self {
            label: label.to_string(),
            handler: Arc::new(move |ctx: &ExecutionContext| -> HandlerFuture {
                let output = handler(ctx);
                Box::pin(async move { output })
            }),
        }
    }

    /// Wraps a synchronous closure into a shared handler.
    pub fn shared<F>(label: &str, handler: F) -> Arc<dyn HookHandler>
    where
        F: Fn(&ExecutionContext) -> Result<PluginOutput, PluginError> + Send + Sync + 'static,
    {
        Arc::new(Self::sync(label, handler))
    }
}

#[async_trait]
impl HookHandler for FnHandler {
    async fn handle(&self, ctx: &ExecutionContext) -> Result<PluginOutput, PluginError> {
        (self.handler)(ctx).await
    }
}

type BoxedModuleFn =
    Arc<dyn Fn(&PluginDescriptor) -> Result<PluginHandlers, PluginError> + Send + Sync>;

/// A closure-based plugin module.
pub struct FnModule {
    factory: BoxedModuleFn,
}

impl std::fmt::Debug for FnModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnModule")
            .field("factory", &"<closure>")
            .finish()
    }
}

impl FnModule {
    /// Wraps a factory closure.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&PluginDescriptor) -> Result<PluginHandlers, PluginError> + Send + Sync + 'static,
    {
        Self {
            factory: Arc::new(factory),
        }
    }
}

impl PluginModule for FnModule {
    fn instantiate(&self, descriptor: &PluginDescriptor) -> Result<PluginHandlers, PluginError> {
        (self.factory)(descriptor)
    }
}
