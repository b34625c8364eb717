//! Pipeline manager: owns the active hook index and runs requests through
//! dispatcher and executor.
//!
//! The index is an immutable snapshot behind a short-lived lock: readers
//! clone the `Arc` and release, a reload swaps in a freshly built index.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{OnceCell, RwLock};
use tracing::{error, info, warn};

use mcpguard_core::config::{DocumentFormat, PipelineConfig};
use mcpguard_core::error::AppError;
use mcpguard_core::result::AppResult;

use crate::config::descriptor::PluginDescriptor;
use crate::config::document::ConfigDocument;
use crate::config::validator::validate;
use crate::executor::PluginExecutor;
use crate::hooks::definitions::{ExecutionResult, HookPoint};
use crate::hooks::dispatcher::{Dispatch, HookDispatcher};
use crate::hooks::registry::HookIndex;
use crate::jsonrpc;
use crate::registry::{PluginRegistry, SkippedPlugin};
use crate::transport::TransportAction;

/// Outcome of loading a plugin configuration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadSummary {
    /// Entries that passed validation.
    pub accepted: usize,
    /// Entries rejected by validation.
    pub rejected: usize,
    /// Validation errors, one per rejected entry.
    pub errors: Vec<String>,
    /// Valid descriptors that could not be instantiated.
    pub skipped: Vec<SkippedPlugin>,
    /// Plugins per hook in the new index.
    pub hooks: BTreeMap<HookPoint, usize>,
}

impl LoadSummary {
    /// Number of plugin instances active after the load.
    pub fn active(&self) -> usize {
        self.accepted - self.skipped.len()
    }
}

/// Result of inspecting one message.
#[derive(Debug, Clone)]
pub enum Inspection {
    /// Not inspected; forward untouched.
    PassThrough {
        /// The original body.
        body: String,
    },
    /// Ran through a plugin chain.
    Verdict {
        /// Hook that ran.
        hook: HookPoint,
        /// JSON-RPC id of the request, if any.
        request_id: Option<Value>,
        /// Pipeline result.
        result: ExecutionResult,
    },
}

impl Inspection {
    /// Renders the inspection as a transport instruction.
    pub fn into_action(self) -> TransportAction {
        match self {
            Self::PassThrough { body } => TransportAction::forward(body),
            Self::Verdict {
                hook,
                request_id,
                result,
            } => TransportAction::from_result(hook, request_id, result),
        }
    }
}

/// Owns the plugin registry, the active index, and the request pipeline.
#[derive(Debug)]
pub struct PipelineManager {
    /// Registered implementation modules.
    registry: Arc<PluginRegistry>,
    /// Active index snapshot.
    index: RwLock<Arc<HookIndex>>,
    /// Guards one-time initialization from the configured document.
    init: OnceCell<()>,
    /// Pipeline settings.
    config: PipelineConfig,
    /// Message classifier.
    dispatcher: HookDispatcher,
    /// Chain runner.
    executor: PluginExecutor,
}

impl PipelineManager {
    /// Creates a manager with an empty index.
    pub fn new(registry: Arc<PluginRegistry>, config: PipelineConfig) -> Self {
        Self {
            registry,
            index: RwLock::new(Arc::new(HookIndex::empty())),
            init: OnceCell::new(),
            config,
            dispatcher: HookDispatcher::new(),
            executor: PluginExecutor::new(),
        }
    }

    /// Returns the active index snapshot.
    pub async fn snapshot(&self) -> Arc<HookIndex> {
        self.index.read().await.clone()
    }

    /// Returns the plugin registry.
    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Returns the pipeline settings.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Builds an index from validated descriptors and makes it active.
    pub async fn install(&self, descriptors: &[PluginDescriptor]) -> LoadSummary {
        let build = self.registry.load(descriptors);
        let hooks = HookPoint::ALL
            .into_iter()
            .map(|hook| (hook, build.index.handler_count(hook)))
            .filter(|(_, count)| *count > 0)
            .collect();

        *self.index.write().await = Arc::new(build.index);

        LoadSummary {
            accepted: descriptors.len(),
            skipped: build.skipped,
            hooks,
            ..LoadSummary::default()
        }
    }

    /// Parses, validates and installs a configuration document.
    ///
    /// An unparseable document leaves the active index untouched. A
    /// successful reload counts as initialization, so lazy init will not
    /// replace it with the configured document.
    pub async fn reload_from_str(
        &self,
        text: &str,
        format: DocumentFormat,
        path: Option<&str>,
    ) -> AppResult<LoadSummary> {
        let document = ConfigDocument::parse(text, format, path)?;
        Ok(self.reload(document).await)
    }

    /// Reads and installs a configuration document from disk.
    pub async fn reload_from_path(
        &self,
        path: impl AsRef<Path>,
        format: DocumentFormat,
    ) -> AppResult<LoadSummary> {
        let document = ConfigDocument::read(path, format).await?;
        Ok(self.reload(document).await)
    }

    async fn reload(&self, document: ConfigDocument) -> LoadSummary {
        let summary = self.load(document).await;
        // Err when already set, or when a running `initialize` will set it.
        let _ = self.init.set(());
        summary
    }

    async fn load(&self, document: ConfigDocument) -> LoadSummary {
        let report = validate(&document.entries);

        let mut summary = self.install(&report.descriptors).await;
        summary.rejected = report.rejected();
        summary.errors = report.errors;

        info!(
            accepted = summary.accepted,
            rejected = summary.rejected,
            skipped = summary.skipped.len(),
            active = summary.active(),
            "Plugin configuration loaded"
        );

        summary
    }

    /// Loads the configured document once, unless a reload got there first.
    ///
    /// Concurrent callers wait for the same attempt. A failed attempt
    /// leaves the manager uninitialized so a later call retries.
    pub async fn initialize(&self) -> AppResult<()> {
        self.init
            .get_or_try_init(|| async {
                let document =
                    ConfigDocument::read(&self.config.plugins_path, self.config.format).await?;
                self.load(document).await;
                Ok::<(), AppError>(())
            })
            .await
            .map(|_| ())
    }

    /// Returns whether [`PipelineManager::initialize`] has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.init.initialized()
    }

    /// Inspects a request body.
    pub async fn inspect(
        &self,
        body: &str,
        headers: &BTreeMap<String, String>,
    ) -> AppResult<Inspection> {
        let dispatch = self.dispatcher.dispatch(body, headers);
        self.run(body, dispatch).await
    }

    /// Inspects a response to `request_body` through the post hook.
    pub async fn inspect_response(
        &self,
        request_body: &str,
        response_body: &str,
        headers: &BTreeMap<String, String>,
    ) -> AppResult<Inspection> {
        let dispatch = self
            .dispatcher
            .dispatch_response(request_body, response_body, headers);
        self.run(response_body, dispatch).await
    }

    /// Inspects a request and renders the transport action.
    pub async fn process_request(
        &self,
        body: &str,
        headers: &BTreeMap<String, String>,
    ) -> TransportAction {
        let outcome = match self.ensure_ready().await {
            Ok(()) => self.inspect(body, headers).await,
            Err(e) => Err(e),
        };
        render(outcome, jsonrpc::request_id(body))
    }

    /// Inspects a response and renders the transport action.
    pub async fn process_response(
        &self,
        request_body: &str,
        response_body: &str,
        headers: &BTreeMap<String, String>,
    ) -> TransportAction {
        let outcome = match self.ensure_ready().await {
            Ok(()) => {
                self.inspect_response(request_body, response_body, headers)
                    .await
            }
            Err(e) => Err(e),
        };
        render(outcome, jsonrpc::request_id(request_body))
    }

    async fn ensure_ready(&self) -> AppResult<()> {
        if self.config.lazy_init {
            self.initialize().await?;
        }
        Ok(())
    }

    async fn run(&self, body: &str, dispatch: Option<Dispatch>) -> AppResult<Inspection> {
        let Some(Dispatch { hook, context }) = dispatch else {
            return Ok(Inspection::PassThrough {
                body: body.to_string(),
            });
        };

        let index = self.snapshot().await;
        if !index.has_plugins(hook) {
            return Ok(Inspection::PassThrough {
                body: body.to_string(),
            });
        }

        let request_id = context.get_metadata("requestId").cloned();
        let result = AssertUnwindSafe(self.executor.execute(hook, context, &index))
            .catch_unwind()
            .await
            .map_err(|_| AppError::internal(format!("Plugin executor panicked on hook '{hook}'")))?;

        Ok(Inspection::Verdict {
            hook,
            request_id,
            result,
        })
    }
}

fn render(outcome: AppResult<Inspection>, request_id: Option<Value>) -> TransportAction {
    match outcome {
        Ok(inspection) => inspection.into_action(),
        Err(e) if e.is_internal() => {
            error!(error = %e, "Pipeline fault");
            TransportAction::internal_error(request_id)
        }
        Err(e) => {
            warn!(error = %e, "Pipeline unavailable");
            TransportAction::internal_error(request_id)
        }
    }
}
