//! Logging context: the baseline configuration and the logger registry.
//!
//! A [`LoggingContext`] owns the baseline every logger is compiled against and
//! keeps weak references to every live [`Logger`] created from it. Both sit
//! behind one lock, so constructing a logger, reconfiguring one, and
//! broadcasting a new baseline are serialized and always see the same
//! snapshot.
//!
//! # Broadcast
//!
//! [`LoggingContext::configure`] compiles the new baseline, then recompiles
//! every live logger against it with the override that logger last applied.
//! All recompiles and sink rebuilds are staged first; nothing is committed
//! unless every one of them succeeds.
//!
//! ```rust,ignore
//! use fuselog_runtime::LoggingContext;
//! use serde_json::json;
//!
//! let ctx = LoggingContext::new();
//! let api = ctx.logger("api", Some(json!({ "console": { "level": "debug" } })))?;
//! ctx.configure(&json!({ "file": { "active": true } }))?;
//! // `api` now logs to the file as well, and still at debug on the console.
//! ```

use std::sync::{Arc, Weak};

use fuselog_core::{ConfigResult, Configuration, compile, config_schema, validate};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::LogResult;
use crate::logger::{Logger, LoggerShared, prepare};
use crate::sink::{
    ConsoleFormat, ConsoleTarget, DocumentStoreConnector, FileNaming, SinkEnvironment,
};

pub(crate) struct Registration {
    id: u64,
    logger: Weak<LoggerShared>,
}

pub(crate) struct ContextState {
    pub(crate) baseline: Configuration,
    loggers: Vec<Registration>,
    next_id: u64,
}

impl ContextState {
    /// Registers a logger and returns its id.
    pub(crate) fn register(&mut self, logger: Weak<LoggerShared>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.loggers.push(Registration { id, logger });
        id
    }

    /// Removes a logger. Unknown ids are ignored.
    pub(crate) fn unregister(&mut self, id: u64) -> bool {
        let before = self.loggers.len();
        self.loggers.retain(|r| r.id != id);
        self.loggers.len() != before
    }

    pub(crate) fn is_registered(&self, id: u64) -> bool {
        self.loggers.iter().any(|r| r.id == id)
    }

    fn live(&mut self) -> Vec<Arc<LoggerShared>> {
        self.loggers.retain(|r| r.logger.strong_count() > 0);
        self.loggers
            .iter()
            .filter_map(|r| r.logger.upgrade())
            .collect()
    }
}

pub(crate) struct ContextInner {
    pub(crate) state: Mutex<ContextState>,
    pub(crate) env: SinkEnvironment,
}

/// Owner of the baseline configuration and of the logger registry.
///
/// Cloning is cheap; clones share the same baseline and registry.
#[derive(Clone)]
pub struct LoggingContext {
    pub(crate) inner: Arc<ContextInner>,
}

impl LoggingContext {
    /// Creates a context with the built-in baseline and default collaborators.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a context builder.
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// The current baseline.
    pub fn baseline(&self) -> Configuration {
        self.inner.state.lock().baseline.clone()
    }

    /// Collaborators sinks are built with.
    pub fn environment(&self) -> &SinkEnvironment {
        &self.inner.env
    }

    /// Creates a logger compiled from the baseline and `local_override`.
    pub fn logger(
        &self,
        file_tag: impl Into<String>,
        local_override: Option<Value>,
    ) -> LogResult<Logger> {
        Logger::with_context(self, file_tag, local_override)
    }

    /// Compiles a new baseline and pushes it to every live logger.
    ///
    /// Returns the number of loggers that were reconfigured. If the change is
    /// invalid under a lenient baseline, nothing happens and `0` is returned.
    pub fn configure(&self, partial: &Value) -> LogResult<usize> {
        let mut state = self.inner.state.lock();

        let compiled = compile(&state.baseline, Some(partial))?;
        if !compiled.is_applied() {
            debug!("Global configuration change discarded");
            return Ok(0);
        }
        let baseline = compiled.into_configuration();

        let loggers = state.live();
        let staged = loggers
            .iter()
            .map(|logger| {
                let local = logger.state.read().local_override.clone();
                prepare(&logger.file_tag, &baseline, local, &self.inner.env)
            })
            .collect::<LogResult<Vec<_>>>()?;

        for (logger, next) in loggers.iter().zip(staged) {
            *logger.state.write() = next;
        }
        state.baseline = baseline;

        info!(loggers = loggers.len(), "Applied global configuration");
        Ok(loggers.len())
    }

    /// Alias of [`configure`](Self::configure).
    pub fn reconfigure(&self, partial: &Value) -> LogResult<usize> {
        self.configure(partial)
    }

    /// Number of live, linked loggers.
    pub fn registered(&self) -> usize {
        self.inner.state.lock().live().len()
    }
}

impl Default for LoggingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoggingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("LoggingContext")
            .field("baseline", &state.baseline)
            .field("loggers", &state.loggers.len())
            .field("env", &self.inner.env)
            .finish()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builder for a [`LoggingContext`].
///
/// ```rust,ignore
/// let store = MemoryDocumentStore::new();
/// let ctx = LoggingContext::builder()
///     .console(ConsoleTarget::Stderr)
///     .file_naming(FileNaming::PerCaller)
///     .document_store(store.clone())
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ContextBuilder {
    baseline: Configuration,
    env: SinkEnvironment,
}

impl ContextBuilder {
    /// Starts from a baseline other than the built-in one.
    ///
    /// The baseline must satisfy the configuration schema; otherwise every
    /// later strict change would be rejected against it.
    pub fn baseline(mut self, baseline: Configuration) -> ConfigResult<Self> {
        validate(config_schema(), &baseline.to_value()?).into_result()?;
        self.baseline = baseline;
        Ok(self)
    }

    /// Sets where console sinks write.
    pub fn console(mut self, target: ConsoleTarget) -> Self {
        self.env.console = target;
        self
    }

    /// Sets console line formatting.
    pub fn console_format(mut self, format: ConsoleFormat) -> Self {
        self.env.console_format = format;
        self
    }

    /// Sets how file sinks name their file.
    pub fn file_naming(mut self, naming: FileNaming) -> Self {
        self.env.file_naming = naming;
        self
    }

    /// Sets the connector used by document sinks.
    pub fn document_store(mut self, connector: impl DocumentStoreConnector + 'static) -> Self {
        self.env.documents = Arc::new(connector);
        self
    }

    pub fn build(self) -> LoggingContext {
        LoggingContext {
            inner: Arc::new(ContextInner {
                state: Mutex::new(ContextState {
                    baseline: self.baseline,
                    loggers: Vec::new(),
                    next_id: 0,
                }),
                env: self.env,
            }),
        }
    }
}
