//! The per-caller logger façade.

use std::sync::Arc;

use fuselog_core::{Configuration, Metadata, Record, Severity, compile};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::context::{ContextInner, LoggingContext};
use crate::error::LogResult;
use crate::factory::build_sinks;
use crate::global;
use crate::sink::{SinkDescriptor, SinkEnvironment, SinkKind, SinkSet};

/// Everything a logger needs to emit, rebuilt as a whole on reconfiguration.
pub(crate) struct LoggerState {
    pub(crate) config: Configuration,
    /// The override that produced `config`, if it took effect.
    pub(crate) local_override: Option<Value>,
    pub(crate) sinks: Arc<SinkSet>,
}

/// Logger data reachable from the registry.
pub(crate) struct LoggerShared {
    pub(crate) file_tag: String,
    pub(crate) state: RwLock<LoggerState>,
}

/// Compiles `local_override` on top of `baseline` and builds the sinks.
///
/// An override discarded by lenient fallback is not remembered.
pub(crate) fn prepare(
    file_tag: &str,
    baseline: &Configuration,
    local_override: Option<Value>,
    env: &SinkEnvironment,
) -> LogResult<LoggerState> {
    let compiled = compile(baseline, local_override.as_ref())?;
    let local_override = if compiled.is_applied() {
        local_override
    } else {
        debug!(file_tag, "Local configuration discarded, using the baseline");
        None
    };
    let config = compiled.into_configuration();
    let sinks = build_sinks(file_tag, &config, env)?;

    Ok(LoggerState {
        config,
        local_override,
        sinks: Arc::new(sinks),
    })
}

/// Emission methods, one pair per severity.
macro_rules! severity_methods {
    ($($level:expr => $name:ident, $name_with:ident;)*) => {
        $(
            #[doc = concat!("Logs `message` at `", stringify!($name), "`.")]
            pub fn $name(&self, message: impl Into<String>) {
                self.log($level, message, None);
            }

            #[doc = concat!("Logs `message` with metadata at `", stringify!($name), "`.")]
            pub fn $name_with(&self, message: impl Into<String>, meta: impl Into<Metadata>) {
                self.log($level, message, Some(meta.into()));
            }
        )*
    };
}

/// A tagged logger with its own configuration and sinks.
///
/// Loggers are registered with the [`LoggingContext`] they come from and
/// follow its global reconfigurations until [`unlink`](Self::unlink)ed or
/// dropped.
///
/// ```rust,ignore
/// use fuselog_runtime::{Logger, Metadata};
/// use serde_json::json;
///
/// let log = Logger::new("billing", Some(json!({ "console": { "level": "debug" } })))?;
/// log.info("invoice sent");
/// log.error_with("charge failed", Metadata::new().with_error(&err).with("invoice", 42));
/// ```
pub struct Logger {
    id: u64,
    shared: Arc<LoggerShared>,
    context: Arc<ContextInner>,
}

impl Logger {
    /// Creates a logger on the process-wide context.
    pub fn new(file_tag: impl Into<String>, local_override: Option<Value>) -> LogResult<Self> {
        Self::with_context(global::context(), file_tag, local_override)
    }

    /// Creates a logger on `context`.
    pub fn with_context(
        context: &LoggingContext,
        file_tag: impl Into<String>,
        local_override: Option<Value>,
    ) -> LogResult<Self> {
        let file_tag = file_tag.into();
        let inner = Arc::clone(&context.inner);

        let mut registry = inner.state.lock();
        let state = prepare(&file_tag, &registry.baseline, local_override, &inner.env)?;
        let shared = Arc::new(LoggerShared {
            file_tag,
            state: RwLock::new(state),
        });
        let id = registry.register(Arc::downgrade(&shared));
        drop(registry);

        debug!(file_tag = %shared.file_tag, id, "Created logger");
        Ok(Self {
            id,
            shared,
            context: inner,
        })
    }

    /// The tag injected as `app` into every record.
    pub fn file_tag(&self) -> &str {
        &self.shared.file_tag
    }

    /// Recompiles against the current baseline with a new local override.
    ///
    /// The new override replaces the previous one. Under a lenient baseline an
    /// invalid override leaves the logger on the plain baseline.
    pub fn configure(&self, local_override: Option<Value>) -> LogResult<()> {
        let registry = self.context.state.lock();
        let next = prepare(
            &self.shared.file_tag,
            &registry.baseline,
            local_override,
            &self.context.env,
        )?;
        *self.shared.state.write() = next;
        Ok(())
    }

    /// The compiled configuration in effect.
    pub fn configuration(&self) -> Configuration {
        self.shared.state.read().config.clone()
    }

    /// The local override in effect, if any.
    pub fn local_override(&self) -> Option<Value> {
        self.shared.state.read().local_override.clone()
    }

    /// Descriptors of the current sinks, in dispatch order.
    pub fn sinks(&self) -> Vec<SinkDescriptor> {
        self.shared.state.read().sinks.descriptors()
    }

    /// Kinds of the current sinks, in dispatch order.
    pub fn sink_kinds(&self) -> Vec<SinkKind> {
        self.shared.state.read().sinks.kinds()
    }

    /// Stops following global reconfiguration. Calling it again does nothing.
    ///
    /// The logger keeps emitting with its last configuration.
    pub fn unlink(&self) {
        if self.context.state.lock().unregister(self.id) {
            debug!(file_tag = %self.shared.file_tag, id = self.id, "Unlinked logger");
        }
    }

    /// Whether the logger still follows global reconfiguration.
    pub fn is_linked(&self) -> bool {
        self.context.state.lock().is_registered(self.id)
    }

    /// Emits a record at `severity` to every sink whose threshold it meets.
    ///
    /// Never fails; sink errors are reported once through `tracing`.
    pub fn log(&self, severity: Severity, message: impl Into<String>, meta: Option<Metadata>) {
        let sinks = Arc::clone(&self.shared.state.read().sinks);
        if sinks.is_empty() {
            return;
        }
        let record = Record::new(&self.shared.file_tag, severity, message, meta);
        sinks.dispatch(&record);
    }

    severity_methods! {
        Severity::Emerg => emerg, emerg_with;
        Severity::Alert => alert, alert_with;
        Severity::Crit => crit, crit_with;
        Severity::Error => error, error_with;
        Severity::Warning => warning, warning_with;
        Severity::Notice => notice, notice_with;
        Severity::Info => info, info_with;
        Severity::Debug => debug, debug_with;
        Severity::Silly => silly, silly_with;
    }

    /// Drops `message`. No sink ever receives it.
    pub fn silent(&self, _message: impl Into<String>) {}

    /// Drops `message`. No sink ever receives it.
    pub fn quiet(&self, _message: impl Into<String>) {}
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.context.state.lock().unregister(self.id);
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("id", &self.id)
            .field("file_tag", &self.shared.file_tag)
            .field("sinks", &self.sink_kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{ConsoleFormat, ConsoleTarget, MemoryDocumentStore, MemoryWriter};
    use serde_json::json;
    use std::fmt;

    fn context() -> (LoggingContext, MemoryWriter, MemoryDocumentStore) {
        let writer = MemoryWriter::new();
        let store = MemoryDocumentStore::new();
        let ctx = LoggingContext::builder()
            .console(ConsoleTarget::writer(writer.clone()))
            .console_format(ConsoleFormat {
                timestamp: false,
                pretty: false,
            })
            .document_store(store.clone())
            .build();
        (ctx, writer, store)
    }

    #[derive(Debug)]
    struct Timeout;

    impl fmt::Display for Timeout {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("timed out")
        }
    }

    impl std::error::Error for Timeout {}

    #[test]
    fn test_create_registers() {
        let (ctx, _, _) = context();
        let logger = ctx.logger("svc", None).unwrap();
        assert!(logger.is_linked());
        assert_eq!(logger.file_tag(), "svc");
        assert_eq!(logger.configuration(), ctx.baseline());
        assert_eq!(logger.sink_kinds(), vec![SinkKind::Console]);
    }

    #[test]
    fn test_create_with_invalid_override_strict() {
        let (ctx, _, _) = context();
        let err = ctx
            .logger("svc", Some(json!({ "file": { "logpath": "logs" } })))
            .unwrap_err();
        assert!(err.is_invalid_configuration());
        assert_eq!(ctx.registered(), 0);
    }

    #[test]
    fn test_create_with_invalid_override_lenient() {
        let (ctx, _, _) = context();
        ctx.configure(&json!({ "strict": false })).unwrap();
        let logger = ctx
            .logger("svc", Some(json!({ "console": { "level": "verbose" } })))
            .unwrap();
        assert_eq!(logger.configuration(), ctx.baseline());
        assert_eq!(logger.local_override(), None);
    }

    #[test]
    fn test_configure_replaces_override() {
        let (ctx, _, _) = context();
        let logger = ctx
            .logger("svc", Some(json!({ "console": { "level": "debug" } })))
            .unwrap();
        logger
            .configure(Some(json!({ "mongo": { "active": true } })))
            .unwrap();

        let config = logger.configuration();
        assert_eq!(config.console.level, Severity::Info);
        assert!(config.mongo.active);
        assert_eq!(logger.local_override(), Some(json!({ "mongo": { "active": true } })));
        assert_eq!(logger.sink_kinds(), vec![SinkKind::Console, SinkKind::Mongo]);
    }

    #[test]
    fn test_configure_strict_failure_keeps_state() {
        let (ctx, _, _) = context();
        let logger = ctx
            .logger("svc", Some(json!({ "console": { "level": "debug" } })))
            .unwrap();
        let err = logger
            .configure(Some(json!({ "mongo": { "db": "redis://x" } })))
            .unwrap_err();
        assert!(err.is_invalid_configuration());
        assert_eq!(logger.configuration().console.level, Severity::Debug);
    }

    #[test]
    fn test_configure_lenient_failure_falls_back_to_baseline() {
        let (ctx, _, _) = context();
        ctx.configure(&json!({ "strict": false })).unwrap();
        let logger = ctx
            .logger("svc", Some(json!({ "console": { "level": "debug" } })))
            .unwrap();
        logger
            .configure(Some(json!({ "mongo": { "db": "redis://x" } })))
            .unwrap();
        assert_eq!(logger.configuration(), ctx.baseline());
    }

    #[test]
    fn test_emission_respects_thresholds() {
        let (ctx, writer, store) = context();
        let logger = ctx
            .logger(
                "svc",
                Some(json!({
                    "console": { "level": "error" },
                    "mongo": { "active": true, "level": "debug" }
                })),
            )
            .unwrap();

        logger.debug("d");
        logger.info("i");
        logger.error("e");
        logger.crit("c");
        logger.alert("a");
        logger.emerg("x");
        logger.silly("s");

        let console: Vec<String> = writer.lines();
        assert_eq!(
            console,
            vec![
                r#"error: e {"app":"svc"}"#,
                r#"crit: c {"app":"svc"}"#,
                r#"alert: a {"app":"svc"}"#,
                r#"emerg: x {"app":"svc"}"#,
            ]
        );

        let messages: Vec<Value> = store
            .documents("svc")
            .iter()
            .map(|doc| doc["message"].clone())
            .collect();
        assert_eq!(messages, vec![json!("d"), json!("i"), json!("e"), json!("c"), json!("a"), json!("x")]);
    }

    #[test]
    fn test_metadata_and_error_normalization() {
        let (ctx, writer, _) = context();
        let logger = ctx.logger("svc", None).unwrap();
        logger.warning_with(
            "retrying",
            Metadata::new().with("attempt", 2).with_error(&Timeout),
        );
        logger.debug_with("filtered", json!({ "k": 1 }));

        let lines = writer.lines();
        assert_eq!(lines.len(), 1);
        let meta: Value = serde_json::from_str(lines[0].trim_start_matches("warning: retrying ")).unwrap();
        assert_eq!(meta["app"], "svc");
        assert_eq!(meta["attempt"], 2);
        assert_eq!(
            meta["error"],
            json!({ "name": "Timeout", "message": "timed out", "stack": "timed out" })
        );
    }

    #[test]
    fn test_emission_survives_sink_failure() {
        let writer = MemoryWriter::new();
        let ctx = LoggingContext::builder()
            .console(ConsoleTarget::writer(writer.clone()))
            .build();
        let logger = ctx
            .logger("svc", Some(json!({ "mongo": { "active": true } })))
            .unwrap();

        // No document store: the mongo sink fails, the console still gets it.
        logger.info("first");
        logger.info("second");
        assert_eq!(writer.lines().iter().filter(|l| l.contains("info: ")).count(), 2);
    }

    #[test]
    fn test_silent_and_quiet_drop_messages() {
        let (ctx, writer, store) = context();
        let logger = ctx
            .logger(
                "svc",
                Some(json!({
                    "console": { "level": "silly" },
                    "mongo": { "active": true, "level": "silly" }
                })),
            )
            .unwrap();
        logger.silent("hidden");
        logger.quiet("hidden");
        assert!(writer.contents().is_empty());
        assert!(store.documents("svc").is_empty());
    }

    #[test]
    fn test_unlinked_logger_still_emits() {
        let (ctx, writer, _) = context();
        let logger = ctx.logger("svc", None).unwrap();
        logger.unlink();
        assert!(!logger.is_linked());
        logger.info("still here");
        assert_eq!(writer.lines().len(), 1);
    }

    #[test]
    fn test_silent_when_no_sinks() {
        let (ctx, writer, _) = context();
        let logger = ctx
            .logger("svc", Some(json!({ "console": { "active": false } })))
            .unwrap();
        logger.emerg("nobody hears this");
        assert!(writer.contents().is_empty());
        assert!(logger.sinks().is_empty());
    }
}
