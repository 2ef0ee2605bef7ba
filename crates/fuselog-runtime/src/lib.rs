//! fuselog Runtime - sinks, loggers and the process-wide context.
//!
//! This crate provides:
//! - Console, file and document sinks, and the factory building them
//! - The logger handle (`Logger`) with per-severity methods
//! - The logging context owning the baseline and the logger registry
//! - Broadcast of global configuration changes to every live logger
//! - Partial configuration loading from files and environment (`ConfigLoader`)
//! - Internal diagnostics setup (`DiagnosticsBuilder`)
//!
//! # Process-wide usage
//!
//! ```rust,ignore
//! use fuselog_runtime::{Logger, configure};
//! use serde_json::json;
//!
//! let log = Logger::new("billing", None)?;
//! log.info("started");
//!
//! configure(&json!({ "file": { "active": true, "logpath": "./logs/" } }))?;
//! log.warning("now also written to ./logs/all.log");
//! ```
//!
//! # Isolated contexts
//!
//! Tests and embedders that need their own baseline build a
//! [`LoggingContext`] and create loggers from it instead.

pub mod context;
pub mod diagnostics;
pub mod error;
pub mod factory;
pub mod global;
pub mod loader;
pub mod logger;
pub mod sink;

// Re-exports
pub use context::{ContextBuilder, LoggingContext};
pub use diagnostics::{DiagnosticsBuilder, DiagnosticsFormat, DiagnosticsOutput};
pub use error::{LogError, LogResult, SinkError, SinkResult};
pub use factory::build_sinks;
pub use global::{configure, reconfigure};
pub use loader::ConfigLoader;
pub use logger::Logger;
pub use sink::{
    ConsoleFormat, ConsoleSink, ConsoleTarget, DocumentSink, DocumentStore,
    DocumentStoreConnector, FileNaming, FileSink, FileWriters, MemoryDocumentStore, MemoryWriter,
    Sink, SinkDescriptor, SinkEnvironment, SinkKind, SinkParams, SinkSet, UnconfiguredStore,
};

pub use fuselog_core::{Configuration, Metadata, Record, Severity};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{LogResult, Logger, LoggingContext, configure, reconfigure};
    pub use fuselog_core::{Metadata, Severity};
}
