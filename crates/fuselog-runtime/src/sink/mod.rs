//! Log destinations.
//!
//! A [`SinkSet`] is the ordered list of sinks built for one logger
//! configuration. It is never edited: reconfiguration builds a new set and
//! drops the old one.
//!
//! Writes are best effort. A failing sink is reported once through
//! `tracing` and then stays quiet; the caller never sees the error.

pub mod console;
pub mod document;
pub mod file;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fuselog_core::{Record, Severity};
use serde::Serialize;
use tracing::warn;

use crate::error::SinkResult;

pub use console::{ConsoleFormat, ConsoleSink, ConsoleTarget, MemoryWriter};
pub use document::{
    DocumentSink, DocumentStore, DocumentStoreConnector, MemoryDocumentStore, UnconfiguredStore,
};
pub use file::{FileNaming, FileSink, FileWriters, create_log_path};

// ─── Descriptors ──────────────────────────────────────────────────────────────

/// The three sink kinds, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    Console,
    File,
    Mongo,
}

impl SinkKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::File => "file",
            Self::Mongo => "mongo",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific parameters of a built sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkParams {
    Console(ConsoleFormat),
    File {
        /// Resolved log file.
        path: PathBuf,
    },
    Mongo {
        /// Connection string.
        db: String,
        /// Target collection, derived from the file tag.
        collection: String,
        /// Acknowledged writes.
        safe: bool,
    },
}

/// What a sink is: kind, threshold and parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkDescriptor {
    pub kind: SinkKind,
    pub level: Severity,
    pub params: SinkParams,
}

impl SinkDescriptor {
    /// Whether a record at `severity` reaches this sink.
    pub fn accepts(&self, severity: Severity) -> bool {
        severity.meets(self.level)
    }
}

// ─── Sink trait ───────────────────────────────────────────────────────────────

/// A destination for log records.
pub trait Sink: Send + Sync {
    /// Describes the sink.
    fn descriptor(&self) -> &SinkDescriptor;

    /// Writes a record. The record has already passed the threshold.
    fn write(&self, record: &Record) -> SinkResult<()>;
}

/// Remembers whether a sink failure has been reported.
#[derive(Debug, Clone, Default)]
pub struct FailureLatch(Arc<AtomicBool>);

impl FailureLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports the failure if none was reported before.
    pub fn report(&self, kind: SinkKind, error: &dyn std::error::Error) {
        if !self.0.swap(true, Ordering::Relaxed) {
            warn!(sink = %kind, error = %error, "Log sink failed, further failures are suppressed");
        }
    }

    /// Whether a failure has been reported.
    pub fn tripped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ─── Sink set ─────────────────────────────────────────────────────────────────

struct Entry {
    sink: Box<dyn Sink>,
    failures: FailureLatch,
}

/// Ordered, immutable set of sinks for one configuration.
#[derive(Default)]
pub struct SinkSet {
    entries: Vec<Entry>,
}

impl SinkSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sink. Only used while building.
    pub(crate) fn push(&mut self, sink: Box<dyn Sink>) {
        self.entries.push(Entry {
            sink,
            failures: FailureLatch::new(),
        });
    }

    /// Descriptors, in dispatch order.
    pub fn descriptors(&self) -> Vec<SinkDescriptor> {
        self.entries
            .iter()
            .map(|entry| entry.sink.descriptor().clone())
            .collect()
    }

    /// Kinds, in dispatch order.
    pub fn kinds(&self) -> Vec<SinkKind> {
        self.entries
            .iter()
            .map(|entry| entry.sink.descriptor().kind)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sends a record to every sink whose threshold it meets.
    ///
    /// Returns the number of sinks that accepted the record.
    pub fn dispatch(&self, record: &Record) -> usize {
        let mut delivered = 0;
        for entry in &self.entries {
            if !entry.sink.descriptor().accepts(record.severity) {
                continue;
            }
            match entry.sink.write(record) {
                Ok(()) => delivered += 1,
                Err(e) => entry.failures.report(entry.sink.descriptor().kind, &e),
            }
        }
        delivered
    }
}

impl fmt::Debug for SinkSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.descriptors()).finish()
    }
}

// ─── Environment ──────────────────────────────────────────────────────────────

/// Host-provided collaborators used when sinks are built.
#[derive(Clone)]
pub struct SinkEnvironment {
    /// Where the console sink writes.
    pub console: ConsoleTarget,
    /// Console line formatting.
    pub console_format: ConsoleFormat,
    /// How the log file name is chosen.
    pub file_naming: FileNaming,
    /// Log files open for this environment, shared by its file sinks.
    pub files: FileWriters,
    /// Opens document stores for the mongo sink.
    pub documents: Arc<dyn DocumentStoreConnector>,
}

impl Default for SinkEnvironment {
    fn default() -> Self {
        Self {
            console: ConsoleTarget::Stdout,
            console_format: ConsoleFormat::default(),
            file_naming: FileNaming::default(),
            files: FileWriters::new(),
            documents: Arc::new(UnconfiguredStore),
        }
    }
}

impl fmt::Debug for SinkEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkEnvironment")
            .field("console", &self.console)
            .field("console_format", &self.console_format)
            .field("file_naming", &self.file_naming)
            .field("files", &self.files)
            .finish_non_exhaustive()
    }
}
