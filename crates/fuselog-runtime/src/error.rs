//! Runtime error types.

use std::path::PathBuf;

use fuselog_core::ConfigError;
use thiserror::Error;

/// Errors raised by sinks, either while they are built or while they write.
#[derive(Error, Debug)]
pub enum SinkError {
    /// A directory on the log path could not be created.
    #[error("Failed to create log directory {}: {source}", .path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The log file could not be opened.
    #[error("Failed to open log file {}: {source}", .path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: tracing_appender::rolling::InitError,
    },

    /// Writing a record failed.
    #[error("Failed to write record: {0}")]
    Io(#[from] std::io::Error),

    /// A record could not be serialized.
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The document sink is active but no store was supplied.
    #[error("No document store configured for {db}")]
    NoDocumentStore { db: String },

    /// The document store rejected a write.
    #[error("Document store write failed: {0}")]
    Store(String),
}

impl SinkError {
    /// Creates a directory creation error.
    pub fn directory(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreation {
            path: path.into(),
            source,
        }
    }

    /// Creates a document store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }
}

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Errors returned by logger and context operations.
#[derive(Error, Debug)]
pub enum LogError {
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The sinks for the configuration could not be built.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl LogError {
    /// Whether this is a strict-mode validation failure.
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(self, Self::Config(ConfigError::Invalid { .. }))
    }
}

/// Result type for logger and context operations.
pub type LogResult<T> = Result<T, LogError>;
