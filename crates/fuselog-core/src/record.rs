//! Log records and their structured metadata.

use std::error::Error as StdError;

use serde::Serialize;
use serde_json::{Map, Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::severity::Severity;

/// Metadata key carrying the owning logger's file tag.
pub const APP_KEY: &str = "app";

/// Metadata key carrying a normalized error.
pub const ERROR_KEY: &str = "error";

/// Plain form of an error attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    /// Short type name of the error.
    pub name: String,
    /// `Display` output of the error.
    pub message: String,
    /// The error followed by its `source()` chain, one per line.
    pub stack: String,
}

impl ErrorInfo {
    /// Normalizes an error into `{name, message, stack}`.
    pub fn from_error<E: StdError + 'static>(error: &E) -> Self {
        let name = std::any::type_name::<E>()
            .rsplit("::")
            .next()
            .unwrap_or("Error")
            .to_string();
        Self {
            name,
            message: error.to_string(),
            stack: render_chain(error),
        }
    }
}

fn render_chain(error: &(dyn StdError + 'static)) -> String {
    let mut stack = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        stack.push_str("\n    caused by: ");
        stack.push_str(&cause.to_string());
        source = cause.source();
    }
    stack
}

/// Arbitrary key/value metadata attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    /// Creates empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Attaches an error under `error`, normalized to `{name, message, stack}`.
    pub fn with_error<E: StdError + 'static>(mut self, error: &E) -> Self {
        let info = ErrorInfo::from_error(error);
        self.0.insert(
            ERROR_KEY.to_string(),
            json!({ "name": info.name, "message": info.message, "stack": info.stack }),
        );
        self
    }

    /// Returns a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the metadata, returning the underlying map.
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Metadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Value> for Metadata {
    /// Objects become metadata; any other value is kept under `meta`.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            Value::Null => Self::default(),
            other => Self::default().with("meta", other),
        }
    }
}

/// A single log record, ready for dispatch.
#[derive(Debug, Clone)]
pub struct Record {
    /// Creation time.
    pub timestamp: OffsetDateTime,
    /// Severity the record was emitted at.
    pub severity: Severity,
    /// Message text.
    pub message: String,
    /// Metadata, always carrying `app`.
    pub meta: Metadata,
}

impl Record {
    /// Creates a record stamped with the current time and the owner's tag.
    pub fn new(
        app: &str,
        severity: Severity,
        message: impl Into<String>,
        meta: Option<Metadata>,
    ) -> Self {
        let mut meta = meta.unwrap_or_default();
        meta.0.insert(APP_KEY.to_string(), Value::from(app));
        Self {
            timestamp: OffsetDateTime::now_utc(),
            severity,
            message: message.into(),
            meta,
        }
    }

    /// RFC 3339 timestamp, falling back to the Unix time in seconds.
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp
            .format(&Rfc3339)
            .unwrap_or_else(|_| self.timestamp.unix_timestamp().to_string())
    }

    /// Document form written to document stores.
    pub fn to_document(&self) -> Value {
        json!({
            "timestamp": self.timestamp_rfc3339(),
            "level": self.severity.as_str(),
            "message": self.message,
            "meta": self.meta,
        })
    }
}
