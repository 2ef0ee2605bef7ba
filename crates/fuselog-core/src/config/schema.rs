//! Typed configuration sections and the built-in baseline.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigResult;
use crate::severity::Severity;

/// Fully compiled logging configuration.
///
/// The JSON form of this struct is the shape used both for partial overrides
/// and for compiled results:
///
/// ```json
/// {
///   "strict": true,
///   "console": { "active": true, "level": "info" },
///   "file": { "active": false, "level": "debug", "logpath": "./logs/" },
///   "mongo": {
///     "active": false,
///     "level": "debug",
///     "db": "mongodb://localhost:27017/Logs",
///     "safe": true
///   }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Fail loudly on invalid changes instead of keeping the previous
    /// configuration.
    pub strict: bool,

    /// Console sink.
    pub console: ConsoleSection,

    /// File sink.
    pub file: FileSection,

    /// Document store sink.
    pub mongo: MongoSection,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            strict: true,
            console: ConsoleSection::default(),
            file: FileSection::default(),
            mongo: MongoSection::default(),
        }
    }
}

impl Configuration {
    /// Converts to the JSON shape used by fusion and validation.
    pub fn to_value(&self) -> ConfigResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Builds a typed configuration from an already validated value.
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

/// Console sink settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSection {
    pub active: bool,
    pub level: Severity,
}

impl Default for ConsoleSection {
    fn default() -> Self {
        Self {
            active: true,
            level: Severity::Info,
        }
    }
}

/// File sink settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSection {
    pub active: bool,
    pub level: Severity,
    /// Directory the log file is written to. Always ends with `/`.
    pub logpath: String,
}

impl Default for FileSection {
    fn default() -> Self {
        Self {
            active: false,
            level: Severity::Debug,
            logpath: "./logs/".to_string(),
        }
    }
}

/// Document store sink settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongoSection {
    pub active: bool,
    pub level: Severity,
    /// Connection string, `mongodb://host[:port]/database`.
    pub db: String,
    /// Acknowledged writes.
    pub safe: bool,
}

impl Default for MongoSection {
    fn default() -> Self {
        Self {
            active: false,
            level: Severity::Debug,
            db: "mongodb://localhost:27017/Logs".to_string(),
            safe: true,
        }
    }
}
