//! fuselog Core - configuration engine for the fuselog logging facade.
//!
//! This crate provides:
//! - Severity levels and their ordering (`Severity`)
//! - The typed configuration and its built-in baseline (`Configuration`)
//! - The fixed configuration schema and its validator
//! - The fusion engine merging partial overrides into a baseline
//! - The compiler applying strict/lenient fallback
//! - Log records and metadata normalization
//!
//! Nothing in this crate performs I/O. Sinks, loggers and the registry live in
//! `fuselog-runtime`.
//!
//! ```rust,ignore
//! use fuselog_core::{Configuration, compile};
//! use serde_json::json;
//!
//! let base = Configuration::default();
//! let compiled = compile(&base, Some(&json!({ "console": { "level": "debug" } })))?;
//! assert!(compiled.is_applied());
//! ```

pub mod config;
pub mod error;
pub mod record;
pub mod severity;

// Re-exports
pub use config::{
    Compiled, ConsoleSection, Configuration, Diagnostic, FileSection, MongoSection, Rule,
    SchemaNode, StringRule, Validation, compile, config_schema, fuse, fuse_optional, validate,
};
pub use error::{ConfigError, ConfigResult};
pub use record::{APP_KEY, ERROR_KEY, ErrorInfo, Metadata, Record};
pub use severity::Severity;
