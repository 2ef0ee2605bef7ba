//! # fuselog
//!
//! A logging facade whose configuration is validated against a fixed schema,
//! fused onto a baseline, and broadcast to every live logger.
//!
//! ## Overview
//!
//! ```text
//! partial ──▶ fuse(baseline) ──▶ validate ──▶ compile ──▶ sinks
//!                                   │
//!                                   └── strict: error / lenient: keep baseline
//! ```
//!
//! - **Configuration**: `strict` plus `console`, `file` and `mongo` sections
//! - **Loggers**: per-caller handles with an optional local override
//! - **Broadcast**: [`configure`] recompiles every linked logger
//! - **Sinks**: console, file (`all.log` or `<tag>.log`) and document store
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fuselog::prelude::*;
//! use serde_json::json;
//!
//! let log = Logger::new("api", Some(json!({ "console": { "level": "debug" } })))?;
//! log.debug("listening");
//! log.error_with("request failed", json!({ "status": 502 }));
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `fuselog.toml` with `ConfigLoader` (default)
//! - `yaml-config`: load `fuselog.yaml` / `fuselog.yml` with `ConfigLoader`
//! - `json-log`: JSON output for internal diagnostics

pub use fuselog_core as core;
pub use fuselog_runtime as runtime;

pub use fuselog_core::{Compiled, ConfigError, Configuration, Metadata, Severity, compile};
pub use fuselog_runtime::{
    ConfigLoader, LogError, LogResult, Logger, LoggingContext, configure, reconfigure,
};

// Partial configurations and metadata are JSON values
pub use serde_json::{self, Value, json};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use fuselog::prelude::*;
/// ```
pub mod prelude {
    pub use fuselog_runtime::prelude::*;

    pub use fuselog_core::Configuration;
    pub use fuselog_runtime::{ConfigLoader, SinkKind};
    pub use serde_json::json;
}
