//! Configuration error types.

use thiserror::Error;

use crate::config::validation::Diagnostic;

/// Errors that can occur while compiling a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Schema validation failed while the effective configuration is strict.
    #[error("Invalid configuration: {}", join_diagnostics(.diagnostics))]
    Invalid { diagnostics: Vec<Diagnostic> },

    /// A severity name outside the fixed set.
    #[error("Unknown severity level: {0}")]
    UnknownSeverity(String),

    /// A validated value could not be converted to the typed configuration.
    #[error("Configuration does not match the typed shape: {0}")]
    Shape(#[from] serde_json::Error),

    /// A configuration source could not be read or parsed.
    #[error("Failed to load configuration: {0}")]
    ParseError(String),
}

impl ConfigError {
    /// Creates an invalid-configuration error from validator diagnostics.
    pub fn invalid(diagnostics: Vec<Diagnostic>) -> Self {
        Self::Invalid { diagnostics }
    }

    /// Returns the validator diagnostics, if this is a validation failure.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            Self::Invalid { diagnostics } => diagnostics,
            _ => &[],
        }
    }
}

fn join_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
