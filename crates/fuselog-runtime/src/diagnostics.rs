//! Internal diagnostics through `tracing-subscriber`.
//!
//! fuselog reports its own activity (rejected configuration, sink failures,
//! broadcasts) through `tracing` events under the `fuselog_core` and
//! `fuselog_runtime` targets. Those events are separate from the records
//! loggers emit and are only visible once a subscriber is installed, either
//! by the host application or with [`DiagnosticsBuilder`].
//!
//! ```rust,ignore
//! use fuselog_runtime::diagnostics::{DiagnosticsBuilder, DiagnosticsFormat};
//!
//! DiagnosticsBuilder::new()
//!     .directive("fuselog_runtime=debug")
//!     .format(DiagnosticsFormat::Pretty)
//!     .init();
//! ```

use serde::{Deserialize, Serialize};
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt};

/// Line format of diagnostic events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticsFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Where diagnostic events go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticsOutput {
    Stdout,
    #[default]
    Stderr,
}

/// Builder for the diagnostics subscriber.
#[derive(Debug)]
pub struct DiagnosticsBuilder {
    directives: Vec<String>,
    level: tracing::Level,
    format: DiagnosticsFormat,
    output: DiagnosticsOutput,
    with_target: bool,
}

impl Default for DiagnosticsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsBuilder {
    /// Warnings and above, compact, to stderr.
    pub fn new() -> Self {
        Self {
            directives: Vec::new(),
            level: tracing::Level::WARN,
            format: DiagnosticsFormat::default(),
            output: DiagnosticsOutput::default(),
            with_target: true,
        }
    }

    /// Sets the base level.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    /// Adds a filter directive such as `fuselog_core=debug`.
    ///
    /// Directives that do not parse are skipped.
    pub fn directive(mut self, directive: &str) -> Self {
        self.directives.push(directive.to_string());
        self
    }

    pub fn format(mut self, format: DiagnosticsFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: DiagnosticsOutput) -> Self {
        self.output = output;
        self
    }

    /// Include the target (module path) in each line.
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// Builds the filter: `RUST_LOG` if set, else the base level, plus directives.
    pub(crate) fn build_filter(&self) -> EnvFilter {
        let base_filter = self.level.to_string().to_lowercase();
        let mut filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&base_filter));

        for directive in &self.directives {
            if let Ok(d) = directive.parse() {
                filter = filter.add_directive(d);
            }
        }

        filter
    }

    /// Installs the subscriber, ignoring an already installed one.
    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber as the global default.
    pub fn try_init(self) -> Result<(), TryInitError> {
        let filter = self.build_filter();

        macro_rules! init_with_writer {
            ($writer:expr) => {
                match self.format {
                    #[cfg(feature = "json-log")]
                    DiagnosticsFormat::Json => tracing_subscriber::registry()
                        .with(fmt::layer().json().with_writer($writer))
                        .with(filter)
                        .try_init(),
                    DiagnosticsFormat::Compact => tracing_subscriber::registry()
                        .with(
                            fmt::layer()
                                .compact()
                                .with_target(self.with_target)
                                .with_writer($writer),
                        )
                        .with(filter)
                        .try_init(),
                    DiagnosticsFormat::Full => tracing_subscriber::registry()
                        .with(
                            fmt::layer()
                                .with_target(self.with_target)
                                .with_writer($writer),
                        )
                        .with(filter)
                        .try_init(),
                    DiagnosticsFormat::Pretty => tracing_subscriber::registry()
                        .with(
                            fmt::layer()
                                .pretty()
                                .with_target(self.with_target)
                                .with_writer($writer),
                        )
                        .with(filter)
                        .try_init(),
                }
            };
        }

        match self.output {
            DiagnosticsOutput::Stdout => init_with_writer!(std::io::stdout),
            DiagnosticsOutput::Stderr => init_with_writer!(std::io::stderr),
        }
    }
}
