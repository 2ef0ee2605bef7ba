//! Partial configuration loader using figment.
//!
//! The loader does not produce a full configuration. It collects a *partial*
//! one from several sources and leaves fusion and validation to
//! [`LoggingContext::configure`](crate::LoggingContext::configure), like any
//! other change.
//!
//! # Sources (lowest to highest priority)
//!
//! 1. Programmatic partials added with [`ConfigLoader::merge`]
//! 2. `fuselog.toml` (`toml-config` feature) or `fuselog.yaml` / `fuselog.yml`
//!    (`yaml-config` feature) in the first search path holding one
//! 3. Environment variables (`FUSELOG_*`)
//!
//! # Environment Variable Mapping
//!
//! Variables use the `FUSELOG_` prefix with `__` as separator:
//!
//! - `FUSELOG_STRICT=false` → `strict = false`
//! - `FUSELOG_FILE__ACTIVE=true` → `file.active = true`
//! - `FUSELOG_MONGO__DB=mongodb://db:27017/Logs` → `mongo.db = "..."`
//!
//! # Example
//!
//! ```rust,ignore
//! use fuselog_runtime::{ConfigLoader, configure};
//!
//! let partial = ConfigLoader::new().with_current_dir().load()?;
//! configure(&partial)?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "toml-config", feature = "yaml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use fuselog_core::{ConfigError, ConfigResult};
use serde_json::Value;
use tracing::{debug, info, trace};

/// Prefix of environment variables read by the loader.
pub const ENV_PREFIX: &str = "FUSELOG_";

/// File names searched for, in order, depending on enabled formats.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    #[cfg(feature = "toml-config")]
    "fuselog.toml",
    #[cfg(feature = "yaml-config")]
    "fuselog.yaml",
    #[cfg(feature = "yaml-config")]
    "fuselog.yml",
];

/// Collects a partial configuration from files, environment and code.
pub struct ConfigLoader {
    figment: Figment,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader that reads environment variables and no files.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a directory to search for a configuration file.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Adds the current directory to the search paths.
    pub fn with_current_dir(self) -> Self {
        if let Ok(cwd) = std::env::current_dir() {
            self.search_path(cwd)
        } else {
            self
        }
    }

    /// Adds `<user config dir>/fuselog` to the search paths.
    pub fn with_user_config_dir(self) -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            self.search_path(config_dir.join("fuselog"))
        } else {
            self
        }
    }

    /// Loads this file instead of searching.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables environment variables (default).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a programmatic partial below files and environment.
    pub fn merge(mut self, partial: Value) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(partial));
        self
    }

    /// Loads the partial configuration.
    ///
    /// Values are not validated here; an empty object means nothing was found.
    pub fn load(self) -> ConfigResult<Value> {
        let figment = self.build_figment()?;
        let partial: Value = figment
            .extract()
            .map_err(|e| ConfigError::ParseError(format!("Failed to extract configuration: {e}")))?;

        debug!(partial = %partial, "Partial configuration loaded");
        Ok(partial)
    }

    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = self.figment;

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::ParseError(format!(
                    "Configuration file not found: {}",
                    path.display()
                )));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_config_file(figment, path)?;
        } else {
            let found = self.search_paths.iter().find_map(|dir| {
                CONFIG_FILE_NAMES
                    .iter()
                    .map(|name| dir.join(name))
                    .find(|candidate| candidate.exists())
            });
            if let Some(path) = found {
                info!(path = %path.display(), "Loading configuration file");
                figment = merge_config_file(figment, &path)?;
            }
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment)
    }
}

/// Merges one file, dispatching on its extension.
fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => {
            let _ = figment;
            Err(ConfigError::ParseError(format!(
                "Unsupported or disabled configuration file format: .{ext}"
            )))
        }
    }
}
