//! Fuse, validate, and fall back.
//!
//! [`compile`] is the only way a partial configuration becomes effective:
//!
//! 1. the base is fused with the partial;
//! 2. the result is validated against [`config_schema`];
//! 3. a valid result is returned as [`Compiled::Applied`];
//! 4. an invalid result is an error if the base is strict;
//! 5. otherwise the base is returned unchanged as [`Compiled::Fallback`].

use serde_json::Value;
use tracing::{debug, warn};

use super::fusion::fuse;
use super::schema::Configuration;
use super::shape::config_schema;
use super::validation::validate;
use crate::error::{ConfigError, ConfigResult};

/// Outcome of a successful compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compiled {
    /// The partial was merged and validated.
    Applied(Configuration),
    /// The merge was invalid under a lenient base; the base is kept.
    Fallback(Configuration),
}

impl Compiled {
    /// Whether the proposed change took effect.
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// The effective configuration.
    pub fn configuration(&self) -> &Configuration {
        match self {
            Self::Applied(config) | Self::Fallback(config) => config,
        }
    }

    /// Consumes the outcome, returning the effective configuration.
    pub fn into_configuration(self) -> Configuration {
        match self {
            Self::Applied(config) | Self::Fallback(config) => config,
        }
    }
}

/// Compiles `partial` on top of `base`.
///
/// The `strict` flag of `base` decides whether an invalid merge fails or is
/// discarded.
pub fn compile(base: &Configuration, partial: Option<&Value>) -> ConfigResult<Compiled> {
    let fused = fuse(&base.to_value()?, partial);
    let validation = validate(config_schema(), &fused);

    if validation.valid {
        return Ok(Compiled::Applied(Configuration::from_value(fused)?));
    }

    if base.strict {
        debug!(errors = validation.errors.len(), "Rejected configuration in strict mode");
        return Err(ConfigError::invalid(validation.errors));
    }

    warn!(
        errors = %validation,
        "Invalid configuration ignored, keeping the previous one"
    );
    Ok(Compiled::Fallback(base.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::validation::Rule;
    use crate::severity::Severity;
    use serde_json::json;

    fn lenient() -> Configuration {
        Configuration {
            strict: false,
            ..Configuration::default()
        }
    }

    #[test]
    fn test_no_partial_keeps_base() {
        let compiled = compile(&Configuration::default(), None).unwrap();
        assert_eq!(compiled, Compiled::Applied(Configuration::default()));
    }

    #[test]
    fn test_valid_partial_applies() {
        let partial = json!({
            "file": { "active": true, "logpath": "/var/log/app/" },
            "console": { "level": "warning" }
        });
        let compiled = compile(&Configuration::default(), Some(&partial)).unwrap();
        assert!(compiled.is_applied());
        let config = compiled.into_configuration();
        assert!(config.file.active);
        assert_eq!(config.file.logpath, "/var/log/app/");
        assert_eq!(config.console.level, Severity::Warning);
        assert_eq!(config.mongo, Configuration::default().mongo);
    }

    #[test]
    fn test_strict_invalid_fails() {
        let partial = json!({ "mongo": { "level": "not-a-level" } });
        let err = compile(&Configuration::default(), Some(&partial)).unwrap_err();
        let ConfigError::Invalid { diagnostics } = err else {
            panic!("expected an invalid configuration error");
        };
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].path, "@.mongo.level");
        assert!(matches!(diagnostics[0].rule, Rule::NotInEnum { .. }));
    }

    #[test]
    fn test_lenient_invalid_returns_base() {
        let base = lenient();
        let partial = json!({ "mongo": { "level": "not-a-level" } });
        let compiled = compile(&base, Some(&partial)).unwrap();
        assert_eq!(compiled, Compiled::Fallback(base.clone()));
        assert_eq!(compiled.configuration(), &base);
    }

    #[test]
    fn test_lenient_discards_whole_change() {
        let base = lenient();
        let partial = json!({
            "console": { "level": "debug" },
            "file": { "logpath": "relative" }
        });
        let config = compile(&base, Some(&partial)).unwrap().into_configuration();
        assert_eq!(config.console.level, Severity::Info);
        assert_eq!(config.file.logpath, "./logs/");
    }

    #[test]
    fn test_strictness_comes_from_base() {
        // Turning strict off in the same change does not soften the check.
        let partial = json!({ "strict": false, "file": { "logpath": "foo" } });
        assert!(compile(&Configuration::default(), Some(&partial)).is_err());

        // Turning strict on from a lenient base is applied.
        let compiled = compile(&lenient(), Some(&json!({ "strict": true }))).unwrap();
        assert!(compiled.configuration().strict);
    }

    #[test]
    fn test_type_mismatch_is_not_an_error() {
        let partial = json!({ "console": { "level": 7, "active": "yes" } });
        let compiled = compile(&Configuration::default(), Some(&partial)).unwrap();
        assert_eq!(compiled, Compiled::Applied(Configuration::default()));
    }
}
