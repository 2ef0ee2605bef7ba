//! Structural validation of configuration values against a [`SchemaNode`].

use std::fmt;

use serde_json::{Map, Value};

use super::shape::{SchemaNode, StringRule};
use crate::error::{ConfigError, ConfigResult};

/// The rule a field broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// The value has the wrong JSON type.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// The string is not one of the accepted values.
    NotInEnum {
        value: String,
        allowed: Vec<&'static str>,
    },
    /// The string does not satisfy the pattern.
    PatternMismatch { value: String, pattern: String },
    /// The property is not declared by a strict object.
    UnknownField,
}

/// One validation failure: which field, which rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Dotted path of the offending field (`@` is the root).
    pub path: String,
    /// The rule that failed.
    pub rule: Rule,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rule {
            Rule::TypeMismatch { expected, found } => {
                write!(f, "{}: must be {expected}, but is {found}", self.path)
            }
            Rule::NotInEnum { value, allowed } => write!(
                f,
                "{}: must be one of [{}], but is \"{value}\"",
                self.path,
                allowed.join(", ")
            ),
            Rule::PatternMismatch { value, pattern } => write!(
                f,
                "{}: must match pattern {pattern}, but is \"{value}\"",
                self.path
            ),
            Rule::UnknownField => write!(f, "{}: is not allowed (strict mode)", self.path),
        }
    }
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, Default)]
pub struct Validation {
    /// Whether the candidate satisfied the schema.
    pub valid: bool,
    /// Every rule the candidate broke, in traversal order.
    pub errors: Vec<Diagnostic>,
}

impl Validation {
    /// Converts a failed validation into [`ConfigError::Invalid`].
    pub fn into_result(self) -> ConfigResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(ConfigError::invalid(self.errors))
        }
    }
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.valid {
            return f.write_str("valid");
        }
        for (i, diagnostic) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

/// Validates `candidate` against `schema`.
pub fn validate(schema: &SchemaNode, candidate: &Value) -> Validation {
    let mut errors = Vec::new();
    check(schema, candidate, "@", &mut errors);
    Validation {
        valid: errors.is_empty(),
        errors,
    }
}

fn check(schema: &SchemaNode, value: &Value, path: &str, errors: &mut Vec<Diagnostic>) {
    match (schema, value) {
        (SchemaNode::Object { properties, strict }, Value::Object(map)) => {
            check_object(properties, *strict, map, path, errors);
        }
        (SchemaNode::String(rule), Value::String(s)) => check_string(rule, s, path, errors),
        (SchemaNode::Boolean, Value::Bool(_)) => {}
        (node, other) => errors.push(Diagnostic {
            path: path.to_string(),
            rule: Rule::TypeMismatch {
                expected: node.type_name(),
                found: json_type(other),
            },
        }),
    }
}

fn check_object(
    properties: &[(&'static str, SchemaNode)],
    strict: bool,
    map: &Map<String, Value>,
    path: &str,
    errors: &mut Vec<Diagnostic>,
) {
    for (name, node) in properties {
        if let Some(value) = map.get(*name) {
            check(node, value, &join(path, name), errors);
        }
    }

    if strict {
        for key in map.keys() {
            if !properties.iter().any(|(name, _)| name == key) {
                errors.push(Diagnostic {
                    path: join(path, key),
                    rule: Rule::UnknownField,
                });
            }
        }
    }
}

fn check_string(rule: &StringRule, value: &str, path: &str, errors: &mut Vec<Diagnostic>) {
    let failed = match rule {
        StringRule::Any => None,
        StringRule::OneOf(allowed) => (!allowed.contains(&value)).then(|| Rule::NotInEnum {
            value: value.to_string(),
            allowed: allowed.clone(),
        }),
        StringRule::Pattern(regex) => (!regex.is_match(value)).then(|| Rule::PatternMismatch {
            value: value.to_string(),
            pattern: regex.as_str().to_string(),
        }),
    };

    if let Some(rule) = failed {
        errors.push(Diagnostic {
            path: path.to_string(),
            rule,
        });
    }
}

fn join(parent: &str, key: &str) -> String {
    format!("{parent}.{key}")
}

/// JSON type name of a value, used in diagnostics.
pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
