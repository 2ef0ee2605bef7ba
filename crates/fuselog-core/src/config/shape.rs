//! Declarative schema nodes and the fixed logging configuration schema.
//!
//! The schema is a closed tree of [`SchemaNode`]s. It is interpreted by
//! [`validate`](super::validation::validate); nothing here inspects values.

use std::sync::LazyLock;

use regex::Regex;

use crate::severity::Severity;

/// Relative or absolute directory path ending with a separator.
///
/// ```text
/// foo        => false
/// foo/       => false
/// /foo       => false
/// /foo/      => true
/// ./foo/     => true
/// ./foo/bar/ => true
/// ```
pub const LOGPATH_PATTERN: &str = r"^\.?/([A-Za-z0-9.]*/)*$";

/// `mongodb://host[:port]/database` connection string.
pub const DB_PATTERN: &str = r"^mongodb://[A-Za-z0-9.:]+/[A-Za-z0-9.]+";

/// Constraint attached to a string leaf.
#[derive(Debug, Clone)]
pub enum StringRule {
    /// Any string is accepted.
    Any,
    /// Closed enumeration of accepted values.
    OneOf(Vec<&'static str>),
    /// The string must satisfy the regular expression.
    Pattern(Regex),
}

/// A node of the configuration schema.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    /// A mapping with declared properties.
    ///
    /// A `strict` object rejects properties that are not declared at its level.
    Object {
        properties: Vec<(&'static str, SchemaNode)>,
        strict: bool,
    },
    /// A string leaf.
    String(StringRule),
    /// A boolean leaf.
    Boolean,
}

impl SchemaNode {
    /// Name of the JSON type this node expects, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Object { .. } => "object",
            Self::String(_) => "string",
            Self::Boolean => "boolean",
        }
    }

    /// Looks up a declared property of an object node.
    pub fn property(&self, name: &str) -> Option<&SchemaNode> {
        match self {
            Self::Object { properties, .. } => properties
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, node)| node),
            _ => None,
        }
    }

    fn object(properties: Vec<(&'static str, SchemaNode)>) -> Self {
        Self::Object {
            properties,
            strict: false,
        }
    }

    fn level() -> Self {
        Self::String(StringRule::OneOf(Severity::names().collect()))
    }

    fn pattern(source: &str) -> Self {
        // Only called with the pattern constants above.
        #[allow(clippy::expect_used)]
        let regex = Regex::new(source).expect("schema patterns are valid regular expressions");
        Self::String(StringRule::Pattern(regex))
    }
}

static CONFIG_SCHEMA: LazyLock<SchemaNode> = LazyLock::new(|| SchemaNode::Object {
    strict: true,
    properties: vec![
        ("strict", SchemaNode::Boolean),
        (
            "console",
            SchemaNode::object(vec![
                ("active", SchemaNode::Boolean),
                ("level", SchemaNode::level()),
            ]),
        ),
        (
            "file",
            SchemaNode::object(vec![
                ("active", SchemaNode::Boolean),
                ("level", SchemaNode::level()),
                ("logpath", SchemaNode::pattern(LOGPATH_PATTERN)),
            ]),
        ),
        (
            "mongo",
            SchemaNode::object(vec![
                ("active", SchemaNode::Boolean),
                ("level", SchemaNode::level()),
                ("db", SchemaNode::pattern(DB_PATTERN)),
                ("safe", SchemaNode::Boolean),
            ]),
        ),
    ],
});

/// The fixed schema every compiled configuration must satisfy.
pub fn config_schema() -> &'static SchemaNode {
    &CONFIG_SCHEMA
}
