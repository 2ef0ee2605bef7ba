//! Configuration module for fuselog.
//!
//! This module provides the typed configuration, the fixed schema it is
//! validated against, the fusion engine that merges partial overrides into a
//! baseline, and the compiler that ties them together.

pub mod compiler;
pub mod fusion;
pub mod schema;
pub mod shape;
pub mod validation;

pub use compiler::{Compiled, compile};
pub use fusion::{fuse, fuse_optional};
pub use schema::{ConsoleSection, Configuration, FileSection, MongoSection};
pub use shape::{DB_PATTERN, LOGPATH_PATTERN, SchemaNode, StringRule, config_schema};
pub use validation::{Diagnostic, Rule, Validation, validate};
