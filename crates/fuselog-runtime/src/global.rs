//! The process-wide logging context.
//!
//! [`Logger::new`](crate::Logger::new), [`configure`] and [`reconfigure`] all
//! act on this context. It starts from the built-in baseline with default
//! collaborators (stdout console, no document store).

use std::sync::LazyLock;

use serde_json::Value;

use crate::context::LoggingContext;
use crate::error::LogResult;

static GLOBAL_CONTEXT: LazyLock<LoggingContext> = LazyLock::new(LoggingContext::new);

/// The process-wide context.
pub fn context() -> &'static LoggingContext {
    &GLOBAL_CONTEXT
}

/// Applies a partial configuration to the process-wide baseline and every
/// logger created from it.
pub fn configure(partial: &Value) -> LogResult<usize> {
    context().configure(partial)
}

/// Alias of [`configure`].
pub fn reconfigure(partial: &Value) -> LogResult<usize> {
    context().reconfigure(partial)
}
