//! Severity levels (RFC 5424 plus `silly`).
//!
//! Lower ranks are more severe. A sink configured with a threshold emits every
//! record whose rank is at or below the threshold's rank.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Log severity, ordered from most to least severe.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// System is unusable.
    Emerg = 1,
    /// Action must be taken immediately.
    Alert = 2,
    /// Critical conditions.
    Crit = 3,
    /// Error conditions.
    Error = 4,
    /// Warning conditions.
    Warning = 5,
    /// Normal but significant condition.
    Notice = 6,
    /// Informational messages.
    Info = 7,
    /// Debug-level messages.
    Debug = 8,
    /// Everything else.
    Silly = 9,
}

impl Severity {
    /// All severities, most severe first.
    pub const ALL: [Severity; 9] = [
        Severity::Emerg,
        Severity::Alert,
        Severity::Crit,
        Severity::Error,
        Severity::Warning,
        Severity::Notice,
        Severity::Info,
        Severity::Debug,
        Severity::Silly,
    ];

    /// Numeric rank (1 = emerg, 9 = silly).
    #[inline]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Configuration name of the severity.
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Emerg => "emerg",
            Severity::Alert => "alert",
            Severity::Crit => "crit",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Notice => "notice",
            Severity::Info => "info",
            Severity::Debug => "debug",
            Severity::Silly => "silly",
        }
    }

    /// Names accepted by the configuration schema, most severe first.
    pub fn names() -> impl Iterator<Item = &'static str> {
        Self::ALL.iter().map(|s| s.as_str())
    }

    /// Whether a record at `self` passes a sink configured at `threshold`.
    #[inline]
    pub const fn meets(self, threshold: Severity) -> bool {
        self.rank() <= threshold.rank()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownSeverity(s.to_string()))
    }
}
