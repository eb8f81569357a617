//! Route table error types.

use std::fmt;

/// Errors raised while building a route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The pattern could not be parsed.
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },
    /// A route with the same pattern is already registered.
    DuplicatePattern {
        /// The duplicated pattern.
        pattern: String,
    },
}

impl RouteError {
    pub(crate) fn invalid(pattern: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPattern { pattern, reason } => {
                write!(f, "invalid route pattern '{pattern}': {reason}")
            }
            Self::DuplicatePattern { pattern } => {
                write!(f, "route '{pattern}' is registered twice")
            }
        }
    }
}

impl std::error::Error for RouteError {}
