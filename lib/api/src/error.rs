//! API client construction errors.

use std::fmt;

/// Errors raised while building the HTTP backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The configured base URL is not an absolute http(s) URL.
    InvalidBaseUrl { url: String, reason: String },
    /// The HTTP client could not be created.
    ClientBuild { reason: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBaseUrl { url, reason } => {
                write!(f, "invalid API base URL '{url}': {reason}")
            }
            Self::ClientBuild { reason } => write!(f, "failed to build HTTP client: {reason}"),
        }
    }
}

impl std::error::Error for ApiError {}
