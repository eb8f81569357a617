//! CLI error types.

use std::fmt;
use taskdesk_platform_access::AuthError;

/// Errors surfaced by `taskdesk` commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// Configuration could not be loaded.
    Config { reason: String },
    /// The backend client could not be created.
    Backend { reason: String },
    /// The route tree is malformed.
    Routes { reason: String },
    /// The pending navigation intent could not be read or written.
    IntentStore { path: String, reason: String },
    /// The page history could not be read or written.
    History { path: String, reason: String },
    /// An authentication operation failed.
    Auth(AuthError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "failed to load configuration: {reason}"),
            Self::Backend { reason } => write!(f, "failed to set up backend: {reason}"),
            Self::Routes { reason } => write!(f, "invalid route tree: {reason}"),
            Self::IntentStore { path, reason } => {
                write!(f, "failed to access navigation intent '{path}': {reason}")
            }
            Self::History { path, reason } => {
                write!(f, "failed to access page history '{path}': {reason}")
            }
            Self::Auth(error) => match error.field() {
                Some(field) => write!(f, "{field}: {error}"),
                None => write!(f, "{error}"),
            },
        }
    }
}

impl std::error::Error for CliError {}

impl From<AuthError> for CliError {
    fn from(error: AuthError) -> Self {
        Self::Auth(error)
    }
}
