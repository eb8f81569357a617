//! Error types for the platform-access crate.
//!
//! - `AuthError`: failures of credential-changing operations, surfaced to callers
//! - `SessionStoreError`: durable storage failures, wrapped in a rootcause `Report`
//! - `SwallowedError`: failures the session core deliberately absorbs (logged only)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of an [`AuthError`].
///
/// Forms use the kind to decide how to react: credential and validation
/// errors are user-correctable, network errors are retryable, server errors
/// are shown verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad email/password or current password.
    Credential,
    /// Bad registration or password-change input.
    Validation,
    /// Transient transport failure.
    Network,
    /// Opaque failure reported by the backend.
    Server,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Credential => "credential",
            Self::Validation => "validation",
            Self::Network => "network",
            Self::Server => "server",
        };
        f.write_str(name)
    }
}

/// Errors from authentication operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Email/password pair was rejected.
    InvalidCredentials,
    /// The current password given for a password change was rejected.
    InvalidCurrentPassword,
    /// Input failed validation, optionally tied to a form field.
    Validation {
        field: Option<String>,
        message: String,
    },
    /// An account with this email already exists.
    DuplicateEmail { email: String },
    /// The operation needs a session and there is none.
    NotAuthenticated,
    /// The backend could not be reached.
    Network { message: String },
    /// The backend failed; the message is shown as-is.
    Server { message: String },
}

impl AuthError {
    /// Creates a validation error tied to a form field.
    #[must_use]
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field.to_string()),
            message: message.into(),
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidCredentials | Self::InvalidCurrentPassword | Self::NotAuthenticated => {
                ErrorKind::Credential
            }
            Self::Validation { .. } | Self::DuplicateEmail { .. } => ErrorKind::Validation,
            Self::Network { .. } => ErrorKind::Network,
            Self::Server { .. } => ErrorKind::Server,
        }
    }

    /// Returns the form field the error refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => field.as_deref(),
            Self::DuplicateEmail { .. } => Some("email"),
            Self::InvalidCurrentPassword => Some("currentPassword"),
            _ => None,
        }
    }

    /// Returns true if re-submitting the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid email or password"),
            Self::InvalidCurrentPassword => write!(f, "current password is incorrect"),
            Self::Validation { message, .. } => write!(f, "{message}"),
            Self::DuplicateEmail { email } => {
                write!(f, "an account with email {email} already exists")
            }
            Self::NotAuthenticated => write!(f, "not signed in"),
            Self::Network { message } => write!(f, "network error: {message}"),
            Self::Server { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for AuthError {}

/// Errors from the durable session store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStoreError {
    /// The stored session could not be read.
    Read { path: String, reason: String },
    /// The session could not be written.
    Write { path: String, reason: String },
    /// The stored session exists but cannot be decoded.
    Corrupt { path: String, reason: String },
}

impl fmt::Display for SessionStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, reason } => write!(f, "failed to read session '{path}': {reason}"),
            Self::Write { path, reason } => {
                write!(f, "failed to write session '{path}': {reason}")
            }
            Self::Corrupt { path, reason } => write!(f, "corrupt session '{path}': {reason}"),
        }
    }
}

impl std::error::Error for SessionStoreError {}

/// Operation whose failure the session core absorbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwallowedOperation {
    /// Remote logout call.
    Logout,
    /// Background token verification.
    VerifyToken,
    /// Writing the session to the store.
    Persist,
    /// Reading the session from the store.
    Load,
    /// Removing the session from the store.
    Clear,
}

impl fmt::Display for SwallowedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Logout => "logout",
            Self::VerifyToken => "verify_token",
            Self::Persist => "persist",
            Self::Load => "load",
            Self::Clear => "clear",
        };
        f.write_str(name)
    }
}

/// A failure that is logged and then dropped.
///
/// Remote logout, background verification and session-store writes must never
/// leave the user stuck, so their errors end here instead of reaching callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwallowedError {
    operation: SwallowedOperation,
    reason: String,
}

impl SwallowedError {
    /// Creates a swallowed error for the given operation.
    #[must_use]
    pub fn new(operation: SwallowedOperation, reason: impl Into<String>) -> Self {
        Self {
            operation,
            reason: reason.into(),
        }
    }

    /// Returns the operation that failed.
    #[must_use]
    pub fn operation(&self) -> SwallowedOperation {
        self.operation
    }

    /// Returns the failure reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for SwallowedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.operation, self.reason)
    }
}

impl std::error::Error for SwallowedError {}

/// Logs a swallowed failure, if any.
pub(crate) fn swallow(result: Result<(), SwallowedError>) {
    if let Err(err) = result {
        tracing::warn!(
            operation = %err.operation(),
            reason = %err.reason(),
            "ignoring session failure"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_credentials_reads_as_credential_failure() {
        let err = AuthError::InvalidCredentials;
        assert_eq!(err.kind(), ErrorKind::Credential);
        assert!(err.to_string().contains("invalid email or password"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn duplicate_email_points_at_email_field() {
        let err = AuthError::DuplicateEmail {
            email: "dup@x.com".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field(), Some("email"));
        assert!(err.to_string().contains("dup@x.com"));
    }

    #[test]
    fn validation_error_keeps_field_and_message() {
        let err = AuthError::invalid_field("password", "too short");
        assert_eq!(err.field(), Some("password"));
        assert_eq!(err.to_string(), "too short");
    }

    #[test]
    fn server_message_is_shown_verbatim() {
        let err = AuthError::Server {
            message: "database offline".to_string(),
        };
        assert_eq!(err.to_string(), "database offline");
        assert_eq!(err.kind(), ErrorKind::Server);
    }

    #[test]
    fn only_network_errors_are_retryable() {
        let err = AuthError::Network {
            message: "connection reset".to_string(),
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("connection reset"));
        assert!(!AuthError::NotAuthenticated.is_retryable());
    }

    #[test]
    fn session_store_error_display() {
        let err = SessionStoreError::Corrupt {
            path: "/tmp/session.json".to_string(),
            reason: "expected value".to_string(),
        };
        assert!(err.to_string().contains("corrupt session"));
        assert!(err.to_string().contains("/tmp/session.json"));
    }

    #[test]
    fn swallowed_error_names_operation() {
        let err = SwallowedError::new(SwallowedOperation::Logout, "timeout");
        assert_eq!(err.operation(), SwallowedOperation::Logout);
        assert_eq!(err.to_string(), "logout failed: timeout");
    }
}
