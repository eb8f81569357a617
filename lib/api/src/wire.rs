//! Request/response bodies and failure classification.

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use taskdesk_platform_access::AuthError;

/// The REST endpoints the backend calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    Register,
    Logout,
    Verify,
    ChangePassword,
}

impl Endpoint {
    /// Path relative to the API root.
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/auth/login",
            Self::Register => "/auth/register",
            Self::Logout => "/auth/logout",
            Self::Verify => "/auth/verify",
            Self::ChangePassword => "/auth/change-password",
        }
    }

    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::Verify => Method::GET,
            _ => Method::POST,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterBody<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChangePasswordBody<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyResponse {
    pub valid: bool,
}

/// Error payload returned by the API. Unknown shapes degrade to the raw text.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default, alias = "error", alias = "detail")]
    pub message: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
}

impl ErrorBody {
    pub(crate) fn parse(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        serde_json::from_str(trimmed).unwrap_or_else(|_| Self {
            message: Some(trimmed.to_string()),
            field: None,
        })
    }
}

/// Maps a non-success response to the error the session core expects.
pub(crate) fn classify(
    endpoint: Endpoint,
    status: StatusCode,
    body: ErrorBody,
    request_email: Option<&str>,
) -> AuthError {
    match (endpoint, status) {
        (Endpoint::Login, StatusCode::UNAUTHORIZED)
        | (Endpoint::Verify, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            AuthError::InvalidCredentials
        }
        (Endpoint::ChangePassword, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            AuthError::InvalidCurrentPassword
        }
        (Endpoint::Register, StatusCode::CONFLICT) => AuthError::DuplicateEmail {
            email: request_email.unwrap_or_default().to_string(),
        },
        (_, StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY) => AuthError::Validation {
            field: body.field,
            message: body
                .message
                .unwrap_or_else(|| "the request was rejected".to_string()),
        },
        _ => AuthError::Server {
            message: body
                .message
                .unwrap_or_else(|| format!("server responded with {status}")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_use_expected_methods() {
        assert_eq!(Endpoint::Verify.method(), Method::GET);
        assert_eq!(Endpoint::Login.method(), Method::POST);
        assert_eq!(Endpoint::ChangePassword.path(), "/auth/change-password");
    }

    #[test]
    fn change_password_body_is_camel_case() {
        let body = ChangePasswordBody {
            current_password: "old-secret",
            new_password: "new-secret",
        };
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["currentPassword"], "old-secret");
        assert_eq!(json["newPassword"], "new-secret");
    }

    #[test]
    fn error_body_accepts_common_shapes() {
        let body = ErrorBody::parse(r#"{"message":"email taken","field":"email"}"#);
        assert_eq!(body.message.as_deref(), Some("email taken"));
        assert_eq!(body.field.as_deref(), Some("email"));

        let body = ErrorBody::parse(r#"{"detail":"not found"}"#);
        assert_eq!(body.message.as_deref(), Some("not found"));

        let body = ErrorBody::parse("Bad Gateway");
        assert_eq!(body.message.as_deref(), Some("Bad Gateway"));

        assert_eq!(ErrorBody::parse("  "), ErrorBody::default());
    }

    #[test]
    fn login_unauthorized_is_invalid_credentials() {
        let err = classify(
            Endpoint::Login,
            StatusCode::UNAUTHORIZED,
            ErrorBody::default(),
            Some("a@x.com"),
        );
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[test]
    fn verify_rejection_reads_as_invalid_credentials() {
        let err = classify(Endpoint::Verify, StatusCode::FORBIDDEN, ErrorBody::default(), None);
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[test]
    fn change_password_forbidden_is_wrong_current_password() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = classify(Endpoint::ChangePassword, status, ErrorBody::default(), None);
            assert_eq!(err, AuthError::InvalidCurrentPassword);
        }
    }

    #[test]
    fn register_conflict_is_duplicate_email() {
        let err = classify(
            Endpoint::Register,
            StatusCode::CONFLICT,
            ErrorBody::default(),
            Some("dup@x.com"),
        );
        assert_eq!(
            err,
            AuthError::DuplicateEmail {
                email: "dup@x.com".to_string()
            }
        );
    }

    #[test]
    fn unprocessable_keeps_field() {
        let body = ErrorBody::parse(r#"{"message":"too short","field":"password"}"#);
        let err = classify(
            Endpoint::Register,
            StatusCode::UNPROCESSABLE_ENTITY,
            body,
            Some("a@x.com"),
        );
        assert_eq!(err.field(), Some("password"));
        assert_eq!(err.to_string(), "too short");
    }

    #[test]
    fn other_failures_are_server_errors() {
        let err = classify(
            Endpoint::Login,
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::default(),
            None,
        );
        assert!(matches!(err, AuthError::Server { .. }));
        assert!(err.to_string().contains("500"));

        let err = classify(
            Endpoint::Register,
            StatusCode::UNAUTHORIZED,
            ErrorBody::parse(r#"{"error":"registration closed"}"#),
            None,
        );
        assert_eq!(err.to_string(), "registration closed");
    }
}
