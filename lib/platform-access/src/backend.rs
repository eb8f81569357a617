//! Remote authentication backend interface.
//!
//! The session core never talks HTTP itself. It drives an [`AuthBackend`],
//! which the API crate implements over REST and tests replace with fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AuthError;
use crate::session::Token;
use crate::user::User;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// What the backend hands back after a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthGrant {
    /// The signed-in user.
    pub user: User,
    /// The issued credential.
    pub token: Token,
}

impl AuthGrant {
    /// Creates a grant.
    #[must_use]
    pub fn new(user: User, token: Token) -> Self {
        Self { user, token }
    }
}

/// Email/password pair for login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Creates credentials. Surrounding whitespace is trimmed from the email.
    #[must_use]
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            password: password.to_string(),
        }
    }

    /// Returns the email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Account-creation request.
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    display_name: String,
    email: String,
    password: String,
    password_confirmation: Option<String>,
}

impl Registration {
    /// Creates a registration request.
    #[must_use]
    pub fn new(display_name: &str, email: &str, password: &str) -> Self {
        Self {
            display_name: display_name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
            password_confirmation: None,
        }
    }

    /// Sets the repeated password typed by the user.
    #[must_use]
    pub fn with_confirmation(mut self, confirmation: &str) -> Self {
        self.password_confirmation = Some(confirmation.to_string());
        self
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Checks the request before it is sent.
    ///
    /// # Errors
    ///
    /// Returns a field-tagged [`AuthError::Validation`] for the first invalid field.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.display_name.is_empty() {
            return Err(AuthError::invalid_field("name", "name is required"));
        }
        if !is_plausible_email(&self.email) {
            return Err(AuthError::invalid_field(
                "email",
                "enter a valid email address",
            ));
        }
        check_password_length("password", &self.password)?;
        if let Some(confirmation) = &self.password_confirmation {
            if confirmation != &self.password {
                return Err(AuthError::invalid_field(
                    "passwordConfirmation",
                    "passwords do not match",
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Password change request.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordChange {
    current: String,
    new: String,
}

impl PasswordChange {
    /// Creates a password change request.
    #[must_use]
    pub fn new(current: &str, new: &str) -> Self {
        Self {
            current: current.to_string(),
            new: new.to_string(),
        }
    }

    /// Returns the current password.
    #[must_use]
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Returns the new password.
    #[must_use]
    pub fn new_password(&self) -> &str {
        &self.new
    }

    /// Checks the request before it is sent.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if the new password is too short or
    /// equal to the current one.
    pub fn validate(&self) -> Result<(), AuthError> {
        check_password_length("newPassword", &self.new)?;
        if self.new == self.current {
            return Err(AuthError::invalid_field(
                "newPassword",
                "new password must differ from the current one",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for PasswordChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordChange { .. }")
    }
}

fn check_password_length(field: &str, password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::invalid_field(
            field,
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

/// Remote authentication service.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchanges credentials for a user and token.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials`, `Network` or `Server`.
    async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, AuthError>;

    /// Creates an account and signs it in.
    ///
    /// # Errors
    ///
    /// `Validation`, `DuplicateEmail`, `Network` or `Server`.
    async fn register(&self, registration: &Registration) -> Result<AuthGrant, AuthError>;

    /// Invalidates the token remotely.
    ///
    /// # Errors
    ///
    /// Any failure; callers ignore it.
    async fn logout(&self, token: &Token) -> Result<(), AuthError>;

    /// Asks whether the token is still accepted.
    ///
    /// # Errors
    ///
    /// Any transport or server failure; callers ignore it.
    async fn verify_token(&self, token: &Token) -> Result<bool, AuthError>;

    /// Changes the password of the token's owner.
    ///
    /// # Errors
    ///
    /// `InvalidCurrentPassword`, `Validation`, `Network` or `Server`.
    async fn change_password(&self, token: &Token, change: &PasswordChange)
    -> Result<(), AuthError>;
}
