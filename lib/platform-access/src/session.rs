//! Client-side session state.
//!
//! `SessionState` is the single in-memory belief about who is signed in. It is
//! only ever changed by [`reduce`](crate::machine::reduce); everything else
//! reads snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::user::User;

/// Opaque credential issued by the backend.
///
/// `Debug` output is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wraps a raw credential string.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw credential.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    /// Nothing has been resolved yet.
    #[default]
    Idle,
    /// Initialization or a credential-changing action is in flight.
    Loading,
    /// A user and token are held.
    Authenticated,
    /// No session.
    Unauthenticated,
    /// The last credential-changing action failed.
    Error,
}

impl AuthStatus {
    /// Returns true while no access decision can be made yet.
    #[must_use]
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Idle | Self::Loading)
    }

    /// Returns the lowercase status name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Authenticated => "authenticated",
            Self::Unauthenticated => "unauthenticated",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the client session.
///
/// Only `Authenticated` carries a user and token; every other status carries
/// neither.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub(crate) user: Option<User>,
    pub(crate) token: Option<Token>,
    pub(crate) status: AuthStatus,
    pub(crate) error: Option<String>,
}

impl SessionState {
    /// Creates an authenticated snapshot.
    #[must_use]
    pub fn authenticated(user: User, token: Token) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            status: AuthStatus::Authenticated,
            error: None,
        }
    }

    /// Creates a signed-out snapshot.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self {
            status: AuthStatus::Unauthenticated,
            ..Self::default()
        }
    }

    /// Creates an in-flight snapshot.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            status: AuthStatus::Loading,
            ..Self::default()
        }
    }

    /// Returns the signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Returns the credential, if any.
    #[must_use]
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> AuthStatus {
        self.status
    }

    /// Returns the last failure reason, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns true if a user and token are held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status == AuthStatus::Authenticated
    }

    /// Returns true while the session is unresolved or an action is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status.is_pending()
    }

    /// Returns true if the signed-in user literally holds `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.user.as_ref().is_some_and(|user| user.has_role(role))
    }

    /// Returns true if the signed-in user is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_administrator)
    }

    /// Checks the status/credential invariant.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let holds_session = self.user.is_some() && self.token.is_some();
        let holds_nothing = self.user.is_none() && self.token.is_none();
        match self.status {
            AuthStatus::Authenticated => holds_session,
            _ => holds_nothing,
        }
    }
}
