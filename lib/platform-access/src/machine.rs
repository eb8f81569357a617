//! Session reducer.
//!
//! Every change to [`SessionState`] is an [`Action`] applied by [`reduce`].
//! The reducer is total: each action is defined for every state, and every
//! resulting state satisfies [`SessionState::is_consistent`].

use crate::session::{AuthStatus, SessionState, Token};
use crate::user::{User, UserPatch};

/// A state transition request.
#[derive(Debug, Clone)]
pub enum Action {
    /// A credential-changing operation started.
    Started,
    /// A session was restored, logged in or registered.
    SessionEstablished { user: User, token: Token },
    /// Initialization found nothing to restore.
    NoSession,
    /// Login or registration failed.
    Failed { message: String },
    /// A password change finished. `error` is set when it failed.
    PasswordChangeSettled {
        user: User,
        token: Token,
        error: Option<String>,
    },
    /// The session was torn down.
    SignedOut,
    /// Profile fields changed locally.
    UserUpdated(UserPatch),
    /// The error message was dismissed.
    ErrorCleared,
}

impl Action {
    /// Returns the action name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::SessionEstablished { .. } => "session_established",
            Self::NoSession => "no_session",
            Self::Failed { .. } => "failed",
            Self::PasswordChangeSettled { .. } => "password_change_settled",
            Self::SignedOut => "signed_out",
            Self::UserUpdated(_) => "user_updated",
            Self::ErrorCleared => "error_cleared",
        }
    }
}

/// Applies `action` to `state`.
pub fn reduce(state: &mut SessionState, action: Action) {
    match action {
        Action::Started => {
            *state = SessionState::loading();
        }
        Action::SessionEstablished { user, token } => {
            *state = SessionState::authenticated(user, token);
        }
        Action::NoSession | Action::SignedOut => {
            *state = SessionState::unauthenticated();
        }
        Action::Failed { message } => {
            *state = SessionState {
                status: AuthStatus::Error,
                error: Some(message),
                ..SessionState::default()
            };
        }
        Action::PasswordChangeSettled { user, token, error } => {
            // A logout or login that finished first owns the state.
            if state.status == AuthStatus::Loading {
                *state = SessionState::authenticated(user, token);
                state.error = error;
            }
        }
        Action::UserUpdated(patch) => {
            if state.status == AuthStatus::Authenticated {
                if let Some(user) = state.user.as_mut() {
                    user.apply(&patch);
                }
            }
        }
        Action::ErrorCleared => {
            state.error = None;
        }
    }
}
