//! Client-side session management for taskdesk.
//!
//! This crate provides:
//! - The signed-in user record (`User`, `UserPatch`) and its roles (`RoleSet`)
//! - The session snapshot (`SessionState`, `AuthStatus`, `Token`)
//! - The session reducer (`Action`, `reduce`)
//! - The state container handed to the UI (`AuthContext`)
//! - Durable session storage (`SessionStore`, `FileSessionStore`, `MemorySessionStore`)
//! - The remote backend seam (`AuthBackend`)
//!
//! # Session Model
//!
//! Exactly one status holds credentials: `Authenticated` carries both a user
//! and a token, every other status carries neither. While the status is `Idle`
//! or `Loading` no access decision can be made.
//!
//! # Example
//!
//! ```
//! use taskdesk_core::UserId;
//! use taskdesk_platform_access::{Action, AuthStatus, SessionState, Token, User, reduce};
//!
//! let user = User::new(UserId::new(), "Alice", "alice@example.com");
//!
//! let mut state = SessionState::default();
//! reduce(&mut state, Action::Started);
//! assert!(state.is_loading());
//!
//! reduce(&mut state, Action::SessionEstablished { user, token: Token::new("tok") });
//! assert_eq!(state.status(), AuthStatus::Authenticated);
//!
//! reduce(&mut state, Action::SignedOut);
//! assert!(state.user().is_none());
//! ```

pub mod backend;
pub mod context;
pub mod error;
pub mod machine;
pub mod notifier;
pub mod role;
pub mod session;
pub mod store;
pub mod user;

// Re-export main types at crate root
pub use backend::{AuthBackend, AuthGrant, Credentials, MIN_PASSWORD_LEN, PasswordChange, Registration};
pub use context::AuthContext;
pub use error::{AuthError, ErrorKind, SessionStoreError, SwallowedError, SwallowedOperation};
pub use machine::{Action, reduce};
pub use notifier::{Notice, NoticeLevel, Notifier, SilentNotifier};
pub use role::{RoleName, RoleSet};
pub use session::{AuthStatus, SessionState, Token};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoredSession};
pub use user::{User, UserPatch};
