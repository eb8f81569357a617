//! Durable session storage.
//!
//! The store holds the token and the user record as two independent entries,
//! the way browser storage does, so a half-written session is representable
//! and the state machine can detect and discard it.

use chrono::{DateTime, Utc};
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::SessionStoreError;
use crate::session::Token;
use crate::user::User;

/// Persistence boundary for the client session.
///
/// Only the state machine writes through this trait.
pub trait SessionStore: Send + Sync {
    /// Reads the stored token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read or decoded.
    fn token(&self) -> Result<Option<Token>, Report<SessionStoreError>>;

    /// Reads the stored user record.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read or decoded.
    fn user(&self) -> Result<Option<User>, Report<SessionStoreError>>;

    /// Stores a complete session.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn save(&self, user: &User, token: &Token) -> Result<(), Report<SessionStoreError>>;

    /// Replaces the stored user record, keeping the token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn save_user(&self, user: &User) -> Result<(), Report<SessionStoreError>>;

    /// Removes everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn clear(&self) -> Result<(), Report<SessionStoreError>>;
}

/// Serialized session entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    /// Stored credential.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<Token>,
    /// Stored user record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    /// When the entries were last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    /// Returns true if no entry is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none()
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<StoredSession>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding a complete session.
    #[must_use]
    pub fn with_session(user: User, token: Token) -> Self {
        Self::with_entries(Some(token), Some(user))
    }

    /// Creates a store holding arbitrary entries.
    #[must_use]
    pub fn with_entries(token: Option<Token>, user: Option<User>) -> Self {
        Self {
            entries: Mutex::new(StoredSession {
                token,
                user,
                saved_at: None,
            }),
        }
    }

    /// Returns a copy of the stored entries.
    #[must_use]
    pub fn snapshot(&self) -> StoredSession {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update(&self, f: impl FnOnce(&mut StoredSession)) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut entries);
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Result<Option<Token>, Report<SessionStoreError>> {
        Ok(self.snapshot().token)
    }

    fn user(&self) -> Result<Option<User>, Report<SessionStoreError>> {
        Ok(self.snapshot().user)
    }

    fn save(&self, user: &User, token: &Token) -> Result<(), Report<SessionStoreError>> {
        self.update(|entries| {
            entries.user = Some(user.clone());
            entries.token = Some(token.clone());
            entries.saved_at = Some(Utc::now());
        });
        Ok(())
    }

    fn save_user(&self, user: &User) -> Result<(), Report<SessionStoreError>> {
        self.update(|entries| {
            entries.user = Some(user.clone());
            entries.saved_at = Some(Utc::now());
        });
        Ok(())
    }

    fn clear(&self) -> Result<(), Report<SessionStoreError>> {
        self.update(|entries| *entries = StoredSession::default());
        Ok(())
    }
}

/// Store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store for `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all entries. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(&self) -> Result<StoredSession, Report<SessionStoreError>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StoredSession::default()),
            Err(e) => {
                return Err(SessionStoreError::Read {
                    path: self.display_path(),
                    reason: e.to_string(),
                }
                .into());
            }
        };

        let stored =
            serde_json::from_slice(&bytes).map_err(|e| SessionStoreError::Corrupt {
                path: self.display_path(),
                reason: e.to_string(),
            })?;
        Ok(stored)
    }

    fn write(&self, stored: &StoredSession) -> Result<(), Report<SessionStoreError>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.write_error(&e))?;
            }
        }
        let json = serde_json::to_vec_pretty(stored).map_err(|e| SessionStoreError::Write {
            path: self.display_path(),
            reason: e.to_string(),
        })?;
        fs::write(&self.path, json).map_err(|e| self.write_error(&e))?;
        tracing::debug!(path = %self.path.display(), "session file written");
        Ok(())
    }

    fn write_error(&self, e: &io::Error) -> SessionStoreError {
        SessionStoreError::Write {
            path: self.display_path(),
            reason: e.to_string(),
        }
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

impl SessionStore for FileSessionStore {
    fn token(&self) -> Result<Option<Token>, Report<SessionStoreError>> {
        Ok(self.load()?.token)
    }

    fn user(&self) -> Result<Option<User>, Report<SessionStoreError>> {
        Ok(self.load()?.user)
    }

    fn save(&self, user: &User, token: &Token) -> Result<(), Report<SessionStoreError>> {
        self.write(&StoredSession {
            token: Some(token.clone()),
            user: Some(user.clone()),
            saved_at: Some(Utc::now()),
        })
    }

    fn save_user(&self, user: &User) -> Result<(), Report<SessionStoreError>> {
        let mut stored = self.load().unwrap_or_default();
        stored.user = Some(user.clone());
        stored.saved_at = Some(Utc::now());
        self.write(&stored)
    }

    fn clear(&self) -> Result<(), Report<SessionStoreError>> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.write_error(&e).into()),
        }
    }
}
