//! The pending navigation intent, kept on disk between invocations.
//!
//! In a browser the intent rides along in router state. Here each command is a
//! separate process, so `open` writes it and `login` consumes it.

use rootcause::prelude::Report;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use taskdesk_authz::NavigationIntent;
use tracing::{debug, warn};

use crate::error::CliError;

/// File-backed slot holding at most one intent.
#[derive(Debug, Clone)]
pub struct IntentStore {
    path: PathBuf,
}

impl IntentStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the pending intent. An unreadable intent is dropped with a
    /// warning; a stale redirect is not worth failing a command over.
    #[must_use]
    pub fn load(&self) -> Option<NavigationIntent> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read navigation intent");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(intent) => Some(intent),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding corrupt navigation intent");
                None
            }
        }
    }

    /// Replaces the pending intent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, intent: &NavigationIntent) -> Result<(), Report<CliError>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.error(&e))?;
            }
        }
        let json = serde_json::to_vec_pretty(intent).map_err(|e| self.error(&e))?;
        fs::write(&self.path, json).map_err(|e| self.error(&e))?;
        debug!(path = %self.path.display(), from = %intent.origin(), "navigation intent saved");
        Ok(())
    }

    /// Removes and returns the pending intent.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    pub fn take(&self) -> Result<Option<NavigationIntent>, Report<CliError>> {
        let intent = self.load();
        self.clear()?;
        Ok(intent)
    }

    /// Drops the pending intent, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    pub fn clear(&self) -> Result<(), Report<CliError>> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.error(&e).into()),
        }
    }

    fn error(&self, e: &dyn std::error::Error) -> CliError {
        CliError::IntentStore {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }
}
