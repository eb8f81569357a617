//! The last page shown, kept on disk between invocations.
//!
//! The unauthorized page offers to go back to it, so a denial never links
//! to the page that was just denied.

use rootcause::prelude::Report;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use taskdesk_authz::Location;
use tracing::warn;

use crate::error::CliError;

#[derive(Debug, Clone)]
pub struct History {
    path: PathBuf,
}

impl History {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The last page shown, if any. An unreadable record is ignored.
    #[must_use]
    pub fn last(&self) -> Option<Location> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read page history");
                return None;
            }
        };
        serde_json::from_slice(&bytes)
            .inspect_err(|e| {
                warn!(path = %self.path.display(), error = %e, "discarding corrupt page history");
            })
            .ok()
    }

    /// Records `location` as the page shown.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn record(&self, location: &Location) -> Result<(), Report<CliError>> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.error(&e))?;
            }
        }
        let json = serde_json::to_vec(location).map_err(|e| self.error(&e))?;
        fs::write(&self.path, json).map_err(|e| self.error(&e))?;
        Ok(())
    }

    /// Forgets the last page.
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
        CliError::History {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_latest_page() {
        let dir = tempfile::tempdir().expect("tempdir");
        let history = History::new(dir.path().join("state").join("last_page.json"));
        assert!(history.last().is_none());

        history.record(&Location::parse("/projects")).expect("record");
        history.record(&Location::parse("/tasks?page=2")).expect("record");
        assert_eq!(history.last(), Some(Location::parse("/tasks?page=2")));

        history.clear().expect("clear");
        assert!(history.last().is_none());
        history.clear().expect("clear twice");
    }

    #[test]
    fn corrupt_history_is_ignored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("last_page.json");
        fs::write(&path, b"{").expect("write");
        assert!(History::new(&path).last().is_none());
    }
}
