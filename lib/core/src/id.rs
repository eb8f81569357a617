//! Account identifiers.
//!
//! The backend issues ULIDs. On the wire an id is the bare ULID; for display
//! it gets a `usr_` prefix, and parsing accepts either form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Why a string is not a valid id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    pub input: String,
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is not a user id: {}", self.input, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

/// Identifies a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Ulid);

impl UserId {
    pub const PREFIX: &'static str = "usr";

    /// Generates a fresh id. Real ids come from the backend; this is for
    /// fixtures and offline sessions.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    #[must_use]
    pub const fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    #[must_use]
    pub const fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", Self::PREFIX, self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .strip_prefix(Self::PREFIX)
            .and_then(|rest| rest.strip_prefix('_'))
            .unwrap_or(s);
        raw.parse::<Ulid>().map(Self).map_err(|e| ParseIdError {
            input: s.to_string(),
            reason: e.to_string(),
        })
    }
}

impl From<Ulid> for UserId {
    fn from(ulid: Ulid) -> Self {
        Self(ulid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_with_prefix() {
        let id = UserId::new();
        assert_eq!(id.to_string(), format!("usr_{}", id.as_ulid()));
    }

    #[test]
    fn parses_prefixed_and_bare_forms() {
        let id = UserId::new();
        assert_eq!(id.to_string().parse::<UserId>(), Ok(id));
        assert_eq!(id.as_ulid().to_string().parse::<UserId>(), Ok(id));
    }

    #[test]
    fn rejects_garbage() {
        let err = "usr_not-a-ulid".parse::<UserId>().expect_err("should reject");
        assert_eq!(err.input, "usr_not-a-ulid");
        assert!(err.to_string().contains("is not a user id"));
    }

    #[test]
    fn wire_form_is_bare_ulid() {
        let id = UserId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{}\"", id.as_ulid()));
        assert_eq!(serde_json::from_str::<UserId>(&json).expect("deserialize"), id);
    }
}
