//! Role names and role sets.
//!
//! Roles are opaque, case-sensitive identifiers handed out by the backend
//! (e.g. `responsable_tarea`). There is no hierarchy between roles; the
//! administrator flag on [`User`](crate::User) is tracked separately.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

/// A named permission group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(String);

impl RoleName {
    /// Creates a role name. No normalization is applied.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the role name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RoleName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoleName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RoleName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Set of roles held by a user or required by a route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<RoleName>);

impl RoleSet {
    /// Creates an empty role set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Returns true if the exact role is in the set.
    #[must_use]
    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(role)
    }

    /// Returns true if at least one role is shared with `other`.
    #[must_use]
    pub fn intersects(&self, other: &RoleSet) -> bool {
        !self.0.is_disjoint(&other.0)
    }

    /// Adds a role. Returns false if it was already present.
    pub fn insert(&mut self, role: impl Into<RoleName>) -> bool {
        self.0.insert(role.into())
    }

    /// Returns true if the set holds no roles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates the roles in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &RoleName> {
        self.0.iter()
    }
}

impl<R: Into<RoleName>> FromIterator<R> for RoleSet {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, role) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{role}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_contains_nothing() {
        let roles = RoleSet::new();
        assert!(roles.is_empty());
        assert!(!roles.contains("admin"));
        assert_eq!(roles.len(), 0);
    }

    #[test]
    fn membership_is_case_sensitive() {
        let roles: RoleSet = ["responsable_tarea"].into_iter().collect();
        assert!(roles.contains("responsable_tarea"));
        assert!(!roles.contains("Responsable_Tarea"));
        assert!(!roles.contains("responsable"));
    }

    #[test]
    fn intersects_requires_a_shared_role() {
        let held: RoleSet = ["responsable_tarea", "lector"].into_iter().collect();
        let wanted: RoleSet = ["admin", "lector"].into_iter().collect();
        let other: RoleSet = ["admin"].into_iter().collect();
        assert!(held.intersects(&wanted));
        assert!(!held.intersects(&other));
        assert!(!held.intersects(&RoleSet::new()));
    }

    #[test]
    fn insert_deduplicates() {
        let mut roles = RoleSet::new();
        assert!(roles.insert("admin"));
        assert!(!roles.insert("admin"));
        assert_eq!(roles.len(), 1);
    }

    #[test]
    fn display_lists_roles_sorted() {
        let roles: RoleSet = ["zeta", "alpha"].into_iter().collect();
        assert_eq!(roles.to_string(), "alpha, zeta");
    }

    #[test]
    fn role_set_serializes_as_plain_list() {
        let roles: RoleSet = ["admin", "lector"].into_iter().collect();
        let json = serde_json::to_string(&roles).expect("serialize");
        assert_eq!(json, r#"["admin","lector"]"#);
        let parsed: RoleSet = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, roles);
    }
}
