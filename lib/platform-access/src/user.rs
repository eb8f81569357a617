//! User record held by the client session.
//!
//! The record is what the backend returns on login/registration and what the
//! session store persists. Fields are camelCase on the wire.

use serde::{Deserialize, Serialize};
use taskdesk_core::UserId;

use crate::role::RoleSet;

/// The signed-in user as known by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend-assigned user ID.
    id: UserId,
    /// Name shown in the UI.
    display_name: String,
    /// Login email.
    email: String,
    /// Administrators pass every role requirement.
    #[serde(default)]
    is_administrator: bool,
    /// Roles held by the user.
    #[serde(default)]
    roles: RoleSet,
}

impl User {
    /// Creates a non-administrator user without roles.
    #[must_use]
    pub fn new(id: UserId, display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            email: email.into(),
            is_administrator: false,
            roles: RoleSet::new(),
        }
    }

    /// Sets the roles.
    #[must_use]
    pub fn with_roles(mut self, roles: RoleSet) -> Self {
        self.roles = roles;
        self
    }

    /// Sets the administrator flag.
    #[must_use]
    pub fn with_administrator(mut self, is_administrator: bool) -> Self {
        self.is_administrator = is_administrator;
        self
    }

    /// Returns the user's ID.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns the email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns true if the user is an administrator.
    #[must_use]
    pub fn is_administrator(&self) -> bool {
        self.is_administrator
    }

    /// Returns the user's roles.
    #[must_use]
    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    /// Returns true if the user literally holds `role`.
    ///
    /// Administrators get no special treatment here.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Shallow-merges the set fields of `patch` into this record.
    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(display_name) = &patch.display_name {
            self.display_name.clone_from(display_name);
        }
        if let Some(email) = &patch.email {
            self.email.clone_from(email);
        }
        if let Some(is_administrator) = patch.is_administrator {
            self.is_administrator = is_administrator;
        }
        if let Some(roles) = &patch.roles {
            self.roles.clone_from(roles);
        }
    }
}

/// Partial update of a [`User`]. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    display_name: Option<String>,
    email: Option<String>,
    is_administrator: Option<bool>,
    roles: Option<RoleSet>,
}

impl UserPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the display name.
    #[must_use]
    pub fn display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Replaces the email.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Replaces the administrator flag.
    #[must_use]
    pub fn administrator(mut self, is_administrator: bool) -> Self {
        self.is_administrator = Some(is_administrator);
        self
    }

    /// Replaces the whole role set.
    #[must_use]
    pub fn roles(mut self, roles: RoleSet) -> Self {
        self.roles = Some(roles);
        self
    }

    /// Returns true if the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.email.is_none()
            && self.is_administrator.is_none()
            && self.roles.is_none()
    }
}
