//! Per-route access requirements.

use serde::{Deserialize, Serialize};
use std::fmt;
use taskdesk_platform_access::{RoleName, RoleSet};

/// What a session must satisfy to see a route.
///
/// Built once per route and never mutated. The default requires a signed-in
/// user and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorizationRequirement {
    require_auth: bool,
    required_roles: RoleSet,
    require_admin: bool,
    redirect_authenticated: bool,
}

impl Default for AuthorizationRequirement {
    fn default() -> Self {
        Self {
            require_auth: true,
            required_roles: RoleSet::new(),
            require_admin: false,
            redirect_authenticated: false,
        }
    }
}

impl AuthorizationRequirement {
    /// Any signed-in user.
    #[must_use]
    pub fn authenticated() -> Self {
        Self::default()
    }

    /// Anyone, signed in or not.
    #[must_use]
    pub fn public() -> Self {
        Self {
            require_auth: false,
            ..Self::default()
        }
    }

    /// Signed-out users only; a signed-in user is sent on to the post-login
    /// destination. Used for the login and registration forms.
    #[must_use]
    pub fn guest_only() -> Self {
        Self {
            redirect_authenticated: true,
            ..Self::public()
        }
    }

    /// Administrators only.
    #[must_use]
    pub fn admin() -> Self {
        Self {
            require_admin: true,
            ..Self::default()
        }
    }

    /// Signed-in users holding at least one of `roles`. Administrators pass
    /// regardless.
    #[must_use]
    pub fn any_role<I, R>(roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RoleName>,
    {
        Self {
            required_roles: roles.into_iter().collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn require_auth(&self) -> bool {
        self.require_auth
    }

    #[must_use]
    pub fn required_roles(&self) -> &RoleSet {
        &self.required_roles
    }

    #[must_use]
    pub fn require_admin(&self) -> bool {
        self.require_admin
    }

    #[must_use]
    pub fn redirect_authenticated(&self) -> bool {
        self.redirect_authenticated
    }
}

impl fmt::Display for AuthorizationRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.redirect_authenticated {
            return f.write_str("guests only");
        }
        let mut parts = Vec::new();
        if self.require_auth {
            parts.push("signed in".to_string());
        }
        if self.require_admin {
            parts.push("administrator".to_string());
        }
        if !self.required_roles.is_empty() {
            parts.push(format!("any of [{}]", self.required_roles));
        }
        if parts.is_empty() {
            return f.write_str("public");
        }
        f.write_str(&parts.join(", "))
    }
}
