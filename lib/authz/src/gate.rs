//! The authorization gate.
//!
//! A pure decision over a session snapshot, a route requirement and the
//! requested location. The table is evaluated in order and the first matching
//! [`GateRule`] decides:
//!
//! | rule             | when                                              | outcome                  |
//! |------------------|---------------------------------------------------|--------------------------|
//! | `Pending`        | status is `Idle` or `Loading`                     | loading                  |
//! | `GuestOnly`      | route redirects signed-in users, user signed in   | post-login destination   |
//! | `Authentication` | route requires sign-in, user not signed in        | login, reason `none`     |
//! | `AdminOnly`      | route requires admin, user is not one             | unauthorized             |
//! | `AdminBypass`    | route requires roles, user is admin               | render                   |
//! | `RoleMembership` | route requires roles, user holds none             | unauthorized             |
//! | `Allow`          | otherwise                                         | render                   |

use serde::{Deserialize, Serialize};
use std::fmt;
use taskdesk_platform_access::SessionState;

use crate::intent::{Location, NavigationIntent};
use crate::requirement::AuthorizationRequirement;

/// Result of running the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome<T> {
    /// The session is not resolved yet; show a loading indicator.
    Loading,
    /// Send the user elsewhere.
    Redirect {
        to: String,
        intent: Option<NavigationIntent>,
    },
    /// Show the page.
    Render(T),
}

impl<T> RenderOutcome<T> {
    /// Maps the rendered value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RenderOutcome<U> {
        match self {
            Self::Loading => RenderOutcome::Loading,
            Self::Redirect { to, intent } => RenderOutcome::Redirect { to, intent },
            Self::Render(value) => RenderOutcome::Render(f(value)),
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render(_))
    }

    /// Returns the redirect target, if this is a redirect.
    #[must_use]
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Redirect { to, .. } => Some(to),
            _ => None,
        }
    }
}

/// The row of the decision table that decided a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateRule {
    Pending,
    GuestOnly,
    Authentication,
    AdminOnly,
    /// Administrators pass every role requirement.
    AdminBypass,
    RoleMembership,
    Allow,
}

impl GateRule {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::GuestOnly => "guest_only",
            Self::Authentication => "authentication",
            Self::AdminOnly => "admin_only",
            Self::AdminBypass => "admin_bypass",
            Self::RoleMembership => "role_membership",
            Self::Allow => "allow",
        }
    }
}

impl fmt::Display for GateRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_login() -> String {
    "/login".to_string()
}

fn default_unauthorized() -> String {
    "/unauthorized".to_string()
}

fn default_landing() -> String {
    "/dashboard".to_string()
}

/// Well-known redirect destinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePaths {
    /// Where signed-out users are sent.
    #[serde(default = "default_login")]
    pub login: String,
    /// Where users lacking a role or the admin flag are sent.
    #[serde(default = "default_unauthorized")]
    pub unauthorized: String,
    /// Default page after login.
    #[serde(default = "default_landing")]
    pub landing: String,
}

impl Default for GatePaths {
    fn default() -> Self {
        Self {
            login: default_login(),
            unauthorized: default_unauthorized(),
            landing: default_landing(),
        }
    }
}

impl GatePaths {
    /// Where to go after a successful login: the carried intent's origin,
    /// else the landing page. An intent pointing back at the login page
    /// itself falls through to the landing page.
    #[must_use]
    pub fn post_login_destination(&self, intent: Option<&NavigationIntent>) -> String {
        match intent {
            Some(intent) if intent.origin().pathname() != self.login => intent.return_path(),
            _ => self.landing.clone(),
        }
    }
}

/// Decides whether a session may see a route.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationGate {
    paths: GatePaths,
}

impl AuthorizationGate {
    #[must_use]
    pub fn new(paths: GatePaths) -> Self {
        Self { paths }
    }

    #[must_use]
    pub fn paths(&self) -> &GatePaths {
        &self.paths
    }

    /// Returns the first matching rule of the decision table.
    #[must_use]
    pub fn rule(session: &SessionState, requirement: &AuthorizationRequirement) -> GateRule {
        if session.is_loading() {
            return GateRule::Pending;
        }
        let authenticated = session.is_authenticated();
        if requirement.redirect_authenticated() && authenticated {
            return GateRule::GuestOnly;
        }
        if requirement.require_auth() && !authenticated {
            return GateRule::Authentication;
        }
        if requirement.require_admin() && !session.is_admin() {
            return GateRule::AdminOnly;
        }
        let roles = requirement.required_roles();
        if !roles.is_empty() {
            if session.is_admin() {
                return GateRule::AdminBypass;
            }
            let held = session.user().is_some_and(|user| user.roles().intersects(roles));
            if !held {
                return GateRule::RoleMembership;
            }
        }
        GateRule::Allow
    }

    /// Runs the gate for `location`.
    #[must_use]
    pub fn decide(
        &self,
        session: &SessionState,
        requirement: &AuthorizationRequirement,
        location: &Location,
    ) -> RenderOutcome<()> {
        self.decide_carrying(session, requirement, location, None)
    }

    /// Runs the gate for `location`, with the intent that brought the user
    /// here. The intent only matters to guest-only routes, which forward a
    /// signed-in user to its origin.
    #[must_use]
    pub fn decide_carrying(
        &self,
        session: &SessionState,
        requirement: &AuthorizationRequirement,
        location: &Location,
        carried: Option<&NavigationIntent>,
    ) -> RenderOutcome<()> {
        match Self::rule(session, requirement) {
            GateRule::Pending => RenderOutcome::Loading,
            GateRule::GuestOnly => RenderOutcome::Redirect {
                to: self.paths.post_login_destination(carried),
                intent: None,
            },
            GateRule::Authentication => RenderOutcome::Redirect {
                to: self.paths.login.clone(),
                intent: Some(NavigationIntent::login(location.clone())),
            },
            GateRule::AdminOnly => RenderOutcome::Redirect {
                to: self.paths.unauthorized.clone(),
                intent: Some(NavigationIntent::admin_required(location.clone())),
            },
            GateRule::RoleMembership => RenderOutcome::Redirect {
                to: self.paths.unauthorized.clone(),
                intent: Some(NavigationIntent::insufficient_roles(
                    location.clone(),
                    requirement.required_roles().clone(),
                )),
            },
            GateRule::AdminBypass | GateRule::Allow => RenderOutcome::Render(()),
        }
    }

    /// Runs the gate and, if it passes, renders the page.
    pub fn guard<T>(
        &self,
        session: &SessionState,
        requirement: &AuthorizationRequirement,
        location: &Location,
        render: impl FnOnce() -> T,
    ) -> RenderOutcome<T> {
        self.decide(session, requirement, location).map(|()| render())
    }
}
