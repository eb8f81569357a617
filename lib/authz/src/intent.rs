//! Locations and the intent carried across a denied navigation.

use serde::{Deserialize, Serialize};
use std::fmt;
use taskdesk_platform_access::RoleSet;

/// A navigable location: path plus optional query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pathname: String,
    #[serde(default)]
    search: String,
}

impl Location {
    /// Parses `"/path?query"`. A missing leading slash is added.
    #[must_use]
    pub fn parse(href: &str) -> Self {
        let (path, query) = match href.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (href, None),
        };
        let pathname = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let search = match query {
            Some(query) if !query.is_empty() => format!("?{query}"),
            _ => String::new(),
        };
        Self { pathname, search }
    }

    /// The path component, always starting with `/`.
    #[must_use]
    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    /// The query string including its leading `?`, or empty.
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Path segments, ignoring empty ones.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.pathname.split('/').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pathname, self.search)
    }
}

impl From<&str> for Location {
    fn from(href: &str) -> Self {
        Self::parse(href)
    }
}

/// Why the gate turned a navigation away.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// Not signed in.
    #[default]
    None,
    /// The route is for administrators.
    AdminRequired,
    /// The user holds none of the route's roles.
    InsufficientRoles,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::AdminRequired => "admin_required",
            Self::InsufficientRoles => "insufficient_roles",
        };
        f.write_str(name)
    }
}

/// Record handed to the redirect target: where the user was going, why
/// they were stopped, and the page they were on before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationIntent {
    from: Location,
    #[serde(default)]
    reason: DenialReason,
    #[serde(default)]
    required_roles: RoleSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    previous: Option<Location>,
}

impl NavigationIntent {
    /// Intent for a signed-out user sent to the login page.
    #[must_use]
    pub fn login(from: Location) -> Self {
        Self {
            from,
            reason: DenialReason::None,
            required_roles: RoleSet::new(),
            previous: None,
        }
    }

    /// Intent for a non-administrator stopped at an admin route.
    #[must_use]
    pub fn admin_required(from: Location) -> Self {
        Self {
            from,
            reason: DenialReason::AdminRequired,
            required_roles: RoleSet::new(),
            previous: None,
        }
    }

    /// Intent for a user holding none of `required_roles`.
    #[must_use]
    pub fn insufficient_roles(from: Location, required_roles: RoleSet) -> Self {
        Self {
            from,
            reason: DenialReason::InsufficientRoles,
            required_roles,
            previous: None,
        }
    }

    /// Records the page shown before the denied navigation. A referrer equal
    /// to the denied location is dropped.
    #[must_use]
    pub fn with_previous(mut self, previous: Option<Location>) -> Self {
        self.previous = previous.filter(|p| *p != self.from);
        self
    }

    /// The location the user was trying to reach.
    #[must_use]
    pub fn origin(&self) -> &Location {
        &self.from
    }

    #[must_use]
    pub fn reason(&self) -> DenialReason {
        self.reason
    }

    #[must_use]
    pub fn required_roles(&self) -> &RoleSet {
        &self.required_roles
    }

    /// The page shown before the denied navigation, if known.
    #[must_use]
    pub fn previous(&self) -> Option<&Location> {
        self.previous.as_ref()
    }

    /// Where to send the user back to: path and query of `from`.
    #[must_use]
    pub fn return_path(&self) -> String {
        self.from.to_string()
    }
}

/// A button on the unauthorized page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenialAction {
    pub label: &'static str,
    pub target: String,
}

/// What the unauthorized page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenialNotice {
    pub title: String,
    pub explanation: String,
    pub actions: Vec<DenialAction>,
}

impl DenialNotice {
    /// Builds the notice for the intent carried to the unauthorized page.
    ///
    /// "Return to previous page" is offered only when the intent knows the
    /// page shown before the denied one; "go to dashboard" always is.
    #[must_use]
    pub fn from_intent(intent: Option<&NavigationIntent>, landing: &str) -> Self {
        let (title, explanation) = match intent.map(|i| (i.reason(), i.required_roles())) {
            Some((DenialReason::AdminRequired, _)) => (
                "Administrator access required".to_string(),
                "This page is only available to administrators.".to_string(),
            ),
            Some((DenialReason::InsufficientRoles, roles)) if !roles.is_empty() => (
                "Insufficient permissions".to_string(),
                format!("This page requires one of the following roles: {roles}."),
            ),
            _ => (
                "Access denied".to_string(),
                "You do not have permission to view this page.".to_string(),
            ),
        };

        let mut actions = Vec::with_capacity(2);
        if let Some(previous) = intent
            .and_then(NavigationIntent::previous)
            .filter(|previous| Some(*previous) != intent.map(NavigationIntent::origin))
        {
            actions.push(DenialAction {
                label: "Return to previous page",
                target: previous.to_string(),
            });
        }
        actions.push(DenialAction {
            label: "Go to dashboard",
            target: landing.to_string(),
        });

        Self {
            title,
            explanation,
            actions,
        }
    }
}
