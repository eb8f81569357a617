//! Route table: which page lives at which path and what it requires.
//!
//! Patterns are `/`-separated. A segment is either static (`tasks`), a named
//! parameter (`:id`), or a trailing `*` that swallows the rest of the path.
//! When several routes match, the most specific wins: more static segments
//! first, then more parameters, then routes without a wildcard. Ties go to
//! the route registered first.

use rootcause::prelude::Report;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use taskdesk_platform_access::SessionState;
use tracing::debug;

use crate::error::RouteError;
use crate::gate::{AuthorizationGate, GateRule, RenderOutcome};
use crate::intent::{Location, NavigationIntent};
use crate::requirement::AuthorizationRequirement;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    Wildcard,
}

/// A parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Matches `location`, returning the captured parameters.
    #[must_use]
    pub fn matches(&self, location: &Location) -> Option<RouteParams> {
        let mut params = RouteParams::default();
        let mut path = location.segments();

        for segment in &self.segments {
            match segment {
                Segment::Static(expected) => {
                    if path.next()? != expected.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.0.insert(name.clone(), path.next()?.to_string());
                }
                Segment::Wildcard => {
                    let rest: Vec<&str> = path.by_ref().collect();
                    params.0.insert("*".to_string(), rest.join("/"));
                }
            }
        }

        if path.next().is_some() {
            return None;
        }
        Some(params)
    }

    /// True if both patterns match exactly the same paths.
    fn same_shape(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Static(a), Segment::Static(b)) => a == b,
                    (Segment::Param(_), Segment::Param(_))
                    | (Segment::Wildcard, Segment::Wildcard) => true,
                    _ => false,
                })
    }

    fn specificity(&self) -> (usize, usize, bool) {
        let statics = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Static(_)))
            .count();
        let params = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Param(_)))
            .count();
        let exact = !self.segments.contains(&Segment::Wildcard);
        (statics, params, exact)
    }
}

impl FromStr for RoutePattern {
    type Err = RouteError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        if !pattern.starts_with('/') {
            return Err(RouteError::invalid(pattern, "must start with '/'"));
        }

        let parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(parts.len());
        for (i, part) in parts.iter().enumerate() {
            let segment = if *part == "*" {
                if i + 1 != parts.len() {
                    return Err(RouteError::invalid(pattern, "'*' must be the last segment"));
                }
                Segment::Wildcard
            } else if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(RouteError::invalid(pattern, "parameter without a name"));
                }
                Segment::Param(name.to_string())
            } else {
                Segment::Static((*part).to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parameters captured by a pattern. The wildcard tail is stored under `*`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(BTreeMap<String, String>);

impl RouteParams {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A page mounted at a pattern.
#[derive(Debug, Clone)]
pub struct Route<P> {
    pattern: RoutePattern,
    requirement: AuthorizationRequirement,
    page: P,
}

impl<P> Route<P> {
    #[must_use]
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    #[must_use]
    pub fn requirement(&self) -> &AuthorizationRequirement {
        &self.requirement
    }

    #[must_use]
    pub fn page(&self) -> &P {
        &self.page
    }
}

/// A resolved route and the parameters it captured.
#[derive(Debug)]
pub struct RouteMatch<'a, P> {
    pub route: &'a Route<P>,
    pub params: RouteParams,
}

impl<'a, P> RouteMatch<'a, P> {
    #[must_use]
    pub fn page(&self) -> &'a P {
        &self.route.page
    }
}

/// Result of navigating to a location.
#[derive(Debug)]
pub enum Navigation<'a, P> {
    /// No route matches the path.
    NotFound,
    /// The session is still resolving.
    Loading,
    /// The gate sent the user elsewhere.
    Redirect {
        to: String,
        intent: Option<NavigationIntent>,
    },
    /// The page may be shown.
    Render(RouteMatch<'a, P>),
}

/// Pages keyed by path pattern, each behind the authorization gate.
#[derive(Debug, Clone)]
pub struct RouteTable<P> {
    gate: AuthorizationGate,
    routes: Vec<Route<P>>,
}

impl<P> RouteTable<P> {
    #[must_use]
    pub fn new(gate: AuthorizationGate) -> Self {
        Self {
            gate,
            routes: Vec::new(),
        }
    }

    /// Registers `page` at `pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is malformed or already registered.
    pub fn route(
        mut self,
        pattern: &str,
        requirement: AuthorizationRequirement,
        page: P,
    ) -> Result<Self, Report<RouteError>> {
        let pattern: RoutePattern = pattern.parse()?;
        if self.routes.iter().any(|r| r.pattern.same_shape(&pattern)) {
            return Err(RouteError::DuplicatePattern {
                pattern: pattern.raw,
            }
            .into());
        }
        self.routes.push(Route {
            pattern,
            requirement,
            page,
        });
        Ok(self)
    }

    #[must_use]
    pub fn gate(&self) -> &AuthorizationGate {
        &self.gate
    }

    /// Iterates routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route<P>> {
        self.routes.iter()
    }

    /// Finds the most specific route for `location`.
    #[must_use]
    pub fn resolve(&self, location: &Location) -> Option<RouteMatch<'_, P>> {
        self.routes
            .iter()
            .enumerate()
            .filter_map(|(i, route)| {
                route
                    .pattern
                    .matches(location)
                    .map(|params| (i, route, params))
            })
            .max_by_key(|(i, route, _)| (route.pattern.specificity(), Reverse(*i)))
            .map(|(_, route, params)| RouteMatch { route, params })
    }

    /// True if `location` resolves to a route the gate would show to
    /// `session` right away.
    #[must_use]
    pub fn permits(&self, session: &SessionState, location: &Location) -> bool {
        self.resolve(location).is_some_and(|matched| {
            matches!(
                AuthorizationGate::rule(session, matched.route.requirement()),
                GateRule::AdminBypass | GateRule::Allow
            )
        })
    }

    /// Where a signed-in user leaving a guest-only page goes: `to` if the
    /// user may open it, else the landing page.
    fn forward_destination(&self, session: &SessionState, to: String) -> String {
        let landing = &self.gate.paths().landing;
        if to == *landing || self.permits(session, &Location::parse(&to)) {
            to
        } else {
            debug!(to = %to, "forward target not permitted; using landing page");
            landing.clone()
        }
    }

    /// Resolves `location` and runs the gate for the matched route.
    #[must_use]
    pub fn navigate(
        &self,
        session: &SessionState,
        location: &Location,
        carried: Option<&NavigationIntent>,
    ) -> Navigation<'_, P> {
        let Some(matched) = self.resolve(location) else {
            debug!(path = %location, "no route");
            return Navigation::NotFound;
        };

        let requirement = matched.route.requirement();
        let rule = AuthorizationGate::rule(session, requirement);
        debug!(
            path = %location,
            pattern = %matched.route.pattern(),
            status = %session.status(),
            rule = %rule,
            "gate decision"
        );

        match self
            .gate
            .decide_carrying(session, requirement, location, carried)
        {
            RenderOutcome::Loading => Navigation::Loading,
            RenderOutcome::Redirect { to, intent } if rule == GateRule::GuestOnly => {
                Navigation::Redirect {
                    to: self.forward_destination(session, to),
                    intent,
                }
            }
            RenderOutcome::Redirect { to, intent } => Navigation::Redirect { to, intent },
            RenderOutcome::Render(()) => Navigation::Render(matched),
        }
    }
}
