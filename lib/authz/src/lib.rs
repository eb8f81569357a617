//! Route authorization for taskdesk.
//!
//! This crate decides, per navigation, whether the current session may see a
//! page. The gate is a pure function of a session snapshot and the route's
//! [`AuthorizationRequirement`]; it never errors. A denial is a redirect that
//! carries a [`NavigationIntent`] so the destination can explain itself and
//! send the user back after login.

mod error;
mod gate;
mod intent;
mod requirement;
mod route;

pub use error::RouteError;
pub use gate::{AuthorizationGate, GatePaths, GateRule, RenderOutcome};
pub use intent::{DenialAction, DenialNotice, DenialReason, Location, NavigationIntent};
pub use requirement::AuthorizationRequirement;
pub use route::{Navigation, Route, RouteMatch, RouteParams, RoutePattern, RouteTable};
