//! Pages of the client and their terminal rendering.
//!
//! The CRUD views themselves live behind the REST API; these renderings only
//! show which page was reached and with what session.

use std::fmt;
use std::fmt::Write as _;
use taskdesk_authz::{DenialNotice, NavigationIntent, RouteParams};
use taskdesk_platform_access::SessionState;

/// Every page mounted in the route tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Login,
    Register,
    Unauthorized,
    Dashboard,
    Projects,
    Project,
    Tasks,
    NewTask,
    Task,
    Files,
    Profile,
    Reports,
    Users,
    Roles,
}

impl Page {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Login => "Sign in",
            Self::Register => "Create account",
            Self::Unauthorized => "Unauthorized",
            Self::Dashboard => "Dashboard",
            Self::Projects => "Projects",
            Self::Project => "Project",
            Self::Tasks => "Tasks",
            Self::NewTask => "New task",
            Self::Task => "Task",
            Self::Files => "Files",
            Self::Profile => "Profile",
            Self::Reports => "Reports",
            Self::Users => "Users",
            Self::Roles => "Roles",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Renders a page reached through the gate.
#[must_use]
pub fn render(
    page: Page,
    params: &RouteParams,
    session: &SessionState,
    landing: &str,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {page} ==");

    match page {
        Page::Login => {
            out.push_str("Sign in with: taskdesk login --email <email> --password <password>");
        }
        Page::Register => {
            out.push_str(
                "Create an account with: taskdesk register --name <name> --email <email> --password <password>",
            );
        }
        Page::Unauthorized => {
            out.push_str(&render_denial(&DenialNotice::from_intent(None, landing)));
        }
        _ => {
            if let Some(user) = session.user() {
                let _ = write!(out, "Signed in as {} <{}>", user.display_name(), user.email());
                if user.is_administrator() {
                    out.push_str(" (administrator)");
                }
                if !user.roles().is_empty() {
                    let _ = write!(out, "\nRoles: {}", user.roles());
                }
            }
            for (name, value) in params.iter() {
                let _ = write!(out, "\n{name}: {value}");
            }
        }
    }
    out
}

/// Renders the unauthorized page for a denied navigation.
#[must_use]
pub fn render_unauthorized(intent: Option<&NavigationIntent>, landing: &str) -> String {
    let notice = DenialNotice::from_intent(intent, landing);
    format!("== {} ==\n{}", Page::Unauthorized, render_denial(&notice))
}

fn render_denial(notice: &DenialNotice) -> String {
    let mut out = format!("{}\n{}", notice.title, notice.explanation);
    for action in &notice.actions {
        let _ = write!(out, "\n  {}: taskdesk open {}", action.label, action.target);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdesk_authz::Location;
    use taskdesk_core::UserId;
    use taskdesk_platform_access::{Token, User};

    #[test]
    fn dashboard_shows_signed_in_user() {
        let user = User::new(UserId::new(), "Alice", "a@x.com")
            .with_roles(["responsable_tarea"].into_iter().collect());
        let session = SessionState::authenticated(user, Token::new("tok"));

        let out = render(Page::Dashboard, &RouteParams::default(), &session, "/dashboard");
        assert!(out.starts_with("== Dashboard =="));
        assert!(out.contains("Signed in as Alice <a@x.com>"));
        assert!(out.contains("Roles: responsable_tarea"));
    }

    #[test]
    fn unauthorized_page_explains_role_denial() {
        let intent = NavigationIntent::insufficient_roles(
            Location::parse("/reports"),
            ["admin"].into_iter().collect(),
        )
        .with_previous(Some(Location::parse("/projects")));
        let out = render_unauthorized(Some(&intent), "/dashboard");
        assert!(out.contains("Insufficient permissions"));
        assert!(out.contains("admin"));
        assert!(out.contains("Return to previous page: taskdesk open /projects"));
        assert!(!out.contains("taskdesk open /reports"));
        assert!(out.contains("Go to dashboard: taskdesk open /dashboard"));
    }
}
