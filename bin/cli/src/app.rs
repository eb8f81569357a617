//! Route tree and command handlers.

use rootcause::prelude::Report;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use taskdesk_api::HttpAuthBackend;
use taskdesk_authz::{
    AuthorizationGate, AuthorizationRequirement, GatePaths, Location, Navigation, RouteMatch,
    RouteTable,
};
use taskdesk_platform_access::{
    AuthContext, FileSessionStore, Registration, SessionState, User,
};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::CliConfig;
use crate::error::CliError;
use crate::history::History;
use crate::intent_store::IntentStore;
use crate::notifier::TerminalNotifier;
use crate::pages::{self, Page};

/// Builds the client's route tree.
///
/// # Errors
///
/// Returns an error if a pattern is malformed or mounted twice.
pub fn route_tree(paths: GatePaths) -> Result<RouteTable<Page>, Report<CliError>> {
    let login = paths.login.clone();
    let unauthorized = paths.unauthorized.clone();
    let landing = paths.landing.clone();

    let table = RouteTable::new(AuthorizationGate::new(paths))
        .route(&login, AuthorizationRequirement::guest_only(), Page::Login)
        .and_then(|t| t.route("/register", AuthorizationRequirement::guest_only(), Page::Register))
        .and_then(|t| t.route(&unauthorized, AuthorizationRequirement::public(), Page::Unauthorized))
        .and_then(|t| t.route("/", AuthorizationRequirement::authenticated(), Page::Dashboard))
        .and_then(|t| t.route(&landing, AuthorizationRequirement::authenticated(), Page::Dashboard))
        .and_then(|t| t.route("/projects", AuthorizationRequirement::authenticated(), Page::Projects))
        .and_then(|t| t.route("/projects/:id", AuthorizationRequirement::authenticated(), Page::Project))
        .and_then(|t| t.route("/tasks", AuthorizationRequirement::authenticated(), Page::Tasks))
        .and_then(|t| {
            t.route(
                "/tasks/new",
                AuthorizationRequirement::any_role(["responsable_tarea", "admin"]),
                Page::NewTask,
            )
        })
        .and_then(|t| t.route("/tasks/:id", AuthorizationRequirement::authenticated(), Page::Task))
        .and_then(|t| t.route("/files/*", AuthorizationRequirement::authenticated(), Page::Files))
        .and_then(|t| t.route("/profile", AuthorizationRequirement::authenticated(), Page::Profile))
        .and_then(|t| t.route("/reports", AuthorizationRequirement::any_role(["admin"]), Page::Reports))
        .and_then(|t| t.route("/users", AuthorizationRequirement::admin(), Page::Users))
        .and_then(|t| t.route("/roles", AuthorizationRequirement::admin(), Page::Roles))
        .map_err(|report| CliError::Routes {
            reason: report.to_string(),
        })?;
    Ok(table)
}

/// How long a finished command waits for the background token check.
pub const VERIFICATION_GRACE: Duration = Duration::from_millis(500);

/// The terminal client: session, route tree, pending intent and last page.
pub struct App {
    context: AuthContext,
    routes: RouteTable<Page>,
    intents: IntentStore,
    history: History,
}

impl App {
    /// Wires the client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend or route tree cannot be built.
    pub fn from_config(config: &CliConfig) -> Result<Self, Report<CliError>> {
        let backend = HttpAuthBackend::new(&config.api).map_err(|report| CliError::Backend {
            reason: report.to_string(),
        })?;
        let store = FileSessionStore::new(&config.session.path);
        let context = AuthContext::with_notifier(
            Arc::new(backend),
            Arc::new(store),
            Arc::new(TerminalNotifier),
        );
        Self::new(
            context,
            IntentStore::new(&config.session.intent_path),
            History::new(&config.session.history_path),
            config.routes.clone(),
        )
    }

    /// Assembles the client from parts.
    ///
    /// # Errors
    ///
    /// Returns an error if the route tree cannot be built.
    pub fn new(
        context: AuthContext,
        intents: IntentStore,
        history: History,
        paths: GatePaths,
    ) -> Result<Self, Report<CliError>> {
        Ok(Self {
            context,
            routes: route_tree(paths)?,
            intents,
            history,
        })
    }

    #[must_use]
    pub fn context(&self) -> &AuthContext {
        &self.context
    }

    fn paths(&self) -> &GatePaths {
        self.routes.gate().paths()
    }

    /// Restores the persisted session. The restored session is usable at
    /// once; the returned handle is the background token check, to be
    /// passed to [`App::settle`] once the command's output is out.
    pub fn start(&self) -> Option<JoinHandle<()>> {
        self.context.initialize()
    }

    /// Gives the background token check up to `grace` to finish, then
    /// abandons it. Its outcome never changes the session.
    pub async fn settle(verification: Option<JoinHandle<()>>, grace: Duration) {
        let Some(mut verification) = verification else {
            return;
        };
        match tokio::time::timeout(grace, &mut verification).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "token verification task failed"),
            Err(_) => {
                debug!(grace_ms = grace.as_millis(), "abandoning token verification");
                verification.abort();
            }
        }
    }

    /// `login`: signs in, then follows the pending intent.
    ///
    /// # Errors
    ///
    /// Returns the login failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, Report<CliError>> {
        let user = self
            .context
            .login(email, password)
            .await
            .map_err(CliError::from)?;
        self.continue_after_sign_in(&user)
    }

    /// `register`: creates the account, signs it in, then follows the
    /// pending intent.
    ///
    /// # Errors
    ///
    /// Returns the validation or backend failure.
    pub async fn register(&self, registration: &Registration) -> Result<String, Report<CliError>> {
        let user = self
            .context
            .register(registration)
            .await
            .map_err(CliError::from)?;
        self.continue_after_sign_in(&user)
    }

    /// `logout`: always succeeds locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the pending intent cannot be removed.
    pub async fn logout(&self) -> Result<String, Report<CliError>> {
        let was_signed_in = self.context.is_authenticated();
        self.context.logout().await;
        self.intents.clear()?;
        self.history.clear()?;
        Ok(if was_signed_in {
            "Signed out.".to_string()
        } else {
            "Not signed in.".to_string()
        })
    }

    /// `whoami`
    #[must_use]
    pub fn whoami(&self) -> String {
        let Some(user) = self.context.user() else {
            return "Not signed in.".to_string();
        };
        let mut out = format!(
            "{} <{}>\nid: {}",
            user.display_name(),
            user.email(),
            user.id()
        );
        if user.is_administrator() {
            out.push_str("\nadministrator: yes");
        }
        if !user.roles().is_empty() {
            let _ = write!(out, "\nroles: {}", user.roles());
        }
        out
    }

    /// `passwd`
    ///
    /// # Errors
    ///
    /// Returns the failure; the session is kept either way.
    pub async fn change_password(
        &self,
        current: &str,
        new: &str,
    ) -> Result<String, Report<CliError>> {
        self.context
            .change_password(current, new)
            .await
            .map_err(CliError::from)?;
        Ok("Password updated.".to_string())
    }

    /// `routes`: the route tree and each route's requirement.
    #[must_use]
    pub fn describe_routes(&self) -> String {
        let width = self
            .routes
            .routes()
            .map(|r| r.pattern().as_str().len())
            .max()
            .unwrap_or(0);
        self.routes
            .routes()
            .map(|r| {
                format!(
                    "{:width$}  {:14}  {}",
                    r.pattern().as_str(),
                    r.page().title(),
                    r.requirement()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `open <path>`: runs the gate and renders the outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if a login redirect's intent cannot be saved.
    pub fn open(&self, href: &str) -> Result<String, Report<CliError>> {
        let location = Location::parse(href);
        let carried = self.intents.load();
        let session = self.context.snapshot();

        match self.routes.navigate(&session, &location, carried.as_ref()) {
            Navigation::NotFound => Ok(format!("No page at {location}.")),
            Navigation::Loading => Ok("Loading session...".to_string()),
            Navigation::Render(matched) => self.show(&matched, &location, &session),
            Navigation::Redirect { to, intent } => {
                if to == self.paths().login {
                    if let Some(intent) = &intent {
                        self.intents.save(intent)?;
                    }
                    Ok(format!(
                        "Sign in to continue to {location}.\n{}",
                        self.open_page_only(&to)?
                    ))
                } else if to == self.paths().unauthorized {
                    let intent = intent.map(|intent| intent.with_previous(self.history.last()));
                    Ok(pages::render_unauthorized(
                        intent.as_ref(),
                        &self.paths().landing,
                    ))
                } else {
                    debug!(to = %to, "already signed in; forwarding");
                    self.intents.clear()?;
                    self.open_page_only(&to)
                }
            }
        }
    }

    fn continue_after_sign_in(&self, user: &User) -> Result<String, Report<CliError>> {
        let intent = self.intents.take()?;
        let destination = self.paths().post_login_destination(intent.as_ref());
        Ok(format!(
            "Signed in as {}.\n{}",
            user.display_name(),
            self.open_page_only(&destination)?
        ))
    }

    /// Renders `href` without following further redirects.
    fn open_page_only(&self, href: &str) -> Result<String, Report<CliError>> {
        let location = Location::parse(href);
        let session = self.context.snapshot();
        match self.routes.navigate(&session, &location, None) {
            Navigation::Render(matched) => self.show(&matched, &location, &session),
            Navigation::Redirect { to, .. } => Ok(format!("(redirected to {to})")),
            Navigation::Loading => Ok("Loading session...".to_string()),
            Navigation::NotFound => Ok(format!("No page at {location}.")),
        }
    }

    /// Renders a page the gate let through. Signed-in pages are remembered
    /// as the page to return to after a later denial.
    fn show(
        &self,
        matched: &RouteMatch<'_, Page>,
        location: &Location,
        session: &SessionState,
    ) -> Result<String, Report<CliError>> {
        let page = *matched.page();
        if !matches!(page, Page::Unauthorized | Page::Login | Page::Register) {
            self.history.record(location)?;
        }
        Ok(pages::render(
            page,
            &matched.params,
            session,
            &self.paths().landing,
        ))
    }
}
