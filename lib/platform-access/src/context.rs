//! The session state container handed to the UI.
//!
//! `AuthContext` owns the only writable copy of [`SessionState`]. Operations
//! dispatch [`Action`]s through [`reduce`]; each dispatch is applied under the
//! watch channel's lock, so reductions never interleave. Readers take
//! snapshots or subscribe for change notifications.
//!
//! # Failure policy
//!
//! - login, register and password-change failures are stored in
//!   `SessionState::error` and returned to the caller.
//! - remote logout, background token verification and session-store failures
//!   are logged and dropped. A local session restored from the store is
//!   trusted until the next explicit login or logout.

use rootcause::prelude::Report;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::{AuthBackend, AuthGrant, Credentials, PasswordChange, Registration};
use crate::error::{
    AuthError, SessionStoreError, SwallowedError, SwallowedOperation, swallow,
};
use crate::machine::{Action, reduce};
use crate::notifier::{Notice, Notifier, SilentNotifier};
use crate::session::{AuthStatus, SessionState, Token};
use crate::store::SessionStore;
use crate::user::{User, UserPatch};

/// Injectable handle to the client session. Clones share the same state.
#[derive(Clone)]
pub struct AuthContext {
    inner: Arc<Inner>,
}

struct Inner {
    state: watch::Sender<SessionState>,
    backend: Arc<dyn AuthBackend>,
    store: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
}

impl AuthContext {
    /// Creates an idle context that raises no notices.
    #[must_use]
    pub fn new(backend: Arc<dyn AuthBackend>, store: Arc<dyn SessionStore>) -> Self {
        Self::with_notifier(backend, store, Arc::new(SilentNotifier))
    }

    /// Creates an idle context reporting to `notifier`.
    #[must_use]
    pub fn with_notifier(
        backend: Arc<dyn AuthBackend>,
        store: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(Inner {
                state,
                backend,
                store,
                notifier,
            }),
        }
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn status(&self) -> AuthStatus {
        self.inner.state.borrow().status()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.state.borrow().user().cloned()
    }

    #[must_use]
    pub fn token(&self) -> Option<Token> {
        self.inner.state.borrow().token().cloned()
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.inner.state.borrow().error().map(str::to_string)
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Literal role membership. No administrator override.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.inner.state.borrow().has_role(role)
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.inner.state.borrow().is_admin()
    }

    /// Restores the persisted session.
    ///
    /// A complete persisted session is trusted immediately and its token is
    /// verified in the background; the returned handle resolves when that
    /// check is done. Verification never demotes the session. Without a
    /// Tokio runtime the check is skipped.
    pub fn initialize(&self) -> Option<JoinHandle<()>> {
        self.dispatch(Action::Started);

        let (token, user) = self.read_store().unwrap_or_else(|err| {
            swallow(Err(err));
            (None, None)
        });

        match (token, user) {
            (Some(token), Some(user)) => {
                info!(user_id = %user.id(), "restored persisted session");
                self.dispatch(Action::SessionEstablished {
                    user: user.clone(),
                    token: token.clone(),
                });
                self.spawn_verification(token, user)
            }
            (None, None) => {
                debug!("no persisted session");
                self.dispatch(Action::NoSession);
                None
            }
            (token, user) => {
                warn!(
                    has_token = token.is_some(),
                    has_user = user.is_some(),
                    "discarding partial persisted session"
                );
                swallow(
                    self.inner
                        .store
                        .clear()
                        .map_err(store_failure(SwallowedOperation::Clear)),
                );
                self.dispatch(Action::NoSession);
                None
            }
        }
    }

    /// Signs in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the backend failure, which is also stored in the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let credentials = Credentials::new(email, password);
        self.dispatch(Action::Started);

        match self.inner.backend.login(&credentials).await {
            Ok(grant) => {
                let user = self.establish(grant);
                info!(user_id = %user.id(), "signed in");
                self.notify(Notice::success(format!("Welcome, {}", user.display_name())));
                Ok(user)
            }
            Err(error) => {
                warn!(kind = %error.kind(), error = %error, "login failed");
                self.fail(&error);
                Err(error)
            }
        }
    }

    /// Creates an account and signs it in.
    ///
    /// # Errors
    ///
    /// Returns the validation or backend failure with its field detail; the
    /// message is also stored in the session.
    pub async fn register(&self, registration: &Registration) -> Result<User, AuthError> {
        self.dispatch(Action::Started);

        let result = match registration.validate() {
            Ok(()) => self.inner.backend.register(registration).await,
            Err(error) => Err(error),
        };

        match result {
            Ok(grant) => {
                let user = self.establish(grant);
                info!(user_id = %user.id(), "registered and signed in");
                self.notify(Notice::success(format!(
                    "Account created. Welcome, {}",
                    user.display_name()
                )));
                Ok(user)
            }
            Err(error) => {
                warn!(
                    kind = %error.kind(),
                    field = error.field().unwrap_or("-"),
                    error = %error,
                    "registration failed"
                );
                self.fail(&error);
                Err(error)
            }
        }
    }

    /// Signs out. Always ends `Unauthenticated`; remote failures are ignored.
    pub async fn logout(&self) {
        let token = {
            let state = self.inner.state.borrow();
            if state.status() == AuthStatus::Unauthenticated {
                debug!("logout without a session");
                return;
            }
            state.token().cloned()
        };
        let token = token.or_else(|| self.inner.store.token().ok().flatten());

        self.dispatch(Action::Started);

        if let Some(token) = token {
            let remote = self
                .inner
                .backend
                .logout(&token)
                .await
                .map_err(|e| SwallowedError::new(SwallowedOperation::Logout, e.to_string()));
            swallow(remote);
        }
        swallow(
            self.inner
                .store
                .clear()
                .map_err(store_failure(SwallowedOperation::Clear)),
        );

        self.dispatch(Action::SignedOut);
        info!("signed out");
        self.notify(Notice::info("Signed out"));
    }

    /// Shallow-merges `patch` into the signed-in user.
    ///
    /// Ignored without a session. The merged record is persisted; nothing is
    /// re-verified.
    pub fn update_user(&self, patch: UserPatch) {
        if !self.is_authenticated() {
            debug!("ignoring profile update without a session");
            return;
        }
        if patch.is_empty() {
            return;
        }

        self.dispatch(Action::UserUpdated(patch));

        if let Some(user) = self.user() {
            swallow(
                self.inner
                    .store
                    .save_user(&user)
                    .map_err(store_failure(SwallowedOperation::Persist)),
            );
        }
    }

    /// Changes the signed-in user's password.
    ///
    /// The session survives a failed attempt; the failure is stored in
    /// `error` and returned.
    ///
    /// # Errors
    ///
    /// `NotAuthenticated` without a session (state untouched), otherwise the
    /// validation or backend failure.
    pub async fn change_password(&self, current: &str, new: &str) -> Result<(), AuthError> {
        let Some((user, token)) = self.session_credentials() else {
            return Err(AuthError::NotAuthenticated);
        };
        let change = PasswordChange::new(current, new);

        self.dispatch(Action::Started);

        let result = match change.validate() {
            Ok(()) => self.inner.backend.change_password(&token, &change).await,
            Err(error) => Err(error),
        };

        let error = result.as_ref().err().map(ToString::to_string);
        self.dispatch(Action::PasswordChangeSettled { user, token, error });

        match &result {
            Ok(()) => {
                info!("password changed");
                self.notify(Notice::success("Password updated"));
            }
            Err(error) => {
                warn!(kind = %error.kind(), error = %error, "password change failed");
                self.notify(Notice::error(error.to_string()));
            }
        }
        result
    }

    /// Dismisses the stored error. The status is left as it is.
    pub fn clear_error(&self) {
        self.dispatch(Action::ErrorCleared);
    }

    fn dispatch(&self, action: Action) {
        let name = action.name();
        self.inner.state.send_modify(|state| reduce(state, action));
        debug!(action = name, status = %self.status(), "session action applied");
    }

    fn establish(&self, grant: AuthGrant) -> User {
        let AuthGrant { user, token } = grant;
        swallow(
            self.inner
                .store
                .save(&user, &token)
                .map_err(store_failure(SwallowedOperation::Persist)),
        );
        self.dispatch(Action::SessionEstablished {
            user: user.clone(),
            token,
        });
        user
    }

    fn fail(&self, error: &AuthError) {
        self.dispatch(Action::Failed {
            message: error.to_string(),
        });
        self.notify(Notice::error(error.to_string()));
    }

    fn notify(&self, notice: Notice) {
        self.inner.notifier.notify(notice);
    }

    fn read_store(&self) -> Result<(Option<Token>, Option<User>), SwallowedError> {
        let token = self
            .inner
            .store
            .token()
            .map_err(store_failure(SwallowedOperation::Load))?;
        let user = self
            .inner
            .store
            .user()
            .map_err(store_failure(SwallowedOperation::Load))?;
        Ok((token, user))
    }

    fn session_credentials(&self) -> Option<(User, Token)> {
        let state = self.inner.state.borrow();
        if !state.is_authenticated() {
            return None;
        }
        Some((state.user()?.clone(), state.token()?.clone()))
    }

    fn spawn_verification(&self, token: Token, user: User) -> Option<JoinHandle<()>> {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime; skipping background token verification");
            return None;
        };
        let backend = Arc::clone(&self.inner.backend);
        Some(runtime.spawn(async move {
            swallow(verify_session(backend.as_ref(), &token, &user).await);
        }))
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("state", &*self.inner.state.borrow())
            .finish_non_exhaustive()
    }
}

async fn verify_session(
    backend: &dyn AuthBackend,
    token: &Token,
    user: &User,
) -> Result<(), SwallowedError> {
    match backend.verify_token(token).await {
        Ok(true) => {
            debug!(user_id = %user.id(), "persisted token verified");
            Ok(())
        }
        Ok(false) => Err(SwallowedError::new(
            SwallowedOperation::VerifyToken,
            format!("token for {} rejected; keeping local session", user.id()),
        )),
        Err(e) => Err(SwallowedError::new(
            SwallowedOperation::VerifyToken,
            e.to_string(),
        )),
    }
}

fn store_failure(
    operation: SwallowedOperation,
) -> impl Fn(Report<SessionStoreError>) -> SwallowedError {
    move |report| SwallowedError::new(operation, report.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::NoticeLevel;
    use crate::store::MemorySessionStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use taskdesk_core::UserId;
    use tokio::sync::Notify;

    fn alice() -> User {
        User::new(UserId::new(), "Alice", "a@x.com")
            .with_roles(["responsable_tarea"].into_iter().collect())
    }

    /// Backend answering from canned results and recording calls.
    struct FakeBackend {
        grant: AuthGrant,
        login_error: Option<AuthError>,
        register_error: Option<AuthError>,
        logout_error: Option<AuthError>,
        verify: Result<bool, AuthError>,
        change_error: Option<AuthError>,
        login_gate: Option<Arc<Notify>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeBackend {
        fn accepting(user: User) -> Self {
            Self {
                grant: AuthGrant::new(user, Token::new("fresh-token")),
                login_error: None,
                register_error: None,
                logout_error: None,
                verify: Ok(true),
                change_error: None,
                login_gate: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn answer<T>(&self, ok: T, error: Option<&AuthError>) -> Result<T, AuthError> {
            match error {
                Some(e) => Err(e.clone()),
                None => Ok(ok),
            }
        }
    }

    #[async_trait]
    impl AuthBackend for FakeBackend {
        async fn login(&self, _credentials: &Credentials) -> Result<AuthGrant, AuthError> {
            self.record("login");
            if let Some(gate) = &self.login_gate {
                gate.notified().await;
            }
            self.answer(self.grant.clone(), self.login_error.as_ref())
        }

        async fn register(&self, _registration: &Registration) -> Result<AuthGrant, AuthError> {
            self.record("register");
            self.answer(self.grant.clone(), self.register_error.as_ref())
        }

        async fn logout(&self, _token: &Token) -> Result<(), AuthError> {
            self.record("logout");
            self.answer((), self.logout_error.as_ref())
        }

        async fn verify_token(&self, _token: &Token) -> Result<bool, AuthError> {
            self.record("verify_token");
            self.verify.clone()
        }

        async fn change_password(
            &self,
            _token: &Token,
            _change: &PasswordChange,
        ) -> Result<(), AuthError> {
            self.record("change_password");
            self.answer((), self.change_error.as_ref())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        notices: Mutex<Vec<Notice>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    struct Harness {
        context: AuthContext,
        backend: Arc<FakeBackend>,
        store: Arc<MemorySessionStore>,
        notifier: Arc<RecordingNotifier>,
    }

    fn harness(backend: FakeBackend, store: MemorySessionStore) -> Harness {
        let backend = Arc::new(backend);
        let store = Arc::new(store);
        let notifier = Arc::new(RecordingNotifier::default());
        let context = AuthContext::with_notifier(
            backend.clone(),
            store.clone(),
            notifier.clone(),
        );
        Harness {
            context,
            backend,
            store,
            notifier,
        }
    }

    fn signed_in_harness(backend: FakeBackend) -> Harness {
        let user = backend.grant.user.clone();
        let h = harness(backend, MemorySessionStore::with_session(user, Token::new("stored")));
        h.context.initialize();
        assert!(h.context.is_authenticated());
        h
    }

    #[tokio::test]
    async fn new_context_is_idle() {
        let h = harness(FakeBackend::accepting(alice()), MemorySessionStore::new());
        assert_eq!(h.context.status(), AuthStatus::Idle);
        assert!(h.context.is_loading());
        assert!(h.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn initialize_without_session_settles_unauthenticated() {
        let h = harness(FakeBackend::accepting(alice()), MemorySessionStore::new());
        let verification = h.context.initialize();

        assert!(verification.is_none());
        assert_eq!(h.context.status(), AuthStatus::Unauthenticated);
        assert!(h.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn initialize_trusts_persisted_session_before_verifying() {
        let user = alice();
        let h = harness(
            FakeBackend::accepting(user.clone()),
            MemorySessionStore::with_session(user.clone(), Token::new("stored")),
        );

        let verification = h.context.initialize().expect("verification spawned");
        assert!(h.context.is_authenticated());
        assert_eq!(h.context.user(), Some(user));
        assert_eq!(h.context.token(), Some(Token::new("stored")));

        verification.await.expect("verification task");
        assert_eq!(h.backend.calls(), vec!["verify_token"]);
        assert!(h.context.is_authenticated());
    }

    #[tokio::test]
    async fn failed_verification_never_demotes_session() {
        let user = alice();
        let mut backend = FakeBackend::accepting(user.clone());
        backend.verify = Err(AuthError::Network {
            message: "connection refused".to_string(),
        });
        let h = harness(backend, MemorySessionStore::with_session(user, Token::new("stored")));

        h.context
            .initialize()
            .expect("verification spawned")
            .await
            .expect("verification task");

        assert_eq!(h.context.status(), AuthStatus::Authenticated);
        assert!(h.context.error().is_none());
    }

    #[tokio::test]
    async fn rejected_token_keeps_local_session() {
        let user = alice();
        let mut backend = FakeBackend::accepting(user.clone());
        backend.verify = Ok(false);
        let h = harness(backend, MemorySessionStore::with_session(user, Token::new("stale")));

        h.context
            .initialize()
            .expect("verification spawned")
            .await
            .expect("verification task");

        assert!(h.context.is_authenticated());
        assert!(h.store.snapshot().token.is_some());
    }

    #[tokio::test]
    async fn partial_persisted_session_is_discarded() {
        let h = harness(
            FakeBackend::accepting(alice()),
            MemorySessionStore::with_entries(Some(Token::new("orphan")), None),
        );

        assert!(h.context.initialize().is_none());
        assert_eq!(h.context.status(), AuthStatus::Unauthenticated);
        assert!(h.store.snapshot().is_empty());
    }

    #[test]
    fn initialize_outside_runtime_skips_verification() {
        let user = alice();
        let h = harness(
            FakeBackend::accepting(user.clone()),
            MemorySessionStore::with_session(user, Token::new("stored")),
        );
        assert!(h.context.initialize().is_none());
        assert!(h.context.is_authenticated());
    }

    #[tokio::test]
    async fn login_success_persists_and_authenticates() {
        let user = alice();
        let h = harness(FakeBackend::accepting(user.clone()), MemorySessionStore::new());
        h.context.initialize();

        let signed_in = h.context.login("a@x.com", "secret1").await.expect("login");

        assert_eq!(signed_in, user);
        assert!(h.context.is_authenticated());
        assert!(h.context.snapshot().is_consistent());
        assert_eq!(h.store.snapshot().token, Some(Token::new("fresh-token")));
        assert_eq!(h.store.snapshot().user, Some(user));
        let notices = h.notifier.notices.lock().unwrap().clone();
        assert_eq!(notices.last().map(|n| n.level), Some(NoticeLevel::Success));
    }

    #[tokio::test]
    async fn wrong_password_leaves_error_state() {
        let mut backend = FakeBackend::accepting(alice());
        backend.login_error = Some(AuthError::InvalidCredentials);
        let h = harness(backend, MemorySessionStore::new());
        h.context.initialize();

        let err = h
            .context
            .login("a@x.com", "wrongpass")
            .await
            .expect_err("login should fail");

        assert_eq!(err, AuthError::InvalidCredentials);
        let state = h.context.snapshot();
        assert_eq!(state.status(), AuthStatus::Error);
        assert!(state.user().is_none());
        assert!(state.error().is_some_and(|e| e.contains("invalid email or password")));
        assert!(state.is_consistent());
        assert!(h.store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn failed_relogin_clears_previous_session() {
        let mut backend = FakeBackend::accepting(alice());
        backend.login_error = Some(AuthError::Server {
            message: "maintenance".to_string(),
        });
        let h = signed_in_harness(backend);

        let _ = h.context.login("a@x.com", "secret1").await;

        assert_eq!(h.context.status(), AuthStatus::Error);
        assert!(h.context.user().is_none());
        assert_eq!(h.context.error().as_deref(), Some("maintenance"));
    }

    #[tokio::test]
    async fn loading_is_visible_while_login_is_in_flight() {
        let gate = Arc::new(Notify::new());
        let mut backend = FakeBackend::accepting(alice());
        backend.login_gate = Some(gate.clone());
        let h = harness(backend, MemorySessionStore::new());
        h.context.initialize();

        let mut updates = h.context.subscribe();
        let context = h.context.clone();
        let pending = tokio::spawn(async move { context.login("a@x.com", "secret1").await });

        updates
            .wait_for(|state| state.status() == AuthStatus::Loading)
            .await
            .expect("state channel open");
        assert!(h.context.snapshot().is_consistent());
        assert!(h.context.user().is_none());

        gate.notify_one();
        pending.await.expect("join").expect("login");
        assert!(h.context.is_authenticated());
    }

    #[tokio::test]
    async fn register_success_signs_in() {
        let user = alice();
        let h = harness(FakeBackend::accepting(user.clone()), MemorySessionStore::new());
        h.context.initialize();

        let registration = Registration::new("Alice", "a@x.com", "secret1");
        let registered = h.context.register(&registration).await.expect("register");

        assert_eq!(registered, user);
        assert!(h.context.is_authenticated());
        assert_eq!(h.backend.calls(), vec!["register"]);
    }

    #[tokio::test]
    async fn duplicate_email_is_returned_and_stored() {
        let mut backend = FakeBackend::accepting(alice());
        backend.register_error = Some(AuthError::DuplicateEmail {
            email: "dup@x.com".to_string(),
        });
        let h = harness(backend, MemorySessionStore::new());
        h.context.initialize();

        let registration = Registration::new("Dup", "dup@x.com", "secret1");
        let err = h
            .context
            .register(&registration)
            .await
            .expect_err("register should fail");

        assert_eq!(err.field(), Some("email"));
        let state = h.context.snapshot();
        assert_eq!(state.status(), AuthStatus::Error);
        assert!(state.user().is_none());
        assert!(state.error().is_some_and(|e| e.contains("dup@x.com")));
    }

    #[tokio::test]
    async fn invalid_registration_never_reaches_backend() {
        let h = harness(FakeBackend::accepting(alice()), MemorySessionStore::new());
        h.context.initialize();

        let registration = Registration::new("Alice", "not-an-email", "secret1");
        let err = h
            .context
            .register(&registration)
            .await
            .expect_err("register should fail");

        assert_eq!(err.field(), Some("email"));
        assert_eq!(h.context.status(), AuthStatus::Error);
        assert!(h.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn logout_ignores_remote_failure() {
        let mut backend = FakeBackend::accepting(alice());
        backend.logout_error = Some(AuthError::Network {
            message: "offline".to_string(),
        });
        let h = signed_in_harness(backend);

        h.context.logout().await;

        let state = h.context.snapshot();
        assert_eq!(state.status(), AuthStatus::Unauthenticated);
        assert!(state.error().is_none());
        assert!(state.is_consistent());
        assert!(h.store.snapshot().is_empty());
        assert!(h.backend.calls().contains(&"logout"));
    }

    #[tokio::test]
    async fn logout_when_signed_out_is_a_no_op() {
        let h = harness(FakeBackend::accepting(alice()), MemorySessionStore::new());
        h.context.initialize();
        let before = h.context.snapshot();

        h.context.logout().await;
        h.context.logout().await;

        assert_eq!(h.context.snapshot(), before);
        assert!(h.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn logout_from_error_state_settles_unauthenticated() {
        let mut backend = FakeBackend::accepting(alice());
        backend.login_error = Some(AuthError::InvalidCredentials);
        let h = harness(backend, MemorySessionStore::new());
        h.context.initialize();
        let _ = h.context.login("a@x.com", "wrongpass").await;

        h.context.logout().await;

        assert_eq!(h.context.status(), AuthStatus::Unauthenticated);
        assert!(h.context.error().is_none());
    }

    #[tokio::test]
    async fn update_user_merges_and_persists() {
        let h = signed_in_harness(FakeBackend::accepting(alice()));

        h.context
            .update_user(UserPatch::new().display_name("Alicia"));

        assert_eq!(h.context.status(), AuthStatus::Authenticated);
        assert_eq!(
            h.context.user().map(|u| u.display_name().to_string()),
            Some("Alicia".to_string())
        );
        assert_eq!(
            h.store.snapshot().user.map(|u| u.display_name().to_string()),
            Some("Alicia".to_string())
        );
        assert!(h.backend.calls().iter().all(|c| *c == "verify_token"));
    }

    #[tokio::test]
    async fn update_user_without_session_is_ignored() {
        let h = harness(FakeBackend::accepting(alice()), MemorySessionStore::new());
        h.context.initialize();

        h.context.update_user(UserPatch::new().display_name("Ghost"));

        assert!(h.context.user().is_none());
        assert!(h.store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn change_password_success_keeps_session() {
        let h = signed_in_harness(FakeBackend::accepting(alice()));

        h.context
            .change_password("secret1", "secret2")
            .await
            .expect("change password");

        assert!(h.context.is_authenticated());
        assert!(h.context.error().is_none());
        assert_eq!(h.context.token(), Some(Token::new("stored")));
    }

    #[tokio::test]
    async fn wrong_current_password_keeps_session_and_records_error() {
        let mut backend = FakeBackend::accepting(alice());
        backend.change_error = Some(AuthError::InvalidCurrentPassword);
        let h = signed_in_harness(backend);

        let err = h
            .context
            .change_password("wrong1", "secret2")
            .await
            .expect_err("should fail");

        assert_eq!(err, AuthError::InvalidCurrentPassword);
        let state = h.context.snapshot();
        assert!(state.is_authenticated());
        assert_eq!(state.error(), Some("current password is incorrect"));
        assert!(state.is_consistent());
    }

    #[tokio::test]
    async fn change_password_without_session_fails_fast() {
        let h = harness(FakeBackend::accepting(alice()), MemorySessionStore::new());
        h.context.initialize();

        let err = h
            .context
            .change_password("secret1", "secret2")
            .await
            .expect_err("should fail");

        assert_eq!(err, AuthError::NotAuthenticated);
        assert_eq!(h.context.status(), AuthStatus::Unauthenticated);
        assert!(h.backend.calls().is_empty());
    }

    #[tokio::test]
    async fn clear_error_only_drops_message() {
        let mut backend = FakeBackend::accepting(alice());
        backend.login_error = Some(AuthError::InvalidCredentials);
        let h = harness(backend, MemorySessionStore::new());
        h.context.initialize();
        let _ = h.context.login("a@x.com", "wrongpass").await;

        h.context.clear_error();

        assert_eq!(h.context.status(), AuthStatus::Error);
        assert!(h.context.error().is_none());
    }

    #[tokio::test]
    async fn role_queries_are_literal() {
        let admin = User::new(UserId::new(), "Root", "root@x.com").with_administrator(true);
        let h = signed_in_harness(FakeBackend::accepting(admin));

        assert!(h.context.is_admin());
        assert!(!h.context.has_role("responsable_tarea"));
    }

    #[tokio::test]
    async fn subscribers_see_settled_state() {
        let h = harness(FakeBackend::accepting(alice()), MemorySessionStore::new());
        let mut updates = h.context.subscribe();

        h.context.initialize();

        assert!(updates.has_changed().expect("channel open"));
        assert_eq!(
            updates.borrow_and_update().status(),
            AuthStatus::Unauthenticated
        );
    }
}
