//! Client session store.
//!
//! A [`Session`] only changes through [`Session::apply`]; the
//! [`SessionStore`] is its single owner and publishes each new value on a
//! watch channel.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use portal_protocol::{
    Identity, LoginRequest, LoginResponse, LogoutResponse, ProfileResponse, TestAccount,
    TestAccountsResponse, routes,
};
use reqwest::StatusCode;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::client::{ApiClient, Credentials, ResponseInterceptor, ResponseOutcome};
use crate::error::SessionError;
use crate::storage::TokenStorage;

/// Phase of a session, derived from its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Unauthenticated,
    /// A persisted token is waiting for its identity.
    Resolving,
    Authenticated,
}

/// Session state.
///
/// Whenever `loading` is false, `token` and `user` are either both set or
/// both unset. A token without a user only exists while it is being resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<Identity>,
    pub loading: bool,
}

/// Inputs to the session state machine.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A token was read back from storage.
    TokenRestored { token: String },
    /// A profile call for the current token went out.
    ProfileRequested,
    /// The profile endpoint vouched for `token`.
    ProfileResolved { token: String, user: Identity },
    LoginStarted,
    LoginSucceeded { token: String, user: Identity },
    /// A call failed without ending the session.
    RequestFailed,
    /// Logout, a rejected token or a failed restore.
    Cleared,
}

impl Session {
    pub fn phase(&self) -> SessionPhase {
        match (&self.token, &self.user) {
            (Some(_), Some(_)) => SessionPhase::Authenticated,
            (Some(_), None) => SessionPhase::Resolving,
            (None, _) => SessionPhase::Unauthenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase() == SessionPhase::Authenticated
    }

    /// Next state after `event`.
    pub fn apply(self, event: SessionEvent) -> Session {
        match event {
            SessionEvent::TokenRestored { token } => Session {
                token: Some(token),
                user: None,
                loading: true,
            },
            SessionEvent::ProfileRequested => Session {
                loading: true,
                ..self
            },
            SessionEvent::ProfileResolved { token, user } => {
                if self.token.as_deref() == Some(token.as_str()) {
                    Session {
                        token: Some(token),
                        user: Some(user),
                        loading: false,
                    }
                } else {
                    // The session moved on while the profile call was in flight.
                    self
                }
            }
            // An unverified token is dropped; a verified session is kept.
            SessionEvent::LoginStarted => match self.phase() {
                SessionPhase::Resolving => Session {
                    token: None,
                    user: None,
                    loading: true,
                },
                _ => Session {
                    loading: true,
                    ..self
                },
            },
            SessionEvent::LoginSucceeded { token, user } => Session {
                token: Some(token),
                user: Some(user),
                loading: false,
            },
            SessionEvent::RequestFailed => match self.phase() {
                SessionPhase::Resolving => Session::default(),
                _ => Session {
                    loading: false,
                    ..self
                },
            },
            SessionEvent::Cleared => Session::default(),
        }
    }
}

/// Where the front end goes when a session ends.
pub trait Navigator: Send + Sync {
    fn to_login(&self);
}

impl<F> Navigator for F
where
    F: Fn() + Send + Sync,
{
    fn to_login(&self) {
        self()
    }
}

/// Owner of the client session.
pub struct SessionStore {
    client: Arc<ApiClient>,
    storage: Arc<dyn TokenStorage>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    /// Open the store, picking up a persisted token if there is one.
    ///
    /// With a token the store starts out resolving; call [`restore`](Self::restore)
    /// to confirm it with the server.
    pub async fn open(
        client: Arc<ApiClient>,
        storage: Arc<dyn TokenStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Arc<Self> {
        let persisted = storage.load().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read persisted token");
            None
        });

        let initial = match persisted {
            Some(token) => {
                client.set_token(Some(token.clone())).await;
                Session::default().apply(SessionEvent::TokenRestored { token })
            }
            None => Session::default(),
        };

        let (state, _) = watch::channel(initial);
        let store = Arc::new(Self {
            client,
            storage,
            navigator,
            state,
        });

        store
            .client
            .add_interceptor(Arc::new(UnauthorizedInterceptor {
                store: Arc::downgrade(&store),
            }))
            .await;

        store
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase()
    }

    pub fn user(&self) -> Option<Identity> {
        self.state.borrow().user.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    fn dispatch(&self, event: SessionEvent) {
        self.state
            .send_modify(|session| *session = std::mem::take(session).apply(event));
    }

    /// Resolve a persisted token into an identity.
    ///
    /// Any failure ends the session. Returns the identity if the token held.
    pub async fn restore(&self) -> Option<Identity> {
        let Some(token) = self.current().token else {
            self.dispatch(SessionEvent::Cleared);
            return None;
        };

        self.dispatch(SessionEvent::ProfileRequested);
        let result = self
            .client
            .get_json::<ProfileResponse>(routes::PROFILE, Credentials::Default)
            .await;

        if !self.holds_token(&token) {
            debug!("Session changed while restoring, dropping profile result");
            return None;
        }

        match result {
            Ok(ProfileResponse { user }) => {
                debug!(email = %user.email, "Session restored");
                self.dispatch(SessionEvent::ProfileResolved {
                    token,
                    user: user.clone(),
                });
                Some(user)
            }
            Err(e) => {
                info!(error = %e, "Persisted token rejected");
                self.clear().await;
                None
            }
        }
    }

    /// Sign in. On failure a verified session is left as it was; a persisted
    /// token that was never resolved is dropped when the login starts.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, SessionError> {
        if self.phase() == SessionPhase::Resolving {
            debug!("Dropping unresolved persisted token before login");
            if let Err(e) = self.storage.clear() {
                warn!(error = %e, "Could not remove persisted token");
            }
            self.client.set_token(None).await;
        }
        self.dispatch(SessionEvent::LoginStarted);

        let response = self
            .client
            .post_json::<_, LoginResponse>(
                routes::LOGIN,
                &LoginRequest::new(email, password),
                Credentials::Anonymous,
            )
            .await;

        let LoginResponse { user, token, .. } = match response {
            Ok(response) => response,
            Err(e) => {
                self.dispatch(SessionEvent::RequestFailed);
                return Err(e.into());
            }
        };

        if let Err(e) = self.storage.store(&token) {
            warn!(error = %e, "Could not persist token");
            self.clear().await;
            return Err(e.into());
        }

        self.client.set_token(Some(token.clone())).await;
        info!(email = %user.email, role = %user.role, "Logged in");
        self.dispatch(SessionEvent::LoginSucceeded {
            token,
            user: user.clone(),
        });

        Ok(user)
    }

    /// Sign out. The server call is best effort; local state is always cleared.
    pub async fn logout(&self) {
        if let Err(e) = self
            .client
            .get_json::<LogoutResponse>(routes::LOGOUT, Credentials::Default)
            .await
        {
            debug!(error = %e, "Logout request failed");
        }

        self.clear().await;
        self.navigator.to_login();
    }

    /// Accounts offered by the server's discovery endpoint. Empty on any failure.
    pub async fn test_accounts(&self) -> Vec<TestAccount> {
        match self
            .client
            .get_json::<TestAccountsResponse>(routes::TEST_ACCOUNTS, Credentials::Anonymous)
            .await
        {
            Ok(response) => response.accounts,
            Err(e) => {
                debug!(error = %e, "Test accounts unavailable");
                Vec::new()
            }
        }
    }

    async fn clear(&self) {
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "Could not remove persisted token");
        }
        self.client.set_token(None).await;
        self.dispatch(SessionEvent::Cleared);
    }

    fn holds_token(&self, token: &str) -> bool {
        self.state.borrow().token.as_deref() == Some(token)
    }

    /// End the session if `sent` is still its token. A 401 for a token that
    /// was already replaced or cleared is ignored.
    async fn end_rejected_session(&self, sent: &str, outcome: &ResponseOutcome) {
        if !self.holds_token(sent) {
            debug!(path = %outcome.path, "401 for a superseded token, ignoring");
            return;
        }
        info!(
            method = %outcome.method,
            path = %outcome.path,
            "Token rejected, ending session"
        );
        self.clear().await;
        self.navigator.to_login();
    }
}

/// Ends the session when an authenticated request comes back 401.
struct UnauthorizedInterceptor {
    store: Weak<SessionStore>,
}

#[async_trait]
impl ResponseInterceptor for UnauthorizedInterceptor {
    async fn on_response(&self, outcome: &ResponseOutcome) {
        if outcome.status != StatusCode::UNAUTHORIZED {
            return;
        }
        let Some(sent) = outcome.bearer.as_deref() else {
            return;
        };
        if let Some(store) = self.store.upgrade() {
            store.end_rejected_session(sent, outcome).await;
        }
    }
}
