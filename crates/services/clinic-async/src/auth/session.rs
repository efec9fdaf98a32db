use std::sync::{Arc, Weak};

use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{Mutex, OnceCell, watch};

use super::{
    claims::AccessClaims,
    provider::{IdentityProvider, LoginRedirect, MIN_TOKEN_VALIDITY, ProviderEvent, Token, UserProfile},
};
use crate::{client::BearerSource, error::AuthError};

const MSG_INIT_FAILED: &str = "failed to initialize authentication";
const MSG_AUTH_FAILED: &str = "authentication failed";
const MSG_SESSION_EXPIRED: &str = "session expired, please log in again";
const MSG_REFRESH_UNAVAILABLE: &str = "could not refresh the session, will retry";

/// Where the login session stands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionStatus {
    /// The provider has not answered yet
    #[default]
    Loading,
    /// No usable session
    Unauthenticated,
    /// Tokens are held and valid or refreshable
    Authenticated,
}

/// Snapshot of the login session
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Current status
    pub status: SessionStatus,
    /// Tokens, while authenticated
    pub token: Option<Token>,
    /// Profile, once loaded
    pub user_profile: Option<UserProfile>,
    /// Realm and client roles
    pub roles: Vec<String>,
    /// Last user-facing error
    pub last_error: Option<String>,
}

impl Session {
    /// True until the provider has answered
    #[must_use]
    pub fn loading(&self) -> bool {
        self.status == SessionStatus::Loading
    }
}

struct Inner<P: ?Sized> {
    provider: Arc<P>,
    tx: watch::Sender<Session>,
    init: OnceCell<()>,
    refresh_lock: Mutex<()>,
    // Serializes profile loads so a repeated AuthSuccess reuses the first one
    profile_lock: Mutex<()>,
}

/// Owns the login session and keeps its token fresh
///
/// Cloning is cheap; clones share the same session. Observers can
/// [`subscribe`](Self::subscribe) to every change.
pub struct SessionManager<P: IdentityProvider + ?Sized> {
    inner: Arc<Inner<P>>,
}

impl<P: IdentityProvider + ?Sized> Clone for SessionManager<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: IdentityProvider + ?Sized> std::fmt::Debug for SessionManager<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl<P: IdentityProvider + ?Sized> SessionManager<P> {
    /// Creates a manager in the `Loading` state
    pub fn new(provider: Arc<P>) -> Self {
        let (tx, _rx) = watch::channel(Session::default());
        Self {
            inner: Arc::new(Inner {
                provider,
                tx,
                init: OnceCell::new(),
                refresh_lock: Mutex::new(()),
                profile_lock: Mutex::new(()),
            }),
        }
    }

    /// The wrapped provider
    #[must_use]
    pub fn provider(&self) -> &Arc<P> {
        &self.inner.provider
    }

    /// Receives every session change
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.tx.subscribe()
    }

    /// Current session
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner.tx.borrow().clone()
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.inner.tx.borrow().status
    }

    /// True while authenticated
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    /// Loaded profile, if any
    #[must_use]
    pub fn user_profile(&self) -> Option<UserProfile> {
        self.inner.tx.borrow().user_profile.clone()
    }

    /// True when the user holds `role` as a realm or client role
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.inner.tx.borrow().roles.iter().any(|r| r == role)
    }

    /// True when the user holds at least one of `roles`
    #[must_use]
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        let session = self.inner.tx.borrow();
        roles.iter().any(|want| session.roles.iter().any(|r| r == want))
    }
}

impl<P: IdentityProvider + ?Sized + 'static> SessionManager<P> {
    /// Resolves the session with a silent check and starts listening to the
    /// provider. Later calls return the current status without side effects.
    pub async fn initialize(&self) -> SessionStatus {
        self.inner
            .init
            .get_or_init(|| async { self.run_initialize().await })
            .await;
        self.status()
    }

    async fn run_initialize(&self) {
        self.spawn_event_pump();

        match self.inner.provider.check_sso().await {
            Ok(true) => match self.inner.provider.token().await {
                Some(token) => {
                    tracing::info!("existing session restored");
                    self.set_authenticated(token);
                    self.ensure_profile().await;
                }
                None => self.set_unauthenticated(None),
            },
            Ok(false) => {
                tracing::debug!("no existing session");
                self.set_unauthenticated(None);
            }
            Err(e) => {
                tracing::warn!(error = %e, "{MSG_INIT_FAILED}");
                self.set_unauthenticated(Some(format!("{MSG_INIT_FAILED}: {e}")));
            }
        }
    }

    fn spawn_event_pump(&self) {
        let Some(mut events) = self.inner.provider.take_events() else {
            return;
        };
        let weak: Weak<Inner<P>> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(inner) = weak.upgrade() else { break };
                Self { inner }.handle_event(event).await;
            }
            tracing::debug!("provider event stream closed");
        });
    }

    /// Applies a provider event to the session
    pub async fn handle_event(&self, event: ProviderEvent) {
        tracing::debug!(?event, "provider event");
        match event {
            ProviderEvent::TokenExpired => {
                if self.is_authenticated() {
                    let _ = self.refresh().await;
                }
            }
            ProviderEvent::AuthSuccess => {
                let Some(token) = self.inner.provider.token().await else {
                    return;
                };
                self.set_authenticated(token);
                self.ensure_profile().await;
            }
            ProviderEvent::AuthError(reason) => {
                tracing::warn!(%reason, "{MSG_AUTH_FAILED}");
                self.inner.tx.send_modify(|s| {
                    s.last_error = Some(MSG_AUTH_FAILED.to_string());
                });
            }
            ProviderEvent::AuthLogout => self.set_unauthenticated(None),
        }
    }

    /// Starts an interactive login. The session is unchanged until
    /// [`complete_login`](Self::complete_login).
    pub async fn login(&self) -> Result<LoginRedirect, AuthError> {
        self.inner.provider.login_url().await
    }

    /// Finishes an interactive login
    pub async fn complete_login(&self, code: &str, state: &str) -> Result<SessionStatus, AuthError> {
        match self.inner.provider.complete_login(code, state).await {
            Ok(_) => {
                self.handle_event(ProviderEvent::AuthSuccess).await;
                Ok(self.status())
            }
            Err(e) => {
                self.handle_event(ProviderEvent::AuthError(e.to_string())).await;
                Err(e)
            }
        }
    }

    /// Ends the session and returns the provider's end-session URL
    pub async fn logout(&self) -> Result<String, AuthError> {
        let url = self.inner.provider.logout_url().await?;
        self.handle_event(ProviderEvent::AuthLogout).await;
        tracing::info!("logged out");
        Ok(url)
    }

    /// Returns an access token valid for at least [`MIN_TOKEN_VALIDITY`]
    ///
    /// # Errors
    ///
    /// [`AuthError::NotAuthenticated`] without a session, or
    /// [`AuthError::Refresh`] when the session could not be extended; the
    /// session is then over.
    pub async fn get_valid_token(&self) -> Result<SecretString, AuthError> {
        let token = self.current_token()?;
        if !token.expires_within(Utc::now(), MIN_TOKEN_VALIDITY) {
            return Ok(token.access_token);
        }
        self.refresh().await.map(|t| t.access_token)
    }

    fn current_token(&self) -> Result<Token, AuthError> {
        let session = self.inner.tx.borrow();
        match (&session.status, &session.token) {
            (SessionStatus::Authenticated, Some(token)) => Ok(token.clone()),
            _ => Err(AuthError::NotAuthenticated),
        }
    }

    async fn refresh(&self) -> Result<Token, AuthError> {
        let _guard = self.inner.refresh_lock.lock().await;

        // Another caller may have refreshed while we waited
        let token = self.current_token()?;
        if !token.expires_within(Utc::now(), MIN_TOKEN_VALIDITY) {
            return Ok(token);
        }

        match self.inner.provider.refresh().await {
            Ok(token) => {
                self.inner.tx.send_modify(|s| {
                    s.roles = roles_from(&token, self.inner.provider.client_id(), s.user_profile.as_ref());
                    s.token = Some(token.clone());
                    s.last_error = None;
                });
                Ok(token)
            }
            Err(e @ AuthError::Refresh(_)) => {
                tracing::warn!(error = %e, "token refresh rejected, ending session");
                self.set_unauthenticated(Some(MSG_SESSION_EXPIRED.to_string()));
                Err(e)
            }
            // Provider unreachable: keep the session, the next use retries
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed");
                self.inner.tx.send_modify(|s| {
                    s.last_error = Some(MSG_REFRESH_UNAVAILABLE.to_string());
                });
                Err(AuthError::Refresh(e.to_string()))
            }
        }
    }

    /// Loads the profile unless it is already loaded or being loaded
    async fn ensure_profile(&self) {
        let _guard = self.inner.profile_lock.lock().await;
        if self.user_profile().is_none() {
            self.load_profile().await;
        }
    }

    async fn load_profile(&self) {
        match self.inner.provider.load_user_profile().await {
            Ok(profile) => {
                tracing::debug!(user = profile.display_name(), "profile loaded");
                self.inner.tx.send_modify(|s| {
                    if let Some(token) = &s.token {
                        s.roles = roles_from(token, self.inner.provider.client_id(), Some(&profile));
                    }
                    s.user_profile = Some(profile);
                });
            }
            Err(e) => tracing::warn!(error = %e, "could not load user profile"),
        }
    }

    fn set_authenticated(&self, token: Token) {
        let client_id = self.inner.provider.client_id();
        self.inner.tx.send_modify(|s| {
            s.status = SessionStatus::Authenticated;
            s.roles = roles_from(&token, client_id, s.user_profile.as_ref());
            s.token = Some(token);
            s.last_error = None;
        });
    }

    fn set_unauthenticated(&self, last_error: Option<String>) {
        self.inner.tx.send_modify(|s| {
            s.status = SessionStatus::Unauthenticated;
            s.token = None;
            s.user_profile = None;
            s.roles.clear();
            if last_error.is_some() {
                s.last_error = last_error;
            }
        });
    }
}

/// Roles from the token's claims, plus any the profile carries
fn roles_from(token: &Token, client_id: &str, profile: Option<&UserProfile>) -> Vec<String> {
    let mut roles = AccessClaims::decode_unverified(token.access_token.expose_secret())
        .map(|c| c.roles(client_id))
        .unwrap_or_default();
    for role in profile.map(|p| p.roles.as_slice()).unwrap_or(&[]) {
        if !roles.contains(role) {
            roles.push(role.clone());
        }
    }
    roles
}

#[async_trait]
impl<P: IdentityProvider + ?Sized + 'static> BearerSource for SessionManager<P> {
    async fn bearer_token(&self) -> Result<SecretString, AuthError> {
        self.get_valid_token().await
    }
}
