//! Keycloak-compatible OpenID Connect provider.
//!
//! Implements the authorization-code flow with PKCE for a public client, the
//! refresh-token grant, userinfo and end-session. Tokens are mirrored to an
//! optional [`TokenStore`] so a later process can restore the session.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::AbortHandle;

use super::{
    claims::AccessClaims,
    pkce::PkceChallenge,
    provider::{
        IdentityProvider, LoginRedirect, MIN_TOKEN_VALIDITY, ProviderEvent, Token, UserProfile,
    },
    store::TokenStore,
};
use crate::error::AuthError;

/// Default identity server
pub const OIDC_DEFAULT_URL: &str = "http://localhost:8085";
/// Default realm
pub const OIDC_DEFAULT_REALM: &str = "CBT";
/// Default public client
pub const OIDC_DEFAULT_CLIENT_ID: &str = "cbtclient";
/// Default login callback
pub const OIDC_DEFAULT_REDIRECT_URI: &str = "http://localhost:5173/";

/// Used when a token response omits `expires_in`
const FALLBACK_EXPIRES_IN: i64 = 300;

/// Where the identity provider lives and who we are to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OidcSettings {
    /// Server root, e.g. `http://localhost:8085`
    pub url: String,
    /// Realm name
    pub realm: String,
    /// Public client id
    pub client_id: String,
    /// Registered redirect URI
    pub redirect_uri: String,
}

impl Default for OidcSettings {
    fn default() -> Self {
        Self {
            url: OIDC_DEFAULT_URL.into(),
            realm: OIDC_DEFAULT_REALM.into(),
            client_id: OIDC_DEFAULT_CLIENT_ID.into(),
            redirect_uri: OIDC_DEFAULT_REDIRECT_URI.into(),
        }
    }
}

impl OidcSettings {
    /// `{url}/realms/{realm}/protocol/openid-connect/{name}`
    #[must_use]
    pub fn endpoint(&self, name: &str) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/{name}",
            self.url.trim_end_matches('/'),
            self.realm
        )
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct GrantError {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct UserInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    preferred_username: Option<String>,
}

/// OpenID Connect provider backed by HTTP calls to the identity server
pub struct OidcProvider {
    http: reqwest::Client,
    settings: OidcSettings,
    store: Option<TokenStore>,
    token: RwLock<Option<Token>>,
    pending: Mutex<Option<PkceChallenge>>,
    events_tx: mpsc::UnboundedSender<ProviderEvent>,
    events_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<ProviderEvent>>>,
    expiry_timer: std::sync::Mutex<Option<AbortHandle>>,
}

impl std::fmt::Debug for OidcProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OidcProvider")
            .field("settings", &self.settings)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl OidcProvider {
    /// Creates a provider that keeps tokens in memory only.
    ///
    /// # Panics
    ///
    /// Panics if the reqwest client cannot be built.
    #[must_use]
    pub fn new(settings: OidcSettings) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            http: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(5))
                .timeout(Duration::from_secs(30))
                .build()
                .expect("reqwest client"),
            settings,
            store: None,
            token: RwLock::new(None),
            pending: Mutex::new(None),
            events_tx,
            events_rx: std::sync::Mutex::new(Some(events_rx)),
            expiry_timer: std::sync::Mutex::new(None),
        }
    }

    /// Persists tokens and pending logins in `store`
    #[must_use]
    pub fn with_store(mut self, store: TokenStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Replaces the HTTP client with a custom one
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Provider settings
    #[must_use]
    pub const fn settings(&self) -> &OidcSettings {
        &self.settings
    }

    fn emit(&self, event: ProviderEvent) {
        // No receiver means nobody is listening; dropping is fine
        let _ = self.events_tx.send(event);
    }

    async fn install(&self, token: Token) {
        if let Some(store) = &self.store
            && let Err(e) = store.save(&token)
        {
            tracing::warn!(error = %e, "could not persist tokens");
        }
        self.schedule_expiry(&token);
        *self.token.write().await = Some(token);
    }

    async fn forget(&self) {
        self.cancel_expiry();
        *self.token.write().await = None;
        if let Some(store) = &self.store
            && let Err(e) = store.clear()
        {
            tracing::warn!(error = %e, "could not clear persisted tokens");
        }
    }

    fn schedule_expiry(&self, token: &Token) {
        let delay = token.remaining_validity(Utc::now());
        let tx = self.events_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(ProviderEvent::TokenExpired);
        });
        if let Ok(mut slot) = self.expiry_timer.lock()
            && let Some(previous) = slot.replace(handle.abort_handle())
        {
            previous.abort();
        }
    }

    fn cancel_expiry(&self) {
        if let Ok(mut slot) = self.expiry_timer.lock()
            && let Some(handle) = slot.take()
        {
            handle.abort();
        }
    }

    /// Posts a token grant. `rejected` builds the error for a 4xx answer.
    async fn token_grant(
        &self,
        form: &[(&str, &str)],
        rejected: fn(String) -> AuthError,
    ) -> Result<TokenResponse, AuthError> {
        let response = self
            .http
            .post(self.settings.endpoint("token"))
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_slice(&body)
                .map_err(|e| AuthError::Provider(format!("invalid token response: {e}")));
        }

        let reason = serde_json::from_slice::<GrantError>(&body)
            .ok()
            .and_then(|g| g.error_description.or(g.error))
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

        if status.is_client_error() {
            Err(rejected(reason))
        } else {
            Err(AuthError::Provider(reason))
        }
    }

    fn to_token(response: TokenResponse, previous_refresh: Option<SecretString>) -> Token {
        let expires_in = response.expires_in.unwrap_or(FALLBACK_EXPIRES_IN);
        Token {
            access_token: SecretString::from(response.access_token),
            refresh_token: response
                .refresh_token
                .map(SecretString::from)
                .or(previous_refresh),
            id_token: response.id_token.map(SecretString::from),
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in),
        }
    }

    async fn take_pending(&self) -> Result<Option<PkceChallenge>, AuthError> {
        if let Some(pkce) = self.pending.lock().await.take() {
            // Keep the on-disk copy from outliving the in-memory one
            if let Some(store) = &self.store {
                store.take_pending()?;
            }
            return Ok(Some(pkce));
        }
        match &self.store {
            Some(store) => store.take_pending(),
            None => Ok(None),
        }
    }

    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<Token, AuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.settings.client_id.as_str()),
            ("redirect_uri", self.settings.redirect_uri.as_str()),
            ("code_verifier", verifier),
        ];
        let response = self.token_grant(&form, AuthError::Provider).await?;
        Ok(Self::to_token(response, None))
    }

    /// Best-effort server-side session termination
    async fn revoke(&self, refresh_token: &SecretString) {
        let form = [
            ("client_id", self.settings.client_id.as_str()),
            ("refresh_token", refresh_token.expose_secret()),
        ];
        match self
            .http
            .post(self.settings.endpoint("logout"))
            .form(&form)
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => tracing::debug!("server session ended"),
            Ok(r) => tracing::warn!(status = r.status().as_u16(), "logout was not accepted"),
            Err(e) => tracing::warn!(error = %e, "logout request failed"),
        }
    }
}

impl Drop for OidcProvider {
    fn drop(&mut self) {
        self.cancel_expiry();
    }
}

#[async_trait]
impl IdentityProvider for OidcProvider {
    fn client_id(&self) -> &str {
        &self.settings.client_id
    }

    async fn check_sso(&self) -> Result<bool, AuthError> {
        let now = Utc::now();

        let current = self.token.read().await.clone();
        let candidate = match current {
            Some(token) => Some(token),
            None => match &self.store {
                Some(store) => store.load()?,
                None => None,
            },
        };

        let Some(token) = candidate else {
            tracing::debug!("no existing session");
            return Ok(false);
        };

        if !token.expires_within(now, MIN_TOKEN_VALIDITY) {
            self.install(token).await;
            return Ok(true);
        }

        if token.refresh_token.is_none() {
            tracing::debug!("stored session expired and cannot be refreshed");
            self.forget().await;
            return Ok(false);
        }

        *self.token.write().await = Some(token);
        match self.refresh().await {
            Ok(_) => Ok(true),
            Err(AuthError::Refresh(reason)) => {
                tracing::debug!(%reason, "stored session rejected");
                self.forget().await;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn token(&self) -> Option<Token> {
        self.token.read().await.clone()
    }

    async fn refresh(&self) -> Result<Token, AuthError> {
        let refresh_token = self
            .token
            .read()
            .await
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .ok_or_else(|| AuthError::Refresh("no refresh token".into()))?;

        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", self.settings.client_id.as_str()),
            ("refresh_token", refresh_token.expose_secret()),
        ];
        let response = self.token_grant(&form, AuthError::Refresh).await?;
        let token = Self::to_token(response, Some(refresh_token));

        tracing::debug!(expires_at = %token.expires_at, "access token refreshed");
        self.install(token.clone()).await;
        Ok(token)
    }

    async fn load_user_profile(&self) -> Result<UserProfile, AuthError> {
        let token = self
            .token
            .read()
            .await
            .clone()
            .ok_or(AuthError::NotAuthenticated)?;

        let response = self
            .http
            .get(self.settings.endpoint("userinfo"))
            .bearer_auth(token.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::Provider(format!(
                "userinfo returned HTTP {}",
                status.as_u16()
            )));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("invalid userinfo: {e}")))?;

        let roles = AccessClaims::decode_unverified(token.access_token.expose_secret())
            .map(|c| c.roles(&self.settings.client_id))
            .unwrap_or_default();

        Ok(UserProfile {
            name: info.name,
            email: info.email,
            username: info.preferred_username,
            roles,
        })
    }

    async fn login_url(&self) -> Result<LoginRedirect, AuthError> {
        let pkce = PkceChallenge::generate();
        let url = Url::parse_with_params(
            &self.settings.endpoint("auth"),
            &[
                ("client_id", self.settings.client_id.as_str()),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid"),
                ("code_challenge", pkce.challenge.as_str()),
                ("code_challenge_method", "S256"),
                ("state", pkce.state.as_str()),
            ],
        )
        .map_err(|e| AuthError::Provider(format!("invalid identity provider URL: {e}")))?;

        if let Some(store) = &self.store {
            store.save_pending(&pkce)?;
        }
        let state = pkce.state.clone();
        *self.pending.lock().await = Some(pkce);

        Ok(LoginRedirect {
            url: url.into(),
            state,
        })
    }

    async fn complete_login(&self, code: &str, state: &str) -> Result<Token, AuthError> {
        let pkce = self
            .take_pending()
            .await?
            .ok_or_else(|| AuthError::Provider("no login in progress".into()))?;

        if pkce.state != state {
            self.emit(ProviderEvent::AuthError(AuthError::StateMismatch.to_string()));
            return Err(AuthError::StateMismatch);
        }

        match self.exchange_code(code, &pkce.verifier).await {
            Ok(token) => {
                tracing::info!("login completed");
                self.install(token.clone()).await;
                self.emit(ProviderEvent::AuthSuccess);
                Ok(token)
            }
            Err(e) => {
                self.emit(ProviderEvent::AuthError(e.to_string()));
                Err(e)
            }
        }
    }

    async fn logout_url(&self) -> Result<String, AuthError> {
        let token = self.token.read().await.clone();

        let mut params: Vec<(&str, String)> = vec![
            ("client_id", self.settings.client_id.clone()),
            ("post_logout_redirect_uri", self.settings.redirect_uri.clone()),
        ];
        if let Some(id_token) = token.as_ref().and_then(|t| t.id_token.as_ref()) {
            params.push(("id_token_hint", id_token.expose_secret().to_string()));
        }
        let url = Url::parse_with_params(&self.settings.endpoint("logout"), &params)
            .map_err(|e| AuthError::Provider(format!("invalid identity provider URL: {e}")))?;

        if let Some(refresh_token) = token.as_ref().and_then(|t| t.refresh_token.as_ref()) {
            self.revoke(refresh_token).await;
        }

        self.forget().await;
        self.emit(ProviderEvent::AuthLogout);
        Ok(url.into())
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ProviderEvent>> {
        self.events_rx.lock().ok()?.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_follow_keycloak_layout() {
        let settings = OidcSettings {
            url: "http://id.local:8085/".into(),
            ..OidcSettings::default()
        };
        assert_eq!(
            settings.endpoint("token"),
            "http://id.local:8085/realms/CBT/protocol/openid-connect/token"
        );
    }

    #[tokio::test]
    async fn login_url_carries_pkce_parameters() {
        let provider = OidcProvider::new(OidcSettings::default());
        let redirect = provider.login_url().await.unwrap();
        let url = Url::parse(&redirect.url).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(params["client_id"], "cbtclient");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["state"], redirect.state);
        assert_eq!(params["redirect_uri"], "http://localhost:5173/");
    }

    #[tokio::test]
    async fn events_can_be_taken_once() {
        let provider = OidcProvider::new(OidcSettings::default());
        assert!(provider.take_events().is_some());
        assert!(provider.take_events().is_none());
    }

    #[tokio::test]
    async fn complete_login_without_pending_fails() {
        let provider = OidcProvider::new(OidcSettings::default());
        let err = provider.complete_login("code", "state").await.unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));
    }

    #[tokio::test]
    async fn complete_login_rejects_wrong_state() {
        let provider = OidcProvider::new(OidcSettings::default());
        let mut events = provider.take_events().unwrap();
        provider.login_url().await.unwrap();

        let err = provider.complete_login("code", "forged").await.unwrap_err();
        assert_eq!(err, AuthError::StateMismatch);
        assert!(matches!(events.try_recv(), Ok(ProviderEvent::AuthError(_))));
    }
}
