use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use tokio::sync::mpsc;

use crate::error::AuthError;

/// A token must stay valid at least this long to be handed out without a refresh
pub const MIN_TOKEN_VALIDITY: Duration = Duration::from_secs(30);

/// Tokens issued by the identity provider
///
/// Debug output redacts every token via [`SecretString`].
#[derive(Debug, Clone)]
pub struct Token {
    /// Bearer token for API calls
    pub access_token: SecretString,
    /// Grant used to obtain a new access token
    pub refresh_token: Option<SecretString>,
    /// OpenID identity token
    pub id_token: Option<SecretString>,
    /// Access token expiry
    pub expires_at: DateTime<Utc>,
}

impl Token {
    /// Time left before expiry, zero once expired
    #[must_use]
    pub fn remaining_validity(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// True when less than `window` of validity remains
    #[must_use]
    pub fn expires_within(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.remaining_validity(now) < window
    }
}

/// Identity of the logged-in user
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    /// Display name
    pub name: Option<String>,
    /// Email
    pub email: Option<String>,
    /// Login name
    pub username: Option<String>,
    /// Realm and client roles from the access token
    pub roles: Vec<String>,
}

impl UserProfile {
    /// Name to greet the user with
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("user")
    }
}

/// Notifications pushed by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The access token reached its expiry
    TokenExpired,
    /// A login completed and tokens are available
    AuthSuccess,
    /// A login or token exchange failed
    AuthError(String),
    /// The user logged out
    AuthLogout,
}

/// Where to send the user to log in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRedirect {
    /// Authorization URL
    pub url: String,
    /// Anti-forgery state the callback must echo
    pub state: String,
}

/// An OpenID Connect identity provider
///
/// Implementations push [`ProviderEvent`]s on a channel handed out once by
/// [`IdentityProvider::take_events`].
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Client the roles are scoped to
    fn client_id(&self) -> &str;

    /// Silently checks for an existing session. Never redirects.
    async fn check_sso(&self) -> Result<bool, AuthError>;

    /// Current tokens, if any
    async fn token(&self) -> Option<Token>;

    /// Exchanges the refresh token for a new access token
    ///
    /// # Errors
    ///
    /// [`AuthError::Refresh`] when the grant is rejected.
    async fn refresh(&self) -> Result<Token, AuthError>;

    /// Loads the user's profile
    async fn load_user_profile(&self) -> Result<UserProfile, AuthError>;

    /// Starts an interactive login
    async fn login_url(&self) -> Result<LoginRedirect, AuthError>;

    /// Finishes an interactive login with the callback's `code` and `state`
    async fn complete_login(&self, code: &str, state: &str) -> Result<Token, AuthError>;

    /// Drops local tokens and returns the provider's end-session URL
    async fn logout_url(&self) -> Result<String, AuthError>;

    /// Event stream; `None` after the first call
    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ProviderEvent>>;
}
