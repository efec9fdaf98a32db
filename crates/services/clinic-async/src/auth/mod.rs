//! Login session against an OpenID Connect identity provider.
//!
//! [`SessionManager`] owns the session and hands out fresh bearer tokens.
//! [`OidcProvider`] talks to a Keycloak-compatible server; any other
//! [`IdentityProvider`] can be substituted.

/// Role claims decoded from access tokens
pub mod claims;
/// Keycloak-compatible provider
pub mod oidc;
/// PKCE challenge generation
pub mod pkce;
/// Provider trait, tokens and events
pub mod provider;
/// Session state and manager
pub mod session;
/// Token persistence
pub mod store;

pub use claims::AccessClaims;
pub use oidc::{OidcProvider, OidcSettings};
pub use pkce::PkceChallenge;
pub use provider::{
    IdentityProvider, LoginRedirect, MIN_TOKEN_VALIDITY, ProviderEvent, Token, UserProfile,
};
pub use session::{Session, SessionManager, SessionStatus};
pub use store::TokenStore;
