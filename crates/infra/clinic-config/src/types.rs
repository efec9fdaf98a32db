//! Configuration types for the clinic tools.
//!
//! The root type is [`ClinicConfig`]. Every section uses `#[serde(default)]`
//! so a partial `clinic.json` fills the rest from defaults.

use std::path::PathBuf;

use schemars::JsonSchema;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Root configuration loaded from `clinic.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ClinicConfig {
    /// Optional JSON Schema URL for editor completion.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Backend service locations.
    pub services: ServicesConfig,

    /// OpenID Connect identity provider.
    pub identity: IdentityConfig,

    /// Request authentication policy.
    pub auth: AuthConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Backend services.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ServicesConfig {
    /// REST backend (patients, appointments, stock...).
    pub api: ApiServiceConfig,

    /// Chat assistant backend.
    pub chat: ChatServiceConfig,
}

/// REST backend.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ApiServiceConfig {
    /// Base URL, including the `/api` prefix.
    pub base_url: String,

    /// Static bearer token (env-only, never serialized).
    #[serde(skip)]
    #[schemars(skip)]
    pub api_token: Option<SecretString>,
}

impl Default for ApiServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".into(),
            api_token: None,
        }
    }
}

/// Chat assistant backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ChatServiceConfig {
    /// Base URL, including the `/api` prefix.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ChatServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".into(),
            timeout_secs: 30,
        }
    }
}

/// Identity provider (Keycloak realm and public client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct IdentityConfig {
    /// Server root.
    pub url: String,

    /// Realm name.
    pub realm: String,

    /// Public client id.
    pub client_id: String,

    /// Redirect URI registered for the client.
    pub redirect_uri: String,

    /// Directory for saved tokens; the user config dir when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_store: Option<PathBuf>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8085".into(),
            realm: "CBT".into(),
            client_id: "cbtclient".into(),
            redirect_uri: "http://localhost:5173/".into(),
            token_store: None,
        }
    }
}

/// Request authentication policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AuthConfig {
    /// Send REST requests without a bearer token when not logged in.
    pub allow_anonymous: bool,
}

/// Logging and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            json: false,
        }
    }
}
