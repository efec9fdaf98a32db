use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on how much of a response body is kept in errors
const BODY_SNIPPET_LIMIT: usize = 400;

/// Errors that can occur when using the clinic REST client
#[derive(Debug, Error)]
pub enum ClinicError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// Non-success response from the clinic backend
    #[error("API error: {0}")]
    Api(ApiErrorObject),

    /// Configuration error (e.g., missing credentials)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(String),

    /// Payload rejected before it was sent
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Authentication failure while obtaining a bearer token
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Error body surfaced from the clinic backend
///
/// `message` carries the raw response text so the user sees exactly what the
/// backend said.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorObject {
    /// HTTP status code
    #[serde(default)]
    pub status_code: Option<u16>,
    /// Response body, verbatim (capped)
    #[serde(default)]
    pub message: String,
    /// Short error label, from the body's `error` field when it has one
    #[serde(default)]
    pub error: Option<String>,
}

impl std::fmt::Display for ApiErrorObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "[{code}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Authentication failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No authenticated session
    #[error("not authenticated")]
    NotAuthenticated,

    /// The identity provider failed or answered unexpectedly
    #[error("identity provider error: {0}")]
    Provider(String),

    /// The refresh grant was rejected; the session is over
    #[error("token refresh failed: {0}")]
    Refresh(String),

    /// Login callback did not match the pending authorization request
    #[error("login state mismatch")]
    StateMismatch,

    /// Persisted tokens could not be read or written
    #[error("token store error: {0}")]
    Store(String),
}

impl ClinicError {
    /// Determines if this error is retryable
    ///
    /// Statuses follow [`crate::retry::is_retryable_status`]; transport
    /// failures retry only on connect errors and timeouts.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api(obj) => obj
                .status_code
                .is_some_and(crate::retry::is_retryable_status),
            Self::Reqwest(e) => e.is_timeout() || e.is_connect(),
            Self::Config(_) | Self::Serde(_) | Self::Validation(_) | Self::Auth(_) => false,
        }
    }

    /// HTTP status of an API error, if any
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api(obj) => obj.status_code,
            _ => None,
        }
    }
}

fn snippet(body: &[u8]) -> String {
    String::from_utf8_lossy(&body[..body.len().min(BODY_SNIPPET_LIMIT)]).into_owned()
}

/// Maps a serde deserialization error to a `ClinicError` with context
#[must_use]
pub fn map_deser(e: &serde_json::Error, body: &[u8]) -> ClinicError {
    ClinicError::Serde(format!("{e}: {}", snippet(body)))
}

/// Builds an API error from a non-success response
///
/// The body is kept verbatim as the message. When it is a JSON object with an
/// `error` string, that string becomes the error label.
#[must_use]
pub fn deserialize_api_error(status: StatusCode, body: &[u8]) -> ClinicError {
    let label = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| format!("http_{}", status.as_u16()));

    ClinicError::Api(ApiErrorObject {
        status_code: Some(status.as_u16()),
        message: snippet(body),
        error: Some(label),
    })
}
