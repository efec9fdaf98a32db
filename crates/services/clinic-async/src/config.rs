use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

/// Default clinic REST API base URL
pub const CLINIC_DEFAULT_BASE: &str = "http://localhost:8080/api";

/// Env var overriding the REST base URL
pub const ENV_API_BASE_URL: &str = "CLINIC_API_BASE_URL";
/// Env var carrying a static bearer token
pub const ENV_API_TOKEN: &str = "CLINIC_API_TOKEN";
/// Env var allowing requests without any credentials
pub const ENV_ALLOW_ANONYMOUS: &str = "CLINIC_ALLOW_ANONYMOUS";

/// Configuration for the clinic REST client
///
/// Debug output redacts `api_token` via [`SecretString`].
#[derive(Clone, Debug)]
pub struct ClinicConfig {
    api_base: String,
    api_token: Option<SecretString>,
    allow_anonymous: bool,
}

fn env_trimmed(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Default for ClinicConfig {
    fn default() -> Self {
        let api_token = env_trimmed(ENV_API_TOKEN).map(SecretString::from);
        let api_base = env_trimmed(ENV_API_BASE_URL).unwrap_or_else(|| CLINIC_DEFAULT_BASE.into());
        let allow_anonymous = env_trimmed(ENV_ALLOW_ANONYMOUS)
            .is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1");

        Self {
            api_base,
            api_token,
            allow_anonymous,
        }
    }
}

impl ClinicConfig {
    /// Creates a new configuration with default settings
    ///
    /// Reads from environment variables:
    /// - `CLINIC_API_BASE_URL` for the API base (defaults to `http://localhost:8080/api`)
    /// - `CLINIC_API_TOKEN` for a static bearer token
    /// - `CLINIC_ALLOW_ANONYMOUS` (`true`/`1`) to send requests without credentials
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Sets a static bearer token
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::from(token.into()));
        self
    }

    /// Allows requests that carry no credentials at all
    #[must_use]
    pub const fn with_allow_anonymous(mut self, allow: bool) -> Self {
        self.allow_anonymous = allow;
        self
    }

    /// Returns the configured API base URL
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn token(&self) -> Option<&str> {
        self.api_token
            .as_ref()
            .map(|s| s.expose_secret().trim())
            .filter(|s| !s.is_empty())
    }
}

/// Configuration trait for the clinic client
///
/// Implement this trait to provide custom authentication and API configuration.
pub trait Config: Send + Sync {
    /// Returns HTTP headers to include in requests
    ///
    /// # Errors
    ///
    /// Returns an error if header values contain invalid characters.
    fn headers(&self) -> Result<HeaderMap, crate::error::ClinicError>;

    /// Constructs the full URL for an API endpoint
    fn url(&self, path: &str) -> String;

    /// Returns query parameters to include in requests
    fn query(&self) -> Vec<(&str, &str)>;

    /// Validates that credentials are present when no bearer source is attached.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication is not properly configured.
    fn validate_auth(&self) -> Result<(), crate::error::ClinicError>;
}

impl Config for ClinicConfig {
    fn headers(&self) -> Result<HeaderMap, crate::error::ClinicError> {
        use crate::error::ClinicError;

        let mut h = HeaderMap::new();

        if let Some(token) = self.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ClinicError::Config("Invalid bearer token value".into()))?;
            value.set_sensitive(true);
            h.insert(AUTHORIZATION, value);
        }

        Ok(h)
    }

    fn url(&self, path: &str) -> String {
        let base = self.api_base.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    fn query(&self) -> Vec<(&str, &str)> {
        vec![]
    }

    fn validate_auth(&self) -> Result<(), crate::error::ClinicError> {
        if self.token().is_some() || self.allow_anonymous {
            return Ok(());
        }
        Err(crate::error::ClinicError::Config(
            "Missing clinic credentials: log in, or set CLINIC_API_TOKEN or CLINIC_ALLOW_ANONYMOUS=1"
                .into(),
        ))
    }
}
