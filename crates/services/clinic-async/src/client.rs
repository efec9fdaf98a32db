use std::sync::Arc;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::{
    Method,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    config::Config,
    error::{AuthError, ClinicError},
    retry,
};

/// Supplies a fresh bearer token for each REST call
///
/// [`crate::auth::SessionManager`] implements this so that every request
/// carries a token that is valid for at least the refresh window.
#[async_trait]
pub trait BearerSource: Send + Sync {
    /// Returns a bearer token, refreshing it first if needed
    async fn bearer_token(&self) -> Result<SecretString, AuthError>;
}

/// Clinic REST API client
///
/// The client is generic over a [`Config`] implementation that provides the base URL
/// and static credentials. Attach a [`BearerSource`] to authenticate with the login
/// session instead.
#[derive(Clone)]
pub struct Client<C: Config> {
    http: reqwest::Client,
    config: C,
    backoff: ExponentialBuilder,
    bearer: Option<Arc<dyn BearerSource>>,
}

impl<C: Config + std::fmt::Debug> std::fmt::Debug for Client<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("bearer", &self.bearer.is_some())
            .finish_non_exhaustive()
    }
}

impl Client<crate::config::ClinicConfig> {
    /// Creates a new client with default configuration
    ///
    /// Uses environment variables:
    /// - `CLINIC_API_BASE_URL` for a custom API base URL
    /// - `CLINIC_API_TOKEN` for a static bearer token
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(crate::config::ClinicConfig::new())
    }
}

impl<C: Config + Default> Default for Client<C> {
    fn default() -> Self {
        Self::with_config(C::default())
    }
}

impl<C: Config> Client<C> {
    /// Creates a new client with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the reqwest client cannot be built.
    #[must_use]
    pub fn with_config(config: C) -> Self {
        Self {
            http: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(5))
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("reqwest client"),
            config,
            backoff: retry::default_backoff_builder(),
            bearer: None,
        }
    }

    /// Replaces the HTTP client with a custom one
    #[must_use]
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Replaces the backoff configuration for retry logic
    #[must_use]
    pub fn with_backoff(mut self, backoff: ExponentialBuilder) -> Self {
        self.backoff = backoff;
        self
    }

    /// Authenticates every request with tokens from `source`
    #[must_use]
    pub fn with_bearer_source(mut self, source: Arc<dyn BearerSource>) -> Self {
        self.bearer = Some(source);
        self
    }

    /// Returns a reference to the client's configuration
    #[must_use]
    pub const fn config(&self) -> &C {
        &self.config
    }

    pub(crate) async fn get<O>(&self, path: &str) -> Result<O, ClinicError>
    where
        O: DeserializeOwned,
    {
        let bytes = self.send(Method::GET, path, None::<&()>).await?;
        decode(&bytes)
    }

    pub(crate) async fn post<I, O>(&self, path: &str, body: &I) -> Result<O, ClinicError>
    where
        I: Serialize + Sync,
        O: DeserializeOwned,
    {
        let bytes = self.send(Method::POST, path, Some(body)).await?;
        decode(&bytes)
    }

    pub(crate) async fn put<I, O>(&self, path: &str, body: &I) -> Result<O, ClinicError>
    where
        I: Serialize + Sync,
        O: DeserializeOwned,
    {
        let bytes = self.send(Method::PUT, path, Some(body)).await?;
        decode(&bytes)
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ClinicError> {
        self.send(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    async fn auth_headers(&self) -> Result<HeaderMap, ClinicError> {
        let mut headers = self.config.headers()?;

        match &self.bearer {
            Some(source) => {
                let token = source.bearer_token().await?;
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                    .map_err(|_| ClinicError::Config("Invalid bearer token value".into()))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            None => self.config.validate_auth()?,
        }

        Ok(headers)
    }

    async fn send<I>(
        &self,
        method: Method,
        path: &str,
        body: Option<&I>,
    ) -> Result<bytes::Bytes, ClinicError>
    where
        I: Serialize + Sync + ?Sized,
    {
        // Token is resolved once; retries reuse it.
        let headers = self.auth_headers().await?;
        let url = self.config.url(path);

        let backoff = retry::backoff_for(&method, self.backoff);

        let http_client = self.http.clone();

        (|| async {
            let mut builder = http_client
                .request(method.clone(), &url)
                .headers(headers.clone())
                .query(&self.config.query());
            if let Some(body) = body {
                builder = builder.json(body);
            }
            let request = builder.build()?;

            tracing::debug!(method = %request.method(), url = %request.url(), "clinic request");

            let response = http_client
                .execute(request)
                .await
                .map_err(ClinicError::Reqwest)?;

            let status = response.status();
            let bytes = response.bytes().await.map_err(ClinicError::Reqwest)?;

            if status.is_success() {
                return Ok(bytes);
            }

            Err(crate::error::deserialize_api_error(status, &bytes))
        })
        .retry(backoff)
        .when(ClinicError::is_retryable)
        .notify(|err: &ClinicError, dur: std::time::Duration| {
            tracing::warn!(error = %err, retry_in = ?dur, "retrying clinic request");
        })
        .await
    }
}

fn decode<O: DeserializeOwned>(bytes: &[u8]) -> Result<O, ClinicError> {
    serde_json::from_slice(bytes).map_err(|e| crate::error::map_deser(&e, bytes))
}
