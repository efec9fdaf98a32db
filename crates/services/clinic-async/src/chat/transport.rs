use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::types::{
    ChatFailure, ChatReply, ChatRequest, ChatResult, HistoryEntry, HistoryEnvelope, PatientInfo,
};

/// Default chat service base URL
pub const CHAT_DEFAULT_BASE: &str = "http://localhost:5000/api";
/// Per-request timeout for every chat call
pub const CHAT_TIMEOUT: Duration = Duration::from_secs(30);
/// Env var overriding the chat base URL
pub const ENV_CHAT_BASE_URL: &str = "CLINIC_CHAT_BASE_URL";

/// Fallback when a failure carries no message
pub const MSG_CONNECTION_ERROR: &str = "connection error";
/// Fallback for a failed health check
pub const MSG_SERVICE_UNAVAILABLE: &str = "service unavailable";
/// Message for a request that hit [`CHAT_TIMEOUT`]
pub const MSG_TIMED_OUT: &str = "request timed out";

/// Remote operations of the chat assistant
///
/// Every failure (network, timeout, non-2xx, bad body) comes back as a
/// [`ChatFailure`]; implementations never panic on remote errors.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Sends a user message and returns the assistant reply
    async fn send_message(
        &self,
        message: &str,
        conversation_id: Option<&str>,
        patient_info: &PatientInfo,
    ) -> ChatResult<ChatReply>;

    /// Fetches the server-side log of a conversation
    async fn get_history(&self, conversation_id: &str) -> ChatResult<Vec<HistoryEntry>>;

    /// Deletes a conversation on the server
    async fn delete_conversation(&self, conversation_id: &str) -> ChatResult<()>;

    /// Reports service health
    async fn check_health(&self) -> ChatResult<serde_json::Value>;
}

/// Chat service location and timeout
#[derive(Debug, Clone)]
pub struct ChatConfig {
    base_url: String,
    timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        let base_url = std::env::var(ENV_CHAT_BASE_URL)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| CHAT_DEFAULT_BASE.into());

        Self {
            base_url,
            timeout: CHAT_TIMEOUT,
        }
    }
}

impl ChatConfig {
    /// Reads `CLINIC_CHAT_BASE_URL`, defaulting to `http://localhost:5000/api`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL
    #[must_use]
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_url = base.into();
        self
    }

    /// Overrides the per-request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configured base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// HTTP implementation of [`ChatTransport`]
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    config: ChatConfig,
}

impl Default for ChatClient {
    fn default() -> Self {
        Self::with_config(ChatConfig::default())
    }
}

impl ChatClient {
    /// Client configured from the environment
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the reqwest client cannot be built.
    #[must_use]
    pub fn with_config(config: ChatConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .expect("reqwest client"),
            config,
        }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &ChatConfig {
        &self.config
    }

    async fn exchange(
        &self,
        request: reqwest::RequestBuilder,
        fallback: &str,
    ) -> ChatResult<bytes::Bytes> {
        let response = request.send().await.map_err(|e| transport_failure(&e, fallback))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_failure(&e, fallback))?;

        if !status.is_success() {
            tracing::debug!(%status, "chat service returned an error");
            return Err(ChatFailure::new(
                error_field(&bytes).unwrap_or_else(|| fallback.to_string()),
            ));
        }
        Ok(bytes)
    }

    async fn call<O: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        fallback: &str,
    ) -> ChatResult<O> {
        let bytes = self.exchange(request, fallback).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::debug!(error = %e, "undecodable chat response");
            ChatFailure::new(fallback)
        })
    }
}

fn transport_failure(e: &reqwest::Error, fallback: &str) -> ChatFailure {
    tracing::debug!(error = %e, "chat request failed");
    if e.is_timeout() {
        ChatFailure::new(MSG_TIMED_OUT)
    } else {
        ChatFailure::new(fallback)
    }
}

fn error_field(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()?
        .get("error")?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl ChatTransport for ChatClient {
    async fn send_message(
        &self,
        message: &str,
        conversation_id: Option<&str>,
        patient_info: &PatientInfo,
    ) -> ChatResult<ChatReply> {
        let body = ChatRequest {
            message,
            conversation_id,
            patient_info,
        };
        let req = self.http.post(self.config.url("chat")).json(&body);
        let reply: ChatReply = self.call(req, MSG_CONNECTION_ERROR).await?;

        // Follow-up sends would start a new conversation
        if reply.conversation_id.trim().is_empty() {
            tracing::debug!("chat reply carried no conversation id");
            return Err(ChatFailure::new(MSG_CONNECTION_ERROR));
        }
        Ok(reply)
    }

    async fn get_history(&self, conversation_id: &str) -> ChatResult<Vec<HistoryEntry>> {
        let path = format!("conversation/{}", urlencoding::encode(conversation_id));
        let req = self.http.get(self.config.url(&path));
        let envelope: HistoryEnvelope = self.call(req, MSG_CONNECTION_ERROR).await?;
        Ok(envelope.history)
    }

    async fn delete_conversation(&self, conversation_id: &str) -> ChatResult<()> {
        let path = format!("conversation/{}", urlencoding::encode(conversation_id));
        let req = self.http.delete(self.config.url(&path));
        self.exchange(req, MSG_CONNECTION_ERROR).await.map(|_| ())
    }

    async fn check_health(&self) -> ChatResult<serde_json::Value> {
        let req = self.http.get(self.config.url("health"));
        self.call(req, MSG_SERVICE_UNAVAILABLE).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::EnvGuard;
    use serial_test::serial;

    #[test]
    fn error_field_is_extracted_when_present() {
        assert_eq!(
            error_field(r#"{"error":"Modèle indisponible"}"#.as_bytes()).as_deref(),
            Some("Modèle indisponible")
        );
        assert_eq!(error_field(br#"{"error":""}"#), None);
        assert_eq!(error_field(b"Bad Gateway"), None);
    }

    #[test]
    fn url_joins_paths() {
        let cfg = ChatConfig::new().with_base_url("http://chat.local/api/");
        assert_eq!(cfg.url("/health"), "http://chat.local/api/health");
    }

    #[test]
    #[serial(env)]
    fn base_url_comes_from_env() {
        let _g = EnvGuard::set(ENV_CHAT_BASE_URL, " http://bot:5000/api ");
        assert_eq!(ChatConfig::new().base_url(), "http://bot:5000/api");

        let _g = EnvGuard::remove(ENV_CHAT_BASE_URL);
        assert_eq!(ChatConfig::new().base_url(), CHAT_DEFAULT_BASE);
    }
}
