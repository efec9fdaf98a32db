//! Builds SDK clients from the loaded configuration.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clinic_async::{
    Client,
    auth::{OidcProvider, OidcSettings, SessionManager, SessionStatus, TokenStore},
    chat::{ChatClient, ChatConfig},
};
use clinic_config::ClinicConfig;
use secrecy::ExposeSecret;

/// Loaded configuration plus client factories.
pub struct AppContext {
    config: ClinicConfig,
}

impl AppContext {
    pub const fn new(config: ClinicConfig) -> Self {
        Self { config }
    }

    pub fn chat_client(&self) -> ChatClient {
        let chat = &self.config.services.chat;
        ChatClient::with_config(
            ChatConfig::new()
                .with_base_url(&chat.base_url)
                .with_timeout(Duration::from_secs(chat.timeout_secs)),
        )
    }

    fn token_store(&self) -> Result<TokenStore> {
        match &self.config.identity.token_store {
            Some(dir) => Ok(TokenStore::new(dir)),
            None => TokenStore::default_location().context("No location for saved tokens"),
        }
    }

    fn oidc_provider(&self) -> Result<OidcProvider> {
        let identity = &self.config.identity;
        let settings = OidcSettings {
            url: identity.url.clone(),
            realm: identity.realm.clone(),
            client_id: identity.client_id.clone(),
            redirect_uri: identity.redirect_uri.clone(),
        };
        Ok(OidcProvider::new(settings).with_store(self.token_store()?))
    }

    /// Session restored from saved tokens, if any.
    pub async fn session(&self) -> Result<SessionManager<OidcProvider>> {
        let session = SessionManager::new(Arc::new(self.oidc_provider()?));
        let status = session.initialize().await;
        tracing::debug!(?status, "session initialized");
        Ok(session)
    }

    /// REST client authenticated by, in order: `CLINIC_API_TOKEN`, the saved
    /// session, or nothing when anonymous access is allowed.
    pub async fn api_client(&self) -> Result<Client<clinic_async::ClinicConfig>> {
        let api = &self.config.services.api;
        let allow_anonymous = self.config.auth.allow_anonymous;
        let config = clinic_async::ClinicConfig::new()
            .with_api_base(&api.base_url)
            .with_allow_anonymous(allow_anonymous);

        if let Some(token) = &api.api_token {
            return Ok(Client::with_config(
                config.with_api_token(token.expose_secret()),
            ));
        }

        let session = self.session().await?;
        if session.status() == SessionStatus::Authenticated {
            return Ok(Client::with_config(config).with_bearer_source(Arc::new(session)));
        }
        if allow_anonymous {
            tracing::info!("not logged in; sending requests without credentials");
            return Ok(Client::with_config(config));
        }

        anyhow::bail!("Not logged in. Run `clinic login` or set CLINIC_API_TOKEN")
    }
}
