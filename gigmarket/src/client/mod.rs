//! HTTP client and configuration.

mod auth;
mod http;

pub use auth::{AuthInfo, Credentials, UnauthorizedHook};
pub use http::{HttpConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};

use crate::api::{ConversationApi, ReelApi};
use crate::error::{Error, Result};
use crate::models::{ConversationId, UserId};
use crate::session::SessionBuilder;
use http::{build_client, HttpExecutor};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Builder for creating MarketClient.
pub struct MarketClientBuilder {
    auth: Option<AuthInfo>,
    http_config: HttpConfig,
    on_unauthorized: Option<UnauthorizedHook>,
}

impl std::fmt::Debug for MarketClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketClientBuilder")
            .field("auth", &self.auth.as_ref().map(|a| &a.user_id))
            .field("http_config", &self.http_config)
            .field("on_unauthorized", &self.on_unauthorized.as_ref().map(|_| "..."))
            .finish()
    }
}

impl Default for MarketClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            auth: None,
            http_config: HttpConfig::default(),
            on_unauthorized: None,
        }
    }

    /// Set authentication.
    pub fn auth(mut self, token: impl Into<String>, user_id: impl Into<UserId>) -> Self {
        self.auth = Some(AuthInfo::new(token, user_id));
        self
    }

    /// Set authentication from AuthInfo.
    pub fn with_auth(mut self, auth: AuthInfo) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.http_config.base_url = url.into();
        self
    }

    /// Set custom user agent.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.http_config.custom_user_agent = Some(ua.into());
        self
    }

    /// Set connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.http_config.connect_timeout = timeout;
        self
    }

    /// Set whole-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.http_config.timeout = timeout;
        self
    }

    /// Run a callback after the server rejects the credentials.
    pub fn on_unauthorized(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_unauthorized = Some(Arc::new(hook));
        self
    }

    /// Build MarketClient.
    pub fn build(self) -> Result<MarketClient> {
        let http_client = build_client(&self.http_config)?;
        // Fail early on a malformed base URL.
        self.http_config.resolve_url("")?;

        Ok(MarketClient {
            inner: Arc::new(MarketClientInner {
                http: http_client,
                config: self.http_config,
                credentials: Credentials::new(self.auth),
                on_unauthorized: self.on_unauthorized,
            }),
        })
    }
}

/// Internal client state.
pub(crate) struct MarketClientInner {
    pub http: reqwest::Client,
    pub config: HttpConfig,
    pub credentials: Credentials,
    pub on_unauthorized: Option<UnauthorizedHook>,
}

impl MarketClientInner {
    /// Fail unless credentials are present.
    pub fn require_auth(&self) -> Result<()> {
        if self.credentials.is_present() {
            Ok(())
        } else {
            Err(Error::AuthRequired)
        }
    }

    /// Create HTTP executor.
    pub fn executor(&self) -> HttpExecutor<'_> {
        HttpExecutor::new(
            &self.http,
            &self.config,
            &self.credentials,
            self.on_unauthorized.as_ref(),
        )
    }

    /// Execute an authenticated GET request.
    pub async fn get_authed<T: DeserializeOwned>(
        &self,
        api: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        self.require_auth()?;
        self.executor().get_json(api, query).await
    }

    /// Execute a GET request, authenticated when credentials exist.
    pub async fn get<T: DeserializeOwned>(&self, api: &str, query: &[(&str, &str)]) -> Result<T> {
        self.executor().get_json(api, query).await
    }

    /// Execute an authenticated JSON POST request.
    pub async fn post_authed<B, T>(&self, api: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.require_auth()?;
        self.executor().post_json(api, body).await
    }
}

/// Client for the marketplace REST API.
#[derive(Clone)]
pub struct MarketClient {
    pub(crate) inner: Arc<MarketClientInner>,
}

impl MarketClient {
    /// Create a new client builder.
    pub fn builder() -> MarketClientBuilder {
        MarketClientBuilder::new()
    }

    /// Get the conversation API.
    pub fn conversations(&self) -> ConversationApi {
        ConversationApi::new(self.inner.clone())
    }

    /// Get the reel feed API.
    pub fn reels(&self) -> ReelApi {
        ReelApi::new(self.inner.clone())
    }

    /// Start building a live session for one conversation.
    pub fn conversation_session(&self, id: impl Into<ConversationId>) -> SessionBuilder {
        let builder = SessionBuilder::new(Arc::new(self.conversations()), id);
        match self.current_user_id() {
            Some(uid) => builder.sender(uid),
            None => builder,
        }
    }

    /// Check if the client is authenticated.
    pub fn is_authenticated(&self) -> bool {
        self.inner.credentials.is_present()
    }

    /// Get the current authentication info.
    pub fn auth_info(&self) -> Option<AuthInfo> {
        self.inner.credentials.get()
    }

    /// Get the current user ID if authenticated.
    pub fn current_user_id(&self) -> Option<UserId> {
        self.inner.credentials.user_id()
    }

    /// Replace the credentials used by this client and its clones.
    pub fn set_auth(&self, auth: AuthInfo) {
        self.inner.credentials.set(auth);
    }

    /// Drop the credentials used by this client and its clones.
    pub fn sign_out(&self) {
        self.inner.credentials.clear();
    }
}

impl std::fmt::Debug for MarketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketClient")
            .field("authenticated", &self.is_authenticated())
            .field("base_url", &self.inner.config.base_url)
            .finish()
    }
}
