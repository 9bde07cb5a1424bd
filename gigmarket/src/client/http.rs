//! HTTP client configuration and request execution.

use crate::error::{Error, Result};
use log::{debug, warn};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use url::Url;

use super::auth::{Credentials, UnauthorizedHook};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:4000/api/";

/// Default user agent.
pub const DEFAULT_USER_AGENT: &str = concat!("gigmarket/", env!("CARGO_PKG_VERSION"));

/// Reference per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL for API requests.
    pub base_url: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Custom user agent.
    pub custom_user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            connect_timeout: Duration::from_secs(5),
            timeout: DEFAULT_TIMEOUT,
            custom_user_agent: None,
        }
    }
}

impl HttpConfig {
    /// User agent to send.
    pub fn user_agent(&self) -> &str {
        self.custom_user_agent
            .as_deref()
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    /// Resolve a relative API path to a full URL.
    pub fn resolve_url(&self, api: &str) -> Result<Url> {
        if api.starts_with("http://") || api.starts_with("https://") {
            return Url::parse(api).map_err(Error::Url);
        }

        let mut base = self.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        Url::parse(&base)
            .and_then(|b| b.join(api.trim_start_matches('/')))
            .map_err(Error::Url)
    }
}

/// Build a reqwest client with the given configuration.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.timeout)
        .gzip(true)
        .build()
        .map_err(Error::Network)
}

/// HTTP request executor.
pub struct HttpExecutor<'a> {
    client: &'a Client,
    config: &'a HttpConfig,
    credentials: &'a Credentials,
    on_unauthorized: Option<&'a UnauthorizedHook>,
}

impl<'a> HttpExecutor<'a> {
    /// Create a new executor.
    pub fn new(
        client: &'a Client,
        config: &'a HttpConfig,
        credentials: &'a Credentials,
        on_unauthorized: Option<&'a UnauthorizedHook>,
    ) -> Self {
        Self {
            client,
            config,
            credentials,
            on_unauthorized,
        }
    }

    /// Build a request with common headers.
    fn build_request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self
            .client
            .request(method, url)
            .header(header::USER_AGENT, self.config.user_agent())
            .header(header::ACCEPT, "application/json");

        match self.credentials.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Execute a GET request and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        api: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let url = self.config.resolve_url(api)?;
        let query: Vec<(&str, &str)> = query
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .copied()
            .collect();

        debug!("GET {} {:?}", url, query);
        let response = self
            .build_request(Method::GET, url)
            .query(&query)
            .send()
            .await
            .map_err(Error::Network)?;

        self.handle_response(response).await
    }

    /// Execute a POST request with a JSON body and decode the JSON reply.
    pub async fn post_json<B, T>(&self, api: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.config.resolve_url(api)?;

        debug!("POST {}", url);
        let response = self
            .build_request(Method::POST, url)
            .json(body)
            .send()
            .await
            .map_err(Error::Network)?;

        self.handle_response(response).await
    }

    /// Map the status code to an error kind or decode the body.
    async fn handle_response<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        let bytes = response.bytes().await.map_err(Error::Network)?;

        if status.is_success() {
            return serde_json::from_slice(&bytes).map_err(Error::Json);
        }

        let message = extract_error_message(&bytes)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_owned());

        if status.as_u16() == 401 {
            warn!("API rejected credentials, signing out: {}", message);
            self.credentials.clear();
            if let Some(hook) = self.on_unauthorized {
                hook();
            }
        }

        Err(Error::from_status(status.as_u16(), message))
    }
}

/// Pull a human-readable message out of an error body.
fn extract_error_message(bytes: &[u8]) -> Option<String> {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(bytes) {
        for key in ["error", "message"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s.clone()),
                Some(serde_json::Value::Object(obj)) => {
                    if let Some(serde_json::Value::String(s)) = obj.get("message") {
                        return Some(s.clone());
                    }
                }
                _ => {}
            }
        }
    }

    let text = String::from_utf8_lossy(bytes).trim().to_owned();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
