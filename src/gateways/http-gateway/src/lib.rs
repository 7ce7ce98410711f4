//! reqwest-backed [`Gateway`] for the karaoke server.
//!
//! Authentication rides on cookies: the configured session cookie and an
//! optional `csrftoken` seed go into a cookie jar that also picks up whatever
//! the server sets. Unsafe requests echo the jar's `csrftoken` value in the
//! `X-CSRFToken` header.

use kara_core::redact::redact_secrets;
use kara_core::{Gateway, GatewayError, GatewayResult, ServerConfig};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";

const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Error)]
pub enum HttpGatewayError {
    #[error("invalid base_url `{url}`: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
    jar: Arc<Jar>,
}

impl HttpGateway {
    pub fn new(config: &ServerConfig) -> Result<Self, HttpGatewayError> {
        let base_url =
            config
                .parsed_base_url()
                .map_err(|source| HttpGatewayError::InvalidBaseUrl {
                    url: config.base_url.clone(),
                    source,
                })?;

        let jar = Arc::new(Jar::default());
        if let Some(cookie) = config.session_cookie.as_deref() {
            jar.add_cookie_str(cookie, &base_url);
        }
        if let Some(token) = config.csrf_token.as_deref() {
            jar.add_cookie_str(&format!("{CSRF_COOKIE}={token}"), &base_url);
        }

        let client = Client::builder()
            .cookie_provider(jar.clone())
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(20))
            .build()?;

        tracing::debug!(base_url = %redact_secrets(base_url.as_str()), "http gateway ready");
        Ok(Self {
            client,
            base_url,
            jar,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Relative paths are joined to the base URL; absolute URLs (page cursors)
    /// are used verbatim.
    fn resolve(&self, url: &str) -> GatewayResult<Url> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base_url
                    .join(url)
                    .map_err(|e| GatewayError::InvalidResponse {
                        message: format!("cannot resolve `{url}`: {e}"),
                    })
            }
            Err(e) => Err(GatewayError::InvalidResponse {
                message: format!("malformed url `{url}`: {e}"),
            }),
        }
    }

    /// Current `csrftoken` cookie value for `url`, if the jar holds one.
    fn csrf_token(&self, url: &Url) -> Option<String> {
        let header = self.jar.cookies(url)?;
        let cookies = header.to_str().ok()?;
        cookies
            .split(';')
            .map(str::trim)
            .find_map(|pair| pair.strip_prefix(CSRF_COOKIE)?.strip_prefix('='))
            .map(str::to_string)
    }

    async fn send(&self, method: Method, url: &str, body: Option<Value>) -> GatewayResult<Value> {
        let target = self.resolve(url)?;
        let mut request = self.client.request(method.clone(), target.clone());

        if requires_csrf(&method) {
            match self.csrf_token(&target) {
                Some(token) => request = request.header(CSRF_HEADER, token),
                None => tracing::debug!(%method, "no csrftoken cookie for unsafe request"),
            }
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        tracing::debug!(%method, url = %redact_secrets(target.as_str()), "sending request");
        let resp = request.send().await.map_err(|e| GatewayError::Network {
            message: e.to_string(),
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown status").to_string()
            } else {
                redact_secrets(&text).chars().take(ERROR_BODY_LIMIT).collect()
            };
            tracing::warn!(
                %method,
                status = status.as_u16(),
                url = %redact_secrets(target.as_str()),
                "server rejected request"
            );
            return Err(GatewayError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| GatewayError::Network {
            message: e.to_string(),
        })?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::InvalidResponse {
            message: e.to_string(),
        })
    }
}

/// Anything but GET, HEAD, OPTIONS and TRACE must carry the anti-forgery token.
fn requires_csrf(method: &Method) -> bool {
    ![Method::GET, Method::HEAD, Method::OPTIONS, Method::TRACE].contains(method)
}

#[async_trait::async_trait]
impl Gateway for HttpGateway {
    async fn get(&self, url: &str) -> GatewayResult<Value> {
        self.send(Method::GET, url, None).await
    }

    async fn post(&self, url: &str, body: Value) -> GatewayResult<Value> {
        self.send(Method::POST, url, Some(body)).await
    }

    async fn put(&self, url: &str, body: Value) -> GatewayResult<Value> {
        self.send(Method::PUT, url, Some(body)).await
    }

    async fn delete(&self, url: &str) -> GatewayResult<()> {
        self.send(Method::DELETE, url, None).await.map(|_| ())
    }
}
