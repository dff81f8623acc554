//! The single indirection point for every Reddit API call.
//!
//! Callers describe a call as an [`ApiRequest`] and hand it to a
//! [`Transport`] together with the bearer token. [`DirectTransport`] talks to
//! the API itself; [`RelayTransport`] posts the same request to a relay
//! endpoint (see [`crate::relay`]) which attaches the credentials server-side.
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// User agent sent with every upstream request unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = "RedditCleaner/1.0.0";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Errors surfaced by a [`Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Upstream API answered with a non-2xx status
    #[error("Reddit API error: {status} - {body}")]
    HttpStatus { status: u16, body: String },
    /// Relay answered with a non-2xx status; `message` is its `error` field
    #[error("Relay error: {status} - {message}")]
    Relay { status: u16, message: String },
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid JSON in response: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// Outgoing relay payload could not be serialized
    #[error("Failed to encode relay request: {0}")]
    Encode(#[source] serde_json::Error),
}

impl TransportError {
    /// HTTP status of the failed exchange, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::HttpStatus { status, .. } | TransportError::Relay { status, .. } => {
                Some(*status)
            }
            TransportError::Network(e) => e.status().map(|s| s.as_u16()),
            TransportError::Timeout(_)
            | TransportError::ResponseTooLarge(_)
            | TransportError::InvalidJson(_)
            | TransportError::Encode(_) => None,
        }
    }
}

/// One API call, independent of how it reaches the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub url: String,
    pub method: Method,
    /// Form-encoded body for mutating calls
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            body: None,
        }
    }

    pub fn post_form(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::POST,
            body: Some(body.into()),
        }
    }
}

/// Performs an authenticated API call and returns the decoded JSON body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, token: &SecretString, request: ApiRequest)
        -> Result<Value, TransportError>;
}

// ============================================================================
// Direct Transport
// ============================================================================

/// Calls the API directly with `Authorization`, `User-Agent` and
/// `Content-Type` headers attached.
#[derive(Debug, Clone)]
pub struct DirectTransport {
    client: reqwest::Client,
    user_agent: String,
    timeout: Duration,
}

impl DirectTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Transport for DirectTransport {
    async fn send(
        &self,
        token: &SecretString,
        request: ApiRequest,
    ) -> Result<Value, TransportError> {
        let content_type = if request.method == Method::POST {
            FORM_CONTENT_TYPE
        } else {
            JSON_CONTENT_TYPE
        };

        let mut builder = self
            .client
            .request(request.method.clone(), &request.url)
            .header(AUTHORIZATION, format!("Bearer {}", token.expose_secret()))
            .header(USER_AGENT, &self.user_agent)
            .header(CONTENT_TYPE, content_type);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = tokio::time::timeout(self.timeout, builder.send())
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
            .map_err(TransportError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body = read_limited_bytes(response, MAX_RESPONSE_SIZE)
                .await
                .map(|b| String::from_utf8_lossy(&b).into_owned())
                .unwrap_or_default();
            tracing::warn!(
                status = status.as_u16(),
                method = %request.method,
                url = %request.url,
                "Reddit API returned an error status"
            );
            return Err(TransportError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        decode_json(&bytes)
    }
}

// ============================================================================
// Relay Transport
// ============================================================================

/// JSON body posted to the relay endpoint.
#[derive(Clone, Serialize)]
pub struct RelayPayload {
    pub url: String,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl std::fmt::Debug for RelayPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayPayload")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .field("method", &self.method)
            .field("body", &self.body.as_ref().map(|_| "(present)"))
            .finish()
    }
}

#[derive(Deserialize)]
struct RelayErrorBody {
    error: String,
}

/// Routes every call through a relay endpoint, keeping credentials off the
/// direct path to the API.
#[derive(Debug, Clone)]
pub struct RelayTransport {
    client: reqwest::Client,
    relay_url: String,
    timeout: Duration,
}

impl RelayTransport {
    pub fn new(client: reqwest::Client, relay_url: impl Into<String>) -> Self {
        Self {
            client,
            relay_url: relay_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Transport for RelayTransport {
    async fn send(
        &self,
        token: &SecretString,
        request: ApiRequest,
    ) -> Result<Value, TransportError> {
        let payload = RelayPayload {
            url: request.url,
            token: token.expose_secret().to_string(),
            method: Some(request.method.as_str().to_string()),
            body: request.body,
        };
        let encoded = serde_json::to_vec(&payload).map_err(TransportError::Encode)?;

        let send = self
            .client
            .post(&self.relay_url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(encoded)
            .send();
        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| TransportError::Timeout(self.timeout))?
            .map_err(TransportError::Network)?;

        let status = response.status();
        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<RelayErrorBody>(&bytes)
                .map(|b| b.error)
                .unwrap_or_else(|_| String::from_utf8_lossy(&bytes).into_owned());
            tracing::warn!(
                status = status.as_u16(),
                url = %payload.url,
                "Relay returned an error status"
            );
            return Err(TransportError::Relay {
                status: status.as_u16(),
                message,
            });
        }

        decode_json(&bytes)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn decode_json(bytes: &[u8]) -> Result<Value, TransportError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(bytes)?)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, TransportError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(TransportError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(TransportError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(TransportError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
