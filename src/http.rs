//! Signed HTTP transport for the provider's APIs
//!
//! This module wraps one reqwest client with:
//! - OAuth 1.0 HMAC-SHA1 signing of every request (fresh nonce per attempt)
//! - Token bucket pacing shared by all API families
//! - Retries with exponential backoff for transient provider failures
//! - Mapping of non-2xx responses to [`ApiError`]

use reqwest::{Client, ClientBuilder, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::credentials::CredentialRecord;
use crate::error::{ApiError, GamError, GamResult};
use crate::oauth::{authorization_header, KeyPair, Nonce};
use crate::rate_limit::{api_limiter, RateLimiter};
use crate::retry::{is_transient, with_exponential_backoff, RetryConfig};
use crate::xml::{self, Document};

pub const ATOM_XML: &str = "application/atom+xml";
pub const JSON: &str = "application/json";

/// Request body, cloned for every attempt.
#[derive(Debug, Clone)]
pub enum Payload {
    Empty,
    Text { content_type: &'static str, body: String },
    Bytes { content_type: String, body: Vec<u8> },
}

/// A successful response.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// HTTP client bound to one set of OAuth credentials
///
/// # Examples
///
/// ```
/// use gam::http::Transport;
/// use std::time::Duration;
///
/// # fn example() -> gam::error::GamResult<()> {
/// let transport = Transport::new(Duration::from_secs(30))?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Transport {
    client: Client,
    consumer: KeyPair,
    token: Option<KeyPair>,
    retry_config: RetryConfig,
    rate_limiter: Arc<RateLimiter>,
}

impl Transport {
    /// Creates an unsigned-token transport with the given request timeout.
    pub fn new(timeout: Duration) -> GamResult<Self> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent())
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            consumer: KeyPair::anonymous(),
            token: None,
            retry_config: RetryConfig::default(),
            rate_limiter: Arc::new(api_limiter()),
        })
    }

    /// Signs subsequent requests with the record's consumer and token.
    pub fn with_credentials(mut self, record: &CredentialRecord) -> Self {
        self.consumer = record.consumer();
        self.token = Some(record.access_token());
        self
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = limiter;
        self
    }

    /// The underlying client, for the token endpoints.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Sends a signed request, retrying transient failures.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        payload: Payload,
        if_match: Option<&str>,
    ) -> GamResult<Response> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| GamError::failed(e.to_string(), 1))?;

        with_exponential_backoff(
            || self.attempt(method.clone(), url, payload.clone(), if_match),
            |err| {
                let retry = is_transient(err);
                if retry {
                    warn!("{} {} failed, will retry: {}", method, url, err);
                }
                retry
            },
            &self.retry_config,
        )
        .await
    }

    async fn attempt(
        &self,
        method: Method,
        url: &str,
        payload: Payload,
        if_match: Option<&str>,
    ) -> GamResult<Response> {
        let header = authorization_header(
            method.as_str(),
            url,
            &self.consumer,
            self.token.as_ref(),
            &[],
            &Nonce::fresh(),
        )?;
        debug!("{} {}", method, url);

        let mut builder = self
            .client
            .request(method.clone(), url)
            .header("Authorization", header);
        if let Some(etag) = if_match {
            builder = builder.header("If-Match", etag);
        }
        builder = match payload {
            Payload::Empty => builder,
            Payload::Text { content_type, body } => {
                builder.header("Content-Type", content_type).body(body)
            }
            Payload::Bytes { content_type, body } => {
                builder.header("Content-Type", content_type).body(body)
            }
        };

        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();
        debug!("{} {} -> {}", method, url, status);

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(ApiError::from_body(status.as_u16(), &text).into());
        }
        Ok(Response {
            status: status.as_u16(),
            body,
        })
    }

    pub async fn get_text(&self, url: &str) -> GamResult<String> {
        Ok(self.request(Method::GET, url, Payload::Empty, None).await?.text())
    }

    pub async fn get_bytes(&self, url: &str) -> GamResult<Vec<u8>> {
        Ok(self.request(Method::GET, url, Payload::Empty, None).await?.body)
    }

    pub async fn get_xml(&self, url: &str) -> GamResult<Document> {
        xml::parse(&self.get_text(url).await?)
    }

    pub async fn post_xml(&self, url: &str, body: String) -> GamResult<Document> {
        self.send_xml(Method::POST, url, body, None).await
    }

    pub async fn put_xml(&self, url: &str, body: String) -> GamResult<Document> {
        self.send_xml(Method::PUT, url, body, None).await
    }

    /// PUT with `If-Match`, for entries versioned by etag.
    pub async fn put_xml_if_match(&self, url: &str, body: String, etag: &str) -> GamResult<Document> {
        self.send_xml(Method::PUT, url, body, Some(etag)).await
    }

    async fn send_xml(
        &self,
        method: Method,
        url: &str,
        body: String,
        if_match: Option<&str>,
    ) -> GamResult<Document> {
        let payload = Payload::Text {
            content_type: ATOM_XML,
            body,
        };
        let text = self.request(method, url, payload, if_match).await?.text();
        if text.trim().is_empty() {
            return Ok(Document::default());
        }
        xml::parse(&text)
    }

    pub async fn delete(&self, url: &str) -> GamResult<()> {
        self.request(Method::DELETE, url, Payload::Empty, None).await?;
        Ok(())
    }

    pub async fn delete_if_match(&self, url: &str, etag: &str) -> GamResult<()> {
        self.request(Method::DELETE, url, Payload::Empty, Some(etag)).await?;
        Ok(())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> GamResult<T> {
        let resp = self.request(Method::GET, url, Payload::Empty, None).await?;
        Ok(serde_json::from_slice(&resp.body)?)
    }

    pub async fn put_json<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> GamResult<T> {
        self.send_json(Method::PUT, url, body).await
    }

    /// Partial update; only the fields present in `body` change.
    pub async fn patch_json<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> GamResult<T> {
        self.send_json(Method::PATCH, url, body).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: &B,
    ) -> GamResult<T> {
        let payload = Payload::Text {
            content_type: JSON,
            body: serde_json::to_string(body)?,
        };
        let resp = self.request(method, url, payload, None).await?;
        Ok(serde_json::from_slice(&resp.body)?)
    }

    pub async fn post_text(&self, url: &str, content_type: &'static str, body: String) -> GamResult<String> {
        let payload = Payload::Text { content_type, body };
        Ok(self.request(Method::POST, url, payload, None).await?.text())
    }

    pub async fn put_bytes(&self, url: &str, content_type: &str, body: Vec<u8>, if_match: Option<&str>) -> GamResult<()> {
        let payload = Payload::Bytes {
            content_type: content_type.to_string(),
            body,
        };
        self.request(Method::PUT, url, payload, if_match).await?;
        Ok(())
    }
}

/// `gam/<version> (<os> <arch>)`
pub fn user_agent() -> String {
    format!(
        "gam/{} ({} {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
