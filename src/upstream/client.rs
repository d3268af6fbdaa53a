//! HTTP client for the upstream service.
//!
//! # Responsibilities
//! - Resolve relative resource paths against the configured base URL
//! - Send one request and buffer the response
//! - Classify transport failures (connect, timeout, other)
//!
//! Resilience (retry, circuit breaking, deadlines) lives in `resilience`;
//! this client performs exactly one attempt per call.

use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use bytes::Bytes;
use serde::Serialize;
use url::Url;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::upstream::response::UpstreamResponse;

/// Failure to obtain any response from the upstream.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Request(String),

    #[error("invalid upstream path '{path}': {message}")]
    InvalidPath { path: String, message: String },
}

impl TransportError {
    /// Connection-level failures are worth retrying; a path that cannot be
    /// turned into a URL never will be.
    pub fn is_transient(&self) -> bool {
        !matches!(self, TransportError::InvalidPath { .. })
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_timeout() {
            TransportError::Request(format!("timeout: {}", e))
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// The upstream login identity.
#[derive(Clone, Serialize)]
pub struct Credentials {
    #[serde(rename = "CompanyDB")]
    pub tenant: String,
    #[serde(rename = "UserName")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
}

impl Credentials {
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self {
            tenant: config.tenant.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant", &self.tenant)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Single-attempt HTTP client bound to the upstream base URL.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: Url,
    login_path: String,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig, timeouts: &TimeoutConfig) -> Result<Self, TransportError> {
        let base_url = normalize_base(&config.base_url)?;

        let mut default_headers = reqwest::header::HeaderMap::new();
        default_headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(default_headers)
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .tcp_keepalive(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            login_path: config.login_path.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a resource path (optionally with a query string) against the base URL.
    pub fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidPath {
                path: path.to_string(),
                message: e.to_string(),
            })
    }

    /// Send one request, attaching the session cookie when given.
    pub async fn send(
        &self,
        method: &Method,
        path: &str,
        cookie: Option<&str>,
        body: Option<&Bytes>,
    ) -> Result<UpstreamResponse, TransportError> {
        let url = self.resolve(path)?;
        let mut request = self.http.request(method.clone(), url);

        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        if let Some(body) = body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.clone());
        }

        Self::buffer(request.send().await?).await
    }

    /// Reachability check: any HTTP answer from the base URL counts.
    pub async fn probe(&self) -> Result<UpstreamResponse, TransportError> {
        let response = self.http.get(self.base_url.clone()).send().await?;
        Self::buffer(response).await
    }

    /// Post the credentials to the login resource.
    pub async fn login(&self, credentials: &Credentials) -> Result<UpstreamResponse, TransportError> {
        let url = self.resolve(&self.login_path)?;
        let response = self.http.post(url).json(credentials).send().await?;
        Self::buffer(response).await
    }

    async fn buffer(response: reqwest::Response) -> Result<UpstreamResponse, TransportError> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

/// Relative joins only append to a base whose path ends in '/'.
fn normalize_base(raw: &str) -> Result<Url, TransportError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| TransportError::InvalidPath {
        path: raw.to_string(),
        message: e.to_string(),
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> UpstreamClient {
        let config = UpstreamConfig {
            base_url: base.to_string(),
            ..UpstreamConfig::default()
        };
        UpstreamClient::new(&config, &TimeoutConfig::default()).unwrap()
    }

    #[test]
    fn test_resolve_appends_to_base_path() {
        let client = client("https://sap.local:50000/b1s/v1");
        let url = client.resolve("BusinessPartners('C001')").unwrap();
        assert_eq!(url.path(), "/b1s/v1/BusinessPartners('C001')");
    }

    #[test]
    fn test_resolve_keeps_query_and_strips_leading_slash() {
        let client = client("https://sap.local:50000/b1s/v1/");
        let url = client.resolve("/Items?$top=5").unwrap();
        assert_eq!(url.path(), "/b1s/v1/Items");
        assert_eq!(url.query(), Some("$top=5"));
    }

    #[test]
    fn test_credentials_wire_format_and_redaction() {
        let credentials = Credentials {
            tenant: "SBODEMO".into(),
            username: "manager".into(),
            password: "hunter2".into(),
        };
        let json = serde_json::to_value(&credentials).unwrap();
        assert_eq!(json["CompanyDB"], "SBODEMO");
        assert_eq!(json["UserName"], "manager");
        assert_eq!(json["Password"], "hunter2");
        assert!(!format!("{:?}", credentials).contains("hunter2"));
    }

    #[test]
    fn test_invalid_path_is_not_transient() {
        let err = TransportError::InvalidPath {
            path: "x".into(),
            message: "bad".into(),
        };
        assert!(!err.is_transient());
        assert!(TransportError::Timeout(Duration::from_secs(1)).is_transient());
    }
}
