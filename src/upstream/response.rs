//! Buffered upstream responses.

use axum::http::{header, HeaderMap, StatusCode};
use bytes::Bytes;

/// A fully buffered response from the upstream service.
///
/// Bodies are small JSON documents, and buffering lets the same response be
/// inspected for session invalidation, retried, or combined by composites.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// A 401 means the session credential is no longer valid.
    pub fn is_session_invalidated(&self) -> bool {
        self.status == StatusCode::UNAUTHORIZED
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    /// Parse the body as JSON. An empty body is `null`.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&self.body)
    }

    /// Session credential carried by `Set-Cookie`, in `Cookie` header form.
    ///
    /// Only the `name=value` pair of each cookie is kept; attributes such as
    /// `path` or `HttpOnly` are meaningless in a request header.
    pub fn session_cookie(&self) -> Option<String> {
        let pairs: Vec<&str> = self
            .headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::trim)
            .filter(|pair| pair.contains('=') && !pair.starts_with('='))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}
