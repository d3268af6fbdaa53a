//! Response shapes returned to gateway clients.
//!
//! # Responsibilities
//! - The JSON envelope used by gateway-owned endpoints and every error
//! - Verbatim passthrough of upstream responses
//! - Mapping `GatewayError` onto status codes
//! - Rewrapping bare error responses produced by middleware
//!
//! Error details (internal error text) are only exposed outside production.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::GatewayError;
use crate::upstream::UpstreamResponse;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    pub status_code: u16,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error_message: None,
            error_details: None,
            status_code: StatusCode::OK.as_u16(),
            timestamp: Utc::now(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(status: StatusCode, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            data: None,
            error_message: Some(message.into()),
            error_details: details,
            status_code: status.as_u16(),
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// A `GatewayError` on its way to the client.
#[derive(Debug)]
pub struct ApiError {
    pub error: GatewayError,
    pub expose_details: bool,
}

impl ApiError {
    pub fn new(error: GatewayError, expose_details: bool) -> Self {
        Self {
            error,
            expose_details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.error, "Request failed");
        } else {
            tracing::debug!(status = %status, error = %self.error, "Request rejected");
        }

        let details = (self.expose_details && self.error.has_details()).then(|| self.error.to_string());
        ApiResponse::error(status, self.error.public_message(), details).into_response()
    }
}

/// Environment-agnostic fallback: never exposes details.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        ApiError::new(self, false).into_response()
    }
}

/// Upstream status and body, unchanged. Content type is the upstream's, or JSON.
pub fn passthrough(response: UpstreamResponse) -> Response {
    let content_type = response
        .headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    (response.status, [(header::CONTENT_TYPE, content_type)], response.body).into_response()
}

/// Put error responses that no handler produced into the envelope.
///
/// Middleware answers without a JSON body: the timeout layer sends an empty
/// 504, the body limit a plain-text 413, the router an empty 404 or 405.
/// Handler and passthrough responses always carry a content type and are left
/// alone.
pub async fn envelope_bare_errors(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }
    let bare = match response.headers().get(header::CONTENT_TYPE) {
        None => true,
        Some(value) => status == StatusCode::PAYLOAD_TOO_LARGE && !is_json(value),
    };
    if !bare {
        return response;
    }

    let message = match status {
        StatusCode::GATEWAY_TIMEOUT => "Request timed out",
        StatusCode::PAYLOAD_TOO_LARGE => "Request body too large",
        _ => status.canonical_reason().unwrap_or("Request failed"),
    };
    tracing::debug!(status = %status, "Wrapping middleware response in envelope");

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);
    let (envelope, body) = ApiResponse::error(status, message, None)
        .into_response()
        .into_parts();
    parts.headers.extend(envelope.headers);
    Response::from_parts(parts, body)
}

fn is_json(value: &HeaderValue) -> bool {
    value
        .to_str()
        .map(|v| v.starts_with("application/json"))
        .unwrap_or(false)
}
