//! Gateway endpoint handlers.
//!
//! Passthrough routes return the upstream status and body verbatim. Routes the
//! gateway owns (login, the composite) answer with the JSON envelope. Every
//! failure is an envelope.

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::Method,
    response::{IntoResponse, Response},
};
use serde::de::IgnoredAny;

use crate::error::GatewayError;
use crate::http::response::{passthrough, ApiResponse};
use crate::http::server::AppState;
use crate::proxy::{Forward, ProxyRequest};
use crate::quotation::{self, SalesQuotation};
use crate::upstream::UpstreamResponse;

fn upstream_path(path: String, query: Option<String>) -> String {
    match query {
        Some(query) if !query.is_empty() => format!("{}?{}", path, query),
        _ => path,
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(body: &Bytes) -> Result<T, GatewayError> {
    serde_json::from_slice(body)
        .map_err(|e| GatewayError::Validation(format!("Request body must be valid JSON: {}", e)))
}

pub async fn login(State(state): State<AppState>) -> Response {
    tracing::info!("Establishing upstream session on request");
    match state.sessions.login().await {
        Ok(()) => ApiResponse::success(serde_json::json!({
            "message": "Session established successfully"
        }))
        .into_response(),
        Err(e) => state.api_error(e).into_response(),
    }
}

/// GET and DELETE passthrough.
pub async fn proxy_read(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    match forward(&state, method, upstream_path(path, query), None).await {
        Ok(response) => passthrough(response),
        Err(e) => state.api_error(e).into_response(),
    }
}

/// POST and PATCH passthrough. The body must be a JSON document.
pub async fn proxy_write(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    match forward(&state, method, upstream_path(path, query), Some(body)).await {
        Ok(response) => passthrough(response),
        Err(e) => state.api_error(e).into_response(),
    }
}

async fn forward(
    state: &AppState,
    method: Method,
    path: String,
    body: Option<Bytes>,
) -> Result<UpstreamResponse, GatewayError> {
    let request = ProxyRequest::new(method, path, body)?;
    if let Some(body) = &request.body {
        parse_json::<IgnoredAny>(body)?;
    }
    tracing::debug!(method = %request.method, path = %request.path, "Proxying request");
    state.forwarder.forward(&request).await
}

pub async fn create_quotation(State(state): State<AppState>, body: Bytes) -> Response {
    let result = match parse_json::<SalesQuotation>(&body) {
        Ok(quotation) => quotation::create_quotation(&state.forwarder, &quotation).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => passthrough(response),
        Err(e) => state.api_error(e).into_response(),
    }
}

pub async fn quotation_and_partner(State(state): State<AppState>, body: Bytes) -> Response {
    let result = match parse_json::<SalesQuotation>(&body) {
        Ok(quotation) => quotation::create_quotation_with_partner(&state.forwarder, quotation).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(results) => ApiResponse::success(results).into_response(),
        Err(e) => state.api_error(e).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_path_keeps_query() {
        assert_eq!(
            upstream_path("Items".into(), Some("$top=5&$skip=10".into())),
            "Items?$top=5&$skip=10"
        );
        assert_eq!(upstream_path("Items".into(), Some(String::new())), "Items");
        assert_eq!(upstream_path("Items".into(), None), "Items");
    }

    #[test]
    fn test_malformed_json_is_a_validation_error() {
        let err = parse_json::<IgnoredAny>(&Bytes::from_static(b"{not json")).unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
        assert!(parse_json::<IgnoredAny>(&Bytes::from_static(br#"{"a":1}"#)).is_ok());
    }
}
