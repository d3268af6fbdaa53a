//! Inbound API key authentication.
//!
//! Callers present `Authorization: Bearer <key>`. With no keys configured the
//! check is off and requests pass through anonymously.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::GatewayError;

/// Authenticated caller, attached to the request for downstream layers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    /// Stable label for the key; never the key itself.
    pub id: String,
}

#[derive(Debug, Default)]
pub struct ApiKeys {
    keys: Vec<String>,
}

impl ApiKeys {
    pub fn new(keys: impl IntoIterator<Item = String>) -> Self {
        Self {
            keys: keys.into_iter().filter(|k| !k.is_empty()).collect(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.keys.is_empty()
    }

    pub fn authenticate(&self, presented: &str) -> Option<Principal> {
        self.keys
            .iter()
            .position(|k| k == presented)
            .map(|i| Principal {
                id: format!("api-key-{}", i + 1),
            })
    }
}

pub fn bearer_token<B>(request: &Request<B>) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

pub async fn require_api_key(
    State(keys): State<Arc<ApiKeys>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if !keys.is_enabled() {
        return next.run(request).await;
    }

    match bearer_token(&request).and_then(|token| keys.authenticate(token)) {
        Some(principal) => {
            tracing::debug!(principal = %principal.id, "API key accepted");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        None => {
            tracing::warn!(path = %request.uri().path(), "Rejected request without a valid API key");
            GatewayError::Unauthorized.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate_labels_keys_by_position() {
        let keys = ApiKeys::new(vec!["alpha".to_string(), String::new(), "beta".to_string()]);
        assert!(keys.is_enabled());
        assert_eq!(keys.authenticate("beta").unwrap().id, "api-key-2");
        assert!(keys.authenticate("gamma").is_none());
    }

    #[test]
    fn test_bearer_token_parsing() {
        let request = Request::builder()
            .header(header::AUTHORIZATION, "Bearer secret ")
            .body(())
            .unwrap();
        assert_eq!(bearer_token(&request), Some("secret"));

        let basic = Request::builder()
            .header(header::AUTHORIZATION, "Basic abc")
            .body(())
            .unwrap();
        assert_eq!(bearer_token(&basic), None);
    }

    #[test]
    fn test_no_keys_means_disabled() {
        assert!(!ApiKeys::new(Vec::new()).is_enabled());
    }
}
