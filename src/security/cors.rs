//! Cross-origin policy.

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::{CorsConfig, Environment};
use crate::http::request::X_REQUEST_ID;

pub fn cors_layer(config: &CorsConfig, environment: Environment) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        if environment == Environment::Development {
            tracing::warn!("No CORS origins configured, allowing any origin (development)");
            return CorsLayer::permissive();
        }
        tracing::info!("No CORS origins configured, cross-origin requests are refused");
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, X_REQUEST_ID])
        .expose_headers([X_REQUEST_ID])
        .allow_credentials(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use tower::ServiceExt;

    fn app(config: &CorsConfig, environment: Environment) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(cors_layer(config, environment))
    }

    #[tokio::test]
    async fn test_listed_origin_is_allowed() {
        let config = CorsConfig {
            allowed_origins: vec!["https://app.example.com".to_string()],
        };
        let response = app(&config, Environment::Production)
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "https://app.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://app.example.com"
        );
    }

    #[tokio::test]
    async fn test_unlisted_origin_gets_no_allow_header() {
        let config = CorsConfig {
            allowed_origins: vec!["https://app.example.com".to_string()],
        };
        let response = app(&config, Environment::Production)
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "https://evil.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
