//! Proxy request model.

use axum::http::Method;
use bytes::Bytes;
use serde::Serialize;

use crate::error::GatewayError;

/// One call to forward: a method, a path relative to the upstream base URL
/// (query string allowed), and an optional JSON body.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Bytes>,
}

pub fn is_write_method(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

impl ProxyRequest {
    pub fn new(method: Method, path: impl Into<String>, body: Option<Bytes>) -> Result<Self, GatewayError> {
        let request = Self {
            method,
            path: path.into(),
            body,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn get(path: impl Into<String>) -> Result<Self, GatewayError> {
        Self::new(Method::GET, path, None)
    }

    pub fn post(path: impl Into<String>, body: Bytes) -> Result<Self, GatewayError> {
        Self::new(Method::POST, path, Some(body))
    }

    pub fn post_json<T: Serialize>(path: impl Into<String>, payload: &T) -> Result<Self, GatewayError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| GatewayError::Internal(format!("failed to serialize request body: {}", e)))?;
        Self::post(path, Bytes::from(body))
    }

    /// Checked again by the forwarder, before any session work.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.path.trim().is_empty() {
            return Err(GatewayError::Validation("Path parameter is required".to_string()));
        }
        if self.path.chars().any(char::is_control) {
            return Err(GatewayError::Validation(
                "Path must not contain control characters".to_string(),
            ));
        }
        if self.body.is_some() && !is_write_method(&self.method) {
            return Err(GatewayError::Validation(format!(
                "{} requests cannot carry a body",
                self.method
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_path_is_rejected() {
        for path in ["", "   ", "\t"] {
            let err = ProxyRequest::get(path).unwrap_err();
            assert_eq!(err.to_string(), "Path parameter is required");
        }
    }

    #[test]
    fn test_body_only_on_write_methods() {
        assert!(ProxyRequest::new(Method::GET, "Items", Some(Bytes::from_static(b"{}"))).is_err());
        assert!(ProxyRequest::new(Method::PATCH, "Items('A1')", Some(Bytes::from_static(b"{}"))).is_ok());
        assert!(ProxyRequest::new(Method::DELETE, "Items('A1')", None).is_ok());
    }

    #[test]
    fn test_post_json_serializes_payload() {
        let request = ProxyRequest::post_json("Orders", &serde_json::json!({ "CardCode": "C001" })).unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.body.unwrap(), Bytes::from_static(br#"{"CardCode":"C001"}"#));
    }
}
