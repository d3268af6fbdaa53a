use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::security::auth::bearer_token;

#[derive(Debug)]
pub struct AdminKey(String);

impl AdminKey {
    pub fn new(key: String) -> Self {
        Self(key)
    }

    /// An empty configured key matches nothing.
    pub fn matches(&self, presented: &str) -> bool {
        !self.0.is_empty() && self.0 == presented
    }
}

pub async fn admin_auth_middleware(
    State(key): State<Arc<AdminKey>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    match bearer_token(&request) {
        Some(token) if key.matches(token) => Ok(next.run(request).await),
        _ => {
            tracing::warn!(path = %request.uri().path(), "Rejected admin request");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_never_matches() {
        assert!(!AdminKey::new(String::new()).matches(""));
        assert!(AdminKey::new("s3cret".into()).matches("s3cret"));
        assert!(!AdminKey::new("s3cret".into()).matches("S3CRET"));
    }
}
