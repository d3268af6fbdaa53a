//! Gateway error taxonomy.
//!
//! Every failure a request can run into is one of these variants. The HTTP
//! layer maps them onto status codes and the JSON envelope in
//! `http::response`; nothing below the HTTP layer knows about responses.

use axum::http::StatusCode;

/// Why the upstream could not be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFailure {
    /// The circuit breaker rejected the call without contacting the upstream.
    CircuitOpen,
    /// Every permitted attempt failed transiently.
    RetriesExhausted { attempts: u32, last_error: String },
}

impl std::fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamFailure::CircuitOpen => write!(f, "circuit breaker is open"),
            UpstreamFailure::RetriesExhausted {
                attempts,
                last_error,
            } => write!(f, "gave up after {} attempts ({})", attempts, last_error),
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    /// Malformed inbound request; never reaches the upstream.
    #[error("{0}")]
    Validation(String),

    /// Inbound caller is not authorized to use the gateway.
    #[error("unauthorized")]
    Unauthorized,

    /// Upstream rejected the session. Handled by the forwarder.
    #[error("upstream rejected the session")]
    SessionInvalidated,

    /// Upstream rejected the credentials or returned no session artifact.
    #[error("upstream login failed: {0}")]
    LoginFailed(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(UpstreamFailure),

    #[error("session store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store reported no session right after one was established.
    #[error("no session available after login")]
    NoSessionAvailable,

    #[error("composite step '{step}' failed: {reason}")]
    CompositeStepFailed {
        step: String,
        status: Option<u16>,
        reason: String,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::SessionInvalidated => StatusCode::BAD_GATEWAY,
            GatewayError::LoginFailed(_) => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamUnavailable(UpstreamFailure::CircuitOpen) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::UpstreamUnavailable(UpstreamFailure::RetriesExhausted { .. }) => {
                StatusCode::BAD_GATEWAY
            }
            GatewayError::StoreUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::NoSessionAvailable => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::CompositeStepFailed { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to callers in any environment.
    pub fn public_message(&self) -> String {
        match self {
            GatewayError::Validation(message) => message.clone(),
            GatewayError::Unauthorized => "Unauthorized access.".to_string(),
            GatewayError::SessionInvalidated | GatewayError::LoginFailed(_) => {
                "Unable to establish a session with the upstream service.".to_string()
            }
            GatewayError::UpstreamUnavailable(UpstreamFailure::CircuitOpen) => {
                "Upstream service is temporarily unavailable.".to_string()
            }
            GatewayError::UpstreamUnavailable(_) => {
                "Error communicating with external service.".to_string()
            }
            GatewayError::CompositeStepFailed { .. } => {
                "Failed to complete batch operation with upstream service.".to_string()
            }
            GatewayError::StoreUnavailable(_)
            | GatewayError::NoSessionAvailable
            | GatewayError::Internal(_) => "An internal server error occurred.".to_string(),
        }
    }

    /// Whether the full error text adds anything beyond the public message.
    pub fn has_details(&self) -> bool {
        !matches!(self, GatewayError::Validation(_) | GatewayError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatewayError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::LoginFailed("denied".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GatewayError::UpstreamUnavailable(UpstreamFailure::CircuitOpen).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            GatewayError::StoreUnavailable("refused".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_public_message_hides_internals() {
        let err = GatewayError::StoreUnavailable("Connection refused (os error 111)".into());
        assert!(!err.public_message().contains("os error"));
        assert!(err.to_string().contains("os error"));
    }
}
