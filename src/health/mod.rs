//! Liveness and readiness reporting.
//!
//! The gateway is healthy when its session store answers and the upstream
//! accepts connections. The probe goes straight to the upstream and bypasses
//! the breaker, so health checks never trip or reset it. The breaker state is
//! reported but does not fail the check.

use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::server::AppState;
use crate::resilience::timeouts::with_deadline;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub store: StoreHealth,
    pub upstream: UpstreamHealth,
    pub circuit: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub backend: &'static str,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpstreamHealth {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.store.reachable && self.upstream.reachable
    }
}

async fn check_upstream(state: &AppState) -> UpstreamHealth {
    let deadline = Duration::from_secs(state.config.timeouts.connect_secs);
    match with_deadline(deadline, state.forwarder.client().probe()).await {
        Ok(response) => UpstreamHealth {
            reachable: true,
            status: Some(response.status.as_u16()),
            error: None,
        },
        Err(e) => UpstreamHealth {
            reachable: false,
            status: None,
            error: Some(e.to_string()),
        },
    }
}

pub async fn check(state: &AppState) -> HealthReport {
    let store = state.sessions.store();
    let (ping, upstream) = tokio::join!(store.ping(), check_upstream(state));

    let store = StoreHealth {
        backend: store.backend_name(),
        reachable: ping.is_ok(),
        error: ping.err().map(|e| e.to_string()),
    };

    let mut report = HealthReport {
        status: "healthy",
        store,
        upstream,
        circuit: state.breaker.state().as_str(),
    };
    if !report.is_healthy() {
        report.status = "unhealthy";
    }
    report
}

pub async fn health_handler(State(state): State<AppState>) -> Response {
    let report = check(&state).await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        tracing::warn!(
            store_error = ?report.store.error,
            upstream_error = ?report.upstream.error,
            "Health check failed"
        );
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}
