use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::response::ApiResponse;
use crate::http::server::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub environment: &'static str,
    pub upstream: String,
    pub session_backend: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitStatus {
    pub state: &'static str,
    pub consecutive_failures: u32,
    pub failure_threshold: u32,
    pub cooldown_secs: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub active: bool,
    pub backend: &'static str,
    pub ttl_secs: u64,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        environment: state.config.environment.as_str(),
        upstream: state.config.upstream.base_url.clone(),
        session_backend: state.sessions.store().backend_name(),
    })
}

pub async fn get_circuit(State(state): State<AppState>) -> Json<CircuitStatus> {
    let breaker = &state.breaker;
    Json(CircuitStatus {
        state: breaker.state().as_str(),
        consecutive_failures: breaker.consecutive_failures(),
        failure_threshold: breaker.failure_threshold(),
        cooldown_secs: breaker.cooldown().as_secs(),
    })
}

pub async fn get_session(State(state): State<AppState>) -> Response {
    match state.sessions.has_session().await {
        Ok(active) => Json(SessionStatus {
            active,
            backend: state.sessions.store().backend_name(),
            ttl_secs: state.sessions.ttl().as_secs(),
        })
        .into_response(),
        Err(e) => state.api_error(e).into_response(),
    }
}

/// Replace the shared session with a fresh login.
pub async fn refresh_session(State(state): State<AppState>) -> Response {
    tracing::info!("Session refresh requested through admin API");
    match state.sessions.login().await {
        Ok(()) => ApiResponse::success(serde_json::json!({ "message": "Session refreshed" })).into_response(),
        Err(e) => state.api_error(e).into_response(),
    }
}
