//! Admin API, served on its own bind address.
//!
//! Every route requires `Authorization: Bearer <admin.api_key>`.

pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::{admin_auth_middleware, AdminKey};
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    let key = Arc::new(AdminKey::new(state.config.admin.api_key.clone()));
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/circuit", get(get_circuit))
        .route("/admin/session", get(get_session))
        .route("/admin/session/refresh", post(refresh_session))
        .layer(middleware::from_fn_with_state(key, admin_auth_middleware))
        .with_state(state)
}
