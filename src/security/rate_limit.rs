//! Fixed-window rate limiting per caller.
//!
//! The caller is the authenticated principal when there is one, otherwise the
//! client IP. Each caller gets `permit_limit` requests per window; the window
//! restarts on the first request after it ends.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use tokio::time::Instant;

use crate::config::RateLimitConfig;
use crate::observability::metrics;
use crate::security::auth::Principal;

/// Windows are pruned once the table grows past this many callers.
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    enabled: bool,
    permit_limit: u32,
    window: Duration,
    windows: DashMap<String, Window>,
}

impl RateLimiter {
    pub fn new(enabled: bool, permit_limit: u32, window: Duration) -> Self {
        Self {
            enabled,
            permit_limit,
            window,
            windows: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.enabled,
            config.permit_limit,
            Duration::from_secs(config.window_secs),
        )
    }

    /// Count one request. `Err` carries the wait until the window resets.
    pub fn check(&self, key: &str) -> Result<(), Duration> {
        if !self.enabled {
            return Ok(());
        }
        if self.windows.len() > PRUNE_THRESHOLD {
            self.prune();
        }

        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.duration_since(entry.started);
        if elapsed >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count < self.permit_limit {
            entry.count += 1;
            Ok(())
        } else {
            Err(self.window.saturating_sub(now.duration_since(entry.started)))
        }
    }

    fn prune(&self) {
        let window = self.window;
        self.windows.retain(|_, w| w.started.elapsed() < window);
    }
}

fn client_key(request: &Request<Body>) -> String {
    if let Some(principal) = request.extensions().get::<Principal>() {
        return principal.id.clone();
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&request);

    match limiter.check(&key) {
        Ok(()) => next.run(request).await,
        Err(wait) => {
            let retry_after = wait.as_secs_f64().ceil().max(1.0) as u64;
            tracing::warn!(client = %key, retry_after, "Rate limit exceeded");
            metrics::record_rate_limited("fixed_window");

            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "Too many requests. Please try again later.",
                    "retryAfter": retry_after,
                })),
            )
                .into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            response
        }
    }
}
