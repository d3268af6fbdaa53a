//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Assemble shared state (session manager, forwarder, breaker)
//! - Build the Axum router and middleware stack
//! - Serve plain HTTP or TLS until shutdown is signalled

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{Request, StatusCode},
    middleware::{from_fn_with_state, map_response},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Environment, GatewayConfig, TlsConfig};
use crate::error::GatewayError;
use crate::health;
use crate::http::handlers;
use crate::http::request::{request_id, MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::{envelope_bare_errors, ApiError};
use crate::proxy::Forwarder;
use crate::resilience::{CircuitBreaker, ResilientTransport};
use crate::security::{cors::cors_layer, headers::with_security_headers};
use crate::security::{rate_limit_middleware, require_api_key, ApiKeys, RateLimiter};
use crate::session::{SessionManager, SessionStore};
use crate::upstream::{Credentials, UpstreamClient};

pub const API_PREFIX: &str = "/api/v1/gateway";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
    pub sessions: SessionManager,
    pub breaker: Arc<CircuitBreaker>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    /// Wire the upstream client, breaker, transport and session manager.
    ///
    /// One breaker and one transport serve both logins and forwarded calls.
    pub fn build(config: GatewayConfig, store: Arc<dyn SessionStore>) -> Result<Self, GatewayError> {
        let breaker = Arc::new(CircuitBreaker::from_config(&config.circuit_breaker));
        let transport = ResilientTransport::from_config(&config, breaker.clone());
        let client = UpstreamClient::new(&config.upstream, &config.timeouts)
            .map_err(|e| GatewayError::Internal(format!("failed to create upstream client: {}", e)))?;

        let sessions = SessionManager::new(
            store,
            client.clone(),
            transport.clone(),
            Credentials::from_config(&config.upstream),
            Duration::from_secs(config.session.ttl_secs),
        );
        let forwarder = Forwarder::new(sessions.clone(), client, transport);

        Ok(Self {
            forwarder,
            sessions,
            breaker,
            config: Arc::new(config),
        })
    }

    pub fn api_error(&self, error: GatewayError) -> ApiError {
        ApiError::new(error, self.config.expose_error_details())
    }
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl GatewayServer {
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// The full application, for serving or for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    fn api_routes(config: &GatewayConfig) -> Router<AppState> {
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let keys = Arc::new(ApiKeys::new(config.auth.api_keys.clone()));
        if !keys.is_enabled() {
            tracing::warn!("No API keys configured, gateway routes are open to any caller");
        }

        // Route layers: the last one added runs first, so auth precedes rate limiting.
        let protected = Router::new()
            .route("/quotations", post(handlers::create_quotation))
            .route(
                "/batch/create-quotation-and-get-partner",
                post(handlers::quotation_and_partner),
            )
            .route(
                "/{*path}",
                get(handlers::proxy_read)
                    .delete(handlers::proxy_read)
                    .post(handlers::proxy_write)
                    .patch(handlers::proxy_write),
            )
            .route_layer(from_fn_with_state(limiter.clone(), rate_limit_middleware))
            .route_layer(from_fn_with_state(keys, require_api_key));

        let public = Router::new()
            .route("/login", post(handlers::login))
            .route_layer(from_fn_with_state(limiter, rate_limit_middleware));

        public.merge(protected)
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let config = state.config.clone();

        let app = Router::new()
            .nest(API_PREFIX, Self::api_routes(&config))
            .route("/health", get(health::health_handler))
            .with_state(state);

        let production = config.environment == Environment::Production;
        with_security_headers(app, production)
            .layer(cors_layer(&config.cors, config.environment))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_size))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            path = %request.uri().path(),
                            request_id = %request_id(request),
                        )
                    }))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(map_response(envelope_bare_errors))
                    .layer(TimeoutLayer::with_status_code(
                        StatusCode::GATEWAY_TIMEOUT,
                        Duration::from_secs(config.listener.request_timeout_secs),
                    )),
            )
    }

    /// Serve on `listener` until a shutdown signal arrives.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gateway listening");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Gateway draining connections");
            })
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }

    /// Serve TLS on `addr` until a shutdown signal arrives.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: &TlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let rustls = axum_server::tls_rustls::RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;

        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        let grace = Duration::from_secs(self.config.listener.request_timeout_secs);
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Gateway draining connections");
            drain.graceful_shutdown(Some(grace));
        });

        tracing::info!(address = %addr, "Gateway listening (TLS)");
        axum_server::bind_rustls(addr, rustls)
            .handle(handle)
            .serve(self.router.into_make_service_with_connect_info::<SocketAddr>())
            .await?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

