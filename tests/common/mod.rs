//! Shared utilities for integration tests: a programmable mock upstream.
//!
//! The mock mimics the upstream's session protocol: `POST /b1s/v1/Login`
//! issues `B1SESSION` and `ROUTEID` cookies, and every other resource answers
//! 401 unless the request carries the most recently issued session.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, post},
    Router,
};
use async_trait::async_trait;
use tokio::net::TcpListener;

use service_layer_gateway::config::{Environment, GatewayConfig, SessionBackend};
use service_layer_gateway::error::GatewayError;
use service_layer_gateway::session::{MemorySessionStore, SessionStore};
use service_layer_gateway::AppState;

/// What the mock saw for one resource request.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub cookie: Option<String>,
    pub body: String,
}

pub type Responder = Box<dyn Fn(&SeenRequest, &MockState) -> (u16, String) + Send + Sync>;

pub struct MockState {
    pub logins: AtomicU32,
    pub requests: AtomicU32,
    pub login_delay_ms: AtomicU64,
    pub login_status: AtomicU16,
    pub issue_cookies: AtomicBool,
    current_session: Mutex<Option<String>>,
    responder: Mutex<Responder>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl MockState {
    /// Whether the request carries the session issued by the latest login.
    pub fn has_valid_session(&self, request: &SeenRequest) -> bool {
        let current = self.current_session.lock().unwrap();
        match (&*current, &request.cookie) {
            (Some(session), Some(cookie)) => cookie.split("; ").any(|pair| pair == session),
            _ => false,
        }
    }

    /// Invalidate every issued session, as an upstream timeout would.
    pub fn expire_sessions(&self) {
        *self.current_session.lock().unwrap() = None;
    }
}

#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    pub state: Arc<MockState>,
}

impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}/b1s/v1", self.addr)
    }

    pub fn logins(&self) -> u32 {
        self.state.logins.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> u32 {
        self.state.requests.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.state.seen.lock().unwrap().clone()
    }

    pub fn set_login_delay(&self, delay: Duration) {
        self.state
            .login_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_login_status(&self, status: u16) {
        self.state.login_status.store(status, Ordering::SeqCst);
    }

    pub fn set_issue_cookies(&self, issue: bool) {
        self.state.issue_cookies.store(issue, Ordering::SeqCst);
    }

    pub fn respond_with<F>(&self, responder: F)
    where
        F: Fn(&SeenRequest, &MockState) -> (u16, String) + Send + Sync + 'static,
    {
        *self.state.responder.lock().unwrap() = Box::new(responder);
    }

    pub fn expire_sessions(&self) {
        self.state.expire_sessions();
    }
}

/// Session-checked default behaviour for the resources the tests use.
pub fn default_responder(request: &SeenRequest, state: &MockState) -> (u16, String) {
    if !state.has_valid_session(request) {
        return (401, r#"{"error":{"code":301,"message":"Invalid session."}}"#.to_string());
    }

    if request.method == Method::POST && request.path == "SalesQuotation" {
        let card_code = serde_json::from_str::<serde_json::Value>(&request.body)
            .ok()
            .and_then(|v| v["CardCode"].as_str().map(str::to_string))
            .unwrap_or_default();
        return (
            201,
            serde_json::json!({ "DocEntry": 101, "CardCode": card_code }).to_string(),
        );
    }

    if let Some(code) = request
        .path
        .strip_prefix("BusinessPartners('")
        .and_then(|rest| rest.strip_suffix("')"))
    {
        return (
            200,
            serde_json::json!({ "CardCode": code, "CardName": "Acme Corp" }).to_string(),
        );
    }

    (
        200,
        serde_json::json!({ "method": request.method.as_str(), "path": request.path }).to_string(),
    )
}

async fn login(State(state): State<Arc<MockState>>) -> Response {
    let n = state.logins.fetch_add(1, Ordering::SeqCst) + 1;

    let delay = state.login_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let status = state.login_status.load(Ordering::SeqCst);
    if status != 200 {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, r#"{"error":{"code":100000027,"message":"Login failed"}}"#).into_response();
    }

    let session = format!("B1SESSION=session-{}", n);
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if state.issue_cookies.load(Ordering::SeqCst) {
        *state.current_session.lock().unwrap() = Some(session.clone());
        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_str(&format!("{}; HttpOnly; Path=/b1s/v1", session)).unwrap(),
        );
        headers.append(
            header::SET_COOKIE,
            HeaderValue::from_static("ROUTEID=.node1; path=/b1s"),
        );
    }

    (
        StatusCode::OK,
        headers,
        format!(r#"{{"SessionId":"session-{}","SessionTimeout":30}}"#, n),
    )
        .into_response()
}

async fn resource(
    State(state): State<Arc<MockState>>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);

    let request = SeenRequest {
        method,
        path,
        query,
        cookie: headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    state.seen.lock().unwrap().push(request.clone());

    let (status, body) = (state.responder.lock().unwrap())(&request, &state);
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

/// Start the mock on an ephemeral port.
pub async fn start_mock_upstream() -> MockUpstream {
    let state = Arc::new(MockState {
        logins: AtomicU32::new(0),
        requests: AtomicU32::new(0),
        login_delay_ms: AtomicU64::new(0),
        login_status: AtomicU16::new(200),
        issue_cookies: AtomicBool::new(true),
        current_session: Mutex::new(None),
        responder: Mutex::new(Box::new(default_responder)),
        seen: Mutex::new(Vec::new()),
    });

    let app = Router::new()
        .route("/b1s/v1/Login", post(login))
        .route("/b1s/v1/{*path}", any(resource))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockUpstream { addr, state }
}

/// Gateway config pointed at the mock, with short backoff and no rate limit.
pub fn test_config(upstream: &MockUpstream) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.environment = Environment::Development;
    config.upstream.base_url = upstream.base_url();
    config.upstream.tenant = "SBODEMO".to_string();
    config.upstream.username = "manager".to_string();
    config.upstream.password = "secret".to_string();
    config.session.backend = SessionBackend::Memory;
    config.timeouts.request_secs = 5;
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 50;
    config.rate_limit.enabled = false;
    config
}

pub fn gateway_state(config: GatewayConfig) -> AppState {
    AppState::build(config, Arc::new(MemorySessionStore::new())).unwrap()
}

/// A session store whose backend is down: every operation fails.
#[derive(Debug, Default)]
pub struct UnreachableStore {
    gets: AtomicU32,
    puts: AtomicU32,
}

impl UnreachableStore {
    pub fn gets(&self) -> u32 {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> u32 {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionStore for UnreachableStore {
    async fn get(&self) -> Result<Option<String>, GatewayError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Err(GatewayError::StoreUnavailable("Connection refused (os error 111)".into()))
    }

    async fn put(&self, _token: &str, _ttl: Duration) -> Result<(), GatewayError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        Err(GatewayError::StoreUnavailable("Connection refused (os error 111)".into()))
    }

    async fn ping(&self) -> Result<(), GatewayError> {
        Err(GatewayError::StoreUnavailable("Connection refused (os error 111)".into()))
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
