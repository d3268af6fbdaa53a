//! Forwarding with transparent re-authentication.
//!
//! ```text
//! forward(request):
//!     validate                      (no session work for a bad request)
//!     ensure_session
//!     token = store.get             (absent → NoSessionAvailable)
//!     response = call(token)
//!     if response is 401:
//!         force_reauthenticate(token)
//!         response = call(store.get)
//!     return response               (a second 401 is returned as-is)
//! ```

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::proxy::request::ProxyRequest;
use crate::resilience::ResilientTransport;
use crate::session::SessionManager;
use crate::upstream::{UpstreamClient, UpstreamResponse};

/// Anything that can run a `ProxyRequest` against the upstream.
#[async_trait]
pub trait Forward: Send + Sync {
    async fn forward(&self, request: &ProxyRequest) -> Result<UpstreamResponse, GatewayError>;
}

#[derive(Clone)]
pub struct Forwarder {
    sessions: SessionManager,
    client: UpstreamClient,
    transport: ResilientTransport,
}

impl Forwarder {
    pub fn new(sessions: SessionManager, client: UpstreamClient, transport: ResilientTransport) -> Self {
        Self {
            sessions,
            client,
            transport,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn client(&self) -> &UpstreamClient {
        &self.client
    }

    async fn session_token(&self) -> Result<String, GatewayError> {
        self.sessions
            .current_token()
            .await?
            .ok_or(GatewayError::NoSessionAvailable)
    }

    async fn call(&self, request: &ProxyRequest, token: &str) -> Result<UpstreamResponse, GatewayError> {
        let client = &self.client;
        self.transport
            .execute(request.method.as_str(), || {
                client.send(&request.method, &request.path, Some(token), request.body.as_ref())
            })
            .await
    }
}

#[async_trait]
impl Forward for Forwarder {
    async fn forward(&self, request: &ProxyRequest) -> Result<UpstreamResponse, GatewayError> {
        request.validate()?;

        self.sessions.ensure_session().await?;
        let token = self.session_token().await?;

        let response = self.call(request, &token).await?;
        if !response.is_session_invalidated() {
            return Ok(response);
        }

        tracing::info!(
            method = %request.method,
            path = %request.path,
            "Session rejected by upstream, retrying once with a fresh session"
        );
        self.sessions.force_reauthenticate(&token).await?;
        let token = self.session_token().await?;

        let response = self.call(request, &token).await?;
        if response.is_session_invalidated() {
            tracing::warn!(
                path = %request.path,
                "Upstream rejected the fresh session as well"
            );
        }
        Ok(response)
    }
}
