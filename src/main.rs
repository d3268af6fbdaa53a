//! Session-sharing upstream gateway.
//!
//! ```text
//!     Client ──▶ http (auth, rate limit, envelope)
//!                  │
//!                  ▼
//!                proxy::Forwarder ──▶ session::SessionManager ──▶ SessionStore (Redis)
//!                  │                        │ single-flight login
//!                  ▼                        ▼
//!                resilience::ResilientTransport (breaker, deadline, retry)
//!                  │
//!                  ▼
//!                upstream::UpstreamClient ──▶ Upstream service
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use service_layer_gateway::admin::setup_admin_router;
use service_layer_gateway::config::loader::{load_config, load_from_env};
use service_layer_gateway::lifecycle::{signals, startup};
use service_layer_gateway::observability::{logging, metrics};
use service_layer_gateway::{GatewayServer, Shutdown};

#[derive(Parser)]
#[command(name = "service-layer-gateway")]
#[command(about = "Session-sharing gateway for a single-login upstream service", long_about = None)]
struct Cli {
    /// TOML configuration file. Without one, defaults plus environment variables are used.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "service-layer-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = config.environment.as_str(),
        request_timeout_secs = config.timeouts.request_secs,
        max_attempts = config.retries.max_attempts,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let state = startup::build_state(config).await?;
    let config = state.config.clone();

    let shutdown = Shutdown::new();
    let mut tasks = Vec::new();

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");
        let app = setup_admin_router(state.clone());
        let mut rx = shutdown.subscribe();
        tasks.push(tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.recv().await;
                })
                .await
        }));
    }

    let server = GatewayServer::new(state);
    let rx = shutdown.subscribe();
    let mut main_server = match &config.listener.tls {
        Some(tls) => {
            let addr: SocketAddr = config.listener.bind_address.parse()?;
            let tls = tls.clone();
            tokio::spawn(async move { server.run_tls(addr, &tls, rx).await })
        }
        None => {
            let listener = TcpListener::bind(&config.listener.bind_address).await?;
            tokio::spawn(async move { server.run(listener, rx).await })
        }
    };

    tokio::select! {
        _ = signals::wait_for_signal() => {
            shutdown.trigger();
            main_server.await??;
        }
        result = &mut main_server => {
            tracing::error!("Gateway listener exited unexpectedly");
            shutdown.trigger();
            result??;
        }
    }
    for task in tasks {
        task.await??;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
