// src/internal/server/_server.rs

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::internal::config::AppConfig;
use crate::internal::lmstudio::LmStudioClient;
use crate::internal::mcp::resources::default_registry;
use crate::internal::mcp::{McpProcessor, ResourceRegistry};
use crate::internal::server::handler::Handler;

/// Shared handles cloned into every request and WebSocket session.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<McpProcessor>,
    pub lm_client: Arc<LmStudioClient>,
}

/// Server owns the configuration, the read-only resource registry and the
/// LM Studio client, and serves the HTTP + WebSocket surface.
pub struct Server {
    pub config: AppConfig,
    registry: Arc<ResourceRegistry>,
    state: AppState,
}

impl Server {
    pub fn new(config: AppConfig) -> Result<Self> {
        let lm_client = Arc::new(
            LmStudioClient::new(&config.lm_studio).context("Failed to create LM Studio client")?,
        );
        let registry = Arc::new(
            default_registry(Arc::clone(&lm_client), chrono::Utc::now())
                .context("Failed to build resource registry")?,
        );
        let processor = Arc::new(McpProcessor::new(Arc::clone(&registry)));

        Ok(Self {
            config,
            registry,
            state: AppState {
                processor,
                lm_client,
            },
        })
    }

    /// Number of resources exposed over the MCP socket
    pub fn resource_count(&self) -> usize {
        self.registry.count()
    }

    pub fn router(&self) -> Router {
        Handler::new(self.config.cors.clone()).create_http_router(self.state.clone())
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .context("HTTP server failed")
    }

    /// Bind the configured address and serve until Ctrl+C or SIGTERM.
    pub async fn start_with_graceful_shutdown(&self) -> Result<()> {
        let addr = self.config.server.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to address: {}", addr))?;

        info!("HTTP server listening on {}", addr);
        info!("Endpoints:");
        info!("  - GET  http://{}/health - Health check", addr);
        info!("  - GET  ws://{}/mcp - MCP JSON-RPC WebSocket", addr);
        info!("  - GET  http://{}/lm/models - List LM Studio models", addr);
        info!("  - GET  http://{}/lm/selection - Current model selection", addr);
        info!("  - POST http://{}/lm/select - Select a model", addr);
        info!("  - POST http://{}/lm/chat - Chat completion", addr);
        info!("LM Studio upstream: {}", self.state.lm_client.base_url());

        self.serve(listener, shutdown_signal()).await
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}

// Helper function to create server with dependencies
pub fn create_server(config: AppConfig) -> Result<Server> {
    Server::new(config)
}
