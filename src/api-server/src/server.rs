//! HTTP server setup and lifecycle management
//!
//! This module handles:
//! - Router construction (fatal on a missing operation binding)
//! - TCP listener setup
//! - Graceful shutdown on signals (SIGTERM, SIGINT)

use crate::{routes, state::AppState};
use anyhow::{Context, Result};
use axum::Router;
use std::future::Future;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Requests running longer than this are cancelled with 408
    pub request_timeout: Duration,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
        }
    }
}

/// HTTP server instance
pub struct Server {
    config: ServerConfig,
    router: Router,
}

impl Server {
    /// Create a server, resolving every protected route against the registry
    pub fn new(config: ServerConfig, state: AppState) -> Result<Self> {
        let router = routes::create_router(state, &config)
            .context("Failed to bind protected operations")?;

        Ok(Self { config, router })
    }

    /// Bind the configured address and serve until SIGINT or SIGTERM
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind to {}", addr))?;

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr()?;
        info!("Server listening on http://{}", local_addr);
        info!("API documentation available at http://{}/api-docs", local_addr);
        info!("Health check endpoint: http://{}/health", local_addr);
        info!("Metrics endpoint: http://{}/metrics", local_addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .context("Server error")?;

        info!("Server shutdown complete");
        Ok(())
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Wait for shutdown signal
///
/// Listens for:
/// - SIGTERM (kill command, docker stop, kubernetes)
/// - SIGINT (Ctrl+C)
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
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}

/// Builder for creating a server with custom configuration
pub struct ServerBuilder {
    config: ServerConfig,
    state: Option<AppState>,
}

impl ServerBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            state: None,
        }
    }

    /// Set the host to bind to
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the port to listen on
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Set the allowed CORS origins
    pub fn cors_origins(mut self, origins: Vec<String>) -> Self {
        self.config.cors_origins = origins;
        self
    }

    /// Set the application state
    pub fn state(mut self, state: AppState) -> Self {
        self.state = Some(state);
        self
    }

    /// Build the server
    pub fn build(self) -> Result<Server> {
        let state = self.state.context("Application state is required")?;

        Server::new(self.config, state)
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolegate_authz::{AuthorizationEngine, InMemoryUserStore, PolicyRegistry};
    use std::sync::Arc;

    fn state_with(registry: PolicyRegistry) -> AppState {
        AppState::new(AuthorizationEngine::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(registry),
        ))
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.cors_origins.is_empty());
    }

    #[test]
    fn test_server_builder() {
        let server = ServerBuilder::new()
            .host("127.0.0.1")
            .port(9090)
            .request_timeout(Duration::from_secs(60))
            .cors_origins(vec!["https://localhost:7015".to_string()])
            .state(state_with(routes::build_registry(&[]).unwrap()))
            .build()
            .unwrap();

        assert_eq!(server.config().host, "127.0.0.1");
        assert_eq!(server.config().port, 9090);
        assert_eq!(server.config().request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_server_builder_missing_state() {
        let result = ServerBuilder::new().build();
        assert!(result.is_err());
        assert!(result.err().unwrap().to_string().contains("state"));
    }

    #[test]
    fn test_server_builder_unbound_operation() {
        let result = ServerBuilder::new()
            .state(state_with(PolicyRegistry::builder().build().unwrap()))
            .build();

        assert!(result.is_err());
    }
}
