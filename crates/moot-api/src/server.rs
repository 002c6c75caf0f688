//! Moot API server with graceful shutdown

use axum::{middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::compression::CompressionLayer;

use crate::error::ApiError;
use crate::middleware::{
    body_limit_layer, cors_layer, request_id_middleware, timeout_layer, tracing_middleware,
};
use crate::routes::api_router;
use crate::state::AppState;
use moot_debate::DebateService;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Whole-request timeout; a turn makes several LLM calls
    pub timeout: Duration,
    /// Max request body size (bytes)
    pub max_body_size: usize,
    pub compression: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            timeout: Duration::from_secs(120),
            max_body_size: 64 * 1024,
            compression: true,
        }
    }
}

impl ServerConfig {
    /// Reads `MOOT_PORT` (falling back to `PORT`) and `MOOT_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port: u16 = std::env::var("MOOT_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.addr.port());

        let timeout_secs: u64 = std::env::var("MOOT_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(defaults.timeout.as_secs());

        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], port)),
            timeout: Duration::from_secs(timeout_secs),
            ..defaults
        }
    }
}

pub struct MootServer {
    config: ServerConfig,
    app_state: AppState,
}

impl MootServer {
    pub fn new(config: ServerConfig, service: Arc<DebateService>) -> Self {
        Self {
            config,
            app_state: AppState::new(service),
        }
    }

    /// The fully layered router
    pub fn router(&self) -> Router {
        let app = api_router(self.app_state.clone())
            .layer(body_limit_layer(self.config.max_body_size))
            .layer(timeout_layer(self.config.timeout))
            .layer(cors_layer())
            .layer(middleware::from_fn(tracing_middleware))
            // Outside tracing so the span can see the id
            .layer(middleware::from_fn(request_id_middleware));

        if self.config.compression {
            app.layer(CompressionLayer::new())
        } else {
            app
        }
    }

    /// Serve until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<(), ApiError> {
        let app = self.router();
        let addr = self.config.addr;

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to bind {}: {}", addr, e)))?;
        tracing::info!(%addr, "Moot API listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    pub fn state(&self) -> &AppState {
        &self.app_state
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Initialize the tracing subscriber (`RUST_LOG` overrides the default filter)
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,moot=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.addr.port(), 8000);
        assert_eq!(config.timeout, Duration::from_secs(120));
    }
}
