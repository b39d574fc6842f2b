//! Lineage Server
//!
//! REST API for family trees: CRUD on trees and members, plus the
//! relationship endpoint that runs every edge change through the domain's
//! relationship editor.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;

pub use error::{AppError, ServerError};

use axum::http::{header, Method};
use config::ServerConfig;
use handlers::{create_router, AppState};
use lineage_store::SqliteStore;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_err()
    {
        debug!("Tracing subscriber already installed");
    }
}

/// Build the CORS layer for the browser client
///
/// An empty origin list allows any origin.
pub fn cors_layer(config: &ServerConfig) -> Result<CorsLayer, config::ConfigError> {
    let origins = config.allowed_origins()?;
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]))
}

/// Start the HTTP server
///
/// Opens the store, builds the router and serves until Ctrl+C.
pub async fn start_server(config: ServerConfig) -> Result<(), ServerError> {
    init_tracing(&config.log_level);
    config.validate()?;

    info!("Starting Lineage server");
    info!("Bind address: {}", config.bind_addr());
    info!("Database: {}", config.database_path.display());

    let store = SqliteStore::new(&config.database_path)?;
    info!("Stored trees: {}", store.tree_count()?);

    let app = create_router(AppState::new(store)).layer(cors_layer(&config)?);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config() {
        let config = ServerConfig::default_test_config();
        assert_eq!(config.bind_port, 0);
        assert!(cors_layer(&config).is_ok());
    }

    #[test]
    fn test_cors_with_origins() {
        let config = ServerConfig {
            cors_allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "https://trees.example.org".to_string(),
            ],
            ..ServerConfig::default()
        };
        assert!(cors_layer(&config).is_ok());
    }
}
