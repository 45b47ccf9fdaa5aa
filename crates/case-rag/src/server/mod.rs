//! HTTP server for uploading a case and asking questions about it

pub mod routes;
pub mod state;

use axum::{extract::State, http::StatusCode, routing::get, Router};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
pub use state::{ActiveDocument, AppState};

/// Case Q&A HTTP server
pub struct RagServer {
    config: RagConfig,
    state: AppState,
}

impl RagServer {
    /// Create a server over prepared state
    pub fn new(config: RagConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Create a server with the default providers
    pub fn from_config(config: RagConfig, api_key: impl Into<String>) -> Result<Self> {
        let state = AppState::from_config(config.clone(), api_key)?;
        Ok(Self::new(config, state))
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        router(self.state.clone(), &self.config)
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.build_router();

        tracing::info!("Starting case Q&A server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind {}: {}", addr, e)))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Shutting down; waiting for in-flight requests");
                }
            })
            .await
            .map_err(|e| Error::internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Shared application state
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Build the application router
pub fn router(state: AppState, config: &RagConfig) -> Router {
    let router = Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        .nest("/api", routes::api_routes(config.server.max_upload_size))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if config.server.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Ready once a document has been indexed
async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.active().is_some() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
