//! HTTP server for the SOP guide

pub mod routes;
pub mod state;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::pipeline::QueryPipeline;
pub use state::AppState;

/// SOP guide HTTP server
pub struct RagServer {
    state: AppState,
}

impl RagServer {
    /// Create a server around a loaded pipeline, probing the hosted services once
    pub async fn new(config: RagConfig, pipeline: QueryPipeline) -> Self {
        let health = pipeline.health_check().await;
        if !health.embedder || !health.model {
            tracing::warn!(
                "Hosted services not fully reachable (embedder: {}, model: {}); requests may fail",
                health.embedder,
                health.model
            );
        }

        let state = AppState::new(config, pipeline);
        state.set_ready(true);
        Self { state }
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.router();

        tracing::info!("Starting SOP guide server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        self.state.config().server.address()
    }
}

/// Router over an existing state; CORS is applied when enabled in the config
pub fn build_router(state: AppState) -> Router {
    let server = &state.config().server;
    let max_upload_size = server.max_upload_size;
    let enable_cors = server.enable_cors;

    let router = Router::new()
        // Health check
        .route("/health", get(health_check))
        .route("/ready", get(readiness))
        // API routes with body limit for image uploads
        .nest("/api", routes::api_routes(max_upload_size))
        .with_state(state)
        // Middleware layers (order matters - applied bottom to top)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router.layer(cors)
    } else {
        router
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let status = if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let index = state.pipeline().index();
    (
        status,
        Json(json!({
            "ready": state.is_ready(),
            "index_entries": index.len(),
            "started_at": state.started_at(),
        })),
    )
}
