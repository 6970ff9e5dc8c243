//! HTTP server for the ingestion pipeline

pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, VectorIndex};
use crate::types::HealthResponse;
use state::AppState;

/// Ingestion HTTP server
pub struct IngestServer {
    state: AppState,
}

impl IngestServer {
    /// Create a server from a config and concrete providers.
    pub fn new(
        config: IngestConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        let state = AppState::new(config, embedder, index);
        Self { state }
    }

    /// Shared state, for callers that drive the pipeline directly.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Get the server address
    pub fn address(&self) -> String {
        let server = &self.state.config().server;
        format!("{}:{}", server.host, server.port)
    }

    /// Bind and serve until the process is stopped.
    pub async fn start(self) -> Result<()> {
        let server = &self.state.config().server;
        let addr: SocketAddr = format!("{}:{}", server.host, server.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        self.state.spawn_progress_eviction();
        let router = build_router(self.state);

        tracing::info!("Starting ingest server on http://{}", addr);
        tracing::info!("API documentation: http://{}/api/info", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }
}

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    // CORS layer - must be added first (outermost)
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload = state.config().server.max_upload_bytes();

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // API routes with body limit for multipart uploads
        .nest("/api", routes::api_routes(max_upload))
        .with_state(state)
        // Middleware layers (order matters - applied bottom to top)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "session-rag".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        index_backend: state.index().name().to_string(),
        embedding_model: state.config().embedding.model.clone(),
        jobs_tracked: state.tracker().len(),
    })
}
