//! Ingest server binary
//!
//! Run with: cargo run -p session-rag --bin session-rag-server

use std::sync::Arc;

use session_rag::config::{IndexBackend, IngestConfig};
use session_rag::providers::{
    EmbeddingProvider, MemoryVectorIndex, OpenAiEmbedder, QdrantIndex, ScopeField, VectorIndex,
};
use session_rag::server::IngestServer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                     Session RAG Ingest                    ║
║        Document Ingestion & Vector Indexing Service       ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let config = IngestConfig::from_env()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embedding.model);
    tracing::info!("  - Embedding dimensions: {}", config.embedding.dimensions);
    tracing::info!("  - Index backend: {:?}", config.index.backend);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);

    // Wire up providers
    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(OpenAiEmbedder::from_env(&config.embedding)?);
    let index: Arc<dyn VectorIndex> = match config.index.backend {
        IndexBackend::Memory => Arc::new(MemoryVectorIndex::new()),
        IndexBackend::Qdrant => Arc::new(QdrantIndex::new(&config.index)?),
    };

    // Probe the embedding service
    tracing::info!("Checking embedding service at {}...", config.embedding.base_url);
    match embedder.health_check().await {
        Ok(true) => tracing::info!("Embedding service is reachable"),
        _ => {
            tracing::warn!(
                "Embedding service not reachable at {}",
                config.embedding.base_url
            );
            tracing::warn!("Uploads will fail at the vectorizing stage until it comes back");
        }
    }

    // Prepare the collection and payload indexes before the first upload
    let scopes = [ScopeField::FileId, ScopeField::SessionId];
    if let Err(e) = index.ensure_index(config.embedding.dimensions, &scopes).await {
        tracing::warn!("Could not prepare '{}' index at startup: {}", index.name(), e);
        tracing::warn!("Index creation is retried as each upload finalizes");
    }

    // Create and start server
    let server = IngestServer::new(config, embedder, index);

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST   /api/ingest                - Upload a document");
    println!("  GET    /api/progress/:file_id     - Poll ingestion progress");
    println!("  DELETE /api/files/:file_id        - Delete a file's vectors");
    println!("  DELETE /api/sessions/:session_id  - Delete a session's vectors");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
