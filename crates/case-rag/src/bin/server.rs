//! Case Q&A server binary
//!
//! Run with: cargo run -p case-rag --bin case-rag-server

use case_rag::{config::RagConfig, server::RagServer};
use dotenv::dotenv;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "case_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                     Case Debrief Bot                      ║
║          Ask questions about a business case PDF          ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    let config = RagConfig::load(None)?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - Generation model: {}", config.generation.model);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);
    tracing::info!("  - Store directory: {}", config.vector_store.store_dir.display());

    // Fail before binding if the hosted model cannot be authenticated
    let api_key = config.generation.resolve_api_key()?;

    let base_url = config.embeddings.base_url.clone();
    let model = config.embeddings.model.clone();
    let server = RagServer::from_config(config, api_key)?;

    tracing::info!("Checking Ollama at {}...", base_url);
    match server.state().engine().embedder().health_check().await {
        Ok(true) => {
            tracing::info!("Ollama is running");
        }
        _ => {
            tracing::warn!("Ollama not available at {}", base_url);
            tracing::warn!("Uploads will fail until it is started:");
            tracing::warn!("  1. Start: ollama serve");
            tracing::warn!("  2. Pull the embedding model: ollama pull {}", model);
        }
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/upload   - Upload a case PDF");
    println!("  POST /api/ask      - Ask a question");
    println!("  GET  /api/document - Show the active case");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
