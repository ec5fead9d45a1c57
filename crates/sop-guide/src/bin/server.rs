//! SOP guide HTTP server binary
//!
//! Run with: cargo run -p sop-guide --bin sop-guide-server

use sop_guide::{
    config::{config_path, RagConfig},
    server::RagServer,
    QueryPipeline,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sop_guide=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                        SOP Guide                          ║
║      Patient education grounded on ESHRE 2023             ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let config = RagConfig::load(config_path(None))?;

    tracing::info!("Configuration loaded");
    tracing::info!(
        "  - Embedding: {} / {} ({} dims)",
        config.embeddings.backend.as_str(),
        config.embeddings.model,
        config.embeddings.dimensions
    );
    tracing::info!("  - LLM model: {}", config.llm.generate_model);
    tracing::info!("  - Index: {}", config.index.path.display());
    tracing::info!("  - Top k: {}", config.retrieval.top_k);

    // Missing credential or index is fatal before binding
    let api_key = config.api_key()?;
    let pipeline = QueryPipeline::load(&config, &api_key)?;

    let server = RagServer::new(config, pipeline).await;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/chat    - Ask about SOP");
    println!("  POST /api/analyze - Analyze a lab, cycle or ultrasound image");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
