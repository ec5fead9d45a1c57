//! Offline indexer: parse the guideline, chunk it, embed it and persist the index
//!
//! Run with: cargo run -p sop-guide --bin sop-guide-indexer -- guia_sop.pdf

use anyhow::Context;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sop_guide::{
    config::{config_path, EmbeddingBackend, RagConfig},
    ingestion::{FileParser, TextChunker},
    providers::embedder_from_config,
    retrieval::{IndexManifest, VectorIndex},
};

#[derive(Parser)]
#[command(name = "sop-guide-indexer", about = "Build the SOP guide vector index", version)]
struct Cli {
    /// Source document (PDF, TXT or Markdown); defaults to index.default_document
    document: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Index directory; defaults to index.path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", style("error:").red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sop_guide=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = RagConfig::load(config_path(cli.config))?;
    let document = cli.document.unwrap_or_else(|| config.index.default_document.clone());
    let output = cli.output.unwrap_or_else(|| config.index.path.clone());
    let start = Instant::now();

    // Ollama runs locally and needs no credential
    let api_key = match config.embeddings.backend {
        EmbeddingBackend::Gemini => config.api_key()?,
        EmbeddingBackend::Ollama => String::new(),
    };

    println!("{} {}", style("Reading").cyan().bold(), document.display());
    let data = tokio::fs::read(&document)
        .await
        .with_context(|| format!("cannot read {}", document.display()))?;
    let filename = document
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document")
        .to_string();

    let parsed = FileParser::parse(&filename, &data, &config.index.source_label)?;
    println!(
        "  {} pages, {} characters",
        parsed.total_pages.unwrap_or(parsed.pages.len() as u32),
        parsed.char_count()
    );

    let chunker = TextChunker::new(config.chunking.chunk_size, config.chunking.chunk_overlap)?;
    let chunks = chunker.chunk_documents(&parsed.pages);
    println!(
        "{} {} chunks (size {}, overlap {})",
        style("Chunked").cyan().bold(),
        chunks.len(),
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let embedder = embedder_from_config(&config, &api_key)?;
    let batch_size = config.embeddings.batch_size.max(1);

    let progress = ProgressBar::new(chunks.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} chunks ({eta})")?
            .progress_chars("=> "),
    );

    let mut vectors = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(batch_size) {
        let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
        let embedded = embedder
            .embed_batch_normalized(&texts)
            .await
            .with_context(|| format!("embedding failed after {} chunks", vectors.len()))?;
        vectors.extend(embedded);
        progress.inc(batch.len() as u64);
    }
    progress.finish_and_clear();

    let manifest = IndexManifest::new(
        config.index.collection.clone(),
        embedder.fingerprint(),
        &config.chunking,
        parsed.filename.clone(),
        parsed.content_hash.clone(),
    );
    let index = VectorIndex::build(chunks, vectors, manifest)?;
    index.save(&output)?;

    println!(
        "{} {} entries to {} in {:.1}s",
        style("Indexed").green().bold(),
        index.len(),
        output.display(),
        start.elapsed().as_secs_f64()
    );
    println!("  model: {}", style(&index.manifest().fingerprint).dim());

    Ok(())
}
