use anyhow::{Context, Result};
use clap::Parser;
use search_core::persist::save_json;
use search_core::{SearchConfig, SearchEngine};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

/// Run one query against a built index and print the ranked results as JSON.
#[derive(Parser)]
#[command(name = "search")]
struct Args {
    /// Free-text query
    query: String,
    /// Index directory path
    #[arg(long, default_value = "./index")]
    index: PathBuf,
    /// Products JSONL backing the document store
    #[arg(long, default_value = "./input/products.jsonl")]
    products: PathBuf,
    /// Optional synonyms JSON (term -> [synonym, ...])
    #[arg(long)]
    synonyms: Option<PathBuf>,
    /// Optional ranking config JSON
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of results; defaults to the config's `default_top_k`
    #[arg(short = 'k', long)]
    top_k: Option<usize>,
    /// Also write the results to this file
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SearchConfig::load(path)?,
        None => SearchConfig::default(),
    };
    let top_k = args.top_k.unwrap_or(config.default_top_k);
    let engine = SearchEngine::open(&args.index, &args.products, args.synonyms.as_deref(), config)
        .with_context(|| format!("opening index at {}", args.index.display()))?;

    let response = engine.search(&args.query, top_k);
    println!("{}", serde_json::to_string_pretty(&response)?);

    if let Some(out) = &args.output {
        save_json(out, &response)?;
        tracing::info!(output = %out.display(), "saved results");
    }
    Ok(())
}
