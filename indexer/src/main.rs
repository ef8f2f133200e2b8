use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use search_core::builder::{prepare_documents, IndexArtifacts};
use search_core::document::{load_products, RawProduct};
use search_core::persist::{load_json, save_artifacts, save_meta, IndexPaths, MetaFile};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build product search indices from crawl output", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build every index artifact from crawl JSON/JSONL files or a directory
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => build_index(Path::new(&input), Path::new(&output)),
    }
}

fn build_index(input: &Path, output: &Path) -> Result<()> {
    let files = input_files(input)?;
    let mut raw: Vec<RawProduct> = Vec::new();
    for file in &files {
        let mut batch = read_file(file)?;
        tracing::info!(file = %file.display(), records = batch.len(), "read crawl records");
        raw.append(&mut batch);
    }

    let docs = prepare_documents(raw);
    tracing::info!(num_docs = docs.len(), files = files.len(), "ingested documents");

    let artifacts = IndexArtifacts::build(&docs);
    let paths = IndexPaths::new(output);
    save_artifacts(&paths, &artifacts)
        .with_context(|| format!("writing index to {}", output.display()))?;

    let meta = MetaFile {
        num_docs: docs.len() as u32,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "".into()),
        version: 1,
    };
    save_meta(&paths, &meta)?;

    tracing::info!(output = %output.display(), "index build complete");
    Ok(())
}

/// A single file, or every `.json`/`.jsonl` file under a directory in path
/// order so repeated builds see records in the same order.
fn input_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("input {} does not exist", input.display());
    }
    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file())
        .filter(|p| {
            matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn read_file(file: &Path) -> Result<Vec<RawProduct>> {
    if file.extension().and_then(|s| s.to_str()) == Some("json") {
        // A plain JSON file holds either one record or an array of them.
        let value: serde_json::Value = load_json(file)?;
        let records = match value {
            serde_json::Value::Array(items) => items,
            obj @ serde_json::Value::Object(_) => vec![obj],
            _ => Vec::new(),
        };
        return records
            .into_iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                if record.is_object() {
                    return Some(record);
                }
                tracing::warn!(file = %file.display(), entry = idx, "skipping non-object record");
                None
            })
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<RawProduct>, _>>()
            .with_context(|| format!("decoding records in {}", file.display()));
    }
    Ok(load_products(file)?)
}
