use crate::builder::IndexArtifacts;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn title(&self) -> PathBuf { self.root.join("title_index.json") }
    pub fn title_positional(&self) -> PathBuf { self.root.join("title_positional_index.json") }
    pub fn description(&self) -> PathBuf { self.root.join("description_index.json") }
    pub fn description_positional(&self) -> PathBuf { self.root.join("description_positional_index.json") }
    pub fn brand(&self) -> PathBuf { self.root.join("brand_index.json") }
    pub fn origin(&self) -> PathBuf { self.root.join("origin_index.json") }
    pub fn reviews(&self) -> PathBuf { self.root.join("reviews_index.json") }
    pub fn documents(&self) -> PathBuf { self.root.join("documents_index.json") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Pretty-printed JSON, non-ASCII kept as-is.
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    let f = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, value)
        .map_err(|source| Error::InvalidJson { path: path.to_path_buf(), source })?;
    w.flush().map_err(|e| Error::io(path, e))?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = File::open(path).map_err(|e| Error::io(path, e))?;
    serde_json::from_reader(BufReader::new(f))
        .map_err(|source| Error::InvalidJson { path: path.to_path_buf(), source })
}

pub fn save_artifacts(paths: &IndexPaths, artifacts: &IndexArtifacts) -> Result<()> {
    create_dir_all(&paths.root).map_err(|e| Error::io(&paths.root, e))?;
    save_json(&paths.title(), &artifacts.title_inverted)?;
    save_json(&paths.title_positional(), &artifacts.title_positional)?;
    save_json(&paths.description(), &artifacts.description_inverted)?;
    save_json(&paths.description_positional(), &artifacts.description_positional)?;
    save_json(&paths.brand(), &artifacts.brand)?;
    save_json(&paths.origin(), &artifacts.origin)?;
    save_json(&paths.reviews(), &artifacts.reviews)?;
    save_json(&paths.documents(), &artifacts.documents)?;
    Ok(())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    save_json(&paths.meta(), meta)
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    load_json(&paths.meta())
}
