//! Persisted flat vector index
//!
//! Layout of an index directory:
//!
//! ```text
//! <dir>/manifest.json   IndexManifest
//! <dir>/entries.json    [IndexEntry]
//! ```
//!
//! The index is written once by the indexer and only read afterwards. Search
//! is a brute-force inner product over unit-norm vectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::providers::embedding::dot;
use crate::types::Chunk;

const MANIFEST_FILE: &str = "manifest.json";
const ENTRIES_FILE: &str = "entries.json";

/// Bumped when the on-disk layout changes
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Identity of the embedding space an index was built in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelFingerprint {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
}

impl ModelFingerprint {
    pub fn new(provider: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            dimensions,
        }
    }
}

impl fmt::Display for ModelFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({} dims)", self.provider, self.model, self.dimensions)
    }
}

/// Index metadata stored next to the entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub collection: String,
    pub fingerprint: ModelFingerprint,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub source_file: String,
    /// SHA-256 of the extracted source text
    pub source_hash: String,
    pub created_at: DateTime<Utc>,
    pub entry_count: usize,
}

impl IndexManifest {
    pub fn new(
        collection: impl Into<String>,
        fingerprint: ModelFingerprint,
        chunking: &ChunkingConfig,
        source_file: impl Into<String>,
        source_hash: impl Into<String>,
    ) -> Self {
        Self {
            format_version: INDEX_FORMAT_VERSION,
            collection: collection.into(),
            fingerprint,
            chunk_size: chunking.chunk_size,
            chunk_overlap: chunking.chunk_overlap,
            source_file: source_file.into(),
            source_hash: source_hash.into(),
            created_at: Utc::now(),
            entry_count: 0,
        }
    }
}

/// One chunk and its unit-norm embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// In-memory index shared read-only by the query pipeline
#[derive(Debug, Clone)]
pub struct VectorIndex {
    manifest: IndexManifest,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Pair chunks with their vectors
    pub fn build(chunks: Vec<Chunk>, vectors: Vec<Vec<f32>>, mut manifest: IndexManifest) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(Error::index(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }
        let dims = manifest.fingerprint.dimensions;
        if let Some(bad) = vectors.iter().position(|v| v.len() != dims) {
            return Err(Error::index(format!(
                "Vector {} has {} dimensions, expected {}",
                bad,
                vectors[bad].len(),
                dims
            )));
        }

        manifest.entry_count = chunks.len();
        let entries = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect();

        Ok(Self { manifest, entries })
    }

    /// Index with no entries
    pub fn empty(fingerprint: ModelFingerprint) -> Self {
        Self {
            manifest: IndexManifest::new("empty", fingerprint, &ChunkingConfig::default(), "", ""),
            entries: Vec::new(),
        }
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top `k` entries by inner product, non-increasing; ties keep document order
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(&IndexEntry, f32)>> {
        let dims = self.manifest.fingerprint.dimensions;
        if query.len() != dims {
            return Err(Error::index(format!(
                "Query vector has {} dimensions, index expects {}",
                query.len(),
                dims
            )));
        }

        let mut scored: Vec<(&IndexEntry, f32)> = self
            .entries
            .iter()
            .map(|entry| (entry, dot(query, &entry.vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        Ok(scored)
    }

    /// Write the index to `dir`, replacing whatever is there.
    ///
    /// Files are written to a sibling temp directory first and renamed into
    /// place, so a failed run never leaves a half-written index behind.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let staging = staging_dir(dir);
        let write_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source: std::io::Error| Error::IndexWrite { path, source }
        };

        if staging.exists() {
            fs::remove_dir_all(&staging).map_err(write_err(&staging))?;
        }
        fs::create_dir_all(&staging).map_err(write_err(&staging))?;

        if let Err(e) = self.write_files(&staging) {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        if dir.exists() {
            fs::remove_dir_all(dir).map_err(write_err(dir))?;
        }
        fs::rename(&staging, dir).map_err(write_err(dir))?;

        tracing::info!(
            "Saved {} entries to {} ({})",
            self.entries.len(),
            dir.display(),
            self.manifest.fingerprint
        );
        Ok(())
    }

    fn write_files(&self, dir: &Path) -> Result<()> {
        write_json(&dir.join(MANIFEST_FILE), &self.manifest)?;
        write_json(&dir.join(ENTRIES_FILE), &self.entries)
    }

    /// Load an index, rejecting one built in a different embedding space
    pub fn load(dir: impl AsRef<Path>, expected: &ModelFingerprint) -> Result<Self> {
        let dir = dir.as_ref();
        let manifest_path = dir.join(MANIFEST_FILE);
        let entries_path = dir.join(ENTRIES_FILE);

        if !manifest_path.is_file() || !entries_path.is_file() {
            return Err(Error::IndexMissing {
                path: dir.to_path_buf(),
            });
        }

        let manifest: IndexManifest = read_json(&manifest_path)?;
        if manifest.format_version != INDEX_FORMAT_VERSION {
            return Err(Error::IncompatibleIndex(format!(
                "format version {} (expected {})",
                manifest.format_version, INDEX_FORMAT_VERSION
            )));
        }
        if &manifest.fingerprint != expected {
            return Err(Error::IncompatibleIndex(format!(
                "built with {}, configured embedder is {}",
                manifest.fingerprint, expected
            )));
        }

        let entries: Vec<IndexEntry> = read_json(&entries_path)?;
        if entries.len() != manifest.entry_count {
            return Err(Error::IncompatibleIndex(format!(
                "manifest lists {} entries, found {}",
                manifest.entry_count,
                entries.len()
            )));
        }
        if let Some(bad) = entries.iter().find(|e| e.vector.len() != expected.dimensions) {
            return Err(Error::IncompatibleIndex(format!(
                "chunk {} has a {}-dimensional vector, expected {}",
                bad.chunk.chunk_index,
                bad.vector.len(),
                expected.dimensions
            )));
        }

        tracing::info!(
            "Loaded index '{}' from {}: {} entries, {}",
            manifest.collection,
            dir.display(),
            entries.len(),
            manifest.fingerprint
        );

        Ok(Self { manifest, entries })
    }
}

fn staging_dir(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());
    dir.with_file_name(format!(".{}.tmp-{}", name, uuid::Uuid::new_v4().simple()))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let io_err = |source: std::io::Error| Error::IndexWrite {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush().map_err(io_err)?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::IncompatibleIndex(format!("{} is unreadable: {}", path.display(), e)))
}
