//! On-disk form of a built index.
//!
//! Two files live in the index directory: `manifest.json` (dimension, count,
//! position-ordered document ids, model, build time, embeddings file name)
//! and an `embeddings-<unique>.f32` file of row-major little-endian `f32`
//! values. Every save writes its embeddings under a fresh name and only then
//! renames the new manifest into place, so the manifest on disk always names
//! the embeddings it was written with. Files no manifest refers to are
//! removed after a successful save.


use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::VectorIndex;
use crate::dataset::{DocumentId, DocumentStore};
use crate::{RagError, Result};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const FORMAT_VERSION: u32 = 2;

const EMBEDDINGS_PREFIX: &str = "embeddings-";
const EMBEDDINGS_SUFFIX: &str = ".f32";

const F32_BYTES: usize = std::mem::size_of::<f32>();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub dimension: usize,
    pub count: usize,
    /// Document id of each index position
    pub document_ids: Vec<DocumentId>,
    pub embedding_model: String,
    pub built_at: DateTime<Utc>,
    /// Name of the embeddings file in the index directory; set by `save`
    pub embeddings_file: String,
}

impl IndexManifest {
    /// Location of the embeddings this manifest was written with
    #[inline]
    pub fn embeddings_path(&self, dir: &Path) -> Result<PathBuf> {
        let name = Path::new(&self.embeddings_file);
        let is_plain_name = name.file_name() == Some(name.as_os_str())
            && self.embeddings_file.starts_with(EMBEDDINGS_PREFIX)
            && self.embeddings_file.ends_with(EMBEDDINGS_SUFFIX);
        if !is_plain_name {
            return Err(RagError::ArtifactMismatch(format!(
                "Manifest names an invalid embeddings file '{}'",
                self.embeddings_file
            )));
        }
        Ok(dir.join(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexArtifact {
    pub manifest: IndexManifest,
    pub index: VectorIndex,
}

impl IndexArtifact {
    #[inline]
    pub fn new(index: VectorIndex, embedding_model: impl Into<String>) -> Self {
        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            dimension: index.dimension().unwrap_or(0),
            count: index.len(),
            document_ids: index.ids().to_vec(),
            embedding_model: embedding_model.into(),
            built_at: Utc::now(),
            embeddings_file: String::new(),
        };
        Self { manifest, index }
    }

    #[inline]
    pub fn manifest_path(dir: &Path) -> PathBuf {
        dir.join(MANIFEST_FILE)
    }

    #[inline]
    pub fn exists(dir: &Path) -> bool {
        Self::manifest_path(dir).is_file()
    }

    /// Write both files, replacing any previous artifact in `dir`.
    ///
    /// Records the new embeddings file name in `self.manifest`.
    #[inline]
    pub fn save(&mut self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;

        let mut embeddings = tempfile::Builder::new()
            .prefix(EMBEDDINGS_PREFIX)
            .suffix(EMBEDDINGS_SUFFIX)
            .tempfile_in(dir)?;
        {
            let mut writer = BufWriter::new(embeddings.as_file_mut());
            for value in self.index.as_flat() {
                writer.write_all(&value.to_le_bytes())?;
            }
            writer.flush()?;
        }
        embeddings.as_file().sync_all()?;
        let (_, embeddings_path) = embeddings.keep().map_err(|e| RagError::Io(e.error))?;

        self.manifest.embeddings_file = embeddings_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let manifest_json = serde_json::to_vec_pretty(&self.manifest)
            .map_err(|e| RagError::Other(anyhow::anyhow!("Failed to serialize manifest: {}", e)))?;
        let mut manifest = NamedTempFile::new_in(dir)?;
        manifest.write_all(&manifest_json)?;
        manifest.as_file().sync_all()?;
        manifest
            .persist(Self::manifest_path(dir))
            .map_err(|e| RagError::Io(e.error))?;

        remove_unreferenced_embeddings(dir, &self.manifest.embeddings_file);

        info!(
            "Saved index artifact with {} embeddings of dimension {} to {}",
            self.manifest.count,
            self.manifest.dimension,
            dir.display()
        );
        Ok(())
    }

    /// Read only the manifest
    #[inline]
    pub fn read_manifest(dir: &Path) -> Result<IndexManifest> {
        let path = Self::manifest_path(dir);
        let content = fs::read(&path)?;
        let manifest: IndexManifest = serde_json::from_slice(&content).map_err(|e| {
            RagError::ArtifactMismatch(format!("Unreadable manifest {}: {}", path.display(), e))
        })?;

        if manifest.format_version != FORMAT_VERSION {
            return Err(RagError::ArtifactMismatch(format!(
                "Unsupported index format version {} (expected {})",
                manifest.format_version, FORMAT_VERSION
            )));
        }
        if manifest.count != manifest.document_ids.len() {
            return Err(RagError::ArtifactMismatch(format!(
                "Manifest lists {} ids for {} embeddings",
                manifest.document_ids.len(),
                manifest.count
            )));
        }
        Ok(manifest)
    }

    #[inline]
    pub fn load(dir: &Path) -> Result<Self> {
        let manifest = Self::read_manifest(dir)?;
        debug!(
            "Loading {} embeddings of dimension {} from {}",
            manifest.count,
            manifest.dimension,
            dir.display()
        );

        let bytes = fs::read(manifest.embeddings_path(dir)?)?;
        let expected_bytes = manifest
            .count
            .checked_mul(manifest.dimension)
            .and_then(|values| values.checked_mul(F32_BYTES))
            .ok_or_else(|| {
                RagError::ArtifactMismatch(format!(
                    "Manifest size {} x {} is not a valid index",
                    manifest.count, manifest.dimension
                ))
            })?;
        if bytes.len() != expected_bytes {
            return Err(RagError::ArtifactMismatch(format!(
                "Embedding file holds {} bytes, manifest requires {}",
                bytes.len(),
                expected_bytes
            )));
        }

        let index = if manifest.count == 0 {
            VectorIndex::new()
        } else {
            let values = bytes
                .chunks_exact(F32_BYTES)
                .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
                .collect();
            VectorIndex::from_flat(manifest.dimension, values, manifest.document_ids.clone())?
        };

        Ok(Self { manifest, index })
    }

    /// Check that this artifact was built from `store` as it is now
    #[inline]
    pub fn verify_against(&self, store: &DocumentStore) -> Result<()> {
        if self.index.len() != store.len() {
            return Err(RagError::ArtifactMismatch(format!(
                "Index holds {} embeddings but the dataset has {} documents; rebuild the index",
                self.index.len(),
                store.len()
            )));
        }

        if let Some((position, (indexed, current))) = self
            .index
            .ids()
            .iter()
            .zip(store.iter().map(|d| d.id))
            .enumerate()
            .find(|(_, (indexed, current))| **indexed != *current)
        {
            return Err(RagError::ArtifactMismatch(format!(
                "Position {} holds document {} in the index but {} in the dataset; rebuild the index",
                position, indexed, current
            )));
        }

        Ok(())
    }

    #[inline]
    pub fn into_index(self) -> VectorIndex {
        self.index
    }
}

/// Delete embeddings files left by earlier saves or by a save that stopped
/// before its manifest was written
fn remove_unreferenced_embeddings(dir: &Path, current: &str) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.filter_map(|entry| entry.ok()) {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        let is_embeddings =
            name.starts_with(EMBEDDINGS_PREFIX) && name.ends_with(EMBEDDINGS_SUFFIX);
        if is_embeddings && name != current {
            if let Err(e) = fs::remove_file(entry.path()) {
                warn!("Could not remove stale embeddings file {}: {}", name, e);
            }
        }
    }
}
