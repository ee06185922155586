#[cfg(test)]
mod tests;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use super::{IndexArtifact, VectorIndex};
use crate::dataset::{DocumentId, DocumentStore};
use crate::embeddings::EmbeddingProvider;
use crate::{RagError, Result};

const DEFAULT_BATCH_SIZE: usize = 32;

/// Embeds every document of a store, in store order, into a fresh index
pub struct IndexBuilder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
    show_progress: bool,
}

/// Result of a build: the index and the document id at each position
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutput {
    pub index: VectorIndex,
    pub document_ids: Vec<DocumentId>,
}

impl IndexBuilder {
    #[inline]
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            batch_size: DEFAULT_BATCH_SIZE,
            show_progress: false,
        }
    }

    #[inline]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Draw a progress bar on stderr when a user is watching
    #[inline]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Embed all documents into an in-memory index.
    ///
    /// Any provider failure aborts the whole build.
    #[inline]
    pub fn build(&self, documents: &DocumentStore) -> Result<BuildOutput> {
        let started = Instant::now();
        info!(
            "Building index for {} documents with model {}",
            documents.len(),
            self.provider.model_name()
        );

        let bar = self.progress_bar(documents.len());
        let mut index = VectorIndex::new();
        let all: Vec<_> = documents.iter().collect();

        for chunk in all.chunks(self.batch_size) {
            let texts: Vec<String> = chunk.iter().map(|d| d.description.clone()).collect();

            let embeddings = self.provider.encode_batch(&texts).inspect_err(|e| {
                error!("Embedding failed after {} documents: {}", index.len(), e);
            })?;

            if embeddings.len() != chunk.len() {
                return Err(RagError::Embedding(format!(
                    "Provider returned {} embeddings for {} documents",
                    embeddings.len(),
                    chunk.len()
                )));
            }

            let entries: Vec<_> = chunk
                .iter()
                .map(|d| d.id)
                .zip(embeddings)
                .collect();
            index.add(&entries)?;
            bar.inc(chunk.len() as u64);
        }

        bar.finish_and_clear();
        info!(
            "Embedded {} documents in {:?}",
            index.len(),
            started.elapsed()
        );

        let document_ids = index.ids().to_vec();
        Ok(BuildOutput {
            index,
            document_ids,
        })
    }

    /// Build, then replace the artifact in `dir`.
    ///
    /// Nothing is written unless every document was embedded.
    #[inline]
    pub fn build_and_persist(&self, documents: &DocumentStore, dir: &Path) -> Result<BuildOutput> {
        let output = self.build(documents)?;
        let mut artifact = IndexArtifact::new(output.index, self.provider.model_name());
        artifact.save(dir)?;
        Ok(BuildOutput {
            index: artifact.into_index(),
            document_ids: output.document_ids,
        })
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress || !console::user_attended_stderr() {
            return ProgressBar::hidden();
        }
        let style = ProgressStyle::with_template(
            "{spinner} [{bar:40}] {pos}/{len} documents embedded ({eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        ProgressBar::new(total as u64).with_style(style)
    }
}
