// Retrieval module
// Query embedding, nearest-neighbour search and id resolution against the dataset

#[cfg(test)]
mod tests;

use std::sync::Arc;

use tracing::{debug, error};

use crate::config::settings::DEFAULT_TOP_K;
use crate::dataset::{Document, DocumentStore};
use crate::embeddings::EmbeddingProvider;
use crate::index::VectorIndex;
use crate::{RagError, Result};

/// A retrieved document and its squared Euclidean distance to the query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: Document,
    pub distance: f32,
}

/// Finds the dataset documents nearest to a query.
///
/// Holds shared, read-only handles; cloning is cheap and clones may be used
/// from several threads at once.
#[derive(Clone)]
pub struct Retriever {
    store: Arc<DocumentStore>,
    index: Arc<VectorIndex>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    #[inline]
    pub fn new(
        store: Arc<DocumentStore>,
        index: Arc<VectorIndex>,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            store,
            index,
            provider,
        }
    }

    /// The `k` best-matching documents, best first
    #[inline]
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        Ok(self
            .retrieve_scored(query, k)?
            .into_iter()
            .map(|scored| scored.document)
            .collect())
    }

    /// [`Retriever::retrieve`] with the default of five documents
    #[inline]
    pub fn retrieve_default(&self, query: &str) -> Result<Vec<Document>> {
        self.retrieve(query, DEFAULT_TOP_K)
    }

    #[inline]
    pub fn retrieve_scored(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        if self.index.is_empty() {
            return Err(RagError::EmptyIndex);
        }

        let embedding = self.provider.encode(query)?;
        if let Some(expected) = self.index.dimension() {
            if embedding.len() != expected {
                return Err(RagError::Embedding(format!(
                    "Query embedding has {} values but the index was built with {}",
                    embedding.len(),
                    expected
                )));
            }
        }

        let hits = self.index.search(&embedding, k)?;
        debug!("Query matched {} documents", hits.len());

        hits.into_iter()
            .map(|hit| {
                let document = self.store.get(hit.document_id).ok_or_else(|| {
                    error!(
                        "Index references document {} which the dataset does not contain",
                        hit.document_id
                    );
                    RagError::UnknownDocument(hit.document_id)
                })?;
                Ok(ScoredDocument {
                    document: document.clone(),
                    distance: hit.distance,
                })
            })
            .collect()
    }

    #[inline]
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    #[inline]
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }
}
