
use std::sync::Arc;

use tracing::info;

use super::RagOrchestrator;
use crate::config::Config;
use crate::dataset::DocumentStore;
use crate::embeddings::{EmbeddingProvider, OllamaClient};
use crate::generation::GenerationClient;
use crate::index::{IndexArtifact, VectorIndex};
use crate::retrieval::Retriever;
use crate::{RagError, Result};

/// Read-only state shared by every request: the dataset, its index and the
/// embedding provider that built it.
///
/// Constructed once at startup; any inconsistency between the persisted
/// index and the dataset is reported here rather than on first query.
#[derive(Clone)]
pub struct RagContext {
    store: Arc<DocumentStore>,
    index: Arc<VectorIndex>,
    provider: Arc<dyn EmbeddingProvider>,
}

impl RagContext {
    #[inline]
    pub fn new(
        store: DocumentStore,
        index: VectorIndex,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            store: Arc::new(store),
            index: Arc::new(index),
            provider,
        }
    }

    /// Load the dataset and the persisted index, check that they agree and
    /// connect the configured embedding provider
    #[inline]
    pub fn load(config: &Config) -> Result<Self> {
        let provider = OllamaClient::new(&config.ollama)
            .map_err(|e| RagError::Config(format!("{:#}", e)))?;
        Self::load_with_provider(config, Arc::new(provider))
    }

    #[inline]
    pub fn load_with_provider(
        config: &Config,
        provider: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let store = DocumentStore::load_csv(config.dataset_path(), &config.dataset)?;

        let index_dir = config.index_dir();
        if !IndexArtifact::exists(&index_dir) {
            return Err(RagError::ArtifactMismatch(format!(
                "No index found in {}; run the build command first",
                index_dir.display()
            )));
        }

        let artifact = IndexArtifact::load(&index_dir)?;
        artifact.verify_against(&store)?;

        if artifact.manifest.embedding_model != provider.model_name() {
            return Err(RagError::ArtifactMismatch(format!(
                "Index was built with {} but the configured embedding model is {}",
                artifact.manifest.embedding_model,
                provider.model_name()
            )));
        }

        info!(
            "Loaded {} documents and a {}-dimensional index built {}",
            store.len(),
            artifact.manifest.dimension,
            artifact.manifest.built_at
        );

        Ok(Self::new(store, artifact.into_index(), provider))
    }

    #[inline]
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    #[inline]
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    #[inline]
    pub fn retriever(&self) -> Retriever {
        Retriever::new(
            Arc::clone(&self.store),
            Arc::clone(&self.index),
            Arc::clone(&self.provider),
        )
    }

    /// An orchestrator using the configured `top_k` and `max_tokens`
    #[inline]
    pub fn orchestrator(
        &self,
        config: &Config,
        generator: Arc<dyn GenerationClient>,
    ) -> RagOrchestrator {
        RagOrchestrator::new(self.retriever(), generator)
            .with_top_k(config.retrieval.top_k)
            .with_max_tokens(config.generation.max_tokens)
    }
}
