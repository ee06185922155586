use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("No data available: the vector index is empty")]
    EmptyIndex,

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Document {0} is referenced by the index but missing from the dataset")]
    UnknownDocument(i64),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Index artifact does not match the dataset: {0}")]
    ArtifactMismatch(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Feedback log error: {0}")]
    Feedback(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Coarse classification of a failure, for callers deciding what to tell the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Nothing to search against
    NoData,
    /// An embedding or generation service failed
    Upstream,
    /// The persisted index and the dataset disagree; rebuild the index
    Inconsistency,
    Configuration,
    Storage,
}

impl RagError {
    #[inline]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::EmptyIndex => FailureKind::NoData,
            Self::Embedding(_) | Self::Generation(_) => FailureKind::Upstream,
            Self::UnknownDocument(_) | Self::ArtifactMismatch(_) => FailureKind::Inconsistency,
            Self::DimensionMismatch { .. } | Self::Config(_) => FailureKind::Configuration,
            Self::Dataset(_) | Self::Feedback(_) | Self::Io(_) | Self::Other(_) => {
                FailureKind::Storage
            }
        }
    }
}

pub mod commands;
pub mod config;
pub mod dataset;
pub mod embeddings;
pub mod feedback;
pub mod generation;
pub(crate) mod http;
pub mod index;
pub mod prompt;
pub mod rag;
pub mod retrieval;

#[cfg(test)]
pub(crate) mod test_support;
