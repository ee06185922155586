// Index module
// Exact nearest-neighbour search over document embeddings, its persisted
// artifact and the batch job that builds both


pub mod artifact;
pub mod builder;

pub use artifact::{IndexArtifact, IndexManifest};
pub use builder::{BuildOutput, IndexBuilder};

use tracing::debug;

use crate::dataset::DocumentId;
use crate::embeddings::Embedding;
use crate::{RagError, Result};

/// One hit from [`VectorIndex::search`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    pub document_id: DocumentId,
    /// Squared Euclidean distance to the query
    pub distance: f32,
}

/// Append-only collection of equal-length embeddings, each bound by position
/// to a document id.
///
/// Vectors are stored contiguously; search is a brute-force scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorIndex {
    dimension: Option<usize>,
    vectors: Vec<f32>,
    ids: Vec<DocumentId>,
}

impl VectorIndex {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty index that only accepts `dimension`-length embeddings
    #[inline]
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            ..Self::default()
        }
    }

    /// Rebuild an index from row-major values and the ids of each row
    #[inline]
    pub fn from_flat(dimension: usize, vectors: Vec<f32>, ids: Vec<DocumentId>) -> Result<Self> {
        let expected = dimension.checked_mul(ids.len());
        if dimension == 0 || expected != Some(vectors.len()) {
            return Err(RagError::ArtifactMismatch(format!(
                "{} values cannot hold {} embeddings of dimension {}",
                vectors.len(),
                ids.len(),
                dimension
            )));
        }
        Ok(Self {
            dimension: Some(dimension),
            vectors,
            ids,
        })
    }

    /// Append embeddings with the document ids they belong to.
    ///
    /// The whole batch is checked before anything is stored, so a failed add
    /// leaves the index untouched. The first add to an index without a
    /// dimension fixes it.
    #[inline]
    pub fn add(&mut self, entries: &[(DocumentId, Embedding)]) -> Result<()> {
        let Some((_, first)) = entries.first() else {
            return Ok(());
        };

        let expected = self.dimension.unwrap_or(first.len());
        if expected == 0 {
            return Err(RagError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }

        if let Some((_, bad)) = entries.iter().find(|(_, e)| e.len() != expected) {
            return Err(RagError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }

        self.dimension = Some(expected);
        self.vectors.reserve(entries.len() * expected);
        self.ids.reserve(entries.len());
        for (id, embedding) in entries {
            self.vectors.extend_from_slice(embedding);
            self.ids.push(*id);
        }

        debug!(
            "Added {} embeddings, index now holds {}",
            entries.len(),
            self.ids.len()
        );
        Ok(())
    }

    /// The `k` stored embeddings nearest to `query`, closest first.
    ///
    /// Equal distances keep insertion order. Returns fewer than `k` results
    /// only when the index holds fewer than `k` embeddings.
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(RagError::Config(
                "Number of neighbours must be at least 1".to_string(),
            ));
        }

        let dimension = match self.dimension {
            Some(dimension) if !self.ids.is_empty() => dimension,
            _ => return Err(RagError::EmptyIndex),
        };

        if query.len() != dimension {
            return Err(RagError::DimensionMismatch {
                expected: dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(dimension)
            .map(|stored| squared_euclidean(stored, query))
            .enumerate()
            .collect();

        let by_distance = |a: &(usize, f32), b: &(usize, f32)| {
            a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0))
        };

        let k = k.min(scored.len());
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_distance);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance);

        Ok(scored
            .into_iter()
            .map(|(position, distance)| SearchResult {
                document_id: self.ids[position],
                distance,
            })
            .collect())
    }

    /// Embedding dimension, unset until the first embedding is added
    #[inline]
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Document ids in position order
    #[inline]
    pub fn ids(&self) -> &[DocumentId] {
        &self.ids
    }

    /// The embedding stored at `position`
    #[inline]
    pub fn embedding(&self, position: usize) -> Option<&[f32]> {
        let dimension = self.dimension?;
        let start = position.checked_mul(dimension)?;
        self.vectors.get(start..start + dimension)
    }

    /// All stored values, row-major
    #[inline]
    pub fn as_flat(&self) -> &[f32] {
        &self.vectors
    }
}

#[inline]
fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}
