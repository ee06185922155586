//! Deterministic stand-ins for the external embedding and generation services

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::dataset::{Document, DocumentStore};
use crate::embeddings::{Embedding, EmbeddingProvider};
use crate::generation::GenerationClient;
use crate::{RagError, Result};

const VOCABULARY: &[&str] = &[
    "apple", "fruit", "fiber", "steak", "beef", "meat", "protein", "kale", "leafy", "green",
    "vegetable", "vitamin",
];

/// Bag-of-words embedding over a fixed vocabulary, L2-normalised.
///
/// Texts sharing no vocabulary word map to a constant "unknown" axis.
pub struct KeywordEmbedder {
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn dimension() -> usize {
        VOCABULARY.len() + 1
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for KeywordEmbedder {
    fn encode(&self, text: &str) -> Result<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut vector = vec![0.0f32; Self::dimension()];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            if let Some(position) = VOCABULARY.iter().position(|&w| w == token) {
                vector[position] += 1.0;
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            vector[VOCABULARY.len()] = 1.0;
        } else {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(vector)
    }

    fn model_name(&self) -> &str {
        "keyword-test"
    }
}

/// Fails every call after `succeed_for` texts have been encoded
pub struct FailingEmbedder {
    inner: KeywordEmbedder,
    succeed_for: usize,
}

impl FailingEmbedder {
    pub fn after(succeed_for: usize) -> Self {
        Self {
            inner: KeywordEmbedder::new(),
            succeed_for,
        }
    }
}

impl EmbeddingProvider for FailingEmbedder {
    fn encode(&self, text: &str) -> Result<Embedding> {
        if self.inner.calls() >= self.succeed_for {
            return Err(RagError::Embedding("embedding service unavailable".to_string()));
        }
        self.inner.encode(text)
    }

    fn model_name(&self) -> &str {
        "failing-test"
    }
}

/// Always returns vectors of a fixed length, regardless of the index
pub struct FixedDimensionEmbedder(pub usize);

impl EmbeddingProvider for FixedDimensionEmbedder {
    fn encode(&self, _text: &str) -> Result<Embedding> {
        Ok(vec![0.5; self.0])
    }

    fn model_name(&self) -> &str {
        "fixed-test"
    }
}

/// Records every prompt and answers with a canned reply
pub struct RecordingGenerator {
    pub reply: String,
    pub prompts: Mutex<Vec<(String, u32)>>,
}

impl RecordingGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<(String, u32)> {
        self.prompts.lock().expect("prompt log lock").clone()
    }
}

impl GenerationClient for RecordingGenerator {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        self.prompts
            .lock()
            .expect("prompt log lock")
            .push((prompt.to_string(), max_tokens));
        Ok(self.reply.clone())
    }
}

pub struct FailingGenerator;

impl GenerationClient for FailingGenerator {
    fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
        Err(RagError::Generation("HTTP 429 rate limited".to_string()))
    }
}

pub const APPLE: &str = "Apple, raw: low-fat fruit high in fiber";
pub const STEAK: &str = "Steak, beef: high-protein red meat";
pub const KALE: &str = "Kale, raw: leafy green vegetable rich in vitamin K";

/// The three-document store used across pipeline tests
pub fn sample_store() -> DocumentStore {
    DocumentStore::from_documents(vec![
        Document::new(1001, APPLE).with_attribute("fiber_g", "2.4"),
        Document::new(1002, STEAK).with_attribute("protein_g", "25.9"),
        Document::new(1003, KALE).with_attribute("vitamin_k_ug", "389.6"),
    ])
    .expect("sample store is valid")
}
