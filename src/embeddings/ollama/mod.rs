#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{Embedding, EmbeddingProvider};
use crate::RagError;
use crate::config::OllamaConfig;
use crate::http;

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    model: String,
    batch_size: u32,
    agent: ureq::Agent,
    expected_dimension: Option<usize>,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: Option<u64>,
    pub digest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let base_url = config
            .ollama_url()
            .context("Failed to generate Ollama URL from config")?;

        Ok(Self {
            base_url,
            model: config.model.clone(),
            batch_size: config.batch_size,
            agent: http::agent(Duration::from_secs(config.timeout_seconds)),
            expected_dimension: config.embedding_dimension.map(|d| d as usize),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = http::agent(timeout);
        self
    }

    /// Require every returned embedding to have exactly `dimension` values
    #[inline]
    pub fn with_expected_dimension(mut self, dimension: usize) -> Self {
        self.expected_dimension = Some(dimension);
        self
    }

    #[inline]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Test connection to Ollama server and verify model availability
    #[inline]
    pub fn health_check(&self) -> Result<()> {
        debug!("Performing health check for Ollama at {}", self.base_url);

        self.ping().context("Server ping failed")?;
        self.validate_model().context("Model validation failed")?;

        info!(
            "Health check passed for Ollama server at {} with model {}",
            self.base_url, self.model
        );
        Ok(())
    }

    /// Ping the Ollama server to check if it's responsive
    #[inline]
    pub fn ping(&self) -> Result<()> {
        let url = self
            .base_url
            .join("/api/tags")
            .context("Failed to build ping URL")?;

        http::get_text(&self.agent, &url).context("Failed to ping Ollama server")?;

        debug!("Server ping successful");
        Ok(())
    }

    /// Validate that the configured model is available
    #[inline]
    pub fn validate_model(&self) -> Result<()> {
        debug!("Validating model: {}", self.model);

        let models = self.list_models().context("Failed to list models")?;

        if models.iter().any(|m| m.name == self.model) {
            debug!("Model {} is available", self.model);
            Ok(())
        } else {
            let available_models: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
            warn!(
                "Model {} not found. Available models: {:?}",
                self.model, available_models
            );
            Err(anyhow::anyhow!(
                "Model '{}' is not available. Available models: {:?}",
                self.model,
                available_models
            ))
        }
    }

    /// List all available models
    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self
            .base_url
            .join("/api/tags")
            .context("Failed to build models URL")?;

        let response_text =
            http::get_text(&self.agent, &url).context("Failed to fetch models")?;

        let models_response: ModelsResponse =
            serde_json::from_str(&response_text).context("Failed to parse models response")?;

        debug!("Found {} models", models_response.models.len());
        Ok(models_response.models)
    }

    fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let url = self
            .base_url
            .join("/api/embed")
            .context("Failed to build embedding URL")?;

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embedding request")?;

        let response_text = http::post_json(&self.agent, &url, &request_json, None)
            .context("Failed to generate embeddings")?;

        let response: EmbedResponse =
            serde_json::from_str(&response_text).context("Failed to parse embedding response")?;

        if response.embeddings.len() != texts.len() {
            return Err(anyhow::anyhow!(
                "Mismatch between request and response counts: {} vs {}",
                texts.len(),
                response.embeddings.len()
            ));
        }

        for embedding in &response.embeddings {
            self.check_dimension(embedding)?;
        }

        Ok(response.embeddings)
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<()> {
        if embedding.is_empty() {
            return Err(anyhow::anyhow!("Server returned an empty embedding"));
        }
        if let Some(expected) = self.expected_dimension {
            if embedding.len() != expected {
                return Err(anyhow::anyhow!(
                    "Expected {}-dimensional embeddings from {}, got {}",
                    expected,
                    self.model,
                    embedding.len()
                ));
            }
        }
        Ok(())
    }
}

impl EmbeddingProvider for OllamaClient {
    #[inline]
    fn encode(&self, text: &str) -> crate::Result<Embedding> {
        debug!("Generating embedding for text (length: {})", text.len());

        let mut embeddings = self
            .embed_single_batch(&[text.to_string()])
            .map_err(|e| RagError::Embedding(format!("{:#}", e)))?;

        embeddings
            .pop()
            .ok_or_else(|| RagError::Embedding("Server returned no embedding".to_string()))
    }

    /// Sends `batch_size` texts per request
    #[inline]
    fn encode_batch(&self, texts: &[String]) -> crate::Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut results = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size as usize) {
            let batch = self.embed_single_batch(chunk).map_err(|e| {
                RagError::Embedding(format!(
                    "Failed to process batch of {} texts: {:#}",
                    chunk.len(),
                    e
                ))
            })?;
            results.extend(batch);
        }

        debug!("Generated {} embeddings total", results.len());
        Ok(results)
    }

    #[inline]
    fn model_name(&self) -> &str {
        &self.model
    }
}
