
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::Embedder;
use crate::config::Config;
use crate::http::{self, Headers};

/// Client for an OpenAI-compatible `/embeddings` endpoint
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    base_url: Url,
    api_key: String,
    model: String,
    dimension: Option<usize>,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .openai
            .base_url()
            .context("Failed to build OpenAI URL from config")?;

        Ok(Self {
            base_url,
            api_key: config.openai.api_key.clone(),
            model: config.openai.embedding_model.clone(),
            dimension: Some(config.openai.embedding_dimension as usize),
            agent: http::build_agent(Duration::from_secs(config.http.timeout_seconds)),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = http::build_agent(timeout);
        self
    }

    /// Skip the dimension check, for backends whose model size is not known up front
    #[inline]
    pub fn without_dimension_check(mut self) -> Self {
        self.dimension = None;
        self
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Verify the endpoint is reachable and the embedding model exists
    #[inline]
    pub fn health_check(&self) -> Result<()> {
        let url = self
            .base_url
            .join(&format!("models/{}", self.model))
            .context("Failed to build model URL")?;

        debug!("Checking embedding model at {}", url);

        http::get_text(&self.agent, &url, &self.headers())
            .with_context(|| format!("Embedding model '{}' is not available", self.model))?;

        info!("Embedding model {} is available at {}", self.model, self.base_url);
        Ok(())
    }

    /// Generate an embedding for a single text input
    #[inline]
    pub fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let url = self
            .base_url
            .join("embeddings")
            .context("Failed to build embedding URL")?;

        let request_json = serde_json::to_string(&EmbeddingRequest {
            model: &self.model,
            input: text,
        })
        .context("Failed to serialize embedding request")?;

        let response_text = http::post_json(&self.agent, &url, &self.headers(), &request_json)
            .context("Failed to generate embedding")?;

        let response: EmbeddingResponse = serde_json::from_str(&response_text)
            .context("Failed to parse embedding response")?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| anyhow!("Embedding response contained no data"))?;

        self.check_embedding(&embedding)?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }

    fn check_embedding(&self, embedding: &[f32]) -> Result<()> {
        if embedding.is_empty() {
            bail!("Embedding response contained an empty vector");
        }

        match self.dimension {
            Some(expected) if embedding.len() != expected => bail!(
                "Embedding dimension mismatch: expected {}, got {}",
                expected,
                embedding.len()
            ),
            _ => {}
        }

        if embedding.iter().any(|value| !value.is_finite()) {
            bail!("Embedding contains non-finite values");
        }

        Ok(())
    }

    fn headers(&self) -> Headers {
        http::bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    #[inline]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let client = self.clone();
        let text = text.to_string();
        http::run_blocking("Embedding", move || client.generate_embedding(&text)).await
    }
}
