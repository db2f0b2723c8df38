// Embeddings module
// Turns query text into vectors for similarity search

pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

pub use openai::OpenAiEmbedder;

/// Converts text into a fixed-length embedding vector.
///
/// Implementations issue one request per call with no retry, caching or
/// batching; transport failures are returned unmodified.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
