// Vector search module
// Similarity lookup against the remote knowledge store

pub mod supabase;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use supabase::SupabaseVectorSearch;

/// A knowledge chunk returned by similarity search.
///
/// Read-only projection of a row in the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    /// Raw chunk text as stored
    pub chunk: String,
    /// Text shown to the model, usually the chunk combined with its heading
    pub text: String,
    /// Similarity to the query, in `[0, 1]`
    pub similarity: f64,
}

impl RetrievedChunk {
    #[inline]
    pub fn new(id: impl Into<String>, text: impl Into<String>, similarity: f64) -> Self {
        let text = text.into();
        Self {
            id: id.into(),
            chunk: text.clone(),
            text,
            similarity,
        }
    }
}

/// Finds the stored chunks nearest to a query embedding.
///
/// Results must be ordered by similarity, highest first, and hold at most
/// `match_count` entries. Callers rely on this order and do not re-sort.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn search(
        &self,
        embedding: &[f32],
        match_threshold: f64,
        match_count: usize,
    ) -> Result<Vec<RetrievedChunk>>;
}
