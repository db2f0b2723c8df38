
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use super::{RetrievedChunk, VectorSearch};
use crate::config::Config;
use crate::http::{self, Headers};

/// Similarity search through a Supabase (PostgREST) RPC function
#[derive(Debug, Clone)]
pub struct SupabaseVectorSearch {
    project_url: Url,
    api_key: String,
    match_function: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct MatchRequest<'a> {
    query_embedding: &'a [f32],
    match_threshold: f64,
    match_count: usize,
}

#[derive(Debug, Deserialize)]
struct MatchRow {
    id: RowId,
    #[serde(alias = "content")]
    chunk: String,
    #[serde(default)]
    combined_text: Option<String>,
    similarity: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RowId {
    Number(i64),
    Text(String),
}

impl From<MatchRow> for RetrievedChunk {
    fn from(row: MatchRow) -> Self {
        let id = match row.id {
            RowId::Number(n) => n.to_string(),
            RowId::Text(s) => s,
        };
        let text = row
            .combined_text
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| row.chunk.clone());

        Self {
            id,
            chunk: row.chunk,
            text,
            similarity: row.similarity,
        }
    }
}

impl SupabaseVectorSearch {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let project_url = config
            .supabase
            .project_url()
            .context("Failed to build Supabase URL from config")?;

        Ok(Self {
            project_url,
            api_key: config.supabase.api_key.clone(),
            match_function: config.supabase.match_function.clone(),
            agent: http::build_agent(Duration::from_secs(config.http.timeout_seconds)),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = http::build_agent(timeout);
        self
    }

    /// Verify the REST endpoint answers with the configured key
    #[inline]
    pub fn health_check(&self) -> Result<()> {
        let url = self
            .project_url
            .join("rest/v1/")
            .context("Failed to build Supabase REST URL")?;

        debug!("Checking Supabase REST endpoint at {}", url);

        http::get_text(&self.agent, &url, &self.headers())
            .context("Supabase REST endpoint is not reachable")?;

        info!("Supabase REST endpoint reachable at {}", self.project_url);
        Ok(())
    }

    /// Call the match function and return chunks ordered by similarity
    #[inline]
    pub fn match_chunks(
        &self,
        embedding: &[f32],
        match_threshold: f64,
        match_count: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        debug!(
            "Searching for similar chunks: threshold={}, count={}",
            match_threshold, match_count
        );

        let url = self
            .project_url
            .join(&format!("rest/v1/rpc/{}", self.match_function))
            .context("Failed to build RPC URL")?;

        let request_json = serde_json::to_string(&MatchRequest {
            query_embedding: embedding,
            match_threshold,
            match_count,
        })
        .context("Failed to serialize match request")?;

        let response_text = http::post_json(&self.agent, &url, &self.headers(), &request_json)
            .with_context(|| format!("Failed to call {}", self.match_function))?;

        let rows: Vec<MatchRow> =
            serde_json::from_str(&response_text).context("Failed to parse match results")?;

        let mut chunks: Vec<RetrievedChunk> = rows.into_iter().map(RetrievedChunk::from).collect();
        order_by_similarity(&mut chunks);

        if chunks.len() > match_count {
            warn!(
                "{} returned {} rows for match_count {}, truncating",
                self.match_function,
                chunks.len(),
                match_count
            );
            chunks.truncate(match_count);
        }

        debug!("Found {} matching chunks", chunks.len());
        Ok(chunks)
    }

    fn headers(&self) -> Headers {
        let mut headers = vec![("apikey", self.api_key.clone())];
        headers.extend(http::bearer_auth(&self.api_key));
        headers
    }
}

/// Stable sort, highest similarity first
fn order_by_similarity(chunks: &mut [RetrievedChunk]) {
    chunks.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
}

#[async_trait]
impl VectorSearch for SupabaseVectorSearch {
    #[inline]
    async fn search(
        &self,
        embedding: &[f32],
        match_threshold: f64,
        match_count: usize,
    ) -> Result<Vec<RetrievedChunk>> {
        let client = self.clone();
        let embedding = embedding.to_vec();
        http::run_blocking("Vector search", move || {
            client.match_chunks(&embedding, match_threshold, match_count)
        })
        .await
    }
}
