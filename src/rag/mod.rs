//! Retrieval-augmented question answering.
//!
//! [`RagOrchestrator::get_answer`] runs one strictly sequential pipeline:
//! validate, embed the query, search for similar chunks, build the context,
//! generate the answer. Each step's network call completes before the next
//! one starts, and a failure in any step aborts the rest.

pub mod context;
pub mod errors;
pub mod progress;


use anyhow::Result;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::config::settings::{
    DEFAULT_FALLBACK_ANSWER, DEFAULT_MATCH_COUNT, DEFAULT_MATCH_THRESHOLD,
};
use crate::embeddings::{Embedder, OpenAiEmbedder};
use crate::generation::{AnswerGenerator, OpenAiChatGenerator};
use crate::search::{RetrievedChunk, SupabaseVectorSearch, VectorSearch};

pub use context::{SOURCE_SEPARATOR, build_context, estimate_confidence};
pub use errors::{RagError, RagErrorKind};
pub use progress::{NoProgress, ProgressNotifier, SpinnerProgress, Stage};

/// Retrieval parameters for one query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryOptions {
    /// Minimum similarity a chunk needs to be returned, in `[0, 1]`
    pub match_threshold: f64,
    /// Maximum number of chunks to retrieve, at least 1
    pub match_count: usize,
}

impl Default for QueryOptions {
    #[inline]
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            match_count: DEFAULT_MATCH_COUNT,
        }
    }
}

impl QueryOptions {
    #[inline]
    pub fn from_config(config: &Config) -> Self {
        Self {
            match_threshold: config.rag.match_threshold,
            match_count: config.rag.match_count,
        }
    }

    fn validate(&self) -> Result<(), RagError> {
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(RagError::validation(format!(
                "match threshold must be between 0 and 1, got {}",
                self.match_threshold
            )));
        }

        if self.match_count == 0 {
            return Err(RagError::validation("match count must be at least 1"));
        }

        Ok(())
    }
}

/// Outcome of a successful `get_answer` call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RagResult {
    pub answer: String,
    pub sources: Vec<RetrievedChunk>,
    pub confidence: f64,
    #[serde(rename = "processing_time_ms", serialize_with = "serialize_millis")]
    pub processing_time: Duration,
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Composes embedding, vector search and answer generation.
///
/// Holds no per-call state, so one orchestrator can serve concurrent callers.
#[derive(Clone)]
pub struct RagOrchestrator {
    embedder: Arc<dyn Embedder>,
    search: Arc<dyn VectorSearch>,
    generator: Arc<dyn AnswerGenerator>,
    progress: Arc<dyn ProgressNotifier>,
    fallback_answer: String,
}

impl RagOrchestrator {
    #[inline]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        search: Arc<dyn VectorSearch>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        Self {
            embedder,
            search,
            generator,
            progress: Arc::new(NoProgress),
            fallback_answer: DEFAULT_FALLBACK_ANSWER.to_string(),
        }
    }

    /// Wire up the OpenAI and Supabase backends described by `config`
    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder = OpenAiEmbedder::new(config)?;
        let search = SupabaseVectorSearch::new(config)?;
        let generator = OpenAiChatGenerator::new(config)?;

        Ok(
            Self::new(Arc::new(embedder), Arc::new(search), Arc::new(generator))
                .with_fallback_answer(config.rag.fallback_answer.clone()),
        )
    }

    #[inline]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    /// Answer returned when no chunk clears the similarity threshold
    #[inline]
    pub fn with_fallback_answer(mut self, fallback_answer: impl Into<String>) -> Self {
        self.fallback_answer = fallback_answer.into();
        self
    }

    #[inline]
    pub fn fallback_answer(&self) -> &str {
        &self.fallback_answer
    }

    /// Answer `query` from the knowledge base.
    ///
    /// An empty search result is not an error: it yields the fallback answer
    /// with no sources and zero confidence, without calling the generator.
    #[inline]
    pub async fn get_answer(
        &self,
        query: &str,
        options: QueryOptions,
    ) -> Result<RagResult, RagError> {
        let started = Instant::now();

        let query = query.trim();
        if query.is_empty() {
            return Err(RagError::validation("query must not be empty"));
        }
        options.validate()?;

        let outcome = self.run_pipeline(query, options, started).await;
        self.progress.finished(outcome.is_ok());

        match &outcome {
            Ok(result) => info!(
                "Answered query with {} sources, confidence {:.2} in {:?}",
                result.sources.len(),
                result.confidence,
                result.processing_time
            ),
            Err(e) => error!("Query failed at {} step: {}", e.kind(), e.message()),
        }

        outcome
    }

    async fn run_pipeline(
        &self,
        query: &str,
        options: QueryOptions,
        started: Instant,
    ) -> Result<RagResult, RagError> {
        debug!(
            "Answering query ({} chars), threshold={}, count={}",
            query.len(),
            options.match_threshold,
            options.match_count
        );

        self.progress.stage_started(Stage::Embedding);
        let embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|source| RagError::Embedding { source })?;
        debug!("Query embedded into {} dimensions", embedding.len());

        self.progress.stage_started(Stage::Searching);
        let chunks = self
            .search
            .search(&embedding, options.match_threshold, options.match_count)
            .await
            .map_err(|source| RagError::Search { source })?;
        debug!("Retrieved {} chunks", chunks.len());

        if chunks.is_empty() {
            info!("No chunks above threshold {}", options.match_threshold);
            return Ok(RagResult {
                answer: self.fallback_answer.clone(),
                sources: Vec::new(),
                confidence: 0.0,
                processing_time: started.elapsed(),
            });
        }

        let confidence = estimate_confidence(&chunks);
        let context = build_context(&chunks);
        debug!(
            "Built context of {} chars, confidence {:.2}",
            context.len(),
            confidence
        );

        self.progress.stage_started(Stage::Generating);
        let answer = self
            .generator
            .generate(&context, query)
            .await
            .map_err(|source| RagError::Generation { source })?;

        Ok(RagResult {
            answer,
            sources: chunks,
            confidence,
            processing_time: started.elapsed(),
        })
    }
}
