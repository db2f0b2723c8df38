//! Failure taxonomy for the question-answering pipeline.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which pipeline step a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RagErrorKind {
    Validation,
    Embedding,
    Search,
    Generation,
    Unknown,
}

impl RagErrorKind {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Embedding => "embedding",
            Self::Search => "search",
            Self::Generation => "generation",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RagErrorKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed `get_answer` call.
///
/// Every variant except `Validation` keeps the underlying error as its
/// source so callers can inspect the original failure.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("Invalid query: {message}")]
    Validation { message: String },

    #[error("Failed to generate query embedding: {source}")]
    Embedding {
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to search the knowledge base: {source}")]
    Search {
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to generate an answer: {source}")]
    Generation {
        #[source]
        source: anyhow::Error,
    },

    #[error("Unexpected error: {source}")]
    Unknown {
        #[source]
        source: anyhow::Error,
    },
}

impl RagError {
    #[inline]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[inline]
    pub fn kind(&self) -> RagErrorKind {
        match self {
            Self::Validation { .. } => RagErrorKind::Validation,
            Self::Embedding { .. } => RagErrorKind::Embedding,
            Self::Search { .. } => RagErrorKind::Search,
            Self::Generation { .. } => RagErrorKind::Generation,
            Self::Unknown { .. } => RagErrorKind::Unknown,
        }
    }

    /// Human-readable description including the full cause chain
    #[inline]
    pub fn message(&self) -> String {
        match self {
            Self::Validation { message } => format!("Invalid query: {}", message),
            Self::Embedding { source } => {
                format!("Failed to generate query embedding: {:#}", source)
            }
            Self::Search { source } => format!("Failed to search the knowledge base: {:#}", source),
            Self::Generation { source } => format!("Failed to generate an answer: {:#}", source),
            Self::Unknown { source } => format!("Unexpected error: {:#}", source),
        }
    }

    /// The original error this failure wraps, if any
    #[inline]
    pub fn details(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Validation { .. } => None,
            Self::Embedding { source }
            | Self::Search { source }
            | Self::Generation { source }
            | Self::Unknown { source } => Some(source),
        }
    }
}

impl From<anyhow::Error> for RagError {
    #[inline]
    fn from(source: anyhow::Error) -> Self {
        Self::Unknown { source }
    }
}
