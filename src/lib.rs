use thiserror::Error;

pub type Result<T> = std::result::Result<T, SpidyError>;

#[derive(Error, Debug)]
pub enum SpidyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error(transparent)]
    Rag(#[from] rag::RagError),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod embeddings;
pub mod generation;
pub mod http;
pub mod rag;
pub mod search;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn io_failures_keep_their_context() {
        let failure: anyhow::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only file system",
        ))
        .context("Failed to write config file: /tmp/config.toml");

        let error = SpidyError::from(failure.unwrap_err());

        assert!(matches!(error, SpidyError::Other(_)));
        assert_eq!(
            error.to_string(),
            "Other error: Failed to write config file: /tmp/config.toml"
        );
    }
}
