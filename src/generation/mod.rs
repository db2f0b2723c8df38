// Answer generation module
// Chat-completion calls grounded in retrieved context

pub mod openai;

use anyhow::Result;
use async_trait::async_trait;

pub use openai::OpenAiChatGenerator;

/// Produces a free-text answer to `query` grounded in `context`
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, context: &str, query: &str) -> Result<String>;
}
