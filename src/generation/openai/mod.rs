
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use super::AnswerGenerator;
use crate::config::Config;
use crate::http::{self, Headers};

/// Client for an OpenAI-compatible `/chat/completions` endpoint
#[derive(Debug, Clone)]
pub struct OpenAiChatGenerator {
    base_url: Url,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiChatGenerator {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .openai
            .base_url()
            .context("Failed to build OpenAI URL from config")?;

        Ok(Self {
            base_url,
            api_key: config.openai.api_key.clone(),
            model: config.openai.chat_model.clone(),
            temperature: config.openai.temperature,
            max_tokens: config.openai.max_tokens,
            system_prompt: config.rag.system_prompt.clone(),
            agent: http::build_agent(Duration::from_secs(config.http.timeout_seconds)),
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = http::build_agent(timeout);
        self
    }

    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Verify the endpoint is reachable and the chat model exists
    #[inline]
    pub fn health_check(&self) -> Result<()> {
        let url = self
            .base_url
            .join(&format!("models/{}", self.model))
            .context("Failed to build model URL")?;

        debug!("Checking chat model at {}", url);

        http::get_text(&self.agent, &url, &self.headers())
            .with_context(|| format!("Chat model '{}' is not available", self.model))?;

        info!("Chat model {} is available at {}", self.model, self.base_url);
        Ok(())
    }

    /// Ask the chat model to answer `query` using only `context`
    #[inline]
    pub fn complete(&self, context: &str, query: &str) -> Result<String> {
        debug!(
            "Requesting completion (context: {} chars, query: {} chars)",
            context.len(),
            query.len()
        );

        let url = self
            .base_url
            .join("chat/completions")
            .context("Failed to build chat completion URL")?;

        let request = ChatRequest {
            model: &self.model,
            messages: self.build_messages(context, query),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let request_json =
            serde_json::to_string(&request).context("Failed to serialize chat request")?;

        let response_text = http::post_json(&self.agent, &url, &self.headers(), &request_json)
            .context("Failed to generate answer")?;

        let response: ChatResponse =
            serde_json::from_str(&response_text).context("Failed to parse chat response")?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| anyhow!("Chat response contained no answer"))?;

        debug!("Received answer ({} chars)", answer.len());
        Ok(answer)
    }

    fn build_messages(&self, context: &str, query: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: "system".to_string(),
                content: format!("{}\n\nContext:\n{}", self.system_prompt, context),
            },
            ChatMessage {
                role: "user".to_string(),
                content: query.to_string(),
            },
        ]
    }

    fn headers(&self) -> Headers {
        http::bearer_auth(&self.api_key)
    }
}

#[async_trait]
impl AnswerGenerator for OpenAiChatGenerator {
    #[inline]
    async fn generate(&self, context: &str, query: &str) -> Result<String> {
        let client = self.clone();
        let context = context.to_string();
        let query = query.to_string();
        http::run_blocking("Answer generation", move || {
            client.complete(&context, &query)
        })
        .await
    }
}
