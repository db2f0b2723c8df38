
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::http::DEFAULT_TIMEOUT_SECONDS;

pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 1536;
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.7;
pub const DEFAULT_MATCH_COUNT: usize = 5;
pub const DEFAULT_FALLBACK_ANSWER: &str = "I couldn't find any relevant information in my knowledge base to answer your question. Please try rephrasing it or ask about something else.";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are SmartSpidy, a helpful assistant. Answer the user's question using only the information in the context below. If the context does not contain the answer, say that you don't know. Keep answers concise and factual.";

pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";
pub const SUPABASE_URL_VAR: &str = "SUPABASE_URL";
pub const SUPABASE_KEY_VAR: &str = "SUPABASE_ANON_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Settings for the OpenAI-compatible embedding and chat-completion endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub api_key: String,
    pub embedding_model: String,
    pub embedding_dimension: u32,
    pub chat_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1/".to_string(),
            api_key: String::new(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            chat_model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 500,
        }
    }
}

/// Settings for the Supabase project holding the knowledge chunks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: String,
    pub api_key: String,
    pub match_function: String,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            match_function: "match_knowledge_chunks".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RagConfig {
    pub match_threshold: f64,
    pub match_count: usize,
    pub fallback_answer: String,
    pub system_prompt: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            match_count: DEFAULT_MATCH_COUNT,
            fallback_answer: DEFAULT_FALLBACK_ANSWER.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid embedding dimension: {0} (must be between 64 and 4096)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid temperature: {0} (must be between 0.0 and 2.0)")]
    InvalidTemperature(f32),
    #[error("Invalid max tokens: {0} (must be between 1 and 16384)")]
    InvalidMaxTokens(u32),
    #[error("Invalid match function: {0} (cannot be empty)")]
    InvalidMatchFunction(String),
    #[error("Invalid match threshold: {0} (must be between 0.0 and 1.0)")]
    InvalidMatchThreshold(f64),
    #[error("Invalid match count: {0} (must be between 1 and 100)")]
    InvalidMatchCount(usize),
    #[error("Fallback answer cannot be empty")]
    EmptyFallbackAnswer,
    #[error("Invalid HTTP timeout: {0} (must be between 1 and 600 seconds)")]
    InvalidTimeout(u64),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Default configuration directory, `~/.smartspidy`
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".smartspidy"))
            .or_else(|| dirs::data_dir().map(|data| data.join("smartspidy")))
            .ok_or(ConfigError::DirectoryError)
    }

    /// Load configuration from the default directory, applying environment overrides
    #[inline]
    pub fn load() -> Result<Self> {
        let config_dir = Self::config_dir().context("Failed to determine config directory")?;
        let mut config = Self::load_from(config_dir)?;
        config.apply_env_overrides_with(|name| std::env::var(name).ok());
        config
            .validate()
            .context("Configuration validation failed after applying environment overrides")?;
        Ok(config)
    }

    /// Load configuration from `config.toml` inside `config_dir`, or defaults if absent
    #[inline]
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Overlay secrets and endpoints from environment variables.
    ///
    /// `lookup` maps a variable name to its value; empty values are ignored.
    #[inline]
    pub fn apply_env_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = non_empty(OPENAI_API_KEY_VAR) {
            self.openai.api_key = key;
        }
        if let Some(url) = non_empty(SUPABASE_URL_VAR) {
            self.supabase.url = url;
        }
        if let Some(key) = non_empty(SUPABASE_KEY_VAR) {
            self.supabase.api_key = key;
        }
    }

    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join("config.toml")
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.openai.validate()?;
        self.supabase.validate()?;
        self.rag.validate()?;
        self.http.validate()?;
        Ok(())
    }
}

/// Parse an http(s) URL and make sure it ends with a slash so relative joins append
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };

    let url = Url::parse(&with_slash).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidProtocol(url.scheme().to_string()));
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::InvalidUrl(raw.to_string()));
    }

    Ok(url)
}

impl OpenAiConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_base_url(&self.base_url)?;

        if self.embedding_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.embedding_model.clone()));
        }

        if self.chat_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.chat_model.clone()));
        }

        if !(64..=4096).contains(&self.embedding_dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding_dimension,
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }

        if !(1..=16384).contains(&self.max_tokens) {
            return Err(ConfigError::InvalidMaxTokens(self.max_tokens));
        }

        Ok(())
    }

    pub fn base_url(&self) -> Result<Url, ConfigError> {
        parse_base_url(&self.base_url)
    }

    pub fn set_base_url(&mut self, base_url: String) -> Result<(), ConfigError> {
        parse_base_url(&base_url)?;
        self.base_url = base_url;
        Ok(())
    }

    pub fn set_embedding_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.embedding_model = model;
        Ok(())
    }

    pub fn set_chat_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.chat_model = model;
        Ok(())
    }

    pub fn set_embedding_dimension(&mut self, dimension: u32) -> Result<(), ConfigError> {
        if !(64..=4096).contains(&dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(dimension));
        }
        self.embedding_dimension = dimension;
        Ok(())
    }

    pub fn set_temperature(&mut self, temperature: f32) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidTemperature(temperature));
        }
        self.temperature = temperature;
        Ok(())
    }

    pub fn set_max_tokens(&mut self, max_tokens: u32) -> Result<(), ConfigError> {
        if !(1..=16384).contains(&max_tokens) {
            return Err(ConfigError::InvalidMaxTokens(max_tokens));
        }
        self.max_tokens = max_tokens;
        Ok(())
    }
}

impl SupabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_base_url(&self.url)?;

        if self.match_function.trim().is_empty() {
            return Err(ConfigError::InvalidMatchFunction(
                self.match_function.clone(),
            ));
        }

        Ok(())
    }

    pub fn project_url(&self) -> Result<Url, ConfigError> {
        parse_base_url(&self.url)
    }

    pub fn set_url(&mut self, url: String) -> Result<(), ConfigError> {
        parse_base_url(&url)?;
        self.url = url;
        Ok(())
    }

    pub fn set_match_function(&mut self, match_function: String) -> Result<(), ConfigError> {
        if match_function.trim().is_empty() {
            return Err(ConfigError::InvalidMatchFunction(match_function));
        }
        self.match_function = match_function;
        Ok(())
    }
}

impl RagConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(ConfigError::InvalidMatchThreshold(self.match_threshold));
        }

        if !(1..=100).contains(&self.match_count) {
            return Err(ConfigError::InvalidMatchCount(self.match_count));
        }

        if self.fallback_answer.trim().is_empty() {
            return Err(ConfigError::EmptyFallbackAnswer);
        }

        Ok(())
    }

    pub fn set_match_threshold(&mut self, match_threshold: f64) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&match_threshold) {
            return Err(ConfigError::InvalidMatchThreshold(match_threshold));
        }
        self.match_threshold = match_threshold;
        Ok(())
    }

    pub fn set_match_count(&mut self, match_count: usize) -> Result<(), ConfigError> {
        if !(1..=100).contains(&match_count) {
            return Err(ConfigError::InvalidMatchCount(match_count));
        }
        self.match_count = match_count;
        Ok(())
    }

    pub fn set_fallback_answer(&mut self, fallback_answer: String) -> Result<(), ConfigError> {
        if fallback_answer.trim().is_empty() {
            return Err(ConfigError::EmptyFallbackAnswer);
        }
        self.fallback_answer = fallback_answer;
        Ok(())
    }
}

impl HttpConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=600).contains(&self.timeout_seconds) {
            return Err(ConfigError::InvalidTimeout(self.timeout_seconds));
        }
        Ok(())
    }

    pub fn set_timeout_seconds(&mut self, timeout_seconds: u64) -> Result<(), ConfigError> {
        if !(1..=600).contains(&timeout_seconds) {
            return Err(ConfigError::InvalidTimeout(timeout_seconds));
        }
        self.timeout_seconds = timeout_seconds;
        Ok(())
    }
}
