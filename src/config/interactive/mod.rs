
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Password};

use super::{Config, ConfigError, HttpConfig, OpenAiConfig, RagConfig, SupabaseConfig};
use crate::embeddings::OpenAiEmbedder;
use crate::generation::OpenAiChatGenerator;
use crate::search::SupabaseVectorSearch;

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("🕷  SmartSpidy Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("OpenAI Configuration").bold().yellow());
    eprintln!("Configure the embedding and chat-completion endpoints.");
    eprintln!();
    configure_openai(&mut config.openai)?;

    eprintln!();
    eprintln!("{}", style("Supabase Configuration").bold().yellow());
    eprintln!("Configure the project that stores the knowledge chunks.");
    eprintln!();
    configure_supabase(&mut config.supabase)?;

    eprintln!();
    eprintln!("{}", style("Retrieval Settings").bold().yellow());
    eprintln!();
    configure_rag(&mut config.rag)?;

    eprintln!();
    eprintln!("{}", style("HTTP Settings").bold().yellow());
    eprintln!();
    configure_http(&mut config.http)?;

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());
    test_connections(&config);

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("OpenAI Settings:").bold().yellow());
    eprintln!("  Base URL: {}", style(&config.openai.base_url).cyan());
    eprintln!("  API Key: {}", style(mask_secret(&config.openai.api_key)).cyan());
    eprintln!(
        "  Embedding Model: {} ({} dimensions)",
        style(&config.openai.embedding_model).cyan(),
        config.openai.embedding_dimension
    );
    eprintln!("  Chat Model: {}", style(&config.openai.chat_model).cyan());
    eprintln!("  Temperature: {}", style(config.openai.temperature).cyan());
    eprintln!("  Max Tokens: {}", style(config.openai.max_tokens).cyan());

    eprintln!();
    eprintln!("{}", style("Supabase Settings:").bold().yellow());
    eprintln!("  URL: {}", style(&config.supabase.url).cyan());
    eprintln!(
        "  API Key: {}",
        style(mask_secret(&config.supabase.api_key)).cyan()
    );
    eprintln!(
        "  Match Function: {}",
        style(&config.supabase.match_function).cyan()
    );

    eprintln!();
    eprintln!("{}", style("Retrieval Settings:").bold().yellow());
    eprintln!(
        "  Match Threshold: {}",
        style(config.rag.match_threshold).cyan()
    );
    eprintln!("  Match Count: {}", style(config.rag.match_count).cyan());
    eprintln!(
        "  HTTP Timeout: {}s",
        style(config.http.timeout_seconds).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

/// Render a secret with everything but its last four characters hidden
pub(crate) fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        len if len <= 8 => "*".repeat(len),
        len => {
            let tail: String = chars[len - 4..].iter().collect();
            format!("{}{}", "*".repeat(8), tail)
        }
    }
}

fn load_existing_config() -> Result<Config> {
    let config_dir = Config::config_dir().context("Failed to determine config directory")?;
    Config::load_from(&config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config {
                base_dir: config_dir.clone(),
                ..Config::default()
            })
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_openai(openai: &mut OpenAiConfig) -> Result<()> {
    let base_url: String = Input::new()
        .with_prompt("API base URL")
        .default(openai.base_url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let mut probe = OpenAiConfig::default();
            probe.set_base_url(input.clone())
        })
        .interact_text()?;

    let api_key = Password::new()
        .with_prompt("API key (leave empty to keep current)")
        .allow_empty_password(true)
        .interact()?;

    let embedding_model: String = Input::new()
        .with_prompt("Embedding model")
        .default(openai.embedding_model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let embedding_dimension: u32 = Input::new()
        .with_prompt("Embedding dimension")
        .default(openai.embedding_dimension)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if (64..=4096).contains(input) {
                Ok(())
            } else {
                Err("Dimension must be between 64 and 4096")
            }
        })
        .interact_text()?;

    let chat_model: String = Input::new()
        .with_prompt("Chat model")
        .default(openai.chat_model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let temperature: f32 = Input::new()
        .with_prompt("Sampling temperature (0.0 - 2.0)")
        .default(openai.temperature)
        .validate_with(|input: &f32| -> Result<(), &str> {
            if (0.0..=2.0).contains(input) {
                Ok(())
            } else {
                Err("Temperature must be between 0.0 and 2.0")
            }
        })
        .interact_text()?;

    let max_tokens: u32 = Input::new()
        .with_prompt("Maximum answer tokens")
        .default(openai.max_tokens)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if (1..=16384).contains(input) {
                Ok(())
            } else {
                Err("Max tokens must be between 1 and 16384")
            }
        })
        .interact_text()?;

    openai.set_base_url(base_url)?;
    if !api_key.is_empty() {
        openai.api_key = api_key;
    }
    openai.set_embedding_model(embedding_model)?;
    openai.set_embedding_dimension(embedding_dimension)?;
    openai.set_chat_model(chat_model)?;
    openai.set_temperature(temperature)?;
    openai.set_max_tokens(max_tokens)?;

    Ok(())
}

fn configure_supabase(supabase: &mut SupabaseConfig) -> Result<()> {
    let url: String = Input::new()
        .with_prompt("Supabase project URL")
        .default(supabase.url.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let mut probe = SupabaseConfig::default();
            probe.set_url(input.clone())
        })
        .interact_text()?;

    let api_key = Password::new()
        .with_prompt("Supabase anon key (leave empty to keep current)")
        .allow_empty_password(true)
        .interact()?;

    let match_function: String = Input::new()
        .with_prompt("Similarity search function")
        .default(supabase.match_function.clone())
        .interact_text()?;

    supabase.set_url(url)?;
    if !api_key.is_empty() {
        supabase.api_key = api_key;
    }
    supabase.set_match_function(match_function)?;

    Ok(())
}

fn configure_rag(rag: &mut RagConfig) -> Result<()> {
    let match_threshold: f64 = Input::new()
        .with_prompt("Minimum similarity (0.0 - 1.0)")
        .default(rag.match_threshold)
        .validate_with(|input: &f64| -> Result<(), &str> {
            if (0.0..=1.0).contains(input) {
                Ok(())
            } else {
                Err("Threshold must be between 0.0 and 1.0")
            }
        })
        .interact_text()?;

    let match_count: usize = Input::new()
        .with_prompt("Number of chunks to retrieve")
        .default(rag.match_count)
        .validate_with(|input: &usize| -> Result<(), &str> {
            if (1..=100).contains(input) {
                Ok(())
            } else {
                Err("Count must be between 1 and 100")
            }
        })
        .interact_text()?;

    let fallback_answer: String = Input::new()
        .with_prompt("Answer when nothing relevant is found")
        .default(rag.fallback_answer.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Fallback answer cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    rag.set_match_threshold(match_threshold)?;
    rag.set_match_count(match_count)?;
    rag.set_fallback_answer(fallback_answer)?;

    Ok(())
}

fn configure_http(http: &mut HttpConfig) -> Result<()> {
    let timeout_seconds: u64 = Input::new()
        .with_prompt("Request timeout in seconds")
        .default(http.timeout_seconds)
        .validate_with(|input: &u64| -> Result<(), &str> {
            if (1..=600).contains(input) {
                Ok(())
            } else {
                Err("Timeout must be between 1 and 600 seconds")
            }
        })
        .interact_text()?;

    http.set_timeout_seconds(timeout_seconds)?;

    Ok(())
}

/// Run every service health check, in pipeline order
pub(crate) fn check_connections(config: &Config) -> Vec<(&'static str, Result<()>)> {
    vec![
        (
            "OpenAI embeddings",
            OpenAiEmbedder::new(config).and_then(|embedder| embedder.health_check()),
        ),
        (
            "Supabase",
            SupabaseVectorSearch::new(config).and_then(|search| search.health_check()),
        ),
        (
            "OpenAI chat",
            OpenAiChatGenerator::new(config).and_then(|generator| generator.health_check()),
        ),
    ]
}

fn test_connections(config: &Config) {
    for (service, outcome) in check_connections(config) {
        match outcome {
            Ok(()) => eprintln!(
                "{}",
                style(format!("✓ {} connection successful!", service)).green()
            ),
            Err(e) => eprintln!(
                "{}",
                style(format!("⚠ Warning: Could not reach {}: {:#}", service, e)).yellow()
            ),
        }
    }
}
