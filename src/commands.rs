use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::embeddings::OpenAiEmbedder;
use crate::generation::OpenAiChatGenerator;
use crate::http::run_blocking;
use crate::rag::{
    NoProgress, ProgressNotifier, QueryOptions, RagOrchestrator, RagResult, SpinnerProgress,
};
use crate::search::SupabaseVectorSearch;
use crate::{Result, SpidyError};

/// Ask a single question and print the answer with its sources
#[inline]
pub async fn ask(
    query: &str,
    threshold: Option<f64>,
    count: Option<usize>,
    json: bool,
) -> Result<()> {
    let config = load_config()?;

    let mut options = QueryOptions::from_config(&config);
    if let Some(threshold) = threshold {
        options.match_threshold = threshold;
    }
    if let Some(count) = count {
        options.match_count = count;
    }

    let progress: Arc<dyn ProgressNotifier> = if json {
        Arc::new(NoProgress)
    } else {
        Arc::new(SpinnerProgress::new())
    };

    let orchestrator = RagOrchestrator::from_config(&config)?.with_progress(progress);
    let result = orchestrator.get_answer(query, options).await?;

    if json {
        let rendered = serde_json::to_string_pretty(&result)
            .map_err(|e| SpidyError::Other(anyhow::Error::from(e)))?;
        println!("{}", rendered);
    } else {
        print!("{}", format_answer(&result));
    }

    Ok(())
}

/// Check connectivity to every service the pipeline depends on
#[inline]
pub async fn show_status() -> Result<()> {
    let config = load_config()?;

    println!("📊 SmartSpidy Status Report");
    println!("{}", "=".repeat(50));
    println!();

    let mut failures = 0;

    println!("🧮 Embeddings:");
    let embedder = OpenAiEmbedder::new(&config)
        .map_err(|e| SpidyError::Embedding(format!("{:#}", e)))?;
    let model = embedder.model().to_string();
    match run_blocking("Embedding health check", move || embedder.health_check()).await {
        Ok(()) => println!("   ✅ Model {} available at {}", model, config.openai.base_url),
        Err(e) => {
            failures += 1;
            println!("   ❌ {:#}", e);
        }
    }

    println!("🔍 Vector Search:");
    let search = SupabaseVectorSearch::new(&config)
        .map_err(|e| SpidyError::Search(format!("{:#}", e)))?;
    match run_blocking("Supabase health check", move || search.health_check()).await {
        Ok(()) => println!(
            "   ✅ {} reachable, using {}()",
            config.supabase.url, config.supabase.match_function
        ),
        Err(e) => {
            failures += 1;
            println!("   ❌ {:#}", e);
        }
    }

    println!("💬 Answer Generation:");
    let generator = OpenAiChatGenerator::new(&config)
        .map_err(|e| SpidyError::Generation(format!("{:#}", e)))?;
    let model = generator.model().to_string();
    match run_blocking("Chat health check", move || generator.health_check()).await {
        Ok(()) => println!("   ✅ Model {} available", model),
        Err(e) => {
            failures += 1;
            println!("   ❌ {:#}", e);
        }
    }

    println!();
    println!(
        "⚙️  Retrieval: threshold {}, up to {} chunks",
        config.rag.match_threshold, config.rag.match_count
    );

    if failures > 0 {
        warn!("{} of 3 services failed their health check", failures);
        return Err(SpidyError::Network(format!(
            "{} of 3 services are unavailable",
            failures
        )));
    }

    info!("All services healthy");
    Ok(())
}

fn load_config() -> Result<Config> {
    Config::load().map_err(|e| SpidyError::Config(format!("{:#}", e)))
}

/// Human-readable rendering of a pipeline result
#[inline]
pub fn format_answer(result: &RagResult) -> String {
    AnswerReport(result).to_string()
}

struct AnswerReport<'a>(&'a RagResult);

impl fmt::Display for AnswerReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        writeln!(f, "{}\n", result.answer)?;
        writeln!(
            f,
            "Confidence: {:.0}%  ·  {} ms",
            result.confidence * 100.0,
            result.processing_time.as_millis()
        )?;

        if !result.sources.is_empty() {
            writeln!(f, "\nSources:")?;
            for (index, source) in result.sources.iter().enumerate() {
                let preview: String = source.chunk.chars().take(80).collect();
                writeln!(
                    f,
                    "  [{}] {:.1}%  #{}  {}",
                    index + 1,
                    source.similarity * 100.0,
                    source.id,
                    preview.replace('\n', " ")
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::RetrievedChunk;
    use std::time::Duration;

    #[test]
    fn format_answer_lists_sources() {
        let result = RagResult {
            answer: "Fundraising means raising funds.".to_string(),
            sources: vec![RetrievedChunk::new("42", "Fundraising is...\nmore", 0.75)],
            confidence: 0.75,
            processing_time: Duration::from_millis(320),
        };

        let rendered = format_answer(&result);

        assert!(rendered.starts_with("Fundraising means raising funds.\n\n"));
        assert!(rendered.contains("Confidence: 75%  ·  320 ms"));
        assert!(rendered.contains("  [1] 75.0%  #42  Fundraising is... more\n"));
    }

    #[test]
    fn format_answer_without_sources() {
        let result = RagResult {
            answer: "No idea.".to_string(),
            sources: Vec::new(),
            confidence: 0.0,
            processing_time: Duration::from_millis(5),
        };

        let rendered = format_answer(&result);
        assert!(!rendered.contains("Sources:"));
        assert!(rendered.contains("Confidence: 0%"));
    }

    #[test]
    fn format_answer_numbers_every_source() {
        let result = RagResult {
            answer: "Use the reminders tab.".to_string(),
            sources: vec![
                RetrievedChunk::new("1", "Reminders live in the app.", 0.91),
                RetrievedChunk::new("2", "Set a reminder from any event.", 0.8),
            ],
            confidence: 0.86,
            processing_time: Duration::from_millis(12),
        };

        let rendered = format_answer(&result);

        assert_eq!(
            rendered,
            "Use the reminders tab.\n\n\
             Confidence: 86%  ·  12 ms\n\
             \nSources:\n\
             \x20 [1] 91.0%  #1  Reminders live in the app.\n\
             \x20 [2] 80.0%  #2  Set a reminder from any event.\n"
        );
    }
}
