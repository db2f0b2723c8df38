use clap::{Parser, Subcommand};
use smartspidy_rag::Result;
use smartspidy_rag::commands::{ask, show_status};
use smartspidy_rag::config::{run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "smartspidy-rag")]
#[command(about = "Answer questions from the SmartSpidy knowledge base")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure OpenAI, Supabase and retrieval settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Ask a question and print the grounded answer
    Ask {
        /// The question to answer
        query: String,
        /// Minimum similarity (0.0 - 1.0) a chunk needs to be used as a source
        #[arg(long)]
        threshold: Option<f64>,
        /// Maximum number of chunks to retrieve
        #[arg(long)]
        count: Option<usize>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check connectivity to the embedding, search and chat services
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Ask {
            query,
            threshold,
            count,
            json,
        } => {
            ask(&query, threshold, count, json).await?;
        }
        Commands::Status => {
            show_status().await?;
        }
    }

    Ok(())
}
