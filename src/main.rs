use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use nutrition_rag::commands::{ask, build_index, chat, list_feedback, rate, search, show_status};
use nutrition_rag::config::{get_config_dir, run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "nutrition-rag")]
#[command(about = "Answer nutrition questions grounded in a nutrition dataset")]
#[command(version)]
struct Cli {
    /// Application directory holding config.toml, the index and relative data paths
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the embedding and generation services
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Embed the dataset and write a fresh index
    Build,
    /// Answer a nutrition question
    Ask {
        query: String,
        /// Record a rating for the answer
        #[arg(long, allow_negative_numbers = true)]
        rate: Option<i64>,
    },
    /// Answer questions read from standard input, one per line
    Chat,
    /// List the documents closest to a query
    Search {
        query: String,
        /// Number of documents to return (defaults to retrieval.top_k)
        #[arg(long)]
        k: Option<usize>,
    },
    /// Record a rating for the answer to a query
    Rate {
        query: String,
        #[arg(allow_negative_numbers = true)]
        rating: i64,
    },
    /// Show all recorded feedback
    Feedback,
    /// Show the state of the dataset, index and services
    Status,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => get_config_dir()?,
    };

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Build => build_index(&config_dir)?,
        Commands::Ask { query, rate } => ask(&config_dir, &query, rate)?,
        Commands::Chat => chat(&config_dir)?,
        Commands::Search { query, k } => search(&config_dir, &query, k)?,
        Commands::Rate { query, rating } => rate(&config_dir, &query, rating)?,
        Commands::Feedback => list_feedback(&config_dir)?,
        Commands::Status => show_status(&config_dir)?,
    }

    Ok(())
}
