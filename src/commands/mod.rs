
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::dataset::DocumentStore;
use crate::embeddings::{EmbeddingProvider, OllamaClient};
use crate::feedback::FeedbackStore;
use crate::generation;
use crate::index::{IndexArtifact, IndexBuilder};
use crate::rag::{Answerer, CachedAnswerer, RagContext, RagOrchestrator};
use crate::{FailureKind, RagError};

fn load_config(config_dir: &Path) -> Result<Config> {
    Config::load(config_dir)
        .with_context(|| format!("Failed to load configuration from {}", config_dir.display()))
}

fn embedding_provider(config: &Config) -> Result<Arc<dyn EmbeddingProvider>> {
    let client = OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?;
    Ok(Arc::new(client))
}

/// Tell the user what to do about a failed request
fn explain_failure(error: &RagError) {
    match error.kind() {
        FailureKind::NoData => {
            println!("No data available: the index is empty. Add documents and run 'build'.");
        }
        FailureKind::Upstream => {
            println!("An external service failed: {}", error);
            println!("Check that the embedding and generation services are reachable.");
        }
        FailureKind::Inconsistency => {
            println!("The index does not match the dataset: {}", error);
            println!("Run 'nutrition-rag build' to rebuild it.");
        }
        FailureKind::Configuration => {
            println!("Configuration problem: {}", error);
            println!("Run 'nutrition-rag config' to review the settings.");
        }
        FailureKind::Storage => {
            println!("Could not read or write local data: {}", error);
        }
    }
}

fn load_context(config: &Config) -> Result<RagContext> {
    RagContext::load(config).map_err(|e| {
        explain_failure(&e);
        anyhow::Error::new(e).context("Failed to load the dataset and index")
    })
}

/// Embed every dataset document and replace the persisted index
#[inline]
pub fn build_index(config_dir: &Path) -> Result<()> {
    let config = load_config(config_dir)?;
    let dataset_path = config.dataset_path();

    let store = DocumentStore::load_csv(&dataset_path, &config.dataset)
        .with_context(|| format!("Failed to load dataset {}", dataset_path.display()))?;
    println!(
        "📄 Loaded {} documents from {}",
        store.len(),
        dataset_path.display()
    );

    let provider = embedding_provider(&config)?;
    let builder = IndexBuilder::new(provider)
        .with_batch_size(config.ollama.batch_size as usize)
        .with_progress(true);

    let index_dir = config.index_dir();
    match builder.build_and_persist(&store, &index_dir) {
        Ok(output) => {
            println!(
                "✅ Indexed {} documents ({} dimensions) into {}",
                output.index.len(),
                output.index.dimension().unwrap_or_default(),
                index_dir.display()
            );
            Ok(())
        }
        Err(e) => {
            error!("Index build failed: {}", e);
            explain_failure(&e);
            println!("The previous index, if any, was left unchanged.");
            Err(anyhow::Error::new(e).context("Index build failed"))
        }
    }
}

/// Answer a question and optionally record a rating for it
#[inline]
pub fn ask(config_dir: &Path, query: &str, rating: Option<i64>) -> Result<()> {
    let config = load_config(config_dir)?;
    let context = load_context(&config)?;
    let generator =
        generation::from_config(&config).context("Failed to create generation client")?;

    let orchestrator = context.orchestrator(&config, generator);

    let answer = match orchestrator.answer(query) {
        Ok(answer) => answer,
        Err(e) => {
            explain_failure(&e);
            return Err(anyhow::Error::new(e).context("Failed to answer the question"));
        }
    };

    println!("{}", answer);

    if let Some(rating) = rating {
        rate(config_dir, query, rating)?;
    }

    Ok(())
}

/// Wrap the orchestrator in the answer cache when it is enabled
fn session_answerer(config: &Config, orchestrator: RagOrchestrator) -> Box<dyn Answerer> {
    if config.cache.enabled {
        Box::new(CachedAnswerer::new(orchestrator, config.cache.max_entries))
    } else {
        Box::new(orchestrator)
    }
}

/// Answer one question per input line until end of input.
///
/// Blank lines are skipped. A failed question is reported on `output` and
/// the session continues. Returns the number of questions answered.
#[inline]
pub fn answer_lines<R: BufRead, W: Write>(
    answerer: &dyn Answerer,
    input: R,
    mut output: W,
) -> Result<usize> {
    let mut answered = 0;
    for line in input.lines() {
        let line = line.context("Failed to read question")?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }

        match answerer.answer(query) {
            Ok(answer) => {
                writeln!(output, "{}", answer)?;
                answered += 1;
            }
            Err(e) => {
                warn!("Question failed: {}", e);
                writeln!(output, "❌ {}", e)?;
            }
        }
        writeln!(output)?;
        output.flush()?;
    }
    Ok(answered)
}

/// Answer questions from standard input until it is closed
#[inline]
pub fn chat(config_dir: &Path) -> Result<()> {
    let config = load_config(config_dir)?;
    let context = load_context(&config)?;
    let generator =
        generation::from_config(&config).context("Failed to create generation client")?;
    let answerer = session_answerer(&config, context.orchestrator(&config, generator));

    println!("💬 Ask a nutrition question per line (Ctrl-D to finish)");
    println!();
    let answered = answer_lines(
        answerer.as_ref(),
        std::io::stdin().lock(),
        std::io::stdout().lock(),
    )?;

    info!("Chat session answered {} questions", answered);
    Ok(())
}

/// Print the documents nearest to a query with their distances
#[inline]
pub fn search(config_dir: &Path, query: &str, k: Option<usize>) -> Result<()> {
    let config = load_config(config_dir)?;
    let context = load_context(&config)?;
    let k = k.unwrap_or(config.retrieval.top_k);

    let results = match context.retriever().retrieve_scored(query, k) {
        Ok(results) => results,
        Err(e) => {
            explain_failure(&e);
            return Err(anyhow::Error::new(e).context("Search failed"));
        }
    };

    println!("🔍 {} closest documents for \"{}\":", results.len(), query);
    println!();
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{:>3}. [{}] {} (distance {:.4})",
            rank + 1,
            result.document.id,
            result.document.description,
            result.distance
        );
    }

    Ok(())
}

/// Append a rating to the feedback log
#[inline]
pub fn rate(config_dir: &Path, query: &str, rating: i64) -> Result<()> {
    let config = load_config(config_dir)?;
    let store = FeedbackStore::new(config.feedback_path());

    store
        .record(query, rating)
        .context("Failed to record feedback")?;

    info!("Recorded feedback for query");
    println!("📝 Thank you for your feedback ({})", rating);
    Ok(())
}

/// Print every recorded rating in the order given
#[inline]
pub fn list_feedback(config_dir: &Path) -> Result<()> {
    let config = load_config(config_dir)?;
    let store = FeedbackStore::new(config.feedback_path());
    let records = store
        .all_records()
        .context("Failed to read feedback log")?;

    if records.is_empty() {
        println!("No feedback has been recorded yet.");
        println!("Use 'nutrition-rag rate <query> <rating>' to add some.");
        return Ok(());
    }

    println!("User Feedback ({} records):", records.len());
    println!();
    for record in &records {
        println!("{:>4}  {}", record.rating, record.query);
    }

    Ok(())
}

/// Show the state of the dataset, the index and the feedback log
#[inline]
pub fn show_status(config_dir: &Path) -> Result<()> {
    let config = load_config(config_dir)?;

    println!("📊 Nutrition RAG Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("📄 Dataset:");
    let dataset_path = config.dataset_path();
    let store = match DocumentStore::load_csv(&dataset_path, &config.dataset) {
        Ok(store) => {
            println!("   ✅ {} documents in {}", store.len(), dataset_path.display());
            Some(store)
        }
        Err(e) => {
            println!("   ❌ Failed to load - {}", e);
            None
        }
    };

    println!("🔍 Index:");
    let index_dir = config.index_dir();
    if IndexArtifact::exists(&index_dir) {
        match IndexArtifact::load(&index_dir) {
            Ok(artifact) => {
                let manifest = &artifact.manifest;
                println!("   📊 Embeddings: {}", manifest.count);
                println!("   🔢 Dimension: {}", manifest.dimension);
                println!("   📋 Model: {}", manifest.embedding_model);
                println!(
                    "   🕒 Built: {}",
                    manifest.built_at.format("%Y-%m-%d %H:%M:%S")
                );

                if let Some(store) = &store {
                    match artifact.verify_against(store) {
                        Ok(()) => println!("   ✅ Consistent with the dataset"),
                        Err(e) => println!("   ⚠️  {} (run 'build' to fix)", e),
                    }
                }
                if manifest.embedding_model != config.ollama.model {
                    println!(
                        "   ⚠️  Configured embedding model is {}; rebuild to use it",
                        config.ollama.model
                    );
                }
            }
            Err(e) => println!("   ❌ Failed to load - {}", e),
        }
    } else {
        println!("   💤 Not built yet. Run 'nutrition-rag build'.");
    }

    println!("🤖 Services:");
    match OllamaClient::new(&config.ollama) {
        Ok(client) => match client.health_check() {
            Ok(()) => println!(
                "   ✅ Ollama: Connected ({}), embedding model {}",
                client.base_url(),
                config.ollama.model
            ),
            Err(e) => println!("   ⚠️  Ollama: Unhealthy - {:#}", e),
        },
        Err(e) => println!("   ❌ Ollama: {}", e),
    }
    println!(
        "   📋 Generation: {} with model {} (max {} tokens)",
        config.generation.provider.as_str(),
        config.generation.model,
        config.generation.max_tokens
    );

    println!("📝 Feedback:");
    let feedback = FeedbackStore::new(config.feedback_path());
    match feedback.all_records() {
        Ok(records) => println!(
            "   {} records in {}",
            records.len(),
            feedback.path().display()
        ),
        Err(e) => println!("   ❌ {}", e),
    }

    Ok(())
}
