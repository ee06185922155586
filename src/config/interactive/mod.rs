
use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::path::{Path, PathBuf};

use super::{Config, ConfigError, GenerationConfig, GenerationProvider, OllamaConfig};

#[inline]
pub fn run_interactive_config(config_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🔧 Nutrition RAG Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(config_dir)?;

    eprintln!("{}", style("Ollama Configuration").bold().yellow());
    eprintln!("Configure your local Ollama instance for embedding generation.");
    eprintln!();

    configure_ollama(&mut config.ollama)?;

    eprintln!();
    eprintln!("{}", style("Answer Generation").bold().yellow());
    configure_generation(&mut config.generation)?;

    eprintln!();
    eprintln!("{}", style("Dataset").bold().yellow());
    let dataset_path: String = Input::new()
        .with_prompt("Preprocessed nutrition CSV")
        .default(config.dataset.path.display().to_string())
        .interact_text()?;
    config.dataset.path = PathBuf::from(dataset_path);

    eprintln!();
    eprintln!("{}", style("Testing configuration...").yellow());

    if test_ollama_connection(&config.ollama) {
        eprintln!("{}", style("✓ Ollama connection successful!").green());
    } else {
        eprintln!(
            "{}",
            style("⚠ Warning: Could not connect to Ollama").yellow()
        );
        eprintln!("You can continue, but make sure Ollama is running before building the index.");
    }

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
pub fn show_config(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Ollama Settings:").bold().yellow());
    eprintln!("  Host: {}", style(&config.ollama.host).cyan());
    eprintln!("  Port: {}", style(config.ollama.port).cyan());
    eprintln!("  Embedding Model: {}", style(&config.ollama.model).cyan());
    eprintln!("  Batch Size: {}", style(config.ollama.batch_size).cyan());
    match config.ollama_url() {
        Ok(url) => eprintln!("  Ollama URL: {}", style(url).cyan()),
        Err(e) => eprintln!("  Ollama URL: {} ({})", style("Invalid").red(), e),
    }

    eprintln!();
    eprintln!("{}", style("Generation:").bold().yellow());
    eprintln!(
        "  Provider: {}",
        style(config.generation.provider.as_str()).cyan()
    );
    eprintln!("  Model: {}", style(&config.generation.model).cyan());
    eprintln!("  Max Tokens: {}", style(config.generation.max_tokens).cyan());
    if config.generation.provider == GenerationProvider::OpenAi {
        eprintln!(
            "  Endpoint: {}",
            style(&config.generation.openai_base_url).cyan()
        );
        eprintln!(
            "  API Key Variable: {}",
            style(&config.generation.api_key_env).cyan()
        );
    }

    eprintln!();
    eprintln!("{}", style("Data:").bold().yellow());
    eprintln!(
        "  Dataset: {}",
        style(config.dataset_path().display()).cyan()
    );
    eprintln!(
        "  Columns: id = {}, description = {}",
        style(&config.dataset.id_column).cyan(),
        style(&config.dataset.description_column).cyan()
    );
    eprintln!("  Index: {}", style(config.index_dir().display()).cyan());
    eprintln!(
        "  Feedback Log: {}",
        style(config.feedback_path().display()).cyan()
    );
    eprintln!("  Top K: {}", style(config.retrieval.top_k).cyan());
    eprintln!(
        "  Answer Cache: {}",
        style(if config.cache.enabled {
            format!("enabled ({} entries)", config.cache.max_entries)
        } else {
            "disabled".to_string()
        })
        .cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config(config_dir: &Path) -> Result<Config> {
    Config::load(config_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            Ok(Config::new(config_dir))
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_ollama(ollama: &mut OllamaConfig) -> Result<()> {
    let protocols = &["http", "https"];
    let default_index = protocols
        .iter()
        .position(|&p| p == ollama.protocol)
        .unwrap_or(0);

    let protocol_index = Select::new()
        .with_prompt("Ollama protocol")
        .default(default_index)
        .items(protocols)
        .interact()?;

    let protocol = protocols[protocol_index].to_string();

    let host: String = Input::new()
        .with_prompt("Ollama host")
        .default(ollama.host.clone())
        .validate_with(|input: &String| -> Result<(), ConfigError> {
            let temp_config = OllamaConfig {
                protocol: protocol.clone(),
                host: input.clone(),
                ..OllamaConfig::default()
            };
            temp_config.validate()
        })
        .interact_text()?;

    let port: u16 = Input::new()
        .with_prompt("Ollama port")
        .default(ollama.port)
        .validate_with(|input: &u16| -> Result<(), &str> {
            if *input == 0 {
                Err("Port must be greater than 0")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let model: String = Input::new()
        .with_prompt("Embedding model")
        .default(ollama.model.clone())
        .validate_with(|input: &String| -> Result<(), &str> {
            if input.trim().is_empty() {
                Err("Model name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    let batch_size: u32 = Input::new()
        .with_prompt("Batch size for embedding generation")
        .default(ollama.batch_size)
        .validate_with(|input: &u32| -> Result<(), &str> {
            if *input == 0 {
                Err("Batch size must be greater than 0")
            } else if *input > 1000 {
                Err("Batch size must be 1000 or less")
            } else {
                Ok(())
            }
        })
        .interact_text()?;

    ollama.set_protocol(protocol)?;
    ollama.set_host(host)?;
    ollama.set_port(port)?;
    ollama.set_model(model)?;
    ollama.set_batch_size(batch_size)?;

    Ok(())
}

fn configure_generation(generation: &mut GenerationConfig) -> Result<()> {
    let providers = &[GenerationProvider::Ollama, GenerationProvider::OpenAi];
    let labels: Vec<&str> = providers.iter().map(|p| p.as_str()).collect();
    let default_index = providers
        .iter()
        .position(|&p| p == generation.provider)
        .unwrap_or(0);

    let provider_index = Select::new()
        .with_prompt("Generation provider")
        .default(default_index)
        .items(&labels[..])
        .interact()?;
    generation.provider = providers[provider_index];

    let model: String = Input::new()
        .with_prompt("Generation model")
        .default(generation.model.clone())
        .interact_text()?;

    let max_tokens: u32 = Input::new()
        .with_prompt("Maximum tokens per answer")
        .default(generation.max_tokens)
        .interact_text()?;

    if generation.provider == GenerationProvider::OpenAi {
        let api_key_env: String = Input::new()
            .with_prompt("Environment variable holding the API key")
            .default(generation.api_key_env.clone())
            .interact_text()?;
        generation.api_key_env = api_key_env;
    }

    generation.set_model(model)?;
    generation.set_max_tokens(max_tokens)?;

    Ok(())
}

fn test_ollama_connection(ollama: &OllamaConfig) -> bool {
    let url = format!(
        "{}://{}:{}/api/version",
        ollama.protocol, ollama.host, ollama.port
    );

    let agent: ureq::Agent = ureq::Agent::config_builder()
        .timeout_global(Some(std::time::Duration::from_secs(5)))
        .build()
        .into();

    match agent.get(&url).call() {
        Ok(_) => true,
        Err(ureq::Error::StatusCode(code)) if (400..500).contains(&code) => true,
        Err(_) => false,
    }
}
