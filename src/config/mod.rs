// Configuration management module
// TOML settings for the Ollama connection, generation provider, dataset and feedback log

pub mod interactive;
pub mod settings;

#[cfg(test)]
mod tests;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    CacheConfig, Config, ConfigError, DatasetConfig, FeedbackConfig, GenerationConfig,
    GenerationProvider, OllamaConfig, RetrievalConfig,
};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
