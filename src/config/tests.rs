use super::*;
use std::fs;
use tempfile::TempDir;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn config_file_persistence() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let config_path = temp_dir.path().join("config.toml");

        let mut original_config = Config::new("");
        original_config.ollama = OllamaConfig {
            protocol: "https".to_string(),
            host: "test-host".to_string(),
            port: 8080,
            model: "test-model".to_string(),
            batch_size: 32,
            timeout_seconds: 10,
            embedding_dimension: Some(384),
        };

        let toml_content = toml::to_string_pretty(&original_config)
            .expect("config should convert to toml string successfully");
        fs::write(&config_path, toml_content).expect("should write to config_path successfully");

        let content =
            fs::read_to_string(&config_path).expect("should read from config_path successfully");
        let loaded_config: Config = toml::from_str(&content).expect("should parse toml correctly");

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn invalid_toml_handling() {
        let invalid_toml = r#"
            [ollama
            host = "localhost"
            port = "invalid_port"
        "#;

        let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
        assert!(result.is_err());
    }

    #[test]
    fn partial_config_with_defaults() {
        let partial_toml = r#"
            [ollama]
            host = "custom-host"

            [dataset]
            id_column = "id"
        "#;

        let config: Config = toml::from_str(partial_toml).expect("should parse partial toml");
        assert_eq!(config.ollama.host, "custom-host");
        assert_eq!(config.ollama.port, 11434);
        assert_eq!(config.dataset.id_column, "id");
        assert_eq!(config.dataset.description_column, "description");
        assert_eq!(config.generation, GenerationConfig::default());
    }

    #[test]
    fn complete_valid_config() {
        let valid_toml = r#"
            [ollama]
            protocol = "http"
            host = "localhost"
            port = 11434
            model = "nomic-embed-text:latest"
            batch_size = 64
            timeout_seconds = 30
            embedding_dimension = 768

            [generation]
            provider = "ollama"
            model = "phi3:latest"
            max_tokens = 100

            [dataset]
            path = "data/food.csv"
            id_column = "fdc_id"
            description_column = "description"

            [retrieval]
            top_k = 5

            [feedback]
            path = "ratings.csv"

            [cache]
            enabled = true
            max_entries = 64
        "#;

        let config: Config = toml::from_str(valid_toml).expect("should parse toml successfully");
        assert_eq!(config.ollama.model, "nomic-embed-text:latest");
        assert_eq!(config.ollama.embedding_dimension, Some(768));
        assert_eq!(config.generation.model, "phi3:latest");
        assert_eq!(config.dataset.path, std::path::PathBuf::from("data/food.csv"));
        assert_eq!(config.feedback.path, std::path::PathBuf::from("ratings.csv"));
        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_entries, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_validation_edge_cases() {
        let mut config = Config::new("");
        config.ollama.host = String::new();

        let result = config.validate();
        assert!(result.is_err()); // Empty host should be invalid
    }

    #[test]
    fn port_boundary_validation() {
        let mut config = OllamaConfig::default();

        assert!(config.set_port(1).is_ok());
        assert!(config.set_port(65535).is_ok());
        assert!(config.set_port(0).is_err());
    }

    #[test]
    fn ollama_url_generation_with_different_hosts() {
        let configs = vec![
            ("http", "localhost", 11434, "http://localhost:11434/"),
            ("http", "127.0.0.1", 8080, "http://127.0.0.1:8080/"),
            (
                "https",
                "secure.example.com",
                443,
                "https://secure.example.com/",
            ),
        ];

        for (protocol, host, port, expected_url) in configs {
            let mut config = Config::new("");
            config.ollama.protocol = protocol.to_string();
            config.ollama.host = host.to_string();
            config.ollama.port = port;

            let url = config.ollama_url().expect("ollama_url is ok");
            assert_eq!(url.as_str(), expected_url);
        }
    }

    #[test]
    fn error_display_messages() {
        let errors = vec![
            ConfigError::InvalidProtocol("ftp".to_string()),
            ConfigError::InvalidPort(0),
            ConfigError::InvalidBatchSize(0),
            ConfigError::InvalidModel(String::new()),
            ConfigError::InvalidUrl("invalid-url".to_string()),
            ConfigError::InvalidTopK(0),
            ConfigError::InvalidColumn("dataset id"),
        ];

        for error in errors {
            let message = format!("{error}");
            assert!(message.len() > 10);
        }
    }
}
