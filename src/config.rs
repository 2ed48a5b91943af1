use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the StudySum server.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Completion provider used for summary generation.
    pub llm_provider: CompletionProvider,
    /// Model identifier passed to the completion provider.
    pub llm_model: String,
    /// Optional base URL override for the completion provider.
    pub llm_base_url: Option<String>,
    /// Optional API key sent as a bearer token to hosted providers.
    pub llm_api_key: Option<String>,
    /// Request timeout applied to every outbound completion call, in seconds.
    pub llm_timeout_secs: u64,
    /// Base URL of the summary store service.
    pub summary_store_url: String,
    /// Optional API key required to access the summary store.
    pub summary_store_api_key: Option<String>,
    /// Optional override for the chunk size used on long documents.
    pub chunk_size: Option<usize>,
    /// Optional override for the overlap shared by consecutive chunks.
    pub chunk_overlap: Option<usize>,
    /// Optional override for the length above which documents are chunked.
    pub chunk_threshold: Option<usize>,
    /// Optional override for the number of chunks summarized per document.
    pub summary_max_chunks: Option<usize>,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

/// Supported completion backends for the summarization pipeline.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionProvider {
    /// Local Ollama runtime.
    Ollama,
    /// Hosted OpenAI-compatible chat completions API.
    OpenAI,
}

const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            llm_provider: load_env("LLM_PROVIDER")?
                .parse()
                .map_err(|()| ConfigError::InvalidValue("LLM_PROVIDER".to_string()))?,
            llm_model: load_env("LLM_MODEL")?,
            llm_base_url: load_env_optional("LLM_BASE_URL"),
            llm_api_key: load_env_optional("LLM_API_KEY"),
            llm_timeout_secs: parse_env_optional("LLM_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
            summary_store_url: load_env("SUMMARY_STORE_URL")?,
            summary_store_api_key: load_env_optional("SUMMARY_STORE_API_KEY"),
            chunk_size: parse_env_optional("CHUNK_SIZE")?,
            chunk_overlap: parse_env_optional("CHUNK_OVERLAP")?,
            chunk_threshold: parse_env_optional("CHUNK_THRESHOLD")?,
            summary_max_chunks: parse_env_optional("SUMMARY_MAX_CHUNKS")?,
            server_port: parse_env_optional("SERVER_PORT")?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_env_optional<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

impl std::str::FromStr for CompletionProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            _ => Err(()),
        }
    }
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        llm_provider = ?config.llm_provider,
        llm_model = %config.llm_model,
        store_url = %config.summary_store_url,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
