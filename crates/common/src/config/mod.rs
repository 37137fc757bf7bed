//! Configuration management for PaperDigest
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{APP_ENV}.toml)
//! - Default values

use crate::errors::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::{Validate, ValidationError};

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct AppConfig {
    /// Document chunking
    #[serde(default)]
    #[validate(nested)]
    pub chunking: ChunkingConfig,

    /// Embedding model
    #[serde(default)]
    #[validate(nested)]
    pub embedding: EmbeddingConfig,

    /// Text generation model
    #[serde(default)]
    #[validate(nested)]
    pub generation: GenerationConfig,

    /// Multi-paper retrieval
    #[serde(default)]
    #[validate(nested)]
    pub retrieval: RetrievalConfig,

    /// Prompt input budgets
    #[serde(default)]
    #[validate(nested)]
    pub summarization: SummarizationConfig,

    /// Paper discovery (arXiv)
    #[serde(default)]
    #[validate(nested)]
    pub discovery: DiscoveryConfig,

    /// Local document storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Chunk splitting strategy
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    /// Separator-driven recursive splitting with guaranteed overlap
    #[default]
    Recursive,
    /// Delegates to the `text-splitter` crate
    Semantic,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_chunk_overlap"))]
pub struct ChunkingConfig {
    /// Maximum characters per chunk
    #[serde(default = "default_chunk_size")]
    #[validate(range(min = 1))]
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    #[serde(default)]
    pub strategy: ChunkingStrategy,
}

/// Embedding provider
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible `/embeddings` endpoint
    Openai,
    /// Local deterministic feature-hashing embedder
    #[default]
    Hashing,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,

    /// API key for embedding service
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Model to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension
    #[serde(default = "default_embedding_dimension")]
    #[validate(range(min = 1))]
    pub dimension: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries
    #[serde(default = "default_embedding_retries")]
    pub max_retries: u32,

    /// Batch size for embedding requests
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1))]
    pub batch_size: usize,
}

/// Text generation provider
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationProvider {
    /// OpenAI-compatible `/chat/completions` endpoint (Groq, OpenAI, vLLM, ...)
    #[default]
    Openai,
    /// Offline generator that echoes a digest of the prompt
    Echo,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct GenerationConfig {
    #[serde(default)]
    pub provider: GenerationProvider,

    /// API key; falls back to GROQ_API_KEY when unset
    pub api_key: Option<String>,

    /// API base URL
    #[serde(default = "default_generation_base")]
    pub api_base: String,

    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Optional system message sent ahead of every prompt
    #[serde(default)]
    pub system_prompt: Option<String>,

    #[serde(default = "default_temperature")]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    #[validate(range(min = 1))]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RetrievalConfig {
    /// Default number of merged results for a search
    #[serde(default = "default_top_k")]
    #[validate(range(min = 1))]
    pub top_k: usize,

    /// Number of chunks used as context when answering questions
    #[serde(default = "default_qa_top_k")]
    #[validate(range(min = 1))]
    pub qa_top_k: usize,

    /// Chunks joined to reconstruct a paper's text for summaries
    #[serde(default = "default_full_text_chunk_limit")]
    #[validate(range(min = 1))]
    pub full_text_chunk_limit: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SummarizationConfig {
    /// Character budget for whole-paper summaries and highlights
    #[serde(default = "default_max_input_chars")]
    #[validate(range(min = 1))]
    pub max_input_chars: usize,

    /// Character budget per section in section-wise summaries
    #[serde(default = "default_section_max_chars")]
    #[validate(range(min = 1))]
    pub section_max_chars: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct DiscoveryConfig {
    /// arXiv API query endpoint
    #[serde(default = "default_discovery_base")]
    pub api_base: String,

    #[serde(default = "default_max_results")]
    #[validate(range(min = 1, max = 100))]
    pub max_results: usize,

    /// Request timeout in seconds
    #[serde(default = "default_discovery_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Directory for downloaded and uploaded PDFs
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default = "default_json_logging")]
    pub json_logging: bool,

    /// Service name for tracing
    #[serde(default = "default_service_name")]
    pub service_name: String,
}

// Default value functions
fn default_chunk_size() -> usize { 500 }
fn default_chunk_overlap() -> usize { 50 }
fn default_embedding_model() -> String { "sentence-transformers/all-MiniLM-L6-v2".to_string() }
fn default_embedding_dimension() -> usize { 384 }
fn default_embedding_timeout() -> u64 { 30 }
fn default_embedding_retries() -> u32 { 3 }
fn default_batch_size() -> usize { 32 }
fn default_generation_base() -> String { "https://api.groq.com/openai/v1".to_string() }
fn default_generation_model() -> String { "llama-3.3-70b-versatile".to_string() }
fn default_temperature() -> f32 { 0.1 }
fn default_max_tokens() -> u32 { 1024 }
fn default_generation_timeout() -> u64 { 60 }
fn default_top_k() -> usize { 5 }
fn default_qa_top_k() -> usize { 3 }
fn default_full_text_chunk_limit() -> usize { 100 }
fn default_max_input_chars() -> usize { 4000 }
fn default_section_max_chars() -> usize { 2000 }
fn default_discovery_base() -> String { "http://export.arxiv.org/api/query".to_string() }
fn default_max_results() -> usize { 5 }
fn default_discovery_timeout() -> u64 { 30 }
fn default_docs_dir() -> PathBuf { PathBuf::from("./documents") }
fn default_log_level() -> String { "info".to_string() }
fn default_json_logging() -> bool { true }
fn default_service_name() -> String { "paperdigest".to_string() }

fn validate_chunk_overlap(config: &ChunkingConfig) -> std::result::Result<(), ValidationError> {
    if config.chunk_overlap >= config.chunk_size {
        let mut err = ValidationError::new("chunk_overlap");
        err.message = Some(
            format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            strategy: ChunkingStrategy::default(),
        }
    }
}

impl ChunkingConfig {
    /// Build a validated chunking configuration
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = Self {
            chunk_size,
            chunk_overlap,
            strategy: ChunkingStrategy::Recursive,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            api_key: None,
            api_base: None,
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout(),
            max_retries: default_embedding_retries(),
            batch_size: default_batch_size(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerationProvider::default(),
            api_key: None,
            api_base: default_generation_base(),
            model: default_generation_model(),
            system_prompt: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            qa_top_k: default_qa_top_k(),
            full_text_chunk_limit: default_full_text_chunk_limit(),
        }
    }
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            max_input_chars: default_max_input_chars(),
            section_max_chars: default_section_max_chars(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            api_base: default_discovery_base(),
            max_results: default_max_results(),
            timeout_secs: default_discovery_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logging: default_json_logging(),
            service_name: default_service_name(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // e.g., APP__CHUNKING__CHUNK_SIZE=800
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(config.try_deserialize()?)
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(config.try_deserialize()?)
    }

    fn finish(mut config: AppConfig) -> Result<Self> {
        if config.generation.api_key.is_none() {
            config.generation.api_key = std::env::var("GROQ_API_KEY").ok();
        }
        config.validate()?;
        Ok(config)
    }

    /// Create the document directory if it does not exist yet
    pub fn ensure_docs_dir(&self) -> Result<&PathBuf> {
        std::fs::create_dir_all(&self.storage.docs_dir).map_err(|e| AppError::Configuration {
            message: format!(
                "cannot create docs dir {}: {}",
                self.storage.docs_dir.display(),
                e
            ),
        })?;
        Ok(&self.storage.docs_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert_eq!(config.summarization.max_input_chars, 4000);
        assert_eq!(config.summarization.section_max_chars, 2000);
        assert_eq!(config.generation.model, "llama-3.3-70b-versatile");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        assert!(ChunkingConfig::new(100, 100).is_err());
        assert!(ChunkingConfig::new(100, 150).is_err());
        assert!(ChunkingConfig::new(0, 0).is_err());
        assert!(ChunkingConfig::new(100, 10).is_ok());
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"chunking": {"chunk_size": 800}}"#).unwrap();
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert_eq!(config.retrieval.qa_top_k, 3);
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut config = AppConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }
}
