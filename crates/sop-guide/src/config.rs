//! Configuration for the SOP guide

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable holding the hosted model API key
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Alternate environment variable accepted for the API key
pub const API_KEY_ENV_FALLBACK: &str = "GEMINI_API_KEY";

/// Default configuration file looked up by the binaries
pub const DEFAULT_CONFIG_FILE: &str = "sop-guide.toml";

/// Environment variable overriding the configuration file location
pub const CONFIG_PATH_ENV: &str = "SOP_GUIDE_CONFIG";

/// Configuration file to load: explicit path, then `SOP_GUIDE_CONFIG`, then the default file
pub fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Hosted model configuration
    pub llm: LlmConfig,
    /// Persisted index configuration
    pub index: IndexConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Decoding parameters, safety policy and persona template
    pub generation: GenerationConfig,
    /// Conversation history handling
    pub conversation: ConversationConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file, falling back to defaults when the file is absent
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!("No config file at {}, using defaults", path.display());
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        tracing::info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| Error::Config(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunking.chunk_size must be positive".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::Config("embeddings.dimensions must be positive".into()));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be positive".into()));
        }
        if self.conversation.max_stored_turns < self.conversation.history_window {
            return Err(Error::Config(
                "conversation.max_stored_turns must be at least conversation.history_window".into(),
            ));
        }
        Ok(())
    }

    /// Read the API key from the process environment
    pub fn api_key(&self) -> Result<String> {
        api_key_from(|name| std::env::var(name).ok())
    }
}

/// Resolve the API key through a lookup function (environment in production)
pub fn api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    [API_KEY_ENV, API_KEY_ENV_FALLBACK]
        .iter()
        .filter_map(|name| lookup(name))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .ok_or_else(|| Error::MissingCredential(API_KEY_ENV.to_string()))
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum image upload size in bytes (default: 10MB)
    pub max_upload_size: usize,
    /// Upper bound for one pipeline call made on behalf of a request
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 10 * 1024 * 1024, // 10MB
            request_timeout_secs: 120,
        }
    }
}

impl ServerConfig {
    /// Socket address string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Embedding service selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Gemini embedding API (shares the generation API key)
    #[default]
    Gemini,
    /// Local Ollama server
    Ollama,
}

impl EmbeddingBackend {
    /// Provider name recorded in the index fingerprint
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding service
    pub backend: EmbeddingBackend,
    /// Model to use (default: text-embedding-004)
    pub model: String,
    /// Embedding dimensions (768 for text-embedding-004 and nomic-embed-text)
    pub dimensions: usize,
    /// Batch size for embedding generation at index time
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Gemini,
            model: "text-embedding-004".to_string(),
            dimensions: 768,
            batch_size: 32,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 200,
        }
    }
}

/// Hosted model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Generative Language API base URL
    pub api_base: String,
    /// Generation model name
    pub generate_model: String,
    /// Ollama base URL (embedding backend `ollama`)
    pub ollama_url: String,
    /// Optional HTTP client timeout in seconds; unset means the caller bounds the call
    pub timeout_secs: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            generate_model: "gemini-2.0-flash-exp".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            timeout_secs: None,
        }
    }
}

/// Persisted index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Index directory
    pub path: PathBuf,
    /// Collection name recorded in the manifest
    pub collection: String,
    /// Citation label attached to every chunk of the source document
    pub source_label: String,
    /// Document indexed when none is given on the command line
    pub default_document: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./sop_index"),
            collection: "sop_medical_guide".to_string(),
            source_label: "Guía ESHRE 2023".to_string(),
            default_document: PathBuf::from("guia_sop.pdf"),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks injected into the prompt
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 4 }
    }
}

/// Conversation history handling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Turns included in the prompt
    pub history_window: usize,
    /// Turns retained by caller-owned conversations before the oldest are dropped
    pub max_stored_turns: usize,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_window: 6,
            max_stored_turns: 200,
        }
    }
}

/// Decoding parameters, safety policy and persona template
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling
    pub top_p: f32,
    /// Top-k sampling
    pub top_k: u32,
    /// Output length bound
    pub max_output_tokens: u32,
    /// Per-category safety thresholds sent with every request
    pub safety: Vec<SafetySetting>,
    /// Optional persona template file replacing the built-in one
    pub persona_path: Option<PathBuf>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 2048,
            safety: SafetySetting::default_policy(),
            persona_path: None,
        }
    }
}

/// Harm categories understood by the hosted model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

/// Blocking threshold for one harm category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockNone,
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
}

/// One row of the safety policy table
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

impl SafetySetting {
    /// Policy used for patient education.
    ///
    /// | category          | threshold              |
    /// |-------------------|------------------------|
    /// | harassment        | BLOCK_NONE             |
    /// | hate speech       | BLOCK_NONE             |
    /// | sexually explicit | BLOCK_LOW_AND_ABOVE    |
    /// | dangerous content | BLOCK_MEDIUM_AND_ABOVE |
    ///
    /// Reproductive-health vocabulary trips the harassment and hate classifiers,
    /// so those two are left open.
    pub fn default_policy() -> Vec<Self> {
        vec![
            Self {
                category: HarmCategory::Harassment,
                threshold: HarmBlockThreshold::BlockNone,
            },
            Self {
                category: HarmCategory::HateSpeech,
                threshold: HarmBlockThreshold::BlockNone,
            },
            Self {
                category: HarmCategory::SexuallyExplicit,
                threshold: HarmBlockThreshold::BlockLowAndAbove,
            },
            Self {
                category: HarmCategory::DangerousContent,
                threshold: HarmBlockThreshold::BlockMediumAndAbove,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_path_wins() {
        let path = config_path(Some(PathBuf::from("/etc/sop-guide/prod.toml")));
        assert_eq!(path, PathBuf::from("/etc/sop-guide/prod.toml"));
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 2000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 4);
        assert_eq!(config.conversation.history_window, 6);
        assert_eq!(config.generation.safety.len(), 4);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RagConfig::from_toml_str(
            r#"
            [chunking]
            chunk_size = 500
            chunk_overlap = 50

            [embeddings]
            backend = "ollama"
            model = "nomic-embed-text"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.embeddings.backend, EmbeddingBackend::Ollama);
        assert_eq!(config.embeddings.dimensions, 768);
        assert_eq!(config.index.collection, "sop_medical_guide");
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let err = RagConfig::from_toml_str(
            r#"
            [chunking]
            chunk_size = 100
            chunk_overlap = 100
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_safety_table_from_toml() {
        let config = RagConfig::from_toml_str(
            r#"
            [[generation.safety]]
            category = "HARM_CATEGORY_DANGEROUS_CONTENT"
            threshold = "BLOCK_ONLY_HIGH"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.generation.safety,
            vec![SafetySetting {
                category: HarmCategory::DangerousContent,
                threshold: HarmBlockThreshold::BlockOnlyHigh,
            }]
        );
    }

    #[test]
    fn test_api_key_lookup() {
        let missing = api_key_from(|_| None).unwrap_err();
        assert!(matches!(missing, Error::MissingCredential(_)));

        let blank = api_key_from(|_| Some("  ".to_string())).unwrap_err();
        assert!(matches!(blank, Error::MissingCredential(_)));

        let key = api_key_from(|name| {
            (name == API_KEY_ENV_FALLBACK).then(|| "secret".to_string())
        })
        .unwrap();
        assert_eq!(key, "secret");
    }
}
