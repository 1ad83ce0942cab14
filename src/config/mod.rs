// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Runtime configuration loaded from environment variables

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::completion::CompletionModel;
use crate::rag::chunker::{ChunkerConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::rag::vector_index::{RetrievalPolicy, DEFAULT_TOP_K};

/// Default OpenAI-compatible Groq endpoint
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default hub repository for the embedding model
pub const DEFAULT_EMBEDDING_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Default completion request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Unknown completion model: {0}")]
    UnknownModel(String),

    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::UnknownModel(name) => format!(
                "Unknown model '{}'. Available models: {}",
                name,
                CompletionModel::ALL
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            _ => format!("Configuration error: {}", self),
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ConfigError::InvalidValue { .. } => "INVALID_CONFIG_VALUE",
            ConfigError::UnknownModel(_) => "UNKNOWN_MODEL",
            ConfigError::Invalid(_) => "INVALID_CONFIG",
        }
    }
}

/// Where the embedding model comes from
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingSettings {
    /// Hugging Face hub repository used when no local files are set
    pub repo: String,
    /// Local ONNX model file
    pub model_path: Option<PathBuf>,
    /// Local tokenizer.json
    pub tokenizer_path: Option<PathBuf>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            repo: DEFAULT_EMBEDDING_REPO.to_string(),
            model_path: None,
            tokenizer_path: None,
        }
    }
}

/// Completion service settings
#[derive(Clone, PartialEq)]
pub struct CompletionSettings {
    /// Key from the environment; a session key set at runtime takes precedence
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub model: CompletionModel,
}

// Keeps the API key out of logs
impl std::fmt::Debug for CompletionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("model", &self.model)
            .finish()
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GROQ_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            model: CompletionModel::default(),
        }
    }
}

/// Top-level application configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppConfig {
    pub completion: CompletionSettings,
    pub embedding: EmbeddingSettings,
    pub chunking: ChunkerConfig,
    pub retrieval: RetrievalPolicy,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to defaults; set but malformed ones are errors.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let model = match non_empty("ASKDOC_MODEL") {
            Some(name) => CompletionModel::from_str(&name)?,
            None => CompletionModel::default(),
        };

        let completion = CompletionSettings {
            api_key: non_empty("GROQ_API_KEY"),
            base_url: non_empty("GROQ_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
            timeout_secs: parse_var(&non_empty, "GROQ_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            model,
        };

        let embedding = EmbeddingSettings {
            repo: non_empty("EMBEDDING_MODEL_REPO")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_REPO.to_string()),
            model_path: non_empty("EMBEDDING_MODEL_PATH").map(PathBuf::from),
            tokenizer_path: non_empty("EMBEDDING_TOKENIZER_PATH").map(PathBuf::from),
        };

        let chunking = ChunkerConfig {
            chunk_size: parse_var(&non_empty, "ASKDOC_CHUNK_SIZE")?.unwrap_or(DEFAULT_CHUNK_SIZE),
            chunk_overlap: parse_var(&non_empty, "ASKDOC_CHUNK_OVERLAP")?
                .unwrap_or(DEFAULT_CHUNK_OVERLAP),
        };

        let retrieval = RetrievalPolicy {
            top_k: parse_var(&non_empty, "ASKDOC_TOP_K")?.unwrap_or(DEFAULT_TOP_K),
            max_distance: parse_var(&non_empty, "ASKDOC_MAX_DISTANCE")?,
        };

        Ok(Self {
            completion,
            embedding,
            chunking,
            retrieval,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate().map_err(ConfigError::Invalid)?;

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid(
                "Top-k must be greater than 0".to_string(),
            ));
        }
        if let Some(max_distance) = self.retrieval.max_distance {
            if !max_distance.is_finite() || max_distance < 0.0 {
                return Err(ConfigError::Invalid(
                    "Maximum retrieval distance must be a non-negative number".to_string(),
                ));
            }
        }
        if self.completion.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "Completion timeout must be greater than 0".to_string(),
            ));
        }
        if !self.completion.base_url.starts_with("http://")
            && !self.completion.base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(format!(
                "Base URL must start with http:// or https://: {}",
                self.completion.base_url
            )));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(None),
    }
}
