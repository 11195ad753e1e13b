//! Configuration module for the knowledge index and summarizer.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `TEXTKDB_` and use double
//! underscores to separate nested levels:
//! - `TEXTKDB_EMBEDDING__MODEL=AllMiniLML6V2` sets `embedding.model`
//! - `TEXTKDB_SUMMARIZE__WINDOW_SIZE=400` sets `summarize.window_size`
//! - `TEXTKDB_GENERATION__MODEL=gemini-1.5-flash` sets `generation.model`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Path where index snapshots are written
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Embedding backend settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Generation backend settings
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Summarizer defaults
    #[serde(default)]
    pub summarize: SummarizeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// Model to use for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Directory for cached model files (defaults to the user cache dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Show model download progress on first use
    #[serde(default = "default_false")]
    pub show_download_progress: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerationConfig {
    /// Model name passed to the generation API
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// API key. Falls back to the `GEMINI_API_KEY` environment variable
    /// when unset, so keys stay out of config files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Optional system instruction sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SummarizeConfig {
    /// Characters per chunk window
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Characters of overlap between consecutive windows
    #[serde(default = "default_overlap_size")]
    pub overlap_size: usize,

    /// Seconds to wait between per-chunk generation calls
    #[serde(default = "default_chunk_delay_secs")]
    pub chunk_delay_secs: u64,
}

/// Logging configuration with a default level and per-module overrides.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level filter (e.g. "warn", "info")
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides, e.g. `index = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    PathBuf::from(".textkdb/index")
}
fn default_false() -> bool {
    false
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_generation_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_window_size() -> usize {
    200
}
fn default_overlap_size() -> usize {
    50
}
fn default_chunk_delay_secs() -> u64 {
    2
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index_path: default_index_path(),
            debug: false,
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
            summarize: SummarizeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: None,
            show_download_progress: false,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_generation_model(),
            api_key: None,
            system_prompt: None,
        }
    }
}

impl Default for SummarizeConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            overlap_size: default_overlap_size(),
            chunk_delay_secs: default_chunk_delay_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path =
            Self::find_workspace_config().unwrap_or_else(|| PathBuf::from(".textkdb/settings.toml"));

        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Layer in environment variables with TEXTKDB_ prefix.
            // Double underscore (__) separates nested levels; single
            // underscore remains as is within field names.
            .merge(Env::prefixed("TEXTKDB_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Resolve the model cache directory, falling back to the user cache dir.
    pub fn model_cache_dir(&self) -> PathBuf {
        self.embedding.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from(".cache"))
                .join("textkdb/models")
        })
    }

    /// Find the workspace config by looking for a .textkdb directory,
    /// searching from the current directory up to the filesystem root.
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(".textkdb");
            if config_dir.exists() && config_dir.is_dir() {
                return Some(config_dir.join("settings.toml"));
            }
        }

        None
    }
}
