//! Configuration module for the retrieval system.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `STORYCTX_` and use double
//! underscores to separate nested levels:
//! - `STORYCTX_RETRIEVAL__TOP_K=5` sets `retrieval.top_k`
//! - `STORYCTX_EMBEDDING__MODEL=BGESmallENV15` sets `embedding.model`
//! - `STORYCTX_ARTIFACTS__INDEX_PATH=/data/corpus.idx` sets `artifacts.index_path`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the per-project configuration directory.
pub const CONFIG_DIR: &str = ".storyctx";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "STORYCTX_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory containing `.storyctx`; relative artifact paths resolve against it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Global debug mode
    #[serde(default = "default_false")]
    pub debug: bool,

    /// Pre-built index and metadata files
    #[serde(default)]
    pub artifacts: ArtifactsConfig,

    /// Embedding model settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Query-time search settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ArtifactsConfig {
    /// Vector index file
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// CSV with `Sentence` and `StoryTitle` columns, row-aligned with the index
    #[serde(default = "default_metadata_path")]
    pub metadata_path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// Model to use for embeddings
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Model cache directory (defaults to the user cache dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Show a progress bar while downloading model weights
    #[serde(default = "default_true")]
    pub show_download_progress: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalConfig {
    /// Number of sentences returned when the caller does not specify one
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Partitions searched per query on partitioned indexes
    #[serde(default = "default_nprobe")]
    pub nprobe: usize,

    /// Deadline for a whole retrieval call in milliseconds (0 disables it)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `STORYCTX_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable logs
    #[serde(default = "default_false")]
    pub json: bool,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_index_path() -> PathBuf {
    PathBuf::from("faiss_index")
}
fn default_metadata_path() -> PathBuf {
    PathBuf::from("metadata.csv")
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_top_k() -> usize {
    10
}
fn default_nprobe() -> usize {
    crate::vector::DEFAULT_NPROBE
}
fn default_timeout_ms() -> u64 {
    30_000
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            debug: false,
            artifacts: ArtifactsConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            metadata_path: default_metadata_path(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            cache_dir: None,
            show_download_progress: true,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            nprobe: default_nprobe(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .storyctx directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                // If workspace_root is not set in config, detect it
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    ///
    /// Relative artifact paths resolve against the file's directory, or its
    /// parent when the file lives inside `.storyctx`.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        let path = path.as_ref();
        Self::figment(path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = path.parent().map(|dir| {
                        if dir.file_name().is_some_and(|name| name == CONFIG_DIR) {
                            dir.parent().unwrap_or(dir).to_path_buf()
                        } else {
                            dir.to_path_buf()
                        }
                    });
                }
                settings
            })
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Settings::default()))
            // Layer in config file if it exists
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels, single underscore stays
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the workspace config by looking for a .storyctx directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .storyctx is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Resolve a configured path against the workspace root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Absolute or workspace-relative location of the vector index.
    pub fn index_path(&self) -> PathBuf {
        self.resolve_path(&self.artifacts.index_path)
    }

    /// Absolute or workspace-relative location of the metadata CSV.
    pub fn metadata_path(&self) -> PathBuf {
        self.resolve_path(&self.artifacts.metadata_path)
    }

    /// Directory where embedding model weights are cached.
    pub fn models_dir(&self) -> PathBuf {
        match &self.embedding.cache_dir {
            Some(dir) => self.resolve_path(dir),
            None => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("storyctx")
                .join("models"),
        }
    }

    /// Create a default settings file with helpful comments under `dir`
    pub fn init_config_file(dir: &Path, force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.join(CONFIG_DIR).join("settings.toml");

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let template = format!(
            r#"# storyctx configuration

# Version of the configuration schema
version = 1

# Global debug mode
debug = false

[artifacts]
# Pre-built vector index (relative to the directory containing .storyctx)
index_path = "{index}"

# CSV with Sentence and StoryTitle columns, one row per index vector, same order
metadata_path = "{metadata}"

[embedding]
# Must be the model the index was built with
model = "{model}"

# Model cache directory (defaults to the user cache directory)
# cache_dir = ".storyctx/models"

show_download_progress = true

[retrieval]
# Sentences returned per query when not given on the command line
top_k = {top_k}

# Partitions searched per query on partitioned indexes (higher = better recall, slower)
nprobe = {nprobe}

# Deadline for one retrieval in milliseconds (0 disables it)
timeout_ms = {timeout_ms}

[logging]
# Filter directive, e.g. "info" or "storyctx=debug". STORYCTX_LOG overrides it.
level = "{level}"
json = false
"#,
            index = default_index_path().display(),
            metadata = default_metadata_path().display(),
            model = default_embedding_model(),
            top_k = default_top_k(),
            nprobe = default_nprobe(),
            timeout_ms = default_timeout_ms(),
            level = default_log_level(),
        );

        std::fs::write(&config_path, template)?;
        Ok(config_path)
    }
}
