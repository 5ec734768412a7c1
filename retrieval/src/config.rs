//! Configuration for retrieval and curation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use exemplar_lexical::DEFAULT_MIN_TOKEN_CHARS;
use exemplar_store::DEFAULT_EVENT_CAPACITY;

use crate::error::{CurationError, Result};

/// Top-level configuration.
///
/// Every section is optional in TOML and falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExemplarConfig {
    /// Example storage.
    pub store: StoreConfig,

    /// Retrieval tuning.
    pub retrieval: RetrievalConfig,

    /// Feedback cycle settings.
    pub curation: CurationConfig,
}

impl ExemplarConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CurationError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| CurationError::Config(format!("{}: {e}", path.display())))
    }

    /// Store examples under the given directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store.data_dir = Some(dir.into());
        self
    }

    /// Set the retrieval configuration.
    pub fn with_retrieval(mut self, config: RetrievalConfig) -> Self {
        self.retrieval = config;
        self
    }

    /// Set the curation configuration.
    pub fn with_curation(mut self, config: CurationConfig) -> Self {
        self.curation = config;
        self
    }
}

/// Platform data directory for durable stores.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_default().join("exemplar")
}

/// Configuration for example storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory for example files. `None` keeps examples in memory only.
    pub data_dir: Option<PathBuf>,

    /// Buffered change notifications per subscriber.
    pub event_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Configuration for retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Examples returned by a search when no limit is given.
    pub default_k: usize,

    /// Examples returned by a recency listing when no limit is given.
    pub recent_limit: usize,

    /// Shortest token, in characters, that takes part in matching.
    pub min_token_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: 3,
            recent_limit: 10,
            min_token_chars: DEFAULT_MIN_TOKEN_CHARS,
        }
    }
}

/// Configuration for the feedback cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    /// Give up on the generator after this many seconds.
    pub generation_timeout_secs: Option<u64>,
}

impl CurationConfig {
    /// The generation timeout, if any.
    pub fn generation_timeout(&self) -> Option<Duration> {
        self.generation_timeout_secs.map(Duration::from_secs)
    }
}
