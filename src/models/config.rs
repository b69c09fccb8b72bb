//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Projects to harvest, each checkpointed independently
    #[serde(default = "defaults::projects")]
    pub projects: Vec<String>,

    /// Optional cap on issues per project (test runs)
    #[serde(default)]
    pub issue_limit: Option<u64>,

    /// HTTP client behavior settings
    #[serde(default)]
    pub client: ClientConfig,

    /// Checkpoint persistence settings
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Output file settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Record transformation thresholds
    #[serde(default)]
    pub transform: TransformConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.projects.is_empty() {
            return Err(AppError::validation("projects must not be empty"));
        }
        if url::Url::parse(&self.client.base_url).is_err() {
            return Err(AppError::validation("client.base_url is not a valid URL"));
        }
        if self.client.user_agent.trim().is_empty() {
            return Err(AppError::validation("client.user_agent is empty"));
        }
        if self.client.timeout_secs == 0 {
            return Err(AppError::validation("client.timeout_secs must be > 0"));
        }
        if self.client.max_retries == 0 {
            return Err(AppError::validation("client.max_retries must be > 0"));
        }
        if self.client.max_concurrent == 0 {
            return Err(AppError::validation("client.max_concurrent must be > 0"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects: defaults::projects(),
            issue_limit: None,
            client: ClientConfig::default(),
            checkpoint: CheckpointConfig::default(),
            output: OutputConfig::default(),
            transform: TransformConfig::default(),
        }
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the issue tracker REST API
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Minimum interval between requests in milliseconds
    #[serde(default = "defaults::rate_limit_delay")]
    pub rate_limit_delay_ms: u64,

    /// Maximum attempts for retryable failures
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Exponential backoff unit in milliseconds (2^attempt units)
    #[serde(default = "defaults::backoff_base")]
    pub backoff_base_ms: u64,

    /// Maximum concurrent comment fetches
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            rate_limit_delay_ms: defaults::rate_limit_delay(),
            max_retries: defaults::max_retries(),
            backoff_base_ms: defaults::backoff_base(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Checkpoint persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Path of the checkpoint file
    #[serde(default = "defaults::checkpoint_path")]
    pub path: String,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            path: defaults::checkpoint_path(),
        }
    }
}

/// Output file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for JSONL output files
    #[serde(default = "defaults::output_dir")]
    pub dir: String,

    /// Append to existing files instead of overwriting
    #[serde(default = "defaults::append")]
    pub append: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: defaults::output_dir(),
            append: defaults::append(),
        }
    }
}

/// Record transformation thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Minimum description length for the summarization task
    #[serde(default = "defaults::summarization_min_description")]
    pub summarization_min_description: usize,

    /// Minimum comment count for the question-answering task
    #[serde(default = "defaults::qa_min_comments")]
    pub qa_min_comments: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            summarization_min_description: defaults::summarization_min_description(),
            qa_min_comments: defaults::qa_min_comments(),
        }
    }
}

mod defaults {
    // Project defaults
    pub fn projects() -> Vec<String> {
        vec!["KAFKA".into(), "BEAM".into(), "HARMONY".into()]
    }

    // Client defaults
    pub fn base_url() -> String {
        "https://issues.apache.org/jira/rest/api/2".into()
    }
    pub fn user_agent() -> String {
        "issue-harvester/0.1".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn rate_limit_delay() -> u64 {
        1000
    }
    pub fn max_retries() -> u32 {
        5
    }
    pub fn backoff_base() -> u64 {
        1000
    }
    pub fn max_concurrent() -> usize {
        5
    }

    // Checkpoint defaults
    pub fn checkpoint_path() -> String {
        "checkpoint.json".into()
    }

    // Output defaults
    pub fn output_dir() -> String {
        "output".into()
    }
    pub fn append() -> bool {
        true
    }

    // Transform defaults
    pub fn summarization_min_description() -> usize {
        500
    }
    pub fn qa_min_comments() -> usize {
        2
    }
}
