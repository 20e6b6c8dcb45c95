//! Pipeline configuration.
//!
//! All tunables live in one `ForgeConfig` struct constructed once at
//! startup (from a YAML file or defaults) and passed by reference into the
//! components that need it. There is no ambient global state; API
//! credentials are the one exception and are read from the environment by
//! the LLM client constructor.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    /// IO error while reading configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn default_first_step_iterations() -> usize {
    3
}

fn default_second_step_iterations() -> usize {
    2
}

fn default_model() -> String {
    "openai/gpt-3.5-turbo".to_string()
}

fn default_temperature() -> f64 {
    0.3
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_records_per_batch() -> usize {
    5
}

fn default_pacing_delay_secs() -> u64 {
    3
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

/// Configuration for the corpus generation pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ForgeConfig {
    /// Iterations of the first generation stage per run.
    #[serde(default = "default_first_step_iterations")]
    pub first_step_iterations: usize,

    /// Iterations of the second generation stage per run.
    #[serde(default = "default_second_step_iterations")]
    pub second_step_iterations: usize,

    /// Subjects the pipeline may generate for, with a short description
    /// used in prompts. Read-only at runtime.
    #[serde(default, alias = "themes_dict")]
    pub themes: BTreeMap<String, String>,

    /// Model identifier sent to the completion service.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for completion requests.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Maximum tokens per completion request.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Number of records requested from the service per iteration.
    #[serde(default = "default_records_per_batch")]
    pub records_per_batch: usize,

    /// Delay between generation iterations, in seconds.
    #[serde(default = "default_pacing_delay_secs")]
    pub pacing_delay_secs: u64,

    /// Directory holding seed, generated and corpus files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            first_step_iterations: default_first_step_iterations(),
            second_step_iterations: default_second_step_iterations(),
            themes: BTreeMap::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            records_per_batch: default_records_per_batch(),
            pacing_delay_secs: default_pacing_delay_secs(),
            data_dir: default_data_dir(),
        }
    }
}

impl ForgeConfig {
    /// Load configuration from a YAML file and validate it.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field ranges and cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.themes.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "themes must define at least one subject".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "model must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationFailed(format!(
                "temperature must be in [0.0, 2.0], got {}",
                self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_tokens must be greater than zero".to_string(),
            ));
        }
        if self.records_per_batch == 0 {
            return Err(ConfigError::ValidationFailed(
                "records_per_batch must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a subject is part of the configured theme set.
    pub fn has_subject(&self, subject: &str) -> bool {
        self.themes.contains_key(subject)
    }

    /// Configured subjects, in sorted order.
    pub fn subjects(&self) -> impl Iterator<Item = &str> + '_ {
        self.themes.keys().map(String::as_str)
    }

    /// Pacing delay between generation iterations.
    pub fn pacing_delay(&self) -> Duration {
        Duration::from_secs(self.pacing_delay_secs)
    }
}
