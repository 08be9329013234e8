//! Node configuration.
//!
//! Loaded from a TOML file whose path comes from the
//! `PLANWRIGHT_CONFIG` environment variable (default `planwright.toml`),
//! with secrets overridable from the environment so they stay out of
//! checked-in config files.

use std::path::Path;

use planwright_skills::{SearchConfig, SmtpConfig};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_PATH_VAR: &str = "PLANWRIGHT_CONFIG";

/// Default config file path.
pub const DEFAULT_CONFIG_PATH: &str = "planwright.toml";

const OPENAI_KEY_VAR: &str = "PLANWRIGHT_OPENAI_KEY";
const SMTP_PASSWORD_VAR: &str = "PLANWRIGHT_SMTP_PASSWORD";
const BING_KEY_VAR: &str = "PLANWRIGHT_BING_KEY";

/// Configuration load failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level node configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub openai: OpenAiSection,

    #[serde(default)]
    pub planner: PlannerConfig,

    /// Enables the email skill when present.
    pub smtp: Option<SmtpConfig>,

    /// Enables the web search skill when present.
    pub search: Option<SearchConfig>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

/// Completion provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiSection {
    #[serde(default = "default_openai_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub key: String,

    #[serde(default = "default_model")]
    pub model: String,
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

/// Planner budgets.
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    #[serde(default = "default_min_iteration_time_ms")]
    pub min_iteration_time_ms: u64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            max_iterations: default_max_iterations(),
            min_iteration_time_ms: default_min_iteration_time_ms(),
        }
    }
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_max_iterations() -> usize {
    5
}

fn default_min_iteration_time_ms() -> u64 {
    1500
}

/// Load configuration from the path named by `PLANWRIGHT_CONFIG`,
/// falling back to `planwright.toml`, then apply environment-variable
/// secret overrides.
pub fn load_config() -> Result<NodeConfig, ConfigError> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_config_from(Path::new(&path))
}

/// Load and validate configuration from an explicit path.
pub fn load_config_from(path: &Path) -> Result<NodeConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut config: NodeConfig =
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

    apply_env_overrides(&mut config);
    validate(&config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut NodeConfig) {
    if let Ok(key) = std::env::var(OPENAI_KEY_VAR) {
        config.openai.key = key;
    }
    if let Some(smtp) = config.smtp.as_mut() {
        if let Ok(password) = std::env::var(SMTP_PASSWORD_VAR) {
            smtp.password = password;
        }
    }
    if let Some(search) = config.search.as_mut() {
        if let Ok(key) = std::env::var(BING_KEY_VAR) {
            search.key = key;
        }
    }
}

fn validate(config: &NodeConfig) -> Result<(), ConfigError> {
    if config.server.bind.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "server.bind must not be empty".to_string(),
        ));
    }
    if config.openai.endpoint.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "openai.endpoint must not be empty".to_string(),
        ));
    }
    if config.openai.key.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "openai.key must be set in the config file or PLANWRIGHT_OPENAI_KEY".to_string(),
        ));
    }
    if let Some(smtp) = &config.smtp {
        if smtp.port == 0 {
            return Err(ConfigError::Invalid(
                "smtp.port must be in range".to_string(),
            ));
        }
        if smtp.host.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "smtp.host must not be empty".to_string(),
            ));
        }
    }
    if let Some(search) = &config.search {
        if search.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "search.endpoint must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}
