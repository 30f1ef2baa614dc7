//! Configuration for an analysis run.
//!
//! Uses `figment` for layered configuration: defaults -> TOML file ->
//! environment (`LOUPE_` prefix). The API key itself is never stored in a
//! config file; it is resolved from the environment variable named by
//! `api_key_env` at pipeline construction.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Retry policy for transient LLM transport errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum retries after the initial attempt (default: 2).
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// Base backoff delay in seconds, doubled per attempt (default: 1).
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: u64,
}

fn default_max_retries() -> usize {
    2
}
fn default_base_delay() -> u64 {
    1
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_secs: 1,
        }
    }
}

/// Response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Enable content-addressed response caching (default: true).
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cache directory. Defaults to the platform cache dir under `loupe/`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Maximum number of cached entries before oldest-first eviction
    /// (default: 512).
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_true() -> bool {
    true
}
fn default_max_entries() -> usize {
    512
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            max_entries: 512,
        }
    }
}

impl CacheConfig {
    /// Resolve the cache directory, falling back to the platform default.
    pub fn resolved_dir(&self) -> PathBuf {
        if let Some(dir) = &self.dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("", "", "loupe")
            .map(|d| d.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".loupe-cache"))
    }
}

/// Configuration for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Company name shown in the rendered report.
    #[serde(default = "default_company")]
    pub company_name: String,
    /// Report title.
    #[serde(default = "default_title")]
    pub report_title: String,
    /// Report author line.
    #[serde(default = "default_author")]
    pub author: String,

    /// Chat model identifier sent to the endpoint.
    #[serde(default = "default_model")]
    pub model: String,
    /// Token budget per LLM call (default: 4000).
    #[serde(default = "default_max_tokens")]
    pub max_tokens_per_call: u32,
    /// Sampling temperature (default: 0.7).
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Explicit API key. Takes precedence over `api_key_env` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Chat-completions endpoint base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum concurrent per-interview LLM calls (default: 4).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_company() -> String {
    "Company".into()
}
fn default_title() -> String {
    "UX Research Report".into()
}
fn default_author() -> String {
    "Research Team".into()
}
fn default_model() -> String {
    "anthropic/claude-3.5-sonnet".into()
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_temperature() -> f32 {
    0.7
}
fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_concurrency() -> usize {
    4
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            company_name: default_company(),
            report_title: default_title(),
            author: default_author(),
            model: default_model(),
            max_tokens_per_call: default_max_tokens(),
            temperature: default_temperature(),
            api_key: None,
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            concurrency: default_concurrency(),
            cache: CacheConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Resolve the API key from the explicit field or the environment.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = &self.api_key
            && !key.is_empty()
        {
            return Ok(key.clone());
        }
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigError::ApiKeyMissing {
                var: self.api_key_env.clone(),
            })
    }
}

/// Load configuration: defaults -> optional TOML file -> `LOUPE_*` env vars.
///
/// Nested keys use double underscores, e.g. `LOUPE_CACHE__MAX_ENTRIES=64`.
pub fn load_config(config_file: Option<&Path>) -> Result<AnalysisConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(AnalysisConfig::default()));
    if let Some(path) = config_file {
        figment = figment.merge(Toml::file(path));
    }
    figment = figment.merge(Env::prefixed("LOUPE_").split("__"));
    figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })
}
