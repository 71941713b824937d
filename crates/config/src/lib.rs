//! Configuration loading, validation, and management for PHILOVOID.
//!
//! Loads configuration from `~/.philovoid/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Environment variables recognized as overrides.
pub const API_KEY_ENV: &str = "PHILOVOID_API_KEY";
pub const API_KEY_ENV_FALLBACK: &str = "GEMINI_API_KEY";
pub const BASE_URL_ENV: &str = "PHILOVOID_BASE_URL";

/// The root configuration structure.
///
/// Maps directly to `~/.philovoid/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the hosted model provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model for ordinary turns
    #[serde(default = "default_fast_model")]
    pub fast_model: String,

    /// Model for extended-reasoning turns and synthesis
    #[serde(default = "default_deep_model")]
    pub deep_model: String,

    /// Token budget handed to the deep model's reasoning phase
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: u32,

    /// Where the conversation snapshot and library files live.
    /// Defaults to `~/.philovoid`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_fast_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_deep_model() -> String {
    "gemini-2.5-pro".into()
}
fn default_thinking_budget() -> u32 {
    32_768
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            fast_model: default_fast_model(),
            deep_model: default_deep_model(),
            thinking_budget: default_thinking_budget(),
            data_dir: None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("fast_model", &self.fast_model)
            .field("deep_model", &self.deep_model)
            .field("thinking_budget", &self.thinking_budget)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Default config file location: `~/.philovoid/config.toml`.
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".philovoid").join("config.toml")
    }

    /// Load from the default path with env overrides applied.
    /// A missing file yields the defaults (still subject to overrides).
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_path(&Self::default_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from an explicit path. A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })
            }
        };

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Apply environment variable overrides on top of file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        } else if let Ok(key) = std::env::var(API_KEY_ENV_FALLBACK) {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.is_empty() {
                self.base_url = url;
            }
        }
    }

    /// Validate settings. Does not require an API key — that is checked at
    /// the moment a gateway call is attempted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        if self.fast_model.is_empty() || self.deep_model.is_empty() {
            return Err(ConfigError::Invalid("model names must not be empty".into()));
        }
        if self.thinking_budget == 0 {
            return Err(ConfigError::Invalid(
                "thinking_budget must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// The effective data directory.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            Self::default_path()
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
        })
    }

    /// Where the conversation snapshot lives.
    pub fn conversation_path(&self) -> PathBuf {
        self.data_dir().join("conversation.json")
    }
}
