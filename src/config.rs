//! Configuration file parser for ~/.config/reddit-cleaner/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are silently ignored by serde (with `deny_unknown_fields` off),
//! though we log a warning when the file contains potential typos.
use crate::reddit::{mutator, DEFAULT_API_BASE, DEFAULT_MAX_PAGES, DEFAULT_USER_AGENT};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the OAuth access token.
pub const TOKEN_ENV_VAR: &str = "REDDIT_ACCESS_TOKEN";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// Missing keys fall back to `Default::default()`.
///
/// Custom Debug impl masks `access_token`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the OAuth API.
    pub api_base: String,

    /// User-Agent sent upstream.
    pub user_agent: String,

    /// When set, API calls are posted to this relay instead of going direct.
    pub relay_url: Option<String>,

    /// OAuth access token (alternative to REDDIT_ACCESS_TOKEN env var).
    /// Env var takes precedence over config file.
    pub access_token: Option<String>,

    /// Subreddits unsubscribed concurrently per batch.
    pub batch_size: usize,

    /// Pause between batches in milliseconds.
    pub cooldown_ms: u64,

    /// Ceiling on listing pages fetched.
    pub max_pages: usize,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Relay server settings (`serve` command).
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Address the relay binds to.
    pub bind: String,

    /// Hosts the relay will forward to.
    pub allowed_hosts: Vec<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
            allowed_hosts: vec!["oauth.reddit.com".to_string()],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            relay_url: None,
            access_token: None,
            batch_size: mutator::DEFAULT_BATCH_SIZE,
            cooldown_ms: mutator::DEFAULT_COOLDOWN.as_millis() as u64,
            max_pages: DEFAULT_MAX_PAGES,
            request_timeout_secs: 30,
            relay: RelayConfig::default(),
        }
    }
}

/// Mask access_token in Debug output to prevent secret leakage.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base", &self.api_base)
            .field("user_agent", &self.user_agent)
            .field("relay_url", &self.relay_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("batch_size", &self.batch_size)
            .field("cooldown_ms", &self.cooldown_ms)
            .field("max_pages", &self.max_pages)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("relay", &self.relay)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    /// Default location: `$HOME/.config/reddit-cleaner/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var_os("HOME")?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("reddit-cleaner")
                .join("config.toml"),
        )
    }

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → silently accepted (serde default behavior), logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            let known_keys = [
                "api_base",
                "user_agent",
                "relay_url",
                "access_token",
                "batch_size",
                "cooldown_ms",
                "max_pages",
                "request_timeout_secs",
                "relay",
            ];
            for key in raw.keys() {
                if !known_keys.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            api_base = %config.api_base,
            relay = config.relay_url.is_some(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Token from `REDDIT_ACCESS_TOKEN`, falling back to `access_token`.
    pub fn resolve_token(&self) -> Option<String> {
        resolve_token_from(std::env::var(TOKEN_ENV_VAR).ok(), self.access_token.as_deref())
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn resolve_token_from(env: Option<String>, file: Option<&str>) -> Option<String> {
    env.filter(|t| !t.trim().is_empty())
        .or_else(|| file.filter(|t| !t.trim().is_empty()).map(str::to_string))
        .map(|t| t.trim().to_string())
}

// ============================================================================
// Tests
// ============================================================================
