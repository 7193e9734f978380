//! TOML Configuration File Support
//!
//! Loads [`LookupConfig`] from a TOML file at
//! `$XDG_CONFIG_HOME/footprint/config.toml`, the environment and CLI overrides.
//!
//! # Configuration Priority
//!
//! Highest first:
//! 1. CLI arguments ([`ConfigOverrides`])
//! 2. Environment variables (`FOOTPRINT_*`)
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! url = "https://gosearch-tg-app.vercel.app"
//! request_timeout_secs = 40
//!
//! [status]
//! reveal_tick_ms = 30
//! title_tick_ms = 20
//! summary_chars = 96
//!
//! [search]
//! narration = true
//! render_delay_ms = 600
//! overlap_policy = "cancel-previous"
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::status::RevealTiming;

/// Hosted lookup service
pub const DEFAULT_BACKEND_URL: &str = "https://gosearch-tg-app.vercel.app";

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks which layer last changed the configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Command-line argument
    Cli,
    /// Environment variable
    Env,
    /// TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// Overlap Policy
// =============================================================================

/// What happens when a search is submitted while another is in flight
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapPolicy {
    /// Cancel the in-flight search; it settles as superseded
    #[default]
    CancelPrevious,
    /// Wait for the in-flight search to settle, then run
    Queue,
}

impl FromStr for OverlapPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cancel-previous" | "cancel" => Ok(Self::CancelPrevious),
            "queue" => Ok(Self::Queue),
            other => Err(ConfigError::ValidationError(format!(
                "unknown overlap policy {other:?} (expected \"cancel-previous\" or \"queue\")"
            ))),
        }
    }
}

impl std::fmt::Display for OverlapPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CancelPrevious => write!(f, "cancel-previous"),
            Self::Queue => write!(f, "queue"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Base URL of the lookup service
    pub url: Option<String>,

    /// Search deadline in seconds
    pub request_timeout_secs: Option<u64>,
}

/// Status log section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusToml {
    /// Per-character reveal tick in milliseconds
    pub reveal_tick_ms: Option<u64>,

    /// Per-character reveal tick for title lines in milliseconds
    pub title_tick_ms: Option<u64>,

    /// Maximum length of error summaries in the status log
    pub summary_chars: Option<usize>,
}

/// Search section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchToml {
    /// Whether to narrate progress while a request is in flight
    pub narration: Option<bool>,

    /// Pause before rendering a successful result, in milliseconds
    pub render_delay_ms: Option<u64>,

    /// Overlapping search handling
    pub overlap_policy: Option<OverlapPolicy>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FootprintToml {
    /// Backend configuration section
    pub backend: BackendToml,

    /// Status log configuration section
    pub status: StatusToml,

    /// Search configuration section
    pub search: SearchToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Settings for the orchestrator, the status reporter and the HTTP backend
///
/// Use [`load_config`] to load it with proper priority handling.
#[derive(Clone, Debug)]
pub struct LookupConfig {
    /// Base URL of the lookup service
    pub backend_url: String,

    /// Deadline for one search request
    pub request_timeout: Duration,

    /// Per-character reveal tick
    pub reveal_tick: Duration,

    /// Per-character reveal tick for title lines
    pub title_tick: Duration,

    /// Maximum length of error summaries in the status log
    pub status_summary_chars: usize,

    /// Narrate progress while a request is in flight
    pub narration: bool,

    /// Pause before rendering a successful result
    pub render_delay: Duration,

    /// Overlapping search handling
    pub overlap_policy: OverlapPolicy,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: Duration::from_secs(40),
            reveal_tick: Duration::from_millis(30),
            title_tick: Duration::from_millis(20),
            status_summary_chars: 96,
            narration: true,
            render_delay: Duration::from_millis(600),
            overlap_policy: OverlapPolicy::CancelPrevious,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl LookupConfig {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the layer that last changed this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Reveal timing for the status reporter
    #[must_use]
    pub fn reveal_timing(&self) -> RevealTiming {
        RevealTiming {
            tick: self.reveal_tick,
            title_tick: self.title_tick,
        }
    }

    /// Defaults with every cosmetic delay removed
    ///
    /// Reveals are instant, narration is off and results render immediately.
    #[must_use]
    pub fn without_pacing() -> Self {
        Self {
            reveal_tick: Duration::ZERO,
            title_tick: Duration::ZERO,
            narration: false,
            render_delay: Duration::ZERO,
            ..Self::default()
        }
    }

    /// Check values that would make searches impossible
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for a zero request timeout, a
    /// summary length below two characters, or a backend URL that is not an
    /// absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        if self.status_summary_chars < 2 {
            return Err(ConfigError::ValidationError(format!(
                "status summary length must be at least 2, got {}",
                self.status_summary_chars
            )));
        }
        let url = reqwest::Url::parse(&self.backend_url).map_err(|e| {
            ConfigError::ValidationError(format!("backend URL {:?}: {e}", self.backend_url))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "backend URL must use http or https, got {:?}",
                url.scheme()
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/footprint/config.toml` or
/// `~/.config/footprint/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("footprint").join("config.toml"))
}

/// Load configuration from all sources with proper priority
///
/// CLI arguments are not handled here; apply [`ConfigOverrides`] afterwards.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<LookupConfig, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path and the process environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<LookupConfig, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration with an explicit environment lookup
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<LookupConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = LookupConfig::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: FootprintToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut LookupConfig, toml: &FootprintToml) {
    if let Some(ref url) = toml.backend.url {
        config.backend_url.clone_from(url);
    }
    if let Some(secs) = toml.backend.request_timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }

    if let Some(ms) = toml.status.reveal_tick_ms {
        config.reveal_tick = Duration::from_millis(ms);
    }
    if let Some(ms) = toml.status.title_tick_ms {
        config.title_tick = Duration::from_millis(ms);
    }
    if let Some(chars) = toml.status.summary_chars {
        config.status_summary_chars = chars;
    }

    if let Some(enabled) = toml.search.narration {
        config.narration = enabled;
    }
    if let Some(ms) = toml.search.render_delay_ms {
        config.render_delay = Duration::from_millis(ms);
    }
    if let Some(policy) = toml.search.overlap_policy {
        config.overlap_policy = policy;
    }
}

/// Apply environment variable overrides to the config
///
/// Values that fail to parse are ignored with a warning.
fn apply_env_config<F>(config: &mut LookupConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = env("FOOTPRINT_BACKEND_URL") {
        config.backend_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(secs) = env_parse::<u64>(&env, "FOOTPRINT_REQUEST_TIMEOUT_SECS") {
        config.request_timeout = Duration::from_secs(secs);
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = env_parse::<u64>(&env, "FOOTPRINT_REVEAL_TICK_MS") {
        config.reveal_tick = Duration::from_millis(ms);
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = env_parse::<u64>(&env, "FOOTPRINT_TITLE_TICK_MS") {
        config.title_tick = Duration::from_millis(ms);
        config.source = ConfigSource::Env;
    }
    if let Some(enabled) = env("FOOTPRINT_NARRATION") {
        config.narration = enabled != "0" && enabled.to_lowercase() != "false";
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = env_parse::<u64>(&env, "FOOTPRINT_RENDER_DELAY_MS") {
        config.render_delay = Duration::from_millis(ms);
        config.source = ConfigSource::Env;
    }
    if let Some(policy) = env_parse::<OverlapPolicy>(&env, "FOOTPRINT_OVERLAP_POLICY") {
        config.overlap_policy = policy;
        config.source = ConfigSource::Env;
    }
}

fn env_parse<T: FromStr>(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = env(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable environment variable");
            None
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Backend URL override
    pub backend_url: Option<String>,

    /// Request timeout override (seconds)
    pub request_timeout_secs: Option<u64>,

    /// Narration override
    pub narration: Option<bool>,

    /// Overlap policy override
    pub overlap_policy: Option<OverlapPolicy>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set backend URL override
    #[must_use]
    pub fn with_backend_url(mut self, url: String) -> Self {
        self.backend_url = Some(url);
        self
    }

    /// Set request timeout override
    #[must_use]
    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = Some(secs);
        self
    }

    /// Set narration override
    #[must_use]
    pub fn with_narration(mut self, enabled: bool) -> Self {
        self.narration = Some(enabled);
        self
    }

    /// Set overlap policy override
    #[must_use]
    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = Some(policy);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut LookupConfig) {
        if self.backend_url.is_some()
            || self.request_timeout_secs.is_some()
            || self.narration.is_some()
            || self.overlap_policy.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.backend_url {
            config.backend_url.clone_from(url);
        }
        if let Some(secs) = self.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(enabled) = self.narration {
            config.narration = enabled;
        }
        if let Some(policy) = self.overlap_policy {
            config.overlap_policy = policy;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
