use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration module
/// This module holds the configuration snapshot consumed by the translation
/// core. It is loaded once (or on reload) and passed in explicitly; nothing in
/// the library reads configuration from a global.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Default and fallback translator names
    #[serde(default)]
    pub general: GeneralConfig,

    /// Per-translator settings, keyed by translator name
    #[serde(default = "default_translators")]
    pub translators: BTreeMap<String, TranslatorConfig>,

    /// Retry and circuit breaker settings
    #[serde(default)]
    pub translator_manager: TranslatorManagerConfig,

    /// Translation strategy
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            translators: default_translators(),
            translator_manager: TranslatorManagerConfig::default(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

/// Default and fallback translator selection
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeneralConfig {
    /// Translator tried right after an explicitly preferred one
    #[serde(default = "default_default_translator")]
    pub default_translator: String,

    /// Translator tried after the default one
    #[serde(default = "default_fallback_translator")]
    pub fallback_translator: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_translator: default_default_translator(),
            fallback_translator: default_fallback_translator(),
        }
    }
}

/// Settings for one translator.
///
/// Numeric fields are signed so that out-of-range values survive parsing and
/// are reported by `validate` instead of failing the whole file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslatorConfig {
    /// Whether the translator may be selected
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Maximum retries for this translator
    #[serde(default = "default_retry_count")]
    pub retry_count: i64,

    /// Request cap per trailing minute
    #[serde(default = "default_max_requests_per_minute")]
    pub max_requests_per_minute: i64,

    /// Selection priority, lower is preferred
    #[serde(default = "default_priority")]
    pub priority: i64,

    /// API key for remote services
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Application id of a signed API (Baidu)
    #[serde(default = "String::new")]
    pub app_id: String,

    /// Signing secret of a signed API (Baidu)
    #[serde(default = "String::new")]
    pub secret_key: String,

    /// Base URL of an OpenAI-compatible API
    #[serde(default = "String::new")]
    pub base_url: String,

    /// Service URL of a local model server
    #[serde(default = "String::new")]
    pub endpoint: String,

    /// Model name
    #[serde(default = "String::new")]
    pub model: String,

    /// Sampling temperature for LLM translators
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate for LLM translators
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: default_timeout(),
            retry_count: default_retry_count(),
            max_requests_per_minute: default_max_requests_per_minute(),
            priority: default_priority(),
            api_key: String::new(),
            app_id: String::new(),
            secret_key: String::new(),
            base_url: String::new(),
            endpoint: String::new(),
            model: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl TranslatorConfig {
    /// Check the numeric fields, returning one message per problem
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !(self.timeout > 0.0) {
            errors.push("timeout must be greater than 0".to_string());
        }
        if self.retry_count < 0 {
            errors.push("retry_count must not be negative".to_string());
        }
        if self.max_requests_per_minute <= 0 {
            errors.push("max_requests_per_minute must be greater than 0".to_string());
        }
        if self.priority < 0 {
            errors.push("priority must not be negative".to_string());
        }
        errors
    }

    /// Timeout as a duration, falling back to the default for invalid values
    pub fn timeout_duration(&self) -> Duration {
        if self.timeout > 0.0 && self.timeout.is_finite() {
            Duration::from_secs_f64(self.timeout)
        } else {
            Duration::from_secs_f64(default_timeout())
        }
    }
}

/// Orchestrator-wide settings
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TranslatorManagerConfig {
    /// Retry with exponential backoff
    #[serde(default)]
    pub retry: RetryConfig,

    /// Failure threshold and half-open recovery
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,
}

/// Retry settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry, in seconds
    #[serde(default = "default_base_delay")]
    pub base_delay: f64,

    /// Upper bound for any delay, in seconds
    #[serde(default = "default_max_delay")]
    pub max_delay: f64,

    /// Multiplier applied per attempt
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Scale delays by a random factor in [0.5, 1.0]
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
            backoff_factor: default_backoff_factor(),
            jitter: true,
        }
    }
}

/// Circuit breaker settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before a translator is marked unavailable
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Seconds after the last error before a trial call is allowed
    #[serde(default = "default_recovery_timeout")]
    pub recovery_timeout: f64,

    /// Failed trial calls allowed before the translator is excluded again
    #[serde(default = "default_half_open_max_calls")]
    pub half_open_max_calls: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout: default_recovery_timeout(),
            half_open_max_calls: default_half_open_max_calls(),
        }
    }
}

/// How segments are sent to a translator
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TranslationMode {
    /// One request per segment, optionally with surrounding context
    PerSegment,
    /// Merge neighbouring segments into blocks and split the translation back
    #[default]
    Block,
}

impl std::fmt::Display for TranslationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PerSegment => write!(f, "per_segment"),
            Self::Block => write!(f, "block"),
        }
    }
}

impl std::str::FromStr for TranslationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "per_segment" | "segment" => Ok(Self::PerSegment),
            "block" => Ok(Self::Block),
            _ => Err(anyhow!("Invalid translation mode: {}", s)),
        }
    }
}

/// Translation strategy settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    /// Per-segment or block translation
    #[serde(default)]
    pub mode: TranslationMode,

    /// Maximum characters of merged text per block
    #[serde(default = "default_max_block_chars")]
    pub max_block_chars: usize,

    /// Largest silence, in seconds, that may sit inside one block
    #[serde(default = "default_max_gap_seconds")]
    pub max_gap_seconds: f64,

    /// Also close a block after sentence-terminal punctuation
    #[serde(default)]
    pub sentence_boundaries: bool,

    /// Number of neighbouring segments shown as context
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Whether context-aware translation is used when supported
    #[serde(default = "default_true")]
    pub context_enabled: bool,

    /// Whether providers cache responses
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Maximum cached responses per provider
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,

    /// Accept segment boundaries proposed by structured translation
    #[serde(default)]
    pub use_ai_timestamps: bool,

    /// Use structured (JSON) block translation when supported
    #[serde(default = "default_true")]
    pub structured_prompt: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            mode: TranslationMode::default(),
            max_block_chars: default_max_block_chars(),
            max_gap_seconds: default_max_gap_seconds(),
            sentence_boundaries: false,
            context_window: default_context_window(),
            context_enabled: true,
            cache_enabled: true,
            cache_size: default_cache_size(),
            use_ai_timestamps: false,
            structured_prompt: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_default_translator() -> String {
    "google".to_string()
}

fn default_fallback_translator() -> String {
    "simple".to_string()
}

fn default_timeout() -> f64 {
    15.0
}

fn default_retry_count() -> i64 {
    3
}

fn default_max_requests_per_minute() -> i64 {
    60
}

fn default_priority() -> i64 {
    1
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    4000
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay() -> f64 {
    1.0
}

fn default_max_delay() -> f64 {
    30.0
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_recovery_timeout() -> f64 {
    300.0
}

fn default_half_open_max_calls() -> u32 {
    3
}

fn default_max_block_chars() -> usize {
    600
}

fn default_max_gap_seconds() -> f64 {
    3.0
}

fn default_context_window() -> usize {
    10
}

fn default_cache_size() -> usize {
    1000
}

fn default_translators() -> BTreeMap<String, TranslatorConfig> {
    let mut translators = BTreeMap::new();
    translators.insert("google".to_string(), TranslatorConfig::default());
    translators.insert(
        "simple".to_string(),
        TranslatorConfig {
            // Placeholder output, only worth using when nothing else answers
            priority: 9,
            ..TranslatorConfig::default()
        },
    );
    translators
}

impl Config {
    /// Load a configuration file (JSON)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path.as_ref(), content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))
    }

    /// Per-user configuration location (`<config_dir>/video2srt/conf.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("video2srt").join("conf.json"))
    }

    /// Settings for a translator, or defaults when it is not configured
    pub fn translator_config(&self, name: &str) -> TranslatorConfig {
        self.translators.get(name).cloned().unwrap_or_default()
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.translation.max_block_chars == 0 {
            return Err(anyhow!("translation.max_block_chars must be greater than 0"));
        }
        if !(self.translation.max_gap_seconds >= 0.0) {
            return Err(anyhow!("translation.max_gap_seconds must not be negative"));
        }

        let retry = &self.translator_manager.retry;
        if retry.base_delay < 0.0 || retry.max_delay < 0.0 {
            return Err(anyhow!("translator_manager.retry delays must not be negative"));
        }
        if retry.backoff_factor < 1.0 {
            return Err(anyhow!("translator_manager.retry.backoff_factor must be at least 1.0"));
        }
        if self.translator_manager.circuit_breaker.failure_threshold == 0 {
            return Err(anyhow!("translator_manager.circuit_breaker.failure_threshold must be greater than 0"));
        }

        Ok(())
    }
}
