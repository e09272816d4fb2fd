//! Configuration type definitions and defaults

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Provider names accepted in `[providers].default`.
pub const PROVIDER_NAMES: [&str; 3] = ["gemini", "kimi", "deepseek"];

/// Longest accepted `rate_limit.wait_minutes` (one day).
pub const MAX_WAIT_MINUTES: f64 = 24.0 * 60.0;

/// Largest accepted `retry.backoff_growth`.
pub const MAX_BACKOFF_GROWTH: u64 = 60;

/// Largest accepted `retry.backoff_base_secs` (one hour).
pub const MAX_BACKOFF_BASE_SECS: u64 = 3600;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Input, prompt and output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory scanned for input files when none are given
    #[serde(default = "default_input_dir")]
    pub input_dir: String,
    /// Directory that prompt template ids are resolved against
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: String,
    /// Root of the `<Provider>/<name>_<tag>.md` output tree
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

pub fn default_input_dir() -> String {
    "book_1".to_string()
}

pub fn default_prompts_dir() -> String {
    "prompts".to_string()
}

pub fn default_output_dir() -> String {
    "book_2".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            prompts_dir: default_prompts_dir(),
            output_dir: default_output_dir(),
        }
    }
}

/// Minimum spacing between remote calls
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_wait_minutes")]
    pub wait_minutes: f64,
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

pub fn default_wait_minutes() -> f64 {
    1.0
}

pub fn default_show_progress() -> bool {
    true
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            wait_minutes: default_wait_minutes(),
            show_progress: default_show_progress(),
        }
    }
}

impl RateLimitConfig {
    /// Same settings with a different interval.
    pub fn with_wait_minutes(self, wait_minutes: f64) -> Self {
        Self {
            wait_minutes,
            ..self
        }
    }
}

/// Retry policy for transient remote failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per remote call, including the first
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed part of the backoff, in seconds
    #[serde(default = "default_backoff_base_secs")]
    pub backoff_base_secs: u64,
    /// Backoff adds `growth ^ attempt` seconds
    #[serde(default = "default_backoff_growth")]
    pub backoff_growth: u64,
}

pub fn default_max_retries() -> u32 {
    3
}

pub fn default_backoff_base_secs() -> u64 {
    10
}

pub fn default_backoff_growth() -> u64 {
    5
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_base_secs: default_backoff_base_secs(),
            backoff_growth: default_backoff_growth(),
        }
    }
}

/// Fixed courtesy delays around each remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Pause before the first attempt of every call
    #[serde(default = "default_thinking_secs")]
    pub thinking_secs: u64,
    /// Pause after a successful response
    #[serde(default = "default_settle_secs")]
    pub settle_secs: u64,
    /// Pause between a provider's priming request and the real request
    #[serde(default = "default_prime_settle_secs")]
    pub prime_settle_secs: u64,
}

pub fn default_thinking_secs() -> u64 {
    15
}

pub fn default_settle_secs() -> u64 {
    10
}

pub fn default_prime_settle_secs() -> u64 {
    10
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            thinking_secs: default_thinking_secs(),
            settle_secs: default_settle_secs(),
            prime_settle_secs: default_prime_settle_secs(),
        }
    }
}

impl PacingConfig {
    /// No pacing at all (tests and dry runs).
    pub fn none() -> Self {
        Self {
            thinking_secs: 0,
            settle_secs: 0,
            prime_settle_secs: 0,
        }
    }
}

/// What to do when the consecutive-failure breaker trips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Ask on the terminal (falls back to halt when not interactive)
    #[default]
    Ask,
    /// Reset the counter and keep going
    Continue,
    /// Stop the pass
    Halt,
}

/// What to do with failed jobs at the end of a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RetryPolicyChoice {
    /// Ask on the terminal (falls back to never when not interactive)
    #[default]
    Ask,
    /// Retry right away
    Now,
    /// Double the wait interval, then retry
    Slower,
    /// Leave failed jobs alone
    Never,
}

/// Batch control settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Back-to-back failures before asking whether to continue
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: usize,
    #[serde(default)]
    pub on_consecutive_failures: FailurePolicy,
    #[serde(default)]
    pub on_failed_jobs: RetryPolicyChoice,
}

pub fn default_failure_threshold() -> usize {
    3
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            on_consecutive_failures: FailurePolicy::default(),
            on_failed_jobs: RetryPolicyChoice::default(),
        }
    }
}

/// Provider selection and per-provider overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Provider used when `--provider` is not given
    #[serde(default = "default_provider")]
    pub default: String,
    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub gemini: ProviderSettings,
    #[serde(default)]
    pub kimi: ProviderSettings,
    #[serde(default)]
    pub deepseek: ProviderSettings,
}

pub fn default_provider() -> String {
    "gemini".to_string()
}

pub fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            default: default_provider(),
            request_timeout_secs: default_request_timeout_secs(),
            gemini: ProviderSettings::default(),
            kimi: ProviderSettings::default(),
            deepseek: ProviderSettings::default(),
        }
    }
}

impl ProvidersConfig {
    /// Look up per-provider settings by name.
    pub fn settings(&self, name: &str) -> Option<&ProviderSettings> {
        match name {
            "gemini" => Some(&self.gemini),
            "kimi" => Some(&self.kimi),
            "deepseek" => Some(&self.deepseek),
            _ => None,
        }
    }
}

/// Per-provider overrides. Unset fields fall back to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Model identifier
    #[serde(default)]
    pub model: Option<String>,
    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// API key stored directly in the config (takes precedence over the env var)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Alternative endpoint, e.g. a proxy
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns `Ok(())` if all values are within acceptable bounds,
    /// or an error describing the first invalid value found.
    pub fn validate(&self) -> Result<(), String> {
        let wait = self.rate_limit.wait_minutes;
        if !wait.is_finite() || wait < 0.0 {
            return Err(format!(
                "rate_limit.wait_minutes must be a non-negative number, got {}",
                wait
            ));
        }
        if wait > MAX_WAIT_MINUTES {
            return Err(format!(
                "rate_limit.wait_minutes {} exceeds maximum ({})",
                wait, MAX_WAIT_MINUTES
            ));
        }
        if self.retry.max_retries == 0 {
            return Err("retry.max_retries must be > 0".to_string());
        }
        if self.retry.max_retries > 10 {
            return Err(format!(
                "retry.max_retries {} exceeds maximum (10)",
                self.retry.max_retries
            ));
        }
        if self.retry.backoff_growth > MAX_BACKOFF_GROWTH {
            return Err(format!(
                "retry.backoff_growth {} exceeds maximum ({})",
                self.retry.backoff_growth, MAX_BACKOFF_GROWTH
            ));
        }
        if self.retry.backoff_base_secs > MAX_BACKOFF_BASE_SECS {
            return Err(format!(
                "retry.backoff_base_secs {} exceeds maximum ({})",
                self.retry.backoff_base_secs, MAX_BACKOFF_BASE_SECS
            ));
        }
        if self.batch.failure_threshold == 0 {
            return Err("batch.failure_threshold must be > 0".to_string());
        }
        if !PROVIDER_NAMES.contains(&self.providers.default.as_str()) {
            return Err(format!(
                "Unknown provider '{}'. Valid: {}",
                self.providers.default,
                PROVIDER_NAMES.join(", ")
            ));
        }
        if self.providers.request_timeout_secs == 0 {
            return Err("providers.request_timeout_secs must be > 0".to_string());
        }
        Ok(())
    }
}
