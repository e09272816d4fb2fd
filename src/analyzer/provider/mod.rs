//! Remote LLM providers.
//!
//! Each provider knows how to send one request to its API, how to turn the
//! reply into markdown, and which of its failures are worth retrying. Retrying
//! itself lives in [`crate::analyzer::retry`] and is shared by all providers.
//!
//! # Supported Providers
//!
//! - **Gemini**: Google Generative Language REST API (`generateContent`)
//! - **Kimi**: Moonshot chat completions, primed with the system prompt first
//! - **DeepSeek**: DeepSeek chat completions

mod chat;
mod deepseek;
mod gemini;
mod kimi;

pub use deepseek::DeepSeekProvider;
pub use gemini::GeminiProvider;
pub use kimi::KimiProvider;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Local};
use clap::ValueEnum;
use thiserror::Error;

use crate::analyzer::prompt::{self, PromptTemplate};
use crate::clock::SharedClock;
use crate::config::Config;

/// Gemini models offered by `promptbatch providers`.
pub const GEMINI_MODELS: &[&str] = &[
    "gemini-2.0-flash-exp",
    "gemini-exp-1206",
    "gemini-2.0-flash-thinking-exp-1219",
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "gemini-1.5-flash-8b",
];

/// Sampling parameters shared by every provider.
pub const TEMPERATURE: f32 = 0.3;
pub const TOP_P: f32 = 0.1;
pub const PRESENCE_PENALTY: f32 = 0.1;
pub const FREQUENCY_PENALTY: f32 = 0.1;
pub const MAX_TOKENS: u32 = 4096;

/// Result type for a single provider request.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A remote analysis service (Strategy pattern).
///
/// One instance is created per batch and shared by all of its jobs.
pub trait AnalysisProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Model identifier sent with every request.
    fn model(&self) -> &str;

    /// Perform exactly one remote attempt.
    ///
    /// `prompt` is the rendered template; `text` is the file content.
    fn send(&self, text: &str, prompt: &str) -> ProviderResult<String>;

    /// Whether `error` may go away if the same request is repeated.
    fn is_transient(&self, error: &ProviderError) -> bool;

    /// Replace the API key used for subsequent requests.
    fn update_credential(&mut self, api_key: String);

    /// Render the prompt template for one input file.
    fn format_prompt(&self, template: &PromptTemplate, text: &str, title: &str) -> String {
        template.render(title, text)
    }

    /// Convert a raw reply into the markdown document written to disk.
    fn to_markdown(&self, raw: &str, title: &str) -> String {
        self.to_markdown_at(raw, title, Local::now())
    }

    /// Same as [`AnalysisProvider::to_markdown`] with a fixed generation time.
    fn to_markdown_at(&self, raw: &str, title: &str, generated_at: DateTime<Local>) -> String {
        prompt::render_markdown(&self.kind().to_string(), self.model(), raw, title, generated_at)
    }

    /// Directory under the output root that this provider writes into.
    fn output_dir_name(&self) -> &'static str {
        self.kind().output_dir_name()
    }

    /// Suffix appended to output file names.
    fn variant_tag(&self) -> String {
        self.kind().variant_tag(self.model())
    }
}

/// Provider types supported for analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum ProviderKind {
    #[value(name = "gemini")]
    Gemini,
    #[value(name = "kimi")]
    Kimi,
    #[value(name = "deepseek")]
    DeepSeek,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [ProviderKind::Gemini, ProviderKind::Kimi, ProviderKind::DeepSeek];

    /// Lowercase name used in config and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Kimi => "kimi",
            ProviderKind::DeepSeek => "deepseek",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => GEMINI_MODELS[0],
            ProviderKind::Kimi => "moonshot-v1-auto",
            ProviderKind::DeepSeek => "deepseek-chat",
        }
    }

    /// Environment variable consulted for the API key.
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Kimi => "MOONSHOT_API_KEY",
            ProviderKind::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com",
            ProviderKind::Kimi => "https://api.moonshot.cn/v1",
            ProviderKind::DeepSeek => "https://api.deepseek.com",
        }
    }

    pub fn output_dir_name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini",
            ProviderKind::Kimi => "Kimi",
            ProviderKind::DeepSeek => "DeepSeek",
        }
    }

    /// File name suffix for results produced with `model`.
    ///
    /// Gemini includes the model version (`gemini-1.5-pro` -> `gemini1.5`).
    pub fn variant_tag(&self, model: &str) -> String {
        match self {
            ProviderKind::Gemini => match model.split('-').nth(1) {
                Some(version) if !version.is_empty() => format!("gemini{}", version),
                _ => "gemini".to_string(),
            },
            ProviderKind::Kimi => "kimi".to_string(),
            ProviderKind::DeepSeek => "deepseek".to_string(),
        }
    }

    /// Create the provider for this kind.
    pub fn create_provider(
        &self,
        options: ProviderOptions,
        clock: SharedClock,
    ) -> ProviderResult<Box<dyn AnalysisProvider>> {
        let client = build_http_client(options.timeout)?;
        Ok(match self {
            ProviderKind::Gemini => Box::new(GeminiProvider::new(client, options)),
            ProviderKind::Kimi => Box::new(KimiProvider::new(client, options, clock)),
            ProviderKind::DeepSeek => Box::new(DeepSeekProvider::new(client, options)),
        })
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gemini => write!(f, "Gemini"),
            ProviderKind::Kimi => write!(f, "Kimi"),
            ProviderKind::DeepSeek => write!(f, "DeepSeek"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "kimi" | "moonshot" => Ok(ProviderKind::Kimi),
            "deepseek" => Ok(ProviderKind::DeepSeek),
            _ => Err(format!(
                "Unknown provider: '{}'. Supported providers: gemini, kimi, deepseek",
                s
            )),
        }
    }
}

/// Everything needed to build a provider, resolved from config and flags.
#[derive(Debug, Clone)]
pub struct ProviderOptions {
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Pause between a priming request and the real one (Kimi only).
    pub prime_settle: Duration,
}

impl ProviderOptions {
    /// Resolve options for `kind`.
    ///
    /// Precedence: `model_override` > `[providers.<name>]` > built-in defaults.
    /// The API key comes from `api_key` in the config, else from the configured
    /// environment variable.
    pub fn resolve(
        kind: ProviderKind,
        config: &Config,
        model_override: Option<&str>,
    ) -> ProviderResult<Self> {
        let settings = config.provider_settings(kind.name()).cloned().unwrap_or_default();

        let env_var = settings
            .api_key_env
            .clone()
            .unwrap_or_else(|| kind.default_api_key_env().to_string());
        let api_key = settings
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(&env_var).ok().filter(|k| !k.trim().is_empty()))
            .ok_or(ProviderError::MissingCredential {
                provider: kind.name(),
                env_var,
            })?;

        let model = model_override
            .map(str::to_string)
            .or(settings.model)
            .unwrap_or_else(|| kind.default_model().to_string());

        Ok(Self {
            model,
            api_key,
            base_url: settings
                .base_url
                .unwrap_or_else(|| kind.default_base_url().to_string()),
            timeout: Duration::from_secs(config.providers.request_timeout_secs),
            prime_settle: Duration::from_secs(config.pacing.prime_settle_secs),
        })
    }
}

/// Build the blocking HTTP client shared by a provider's requests.
pub fn build_http_client(timeout: Duration) -> ProviderResult<reqwest::blocking::Client> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(30)))
        .user_agent(concat!("promptbatch/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Errors from a single provider request.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No API key for {provider}: set {env_var} or providers.{provider}.api_key")]
    MissingCredential {
        provider: &'static str,
        env_var: String,
    },

    #[error("HTTP {status}: {}", truncate_body(body))]
    Http { status: u16, body: String },

    #[error("Rate limited: {0}")]
    RateLimited(RateLimitInfo),

    #[error("Content blocked: {0}")]
    ContentBlocked(String),

    #[error("Provider returned an empty response")]
    EmptyResponse,

    /// The URL is stripped before this is built, see the `From` impl.
    #[error("Request failed: {0}")]
    Transport(reqwest::Error),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Classify a non-success HTTP reply.
    pub fn from_status(status: u16, retry_after: Option<Duration>, body: String) -> Self {
        if is_content_rejection(&body) {
            return ProviderError::ContentBlocked(truncate_body(&body));
        }
        if status == 429 {
            let mut info = parse_rate_limit_info(&body).unwrap_or_else(|| RateLimitInfo {
                retry_after: None,
                message: "Too many requests".to_string(),
            });
            info.retry_after = retry_after.or(info.retry_after);
            return ProviderError::RateLimited(info);
        }
        if let Some(info) = parse_rate_limit_info(&body) {
            return ProviderError::RateLimited(info);
        }
        ProviderError::Http { status, body }
    }

    /// Server overload, gateway trouble, timeouts and rate limits.
    ///
    /// These are the failures every provider treats as temporary.
    pub fn is_unavailable(&self) -> bool {
        match self {
            ProviderError::RateLimited(_) => true,
            ProviderError::Http { status, .. } => *status == 408 || *status >= 500,
            ProviderError::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Server-suggested delay, when the reply carried one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited(info) => info.retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        // Error text ends up in logs and summaries; URLs may carry secrets
        ProviderError::Transport(err.without_url())
    }
}

/// Rate limit information extracted from a provider reply.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    /// When the rate limit resets (if the provider said so)
    pub retry_after: Option<Duration>,
    /// Human-readable message
    pub message: String,
}

impl fmt::Display for RateLimitInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(retry_after) = self.retry_after {
            write!(f, "{} (retry after {:?})", self.message, retry_after)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

/// Parse rate limit info from an error body.
///
/// Providers signal rate limiting differently. This looks for the common
/// markers and extracts a retry delay when one is mentioned.
pub fn parse_rate_limit_info(body: &str) -> Option<RateLimitInfo> {
    let lower = body.to_lowercase();

    let is_rate_limited = lower.contains("rate limit")
        || lower.contains("rate_limit")
        || lower.contains("resource_exhausted")
        || lower.contains("too many requests")
        || lower.contains("quota exceeded");

    if !is_rate_limited {
        return None;
    }

    let retry_after = extract_retry_seconds(&lower).map(Duration::from_secs);

    Some(RateLimitInfo {
        retry_after,
        message: body
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("Rate limited")
            .to_string(),
    })
}

/// Whether an error body says the provider refused the content itself.
pub fn is_content_rejection(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains("content exists risk")
        || lower.contains("content_filter")
        || lower.contains("high risk")
        || lower.contains("blocked prompt")
}

/// Extract a retry delay from "retry after 45", "retryDelay: 30s" and friends.
fn extract_retry_seconds(text: &str) -> Option<u64> {
    let extract_after = |keyword: &str| -> Option<u64> {
        text.find(keyword)
            .and_then(|pos| extract_first_number(&text[pos + keyword.len()..]))
    };

    extract_after("retry after ")
        .or_else(|| extract_after("retry_after"))
        .or_else(|| extract_after("retry in "))
        .or_else(|| extract_after("retrydelay"))
}

/// First run of digits, skipping leading whitespace, quotes and separators.
fn extract_first_number(s: &str) -> Option<u64> {
    let digits: String = s
        .trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == '"' || c == '=')
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// First line of a body, capped at 200 characters.
fn truncate_body(body: &str) -> String {
    let first_line = body.lines().next().unwrap_or("").trim();
    if first_line.chars().count() <= 200 {
        first_line.to_string()
    } else {
        let truncated: String = first_line.chars().take(200).collect();
        format!("{}...", truncated)
    }
}

/// Read a `Retry-After` header given in seconds.
pub(crate) fn retry_after_header(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
