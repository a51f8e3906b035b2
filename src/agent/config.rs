//! Answer-engine configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Default model for every call site.
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default admissions per rate window.
const DEFAULT_RATE_LIMIT: usize = 40;
/// Default rate window in milliseconds.
const DEFAULT_RATE_WINDOW_MS: u64 = 60_000;
/// Default answer-cache TTL in seconds.
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
/// Reasoning stage token budget.
const DEFAULT_REASONING_MAX_TOKENS: u32 = 300;
/// Answer generation token budget.
const DEFAULT_ANSWER_MAX_TOKENS: u32 = 50;
/// Self-correction token budget.
const DEFAULT_CORRECTION_MAX_TOKENS: u32 = 100;
/// Relevance judgement token budget.
const DEFAULT_RELEVANCE_MAX_TOKENS: u32 = 10;
/// Checkbox selection token budget.
const DEFAULT_CHECKBOX_MAX_TOKENS: u32 = 200;
/// Per-call LLM timeout in seconds.
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;
/// Whole-answer timeout in seconds.
const DEFAULT_ANSWER_TIMEOUT_SECS: u64 = 90;
/// Self-correction rounds.
const DEFAULT_MAX_CORRECTIONS: u32 = 2;

/// Behaviour when no API key is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DegradedMode {
    /// Keyword planner, first tool result as the answer, rule-only validation.
    #[default]
    Heuristic,
    /// Free-text answers fail with [`AgentError::LlmUnavailable`].
    Off,
}

impl DegradedMode {
    /// Parses `heuristic` or `off` (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "heuristic" | "on" => Some(Self::Heuristic),
            "off" | "none" | "disabled" => Some(Self::Off),
            _ => None,
        }
    }
}

/// Configuration for one answer session.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider. `None` puts the engine into degraded mode.
    pub api_key: Option<String>,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model used by every call site.
    pub model: String,
    /// Maximum LLM calls admitted per rate window.
    pub max_requests: usize,
    /// Length of the trailing rate window.
    pub rate_window: Duration,
    /// Lifetime of a cached answer.
    pub cache_ttl: Duration,
    /// Maximum tokens for the reasoning stage.
    pub reasoning_max_tokens: u32,
    /// Maximum tokens for answer generation.
    pub answer_max_tokens: u32,
    /// Maximum tokens for self-correction.
    pub correction_max_tokens: u32,
    /// Maximum tokens for the relevance judgement.
    pub relevance_max_tokens: u32,
    /// Maximum tokens for checkbox selection.
    pub checkbox_max_tokens: u32,
    /// Timeout applied to each outbound LLM call.
    pub llm_timeout: Duration,
    /// Timeout applied to a whole `get_answer` call.
    pub answer_timeout: Duration,
    /// Self-correction rounds before an answer is returned flagged.
    pub max_corrections: u32,
    /// Directory containing prompt template files.
    ///
    /// Missing files fall back to the compiled-in defaults.
    pub prompt_dir: Option<PathBuf>,
    /// What to do without an API key.
    pub degraded_mode: DegradedMode,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if a limit resolves to zero.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }

    /// Returns true if an LLM can be called.
    #[must_use]
    pub fn has_llm(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    max_requests: Option<usize>,
    rate_window: Option<Duration>,
    cache_ttl: Option<Duration>,
    reasoning_max_tokens: Option<u32>,
    answer_max_tokens: Option<u32>,
    correction_max_tokens: Option<u32>,
    relevance_max_tokens: Option<u32>,
    checkbox_max_tokens: Option<u32>,
    llm_timeout: Option<Duration>,
    answer_timeout: Option<Duration>,
    max_corrections: Option<u32>,
    prompt_dir: Option<PathBuf>,
    degraded_mode: Option<DegradedMode>,
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("AUTOAPPLY_PROVIDER").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY")
                .or_else(|_| std::env::var("AUTOAPPLY_API_KEY"))
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OPENAI_BASE_URL").ok();
        }
        if self.model.is_none() {
            self.model = std::env::var("AUTOAPPLY_MODEL").ok();
        }
        if self.max_requests.is_none() {
            self.max_requests = env_parse("AUTOAPPLY_RATE_LIMIT");
        }
        if self.rate_window.is_none() {
            self.rate_window = env_parse("AUTOAPPLY_RATE_WINDOW_MS").map(Duration::from_millis);
        }
        if self.cache_ttl.is_none() {
            self.cache_ttl = env_parse("AUTOAPPLY_CACHE_TTL_SECS").map(Duration::from_secs);
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("AUTOAPPLY_PROMPT_DIR").ok().map(PathBuf::from);
        }
        if self.degraded_mode.is_none() {
            self.degraded_mode = std::env::var("AUTOAPPLY_DEGRADED_MODE")
                .ok()
                .and_then(|v| DegradedMode::parse(&v));
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the admissions per rate window.
    #[must_use]
    pub const fn max_requests(mut self, n: usize) -> Self {
        self.max_requests = Some(n);
        self
    }

    /// Sets the rate window length.
    #[must_use]
    pub const fn rate_window(mut self, window: Duration) -> Self {
        self.rate_window = Some(window);
        self
    }

    /// Sets the answer-cache TTL.
    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Sets the reasoning token budget.
    #[must_use]
    pub const fn reasoning_max_tokens(mut self, n: u32) -> Self {
        self.reasoning_max_tokens = Some(n);
        self
    }

    /// Sets the answer generation token budget.
    #[must_use]
    pub const fn answer_max_tokens(mut self, n: u32) -> Self {
        self.answer_max_tokens = Some(n);
        self
    }

    /// Sets the self-correction token budget.
    #[must_use]
    pub const fn correction_max_tokens(mut self, n: u32) -> Self {
        self.correction_max_tokens = Some(n);
        self
    }

    /// Sets the relevance judgement token budget.
    #[must_use]
    pub const fn relevance_max_tokens(mut self, n: u32) -> Self {
        self.relevance_max_tokens = Some(n);
        self
    }

    /// Sets the checkbox selection token budget.
    #[must_use]
    pub const fn checkbox_max_tokens(mut self, n: u32) -> Self {
        self.checkbox_max_tokens = Some(n);
        self
    }

    /// Sets the per-call LLM timeout.
    #[must_use]
    pub const fn llm_timeout(mut self, duration: Duration) -> Self {
        self.llm_timeout = Some(duration);
        self
    }

    /// Sets the whole-answer timeout.
    #[must_use]
    pub const fn answer_timeout(mut self, duration: Duration) -> Self {
        self.answer_timeout = Some(duration);
        self
    }

    /// Sets the number of self-correction rounds.
    #[must_use]
    pub const fn max_corrections(mut self, n: u32) -> Self {
        self.max_corrections = Some(n);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Sets the degraded-mode policy.
    #[must_use]
    pub const fn degraded_mode(mut self, mode: DegradedMode) -> Self {
        self.degraded_mode = Some(mode);
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] if the rate limit, rate window, cache
    /// TTL or a timeout is zero.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let max_requests = self.max_requests.unwrap_or(DEFAULT_RATE_LIMIT);
        if max_requests == 0 {
            return Err(config_error("rate limit must be at least 1"));
        }
        let rate_window = self
            .rate_window
            .unwrap_or(Duration::from_millis(DEFAULT_RATE_WINDOW_MS));
        if rate_window.is_zero() {
            return Err(config_error("rate window must be non-zero"));
        }
        let cache_ttl = self
            .cache_ttl
            .unwrap_or(Duration::from_secs(DEFAULT_CACHE_TTL_SECS));
        if cache_ttl.is_zero() {
            return Err(config_error("cache TTL must be non-zero"));
        }
        let llm_timeout = self
            .llm_timeout
            .unwrap_or(Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS));
        let answer_timeout = self
            .answer_timeout
            .unwrap_or(Duration::from_secs(DEFAULT_ANSWER_TIMEOUT_SECS));
        if llm_timeout.is_zero() || answer_timeout.is_zero() {
            return Err(config_error("timeouts must be non-zero"));
        }

        Ok(AgentConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key: self.api_key,
            base_url: self.base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_requests,
            rate_window,
            cache_ttl,
            reasoning_max_tokens: self
                .reasoning_max_tokens
                .unwrap_or(DEFAULT_REASONING_MAX_TOKENS),
            answer_max_tokens: self.answer_max_tokens.unwrap_or(DEFAULT_ANSWER_MAX_TOKENS),
            correction_max_tokens: self
                .correction_max_tokens
                .unwrap_or(DEFAULT_CORRECTION_MAX_TOKENS),
            relevance_max_tokens: self
                .relevance_max_tokens
                .unwrap_or(DEFAULT_RELEVANCE_MAX_TOKENS),
            checkbox_max_tokens: self
                .checkbox_max_tokens
                .unwrap_or(DEFAULT_CHECKBOX_MAX_TOKENS),
            llm_timeout,
            answer_timeout,
            max_corrections: self.max_corrections.unwrap_or(DEFAULT_MAX_CORRECTIONS),
            prompt_dir: self.prompt_dir,
            degraded_mode: self.degraded_mode.unwrap_or_default(),
        })
    }
}

fn config_error(message: &str) -> AgentError {
    AgentError::Config {
        message: message.to_string(),
    }
}
