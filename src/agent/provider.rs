//! Pluggable LLM provider trait and the rate-limiting decorator.
//!
//! Implementations translate provider-agnostic [`ChatRequest`]/[`ChatResponse`]
//! into provider-specific SDK calls. This keeps the answer stages
//! decoupled from any particular LLM vendor.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::message::{ChatRequest, ChatResponse};
use super::rate_limiter::RateLimiter;
use crate::error::AgentError;

/// Trait for LLM provider backends.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., `"openai"`).
    fn name(&self) -> &'static str;

    /// Executes a chat completion request.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] on API failures, timeouts, or parse errors.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError>;
}

/// Wraps a provider so every call is admitted by a shared [`RateLimiter`]
/// and bounded by a timeout.
///
/// The timeout covers only the provider call, not the admission wait.
pub struct RateLimitedProvider {
    inner: Arc<dyn LlmProvider>,
    limiter: Arc<RateLimiter>,
    timeout: Duration,
}

impl RateLimitedProvider {
    /// Creates the decorator.
    #[must_use]
    pub fn new(inner: Arc<dyn LlmProvider>, limiter: Arc<RateLimiter>, timeout: Duration) -> Self {
        Self {
            inner,
            limiter,
            timeout,
        }
    }
}

impl std::fmt::Debug for RateLimitedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedProvider")
            .field("inner", &self.inner.name())
            .field("limiter", &self.limiter)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl LlmProvider for RateLimitedProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        self.limiter.acquire().await;
        debug!(
            provider = self.inner.name(),
            max_tokens = request.max_tokens,
            "llm call admitted"
        );
        tokio::time::timeout(self.timeout, self.inner.chat(request))
            .await
            .map_err(|_| AgentError::Timeout {
                after: self.timeout,
            })?
    }
}
