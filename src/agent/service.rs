//! Per-session facade over the answer engine.
//!
//! One [`AgenticAnswerService`] owns the cache, the rate limiter, the
//! retriever, the answer agent and the checkbox analyzer for a single
//! user. It is `Sync`; callers may issue questions concurrently and all
//! LLM traffic shares one admission window.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::answer_agent::{AgentRun, AnswerAgent, elapsed_ms};
use super::cache::AnswerCache;
use super::checkbox::{CheckboxAgent, CheckboxAnalyzer, CheckboxDecision, CheckboxOption};
use super::client::create_provider;
use super::config::AgentConfig;
use super::prompt::PromptSet;
use super::provider::{LlmProvider, RateLimitedProvider};
use super::rate_limiter::RateLimiter;
use super::result::{AnswerResult, LogRecord, ReasoningLogEntry, ServiceStats};
use super::retriever::DataRetriever;
use crate::core::QuestionType;
use crate::error::AgentError;
use crate::store::UserStore;

/// Answer engine for one user session.
pub struct AgenticAnswerService {
    config: AgentConfig,
    cache: AnswerCache,
    limiter: Arc<RateLimiter>,
    retriever: Arc<DataRetriever>,
    agent: AnswerAgent,
    checkbox: CheckboxAnalyzer,
    log: Mutex<Vec<ReasoningLogEntry>>,
}

impl std::fmt::Debug for AgenticAnswerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgenticAnswerService")
            .field("user_id", &self.retriever.user_id())
            .field("llm", &self.config.has_llm())
            .field("cache", &self.cache)
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

impl AgenticAnswerService {
    /// Creates a session using the provider named in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnsupportedProvider`] for an unknown provider.
    pub fn new(
        config: AgentConfig,
        store: Arc<dyn UserStore>,
        user_id: impl Into<String>,
    ) -> Result<Self, AgentError> {
        let provider = create_provider(&config)?;
        Ok(Self::with_provider(config, provider, store, user_id))
    }

    /// Creates a session around an explicit provider (or none).
    ///
    /// The provider is wrapped so that every call passes the session's
    /// rate limiter and the per-call timeout.
    #[must_use]
    pub fn with_provider(
        config: AgentConfig,
        provider: Option<Arc<dyn LlmProvider>>,
        store: Arc<dyn UserStore>,
        user_id: impl Into<String>,
    ) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.max_requests, config.rate_window));
        let provider = provider.map(|inner| {
            Arc::new(RateLimitedProvider::new(
                inner,
                Arc::clone(&limiter),
                config.llm_timeout,
            )) as Arc<dyn LlmProvider>
        });
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        let retriever = Arc::new(DataRetriever::new(store, user_id));

        let agent = AnswerAgent::new(&config, &prompts, provider.clone(), Arc::clone(&retriever));
        let checkbox = CheckboxAnalyzer::new(
            CheckboxAgent::new(&config, prompts.checkbox.clone()),
            provider,
        );

        Self {
            cache: AnswerCache::new(config.cache_ttl),
            limiter,
            retriever,
            agent,
            checkbox,
            log: Mutex::new(Vec::new()),
            config,
        }
    }

    /// Answers a free-text question, bounded by the configured answer timeout.
    pub async fn get_answer(&self, question: &str, question_type: QuestionType) -> AnswerResult {
        self.get_answer_with_cancel(question, question_type, &CancellationToken::new())
            .await
    }

    /// Like [`get_answer`](Self::get_answer), abandoning the work when
    /// `cancel` fires.
    ///
    /// A cancelled request returns an error result and writes neither the
    /// cache nor the reasoning log.
    pub async fn get_answer_with_cancel(
        &self,
        question: &str,
        question_type: QuestionType,
        cancel: &CancellationToken,
    ) -> AnswerResult {
        let start = Instant::now();
        let question = question.trim();
        if question.is_empty() {
            return AnswerResult::from_error(&AgentError::EmptyQuestion, 0);
        }

        if let Some(hit) = self.cache.get(question) {
            debug!(question, "cache hit");
            return AnswerResult::from_cache(hit, elapsed_ms(start));
        }

        let work = tokio::time::timeout(
            self.config.answer_timeout,
            self.agent.process_question(question, question_type),
        );
        let run = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(question, "answer cancelled");
                return AnswerResult::from_error(&AgentError::Cancelled, elapsed_ms(start));
            }
            outcome = work => outcome.unwrap_or_else(|_| {
                let error = AgentError::Timeout { after: self.config.answer_timeout };
                info!(question, %error, "answer timed out");
                AgentRun::failed(&error, elapsed_ms(start))
            }),
        };

        if !run.result.is_error() && !run.result.answer.is_empty() {
            self.cache
                .set(question, &run.result.answer, run.result.confidence, None);
        }

        let AgentRun {
            result,
            trace,
            observations,
        } = run;
        self.push_log(LogRecord::Answer {
            question: question.to_string(),
            question_type,
            result: result.clone(),
            trace,
            observations,
        });
        result
    }

    /// Picks one option for a checkbox or radio question. Never fails.
    pub async fn analyze_checkbox_options(
        &self,
        options: &[CheckboxOption],
        question: &str,
    ) -> CheckboxDecision {
        let context = self.retriever.get_context().await;
        let decision = self
            .checkbox
            .select_best_option(options, question, &context)
            .await;
        self.push_log(LogRecord::Checkbox {
            question: question.to_string(),
            options: options.iter().map(|o| o.label.clone()).collect(),
            decision: decision.clone(),
        });
        decision
    }

    /// Loads the user context ahead of the first question.
    pub async fn preload_data(&self) {
        self.retriever.get_context().await;
    }

    /// Snapshot of cache, limiter and log state.
    #[must_use]
    pub fn get_stats(&self) -> ServiceStats {
        ServiceStats {
            cache: self.cache.stats(),
            rate_limiter: self.limiter.stats(),
            reasoning_log_size: self.lock_log().len(),
            context_loaded: self.retriever.is_loaded(),
        }
    }

    /// Copy of the reasoning log, oldest first.
    #[must_use]
    pub fn reasoning_log(&self) -> Vec<ReasoningLogEntry> {
        self.lock_log().clone()
    }

    /// Empties the answer cache.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Forgets the loaded user context; the next question reloads it.
    pub fn refresh_user_data(&self) {
        self.retriever.clear_cache();
    }

    /// Empties the reasoning log.
    pub fn clear_reasoning_log(&self) {
        self.lock_log().clear();
    }

    /// User this session serves.
    #[must_use]
    pub fn user_id(&self) -> &str {
        self.retriever.user_id()
    }

    /// Ends the session, returning the final statistics.
    #[must_use]
    pub fn close(self) -> ServiceStats {
        let stats = self.get_stats();
        self.cache.clear();
        self.clear_reasoning_log();
        self.retriever.clear_cache();
        info!(
            user_id = self.retriever.user_id(),
            answers = stats.reasoning_log_size,
            "session closed"
        );
        stats
    }

    fn push_log(&self, record: LogRecord) {
        self.lock_log().push(ReasoningLogEntry::now(record));
    }

    fn lock_log(&self) -> std::sync::MutexGuard<'_, Vec<ReasoningLogEntry>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
