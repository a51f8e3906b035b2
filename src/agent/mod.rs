//! Agentic answer engine.
//!
//! Answers job-application form questions by reasoning about what data is
//! needed, fetching it through a fixed tool interface, drafting a terse
//! answer and validating it with bounded self-correction.
//!
//! # Architecture
//!
//! ```text
//! caller → AgenticAnswerService::get_answer
//!   ├── AnswerCache (hit → return)
//!   └── AnswerAgent::process_question
//!       ├── Reasoner        (LLM, via RateLimiter)  → ReasoningTrace
//!       ├── DataRetriever   (tools over UserContext) → ToolObservation*
//!       ├── AnswerGenerator (LLM, via RateLimiter)  → draft
//!       └── AnswerValidator (format, length, completeness, relevance,
//!                            ≤ 2 correction rounds)
//! ```
//!
//! Without an API key the engine runs in [`DegradedMode`]: keyword planning
//! and direct tool answers, or an explicit refusal.

pub mod answer_agent;
pub mod cache;
pub mod checkbox;
pub mod client;
pub mod config;
pub mod executor;
pub mod generator;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod rate_limiter;
pub mod reasoner;
pub mod reasoning;
pub mod result;
pub mod retriever;
pub mod service;
pub mod tool;
pub mod traits;
pub mod validator;

// Re-export key types
pub use answer_agent::{AgentRun, AnswerAgent};
pub use cache::{AnswerCache, CacheStats, CachedAnswer};
pub use checkbox::{CheckboxAnalyzer, CheckboxDecision, CheckboxOption};
pub use config::{AgentConfig, DegradedMode};
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use prompt::PromptSet;
pub use provider::{LlmProvider, RateLimitedProvider};
pub use rate_limiter::{RateLimiter, RateLimiterStats};
pub use reasoning::{PlannedAction, ReasoningTrace};
pub use result::{
    AnswerResult, LogRecord, ReasoningLogEntry, ServiceStats, ToolObservation, ValidationOutcome,
};
pub use retriever::DataRetriever;
pub use service::AgenticAnswerService;
pub use tool::{ToolCall, ToolDefinition, ToolSet};
pub use traits::Agent;
pub use validator::AnswerValidator;
