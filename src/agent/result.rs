//! Result types returned by the answer engine and its observability surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::cache::{CacheStats, CachedAnswer};
use super::checkbox::CheckboxDecision;
use super::rate_limiter::RateLimiterStats;
use super::reasoning::ReasoningTrace;
use crate::core::{QuestionCategory, QuestionType};
use crate::error::AgentError;

/// Confidence of a validated answer.
pub const CONFIDENCE_VALID: u8 = 95;
/// Confidence of an answer that still has issues after correction.
pub const CONFIDENCE_FLAGGED: u8 = 50;

/// Outcome of one planned tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolObservation {
    /// Tool name.
    pub tool: String,
    /// Argument passed.
    pub argument: String,
    /// Result, `None` meaning no data.
    pub result: Option<Value>,
    /// Set when the call could not be made.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Verdict from the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    /// True if no issues remain.
    pub valid: bool,
    /// Final (possibly corrected) answer.
    pub answer: String,
    /// 95 when valid, 50 when flagged.
    pub confidence: u8,
    /// Issues with the final answer.
    pub issues: Vec<String>,
    /// Correction rounds used.
    pub corrections: u32,
}

/// Answer to one free-text question.
///
/// A confidence of 50 means usable but flagged; 0 means an error occurred
/// and `answer` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    /// Answer text.
    pub answer: String,
    /// Heuristic confidence, 0-100.
    pub confidence: u8,
    /// Whether validation passed.
    pub valid: bool,
    /// Reasoning thoughts, or `["error occurred"]`.
    pub reasoning: Vec<String>,
    /// Question category.
    pub category: QuestionCategory,
    /// Tools invoked, in order.
    pub tools_used: Vec<String>,
    /// Outstanding validation issues.
    pub issues: Vec<String>,
    /// End-to-end latency in milliseconds.
    pub latency_ms: u64,
    /// True if served from the answer cache.
    pub from_cache: bool,
    /// Error message when the request failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnswerResult {
    /// The well-formed result returned for any failure.
    #[must_use]
    pub fn from_error(error: &AgentError, latency_ms: u64) -> Self {
        Self {
            answer: String::new(),
            confidence: 0,
            valid: false,
            reasoning: vec!["error occurred".to_string()],
            category: QuestionCategory::Complex,
            tools_used: Vec::new(),
            issues: Vec::new(),
            latency_ms,
            from_cache: false,
            error: Some(error.to_string()),
        }
    }

    /// Result for a cache hit.
    ///
    /// Validity follows the stored confidence, so an answer that was
    /// flagged when first produced stays flagged.
    #[must_use]
    pub fn from_cache(hit: CachedAnswer, latency_ms: u64) -> Self {
        let valid = hit.confidence >= CONFIDENCE_VALID;
        let issues = if valid {
            Vec::new()
        } else {
            vec!["cached answer was flagged by validation".to_string()]
        };
        Self {
            answer: hit.answer,
            confidence: hit.confidence,
            valid,
            reasoning: vec!["served from cache".to_string()],
            category: QuestionCategory::Complex,
            tools_used: Vec::new(),
            issues,
            latency_ms,
            from_cache: true,
            error: None,
        }
    }

    /// True if the request failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// What a reasoning-log entry records.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogRecord {
    /// A free-text answer.
    Answer {
        /// Question text.
        question: String,
        /// Form control type.
        question_type: QuestionType,
        /// Returned result.
        result: AnswerResult,
        /// Reasoning trace, absent on early failure.
        trace: Option<ReasoningTrace>,
        /// Tool observations in call order.
        observations: Vec<ToolObservation>,
    },
    /// A checkbox/radio decision.
    Checkbox {
        /// Question text.
        question: String,
        /// Every option label offered.
        options: Vec<String>,
        /// Chosen option.
        decision: CheckboxDecision,
    },
}

/// One timestamped reasoning-log entry.
#[derive(Debug, Clone, Serialize)]
pub struct ReasoningLogEntry {
    /// When the entry was written.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    #[serde(flatten)]
    pub record: LogRecord,
}

impl ReasoningLogEntry {
    /// Stamps a record with the current time.
    #[must_use]
    pub fn now(record: LogRecord) -> Self {
        Self {
            timestamp: Utc::now(),
            record,
        }
    }
}

/// Session statistics.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    /// Answer cache snapshot.
    pub cache: CacheStats,
    /// LLM admission utilization.
    pub rate_limiter: RateLimiterStats,
    /// Entries in the reasoning log.
    pub reasoning_log_size: usize,
    /// Whether the user context has been loaded.
    pub context_loaded: bool,
}
