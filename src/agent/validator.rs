//! Answer validation with bounded self-correction.
//!
//! Four checks run in order: format, length, completeness, then an
//! LLM-judged relevance check that is only attempted when the first three
//! pass and a provider is configured. An answer with issues is handed to
//! the corrector at most `max_corrections` times; each round must change
//! the answer or the loop stops. The loop always terminates.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use super::config::AgentConfig;
use super::generator::clean_answer;
use super::prompt::{build_correction_prompt, build_relevance_prompt};
use super::provider::LlmProvider;
use super::reasoning::contains_word;
use super::result::{CONFIDENCE_FLAGGED, CONFIDENCE_VALID, ValidationOutcome};
use super::traits::Agent;
use crate::core::UserContext;

/// Maximum words in a form-field answer.
pub const MAX_WORDS: usize = 15;
/// Maximum characters in a form-field answer.
pub const MAX_CHARS: usize = 150;

/// Sampling temperature for corrections.
pub const CORRECTION_TEMPERATURE: f32 = 0.2;

/// Whole answers that say nothing.
const VAGUE_ANSWERS: &[&str] = &[
    "not sure",
    "maybe",
    "i don't know",
    "i dont know",
    "unclear",
    "not specified",
    "tbd",
    "to be confirmed",
];

const SALARY_TRIGGERS: &[&str] = &["ctc", "salary", "compensation"];
const BIRTH_TRIGGERS: &[&str] = &["date of birth", "dob", "birth date", "birthdate"];
const YES_NO_TRIGGERS: &[&str] = &["are you", "do you", "willing"];
const OPEN_QUESTION_STARTS: &[&str] = &["what", "which", "how", "when", "where", "why", "who"];

#[allow(clippy::expect_used)]
static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,2}/\d{1,2}/(?:\d{4}|\d{1,2})\b").expect("valid date regex")
});

/// Checks the answer shape against what the question asks for.
///
/// Returns the issue, if any.
#[must_use]
pub fn validate_format(answer: &str, question: &str) -> Option<String> {
    let q = question.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| q.contains(w));

    if mentions(SALARY_TRIGGERS) && !answer.chars().any(|c| c.is_ascii_digit()) {
        return Some("CTC/salary answer must contain a number".to_string());
    }
    let asks_birth_date = BIRTH_TRIGGERS.iter().any(|w| contains_word(&q, w));
    if asks_birth_date && !DATE.is_match(answer) {
        return Some("date of birth must look like DD/MM/YYYY".to_string());
    }
    if is_yes_no_question(&q) && normalize_yes_no(answer).is_none() {
        return Some("yes/no question must be answered with yes, no or maybe".to_string());
    }
    None
}

/// True for closed questions such as "Are you willing to relocate?".
///
/// Questions opening with a wh-word or "how" are open even if they contain
/// "do you" ("How many years do you have...").
fn is_yes_no_question(lowercase_question: &str) -> bool {
    let first = lowercase_question
        .split(|c: char| !c.is_alphanumeric())
        .find(|w| !w.is_empty())
        .unwrap_or_default();
    YES_NO_TRIGGERS.iter().any(|t| lowercase_question.contains(t))
        && !OPEN_QUESTION_STARTS.contains(&first)
}

/// Normalizes a yes/no answer, ignoring case and trailing punctuation.
#[must_use]
pub fn normalize_yes_no(answer: &str) -> Option<&'static str> {
    let normalized = answer
        .trim()
        .trim_end_matches(['.', '!'])
        .trim()
        .to_lowercase();
    match normalized.as_str() {
        "yes" => Some("yes"),
        "no" => Some("no"),
        "maybe" => Some("maybe"),
        _ => None,
    }
}

/// Rejects answers too long for a form field.
#[must_use]
pub fn validate_length(answer: &str) -> Option<String> {
    let words = answer.split_whitespace().count();
    let chars = answer.chars().count();
    if words > MAX_WORDS {
        Some(format!("answer has {words} words, limit is {MAX_WORDS}"))
    } else if chars > MAX_CHARS {
        Some(format!("answer has {chars} characters, limit is {MAX_CHARS}"))
    } else {
        None
    }
}

/// Rejects empty and non-committal answers.
#[must_use]
pub fn validate_completeness(answer: &str) -> Option<String> {
    let normalized = answer
        .trim()
        .trim_end_matches(['.', '!'])
        .trim()
        .to_lowercase();
    if normalized.is_empty() {
        Some("answer is empty".to_string())
    } else if VAGUE_ANSWERS.contains(&normalized.as_str()) {
        Some(format!("answer '{}' is too vague", answer.trim()))
    } else {
        None
    }
}

/// Format, length and completeness issues, in that order.
#[must_use]
pub fn static_issues(answer: &str, question: &str) -> Vec<String> {
    [
        validate_format(answer, question),
        validate_length(answer),
        validate_completeness(answer),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// LLM call site that rewrites an answer to fix listed issues.
pub struct Corrector {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl Corrector {
    /// Creates the corrector with the configured model and budget.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.correction_max_tokens,
            system_prompt,
        }
    }
}

#[async_trait]
impl Agent for Corrector {
    fn name(&self) -> &'static str {
        "corrector"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        CORRECTION_TEMPERATURE
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// LLM call site answering YES/NO to "does this answer the question".
pub struct RelevanceJudge {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl RelevanceJudge {
    /// Creates the judge with the configured model and budget.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.relevance_max_tokens,
            system_prompt,
        }
    }
}

#[async_trait]
impl Agent for RelevanceJudge {
    fn name(&self) -> &'static str {
        "relevance"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// Multi-stage answer checker.
pub struct AnswerValidator {
    corrector: Corrector,
    judge: RelevanceJudge,
    provider: Option<Arc<dyn LlmProvider>>,
    max_corrections: u32,
}

impl std::fmt::Debug for AnswerValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerValidator")
            .field("llm", &self.provider.is_some())
            .field("max_corrections", &self.max_corrections)
            .finish_non_exhaustive()
    }
}

impl AnswerValidator {
    /// Creates a validator. Without a provider, relevance and correction
    /// are skipped.
    #[must_use]
    pub fn new(
        corrector: Corrector,
        judge: RelevanceJudge,
        provider: Option<Arc<dyn LlmProvider>>,
        max_corrections: u32,
    ) -> Self {
        Self {
            corrector,
            judge,
            provider,
            max_corrections,
        }
    }

    /// Validates and, if needed, corrects `answer`. Never fails.
    pub async fn validate(
        &self,
        answer: &str,
        question: &str,
        context: &UserContext,
    ) -> ValidationOutcome {
        let mut answer = answer.trim().to_string();
        let mut iteration = 0;

        loop {
            let issues = self.issues(&answer, question).await;
            if issues.is_empty() {
                debug!(iteration, "answer valid");
                return ValidationOutcome {
                    valid: true,
                    answer,
                    confidence: CONFIDENCE_VALID,
                    issues,
                    corrections: iteration,
                };
            }

            debug!(iteration, ?issues, "answer has issues");
            let corrected = if iteration < self.max_corrections {
                self.correct(&answer, question, &issues, context).await
            } else {
                None
            };

            match corrected {
                Some(next) if next != answer => {
                    answer = next;
                    iteration += 1;
                }
                _ => {
                    return ValidationOutcome {
                        valid: false,
                        answer,
                        confidence: CONFIDENCE_FLAGGED,
                        issues,
                        corrections: iteration,
                    };
                }
            }
        }
    }

    async fn issues(&self, answer: &str, question: &str) -> Vec<String> {
        let mut issues = static_issues(answer, question);
        if issues.is_empty()
            && let Some(issue) = self.check_relevance(answer, question).await
        {
            issues.push(issue);
        }
        issues
    }

    /// Asks the judge; a failed call counts as relevant.
    async fn check_relevance(&self, answer: &str, question: &str) -> Option<String> {
        let provider = self.provider.as_ref()?;
        let prompt = build_relevance_prompt(question, answer);
        match self.judge.execute(provider.as_ref(), &prompt).await {
            Ok(response) => response
                .content
                .trim()
                .to_lowercase()
                .starts_with("no")
                .then(|| "answer does not address the question".to_string()),
            Err(e) => {
                warn!(error = %e, "relevance check failed, skipping");
                None
            }
        }
    }

    async fn correct(
        &self,
        answer: &str,
        question: &str,
        issues: &[String],
        context: &UserContext,
    ) -> Option<String> {
        let provider = self.provider.as_ref()?;
        let prompt = build_correction_prompt(question, answer, issues, &context.summary());
        match self.corrector.execute(provider.as_ref(), &prompt).await {
            Ok(response) => Some(clean_answer(&response.content)),
            Err(e) => {
                warn!(error = %e, "self-correction failed");
                None
            }
        }
    }
}
