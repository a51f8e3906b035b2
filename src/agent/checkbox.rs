//! Checkbox and radio option selection.
//!
//! The LLM path asks the model for a 1-based option number and a
//! LOW/MEDIUM/HIGH label. Without a provider, or when the call fails, a
//! deterministic heuristic picks an option: an option containing the
//! applicant's location wins, otherwise the first one. Some option is
//! always selected.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::AgentConfig;
use super::prompt::build_checkbox_prompt;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::core::{Confidence, UserContext};

/// Sampling temperature for option selection.
pub const CHECKBOX_TEMPERATURE: f32 = 0.1;

#[allow(clippy::expect_used)]
static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\**(?P<key>selected|confidence|reasoning)\**\s*:\s*\**\s*(?P<rest>.*)$")
        .expect("valid checkbox field regex")
});

#[allow(clippy::expect_used)]
static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid number regex"));

/// One selectable option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxOption {
    /// Visible label.
    pub label: String,
}

impl CheckboxOption {
    /// Creates an option from its label.
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
        }
    }
}

/// The chosen option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxDecision {
    /// Zero-based index into the offered options.
    pub selected_index: usize,
    /// Why this option was chosen.
    pub reasoning: String,
    /// How sure the selection is.
    pub confidence: Confidence,
}

/// LLM call site for option selection.
pub struct CheckboxAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl CheckboxAgent {
    /// Creates the agent with the configured model and budget.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.checkbox_max_tokens,
            system_prompt,
        }
    }
}

#[async_trait]
impl Agent for CheckboxAgent {
    fn name(&self) -> &'static str {
        "checkbox"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        CHECKBOX_TEMPERATURE
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// Picks the best option for a question.
pub struct CheckboxAnalyzer {
    agent: CheckboxAgent,
    provider: Option<Arc<dyn LlmProvider>>,
}

impl CheckboxAnalyzer {
    /// Creates an analyzer. Without a provider only the heuristic is used.
    #[must_use]
    pub fn new(agent: CheckboxAgent, provider: Option<Arc<dyn LlmProvider>>) -> Self {
        Self { agent, provider }
    }

    /// Selects one option. Never fails.
    pub async fn select_best_option(
        &self,
        options: &[CheckboxOption],
        question: &str,
        context: &UserContext,
    ) -> CheckboxDecision {
        if options.is_empty() {
            return CheckboxDecision {
                selected_index: 0,
                reasoning: "no options provided".to_string(),
                confidence: Confidence::Low,
            };
        }

        let Some(provider) = &self.provider else {
            return fallback_selection(options, context);
        };

        let prompt = build_checkbox_prompt(question, options, &context.summary());
        match self.agent.execute(provider.as_ref(), &prompt).await {
            Ok(response) => {
                let decision = parse_decision(&response.content, options.len());
                debug!(
                    question,
                    selected = decision.selected_index,
                    confidence = %decision.confidence,
                    "checkbox option selected"
                );
                decision
            }
            Err(e) => {
                warn!(question, error = %e, "checkbox selection failed, using fallback");
                fallback_selection(options, context)
            }
        }
    }
}

impl std::fmt::Debug for CheckboxAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckboxAnalyzer")
            .field("llm", &self.provider.is_some())
            .finish_non_exhaustive()
    }
}

/// Deterministic choice: the option mentioning the applicant's location,
/// else the first option.
#[must_use]
pub fn fallback_selection(options: &[CheckboxOption], context: &UserContext) -> CheckboxDecision {
    let location = context
        .profile
        .location
        .as_deref()
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty());

    if let Some(location) = location
        && let Some(index) = options
            .iter()
            .position(|o| o.label.to_lowercase().contains(&location))
    {
        return CheckboxDecision {
            selected_index: index,
            reasoning: format!("option matches location '{location}'"),
            confidence: Confidence::Medium,
        };
    }

    CheckboxDecision {
        selected_index: 0,
        reasoning: "no profile match, defaulting to first option".to_string(),
        confidence: Confidence::Low,
    }
}

/// Parses the SELECTED / CONFIDENCE / REASONING reply.
///
/// Out-of-range or missing numbers select the first option; a missing
/// confidence label means LOW.
#[must_use]
pub fn parse_decision(text: &str, option_count: usize) -> CheckboxDecision {
    let mut selected = None;
    let mut confidence = Confidence::Low;
    let mut reasoning = String::new();

    for line in text.lines() {
        let Some(caps) = FIELD.captures(line) else {
            continue;
        };
        let rest = caps["rest"].trim();
        match caps["key"].to_lowercase().as_str() {
            "selected" => {
                selected = FIRST_NUMBER
                    .find(rest)
                    .and_then(|m| m.as_str().parse::<usize>().ok());
            }
            "confidence" => confidence = Confidence::parse(rest),
            _ => reasoning = rest.to_string(),
        }
    }

    let selected_index = selected
        .filter(|&n| (1..=option_count).contains(&n))
        .map_or(0, |n| n - 1);

    CheckboxDecision {
        selected_index,
        reasoning,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use test_case::test_case;

    use super::*;
    use crate::agent::message::{ChatRequest, ChatResponse};
    use crate::core::Profile;
    use crate::error::AgentError;

    fn context(location: Option<&str>) -> UserContext {
        UserContext {
            profile: Profile {
                location: location.map(str::to_string),
                ..Profile::default()
            },
            ..UserContext::default()
        }
    }

    fn cities() -> Vec<CheckboxOption> {
        ["Bangalore", "Mumbai", "Delhi"]
            .into_iter()
            .map(CheckboxOption::new)
            .collect()
    }

    struct Scripted(Result<&'static str, ()>);

    #[async_trait]
    impl LlmProvider for Scripted {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            self.0
                .map(ChatResponse::text)
                .map_err(|()| AgentError::ApiRequest {
                    message: "down".to_string(),
                    status: Some(503),
                })
        }
    }

    fn analyzer(provider: Option<Arc<dyn LlmProvider>>) -> CheckboxAnalyzer {
        let config = AgentConfig::builder()
            .build()
            .unwrap_or_else(|_| unreachable!());
        CheckboxAnalyzer::new(CheckboxAgent::new(&config, "pick".to_string()), provider)
    }

    #[tokio::test]
    async fn test_fallback_matches_location() {
        let decision = analyzer(None)
            .select_best_option(&cities(), "Preferred city?", &context(Some("Bangalore")))
            .await;
        assert_eq!(decision.selected_index, 0);
        assert_eq!(decision.confidence, Confidence::Medium);
    }

    #[test]
    fn test_fallback_is_case_insensitive() {
        let decision = fallback_selection(&cities(), &context(Some("delhi")));
        assert_eq!(decision.selected_index, 2);
        assert_eq!(decision.confidence, Confidence::Medium);
    }

    #[test]
    fn test_fallback_without_match() {
        let decision = fallback_selection(&cities(), &context(Some("Pune")));
        assert_eq!(decision.selected_index, 0);
        assert_eq!(decision.confidence, Confidence::Low);

        let decision = fallback_selection(&cities(), &context(None));
        assert_eq!(decision.confidence, Confidence::Low);
    }

    #[tokio::test]
    async fn test_empty_options() {
        let decision = analyzer(None)
            .select_best_option(&[], "Anything?", &context(Some("Bangalore")))
            .await;
        assert_eq!(decision.selected_index, 0);
        assert_eq!(decision.reasoning, "no options provided");
    }

    #[tokio::test]
    async fn test_llm_selection() {
        let provider: Arc<dyn LlmProvider> = Arc::new(Scripted(Ok(
            "SELECTED: 2\nCONFIDENCE: HIGH\nREASONING: Applicant lives in Mumbai.",
        )));
        let decision = analyzer(Some(provider))
            .select_best_option(&cities(), "City?", &context(Some("Mumbai")))
            .await;
        assert_eq!(decision.selected_index, 1);
        assert_eq!(decision.confidence, Confidence::High);
        assert_eq!(decision.reasoning, "Applicant lives in Mumbai.");
    }

    #[tokio::test]
    async fn test_llm_failure_uses_fallback() {
        let provider: Arc<dyn LlmProvider> = Arc::new(Scripted(Err(())));
        let decision = analyzer(Some(provider))
            .select_best_option(&cities(), "City?", &context(Some("Delhi")))
            .await;
        assert_eq!(decision.selected_index, 2);
        assert_eq!(decision.confidence, Confidence::Medium);
    }

    #[test_case("SELECTED: 9\nCONFIDENCE: HIGH", 0 ; "out of range")]
    #[test_case("SELECTED: 0", 0 ; "zero")]
    #[test_case("SELECTED: option 3", 2 ; "number inside text")]
    #[test_case("**Selected:** 2", 1 ; "markdown bold")]
    #[test_case("I like the second one", 0 ; "missing field")]
    fn test_parse_decision_index(text: &str, expected: usize) {
        assert_eq!(parse_decision(text, 3).selected_index, expected);
    }

    #[test]
    fn test_parse_decision_missing_confidence_is_low() {
        let decision = parse_decision("SELECTED: 1", 3);
        assert_eq!(decision.confidence, Confidence::Low);
        assert!(decision.reasoning.is_empty());
    }
}
