//! Answer generation from the reasoning thought and tool results.

use async_trait::async_trait;
use serde_json::Value;

use super::config::AgentConfig;
use super::prompt::build_answer_prompt;
use super::provider::LlmProvider;
use super::reasoning::ReasoningTrace;
use super::result::ToolObservation;
use super::traits::Agent;
use crate::core::AnswerFormat;
use crate::error::AgentError;

/// Sampling temperature for answers.
pub const ANSWER_TEMPERATURE: f32 = 0.2;

/// Agent that drafts the short form-field answer.
pub struct AnswerGenerator {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl AnswerGenerator {
    /// Creates the generator with the configured model and budget.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.answer_max_tokens,
            system_prompt,
        }
    }

    /// Drafts an answer grounded in `observations`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the LLM call fails.
    pub async fn generate(
        &self,
        provider: &dyn LlmProvider,
        question: &str,
        trace: &ReasoningTrace,
        observations: &[ToolObservation],
    ) -> Result<String, AgentError> {
        let prompt = build_answer_prompt(question, trace, observations);
        let response = self.execute(provider, &prompt).await?;
        Ok(clean_answer(&response.content))
    }
}

#[async_trait]
impl Agent for AnswerGenerator {
    fn name(&self) -> &'static str {
        "generator"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        ANSWER_TEMPERATURE
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// Reduces model output to the bare answer: first non-empty line, without
/// an `Answer:` label or surrounding quotes.
#[must_use]
pub fn clean_answer(raw: &str) -> String {
    let line = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();
    let line = line
        .get(..7)
        .filter(|p| p.eq_ignore_ascii_case("answer:"))
        .map_or(line, |_| line[7..].trim_start());
    line.trim_matches(|c| matches!(c, '"' | '\'' | '`' | '*'))
        .trim()
        .to_string()
}

/// Renders the first usable tool result as an answer, for runs without a
/// model.
///
/// Strings are used as-is. A skill object renders as its years of
/// experience for numeric questions and as its rating otherwise.
#[must_use]
pub fn direct_answer(observations: &[ToolObservation], format: AnswerFormat) -> String {
    observations
        .iter()
        .filter_map(|o| o.result.as_ref())
        .find_map(|value| render_value(value, format))
        .unwrap_or_default()
}

fn render_value(value: &Value, format: AnswerFormat) -> Option<String> {
    match value {
        Value::String(s) => {
            let first = s.lines().map(str::trim).find(|l| !l.is_empty())?;
            Some(first.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => {
            let years = map.get("years_of_experience").filter(|v| !v.is_null());
            let rating = map.get("rating").and_then(Value::as_u64);
            let scale = map.get("scale").and_then(Value::as_u64);
            match (format, years, rating) {
                (AnswerFormat::Number, Some(years), _) => Some(years.to_string()),
                (_, _, Some(rating)) => Some(scale.map_or_else(
                    || rating.to_string(),
                    |scale| format!("{rating}/{scale}"),
                )),
                (_, Some(years), None) => Some(years.to_string()),
                _ => None,
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    #[test_case("30 days", "30 days" ; "plain")]
    #[test_case("\n  \"30 days\"  \nextra", "30 days" ; "quoted first line")]
    #[test_case("Answer: 12 LPA", "12 LPA" ; "label")]
    #[test_case("answer:Yes", "Yes" ; "lowercase label")]
    #[test_case("**Immediately**", "Immediately" ; "markdown")]
    #[test_case("", "" ; "empty")]
    fn test_clean_answer(raw: &str, expected: &str) {
        assert_eq!(clean_answer(raw), expected);
    }

    fn observation(result: Option<Value>) -> ToolObservation {
        ToolObservation {
            tool: "t".to_string(),
            argument: String::new(),
            result,
            error: None,
        }
    }

    #[test]
    fn test_direct_answer_first_non_null() {
        let obs = vec![observation(None), observation(Some(json!("30 days")))];
        assert_eq!(direct_answer(&obs, AnswerFormat::ShortText), "30 days");
    }

    #[test]
    fn test_direct_answer_skill_object() {
        let skill = json!({"name": "Rust", "rating": 4, "scale": 5, "years_of_experience": 3.5});
        let obs = vec![observation(Some(skill))];
        assert_eq!(direct_answer(&obs, AnswerFormat::Number), "3.5");
        assert_eq!(direct_answer(&obs, AnswerFormat::ShortText), "4/5");
    }

    #[test]
    fn test_direct_answer_nothing() {
        assert_eq!(direct_answer(&[], AnswerFormat::ShortText), "");
        let obs = vec![observation(Some(json!({"role": null})))];
        assert_eq!(direct_answer(&obs, AnswerFormat::ShortText), "");
    }
}
