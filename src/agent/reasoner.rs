//! Reasoning stage: classify the question and plan tool calls.

use async_trait::async_trait;

use super::config::AgentConfig;
use super::prompt::build_reasoning_prompt;
use super::provider::LlmProvider;
use super::reasoning::ReasoningTrace;
use super::tool::ToolSet;
use super::traits::Agent;
use crate::core::QuestionType;
use crate::error::AgentError;

/// Sampling temperature for planning.
pub const REASONING_TEMPERATURE: f32 = 0.1;

/// Agent that turns a question into a [`ReasoningTrace`].
///
/// The model sees the question and the tool descriptions, never the user
/// data itself.
pub struct Reasoner {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl Reasoner {
    /// Creates the reasoner with the configured model and budget.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.reasoning_max_tokens,
            system_prompt,
        }
    }

    /// Plans how to answer `question`.
    ///
    /// Malformed model output still yields a trace (category `complex`,
    /// no actions).
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] only when the LLM call itself fails.
    pub async fn plan(
        &self,
        provider: &dyn LlmProvider,
        question: &str,
        question_type: QuestionType,
        tools: &ToolSet,
    ) -> Result<ReasoningTrace, AgentError> {
        let prompt = build_reasoning_prompt(question, question_type, &tools.describe());
        let response = self.execute(provider, &prompt).await?;
        let trace = ReasoningTrace::parse(&response.content);
        tracing::debug!(
            category = %trace.category,
            actions = trace.actions.len(),
            "reasoning parsed"
        );
        Ok(trace)
    }
}

#[async_trait]
impl Agent for Reasoner {
    fn name(&self) -> &'static str {
        "reasoner"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        REASONING_TEMPERATURE
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}
