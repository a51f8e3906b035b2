//! The reason → act → generate → validate loop for one question.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::config::{AgentConfig, DegradedMode};
use super::generator::{AnswerGenerator, direct_answer};
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::reasoner::Reasoner;
use super::reasoning::{ReasoningTrace, heuristic_plan};
use super::result::{AnswerResult, ToolObservation};
use super::retriever::DataRetriever;
use super::tool::{ToolCall, ToolSet};
use super::validator::{AnswerValidator, Corrector, RelevanceJudge};
use crate::core::QuestionType;
use crate::error::AgentError;

/// Everything one pass through the loop produced.
#[derive(Debug, Clone)]
pub struct AgentRun {
    /// What the caller receives.
    pub result: AnswerResult,
    /// Reasoning trace; `None` when the run failed before or during reasoning.
    pub trace: Option<ReasoningTrace>,
    /// Tool observations in call order.
    pub observations: Vec<ToolObservation>,
}

impl AgentRun {
    /// A run that ended in `error`.
    #[must_use]
    pub fn failed(error: &AgentError, latency_ms: u64) -> Self {
        Self {
            result: AnswerResult::from_error(error, latency_ms),
            trace: None,
            observations: Vec::new(),
        }
    }
}

/// ReAct-style answer agent.
///
/// With a provider, the plan and the answer come from the model. Without
/// one, [`DegradedMode::Heuristic`] plans with keyword rules and answers
/// with the first tool result; [`DegradedMode::Off`] refuses.
pub struct AnswerAgent {
    reasoner: Reasoner,
    generator: AnswerGenerator,
    validator: AnswerValidator,
    retriever: Arc<DataRetriever>,
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolSet,
    degraded_mode: DegradedMode,
}

impl std::fmt::Debug for AnswerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerAgent")
            .field("llm", &self.provider.is_some())
            .field("degraded_mode", &self.degraded_mode)
            .field("retriever", &self.retriever)
            .finish_non_exhaustive()
    }
}

impl AnswerAgent {
    /// Wires the stage agents to a provider (already rate limited) and a
    /// retriever.
    #[must_use]
    pub fn new(
        config: &AgentConfig,
        prompts: &PromptSet,
        provider: Option<Arc<dyn LlmProvider>>,
        retriever: Arc<DataRetriever>,
    ) -> Self {
        Self {
            reasoner: Reasoner::new(config, prompts.reasoning.clone()),
            generator: AnswerGenerator::new(config, prompts.answer.clone()),
            validator: AnswerValidator::new(
                Corrector::new(config, prompts.correction.clone()),
                RelevanceJudge::new(config, prompts.relevance.clone()),
                provider.clone(),
                config.max_corrections,
            ),
            retriever,
            provider,
            tools: ToolSet::all(),
            degraded_mode: config.degraded_mode,
        }
    }

    /// Answers one question. Never fails: errors become a result with an
    /// empty answer and confidence 0.
    pub async fn process_question(&self, question: &str, question_type: QuestionType) -> AgentRun {
        let start = Instant::now();
        match self.run(question, question_type, start).await {
            Ok(run) => {
                info!(
                    question,
                    confidence = run.result.confidence,
                    valid = run.result.valid,
                    latency_ms = run.result.latency_ms,
                    "question answered"
                );
                run
            }
            Err(e) => {
                warn!(question, error = %e, "answering failed");
                AgentRun::failed(&e, elapsed_ms(start))
            }
        }
    }

    async fn run(
        &self,
        question: &str,
        question_type: QuestionType,
        start: Instant,
    ) -> Result<AgentRun, AgentError> {
        if question.trim().is_empty() {
            return Err(AgentError::EmptyQuestion);
        }

        // Reason
        let trace = match (&self.provider, self.degraded_mode) {
            (Some(provider), _) => {
                self.reasoner
                    .plan(provider.as_ref(), question, question_type, &self.tools)
                    .await?
            }
            (None, DegradedMode::Heuristic) => {
                let context = self.retriever.get_context().await;
                heuristic_plan(question, &context)
            }
            (None, DegradedMode::Off) => return Err(AgentError::LlmUnavailable),
        };
        debug!(
            category = %trace.category,
            format = %trace.answer_format,
            actions = trace.actions.len(),
            "plan ready"
        );

        // Act
        let observations = self.act(&trace).await;

        // Generate
        let draft = match &self.provider {
            Some(provider) => {
                self.generator
                    .generate(provider.as_ref(), question, &trace, &observations)
                    .await?
            }
            None => direct_answer(&observations, trace.answer_format),
        };
        debug!(draft = %draft, "draft answer");

        // Validate
        let context = self.retriever.get_context().await;
        let outcome = self.validator.validate(&draft, question, &context).await;

        let tools_used = observations
            .iter()
            .filter(|o| o.error.is_none())
            .map(|o| o.tool.clone())
            .collect();
        let result = AnswerResult {
            answer: outcome.answer,
            confidence: outcome.confidence,
            valid: outcome.valid,
            reasoning: trace.thoughts.clone(),
            category: trace.category,
            tools_used,
            issues: outcome.issues,
            latency_ms: elapsed_ms(start),
            from_cache: false,
            error: None,
        };
        Ok(AgentRun {
            result,
            trace: Some(trace),
            observations,
        })
    }

    /// Runs every planned action in order. A bad tool name or argument is
    /// recorded on its observation and the loop moves on.
    async fn act(&self, trace: &ReasoningTrace) -> Vec<ToolObservation> {
        let mut observations = Vec::with_capacity(trace.actions.len());
        for action in &trace.actions {
            let observation = match ToolCall::from_action(&action.tool, &action.argument) {
                Ok(call) => ToolObservation {
                    tool: call.name().to_string(),
                    argument: action.argument.clone(),
                    result: self.retriever.execute(&call).await,
                    error: None,
                },
                Err(e) => {
                    warn!(tool = %action.tool, error = %e, "planned action rejected");
                    ToolObservation {
                        tool: action.tool.clone(),
                        argument: action.argument.clone(),
                        result: None,
                        error: Some(e.to_string()),
                    }
                }
            };
            observations.push(observation);
        }
        observations
    }
}

/// Milliseconds since `start`, saturating.
pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::agent::message::{ChatRequest, ChatResponse};
    use crate::core::{ProfileRecord, QuestionCategory, Skill, UserRecord};
    use crate::store::{InMemoryUserStore, Source};

    fn store() -> Arc<InMemoryUserStore> {
        Arc::new(InMemoryUserStore::new().with_user(UserRecord {
            user_id: "u1".to_string(),
            profile: ProfileRecord {
                notice_period: Some("30 days".to_string()),
                expected_ctc: Some("18 LPA".to_string()),
                location: Some("Bangalore".to_string()),
                ..ProfileRecord::default()
            },
            skills: vec![Skill {
                name: "rust".to_string(),
                display_name: Some("Rust".to_string()),
                rating: Some(4),
                rating_scale: Some(5),
                years_of_experience: Some(3.0),
            }],
            resume: "Built payment systems in Rust.\nLed a team of five.".to_string(),
        }))
    }

    fn agent(
        provider: Option<Arc<dyn LlmProvider>>,
        mode: DegradedMode,
        store: Arc<InMemoryUserStore>,
    ) -> AnswerAgent {
        let config = AgentConfig::builder()
            .degraded_mode(mode)
            .build()
            .unwrap_or_else(|_| unreachable!());
        let retriever = Arc::new(DataRetriever::new(store, "u1"));
        AnswerAgent::new(&config, &PromptSet::defaults(), provider, retriever)
    }

    /// Replies by call site, recognised from the token budget.
    struct Script {
        reasoning: &'static str,
        answer: &'static str,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for Script {
        fn name(&self) -> &'static str {
            "script"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            self.prompts
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(request.messages[1].content.clone());
            match request.max_tokens {
                Some(300) => Ok(ChatResponse::text(self.reasoning)),
                Some(50) => Ok(ChatResponse::text(self.answer)),
                Some(10) => Ok(ChatResponse::text("YES")),
                _ => Err(AgentError::ApiRequest {
                    message: "unexpected call".to_string(),
                    status: None,
                }),
            }
        }
    }

    #[tokio::test]
    async fn test_llm_loop_uses_tool_results() {
        let script = Arc::new(Script {
            reasoning: "THOUGHT: notice period\nCATEGORY: availability\n\
                        ACTIONS:\n- get_user_profile(notice_period)\n- lookup_salary(x)\n\
                        ANSWER_FORMAT: short text",
            answer: "30 days",
            prompts: Mutex::new(Vec::new()),
        });
        let run = agent(Some(script.clone()), DegradedMode::Heuristic, store())
            .process_question("What is your notice period?", QuestionType::Text)
            .await;

        assert_eq!(run.result.answer, "30 days");
        assert_eq!(run.result.confidence, 95);
        assert_eq!(run.result.category, QuestionCategory::Availability);
        assert_eq!(run.result.tools_used, vec!["get_user_profile".to_string()]);
        assert_eq!(run.observations.len(), 2);
        assert!(run.observations[1].error.is_some());

        let prompts = script
            .prompts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        assert_eq!(prompts.len(), 3);
        assert!(prompts[1].contains("get_user_profile(notice_period): 30 days"));
    }

    #[tokio::test]
    async fn test_heuristic_notice_period() {
        let run = agent(None, DegradedMode::Heuristic, store())
            .process_question("What is your notice period?", QuestionType::Text)
            .await;
        assert!(run.result.answer.contains("30"));
        assert!(run.result.valid);
        assert!(run.result.error.is_none());
    }

    #[tokio::test]
    async fn test_heuristic_skill_years() {
        let run = agent(None, DegradedMode::Heuristic, store())
            .process_question("How many years of Rust experience do you have?", QuestionType::Text)
            .await;
        assert_eq!(run.result.answer, "3.0");
        assert_eq!(run.result.category, QuestionCategory::Skill);
    }

    #[tokio::test]
    async fn test_off_mode_without_llm_errors() {
        let run = agent(None, DegradedMode::Off, store())
            .process_question("What is your notice period?", QuestionType::Text)
            .await;
        assert_eq!(run.result.answer, "");
        assert_eq!(run.result.confidence, 0);
        assert_eq!(run.result.reasoning, vec!["error occurred".to_string()]);
        assert!(run.result.error.is_some());
    }

    #[tokio::test]
    async fn test_reasoning_failure_is_error_result() {
        struct Down;

        #[async_trait]
        impl LlmProvider for Down {
            fn name(&self) -> &'static str {
                "down"
            }

            async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
                Err(AgentError::ApiRequest {
                    message: "connection refused".to_string(),
                    status: None,
                })
            }
        }

        let run = agent(Some(Arc::new(Down)), DegradedMode::Heuristic, store())
            .process_question("What is your notice period?", QuestionType::Text)
            .await;
        assert_eq!(run.result.confidence, 0);
        assert!(run.trace.is_none());
        assert!(
            run.result
                .error
                .as_deref()
                .is_some_and(|e| e.contains("connection refused"))
        );
    }

    #[tokio::test]
    async fn test_profile_outage_still_answers_from_resume() {
        let store = store();
        store.set_failing(Source::Profile, true);
        let run = agent(None, DegradedMode::Heuristic, store)
            .process_question("Describe your payment systems work", QuestionType::Text)
            .await;
        assert!(run.result.error.is_none());
        assert!(run.result.answer.contains("payment"));
    }
}
