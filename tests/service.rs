//! End-to-end tests of the answer service against a scripted model.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use autoapply::agent::{
    AgentConfig, AgenticAnswerService, ChatRequest, ChatResponse, CheckboxOption, DegradedMode,
    LlmProvider, LogRecord,
};
use autoapply::core::{Confidence, ProfileRecord, QuestionType, Skill, UserRecord};
use autoapply::error::AgentError;
use autoapply::store::{InMemoryUserStore, Source, UserStore};

fn applicant() -> UserRecord {
    UserRecord {
        user_id: "asha".to_string(),
        profile: ProfileRecord {
            name: Some("Asha Rao".to_string()),
            email: Some("asha.rao@example.com".to_string()),
            phone: Some("+91 98450 00000".to_string()),
            target_role: Some("Backend Engineer".to_string()),
            location: Some("Bangalore".to_string()),
            current_ctc: Some("14 LPA".to_string()),
            expected_ctc: Some("20 LPA".to_string()),
            notice_period: Some("30 days".to_string()),
            years_of_experience: Some("5".to_string()),
            availability: Some("Immediately after notice".to_string()),
            date_of_birth: Some("14/02/1996".to_string()),
        },
        skills: vec![Skill {
            name: "go".to_string(),
            display_name: Some("Go".to_string()),
            rating: Some(4),
            rating_scale: Some(5),
            years_of_experience: Some(3.0),
        }],
        resume: "Backend Engineer at Acme\nBuilt a payments ledger in Go\nOn-call lead".to_string(),
    }
}

fn store() -> Arc<InMemoryUserStore> {
    Arc::new(InMemoryUserStore::new().with_user(applicant()))
}

fn config() -> AgentConfig {
    AgentConfig::builder()
        .answer_timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| unreachable!())
}

/// Plays the model: plans a notice-period lookup, then answers from the
/// tool result it was shown.
#[derive(Default)]
struct ScriptedModel {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl LlmProvider for ScriptedModel {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = request.messages[1].content.clone();
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.clone());

        let reply = match request.max_tokens {
            Some(300) => {
                "THOUGHT: The form asks how long until I can join.\n\
                 CATEGORY: availability\n\
                 ACTIONS:\n\
                 - get_user_profile(notice_period)\n\
                 ANSWER_FORMAT: short text"
            }
            Some(50) if prompt.contains("30 days") => "30 days",
            Some(50) => "not sure",
            Some(10) => "YES",
            _ => "",
        };
        Ok(ChatResponse::text(reply))
    }
}

#[tokio::test]
async fn notice_period_end_to_end() {
    let model = Arc::new(ScriptedModel::default());
    let service = AgenticAnswerService::with_provider(config(), Some(model.clone()), store(), "asha");

    let result = service
        .get_answer("What is your notice period?", QuestionType::Text)
        .await;

    assert!(result.answer.contains("30"), "answer: {}", result.answer);
    assert!(result.valid);
    assert_eq!(result.confidence, 95);
    assert!(result.issues.is_empty());
    assert_eq!(result.tools_used, vec!["get_user_profile".to_string()]);
    assert_eq!(model.calls.load(Ordering::SeqCst), 3);

    let stats = service.get_stats();
    assert_eq!(stats.rate_limiter.in_window, 3);
    assert_eq!(stats.cache.size, 1);

    let log = service.reasoning_log();
    assert_eq!(log.len(), 1);
    match &log[0].record {
        LogRecord::Answer {
            trace,
            observations,
            ..
        } => {
            assert!(trace.is_some());
            assert_eq!(observations.len(), 1);
        }
        LogRecord::Checkbox { .. } => unreachable!(),
    }
}

#[tokio::test]
async fn cached_answer_skips_the_model() {
    let model = Arc::new(ScriptedModel::default());
    let service = AgenticAnswerService::with_provider(config(), Some(model.clone()), store(), "asha");

    service
        .get_answer("What is your notice period?", QuestionType::Text)
        .await;
    let again = service
        .get_answer("what is your notice period?  ", QuestionType::Text)
        .await;

    assert!(again.from_cache);
    assert_eq!(again.answer, "30 days");
    assert_eq!(model.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn heuristic_mode_answers_without_a_model() {
    let service = AgenticAnswerService::with_provider(config(), None, store(), "asha");

    let notice = service
        .get_answer("What is your notice period?", QuestionType::Text)
        .await;
    assert_eq!(notice.answer, "30 days");
    assert!(notice.valid);

    let ctc = service
        .get_answer("What is your expected CTC?", QuestionType::Text)
        .await;
    assert_eq!(ctc.answer, "20 LPA");

    let phone = service
        .get_answer("What is your phone number?", QuestionType::Text)
        .await;
    assert!(!phone.answer.contains("98450"));
}

#[tokio::test]
async fn off_mode_refuses_without_a_model() {
    let config = AgentConfig::builder()
        .degraded_mode(DegradedMode::Off)
        .build()
        .unwrap_or_else(|_| unreachable!());
    let service = AgenticAnswerService::with_provider(config, None, store(), "asha");

    let result = service
        .get_answer("What is your notice period?", QuestionType::Text)
        .await;
    assert_eq!(result.answer, "");
    assert_eq!(result.confidence, 0);
    assert_eq!(result.reasoning, vec!["error occurred".to_string()]);
}

#[tokio::test]
async fn checkbox_fallback_prefers_location() {
    let service = AgenticAnswerService::with_provider(config(), None, store(), "asha");
    let options = ["Bangalore", "Mumbai", "Delhi"].map(CheckboxOption::new);

    let decision = service
        .analyze_checkbox_options(&options, "Preferred work location?")
        .await;

    assert_eq!(decision.selected_index, 0);
    assert_eq!(decision.confidence, Confidence::Medium);
}

#[tokio::test]
async fn skills_outage_degrades_gracefully() {
    let store = store();
    store.set_failing(Source::Skills, true);
    let service = AgenticAnswerService::with_provider(config(), None, store.clone(), "asha");

    let skill = service
        .get_answer("How many years of Go experience?", QuestionType::Text)
        .await;
    assert!(skill.error.is_none());

    let notice = service
        .get_answer("What is your notice period?", QuestionType::Text)
        .await;
    assert_eq!(notice.answer, "30 days");
    assert_eq!(store.load_count(Source::Skills), 1);
}

#[tokio::test]
async fn context_loads_once_under_concurrency() {
    let store = store();
    let service = Arc::new(AgenticAnswerService::with_provider(
        config(),
        None,
        store.clone(),
        "asha",
    ));

    let questions = [
        "What is your notice period?",
        "What is your expected CTC?",
        "What is your current CTC?",
        "Where are you located? Which city?",
    ];
    let handles: Vec<_> = questions
        .into_iter()
        .map(|q| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.get_answer(q, QuestionType::Text).await })
        })
        .collect();
    for handle in handles {
        let result = handle.await.unwrap_or_else(|_| unreachable!());
        assert!(result.error.is_none());
    }

    for source in [Source::Profile, Source::Skills, Source::Resume] {
        assert_eq!(store.load_count(source), 1);
    }
}

#[tokio::test]
async fn email_is_masked_in_tool_results() {
    let store = store();
    let profile = store
        .load_profile("asha")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert_eq!(profile.email.as_deref(), Some("asha.rao@example.com"));

    let service = AgenticAnswerService::with_provider(config(), None, store, "asha");
    let result = service
        .get_answer("What is your email address?", QuestionType::Text)
        .await;
    assert!(result.answer.starts_with("as***@"), "answer: {}", result.answer);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_is_shared_across_questions() {
    let model = Arc::new(ScriptedModel::default());
    let config = AgentConfig::builder()
        .max_requests(4)
        .rate_window(Duration::from_secs(60))
        .answer_timeout(Duration::from_secs(600))
        .build()
        .unwrap_or_else(|_| unreachable!());
    let service = AgenticAnswerService::with_provider(config, Some(model.clone()), store(), "asha");

    let start = tokio::time::Instant::now();
    service
        .get_answer("What is your notice period?", QuestionType::Text)
        .await;
    service
        .get_answer("When can you join after notice period?", QuestionType::Text)
        .await;

    // Six calls through a 4-per-minute window: the fifth waits a full window.
    assert_eq!(model.calls.load(Ordering::SeqCst), 6);
    assert!(start.elapsed() >= Duration::from_secs(60));
    assert!(service.get_stats().rate_limiter.in_window <= 4);
}
