//! Lazy, load-once façade over the user store.
//!
//! The three sub-records are fetched concurrently on first use. Each sits
//! in a `tokio::sync::OnceCell`, so concurrent first callers share one load
//! instead of racing. A failed load is logged and memoized as the empty
//! default; the context stays answerable with weaker data.

use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use super::executor::ToolExecutor;
use super::tool::ToolCall;
use crate::core::{Profile, Skill, UserContext};
use crate::error::AgentError;
use crate::store::UserStore;

#[derive(Debug, Default)]
struct ContextCells {
    profile: OnceCell<Profile>,
    skills: OnceCell<Vec<Skill>>,
    resume: OnceCell<String>,
}

impl ContextCells {
    fn is_loaded(&self) -> bool {
        self.profile.initialized() && self.skills.initialized() && self.resume.initialized()
    }

    fn snapshot(&self) -> UserContext {
        UserContext {
            profile: self.profile.get().cloned().unwrap_or_default(),
            skills: self.skills.get().cloned().unwrap_or_default(),
            resume_text: self.resume.get().cloned().unwrap_or_default(),
        }
    }
}

/// Tool-execution façade for one user.
pub struct DataRetriever {
    store: Arc<dyn UserStore>,
    user_id: String,
    cells: RwLock<Arc<ContextCells>>,
}

impl std::fmt::Debug for DataRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataRetriever")
            .field("user_id", &self.user_id)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}

impl DataRetriever {
    /// Creates a retriever; nothing is loaded until first use.
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
            cells: RwLock::new(Arc::new(ContextCells::default())),
        }
    }

    /// User this retriever serves.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    fn cells(&self) -> Arc<ContextCells> {
        Arc::clone(&self.cells.read().unwrap_or_else(PoisonError::into_inner))
    }

    async fn ensure_loaded(&self) -> Arc<ContextCells> {
        let cells = self.cells();
        if cells.is_loaded() {
            return cells;
        }
        let user_id = self.user_id.as_str();
        let store = &self.store;

        tokio::join!(
            cells.profile.get_or_init(|| async {
                debug!(user_id, "loading profile");
                match store.load_profile(user_id).await {
                    Ok(profile) => profile.redacted(),
                    Err(e) => {
                        warn!(user_id, error = %e, "profile load failed, using empty profile");
                        Profile::default()
                    }
                }
            }),
            cells.skills.get_or_init(|| async {
                match store.load_skills(user_id).await {
                    Ok(skills) => skills,
                    Err(e) => {
                        warn!(user_id, error = %e, "skills load failed, using no skills");
                        Vec::new()
                    }
                }
            }),
            cells.resume.get_or_init(|| async {
                match store.load_resume(user_id).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(user_id, error = %e, "resume load failed, using empty resume");
                        String::new()
                    }
                }
            }),
        );
        cells
    }

    /// Loads (if needed) and returns the full context.
    pub async fn get_context(&self) -> UserContext {
        self.ensure_loaded().await.snapshot()
    }

    /// Runs a validated tool call.
    ///
    /// Executor faults are logged and reported as `None`.
    pub async fn execute(&self, call: &ToolCall) -> Option<Value> {
        let context = self.get_context().await;
        match ToolExecutor::new(&context).execute(call) {
            Ok(value) => {
                debug!(tool = call.name(), found = value.is_some(), "tool executed");
                value
            }
            Err(e) => {
                warn!(tool = call.name(), error = %e, "tool failed");
                None
            }
        }
    }

    /// Validates `name` + `args` against the registry and runs the call.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnknownTool`] or [`AgentError::InvalidToolArguments`]
    /// when the call does not match a declared tool. Execution faults are
    /// never returned.
    pub async fn execute_tool(&self, name: &str, args: &Value) -> Result<Option<Value>, AgentError> {
        let call = ToolCall::from_json(name, args)?;
        Ok(self.execute(&call).await)
    }

    /// True once all three sub-records are loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.cells().is_loaded()
    }

    /// Forgets everything loaded; the next access reloads from the store.
    pub fn clear_cache(&self) {
        *self.cells.write().unwrap_or_else(PoisonError::into_inner) =
            Arc::new(ContextCells::default());
        debug!(user_id = %self.user_id, "context cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::{ProfileRecord, UserRecord};
    use crate::store::{InMemoryUserStore, Source};

    fn store() -> Arc<InMemoryUserStore> {
        Arc::new(InMemoryUserStore::new().with_user(UserRecord {
            user_id: "u1".to_string(),
            profile: ProfileRecord {
                email: Some("asha.rao@mail.com".to_string()),
                notice_period: Some("30 days".to_string()),
                ..ProfileRecord::default()
            },
            skills: vec![Skill {
                name: "python".to_string(),
                rating: Some(8),
                ..Skill::default()
            }],
            resume: "Data engineer at Acme\nPython and Spark".to_string(),
        }))
    }

    #[tokio::test]
    async fn test_lazy_load_once() {
        let store = store();
        let retriever = DataRetriever::new(store.clone(), "u1");
        assert!(!retriever.is_loaded());
        assert_eq!(store.load_count(Source::Profile), 0);

        let (a, b) = tokio::join!(retriever.get_context(), retriever.get_context());
        assert_eq!(a, b);
        retriever
            .execute_tool("search_resume", &json!({"query": "spark"}))
            .await
            .unwrap_or_else(|_| unreachable!());

        assert!(retriever.is_loaded());
        assert_eq!(store.load_count(Source::Profile), 1);
        assert_eq!(store.load_count(Source::Skills), 1);
        assert_eq!(store.load_count(Source::Resume), 1);
    }

    #[tokio::test]
    async fn test_email_is_masked() {
        let retriever = DataRetriever::new(store(), "u1");
        let email = retriever
            .execute_tool("get_user_profile", &json!({"field": "email"}))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(email, Some(json!("as***@mail.com")));
    }

    #[tokio::test]
    async fn test_skills_failure_degrades() {
        let store = store();
        store.set_failing(Source::Skills, true);
        let retriever = DataRetriever::new(store.clone(), "u1");

        let skill = retriever
            .execute_tool("get_skill_info", &json!({"skill_name": "python"}))
            .await;
        assert!(matches!(skill, Ok(None)));

        let notice = retriever
            .execute_tool("get_user_profile", &json!({"field": "notice_period"}))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(notice, Some(json!("30 days")));

        let resume = retriever
            .execute_tool("search_resume", &json!({"query": "python"}))
            .await
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(resume, Some(json!("Python and Spark")));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error() {
        let retriever = DataRetriever::new(store(), "u1");
        let err = retriever.execute_tool("drop_tables", &json!({})).await;
        assert!(matches!(err, Err(AgentError::UnknownTool { .. })));
    }

    #[tokio::test]
    async fn test_clear_cache_forces_reload() {
        let store = store();
        let retriever = DataRetriever::new(store.clone(), "u1");
        retriever.get_context().await;
        retriever.clear_cache();
        assert!(!retriever.is_loaded());
        retriever.get_context().await;
        assert_eq!(store.load_count(Source::Profile), 2);
    }
}
