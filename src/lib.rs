//! # autoapply
//!
//! Agentic answer engine for job-application forms.
//!
//! Given a form question, the engine reasons about what applicant data is
//! needed, fetches it through a fixed tool interface (profile fields,
//! skills, résumé search), drafts a terse answer and validates it with
//! bounded self-correction. Every LLM call passes a shared sliding-window
//! rate limiter; answers are cached per session.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use autoapply::agent::{AgentConfig, AgenticAnswerService};
//! use autoapply::core::QuestionType;
//! use autoapply::store::SqliteUserStore;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(SqliteUserStore::open(".autoapply/autoapply.db")?);
//! let service = AgenticAnswerService::new(AgentConfig::from_env()?, store, "me")?;
//! let result = service
//!     .get_answer("What is your notice period?", QuestionType::Text)
//!     .await;
//! println!("{} ({})", result.answer, result.confidence);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod error;
pub mod store;

pub use error::{AgentError, CommandError, Error, Result, StoreError};
