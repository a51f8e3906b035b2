//! Error types for autoapply.
//!
//! Each layer has its own error enum; [`Error`] unifies them for the CLI.

use std::time::Duration;

use thiserror::Error;

/// Result alias used by the CLI layer.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Answer-engine failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Persistence failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised inside the answer engine.
///
/// Most of these never reach the caller of
/// [`AgenticAnswerService`](crate::agent::AgenticAnswerService): they are
/// caught at the stage boundary and folded into a low-confidence result.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Provider name not recognised by the factory.
    #[error("unsupported LLM provider: {name}")]
    UnsupportedProvider {
        /// Configured provider name.
        name: String,
    },

    /// LLM request failed.
    #[error("LLM request failed: {message}")]
    ApiRequest {
        /// Error message from the client.
        message: String,
        /// HTTP status, when known.
        status: Option<u16>,
    },

    /// LLM call or whole answer exceeded its time budget.
    #[error("timed out after {}ms", after.as_millis())]
    Timeout {
        /// Budget that was exceeded.
        after: Duration,
    },

    /// Model output could not be interpreted.
    #[error("failed to parse model response: {message}")]
    ResponseParse {
        /// What went wrong.
        message: String,
        /// Raw model output.
        content: String,
    },

    /// Tool name is not in the registry.
    #[error("unknown tool: {name}")]
    UnknownTool {
        /// Requested tool name.
        name: String,
    },

    /// Tool arguments do not match the declared schema.
    #[error("invalid arguments for tool '{name}': {message}")]
    InvalidToolArguments {
        /// Tool name.
        name: String,
        /// Schema violation.
        message: String,
    },

    /// Tool executor failed at runtime.
    #[error("tool '{name}' failed: {message}")]
    ToolExecution {
        /// Tool name.
        name: String,
        /// Failure detail.
        message: String,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {message}")]
    Config {
        /// What is wrong.
        message: String,
    },

    /// Blank question text.
    #[error("question is empty")]
    EmptyQuestion,

    /// No LLM configured and degraded mode is off.
    #[error("no LLM configured and degraded mode is disabled")]
    LlmUnavailable,

    /// Caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
}

/// Errors from the user-data store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// No profile row for the user.
    #[error("user not found: {user_id}")]
    UserNotFound {
        /// Requested user id.
        user_id: String,
    },

    /// Background task failed to complete.
    #[error("store task failed: {0}")]
    Task(String),

    /// Record (de)serialization failure.
    #[error("invalid user record: {0}")]
    Json(#[from] serde_json::Error),

    /// Source deliberately unavailable (used by in-memory failure injection).
    #[error("{source_name} unavailable")]
    Unavailable {
        /// Which sub-record failed.
        source_name: &'static str,
    },
}

/// CLI command errors.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Command could not complete.
    #[error("{0}")]
    ExecutionFailed(String),

    /// Output could not be rendered.
    #[error("output formatting failed: {0}")]
    OutputFormat(String),

    /// Bad argument value.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
