//! Error types for the conversational pipeline.
//!
//! Only `ChatError` can reach the binary. The others are caught inside the
//! step that produced them and turned into a transcript update.

use sqlrag_core::SqlRagError;

/// Failures of one language-model call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("language model not configured")]
    Unavailable,
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("model endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed model response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LlmError::MalformedResponse(err.to_string())
        } else {
            LlmError::Http(err.to_string())
        }
    }
}

/// Reasons the model-backed classification could not produce a verdict.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationError {
    #[error("classifier call failed: {0}")]
    Service(#[from] LlmError),
    #[error("unparseable classifier output: {0:?}")]
    Unparseable(String),
}

/// Reasons SQL generation produced no usable statement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("{0}")]
    Service(#[from] LlmError),
    #[error("model returned no usable SQL: {0:?}")]
    Degenerate(String),
}

/// Session-level errors.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("retrieval error: {0}")]
    Retrieval(String),
}

impl From<SqlRagError> for ChatError {
    fn from(err: SqlRagError) -> Self {
        match err {
            SqlRagError::Config(msg) => ChatError::Config(msg),
            SqlRagError::Retrieval(msg) => ChatError::Retrieval(msg),
            SqlRagError::Storage(msg) => ChatError::Storage(msg),
            other => ChatError::Storage(other.to_string()),
        }
    }
}
