//! Error types for statement execution.

use sqlrag_core::SqlRagError;

/// Failures of a single executor run.
///
/// None of these end a session: the executor turns them into a rendered
/// error result and a transcript note.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SqlExecutionError {
    #[error("No SQL query found in the conversation. Please provide a valid SQL query.")]
    EmptyQuery,
    #[error("Database error: {0}")]
    Database(String),
    #[error("Error executing SQL query: {0}")]
    Unexpected(String),
}

impl From<rusqlite::Error> for SqlExecutionError {
    fn from(err: rusqlite::Error) -> Self {
        SqlExecutionError::Database(err.to_string())
    }
}

impl From<SqlExecutionError> for SqlRagError {
    fn from(err: SqlExecutionError) -> Self {
        SqlRagError::Storage(err.to_string())
    }
}
