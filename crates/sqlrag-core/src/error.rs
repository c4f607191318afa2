use thiserror::Error;

/// Top-level error type for the sqlrag system.
///
/// Subsystem crates keep their own error enums for per-turn failures (which
/// never escape a turn) and convert into `SqlRagError` only for setup paths:
/// loading config, opening the knowledge base, inspecting the schema.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqlRagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for SqlRagError {
    fn from(err: toml::de::Error) -> Self {
        SqlRagError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for SqlRagError {
    fn from(err: toml::ser::Error) -> Self {
        SqlRagError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for SqlRagError {
    fn from(err: serde_json::Error) -> Self {
        SqlRagError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for sqlrag operations.
pub type Result<T> = std::result::Result<T, SqlRagError>;
