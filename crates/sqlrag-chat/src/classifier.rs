//! Decides whether a turn needs a database query.
//!
//! Asks the model for a strict boolean first. A service failure or an answer
//! that does not parse falls back to a keyword test, so classification
//! itself never fails.

use std::sync::Arc;

use tracing::{debug, warn};

use sqlrag_core::{ConversationState, Message};

use crate::error::{ClassificationError, LlmError};
use crate::llm::LanguageModel;

/// Built-in keywords that mark a question as database-bound.
pub const SQL_KEYWORDS: [&str; 12] = [
    "show", "select", "count", "customer", "invoice", "employee", "track", "album", "artist",
    "data", "database", "query",
];

const CLASSIFIER_PROMPT: &str = "Classify whether SQL is needed or not based on the user's last message. \
The database holds a music store's artists, albums, tracks, playlists, customers, employees and invoices. \
Answer with exactly one word: true or false.";

pub struct SqlClassifier {
    model: Option<Arc<dyn LanguageModel>>,
    keywords: Vec<String>,
}

impl SqlClassifier {
    pub fn new(model: Option<Arc<dyn LanguageModel>>, extra_keywords: &[String]) -> Self {
        let keywords = SQL_KEYWORDS
            .iter()
            .map(|k| k.to_string())
            .chain(
                extra_keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty()),
            )
            .collect();
        Self { model, keywords }
    }

    /// Classify the most recent user message. No user message means no SQL.
    pub async fn classify(&self, state: &ConversationState) -> bool {
        let Some(text) = state.latest_user_message() else {
            debug!("No user message to classify");
            return false;
        };

        match self.classify_with_model(text).await {
            Ok(needed) => {
                debug!(sql_needed = needed, "Classified by model");
                needed
            }
            Err(ClassificationError::Service(LlmError::Unavailable)) => {
                let needed = self.keyword_fallback(text);
                debug!(sql_needed = needed, "No model configured, classified by keywords");
                needed
            }
            Err(e) => {
                let needed = self.keyword_fallback(text);
                warn!(error = %e, sql_needed = needed, "Model classification failed, classified by keywords");
                needed
            }
        }
    }

    async fn classify_with_model(&self, text: &str) -> Result<bool, ClassificationError> {
        let model = self.model.as_ref().ok_or(LlmError::Unavailable)?;
        let reply = model
            .invoke(&[Message::system(CLASSIFIER_PROMPT), Message::user(text)])
            .await?;
        parse_classification(&reply)
    }

    /// True when the lower-cased text contains any keyword.
    pub fn keyword_fallback(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

/// Parse a boolean-like model reply.
///
/// Accepts `true`/`false`, `yes`/`no`, `1`/`0` (any case, optionally quoted
/// or followed by punctuation) and a JSON object `{"sql_needed": bool}`.
pub fn parse_classification(reply: &str) -> Result<bool, ClassificationError> {
    let trimmed = reply.trim();

    if trimmed.starts_with('{') {
        return serde_json::from_str::<serde_json::Value>(trimmed)
            .ok()
            .and_then(|v| v.get("sql_needed").and_then(|b| b.as_bool()))
            .ok_or_else(|| ClassificationError::Unparseable(trimmed.to_string()));
    }

    let token = trimmed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '.' | '!'))
        .to_lowercase();

    match token.as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(ClassificationError::Unparseable(trimmed.to_string())),
    }
}
