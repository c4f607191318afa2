//! SQL generation from retrieved schema context.

use std::sync::Arc;

use tracing::{debug, info, warn};

use sqlrag_core::{ConversationState, Message};
use sqlrag_storage::extract_sql;
use sqlrag_vector::Retriever;

use crate::error::{GenerationError, LlmError};
use crate::llm::LanguageModel;

const SQL_PROMPT_TEMPLATE: &str = "You are a world-class SQL expert.
Using the database schema information provided below, write a correct, optimized SQL query that answers the user's question.
The database is SQLite.
Return ONLY the SQL query, no explanations or markdown formatting.

Database Schema Information:
{rag_context}

User Question: {question}

Generate the SQL query:";

/// Replies that mean the model declined to write a query.
const DEGENERATE_REPLIES: [&str; 4] = ["", "none", "null", "no sql generated"];

/// Fill the generation template.
pub fn build_sql_prompt(rag_context: &str, question: &str) -> String {
    SQL_PROMPT_TEMPLATE
        .replace("{rag_context}", rag_context)
        .replace("{question}", question)
}

/// Normalize a model reply into a statement, rejecting degenerate replies.
///
/// Fenced replies are unwrapped despite the prompt asking for bare SQL.
pub fn clean_generated_sql(reply: &str) -> Result<String, GenerationError> {
    let trimmed = reply.trim();
    let sql = if trimmed.contains("```") {
        extract_sql(trimmed)
    } else {
        trimmed.to_string()
    };

    let probe = sql.trim_end_matches(['.', ';']).trim().to_lowercase();
    if DEGENERATE_REPLIES.contains(&probe.as_str()) {
        return Err(GenerationError::Degenerate(trimmed.to_string()));
    }
    Ok(sql)
}

pub struct SqlGenerator {
    model: Option<Arc<dyn LanguageModel>>,
    retriever: Arc<dyn Retriever>,
    top_k: usize,
}

impl SqlGenerator {
    pub fn new(
        model: Option<Arc<dyn LanguageModel>>,
        retriever: Arc<dyn Retriever>,
        top_k: usize,
    ) -> Self {
        Self {
            model,
            retriever,
            top_k,
        }
    }

    /// Generate a statement for the latest user message and record it.
    ///
    /// On success `turn.sql_query` holds the statement. On failure it is
    /// cleared, `turn.generation_failed` is set, and the error is noted in
    /// the transcript.
    pub async fn generate(&self, state: &mut ConversationState) -> Result<String, GenerationError> {
        let question = state.latest_user_message().unwrap_or_default().to_string();

        let rag_context = self.retriever.retrieve(&question, self.top_k).await;
        if rag_context.is_empty() {
            warn!("No schema context retrieved, generating without it");
        } else {
            debug!(context_chars = rag_context.len(), "Schema context retrieved");
        }

        match self.generate_sql(&rag_context, &question).await {
            Ok(sql) => {
                info!(sql = %sql, "SQL generated");
                state.turn.sql_query = sql.clone();
                state.push_system_note(format!("Generated SQL using RAG context: {}", sql));
                Ok(sql)
            }
            Err(e) => {
                warn!(error = %e, "SQL generation failed");
                state.turn.sql_query.clear();
                state.turn.generation_failed = true;
                state.push_system_note(format!("Error generating SQL: {}", e));
                Err(e)
            }
        }
    }

    async fn generate_sql(&self, rag_context: &str, question: &str) -> Result<String, GenerationError> {
        let model = self.model.as_ref().ok_or(LlmError::Unavailable)?;
        let prompt = build_sql_prompt(rag_context, question);
        let reply = model.invoke(&[Message::system(prompt)]).await?;
        clean_generated_sql(&reply)
    }
}
