//! One interactive conversation.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use sqlrag_core::{ConversationState, SqlRagConfig, SqlRagError};
use sqlrag_storage::Database;
use sqlrag_vector::{build_retriever, HashingEmbedding, Retriever, VectorRetriever};

use crate::error::ChatError;
use crate::llm;
use crate::router::{Router, TurnOutcome};

const EXIT_COMMANDS: [&str; 4] = ["exit", "quit", "bye", "/bye"];

/// True for inputs that end an interactive session.
pub fn is_exit_command(input: &str) -> bool {
    let input = input.trim();
    EXIT_COMMANDS.iter().any(|c| c.eq_ignore_ascii_case(input))
}

/// Owns the conversation state and the router that drives it.
pub struct ChatSession {
    id: Uuid,
    state: ConversationState,
    router: Router,
}

impl ChatSession {
    pub fn new(router: Router) -> Self {
        let id = Uuid::new_v4();
        info!(session_id = %id, "Chat session started");
        Self {
            id,
            state: ConversationState::new(),
            router,
        }
    }

    /// Wire up model, retriever and database from configuration.
    ///
    /// A knowledge base that cannot be built leaves retrieval empty instead
    /// of failing; invalid settings are still reported.
    pub async fn from_config(config: &SqlRagConfig) -> Result<Self, ChatError> {
        let db = Database::new(&config.database.path);
        if !db.exists() {
            warn!(path = %db.path().display(), "Database file not found; queries will fail");
        }

        let model = llm::from_config(&config.llm).map_err(|e| ChatError::Config(e.to_string()))?;

        let retriever: Arc<dyn Retriever> = match build_retriever(&config.retrieval, &db).await {
            Ok(r) => Arc::new(r),
            Err(SqlRagError::Config(msg)) => return Err(ChatError::Config(msg)),
            Err(e) => {
                warn!(error = %e, "Knowledge base unavailable, continuing without retrieval");
                Arc::new(VectorRetriever::new(HashingEmbedding::new(
                    config.retrieval.embedding_dim,
                )))
            }
        };

        Ok(Self::new(Router::new(config, model, retriever, db)))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Record the user's message and run one full turn.
    pub async fn submit(&mut self, text: &str) -> TurnOutcome {
        self.state.push_user(text);
        self.router.run_turn(&mut self.state).await
    }
}
