//! Conversation data model shared by every pipeline stage.

use serde::{Deserialize, Serialize};

// =============================================================================
// Messages
// =============================================================================

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged transcript entry.
///
/// Serializes as `{"role": "...", "content": "..."}`, which is also the
/// chat-completions wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum Message {
    User(String),
    Assistant(String),
    System(String),
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message::User(content.into())
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant(content.into())
    }

    pub fn system(content: impl Into<String>) -> Self {
        Message::System(content.into())
    }

    pub fn role(&self) -> Role {
        match self {
            Message::User(_) => Role::User,
            Message::Assistant(_) => Role::Assistant,
            Message::System(_) => Role::System,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::User(c) | Message::Assistant(c) | Message::System(c) => c,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Message::User(_))
    }
}

// =============================================================================
// SQL sub-path outcome
// =============================================================================

/// Outcome of one executor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlStatus {
    Success,
    Error,
}

impl std::fmt::Display for SqlStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlStatus::Success => f.write_str("success"),
            SqlStatus::Error => f.write_str("error"),
        }
    }
}

/// Turn-scoped outputs of the SQL sub-path.
///
/// Reset at the start of every turn so a stale query or result can never be
/// reused for an unrelated follow-up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnContext {
    /// Whether this turn needs a database query.
    pub sql_needed: bool,
    /// Statement generated for this turn; empty when none applies.
    pub sql_query: String,
    /// Annotated result text handed to the responder; empty when none applies.
    pub sql_output: String,
    /// Set when the generator ran and produced nothing usable.
    pub generation_failed: bool,
    /// Executor outcome, if the executor ran.
    pub sql_status: Option<SqlStatus>,
    /// Rows returned by a successful execution.
    pub row_count: usize,
}

// =============================================================================
// ConversationState
// =============================================================================

/// Mutable record threaded through every pipeline step of a session.
///
/// `messages` is the full transcript including system notes; `memory` only
/// holds user and assistant dialogue and is what the model sees as history.
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub memory: Vec<Message>,
    pub turn: TurnContext,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the turn-scoped fields. Durable history is untouched.
    pub fn begin_turn(&mut self) {
        self.turn = TurnContext::default();
    }

    /// Record a user message in both the transcript and memory.
    pub fn push_user(&mut self, content: impl Into<String>) {
        let msg = Message::user(content);
        self.messages.push(msg.clone());
        self.memory.push(msg);
    }

    /// Record an assistant reply in both the transcript and memory.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        let msg = Message::assistant(content);
        self.messages.push(msg.clone());
        self.memory.push(msg);
    }

    /// Record an internal note. Notes stay out of memory.
    pub fn push_system_note(&mut self, content: impl Into<String>) {
        self.messages.push(Message::system(content));
    }

    /// Most recent user-authored message, scanning backwards past notes.
    pub fn latest_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.is_user())
            .map(|m| m.content())
    }

    /// Most recent transcript entry of any role.
    pub fn latest_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}
