//! Composes the user-facing answer for a turn.

use std::sync::Arc;

use tracing::{debug, warn};

use sqlrag_core::{ConversationState, Message};

use crate::llm::LanguageModel;

pub const NO_MESSAGES_REPLY: &str = "No messages in state to process.";
pub const MODEL_UNAVAILABLE_REPLY: &str =
    "LLM not available. Please check your language model configuration.";
pub const INVALID_MESSAGE_REPLY: &str = "Please provide a valid message.";
pub const RESPONSE_FAILED_REPLY: &str =
    "I'm sorry, I encountered an error while processing your request. Please try again.";

/// Fill the answer template. SQL results, when present, select the
/// results-grounded template.
pub fn build_answer_prompt(question: &str, sql_output: Option<&str>) -> String {
    match sql_output {
        Some(results) => format!(
            "You are a helpful assistant. Answer the user's question based on the SQL results provided below.\n\
             If the answer is not in the SQL results, provide a helpful response based on your knowledge.\n\n\
             SQL Results:\n{}\n\n\
             Question:\n{}\n\n\
             Answer:",
            results, question
        ),
        None => format!(
            "You are a helpful assistant. Answer the user's question in a clear and helpful manner.\n\
             If you don't know the answer, say so.\n\n\
             Question:\n{}\n\n\
             Answer:",
            question
        ),
    }
}

pub struct Responder {
    model: Option<Arc<dyn LanguageModel>>,
    history_messages: usize,
}

impl Responder {
    pub fn new(model: Option<Arc<dyn LanguageModel>>, history_messages: usize) -> Self {
        Self {
            model,
            history_messages,
        }
    }

    /// Answer the latest user message and append exactly one assistant
    /// entry to both `messages` and `memory`. Returns the answer text.
    pub async fn respond(&self, state: &mut ConversationState) -> String {
        let answer = self.compose(state).await;
        state.push_assistant(answer.clone());
        answer
    }

    async fn compose(&self, state: &ConversationState) -> String {
        if state.messages.is_empty() {
            warn!("Responder called with an empty transcript");
            return NO_MESSAGES_REPLY.to_string();
        }

        let Some(model) = self.model.as_ref() else {
            warn!("Responder has no language model");
            return MODEL_UNAVAILABLE_REPLY.to_string();
        };

        let question = match state.latest_user_message() {
            Some(text) if !text.trim().is_empty() => text,
            _ => return INVALID_MESSAGE_REPLY.to_string(),
        };

        let sql_output = Some(state.turn.sql_output.as_str()).filter(|s| !s.trim().is_empty());
        let prompt = build_answer_prompt(question, sql_output);

        let mut messages = self.history(state);
        messages.push(Message::system(prompt));
        debug!(
            history = messages.len() - 1,
            with_sql_results = sql_output.is_some(),
            "Composing answer"
        );

        match model.invoke(&messages).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Answer generation failed");
                RESPONSE_FAILED_REPLY.to_string()
            }
        }
    }

    /// Up to `history_messages` dialogue entries before the current question.
    fn history(&self, state: &ConversationState) -> Vec<Message> {
        let end = state
            .memory
            .iter()
            .rposition(Message::is_user)
            .unwrap_or(state.memory.len());
        let start = end.saturating_sub(self.history_messages);
        state.memory[start..end].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use async_trait::async_trait;
    use sqlrag_core::Role;
    use std::sync::Mutex;

    struct ScriptedModel {
        reply: Result<String, LlmError>,
        seen: Mutex<Vec<Vec<Message>>>,
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        async fn invoke(&self, messages: &[Message]) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push(messages.to_vec());
            self.reply.clone()
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn model(reply: Result<&str, LlmError>) -> Arc<ScriptedModel> {
        Arc::new(ScriptedModel {
            reply: reply.map(String::from),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn last_prompt(model: &ScriptedModel) -> String {
        let seen = model.seen.lock().unwrap();
        seen.last().unwrap().last().unwrap().content().to_string()
    }

    #[test]
    fn test_answer_prompt_templates() {
        let with_results = build_answer_prompt("Top customer?", Some("Query result:\n\n42"));
        assert!(with_results.contains("based on the SQL results provided below"));
        assert!(with_results.contains("SQL Results:\nQuery result:\n\n42\n\nQuestion:\nTop customer?"));

        let general = build_answer_prompt("How are you?", None);
        assert!(general.contains("If you don't know the answer, say so."));
        assert!(!general.contains("SQL Results"));
        assert!(general.ends_with("Question:\nHow are you?\n\nAnswer:"));
    }

    #[tokio::test]
    async fn test_respond_general_template() {
        let model = model(Ok("  I'm doing well.  "));
        let responder = Responder::new(Some(model.clone()), 6);

        let mut state = ConversationState::new();
        state.push_user("How are you?");
        let answer = responder.respond(&mut state).await;

        assert_eq!(answer, "I'm doing well.");
        assert_eq!(state.messages.last(), Some(&Message::assistant("I'm doing well.")));
        assert_eq!(state.memory.last(), Some(&Message::assistant("I'm doing well.")));
        assert!(!last_prompt(&model).contains("SQL Results"));
    }

    #[tokio::test]
    async fn test_respond_uses_sql_results() {
        let model = model(Ok("Helena Holý spent the most."));
        let responder = Responder::new(Some(model.clone()), 6);

        let mut state = ConversationState::new();
        state.push_user("Who spent the most?");
        state.turn.sql_output =
            "Here are the results from your query:\n\nHelena Holý | 14.85".to_string();
        responder.respond(&mut state).await;

        let prompt = last_prompt(&model);
        assert!(prompt.contains("SQL Results:\nHere are the results from your query:"));
        assert!(prompt.contains("Helena Holý | 14.85"));
    }

    #[tokio::test]
    async fn test_history_excludes_current_question_and_notes() {
        let model = model(Ok("ok"));
        let responder = Responder::new(Some(model.clone()), 2);

        let mut state = ConversationState::new();
        state.push_user("first");
        state.push_assistant("one");
        state.push_user("second");
        state.push_assistant("two");
        state.push_user("third");
        state.push_system_note("Generated SQL using RAG context: SELECT 1");
        responder.respond(&mut state).await;

        let seen = model.seen.lock().unwrap();
        let sent = &seen[0];
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0], Message::user("second"));
        assert_eq!(sent[1], Message::assistant("two"));
        assert_eq!(sent[2].role(), Role::System);
        assert!(sent[2].content().contains("Question:\nthird"));
    }

    #[tokio::test]
    async fn test_guard_empty_transcript() {
        let model = model(Ok("unused"));
        let responder = Responder::new(Some(model.clone()), 6);

        let mut state = ConversationState::new();
        let answer = responder.respond(&mut state).await;

        assert_eq!(answer, NO_MESSAGES_REPLY);
        assert_eq!(state.messages, vec![Message::assistant(NO_MESSAGES_REPLY)]);
        assert_eq!(state.memory, vec![Message::assistant(NO_MESSAGES_REPLY)]);
        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_guard_model_unavailable() {
        let responder = Responder::new(None, 6);
        let mut state = ConversationState::new();
        state.push_user("hello");

        assert_eq!(responder.respond(&mut state).await, MODEL_UNAVAILABLE_REPLY);
        assert_eq!(state.memory.len(), 2);
    }

    #[tokio::test]
    async fn test_guard_blank_message() {
        let model = model(Ok("unused"));
        let responder = Responder::new(Some(model.clone()), 6);

        let mut state = ConversationState::new();
        state.push_user("   \n");
        assert_eq!(responder.respond(&mut state).await, INVALID_MESSAGE_REPLY);

        let mut state = ConversationState::new();
        state.push_system_note("only a note");
        assert_eq!(responder.respond(&mut state).await, INVALID_MESSAGE_REPLY);

        assert!(model.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_error_apologizes() {
        let model = model(Err(LlmError::Status {
            status: 500,
            body: "boom".to_string(),
        }));
        let responder = Responder::new(Some(model), 6);

        let mut state = ConversationState::new();
        state.push_user("hello");
        let answer = responder.respond(&mut state).await;

        assert_eq!(answer, RESPONSE_FAILED_REPLY);
        assert_eq!(state.messages.last().unwrap().role(), Role::Assistant);
    }
}
