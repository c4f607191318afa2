//! Conversational routing for sqlrag.
//!
//! Decides per turn whether a question needs the database, generates SQL
//! from retrieved schema context, runs it, and composes the answer.

pub mod classifier;
pub mod error;
pub mod generator;
pub mod llm;
pub mod responder;
pub mod router;
pub mod session;

pub use classifier::SqlClassifier;
pub use error::{ChatError, ClassificationError, GenerationError, LlmError};
pub use generator::SqlGenerator;
pub use llm::{LanguageModel, OpenAiCompatibleClient};
pub use responder::Responder;
pub use router::{Node, Route, Router, TurnOutcome};
pub use session::{is_exit_command, ChatSession};
