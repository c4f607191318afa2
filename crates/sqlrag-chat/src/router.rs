//! Per-turn state machine.
//!
//! Start -> ClassifySqlNeeded | Respond
//! ClassifySqlNeeded -> GenerateSql | Respond
//! GenerateSql -> ExecuteSql -> Respond -> End
//!
//! Every turn restarts at `Start`, which clears the turn-scoped fields.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use sqlrag_core::{ConversationState, SqlRagConfig, SqlStatus};
use sqlrag_storage::{Database, SqlExecutor};
use sqlrag_vector::Retriever;

use crate::classifier::SqlClassifier;
use crate::generator::SqlGenerator;
use crate::llm::LanguageModel;
use crate::responder::Responder;

/// A step of the turn pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Start,
    ClassifySqlNeeded,
    GenerateSql,
    ExecuteSql,
    Respond,
    End,
}

/// Which branch a turn took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Direct,
    Sql,
}

/// Check that `to` may follow `from`.
pub fn is_valid_transition(from: Node, to: Node) -> bool {
    matches!(
        (from, to),
        (Node::Start, Node::ClassifySqlNeeded)
            | (Node::Start, Node::Respond)
            | (Node::ClassifySqlNeeded, Node::GenerateSql)
            | (Node::ClassifySqlNeeded, Node::Respond)
            | (Node::GenerateSql, Node::ExecuteSql)
            | (Node::ExecuteSql, Node::Respond)
            | (Node::Respond, Node::End)
    )
}

/// Result of one routed turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub answer: String,
    pub route: Route,
    /// Nodes visited, `Start` through `End`.
    pub path: Vec<Node>,
    /// Statement used this turn, if any.
    pub sql_query: Option<String>,
    pub sql_status: Option<SqlStatus>,
}

/// Sequences the pipeline steps over one `ConversationState`.
///
/// Model, retriever and database are injected so the machine runs against
/// fakes in tests.
pub struct Router {
    classifier: SqlClassifier,
    generator: SqlGenerator,
    executor: SqlExecutor,
    responder: Responder,
    sql_enabled: bool,
}

impl Router {
    pub fn new(
        config: &SqlRagConfig,
        model: Option<Arc<dyn LanguageModel>>,
        retriever: Arc<dyn Retriever>,
        db: Database,
    ) -> Self {
        Self {
            classifier: SqlClassifier::new(model.clone(), &config.routing.extra_keywords),
            generator: SqlGenerator::new(model.clone(), retriever, config.retrieval.top_k),
            executor: SqlExecutor::new(db),
            responder: Responder::new(model, config.routing.history_messages),
            sql_enabled: config.routing.sql_enabled,
        }
    }

    /// Run one turn for the message most recently appended to `state`.
    pub async fn run_turn(&self, state: &mut ConversationState) -> TurnOutcome {
        let mut node = Node::Start;
        let mut path = Vec::new();
        let mut answer = String::new();

        loop {
            path.push(node);
            let next = match node {
                Node::Start => {
                    state.begin_turn();
                    if self.sql_enabled {
                        Node::ClassifySqlNeeded
                    } else {
                        Node::Respond
                    }
                }
                Node::ClassifySqlNeeded => {
                    state.turn.sql_needed = self.classifier.classify(state).await;
                    if state.turn.sql_needed {
                        Node::GenerateSql
                    } else {
                        Node::Respond
                    }
                }
                Node::GenerateSql => {
                    if let Err(e) = self.generator.generate(state).await {
                        debug!(error = %e, "Continuing to executor without a statement");
                    }
                    Node::ExecuteSql
                }
                Node::ExecuteSql => {
                    self.executor.execute_state(state);
                    Node::Respond
                }
                Node::Respond => {
                    answer = self.responder.respond(state).await;
                    Node::End
                }
                Node::End => break,
            };

            debug_assert!(is_valid_transition(node, next));
            debug!(from = ?node, to = ?next, "Router transition");
            node = next;
        }

        let route = if path.contains(&Node::GenerateSql) {
            Route::Sql
        } else {
            Route::Direct
        };
        info!(route = ?route, sql_status = ?state.turn.sql_status, "Turn complete");

        TurnOutcome {
            answer,
            route,
            path,
            sql_query: Some(state.turn.sql_query.clone()).filter(|q| !q.is_empty()),
            sql_status: state.turn.sql_status,
        }
    }
}
