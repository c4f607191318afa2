//! Single-shot statement execution against the fixed database.

use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection};
use serde::Serialize;
use tracing::{debug, info, warn};

use sqlrag_core::{ConversationState, SqlStatus};

use crate::db::Database;
use crate::error::SqlExecutionError;
use crate::extractor::extract_sql;
use crate::render::{normalize_result, render_table, NO_RESULTS_TEXT};

/// Structured outcome of one execution.
///
/// On success `results` is the rendered table and `sql_output` its annotated
/// copy. On error both carry the error description.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub status: SqlStatus,
    pub results: String,
    pub sql_query: String,
    pub row_count: usize,
    pub sql_output: String,
    #[serde(skip)]
    pub error: Option<SqlExecutionError>,
}

impl ExecutionResult {
    fn success(sql_query: &str, results: String, row_count: usize) -> Self {
        let sql_output = normalize_result(&results);
        Self {
            status: SqlStatus::Success,
            results,
            sql_query: sql_query.to_string(),
            row_count,
            sql_output,
            error: None,
        }
    }

    fn failure(sql_query: &str, error: SqlExecutionError) -> Self {
        let text = error.to_string();
        Self {
            status: SqlStatus::Error,
            results: text.clone(),
            sql_query: sql_query.to_string(),
            row_count: 0,
            sql_output: text,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SqlStatus::Success
    }
}

/// Runs statements against the Chinook database, one attempt each.
#[derive(Debug, Clone)]
pub struct SqlExecutor {
    db: Database,
}

impl SqlExecutor {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Execute `sql` exactly once and render the outcome.
    ///
    /// A blank statement fails with `EmptyQuery` before any connection is
    /// opened.
    pub fn execute(&self, sql: &str) -> ExecutionResult {
        let sql = sql.trim();
        if sql.is_empty() {
            warn!("Executor called without a statement");
            return ExecutionResult::failure(sql, SqlExecutionError::EmptyQuery);
        }

        debug!(sql = %sql, "Executing SQL");
        match self.db.with_conn(|conn| run_statement(conn, sql)) {
            Ok((results, row_count)) => {
                info!(row_count, "SQL executed");
                ExecutionResult::success(sql, results, row_count)
            }
            Err(e) => {
                warn!(error = %e, sql = %sql, "SQL execution failed");
                ExecutionResult::failure(sql, e)
            }
        }
    }

    /// Execute the turn's statement and fold the outcome into `state`.
    ///
    /// Uses `turn.sql_query` when present. Otherwise, unless the generator
    /// already failed this turn, a statement is extracted from the latest
    /// message. Errors are appended to the transcript as system notes.
    pub fn execute_state(&self, state: &mut ConversationState) -> ExecutionResult {
        let query = if !state.turn.sql_query.trim().is_empty() {
            state.turn.sql_query.clone()
        } else if state.turn.generation_failed {
            String::new()
        } else {
            state
                .latest_message()
                .map(|m| extract_sql(m.content()))
                .unwrap_or_default()
        };

        let result = self.execute(&query);

        state.turn.sql_query = result.sql_query.clone();
        state.turn.sql_status = Some(result.status);
        state.turn.row_count = result.row_count;

        match &result.error {
            None => {
                state.turn.sql_output = result.sql_output.clone();
            }
            Some(SqlExecutionError::EmptyQuery) => {
                state.push_system_note(result.results.clone());
            }
            Some(_) => {
                state.turn.sql_output = result.sql_output.clone();
                state.push_system_note(result.results.clone());
            }
        }

        result
    }
}

/// Prepare, run, and render one statement. Returns the text and row count.
///
/// Text holding more than one statement is rejected before anything runs.
fn run_statement(conn: &Connection, sql: &str) -> Result<(String, usize), SqlExecutionError> {
    let mut batch = Batch::new(conn, sql);
    let Some(mut stmt) = batch.next()? else {
        return Err(SqlExecutionError::EmptyQuery);
    };
    if batch.next()?.is_some() {
        return Err(SqlExecutionError::Database(
            "You can only execute one statement at a time.".to_string(),
        ));
    }

    if stmt.column_count() == 0 {
        let affected = stmt.execute([])?;
        debug!(affected, "Statement returned no rows");
        return Ok((NO_RESULTS_TEXT.to_string(), 0));
    }

    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let column_count = columns.len();

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut cells = Vec::with_capacity(column_count);
        for i in 0..column_count {
            cells.push(render_value(row.get_ref(i)?));
        }
        rows.push(cells);
    }

    let row_count = rows.len();
    Ok((render_table(&columns, &rows), row_count))
}

fn render_value(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => "NULL".to_string(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}
