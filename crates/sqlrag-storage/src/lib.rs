//! sqlrag storage crate - access to the Chinook SQLite database.
//!
//! Pulls SQL statements out of free text, executes them against the fixed
//! database file, renders result sets as fixed-width text tables, and
//! extracts the schema that seeds the retrieval knowledge base.

pub mod db;
pub mod error;
pub mod executor;
pub mod extractor;
pub mod fixtures;
pub mod render;
pub mod schema;

pub use db::Database;
pub use error::SqlExecutionError;
pub use executor::{ExecutionResult, SqlExecutor};
pub use extractor::extract_sql;
pub use render::{normalize_result, render_table};
pub use schema::{extract_schema, extract_schema_chunks, format_schema_chunk, TableSchema};
