//! Schema introspection for the knowledge base.
//!
//! Reads table, column and foreign-key metadata through SQLite's table-valued
//! pragmas and renders one text chunk per table.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sqlrag_core::SqlRagError;

use crate::db::Database;
use crate::error::SqlExecutionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub primary_key: bool,
    pub not_null: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub ref_table: String,
    pub ref_column: String,
}

/// Column and key layout of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    pub foreign_keys: Vec<ForeignKey>,
}

/// Read the layout of every user table, ordered by table name.
pub fn extract_schema(db: &Database) -> Result<Vec<TableSchema>, SqlRagError> {
    let tables = db.with_conn(|conn| -> Result<Vec<TableSchema>, SqlExecutionError> {
        let names = list_tables(conn)?;
        names.iter().map(|name| read_table(conn, name)).collect()
    })?;
    debug!(tables = tables.len(), "Schema extracted");
    Ok(tables)
}

/// Extract the schema and render one chunk per table.
pub fn extract_schema_chunks(db: &Database) -> Result<Vec<String>, SqlRagError> {
    Ok(extract_schema(db)?.iter().map(format_schema_chunk).collect())
}

/// Render a table layout as a knowledge-base chunk.
///
/// The `Foreign Keys:` section is omitted for tables without any.
pub fn format_schema_chunk(schema: &TableSchema) -> String {
    let mut lines = vec![format!("Table: {}", schema.table), "Columns:".to_string()];

    for col in &schema.columns {
        let mut line = format!("  - {} ({})", col.name, col.data_type);
        if col.primary_key {
            line.push_str(" [PK]");
        }
        if col.not_null {
            line.push_str(" [NOT NULL]");
        }
        lines.push(line);
    }

    if !schema.foreign_keys.is_empty() {
        lines.push("Foreign Keys:".to_string());
        for fk in &schema.foreign_keys {
            lines.push(format!(
                "  - {} → {}.{}",
                fk.column, fk.ref_table, fk.ref_column
            ));
        }
    }

    lines.join("\n")
}

fn list_tables(conn: &Connection) -> Result<Vec<String>, SqlExecutionError> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master
         WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

fn read_table(conn: &Connection, table: &str) -> Result<TableSchema, SqlExecutionError> {
    let mut stmt =
        conn.prepare("SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map([table], |row| {
            Ok(ColumnInfo {
                name: row.get(0)?,
                data_type: row.get(1)?,
                not_null: row.get::<_, i64>(2)? != 0,
                primary_key: row.get::<_, i64>(3)? != 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT \"from\", \"table\", \"to\" FROM pragma_foreign_key_list(?1) ORDER BY id, seq",
    )?;
    let foreign_keys = stmt
        .query_map([table], |row| {
            Ok(ForeignKey {
                column: row.get(0)?,
                ref_table: row.get(1)?,
                ref_column: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(TableSchema {
        table: table.to_string(),
        columns,
        foreign_keys,
    })
}
