//! Database connection management.
//!
//! The Chinook database is a fixed on-disk file. Connections are opened per
//! call and closed before the call returns, so no handle outlives a turn.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, warn};

use crate::error::SqlExecutionError;

/// Handle to the fixed SQLite database file.
///
/// Holds only the path. Every access goes through [`Database::with_conn`],
/// which owns the connection for the duration of one closure.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    /// Point at a database file. Nothing is opened yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Open a read/write connection without creating the file.
    ///
    /// A missing file is reported as `Unexpected` instead of silently
    /// producing an empty database.
    fn open(&self) -> Result<Connection, SqlExecutionError> {
        if !self.exists() {
            return Err(SqlExecutionError::Unexpected(format!(
                "database file not found at {}",
                self.path.display()
            )));
        }

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Connection::open_with_flags(&self.path, flags).map_err(|e| {
            SqlExecutionError::Unexpected(format!(
                "failed to open database at {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Execute a closure against a fresh connection.
    ///
    /// The connection is closed after the closure returns, on the success
    /// and the error path alike.
    pub fn with_conn<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<SqlExecutionError>,
    {
        let conn = self.open()?;
        debug!(path = %self.path.display(), "Database connection opened");

        let result = f(&conn);

        if let Err((_, e)) = conn.close() {
            warn!(path = %self.path.display(), error = %e, "Database connection close failed");
        }

        result
    }
}
