//! Database connection management
//!
//! This module provides the core database connection wrapper used by the
//! migration store and engine.

use anyhow::{anyhow, Result};
use rusqlite::Connection;

/// Core database connection wrapper
///
/// `DatabaseConn` provides a thin wrapper around SQLite connections,
/// handling both file-based and in-memory databases with consistent
/// configuration and error handling. The caller owns the connection;
/// migration components only ever borrow it.
pub struct DatabaseConn {
    pub conn: Connection,
}

impl DatabaseConn {
    /// Open a database at the specified path
    ///
    /// If the path is `None`, an in-memory database is created.
    pub fn open(path: Option<&str>) -> Result<Self> {
        let conn = match path {
            Some(p) => Connection::open(p)
                .map_err(|e| anyhow!("Failed to open database at '{}': {}", p, e))?,
            None => Connection::open_in_memory()
                .map_err(|e| anyhow!("Failed to create in-memory database: {}", e))?,
        };

        let db = DatabaseConn { conn };
        db.configure()?;
        Ok(db)
    }

    /// Open a database at the specified path (convenience method)
    pub fn open_path(path: &str) -> Result<Self> {
        Self::open(Some(path))
    }

    /// Create an in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::open(None)
    }

    /// Configure the connection
    ///
    /// Migration scripts routinely declare foreign keys, so enforcement is on.
    /// A busy timeout keeps a briefly locked file from failing the command.
    fn configure(&self) -> Result<()> {
        self.conn
            .execute("PRAGMA foreign_keys=ON", [])
            .map_err(|e| anyhow!("Failed to enable foreign keys: {}", e))?;

        self.conn
            .busy_timeout(std::time::Duration::from_secs(5))
            .map_err(|e| anyhow!("Failed to set busy timeout: {}", e))?;

        Ok(())
    }

    /// Execute a batch of SQL statements separated by semicolons
    ///
    /// Migration scripts are passed through verbatim, so the raw driver
    /// error is returned for the engine to attach migration context to.
    pub fn execute_batch(&self, sql: &str) -> rusqlite::Result<()> {
        self.conn.execute_batch(sql)
    }

    /// Begin an unchecked transaction
    ///
    /// The transaction rolls back when dropped without `commit()`.
    pub fn transaction(&self) -> rusqlite::Result<rusqlite::Transaction<'_>> {
        self.conn.unchecked_transaction()
    }

    /// Check if a table exists in the database
    pub fn table_exists(&self, table_name: &str) -> Result<bool> {
        let count: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [table_name],
                |row| row.get(0),
            )
            .map_err(|e| anyhow!("Failed to check table existence: {}", e))?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = DatabaseConn::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_open_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.sqlite3");
        let db = DatabaseConn::open_path(path.to_str().unwrap()).unwrap();
        db.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_execute_batch() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.execute_batch(
            "CREATE TABLE a (id INTEGER PRIMARY KEY);
             CREATE TABLE b (id INTEGER PRIMARY KEY);
             INSERT INTO a (id) VALUES (1), (2);",
        )
        .unwrap();

        assert!(db.table_exists("a").unwrap());
        assert!(db.table_exists("b").unwrap());
        let rows: i64 = db
            .conn
            .query_row("SELECT COUNT(*) FROM a", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 2);
    }

    #[test]
    fn test_transaction_rolls_back_on_drop() {
        let db = DatabaseConn::open_in_memory().unwrap();
        {
            let tx = db.transaction().unwrap();
            tx.execute_batch("CREATE TABLE dropped (id INTEGER)").unwrap();
        }
        assert!(!db.table_exists("dropped").unwrap());
    }

    #[test]
    fn test_table_exists() {
        let db = DatabaseConn::open_in_memory().unwrap();
        db.execute_batch("CREATE TABLE test_table (id INTEGER PRIMARY KEY)")
            .unwrap();

        assert!(db.table_exists("test_table").unwrap());
        assert!(!db.table_exists("nonexistent_table").unwrap());
    }
}
