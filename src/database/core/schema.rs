//! Database schema management
//!
//! This module provides the definition of the `migrations` state table and
//! the manager that creates and inspects it.

use rusqlite::Connection;

use crate::error::StoreError;

/// Name of the table that records applied migrations
pub const MIGRATIONS_TABLE: &str = "migrations";

/// Schema definitions for the migration state
pub struct SchemaDefinitions;

impl SchemaDefinitions {
    /// SQL for creating the migrations table
    ///
    /// `created_at` holds unix seconds and is filled in by SQLite.
    pub const MIGRATIONS_TABLE: &'static str = r#"
        CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name VARCHAR(255) NOT NULL UNIQUE,
            created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );
    "#;

    /// Columns every usable migrations table must have
    pub const REQUIRED_COLUMNS: &'static [&'static str] = &["id", "name", "created_at"];
}

/// Schema manager for the migration state table
pub struct SchemaManager<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaManager<'a> {
    /// Create a new schema manager for the given connection
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create the migrations table if it does not exist
    pub fn initialize(&self) -> Result<(), StoreError> {
        self.conn
            .execute(SchemaDefinitions::MIGRATIONS_TABLE, [])
            .map_err(|e| StoreError::query("create table for", e))?;
        Ok(())
    }

    /// Check the current schema status
    pub fn check_status(&self) -> Result<SchemaStatus, StoreError> {
        let exists: i32 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [MIGRATIONS_TABLE],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::query("inspect", e))?;

        if exists == 0 {
            return Ok(SchemaStatus::NotInitialized);
        }

        let columns = self.columns()?;
        let missing: Vec<String> = SchemaDefinitions::REQUIRED_COLUMNS
            .iter()
            .filter(|c| !columns.iter().any(|have| have.as_str() == **c))
            .map(|c| c.to_string())
            .collect();

        if missing.is_empty() {
            Ok(SchemaStatus::Current)
        } else {
            Ok(SchemaStatus::Incompatible { missing })
        }
    }

    fn columns(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM pragma_table_info(?1)")
            .map_err(|e| StoreError::query("inspect", e))?;
        let rows = stmt
            .query_map([MIGRATIONS_TABLE], |row| row.get::<_, String>(0))
            .map_err(|e| StoreError::query("inspect", e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::query("inspect", e))
    }
}

/// Status of the migrations table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaStatus {
    /// The table has not been created yet
    NotInitialized,

    /// The table exists with the expected columns
    Current,

    /// A table with that name exists but lacks required columns
    Incompatible { missing: Vec<String> },
}
