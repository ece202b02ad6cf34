//! Migration state repository
//!
//! This module provides data access operations for the `migrations` table.
//! A row exists for a name exactly while that migration is applied.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, ErrorCode};
use serde::Serialize;
use tracing::debug;

use crate::database::core::SchemaManager;
use crate::error::StoreError;

/// Repository for applied-migration records
///
/// Borrows a connection (or a transaction, which derefs to one) so that
/// store updates can share a transaction with the script they record.
pub struct MigrationRepository<'a> {
    conn: &'a Connection,
}

/// A record from the migrations table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigrationRecord {
    /// Surrogate identifier assigned by the store, increasing with each insert
    pub id: i64,
    pub name: String,
    /// Unix timestamp (seconds) of when the record was created
    pub applied_at: i64,
}

impl AppliedMigrationRecord {
    /// Application time as an RFC3339 string
    pub fn applied_at_rfc3339(&self) -> String {
        DateTime::<Utc>::from_timestamp(self.applied_at, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| self.applied_at.to_string())
    }
}

impl<'a> MigrationRepository<'a> {
    /// Create a new migration repository
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create the backing table if it does not exist
    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        SchemaManager::new(self.conn).initialize()
    }

    /// Check whether a migration is currently recorded as applied
    pub fn is_applied(&self, name: &str) -> Result<bool, StoreError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::query_for("check", name, e))?;
        Ok(count > 0)
    }

    /// Record a migration as applied
    ///
    /// A name that is already present fails with [`StoreError::DuplicateName`].
    pub fn record_applied(&self, name: &str) -> Result<(), StoreError> {
        match self
            .conn
            .execute("INSERT INTO migrations (name) VALUES (?1)", [name])
        {
            Ok(_) => {
                debug!("recorded migration {} as applied", name);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DuplicateName {
                    name: name.to_string(),
                })
            }
            Err(e) => Err(StoreError::query_for("record", name, e)),
        }
    }

    /// Remove the record for a migration
    ///
    /// Returns the number of rows removed. Removing a name that is not
    /// recorded is not an error.
    pub fn record_reverted(&self, name: &str) -> Result<usize, StoreError> {
        let removed = self
            .conn
            .execute("DELETE FROM migrations WHERE name = ?1", [name])
            .map_err(|e| StoreError::query_for("remove", name, e))?;
        if removed == 0 {
            debug!("no record to remove for migration {}", name);
        }
        Ok(removed)
    }

    /// Get up to `limit` most recently applied records, newest first
    pub fn recent_applied(&self, limit: usize) -> Result<Vec<AppliedMigrationRecord>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.query_records(
            "SELECT id, name, created_at FROM migrations ORDER BY id DESC LIMIT ?1",
            [limit],
        )
    }

    /// Get all applied records, oldest first
    pub fn all_applied(&self) -> Result<Vec<AppliedMigrationRecord>, StoreError> {
        self.query_records(
            "SELECT id, name, created_at FROM migrations ORDER BY id ASC",
            rusqlite::params![],
        )
    }

    /// Get the number of applied migrations
    pub fn count(&self) -> Result<u64, StoreError> {
        self.conn
            .query_row("SELECT COUNT(*) FROM migrations", [], |row| row.get(0))
            .map_err(|e| StoreError::query("count", e))
    }

    fn query_records<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<AppliedMigrationRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| StoreError::query("list", e))?;

        let rows = stmt
            .query_map(params, |row| {
                Ok(AppliedMigrationRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    applied_at: row.get(2)?,
                })
            })
            .map_err(|e| StoreError::query("list", e))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::query("list", e))
    }
}
