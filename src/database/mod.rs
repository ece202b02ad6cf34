//! Database module
//!
//! This module provides all database functionality for the migrator:
//!
//! - **core**: SQLite connection wrapper and the `migrations` table schema
//! - **store**: the repository recording which migrations are applied
//!
//! # Architecture
//!
//! ```text
//! database/
//! ├── core/           # Foundation
//! │   ├── connection  # SQLite DatabaseConn wrapper
//! │   └── schema      # migrations table definition and status
//! │
//! └── store           # Applied-migration records
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use migrator::database::{DatabaseConn, MigrationRepository};
//!
//! let db = DatabaseConn::open_path("migrator.sqlite3")?;
//! let store = MigrationRepository::new(&db.conn);
//! store.ensure_schema()?;
//!
//! if !store.is_applied("1700000000_add_users")? {
//!     // ...
//! }
//! ```

pub mod core;
mod store;

pub use core::{DatabaseConn, SchemaDefinitions, SchemaManager, SchemaStatus, MIGRATIONS_TABLE};
pub use store::{AppliedMigrationRecord, MigrationRepository};

/// Ensure the directory holding the database file exists
pub fn ensure_parent_dir(db_path: &str) -> anyhow::Result<()> {
    match std::path::Path::new(db_path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|e| {
                anyhow::anyhow!(
                    "Failed to create database directory '{}': {}",
                    parent.display(),
                    e
                )
            }),
        _ => Ok(()),
    }
}
