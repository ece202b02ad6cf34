//! Error types for migration operations
//!
//! The core (catalog, store, engine, authoring) reports failures as
//! [`MigrateError`] so the caller can decide how to surface them. Outer
//! layers such as configuration loading and connection bootstrap keep using
//! `anyhow`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for migration operations
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Errors raised by the migration store
#[derive(Debug, Error)]
pub enum StoreError {
    /// A query against the `migrations` table failed
    #[error("failed to {operation} migration state{}", name_suffix(.name))]
    Query {
        operation: &'static str,
        name: Option<String>,
        #[source]
        source: rusqlite::Error,
    },

    /// The unique constraint on the migration name was violated
    #[error("migration '{name}' is already recorded as applied")]
    DuplicateName { name: String },
}

fn name_suffix(name: &Option<String>) -> String {
    match name {
        Some(n) => format!(" for '{}'", n),
        None => String::new(),
    }
}

impl StoreError {
    pub(crate) fn query(operation: &'static str, source: rusqlite::Error) -> Self {
        StoreError::Query {
            operation,
            name: None,
            source,
        }
    }

    pub(crate) fn query_for(operation: &'static str, name: &str, source: rusqlite::Error) -> Self {
        StoreError::Query {
            operation,
            name: Some(name.to_string()),
            source,
        }
    }
}

/// Errors raised by migration commands
#[derive(Debug, Error)]
pub enum MigrateError {
    /// The migrations directory could not be listed
    #[error("unable to read migrations directory '{}'", .path.display())]
    Catalog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading or writing the migration state failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A script file could not be read or created
    #[error("unable to access '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The database rejected a migration script
    #[error("migration '{name}' failed ({})", .path.display())]
    Execution {
        name: String,
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// An argument reached the core in an unusable form
    #[error("{0}")]
    Usage(String),
}

impl MigrateError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            MigrateError::Usage(_) => 2,
            _ => 1,
        }
    }
}
