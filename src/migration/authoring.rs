//! Migration scaffolding
//!
//! `create` writes an empty `<unix_timestamp>_<label>.up.sql` and matching
//! `.down.sql`. Both files are created or neither is: existing scripts are
//! never truncated, so creating the same label twice within one second fails
//! with [`std::io::ErrorKind::AlreadyExists`].

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{MigrateError, MigrateResult};
use crate::migration::catalog::{apply_path, revert_path};

/// The pair of files created for a new migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedMigration {
    pub name: String,
    pub apply_path: PathBuf,
    pub revert_path: PathBuf,
}

/// Create an empty migration pair stamped with the current time
pub fn create_migration(dir: &Path, label: &str) -> MigrateResult<CreatedMigration> {
    create_migration_at(dir, label, Utc::now().timestamp())
}

/// Create an empty migration pair with an explicit timestamp
pub fn create_migration_at(
    dir: &Path,
    label: &str,
    timestamp: i64,
) -> MigrateResult<CreatedMigration> {
    validate_label(label)?;

    let name = format!("{}_{}", timestamp, label);
    let apply = apply_path(dir, &name);
    let revert = revert_path(dir, &name);

    create_empty(&apply)?;
    if let Err(e) = create_empty(&revert) {
        if let Err(cleanup) = fs::remove_file(&apply) {
            warn!(
                "unable to remove {} after failed create: {}",
                apply.display(),
                cleanup
            );
        }
        return Err(e);
    }

    info!("created migration {}", name);
    Ok(CreatedMigration {
        name,
        apply_path: apply,
        revert_path: revert,
    })
}

/// Labels become part of a file name: ASCII letters, digits, `_` and `-` only
pub fn validate_label(label: &str) -> MigrateResult<()> {
    if label.is_empty() {
        return Err(MigrateError::Usage(
            "migration name must not be empty".to_string(),
        ));
    }
    if let Some(c) = label
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(MigrateError::Usage(format!(
            "migration name '{}' contains invalid character {:?}; use letters, digits, '_' or '-'",
            label, c
        )));
    }
    Ok(())
}

fn create_empty(path: &Path) -> MigrateResult<()> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| MigrateError::Io {
            path: path.to_path_buf(),
            source,
        })
}
