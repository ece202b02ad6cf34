//! Migration status report
//!
//! Joins the catalog with the store without changing either.

use serde::Serialize;

use crate::database::{AppliedMigrationRecord, SchemaManager, SchemaStatus};
use crate::error::MigrateResult;
use crate::migration::engine::MigrationEngine;

/// State of one migration as seen from disk and store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationState {
    /// On disk, not recorded
    Pending,
    /// On disk and recorded
    Applied,
    /// Recorded, but its apply script is gone
    Missing,
}

impl std::fmt::Display for MigrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationState::Pending => write!(f, "pending"),
            MigrationState::Applied => write!(f, "applied"),
            MigrationState::Missing => write!(f, "missing"),
        }
    }
}

/// One row of the status report
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatusEntry {
    pub name: String,
    pub state: MigrationState,
    pub reversible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<AppliedMigrationRecord>,
}

/// Full status report
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatusReport {
    pub table_initialized: bool,
    pub entries: Vec<MigrationStatusEntry>,
    /// Revert scripts without an apply script
    pub orphan_revert_scripts: Vec<String>,
}

impl MigrationStatusReport {
    pub fn count(&self, state: MigrationState) -> usize {
        self.entries.iter().filter(|e| e.state == state).count()
    }
}

impl MigrationEngine<'_> {
    /// Report catalog migrations in order, then recorded ones missing on disk
    pub fn status(&self) -> MigrateResult<MigrationStatusReport> {
        let catalog = self.catalog();
        let migrations = catalog.scan()?;

        let table_initialized = SchemaManager::new(&self.context().db.conn).check_status()?
            != SchemaStatus::NotInitialized;
        let mut records: Vec<AppliedMigrationRecord> = if table_initialized {
            self.store().all_applied()?
        } else {
            Vec::new()
        };

        let mut entries = Vec::with_capacity(migrations.len());
        for migration in migrations {
            let record = records
                .iter()
                .position(|r| r.name == migration.name)
                .map(|i| records.remove(i));
            entries.push(MigrationStatusEntry {
                state: if record.is_some() {
                    MigrationState::Applied
                } else {
                    MigrationState::Pending
                },
                reversible: migration.is_reversible(),
                name: migration.name,
                record,
            });
        }

        for record in records {
            entries.push(MigrationStatusEntry {
                name: record.name.clone(),
                state: MigrationState::Missing,
                reversible: catalog.revert_script(&record.name).is_some(),
                record: Some(record),
            });
        }

        Ok(MigrationStatusReport {
            table_initialized,
            entries,
            orphan_revert_scripts: catalog.orphan_revert_scripts()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseConn;
    use crate::migration::MigrationContext;
    use std::fs;

    #[test]
    fn test_status_before_install() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1_a.up.sql"), "CREATE TABLE a (id INTEGER);").unwrap();

        let db = DatabaseConn::open_in_memory().unwrap();
        let engine = MigrationEngine::new(MigrationContext::new(&db, dir.path()));
        let report = engine.status().unwrap();

        assert!(!report.table_initialized);
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].state, MigrationState::Pending);
        assert!(!report.entries[0].reversible);
        // status does not create the table
        assert!(!db.table_exists("migrations").unwrap());
    }

    #[test]
    fn test_status_states() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1_a.up.sql"), "CREATE TABLE a (id INTEGER);").unwrap();
        fs::write(dir.path().join("1_a.down.sql"), "DROP TABLE a;").unwrap();
        fs::write(dir.path().join("2_b.up.sql"), "CREATE TABLE b (id INTEGER);").unwrap();
        fs::write(dir.path().join("9_orphan.down.sql"), "").unwrap();

        let db = DatabaseConn::open_in_memory().unwrap();
        let engine = MigrationEngine::new(MigrationContext::new(&db, dir.path()));
        engine.run().unwrap();
        fs::write(dir.path().join("3_c.up.sql"), "").unwrap();
        fs::remove_file(dir.path().join("2_b.up.sql")).unwrap();

        let report = engine.status().unwrap();
        let rows: Vec<(&str, MigrationState)> = report
            .entries
            .iter()
            .map(|e| (e.name.as_str(), e.state))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("1_a", MigrationState::Applied),
                ("3_c", MigrationState::Pending),
                ("2_b", MigrationState::Missing),
            ]
        );
        assert!(report.entries[0].reversible);
        assert!(report.entries[0].record.is_some());
        assert_eq!(report.count(MigrationState::Applied), 1);
        assert_eq!(report.orphan_revert_scripts, vec!["9_orphan"]);
    }
}
