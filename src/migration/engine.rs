//! Migration engine
//!
//! Reconciles the catalog against the store: `run` applies every pending
//! migration in order, `rollback` reverts the most recently applied ones.
//! Every command stops at the first failure and returns it to the caller.
//!
//! # Transactions
//!
//! By default each migration unit (script plus store update) runs inside one
//! transaction, so a failing script leaves neither partial changes nor a
//! record behind. Scripts that cannot run inside a transaction (`VACUUM`, or
//! scripts with their own `BEGIN`/`COMMIT`) need
//! [`MigrationEngine::with_transactions`]`(false)`. In that mode a script is
//! executed first and recorded afterwards; a multi-statement script that
//! fails halfway stays half-applied and has to be repaired by hand.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::database::MigrationRepository;
use crate::error::{MigrateError, MigrateResult, StoreError};
use crate::migration::catalog::MigrationCatalog;
use crate::migration::MigrationContext;

// =============================================================================
// Progress Tracking Types
// =============================================================================

/// Progress events emitted as each migration step completes
#[derive(Debug, Clone, Serialize)]
pub enum MigrationProgress {
    /// An apply script ran and was recorded
    Applied { name: String, path: PathBuf },
    /// A revert script ran and its record was removed
    Reverted { name: String, path: PathBuf },
    /// A rollback target has no revert script and stays applied
    SkippedIrreversible { name: String },
}

/// Type alias for progress callback function
pub type MigrationProgressCallback = Arc<dyn Fn(MigrationProgress) + Send + Sync>;

/// Records progress events for callers that report after the command ends
///
/// Steps completed before a failure are committed, so they are kept here
/// even when `run` or `rollback` returns an error.
#[derive(Clone, Default)]
pub struct ProgressLog {
    events: Arc<Mutex<Vec<MigrationProgress>>>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A callback that appends every event to this log
    pub fn callback(&self) -> MigrationProgressCallback {
        let events = Arc::clone(&self.events);
        Arc::new(move |event| {
            if let Ok(mut events) = events.lock() {
                events.push(event);
            }
        })
    }

    /// Events recorded so far, oldest first
    pub fn events(&self) -> Vec<MigrationProgress> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

// =============================================================================
// Reports
// =============================================================================

/// One completed migration step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationStep {
    pub name: String,
    /// The script that was executed
    pub path: PathBuf,
}

/// Result of `install`
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub directory: PathBuf,
    pub directory_created: bool,
}

/// Result of `run`
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Migrations applied by this run, in order
    pub applied: Vec<MigrationStep>,
    /// Number of migrations that were already applied
    pub skipped: usize,
}

/// Result of `rollback`
#[derive(Debug, Clone, Default, Serialize)]
pub struct RollbackReport {
    /// Migrations reverted by this rollback, newest first
    pub reverted: Vec<MigrationStep>,
    /// Targets left applied because they have no revert script
    pub irreversible: Vec<String>,
}

// =============================================================================
// Engine
// =============================================================================

/// Applies and reverts migrations for one context
pub struct MigrationEngine<'a> {
    ctx: MigrationContext<'a>,
    transactional: bool,
    progress: Option<MigrationProgressCallback>,
}

impl<'a> MigrationEngine<'a> {
    pub fn new(ctx: MigrationContext<'a>) -> Self {
        Self {
            ctx,
            transactional: true,
            progress: None,
        }
    }

    /// Enable or disable the per-migration transaction
    pub fn with_transactions(mut self, enabled: bool) -> Self {
        self.transactional = enabled;
        self
    }

    /// Receive a [`MigrationProgress`] event after each step
    pub fn with_progress(mut self, callback: MigrationProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn context(&self) -> &MigrationContext<'a> {
        &self.ctx
    }

    pub fn catalog(&self) -> MigrationCatalog {
        MigrationCatalog::new(&self.ctx.migrations_dir)
    }

    pub fn store(&self) -> MigrationRepository<'a> {
        MigrationRepository::new(&self.ctx.db.conn)
    }

    /// Create the migrations directory and state table if missing
    pub fn install(&self) -> MigrateResult<InstallReport> {
        let directory = self.ctx.migrations_dir.clone();
        let directory_created = if directory.is_dir() {
            false
        } else {
            fs::create_dir_all(&directory).map_err(|source| MigrateError::Io {
                path: directory.clone(),
                source,
            })?;
            info!("created migrations directory {}", directory.display());
            true
        };

        self.store().ensure_schema()?;
        info!("migrations table is ready");

        Ok(InstallReport {
            directory,
            directory_created,
        })
    }

    /// Apply all pending migrations in ascending order
    ///
    /// Already applied migrations are skipped silently. The first failure
    /// stops the run; migrations after it are not attempted.
    pub fn run(&self) -> MigrateResult<RunReport> {
        let store = self.store();
        store.ensure_schema()?;
        let migrations = self.catalog().scan()?;

        let mut report = RunReport::default();
        for migration in &migrations {
            if store.is_applied(&migration.name)? {
                debug!("migration {} already applied", migration.name);
                report.skipped += 1;
                continue;
            }

            let sql = read_script(&migration.apply_path)?;
            self.execute_unit(&migration.name, &migration.apply_path, &sql, |store| {
                store.record_applied(&migration.name)
            })?;

            info!("applied migration {}", migration.name);
            let step = MigrationStep {
                name: migration.name.clone(),
                path: migration.apply_path.clone(),
            };
            self.notify(MigrationProgress::Applied {
                name: step.name.clone(),
                path: step.path.clone(),
            });
            report.applied.push(step);
        }

        Ok(report)
    }

    /// Revert up to `steps` of the most recently applied migrations
    ///
    /// Targets are processed newest first. One without a revert script is
    /// skipped and stays applied; a failing revert script stops the batch.
    pub fn rollback(&self, steps: usize) -> MigrateResult<RollbackReport> {
        if steps == 0 {
            return Err(MigrateError::Usage(
                "rollback step count must be a positive integer".to_string(),
            ));
        }

        let store = self.store();
        store.ensure_schema()?;
        let catalog = self.catalog();
        let batch = store.recent_applied(steps)?;
        debug!("rollback batch: {} of {} requested", batch.len(), steps);

        let mut report = RollbackReport::default();
        for record in batch {
            let Some(path) = catalog.revert_script(&record.name) else {
                warn!(
                    "migration {} has no revert script, leaving it applied",
                    record.name
                );
                self.notify(MigrationProgress::SkippedIrreversible {
                    name: record.name.clone(),
                });
                report.irreversible.push(record.name);
                continue;
            };

            let sql = read_script(&path)?;
            self.execute_unit(&record.name, &path, &sql, |store| {
                store.record_reverted(&record.name).map(|_| ())
            })?;

            info!("reverted migration {}", record.name);
            self.notify(MigrationProgress::Reverted {
                name: record.name.clone(),
                path: path.clone(),
            });
            report.reverted.push(MigrationStep {
                name: record.name,
                path,
            });
        }

        Ok(report)
    }

    /// Run a script and the matching store update as one unit
    fn execute_unit<F>(&self, name: &str, path: &Path, sql: &str, record: F) -> MigrateResult<()>
    where
        F: FnOnce(&MigrationRepository<'_>) -> Result<(), StoreError>,
    {
        let execution_err = |source| MigrateError::Execution {
            name: name.to_string(),
            path: path.to_path_buf(),
            source,
        };

        if !self.transactional {
            self.ctx.db.execute_batch(sql).map_err(execution_err)?;
            record(&self.store())?;
            return Ok(());
        }

        let tx = self.ctx.db.transaction().map_err(execution_err)?;
        tx.execute_batch(sql).map_err(execution_err)?;
        record(&MigrationRepository::new(&tx))?;
        tx.commit().map_err(execution_err)?;
        Ok(())
    }

    fn notify(&self, event: MigrationProgress) {
        if let Some(ref cb) = self.progress {
            cb(event);
        }
    }
}

fn read_script(path: &Path) -> MigrateResult<String> {
    fs::read_to_string(path).map_err(|source| MigrateError::Io {
        path: path.to_path_buf(),
        source,
    })
}
