//! Migration catalog, engine and authoring
//!
//! # Layout
//!
//! ```text
//! migrations/
//! ├── 1700000000_add_users.up.sql     # apply script
//! └── 1700000000_add_users.down.sql   # revert script (optional)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use migrator::database::DatabaseConn;
//! use migrator::migration::{MigrationContext, MigrationEngine};
//!
//! let db = DatabaseConn::open_path("migrator.sqlite3")?;
//! let engine = MigrationEngine::new(MigrationContext::new(&db, "migrations"));
//!
//! engine.install()?;
//! for step in engine.run()?.applied {
//!     println!("Migrate: {}", step.path.display());
//! }
//!
//! // revert the two most recent migrations
//! engine.rollback(2)?;
//! ```

pub mod authoring;
pub mod catalog;
pub mod engine;
pub mod status;

use std::path::PathBuf;

use crate::database::DatabaseConn;

pub use authoring::{create_migration, create_migration_at, CreatedMigration};
pub use catalog::{MigrationCatalog, MigrationDefinition, APPLY_SUFFIX, REVERT_SUFFIX};
pub use engine::{
    InstallReport, MigrationEngine, MigrationProgress, MigrationProgressCallback, MigrationStep,
    ProgressLog, RollbackReport, RunReport,
};
pub use status::{MigrationState, MigrationStatusEntry, MigrationStatusReport};

/// Everything a migration command operates on
///
/// The connection is borrowed for the whole command and never closed here.
pub struct MigrationContext<'a> {
    pub db: &'a DatabaseConn,
    /// Directory holding the `.up.sql` / `.down.sql` scripts
    pub migrations_dir: PathBuf,
}

impl<'a> MigrationContext<'a> {
    pub fn new(db: &'a DatabaseConn, migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            db,
            migrations_dir: migrations_dir.into(),
        }
    }
}
