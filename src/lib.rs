#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

//! Migrator - versioned SQL migrations for SQLite
//!
//! Migrator applies and reverts `<timestamp>_<label>.up.sql` /
//! `.down.sql` script pairs and records which ones are applied in a
//! `migrations` table. It can be used as both a command-line application
//! and a library.
//!
//! # Feature Flags
//!
//! | Feature | Description | Key Dependencies |
//! |---------|-------------|------------------|
//! | (none) | Catalog, store, engine, authoring | `rusqlite` |
//! | `display` | Table and relative-time rendering used by the binary's `status` | `tabled`, `chrono-humanize` |
//! | `cli` | The `migrator` binary | All above + `clap` |
//!
//! # Architecture
//!
//! - **[`database`]**: SQLite connection wrapper, `migrations` table schema
//!   and the [`MigrationRepository`] that records applied migrations
//! - **[`migration`]**: the file catalog, the engine (`install`, `run`,
//!   `rollback`, `status`) and migration authoring (`create`)
//! - **[`config`]**: configuration from TOML, `.env` and the environment
//! - **[`error`]**: the error taxonomy returned by every core operation
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use migrator::migration::create_migration;
//! use migrator::{DatabaseConn, MigrationContext, MigrationEngine};
//!
//! let db = DatabaseConn::open_path("migrator.sqlite3")?;
//! let engine = MigrationEngine::new(MigrationContext::new(&db, "migrations"));
//!
//! engine.install()?;
//! create_migration(Path::new("migrations"), "add_users")?;
//!
//! let report = engine.run()?;
//! for step in &report.applied {
//!     println!("Migrate: {}", step.path.display());
//! }
//!
//! let report = engine.rollback(1)?;
//! for step in &report.reverted {
//!     println!("Rollback: {}", step.path.display());
//! }
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod migration;
pub mod utils;

// =============================================================================
// Configuration
// =============================================================================

pub use config::MigratorConfig;

// =============================================================================
// Errors
// =============================================================================

pub use error::{MigrateError, MigrateResult, StoreError};

// =============================================================================
// Database Module
// =============================================================================

pub use database::{
    AppliedMigrationRecord, DatabaseConn, MigrationRepository, SchemaDefinitions, SchemaManager,
    SchemaStatus,
};

// =============================================================================
// Migration Module
// =============================================================================

pub use migration::{
    CreatedMigration, InstallReport, MigrationCatalog, MigrationContext, MigrationDefinition,
    MigrationEngine, MigrationProgress, MigrationProgressCallback, MigrationState,
    MigrationStatusEntry, MigrationStatusReport, MigrationStep, ProgressLog, RollbackReport,
    RunReport,
};

pub use utils::OutputFormat;
