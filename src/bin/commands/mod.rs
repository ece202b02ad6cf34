pub mod config;
pub mod create;
pub mod install;
pub mod rollback;
pub mod run;
pub mod status;

use std::path::Path;

use migrator::database::ensure_parent_dir;
use migrator::{DatabaseConn, MigrationProgress, MigratorConfig, OutputFormat, ProgressLog};
use serde::Serialize;

/// Open the configured database, creating its directory if needed
pub(crate) fn open_database(config: &MigratorConfig) -> anyhow::Result<DatabaseConn> {
    let path = config.sqlite_path();
    ensure_parent_dir(path)?;
    DatabaseConn::open_path(path)
}

/// Open the configured database only if the file already exists
pub(crate) fn open_existing_database(
    config: &MigratorConfig,
) -> anyhow::Result<Option<DatabaseConn>> {
    let path = config.sqlite_path();
    if !Path::new(path).is_file() {
        return Ok(None);
    }
    DatabaseConn::open_path(path).map(Some)
}

#[derive(Serialize)]
struct CompletedSteps {
    completed: Vec<MigrationProgress>,
}

/// Print the steps that finished before a command failed
///
/// Those steps are committed, so JSON consumers still get a record of them.
pub(crate) fn print_completed(log: &ProgressLog, output_format: OutputFormat) -> anyhow::Result<()> {
    let completed = CompletedSteps {
        completed: log.events(),
    };
    println!("{}", output_format.to_json(&completed)?);
    Ok(())
}
