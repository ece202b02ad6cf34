use std::sync::Arc;

use clap::Args;
use migrator::{
    MigrationContext, MigrationEngine, MigrationProgress, MigratorConfig, OutputFormat,
    ProgressLog,
};

/// Arguments for the Rollback command
#[derive(Args)]
pub struct RollbackArgs {
    /// Number of most recently applied migrations to revert
    #[clap(value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub steps: u32,

    /// Run scripts without wrapping each migration in a transaction
    #[clap(long)]
    pub no_transaction: bool,
}

pub fn run(
    config: &MigratorConfig,
    args: RollbackArgs,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let db = super::open_database(config)?;
    let engine = MigrationEngine::new(MigrationContext::new(&db, &config.migrations_dir))
        .with_transactions(config.transactional && !args.no_transaction);
    let steps = args.steps as usize;

    if !output_format.is_json() {
        let engine = engine.with_progress(Arc::new(|progress: MigrationProgress| match progress {
            MigrationProgress::Reverted { path, .. } => {
                println!("Rollback: {}", path.display());
            }
            MigrationProgress::SkippedIrreversible { name } => {
                eprintln!("Skip: {} has no revert script", name);
            }
            MigrationProgress::Applied { .. } => {}
        }));
        engine.rollback(steps)?;
        return Ok(());
    }

    let log = ProgressLog::new();
    let engine = engine.with_progress(log.callback());
    match engine.rollback(steps) {
        Ok(report) => println!("{}", output_format.to_json(&report)?),
        Err(e) => {
            super::print_completed(&log, output_format)?;
            return Err(e.into());
        }
    }
    Ok(())
}
