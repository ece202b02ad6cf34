use std::sync::Arc;

use clap::Args;
use migrator::{
    MigrationContext, MigrationEngine, MigrationProgress, MigratorConfig, OutputFormat,
    ProgressLog,
};

/// Arguments for the Run command
#[derive(Args)]
pub struct RunArgs {
    /// Run scripts without wrapping each migration in a transaction
    #[clap(long)]
    pub no_transaction: bool,
}

pub fn run(config: &MigratorConfig, args: RunArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let db = super::open_database(config)?;
    let engine = MigrationEngine::new(MigrationContext::new(&db, &config.migrations_dir))
        .with_transactions(config.transactional && !args.no_transaction);

    if !output_format.is_json() {
        // Plain output reports each migration as soon as it is applied
        let engine = engine.with_progress(Arc::new(|progress: MigrationProgress| {
            if let MigrationProgress::Applied { path, .. } = progress {
                println!("Migrate: {}", path.display());
            }
        }));
        engine.run()?;
        return Ok(());
    }

    let log = ProgressLog::new();
    let engine = engine.with_progress(log.callback());
    match engine.run() {
        Ok(report) => println!("{}", output_format.to_json(&report)?),
        Err(e) => {
            super::print_completed(&log, output_format)?;
            return Err(e.into());
        }
    }
    Ok(())
}
