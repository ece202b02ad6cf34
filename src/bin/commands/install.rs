use migrator::{MigrationContext, MigrationEngine, MigratorConfig, OutputFormat};

pub fn run(config: &MigratorConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let db = super::open_database(config)?;
    let engine = MigrationEngine::new(MigrationContext::new(&db, &config.migrations_dir));
    let report = engine.install()?;

    if output_format.is_json() {
        println!("{}", output_format.to_json(&report)?);
        return Ok(());
    }

    if report.directory_created {
        println!("Create migration directory: {}", report.directory.display());
    }
    println!("Migrations table ready in {}", config.sqlite_path());
    Ok(())
}
