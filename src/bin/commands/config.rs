use migrator::database::{MigrationRepository, SchemaManager, SchemaStatus};
use migrator::{MigratorConfig, OutputFormat};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ConfigInfo<'a> {
    config: &'a MigratorConfig,
    database_exists: bool,
    migrations_dir_exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied_count: Option<u64>,
}

pub fn run(config: &MigratorConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let database_exists = Path::new(config.sqlite_path()).exists();
    let migrations_dir_exists = Path::new(&config.migrations_dir).is_dir();

    // Only inspect an existing database; this command never creates one
    let applied_count = match super::open_existing_database(config)? {
        Some(db) => match SchemaManager::new(&db.conn).check_status()? {
            SchemaStatus::Current => Some(MigrationRepository::new(&db.conn).count()?),
            _ => None,
        },
        None => None,
    };

    let info = ConfigInfo {
        config,
        database_exists,
        migrations_dir_exists,
        applied_count,
    };

    if output_format.is_json() {
        println!("{}", output_format.to_json(&info)?);
        return Ok(());
    }

    println!("{}", config.summary());
    println!(
        "Database File:      {}",
        if database_exists { "exists" } else { "not created" }
    );
    println!(
        "Migrations Folder:  {}",
        if migrations_dir_exists {
            "exists"
        } else {
            "not created"
        }
    );
    if let Some(count) = applied_count {
        println!("Applied:            {}", count);
    }
    Ok(())
}
