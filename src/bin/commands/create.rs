use std::path::Path;

use clap::Args;
use migrator::migration::create_migration;
use migrator::{MigratorConfig, OutputFormat};

/// Arguments for the Create command
#[derive(Args)]
pub struct CreateArgs {
    /// Migration label, e.g. add_users
    #[clap(value_name = "NAME")]
    pub name: String,
}

pub fn run(config: &MigratorConfig, args: CreateArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    // Creating scripts needs no database connection
    let created = create_migration(Path::new(&config.migrations_dir), &args.name)?;

    if output_format.is_json() {
        println!("{}", output_format.to_json(&created)?);
        return Ok(());
    }

    println!("Create: {}", created.apply_path.display());
    println!("Create: {}", created.revert_path.display());
    Ok(())
}
