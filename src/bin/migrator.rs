use anyhow::Context;
use clap::{Parser, Subcommand};
use migrator::{MigrateError, MigratorConfig, OutputFormat};
use tracing::Level;

mod commands;

use commands::create::CreateArgs;
use commands::rollback::RollbackArgs;
use commands::run::RunArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path (TOML)
    #[clap(short, long, global = true)]
    config: Option<String>,

    /// environment file path, by default ./.env is used if it exists
    #[clap(long, global = true)]
    env_file: Option<String>,

    /// migrations directory, overrides MIGRATIONS_DIR
    #[clap(long, global = true)]
    migrations_dir: Option<String>,

    /// Output format: plain, table, markdown, json, json-pretty
    #[clap(short, long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Print debug information
    #[clap(long, global = true)]
    debug: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the migrations directory and the migrations table
    Install,

    /// Apply all pending migrations in order
    Run(RunArgs),

    /// Revert the most recently applied migrations
    Rollback(RollbackArgs),

    /// Create an empty apply/revert script pair
    Create(CreateArgs),

    /// Show every migration and whether it is applied
    Status,

    /// Show the effective configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    if cli.debug {
        tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    }

    let mut config = match MigratorConfig::new(&cli.config, &cli.env_file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            std::process::exit(1);
        }
    };
    if let Some(dir) = cli.migrations_dir {
        config.migrations_dir = dir;
    }

    let format = cli.format;
    let result = match cli.command {
        Commands::Install => commands::install::run(&config, format).context("install"),
        Commands::Run(args) => commands::run::run(&config, args, format).context("run"),
        Commands::Rollback(args) => {
            commands::rollback::run(&config, args, format).context("rollback")
        }
        Commands::Create(args) => commands::create::run(&config, args, format).context("create"),
        Commands::Status => commands::status::run(&config, format).context("status"),
        Commands::Config => commands::config::run(&config, format),
    };

    if let Err(e) = result {
        eprintln!("ERROR: {:#}", e);
        let code = e
            .downcast_ref::<MigrateError>()
            .map(MigrateError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}
