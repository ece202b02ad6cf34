use chrono::{DateTime, Utc};
use chrono_humanize::HumanTime;
use migrator::{
    DatabaseConn, MigrationContext, MigrationEngine, MigrationState, MigrationStatusReport,
    MigratorConfig, OutputFormat,
};
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct StatusRow {
    name: String,
    state: MigrationState,
    reversible: bool,
    applied: String,
}

pub fn run(config: &MigratorConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    // A database that does not exist yet has nothing applied; status never creates it
    let db = match super::open_existing_database(config)? {
        Some(db) => db,
        None => DatabaseConn::open_in_memory()?,
    };
    let engine = MigrationEngine::new(MigrationContext::new(&db, &config.migrations_dir));
    let report = engine.status()?;

    if output_format.is_json() {
        println!("{}", output_format.to_json(&report)?);
    } else {
        println!("{}", render(&report, output_format));
    }
    Ok(())
}

/// Render the report for the non-JSON formats
///
/// Every format carries the install notice, orphan revert scripts and counts.
fn render(report: &MigrationStatusReport, output_format: OutputFormat) -> String {
    let mut lines = Vec::new();
    if !report.table_initialized {
        lines.push("migrations table not installed yet, run `migrator install`".to_string());
    }

    match output_format {
        OutputFormat::Table => {
            lines.push(Table::new(rows(report)).with(Style::rounded()).to_string())
        }
        OutputFormat::Markdown => {
            lines.push(Table::new(rows(report)).with(Style::markdown()).to_string())
        }
        _ => lines.extend(plain_lines(report)),
    }

    for orphan in &report.orphan_revert_scripts {
        lines.push(format!("revert script without apply script: {}", orphan));
    }
    lines.push(format!(
        "{} applied, {} pending, {} missing",
        report.count(MigrationState::Applied),
        report.count(MigrationState::Pending),
        report.count(MigrationState::Missing)
    ));
    lines.join("\n")
}

fn rows(report: &MigrationStatusReport) -> Vec<StatusRow> {
    report
        .entries
        .iter()
        .map(|entry| StatusRow {
            name: entry.name.clone(),
            state: entry.state,
            reversible: entry.reversible,
            applied: entry
                .record
                .as_ref()
                .and_then(|r| DateTime::<Utc>::from_timestamp(r.applied_at, 0))
                .map(|t| format!("{} ({})", t.to_rfc3339(), HumanTime::from(t)))
                .unwrap_or_default(),
        })
        .collect()
}

fn plain_lines(report: &MigrationStatusReport) -> Vec<String> {
    report
        .entries
        .iter()
        .map(|entry| {
            let marker = match entry.state {
                MigrationState::Applied => "[x]",
                MigrationState::Pending => "[ ]",
                MigrationState::Missing => "[?]",
            };
            match &entry.record {
                Some(record) => format!(
                    "{} {}  applied {}",
                    marker,
                    entry.name,
                    record.applied_at_rfc3339()
                ),
                None => format!("{} {}", marker, entry.name),
            }
        })
        .collect()
}
