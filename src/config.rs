use anyhow::{anyhow, Result};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Default migrations directory, relative to the working directory
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Default SQLite database file, relative to the working directory
pub const DEFAULT_DATABASE: &str = "migrator.sqlite3";

/// Default environment file, relative to the working directory
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Environment variables read into the configuration
pub const ENV_KEYS: &[&str] = &[
    "DB_USERNAME",
    "DB_PASSWORD",
    "DB_HOST",
    "DB_PORT",
    "DB_DATABASE",
    "MIGRATIONS_DIR",
    "MIGRATOR_TRANSACTIONAL",
];

#[derive(Debug, Clone, Serialize)]
pub struct MigratorConfig {
    /// `DB_USERNAME`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_username: Option<String>,

    /// `DB_PASSWORD`
    #[serde(skip)]
    pub db_password: Option<String>,

    /// `DB_HOST`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_host: Option<String>,

    /// `DB_PORT`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_port: Option<u16>,

    /// `DB_DATABASE`: path to the SQLite database file
    pub db_database: String,

    /// `MIGRATIONS_DIR`: directory holding the migration scripts
    pub migrations_dir: String,

    /// `MIGRATOR_TRANSACTIONAL`: wrap each migration in a transaction
    pub transactional: bool,
}

const EMPTY_CONFIG_HINT: &str = r#"### migrator configuration file

### SQLite database file
# db_database = "migrator.sqlite3"

### directory holding <timestamp>_<label>.up.sql / .down.sql scripts
# migrations_dir = "migrations"

### run each migration inside a transaction
# transactional = true
"#;

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            db_username: None,
            db_password: None,
            db_host: None,
            db_port: None,
            db_database: DEFAULT_DATABASE.to_string(),
            migrations_dir: DEFAULT_MIGRATIONS_DIR.to_string(),
            transactional: true,
        }
    }
}

impl MigratorConfig {
    /// Build the configuration from all sources
    ///
    /// Later sources win: defaults, the TOML file given by `config_file`,
    /// the env file (`.env` unless `env_file` is given), then the process
    /// environment. Values from the env file never replace variables that
    /// are already set in the environment.
    pub fn new(config_file: &Option<String>, env_file: &Option<String>) -> Result<MigratorConfig> {
        load_env_file(env_file)?;

        let mut builder = Config::builder();

        if let Some(p) = config_file {
            let path = Path::new(p.as_str());
            if !path.exists() {
                return Err(anyhow!(
                    "Configuration file '{}' does not exist. Example content:\n{}",
                    p,
                    EMPTY_CONFIG_HINT
                ));
            }
            builder = builder.add_source(config::File::from(path));
        }

        // E.g., `DB_DATABASE=app.sqlite3 migrator run` selects the database file.
        // Unrelated variables are never read, so names like `A.B` cannot
        // turn into nested keys.
        builder = builder.add_source(
            config::Environment::default().source(Some(known_env_vars(|key| {
                std::env::var(key).ok()
            }))),
        );

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Self::from_map(config)
    }

    /// Interpret a flat key-value map (keys are case-insensitive)
    pub fn from_map(map: HashMap<String, String>) -> Result<MigratorConfig> {
        let map: HashMap<String, String> = map
            .into_iter()
            .map(|(k, v)| (k.to_lowercase(), v))
            .collect();
        let get = |key: &str| {
            map.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = MigratorConfig::default();

        let db_port = match get("db_port") {
            Some(p) => Some(
                p.parse::<u16>()
                    .map_err(|e| anyhow!("Invalid DB_PORT '{}': {}", p, e))?,
            ),
            None => None,
        };

        let transactional = match get("migrator_transactional").or_else(|| get("transactional")) {
            Some(v) => parse_bool(&v)
                .ok_or_else(|| anyhow!("Invalid value for MIGRATOR_TRANSACTIONAL: '{}'", v))?,
            None => defaults.transactional,
        };

        Ok(MigratorConfig {
            db_username: get("db_username"),
            db_password: get("db_password"),
            db_host: get("db_host"),
            db_port,
            db_database: get("db_database").unwrap_or(defaults.db_database),
            migrations_dir: get("migrations_dir").unwrap_or(defaults.migrations_dir),
            transactional,
        })
    }

    /// Get the path to the SQLite database file
    pub fn sqlite_path(&self) -> &str {
        self.db_database.as_str()
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        let or_unset = |v: &Option<String>| v.clone().unwrap_or_else(|| "(unset)".to_string());
        let lines = [
            format!("Database:           {}", self.db_database),
            format!("Migrations Dir:     {}", self.migrations_dir),
            format!("Transactional:      {}", self.transactional),
            format!("DB Host:            {}", or_unset(&self.db_host)),
            format!(
                "DB Port:            {}",
                self.db_port
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "(unset)".to_string())
            ),
            format!("DB Username:        {}", or_unset(&self.db_username)),
            format!(
                "DB Password:        {}",
                if self.db_password.is_some() {
                    "********"
                } else {
                    "(unset)"
                }
            ),
        ];

        lines.join("\n")
    }
}

/// Collect the [`ENV_KEYS`] that `lookup` knows about
fn known_env_vars<F>(lookup: F) -> config::Map<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    ENV_KEYS
        .iter()
        .filter_map(|key| lookup(key).map(|value| (key.to_string(), value)))
        .collect()
}

fn load_env_file(env_file: &Option<String>) -> Result<()> {
    match env_file {
        Some(p) => dotenvy::from_path(p)
            .map_err(|e| anyhow!("Unable to load env file '{}': {}", p, e)),
        None => {
            if Path::new(DEFAULT_ENV_FILE).is_file() {
                dotenvy::from_path(DEFAULT_ENV_FILE)
                    .map_err(|e| anyhow!("Unable to load env file '{}': {}", DEFAULT_ENV_FILE, e))?;
            }
            Ok(())
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = MigratorConfig::from_map(HashMap::new()).unwrap();
        assert_eq!(config.sqlite_path(), DEFAULT_DATABASE);
        assert_eq!(config.migrations_dir, DEFAULT_MIGRATIONS_DIR);
        assert!(config.transactional);
        assert!(config.db_host.is_none());
    }

    #[test]
    fn test_connection_keys() {
        let config = MigratorConfig::from_map(map(&[
            ("DB_USERNAME", "app"),
            ("DB_PASSWORD", "secret"),
            ("DB_HOST", "localhost"),
            ("DB_PORT", "3306"),
            ("DB_DATABASE", "app.sqlite3"),
            ("MIGRATIONS_DIR", "db/migrations"),
            ("MIGRATOR_TRANSACTIONAL", "false"),
        ]))
        .unwrap();

        assert_eq!(config.db_username.as_deref(), Some("app"));
        assert_eq!(config.db_password.as_deref(), Some("secret"));
        assert_eq!(config.db_host.as_deref(), Some("localhost"));
        assert_eq!(config.db_port, Some(3306));
        assert_eq!(config.sqlite_path(), "app.sqlite3");
        assert_eq!(config.migrations_dir, "db/migrations");
        assert!(!config.transactional);
    }

    #[test]
    fn test_invalid_values() {
        assert!(MigratorConfig::from_map(map(&[("db_port", "http")])).is_err());
        assert!(MigratorConfig::from_map(map(&[("transactional", "maybe")])).is_err());
    }

    #[test]
    fn test_summary_masks_password() {
        let config = MigratorConfig::from_map(map(&[("db_password", "hunter2")])).unwrap();
        let summary = config.summary();
        assert!(!summary.contains("hunter2"));
        assert!(summary.contains("********"));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join("empty.env");
        std::fs::write(&env_path, "").unwrap();
        let missing = dir.path().join("missing.toml");

        let result = MigratorConfig::new(
            &Some(missing.to_string_lossy().to_string()),
            &Some(env_path.to_string_lossy().to_string()),
        );
        assert!(result.unwrap_err().to_string().contains("does not exist"));

        let result = MigratorConfig::new(&None, &Some(missing.to_string_lossy().to_string()));
        assert!(result.unwrap_err().to_string().contains("Unable to load env file"));
    }

    #[test]
    fn test_known_env_vars_only() {
        let env = map(&[
            ("DB_DATABASE", "app.sqlite3"),
            ("TRANSACTIONAL", "banana"),
            ("SOME.TOOL", "1"),
        ]);
        let vars = known_env_vars(|key| env.get(key).cloned());

        assert_eq!(vars.len(), 1);
        assert_eq!(vars.get("DB_DATABASE").map(String::as_str), Some("app.sqlite3"));
    }

    #[test]
    fn test_dotted_env_var_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join("empty.env");
        std::fs::write(&env_path, "").unwrap();
        std::env::set_var("MIGRATOR_TEST.NESTED", "1");

        let config = MigratorConfig::new(&None, &Some(env_path.to_string_lossy().to_string()));
        assert!(config.is_ok());
    }

    #[test]
    fn test_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migrator.toml");
        std::fs::write(
            &path,
            "db_database = \"from_file.sqlite3\"\nmigrations_dir = \"sql\"\ntransactional = false\n",
        )
        .unwrap();
        let env_path = dir.path().join("empty.env");
        std::fs::write(&env_path, "").unwrap();

        let config = MigratorConfig::new(
            &Some(path.to_string_lossy().to_string()),
            &Some(env_path.to_string_lossy().to_string()),
        )
        .unwrap();
        assert_eq!(config.migrations_dir, "sql");
        assert!(!config.transactional);
    }
}
