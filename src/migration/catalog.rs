//! Migration file catalog
//!
//! Scans a directory for `<timestamp>_<label>.up.sql` files. Each apply
//! script defines one migration; the matching `.down.sql` revert script is
//! looked up by name only when it is needed.

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{MigrateError, MigrateResult};

/// File suffix of apply scripts
pub const APPLY_SUFFIX: &str = ".up.sql";

/// File suffix of revert scripts
pub const REVERT_SUFFIX: &str = ".down.sql";

/// A migration discovered on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationDefinition {
    /// Full identity, e.g. `1700000000_add_users`
    pub name: String,
    /// Numeric timestamp prefix, if the name has one
    pub version: Option<u64>,
    /// The part after the first `_`, empty if there is none
    pub label: String,
    pub apply_path: PathBuf,
    #[serde(skip)]
    root: PathBuf,
}

impl MigrationDefinition {
    /// Build a definition for `name` located in `root`
    pub fn new(root: &Path, name: &str) -> Self {
        let (prefix, label) = match name.split_once('_') {
            Some((p, l)) => (p, l),
            None => (name, ""),
        };
        let version = if !prefix.is_empty() && prefix.bytes().all(|b| b.is_ascii_digit()) {
            prefix.parse().ok()
        } else {
            None
        };

        MigrationDefinition {
            name: name.to_string(),
            version,
            label: label.to_string(),
            apply_path: apply_path(root, name),
            root: root.to_path_buf(),
        }
    }

    /// Conventional location of the revert script (it may not exist)
    pub fn revert_path(&self) -> PathBuf {
        revert_path(&self.root, &self.name)
    }

    /// Whether a revert script currently exists
    pub fn is_reversible(&self) -> bool {
        self.revert_path().is_file()
    }
}

impl Ord for MigrationDefinition {
    /// Numeric versions first, in numeric order; ties and unversioned names
    /// fall back to the full name.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.version, other.version) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.name.cmp(&other.name)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.name.cmp(&other.name),
        }
    }
}

impl PartialOrd for MigrationDefinition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Path of the apply script for `name` in `root`
pub fn apply_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{}{}", name, APPLY_SUFFIX))
}

/// Path of the revert script for `name` in `root`
pub fn revert_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{}{}", name, REVERT_SUFFIX))
}

/// Catalog of migration files under one directory
pub struct MigrationCatalog {
    root: PathBuf,
}

impl MigrationCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// List all migrations in ascending order
    ///
    /// Fails if the directory cannot be listed; no partial result is returned.
    pub fn scan(&self) -> MigrateResult<Vec<MigrationDefinition>> {
        let mut migrations: Vec<MigrationDefinition> = self
            .script_names(APPLY_SUFFIX)?
            .iter()
            .map(|name| MigrationDefinition::new(&self.root, name))
            .collect();

        migrations.sort();
        debug!(
            "found {} migrations in {}",
            migrations.len(),
            self.root.display()
        );
        Ok(migrations)
    }

    /// Locate the revert script for a migration name
    pub fn revert_script(&self, name: &str) -> Option<PathBuf> {
        let path = revert_path(&self.root, name);
        path.is_file().then_some(path)
    }

    /// Names of revert scripts that have no apply script next to them
    pub fn orphan_revert_scripts(&self) -> MigrateResult<Vec<String>> {
        let mut orphans: Vec<String> = self
            .script_names(REVERT_SUFFIX)?
            .into_iter()
            .filter(|name| !apply_path(&self.root, name).is_file())
            .collect();
        orphans.sort();
        Ok(orphans)
    }

    /// Migration names of all regular files ending in `suffix`
    fn script_names(&self, suffix: &str) -> MigrateResult<Vec<String>> {
        let catalog_err = |source| MigrateError::Catalog {
            path: self.root.clone(),
            source,
        };

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(catalog_err)? {
            let entry = entry.map_err(catalog_err)?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                warn!(
                    "ignoring non UTF-8 file name in {}: {:?}",
                    self.root.display(),
                    file_name
                );
                continue;
            };

            let Some(name) = file_name.strip_suffix(suffix) else {
                continue;
            };
            if name.is_empty() || !entry.path().is_file() {
                debug!("ignoring {}", entry.path().display());
                continue;
            }
            names.push(name.to_string());
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, file: &str) {
        fs::write(dir.join(file), "").unwrap();
    }

    #[test]
    fn test_scan_orders_by_numeric_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "100_a.up.sql");
        touch(dir.path(), "200_b.up.sql");
        touch(dir.path(), "50_c.up.sql");

        let catalog = MigrationCatalog::new(dir.path());
        let names: Vec<String> = catalog.scan().unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["50_c", "100_a", "200_b"]);
    }

    #[test]
    fn test_scan_only_apply_scripts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "1_a.up.sql");
        touch(dir.path(), "1_a.down.sql");
        touch(dir.path(), "2_b.down.sql");
        touch(dir.path(), "README.md");
        touch(dir.path(), ".up.sql");
        fs::create_dir(dir.path().join("3_dir.up.sql")).unwrap();

        let catalog = MigrationCatalog::new(dir.path());
        let migrations = catalog.scan().unwrap();
        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].name, "1_a");
        assert_eq!(migrations[0].version, Some(1));
        assert_eq!(migrations[0].label, "a");
        assert_eq!(migrations[0].apply_path, dir.path().join("1_a.up.sql"));
        assert!(migrations[0].is_reversible());

        assert_eq!(catalog.orphan_revert_scripts().unwrap(), vec!["2_b"]);
    }

    #[test]
    fn test_unversioned_names_sort_last() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "seed_data.up.sql");
        touch(dir.path(), "20_b.up.sql");
        touch(dir.path(), "20_a.up.sql");

        let catalog = MigrationCatalog::new(dir.path());
        let names: Vec<String> = catalog.scan().unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["20_a", "20_b", "seed_data"]);
    }

    #[test]
    fn test_revert_script_lookup() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "1_a.up.sql");
        touch(dir.path(), "1_a.down.sql");
        touch(dir.path(), "2_b.up.sql");

        let catalog = MigrationCatalog::new(dir.path());
        assert_eq!(
            catalog.revert_script("1_a"),
            Some(dir.path().join("1_a.down.sql"))
        );
        assert_eq!(catalog.revert_script("2_b"), None);
    }

    #[test]
    fn test_scan_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = MigrationCatalog::new(dir.path().join("missing"));
        let err = catalog.scan().unwrap_err();
        assert!(matches!(err, MigrateError::Catalog { .. }));
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = MigrationCatalog::new(dir.path());
        assert!(catalog.scan().unwrap().is_empty());
    }
}
