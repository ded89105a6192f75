//! Configuration handling for SchemaShift

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Load configuration from a TOML file
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

    Ok(config)
}

/// Represents the complete SchemaShift configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub models: ModelsConfig,
    pub migrations: MigrationsConfig,
    pub naming: NamingConfig,
    pub schema: SchemaConfig,
    pub logging: Option<LoggingConfig>,
}

/// Where entity schema documents are discovered
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ModelsConfig {
    pub paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub recursive_scan: bool,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            paths: vec!["schema".to_string()],
            exclude_paths: Vec::new(),
            recursive_scan: true,
        }
    }
}

/// Migration artifact and snapshot locations
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct MigrationsConfig {
    pub directory: String,
    pub snapshot_file: Option<String>,
    pub description: String,
    pub dry_run: bool,
}

impl MigrationsConfig {
    /// Resolved location of the persisted schema snapshot
    pub fn snapshot_path(&self) -> PathBuf {
        match &self.snapshot_file {
            Some(file) => PathBuf::from(file),
            None => Path::new(&self.directory).join("schema_snapshot.json"),
        }
    }
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            directory: "migrations".to_string(),
            snapshot_file: None,
            description: "schema_migration".to_string(),
            dry_run: false,
        }
    }
}

/// Naming conventions configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NamingConfig {
    pub pluralize_tables: bool,
    pub index_pattern: String,
    pub constraint_pattern: String,
    pub max_identifier_length: usize,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            pluralize_tables: true,
            index_pattern: "ix_{table}_{columns}".to_string(),
            constraint_pattern: "fk_{table}_{column}".to_string(),
            max_identifier_length: 63,
        }
    }
}

/// Schema derivation behavior configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SchemaConfig {
    pub index_foreign_keys: bool,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            format: "text".to_string(),
            stdout: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.migrations.directory, "migrations");
        assert_eq!(
            config.migrations.snapshot_path(),
            PathBuf::from("migrations/schema_snapshot.json")
        );
        assert!(config.naming.pluralize_tables);
        assert_eq!(config.naming.constraint_pattern, "fk_{table}_{column}");
        assert!(config.logging.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [migrations]
            directory = "db/migrations"
            snapshot_file = "db/state.json"

            [naming]
            max_identifier_length = 30

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.migrations.snapshot_path(), PathBuf::from("db/state.json"));
        assert_eq!(config.migrations.description, "schema_migration");
        assert_eq!(config.naming.max_identifier_length, 30);
        assert_eq!(config.naming.index_pattern, "ix_{table}_{columns}");
        let logging = config.logging.unwrap();
        assert_eq!(logging.level, "debug");
        assert!(logging.stdout);
    }
}
