//! Migration artifacts
//!
//! Each run that finds drift writes one timestamped `.sql` file. The
//! directory is append-only: an existing file is never overwritten.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::config::MigrationsConfig;
use crate::error::{Error, Result};
use crate::utils::naming::create_migration_name;

/// Writes migration SQL into the migrations directory
#[derive(Debug, Clone)]
pub struct MigrationWriter {
    directory: PathBuf,
    description: String,
}

impl MigrationWriter {
    pub fn new(config: &MigrationsConfig) -> Self {
        Self {
            directory: PathBuf::from(&config.directory),
            description: config.description.clone(),
        }
    }

    /// Path the artifact for `timestamp` is written to
    pub fn path_for(&self, timestamp: DateTime<Utc>) -> PathBuf {
        self.directory
            .join(format!("{}.sql", create_migration_name(&self.description, timestamp)))
    }

    /// Write `sql` as a new migration file
    pub fn write(&self, sql: &str, timestamp: DateTime<Utc>) -> Result<PathBuf> {
        fs::create_dir_all(&self.directory)?;
        let path = self.path_for(timestamp);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => {
                    Error::Migration(format!("Migration file already exists: {}", path.display()))
                }
                _ => Error::Io(e),
            })?;
        file.write_all(sql.as_bytes())?;
        file.sync_all()?;

        info!(path = %path.display(), bytes = sql.len(), "Wrote migration");
        Ok(path)
    }
}
