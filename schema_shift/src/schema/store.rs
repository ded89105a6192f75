//! Snapshot persistence
//!
//! The snapshot document is read once at the start of a run and replaced
//! wholesale at the end of a successful one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::schema::types::SchemaSnapshot;

/// Reads and atomically replaces the persisted snapshot
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last persisted snapshot.
    ///
    /// A missing file is a first run and yields an empty snapshot; anything
    /// present but unreadable is fatal.
    pub fn load(&self) -> Result<SchemaSnapshot> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No snapshot found, treating as first run");
                return Ok(SchemaSnapshot::new());
            }
            Err(e) => return Err(Error::snapshot(&self.path, e.to_string())),
        };

        let snapshot: SchemaSnapshot =
            serde_json::from_str(&content).map_err(|e| Error::snapshot(&self.path, format!("corrupt snapshot: {}", e)))?;

        debug!(
            path = %self.path.display(),
            tables = snapshot.tables.len(),
            "Loaded schema snapshot"
        );
        Ok(snapshot)
    }

    /// Replace the persisted snapshot.
    ///
    /// The document is written to a temporary file next to the target and
    /// renamed over it, so readers see either the old or the new state.
    pub fn save(&self, snapshot: &SchemaSnapshot) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut document = serde_json::to_string_pretty(snapshot)?;
        document.push('\n');

        let mut file = NamedTempFile::new_in(&dir)?;
        file.write_all(document.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path)
            .map_err(|e| Error::snapshot(&self.path, e.error.to_string()))?;

        info!(path = %self.path.display(), tables = snapshot.tables.len(), "Saved schema snapshot");
        Ok(())
    }
}
