//! Entity registry
//!
//! Discovers entity schema documents on disk and collects the entities they
//! declare. Documents may be TOML, YAML or JSON and carry a top-level
//! `entities` list.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::ModelsConfig;
use crate::error::{Error, Result};
use crate::models::entity::Entity;

/// On-disk shape of a schema document
#[derive(Debug, Deserialize)]
struct SchemaDocument {
    #[serde(default)]
    entities: Vec<Entity>,
}

/// Supported document encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentFormat {
    Toml,
    Yaml,
    Json,
}

impl DocumentFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "toml" => Some(DocumentFormat::Toml),
            "yaml" | "yml" => Some(DocumentFormat::Yaml),
            "json" => Some(DocumentFormat::Json),
            _ => None,
        }
    }
}

/// Entities discovered so far, in discovery order
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entities: IndexMap<String, (Entity, PathBuf)>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every configured path and register the entities found
    pub fn scan_and_register(&mut self, config: &ModelsConfig) -> Result<()> {
        for path in &config.paths {
            let base_path = Path::new(path);
            if !base_path.exists() {
                return Err(Error::ModelRegistration(format!("Path does not exist: {}", path)));
            }

            let mut walker = WalkDir::new(base_path).follow_links(true).sort_by_file_name();
            if !config.recursive_scan {
                walker = walker.max_depth(1);
            }

            for entry in walker.into_iter() {
                let entry = entry.map_err(|e| Error::ModelRegistration(format!("Failed to scan {}: {}", path, e)))?;
                let file = entry.path();

                if config.exclude_paths.iter().any(|exclude| file.starts_with(exclude)) {
                    continue;
                }
                if !file.is_file() {
                    continue;
                }
                if let Some(format) = DocumentFormat::from_path(file) {
                    self.register_file(file, format)?;
                }
            }
        }

        info!(entities = self.entities.len(), "Entity discovery finished");
        Ok(())
    }

    /// Parse one document and register its entities
    pub fn register_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let format = DocumentFormat::from_path(path).ok_or_else(|| {
            Error::ModelRegistration(format!("Unsupported schema document: {}", path.display()))
        })?;
        self.register_file(path, format)
    }

    fn register_file(&mut self, path: &Path, format: DocumentFormat) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let document = parse_document(&content, format)
            .map_err(|e| Error::ModelRegistration(format!("Failed to parse {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), entities = document.entities.len(), "Parsed schema document");

        for entity in document.entities {
            self.register(entity, path.to_path_buf())?;
        }
        Ok(())
    }

    /// Register a single entity; names must be unique across all documents
    pub fn register(&mut self, entity: Entity, source: PathBuf) -> Result<()> {
        if let Some((_, existing)) = self.entities.get(&entity.name) {
            return Err(Error::ModelRegistration(format!(
                "Entity '{}' in {} is already declared in {}",
                entity.name,
                source.display(),
                existing.display()
            )));
        }
        self.entities.insert(entity.name.clone(), (entity, source));
        Ok(())
    }

    pub fn get_entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name).map(|(entity, _)| entity)
    }

    /// Document an entity was loaded from
    pub fn source_of(&self, name: &str) -> Option<&Path> {
        self.entities.get(name).map(|(_, path)| path.as_path())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Consume the registry, yielding entities in discovery order
    pub fn into_entities(self) -> Vec<Entity> {
        self.entities.into_values().map(|(entity, _)| entity).collect()
    }
}

fn parse_document(content: &str, format: DocumentFormat) -> std::result::Result<SchemaDocument, String> {
    match format {
        DocumentFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        DocumentFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
    }
}
