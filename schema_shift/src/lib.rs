//! SchemaShift: schema-migration engine for declarative entity models
//!
//! SchemaShift takes entities, fields and relationships, finalizes them into a
//! strict relational model, validates it, and compares it with the last
//! recorded database shape to emit an ordered PostgreSQL migration.

pub mod config;
pub mod error;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod utils;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

// Re-export main types for easier access
pub use config::Config;
pub use error::{Error, Result};
pub use migrations::MigrationWriter;
pub use models::{Entity, EntityRegistry, EnumRegistry, RelationSynthesizer, SynthesisReport, Validator};
pub use schema::{DdlRenderer, Operation, OperationKind, SchemaDiff, SchemaSnapshot, SnapshotBuilder, SnapshotStore};

/// Load configuration from a TOML file
pub fn load_config(config_path: impl AsRef<Path>) -> Result<Config> {
    config::load_from_file(config_path)
}

/// Discover the entity documents configured under `[models]`
pub fn load_entities(config: &Config) -> Result<Vec<Entity>> {
    let mut registry = EntityRegistry::new();
    registry.scan_and_register(&config.models)?;
    Ok(registry.into_entities())
}

/// State threaded through one generation run.
///
/// The engine resets it when a run starts, so nothing carries over from an
/// earlier run on the same engine.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    pub config: Config,
    pub enums: EnumRegistry,
    written: Vec<PathBuf>,
}

impl GenerationContext {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            enums: EnumRegistry::new(),
            written: Vec::new(),
        }
    }

    /// Forget everything recorded by a previous run
    pub fn reset(&mut self) {
        self.enums = EnumRegistry::new();
        self.written.clear();
    }

    /// Record a file produced by this run
    pub fn record_written(&mut self, path: PathBuf) {
        self.written.push(path);
    }

    /// Files written so far
    pub fn written_files(&self) -> &[PathBuf] {
        &self.written
    }
}

/// Result of one engine run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Regeneration was not requested
    Skipped,
    /// The database shape already matches the entities
    UpToDate,
    /// A migration was written and the snapshot replaced
    Generated { path: PathBuf, operations: Vec<Operation> },
    /// Dry run: SQL rendered, nothing written
    DryRun { sql: String, operations: Vec<Operation> },
}

impl MigrationOutcome {
    pub fn operations(&self) -> &[Operation] {
        match self {
            MigrationOutcome::Generated { operations, .. } | MigrationOutcome::DryRun { operations, .. } => operations,
            MigrationOutcome::Skipped | MigrationOutcome::UpToDate => &[],
        }
    }
}

/// The migration pipeline
pub struct MigrationEngine {
    context: GenerationContext,
    store: SnapshotStore,
    writer: MigrationWriter,
    renderer: DdlRenderer,
}

impl MigrationEngine {
    pub fn new(config: Config) -> Self {
        let store = SnapshotStore::new(config.migrations.snapshot_path());
        let writer = MigrationWriter::new(&config.migrations);
        let renderer = DdlRenderer::new(&config.naming);

        Self {
            context: GenerationContext::new(config),
            store,
            writer,
            renderer,
        }
    }

    pub fn context(&self) -> &GenerationContext {
        &self.context
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Normalize, synthesize and validate `entities` in place.
    ///
    /// The finalized list is what downstream emitters consume, so this runs
    /// even when no migration is requested.
    pub fn finalize(&mut self, entities: &mut [Entity]) -> Result<SynthesisReport> {
        // Enum definitions are scoped to this run.
        self.context.enums = EnumRegistry::new();
        for entity in entities.iter_mut() {
            entity.normalize_identifiers();
        }

        let report = RelationSynthesizer::new().synthesize(entities);
        debug!(
            inverses = report.inverses.len(),
            columns = report.columns.len(),
            "Synthesized relationships"
        );

        self.context.enums.register_entities(entities)?;
        Validator::new(self.context.config.naming.pluralize_tables)
            .with_unresolved(&report.unresolved)
            .validate(entities)?;
        Ok(report)
    }

    /// Derive the snapshot for finalized entities
    pub fn build_snapshot(&self, entities: &[Entity]) -> Result<SchemaSnapshot> {
        let config = &self.context.config;
        SnapshotBuilder::new(&config.naming, &config.schema).build(entities)
    }

    /// Finalize `entities` and diff them against the persisted snapshot without writing anything
    pub fn plan(&mut self, entities: &mut [Entity]) -> Result<(SchemaSnapshot, SchemaDiff)> {
        self.finalize(entities)?;
        let next = self.build_snapshot(entities)?;
        let prev = self.store.load()?;

        let diff = if prev.is_empty() {
            info!(tables = next.tables.len(), "No prior snapshot, planning initial migration");
            schema::initial_migration(&next, &self.renderer)
        } else {
            schema::diff_schema(&prev, &next, &self.renderer)
        };
        Ok((next, diff))
    }

    /// Run the pipeline, stamping any migration with the current time
    pub fn run(&mut self, entities: &mut [Entity], regenerate: bool) -> Result<MigrationOutcome> {
        self.run_at(entities, regenerate, Utc::now())
    }

    /// Run the pipeline.
    ///
    /// The snapshot is only replaced after the migration has been rendered and
    /// written; any earlier failure leaves it untouched.
    pub fn run_at(
        &mut self,
        entities: &mut [Entity],
        regenerate: bool,
        timestamp: DateTime<Utc>,
    ) -> Result<MigrationOutcome> {
        self.context.reset();
        if !regenerate {
            self.finalize(entities)?;
            info!("Schema unchanged, skipping migration generation");
            return Ok(MigrationOutcome::Skipped);
        }

        let (next, diff) = self.plan(entities)?;
        let operations = diff.into_operations();

        let Some(sql) = self.renderer.render_migration(&operations) else {
            info!("Database schema is already in sync with entities");
            return Ok(MigrationOutcome::UpToDate);
        };

        if self.context.config.migrations.dry_run {
            info!(operations = operations.len(), "Dry run, migration not written");
            return Ok(MigrationOutcome::DryRun { sql, operations });
        }

        let path = self.writer.write(&sql, timestamp)?;
        self.context.record_written(path.clone());
        self.store.save(&next)?;

        info!(path = %path.display(), operations = operations.len(), "Generated migration");
        Ok(MigrationOutcome::Generated { path, operations })
    }
}
