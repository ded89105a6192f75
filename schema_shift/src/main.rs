//! SchemaShift CLI
//!
//! ```bash
//! # write a migration for whatever changed since the last run
//! schema_shift generate
//!
//! # print the SQL without touching migrations or the snapshot
//! schema_shift plan
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use schema_shift::utils::logging::init_logging;
use schema_shift::{load_config, load_entities, Config, MigrationEngine, MigrationOutcome};

const DEFAULT_CONFIG: &str = "schema_shift.toml";

#[derive(Parser)]
#[command(name = "schema_shift")]
#[command(about = "Diff entity schemas against the last applied snapshot and emit PostgreSQL migrations", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to ./schema_shift.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a migration and replace the snapshot
    Generate {
        /// Render the SQL without writing anything
        #[arg(long)]
        dry_run: bool,

        /// The caller determined the schema is unchanged; only finalize and validate
        #[arg(long)]
        unchanged: bool,
    },

    /// Print the pending migration SQL
    Plan,

    /// Check the entity schema and report every problem
    Validate,

    /// Print the persisted snapshot
    Snapshot,
}

fn load(path: Option<PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => load_config(&path).with_context(|| format!("loading {}", path.display())),
        None if PathBuf::from(DEFAULT_CONFIG).exists() => Ok(load_config(DEFAULT_CONFIG)?),
        None => Ok(Config::default()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load(cli.config)?;
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Generate { dry_run, unchanged } => {
            config.migrations.dry_run |= dry_run;
            let mut entities = load_entities(&config)?;
            let mut engine = MigrationEngine::new(config);

            match engine.run(&mut entities, !unchanged)? {
                MigrationOutcome::Skipped => println!("Skipped: schema unchanged"),
                MigrationOutcome::UpToDate => println!("Up to date: no changes detected"),
                MigrationOutcome::Generated { path, operations } => {
                    println!("Wrote {} ({} operations)", path.display(), operations.len());
                }
                MigrationOutcome::DryRun { sql, .. } => print!("{}", sql),
            }
        }
        Commands::Plan => {
            let mut entities = load_entities(&config)?;
            let renderer = schema_shift::DdlRenderer::new(&config.naming);
            let mut engine = MigrationEngine::new(config);

            let (_, diff) = engine.plan(&mut entities)?;
            match renderer.render_migration(&diff.operations) {
                Some(sql) => print!("{}", sql),
                None => println!("-- up to date"),
            }
        }
        Commands::Validate => {
            let mut entities = load_entities(&config)?;
            let mut engine = MigrationEngine::new(config);

            let report = engine.finalize(&mut entities)?;
            info!(inverses = report.inverses.len(), "Validation passed");
            println!("Schema is valid ({} entities)", entities.len());
        }
        Commands::Snapshot => {
            let engine = MigrationEngine::new(config);
            let snapshot = engine.store().load()?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}
