//! Schema module for SchemaShift
//!
//! Snapshot derivation and persistence, creation ordering, structural diffing
//! and DDL rendering.

pub mod builder;
pub mod diff;
pub mod generator;
pub mod operation;
pub mod planner;
pub mod store;
pub mod types;

// Re-export key types
pub use builder::SnapshotBuilder;
pub use diff::{diff_column, diff_schema, initial_migration, SchemaDiff};
pub use generator::DdlRenderer;
pub use operation::{Operation, OperationKind};
pub use planner::MigrationPlanner;
pub use store::SnapshotStore;
pub use types::{ColumnSnapshot, ForeignKeySnapshot, IndexSnapshot, SchemaSnapshot, TableSnapshot};
