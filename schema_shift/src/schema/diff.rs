//! Schema difference calculator
//!
//! Compares the previous snapshot with the newly derived one and produces the
//! ordered operations transforming the first into the second. There is no
//! rename detection: a renamed object is dropped and created.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::debug;

use crate::schema::generator::DdlRenderer;
use crate::schema::operation::{Operation, OperationKind};
use crate::schema::planner::MigrationPlanner;
use crate::schema::types::{ColumnSnapshot, SchemaSnapshot, TableSnapshot};

/// Ordered operations needed to synchronize two snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    pub operations: Vec<Operation>,
}

impl SchemaDiff {
    /// Returns true if there are no differences
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Number of operations of one kind
    pub fn count(&self, kind: OperationKind) -> usize {
        self.operations.iter().filter(|op| op.kind == kind).count()
    }

    pub fn into_operations(self) -> Vec<Operation> {
        self.operations
    }
}

/// Operations that create `next` from an empty database
pub fn initial_migration(next: &SchemaSnapshot, renderer: &DdlRenderer) -> SchemaDiff {
    diff_schema(&SchemaSnapshot::new(), next, renderer)
}

/// Compute the operations transforming `prev` into `next`.
///
/// Order: extension drops then adds, dropped tables, created tables (each
/// followed by its indexes and partitioning, with all their foreign keys after
/// the last one), then every shared table in name order.
pub fn diff_schema(prev: &SchemaSnapshot, next: &SchemaSnapshot, renderer: &DdlRenderer) -> SchemaDiff {
    let mut operations = Vec::new();

    diff_extensions(prev, next, renderer, &mut operations);

    let prev_tables: BTreeMap<&str, &TableSnapshot> = prev.tables.iter().map(|t| (t.name.as_str(), t)).collect();
    let next_tables: BTreeMap<&str, &TableSnapshot> = next.tables.iter().map(|t| (t.name.as_str(), t)).collect();

    let mut dropped: Vec<&TableSnapshot> = Vec::new();
    let mut created: Vec<&TableSnapshot> = Vec::new();
    let mut shared: Vec<(&TableSnapshot, &TableSnapshot)> = Vec::new();

    for (name, old) in &prev_tables {
        match next_tables.get(name) {
            None => dropped.push(*old),
            Some(new) if !old.same_identity(new) => dropped.push(*old),
            Some(_) => {}
        }
    }
    for (name, new) in &next_tables {
        match prev_tables.get(name) {
            Some(old) if old.same_identity(new) => shared.push((*old, *new)),
            _ => created.push(*new),
        }
    }

    // Recreated tables lose every foreign key pointing at them.
    let recreated: HashSet<&str> = created
        .iter()
        .filter(|t| prev_tables.contains_key(t.name.as_str()))
        .map(|t| t.name.as_str())
        .collect();

    dropped.sort_by(|a, b| (a.is_join_table, &a.name).cmp(&(b.is_join_table, &b.name)));
    for table in &dropped {
        operations.push(renderer.drop_table(&table.name));
    }

    let planned = MigrationPlanner::new().order(&created);
    for table in &planned {
        operations.push(renderer.create_table(table));
        for index in &table.indexes {
            operations.push(renderer.create_index(&table.name, index));
        }
        if let Some(column) = &table.hypertable_column {
            operations.push(renderer.create_hypertable(&table.name, column));
        }
    }
    for table in &planned {
        for fk in &table.foreign_keys {
            operations.push(renderer.add_foreign_key(&table.name, fk));
        }
    }

    for (old, new) in shared {
        diff_table(old, new, &recreated, renderer, &mut operations);
    }

    debug!(
        operations = operations.len(),
        dropped = dropped.len(),
        created = planned.len(),
        "Computed schema diff"
    );
    SchemaDiff { operations }
}

fn diff_extensions(prev: &SchemaSnapshot, next: &SchemaSnapshot, renderer: &DdlRenderer, operations: &mut Vec<Operation>) {
    let old: BTreeSet<&str> = prev.extensions.iter().map(String::as_str).collect();
    let new: BTreeSet<&str> = next.extensions.iter().map(String::as_str).collect();

    for name in old.difference(&new) {
        operations.push(renderer.drop_extension(name));
    }
    for name in new.difference(&old) {
        operations.push(renderer.create_extension(name));
    }
}

/// Per-table steps for a table present in both snapshots
fn diff_table(
    old: &TableSnapshot,
    new: &TableSnapshot,
    recreated: &HashSet<&str>,
    renderer: &DdlRenderer,
    operations: &mut Vec<Operation>,
) {
    let table = new.name.as_str();

    // Columns that go through drop and add take their indexes and constraints with them.
    let rebuilt: HashSet<&str> = new
        .columns
        .iter()
        .filter(|column| {
            old.column(&column.name)
                .map_or(false, |previous| needs_rebuild(previous, column))
        })
        .map(|column| column.name.as_str())
        .collect();

    // 1. indexes that changed or vanished
    for index in &old.indexes {
        let kept = new.indexes.contains(index) && !index.columns.iter().any(|c| rebuilt.contains(c.as_str()));
        if !kept {
            operations.push(renderer.drop_index(table, &index.name));
        }
    }

    // 2. foreign keys that changed or vanished
    for fk in &old.foreign_keys {
        let kept = new.foreign_keys.contains(fk) && !rebuilt.contains(fk.column.as_str());
        if !kept {
            operations.push(renderer.drop_foreign_key(table, &fk.constraint));
        }
    }

    // 3. columns
    for column in &old.columns {
        if new.column(&column.name).is_none() {
            operations.extend(diff_column(table, Some(column), None, renderer));
        }
    }
    for column in &new.columns {
        operations.extend(diff_column(table, old.column(&column.name), Some(column), renderer));
    }

    // 4. indexes that are new or changed
    for index in &new.indexes {
        let unchanged = old.indexes.contains(index) && !index.columns.iter().any(|c| rebuilt.contains(c.as_str()));
        if !unchanged {
            operations.push(renderer.create_index(table, index));
        }
    }

    // 5. foreign keys that are new, changed or lost with their target
    for fk in &new.foreign_keys {
        let unchanged = old.foreign_keys.contains(fk)
            && !rebuilt.contains(fk.column.as_str())
            && !recreated.contains(fk.target_table.as_str());
        if !unchanged {
            operations.push(renderer.add_foreign_key(table, fk));
        }
    }

    // 6. time partitioning
    if old.hypertable_column != new.hypertable_column {
        if let Some(column) = &old.hypertable_column {
            operations.push(renderer.drop_hypertable(table, column));
        }
        if let Some(column) = &new.hypertable_column {
            operations.push(renderer.create_hypertable(table, column));
        }
    }
}

/// Computed columns cannot be altered in place
fn needs_rebuild(old: &ColumnSnapshot, new: &ColumnSnapshot) -> bool {
    old != new && (old.is_computed() || new.is_computed())
}

/// Operations turning column `old` into column `new` of `table`.
///
/// A missing side means the column is added or dropped. Plain columns get
/// one `ALTER COLUMN` per changed property; computed columns are dropped and
/// re-added on any change.
pub fn diff_column(
    table: &str,
    old: Option<&ColumnSnapshot>,
    new: Option<&ColumnSnapshot>,
    renderer: &DdlRenderer,
) -> Vec<Operation> {
    let (old, new) = match (old, new) {
        (None, None) => return Vec::new(),
        (Some(old), None) => return vec![renderer.drop_column(table, &old.name)],
        (None, Some(new)) => return vec![renderer.add_column(table, new)],
        (Some(old), Some(new)) => (old, new),
    };

    if old == new {
        return Vec::new();
    }
    if needs_rebuild(old, new) {
        return vec![renderer.drop_column(table, &old.name), renderer.add_column(table, new)];
    }

    let column = new.name.as_str();
    let mut operations = Vec::new();

    if old.identity.is_some() && old.identity != new.identity {
        operations.push(renderer.drop_identity(table, column));
    }
    if old.data_type != new.data_type {
        operations.push(renderer.alter_column_type(table, column, &new.data_type));
    }
    if old.nullable != new.nullable {
        operations.push(renderer.set_nullable(table, column, new.nullable));
    }
    if old.default != new.default {
        operations.push(renderer.set_default(table, column, new.default.as_deref()));
    }
    if old.unique != new.unique {
        operations.push(renderer.set_unique(table, column, new.unique));
    }
    if let Some(kind) = new.identity.filter(|_| old.identity != new.identity) {
        operations.push(renderer.add_identity(table, column, kind));
    }

    operations
}
