//! Derivation of a schema snapshot from a finalized entity list

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::config::{NamingConfig, SchemaConfig};
use crate::error::{Error, Result};
use crate::models::entity::{Edge, EdgeKind, Entity};
use crate::schema::types::{ColumnSnapshot, ForeignKeySnapshot, IndexSnapshot, SchemaSnapshot, TableSnapshot};
use crate::utils::naming::{
    foreign_key_column, get_foreign_key_name, get_index_name, join_table_name, normalize_identifier,
    normalize_override, singularize,
};

/// Extension required by time-partitioned tables
pub const TIMESCALE_EXTENSION: &str = "timescaledb";

/// Builds the relational shape a set of entities maps to
pub struct SnapshotBuilder<'a> {
    naming: &'a NamingConfig,
    schema: &'a SchemaConfig,
}

impl<'a> SnapshotBuilder<'a> {
    pub fn new(naming: &'a NamingConfig, schema: &'a SchemaConfig) -> Self {
        Self { naming, schema }
    }

    /// Derive the snapshot for validated, synthesized entities.
    ///
    /// Entity tables come first in table-name order, then join tables in
    /// name order, so loader iteration order never leaks into the result.
    pub fn build(&self, entities: &[Entity]) -> Result<SchemaSnapshot> {
        let by_name: BTreeMap<&str, &Entity> = entities.iter().map(|e| (e.name.as_str(), e)).collect();

        let mut tables = Vec::with_capacity(entities.len());
        let mut join_tables: BTreeMap<String, TableSnapshot> = BTreeMap::new();
        let mut extensions = BTreeSet::new();

        for entity in entities {
            tables.push(self.entity_table(entity, &by_name)?);

            for field in &entity.fields {
                if let Some(extension) = field.field_type.required_extension() {
                    extensions.insert(extension.to_string());
                }
            }
            if entity.hypertable.is_some() {
                extensions.insert(TIMESCALE_EXTENSION.to_string());
            }
            for extension in &entity.extensions {
                let extension = extension.trim().to_lowercase();
                if !extension.is_empty() {
                    extensions.insert(extension);
                }
            }
        }
        tables.sort_by(|a, b| a.name.cmp(&b.name));

        let mut owners: Vec<&Entity> = entities.iter().collect();
        owners.sort_by(|a, b| a.name.cmp(&b.name));
        for entity in owners {
            for edge in entity.edges.iter().filter(|e| e.kind == EdgeKind::ManyToMany) {
                let name = normalize_override(edge.through.as_deref())
                    .unwrap_or_else(|| join_table_name(&entity.name, &edge.target));
                if join_tables.contains_key(&name) {
                    continue;
                }
                let table = self.join_table(&name, entity, edge, &by_name)?;
                join_tables.insert(name, table);
            }
        }

        debug!(
            tables = tables.len(),
            join_tables = join_tables.len(),
            extensions = extensions.len(),
            "Built schema snapshot"
        );

        tables.extend(join_tables.into_values());
        Ok(SchemaSnapshot {
            extensions: extensions.into_iter().collect(),
            tables,
        })
    }

    fn entity_table(&self, entity: &Entity, by_name: &BTreeMap<&str, &Entity>) -> Result<TableSnapshot> {
        let table_name = entity.table_name(self.naming.pluralize_tables);
        let mut table = TableSnapshot::new(&table_name);

        for field in &entity.fields {
            let mut column = ColumnSnapshot::new(&field.column_name(), &field.field_type.sql_type())
                .nullable(field.nullable && !field.primary)
                .unique(field.unique && !field.primary);
            column.default = field.default.clone();
            column.generated_expr = field.generated.clone().unwrap_or_default();
            column.read_only = field.read_only;
            column.identity = field.identity;
            table.add_column(column);
        }

        let primary = entity
            .primary_field()
            .ok_or_else(|| Error::Invariant(format!("entity '{}' has no single primary key", entity.name)))?;
        table.primary_key = vec![primary.column_name()];

        for index in &entity.indexes {
            let columns: Vec<String> = index
                .columns
                .iter()
                .map(|column| {
                    entity
                        .fields
                        .iter()
                        .find(|f| &f.name == column)
                        .map(|f| f.column_name())
                        .unwrap_or_else(|| normalize_identifier(column))
                })
                .collect();
            let name = if index.name.trim().is_empty() {
                get_index_name(&self.naming.index_pattern, &table_name, &columns, self.naming.max_identifier_length)
            } else {
                index.name.trim().to_string()
            };

            table.add_index(IndexSnapshot {
                name,
                columns,
                unique: index.unique,
                predicate: index.predicate.clone(),
                method: index.method.clone(),
                nulls_not_distinct: index.nulls_not_distinct,
            });
        }

        for edge in entity.edges.iter().filter(|e| e.kind == EdgeKind::ToOne) {
            // A polymorphic column points at several tables, so it cannot carry a constraint.
            if edge.is_polymorphic() {
                continue;
            }
            if edge.is_self_referential(&entity.name) && edge.explicit_column().is_none() {
                continue;
            }
            let Some(column) = edge.fk_column(&entity.name) else {
                continue;
            };

            let target = lookup(by_name, &edge.target)?;
            let target_key = target.primary_field().ok_or_else(|| {
                Error::Invariant(format!("edge '{}.{}' targets an entity without a primary key", entity.name, edge.name))
            })?;

            table.add_foreign_key(ForeignKeySnapshot {
                constraint: get_foreign_key_name(
                    &self.naming.constraint_pattern,
                    &table_name,
                    &column,
                    self.naming.max_identifier_length,
                ),
                column: column.clone(),
                target_table: target.table_name(self.naming.pluralize_tables),
                target_column: target_key.column_name(),
                on_delete: edge.on_delete,
                on_update: edge.on_update,
            });

            if self.schema.index_foreign_keys {
                let columns = vec![column];
                table.add_index(IndexSnapshot::new(
                    &get_index_name(&self.naming.index_pattern, &table_name, &columns, self.naming.max_identifier_length),
                    columns,
                ));
            }
        }

        table.hypertable_column = entity.hypertable_column();
        Ok(table)
    }

    /// Join table backing a many-to-many edge: one foreign key per participant,
    /// both together forming the primary key
    fn join_table(
        &self,
        name: &str,
        owner: &Entity,
        edge: &Edge,
        by_name: &BTreeMap<&str, &Entity>,
    ) -> Result<TableSnapshot> {
        let target = lookup(by_name, &edge.target)?;

        let mut participants = if edge.is_self_referential(&owner.name) {
            let second = format!("{}_id", singularize(&normalize_identifier(&edge.name)));
            vec![(foreign_key_column(&owner.name), owner), (second, target)]
        } else {
            let mut sides = vec![(foreign_key_column(&owner.name), owner), (foreign_key_column(&target.name), target)];
            let pluralize = self.naming.pluralize_tables;
            sides.sort_by_key(|(_, entity)| entity.table_name(pluralize));
            sides
        };

        let mut table = TableSnapshot::new(name);
        table.is_join_table = true;

        for (column, entity) in participants.drain(..) {
            let key = entity.primary_field().ok_or_else(|| {
                Error::Invariant(format!("join table '{}' references '{}' without a primary key", name, entity.name))
            })?;

            table.add_column(ColumnSnapshot::new(&column, &key.field_type.reference_type().sql_type()));
            table.primary_key.push(column.clone());
            table.add_foreign_key(ForeignKeySnapshot {
                constraint: get_foreign_key_name(
                    &self.naming.constraint_pattern,
                    name,
                    &column,
                    self.naming.max_identifier_length,
                ),
                column: column.clone(),
                target_table: entity.table_name(self.naming.pluralize_tables),
                target_column: key.column_name(),
                on_delete: edge.on_delete,
                on_update: edge.on_update,
            });

            if self.schema.index_foreign_keys {
                let columns = vec![column];
                table.add_index(IndexSnapshot::new(
                    &get_index_name(&self.naming.index_pattern, name, &columns, self.naming.max_identifier_length),
                    columns,
                ));
            }
        }

        Ok(table)
    }
}

fn lookup<'e>(by_name: &BTreeMap<&str, &'e Entity>, name: &str) -> Result<&'e Entity> {
    by_name
        .get(name)
        .copied()
        .ok_or_else(|| Error::Invariant(format!("unknown entity '{}' reached snapshot derivation", name)))
}
