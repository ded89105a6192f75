//! DDL renderer
//!
//! Turns snapshot objects into literal PostgreSQL statements. Additive
//! statements carry `IF NOT EXISTS` and destructive ones `IF EXISTS` (plus
//! `CASCADE` where the object can have dependents), so a migration can be
//! replayed.

use crate::config::NamingConfig;
use crate::models::entity::{IdentityKind, ReferentialAction};
use crate::schema::operation::{Operation, OperationKind};
use crate::schema::types::{ColumnSnapshot, ForeignKeySnapshot, IndexSnapshot, TableSnapshot};
use crate::utils::naming::unique_constraint_name;

/// Migration SQL generator
#[derive(Debug, Clone)]
pub struct DdlRenderer {
    max_identifier_length: usize,
}

impl Default for DdlRenderer {
    fn default() -> Self {
        Self::new(&NamingConfig::default())
    }
}

impl DdlRenderer {
    pub fn new(naming: &NamingConfig) -> Self {
        Self {
            max_identifier_length: naming.max_identifier_length,
        }
    }

    /// Join operations into one migration body; `None` when there is nothing to do
    pub fn render_migration(&self, operations: &[Operation]) -> Option<String> {
        if operations.is_empty() {
            return None;
        }
        let mut sql = operations
            .iter()
            .map(|op| op.sql.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        sql.push('\n');
        Some(sql)
    }

    pub fn create_extension(&self, name: &str) -> Operation {
        Operation::new(
            OperationKind::CreateExtension,
            name,
            format!("CREATE EXTENSION IF NOT EXISTS {};", quote_extension(name)),
        )
    }

    pub fn drop_extension(&self, name: &str) -> Operation {
        Operation::new(
            OperationKind::DropExtension,
            name,
            format!("DROP EXTENSION IF EXISTS {} CASCADE;", quote_extension(name)),
        )
    }

    /// `CREATE TABLE` with columns and primary key; indexes, foreign keys and
    /// partitioning are separate operations
    pub fn create_table(&self, table: &TableSnapshot) -> Operation {
        let mut definitions: Vec<String> = table
            .columns
            .iter()
            .map(|column| format!("  {}", self.column_definition(&table.name, column)))
            .collect();

        if !table.primary_key.is_empty() {
            definitions.push(format!("  PRIMARY KEY ({})", table.primary_key.join(", ")));
        }

        Operation::new(
            OperationKind::CreateTable,
            &table.name,
            format!(
                "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
                table.name,
                definitions.join(",\n")
            ),
        )
    }

    pub fn drop_table(&self, table: &str) -> Operation {
        Operation::new(
            OperationKind::DropTable,
            table,
            format!("DROP TABLE IF EXISTS {} CASCADE;", table),
        )
    }

    /// Column definition as used in `CREATE TABLE` and `ADD COLUMN`.
    ///
    /// A unique column names its constraint explicitly so `set_unique` can drop it later.
    pub fn column_definition(&self, table: &str, column: &ColumnSnapshot) -> String {
        let mut sql = format!("{} {}", column.name, column.data_type);

        let expr = column.generated_expr.trim();
        if !expr.is_empty() {
            sql.push_str(&format!(" GENERATED ALWAYS AS ({}) STORED", expr));
            return sql;
        }

        if let Some(identity) = column.identity {
            sql.push_str(&format!(" GENERATED {} AS IDENTITY", identity.as_sql()));
        } else {
            if !column.nullable {
                sql.push_str(" NOT NULL");
            }
            if let Some(default) = &column.default {
                sql.push_str(&format!(" DEFAULT {}", default));
            }
        }

        if column.unique {
            let constraint = unique_constraint_name(table, &column.name, self.max_identifier_length);
            sql.push_str(&format!(" CONSTRAINT {} UNIQUE", constraint));
        }

        sql
    }

    pub fn add_column(&self, table: &str, column: &ColumnSnapshot) -> Operation {
        Operation::new(
            OperationKind::AddColumn,
            column_target(table, &column.name),
            format!("ALTER TABLE {} ADD COLUMN {};", table, self.column_definition(table, column)),
        )
    }

    pub fn drop_column(&self, table: &str, column: &str) -> Operation {
        Operation::new(
            OperationKind::DropColumn,
            column_target(table, column),
            format!("ALTER TABLE {} DROP COLUMN IF EXISTS {} CASCADE;", table, column),
        )
    }

    fn alter_column(&self, table: &str, column: &str, action: &str) -> Operation {
        Operation::new(
            OperationKind::AlterColumn,
            column_target(table, column),
            format!("ALTER TABLE {} ALTER COLUMN {} {};", table, column, action),
        )
    }

    pub fn alter_column_type(&self, table: &str, column: &str, data_type: &str) -> Operation {
        self.alter_column(table, column, &format!("TYPE {}", data_type))
    }

    pub fn set_nullable(&self, table: &str, column: &str, nullable: bool) -> Operation {
        self.alter_column(table, column, if nullable { "DROP NOT NULL" } else { "SET NOT NULL" })
    }

    pub fn set_default(&self, table: &str, column: &str, default: Option<&str>) -> Operation {
        match default {
            Some(expr) => self.alter_column(table, column, &format!("SET DEFAULT {}", expr)),
            None => self.alter_column(table, column, "DROP DEFAULT"),
        }
    }

    pub fn add_identity(&self, table: &str, column: &str, kind: IdentityKind) -> Operation {
        self.alter_column(table, column, &format!("ADD GENERATED {} AS IDENTITY", kind.as_sql()))
    }

    pub fn drop_identity(&self, table: &str, column: &str) -> Operation {
        self.alter_column(table, column, "DROP IDENTITY IF EXISTS")
    }

    /// Toggle the inline unique constraint of a plain column
    pub fn set_unique(&self, table: &str, column: &str, unique: bool) -> Operation {
        let constraint = unique_constraint_name(table, column, self.max_identifier_length);
        let sql = if unique {
            format!("ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({});", table, constraint, column)
        } else {
            format!("ALTER TABLE {} DROP CONSTRAINT IF EXISTS {};", table, constraint)
        };
        Operation::new(OperationKind::AlterColumn, column_target(table, column), sql)
    }

    pub fn create_index(&self, table: &str, index: &IndexSnapshot) -> Operation {
        let mut sql = format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {}",
            if index.unique { "UNIQUE " } else { "" },
            index.name,
            table
        );
        if let Some(method) = index.method.as_deref().filter(|m| !m.trim().is_empty()) {
            sql.push_str(&format!(" USING {}", method.trim()));
        }
        sql.push_str(&format!(" ({})", index.columns.join(", ")));
        if index.nulls_not_distinct {
            sql.push_str(" NULLS NOT DISTINCT");
        }
        if let Some(predicate) = index.predicate.as_deref().filter(|p| !p.trim().is_empty()) {
            sql.push_str(&format!(" WHERE {}", predicate.trim()));
        }
        sql.push(';');

        Operation::new(OperationKind::CreateIndex, column_target(table, &index.name), sql)
    }

    pub fn drop_index(&self, table: &str, index: &str) -> Operation {
        Operation::new(
            OperationKind::DropIndex,
            column_target(table, index),
            format!("DROP INDEX IF EXISTS {} CASCADE;", index),
        )
    }

    pub fn add_foreign_key(&self, table: &str, fk: &ForeignKeySnapshot) -> Operation {
        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            table, fk.constraint, fk.column, fk.target_table, fk.target_column
        );
        if fk.on_delete != ReferentialAction::NoAction {
            sql.push_str(&format!(" ON DELETE {}", fk.on_delete.as_sql()));
        }
        if fk.on_update != ReferentialAction::NoAction {
            sql.push_str(&format!(" ON UPDATE {}", fk.on_update.as_sql()));
        }
        sql.push(';');

        Operation::new(OperationKind::AddForeignKey, column_target(table, &fk.constraint), sql)
    }

    pub fn drop_foreign_key(&self, table: &str, constraint: &str) -> Operation {
        Operation::new(
            OperationKind::DropForeignKey,
            column_target(table, constraint),
            format!("ALTER TABLE {} DROP CONSTRAINT IF EXISTS {} CASCADE;", table, constraint),
        )
    }

    pub fn create_hypertable(&self, table: &str, column: &str) -> Operation {
        Operation::new(
            OperationKind::CreateHypertable,
            column_target(table, column),
            format!(
                "SELECT create_hypertable('{}', '{}', if_not_exists => TRUE, migrate_data => TRUE);",
                table, column
            ),
        )
    }

    /// TimescaleDB cannot turn a hypertable back into a plain table in place
    pub fn drop_hypertable(&self, table: &str, column: &str) -> Operation {
        Operation::new(
            OperationKind::DropHypertable,
            column_target(table, column),
            format!(
                "-- MANUAL STEP: {} is no longer partitioned on {}; recreate it as a plain table to undo the hypertable.",
                table, column
            ),
        )
    }
}

fn column_target(table: &str, object: &str) -> String {
    format!("{}.{}", table, object)
}

fn quote_extension(name: &str) -> String {
    if name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}
