//! Type definitions for the persisted schema snapshot
//!
//! A snapshot is the last relational shape recorded for the database and the
//! baseline every diff starts from.

use serde::{Deserialize, Serialize};

use crate::models::entity::{IdentityKind, ReferentialAction};

/// Represents a complete database shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSnapshot {
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub tables: Vec<TableSnapshot>,
}

impl SchemaSnapshot {
    /// Create a new empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing has been recorded yet (first run)
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.extensions.is_empty()
    }

    /// Look up a table by name
    pub fn table(&self, name: &str) -> Option<&TableSnapshot> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Add a table to the snapshot
    pub fn add_table(&mut self, table: TableSnapshot) {
        self.tables.push(table);
    }
}

/// Represents a database table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSnapshot {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnSnapshot>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub indexes: Vec<IndexSnapshot>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeySnapshot>,
    #[serde(default)]
    pub hypertable_column: Option<String>,
    #[serde(default)]
    pub is_join_table: bool,
}

impl TableSnapshot {
    /// Create a new table with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            hypertable_column: None,
            is_join_table: false,
        }
    }

    /// Add a column to the table
    pub fn add_column(&mut self, column: ColumnSnapshot) {
        self.columns.push(column);
    }

    /// Add an index unless one with the same name exists
    pub fn add_index(&mut self, index: IndexSnapshot) {
        if !self.indexes.iter().any(|i| i.name == index.name) {
            self.indexes.push(index);
        }
    }

    /// Add a foreign key unless one with the same constraint name exists
    pub fn add_foreign_key(&mut self, fk: ForeignKeySnapshot) {
        if !self.foreign_keys.iter().any(|f| f.constraint == fk.constraint) {
            self.foreign_keys.push(fk);
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSnapshot> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether two tables are the same object (anything else is drop plus create)
    pub fn same_identity(&self, other: &TableSnapshot) -> bool {
        self.name == other.name && self.is_join_table == other.is_join_table && self.primary_key == other.primary_key
    }
}

/// Represents a database column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSnapshot {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub default: Option<String>,
    /// Non-empty only for computed columns
    #[serde(default)]
    pub generated_expr: String,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<IdentityKind>,
}

impl ColumnSnapshot {
    /// Create a new non-null column with the given name and type
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable: false,
            unique: false,
            default: None,
            generated_expr: String::new(),
            read_only: false,
            identity: None,
        }
    }

    /// Set whether the column is nullable
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Set a default value for the column
    pub fn default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn generated(mut self, expr: &str) -> Self {
        self.generated_expr = expr.to_string();
        self
    }

    pub fn identity(mut self, kind: IdentityKind) -> Self {
        self.identity = Some(kind);
        self
    }

    /// Computed columns cannot be altered in place
    pub fn is_computed(&self) -> bool {
        !self.generated_expr.trim().is_empty() || self.read_only
    }
}

/// Represents an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSnapshot {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, rename = "where")]
    pub predicate: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub nulls_not_distinct: bool,
}

impl IndexSnapshot {
    pub fn new(name: &str, columns: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            columns,
            unique: false,
            predicate: None,
            method: None,
            nulls_not_distinct: false,
        }
    }

    pub fn mentions(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// Represents a foreign key constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeySnapshot {
    pub constraint: String,
    pub column: String,
    pub target_table: String,
    pub target_column: String,
    #[serde(default)]
    pub on_delete: ReferentialAction,
    #[serde(default)]
    pub on_update: ReferentialAction,
}
