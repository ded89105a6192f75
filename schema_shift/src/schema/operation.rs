//! Migration operations

use std::fmt;

use serde::Serialize;

/// Kind of an atomic DDL step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    CreateExtension,
    DropExtension,
    CreateTable,
    DropTable,
    AddColumn,
    DropColumn,
    AlterColumn,
    CreateIndex,
    DropIndex,
    AddForeignKey,
    DropForeignKey,
    CreateHypertable,
    DropHypertable,
}

impl OperationKind {
    /// Whether the step removes something from the database
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            OperationKind::DropExtension
                | OperationKind::DropTable
                | OperationKind::DropColumn
                | OperationKind::DropIndex
                | OperationKind::DropForeignKey
                | OperationKind::DropHypertable
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::CreateExtension => "create_extension",
            OperationKind::DropExtension => "drop_extension",
            OperationKind::CreateTable => "create_table",
            OperationKind::DropTable => "drop_table",
            OperationKind::AddColumn => "add_column",
            OperationKind::DropColumn => "drop_column",
            OperationKind::AlterColumn => "alter_column",
            OperationKind::CreateIndex => "create_index",
            OperationKind::DropIndex => "drop_index",
            OperationKind::AddForeignKey => "add_foreign_key",
            OperationKind::DropForeignKey => "drop_foreign_key",
            OperationKind::CreateHypertable => "create_hypertable",
            OperationKind::DropHypertable => "drop_hypertable",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One atomic DDL step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub kind: OperationKind,
    /// Object the step acts on, e.g. `users.email`
    pub target: String,
    pub sql: String,
}

impl Operation {
    pub fn new(kind: OperationKind, target: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            kind,
            target: target.into(),
            sql: sql.into(),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.target)
    }
}
