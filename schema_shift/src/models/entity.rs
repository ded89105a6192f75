//! Entity model consumed from the schema-loading stage
//!
//! Entities, their fields, relationship edges and indexes as the schema author
//! declared them. The synthesizer fills in whatever the author left implicit
//! and downstream emitters read the finalized list.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::field_type::FieldType;
use crate::utils::naming::{foreign_key_column, get_table_name, normalize_identifier, normalize_override, pluralize};

/// Free-form annotations carried through to downstream emitters
pub type Annotations = BTreeMap<String, serde_json::Value>;

/// A declared entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    /// Field whose column drives time partitioning
    #[serde(default)]
    pub hypertable: Option<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub annotations: Annotations,
}

impl Entity {
    /// Create an empty entity
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            fields: Vec::new(),
            edges: Vec::new(),
            indexes: Vec::new(),
            hypertable: None,
            extensions: Vec::new(),
            annotations: Annotations::new(),
        }
    }

    /// Add a field
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Add an edge
    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Add an index
    pub fn with_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Mark a field as the time-partition column
    pub fn with_hypertable(mut self, field: impl Into<String>) -> Self {
        self.hypertable = Some(field.into());
        self
    }

    /// Canonicalize every name override in place; blank overrides become absent
    pub fn normalize_identifiers(&mut self) {
        self.table = normalize_override(self.table.as_deref());
        for field in &mut self.fields {
            field.column = normalize_override(field.column.as_deref());
        }
        for edge in &mut self.edges {
            edge.column = normalize_override(edge.column.as_deref());
            edge.through = normalize_override(edge.through.as_deref());
        }
        for index in &mut self.indexes {
            index.name = index.name.trim().to_string();
        }
    }

    /// Table backing this entity
    pub fn table_name(&self, pluralize_tables: bool) -> String {
        normalize_override(self.table.as_deref())
            .unwrap_or_else(|| get_table_name(&self.name, pluralize_tables))
    }

    /// The primary-key field, when exactly one is declared
    pub fn primary_field(&self) -> Option<&Field> {
        let mut primaries = self.fields.iter().filter(|f| f.primary);
        match (primaries.next(), primaries.next()) {
            (Some(field), None) => Some(field),
            _ => None,
        }
    }

    /// Find a field by its column name
    pub fn field_by_column(&self, column: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.column_name() == column)
    }

    /// Find an edge by name
    pub fn edge(&self, name: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.name == name)
    }

    /// Column of the time-partition field
    pub fn hypertable_column(&self) -> Option<String> {
        let field = self.hypertable.as_deref()?;
        Some(
            self.fields
                .iter()
                .find(|f| f.name == field || f.column_name() == normalize_identifier(field))
                .map(|f| f.column_name())
                .unwrap_or_else(|| normalize_identifier(field)),
        )
    }
}

/// A scalar field of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Explicit column name; normalized, empty means "derive from name"
    #[serde(default)]
    pub column: Option<String>,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary: bool,
    /// Literal or expression default
    #[serde(default)]
    pub default: Option<String>,
    /// Expression of a generated (computed) column
    #[serde(default)]
    pub generated: Option<String>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub identity: Option<IdentityKind>,
    #[serde(default, rename = "enum")]
    pub enum_def: Option<EnumDef>,
    /// Language-side type override for code emitters
    #[serde(default)]
    pub lang_type: Option<String>,
    #[serde(default)]
    pub annotations: Annotations,
}

impl Field {
    /// Create a non-null field of the given type
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            column: None,
            field_type,
            nullable: false,
            unique: false,
            primary: false,
            default: None,
            generated: None,
            read_only: false,
            identity: None,
            enum_def: None,
            lang_type: None,
            annotations: Annotations::new(),
        }
    }

    /// Shorthand for a primary-key field
    pub fn primary(name: impl Into<String>, field_type: FieldType) -> Self {
        Self::new(name, field_type).primary_key()
    }

    pub fn primary_key(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    pub fn generated_as(mut self, expr: impl Into<String>) -> Self {
        self.generated = Some(expr.into());
        self
    }

    pub fn with_identity(mut self, kind: IdentityKind) -> Self {
        self.identity = Some(kind);
        self
    }

    pub fn with_enum(mut self, name: impl Into<String>, values: &[&str]) -> Self {
        self.field_type = FieldType::Enum;
        self.enum_def = Some(EnumDef {
            name: name.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    /// Derived column name
    pub fn column_name(&self) -> String {
        normalize_override(self.column.as_deref()).unwrap_or_else(|| normalize_identifier(&self.name))
    }

    /// Whether the column value is computed rather than stored by writers
    pub fn is_computed(&self) -> bool {
        self.generated.as_deref().map_or(false, |expr| !expr.trim().is_empty())
    }
}

/// Identity-column generation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Always,
    ByDefault,
}

impl IdentityKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            IdentityKind::Always => "ALWAYS",
            IdentityKind::ByDefault => "BY DEFAULT",
        }
    }
}

/// Closed value set of an enum-typed field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    pub name: String,
    pub values: Vec<String>,
}

/// Relationship cardinality, seen from the owning entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    ToOne,
    ToMany,
    ManyToMany,
}

impl EdgeKind {
    /// Kind of the synthesized inverse edge
    pub fn inverse(&self) -> EdgeKind {
        match self {
            EdgeKind::ToOne => EdgeKind::ToMany,
            EdgeKind::ToMany => EdgeKind::ToOne,
            EdgeKind::ManyToMany => EdgeKind::ManyToMany,
        }
    }
}

/// Foreign-key referential action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    #[default]
    NoAction,
    Cascade,
    Restrict,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        }
    }
}

/// Alternate target of a polymorphic edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolymorphicTarget {
    pub entity: String,
    /// Predicate telling rows of this target apart, consumed by emitters
    #[serde(default)]
    pub predicate: Option<String>,
}

/// A declared relationship from the owning entity to `target`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub name: String,
    pub target: String,
    pub kind: EdgeKind,
    /// Backing foreign-key column: on the owner for to-one edges, on the
    /// target for to-many edges
    #[serde(default)]
    pub column: Option<String>,
    /// Name of the counterpart edge on the target
    #[serde(default)]
    pub inverse: Option<String>,
    /// Join-table override (many-to-many only)
    #[serde(default)]
    pub through: Option<String>,
    #[serde(default)]
    pub on_delete: ReferentialAction,
    #[serde(default)]
    pub on_update: ReferentialAction,
    /// The foreign-key column may be null
    #[serde(default)]
    pub optional: bool,
    /// Explicitly allowed to share its backing column with another to-one edge
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub polymorphic: Vec<PolymorphicTarget>,
    /// Created by inverse synthesis rather than declared
    #[serde(default)]
    pub generated: bool,
}

impl Edge {
    pub fn new(name: impl Into<String>, target: impl Into<String>, kind: EdgeKind) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            kind,
            column: None,
            inverse: None,
            through: None,
            on_delete: ReferentialAction::NoAction,
            on_update: ReferentialAction::NoAction,
            optional: false,
            shared: false,
            polymorphic: Vec::new(),
            generated: false,
        }
    }

    pub fn to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, EdgeKind::ToOne)
    }

    pub fn to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, EdgeKind::ToMany)
    }

    pub fn many_to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, EdgeKind::ManyToMany)
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_inverse(mut self, name: impl Into<String>) -> Self {
        self.inverse = Some(name.into());
        self
    }

    pub fn through(mut self, table: impl Into<String>) -> Self {
        self.through = Some(table.into());
        self
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = action;
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = action;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn shared(mut self) -> Self {
        self.shared = true;
        self
    }

    pub fn with_polymorphic(mut self, entity: impl Into<String>, predicate: Option<&str>) -> Self {
        self.polymorphic.push(PolymorphicTarget {
            entity: entity.into(),
            predicate: predicate.map(str::to_string),
        });
        self
    }

    /// Explicit column, normalized
    pub fn explicit_column(&self) -> Option<String> {
        normalize_override(self.column.as_deref())
    }

    /// Backing foreign-key column for to-one and to-many edges.
    ///
    /// Defaults to `<parent>_id` where the parent is the "one" side: the
    /// target of a to-one edge, the owner of a to-many edge.
    pub fn fk_column(&self, owner: &str) -> Option<String> {
        match self.kind {
            EdgeKind::ToOne => Some(self.explicit_column().unwrap_or_else(|| foreign_key_column(&self.target))),
            EdgeKind::ToMany => Some(self.explicit_column().unwrap_or_else(|| foreign_key_column(owner))),
            EdgeKind::ManyToMany => None,
        }
    }

    /// Whether the edge points back at its owner
    pub fn is_self_referential(&self, owner: &str) -> bool {
        self.target == owner
    }

    pub fn is_polymorphic(&self) -> bool {
        !self.polymorphic.is_empty()
    }

    /// Default name for the inverse edge synthesized on the target
    pub fn default_inverse_name(&self, owner: &str) -> String {
        let owner = normalize_identifier(owner);
        match self.kind {
            EdgeKind::ToMany => owner,
            EdgeKind::ToOne | EdgeKind::ManyToMany => pluralize(&owner),
        }
    }
}

/// A declared index over entity columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// Derived from the naming pattern when empty
    #[serde(default)]
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    /// Partial-index predicate
    #[serde(default, rename = "where")]
    pub predicate: Option<String>,
    /// Access method such as `gin` or `brin`
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub nulls_not_distinct: bool,
}

impl Index {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            name: String::new(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique: false,
            predicate: None,
            method: None,
            nulls_not_distinct: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn partial(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn using(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn nulls_not_distinct(mut self) -> Self {
        self.nulls_not_distinct = true;
        self
    }
}
