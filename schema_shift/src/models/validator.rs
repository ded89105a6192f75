//! Schema validation
//!
//! Checks referential consistency of a synthesized entity list. Every problem
//! is collected (never fail-fast) with its location and, where one can be
//! guessed, a suggested fix.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::entity::{Edge, EdgeKind, Entity, Field, ReferentialAction};
use crate::models::field_type::FieldType;
use crate::models::relation::{entity_index, find_counterpart, EdgeRef, RelationKey};
use crate::models::synthesizer::UnresolvedEdge;
use crate::utils::naming::{closest_match, normalize_identifier, normalize_override};

/// Maximum edit distance for "did you mean" suggestions
pub const SUGGESTION_DISTANCE: usize = 3;

/// Where in the schema a problem was found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueLocation {
    pub entity: String,
    pub edge: Option<String>,
    pub field: Option<String>,
    pub column: Option<String>,
    pub target: Option<String>,
}

impl IssueLocation {
    pub fn entity(entity: &str) -> Self {
        Self {
            entity: entity.to_string(),
            ..Self::default()
        }
    }

    pub fn edge(entity: &str, edge: &Edge) -> Self {
        Self {
            entity: entity.to_string(),
            edge: Some(edge.name.clone()),
            target: Some(edge.target.clone()),
            ..Self::default()
        }
    }

    pub fn field(entity: &str, field: &Field) -> Self {
        Self {
            entity: entity.to_string(),
            field: Some(field.name.clone()),
            column: Some(field.column_name()),
            ..Self::default()
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }
}

impl fmt::Display for IssueLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.entity)?;
        if let Some(edge) = &self.edge {
            write!(f, ".{}", edge)?;
        }
        if let Some(field) = &self.field {
            write!(f, ".{}", field)?;
        }
        if let Some(column) = &self.column {
            write!(f, " (column {})", column)?;
        }
        if let Some(target) = &self.target {
            write!(f, " -> {}", target)?;
        }
        Ok(())
    }
}

/// A single schema-authoring problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub location: IssueLocation,
    pub message: String,
    pub suggestion: Option<String>,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        Ok(())
    }
}

/// Every problem found in one validation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    fn push(&mut self, location: IssueLocation, message: impl Into<String>, suggestion: Option<String>) {
        self.issues.push(ValidationIssue {
            location,
            message: message.into(),
            suggestion,
        });
    }

    /// Turn a non-empty report into an error
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {}", issue)?;
        }
        Ok(())
    }
}

/// Validates a synthesized entity list
#[derive(Debug)]
pub struct Validator {
    pluralize_tables: bool,
    unresolved: Vec<UnresolvedEdge>,
}

impl Validator {
    pub fn new(pluralize_tables: bool) -> Self {
        Self {
            pluralize_tables,
            unresolved: Vec::new(),
        }
    }

    /// Report edges synthesis could not pair with an inverse
    pub fn with_unresolved(mut self, unresolved: &[UnresolvedEdge]) -> Self {
        self.unresolved = unresolved.to_vec();
        self
    }

    /// Validate, failing with [`Error::Validation`] carrying every problem
    pub fn validate(&self, entities: &[Entity]) -> Result<()> {
        let report = self.check(entities);
        debug!(issues = report.len(), "Schema validation finished");
        report.into_result()
    }

    /// Collect every problem without failing
    pub fn check(&self, entities: &[Entity]) -> ValidationReport {
        let mut report = ValidationReport::default();
        let index = entity_index(entities);

        let mut seen = HashSet::new();
        for entity in entities {
            if !seen.insert(entity.name.as_str()) {
                report.push(
                    IssueLocation::entity(&entity.name),
                    "entity is declared more than once",
                    None,
                );
            }
        }

        let tables: BTreeMap<String, &str> = entities
            .iter()
            .map(|e| (e.table_name(self.pluralize_tables), e.name.as_str()))
            .collect();

        let mut order: Vec<usize> = (0..entities.len()).collect();
        order.sort_by(|a, b| entities[*a].name.cmp(&entities[*b].name));

        for entity_idx in order {
            let entity = &entities[entity_idx];
            self.check_primary_key(entity, &mut report);
            self.check_fields(entity, &mut report);
            self.check_indexes(entity, &mut report);
            self.check_hypertable(entity, &mut report);
            self.check_shared_columns(entity, &mut report);

            for (edge_idx, edge) in entity.edges.iter().enumerate() {
                let target = index.get(&edge.target).map(|&i| &entities[i]);
                if target.is_none() {
                    let names = entities.iter().map(|e| e.name.as_str());
                    report.push(
                        IssueLocation::edge(&entity.name, edge),
                        format!("unknown target entity '{}'", edge.target),
                        closest_match(&edge.target, names, SUGGESTION_DISTANCE)
                            .map(|name| format!("did you mean '{}'?", name)),
                    );
                }

                for alternate in &edge.polymorphic {
                    if !index.contains_key(&alternate.entity) {
                        let names = entities.iter().map(|e| e.name.as_str());
                        report.push(
                            IssueLocation {
                                target: Some(alternate.entity.clone()),
                                ..IssueLocation::edge(&entity.name, edge)
                            },
                            format!("unknown polymorphic target '{}'", alternate.entity),
                            closest_match(&alternate.entity, names, SUGGESTION_DISTANCE)
                                .map(|name| format!("did you mean '{}'?", name)),
                        );
                    }
                }

                match edge.kind {
                    EdgeKind::ToOne => self.check_to_one(entity, edge, target, &mut report),
                    EdgeKind::ToMany => self.check_to_many(entity, edge, &mut report),
                    EdgeKind::ManyToMany => self.check_many_to_many(entity, edge, &tables, &mut report),
                }

                let at = EdgeRef {
                    entity: entity_idx,
                    edge: edge_idx,
                };
                if let Some(found) = find_counterpart(entities, &index, at) {
                    let counterpart = &entities[found.entity].edges[found.edge];
                    // Each pair is reported once, from its smaller key.
                    let this_key = RelationKey::of(entity, edge);
                    let other_key = RelationKey::of(&entities[found.entity], counterpart);
                    if this_key < other_key {
                        self.check_pair(entity, edge, counterpart, &mut report);
                    }
                }
            }
        }

        self.check_unresolved(&mut report);
        report
    }

    fn check_unresolved(&self, report: &mut ValidationReport) {
        for unresolved in &self.unresolved {
            let taken = &unresolved.taken_by;
            let mut message = format!(
                "no inverse could be derived: '{}.{}' is already taken",
                taken.owner, unresolved.inverse_name
            );
            if let Some(paired) = &unresolved.paired_with {
                message.push_str(&format!(" by the inverse of '{}.{}'", taken.target, paired));
            }
            report.push(
                IssueLocation {
                    edge: Some(unresolved.edge.edge.clone()),
                    target: Some(unresolved.edge.target.clone()),
                    ..IssueLocation::entity(&unresolved.edge.owner)
                },
                message,
                Some(format!(
                    "set `inverse` on '{}' to an unused name and give it its own `column`",
                    unresolved.edge.edge
                )),
            );
        }
    }

    fn check_primary_key(&self, entity: &Entity, report: &mut ValidationReport) {
        let primaries: Vec<&Field> = entity.fields.iter().filter(|f| f.primary).collect();
        match primaries.len() {
            1 => {}
            0 => {
                let suggestion = entity
                    .fields
                    .iter()
                    .find(|f| f.column_name() == "id")
                    .map(|f| format!("mark field '{}' as primary", f.name))
                    .or_else(|| Some("declare an `id` field with `primary = true`".to_string()));
                report.push(IssueLocation::entity(&entity.name), "entity has no primary key field", suggestion);
            }
            _ => {
                let names: Vec<&str> = primaries.iter().map(|f| f.name.as_str()).collect();
                report.push(
                    IssueLocation::entity(&entity.name),
                    format!("more than one primary key field: {}", names.join(", ")),
                    Some("keep `primary = true` on exactly one field".to_string()),
                );
            }
        }
    }

    fn check_fields(&self, entity: &Entity, report: &mut ValidationReport) {
        let mut columns = HashSet::new();

        for field in &entity.fields {
            let location = IssueLocation::field(&entity.name, field);
            let column = field.column_name();

            if column.is_empty() {
                report.push(location.clone(), "field name normalizes to an empty column name", None);
            } else if !columns.insert(column.clone()) {
                report.push(
                    location.clone(),
                    format!("column '{}' is declared more than once", column),
                    Some("give one of the fields an explicit `column`".to_string()),
                );
            }

            if field.default.is_some() && field.generated.is_some() {
                report.push(
                    location.clone(),
                    "a generated column cannot also have a default",
                    Some("remove either `default` or `generated`".to_string()),
                );
            }

            if field.primary && field.is_computed() {
                report.push(location.clone(), "a primary key cannot be a generated column", None);
            }

            match (&field.field_type, &field.enum_def) {
                (FieldType::Enum, None) => report.push(
                    location.clone(),
                    "enum field has no enum definition",
                    Some("add `enum = { name = \"...\", values = [...] }`".to_string()),
                ),
                (FieldType::Enum, Some(def)) if def.values.is_empty() || def.name.trim().is_empty() => report.push(
                    location.clone(),
                    format!("enum '{}' needs a name and at least one value", def.name),
                    None,
                ),
                (other, Some(def)) if *other != FieldType::Enum => report.push(
                    location.clone(),
                    format!("enum definition '{}' on a field of type '{}'", def.name, other),
                    Some("set `type = \"enum\"`".to_string()),
                ),
                _ => {}
            }

            if let Some(identity) = field.identity {
                if !field.field_type.is_integer() {
                    report.push(
                        location.clone(),
                        format!(
                            "identity ({}) requires an integer type, found '{}'",
                            identity.as_sql(),
                            field.field_type
                        ),
                        Some("use `bigint` or `integer`".to_string()),
                    );
                }
                if field.is_computed() || field.default.is_some() {
                    report.push(location, "an identity column cannot have a default or expression", None);
                }
            }
        }
    }

    fn check_indexes(&self, entity: &Entity, report: &mut ValidationReport) {
        for index in &entity.indexes {
            let location = IssueLocation {
                field: (!index.name.is_empty()).then(|| index.name.clone()),
                ..IssueLocation::entity(&entity.name)
            };

            if index.columns.is_empty() {
                report.push(location.clone(), "index has no columns", None);
            }

            for column in &index.columns {
                let normalized = normalize_identifier(column);
                let exists = entity.field_by_column(&normalized).is_some()
                    || entity.fields.iter().any(|f| &f.name == column);
                if !exists {
                    let known: Vec<String> = entity.fields.iter().map(|f| f.column_name()).collect();
                    report.push(
                        location.clone().with_column(column.clone()),
                        format!("index column '{}' does not exist", column),
                        closest_match(&normalized, known.iter().map(String::as_str), SUGGESTION_DISTANCE)
                            .map(|name| format!("did you mean '{}'?", name)),
                    );
                }
            }
        }
    }

    fn check_hypertable(&self, entity: &Entity, report: &mut ValidationReport) {
        let Some(partition) = &entity.hypertable else {
            return;
        };
        let column = normalize_identifier(partition);
        let field = entity
            .fields
            .iter()
            .find(|f| &f.name == partition || f.column_name() == column);

        match field {
            None => report.push(
                IssueLocation::entity(&entity.name).with_column(column),
                format!("time-partition field '{}' does not exist", partition),
                None,
            ),
            Some(field) if !field.field_type.is_temporal() => report.push(
                IssueLocation::field(&entity.name, field),
                format!(
                    "time-partition column must be a date or timestamp, found '{}'",
                    field.field_type
                ),
                Some("use `timestamptz`".to_string()),
            ),
            Some(_) => {}
        }
    }

    fn check_shared_columns(&self, entity: &Entity, report: &mut ValidationReport) {
        let mut by_column: BTreeMap<String, Vec<&Edge>> = BTreeMap::new();
        for edge in entity.edges.iter().filter(|e| e.kind == EdgeKind::ToOne) {
            if edge.is_self_referential(&entity.name) && edge.explicit_column().is_none() {
                continue;
            }
            if let Some(column) = edge.fk_column(&entity.name) {
                by_column.entry(column).or_default().push(edge);
            }
        }

        for (column, edges) in by_column {
            if edges.len() > 1 && !edges.iter().all(|e| e.shared) {
                let names: Vec<&str> = edges.iter().map(|e| e.name.as_str()).collect();
                report.push(
                    IssueLocation::entity(&entity.name).with_column(column),
                    format!("to-one edges {} share a backing column", names.join(", ")),
                    Some("give each edge its own `column`, or mark all of them `shared = true`".to_string()),
                );
            }
        }
    }

    fn check_to_one(&self, entity: &Entity, edge: &Edge, target: Option<&Entity>, report: &mut ValidationReport) {
        if edge.is_self_referential(&entity.name) && edge.explicit_column().is_none() {
            report.push(
                IssueLocation::edge(&entity.name, edge),
                "self-referential to-one edge needs an explicit backing column",
                Some(format!("set `column = \"{}_id\"`", normalize_identifier(&edge.name))),
            );
            return;
        }

        let Some(column) = edge.fk_column(&entity.name) else {
            return;
        };
        let target_key = target.and_then(Entity::primary_field);

        match entity.field_by_column(&column) {
            None if !edge.generated => {
                let suggestion = match target_key {
                    Some(pk) => format!(
                        "declare field `{}` of type `{}`",
                        column,
                        pk.field_type.reference_type()
                    ),
                    None => format!("declare field `{}`", column),
                };
                report.push(
                    IssueLocation::edge(&entity.name, edge).with_column(column.clone()),
                    format!("backing column '{}' is not a declared field", column),
                    Some(suggestion),
                );
            }
            None => {}
            Some(field) => {
                if let Some(pk) = target_key {
                    let expected = pk.field_type.reference_type();
                    if field.field_type.reference_type() != expected {
                        report.push(
                            IssueLocation::edge(&entity.name, edge).with_column(column.clone()),
                            format!(
                                "column '{}' has type '{}' but {}.{} is '{}'",
                                column,
                                field.field_type,
                                edge.target,
                                pk.column_name(),
                                expected
                            ),
                            Some(format!("declare `{}` as `{}`", field.name, expected)),
                        );
                    }
                }
            }
        }
    }

    fn check_to_many(&self, entity: &Entity, edge: &Edge, report: &mut ValidationReport) {
        if edge.is_self_referential(&entity.name) && edge.inverse.is_none() {
            report.push(
                IssueLocation::edge(&entity.name, edge),
                "self-referential to-many edge needs an explicit inverse name",
                Some("set `inverse = \"parent\"` and declare the matching to-one edge".to_string()),
            );
        }
    }

    fn check_many_to_many(
        &self,
        entity: &Entity,
        edge: &Edge,
        tables: &BTreeMap<String, &str>,
        report: &mut ValidationReport,
    ) {
        let Some(through) = normalize_override(edge.through.as_deref()) else {
            return;
        };
        if let Some(owner) = tables.get(&through) {
            report.push(
                IssueLocation::edge(&entity.name, edge),
                format!("join table '{}' collides with the table of entity '{}'", through, owner),
                Some("set a distinct `through` name".to_string()),
            );
        }
    }

    fn check_pair(&self, entity: &Entity, edge: &Edge, counterpart: &Edge, report: &mut ValidationReport) {
        let location = IssueLocation::edge(&entity.name, edge);

        match edge.kind {
            EdgeKind::ManyToMany => {
                if let (Some(a), Some(b)) = (&edge.through, &counterpart.through) {
                    if normalize_identifier(a) != normalize_identifier(b) {
                        report.push(
                            location.clone(),
                            format!(
                                "join table '{}' disagrees with inverse '{}' ('{}')",
                                a, counterpart.name, b
                            ),
                            None,
                        );
                    }
                }
            }
            _ => {
                if let (Some(a), Some(b)) = (edge.explicit_column(), counterpart.explicit_column()) {
                    if a != b {
                        report.push(
                            location.clone(),
                            format!(
                                "backing column '{}' disagrees with inverse '{}' ('{}')",
                                a, counterpart.name, b
                            ),
                            Some(format!("use `column = \"{}\"` on both edges", a)),
                        );
                    }
                }
            }
        }

        let differs = |a: ReferentialAction, b: ReferentialAction| {
            a != b && a != ReferentialAction::NoAction && b != ReferentialAction::NoAction
        };
        if differs(edge.on_delete, counterpart.on_delete) || differs(edge.on_update, counterpart.on_update) {
            report.push(
                location,
                format!("cascade policy disagrees with inverse '{}'", counterpart.name),
                Some("declare the policy on one side only".to_string()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entity::Index;
    use crate::models::synthesizer::RelationSynthesizer;

    fn validate(mut entities: Vec<Entity>) -> ValidationReport {
        let synthesis = RelationSynthesizer::new().synthesize(&mut entities);
        Validator::new(true).with_unresolved(&synthesis.unresolved).check(&entities)
    }

    fn user() -> Entity {
        Entity::new("User").with_field(Field::primary("id", FieldType::Uuid))
    }

    #[test]
    fn test_valid_schema_passes() {
        let report = validate(vec![
            user().with_edge(Edge::to_many("pets", "Pet").on_delete(ReferentialAction::Cascade)),
            Entity::new("Pet").with_field(Field::primary("id", FieldType::Uuid)),
        ]);
        assert!(report.is_empty(), "{}", report);
    }

    #[test]
    fn test_unknown_target_suggests_nearest() {
        let report = validate(vec![
            user().with_edge(Edge::to_many("pets", "Pett")),
            Entity::new("Pet").with_field(Field::primary("id", FieldType::Uuid)),
        ]);

        assert_eq!(report.len(), 1);
        let issue = &report.issues[0];
        assert_eq!(issue.location.entity, "User");
        assert_eq!(issue.location.target.as_deref(), Some("Pett"));
        assert_eq!(issue.suggestion.as_deref(), Some("did you mean 'Pet'?"));
    }

    #[test]
    fn test_to_one_requires_declared_field_with_matching_type() {
        let report = validate(vec![
            user(),
            Entity::new("Pet")
                .with_field(Field::primary("id", FieldType::Uuid))
                .with_edge(Edge::to_one("owner", "User").with_column("owner_id")),
            Entity::new("Toy")
                .with_field(Field::primary("id", FieldType::Uuid))
                .with_field(Field::new("user_id", FieldType::BigInt))
                .with_edge(Edge::to_one("user", "User")),
        ]);

        assert_eq!(report.len(), 2, "{}", report);
        assert!(report.issues[0].message.contains("'owner_id' is not a declared field"));
        assert_eq!(
            report.issues[0].suggestion.as_deref(),
            Some("declare field `owner_id` of type `uuid`")
        );
        assert!(report.issues[1].message.contains("has type 'bigint' but User.id is 'uuid'"));
        assert_eq!(report.issues[1].suggestion.as_deref(), Some("declare `user_id` as `uuid`"));
    }

    #[test]
    fn test_generated_inverse_is_exempt() {
        let report = validate(vec![
            user().with_edge(Edge::to_many("pets", "Pet")),
            Entity::new("Pet").with_field(Field::primary("id", FieldType::Uuid)),
        ]);
        assert!(report.is_empty());
    }

    #[test]
    fn test_shared_backing_column() {
        let shared = |explicit: bool| {
            let mut first = Edge::to_one("author", "User").with_column("user_id");
            let mut second = Edge::to_one("editor", "User").with_column("user_id");
            first.inverse = Some("authored".to_string());
            second.inverse = Some("edited".to_string());
            if explicit {
                first = first.shared();
                second = second.shared();
            }
            Entity::new("Post")
                .with_field(Field::primary("id", FieldType::Uuid))
                .with_field(Field::new("user_id", FieldType::Uuid))
                .with_edge(first)
                .with_edge(second)
        };

        let report = Validator::new(true).check(&[user(), shared(false)]);
        assert_eq!(report.len(), 1, "{}", report);
        assert!(report.issues[0].message.contains("author, editor share a backing column"));

        let report = Validator::new(true).check(&[user(), shared(true)]);
        assert!(report.is_empty(), "{}", report);
    }

    #[test]
    fn test_self_references_need_disambiguation() {
        let report = validate(vec![Entity::new("Category")
            .with_field(Field::primary("id", FieldType::BigInt))
            .with_edge(Edge::to_one("parent", "Category"))
            .with_edge(Edge::to_many("children", "Category"))]);

        let messages: Vec<&str> = report.issues.iter().map(|i| i.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "self-referential to-one edge needs an explicit backing column",
                "self-referential to-many edge needs an explicit inverse name",
            ]
        );
    }

    #[test]
    fn test_problems_are_batched_across_entities() {
        let report = validate(vec![
            Entity::new("Account")
                .with_field(Field::new("id", FieldType::Uuid))
                .with_field(Field::new("total", FieldType::Integer).with_default("0").generated_as("a + b"))
                .with_index(Index::new(&["emial"])),
            Entity::new("Reading")
                .with_field(Field::primary("id", FieldType::Uuid))
                .with_field(Field::new("value", FieldType::Real))
                .with_hypertable("value"),
        ]);

        assert_eq!(report.len(), 4, "{}", report);
        assert_eq!(report.issues[0].suggestion.as_deref(), Some("mark field 'id' as primary"));
        assert!(report.issues[1].message.contains("cannot also have a default"));
        assert!(report.issues[2].message.contains("index column 'emial'"));
        assert!(report.issues[3].message.contains("time-partition column"));
        assert!(Error::Validation(report).is_validation());
    }

    #[test]
    fn test_pair_cascade_disagreement() {
        let report = validate(vec![
            user().with_edge(Edge::to_many("pets", "Pet").on_delete(ReferentialAction::Cascade)),
            Entity::new("Pet")
                .with_field(Field::primary("id", FieldType::Uuid))
                .with_field(Field::new("user_id", FieldType::Uuid))
                .with_edge(Edge::to_one("owner", "User").on_delete(ReferentialAction::Restrict)),
        ]);

        assert_eq!(report.len(), 1, "{}", report);
        assert!(report.issues[0].message.contains("cascade policy disagrees"));
    }

    #[test]
    fn test_second_edge_without_inverse_is_reported() {
        let report = validate(vec![
            user()
                .with_edge(Edge::to_many("pets", "Pet"))
                .with_edge(Edge::to_many("adopted_pets", "Pet")),
            Entity::new("Pet").with_field(Field::primary("id", FieldType::Uuid)),
        ]);

        assert_eq!(report.len(), 1, "{}", report);
        let issue = &report.issues[0];
        assert_eq!(issue.location.entity, "User");
        assert_eq!(issue.location.edge.as_deref(), Some("adopted_pets"));
        assert_eq!(
            issue.message,
            "no inverse could be derived: 'Pet.user' is already taken by the inverse of 'User.pets'"
        );
        assert_eq!(
            issue.suggestion.as_deref(),
            Some("set `inverse` on 'adopted_pets' to an unused name and give it its own `column`")
        );
    }

    #[test]
    fn test_second_edge_with_inverse_and_column_passes() {
        let report = validate(vec![
            user().with_edge(Edge::to_many("pets", "Pet")).with_edge(
                Edge::to_many("adopted_pets", "Pet")
                    .with_inverse("adopter")
                    .with_column("adopter_id")
                    .optional(),
            ),
            Entity::new("Pet").with_field(Field::primary("id", FieldType::Uuid)),
        ]);
        assert!(report.is_empty(), "{}", report);
    }

    #[test]
    fn test_report_display() {
        let mut report = ValidationReport::default();
        report.push(
            IssueLocation::entity("User").with_column("email"),
            "column 'email' is declared more than once",
            None,
        );
        assert_eq!(
            report.to_string(),
            "  - User (column email): column 'email' is declared more than once"
        );
    }
}
