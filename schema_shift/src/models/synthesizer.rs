//! Relationship synthesis
//!
//! Fills in everything the schema author left implicit so later stages see no
//! ambiguity: default foreign-key columns, join-table names, inverse edges on
//! target entities and the foreign-key fields those inverses need.

use serde_json::Value;
use tracing::{debug, warn};

use crate::models::entity::{Edge, EdgeKind, Entity, Field, ReferentialAction};
use crate::models::relation::{entity_index, find_counterpart, EdgeRef, RelationKey};
use crate::utils::naming::{join_table_name, normalize_override};

/// Annotation set on fields the synthesizer derived
pub const SYNTHESIZED_ANNOTATION: &str = "synthesized";

/// What a synthesis pass added
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SynthesisReport {
    /// Inverse edges created, keyed by their own (owner, edge, target)
    pub inverses: Vec<RelationKey>,
    /// Foreign-key fields derived, as (entity, column)
    pub columns: Vec<(String, String)>,
    /// Edges left without an inverse because its name was already taken
    pub unresolved: Vec<UnresolvedEdge>,
}

impl SynthesisReport {
    /// Whether the pass added nothing
    pub fn is_empty(&self) -> bool {
        self.inverses.is_empty() && self.columns.is_empty()
    }
}

/// A declared edge whose inverse could not be synthesized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedEdge {
    pub edge: RelationKey,
    /// Inverse name the edge would have received
    pub inverse_name: String,
    /// Edge on the target already holding that name
    pub taken_by: RelationKey,
    /// Owner-side edge `taken_by` is paired with
    pub paired_with: Option<String>,
}

/// Derives implicit relationship structure in place
#[derive(Debug, Default)]
pub struct RelationSynthesizer;

impl RelationSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Run synthesis over `entities`.
    ///
    /// Entities are visited in name order so the result does not depend on
    /// loader order. Running it again over its own output adds nothing.
    pub fn synthesize(&self, entities: &mut [Entity]) -> SynthesisReport {
        let mut report = SynthesisReport::default();
        let index = entity_index(entities);

        let mut order: Vec<usize> = (0..entities.len()).collect();
        order.sort_by(|a, b| entities[*a].name.cmp(&entities[*b].name));

        for owner_idx in order {
            let declared = entities[owner_idx].edges.len();
            for edge_idx in 0..declared {
                let at = EdgeRef {
                    entity: owner_idx,
                    edge: edge_idx,
                };
                let edge = &entities[owner_idx].edges[edge_idx];
                if edge.generated {
                    continue;
                }
                let kind = edge.kind;
                let Some(&target_idx) = index.get(&edge.target) else {
                    continue;
                };

                match kind {
                    EdgeKind::ManyToMany => self.link_many_to_many(entities, &index, at, target_idx, &mut report),
                    EdgeKind::ToMany | EdgeKind::ToOne => {
                        self.link_foreign_key(entities, &index, at, target_idx, &mut report)
                    }
                }
            }
        }

        debug!(
            inverses = report.inverses.len(),
            columns = report.columns.len(),
            "Relationship synthesis complete"
        );
        report
    }

    fn link_many_to_many(
        &self,
        entities: &mut [Entity],
        index: &indexmap::IndexMap<String, usize>,
        at: EdgeRef,
        target_idx: usize,
        report: &mut SynthesisReport,
    ) {
        let owner_name = entities[at.entity].name.clone();
        let edge = entities[at.entity].edges[at.edge].clone();
        let through = normalize_override(edge.through.as_deref())
            .unwrap_or_else(|| join_table_name(&owner_name, &edge.target));

        entities[at.entity].edges[at.edge].through = Some(through.clone());

        if let Some(found) = find_counterpart(entities, index, at) {
            let counterpart_name = entities[found.entity].edges[found.edge].name.clone();
            let counterpart = &mut entities[found.entity].edges[found.edge];
            counterpart.through.get_or_insert_with(|| through.clone());
            counterpart.inverse.get_or_insert_with(|| edge.name.clone());
            sync_actions(&edge, counterpart);
            let counterpart = counterpart.clone();

            let source = &mut entities[at.entity].edges[at.edge];
            source.inverse.get_or_insert(counterpart_name);
            sync_actions(&counterpart, source);
            return;
        }

        let inverse_name = edge.inverse.clone().unwrap_or_else(|| edge.default_inverse_name(&owner_name));
        if let Some(taken) = entities[target_idx].edge(&inverse_name) {
            warn!(
                entity = %edge.target,
                edge = %inverse_name,
                "Inverse edge name already taken by an unrelated edge"
            );
            report.unresolved.push(UnresolvedEdge {
                edge: RelationKey::of(&entities[at.entity], &edge),
                inverse_name: inverse_name.clone(),
                taken_by: RelationKey::of(&entities[target_idx], taken),
                paired_with: taken.inverse.clone(),
            });
            return;
        }

        let mut inverse = Edge::many_to_many(&inverse_name, &owner_name)
            .through(&through)
            .with_inverse(&edge.name)
            .on_delete(edge.on_delete)
            .on_update(edge.on_update);
        inverse.generated = true;

        report.inverses.push(RelationKey::of(&entities[target_idx], &inverse));
        entities[target_idx].edges.push(inverse);
        entities[at.entity].edges[at.edge].inverse = Some(inverse_name);
    }

    fn link_foreign_key(
        &self,
        entities: &mut [Entity],
        index: &indexmap::IndexMap<String, usize>,
        at: EdgeRef,
        target_idx: usize,
        report: &mut SynthesisReport,
    ) {
        let owner_name = entities[at.entity].name.clone();
        let edge = entities[at.entity].edges[at.edge].clone();

        // Which side of a self-join is parent cannot be guessed; the
        // validator reports these.
        if edge.is_self_referential(&owner_name) {
            let ambiguous = match edge.kind {
                EdgeKind::ToOne => edge.explicit_column().is_none(),
                _ => edge.inverse.is_none(),
            };
            if ambiguous {
                return;
            }
        }

        if let Some(found) = find_counterpart(entities, index, at) {
            let counterpart = entities[found.entity].edges[found.edge].clone();
            let (to_one, to_many) = match edge.kind {
                EdgeKind::ToOne => (&edge, &counterpart),
                _ => (&counterpart, &edge),
            };
            let column = to_one
                .explicit_column()
                .or_else(|| to_many.explicit_column())
                .or_else(|| edge.fk_column(&owner_name));
            let optional = edge.optional || counterpart.optional;

            let target_edge = &mut entities[found.entity].edges[found.edge];
            if target_edge.column.is_none() {
                target_edge.column = column.clone();
            }
            target_edge.inverse.get_or_insert_with(|| edge.name.clone());
            target_edge.optional = optional;
            sync_actions(&edge, target_edge);
            let synced = target_edge.clone();

            let source = &mut entities[at.entity].edges[at.edge];
            if source.column.is_none() {
                source.column = column;
            }
            source.inverse.get_or_insert_with(|| counterpart.name.clone());
            source.optional = optional;
            sync_actions(&synced, source);

            // Generated to-one sides have no declared field behind them.
            if edge.kind == EdgeKind::ToMany && counterpart.generated {
                self.ensure_fk_field(entities, at.entity, target_idx, report);
            }
            return;
        }

        let inverse_name = edge.inverse.clone().unwrap_or_else(|| edge.default_inverse_name(&owner_name));
        if let Some(taken) = entities[target_idx].edge(&inverse_name) {
            warn!(
                entity = %edge.target,
                edge = %inverse_name,
                "Inverse edge name already taken by an unrelated edge"
            );
            report.unresolved.push(UnresolvedEdge {
                edge: RelationKey::of(&entities[at.entity], &edge),
                inverse_name: inverse_name.clone(),
                taken_by: RelationKey::of(&entities[target_idx], taken),
                paired_with: taken.inverse.clone(),
            });
            return;
        }

        let column = edge.fk_column(&owner_name);
        let mut inverse = Edge::new(&inverse_name, &owner_name, edge.kind.inverse())
            .with_inverse(&edge.name)
            .on_delete(edge.on_delete)
            .on_update(edge.on_update);
        inverse.column = column.clone();
        inverse.optional = edge.optional;
        inverse.generated = true;

        report.inverses.push(RelationKey::of(&entities[target_idx], &inverse));
        entities[target_idx].edges.push(inverse);

        let source = &mut entities[at.entity].edges[at.edge];
        source.inverse = Some(inverse_name);
        source.column = column;

        if edge.kind == EdgeKind::ToMany {
            self.ensure_fk_field(entities, at.entity, target_idx, report);
        }
    }

    /// Derive the foreign-key field on `child_idx` for the to-many edge of
    /// `parent_idx` whose generated inverse lives on the child.
    fn ensure_fk_field(&self, entities: &mut [Entity], parent_idx: usize, child_idx: usize, report: &mut SynthesisReport) {
        let parent = &entities[parent_idx];
        let Some(pk) = parent.primary_field() else {
            return;
        };
        let key_type = pk.field_type.reference_type();

        let wanted: Vec<(String, bool)> = entities[child_idx]
            .edges
            .iter()
            .filter(|e| e.generated && e.kind == EdgeKind::ToOne && e.target == parent.name)
            .filter_map(|e| e.column.clone().map(|c| (c, e.optional)))
            .collect();

        for (column, optional) in wanted {
            let child = &mut entities[child_idx];
            if child.field_by_column(&column).is_some() {
                continue;
            }

            let mut field = Field::new(&column, key_type.clone());
            field.nullable = optional;
            field
                .annotations
                .insert(SYNTHESIZED_ANNOTATION.to_string(), Value::Bool(true));
            child.fields.push(field);

            debug!(entity = %child.name, column = %column, "Derived foreign-key column");
            report.columns.push((child.name.clone(), column));
        }
    }
}

/// Copy referential actions from `from` onto `to` where `to` left them at the default
fn sync_actions(from: &Edge, to: &mut Edge) {
    if to.on_delete == ReferentialAction::NoAction {
        to.on_delete = from.on_delete;
    }
    if to.on_update == ReferentialAction::NoAction {
        to.on_update = from.on_update;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field_type::FieldType;
    use pretty_assertions::assert_eq;

    fn user(edges: Vec<Edge>) -> Entity {
        let mut user = Entity::new("User").with_field(Field::primary("id", FieldType::Uuid));
        user.edges = edges;
        user
    }

    fn pet() -> Entity {
        Entity::new("Pet").with_field(Field::primary("id", FieldType::Uuid))
    }

    #[test]
    fn test_to_many_synthesizes_inverse_and_column() {
        let mut entities = vec![user(vec![Edge::to_many("pets", "Pet")]), pet()];

        let report = RelationSynthesizer::new().synthesize(&mut entities);

        assert_eq!(report.columns, vec![("Pet".to_string(), "user_id".to_string())]);
        let inverse = entities[1].edge("user").unwrap();
        assert!(inverse.generated);
        assert_eq!(inverse.kind, EdgeKind::ToOne);
        assert_eq!(inverse.column.as_deref(), Some("user_id"));
        assert_eq!(inverse.inverse.as_deref(), Some("pets"));

        let column = entities[1].field_by_column("user_id").unwrap();
        assert_eq!(column.field_type, FieldType::Uuid);
        assert!(!column.nullable);
        assert_eq!(entities[0].edges[0].column.as_deref(), Some("user_id"));
    }

    #[test]
    fn test_synthesis_is_idempotent() {
        let mut entities = vec![
            user(vec![
                Edge::to_many("pets", "Pet").on_delete(ReferentialAction::Cascade),
                Edge::many_to_many("groups", "Group"),
            ]),
            pet(),
            Entity::new("Group").with_field(Field::primary("id", FieldType::BigSerial)),
        ];

        let synthesizer = RelationSynthesizer::new();
        let first = synthesizer.synthesize(&mut entities);
        assert!(!first.is_empty());
        let after_first = entities.clone();

        let second = synthesizer.synthesize(&mut entities);
        assert!(second.is_empty());
        assert_eq!(entities, after_first);
    }

    #[test]
    fn test_explicit_inverse_wins() {
        let mut entities = vec![
            user(vec![Edge::to_many("pets", "Pet").on_delete(ReferentialAction::Cascade)]),
            pet()
                .with_field(Field::new("owner_id", FieldType::Uuid))
                .with_edge(Edge::to_one("owner", "User").with_column("owner_id")),
        ];

        let report = RelationSynthesizer::new().synthesize(&mut entities);

        assert!(report.inverses.is_empty());
        assert!(report.columns.is_empty());
        assert_eq!(entities[1].edges.len(), 1);
        let owner = &entities[1].edges[0];
        assert_eq!(owner.on_delete, ReferentialAction::Cascade);
        assert_eq!(owner.inverse.as_deref(), Some("pets"));
        assert_eq!(entities[0].edges[0].column.as_deref(), Some("owner_id"));
    }

    #[test]
    fn test_many_to_many_join_name_from_either_side() {
        let mut entities = vec![
            Entity::new("Group")
                .with_field(Field::primary("id", FieldType::Uuid))
                .with_edge(Edge::many_to_many("members", "User").on_delete(ReferentialAction::Cascade)),
            user(Vec::new()),
        ];

        RelationSynthesizer::new().synthesize(&mut entities);

        assert_eq!(entities[0].edges[0].through.as_deref(), Some("groups_users"));
        let inverse = entities[1].edge("groups").unwrap();
        assert_eq!(inverse.kind, EdgeKind::ManyToMany);
        assert_eq!(inverse.through.as_deref(), Some("groups_users"));
        assert_eq!(inverse.on_delete, ReferentialAction::Cascade);
    }

    #[test]
    fn test_ambiguous_self_reference_is_left_alone() {
        let mut entities = vec![Entity::new("Node")
            .with_field(Field::primary("id", FieldType::BigInt))
            .with_edge(Edge::to_many("children", "Node"))];

        let report = RelationSynthesizer::new().synthesize(&mut entities);

        assert!(report.is_empty());
        assert_eq!(entities[0].edges.len(), 1);
    }

    #[test]
    fn test_self_reference_with_inverse_name() {
        let mut entities = vec![Entity::new("Node")
            .with_field(Field::primary("id", FieldType::BigSerial))
            .with_edge(Edge::to_many("children", "Node").with_inverse("parent").optional())];

        RelationSynthesizer::new().synthesize(&mut entities);

        let parent = entities[0].edge("parent").unwrap();
        assert!(parent.generated);
        assert_eq!(parent.column.as_deref(), Some("node_id"));
        let column = entities[0].field_by_column("node_id").unwrap();
        assert_eq!(column.field_type, FieldType::BigInt);
        assert!(column.nullable);
    }
}
