//! Edge pairing by lookup
//!
//! An edge and its inverse are independent records on two entities. They are
//! correlated through a [`RelationKey`] and resolved by searching the entity
//! list, never by holding references to each other.

use indexmap::IndexMap;

use crate::models::entity::{Edge, EdgeKind, Entity};

/// Identity of one side of a relationship
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationKey {
    pub owner: String,
    pub edge: String,
    pub target: String,
}

impl RelationKey {
    pub fn of(owner: &Entity, edge: &Edge) -> Self {
        Self {
            owner: owner.name.clone(),
            edge: edge.name.clone(),
            target: edge.target.clone(),
        }
    }
}

/// Position of an edge inside an entity list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRef {
    pub entity: usize,
    pub edge: usize,
}

/// Name → position index over an entity list
pub fn entity_index(entities: &[Entity]) -> IndexMap<String, usize> {
    entities
        .iter()
        .enumerate()
        .map(|(i, entity)| (entity.name.clone(), i))
        .collect()
}

/// Whether `candidate` (declared on `edge.target`) is the counterpart of
/// `edge` (declared on `owner`).
///
/// Names are the strongest signal; without any naming hint two non-self edges
/// still pair up when they resolve to the same backing column or join table.
pub fn is_counterpart(owner: &str, edge: &Edge, candidate: &Edge) -> bool {
    if candidate.target != owner || candidate.kind != edge.kind.inverse() {
        return false;
    }
    if edge.is_self_referential(owner) && candidate.name == edge.name {
        return false;
    }

    if edge.inverse.as_deref() == Some(candidate.name.as_str())
        || candidate.inverse.as_deref() == Some(edge.name.as_str())
    {
        return true;
    }
    if edge.inverse.is_some() || candidate.inverse.is_some() || edge.is_self_referential(owner) {
        return false;
    }

    match edge.kind {
        EdgeKind::ManyToMany => match (&edge.through, &candidate.through) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        },
        _ => match (edge.explicit_column(), candidate.explicit_column()) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        },
    }
}

/// Locate the counterpart of the edge at `at`
pub fn find_counterpart(entities: &[Entity], index: &IndexMap<String, usize>, at: EdgeRef) -> Option<EdgeRef> {
    let owner = &entities[at.entity];
    let edge = &owner.edges[at.edge];
    let target_idx = *index.get(&edge.target)?;

    entities[target_idx]
        .edges
        .iter()
        .enumerate()
        .find(|(i, candidate)| {
            !(target_idx == at.entity && *i == at.edge) && is_counterpart(&owner.name, edge, candidate)
        })
        .map(|(i, _)| EdgeRef {
            entity: target_idx,
            edge: i,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::entity::Field;
    use crate::models::field_type::FieldType;

    fn user_and_pet() -> Vec<Entity> {
        vec![
            Entity::new("User")
                .with_field(Field::primary("id", FieldType::Uuid))
                .with_edge(Edge::to_many("pets", "Pet")),
            Entity::new("Pet")
                .with_field(Field::primary("id", FieldType::Uuid))
                .with_edge(Edge::to_one("owner", "User").with_column("user_id")),
        ]
    }

    #[test]
    fn test_counterpart_by_column() {
        let entities = user_and_pet();
        let index = entity_index(&entities);
        let found = find_counterpart(&entities, &index, EdgeRef { entity: 0, edge: 0 });
        assert_eq!(found, Some(EdgeRef { entity: 1, edge: 0 }));
    }

    #[test]
    fn test_named_inverse_mismatch_is_not_counterpart() {
        let mut entities = user_and_pet();
        entities[0].edges[0].inverse = Some("keeper".to_string());
        let index = entity_index(&entities);
        assert_eq!(find_counterpart(&entities, &index, EdgeRef { entity: 0, edge: 0 }), None);
    }

    #[test]
    fn test_self_reference_requires_names() {
        let entities = vec![Entity::new("Node")
            .with_field(Field::primary("id", FieldType::BigInt))
            .with_edge(Edge::to_many("children", "Node").with_inverse("parent"))
            .with_edge(Edge::to_one("parent", "Node").with_column("parent_id").optional())];
        let index = entity_index(&entities);

        assert_eq!(
            find_counterpart(&entities, &index, EdgeRef { entity: 0, edge: 0 }),
            Some(EdgeRef { entity: 0, edge: 1 })
        );
        assert_eq!(
            RelationKey::of(&entities[0], &entities[0].edges[0]).target,
            "Node".to_string()
        );
    }
}
