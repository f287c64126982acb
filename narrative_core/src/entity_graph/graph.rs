//! Entity graph - adjacency lists keyed by canonical entity name.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use world_model::{Entity, EntityStore};

/// Edge from one entity to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub target: String,
    pub association_type: AssociationType,
}

/// Why two entities are connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssociationType {
    /// One holds or owns the other.
    Ownership,
    /// Both are at the same place, or one is the place of the other.
    CoLocation,
    /// A character knows the skill.
    Skill,
    /// One description names the other.
    Mention,
}

/// Undirected relationships between entities.
///
/// Nodes are the canonical names used as keys in the [`EntityStore`], so a
/// neighbor can always be looked up with [`EntityStore::get`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityGraph {
    associations: BTreeMap<String, Vec<Association>>,
}

impl EntityGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the graph from a store's ownership, location, skill and
    /// description fields. References that do not resolve are ignored.
    pub fn build(store: &EntityStore) -> Self {
        let mut graph = Self::new();
        let mut by_location: BTreeMap<String, Vec<&str>> = BTreeMap::new();

        for entity in store.iter() {
            if let Some(owner) = store.resolve(entity.details.owner()) {
                graph.add_bidirectional_association(&entity.name, &owner.name, AssociationType::Ownership);
            }

            if let Some(location) = entity.details.location() {
                if let Some(place) = store.resolve_name(location) {
                    graph.add_bidirectional_association(&entity.name, &place.name, AssociationType::CoLocation);
                }
                by_location
                    .entry(location.trim().to_lowercase())
                    .or_default()
                    .push(&entity.name);
            }

            for skill in entity.details.skills() {
                if let Some(skill) = store.resolve_name(skill) {
                    graph.add_bidirectional_association(&entity.name, &skill.name, AssociationType::Skill);
                }
            }
        }

        for occupants in by_location.values() {
            for (i, a) in occupants.iter().enumerate() {
                for b in &occupants[i + 1..] {
                    graph.add_bidirectional_association(a, b, AssociationType::CoLocation);
                }
            }
        }

        graph.link_mentions(store);
        graph
    }

    fn link_mentions(&mut self, store: &EntityStore) {
        let names: Vec<(&Entity, String)> = store
            .iter()
            .filter(|e| e.name.chars().count() >= 2)
            .map(|e| (e, e.name.to_lowercase()))
            .collect();

        for entity in store.iter() {
            if entity.description.is_empty() {
                continue;
            }
            let description = entity.description.to_lowercase();
            for (other, lowered) in &names {
                if other.name != entity.name && description.contains(lowered.as_str()) {
                    self.add_bidirectional_association(&entity.name, &other.name, AssociationType::Mention);
                }
            }
        }
    }

    /// Add an association. Self-loops and exact duplicates are ignored.
    pub fn add_association(&mut self, from: &str, to: &str, association_type: AssociationType) {
        if from == to {
            return;
        }
        let associations = self.associations.entry(from.to_string()).or_default();
        if associations
            .iter()
            .any(|a| a.target == to && a.association_type == association_type)
        {
            return;
        }
        associations.push(Association {
            target: to.to_string(),
            association_type,
        });
    }

    /// Add an association in both directions.
    pub fn add_bidirectional_association(&mut self, a: &str, b: &str, association_type: AssociationType) {
        self.add_association(a, b, association_type);
        self.add_association(b, a, association_type);
    }

    /// Get all associations for an entity.
    pub fn get_associations(&self, name: &str) -> &[Association] {
        self.associations.get(name).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Distinct neighbor names of an entity.
    pub fn neighbors<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        let associations = self.get_associations(name);
        associations
            .iter()
            .enumerate()
            .filter(move |(i, a)| !associations[..*i].iter().any(|earlier| earlier.target == a.target))
            .map(|(_, a)| a.target.as_str())
    }

    /// Whether two entities share at least one association.
    pub fn is_connected(&self, a: &str, b: &str) -> bool {
        self.get_associations(a).iter().any(|assoc| assoc.target == b)
    }

    /// Number of entities with at least one association.
    pub fn node_count(&self) -> usize {
        self.associations.len()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.associations.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use world_model::EntityKind;

    fn sample_store() -> EntityStore {
        [
            Entity::new("Lâm Phong", EntityKind::PlayerCharacter)
                .with_location("Thanh Vân Trấn")
                .with_skills(["Thiên Lôi Chưởng"]),
            Entity::new("Tiểu Bạch", EntityKind::Companion).with_location("thanh vân trấn"),
            Entity::new("Thanh Vân Trấn", EntityKind::Location),
            Entity::new("Thiên Lôi Chưởng", EntityKind::Skill).with_owner("Lâm Phong"),
            Entity::new("Hỏa Long Kiếm", EntityKind::Item).with_owner("tiểu bạch"),
            Entity::new("Hắc Y Nhân", EntityKind::Npc).with_description("Kẻ thù truyền kiếp của Lâm Phong."),
            Entity::new("Lão Ăn Mày", EntityKind::Npc).with_location("Vô Danh Cốc"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_associations() {
        let mut graph = EntityGraph::new();
        graph.add_association("A", "B", AssociationType::Mention);
        graph.add_association("A", "C", AssociationType::Ownership);
        graph.add_association("A", "B", AssociationType::Mention);
        graph.add_association("A", "A", AssociationType::Mention);

        assert_eq!(graph.get_associations("A").len(), 2);
        assert!(graph.get_associations("B").is_empty());
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn test_bidirectional_associations() {
        let mut graph = EntityGraph::new();
        graph.add_bidirectional_association("A", "B", AssociationType::CoLocation);

        assert!(graph.is_connected("A", "B"));
        assert!(graph.is_connected("B", "A"));
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn test_neighbors_are_distinct() {
        let mut graph = EntityGraph::new();
        graph.add_association("A", "B", AssociationType::Mention);
        graph.add_association("A", "B", AssociationType::Ownership);
        graph.add_association("A", "C", AssociationType::Skill);

        let neighbors: Vec<_> = graph.neighbors("A").collect();
        assert_eq!(neighbors, vec!["B", "C"]);
    }

    #[test]
    fn test_build_ownership_resolves_case_insensitively() {
        let graph = EntityGraph::build(&sample_store());
        assert!(graph.is_connected("Hỏa Long Kiếm", "Tiểu Bạch"));
        assert!(graph.is_connected("Tiểu Bạch", "Hỏa Long Kiếm"));
    }

    #[test]
    fn test_build_co_location() {
        let graph = EntityGraph::build(&sample_store());
        assert!(graph.is_connected("Lâm Phong", "Tiểu Bạch"));
        assert!(graph.is_connected("Lâm Phong", "Thanh Vân Trấn"));
        assert!(!graph.is_connected("Lâm Phong", "Lão Ăn Mày"));
    }

    #[test]
    fn test_build_skill_and_mention() {
        let graph = EntityGraph::build(&sample_store());
        assert!(graph
            .get_associations("Lâm Phong")
            .iter()
            .any(|a| a.target == "Thiên Lôi Chưởng" && a.association_type == AssociationType::Skill));
        assert!(graph.is_connected("Hắc Y Nhân", "Lâm Phong"));
    }

    #[test]
    fn test_unresolved_location_still_groups_occupants() {
        let store: EntityStore = [
            Entity::new("A", EntityKind::Npc).with_location("Rừng Sâu"),
            Entity::new("B", EntityKind::Npc).with_location("rừng sâu"),
        ]
        .into_iter()
        .collect();

        let graph = EntityGraph::build(&store);
        assert!(graph.is_connected("A", "B"));
    }
}
