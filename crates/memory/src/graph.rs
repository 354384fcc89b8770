//! Entity/relationship graph with path finding.
//!
//! The world-model memory: typed entities, directed typed relationships,
//! and BFS path finding with a depth cap for multi-hop questions.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use uuid::Uuid;

/// A node in the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub entity_type: String,
    pub properties: HashMap<String, String>,
}

/// A directed, typed edge between two entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub relation: String,
}

/// In-memory knowledge graph.
#[derive(Debug, Default)]
pub struct KnowledgeGraph {
    entities: Vec<Entity>,
    relationships: Vec<Relationship>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity; a same-named entity (case-insensitive) is reused.
    pub fn add_entity(
        &mut self,
        name: impl Into<String>,
        entity_type: impl Into<String>,
        properties: HashMap<String, String>,
    ) -> String {
        let name = name.into();
        if let Some(existing) = self.find_entity(&name) {
            return existing.id.clone();
        }
        let id = Uuid::new_v4().to_string();
        self.entities.push(Entity {
            id: id.clone(),
            name,
            entity_type: entity_type.into(),
            properties,
        });
        id
    }

    /// Add a relationship by entity names, creating missing entities as
    /// untyped nodes. Returns None if source and target are the same node.
    pub fn add_relationship(
        &mut self,
        source: &str,
        target: &str,
        relation: impl Into<String>,
    ) -> Option<String> {
        let source_id = self.add_entity(source, "unknown", HashMap::new());
        let target_id = self.add_entity(target, "unknown", HashMap::new());
        if source_id == target_id {
            return None;
        }
        let id = Uuid::new_v4().to_string();
        self.relationships.push(Relationship {
            id: id.clone(),
            source_id,
            target_id,
            relation: relation.into(),
        });
        Some(id)
    }

    /// Find an entity by name (case-insensitive).
    pub fn find_entity(&self, name: &str) -> Option<&Entity> {
        let lower = name.to_lowercase();
        self.entities.iter().find(|e| e.name.to_lowercase() == lower)
    }

    pub fn entity_by_id(&self, id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    /// All relationships touching an entity (either direction).
    pub fn relationships_of(&self, entity_id: &str) -> Vec<&Relationship> {
        self.relationships
            .iter()
            .filter(|r| r.source_id == entity_id || r.target_id == entity_id)
            .collect()
    }

    /// All entities in insertion order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Entities of a given type.
    pub fn entities_of_type(&self, entity_type: &str) -> Vec<&Entity> {
        self.entities
            .iter()
            .filter(|e| e.entity_type == entity_type)
            .collect()
    }

    /// BFS shortest path between two named entities, as entity names,
    /// following edges in either direction, bounded by `max_depth` hops.
    pub fn find_path(&self, source: &str, target: &str, max_depth: usize) -> Option<Vec<String>> {
        let source_id = self.find_entity(source)?.id.clone();
        let target_id = self.find_entity(target)?.id.clone();
        if source_id == target_id {
            return Some(vec![source.to_string()]);
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<Vec<String>> = VecDeque::new();
        visited.insert(source_id.clone());
        queue.push_back(vec![source_id]);

        while let Some(path) = queue.pop_front() {
            if path.len() > max_depth {
                continue;
            }
            let last = path.last().cloned().unwrap_or_default();
            for rel in self.relationships_of(&last) {
                let next = if rel.source_id == last {
                    &rel.target_id
                } else {
                    &rel.source_id
                };
                if visited.contains(next) {
                    continue;
                }
                let mut next_path = path.clone();
                next_path.push(next.clone());
                if *next == target_id {
                    return Some(
                        next_path
                            .iter()
                            .filter_map(|id| self.entity_by_id(id).map(|e| e.name.clone()))
                            .collect(),
                    );
                }
                visited.insert(next.clone());
                queue.push_back(next_path);
            }
        }
        None
    }

    /// All (relation, neighbour-name, outgoing?) triples around an entity —
    /// the neighbourhood rendered into question-answering prompts.
    pub fn neighbourhood(&self, name: &str) -> Vec<(String, String, bool)> {
        let Some(entity) = self.find_entity(name) else {
            return Vec::new();
        };
        self.relationships_of(&entity.id)
            .into_iter()
            .filter_map(|r| {
                if r.source_id == entity.id {
                    self.entity_by_id(&r.target_id)
                        .map(|t| (r.relation.clone(), t.name.clone(), true))
                } else {
                    self.entity_by_id(&r.source_id)
                        .map(|s| (r.relation.clone(), s.name.clone(), false))
                }
            })
            .collect()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> KnowledgeGraph {
        let mut g = KnowledgeGraph::new();
        g.add_entity("Ada", "person", HashMap::new());
        g.add_entity("Acme", "company", HashMap::new());
        g.add_entity("London", "city", HashMap::new());
        g.add_relationship("Ada", "Acme", "works_at");
        g.add_relationship("Acme", "London", "headquartered_in");
        g
    }

    #[test]
    fn entities_deduplicated_by_name() {
        let mut g = KnowledgeGraph::new();
        let id1 = g.add_entity("Ada", "person", HashMap::new());
        let id2 = g.add_entity("ada", "person", HashMap::new());
        assert_eq!(id1, id2);
        assert_eq!(g.entity_count(), 1);
    }

    #[test]
    fn self_relationship_rejected() {
        let mut g = KnowledgeGraph::new();
        assert!(g.add_relationship("Ada", "Ada", "knows").is_none());
        assert_eq!(g.relationship_count(), 0);
    }

    #[test]
    fn multi_hop_path_found() {
        let g = sample_graph();
        let path = g.find_path("Ada", "London", 3).unwrap();
        assert_eq!(path, vec!["Ada", "Acme", "London"]);
    }

    #[test]
    fn path_respects_depth_cap() {
        let g = sample_graph();
        assert!(g.find_path("Ada", "London", 1).is_none());
    }

    #[test]
    fn path_to_unknown_entity_is_none() {
        let g = sample_graph();
        assert!(g.find_path("Ada", "Mars", 3).is_none());
    }

    #[test]
    fn neighbourhood_reports_both_directions() {
        let g = sample_graph();
        let hood = g.neighbourhood("Acme");
        assert_eq!(hood.len(), 2);
        assert!(hood
            .iter()
            .any(|(rel, name, outgoing)| rel == "works_at" && name == "Ada" && !outgoing));
        assert!(hood
            .iter()
            .any(|(rel, name, outgoing)| rel == "headquartered_in" && name == "London" && *outgoing));
    }

    #[test]
    fn entities_of_type_filters() {
        let g = sample_graph();
        assert_eq!(g.entities_of_type("person").len(), 1);
        assert_eq!(g.entities_of_type("city").len(), 1);
    }
}
