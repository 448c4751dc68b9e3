use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::diagnostics::{Diagnostic, SuppressionReason};
use crate::resolve::RelationshipLink;
use crate::schema::types::Schema;

/// A directed graph of entity generation dependencies.
/// Edges point from referenced entity to dependent entity (parent → child):
/// the source's rows must exist before the target's reference column is filled.
pub struct DependencyGraph {
    pub graph: DiGraph<String, EdgeInfo>,
    pub node_indices: HashMap<String, NodeIndex>,
    /// Links that resolved but contributed no edge.
    pub suppressed: Vec<Diagnostic>,
}

/// Information about an edge: every relationship that ordered this pair.
#[derive(Debug, Clone, Default)]
pub struct EdgeInfo {
    pub relationships: Vec<String>,
}

/// Counts for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphSummary {
    pub entities: usize,
    pub edges: usize,
    pub suppressed: usize,
}

impl DependencyGraph {
    /// Build the dependency graph for a schema from its resolved links.
    ///
    /// Every schema entity becomes a node, linked or not. Each link with
    /// distinct endpoints tries to add `to → from`. A second link over the
    /// same ordered pair joins the existing edge; a link whose edge would
    /// close a cycle is rejected. The graph is therefore acyclic no matter
    /// how many relationships connect the same two entities.
    pub fn from_links(schema: &Schema, links: &[RelationshipLink]) -> Self {
        let mut dag = Self {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
            suppressed: Vec::new(),
        };

        for entity_id in schema.entities.keys() {
            dag.ensure_node(entity_id);
        }

        for link in links {
            dag.add_link(link);
        }

        dag
    }

    fn ensure_node(&mut self, entity_id: &str) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(entity_id) {
            return idx;
        }
        let idx = self.graph.add_node(entity_id.to_string());
        self.node_indices.insert(entity_id.to_string(), idx);
        idx
    }

    fn add_link(&mut self, link: &RelationshipLink) {
        if link.is_self_reference() {
            self.suppress(link, SuppressionReason::SelfReference);
            return;
        }

        let from_idx = self.ensure_node(&link.from.entity);
        let to_idx = self.ensure_node(&link.to.entity);

        if let Some(edge) = self.graph.find_edge(to_idx, from_idx) {
            debug!(
                "Relationship '{}' shares edge {} -> {}",
                link.relationship, link.to.entity, link.from.entity
            );
            self.graph[edge]
                .relationships
                .push(link.relationship.clone());
            return;
        }

        // Adding to → from closes a cycle iff from already reaches to.
        if has_path_connecting(&self.graph, from_idx, to_idx, None) {
            self.suppress(link, SuppressionReason::Cycle);
            return;
        }

        self.graph.add_edge(
            to_idx,
            from_idx,
            EdgeInfo {
                relationships: vec![link.relationship.clone()],
            },
        );
    }

    fn suppress(&mut self, link: &RelationshipLink, reason: SuppressionReason) {
        if reason == SuppressionReason::Cycle {
            warn!(
                "Relationship '{}' not ordered: edge {} -> {} {}",
                link.relationship, link.to.entity, link.from.entity, reason
            );
        }
        self.suppressed.push(Diagnostic::EdgeSuppressed {
            relationship: link.relationship.clone(),
            from_entity: link.from.entity.clone(),
            to_entity: link.to.entity.clone(),
            reason,
        });
    }

    /// Get the entity id for a node index.
    pub fn entity_id(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    /// Get node index for an entity id.
    pub fn node_index(&self, entity_id: &str) -> Option<NodeIndex> {
        self.node_indices.get(entity_id).copied()
    }

    /// Whether `before` must be generated before `after`.
    pub fn has_edge(&self, before: &str, after: &str) -> bool {
        match (self.node_index(before), self.node_index(after)) {
            (Some(b), Some(a)) => self.graph.contains_edge(b, a),
            _ => false,
        }
    }

    /// Get all entity ids in the graph.
    pub fn entity_ids(&self) -> Vec<&str> {
        self.graph.node_weights().map(|s| s.as_str()).collect()
    }

    pub fn entity_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            entities: self.entity_count(),
            edges: self.edge_count(),
            suppressed: self.suppressed.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve_links;
    use crate::schema::types::*;

    fn build(schema: &Schema) -> DependencyGraph {
        let resolved = resolve_links(schema);
        DependencyGraph::from_links(schema, &resolved.links)
    }

    fn user_entity() -> Entity {
        Entity::new("User", "User")
            .with_attribute(Attribute::new("id").unique())
            .with_attribute(Attribute::new("uuid").unique())
    }

    #[test]
    fn test_build_graph_adds_every_entity() {
        let mut schema = Schema::new("test");
        schema.add_entity(user_entity());
        schema.add_entity(Entity::new("Audit", "Audit").with_attribute(Attribute::new("note")));

        let graph = build(&schema);
        assert_eq!(graph.entity_count(), 2);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_same_pair_collapses_to_one_edge() {
        let mut schema = Schema::new("test");
        schema.add_entity(user_entity());
        schema.add_entity(
            Entity::new("Assignment", "Assignment")
                .with_attribute(Attribute::new("id").unique())
                .with_attribute(Attribute::new("assignedToUUID"))
                .with_attribute(Attribute::new("createdByUUID")),
        );
        schema.add_relationship(Relationship::new(
            "assigned",
            "Assignment.assignedToUUID",
            "User.uuid",
        ));
        schema.add_relationship(Relationship::new(
            "created",
            "Assignment.createdByUUID",
            "User.uuid",
        ));

        let graph = build(&schema);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge("User", "Assignment"));

        let edge = graph
            .graph
            .find_edge(
                graph.node_index("User").unwrap(),
                graph.node_index("Assignment").unwrap(),
            )
            .unwrap();
        assert_eq!(graph.graph[edge].relationships, vec!["assigned", "created"]);
        assert!(graph.suppressed.is_empty());
    }

    #[test]
    fn test_reverse_relationship_is_suppressed() {
        let mut schema = Schema::new("test");
        schema.add_entity(user_entity());
        schema.add_entity(
            Entity::new("Profile", "Profile").with_attribute(Attribute::new("userId").unique()),
        );
        schema.add_relationship(Relationship::new("p2u", "Profile.userId", "User.id"));
        schema.add_relationship(Relationship::new("u2p", "User.id", "Profile.userId"));

        let graph = build(&schema);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.has_edge("User", "Profile"));
        assert!(!graph.has_edge("Profile", "User"));
        assert_eq!(
            graph.suppressed,
            vec![Diagnostic::EdgeSuppressed {
                relationship: "u2p".to_string(),
                from_entity: "User".to_string(),
                to_entity: "Profile".to_string(),
                reason: SuppressionReason::Cycle,
            }]
        );
    }

    #[test]
    fn test_longer_cycle_is_rejected() {
        let mut schema = Schema::new("test");
        for name in ["A", "B", "C"] {
            schema.add_entity(
                Entity::new(name, name)
                    .with_attribute(Attribute::new("id").unique())
                    .with_attribute(Attribute::new("ref")),
            );
        }
        schema.add_relationship(Relationship::new("b_a", "B.ref", "A.id"));
        schema.add_relationship(Relationship::new("c_b", "C.ref", "B.id"));
        schema.add_relationship(Relationship::new("a_c", "A.ref", "C.id"));

        let graph = build(&schema);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.summary().suppressed, 1);
    }

    #[test]
    fn test_self_reference_adds_no_edge() {
        let mut schema = Schema::new("test");
        schema.add_entity(
            Entity::new("Employee", "Employee")
                .with_attribute(Attribute::new("id").unique())
                .with_attribute(Attribute::new("managerId")),
        );
        schema.add_relationship(Relationship::new(
            "manager",
            "Employee.managerId",
            "Employee.id",
        ));

        let graph = build(&schema);
        assert_eq!(graph.edge_count(), 0);
        assert!(matches!(
            graph.suppressed[0],
            Diagnostic::EdgeSuppressed {
                reason: SuppressionReason::SelfReference,
                ..
            }
        ));
    }
}
