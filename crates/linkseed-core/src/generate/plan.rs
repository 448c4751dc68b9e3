use tracing::debug;

use crate::classify::cardinality::{classify_link, Cardinality};
use crate::classify::names::NamePatterns;
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::graph::dag::{DependencyGraph, GraphSummary};
use crate::graph::topo::{topological_sort, GenerationOrder};
use crate::resolve::{resolve_links, RelationshipLink};
use crate::schema::types::Schema;

/// Everything decided about a schema before any row exists.
#[derive(Debug, Clone)]
pub struct GenerationPlan {
    /// Entities in generation order.
    pub order: GenerationOrder,
    /// Resolved links with their cardinality, in declaration order.
    pub links: Vec<PlannedLink>,
    pub summary: GraphSummary,
    /// Dropped relationships and suppressed edges.
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedLink {
    pub link: RelationshipLink,
    pub cardinality: Cardinality,
}

impl GenerationPlan {
    /// Resolve, order and classify the schema's relationships.
    ///
    /// Fails only when no generation order exists.
    pub fn build(schema: &Schema, patterns: &NamePatterns) -> Result<Self> {
        let resolved = resolve_links(schema);
        let graph = DependencyGraph::from_links(schema, &resolved.links);
        let order = topological_sort(&graph)?;

        let links: Vec<PlannedLink> = resolved
            .links
            .into_iter()
            .map(|link| {
                let cardinality = classify_link(&link, patterns);
                debug!(
                    "Relationship '{}' classified as {}",
                    link.relationship, cardinality
                );
                PlannedLink { link, cardinality }
            })
            .collect();

        let mut diagnostics = resolved.diagnostics;
        diagnostics.extend(graph.suppressed.iter().cloned());

        Ok(Self {
            order,
            links,
            summary: graph.summary(),
            diagnostics,
        })
    }

    /// Links enforced when `entity_id` is generated: those it is the "from" side of.
    pub fn links_from<'a>(&'a self, entity_id: &'a str) -> impl Iterator<Item = &'a PlannedLink> {
        self.links
            .iter()
            .filter(move |p| p.link.from.entity == entity_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LinkSeedError;
    use crate::schema::types::{Attribute, Entity, Relationship};

    fn schema() -> Schema {
        let mut schema = Schema::new("plan");
        schema.add_entity(Entity::new("user", "User").with_attribute(Attribute::new("id").unique()));
        schema.add_entity(
            Entity::new("order", "Order")
                .with_attribute(Attribute::new("id").unique())
                .with_attribute(Attribute::new("userId")),
        );
        schema.add_relationship(Relationship::new("r1", "Order.userId", "User.id"));
        schema
    }

    #[test]
    fn test_build_orders_and_classifies() {
        let plan = GenerationPlan::build(&schema(), &NamePatterns::default()).unwrap();

        assert_eq!(plan.order.entities, vec!["user", "order"]);
        assert_eq!(plan.links.len(), 1);
        assert_eq!(plan.links[0].cardinality, Cardinality::ManyToOne);
        assert_eq!(plan.summary.edges, 1);
        assert!(plan.diagnostics.is_empty());
        assert_eq!(plan.links_from("order").count(), 1);
        assert_eq!(plan.links_from("user").count(), 0);
    }

    #[test]
    fn test_build_collects_resolution_diagnostics() {
        let mut schema = schema();
        schema.add_relationship(Relationship::new("r2", "Order.missing", "User.id"));

        let plan = GenerationPlan::build(&schema, &NamePatterns::default()).unwrap();

        assert_eq!(plan.links.len(), 1);
        assert!(matches!(
            plan.diagnostics[0],
            Diagnostic::UnresolvedEndpoint { .. }
        ));
    }

    #[test]
    fn test_cycle_suppression_keeps_a_valid_order() {
        let mut schema = schema();
        schema.add_relationship(Relationship::new("r2", "User.id", "Order.userId"));

        let plan = GenerationPlan::build(&schema, &NamePatterns::default());

        match plan {
            Ok(plan) => {
                assert_eq!(plan.order.len(), 2);
                assert_eq!(plan.summary.suppressed, 1);
            }
            Err(LinkSeedError::CircularDependency { .. }) => panic!("cycle must be suppressed"),
            Err(e) => panic!("unexpected error {}", e),
        }
    }
}
