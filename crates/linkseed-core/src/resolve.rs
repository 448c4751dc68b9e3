//! # Attribute Resolver
//!
//! Turns the raw endpoint strings of declared relationships into concrete
//! `(entity, attribute, is_unique)` references. An endpoint is looked up as an
//! alias first, then as an `"EntityExternalId.AttributeExternalId"` string.
//!
//! Resolution is lenient: a relationship with an endpoint that matches
//! nothing is dropped from the link set and reported as a diagnostic, so a
//! partially specified schema still yields a best-effort dependency graph.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::diagnostics::{Diagnostic, Endpoint};
use crate::schema::types::Schema;

/// A resolved attribute: the entity's internal id plus the attribute's
/// external id (its column header).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AttributeRef {
    pub entity: String,
    pub attribute: String,
    pub is_unique: bool,
}

/// A resolved, directional relationship between two attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipLink {
    /// Id of the declared relationship this link came from.
    pub relationship: String,
    pub from: AttributeRef,
    pub to: AttributeRef,
}

impl RelationshipLink {
    pub fn is_self_reference(&self) -> bool {
        self.from.entity == self.to.entity
    }
}

/// Lookup tables built once per schema.
pub struct AttributeResolver {
    aliases: HashMap<String, AttributeRef>,
    qualified: HashMap<String, AttributeRef>,
}

impl AttributeResolver {
    pub fn new(schema: &Schema) -> Self {
        let mut aliases = HashMap::new();
        let mut qualified = HashMap::new();

        for entity in schema.entities.values() {
            for attribute in &entity.attributes {
                let reference = AttributeRef {
                    entity: entity.id.clone(),
                    attribute: attribute.external_id.clone(),
                    is_unique: attribute.is_unique,
                };

                if let Some(alias) = attribute.alias.as_deref().filter(|a| !a.is_empty()) {
                    // First declaration wins for a reused alias.
                    aliases
                        .entry(alias.to_string())
                        .or_insert_with(|| reference.clone());
                }

                qualified
                    .entry(format!("{}.{}", entity.external_id, attribute.external_id))
                    .or_insert(reference);
            }
        }

        Self { aliases, qualified }
    }

    /// Resolve one endpoint string. Alias match takes precedence.
    pub fn resolve(&self, reference: &str) -> Option<&AttributeRef> {
        if let Some(found) = self.aliases.get(reference) {
            return Some(found);
        }
        if reference.contains('.') {
            return self.qualified.get(reference);
        }
        None
    }
}

/// Links that resolved, plus everything that was dropped along the way.
#[derive(Debug, Clone, Default)]
pub struct ResolvedLinks {
    pub links: Vec<RelationshipLink>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve every declared relationship of a schema, in declaration order.
pub fn resolve_links(schema: &Schema) -> ResolvedLinks {
    let resolver = AttributeResolver::new(schema);
    let mut resolved = ResolvedLinks::default();

    for relationship in schema.relationships.values() {
        if relationship.is_multi_hop() {
            debug!("Skipping multi-hop relationship '{}'", relationship.id);
            resolved.diagnostics.push(Diagnostic::MultiHopSkipped {
                relationship: relationship.id.clone(),
            });
            continue;
        }

        let from = resolver.resolve(&relationship.from_attribute);
        let to = resolver.resolve(&relationship.to_attribute);

        match (from, to) {
            (Some(from), Some(to)) => resolved.links.push(RelationshipLink {
                relationship: relationship.id.clone(),
                from: from.clone(),
                to: to.clone(),
            }),
            _ => {
                for (endpoint, reference, found) in [
                    (Endpoint::From, &relationship.from_attribute, from.is_some()),
                    (Endpoint::To, &relationship.to_attribute, to.is_some()),
                ] {
                    if found {
                        continue;
                    }
                    warn!(
                        "Dropping relationship '{}': {} endpoint '{}' does not resolve",
                        relationship.id, endpoint, reference
                    );
                    resolved.diagnostics.push(Diagnostic::UnresolvedEndpoint {
                        relationship: relationship.id.clone(),
                        endpoint,
                        reference: reference.clone(),
                    });
                }
            }
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::*;

    fn make_schema() -> Schema {
        let mut schema = Schema::new("test");
        schema.add_entity(
            Entity::new("user", "crm/User")
                .with_attribute(Attribute::new("id").unique().with_alias("userKey"))
                .with_attribute(Attribute::new("email").unique()),
        );
        schema.add_entity(
            Entity::new("order", "Order")
                .with_attribute(Attribute::new("id").unique())
                .with_attribute(Attribute::new("userId")),
        );
        schema
    }

    #[test]
    fn test_resolve_alias_and_qualified_name() {
        let schema = make_schema();
        let resolver = AttributeResolver::new(&schema);

        let by_alias = resolver.resolve("userKey").unwrap();
        assert_eq!(by_alias.entity, "user");
        assert_eq!(by_alias.attribute, "id");
        assert!(by_alias.is_unique);

        let qualified = resolver.resolve("Order.userId").unwrap();
        assert_eq!(qualified.entity, "order");
        assert!(!qualified.is_unique);

        // External ids with a path segment resolve by their full text.
        assert!(resolver.resolve("crm/User.email").is_some());
        assert!(resolver.resolve("User.email").is_none());
        assert!(resolver.resolve("email").is_none());
    }

    #[test]
    fn test_alias_resolution_is_idempotent() {
        let schema = make_schema();
        let resolver = AttributeResolver::new(&schema);

        let first = resolver.resolve("userKey").cloned();
        let second = resolver.resolve("userKey").cloned();
        assert_eq!(first, second);
        assert_eq!(first.map(|r| r.attribute), Some("id".to_string()));
    }

    #[test]
    fn test_unresolved_relationship_is_dropped_with_diagnostic() {
        let mut schema = make_schema();
        schema.add_relationship(Relationship::new("ok", "Order.userId", "userKey"));
        schema.add_relationship(Relationship::new("bad", "Order.missing", "userKey"));

        let resolved = resolve_links(&schema);
        assert_eq!(resolved.links.len(), 1);
        assert_eq!(resolved.links[0].relationship, "ok");
        assert_eq!(
            resolved.diagnostics,
            vec![Diagnostic::UnresolvedEndpoint {
                relationship: "bad".to_string(),
                endpoint: Endpoint::From,
                reference: "Order.missing".to_string(),
            }]
        );
    }

    #[test]
    fn test_multi_hop_relationship_is_skipped() {
        let mut schema = make_schema();
        let mut rel = Relationship::new("hop", "Order.userId", "userKey");
        rel.path = vec!["Order.userId".to_string(), "crm/User.id".to_string()];
        schema.add_relationship(rel);

        let resolved = resolve_links(&schema);
        assert!(resolved.links.is_empty());
        assert!(matches!(
            resolved.diagnostics[0],
            Diagnostic::MultiHopSkipped { .. }
        ));
    }
}
