use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::Direction;

use crate::error::{LinkSeedError, Result};
use crate::graph::dag::DependencyGraph;

/// Result of topological sorting: entity ids in the order their rows
/// should be generated (referenced entities first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOrder {
    pub entities: Vec<String>,
}

impl GenerationOrder {
    pub fn position(&self, entity_id: &str) -> Option<usize> {
        self.entities.iter().position(|e| e == entity_id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Compute a stable topological sort of the dependency graph.
///
/// Kahn's algorithm with a min-heap of ready entities: whenever several
/// entities have no pending dependency, the lexicographically smallest id
/// goes first, so the same schema always yields the same order.
///
/// Fails if the graph still contains a cycle. The graph builder rejects
/// cycle-forming edges, so this only happens for graphs assembled by hand.
pub fn topological_sort(graph: &DependencyGraph) -> Result<GenerationOrder> {
    let g = &graph.graph;
    let mut in_degree: Vec<usize> = g
        .node_indices()
        .map(|idx| g.neighbors_directed(idx, Direction::Incoming).count())
        .collect();

    let mut ready: BinaryHeap<Reverse<(&str, usize)>> = g
        .node_indices()
        .filter(|idx| in_degree[idx.index()] == 0)
        .map(|idx| Reverse((graph.entity_id(idx), idx.index())))
        .collect();

    let mut entities = Vec::with_capacity(g.node_count());

    while let Some(Reverse((entity_id, index))) = ready.pop() {
        entities.push(entity_id.to_string());

        let node = petgraph::graph::NodeIndex::new(index);
        for next in g.neighbors_directed(node, Direction::Outgoing) {
            let degree = &mut in_degree[next.index()];
            *degree -= 1;
            if *degree == 0 {
                ready.push(Reverse((graph.entity_id(next), next.index())));
            }
        }
    }

    if entities.len() < g.node_count() {
        let mut stuck: Vec<&str> = g
            .node_indices()
            .filter(|idx| in_degree[idx.index()] > 0)
            .map(|idx| graph.entity_id(idx))
            .collect();
        stuck.sort_unstable();
        return Err(LinkSeedError::CircularDependency {
            entities: stuck.join(", "),
        });
    }

    Ok(GenerationOrder { entities })
}
