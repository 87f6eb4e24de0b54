//! Graph diff computation, used by the cache layer to decide which
//! re-analyzed files actually changed the persisted graph (spec.md §1
//! Non-goals: delta support is an optimization layer, not a correctness
//! feature — `GraphDiff` never gates an invariant, only what gets
//! reported to a caller comparing two runs).

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::backend::GraphBackend;
use crate::ident::NodeId;
use crate::model::{EdgeId, GraphEdge, GraphNode};

/// The set of changes between two builds of the same graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDiff {
    pub sequence: u64,
    pub added_nodes: Vec<GraphNode>,
    pub removed_nodes: Vec<NodeId>,
    pub added_edges: Vec<GraphEdge>,
    pub removed_edges: Vec<EdgeId>,
}

impl GraphDiff {
    pub fn new(sequence: u64) -> Self {
        GraphDiff {
            sequence,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            added_edges: Vec::new(),
            removed_edges: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
    }
}

/// Sequences successive [`GraphDiff`]s computed against the same backend
/// across runs (each call bumps `sequence`).
pub struct DiffEngine {
    sequence: u64,
}

impl DiffEngine {
    pub fn new() -> Self {
        DiffEngine { sequence: 0 }
    }

    /// Diff `old` against `new` by id-set comparison. Content changes to
    /// an unmoved id are not reported here — identity is stable by I2, so
    /// a changed node is always a remove+add pair with a new id.
    pub fn compute_diff(&mut self, old: &dyn GraphBackend, new: &dyn GraphBackend) -> GraphDiff {
        self.sequence += 1;
        let mut diff = GraphDiff::new(self.sequence);

        let old_node_ids: HashSet<NodeId> = old.all_nodes().map(|n| n.id.clone()).collect();
        let new_node_ids: HashSet<NodeId> = new.all_nodes().map(|n| n.id.clone()).collect();

        diff.added_nodes = new
            .all_nodes()
            .filter(|n| !old_node_ids.contains(&n.id))
            .cloned()
            .collect();
        diff.removed_nodes = old_node_ids.difference(&new_node_ids).cloned().collect();

        let old_edge_ids: HashSet<EdgeId> = old.all_edges().map(|e| e.id).collect();
        let new_edge_ids: HashSet<EdgeId> = new.all_edges().map(|e| e.id).collect();

        diff.added_edges = new
            .all_edges()
            .filter(|e| !old_edge_ids.contains(&e.id))
            .cloned()
            .collect();
        diff.removed_edges = old_edge_ids.difference(&new_edge_ids).cloned().collect();

        diff
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::InMemoryGraph;
    use crate::model::{ModuleAttrs, NodePayload};

    fn module(id: &str) -> GraphNode {
        GraphNode {
            id: NodeId::from_raw(id),
            name: id.to_string(),
            file: None,
            line: None,
            column: None,
            payload: NodePayload::Module(ModuleAttrs::default()),
        }
    }

    #[test]
    fn diff_reports_added_and_removed_nodes() {
        let mut old = InMemoryGraph::new();
        old.add_nodes(vec![module("a"), module("b")]).unwrap();

        let mut new = InMemoryGraph::new();
        new.add_nodes(vec![module("b"), module("c")]).unwrap();

        let mut engine = DiffEngine::new();
        let diff = engine.compute_diff(&old, &new);
        assert_eq!(diff.added_nodes.len(), 1);
        assert_eq!(diff.added_nodes[0].id, NodeId::from_raw("c"));
        assert_eq!(diff.removed_nodes, vec![NodeId::from_raw("a")]);
    }

    #[test]
    fn identical_graphs_diff_empty() {
        let mut old = InMemoryGraph::new();
        old.add_nodes(vec![module("a")]).unwrap();
        let mut new = InMemoryGraph::new();
        new.add_nodes(vec![module("a")]).unwrap();

        let mut engine = DiffEngine::new();
        assert!(engine.compute_diff(&old, &new).is_empty());
    }
}
