//! `GraphBackend` capability trait (spec §1: "persistence backend choice
//! is treated as a `GraphBackend` capability set"). Grounded on the
//! shape of a real graph-store trait from the broader retrieval pack
//! (`GraphStore` in the rfdb backend this spec's own project ships):
//! batched node/edge writes, type/attr lookups, neighbor traversal, and
//! an optional `get_all_edges` escape hatch for validators that need a
//! full scan (Open Question #3 — validators degrade to "skipped" when a
//! backend can't offer it cheaply).
//!
//! The only implementation in this crate is [`crate::graph::InMemoryGraph`],
//! the `backend: "local"` option from the project config (spec §6). An
//! `"rfdb"` backend is an external collaborator behind this same trait.

use crate::ident::NodeId;
use crate::model::{EdgeId, EdgeKind, GraphEdge, GraphNode, NodeKind};

/// Exclusive owner of nodes and edges (spec §3 "Ownership"). Passes hold
/// only [`NodeId`]s and read through this trait; the orchestrator owns
/// the backend's lifecycle across the pipeline run.
pub trait GraphBackend: Send + Sync {
    /// Add nodes in one batch. Implementations MUST reject (or the
    /// caller must pre-check via `node_exists`) ids already present —
    /// violating I1 is a [`crate::error::GrafemaError::DuplicateId`].
    fn add_nodes(&mut self, nodes: Vec<GraphNode>) -> Result<(), crate::error::GrafemaError>;

    /// Add edges in one batch. When `skip_validation` is true the caller
    /// guarantees both endpoints were just persisted in the same
    /// `build()` invocation (spec §4.3 step 4); when false, the backend
    /// re-checks endpoint existence and the I4 signature.
    fn add_edges(
        &mut self,
        edges: Vec<GraphEdge>,
        skip_validation: bool,
    ) -> Result<(), crate::error::GrafemaError>;

    fn node(&self, id: &NodeId) -> Option<&GraphNode>;
    fn node_mut(&mut self, id: &NodeId) -> Option<&mut GraphNode>;
    fn node_exists(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }
    fn edge(&self, id: EdgeId) -> Option<&GraphEdge>;

    fn remove_node(&mut self, id: &NodeId) -> Option<GraphNode>;
    fn remove_edge(&mut self, id: EdgeId) -> Option<GraphEdge>;

    fn node_count(&self) -> usize;
    fn edge_count(&self) -> usize;

    fn all_nodes(&self) -> Box<dyn Iterator<Item = &GraphNode> + '_>;
    fn all_edges(&self) -> Box<dyn Iterator<Item = &GraphEdge> + '_>;

    fn find_by_type(&self, kind: NodeKind) -> Vec<NodeId>;
    fn find_by_name(&self, name: &str) -> Vec<NodeId>;

    fn edges_from(&self, id: &NodeId) -> Box<dyn Iterator<Item = &GraphEdge> + '_>;
    fn edges_to(&self, id: &NodeId) -> Box<dyn Iterator<Item = &GraphEdge> + '_>;

    fn has_edge_between(&self, source: &NodeId, target: &NodeId, kind: EdgeKind) -> bool {
        self.edges_from(source)
            .any(|e| &e.target == target && e.kind == kind)
    }

    /// BFS from `start`, following only `edge_types`, up to `max_depth`
    /// hops. Used by `traceDataFlow`/`findAffectedGuarantees`.
    fn bfs(&self, start: &[NodeId], max_depth: usize, edge_types: &[EdgeKind]) -> Vec<NodeId> {
        use std::collections::{HashSet, VecDeque};
        let mut visited: HashSet<NodeId> = start.iter().cloned().collect();
        let mut queue: VecDeque<(NodeId, usize)> =
            start.iter().cloned().map(|n| (n, 0)).collect();
        let mut order = Vec::new();
        while let Some((node, depth)) = queue.pop_front() {
            order.push(node.clone());
            if depth >= max_depth {
                continue;
            }
            for edge in self.edges_from(&node) {
                if edge_types.contains(&edge.kind) && !visited.contains(&edge.target) {
                    visited.insert(edge.target.clone());
                    queue.push_back((edge.target.clone(), depth + 1));
                }
            }
        }
        order
    }
}
