//! `InMemoryGraph` — the `backend: "local"` [`GraphBackend`] (spec §6),
//! a petgraph-backed directed multigraph with stable node/edge lookup
//! by [`NodeId`].
//!
//! The teacher's original `Graph` reused the node's `u64` content hash
//! directly as the petgraph `NodeIndex` (`NodeIndex::new(id.0 as usize)`).
//! That silently corrupts the graph on any hash collision and can't
//! represent [`NodeId`] as a semantic path string. This version keeps an
//! explicit `NodeId -> NodeIndex` map instead — nodes are owned by
//! petgraph, looked up by id, never by assuming id and index coincide.

use std::collections::HashMap;

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::backend::GraphBackend;
use crate::error::GrafemaError;
use crate::ident::NodeId;
use crate::model::{EdgeId, EdgeKind, GraphEdge, GraphNode, NodeKind};

pub struct InMemoryGraph {
    inner: StableDiGraph<GraphNode, GraphEdge>,
    node_index: HashMap<NodeId, NodeIndex>,
    edge_index: HashMap<EdgeId, EdgeIndex>,
    next_edge_id: u64,
}

impl std::fmt::Debug for InMemoryGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl InMemoryGraph {
    pub fn new() -> Self {
        InMemoryGraph {
            inner: StableDiGraph::new(),
            node_index: HashMap::new(),
            edge_index: HashMap::new(),
            next_edge_id: 0,
        }
    }

    fn alloc_edge_id(&mut self) -> EdgeId {
        let id = EdgeId(self.next_edge_id);
        self.next_edge_id += 1;
        id
    }
}

impl Default for InMemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBackend for InMemoryGraph {
    fn add_nodes(&mut self, nodes: Vec<GraphNode>) -> Result<(), GrafemaError> {
        for node in nodes {
            if self.node_index.contains_key(&node.id) {
                return Err(GrafemaError::DuplicateId {
                    id: node.id.to_string(),
                });
            }
            let id = node.id.clone();
            let idx = self.inner.add_node(node);
            self.node_index.insert(id, idx);
        }
        Ok(())
    }

    fn add_edges(
        &mut self,
        edges: Vec<GraphEdge>,
        skip_validation: bool,
    ) -> Result<(), GrafemaError> {
        for mut edge in edges {
            let source_idx = self.node_index.get(&edge.source).copied().ok_or_else(|| {
                GrafemaError::BackendUnavailable(format!("edge source {} not found", edge.source))
            })?;
            let target_idx = self.node_index.get(&edge.target).copied().ok_or_else(|| {
                GrafemaError::BackendUnavailable(format!("edge target {} not found", edge.target))
            })?;

            if !skip_validation {
                let sig = edge.kind.signature();
                if !sig.is_empty() {
                    let source_kind = self.inner[source_idx].kind();
                    let target_kind = self.inner[target_idx].kind();
                    if !sig.contains(&(source_kind, target_kind)) {
                        return Err(GrafemaError::UnknownTargetType {
                            kind: edge.kind,
                            source_kind,
                            target_kind,
                        });
                    }
                }
            }

            edge.id = self.alloc_edge_id();
            let id = edge.id;
            let eidx = self.inner.add_edge(source_idx, target_idx, edge);
            self.edge_index.insert(id, eidx);
        }
        Ok(())
    }

    fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.node_index
            .get(id)
            .and_then(|&idx| self.inner.node_weight(idx))
    }

    fn node_mut(&mut self, id: &NodeId) -> Option<&mut GraphNode> {
        let idx = *self.node_index.get(id)?;
        self.inner.node_weight_mut(idx)
    }

    fn edge(&self, id: EdgeId) -> Option<&GraphEdge> {
        self.edge_index
            .get(&id)
            .and_then(|&idx| self.inner.edge_weight(idx))
    }

    fn remove_node(&mut self, id: &NodeId) -> Option<GraphNode> {
        let idx = self.node_index.remove(id)?;
        self.inner.remove_node(idx)
    }

    fn remove_edge(&mut self, id: EdgeId) -> Option<GraphEdge> {
        let idx = self.edge_index.remove(&id)?;
        self.inner.remove_edge(idx)
    }

    fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    fn all_nodes(&self) -> Box<dyn Iterator<Item = &GraphNode> + '_> {
        Box::new(
            self.inner
                .node_indices()
                .filter_map(move |idx| self.inner.node_weight(idx)),
        )
    }

    fn all_edges(&self) -> Box<dyn Iterator<Item = &GraphEdge> + '_> {
        Box::new(
            self.inner
                .edge_indices()
                .filter_map(move |idx| self.inner.edge_weight(idx)),
        )
    }

    fn find_by_type(&self, kind: NodeKind) -> Vec<NodeId> {
        self.all_nodes()
            .filter(|n| n.kind() == kind)
            .map(|n| n.id.clone())
            .collect()
    }

    fn find_by_name(&self, name: &str) -> Vec<NodeId> {
        self.all_nodes()
            .filter(|n| n.name == name)
            .map(|n| n.id.clone())
            .collect()
    }

    fn edges_from(&self, id: &NodeId) -> Box<dyn Iterator<Item = &GraphEdge> + '_> {
        match self.node_index.get(id) {
            Some(&idx) => Box::new(
                self.inner
                    .edges_directed(idx, Direction::Outgoing)
                    .filter_map(move |e| self.inner.edge_weight(e.id())),
            ),
            None => Box::new(std::iter::empty()),
        }
    }

    fn edges_to(&self, id: &NodeId) -> Box<dyn Iterator<Item = &GraphEdge> + '_> {
        match self.node_index.get(id) {
            Some(&idx) => Box::new(
                self.inner
                    .edges_directed(idx, Direction::Incoming)
                    .filter_map(move |e| self.inner.edge_weight(e.id())),
            ),
            None => Box::new(std::iter::empty()),
        }
    }
}

/// Ancestors of `node` by walking `kind` edges backward to their source —
/// used by `findAffectedGuarantees` ("climb to enclosing MODULE") and by
/// `findGuards` ("conditional scopes from innermost out").
pub fn ancestors_via(backend: &dyn GraphBackend, node: &NodeId, kind: EdgeKind) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut current = node.clone();
    loop {
        let parent = backend
            .edges_to(&current)
            .find(|e| e.kind == kind)
            .map(|e| e.source.clone());
        match parent {
            Some(p) => {
                out.push(p.clone());
                current = p;
            }
            None => break,
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::NodeId;
    use crate::model::{FunctionAttrs, ModuleAttrs, NodePayload};

    fn module(id: &str, name: &str) -> GraphNode {
        GraphNode {
            id: NodeId::from_raw(id),
            name: name.to_string(),
            file: None,
            line: None,
            column: None,
            payload: NodePayload::Module(ModuleAttrs::default()),
        }
    }

    fn function(id: &str, name: &str) -> GraphNode {
        GraphNode {
            id: NodeId::from_raw(id),
            name: name.to_string(),
            file: None,
            line: None,
            column: None,
            payload: NodePayload::Function(FunctionAttrs::default()),
        }
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let mut g = InMemoryGraph::new();
        g.add_nodes(vec![module("m1", "a")]).unwrap();
        let err = g.add_nodes(vec![module("m1", "a")]).unwrap_err();
        assert!(matches!(err, GrafemaError::DuplicateId { .. }));
    }

    #[test]
    fn edge_signature_violation_is_rejected() {
        let mut g = InMemoryGraph::new();
        g.add_nodes(vec![module("m1", "a"), module("m2", "b")])
            .unwrap();
        let edge = GraphEdge::structural(
            EdgeId(0),
            NodeId::from_raw("m1"),
            NodeId::from_raw("m2"),
            EdgeKind::Calls,
        );
        let err = g.add_edges(vec![edge], false).unwrap_err();
        assert!(matches!(err, GrafemaError::UnknownTargetType { .. }));
    }

    #[test]
    fn node_id_is_not_reused_as_petgraph_index() {
        let mut g = InMemoryGraph::new();
        g.add_nodes(vec![function("fn:foo", "foo"), function("fn:bar", "bar")])
            .unwrap();
        assert!(g.node(&NodeId::from_raw("fn:foo")).is_some());
        assert!(g.node(&NodeId::from_raw("fn:bar")).is_some());
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn skip_validation_bypasses_signature_check() {
        let mut g = InMemoryGraph::new();
        g.add_nodes(vec![module("m1", "a"), module("m2", "b")])
            .unwrap();
        let edge = GraphEdge::structural(
            EdgeId(0),
            NodeId::from_raw("m1"),
            NodeId::from_raw("m2"),
            EdgeKind::Calls,
        );
        g.add_edges(vec![edge], true).unwrap();
        assert_eq!(g.edge_count(), 1);
    }
}
