//! `AliasTracker` (spec §4.5): "follow `ASSIGNED_FROM` chains up to depth
//! *D=20* to build variable-to-origin alias maps used by downstream
//! validators." Rather than hand a private map to validators (which run
//! in a separate crate/pass and only see the graph), this pass
//! materializes each alias chain's terminal origin as a `DERIVES_FROM`
//! shortcut edge from the variable to the origin it ultimately resolves
//! to — `grafema-validate`'s `DataFlowValidator` and the `traceAlias`
//! query surface (spec §6) both read it directly off the graph.

use std::collections::HashSet;

use async_trait::async_trait;
use grafema_core::backend::GraphBackend;
use grafema_core::ident::NodeId;
use grafema_core::model::{EdgeId, EdgeKind, GraphEdge, NodeKind};
use grafema_orchestrate::{Phase, Plugin, PluginContext, PluginMetadata, PluginResult};

pub const MAX_ALIAS_DEPTH: usize = 20;

pub struct AliasTracker;

impl AliasTracker {
    pub fn new() -> Self {
        AliasTracker
    }
}

impl Default for AliasTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Walks `ASSIGNED_FROM` (falling back to `FLOWS_INTO`, for reassignment
/// chains) from `start` up to [`MAX_ALIAS_DEPTH`] hops. Returns
/// `(chain, cyclic)` — `chain` excludes `start` itself.
pub fn trace_alias_chain(backend: &dyn GraphBackend, start: &NodeId) -> (Vec<NodeId>, bool) {
    let mut chain = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    visited.insert(start.clone());
    let mut current = start.clone();

    for _ in 0..MAX_ALIAS_DEPTH {
        // Both `ASSIGNED_FROM` and `FLOWS_INTO` are emitted
        // `source(value) -> target(variable)` (spec §4.2); walking a
        // variable's *incoming* edges of either kind moves one step
        // closer to its origin.
        let next = backend
            .edges_to(&current)
            .find(|e| e.kind == EdgeKind::AssignedFrom || e.kind == EdgeKind::FlowsInto)
            .map(|e| e.source.clone());

        let Some(next) = next else { break };
        if visited.contains(&next) {
            chain.push(next);
            return (chain, true);
        }
        visited.insert(next.clone());
        chain.push(next.clone());
        current = next;
    }
    (chain, false)
}

#[async_trait]
impl Plugin for AliasTracker {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("alias-tracker", Phase::Enrichment).with_priority(60)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> PluginResult {
        let mut result = PluginResult::ok();
        let mut new_edges = Vec::new();
        let mut cyclic = Vec::new();

        let mut vars = ctx.backend.find_by_type(NodeKind::Variable);
        vars.extend(ctx.backend.find_by_type(NodeKind::Constant));

        for var_id in vars {
            if ctx.is_cancelled() {
                break;
            }
            let (chain, is_cyclic) = trace_alias_chain(ctx.backend, &var_id);
            if is_cyclic {
                cyclic.push(var_id.clone());
                continue;
            }
            if let Some(origin) = chain.last() {
                if chain.len() > 1 {
                    new_edges.push(GraphEdge::heuristic(
                        EdgeId(0),
                        var_id,
                        origin.clone(),
                        EdgeKind::DerivesFrom,
                        1.0 / (chain.len() as f32),
                    ));
                }
            }
        }

        if let Err(err) = ctx.backend.add_edges(new_edges, false) {
            result.push_error(err);
        }
        crate::dangling_edges::record_unresolved(ctx.backend, &cyclic, "dataflow-cycle");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafema_core::graph::InMemoryGraph;
    use grafema_core::model::{GraphNode, LiteralAttrs, NodePayload, VariableAttrs};

    fn node(id: &str, payload: NodePayload) -> GraphNode {
        GraphNode {
            id: NodeId::from_raw(id),
            name: id.to_string(),
            file: None,
            line: None,
            column: None,
            payload,
        }
    }

    #[test]
    fn follows_assigned_from_chain_to_a_literal_origin() {
        let mut g = InMemoryGraph::new();
        g.add_nodes(vec![
            node("a", NodePayload::Variable(VariableAttrs::default())),
            node("b", NodePayload::Variable(VariableAttrs::default())),
            node(
                "lit",
                NodePayload::Literal(LiteralAttrs {
                    literal_kind: "number".to_string(),
                    raw: "1".to_string(),
                }),
            ),
        ])
        .unwrap();
        g.add_edges(
            vec![
                // `b` flows into `a`; `lit` flows into `b` — both edges
                // point `source(value) -> target(variable)`.
                GraphEdge::structural(EdgeId(0), NodeId::from_raw("b"), NodeId::from_raw("a"), EdgeKind::AssignedFrom),
                GraphEdge::structural(EdgeId(0), NodeId::from_raw("lit"), NodeId::from_raw("b"), EdgeKind::AssignedFrom),
            ],
            true,
        )
        .unwrap();

        let (chain, cyclic) = trace_alias_chain(&g, &NodeId::from_raw("a"));
        assert!(!cyclic);
        assert_eq!(chain.last(), Some(&NodeId::from_raw("lit")));
    }

    #[test]
    fn detects_a_cycle() {
        let mut g = InMemoryGraph::new();
        g.add_nodes(vec![
            node("a", NodePayload::Variable(VariableAttrs::default())),
            node("b", NodePayload::Variable(VariableAttrs::default())),
        ])
        .unwrap();
        g.add_edges(
            vec![
                GraphEdge::structural(EdgeId(0), NodeId::from_raw("a"), NodeId::from_raw("b"), EdgeKind::AssignedFrom),
                GraphEdge::structural(EdgeId(0), NodeId::from_raw("b"), NodeId::from_raw("a"), EdgeKind::AssignedFrom),
            ],
            true,
        )
        .unwrap();

        let (_chain, cyclic) = trace_alias_chain(&g, &NodeId::from_raw("a"));
        assert!(cyclic);
    }
}
