//! `DataFlowValidator` (spec §4.6): "every `VARIABLE|CONSTANT` must reach
//! a leaf node ... by following `ASSIGNED_FROM ∪ DERIVES_FROM` with cycle
//! detection. Depth limit 20. Class-property fields with no initializer
//! are exempt."
//!
//! `ASSIGNED_FROM`/`FLOWS_INTO` point `source(value) -> target(variable)`
//! (spec §4.2), so walking them means following a variable's *incoming*
//! edges. `DERIVES_FROM` is the opposite: `grafema-enrich`'s
//! `AliasTracker` emits it `source(variable) -> target(origin)` as a
//! shortcut over an already-walked chain, so it's followed *outgoing*.
//! `depth` counts hops away from the variable being checked, matching
//! [`grafema_enrich::alias_tracker::MAX_ALIAS_DEPTH`].

use std::collections::HashSet;

use async_trait::async_trait;
use grafema_core::backend::GraphBackend;
use grafema_core::ident::NodeId;
use grafema_core::model::{EdgeId, EdgeKind, GraphEdge, IssueAttrs, NodeKind, NodePayload, Severity};
use grafema_enrich::alias_tracker::MAX_ALIAS_DEPTH;
use grafema_orchestrate::{Phase, Plugin, PluginContext, PluginMetadata, PluginResult};

pub struct DataFlowValidator;

impl DataFlowValidator {
    pub fn new() -> Self {
        DataFlowValidator
    }
}

impl Default for DataFlowValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn next_hop(backend: &dyn GraphBackend, current: &NodeId) -> Option<NodeId> {
    if let Some(e) = backend
        .edges_to(current)
        .find(|e| e.kind == EdgeKind::AssignedFrom || e.kind == EdgeKind::FlowsInto)
    {
        return Some(e.source.clone());
    }
    backend
        .edges_from(current)
        .find(|e| e.kind == EdgeKind::DerivesFrom)
        .map(|e| e.target.clone())
}

enum Outcome {
    ReachesLeaf,
    Cycle,
    Unreached,
}

fn trace(backend: &dyn GraphBackend, start: &NodeId) -> Outcome {
    let mut visited: HashSet<NodeId> = HashSet::new();
    visited.insert(start.clone());
    let mut current = start.clone();

    for _ in 0..MAX_ALIAS_DEPTH {
        let Some(next) = next_hop(backend, &current) else {
            return Outcome::Unreached;
        };
        if visited.contains(&next) {
            return Outcome::Cycle;
        }
        if let Some(node) = backend.node(&next) {
            if node.payload.is_dataflow_leaf() {
                return Outcome::ReachesLeaf;
            }
        }
        visited.insert(next.clone());
        current = next;
    }
    Outcome::Unreached
}

fn is_exempt(payload: &NodePayload) -> bool {
    match payload {
        NodePayload::Variable(attrs) | NodePayload::Constant(attrs) => attrs.uninitialized,
        _ => false,
    }
}

#[async_trait]
impl Plugin for DataFlowValidator {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("data-flow-validator", Phase::Validation)
            .with_priority(80)
            .with_dependencies(vec!["alias-tracker".to_string()])
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> PluginResult {
        let mut result = PluginResult::ok();
        let backend = &mut *ctx.backend;

        let mut candidates = backend.find_by_type(NodeKind::Variable);
        candidates.extend(backend.find_by_type(NodeKind::Constant));

        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        for var_id in candidates {
            let Some(node) = backend.node(&var_id) else { continue };
            if is_exempt(&node.payload) {
                continue;
            }
            let (category, message) = match trace(backend, &var_id) {
                Outcome::ReachesLeaf => continue,
                Outcome::Cycle => (
                    "dataflow-cycle",
                    format!("`{}` is part of a data-flow cycle that never reaches a leaf", node.name),
                ),
                Outcome::Unreached => (
                    "dataflow-unreached",
                    format!("`{}` does not reach a data-flow leaf within depth {MAX_ALIAS_DEPTH}", node.name),
                ),
            };

            let issue_id = NodeId::from_raw(format!("issue:{category}#{var_id}"));
            nodes.push(grafema_core::model::GraphNode {
                id: issue_id.clone(),
                name: category.to_string(),
                file: node.file.clone(),
                line: node.line,
                column: node.column,
                payload: NodePayload::Issue(IssueAttrs {
                    category: category.to_string(),
                    message,
                    severity: Severity::Warning,
                }),
            });
            edges.push(GraphEdge::structural(EdgeId(0), var_id, issue_id, EdgeKind::Violates));
        }

        if let Err(err) = backend.add_nodes(nodes) {
            result.push_error(err);
        }
        if let Err(err) = backend.add_edges(edges, true) {
            result.push_error(err);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafema_core::graph::InMemoryGraph;
    use grafema_core::model::{GraphNode, LiteralAttrs, VariableAttrs};

    fn node(id: &str, payload: NodePayload) -> GraphNode {
        GraphNode {
            id: NodeId::from_raw(id),
            name: id.to_string(),
            file: Some("a.ts".into()),
            line: Some(1),
            column: None,
            payload,
        }
    }

    #[tokio::test]
    async fn flags_a_variable_with_no_incoming_assignment() {
        let mut backend = InMemoryGraph::new();
        backend
            .add_nodes(vec![node("v", NodePayload::Variable(VariableAttrs::default()))])
            .unwrap();

        let validator = DataFlowValidator::new();
        let mut ctx = PluginContext::new(&mut backend, ".");
        validator.execute(&mut ctx).await;

        assert!(backend
            .edges_from(&NodeId::from_raw("v"))
            .any(|e| e.kind == EdgeKind::Violates));
    }

    #[tokio::test]
    async fn a_variable_reaching_a_literal_is_clean() {
        let mut backend = InMemoryGraph::new();
        backend
            .add_nodes(vec![
                node("v", NodePayload::Variable(VariableAttrs::default())),
                node(
                    "lit",
                    NodePayload::Literal(LiteralAttrs { literal_kind: "number".to_string(), raw: "1".to_string() }),
                ),
            ])
            .unwrap();
        backend
            .add_edges(
                vec![GraphEdge::structural(EdgeId(0), NodeId::from_raw("lit"), NodeId::from_raw("v"), EdgeKind::AssignedFrom)],
                true,
            )
            .unwrap();

        let validator = DataFlowValidator::new();
        let mut ctx = PluginContext::new(&mut backend, ".");
        validator.execute(&mut ctx).await;

        assert_eq!(backend.edges_from(&NodeId::from_raw("v")).filter(|e| e.kind == EdgeKind::Violates).count(), 0);
    }

    #[tokio::test]
    async fn an_uninitialized_field_is_exempt() {
        let mut backend = InMemoryGraph::new();
        backend
            .add_nodes(vec![node(
                "f",
                NodePayload::Variable(VariableAttrs { is_const: false, uninitialized: true }),
            )])
            .unwrap();

        let validator = DataFlowValidator::new();
        let mut ctx = PluginContext::new(&mut backend, ".");
        validator.execute(&mut ctx).await;

        assert_eq!(backend.edges_from(&NodeId::from_raw("f")).count(), 0);
    }
}
