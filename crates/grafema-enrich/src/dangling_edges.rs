//! Shared helper for the "Cross-file dangling edges policy" (spec §4.3):
//! "unresolved ones are recorded as `VIOLATES` edges to a synthetic
//! `issue:*` node." Every enrichment pass that fails to resolve a
//! best-effort reference (superclass, constructor target, …) after the
//! whole project has been indexed calls [`record_unresolved`] instead of
//! silently dropping the reference.

use async_trait::async_trait;
use grafema_core::backend::GraphBackend;
use grafema_core::ident::NodeId;
use grafema_core::model::{
    EdgeId, EdgeKind, GraphEdge, GraphNode, IssueAttrs, NodeKind, NodePayload, Severity,
};
use grafema_orchestrate::{Phase, Plugin, PluginContext, PluginMetadata, PluginResult};

pub fn record_unresolved(backend: &mut dyn GraphBackend, unresolved: &[NodeId], category: &str) {
    if unresolved.is_empty() {
        return;
    }
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    for source in unresolved {
        let issue_id = NodeId::from_raw(format!("issue:{category}#{source}"));
        if backend.node_exists(&issue_id) {
            edges.push(GraphEdge::structural(
                EdgeId(0),
                source.clone(),
                issue_id,
                EdgeKind::Violates,
            ));
            continue;
        }
        nodes.push(GraphNode {
            id: issue_id.clone(),
            name: category.to_string(),
            file: None,
            line: None,
            column: None,
            payload: NodePayload::Issue(IssueAttrs {
                category: category.to_string(),
                message: format!("{source} could not be resolved"),
                severity: Severity::Warning,
            }),
        });
        edges.push(GraphEdge::structural(
            EdgeId(0),
            source.clone(),
            issue_id,
            EdgeKind::Violates,
        ));
    }

    let _ = backend.add_nodes(nodes);
    let _ = backend.add_edges(edges, true);
}

/// Last enrichment pass (spec §4.3 "End-of-analysis enrichment
/// reconciles remaining dangling edges"): the builder only resolves a
/// `CLASS`'s `superclass_name`/an `INTERFACE`'s `extends` list against
/// same-file siblings (spec.md Open Question #5 — "superclass
/// references cross files by guessing same file"). This pass re-tries
/// every class/interface that still lacks the `EXTENDS` edge its
/// attributes imply against a project-wide name index, then records
/// whatever is still unresolved as a `VIOLATES` issue.
pub struct DanglingEdgeReconciler;

impl DanglingEdgeReconciler {
    pub fn new() -> Self {
        DanglingEdgeReconciler
    }
}

impl Default for DanglingEdgeReconciler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for DanglingEdgeReconciler {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("dangling-edge-reconciler", Phase::Enrichment).with_priority(10)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> PluginResult {
        let mut result = PluginResult::ok();
        let backend = &mut *ctx.backend;

        let mut class_index: std::collections::HashMap<String, Vec<NodeId>> = Default::default();
        for id in backend.find_by_type(NodeKind::Class) {
            if let Some(n) = backend.node(&id) {
                class_index.entry(n.name.clone()).or_default().push(id);
            }
        }
        let mut interface_index: std::collections::HashMap<String, Vec<NodeId>> = Default::default();
        for id in backend.find_by_type(NodeKind::Interface) {
            if let Some(n) = backend.node(&id) {
                interface_index.entry(n.name.clone()).or_default().push(id);
            }
        }

        let mut new_edges = Vec::new();
        let mut unresolved = Vec::new();

        for id in backend.find_by_type(NodeKind::Class) {
            let Some(node) = backend.node(&id) else { continue };
            let NodePayload::Class(attrs) = &node.payload else { continue };
            let Some(super_name) = &attrs.superclass_name else { continue };
            if backend.edges_from(&id).any(|e| e.kind == EdgeKind::Extends) {
                continue;
            }
            match class_index.get(super_name).and_then(|v| v.iter().find(|c| **c != id)) {
                Some(target) => new_edges.push(GraphEdge::heuristic(
                    EdgeId(0),
                    id.clone(),
                    target.clone(),
                    EdgeKind::Extends,
                    0.7,
                )),
                None => unresolved.push(id.clone()),
            }
        }

        for id in backend.find_by_type(NodeKind::Interface) {
            let Some(node) = backend.node(&id) else { continue };
            let NodePayload::Interface(attrs) = &node.payload else { continue };
            let existing: std::collections::HashSet<String> = backend
                .edges_from(&id)
                .filter(|e| e.kind == EdgeKind::Extends)
                .filter_map(|e| backend.node(&e.target).map(|n| n.name.clone()))
                .collect();
            for super_name in &attrs.extends {
                if existing.contains(super_name) {
                    continue;
                }
                match interface_index.get(super_name).and_then(|v| v.iter().find(|i| **i != id)) {
                    Some(target) => new_edges.push(GraphEdge::heuristic(
                        EdgeId(0),
                        id.clone(),
                        target.clone(),
                        EdgeKind::Extends,
                        0.7,
                    )),
                    None => unresolved.push(id.clone()),
                }
            }
        }

        if let Err(err) = backend.add_edges(new_edges, false) {
            result.push_error(err);
        }
        record_unresolved(backend, &unresolved, "unresolved-extends");
        result
    }
}
