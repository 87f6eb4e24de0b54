//! `RejectionPropagationEnricher` (spec §4.5): "walk `CALLS`
//! transitively; if callee `REJECTS` class `E` and caller does not catch
//! it, propagate `REJECTS` to caller." Depends on
//! [`crate::MethodCallResolver`] for cross-file `CALLS` edges.
//!
//! A function's own promise rejections are recorded at extraction time
//! as `REJECTS` edges from a `CONSTRUCTOR_CALL[Promise]` to the rejected
//! value (spec §4.2 "Generators & promises"). This pass walks the
//! call graph outward from each such rejection: for every call site that
//! invokes a function which (transitively) rejects, and that call site
//! is not wrapped in a `try` block with a `catch` handler, a new
//! `REJECTS` edge is added from the call site to the same rejected
//! value, so callers inherit the exception shape of what they call.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use grafema_core::backend::GraphBackend;
use grafema_core::ident::NodeId;
use grafema_core::model::{EdgeId, EdgeKind, GraphEdge, NodeKind, NodePayload};
use grafema_orchestrate::{Phase, Plugin, PluginContext, PluginMetadata, PluginResult};

pub struct RejectionPropagationEnricher;

impl RejectionPropagationEnricher {
    pub fn new() -> Self {
        RejectionPropagationEnricher
    }
}

impl Default for RejectionPropagationEnricher {
    fn default() -> Self {
        Self::new()
    }
}

const PARENT_EDGE_KINDS: &[EdgeKind] = &[EdgeKind::Contains, EdgeKind::Defines, EdgeKind::HasScope];

fn parent_of(backend: &dyn GraphBackend, node: &NodeId) -> Option<NodeId> {
    backend
        .edges_to(node)
        .find(|e| PARENT_EDGE_KINDS.contains(&e.kind))
        .map(|e| e.source.clone())
}

fn enclosing_function(backend: &dyn GraphBackend, node: &NodeId) -> Option<NodeId> {
    let mut current = node.clone();
    for _ in 0..64 {
        let parent = parent_of(backend, &current)?;
        if backend.node(&parent).is_some_and(|n| matches!(n.payload, NodePayload::Function(_))) {
            return Some(parent);
        }
        current = parent;
    }
    None
}

/// Is there a `try` branch with a `catch` handler between `node` (a call
/// site) and `boundary` (the enclosing function)?
fn is_caught(backend: &dyn GraphBackend, node: &NodeId, boundary: &NodeId) -> bool {
    let mut current = node.clone();
    for _ in 0..64 {
        if &current == boundary {
            return false;
        }
        let Some(parent) = parent_of(backend, &current) else {
            return false;
        };
        if let Some(n) = backend.node(&parent) {
            if let NodePayload::Branch(attrs) = &n.payload {
                if attrs.branch_kind == "try"
                    && backend.edges_from(&parent).any(|e| e.kind == EdgeKind::HasCatch)
                {
                    return true;
                }
            }
        }
        current = parent;
    }
    false
}

#[async_trait]
impl Plugin for RejectionPropagationEnricher {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("rejection-propagation-enricher", Phase::Enrichment)
            .with_priority(70)
            .with_dependencies(vec!["method-call-resolver".to_string()])
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> PluginResult {
        let mut result = PluginResult::ok();
        let backend = &mut *ctx.backend;

        let mut rejects_by_function: HashMap<NodeId, HashSet<NodeId>> = HashMap::new();
        for edge in backend.all_edges().filter(|e| e.kind == EdgeKind::Rejects) {
            if let Some(func) = enclosing_function(backend, &edge.source) {
                rejects_by_function
                    .entry(func)
                    .or_default()
                    .insert(edge.target.clone());
            }
        }

        // (caller function, call node, callee function)
        let call_sites: Vec<(NodeId, NodeId, NodeId)> = backend
            .all_edges()
            .filter(|e| e.kind == EdgeKind::Calls)
            .filter_map(|e| {
                enclosing_function(backend, &e.source)
                    .map(|caller| (caller, e.source.clone(), e.target.clone()))
            })
            .collect();

        let mut new_edges = Vec::new();
        let fn_count = backend.find_by_type(NodeKind::Function).len().max(1);

        for _ in 0..fn_count {
            let mut changed = false;
            for (caller, call_node, callee) in &call_sites {
                if is_caught(backend, call_node, caller) {
                    continue;
                }
                let Some(callee_rejects) = rejects_by_function.get(callee).cloned() else {
                    continue;
                };
                let caller_set = rejects_by_function.entry(caller.clone()).or_default();
                for target in callee_rejects {
                    if caller_set.insert(target.clone()) {
                        new_edges.push(GraphEdge::heuristic(
                            EdgeId(0),
                            call_node.clone(),
                            target,
                            EdgeKind::Rejects,
                            0.8,
                        ));
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }

        if let Err(err) = backend.add_edges(new_edges, false) {
            result.push_error(err);
        }
        result
    }
}
