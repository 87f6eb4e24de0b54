//! `ArgumentParameterLinker` (spec §4.5): "for each resolved
//! `CALLS(call → fn)` edge, connect `PASSES_ARGUMENT[call, argIndex]` to
//! the matching `PARAMETER` by index; rest params absorb the tail."
//!
//! Depends on [`crate::MethodCallResolver`] having already populated
//! `CALLS` edges (cross-file resolution in particular). The link itself
//! is materialized as a `FLOWS_INTO` edge from the argument's value node
//! to the matching `PARAMETER`, matching the data-flow shape of spec
//! scenario 2 ("`FLOWS_INTO` of the default `1` into parameter `c`").

use async_trait::async_trait;
use grafema_core::backend::GraphBackend;
use grafema_core::ident::NodeId;
use grafema_core::model::{EdgeId, EdgeKind, GraphEdge, NodePayload};
use grafema_orchestrate::{Phase, Plugin, PluginContext, PluginMetadata, PluginResult};

pub struct ArgumentParameterLinker;

impl ArgumentParameterLinker {
    pub fn new() -> Self {
        ArgumentParameterLinker
    }
}

impl Default for ArgumentParameterLinker {
    fn default() -> Self {
        Self::new()
    }
}

struct ParamSlot {
    id: NodeId,
    index: u32,
    sub_index: u32,
    is_rest: bool,
}

fn parse_arg_index(label: &str) -> Option<(u32, bool)> {
    if let Some(stripped) = label.strip_suffix('*') {
        stripped.parse().ok().map(|i| (i, true))
    } else {
        label.parse().ok().map(|i| (i, false))
    }
}

fn function_params(backend: &dyn GraphBackend, fn_id: &NodeId) -> Vec<ParamSlot> {
    let mut params: Vec<ParamSlot> = backend
        .edges_from(fn_id)
        .filter(|e| e.kind == EdgeKind::HasParameter)
        .filter_map(|e| {
            backend.node(&e.target).map(|n| {
                let (sub_index, is_rest) = match &n.payload {
                    NodePayload::Parameter(attrs) => (attrs.sub_index, attrs.is_rest),
                    _ => (0, false),
                };
                ParamSlot {
                    id: e.target.clone(),
                    index: sub_index / 1000,
                    sub_index: sub_index % 1000,
                    is_rest,
                }
            })
        })
        .collect();
    params.sort_by_key(|p| (p.index, p.sub_index));
    params
}

/// The primary (non-destructured, or outermost destructured) binding for
/// `index`: the lowest `sub_index` at that slot.
fn primary_binding(params: &[ParamSlot], index: u32) -> Option<&ParamSlot> {
    params.iter().filter(|p| p.index == index).min_by_key(|p| p.sub_index)
}

fn rest_param(params: &[ParamSlot]) -> Option<&ParamSlot> {
    params.iter().find(|p| p.is_rest)
}

#[async_trait]
impl Plugin for ArgumentParameterLinker {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("argument-parameter-linker", Phase::Enrichment)
            .with_priority(90)
            .with_dependencies(vec!["method-call-resolver".to_string()])
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> PluginResult {
        let mut result = PluginResult::ok();
        let mut new_edges = Vec::new();

        let calls_edges: Vec<(NodeId, NodeId)> = ctx
            .backend
            .all_edges()
            .filter(|e| e.kind == EdgeKind::Calls)
            .map(|e| (e.source.clone(), e.target.clone()))
            .collect();

        for (call_id, fn_id) in calls_edges {
            if ctx.is_cancelled() {
                break;
            }
            let params = function_params(ctx.backend, &fn_id);
            if params.is_empty() {
                continue;
            }
            let rest = rest_param(&params);

            let passes: Vec<(NodeId, String)> = ctx
                .backend
                .edges_from(&call_id)
                .filter(|e| e.kind == EdgeKind::PassesArgument)
                .filter_map(|e| e.label.clone().map(|l| (e.target.clone(), l)))
                .collect();

            for (value_id, label) in passes {
                let Some((arg_index, _is_spread)) = parse_arg_index(&label) else {
                    continue;
                };

                let target = if let Some(rest) = rest {
                    if arg_index >= rest.index {
                        Some(rest.id.clone())
                    } else {
                        primary_binding(&params, arg_index).map(|p| p.id.clone())
                    }
                } else {
                    primary_binding(&params, arg_index).map(|p| p.id.clone())
                };

                if let Some(target) = target {
                    new_edges.push(GraphEdge::structural(
                        EdgeId(0),
                        value_id,
                        target,
                        EdgeKind::FlowsInto,
                    ));
                }
            }
        }

        if let Err(err) = ctx.backend.add_edges(new_edges, true) {
            result.push_error(err);
        }
        result
    }
}
