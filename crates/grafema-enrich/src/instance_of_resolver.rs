//! `InstanceOfResolver` (spec §4.5): "reconcile dangling `INSTANCE_OF`
//! edges using global class index." `grafema-extract`'s builder only
//! resolves `new Foo()` against classes declared in the same file;
//! cross-file constructor calls are left unlinked. This pass builds a
//! project-wide `name -> CLASS` index and links every `CONSTRUCTOR_CALL`
//! that still lacks an outgoing `INSTANCE_OF` edge.

use std::collections::HashMap;

use async_trait::async_trait;
use grafema_core::backend::GraphBackend;
use grafema_core::ident::NodeId;
use grafema_core::model::{EdgeId, EdgeKind, GraphEdge, NodeKind, NodePayload};
use grafema_orchestrate::{Phase, Plugin, PluginContext, PluginMetadata, PluginResult};

pub struct InstanceOfResolver;

impl InstanceOfResolver {
    pub fn new() -> Self {
        InstanceOfResolver
    }
}

impl Default for InstanceOfResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn class_index(backend: &dyn GraphBackend) -> HashMap<String, Vec<NodeId>> {
    let mut index: HashMap<String, Vec<NodeId>> = HashMap::new();
    for id in backend.find_by_type(NodeKind::Class) {
        if let Some(node) = backend.node(&id) {
            index.entry(node.name.clone()).or_default().push(id);
        }
    }
    index
}

#[async_trait]
impl Plugin for InstanceOfResolver {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("instance-of-resolver", Phase::Enrichment).with_priority(80)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> PluginResult {
        let mut result = PluginResult::ok();
        let index = class_index(ctx.backend);
        let mut new_edges = Vec::new();
        let mut issues = Vec::new();

        for cc_id in ctx.backend.find_by_type(NodeKind::ConstructorCall) {
            if ctx.is_cancelled() {
                break;
            }
            if ctx
                .backend
                .edges_from(&cc_id)
                .any(|e| e.kind == EdgeKind::InstanceOf)
            {
                continue;
            }
            let Some(cc) = ctx.backend.node(&cc_id) else {
                continue;
            };
            let NodePayload::ConstructorCall(attrs) = &cc.payload else {
                continue;
            };

            match index.get(&attrs.class_name) {
                // Same-file class not matched earlier (builder requires
                // an exact same-collections hit); prefer the candidate in
                // the constructor call's own file, else the first found
                // (best-effort — spec.md Open Question #5 notes the
                // original simply guesses "same file").
                Some(candidates) => {
                    let target = candidates
                        .iter()
                        .find(|id| {
                            ctx.backend.node(id).and_then(|n| n.file.as_ref()) == cc.file.as_ref()
                        })
                        .or_else(|| candidates.first())
                        .cloned();
                    if let Some(target) = target {
                        new_edges.push(GraphEdge::structural(
                            EdgeId(0),
                            cc_id.clone(),
                            target,
                            EdgeKind::InstanceOf,
                        ));
                    }
                }
                None => issues.push(cc_id.clone()),
            }
        }

        if let Err(err) = ctx.backend.add_edges(new_edges, false) {
            result.push_error(err);
        }

        crate::dangling_edges::record_unresolved(ctx.backend, &issues, "unresolved-instance-of");
        result
    }
}
