//! `MethodCallResolver` (spec §4.5): "for every `CALL` whose name matches
//! a `FUNCTION.name` (same file first, then exported functions of
//! imported modules), add `CALLS`." Same-file resolution already happens
//! in `grafema-extract`'s builder for the common case; this pass covers
//! the calls the builder couldn't see — cross-file imports, and
//! same-file calls that were emitted before their target function (the
//! builder resolves against `Collections`, which is unordered w.r.t.
//! source position).

use std::collections::HashMap;

use async_trait::async_trait;
use grafema_core::backend::GraphBackend;
use grafema_core::ident::NodeId;
use grafema_core::model::{EdgeId, EdgeKind, GraphEdge, NodeKind, NodePayload};
use grafema_orchestrate::{Phase, Plugin, PluginContext, PluginMetadata, PluginResult};

pub struct MethodCallResolver;

impl MethodCallResolver {
    pub fn new() -> Self {
        MethodCallResolver
    }
}

impl Default for MethodCallResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of exported-function ids reachable from a given `EXTERNAL_MODULE`
/// or cross-file `MODULE` target by name, built once per run.
struct ExportIndex {
    /// (module file, name) -> FUNCTION node id
    by_file_and_name: HashMap<(std::path::PathBuf, String), NodeId>,
}

impl ExportIndex {
    fn build(backend: &dyn GraphBackend) -> Self {
        let mut by_file_and_name = HashMap::new();
        for export_id in backend.find_by_type(NodeKind::Export) {
            let Some(export) = backend.node(&export_id) else {
                continue;
            };
            let Some(file) = export.file.clone() else {
                continue;
            };
            for e in backend.edges_from(&export_id) {
                if e.kind != EdgeKind::Declares {
                    continue;
                }
                if let Some(target) = backend.node(&e.target) {
                    if matches!(target.payload, NodePayload::Function(_)) {
                        by_file_and_name.insert((file.clone(), export.name.clone()), e.target.clone());
                    }
                }
            }
        }
        ExportIndex { by_file_and_name }
    }

    fn lookup(&self, file: &std::path::Path, name: &str) -> Option<NodeId> {
        self.by_file_and_name
            .get(&(file.to_path_buf(), name.to_string()))
            .cloned()
    }
}

fn resolve_same_file(backend: &dyn GraphBackend, name: &str, file: &std::path::Path) -> Option<NodeId> {
    backend
        .find_by_type(NodeKind::Function)
        .into_iter()
        .find(|id| {
            backend
                .node(id)
                .is_some_and(|n| n.name == name && n.file.as_deref() == Some(file))
        })
}

/// Walks `call`'s module's `IMPORTS -> IMPORT -> IMPORTS_FROM -> target`
/// chain looking for an import whose local/imported name matches `name`,
/// then resolves `target` (an `EXPORT` or a `MODULE`, per the builder's
/// `IMPORTS_FROM` resolution) to a `FUNCTION` via `exports`.
fn resolve_imported(
    backend: &dyn GraphBackend,
    exports: &ExportIndex,
    name: &str,
    caller_file: &std::path::Path,
) -> Option<NodeId> {
    let module_id = backend
        .find_by_type(NodeKind::Module)
        .into_iter()
        .find(|id| backend.node(id).is_some_and(|n| n.file.as_deref() == Some(caller_file)))?;

    for imp_edge in backend.edges_from(&module_id) {
        if imp_edge.kind != EdgeKind::Imports {
            continue;
        }
        let Some(import_node) = backend.node(&imp_edge.target) else {
            continue;
        };
        let NodePayload::Import(attrs) = &import_node.payload else {
            continue;
        };
        let matches_name = attrs.imported_name.as_deref() == Some(name) || import_node.name == name;
        if !matches_name {
            continue;
        }

        for from_edge in backend.edges_from(&imp_edge.target) {
            if from_edge.kind != EdgeKind::ImportsFrom {
                continue;
            }
            let Some(target) = backend.node(&from_edge.target) else {
                continue;
            };
            match &target.payload {
                NodePayload::Function(_) => return Some(from_edge.target.clone()),
                NodePayload::Module(_) => {
                    if let Some(file) = &target.file {
                        if let Some(f) = exports.lookup(file, name) {
                            return Some(f);
                        }
                    }
                }
                _ => {}
            }
        }
    }
    None
}

#[async_trait]
impl Plugin for MethodCallResolver {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("method-call-resolver", Phase::Enrichment).with_priority(100)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> PluginResult {
        let mut result = PluginResult::ok();
        let exports = ExportIndex::build(ctx.backend);

        let mut candidates = ctx.backend.find_by_type(NodeKind::Call);
        candidates.extend(ctx.backend.find_by_type(NodeKind::MethodCall));

        let mut new_edges = Vec::new();
        for call_id in candidates {
            if ctx.is_cancelled() {
                break;
            }
            if ctx
                .backend
                .edges_from(&call_id)
                .any(|e| e.kind == EdgeKind::Calls)
            {
                continue;
            }
            let Some(call) = ctx.backend.node(&call_id) else {
                continue;
            };
            let Some(file) = call.file.clone() else {
                continue;
            };
            if let NodePayload::Call(attrs) = &call.payload {
                if attrs.has_object {
                    // `obj.method()` shaped calls where `obj` isn't `this`
                    // are out of scope for name-based resolution.
                    continue;
                }
            }
            let name = call.name.clone();

            let target = resolve_same_file(ctx.backend, &name, &file)
                .or_else(|| resolve_imported(ctx.backend, &exports, &name, &file));

            if let Some(target) = target {
                new_edges.push(GraphEdge::structural(EdgeId(0), call_id, target, EdgeKind::Calls));
            }
        }

        if let Err(err) = ctx.backend.add_edges(new_edges, false) {
            result.push_error(err);
        }
        result
    }
}
