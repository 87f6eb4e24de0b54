//! `CallResolverValidator` (spec §4.6): `∀ CALL x: (¬attr(x,"object") ∧
//! ¬∃y. CALLS(x,y)) ⇒ issue:unresolved-call`. Expressed here as a direct
//! scan rather than through `grafema-query`'s Datalog engine — the rule
//! only needs two predicates and this validator runs inside the
//! orchestrator's own `Phase::Validation`, before any caller has a reason
//! to reach for the general-purpose query surface.

use async_trait::async_trait;
use grafema_core::backend::GraphBackend;
use grafema_core::ident::NodeId;
use grafema_core::model::{EdgeId, EdgeKind, GraphEdge, IssueAttrs, NodeKind, NodePayload, Severity};
use grafema_orchestrate::{Phase, Plugin, PluginContext, PluginMetadata, PluginResult};

pub struct CallResolverValidator;

impl CallResolverValidator {
    pub fn new() -> Self {
        CallResolverValidator
    }
}

impl Default for CallResolverValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for CallResolverValidator {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("call-resolver-validator", Phase::Validation).with_priority(90)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> PluginResult {
        let mut result = PluginResult::ok();
        let backend = &mut *ctx.backend;

        let mut unresolved: Vec<NodeId> = Vec::new();
        for call_id in backend.find_by_type(NodeKind::Call) {
            let Some(call) = backend.node(&call_id) else { continue };
            if let NodePayload::Call(attrs) = &call.payload {
                if attrs.has_object {
                    continue;
                }
            }
            if backend.edges_from(&call_id).any(|e| e.kind == EdgeKind::Calls) {
                continue;
            }
            unresolved.push(call_id);
        }

        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        for call_id in unresolved {
            let Some(call) = backend.node(&call_id) else { continue };
            let line = call.line.unwrap_or(0);
            let file = call.file.clone().unwrap_or_default();
            let issue_id = NodeId::from_raw(format!("issue:unresolved-call#{call_id}"));
            nodes.push(grafema_core::model::GraphNode {
                id: issue_id.clone(),
                name: "unresolved-call".to_string(),
                file: Some(file.clone()),
                line: Some(line),
                column: call.column,
                payload: NodePayload::Issue(IssueAttrs {
                    category: "unresolved-call".to_string(),
                    message: format!("call to `{}` at {}:{} did not resolve to a FUNCTION", call.name, file.display(), line),
                    severity: Severity::Error,
                }),
            });
            edges.push(GraphEdge::structural(EdgeId(0), call_id, issue_id, EdgeKind::Violates));
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
    use grafema_core::ident::{NodeId, SemanticId};
    use grafema_core::model::{CallAttrs, FunctionAttrs, GraphNode, ModuleAttrs};

    fn module() -> GraphNode {
        GraphNode {
            id: NodeId::from_raw("MODULE#a.ts"),
            name: "a.ts".to_string(),
            file: Some("a.ts".into()),
            line: None,
            column: None,
            payload: NodePayload::Module(ModuleAttrs::default()),
        }
    }

    fn call(name: &str, has_object: bool) -> GraphNode {
        GraphNode {
            id: SemanticId {
                file: "a.ts".into(),
                scope_path: vec![],
                type_tag: "CALL".to_string(),
                name: name.to_string(),
                discriminator: None,
            }
            .to_node_id(),
            name: name.to_string(),
            file: Some("a.ts".into()),
            line: Some(1),
            column: None,
            payload: NodePayload::Call(CallAttrs { has_object, class_name: None }),
        }
    }

    #[tokio::test]
    async fn flags_an_unresolved_call_as_an_issue() {
        let mut backend = InMemoryGraph::new();
        let foo = call("foo", false);
        backend.add_nodes(vec![module(), foo.clone()]).unwrap();

        let validator = CallResolverValidator::new();
        let mut ctx = PluginContext::new(&mut backend, ".");
        let result = validator.execute(&mut ctx).await;
        assert!(result.is_clean());

        assert!(backend
            .edges_from(&foo.id)
            .any(|e| e.kind == EdgeKind::Violates));
    }

    #[tokio::test]
    async fn skips_resolved_and_object_qualified_calls() {
        let mut backend = InMemoryGraph::new();
        let bar_fn = GraphNode {
            id: NodeId::from_raw("FUNCTION#bar"),
            name: "bar".to_string(),
            file: Some("a.ts".into()),
            line: Some(1),
            column: None,
            payload: NodePayload::Function(FunctionAttrs::default()),
        };
        let resolved = call("bar", false);
        let qualified = call("render", true);
        backend
            .add_nodes(vec![module(), bar_fn.clone(), resolved.clone(), qualified.clone()])
            .unwrap();
        backend
            .add_edges(
                vec![GraphEdge::structural(EdgeId(0), resolved.id.clone(), bar_fn.id.clone(), EdgeKind::Calls)],
                true,
            )
            .unwrap();

        let validator = CallResolverValidator::new();
        let mut ctx = PluginContext::new(&mut backend, ".");
        validator.execute(&mut ctx).await;

        assert_eq!(backend.edges_from(&resolved.id).filter(|e| e.kind == EdgeKind::Violates).count(), 0);
        assert_eq!(backend.edges_from(&qualified.id).filter(|e| e.kind == EdgeKind::Violates).count(), 0);
    }
}
