//! `TypeScriptDeadCodeValidator` (spec §4.6): "flags interfaces with zero
//! implementations (warning), zero properties (info), exactly one
//! implementation (info)." Implementation count is read directly off
//! `IMPLEMENTS` edges (`grafema-extract`'s builder emits one per `class
//! ... implements Interface` clause) — no attribute bookkeeping needed.

use async_trait::async_trait;
use grafema_core::backend::GraphBackend;
use grafema_core::ident::NodeId;
use grafema_core::model::{EdgeId, EdgeKind, GraphEdge, IssueAttrs, NodeKind, NodePayload, Severity};
use grafema_orchestrate::{Phase, Plugin, PluginContext, PluginMetadata, PluginResult};

pub struct TypeScriptDeadCodeValidator;

impl TypeScriptDeadCodeValidator {
    pub fn new() -> Self {
        TypeScriptDeadCodeValidator
    }
}

impl Default for TypeScriptDeadCodeValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn issue(
    interface_id: &NodeId,
    category: &str,
    message: String,
    severity: Severity,
    file: Option<std::path::PathBuf>,
    line: Option<u32>,
    column: Option<u32>,
) -> (grafema_core::model::GraphNode, GraphEdge) {
    let issue_id = NodeId::from_raw(format!("issue:{category}#{interface_id}"));
    let node = grafema_core::model::GraphNode {
        id: issue_id.clone(),
        name: category.to_string(),
        file,
        line,
        column,
        payload: NodePayload::Issue(IssueAttrs { category: category.to_string(), message, severity }),
    };
    let edge = GraphEdge::structural(EdgeId(0), interface_id.clone(), issue_id, EdgeKind::Violates);
    (node, edge)
}

#[async_trait]
impl Plugin for TypeScriptDeadCodeValidator {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata::new("typescript-dead-code-validator", Phase::Validation).with_priority(70)
    }

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> PluginResult {
        let mut result = PluginResult::ok();
        let backend = &mut *ctx.backend;

        let mut nodes = Vec::new();
        let mut edges = Vec::new();

        for interface_id in backend.find_by_type(NodeKind::Interface) {
            let Some(iface) = backend.node(&interface_id) else { continue };
            let NodePayload::Interface(attrs) = &iface.payload else { continue };

            let implementation_count = backend
                .edges_to(&interface_id)
                .filter(|e| e.kind == EdgeKind::Implements)
                .count();

            let (category, message, severity) = match implementation_count {
                0 => (
                    "unimplemented-interface",
                    format!("interface `{}` has no implementations", iface.name),
                    Severity::Warning,
                ),
                1 => (
                    "single-implementation-interface",
                    format!("interface `{}` has exactly one implementation", iface.name),
                    Severity::Info,
                ),
                _ => continue,
            };
            let (n, e) = issue(&interface_id, category, message, severity, iface.file.clone(), iface.line, iface.column);
            nodes.push(n);
            edges.push(e);

            if attrs.property_count == 0 {
                let (n, e) = issue(
                    &interface_id,
                    "empty-interface",
                    format!("interface `{}` declares zero properties", iface.name),
                    Severity::Info,
                    iface.file.clone(),
                    iface.line,
                    iface.column,
                );
                nodes.push(n);
                edges.push(e);
            }
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
    use grafema_core::model::{ClassAttrs, GraphNode, InterfaceAttrs};

    fn iface(id: &str, name: &str, property_count: u32) -> GraphNode {
        GraphNode {
            id: NodeId::from_raw(id),
            name: name.to_string(),
            file: Some("a.ts".into()),
            line: Some(1),
            column: None,
            payload: NodePayload::Interface(InterfaceAttrs { extends: vec![], property_count }),
        }
    }

    fn class(id: &str, name: &str) -> GraphNode {
        GraphNode {
            id: NodeId::from_raw(id),
            name: name.to_string(),
            file: Some("a.ts".into()),
            line: Some(2),
            column: None,
            payload: NodePayload::Class(ClassAttrs::default()),
        }
    }

    #[tokio::test]
    async fn flags_unimplemented_and_empty_interface() {
        let mut backend = InMemoryGraph::new();
        backend.add_nodes(vec![iface("I", "Shape", 0)]).unwrap();

        let validator = TypeScriptDeadCodeValidator::new();
        let mut ctx = PluginContext::new(&mut backend, ".");
        validator.execute(&mut ctx).await;

        let cats: Vec<_> = backend
            .edges_from(&NodeId::from_raw("I"))
            .filter_map(|e| backend.node(&e.target))
            .filter_map(|n| match &n.payload {
                NodePayload::Issue(a) => Some(a.category.clone()),
                _ => None,
            })
            .collect();
        assert!(cats.contains(&"unimplemented-interface".to_string()));
        assert!(cats.contains(&"empty-interface".to_string()));
    }

    #[tokio::test]
    async fn single_implementation_is_info_not_warning() {
        let mut backend = InMemoryGraph::new();
        let i = iface("I", "Shape", 2);
        let c = class("C", "Circle");
        backend.add_nodes(vec![i.clone(), c.clone()]).unwrap();
        backend
            .add_edges(vec![GraphEdge::structural(EdgeId(0), c.id.clone(), i.id.clone(), EdgeKind::Implements)], true)
            .unwrap();

        let validator = TypeScriptDeadCodeValidator::new();
        let mut ctx = PluginContext::new(&mut backend, ".");
        validator.execute(&mut ctx).await;

        let issues: Vec<_> = backend
            .edges_from(&i.id)
            .filter_map(|e| backend.node(&e.target))
            .filter_map(|n| match &n.payload {
                NodePayload::Issue(a) => Some(a.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].category, "single-implementation-interface");
        assert_eq!(issues[0].severity, Severity::Info);
    }
}
