//! Cross-pass integration tests grounded in spec §8's end-to-end
//! scenarios (6, "Import resolution") plus the §4.5 contracts not
//! already covered by a module's own `#[cfg(test)]`.

use grafema_core::graph::InMemoryGraph;
use grafema_core::ident::{NodeId, SemanticId};
use grafema_core::model::{
    EdgeKind, ExportAttrs, FunctionAttrs, GraphNode, ImportAttrs, ModuleAttrs, NodePayload,
};
use grafema_orchestrate::{Phase, Plugin, PluginContext};

use crate::MethodCallResolver;

fn module(file: &str) -> GraphNode {
    GraphNode {
        id: NodeId::from_raw(format!("MODULE#{file}")),
        name: file.to_string(),
        file: Some(file.into()),
        line: None,
        column: None,
        payload: NodePayload::Module(ModuleAttrs::default()),
    }
}

fn function(file: &str, name: &str) -> GraphNode {
    GraphNode {
        id: SemanticId {
            file: file.into(),
            scope_path: vec![],
            type_tag: "FUNCTION".to_string(),
            name: name.to_string(),
            discriminator: None,
        }
        .to_node_id(),
        name: name.to_string(),
        file: Some(file.into()),
        line: Some(1),
        column: None,
        payload: NodePayload::Function(FunctionAttrs::default()),
    }
}

fn call(file: &str, name: &str) -> GraphNode {
    GraphNode {
        id: SemanticId {
            file: file.into(),
            scope_path: vec![],
            type_tag: "CALL".to_string(),
            name: name.to_string(),
            discriminator: None,
        }
        .to_node_id(),
        name: name.to_string(),
        file: Some(file.into()),
        line: Some(2),
        column: None,
        payload: NodePayload::Call(Default::default()),
    }
}

#[tokio::test]
async fn method_call_resolver_links_import_to_exported_function() {
    let mut backend = InMemoryGraph::new();

    let a_module = module("a.ts");
    let b_module = module("b.ts");
    let export = GraphNode {
        id: NodeId::from_raw("EXPORT#helper#a.ts"),
        name: "helper".to_string(),
        file: Some("a.ts".into()),
        line: Some(1),
        column: None,
        payload: NodePayload::Export(ExportAttrs::default()),
    };
    let helper_fn = function("a.ts", "helper");
    let import_node = GraphNode {
        id: NodeId::from_raw("IMPORT#helper#b.ts"),
        name: "helper".to_string(),
        file: Some("b.ts".into()),
        line: Some(1),
        column: None,
        payload: NodePayload::Import(ImportAttrs {
            source: "./a".to_string(),
            imported_name: Some("helper".to_string()),
            is_default: false,
            is_namespace: false,
        }),
    };
    let call_node = call("b.ts", "helper");

    backend
        .add_nodes(vec![
            a_module.clone(),
            b_module.clone(),
            export.clone(),
            helper_fn.clone(),
            import_node.clone(),
            call_node.clone(),
        ])
        .unwrap();

    backend
        .add_edges(
            vec![
                grafema_core::model::GraphEdge::structural(
                    grafema_core::model::EdgeId(0),
                    b_module.id.clone(),
                    import_node.id.clone(),
                    EdgeKind::Imports,
                ),
                grafema_core::model::GraphEdge::structural(
                    grafema_core::model::EdgeId(0),
                    import_node.id.clone(),
                    export.id.clone(),
                    EdgeKind::ImportsFrom,
                ),
                grafema_core::model::GraphEdge::structural(
                    grafema_core::model::EdgeId(0),
                    export.id.clone(),
                    helper_fn.id.clone(),
                    EdgeKind::Declares,
                ),
            ],
            true,
        )
        .unwrap();

    let resolver = MethodCallResolver::new();
    let mut ctx = PluginContext::new(&mut backend, ".");
    let result = resolver.execute(&mut ctx).await;
    assert!(result.is_clean());

    assert!(backend
        .edges_from(&call_node.id)
        .any(|e| e.kind == EdgeKind::Calls && e.target == helper_fn.id));
}

#[tokio::test]
async fn method_call_resolver_skips_object_qualified_calls() {
    let mut backend = InMemoryGraph::new();
    let m = module("x.ts");
    let mut c = call("x.ts", "render");
    if let NodePayload::Call(attrs) = &mut c.payload {
        attrs.has_object = true;
    }
    backend.add_nodes(vec![m, c.clone()]).unwrap();

    let resolver = MethodCallResolver::new();
    let mut ctx = PluginContext::new(&mut backend, ".");
    resolver.execute(&mut ctx).await;

    assert_eq!(backend.edges_from(&c.id).count(), 0);
    let metadata = MethodCallResolver::new().metadata();
    assert_eq!(metadata.phase, Phase::Enrichment);
}
