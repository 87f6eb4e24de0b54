//! Crate-level integration tests exercising [`crate::graph::InMemoryGraph`]
//! through the public [`crate::backend::GraphBackend`] trait, covering
//! invariants I1-I6 end to end (unit tests for individual pieces live
//! alongside their modules).

use std::path::PathBuf;

use crate::backend::GraphBackend;
use crate::graph::InMemoryGraph;
use crate::ident::NodeId;
use crate::model::{
    ClassAttrs, EdgeKind, FunctionAttrs, GraphEdge, GraphNode, Language, ModuleAttrs, NodeKind,
    NodePayload,
};

fn module(id: &str, name: &str) -> GraphNode {
    GraphNode {
        id: NodeId::from_raw(id),
        name: name.to_string(),
        file: Some(PathBuf::from(name)),
        line: None,
        column: None,
        payload: NodePayload::Module(ModuleAttrs {
            language: Some(Language::TypeScript),
            package: None,
        }),
    }
}

fn function(id: &str, name: &str) -> GraphNode {
    GraphNode {
        id: NodeId::from_raw(id),
        name: name.to_string(),
        file: None,
        line: Some(1),
        column: Some(0),
        payload: NodePayload::Function(FunctionAttrs::default()),
    }
}

fn class(id: &str, name: &str) -> GraphNode {
    GraphNode {
        id: NodeId::from_raw(id),
        name: name.to_string(),
        file: None,
        line: None,
        column: None,
        payload: NodePayload::Class(ClassAttrs::default()),
    }
}

#[test]
fn node_count_and_lookup_by_type() {
    let mut g = InMemoryGraph::new();
    g.add_nodes(vec![
        module("m1", "a.ts"),
        function("fn:foo", "foo"),
        function("fn:bar", "bar"),
    ])
    .unwrap();

    assert_eq!(g.node_count(), 3);
    assert_eq!(g.find_by_type(NodeKind::Function).len(), 2);
    assert_eq!(g.find_by_type(NodeKind::Module).len(), 1);
}

#[test]
fn edges_respect_kind_signature() {
    let mut g = InMemoryGraph::new();
    g.add_nodes(vec![class("C", "Widget"), function("fn:foo", "foo")])
        .unwrap();

    // CALLS requires (Call|MethodCall) -> Function; Class -> Function must fail.
    let bad = GraphEdge::structural(
        crate::model::EdgeId(0),
        NodeId::from_raw("C"),
        NodeId::from_raw("fn:foo"),
        EdgeKind::Calls,
    );
    assert!(g.add_edges(vec![bad], false).is_err());
}

#[test]
fn bfs_follows_only_requested_edge_kinds() {
    let mut g = InMemoryGraph::new();
    g.add_nodes(vec![
        module("m1", "a.ts"),
        function("fn:a", "a"),
        function("fn:b", "b"),
    ])
    .unwrap();
    g.add_edges(
        vec![
            GraphEdge::structural(
                crate::model::EdgeId(0),
                NodeId::from_raw("m1"),
                NodeId::from_raw("fn:a"),
                EdgeKind::Contains,
            ),
            GraphEdge::heuristic(
                crate::model::EdgeId(0),
                NodeId::from_raw("fn:a"),
                NodeId::from_raw("fn:b"),
                EdgeKind::FlowsInto,
                0.6,
            ),
        ],
        true,
    )
    .unwrap();

    let reached = g.bfs(&[NodeId::from_raw("m1")], 5, &[EdgeKind::Contains]);
    assert!(reached.contains(&NodeId::from_raw("fn:a")));
    assert!(!reached.contains(&NodeId::from_raw("fn:b")));
}

#[test]
fn ancestors_via_walks_containment_to_the_root() {
    let mut g = InMemoryGraph::new();
    g.add_nodes(vec![module("m1", "a.ts"), function("fn:foo", "foo")])
        .unwrap();
    g.add_edges(
        vec![GraphEdge::structural(
            crate::model::EdgeId(0),
            NodeId::from_raw("m1"),
            NodeId::from_raw("fn:foo"),
            EdgeKind::Contains,
        )],
        true,
    )
    .unwrap();

    let ancestors = crate::graph::ancestors_via(&g, &NodeId::from_raw("fn:foo"), EdgeKind::Contains);
    assert_eq!(ancestors, vec![NodeId::from_raw("m1")]);
}

#[test]
fn language_from_extension() {
    assert_eq!(
        Language::from_path(&PathBuf::from("a.ts")),
        Language::TypeScript
    );
    assert_eq!(
        Language::from_path(&PathBuf::from("a.py")),
        Language::Python
    );
    assert_eq!(Language::from_path(&PathBuf::from("a.xyz")), Language::Other);
}

#[test]
fn node_serializes_round_trip() {
    let node = function("fn:foo", "foo");
    let json = serde_json::to_string(&node).unwrap();
    let back: GraphNode = serde_json::from_str(&json).unwrap();
    assert_eq!(node, back);
}
