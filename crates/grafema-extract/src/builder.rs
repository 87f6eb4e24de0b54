//! Turns a fully-populated [`Collections`] into the node/edge batches
//! spec §4.3 describes: collision-rename pass, then nodes, then edges in
//! a fixed order (structural, call-graph, data-flow, framework, type,
//! decorators, imports/exports, generators/promises). The builder never
//! writes to a [`grafema_core::GraphBackend`] itself — [`BuildOutput`] is
//! handed to the coordinator, which flushes both batches with
//! `skip_validation = true` in one `add_nodes` + one `add_edges` call per
//! file (spec §4.3 "two-phase buffered write").
//!
//! Cross-file references (superclass in another module, `IMPORTS_FROM`
//! targets, cross-file `CALLS`) are deliberately left unresolved here —
//! they are this file's job only as far as same-file lookup goes; the
//! rest is `grafema-enrich`'s `MethodCallResolver`/`InstanceOfResolver`
//! and the coordinator's post-pass.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use grafema_core::ident::IdGenerator;
use grafema_core::model::{
    BranchAttrs, CallAttrs, CaseAttrs, ClassAttrs, CompositeLiteralAttrs, ConstructorCallAttrs,
    DecoratorAttrs, EdgeKind, EnumAttrs, ExportAttrs, ExpressionAttrs, ExternalModuleAttrs,
    FunctionAttrs, GraphEdge, GraphNode, ImportAttrs, InterfaceAttrs, Language, LiteralAttrs,
    MethodCallAttrs, ModuleAttrs, NodePayload, ParameterAttrs, ScopeAttrs, TypeAttrs,
    TypeParameterAttrs, VariableAttrs,
};
use grafema_core::model::EdgeId;
use grafema_core::singletons::{external_module_key, SingletonRegistry};
use grafema_core::NodeId;

use crate::collections::{Collections, Pos, ValueRef};

pub struct BuildOutput {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

fn edge(source: NodeId, target: NodeId, kind: EdgeKind) -> GraphEdge {
    GraphEdge::structural(EdgeId(0), source, target, kind)
}

fn heuristic_edge(source: NodeId, target: NodeId, kind: EdgeKind, confidence: f32) -> GraphEdge {
    GraphEdge::heuristic(EdgeId(0), source, target, kind, confidence)
}

/// Applies `ids.resolve_collisions()` to every `CallInfo`/`MethodCallInfo`
/// (matched by the `pending_idx` recorded at visit time) and builds a
/// `base_id -> final id(s)` index for the best-effort forward references
/// produced by `calls::classify_value`'s nested-call case.
struct Rename {
    resolved: Vec<NodeId>,
    base_to_finals: HashMap<String, Vec<NodeId>>,
}

impl Rename {
    fn build(ids: &IdGenerator) -> Self {
        let bases = ids.pending_base_ids();
        let resolved = ids.resolve_collisions();
        let mut base_to_finals: HashMap<String, Vec<NodeId>> = HashMap::new();
        for (base, final_id) in bases.iter().zip(resolved.iter()) {
            base_to_finals
                .entry(base.clone())
                .or_default()
                .push(final_id.clone());
        }
        Rename {
            resolved,
            base_to_finals,
        }
    }

    fn final_for(&self, pending_idx: Option<usize>, fallback: &NodeId) -> NodeId {
        match pending_idx {
            Some(i) => self.resolved.get(i).cloned().unwrap_or_else(|| fallback.clone()),
            None => fallback.clone(),
        }
    }

    /// Best-effort resolution of a forward reference computed via
    /// `IdGenerator::peek_base_id` (never registered as pending itself).
    /// Exact match when the base id collided with exactly one real call;
    /// falls back to the base id unchanged when ambiguous or unknown
    /// (the caller drops the edge if that id never became a real node).
    fn resolve_forward_ref(&self, base: &NodeId) -> NodeId {
        match self.base_to_finals.get(base.as_str()) {
            Some(v) if v.len() == 1 => v[0].clone(),
            _ => base.clone(),
        }
    }
}

pub fn build(file_path: &Path, module: GraphNode, mut collections: Collections, ids: IdGenerator) -> BuildOutput {
    let rename = Rename::build(&ids);
    let module_id = module.id.clone();

    let mut nodes = vec![module];
    let mut node_ids: HashSet<NodeId> = HashSet::new();
    node_ids.insert(module_id.clone());
    let mut edges = Vec::new();

    // Rename collision-prone ids before anything reads them.
    for c in &mut collections.calls {
        c.id = rename.final_for(c.pending_idx, &c.id);
    }
    for m in &mut collections.method_calls {
        m.id = rename.final_for(m.pending_idx, &m.id);
    }

    push_scopes(file_path, &collections, &mut nodes, &mut node_ids, &mut edges);
    push_functions(file_path, &collections, &module_id, &mut nodes, &mut node_ids, &mut edges);
    push_classes(file_path, &collections, &module_id, &mut nodes, &mut node_ids, &mut edges);
    push_interfaces(file_path, &collections, &module_id, &mut nodes, &mut node_ids, &mut edges);
    push_type_aliases(file_path, &collections, &module_id, &mut nodes, &mut node_ids, &mut edges);
    push_enums(file_path, &collections, &module_id, &mut nodes, &mut node_ids, &mut edges);
    push_type_parameters(file_path, &collections, &mut nodes, &mut node_ids, &mut edges);
    push_parameters(file_path, &collections, &mut nodes, &mut node_ids, &mut edges);
    push_branches(file_path, &collections, &mut nodes, &mut node_ids, &mut edges);
    push_cases(file_path, &collections, &mut nodes, &mut node_ids, &mut edges);
    push_literals(file_path, &collections, &mut nodes, &mut node_ids);
    push_expressions(file_path, &collections, &mut nodes, &mut node_ids, &mut edges);
    push_object_literals(file_path, &collections, &mut nodes, &mut node_ids);
    push_array_literals(file_path, &collections, &mut nodes, &mut node_ids);
    push_variables(file_path, &collections, &module_id, &mut nodes, &mut node_ids, &mut edges);
    push_calls(file_path, &collections, &mut nodes, &mut node_ids, &mut edges, &rename);
    push_method_calls(file_path, &collections, &mut nodes, &mut node_ids, &mut edges, &rename);
    push_constructor_calls(file_path, &collections, &mut nodes, &mut node_ids, &mut edges);
    push_imports(file_path, &collections, &module_id, &mut nodes, &mut node_ids, &mut edges);
    push_exports(&collections, &module_id, &mut nodes, &mut node_ids, &mut edges);
    push_decorators(file_path, &collections, &mut nodes, &mut node_ids, &mut edges);
    push_framework(file_path, &collections, &module_id, &mut nodes, &mut node_ids, &mut edges);

    push_mutations(&collections, &node_ids, &mut edges, &rename);
    push_reassignments(&collections, &node_ids, &mut edges, &rename);
    push_yields(&collections, &node_ids, &mut edges);
    push_promise_resolutions(&collections, &node_ids, &mut edges);

    // Drop any edge whose endpoint never made it into this file's batch:
    // `add_edges(.., skip_validation = true)` assumes both ends exist.
    edges.retain(|e| node_ids.contains(&e.source) && node_ids.contains(&e.target));

    BuildOutput { nodes, edges }
}

fn gnode(id: NodeId, name: String, file: &Path, pos: Pos, payload: NodePayload) -> GraphNode {
    GraphNode {
        id,
        name,
        file: Some(file.to_path_buf()),
        line: Some(pos.line),
        column: pos.column,
        payload,
    }
}

/// One `SCOPE` node per function/class body, `HAS_SCOPE`-linked to the
/// `FUNCTION`/`CLASS` node that owns it (spec §4.3 structural edges).
/// Contained declarations still parent directly to the `FUNCTION`/`CLASS`
/// id rather than the scope id — the scope node exists so the lexical
/// boundary itself is queryable, not as a new parent in the containment
/// tree.
fn push_scopes(
    file: &Path,
    c: &Collections,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    for s in &c.scopes {
        nodes.push(gnode(
            s.id.clone(),
            s.scope_kind.clone(),
            file,
            s.pos,
            NodePayload::Scope(ScopeAttrs {
                scope_kind: s.scope_kind.clone(),
            }),
        ));
        ids.insert(s.id.clone());
        if let Some(owner) = &s.parent {
            edges.push(edge(owner.clone(), s.id.clone(), EdgeKind::HasScope));
        }
    }
}

fn push_functions(
    file: &Path,
    c: &Collections,
    module_id: &NodeId,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    for f in &c.functions {
        nodes.push(gnode(
            f.id.clone(),
            f.name.clone(),
            file,
            f.pos,
            NodePayload::Function(FunctionAttrs {
                is_async: f.is_async,
                is_generator: f.is_generator,
                is_arrow: f.is_arrow,
                is_method: f.is_method,
                rejection_patterns: f.rejection_patterns.clone(),
            }),
        ));
        ids.insert(f.id.clone());

        if let Some(class_parent) = &f.class_parent {
            edges.push(edge(class_parent.clone(), f.id.clone(), EdgeKind::Defines));
        } else {
            let parent = f.parent.clone().unwrap_or_else(|| module_id.clone());
            edges.push(edge(parent, f.id.clone(), EdgeKind::Contains));
        }
    }
}

fn push_classes(
    file: &Path,
    c: &Collections,
    module_id: &NodeId,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    for class in &c.classes {
        nodes.push(gnode(
            class.id.clone(),
            class.name.clone(),
            file,
            class.pos,
            NodePayload::Class(ClassAttrs {
                is_abstract: class.is_abstract,
                superclass_name: class.superclass_name.clone(),
            }),
        ));
        ids.insert(class.id.clone());

        let parent = class.parent.clone().unwrap_or_else(|| module_id.clone());
        edges.push(edge(parent, class.id.clone(), EdgeKind::Contains));

        if let Some(super_name) = &class.superclass_name {
            if let Some(target) = c.classes.iter().find(|o| &o.name == super_name && o.id != class.id) {
                edges.push(edge(class.id.clone(), target.id.clone(), EdgeKind::Extends));
            }
        }
        for iface_name in &class.implements {
            if let Some(target) = c.interfaces.iter().find(|i| &i.name == iface_name) {
                edges.push(edge(class.id.clone(), target.id.clone(), EdgeKind::Implements));
            }
        }
    }
}

fn push_interfaces(
    file: &Path,
    c: &Collections,
    module_id: &NodeId,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    for i in &c.interfaces {
        nodes.push(gnode(
            i.id.clone(),
            i.name.clone(),
            file,
            i.pos,
            NodePayload::Interface(InterfaceAttrs {
                extends: i.extends.clone(),
                property_count: i.property_count,
            }),
        ));
        ids.insert(i.id.clone());
        let parent = i.parent.clone().unwrap_or_else(|| module_id.clone());
        edges.push(edge(parent, i.id.clone(), EdgeKind::Contains));

        for super_name in &i.extends {
            if let Some(target) = c.interfaces.iter().find(|o| &o.name == super_name && o.id != i.id) {
                edges.push(edge(i.id.clone(), target.id.clone(), EdgeKind::Extends));
            }
        }
    }
}

fn push_type_aliases(
    file: &Path,
    c: &Collections,
    module_id: &NodeId,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    for t in &c.type_aliases {
        nodes.push(gnode(
            t.id.clone(),
            t.name.clone(),
            file,
            t.pos,
            NodePayload::Type(TypeAttrs {
                is_mapped: t.is_mapped,
                is_conditional: t.is_conditional,
                aliased_type: t.aliased_type.clone(),
            }),
        ));
        ids.insert(t.id.clone());
        let parent = t.parent.clone().unwrap_or_else(|| module_id.clone());
        edges.push(edge(parent, t.id.clone(), EdgeKind::Contains));
    }
}

fn push_enums(
    file: &Path,
    c: &Collections,
    module_id: &NodeId,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    for e in &c.enums {
        nodes.push(gnode(
            e.id.clone(),
            e.name.clone(),
            file,
            e.pos,
            NodePayload::Enum(EnumAttrs {
                is_const: e.is_const,
                members: e.members.clone(),
            }),
        ));
        ids.insert(e.id.clone());
        let parent = e.parent.clone().unwrap_or_else(|| module_id.clone());
        edges.push(edge(parent, e.id.clone(), EdgeKind::Contains));
    }
}

fn push_type_parameters(
    file: &Path,
    c: &Collections,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    for tp in &c.type_parameters {
        nodes.push(gnode(
            tp.id.clone(),
            tp.name.clone(),
            file,
            tp.pos,
            NodePayload::TypeParameter(TypeParameterAttrs {
                constraint: tp.constraint.clone(),
            }),
        ));
        ids.insert(tp.id.clone());
        edges.push(edge(tp.owner.clone(), tp.id.clone(), EdgeKind::HasTypeParameter));
    }
}

fn push_parameters(
    file: &Path,
    c: &Collections,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    for p in &c.parameters {
        nodes.push(gnode(
            p.id.clone(),
            p.name.clone(),
            file,
            p.pos,
            NodePayload::Parameter(ParameterAttrs {
                index: p.index,
                sub_index: p.sub_index,
                property_path: p.property_path.clone(),
                array_index: p.array_index,
                has_default: p.has_default,
                is_rest: p.is_rest,
            }),
        ));
        ids.insert(p.id.clone());
        edges.push(edge(p.function.clone(), p.id.clone(), EdgeKind::HasParameter));

        if let Some(lit) = &p.default_literal {
            // Also materialized by `push_literals` from the same
            // `classify_literal` call; `ids.insert` dedups whichever
            // push function runs second.
            if ids.insert(lit.id.clone()) {
                nodes.push(gnode(
                    lit.id.clone(),
                    lit.raw.clone(),
                    file,
                    lit.pos,
                    NodePayload::Literal(LiteralAttrs {
                        literal_kind: lit.literal_kind.clone(),
                        raw: lit.raw.clone(),
                    }),
                ));
            }
            edges.push(edge(lit.id.clone(), p.id.clone(), EdgeKind::FlowsInto));
        }
    }
}

fn push_branches(
    file: &Path,
    c: &Collections,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    for b in &c.branches {
        nodes.push(gnode(
            b.id.clone(),
            b.branch_kind.clone(),
            file,
            b.pos,
            NodePayload::Branch(BranchAttrs {
                branch_kind: b.branch_kind.clone(),
            }),
        ));
        ids.insert(b.id.clone());
        edges.push(edge(b.parent.clone(), b.id.clone(), EdgeKind::Contains));
    }
}

fn push_cases(
    file: &Path,
    c: &Collections,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    for case in &c.cases {
        nodes.push(gnode(
            case.id.clone(),
            if case.is_default { "default".to_string() } else { "case".to_string() },
            file,
            case.pos,
            NodePayload::Case(CaseAttrs {
                is_default: case.is_default,
                falls_through: case.falls_through,
            }),
        ));
        ids.insert(case.id.clone());
        let kind = if case.is_default {
            EdgeKind::HasDefault
        } else {
            EdgeKind::HasCase
        };
        edges.push(edge(case.switch_parent.clone(), case.id.clone(), kind));
    }
}

/// `LITERAL` nodes referenced from an argument, initializer, mutation
/// value, or default parameter value. Most are reached via `ValueRef`
/// from several owners, so this dedups against whichever push function
/// materialized the id first.
fn push_literals(file: &Path, c: &Collections, nodes: &mut Vec<GraphNode>, ids: &mut HashSet<NodeId>) {
    for l in &c.literals {
        if !ids.insert(l.id.clone()) {
            continue;
        }
        nodes.push(gnode(
            l.id.clone(),
            l.raw.clone(),
            file,
            l.pos,
            NodePayload::Literal(LiteralAttrs {
                literal_kind: l.literal_kind.clone(),
                raw: l.raw.clone(),
            }),
        ));
    }
}

/// `EXPRESSION` nodes for member/binary/logical/ternary/template values,
/// with `DERIVES_FROM` edges to the identifiers they read (spec §4.2
/// "Argument extraction"). Edges are emitted in a second pass so every
/// expression's own id is already in `ids` before any of them resolve a
/// read.
fn push_expressions(
    file: &Path,
    c: &Collections,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    for e in &c.expressions {
        if !ids.insert(e.id.clone()) {
            continue;
        }
        nodes.push(gnode(
            e.id.clone(),
            e.expression_kind.clone(),
            file,
            e.pos,
            NodePayload::Expression(ExpressionAttrs {
                expression_kind: e.expression_kind.clone(),
            }),
        ));
    }
    for e in &c.expressions {
        for name in &e.reads {
            if let Some(target) = resolve_identifier(ids, name) {
                edges.push(heuristic_edge(e.id.clone(), target, EdgeKind::DerivesFrom, 0.7));
            }
        }
    }
}

fn push_object_literals(file: &Path, c: &Collections, nodes: &mut Vec<GraphNode>, ids: &mut HashSet<NodeId>) {
    for o in &c.object_literals {
        if !ids.insert(o.id.clone()) {
            continue;
        }
        nodes.push(gnode(
            o.id.clone(),
            "object".to_string(),
            file,
            o.pos,
            NodePayload::ObjectLiteral(CompositeLiteralAttrs {
                element_count: o.properties.len() as u32,
            }),
        ));
    }
}

fn push_array_literals(file: &Path, c: &Collections, nodes: &mut Vec<GraphNode>, ids: &mut HashSet<NodeId>) {
    for a in &c.array_literals {
        if !ids.insert(a.id.clone()) {
            continue;
        }
        nodes.push(gnode(
            a.id.clone(),
            "array".to_string(),
            file,
            a.pos,
            NodePayload::ArrayLiteral(CompositeLiteralAttrs {
                element_count: a.elements.len() as u32,
            }),
        ));
    }
}

fn push_variables(
    file: &Path,
    c: &Collections,
    module_id: &NodeId,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    for v in &c.variables {
        let payload = if v.is_const {
            NodePayload::Constant(VariableAttrs {
                is_const: v.is_const,
                uninitialized: v.uninitialized,
            })
        } else {
            NodePayload::Variable(VariableAttrs {
                is_const: v.is_const,
                uninitialized: v.uninitialized,
            })
        };
        nodes.push(gnode(v.id.clone(), v.name.clone(), file, v.pos, payload));
        ids.insert(v.id.clone());

        let scope = if v.scope == NodeId::default() {
            module_id.clone()
        } else {
            v.scope.clone()
        };
        edges.push(edge(scope, v.id.clone(), EdgeKind::Contains));

        if let Some(value_ref) = &v.initializer {
            push_value_flow(v.id.clone(), value_ref, edges, EdgeKind::AssignedFrom);
        }
    }
}

fn push_calls(
    file: &Path,
    c: &Collections,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
    rename: &Rename,
) {
    for call in &c.calls {
        nodes.push(gnode(
            call.id.clone(),
            call.name.clone(),
            file,
            call.pos,
            NodePayload::Call(CallAttrs {
                has_object: call.has_object,
                class_name: call.class_name.clone(),
            }),
        ));
        ids.insert(call.id.clone());
        edges.push(edge(call.parent.clone(), call.id.clone(), EdgeKind::Contains));

        // Same-file resolution only: if a function with this name exists
        // in this file, link it now. Cross-file resolution is
        // `MethodCallResolver`'s job (spec §4.4).
        if let Some(target) = c.functions.iter().find(|f| f.name == call.name) {
            edges.push(edge(call.id.clone(), target.id.clone(), EdgeKind::Calls));
        }

        push_arguments(call.id.clone(), &call.arguments, ids, edges, rename);
    }
}

fn push_method_calls(
    file: &Path,
    c: &Collections,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
    rename: &Rename,
) {
    for call in &c.method_calls {
        nodes.push(gnode(
            call.id.clone(),
            call.name.clone(),
            file,
            call.pos,
            NodePayload::MethodCall(MethodCallAttrs {
                object_name: call.object_name.clone(),
                class_name: call.class_name.clone(),
            }),
        ));
        ids.insert(call.id.clone());
        edges.push(edge(call.parent.clone(), call.id.clone(), EdgeKind::Contains));

        // `this.method()` inside the same class resolves immediately.
        if call.object_name.as_deref() == Some("this") {
            if let Some(class_name) = &call.class_name {
                if let Some(owner) = c.classes.iter().find(|cl| &cl.name == class_name) {
                    if let Some(target) = c
                        .functions
                        .iter()
                        .find(|f| f.name == call.name && f.class_parent.as_ref() == Some(&owner.id))
                    {
                        edges.push(edge(call.id.clone(), target.id.clone(), EdgeKind::Calls));
                    }
                }
            }
        }

        push_arguments(call.id.clone(), &call.arguments, ids, edges, rename);
    }
}

fn push_constructor_calls(
    file: &Path,
    c: &Collections,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    for cc in &c.constructor_calls {
        nodes.push(gnode(
            cc.id.clone(),
            cc.class_name.clone(),
            file,
            cc.pos,
            NodePayload::ConstructorCall(ConstructorCallAttrs {
                class_name: cc.class_name.clone(),
            }),
        ));
        ids.insert(cc.id.clone());
        edges.push(edge(cc.parent.clone(), cc.id.clone(), EdgeKind::Contains));

        if let Some(target) = c.classes.iter().find(|cl| cl.name == cc.class_name) {
            edges.push(edge(cc.id.clone(), target.id.clone(), EdgeKind::InstanceOf));
        }
    }
}

fn push_arguments(
    call_id: NodeId,
    args: &[crate::collections::ArgumentInfo],
    ids: &HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
    rename: &Rename,
) {
    for arg in args {
        let target = value_ref_id(&arg.value, ids, rename);
        if let Some(target) = target {
            // `label` carries `argIndex` (and `*` for spreads) so
            // `grafema-enrich`'s `ArgumentParameterLinker` can match
            // against `PARAMETER.index` without re-deriving it from the
            // AST (spec §4.5).
            let mut e = edge(call_id.clone(), target, EdgeKind::PassesArgument);
            e.label = Some(if arg.is_spread {
                format!("{}*", arg.arg_index)
            } else {
                arg.arg_index.to_string()
            });
            edges.push(e);
        }
    }
}

fn value_ref_id(v: &ValueRef, ids: &HashSet<NodeId>, rename: &Rename) -> Option<NodeId> {
    match v {
        ValueRef::Literal(l) => Some(l.id.clone()),
        ValueRef::Function(id) => Some(id.clone()),
        ValueRef::Call(id) => Some(rename.resolve_forward_ref(id)),
        ValueRef::Object(id) => Some(id.clone()),
        ValueRef::Array(id) => Some(id.clone()),
        ValueRef::Expression(e) => Some(e.id.clone()),
        ValueRef::Spread(inner) => value_ref_id(inner, ids, rename),
        ValueRef::Identifier(name) => resolve_identifier(ids, name),
    }
}

/// Best-effort same-file resolution of a bare identifier name against
/// already-created `VARIABLE`/`CONSTANT`/`PARAMETER` ids, since nothing
/// here tracks a real symbol table. Ambiguous or cross-scope names are
/// left for `grafema-enrich`'s `AliasTracker` (spec §4.4).
fn resolve_identifier(ids: &HashSet<NodeId>, name: &str) -> Option<NodeId> {
    ["VARIABLE", "CONSTANT", "PARAMETER"].iter().find_map(|tag| {
        ids.iter()
            .find(|id| id.as_str().contains(&format!("{} → {}", tag, name)))
            .cloned()
    })
}

fn push_value_flow(target: NodeId, value: &ValueRef, edges: &mut Vec<GraphEdge>, kind: EdgeKind) {
    match value {
        ValueRef::Literal(l) => edges.push(edge(l.id.clone(), target, kind)),
        ValueRef::Function(id) => edges.push(edge(id.clone(), target, kind)),
        ValueRef::Object(id) => edges.push(edge(id.clone(), target, kind)),
        ValueRef::Array(id) => edges.push(edge(id.clone(), target, kind)),
        ValueRef::Expression(e) => edges.push(edge(e.id.clone(), target, kind)),
        ValueRef::Spread(inner) => push_value_flow(target, inner, edges, kind),
        // `Call`/`Identifier` targets are heuristic (same-file scope
        // lookup, not yet wired here) and left to enrichment.
        ValueRef::Call(_) | ValueRef::Identifier(_) => {}
    }
}

fn push_imports(
    file: &Path,
    c: &Collections,
    module_id: &NodeId,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    let registry = SingletonRegistry::new();
    for imp in &c.imports {
        nodes.push(gnode(
            imp.id.clone(),
            imp.local_name.clone(),
            file,
            imp.pos,
            NodePayload::Import(ImportAttrs {
                source: imp.source.clone(),
                imported_name: imp.imported_name.clone(),
                is_default: imp.is_default,
                is_namespace: imp.is_namespace,
            }),
        ));
        ids.insert(imp.id.clone());
        edges.push(edge(module_id.clone(), imp.id.clone(), EdgeKind::Imports));

        if !imp.source.starts_with('.') {
            let key = external_module_key(&imp.source);
            if let Some(node) = registry.get_or_create(&key, || {
                let ext_id = NodeId::from_raw(format!("EXTERNAL_MODULE#{}", imp.source));
                (
                    ext_id.clone(),
                    NodePayload::ExternalModule(ExternalModuleAttrs {
                        source: imp.source.clone(),
                    }),
                    imp.source.clone(),
                )
            }) {
                let ext_id = node.id.clone();
                nodes.push(node);
                ids.insert(ext_id.clone());
                edges.push(edge(imp.id.clone(), ext_id, EdgeKind::ImportsFrom));
            } else if let Some(ext_id) = registry.lookup(&key) {
                if ids.contains(&ext_id) {
                    edges.push(edge(imp.id.clone(), ext_id, EdgeKind::ImportsFrom));
                }
            }
        }
        // Relative-path `IMPORTS_FROM` resolution against another module
        // is a cross-file concern the coordinator's post-pass performs
        // once every file in the run has a MODULE node (spec §4.3 step 5).
    }
}

fn push_exports(
    c: &Collections,
    module_id: &NodeId,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    for exp in &c.exports {
        let file_opt = nodes.first().and_then(|m| m.file.clone());
        nodes.push(GraphNode {
            id: exp.id.clone(),
            name: exp.name.clone(),
            file: file_opt,
            line: Some(exp.pos.line),
            column: exp.pos.column,
            payload: NodePayload::Export(ExportAttrs {
                is_default: exp.is_default,
                reexport_source: exp.reexport_source.clone(),
            }),
        });
        ids.insert(exp.id.clone());
        edges.push(edge(module_id.clone(), exp.id.clone(), EdgeKind::Contains));

        if let Some(target) = c
            .functions
            .iter()
            .find(|f| f.name == exp.name)
            .map(|f| f.id.clone())
            .or_else(|| c.classes.iter().find(|cl| cl.name == exp.name).map(|cl| cl.id.clone()))
            .or_else(|| c.variables.iter().find(|v| v.name == exp.name).map(|v| v.id.clone()))
        {
            edges.push(edge(exp.id.clone(), target, EdgeKind::Declares));
        }
    }
}

fn push_decorators(
    file: &Path,
    c: &Collections,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    for d in &c.decorators {
        nodes.push(gnode(
            d.id.clone(),
            d.name.clone(),
            file,
            d.pos,
            NodePayload::Decorator(DecoratorAttrs {
                target_id: Some(d.target.clone()),
            }),
        ));
        ids.insert(d.id.clone());
        edges.push(edge(d.target.clone(), d.id.clone(), EdgeKind::DecoratedBy));
    }
}

fn push_framework(
    file: &Path,
    c: &Collections,
    module_id: &NodeId,
    nodes: &mut Vec<GraphNode>,
    ids: &mut HashSet<NodeId>,
    edges: &mut Vec<GraphEdge>,
) {
    use grafema_core::model::FrameworkAttrs;

    for fw in &c.framework {
        let payload = match fw.family.as_str() {
            "http" => NodePayload::HttpRequest(FrameworkAttrs {
                sub_kind: fw.sub_kind.clone(),
                attrs: fw.attrs.clone(),
            }),
            "database" => NodePayload::DatabaseQuery(FrameworkAttrs {
                sub_kind: fw.sub_kind.clone(),
                attrs: fw.attrs.clone(),
            }),
            "socketio" => NodePayload::SocketIo(FrameworkAttrs {
                sub_kind: fw.sub_kind.clone(),
                attrs: fw.attrs.clone(),
            }),
            "react" => NodePayload::React(FrameworkAttrs {
                sub_kind: fw.sub_kind.clone(),
                attrs: fw.attrs.clone(),
            }),
            "browser" => NodePayload::Browser(FrameworkAttrs {
                sub_kind: fw.sub_kind.clone(),
                attrs: fw.attrs.clone(),
            }),
            _ => NodePayload::EventListener(FrameworkAttrs {
                sub_kind: fw.sub_kind.clone(),
                attrs: fw.attrs.clone(),
            }),
        };
        let name = fw
            .attrs
            .get("event")
            .or_else(|| fw.attrs.get("url"))
            .or_else(|| fw.attrs.get("path"))
            .cloned()
            .unwrap_or_else(|| fw.sub_kind.clone());
        nodes.push(gnode(fw.id.clone(), name, file, fw.pos, payload));
        ids.insert(fw.id.clone());

        let parent = fw.parent.clone().unwrap_or_else(|| module_id.clone());
        let kind = match fw.family.as_str() {
            "http" => EdgeKind::MakesRequest,
            "database" => EdgeKind::MakesQuery,
            "socketio" if fw.sub_kind == "emit" => EdgeKind::EmitsEvent,
            "socketio" => EdgeKind::ListensTo,
            _ => EdgeKind::Contains,
        };
        edges.push(edge(parent, fw.id.clone(), kind));
    }
}

fn push_mutations(c: &Collections, ids: &HashSet<NodeId>, edges: &mut Vec<GraphEdge>, rename: &Rename) {
    for m in &c.array_mutations {
        if let Some(target) = resolve_identifier(ids, &m.base_object_name) {
            for v in &m.inserted_values {
                if let Some(src) = value_ref_id(&v.value, ids, rename) {
                    let mut e = heuristic_edge(src, target.clone(), EdgeKind::FlowsInto, 0.6);
                    e.label = Some(if v.is_spread {
                        "isSpread=true".to_string()
                    } else {
                        format!("mutationMethod={};argIndex={}", m.mutation_method, v.arg_index)
                    });
                    edges.push(e);
                }
            }
        }
    }
    for m in &c.object_mutations {
        if let Some(this_target) = &m.this_target {
            if ids.contains(this_target) {
                if let Some(src) = value_ref_id(&m.value, ids, rename) {
                    let mut e = heuristic_edge(src, this_target.clone(), EdgeKind::FlowsInto, 0.8);
                    e.label = Some(match &m.property_name {
                        Some(prop) => format!("mutationType={};propertyName={}", m.mutation_type, prop),
                        None => format!("mutationType={}", m.mutation_type),
                    });
                    edges.push(e);
                }
            }
        }
    }
}

fn push_reassignments(c: &Collections, ids: &HashSet<NodeId>, edges: &mut Vec<GraphEdge>, rename: &Rename) {
    for r in &c.reassignments {
        // Best-effort same-file-scope lookup by name is the builder's
        // job only as far as a single obvious candidate goes; ambiguous
        // or cross-scope cases are left for `AliasTracker` (spec §4.4).
        if let Some(target) = resolve_identifier(ids, &r.target_name) {
            if let Some(src) = value_ref_id(&r.value, ids, rename) {
                edges.push(heuristic_edge(src, target.clone(), EdgeKind::FlowsInto, 0.75));
            }
            if r.is_compound {
                edges.push(heuristic_edge(target.clone(), target.clone(), EdgeKind::ReadsFrom, 0.75));
            }
        }
    }
}

fn push_yields(c: &Collections, ids: &HashSet<NodeId>, edges: &mut Vec<GraphEdge>) {
    for y in &c.yields {
        if !ids.contains(&y.function) {
            continue;
        }
        let kind = if y.is_delegate { EdgeKind::DelegatesTo } else { EdgeKind::Yields };
        if let Some(ValueRef::Call(target)) = &y.value {
            if ids.contains(target) {
                edges.push(edge(y.function.clone(), target.clone(), kind));
            }
        }
    }
}

fn push_promise_resolutions(c: &Collections, ids: &HashSet<NodeId>, edges: &mut Vec<GraphEdge>) {
    for r in &c.promise_resolutions {
        if !ids.contains(&r.constructor_call) {
            continue;
        }
        let kind = if r.is_rejection { EdgeKind::Rejects } else { EdgeKind::ResolvesTo };
        if let Some(target) = value_ref_id_plain(&r.value) {
            if ids.contains(&target) {
                edges.push(edge(r.constructor_call.clone(), target, kind));
            }
        }
    }
}

fn value_ref_id_plain(v: &Option<ValueRef>) -> Option<NodeId> {
    match v {
        Some(ValueRef::Literal(l)) => Some(l.id.clone()),
        Some(ValueRef::Function(id)) => Some(id.clone()),
        Some(ValueRef::Object(id)) => Some(id.clone()),
        Some(ValueRef::Array(id)) => Some(id.clone()),
        Some(ValueRef::Expression(e)) => Some(e.id.clone()),
        _ => None,
    }
}

/// Build the `MODULE` node for a file, before visiting its body.
pub fn module_node(file: &Path, language: Language, id: NodeId) -> GraphNode {
    GraphNode {
        id,
        name: file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        file: Some(file.to_path_buf()),
        line: None,
        column: None,
        payload: NodePayload::Module(ModuleAttrs {
            language: Some(language),
            package: None,
        }),
    }
}
