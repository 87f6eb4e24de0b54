//! Function/arrow/method declarations (spec §4.2).

use tree_sitter::Node;

use grafema_core::NodeKind;

use crate::collections::{FunctionInfo, ScopeInfo};
use crate::visit::{parameters, recurse, VisitCtx};

const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "function_expression",
    "generator_function_declaration",
    "generator_function",
    "arrow_function",
    "method_definition",
];

pub fn visit(ctx: &mut VisitCtx, node: Node) -> bool {
    if !FUNCTION_KINDS.contains(&node.kind()) {
        return false;
    }

    let is_arrow = node.kind() == "arrow_function";
    let is_generator = node.kind().contains("generator") || has_child_token(node, "*");
    let is_async = has_child_token(node, "async");
    let is_method = node.kind() == "method_definition";

    let name = node
        .child_by_field_name("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| anonymous_name(node));

    let scope = ctx.scopes.get_context();
    let id = ctx
        .ids
        .semantic_id(&scope, NodeKind::Function, "FUNCTION", &name, None, None);
    let pos = ctx.pos(node);

    let is_constructor = is_method && name == "constructor";
    let class_parent = ctx.current_class();
    let parent = ctx.current_scope();

    ctx.collections.functions.push(FunctionInfo {
        id: id.clone(),
        parent,
        name: name.clone(),
        is_async,
        is_generator,
        is_arrow,
        is_method,
        class_parent: if is_method { class_parent } else { None },
        rejection_patterns: Vec::new(),
        pos,
    });

    if is_constructor {
        if let Some(last) = ctx.collections.classes.last_mut() {
            last.constructor_fn = Some(id.clone());
        }
    }

    let scope_id = ctx.ids.semantic_id(&scope, NodeKind::Scope, "SCOPE", &name, None, None);
    ctx.collections.scopes.push(ScopeInfo {
        id: scope_id,
        parent: Some(id.clone()),
        scope_kind: "function".to_string(),
        pos,
    });

    ctx.scopes.push_scope(name.clone(), true);
    ctx.enclosing_function.push(id.clone());
    ctx.enclosing_scope.push(id.clone());
    ctx.in_constructor.push(is_constructor);

    if let Some(params) = node.child_by_field_name("parameters") {
        parameters::extract_parameters(ctx, params, id.clone());
    } else if let Some(single) = node.child_by_field_name("parameter") {
        // Arrow function with a single, unparenthesized identifier param.
        parameters_single(ctx, single, id.clone());
    }

    // `arrow_function`'s `body` field covers both a `statement_block` and
    // a bare expression body (`x => x + 1`), so this single branch covers
    // plain functions, methods, and arrows alike.
    if let Some(body) = node.child_by_field_name("body") {
        recurse(ctx, body);
    }

    ctx.in_constructor.pop();
    ctx.enclosing_scope.pop();
    ctx.enclosing_function.pop();
    ctx.scopes.pop_scope();

    true
}

fn parameters_single(ctx: &mut VisitCtx, node: Node, function: grafema_core::NodeId) {
    let params_like = node;
    let mut out = Vec::new();
    let name = ctx.text(params_like);
    let scope = ctx.scopes.get_context();
    let pid = ctx.ids.semantic_id(
        &scope,
        NodeKind::Parameter,
        "PARAMETER",
        &name,
        Some("0".to_string()),
        None,
    );
    ctx.collections.parameters.push(crate::collections::ParameterInfo {
        id: pid.clone(),
        function,
        name,
        index: 0,
        sub_index: 0,
        property_path: Vec::new(),
        array_index: None,
        has_default: false,
        is_rest: false,
        default_literal: None,
        pos: ctx.pos(node),
    });
    out.push(pid);
}

fn has_child_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == token)
}

fn anonymous_name(node: Node) -> String {
    format!("<anonymous@{}>", node.start_position().row + 1)
}
