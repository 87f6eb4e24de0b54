//! Decorators (with target id + kind), spec §4.2 "Types".

use tree_sitter::Node;

use grafema_core::NodeKind;

use crate::collections::DecoratorInfo;
use crate::visit::VisitCtx;

pub fn visit(ctx: &mut VisitCtx, node: Node) -> bool {
    if node.kind() != "decorator" {
        return false;
    }

    // A decorator's target is whichever declaration follows it as a
    // sibling (class, method, property, or parameter).
    let Some(target_node) = node.next_named_sibling() else {
        return true;
    };

    let name = node
        .named_child(0)
        .map(|n| decorator_call_name(ctx, n))
        .unwrap_or_default();

    let scope = ctx.scopes.get_context();
    let id = ctx
        .ids
        .semantic_id(&scope, NodeKind::Decorator, "DECORATOR", &name, None, None);
    let pos = ctx.pos(node);

    // Target id follows whatever the enclosing visitor will compute for
    // the same declaration: approximate by recomputing its semantic id
    // the same way `classes`/`functions` would, using the target's own
    // declared name when available.
    let target_name = target_node
        .child_by_field_name("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| name.clone());
    let target_kind_tag = match target_node.kind() {
        "class_declaration" => "CLASS",
        "method_definition" => "FUNCTION",
        _ => "DECLARATION",
    };
    let target = ctx.ids.semantic_id(
        &scope,
        NodeKind::Module, // kind unused for display purposes here
        target_kind_tag,
        &target_name,
        None,
        None,
    );

    ctx.collections.decorators.push(DecoratorInfo {
        id,
        target,
        name,
        pos,
    });

    false // let the dispatcher still descend into the decorator's arguments
}

fn decorator_call_name(ctx: &VisitCtx, node: Node) -> String {
    match node.kind() {
        "call_expression" => node
            .child_by_field_name("function")
            .map(|f| ctx.text(f))
            .unwrap_or_default(),
        "identifier" | "member_expression" => ctx.text(node),
        _ => ctx.text(node),
    }
}
