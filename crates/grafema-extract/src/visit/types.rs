//! TypeScript-shape declarations: interfaces (with `extends`), type
//! aliases (mapped & conditional metadata), enums, and type parameters
//! with constraints (spec §4.2 "Types").

use tree_sitter::Node;

use grafema_core::NodeKind;

use crate::collections::{EnumInfo, InterfaceInfo, TypeAliasInfo, TypeParameterInfo};
use crate::visit::{recurse, VisitCtx};

pub fn visit(ctx: &mut VisitCtx, node: Node) -> bool {
    match node.kind() {
        "interface_declaration" => {
            visit_interface(ctx, node);
            true
        }
        "type_alias_declaration" => {
            visit_type_alias(ctx, node);
            true
        }
        "enum_declaration" => {
            visit_enum(ctx, node);
            true
        }
        _ => false,
    }
}

fn visit_interface(ctx: &mut VisitCtx, node: Node) {
    let name = node
        .child_by_field_name("name")
        .map(|n| ctx.text(n))
        .unwrap_or_default();

    let mut extends = Vec::new();
    if let Some(heritage) = node.child_by_field_name("extends_clause") {
        let mut cursor = heritage.walk();
        for child in heritage.named_children(&mut cursor) {
            extends.push(ctx.text(child));
        }
    }

    let property_count = node
        .child_by_field_name("body")
        .map(|body| {
            let mut cursor = body.walk();
            body.named_children(&mut cursor)
                .filter(|c| {
                    matches!(
                        c.kind(),
                        "property_signature" | "method_signature" | "index_signature"
                    )
                })
                .count() as u32
        })
        .unwrap_or(0);

    let scope = ctx.scopes.get_context();
    let id = ctx
        .ids
        .semantic_id(&scope, NodeKind::Interface, "INTERFACE", &name, None, None);
    let pos = ctx.pos(node);
    let parent = ctx.current_scope();

    ctx.collections.interfaces.push(InterfaceInfo {
        id: id.clone(),
        parent,
        name: name.clone(),
        extends,
        property_count,
        pos,
    });

    extract_type_parameters(ctx, node, id);

    if let Some(body) = node.child_by_field_name("body") {
        recurse(ctx, body);
    }
}

fn visit_type_alias(ctx: &mut VisitCtx, node: Node) {
    let name = node
        .child_by_field_name("name")
        .map(|n| ctx.text(n))
        .unwrap_or_default();
    let value = node.child_by_field_name("value");

    let is_mapped = value.is_some_and(|v| v.kind() == "mapped_type_clause");
    let is_conditional = value.is_some_and(|v| v.kind() == "conditional_type");
    let aliased_type = value.map(|v| ctx.text(v));

    let scope = ctx.scopes.get_context();
    let id = ctx
        .ids
        .semantic_id(&scope, NodeKind::Type, "TYPE", &name, None, None);
    let pos = ctx.pos(node);
    let parent = ctx.current_scope();

    ctx.collections.type_aliases.push(TypeAliasInfo {
        id: id.clone(),
        parent,
        name,
        is_mapped,
        is_conditional,
        aliased_type,
        pos,
    });

    extract_type_parameters(ctx, node, id);
}

fn visit_enum(ctx: &mut VisitCtx, node: Node) {
    let name = node
        .child_by_field_name("name")
        .map(|n| ctx.text(n))
        .unwrap_or_default();
    let is_const = {
        let mut cursor = node.walk();
        node.children(&mut cursor).any(|c| c.kind() == "const")
    };

    let mut members = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            if child.kind() == "property_identifier" || child.kind() == "enum_assignment" {
                let member_name = child
                    .child_by_field_name("name")
                    .unwrap_or(child);
                members.push(ctx.text(member_name));
            }
        }
    }

    let scope = ctx.scopes.get_context();
    let id = ctx
        .ids
        .semantic_id(&scope, NodeKind::Enum, "ENUM", &name, None, None);
    let pos = ctx.pos(node);
    let parent = ctx.current_scope();

    ctx.collections.enums.push(EnumInfo {
        id,
        parent,
        name,
        is_const,
        members,
        pos,
    });
}

/// Type parameters with constraints produce `EXTENDS` edges against
/// same-file interfaces or external reference nodes (spec §4.2).
fn extract_type_parameters(ctx: &mut VisitCtx, decl: Node, owner: grafema_core::NodeId) {
    let Some(tp_list) = decl.child_by_field_name("type_parameters") else {
        return;
    };
    let mut cursor = tp_list.walk();
    for child in tp_list.named_children(&mut cursor) {
        if child.kind() != "type_parameter" {
            continue;
        }
        let name = child
            .child_by_field_name("name")
            .map(|n| ctx.text(n))
            .unwrap_or_default();
        let constraint = child
            .child_by_field_name("constraint")
            .map(|n| ctx.text(n));

        let scope = ctx.scopes.get_context();
        let id = ctx.ids.semantic_id(
            &scope,
            NodeKind::TypeParameter,
            "TYPE_PARAMETER",
            &name,
            None,
            None,
        );
        let pos = ctx.pos(child);
        ctx.collections.type_parameters.push(TypeParameterInfo {
            id,
            owner: owner.clone(),
            name,
            constraint,
            pos,
        });
    }
}
