//! Class declarations, `extends`/`implements` (spec §4.2 "Types").

use tree_sitter::Node;

use grafema_core::NodeKind;

use crate::collections::{ClassInfo, ScopeInfo};
use crate::visit::{recurse, VisitCtx};

pub fn visit(ctx: &mut VisitCtx, node: Node) -> bool {
    if node.kind() != "class_declaration" && node.kind() != "class" {
        return false;
    }

    let name = node
        .child_by_field_name("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| format!("<anonymous-class@{}>", node.start_position().row + 1));

    let mut superclass_name = None;
    let mut implements = Vec::new();
    if let Some(heritage) = node.child_by_field_name("heritage") {
        walk_heritage(ctx, heritage, &mut superclass_name, &mut implements);
    } else {
        // tree-sitter-javascript puts `extends X` directly as a
        // `class_heritage` child without a named field in some grammar
        // versions; scan all children defensively.
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == "class_heritage" {
                walk_heritage(ctx, child, &mut superclass_name, &mut implements);
            }
        }
    }

    let scope = ctx.scopes.get_context();
    let id = ctx
        .ids
        .semantic_id(&scope, NodeKind::Class, "CLASS", &name, None, None);
    let pos = ctx.pos(node);
    let parent = ctx.current_scope();

    ctx.collections.classes.push(ClassInfo {
        id: id.clone(),
        parent,
        name: name.clone(),
        is_abstract: has_abstract_modifier(node),
        superclass_name,
        implements,
        constructor_fn: None,
        pos,
    });

    let scope_id = ctx.ids.semantic_id(&scope, NodeKind::Scope, "SCOPE", &name, None, None);
    ctx.collections.scopes.push(ScopeInfo {
        id: scope_id,
        parent: Some(id.clone()),
        scope_kind: "class".to_string(),
        pos,
    });

    ctx.scopes.push_scope(name.clone(), true);
    ctx.enclosing_class.push(id.clone());
    ctx.enclosing_class_name.push(name.clone());
    ctx.enclosing_scope.push(id.clone());

    if let Some(body) = node.child_by_field_name("body") {
        recurse(ctx, body);
    }

    ctx.enclosing_scope.pop();
    ctx.enclosing_class_name.pop();
    ctx.enclosing_class.pop();
    ctx.scopes.pop_scope();

    true
}

fn walk_heritage(
    ctx: &VisitCtx,
    heritage: Node,
    superclass_name: &mut Option<String>,
    implements: &mut Vec<String>,
) {
    let mut cursor = heritage.walk();
    let mut saw_implements_kw = false;
    for child in heritage.children(&mut cursor) {
        match child.kind() {
            "implements" => saw_implements_kw = true,
            "extends" => saw_implements_kw = false,
            "identifier" | "member_expression" | "type_identifier" | "generic_type" => {
                let name = ctx.text(child);
                if saw_implements_kw {
                    implements.push(name);
                } else if superclass_name.is_none() {
                    *superclass_name = Some(name);
                } else {
                    implements.push(name);
                }
            }
            _ => {}
        }
    }
}

fn has_abstract_modifier(node: Node) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == "abstract")
}
