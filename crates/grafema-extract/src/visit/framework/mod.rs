//! Framework/domain overlays (spec §4.2 "Framework overlays"): Socket.IO,
//! HTTP (Express routes / fetch / axios), database queries, React hooks,
//! and browser globals. These never claim a node for the dispatcher (the
//! underlying `call_expression`/`member_expression` is still a regular
//! `CALL`/`MethodCall` too) — they only add an analysis-tier
//! [`crate::collections::FrameworkInfo`] record alongside it.

pub mod browser;
pub mod database;
pub mod http;
pub mod react;
pub mod socketio;

use tree_sitter::Node;

use crate::visit::VisitCtx;

pub fn visit(ctx: &mut VisitCtx, node: Node) {
    if node.kind() != "call_expression" {
        return;
    }
    let _ = socketio::visit(ctx, node)
        || http::visit(ctx, node)
        || database::visit(ctx, node)
        || react::visit(ctx, node)
        || browser::visit(ctx, node);
}

/// `obj.method(...)` split, used by every overlay matcher.
pub(crate) fn member_call(ctx: &VisitCtx, node: Node) -> Option<(String, String)> {
    let callee = node.child_by_field_name("function")?;
    if callee.kind() != "member_expression" {
        return None;
    }
    let object = callee.child_by_field_name("object")?;
    let property = callee.child_by_field_name("property")?;
    Some((ctx.text(object), ctx.text(property)))
}

pub(crate) fn first_string_arg(ctx: &VisitCtx, node: Node) -> Option<String> {
    let args = node.child_by_field_name("arguments")?;
    let first = args.named_child(0)?;
    if first.kind() == "string" || first.kind() == "template_string" {
        Some(ctx.text(first).trim_matches(['"', '\'', '`']).to_string())
    } else {
        None
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn push(
    ctx: &mut VisitCtx,
    node: Node,
    family: &str,
    sub_kind: &str,
    name: &str,
    attrs: std::collections::HashMap<String, String>,
) {
    use grafema_core::NodeKind;

    let kind = match family {
        "socketio" => NodeKind::SocketIo,
        "react" => NodeKind::React,
        "browser" => NodeKind::Browser,
        "http" => NodeKind::HttpRequest,
        "database" => NodeKind::DatabaseQuery,
        _ => NodeKind::EventListener,
    };
    let scope = ctx.scopes.get_context();
    let disc = ctx.scopes.get_item_counter(&format!("{family}:{sub_kind}"));
    let id = ctx.ids.semantic_id(
        &scope,
        kind,
        family.to_ascii_uppercase().as_str(),
        name,
        Some(disc.to_string()),
        None,
    );
    let pos = ctx.pos(node);
    let parent = ctx.current_scope();

    ctx.collections
        .framework
        .push(crate::collections::FrameworkInfo {
            id,
            parent,
            family: family.to_string(),
            sub_kind: sub_kind.to_string(),
            attrs,
            pos,
        });
}
