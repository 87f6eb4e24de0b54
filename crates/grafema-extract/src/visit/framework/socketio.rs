//! Socket.IO overlay: `io.on(event, cb)` / `socket.on(event, cb)` /
//! `.emit(event, ...)` (spec §4.2 "Framework overlays").

use std::collections::HashMap;

use tree_sitter::Node;

use crate::visit::framework::{first_string_arg, member_call, push};
use crate::visit::VisitCtx;

const RECEIVERS: &[&str] = &["io", "socket"];

pub fn visit(ctx: &mut VisitCtx, node: Node) -> bool {
    let Some((object, method)) = member_call(ctx, node) else {
        return false;
    };
    if !RECEIVERS.contains(&object.as_str()) {
        return false;
    }
    let Some(event) = first_string_arg(ctx, node) else {
        return false;
    };

    let sub_kind = match method.as_str() {
        "on" => "listener",
        "emit" => "emit",
        _ => return false,
    };

    let mut attrs = HashMap::new();
    attrs.insert("event".to_string(), event.clone());
    attrs.insert("receiver".to_string(), object);
    push(ctx, node, "socketio", sub_kind, &event, attrs);
    true
}
