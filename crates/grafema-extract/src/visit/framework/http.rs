//! HTTP overlay: Express route registration (`app.get/post/...(route,
//! handler)`), `fetch(url, opts)`, and axios calls (spec §4.2 "Framework
//! overlays").

use std::collections::HashMap;

use tree_sitter::Node;

use crate::visit::framework::{first_string_arg, member_call, push};
use crate::visit::VisitCtx;

const HTTP_METHODS: &[&str] = &["get", "post", "put", "patch", "delete", "use"];
const APP_RECEIVERS: &[&str] = &["app", "router"];

pub fn visit(ctx: &mut VisitCtx, node: Node) -> bool {
    if let Some(route) = express_route(ctx, node) {
        let (method, path) = route;
        let mut attrs = HashMap::new();
        attrs.insert("method".to_string(), method.clone());
        attrs.insert("path".to_string(), path.clone());
        push(ctx, node, "http", "route", &format!("{method} {path}"), attrs);
        return true;
    }

    let callee = node.child_by_field_name("function");
    if let Some(callee) = callee {
        if callee.kind() == "identifier" && ctx.text(callee) == "fetch" {
            let url = first_string_arg(ctx, node).unwrap_or_else(|| "<dynamic>".to_string());
            let mut attrs = HashMap::new();
            attrs.insert("url".to_string(), url.clone());
            push(ctx, node, "http", "fetch", &url, attrs);
            return true;
        }
    }

    if let Some((object, method)) = member_call(ctx, node) {
        if object == "axios" && HTTP_METHODS.contains(&method.as_str()) {
            let url = first_string_arg(ctx, node).unwrap_or_else(|| "<dynamic>".to_string());
            let mut attrs = HashMap::new();
            attrs.insert("method".to_string(), method.clone());
            attrs.insert("url".to_string(), url.clone());
            push(ctx, node, "http", "axios", &url, attrs);
            return true;
        }
    }

    false
}

fn express_route(ctx: &VisitCtx, node: Node) -> Option<(String, String)> {
    let (object, method) = member_call(ctx, node)?;
    if !APP_RECEIVERS.contains(&object.as_str()) || !HTTP_METHODS.contains(&method.as_str()) {
        return None;
    }
    let path = first_string_arg(ctx, node)?;
    Some((method, path))
}
