//! Browser globals overlay: `document.querySelector*`, `window.*`,
//! `localStorage`/`sessionStorage` access (spec §4.2 "Framework
//! overlays").

use std::collections::HashMap;

use tree_sitter::Node;

use crate::visit::framework::{first_string_arg, member_call, push};
use crate::visit::VisitCtx;

const DOM_RECEIVERS: &[&str] = &["document", "window"];
const STORAGE_RECEIVERS: &[&str] = &["localStorage", "sessionStorage"];

pub fn visit(ctx: &mut VisitCtx, node: Node) -> bool {
    let Some((object, method)) = member_call(ctx, node) else {
        return false;
    };

    if DOM_RECEIVERS.contains(&object.as_str()) {
        let selector = first_string_arg(ctx, node);
        let mut attrs = HashMap::new();
        attrs.insert("receiver".to_string(), object);
        attrs.insert("method".to_string(), method.clone());
        if let Some(selector) = selector {
            attrs.insert("selector".to_string(), selector);
        }
        push(ctx, node, "browser", "dom", &method, attrs);
        return true;
    }

    if STORAGE_RECEIVERS.contains(&object.as_str()) && matches!(method.as_str(), "getItem" | "setItem" | "removeItem") {
        let key = first_string_arg(ctx, node).unwrap_or_else(|| "<dynamic>".to_string());
        let mut attrs = HashMap::new();
        attrs.insert("storage".to_string(), object);
        attrs.insert("operation".to_string(), method.clone());
        attrs.insert("key".to_string(), key.clone());
        push(ctx, node, "browser", "storage", &key, attrs);
        return true;
    }

    false
}
