//! React overlay: hook calls (`useState`, `useEffect`, `useMemo`,
//! `useCallback`, `useContext`, `useRef`, `useReducer`) (spec §4.2
//! "Framework overlays").

use std::collections::HashMap;

use tree_sitter::Node;

use crate::visit::framework::push;
use crate::visit::VisitCtx;

const HOOKS: &[&str] = &[
    "useState",
    "useEffect",
    "useMemo",
    "useCallback",
    "useContext",
    "useRef",
    "useReducer",
    "useLayoutEffect",
];

pub fn visit(ctx: &mut VisitCtx, node: Node) -> bool {
    let Some(callee) = node.child_by_field_name("function") else {
        return false;
    };
    if callee.kind() != "identifier" {
        return false;
    }
    let name = ctx.text(callee);
    if !HOOKS.contains(&name.as_str()) {
        return false;
    }

    let mut attrs = HashMap::new();
    attrs.insert("hook".to_string(), name.clone());
    push(ctx, node, "react", "hook", &name, attrs);
    true
}
