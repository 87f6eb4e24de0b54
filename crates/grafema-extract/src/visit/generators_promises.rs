//! `yield`/`yield*` and `resolve`/`reject` inside `new Promise(executor)`
//! (spec §4.2 "Generators/Promises").

use tree_sitter::Node;

use crate::collections::{PromiseResolutionInfo, YieldInfo};
use crate::visit::calls::classify_value;
use crate::visit::VisitCtx;

const RESOLUTION_CALLBACK_NAMES: &[&str] = &["resolve", "reject"];

pub fn visit(ctx: &mut VisitCtx, node: Node) -> bool {
    match node.kind() {
        "yield_expression" => {
            visit_yield(ctx, node);
            true
        }
        "call_expression" if ctx.is_in_promise_executor() => visit_resolution_call(ctx, node),
        _ => false,
    }
}

fn visit_yield(ctx: &mut VisitCtx, node: Node) {
    let is_delegate = {
        let mut cursor = node.walk();
        node.children(&mut cursor).any(|c| c.kind() == "*")
    };
    let value = node
        .named_child(0)
        .map(|n| classify_value(ctx, n));
    let pos = ctx.pos(node);
    let function = ctx.current_function().unwrap_or_default();

    ctx.collections.yields.push(YieldInfo {
        function,
        is_delegate,
        value,
        pos,
    });

    if let Some(v) = node.named_child(0) {
        crate::visit::recurse(ctx, v);
    }
}

/// Matches a bare `resolve(...)`/`reject(...)` call (the executor's own
/// parameters, by convention named `resolve`/`reject`) while inside a
/// `new Promise(executor)` body.
fn visit_resolution_call(ctx: &mut VisitCtx, node: Node) -> bool {
    let Some(callee) = node.child_by_field_name("function") else {
        return false;
    };
    if callee.kind() != "identifier" {
        return false;
    }
    let name = ctx.text(callee);
    if !RESOLUTION_CALLBACK_NAMES.contains(&name.as_str()) {
        return false;
    }

    let is_rejection = name == "reject";
    let constructor_call = ctx.current_promise().unwrap_or_default();
    let enclosing_function = ctx.current_function();
    let value = node
        .child_by_field_name("arguments")
        .and_then(|a| a.named_child(0))
        .map(|n| classify_value(ctx, n));
    let pos = ctx.pos(node);

    if is_rejection {
        // The enclosing function's `rejectionPatterns` accumulate the
        // rejected value's textual shape so `RejectionPropagationEnricher`
        // can later match `.catch`/`try`/`await` call sites.
        let pattern = node
            .child_by_field_name("arguments")
            .and_then(|a| a.named_child(0))
            .map(|arg| ctx.text(arg));
        if let (Some(fid), Some(pattern)) = (&enclosing_function, pattern) {
            if let Some(f) = ctx.collections.functions.iter_mut().find(|f| &f.id == fid) {
                f.rejection_patterns.push(pattern);
            }
        }
    }

    ctx.collections
        .promise_resolutions
        .push(PromiseResolutionInfo {
            constructor_call,
            is_rejection,
            enclosing_function,
            value,
            pos,
        });

    false
}
