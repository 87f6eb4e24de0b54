//! `if`/`else`, `switch`/`case`/`default`, ternary, `try`/`catch`/
//! `finally` (spec §4.2 "Control flow"). Case termination is detected so
//! `CaseInfo::falls_through` can be set.

use tree_sitter::Node;

use grafema_core::NodeKind;

use crate::collections::{BranchInfo, CaseInfo};
use crate::visit::{recurse, VisitCtx};

pub fn visit(ctx: &mut VisitCtx, node: Node) -> bool {
    match node.kind() {
        "if_statement" => visit_if(ctx, node),
        "ternary_expression" => visit_ternary(ctx, node),
        "switch_statement" => visit_switch(ctx, node),
        "try_statement" => visit_try(ctx, node),
        _ => return false,
    }
    true
}

fn push_branch(ctx: &mut VisitCtx, node: Node, branch_kind: &str) -> grafema_core::NodeId {
    let scope = ctx.scopes.get_context();
    let disc = ctx.scopes.get_item_counter(branch_kind);
    let id = ctx.ids.semantic_id(
        &scope,
        NodeKind::Branch,
        "BRANCH",
        branch_kind,
        Some(disc.to_string()),
        None,
    );
    let pos = ctx.pos(node);
    let has_consequent = node.child_by_field_name("consequence").is_some();
    let has_alternate = node.child_by_field_name("alternative").is_some();
    ctx.collections.branches.push(BranchInfo {
        id: id.clone(),
        parent: ctx.current_scope().unwrap_or_else(|| id.clone()),
        branch_kind: branch_kind.to_string(),
        has_consequent,
        has_alternate,
        pos,
    });
    id
}

fn visit_if(ctx: &mut VisitCtx, node: Node) {
    push_branch(ctx, node, "if");
    if let Some(cond) = node.child_by_field_name("condition") {
        recurse(ctx, cond);
    }
    if let Some(cons) = node.child_by_field_name("consequence") {
        recurse(ctx, cons);
    }
    if let Some(alt) = node.child_by_field_name("alternative") {
        recurse(ctx, alt);
    }
}

fn visit_ternary(ctx: &mut VisitCtx, node: Node) {
    push_branch(ctx, node, "ternary");
    recurse(ctx, node);
}

fn visit_switch(ctx: &mut VisitCtx, node: Node) {
    let scope = ctx.scopes.get_context();
    let switch_id = ctx
        .ids
        .semantic_id(&scope, NodeKind::Scope, "SCOPE", "switch", None, None);

    if let Some(value) = node.child_by_field_name("value") {
        recurse(ctx, value);
    }

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.named_children(&mut cursor) {
            if child.kind() == "switch_case" || child.kind() == "switch_default" {
                visit_case(ctx, child, switch_id.clone());
            }
        }
    }
}

fn visit_case(ctx: &mut VisitCtx, node: Node, switch_parent: grafema_core::NodeId) {
    let is_default = node.kind() == "switch_default";
    let falls_through = !terminates(node);

    let scope = ctx.scopes.get_context();
    let disc = ctx.scopes.get_item_counter("case");
    let id = ctx.ids.semantic_id(
        &scope,
        NodeKind::Case,
        "CASE",
        if is_default { "default" } else { "case" },
        Some(disc.to_string()),
        None,
    );
    let pos = ctx.pos(node);

    ctx.collections.cases.push(CaseInfo {
        id,
        switch_parent,
        is_default,
        falls_through,
        pos,
    });

    recurse(ctx, node);
}

/// A case body "terminates" if its last statement is a `break`,
/// `return`, `throw`, `continue`, or an `if`/`else` where both branches
/// terminate (spec §4.2 "Case termination is detected").
fn terminates(case_node: Node) -> bool {
    let mut cursor = case_node.walk();
    let statements: Vec<Node> = case_node
        .named_children(&mut cursor)
        .filter(|c| {
            !matches!(
                c.kind(),
                "switch_case" | "switch_default" // nested label markers, not bodies
            )
        })
        .collect();
    match statements.last() {
        Some(last) => statement_terminates(*last),
        None => false,
    }
}

fn statement_terminates(node: Node) -> bool {
    match node.kind() {
        "break_statement" | "return_statement" | "throw_statement" | "continue_statement" => true,
        "if_statement" => {
            let cons = node.child_by_field_name("consequence");
            let alt = node.child_by_field_name("alternative");
            match (cons, alt) {
                (Some(c), Some(a)) => block_terminates(c) && block_terminates(a),
                _ => false,
            }
        }
        _ => false,
    }
}

fn block_terminates(node: Node) -> bool {
    if node.kind() == "statement_block" {
        let mut cursor = node.walk();
        match node.named_children(&mut cursor).last() {
            Some(last) => statement_terminates(last),
            None => false,
        }
    } else {
        statement_terminates(node)
    }
}

fn visit_try(ctx: &mut VisitCtx, node: Node) {
    let scope = ctx.scopes.get_context();
    let disc = ctx.scopes.get_item_counter("try");
    let id = ctx.ids.semantic_id(
        &scope,
        NodeKind::Branch,
        "BRANCH",
        "try",
        Some(disc.to_string()),
        None,
    );
    let pos = ctx.pos(node);
    ctx.collections.branches.push(BranchInfo {
        id,
        parent: ctx.current_scope().unwrap_or_default(),
        branch_kind: "try".to_string(),
        has_consequent: true,
        has_alternate: node.child_by_field_name("handler").is_some(),
        pos,
    });

    if let Some(body) = node.child_by_field_name("body") {
        recurse(ctx, body);
    }
    if let Some(handler) = node.child_by_field_name("handler") {
        recurse(ctx, handler);
    }
    if let Some(finalizer) = node.child_by_field_name("finalizer") {
        recurse(ctx, finalizer);
    }
}
