//! Calls, method calls, constructor calls, and the shared argument/value
//! classification contract (spec §4.2 "Calls", "Argument extraction").

use tree_sitter::Node;

use grafema_core::ident::ContentHint;
use grafema_core::NodeKind;

use crate::collections::{
    ArgumentInfo, ArrayLiteralInfo, CallInfo, ConstructorCallInfo, ExpressionInfo, LiteralInfo,
    MethodCallInfo, ObjectLiteralInfo, ValueRef,
};
use crate::visit::{recurse, VisitCtx};

const LITERAL_KINDS: &[&str] = &[
    "string",
    "template_string",
    "number",
    "true",
    "false",
    "null",
    "undefined",
    "regex",
];

pub fn visit(ctx: &mut VisitCtx, node: Node) -> bool {
    match node.kind() {
        "call_expression" => {
            visit_call(ctx, node);
            false
        }
        "new_expression" => {
            visit_new(ctx, node);
            false
        }
        _ => false,
    }
}

fn visit_call(ctx: &mut VisitCtx, node: Node) {
    let Some(callee) = node.child_by_field_name("function") else {
        return;
    };
    let args_node = node.child_by_field_name("arguments");
    let arguments = args_node
        .map(|a| extract_arguments(ctx, a))
        .unwrap_or_default();

    let parent = ctx
        .current_function()
        .or_else(|| ctx.current_scope())
        .unwrap_or_default();
    let pos = ctx.pos(node);
    let scope = ctx.scopes.get_context();
    let hint = ContentHint {
        line: pos.line,
        column: pos.column,
        shape_hash: shape_hash(&arguments),
    };

    if callee.kind() == "member_expression" {
        let object = callee.child_by_field_name("object");
        let property = callee.child_by_field_name("property");
        let name = property.map(|p| ctx.text(p)).unwrap_or_default();
        let object_name = object.map(|o| ctx.text(o));

        let id = ctx.ids.semantic_id(
            &scope,
            NodeKind::MethodCall,
            "METHOD_CALL",
            &name,
            None,
            Some(hint),
        );
        let pending_idx = Some(ctx.ids.pending_count() - 1);
        ctx.collections.method_calls.push(MethodCallInfo {
            id,
            pending_idx,
            parent,
            name,
            object_name,
            class_name: ctx.current_class_name(),
            arguments,
            pos,
        });
        return;
    }

    let name = ctx.text(callee);
    let id = ctx.ids.semantic_id(
        &scope,
        NodeKind::Call,
        "CALL",
        &name,
        None,
        Some(hint),
    );
    let pending_idx = Some(ctx.ids.pending_count() - 1);
    ctx.collections.calls.push(CallInfo {
        id,
        pending_idx,
        parent,
        name,
        has_object: false,
        class_name: None,
        arguments,
        pos,
    });
}

fn visit_new(ctx: &mut VisitCtx, node: Node) {
    let Some(callee) = node.child_by_field_name("constructor") else {
        return;
    };
    let class_name = ctx.text(callee);
    let args_node = node.child_by_field_name("arguments");
    let arguments = args_node
        .map(|a| extract_arguments(ctx, a))
        .unwrap_or_default();

    let parent = ctx
        .current_function()
        .or_else(|| ctx.current_scope())
        .unwrap_or_default();
    let pos = ctx.pos(node);
    let scope = ctx.scopes.get_context();
    let disc = ctx.scopes.get_item_counter(&format!("new:{class_name}"));
    let id = ctx.ids.semantic_id(
        &scope,
        NodeKind::ConstructorCall,
        "CONSTRUCTOR_CALL",
        &class_name,
        Some(disc.to_string()),
        None,
    );

    let is_promise_executor = class_name == "Promise" && !arguments.is_empty();

    ctx.collections.constructor_calls.push(ConstructorCallInfo {
        id: id.clone(),
        parent,
        class_name,
        arguments,
        pos,
    });

    if is_promise_executor {
        // The first argument to `new Promise(executor)` is the executor
        // callback; `resolve`/`reject` calls inside it resolve against
        // this constructor call (spec §4.2 "Generators/Promises").
        if let Some(args) = args_node {
            if let Some(exec) = args.named_child(0) {
                ctx.in_promise_executor.push(true);
                ctx.promise_stack.push(id);
                recurse(ctx, exec);
                ctx.promise_stack.pop();
                ctx.in_promise_executor.pop();
            }
        }
    }
}

/// `arg_index`/`is_spread`/classified value for every argument in a
/// `arguments` node, in source order (spec §4.2 "Argument extraction").
pub fn extract_arguments(ctx: &mut VisitCtx, args_node: Node) -> Vec<ArgumentInfo> {
    let mut out = Vec::new();
    let mut cursor = args_node.walk();
    let mut arg_index = 0u32;
    for child in args_node.named_children(&mut cursor) {
        if child.kind() == "spread_element" {
            let inner = child.named_child(0);
            let value = inner
                .map(|n| ValueRef::Spread(Box::new(classify_value(ctx, n))))
                .unwrap_or(ValueRef::Identifier(ctx.text(child)));
            out.push(ArgumentInfo {
                arg_index,
                is_spread: true,
                value,
            });
        } else {
            out.push(ArgumentInfo {
                arg_index,
                is_spread: false,
                value: classify_value(ctx, child),
            });
        }
        arg_index += 1;
    }
    out
}

/// Classify a single argument/initializer/default-value expression into
/// a [`ValueRef`] (spec §4.2 "Argument extraction" categories:
/// `LITERAL`/`VARIABLE`/`FUNCTION`/`CALL`/`EXPRESSION`/`OBJECT_LITERAL`/
/// `ARRAY_LITERAL`/`SPREAD`). Classification does not emit nodes itself —
/// it is the builder's job to turn a `ValueRef` into edges once ids are
/// finalized.
pub fn classify_value(ctx: &mut VisitCtx, node: Node) -> ValueRef {
    if LITERAL_KINDS.contains(&node.kind()) {
        return ValueRef::Literal(classify_literal(ctx, node));
    }
    match node.kind() {
        "identifier" | "this" => ValueRef::Identifier(ctx.text(node)),
        "arrow_function" | "function_expression" => {
            let scope = ctx.scopes.get_context();
            let name = node
                .child_by_field_name("name")
                .map(|n| ctx.text(n))
                .unwrap_or_else(|| format!("<anonymous@{}>", node.start_position().row + 1));
            // The function itself is visited separately by
            // `functions::visit` when the dispatcher reaches this node;
            // here we only need a stable forward reference to its id.
            let id = ctx
                .ids
                .semantic_id(&scope, NodeKind::Function, "FUNCTION", &name, None, None);
            ValueRef::Function(id)
        }
        "call_expression" => {
            // The nested call itself is visited separately by the normal
            // dispatcher (it still appears as a child of this argument
            // list), which is what actually registers it for collision
            // resolution. Here we only need a matching forward reference,
            // so we compute the same base id without double-registering —
            // see `IdGenerator::peek_base_id`.
            let callee_name = node
                .child_by_field_name("function")
                .map(|f| ctx.text(f))
                .unwrap_or_default();
            let scope = ctx.scopes.get_context();
            let id = ctx.ids.peek_base_id(&scope, "CALL", &callee_name, None);
            ValueRef::Call(id)
        }
        "object" => {
            let scope = ctx.scopes.get_context();
            let id = ctx.ids.semantic_id(
                &scope,
                NodeKind::ObjectLiteral,
                "OBJECT_LITERAL",
                "object",
                Some(node.start_position().row.to_string()),
                None,
            );
            ctx.collections.object_literals.push(ObjectLiteralInfo {
                id: id.clone(),
                parent: ctx.current_scope(),
                // Visitors don't currently recurse into property values,
                // so this is a placeholder node with no property edges.
                properties: Vec::new(),
                pos: ctx.pos(node),
            });
            ValueRef::Object(id)
        }
        "array" => {
            let scope = ctx.scopes.get_context();
            let id = ctx.ids.semantic_id(
                &scope,
                NodeKind::ArrayLiteral,
                "ARRAY_LITERAL",
                "array",
                Some(node.start_position().row.to_string()),
                None,
            );
            ctx.collections.array_literals.push(ArrayLiteralInfo {
                id: id.clone(),
                parent: ctx.current_scope(),
                elements: Vec::new(),
                pos: ctx.pos(node),
            });
            ValueRef::Array(id)
        }
        "spread_element" => {
            let inner = node
                .named_child(0)
                .map(|n| classify_value(ctx, n))
                .unwrap_or_else(|| ValueRef::Identifier(ctx.text(node)));
            ValueRef::Spread(Box::new(inner))
        }
        _ => {
            let reads = collect_identifier_reads(ctx, node);
            let id = {
                let scope = ctx.scopes.get_context();
                ctx.ids.semantic_id(
                    &scope,
                    NodeKind::Expression,
                    "EXPRESSION",
                    node.kind(),
                    Some(node.start_position().row.to_string()),
                    None,
                )
            };
            let info = ExpressionInfo {
                id,
                parent: ctx.current_scope(),
                expression_kind: node.kind().to_string(),
                reads,
                pos: ctx.pos(node),
            };
            ctx.collections.expressions.push(info.clone());
            ValueRef::Expression(info)
        }
    }
}

/// A literal node's kind and raw text (spec §4.2 "literal value").
pub fn classify_literal(ctx: &mut VisitCtx, node: Node) -> LiteralInfo {
    let scope = ctx.scopes.get_context();
    let raw = ctx.text(node);
    let id = ctx.ids.semantic_id(
        &scope,
        NodeKind::Literal,
        "LITERAL",
        node.kind(),
        Some(node.start_position().row.to_string()),
        None,
    );
    let info = LiteralInfo {
        id,
        parent: ctx.current_scope(),
        literal_kind: node.kind().to_string(),
        raw,
        pos: ctx.pos(node),
    };
    ctx.collections.literals.push(info.clone());
    info
}

fn collect_identifier_reads(ctx: &VisitCtx, node: Node) -> Vec<String> {
    let mut reads = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "identifier" {
            reads.push(ctx.text(child));
        } else {
            reads.extend(collect_identifier_reads(ctx, child));
        }
    }
    reads
}

fn shape_hash(arguments: &[ArgumentInfo]) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    arguments.len().hash(&mut hasher);
    for a in arguments {
        a.is_spread.hash(&mut hasher);
        std::mem::discriminant(&a.value).hash(&mut hasher);
    }
    hasher.finish()
}
