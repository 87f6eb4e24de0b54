//! Array/object mutations and reassignment (spec §4.2 "Mutations").

use tree_sitter::Node;

use grafema_core::NodeKind;

use crate::collections::{ArrayMutationInfo, ObjectMutationInfo, ReassignmentInfo, ValueRef, VariableInfo};
use crate::visit::calls::{classify_value, extract_arguments};
use crate::visit::VisitCtx;

const ARRAY_MUTATORS: &[&str] = &["push", "unshift", "splice"];

pub fn visit(ctx: &mut VisitCtx, node: Node) -> bool {
    match node.kind() {
        "call_expression" => visit_mutating_call(ctx, node),
        "assignment_expression" => visit_assignment(ctx, node),
        "variable_declarator" => {
            visit_variable_declarator(ctx, node);
            false
        }
        _ => false,
    }
}

/// `const`/`let`/`var` bindings (spec §4.2 treats variable initializers
/// with the same "Argument extraction" categories as call arguments).
fn visit_variable_declarator(ctx: &mut VisitCtx, node: Node) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    if name_node.kind() != "identifier" {
        // Destructuring declarators (`const { a, b } = obj`) are left to
        // the generic recursion; only simple bindings are tracked here.
        return;
    }
    let name = ctx.text(name_node);
    let is_const = node
        .parent()
        .map(|p| ctx.text(p.child(0).unwrap_or(p)) == "const")
        .unwrap_or(false);
    let value = node.child_by_field_name("value");
    let uninitialized = value.is_none();
    let initializer = value.map(|v| classify_value(ctx, v));
    let pos = ctx.pos(node);
    let scope = ctx.scopes.get_context();
    let kind = if is_const {
        NodeKind::Constant
    } else {
        NodeKind::Variable
    };
    let id = ctx.ids.semantic_id(
        &scope,
        kind,
        if is_const { "CONSTANT" } else { "VARIABLE" },
        &name,
        None,
        None,
    );
    let scope_id = ctx.current_scope().unwrap_or_default();

    ctx.collections.variables.push(VariableInfo {
        id,
        scope: scope_id,
        name,
        is_const,
        uninitialized,
        initializer,
        pos,
    });
}

fn visit_mutating_call(ctx: &mut VisitCtx, node: Node) -> bool {
    let Some(callee) = node.child_by_field_name("function") else {
        return false;
    };
    if callee.kind() != "member_expression" {
        return false;
    }
    let Some(object) = callee.child_by_field_name("object") else {
        return false;
    };
    let Some(property) = callee.child_by_field_name("property") else {
        return false;
    };
    let method = ctx.text(property);

    if method == "assign" && ctx.text(object) == "Object" {
        return visit_object_assign(ctx, node);
    }

    if !ARRAY_MUTATORS.contains(&method.as_str()) {
        return false;
    }

    let (base_object_name, property_name) = split_base_and_property(ctx, object);

    let args_node = node.child_by_field_name("arguments");
    let inserted_values = args_node
        .map(|a| extract_arguments(ctx, a))
        .unwrap_or_default();

    let scope = ctx.current_scope().unwrap_or_default();
    let pos = ctx.pos(node);
    ctx.collections.array_mutations.push(ArrayMutationInfo {
        base_object_name,
        property_name,
        mutation_method: method,
        inserted_values,
        scope,
        pos,
    });

    false
}

fn visit_object_assign(ctx: &mut VisitCtx, node: Node) -> bool {
    let Some(args) = node.child_by_field_name("arguments") else {
        return false;
    };
    let arguments = extract_arguments(ctx, args);
    let Some(first) = arguments.first() else {
        return false;
    };
    let target_object_name = match &first.value {
        ValueRef::Identifier(name) => name.clone(),
        _ => return false,
    };

    let scope = ctx.current_scope().unwrap_or_default();
    let pos = ctx.pos(node);
    for source in &arguments[1..] {
        ctx.collections.object_mutations.push(ObjectMutationInfo {
            target_object_name: target_object_name.clone(),
            property_name: None,
            mutation_type: "object_assign".to_string(),
            value: source.value.clone(),
            this_target: None,
            scope: scope.clone(),
            pos,
        });
    }
    false
}

fn split_base_and_property(ctx: &VisitCtx, object: Node) -> (String, Option<String>) {
    if object.kind() == "member_expression" {
        let base = object
            .child_by_field_name("object")
            .map(|n| ctx.text(n))
            .unwrap_or_default();
        let prop = object
            .child_by_field_name("property")
            .map(|n| ctx.text(n));
        (base, prop)
    } else {
        (ctx.text(object), None)
    }
}

fn visit_assignment(ctx: &mut VisitCtx, node: Node) -> bool {
    let Some(left) = node.child_by_field_name("left") else {
        return false;
    };
    let Some(right) = node.child_by_field_name("right") else {
        return false;
    };
    let operator = node
        .child(1)
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| "=".to_string());
    let is_compound = operator != "=";
    let value = classify_value(ctx, right);
    let pos = ctx.pos(node);
    let scope = ctx.current_scope().unwrap_or_default();

    if left.kind() == "member_expression" {
        let object = left.child_by_field_name("object");
        let property = left.child_by_field_name("property");
        let is_this = object.is_some_and(|o| o.kind() == "this");

        if is_this {
            let property_name = property.map(|p| ctx.text(p));
            let this_target = if ctx.is_in_constructor() {
                ctx.current_function()
            } else {
                ctx.current_class()
            };
            ctx.collections.object_mutations.push(ObjectMutationInfo {
                target_object_name: "this".to_string(),
                property_name,
                mutation_type: "this_property".to_string(),
                value,
                this_target,
                scope,
                pos,
            });
            // Fall through to generic recursion below: the right-hand
            // side may itself contain calls/mutations/nested functions.
        } else {
            let (base, prop) = split_base_and_property(ctx, left);
            ctx.collections.object_mutations.push(ObjectMutationInfo {
                target_object_name: base,
                property_name: prop,
                mutation_type: "property_assignment".to_string(),
                value,
                this_target: None,
                scope,
                pos,
            });
        }
        return false;
    }

    if left.kind() == "identifier" {
        let target_name = ctx.text(left);
        ctx.collections.reassignments.push(ReassignmentInfo {
            target_name,
            is_compound,
            value,
            scope,
            pos,
        });
    }

    false
}
