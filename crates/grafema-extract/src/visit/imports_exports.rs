//! `import`/`export` declarations (spec §4.2, §4.3 `IMPORTS_FROM`).

use tree_sitter::Node;

use grafema_core::NodeKind;

use crate::collections::{ExportInfo, ImportInfo};
use crate::visit::VisitCtx;

pub fn visit(ctx: &mut VisitCtx, node: Node) -> bool {
    match node.kind() {
        "import_statement" => {
            visit_import(ctx, node);
            true
        }
        "export_statement" => {
            visit_export(ctx, node);
            true
        }
        _ => false,
    }
}

fn string_literal_text(ctx: &VisitCtx, node: Node) -> String {
    ctx.text(node).trim_matches(['"', '\'', '`']).to_string()
}

fn visit_import(ctx: &mut VisitCtx, node: Node) {
    let source = node
        .child_by_field_name("source")
        .map(|n| string_literal_text(ctx, n))
        .unwrap_or_default();

    let module = ctx.current_scope().unwrap_or_default();
    let pos = ctx.pos(node);

    let mut cursor = node.walk();
    let mut any = false;
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_clause" => {
                any |= visit_import_clause(ctx, child, &source, module.clone(), pos);
            }
            "namespace_import" => {
                let local = child
                    .named_child(0)
                    .map(|n| ctx.text(n))
                    .unwrap_or_default();
                push_import(ctx, &source, None, local, false, true, module.clone(), pos);
                any = true;
            }
            _ => {}
        }
    }

    if !any {
        // Side-effecting import (`import './styles.css'`): still creates
        // a module-level `IMPORT` record so `IMPORTS`/`IMPORTS_FROM`
        // resolution has an anchor.
        push_import(
            ctx,
            &source,
            None,
            source.clone(),
            false,
            false,
            module,
            pos,
        );
    }
}

fn visit_import_clause(
    ctx: &mut VisitCtx,
    clause: Node,
    source: &str,
    module: grafema_core::NodeId,
    pos: crate::collections::Pos,
) -> bool {
    let mut any = false;
    let mut cursor = clause.walk();
    for child in clause.children(&mut cursor) {
        match child.kind() {
            "identifier" => {
                let local = ctx.text(child);
                push_import(ctx, source, None, local, true, false, module.clone(), pos);
                any = true;
            }
            "namespace_import" => {
                let local = child
                    .named_child(0)
                    .map(|n| ctx.text(n))
                    .unwrap_or_default();
                push_import(ctx, source, None, local, false, true, module.clone(), pos);
                any = true;
            }
            "named_imports" => {
                let mut ic = child.walk();
                for spec in child.named_children(&mut ic) {
                    if spec.kind() != "import_specifier" {
                        continue;
                    }
                    let imported = spec
                        .child_by_field_name("name")
                        .map(|n| ctx.text(n))
                        .unwrap_or_default();
                    let local = spec
                        .child_by_field_name("alias")
                        .map(|n| ctx.text(n))
                        .unwrap_or_else(|| imported.clone());
                    push_import(
                        ctx,
                        source,
                        Some(imported),
                        local,
                        false,
                        false,
                        module.clone(),
                        pos,
                    );
                    any = true;
                }
            }
            _ => {}
        }
    }
    any
}

#[allow(clippy::too_many_arguments)]
fn push_import(
    ctx: &mut VisitCtx,
    source: &str,
    imported_name: Option<String>,
    local_name: String,
    is_default: bool,
    is_namespace: bool,
    module: grafema_core::NodeId,
    pos: crate::collections::Pos,
) {
    let scope = ctx.scopes.get_context();
    let id = ctx.ids.semantic_id(
        &scope,
        NodeKind::Import,
        "IMPORT",
        &local_name,
        None,
        None,
    );
    ctx.collections.imports.push(ImportInfo {
        id,
        module,
        source: source.to_string(),
        imported_name,
        local_name,
        is_default,
        is_namespace,
        pos,
    });
}

fn visit_export(ctx: &mut VisitCtx, node: Node) {
    let module = ctx.current_scope().unwrap_or_default();
    let pos = ctx.pos(node);
    let is_default = has_child_token(node, "default");

    let reexport_source = node
        .child_by_field_name("source")
        .map(|n| string_literal_text(ctx, n));

    if let Some(decl) = node.child_by_field_name("declaration") {
        let name = declaration_name(ctx, decl);
        push_export(ctx, name, is_default, reexport_source.clone(), module.clone(), pos);
        crate::visit::recurse(ctx, decl);
        return;
    }

    // `export { a, b as c }` / `export * from './m'`.
    let mut cursor = node.walk();
    let mut any = false;
    for child in node.children(&mut cursor) {
        if child.kind() == "export_clause" {
            let mut ec = child.walk();
            for spec in child.named_children(&mut ec) {
                if spec.kind() != "export_specifier" {
                    continue;
                }
                let name = spec
                    .child_by_field_name("alias")
                    .or_else(|| spec.child_by_field_name("name"))
                    .map(|n| ctx.text(n))
                    .unwrap_or_default();
                push_export(
                    ctx,
                    name,
                    false,
                    reexport_source.clone(),
                    module.clone(),
                    pos,
                );
                any = true;
            }
        }
    }
    if !any && reexport_source.is_some() {
        push_export(ctx, "*".to_string(), false, reexport_source, module, pos);
    }
}

fn declaration_name(ctx: &VisitCtx, decl: Node) -> String {
    decl.child_by_field_name("name")
        .map(|n| ctx.text(n))
        .unwrap_or_else(|| "<default>".to_string())
}

fn push_export(
    ctx: &mut VisitCtx,
    name: String,
    is_default: bool,
    reexport_source: Option<String>,
    module: grafema_core::NodeId,
    pos: crate::collections::Pos,
) {
    let scope = ctx.scopes.get_context();
    let id = ctx
        .ids
        .semantic_id(&scope, NodeKind::Export, "EXPORT", &name, None, None);
    ctx.collections.exports.push(ExportInfo {
        id,
        module,
        name,
        is_default,
        reexport_source,
        pos,
    });
}

fn has_child_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|c| c.kind() == token)
}
