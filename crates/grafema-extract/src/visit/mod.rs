//! Visitor framework (spec §4.2): one module per syntactic concern, all
//! sharing a single [`VisitCtx`] so the whole file is walked exactly
//! once. No visitor here ever touches a [`grafema_core::GraphBackend`] —
//! only [`VisitCtx::collections`] and [`VisitCtx::ids`]/[`VisitCtx::scopes`].

pub mod calls;
pub mod classes;
pub mod control_flow;
pub mod decorators;
pub mod framework;
pub mod functions;
pub mod generators_promises;
pub mod imports_exports;
pub mod mutations;
pub mod parameters;
pub mod types;

use std::path::{Path, PathBuf};

use tree_sitter::Node;

use grafema_core::{IdGenerator, NodeId, ScopeTracker};

use crate::collections::{Collections, Pos};

/// Shared traversal state passed by `&mut` to every per-concern visitor.
/// Holds the source text, the per-file [`IdGenerator`]/[`ScopeTracker`],
/// the output [`Collections`], and the id of the innermost enclosing
/// function (for `YIELDS`/`RESOLVES_TO`/`this_property` mutations) and
/// class (for `this.*` resolution and constructor detection).
pub struct VisitCtx<'a> {
    pub source: &'a [u8],
    pub path: PathBuf,
    pub ids: IdGenerator,
    pub scopes: ScopeTracker,
    pub collections: Collections,
    pub enclosing_function: Vec<NodeId>,
    pub enclosing_class: Vec<NodeId>,
    pub enclosing_class_name: Vec<String>,
    pub enclosing_scope: Vec<NodeId>,
    pub in_constructor: Vec<bool>,
    pub in_promise_executor: Vec<bool>,
    /// The nearest enclosing `new Promise(executor)` constructor call,
    /// so `resolve`/`reject` calls inside the executor can link back to
    /// it (spec §4.2 "Generators/Promises").
    pub promise_stack: Vec<NodeId>,
}

impl<'a> VisitCtx<'a> {
    pub fn new(source: &'a [u8], path: &Path) -> Self {
        VisitCtx {
            source,
            path: path.to_path_buf(),
            ids: IdGenerator::new(path.to_path_buf()),
            scopes: ScopeTracker::new(path.to_path_buf()),
            collections: Collections::new(),
            enclosing_function: Vec::new(),
            enclosing_class: Vec::new(),
            enclosing_class_name: Vec::new(),
            enclosing_scope: Vec::new(),
            in_constructor: Vec::new(),
            in_promise_executor: Vec::new(),
            promise_stack: Vec::new(),
        }
    }

    pub fn text(&self, node: Node) -> String {
        node.utf8_text(self.source).unwrap_or_default().to_string()
    }

    pub fn pos(&self, node: Node) -> Pos {
        let p = node.start_position();
        Pos {
            line: p.row as u32 + 1,
            column: Some(p.column as u32),
        }
    }

    pub fn current_function(&self) -> Option<NodeId> {
        self.enclosing_function.last().cloned()
    }

    pub fn current_class(&self) -> Option<NodeId> {
        self.enclosing_class.last().cloned()
    }

    pub fn current_class_name(&self) -> Option<String> {
        self.enclosing_class_name.last().cloned()
    }

    pub fn current_promise(&self) -> Option<NodeId> {
        self.promise_stack.last().cloned()
    }

    pub fn current_scope(&self) -> Option<NodeId> {
        self.enclosing_scope.last().cloned()
    }

    pub fn is_in_constructor(&self) -> bool {
        self.in_constructor.last().copied().unwrap_or(false)
    }

    pub fn is_in_promise_executor(&self) -> bool {
        self.in_promise_executor.last().copied().unwrap_or(false)
    }
}

/// Walk the whole tree once, dispatching each node to every concern's
/// matcher in turn. Order matters only in that functions/classes must
/// push their scope before their body is visited, which each visitor
/// handles by recursing into its own children explicitly and returning
/// `true` (handled — don't also generically recurse).
pub fn walk_file(ctx: &mut VisitCtx, root: Node) {
    visit_node(ctx, root);
}

fn visit_node(ctx: &mut VisitCtx, node: Node) {
    if functions::visit(ctx, node) {
        return;
    }
    if classes::visit(ctx, node) {
        return;
    }
    if control_flow::visit(ctx, node) {
        return;
    }
    if imports_exports::visit(ctx, node) {
        return;
    }
    if types::visit(ctx, node) {
        return;
    }
    if decorators::visit(ctx, node) {
        return;
    }
    if mutations::visit(ctx, node) {
        return;
    }
    if generators_promises::visit(ctx, node) {
        return;
    }
    // Calls are matched without short-circuiting the generic descent,
    // since a call expression's arguments still need visiting for
    // nested calls/functions/mutations.
    calls::visit(ctx, node);
    framework::visit(ctx, node);

    recurse(ctx, node);
}

/// Generic descent into every child, used by visitors whose node kind
/// carries no special scoping and by the dispatcher's fallback case.
pub fn recurse(ctx: &mut VisitCtx, node: Node) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        visit_node(ctx, child);
    }
}
