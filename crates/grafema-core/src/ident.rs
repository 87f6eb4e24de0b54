//! Semantic identifier service (spec §4.1).
//!
//! Two id shapes coexist per the spec: [`LegacyPositionalId`] (kept only
//! for documentation — unstable under line shifts) and [`SemanticId`],
//! which all new producers must use. [`NodeId`] is the opaque wrapper
//! visitors and the `GraphBuilder` pass around; its `Display` is the
//! canonical `file → scopePath → TYPE → name[#discriminator]` text.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::NodeKind;

/// Opaque, stable node identifier (spec I1/I2). Two nodes compare equal
/// iff their canonical id strings are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    pub fn from_raw(s: impl Into<String>) -> Self {
        NodeId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId(String::new())
    }
}

/// `TYPE#name#file#line[:column[:counter]]`. Documented for completeness;
/// no producer in this codebase constructs one — spec.md mandates
/// [`SemanticId`] for new implementations (Open Question #2).
#[derive(Debug, Clone)]
pub struct LegacyPositionalId {
    pub type_tag: String,
    pub name: String,
    pub file: PathBuf,
    pub line: u32,
    pub column: Option<u32>,
    pub counter: Option<u32>,
}

impl fmt::Display for LegacyPositionalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}#{}#{}",
            self.type_tag,
            self.name,
            self.file.display(),
            self.line
        )?;
        if let Some(col) = self.column {
            write!(f, ":{col}")?;
            if let Some(counter) = self.counter {
                write!(f, ":{counter}")?;
            }
        }
        Ok(())
    }
}

/// `file → scopePath → TYPE → name[#discriminator]`.
#[derive(Debug, Clone)]
pub struct SemanticId {
    pub file: PathBuf,
    pub scope_path: Vec<String>,
    pub type_tag: String,
    pub name: String,
    pub discriminator: Option<String>,
}

impl SemanticId {
    pub fn to_node_id(&self) -> NodeId {
        NodeId::from_raw(self.to_string())
    }
}

impl fmt::Display for SemanticId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file.display())?;
        for scope in &self.scope_path {
            write!(f, " → {scope}")?;
        }
        write!(f, " → {} → {}", self.type_tag, self.name)?;
        if let Some(d) = &self.discriminator {
            write!(f, "#{d}")?;
        }
        Ok(())
    }
}

/// Per-file scope stack maintained during traversal. Every visitor
/// `enter_scope`/`exit_scope` call must be balanced — debug builds assert
/// this when the tracker is dropped mid-file (it is cheap insurance, not
/// enforced in release to avoid panicking on partially-visited files).
pub struct ScopeTracker {
    file: PathBuf,
    stack: Vec<ScopeFrame>,
    /// (scope_path joined, key) -> next counter value.
    counters: HashMap<(String, String), u32>,
}

struct ScopeFrame {
    name: String,
    is_named: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeContext {
    pub file: PathBuf,
    pub scope_path: Vec<String>,
}

impl ScopeTracker {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        ScopeTracker {
            file: file.into(),
            stack: Vec::new(),
            counters: HashMap::new(),
        }
    }

    /// Push a scope. `named` scopes (module/class/function) extend the
    /// id scope path; anonymous scopes (blocks, loop bodies) do not,
    /// matching spec.md's "ordered list of enclosing **named** scopes".
    pub fn push_scope(&mut self, name: impl Into<String>, named: bool) {
        self.stack.push(ScopeFrame {
            name: name.into(),
            is_named: named,
        });
    }

    pub fn pop_scope(&mut self) {
        self.stack.pop();
    }

    pub fn is_balanced(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn get_context(&self) -> ScopeContext {
        ScopeContext {
            file: self.file.clone(),
            scope_path: self
                .stack
                .iter()
                .filter(|f| f.is_named)
                .map(|f| f.name.clone())
                .collect(),
        }
    }

    /// Nearest named enclosing scope, if any.
    pub fn get_named_parent(&self) -> Option<&str> {
        self.stack
            .iter()
            .rev()
            .find(|f| f.is_named)
            .map(|f| f.name.as_str())
    }

    /// Monotonically increasing counter for `(current scope, key)`.
    pub fn get_item_counter(&mut self, key: &str) -> u32 {
        let scope_key = self.get_context().scope_path.join("/");
        let counter = self
            .counters
            .entry((scope_key, key.to_string()))
            .or_insert(0);
        let value = *counter;
        *counter += 1;
        value
    }
}

/// Content hints recorded for a pending node whose id may collide with a
/// sibling of the same (type, name, scope) — `CALL`, `METHOD_CALL`,
/// `PROPERTY_ACCESS` per spec §4.1.
#[derive(Debug, Clone)]
pub struct ContentHint {
    pub line: u32,
    pub column: Option<u32>,
    /// Stable hash of the argument/operand shape, used to order
    /// same-base-id siblings deterministically.
    pub shape_hash: u64,
}

struct PendingNode {
    base_id: String,
    hint: ContentHint,
}

/// Per-file identifier generator. Computes base ids eagerly; collision
/// resolution happens once in [`IdGenerator::resolve_collisions`] after
/// the whole file has been visited (spec §4.1 "Collision resolution v2").
pub struct IdGenerator {
    file: PathBuf,
    pending: Vec<PendingNode>,
}

pub const COLLISION_PRONE_KINDS: &[NodeKind] = &[NodeKind::Call, NodeKind::MethodCall];

impl IdGenerator {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        IdGenerator {
            file: file.into(),
            pending: Vec::new(),
        }
    }

    /// Compute the semantic id for a node. For collision-prone kinds this
    /// returns a *base id* — call [`IdGenerator::resolve_collisions`]
    /// after the file is fully visited to get the final, possibly
    /// discriminated, ids (same order as registration).
    pub fn semantic_id(
        &mut self,
        scope: &ScopeContext,
        kind: NodeKind,
        type_tag: &str,
        name: &str,
        discriminator: Option<String>,
        hint: Option<ContentHint>,
    ) -> NodeId {
        let base = SemanticId {
            file: scope.file.clone(),
            scope_path: scope.scope_path.clone(),
            type_tag: type_tag.to_string(),
            name: name.to_string(),
            discriminator,
        }
        .to_string();

        if COLLISION_PRONE_KINDS.contains(&kind) {
            let hint = hint.unwrap_or(ContentHint {
                line: 0,
                column: None,
                shape_hash: 0,
            });
            self.pending.push(PendingNode {
                base_id: base.clone(),
                hint,
            });
        }

        NodeId::from_raw(base)
    }

    /// Partition pending nodes by base id; any partition with more than
    /// one member gets a stable discriminator appended, ordered by
    /// insertion (spec §4.1). Returns the final id for every call made
    /// to `semantic_id` for a collision-prone kind, in call order.
    pub fn resolve_collisions(&self) -> Vec<NodeId> {
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for p in &self.pending {
            *counts.entry(p.base_id.as_str()).or_insert(0) += 1;
        }

        let mut seen: HashMap<&str, u32> = HashMap::new();
        self.pending
            .iter()
            .map(|p| {
                if counts[p.base_id.as_str()] > 1 {
                    let ordinal = seen.entry(p.base_id.as_str()).or_insert(0);
                    let disc = *ordinal;
                    *ordinal += 1;
                    NodeId::from_raw(format!(
                        "{}#L{}C{}:{}",
                        p.base_id,
                        p.hint.line,
                        p.hint.column.unwrap_or(0),
                        disc
                    ))
                } else {
                    NodeId::from_raw(p.base_id.clone())
                }
            })
            .collect()
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Compute the same base-id string [`IdGenerator::semantic_id`] would,
    /// without registering it as pending. Used when a forward reference to
    /// a node (e.g. a nested call appearing as another call's argument)
    /// needs *a* stable id before the referenced node's own visitor runs,
    /// without double-counting it for collision resolution.
    pub fn peek_base_id(
        &self,
        scope: &ScopeContext,
        type_tag: &str,
        name: &str,
        discriminator: Option<String>,
    ) -> NodeId {
        SemanticId {
            file: scope.file.clone(),
            scope_path: scope.scope_path.clone(),
            type_tag: type_tag.to_string(),
            name: name.to_string(),
            discriminator,
        }
        .to_node_id()
    }

    /// Base id strings of every pending (collision-prone) registration,
    /// in the same order as [`IdGenerator::resolve_collisions`]'s output —
    /// so callers can build a `base_id -> final ids` index without
    /// re-deriving each base id.
    pub fn pending_base_ids(&self) -> Vec<String> {
        self.pending.iter().map(|p| p.base_id.clone()).collect()
    }

    /// Number of collision-prone ids registered so far. Callers that need
    /// to remap a provisional id to its final, discriminated one (after
    /// [`IdGenerator::resolve_collisions`] runs) record this index at the
    /// moment they call [`IdGenerator::semantic_id`] for a collision-prone
    /// kind, then look up `resolve_collisions()[index]` once the file is
    /// fully visited.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Discriminator for a flattened destructured parameter binding: spec
/// §4.2 "Discriminator is `index * 1000 + subIndex`".
pub fn parameter_discriminator(index: u32, sub_index: u32) -> u32 {
    index * 1000 + sub_index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_tracker_balances_push_pop() {
        let mut t = ScopeTracker::new("a.ts");
        t.push_scope("Module", true);
        t.push_scope("outer", true);
        t.push_scope("block", false);
        assert_eq!(t.get_context().scope_path, vec!["Module", "outer"]);
        assert_eq!(t.get_named_parent(), Some("outer"));
        t.pop_scope();
        t.pop_scope();
        t.pop_scope();
        assert!(t.is_balanced());
    }

    #[test]
    fn item_counter_is_monotonic_per_scope() {
        let mut t = ScopeTracker::new("a.ts");
        t.push_scope("fn", true);
        assert_eq!(t.get_item_counter("loop"), 0);
        assert_eq!(t.get_item_counter("loop"), 1);
        assert_eq!(t.get_item_counter("loop"), 2);
    }

    #[test]
    fn semantic_id_is_stable_across_builds() {
        let mut gen1 = IdGenerator::new("a.ts");
        let mut tracker = ScopeTracker::new("a.ts");
        tracker.push_scope("Module", true);
        let ctx = tracker.get_context();
        let id1 = gen1.semantic_id(&ctx, NodeKind::Function, "FUNCTION", "foo", None, None);

        let mut gen2 = IdGenerator::new("a.ts");
        let id2 = gen2.semantic_id(&ctx, NodeKind::Function, "FUNCTION", "foo", None, None);
        assert_eq!(id1, id2);
    }

    #[test]
    fn collision_resolution_discriminates_same_base_id() {
        let mut gen = IdGenerator::new("a.ts");
        let mut tracker = ScopeTracker::new("a.ts");
        tracker.push_scope("fn", true);
        let ctx = tracker.get_context();

        let _id_a = gen.semantic_id(
            &ctx,
            NodeKind::Call,
            "CALL",
            "foo",
            None,
            Some(ContentHint {
                line: 1,
                column: Some(0),
                shape_hash: 1,
            }),
        );
        let _id_b = gen.semantic_id(
            &ctx,
            NodeKind::Call,
            "CALL",
            "foo",
            None,
            Some(ContentHint {
                line: 2,
                column: Some(0),
                shape_hash: 2,
            }),
        );

        let resolved = gen.resolve_collisions();
        assert_eq!(resolved.len(), 2);
        assert_ne!(resolved[0], resolved[1]);
    }
}
