//! Flat per-entity-kind record buffers populated by the visitor framework
//! (spec §4.2). Visitors never touch the backend — they only push
//! `XInfo` records here, using [`grafema_core::IdGenerator`] for every id.
//! The [`crate::builder::GraphBuilder`] is the sole consumer: it turns a
//! fully-populated [`Collections`] into the batched node/edge writes of
//! spec §4.3.

use std::path::PathBuf;

use grafema_core::{EdgeSource, NodeId};

/// A syntactic position, attached to most info records for diagnostics
/// and for `issue:*` enrichment.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pos {
    pub line: u32,
    pub column: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ScopeInfo {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub scope_kind: String,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub name: String,
    pub is_async: bool,
    pub is_generator: bool,
    pub is_arrow: bool,
    pub is_method: bool,
    pub class_parent: Option<NodeId>,
    pub rejection_patterns: Vec<String>,
    pub pos: Pos,
}

/// One flattened parameter binding. Destructured patterns produce more
/// than one `ParameterInfo` per syntactic parameter, sharing `index` and
/// distinguished by `sub_index` (spec §4.2 "Parameters").
#[derive(Debug, Clone)]
pub struct ParameterInfo {
    pub id: NodeId,
    pub function: NodeId,
    pub name: String,
    pub index: u32,
    pub sub_index: u32,
    pub property_path: Vec<String>,
    pub array_index: Option<u32>,
    pub has_default: bool,
    pub is_rest: bool,
    /// When `has_default`, the default value expression, captured so the
    /// builder can emit `FLOWS_INTO(default -> parameter)`.
    pub default_literal: Option<LiteralInfo>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub name: String,
    pub is_abstract: bool,
    pub superclass_name: Option<String>,
    pub implements: Vec<String>,
    pub constructor_fn: Option<NodeId>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub name: String,
    pub extends: Vec<String>,
    pub property_count: u32,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct TypeAliasInfo {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub name: String,
    pub is_mapped: bool,
    pub is_conditional: bool,
    pub aliased_type: Option<String>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct EnumInfo {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub name: String,
    pub is_const: bool,
    pub members: Vec<String>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct TypeParameterInfo {
    pub id: NodeId,
    pub owner: NodeId,
    pub name: String,
    pub constraint: Option<String>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct DecoratorInfo {
    pub id: NodeId,
    pub target: NodeId,
    pub name: String,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct VariableInfo {
    pub id: NodeId,
    pub scope: NodeId,
    pub name: String,
    pub is_const: bool,
    pub uninitialized: bool,
    /// Initializer, when statically classifiable (spec §4.2 "Argument
    /// extraction" categories apply equally to initializers).
    pub initializer: Option<ValueRef>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct LiteralInfo {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub literal_kind: String,
    pub raw: String,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct ObjectLiteralInfo {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub properties: Vec<(String, ValueRef)>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct ArrayLiteralInfo {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub elements: Vec<ValueRef>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct ExpressionInfo {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub expression_kind: String,
    /// Identifiers read by this expression, for `DERIVES_FROM` edges.
    pub reads: Vec<String>,
    pub pos: Pos,
}

/// How an argument/initializer/default value was classified (spec §4.2
/// "Argument extraction"). Carries just enough to resolve the target in
/// a later pass without re-parsing the AST.
#[derive(Debug, Clone)]
pub enum ValueRef {
    Literal(LiteralInfo),
    /// Reads an identifier by name; resolved against enclosing scopes by
    /// the builder's scope-aware variable resolution.
    Identifier(String),
    /// An inline callback, linked back to its `FunctionInfo` by id.
    Function(NodeId),
    /// A nested call, referenced by the callee's node id.
    Call(NodeId),
    Expression(ExpressionInfo),
    Object(NodeId),
    Array(NodeId),
    Spread(Box<ValueRef>),
}

#[derive(Debug, Clone)]
pub struct CallInfo {
    pub id: NodeId,
    pub pending_idx: Option<usize>,
    pub parent: NodeId,
    pub name: String,
    pub has_object: bool,
    pub class_name: Option<String>,
    pub arguments: Vec<ArgumentInfo>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct MethodCallInfo {
    pub id: NodeId,
    pub pending_idx: Option<usize>,
    pub parent: NodeId,
    pub name: String,
    pub object_name: Option<String>,
    pub class_name: Option<String>,
    pub arguments: Vec<ArgumentInfo>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct ConstructorCallInfo {
    pub id: NodeId,
    pub parent: NodeId,
    pub class_name: String,
    pub arguments: Vec<ArgumentInfo>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct ArgumentInfo {
    pub arg_index: u32,
    pub is_spread: bool,
    pub value: ValueRef,
}

#[derive(Debug, Clone)]
pub struct ImportInfo {
    pub id: NodeId,
    pub module: NodeId,
    pub source: String,
    pub imported_name: Option<String>,
    pub local_name: String,
    pub is_default: bool,
    pub is_namespace: bool,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct ExportInfo {
    pub id: NodeId,
    pub module: NodeId,
    pub name: String,
    pub is_default: bool,
    pub reexport_source: Option<String>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct BranchInfo {
    pub id: NodeId,
    pub parent: NodeId,
    pub branch_kind: String,
    pub has_consequent: bool,
    pub has_alternate: bool,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct CaseInfo {
    pub id: NodeId,
    pub switch_parent: NodeId,
    pub is_default: bool,
    pub falls_through: bool,
    pub pos: Pos,
}

/// `arr.push(x)`/`arr.splice(...)`/indexed assignment (spec §4.2 "Array").
#[derive(Debug, Clone)]
pub struct ArrayMutationInfo {
    pub base_object_name: String,
    pub property_name: Option<String>,
    pub mutation_method: String,
    pub inserted_values: Vec<ArgumentInfo>,
    pub scope: NodeId,
    pub pos: Pos,
}

/// Property assignment / `Object.assign` / `this.prop = v` (spec §4.2
/// "Object").
#[derive(Debug, Clone)]
pub struct ObjectMutationInfo {
    pub target_object_name: String,
    pub property_name: Option<String>,
    pub mutation_type: String, // "property_assignment" | "object_assign" | "this_property"
    pub value: ValueRef,
    /// For `this_property` mutations: the enclosing class (or the
    /// constructor function, if inside it).
    pub this_target: Option<NodeId>,
    pub scope: NodeId,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct ReassignmentInfo {
    pub target_name: String,
    pub is_compound: bool,
    pub value: ValueRef,
    pub scope: NodeId,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct YieldInfo {
    pub function: NodeId,
    pub is_delegate: bool,
    pub value: Option<ValueRef>,
    pub pos: Pos,
}

#[derive(Debug, Clone)]
pub struct PromiseResolutionInfo {
    pub constructor_call: NodeId,
    pub is_rejection: bool,
    pub enclosing_function: Option<NodeId>,
    pub value: Option<ValueRef>,
    pub pos: Pos,
}

/// Framework/domain overlay record (spec §4.2 "Framework overlays").
/// These are analyses layered on the visitor framework, sharing the same
/// `Collections` buffer but kept in one loose struct rather than one
/// bespoke type per pattern, matching [`grafema_core::model::FrameworkAttrs`].
#[derive(Debug, Clone)]
pub struct FrameworkInfo {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub family: String, // "socketio" | "react" | "browser" | "http" | "database" | "event"
    pub sub_kind: String,
    pub attrs: std::collections::HashMap<String, String>,
    pub pos: Pos,
}

/// A `DERIVES_FROM`/`ASSIGNED_FROM`-style data-flow edge whose target is
/// a name to resolve via scope-aware lookup, tagged with the edge kind
/// and any `EdgeSource`/confidence the visitor already knows.
#[derive(Debug, Clone)]
pub struct DataFlowHint {
    pub source: NodeId,
    pub target_name: String,
    pub kind: grafema_core::EdgeKind,
    pub edge_source: EdgeSource,
    pub confidence: f32,
    pub scope: NodeId,
}

/// All records produced while visiting a single file. One `Collections`
/// per file; reset between files (spec §5 "`IdGenerator._pendingNodes`:
/// per-file, reset between files").
#[derive(Debug, Clone, Default)]
pub struct Collections {
    pub scopes: Vec<ScopeInfo>,
    pub functions: Vec<FunctionInfo>,
    pub parameters: Vec<ParameterInfo>,
    pub classes: Vec<ClassInfo>,
    pub interfaces: Vec<InterfaceInfo>,
    pub type_aliases: Vec<TypeAliasInfo>,
    pub enums: Vec<EnumInfo>,
    pub type_parameters: Vec<TypeParameterInfo>,
    pub decorators: Vec<DecoratorInfo>,
    pub variables: Vec<VariableInfo>,
    pub literals: Vec<LiteralInfo>,
    pub object_literals: Vec<ObjectLiteralInfo>,
    pub array_literals: Vec<ArrayLiteralInfo>,
    pub expressions: Vec<ExpressionInfo>,
    pub calls: Vec<CallInfo>,
    pub method_calls: Vec<MethodCallInfo>,
    pub constructor_calls: Vec<ConstructorCallInfo>,
    pub imports: Vec<ImportInfo>,
    pub exports: Vec<ExportInfo>,
    pub branches: Vec<BranchInfo>,
    pub cases: Vec<CaseInfo>,
    pub array_mutations: Vec<ArrayMutationInfo>,
    pub object_mutations: Vec<ObjectMutationInfo>,
    pub reassignments: Vec<ReassignmentInfo>,
    pub yields: Vec<YieldInfo>,
    pub promise_resolutions: Vec<PromiseResolutionInfo>,
    pub framework: Vec<FrameworkInfo>,
    pub data_flow_hints: Vec<DataFlowHint>,
}

impl Collections {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Shared per-file path, handed to every visitor alongside `Collections`
/// so diagnostics and `SemanticId`s carry the right file.
#[derive(Debug, Clone)]
pub struct FileContext {
    pub path: PathBuf,
}
