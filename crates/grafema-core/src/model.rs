//! The node/edge type universe (spec §3).
//!
//! Nodes are a tagged sum over [`NodeKind`]: [`GraphNode`] carries the
//! common attributes every node has (id, name, file/line/column) and a
//! [`NodePayload`] variant with the kind-specific fields. String tags
//! (`NodeKind::as_str`, `EdgeKind::as_str`) only exist at the
//! persistence/query boundary (Datalog `node(Id, Type)` facts, YAML
//! guarantee export) — internal dispatch always matches on the enum.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ident::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct EdgeId(pub u64);

/// Closed enumeration of node kinds. Representative per-kind payloads
/// live on [`NodePayload`]; this tag is what `node(Id, Type)` Datalog
/// facts and `find_by_type` queries match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Module,
    Function,
    Parameter,
    Scope,
    Branch,
    Case,
    Call,
    MethodCall,
    ConstructorCall,
    Variable,
    Constant,
    Literal,
    ObjectLiteral,
    ArrayLiteral,
    Expression,
    Import,
    Export,
    ExternalModule,
    Class,
    Interface,
    Type,
    Enum,
    TypeParameter,
    Decorator,
    HttpRequest,
    DatabaseQuery,
    EventListener,
    SocketIo,
    React,
    Browser,
    NetSingleton,
    Issue,
    Guarantee,
    Plugin,
}

impl NodeKind {
    /// Persistence-boundary string tag, e.g. `"FUNCTION"`, `"socketio:emit"`.
    /// Domain-overlay kinds (`SocketIo`, `React`, `Browser`, `NetSingleton`,
    /// `Issue`) carry a sub-kind on their payload and render it into the tag.
    pub fn as_str(&self, payload: &NodePayload) -> String {
        match (self, payload) {
            (NodeKind::Module, _) => "MODULE".to_string(),
            (NodeKind::Function, _) => "FUNCTION".to_string(),
            (NodeKind::Parameter, _) => "PARAMETER".to_string(),
            (NodeKind::Scope, _) => "SCOPE".to_string(),
            (NodeKind::Branch, _) => "BRANCH".to_string(),
            (NodeKind::Case, _) => "CASE".to_string(),
            (NodeKind::Call, _) => "CALL".to_string(),
            (NodeKind::MethodCall, _) => "METHOD_CALL".to_string(),
            (NodeKind::ConstructorCall, _) => "CONSTRUCTOR_CALL".to_string(),
            (NodeKind::Variable, _) => "VARIABLE".to_string(),
            (NodeKind::Constant, _) => "CONSTANT".to_string(),
            (NodeKind::Literal, _) => "LITERAL".to_string(),
            (NodeKind::ObjectLiteral, _) => "OBJECT_LITERAL".to_string(),
            (NodeKind::ArrayLiteral, _) => "ARRAY_LITERAL".to_string(),
            (NodeKind::Expression, _) => "EXPRESSION".to_string(),
            (NodeKind::Import, _) => "IMPORT".to_string(),
            (NodeKind::Export, _) => "EXPORT".to_string(),
            (NodeKind::ExternalModule, _) => "EXTERNAL_MODULE".to_string(),
            (NodeKind::Class, _) => "CLASS".to_string(),
            (NodeKind::Interface, _) => "INTERFACE".to_string(),
            (NodeKind::Type, _) => "TYPE".to_string(),
            (NodeKind::Enum, _) => "ENUM".to_string(),
            (NodeKind::TypeParameter, _) => "TYPE_PARAMETER".to_string(),
            (NodeKind::Decorator, _) => "DECORATOR".to_string(),
            (NodeKind::HttpRequest, _) => "HTTP_REQUEST".to_string(),
            (NodeKind::DatabaseQuery, _) => "DATABASE_QUERY".to_string(),
            (NodeKind::EventListener, _) => "EVENT_LISTENER".to_string(),
            (NodeKind::SocketIo, NodePayload::SocketIo(a)) => format!("socketio:{}", a.sub_kind),
            (NodeKind::React, NodePayload::React(a)) => format!("react:{}", a.sub_kind),
            (NodeKind::Browser, NodePayload::Browser(a)) => format!("browser:{}", a.sub_kind),
            (NodeKind::NetSingleton, NodePayload::NetSingleton(a)) => {
                format!("net:{}", a.sub_kind)
            }
            (NodeKind::Issue, NodePayload::Issue(a)) => format!("issue:{}", a.category),
            (NodeKind::Guarantee, _) => "GUARANTEE".to_string(),
            (NodeKind::Plugin, _) => "grafema:plugin".to_string(),
            _ => unreachable!("NodeKind/NodePayload mismatch"),
        }
    }
}

/// Kind-specific attribute payload. One variant per [`NodeKind`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum NodePayload {
    Module(ModuleAttrs),
    Function(FunctionAttrs),
    Parameter(ParameterAttrs),
    Scope(ScopeAttrs),
    Branch(BranchAttrs),
    Case(CaseAttrs),
    Call(CallAttrs),
    MethodCall(MethodCallAttrs),
    ConstructorCall(ConstructorCallAttrs),
    Variable(VariableAttrs),
    Constant(VariableAttrs),
    Literal(LiteralAttrs),
    ObjectLiteral(CompositeLiteralAttrs),
    ArrayLiteral(CompositeLiteralAttrs),
    Expression(ExpressionAttrs),
    Import(ImportAttrs),
    Export(ExportAttrs),
    ExternalModule(ExternalModuleAttrs),
    Class(ClassAttrs),
    Interface(InterfaceAttrs),
    Type(TypeAttrs),
    Enum(EnumAttrs),
    TypeParameter(TypeParameterAttrs),
    Decorator(DecoratorAttrs),
    HttpRequest(FrameworkAttrs),
    DatabaseQuery(FrameworkAttrs),
    EventListener(FrameworkAttrs),
    SocketIo(FrameworkAttrs),
    React(FrameworkAttrs),
    Browser(FrameworkAttrs),
    NetSingleton(SingletonAttrs),
    Issue(IssueAttrs),
    Guarantee(GuaranteeAttrs),
    Plugin(PluginAttrs),
}

impl NodePayload {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodePayload::Module(_) => NodeKind::Module,
            NodePayload::Function(_) => NodeKind::Function,
            NodePayload::Parameter(_) => NodeKind::Parameter,
            NodePayload::Scope(_) => NodeKind::Scope,
            NodePayload::Branch(_) => NodeKind::Branch,
            NodePayload::Case(_) => NodeKind::Case,
            NodePayload::Call(_) => NodeKind::Call,
            NodePayload::MethodCall(_) => NodeKind::MethodCall,
            NodePayload::ConstructorCall(_) => NodeKind::ConstructorCall,
            NodePayload::Variable(_) => NodeKind::Variable,
            NodePayload::Constant(_) => NodeKind::Constant,
            NodePayload::Literal(_) => NodeKind::Literal,
            NodePayload::ObjectLiteral(_) => NodeKind::ObjectLiteral,
            NodePayload::ArrayLiteral(_) => NodeKind::ArrayLiteral,
            NodePayload::Expression(_) => NodeKind::Expression,
            NodePayload::Import(_) => NodeKind::Import,
            NodePayload::Export(_) => NodeKind::Export,
            NodePayload::ExternalModule(_) => NodeKind::ExternalModule,
            NodePayload::Class(_) => NodeKind::Class,
            NodePayload::Interface(_) => NodeKind::Interface,
            NodePayload::Type(_) => NodeKind::Type,
            NodePayload::Enum(_) => NodeKind::Enum,
            NodePayload::TypeParameter(_) => NodeKind::TypeParameter,
            NodePayload::Decorator(_) => NodeKind::Decorator,
            NodePayload::HttpRequest(_) => NodeKind::HttpRequest,
            NodePayload::DatabaseQuery(_) => NodeKind::DatabaseQuery,
            NodePayload::EventListener(_) => NodeKind::EventListener,
            NodePayload::SocketIo(_) => NodeKind::SocketIo,
            NodePayload::React(_) => NodeKind::React,
            NodePayload::Browser(_) => NodeKind::Browser,
            NodePayload::NetSingleton(_) => NodeKind::NetSingleton,
            NodePayload::Issue(_) => NodeKind::Issue,
            NodePayload::Guarantee(_) => NodeKind::Guarantee,
            NodePayload::Plugin(_) => NodeKind::Plugin,
        }
    }

    /// Is this node a "leaf" for dataflow-trace termination (spec §4.6,
    /// `DataFlowValidator`; glossary "Leaf node")?
    pub fn is_dataflow_leaf(&self) -> bool {
        matches!(
            self,
            NodePayload::Literal(_)
                | NodePayload::ArrayLiteral(_)
                | NodePayload::ObjectLiteral(_)
                | NodePayload::Class(_)
                | NodePayload::Function(_)
                | NodePayload::Call(_)
                | NodePayload::ConstructorCall(_)
                | NodePayload::NetSingleton(_)
                | NodePayload::DatabaseQuery(_)
                | NodePayload::EventListener(_)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Go,
    Java,
    C,
    Cpp,
    Rust,
    Other,
}

impl Language {
    pub fn from_path(path: &std::path::Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts") | Some("tsx") => Language::TypeScript,
            Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => Language::JavaScript,
            Some("py") | Some("pyi") => Language::Python,
            Some("go") => Language::Go,
            Some("java") => Language::Java,
            Some("c") | Some("h") => Language::C,
            Some("cpp") | Some("cc") | Some("cxx") | Some("hpp") | Some("hh") => Language::Cpp,
            Some("rs") => Language::Rust,
            _ => Language::Other,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModuleAttrs {
    pub language: Option<Language>,
    pub package: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FunctionAttrs {
    pub is_async: bool,
    pub is_generator: bool,
    pub is_arrow: bool,
    pub is_method: bool,
    /// Rejection class names observed via `reject(new E())` inside this
    /// function's body (spec §4.2 "Generators & promises").
    pub rejection_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ParameterAttrs {
    /// Original positional slot index in the parameter list.
    pub index: u32,
    /// `index * 1000 + sub_index` per the destructuring discriminator rule.
    pub sub_index: u32,
    /// Dotted property path for object-pattern bindings (`["b", "c"]`).
    pub property_path: Vec<String>,
    /// Index for array-pattern bindings (`[x, y]`).
    pub array_index: Option<u32>,
    pub has_default: bool,
    pub is_rest: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScopeAttrs {
    pub scope_kind: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BranchAttrs {
    pub branch_kind: String, // "if" | "ternary" | "try"
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CaseAttrs {
    pub is_default: bool,
    pub falls_through: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CallAttrs {
    /// Whether this call was made on an object (`obj.method()`), which
    /// exempts it from `CallResolverValidator`'s unresolved-call rule.
    pub has_object: bool,
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MethodCallAttrs {
    pub object_name: Option<String>,
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConstructorCallAttrs {
    pub class_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VariableAttrs {
    pub is_const: bool,
    /// Set when this field has no initializer (exempt from
    /// `DataFlowValidator`).
    pub uninitialized: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LiteralAttrs {
    pub literal_kind: String, // "string" | "number" | "boolean" | "null" | ...
    pub raw: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompositeLiteralAttrs {
    pub element_count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExpressionAttrs {
    pub expression_kind: String, // "member" | "binary" | "logical" | "ternary" | "template"
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImportAttrs {
    pub source: String,
    pub imported_name: Option<String>,
    pub is_default: bool,
    pub is_namespace: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExportAttrs {
    pub is_default: bool,
    pub reexport_source: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExternalModuleAttrs {
    pub source: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClassAttrs {
    pub is_abstract: bool,
    pub superclass_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InterfaceAttrs {
    pub extends: Vec<String>,
    /// Count of property/method/index signatures in the interface body —
    /// feeds `TypeScriptDeadCodeValidator`'s "zero properties" info rule
    /// (spec §4.6).
    pub property_count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TypeAttrs {
    pub is_mapped: bool,
    pub is_conditional: bool,
    pub aliased_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnumAttrs {
    pub is_const: bool,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TypeParameterAttrs {
    pub constraint: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DecoratorAttrs {
    pub target_id: Option<NodeId>,
}

/// Shared payload for the framework/domain overlay node families
/// (`HTTP_REQUEST`, `DATABASE_QUERY`, `EVENT_LISTENER`, `socketio:*`,
/// `react:*`, `browser:*`). These are analyses layered on the visitor
/// framework, not core — hence one loose attribute bag rather than a
/// bespoke struct per overlay pattern.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FrameworkAttrs {
    pub sub_kind: String,
    pub attrs: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SingletonAttrs {
    pub sub_kind: String, // "stdio" | "request"
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IssueAttrs {
    pub category: String, // "unresolved-call" | "dataflow-cycle" | ...
    pub message: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Default for Severity {
    fn default() -> Self {
        Severity::Warning
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GuaranteeAttrs {
    pub rule: String,
    pub severity: Severity,
    pub governs: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PluginAttrs {
    pub phase: String,
    pub version: Option<String>,
}

/// A node in the code graph: common fields plus its kind-specific payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub name: String,
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub payload: NodePayload,
}

impl GraphNode {
    pub fn kind(&self) -> NodeKind {
        self.payload.kind()
    }

    pub fn type_tag(&self) -> String {
        self.kind().as_str(&self.payload)
    }
}

/// How an edge's existence was determined. `Structural` edges are always
/// correct (derived directly from syntax); `Heuristic` edges come from
/// pattern-matching or best-effort resolution and carry `confidence < 1.0`
/// (spec §1 Non-goals: "the engine is best-effort with explicit confidence").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeSource {
    Structural,
    Heuristic,
}

/// Closed edge-kind vocabulary (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Contains,
    HasScope,
    Declares,
    Defines,
    HasParameter,
    HasProperty,
    HasElement,
    HasTypeParameter,
    HasCase,
    HasDefault,
    HasConsequent,
    HasAlternate,
    HasCatch,
    HasFinally,
    Calls,
    HasCallback,
    PassesArgument,
    MakesRequest,
    MakesQuery,
    AssignedFrom,
    DerivesFrom,
    FlowsInto,
    ReadsFrom,
    WritesTo,
    Captures,
    Modifies,
    Imports,
    ImportsFrom,
    Extends,
    Implements,
    InstanceOf,
    DecoratedBy,
    EmitsEvent,
    ListenedBy,
    ListensTo,
    HandledBy,
    Yields,
    DelegatesTo,
    ResolvesTo,
    Throws,
    Rejects,
    CatchesFrom,
    Governs,
    Violates,
    Affects,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "CONTAINS",
            EdgeKind::HasScope => "HAS_SCOPE",
            EdgeKind::Declares => "DECLARES",
            EdgeKind::Defines => "DEFINES",
            EdgeKind::HasParameter => "HAS_PARAMETER",
            EdgeKind::HasProperty => "HAS_PROPERTY",
            EdgeKind::HasElement => "HAS_ELEMENT",
            EdgeKind::HasTypeParameter => "HAS_TYPE_PARAMETER",
            EdgeKind::HasCase => "HAS_CASE",
            EdgeKind::HasDefault => "HAS_DEFAULT",
            EdgeKind::HasConsequent => "HAS_CONSEQUENT",
            EdgeKind::HasAlternate => "HAS_ALTERNATE",
            EdgeKind::HasCatch => "HAS_CATCH",
            EdgeKind::HasFinally => "HAS_FINALLY",
            EdgeKind::Calls => "CALLS",
            EdgeKind::HasCallback => "HAS_CALLBACK",
            EdgeKind::PassesArgument => "PASSES_ARGUMENT",
            EdgeKind::MakesRequest => "MAKES_REQUEST",
            EdgeKind::MakesQuery => "MAKES_QUERY",
            EdgeKind::AssignedFrom => "ASSIGNED_FROM",
            EdgeKind::DerivesFrom => "DERIVES_FROM",
            EdgeKind::FlowsInto => "FLOWS_INTO",
            EdgeKind::ReadsFrom => "READS_FROM",
            EdgeKind::WritesTo => "WRITES_TO",
            EdgeKind::Captures => "CAPTURES",
            EdgeKind::Modifies => "MODIFIES",
            EdgeKind::Imports => "IMPORTS",
            EdgeKind::ImportsFrom => "IMPORTS_FROM",
            EdgeKind::Extends => "EXTENDS",
            EdgeKind::Implements => "IMPLEMENTS",
            EdgeKind::InstanceOf => "INSTANCE_OF",
            EdgeKind::DecoratedBy => "DECORATED_BY",
            EdgeKind::EmitsEvent => "EMITS_EVENT",
            EdgeKind::ListenedBy => "LISTENED_BY",
            EdgeKind::ListensTo => "LISTENS_TO",
            EdgeKind::HandledBy => "HANDLED_BY",
            EdgeKind::Yields => "YIELDS",
            EdgeKind::DelegatesTo => "DELEGATES_TO",
            EdgeKind::ResolvesTo => "RESOLVES_TO",
            EdgeKind::Throws => "THROWS",
            EdgeKind::Rejects => "REJECTS",
            EdgeKind::CatchesFrom => "CATCHES_FROM",
            EdgeKind::Governs => "GOVERNS",
            EdgeKind::Violates => "VIOLATES",
            EdgeKind::Affects => "AFFECTS",
        }
    }

    /// Allowed `(source, target)` [`NodeKind`] pairs for this edge kind
    /// (spec I4). Returning an empty slice means the kind is
    /// context-dependent enough (framework overlays, issue/governance
    /// edges) that we only check it's a closed, known edge kind and defer
    /// finer validation to the emitting pass.
    pub fn signature(&self) -> &'static [(NodeKind, NodeKind)] {
        use NodeKind::*;
        match self {
            EdgeKind::Calls => &[(Call, Function), (MethodCall, Function)],
            EdgeKind::Implements => &[(Class, Interface)],
            EdgeKind::Extends => &[(Class, Class), (Interface, Interface)],
            EdgeKind::InstanceOf => &[
                (Variable, Class),
                (Constant, Class),
                (ConstructorCall, Class),
            ],
            EdgeKind::HasParameter => &[(Function, Parameter)],
            EdgeKind::HasCallback => &[(Call, Function), (MethodCall, Function)],
            _ => &[],
        }
    }
}

/// A directed edge in the code graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub kind: EdgeKind,
    pub edge_source: EdgeSource,
    pub confidence: f32,
    pub label: Option<String>,
    pub file: Option<PathBuf>,
    pub line: Option<u32>,
}

impl GraphEdge {
    pub fn structural(id: EdgeId, source: NodeId, target: NodeId, kind: EdgeKind) -> Self {
        GraphEdge {
            id,
            source,
            target,
            kind,
            edge_source: EdgeSource::Structural,
            confidence: 1.0,
            label: None,
            file: None,
            line: None,
        }
    }

    pub fn heuristic(
        id: EdgeId,
        source: NodeId,
        target: NodeId,
        kind: EdgeKind,
        confidence: f32,
    ) -> Self {
        GraphEdge {
            id,
            source,
            target,
            kind,
            edge_source: EdgeSource::Heuristic,
            confidence,
            label: None,
            file: None,
            line: None,
        }
    }
}
