//! Tool-agnostic query surface (spec §6 "External interfaces"): one
//! function per row of that table, operating purely against
//! [`GraphBackend`] plus [`crate::datalog`]/[`crate::guarantee`] — no
//! HTTP/MCP/GraphQL framing lives here, those are external collaborators
//! per spec §1's out-of-scope list. The CLI/MCP server this crate's own
//! project ships calls straight through these functions.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use grafema_core::backend::GraphBackend;
use grafema_core::ident::NodeId;
use grafema_core::model::{EdgeKind, GraphEdge, GraphNode, NodeKind, NodePayload};

use crate::datalog::{evaluate, load_graph_facts, parse_program, Binding, EvalLimits};
use crate::error::{QueryError, Result};

/// Simple offset/limit pagination shared by every list-shaped query.
#[derive(Debug, Clone, Copy, Default)]
pub struct Page {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Page {
    fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let skipped = items.into_iter().skip(self.offset);
        match self.limit {
            Some(limit) => skipped.take(limit).collect(),
            None => skipped.collect(),
        }
    }
}

fn containment_edge(kind: EdgeKind) -> bool {
    matches!(
        kind,
        EdgeKind::Contains | EdgeKind::HasScope | EdgeKind::Declares | EdgeKind::Defines
    )
}

// ---------------------------------------------------------------------
// queryDatalog(rule, {limit, offset})
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct DatalogQueryResult {
    pub bindings: Vec<Binding>,
    pub truncated: bool,
}

/// Parses and runs `rule` against the graph, returning every binding of
/// its default target (spec §4.7 "default_target" — "the last defined
/// relation"), paginated.
pub fn query_datalog(backend: &dyn GraphBackend, rule: &str, page: Page) -> Result<DatalogQueryResult> {
    let program = parse_program(rule)?;
    let target = program
        .default_target()
        .ok_or_else(|| QueryError::Validation("rule has no clauses".to_string()))?
        .to_string();
    let store = load_graph_facts(backend);
    let outcome = evaluate(store, &program, &target, &EvalLimits::default())?;
    Ok(DatalogQueryResult {
        truncated: outcome.truncated,
        bindings: page.apply(outcome.bindings),
    })
}

// ---------------------------------------------------------------------
// findNodes({type?, name?, file?}, page)
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    pub node_type: Option<String>,
    pub name: Option<String>,
    pub file: Option<PathBuf>,
}

pub fn find_nodes(backend: &dyn GraphBackend, filter: &NodeFilter, page: Page) -> Vec<GraphNode> {
    let matches: Vec<GraphNode> = backend
        .all_nodes()
        .filter(|n| {
            filter
                .node_type
                .as_ref()
                .is_none_or(|t| &n.type_tag() == t)
        })
        .filter(|n| filter.name.as_ref().is_none_or(|name| &n.name == name))
        .filter(|n| {
            filter
                .file
                .as_ref()
                .is_none_or(|f| n.file.as_deref() == Some(f.as_path()))
        })
        .cloned()
        .collect();
    page.apply(matches)
}

// ---------------------------------------------------------------------
// findCalls(target, {className?, page})
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CallRecord {
    pub node: GraphNode,
    pub resolved: bool,
    pub target: Option<NodeId>,
}

/// `CALL`/`METHOD_CALL` nodes whose name is `target_name`, optionally
/// restricted to method calls on `class_name`, each enriched with
/// whether it resolved to a `CALLS` edge and that edge's target.
pub fn find_calls(
    backend: &dyn GraphBackend,
    target_name: &str,
    class_name: Option<&str>,
    page: Page,
) -> Vec<CallRecord> {
    let mut candidates = backend.find_by_type(NodeKind::Call);
    candidates.extend(backend.find_by_type(NodeKind::MethodCall));

    let records: Vec<CallRecord> = candidates
        .into_iter()
        .filter_map(|id| {
            let node = backend.node(&id)?;
            if node.name != target_name {
                return None;
            }
            if let Some(class_name) = class_name {
                let node_class = match &node.payload {
                    NodePayload::Call(a) => a.class_name.as_deref(),
                    NodePayload::MethodCall(a) => a.class_name.as_deref(),
                    _ => None,
                };
                if node_class != Some(class_name) {
                    return None;
                }
            }
            let calls_edge = backend.edges_from(&id).find(|e| e.kind == EdgeKind::Calls);
            Some(CallRecord {
                node: node.clone(),
                resolved: calls_edge.is_some(),
                target: calls_edge.map(|e| e.target.clone()),
            })
        })
        .collect();
    page.apply(records)
}

// ---------------------------------------------------------------------
// traceAlias(var, file)
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AliasTrace {
    pub chain: Vec<NodeId>,
    pub cyclic: bool,
}

/// Resolves `var` in `file` to a `VARIABLE`/`CONSTANT` node by name then
/// delegates to [`grafema_enrich::alias_tracker::trace_alias_chain`]'s
/// contract (re-implemented here to avoid a `grafema-enrich` dependency
/// cycle — `grafema-enrich` already depends on `grafema-orchestrate`,
/// not on this crate, so the walk is duplicated rather than imported).
pub fn trace_alias(backend: &dyn GraphBackend, var: &str, file: &Path) -> Option<AliasTrace> {
    let start = backend.find_by_name(var).into_iter().find(|id| {
        backend.node(id).is_some_and(|n| {
            n.file.as_deref() == Some(file)
                && matches!(n.payload, NodePayload::Variable(_) | NodePayload::Constant(_))
        })
    })?;

    const MAX_DEPTH: usize = 20;
    let mut chain = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    visited.insert(start.clone());
    let mut current = start;

    for _ in 0..MAX_DEPTH {
        let next = backend
            .edges_to(&current)
            .find(|e| e.kind == EdgeKind::AssignedFrom || e.kind == EdgeKind::FlowsInto)
            .map(|e| e.source.clone());
        let Some(next) = next else { break };
        if visited.contains(&next) {
            chain.push(next);
            return Some(AliasTrace { chain, cyclic: true });
        }
        visited.insert(next.clone());
        chain.push(next.clone());
        current = next;
    }
    Some(AliasTrace { chain, cyclic: false })
}

// ---------------------------------------------------------------------
// traceDataFlow(source, {direction, maxDepth})
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceDirection {
    Forward,
    Backward,
}

const DATA_FLOW_EDGES: &[EdgeKind] = &[
    EdgeKind::AssignedFrom,
    EdgeKind::DerivesFrom,
    EdgeKind::PassesArgument,
];

/// BFS over `ASSIGNED_FROM ∪ DERIVES_FROM ∪ PASSES_ARGUMENT` from `source`
/// up to `max_depth` hops; `Backward` follows incoming edges (toward
/// origins), `Forward` follows outgoing edges (toward sinks).
pub fn trace_data_flow(
    backend: &dyn GraphBackend,
    source: &NodeId,
    direction: TraceDirection,
    max_depth: usize,
) -> Vec<NodeId> {
    use std::collections::VecDeque;

    let mut visited: HashSet<NodeId> = HashSet::new();
    visited.insert(source.clone());
    let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();
    queue.push_back((source.clone(), 0));
    let mut order = Vec::new();

    while let Some((node, depth)) = queue.pop_front() {
        order.push(node.clone());
        if depth >= max_depth {
            continue;
        }
        let neighbors: Vec<NodeId> = match direction {
            TraceDirection::Forward => backend
                .edges_from(&node)
                .filter(|e| DATA_FLOW_EDGES.contains(&e.kind))
                .map(|e| e.target.clone())
                .collect(),
            TraceDirection::Backward => backend
                .edges_to(&node)
                .filter(|e| DATA_FLOW_EDGES.contains(&e.kind))
                .map(|e| e.source.clone())
                .collect(),
        };
        for next in neighbors {
            if visited.insert(next.clone()) {
                queue.push_back((next, depth + 1));
            }
        }
    }
    order
}

// ---------------------------------------------------------------------
// getFunctionDetails(name, {file, transitive})
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FunctionDetails {
    pub function: GraphNode,
    /// Functions this one calls — one hop, or the full transitive
    /// closure up to depth 5 when `transitive` is requested.
    pub calls: Vec<NodeId>,
    pub callers: Vec<NodeId>,
}

const TRANSITIVE_CALL_DEPTH: usize = 5;

pub fn get_function_details(
    backend: &dyn GraphBackend,
    name: &str,
    file: Option<&Path>,
    transitive: bool,
) -> Option<FunctionDetails> {
    let function_id = backend.find_by_type(NodeKind::Function).into_iter().find(|id| {
        backend
            .node(id)
            .is_some_and(|n| n.name == name && file.is_none_or(|f| n.file.as_deref() == Some(f)))
    })?;
    let function = backend.node(&function_id)?.clone();

    let calls = if transitive {
        transitive_callees(backend, &function_id, TRANSITIVE_CALL_DEPTH)
    } else {
        backend
            .edges_from(&function_id)
            .filter(|e| e.kind == EdgeKind::Calls)
            .map(|e| e.target.clone())
            .collect()
    };

    let callers = backend
        .edges_to(&function_id)
        .filter(|e| e.kind == EdgeKind::Calls)
        .map(|e| e.source.clone())
        .collect();

    Some(FunctionDetails { function, calls, callers })
}

fn transitive_callees(backend: &dyn GraphBackend, start: &NodeId, max_depth: usize) -> Vec<NodeId> {
    use std::collections::VecDeque;

    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();
    queue.push_back((start.clone(), 0));
    let mut out = Vec::new();

    while let Some((node, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        for edge in backend.edges_from(&node).filter(|e| e.kind == EdgeKind::Calls) {
            if visited.insert(edge.target.clone()) {
                out.push(edge.target.clone());
                queue.push_back((edge.target.clone(), depth + 1));
            }
        }
    }
    out
}

// ---------------------------------------------------------------------
// getContext(id, {contextLines, edgeType?})
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct EdgeGroups {
    pub incoming: Vec<GraphEdge>,
    pub outgoing: Vec<GraphEdge>,
}

#[derive(Debug, Clone)]
pub struct NodeContext {
    pub node: GraphNode,
    /// Lines `[line - context_lines, line + context_lines]` read from
    /// `root.join(node.file)`, if the node carries a line and the source
    /// file is reachable. Absent for nodes with no source position
    /// (singletons, guarantees, synthetic issue nodes).
    pub source: Option<String>,
    pub edges: EdgeGroups,
}

pub fn get_context(
    backend: &dyn GraphBackend,
    root: &Path,
    id: &NodeId,
    context_lines: u32,
    edge_type: Option<EdgeKind>,
) -> Option<NodeContext> {
    let node = backend.node(id)?.clone();

    let source = node.file.as_ref().zip(node.line).and_then(|(file, line)| {
        let text = std::fs::read_to_string(root.join(file)).ok()?;
        let lines: Vec<&str> = text.lines().collect();
        let center = line.saturating_sub(1) as usize;
        let start = center.saturating_sub(context_lines as usize);
        let end = (center + context_lines as usize + 1).min(lines.len());
        Some(lines.get(start..end)?.join("\n"))
    });

    let matches = |e: &&GraphEdge| edge_type.is_none_or(|t| e.kind == t);
    let edges = EdgeGroups {
        incoming: backend.edges_to(id).filter(matches).cloned().collect(),
        outgoing: backend.edges_from(id).filter(matches).cloned().collect(),
    };

    Some(NodeContext { node, source, edges })
}

// ---------------------------------------------------------------------
// findGuards(id)
// ---------------------------------------------------------------------

/// Climbs containment edges from `id` outward, collecting every
/// enclosing `BRANCH` node (conditional scope), innermost first (spec §6
/// "Conditional scopes from innermost out").
pub fn find_guards(backend: &dyn GraphBackend, id: &NodeId) -> Vec<NodeId> {
    let mut guards = Vec::new();
    let mut current = id.clone();
    for _ in 0..128 {
        let Some(parent) = backend
            .edges_to(&current)
            .find(|e| containment_edge(e.kind))
            .map(|e| e.source.clone())
        else {
            break;
        };
        if backend
            .node(&parent)
            .is_some_and(|n| matches!(n.payload, NodePayload::Branch(_)))
        {
            guards.push(parent.clone());
        }
        current = parent;
    }
    guards
}

// ---------------------------------------------------------------------
// getCoverage(path)
// ---------------------------------------------------------------------

pub use grafema_extract::coordinator::Coverage;

/// Thin re-export: `getCoverage` is the same [`Coverage`] struct the
/// coordinator already accumulates during indexing (spec §4.2
/// "Supplemented features — Coverage accounting"); this crate has no
/// independent notion of coverage, it just surfaces the one the indexer
/// produced for the directory the caller asks about.
pub fn get_coverage(report: &grafema_extract::coordinator::IndexReport, _path: &Path) -> Coverage {
    report.coverage
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafema_core::graph::InMemoryGraph;
    use grafema_core::model::{CallAttrs, EdgeId, FunctionAttrs, ModuleAttrs, VariableAttrs};

    fn node(id: &str, name: &str, file: &str, line: u32, payload: NodePayload) -> GraphNode {
        GraphNode {
            id: NodeId::from_raw(id),
            name: name.to_string(),
            file: Some(file.into()),
            line: Some(line),
            column: None,
            payload,
        }
    }

    #[test]
    fn find_nodes_filters_by_type_and_file() {
        let mut g = InMemoryGraph::new();
        g.add_nodes(vec![
            node("MODULE#a.ts", "a.ts", "a.ts", 1, NodePayload::Module(ModuleAttrs::default())),
            node("FUNCTION#f", "f", "a.ts", 2, NodePayload::Function(FunctionAttrs::default())),
            node("FUNCTION#g", "g", "b.ts", 2, NodePayload::Function(FunctionAttrs::default())),
        ])
        .unwrap();

        let results = find_nodes(
            &g,
            &NodeFilter { node_type: Some("FUNCTION".to_string()), file: Some("a.ts".into()), ..Default::default() },
            Page::default(),
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "f");
    }

    #[test]
    fn find_calls_reports_resolution_state() {
        let mut g = InMemoryGraph::new();
        g.add_nodes(vec![
            node("CALL#foo", "foo", "a.ts", 1, NodePayload::Call(CallAttrs::default())),
            node("CALL#bar", "bar", "a.ts", 2, NodePayload::Call(CallAttrs::default())),
            node("FUNCTION#foo", "foo", "a.ts", 5, NodePayload::Function(FunctionAttrs::default())),
        ])
        .unwrap();
        g.add_edges(
            vec![GraphEdge::structural(
                EdgeId(0),
                NodeId::from_raw("CALL#foo"),
                NodeId::from_raw("FUNCTION#foo"),
                EdgeKind::Calls,
            )],
            true,
        )
        .unwrap();

        let resolved = find_calls(&g, "foo", None, Page::default());
        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].resolved);

        let unresolved = find_calls(&g, "bar", None, Page::default());
        assert_eq!(unresolved.len(), 1);
        assert!(!unresolved[0].resolved);
    }

    #[test]
    fn trace_data_flow_walks_backward_to_an_origin() {
        let mut g = InMemoryGraph::new();
        g.add_nodes(vec![
            node("a", "a", "a.ts", 1, NodePayload::Variable(VariableAttrs::default())),
            node("b", "b", "a.ts", 2, NodePayload::Variable(VariableAttrs::default())),
        ])
        .unwrap();
        g.add_edges(
            vec![GraphEdge::structural(EdgeId(0), NodeId::from_raw("b"), NodeId::from_raw("a"), EdgeKind::AssignedFrom)],
            true,
        )
        .unwrap();

        let path = trace_data_flow(&g, &NodeId::from_raw("a"), TraceDirection::Backward, 20);
        assert_eq!(path, vec![NodeId::from_raw("a"), NodeId::from_raw("b")]);
    }

    #[test]
    fn query_datalog_paginates_bindings() {
        let mut g = InMemoryGraph::new();
        g.add_nodes(vec![
            node("CALL#a", "eval", "x.ts", 1, NodePayload::Call(CallAttrs::default())),
            node("CALL#b", "eval", "x.ts", 2, NodePayload::Call(CallAttrs::default())),
        ])
        .unwrap();

        let result = query_datalog(
            &g,
            r#"violation(X) :- node(X,"CALL"), attr(X,"name","eval")."#,
            Page { offset: 1, limit: Some(1) },
        )
        .unwrap();
        assert_eq!(result.bindings.len(), 1);
    }
}
