//! Guarantee lifecycle (spec §4.7 "Guarantee manager", §6 "Guarantee file
//! format"): a `GUARANTEE` node carries a Datalog rule plus a set of
//! `governs` glob patterns; `create` resolves those globs against `MODULE`
//! file paths and materializes `GOVERNS` edges, `check`/`checkAll` run the
//! rule and report violations, `export`/`import` round-trip the graph's
//! guarantees to YAML, and `drift` diffs a graph against a previously
//! exported file. Kept as free functions taking `&dyn GraphBackend`
//! explicitly rather than a stateful manager struct, matching
//! `grafema_enrich::dangling_edges`'s "no hidden global state" shape (spec
//! §9 "Global mutable state").

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use globset::{Glob, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use grafema_core::backend::GraphBackend;
use grafema_core::ident::NodeId;
use grafema_core::model::{EdgeId, EdgeKind, GraphEdge, GraphNode, GuaranteeAttrs, NodeKind, NodePayload, Severity};

use crate::datalog::{evaluate, load_graph_facts, parse_program, Binding, EvalLimits};
use crate::error::{QueryError, Result};

fn guarantee_node_id(id: &str) -> NodeId {
    NodeId::from_raw(format!("GUARANTEE#{id}"))
}

/// Strips the `GUARANTEE#` prefix a `create`d node's id carries, recovering
/// the caller-facing id used in the YAML schema (`GuaranteeAttrs` itself
/// has no id field — the prefix is the only place it's stored).
fn raw_id(node_id: &NodeId) -> String {
    node_id.as_str().strip_prefix("GUARANTEE#").unwrap_or(node_id.as_str()).to_string()
}

#[derive(Debug, Clone)]
pub struct GuaranteeDef {
    pub id: String,
    pub name: String,
    pub rule: String,
    pub severity: Severity,
    pub governs: Vec<String>,
}

/// A node referenced by a violation binding, resolved to its display
/// attributes so callers don't have to re-look the id up themselves.
#[derive(Debug, Clone)]
pub struct NodeSummary {
    pub node_type: String,
    pub name: String,
    pub file: Option<std::path::PathBuf>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct Violation {
    pub bindings: Binding,
    pub nodes: HashMap<String, NodeSummary>,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub violation_count: usize,
    pub duration_ms: u128,
    pub violations: Vec<Violation>,
    pub error: Option<String>,
}

impl CheckResult {
    fn errored(error: impl Into<String>) -> Self {
        CheckResult { passed: false, violation_count: 0, duration_ms: 0, violations: Vec::new(), error: Some(error.into()) }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CheckAllResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub created: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct ModifiedGuarantee {
    pub id: String,
    pub changed_fields: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DriftReport {
    pub only_in_graph: Vec<String>,
    pub only_in_file: Vec<String>,
    pub modified: Vec<ModifiedGuarantee>,
    pub unchanged: Vec<String>,
}

impl DriftReport {
    pub fn has_drift(&self) -> bool {
        !self.only_in_graph.is_empty() || !self.only_in_file.is_empty() || !self.modified.is_empty()
    }
}

// ---------------------------------------------------------------------
// YAML schema (spec §6 "Guarantee file format (YAML, version 1)")
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GuaranteeRecord {
    pub id: String,
    pub name: String,
    pub rule: String,
    pub severity: Severity,
    pub governs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GuaranteeFile {
    version: u32,
    #[serde(rename = "exportedAt")]
    exported_at: String,
    guarantees: Vec<GuaranteeRecord>,
}

// ---------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------

pub fn create(backend: &mut dyn GraphBackend, def: GuaranteeDef) -> Result<NodeId> {
    if def.id.trim().is_empty() || def.name.trim().is_empty() || def.rule.trim().is_empty() {
        return Err(QueryError::Validation("a guarantee requires a non-empty id, name, and rule".to_string()));
    }
    let node_id = guarantee_node_id(&def.id);
    if backend.node_exists(&node_id) {
        return Err(QueryError::Validation(format!("guarantee `{}` already exists", def.id)));
    }
    // fail fast on a malformed rule rather than persisting a guarantee
    // that can never be checked.
    parse_program(&def.rule).map_err(QueryError::Datalog)?;

    let node = GraphNode {
        id: node_id.clone(),
        name: def.name.clone(),
        file: None,
        line: None,
        column: None,
        payload: NodePayload::Guarantee(GuaranteeAttrs { rule: def.rule.clone(), severity: def.severity, governs: def.governs.clone() }),
    };
    backend.add_nodes(vec![node]).map_err(|e| QueryError::Validation(e.to_string()))?;

    let edges = governs_edges(backend, &node_id, &def.governs)?;
    backend.add_edges(edges, false).map_err(|e| QueryError::Validation(e.to_string()))?;
    Ok(node_id)
}

fn governs_edges(backend: &dyn GraphBackend, guarantee_id: &NodeId, globs: &[String]) -> Result<Vec<GraphEdge>> {
    let mut builder = GlobSetBuilder::new();
    for pattern in globs {
        builder.add(Glob::new(pattern)?);
    }
    let set = builder.build()?;

    let mut edges = Vec::new();
    for module_id in backend.find_by_type(NodeKind::Module) {
        let Some(module) = backend.node(&module_id) else { continue };
        let Some(file) = &module.file else { continue };
        if set.is_match(file) {
            edges.push(GraphEdge::structural(EdgeId(0), guarantee_id.clone(), module_id, EdgeKind::Governs));
        }
    }
    Ok(edges)
}

fn node_summary(backend: &dyn GraphBackend, id: &str) -> Option<NodeSummary> {
    let node = backend.node(&NodeId::from_raw(id))?;
    Some(NodeSummary { node_type: node.type_tag(), name: node.name.clone(), file: node.file.clone(), line: node.line, column: node.column })
}

fn enrich(backend: &dyn GraphBackend, bindings: Vec<Binding>) -> Vec<Violation> {
    bindings
        .into_iter()
        .map(|b| {
            let mut nodes = HashMap::new();
            for (var, value) in &b {
                if let Some(id) = value.as_node_id() {
                    if let Some(summary) = node_summary(backend, id) {
                        nodes.insert(var.clone(), summary);
                    }
                }
            }
            Violation { bindings: b, nodes }
        })
        .collect()
}

pub fn check(backend: &dyn GraphBackend, guarantee_id: &NodeId) -> CheckResult {
    let start = Instant::now();
    let Some(node) = backend.node(guarantee_id) else {
        return CheckResult::errored(format!("guarantee `{guarantee_id}` not found"));
    };
    let NodePayload::Guarantee(attrs) = &node.payload else {
        return CheckResult::errored(format!("node `{guarantee_id}` is not a GUARANTEE"));
    };

    let program = match parse_program(&attrs.rule) {
        Ok(p) => p,
        Err(e) => return CheckResult::errored(e.to_string()),
    };
    let Some(target) = program.default_target().map(str::to_string) else {
        return CheckResult::errored("guarantee rule has no clauses");
    };

    let store = load_graph_facts(backend);
    match evaluate(store, &program, &target, &EvalLimits::default()) {
        Ok(outcome) => {
            let violations = enrich(backend, outcome.bindings);
            CheckResult {
                passed: violations.is_empty(),
                violation_count: violations.len(),
                duration_ms: start.elapsed().as_millis(),
                violations,
                error: None,
            }
        }
        Err(e) => CheckResult { passed: false, violation_count: 0, duration_ms: start.elapsed().as_millis(), violations: Vec::new(), error: Some(e.to_string()) },
    }
}

pub fn check_all(backend: &dyn GraphBackend) -> CheckAllResult {
    let mut report = CheckAllResult::default();
    for id in backend.find_by_type(NodeKind::Guarantee) {
        report.total += 1;
        let result = check(backend, &id);
        if result.error.is_some() {
            report.errors += 1;
        } else if result.passed {
            report.passed += 1;
        } else {
            report.failed += 1;
        }
    }
    report
}

fn graph_records(backend: &dyn GraphBackend) -> Vec<GuaranteeRecord> {
    backend
        .find_by_type(NodeKind::Guarantee)
        .into_iter()
        .filter_map(|id| {
            let node = backend.node(&id)?;
            let NodePayload::Guarantee(attrs) = &node.payload else { return None };
            Some(GuaranteeRecord { id: raw_id(&id), name: node.name.clone(), rule: attrs.rule.clone(), severity: attrs.severity, governs: attrs.governs.clone() })
        })
        .collect()
}

pub fn export(backend: &dyn GraphBackend, path: &Path, exported_at: impl Into<String>) -> Result<()> {
    let file = GuaranteeFile { version: 1, exported_at: exported_at.into(), guarantees: graph_records(backend) };
    let yaml = serde_yaml::to_string(&file)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

pub fn import(backend: &mut dyn GraphBackend, path: &Path, clear_existing: bool) -> Result<ImportReport> {
    let text = std::fs::read_to_string(path)?;
    let file: GuaranteeFile = serde_yaml::from_str(&text)?;

    let mut report = ImportReport::default();
    for record in file.guarantees {
        let node_id = guarantee_node_id(&record.id);
        if backend.node_exists(&node_id) {
            if !clear_existing {
                report.skipped += 1;
                continue;
            }
            backend.remove_node(&node_id);
        }
        create(backend, GuaranteeDef { id: record.id, name: record.name, rule: record.rule, severity: record.severity, governs: record.governs })?;
        report.created += 1;
    }
    Ok(report)
}

pub fn drift(backend: &dyn GraphBackend, path: &Path) -> Result<DriftReport> {
    let text = std::fs::read_to_string(path)?;
    let file: GuaranteeFile = serde_yaml::from_str(&text)?;
    let file_map: HashMap<String, GuaranteeRecord> = file.guarantees.into_iter().map(|r| (r.id.clone(), r)).collect();

    let graph_records = graph_records(backend);
    let graph_map: HashMap<String, GuaranteeRecord> = graph_records.iter().cloned().map(|r| (r.id.clone(), r)).collect();

    let mut report = DriftReport::default();
    for (id, g) in &graph_map {
        match file_map.get(id) {
            None => report.only_in_graph.push(id.clone()),
            Some(f) => {
                let mut changed_fields = Vec::new();
                if f.rule != g.rule {
                    changed_fields.push("rule".to_string());
                }
                if f.severity != g.severity {
                    changed_fields.push("severity".to_string());
                }
                if f.name != g.name {
                    changed_fields.push("name".to_string());
                }
                if f.governs != g.governs {
                    changed_fields.push("governs".to_string());
                }
                if changed_fields.is_empty() {
                    report.unchanged.push(id.clone());
                } else {
                    report.modified.push(ModifiedGuarantee { id: id.clone(), changed_fields });
                }
            }
        }
    }
    for id in file_map.keys() {
        if !graph_map.contains_key(id) {
            report.only_in_file.push(id.clone());
        }
    }
    Ok(report)
}

/// Climbs containment edges from `node_id` to the nearest enclosing
/// `MODULE`, then returns the sources of its incoming `GOVERNS` edges.
pub fn find_affected_guarantees(backend: &dyn GraphBackend, node_id: &NodeId) -> Vec<NodeId> {
    let Some(module_id) = enclosing_module(backend, node_id) else {
        return Vec::new();
    };
    backend.edges_to(&module_id).filter(|e| e.kind == EdgeKind::Governs).map(|e| e.source.clone()).collect()
}

fn enclosing_module(backend: &dyn GraphBackend, node_id: &NodeId) -> Option<NodeId> {
    if matches!(backend.node(node_id)?.payload, NodePayload::Module(_)) {
        return Some(node_id.clone());
    }
    let mut current = node_id.clone();
    for _ in 0..128 {
        let parent = backend
            .edges_to(&current)
            .find(|e| matches!(e.kind, EdgeKind::Contains | EdgeKind::HasScope | EdgeKind::Declares | EdgeKind::Defines))
            .map(|e| e.source.clone())?;
        if matches!(backend.node(&parent)?.payload, NodePayload::Module(_)) {
            return Some(parent);
        }
        current = parent;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafema_core::graph::InMemoryGraph;
    use grafema_core::model::{CallAttrs, FunctionAttrs, ModuleAttrs};
    use tempfile::tempdir;

    fn module(file: &str) -> GraphNode {
        GraphNode { id: NodeId::from_raw(format!("MODULE#{file}")), name: file.to_string(), file: Some(file.into()), line: None, column: None, payload: NodePayload::Module(ModuleAttrs::default()) }
    }

    fn unresolved_call_fixture() -> InMemoryGraph {
        let mut backend = InMemoryGraph::new();
        backend
            .add_nodes(vec![
                module("a.ts"),
                GraphNode {
                    id: NodeId::from_raw("CALL#eval"),
                    name: "eval".to_string(),
                    file: Some("a.ts".into()),
                    line: Some(10),
                    column: None,
                    payload: NodePayload::Call(CallAttrs::default()),
                },
                GraphNode {
                    id: NodeId::from_raw("FUNCTION#noop"),
                    name: "noop".to_string(),
                    file: Some("a.ts".into()),
                    line: Some(1),
                    column: None,
                    payload: NodePayload::Function(FunctionAttrs::default()),
                },
            ])
            .unwrap();
        backend
    }

    #[test]
    fn create_then_check_reports_a_violation() {
        let mut backend = unresolved_call_fixture();
        let id = create(
            &mut backend,
            GuaranteeDef {
                id: "no-eval".to_string(),
                name: "No eval() calls".to_string(),
                rule: r#"violation(X) :- node(X,"CALL"), attr(X,"name","eval")."#.to_string(),
                severity: Severity::Error,
                governs: vec!["*.ts".to_string()],
            },
        )
        .unwrap();

        assert!(backend.edges_from(&id).any(|e| e.kind == EdgeKind::Governs));

        let result = check(&backend, &id);
        assert!(!result.passed);
        assert_eq!(result.violation_count, 1);
        assert!(result.violations[0].nodes.get("X").is_some());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut backend = unresolved_call_fixture();
        let def = GuaranteeDef {
            id: "dup".to_string(),
            name: "dup".to_string(),
            rule: r#"ok(X) :- node(X,"CALL")."#.to_string(),
            severity: Severity::Warning,
            governs: vec![],
        };
        create(&mut backend, def.clone()).unwrap();
        assert!(create(&mut backend, def).is_err());
    }

    #[test]
    fn export_then_import_round_trips() {
        let mut backend = unresolved_call_fixture();
        create(
            &mut backend,
            GuaranteeDef {
                id: "no-eval".to_string(),
                name: "No eval() calls".to_string(),
                rule: r#"violation(X) :- node(X,"CALL"), attr(X,"name","eval")."#.to_string(),
                severity: Severity::Error,
                governs: vec!["*.ts".to_string()],
            },
        )
        .unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("guarantees.yaml");
        export(&backend, &path, "2026-01-01T00:00:00Z").unwrap();

        let mut fresh = unresolved_call_fixture();
        let report = import(&mut fresh, &path, false).unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.skipped, 0);
        assert_eq!(graph_records(&fresh), graph_records(&backend));
    }

    #[test]
    fn drift_detects_a_modified_rule() {
        let mut backend = unresolved_call_fixture();
        create(
            &mut backend,
            GuaranteeDef {
                id: "no-eval".to_string(),
                name: "No eval() calls".to_string(),
                rule: r#"violation(X) :- node(X,"CALL"), attr(X,"name","eval")."#.to_string(),
                severity: Severity::Error,
                governs: vec!["*.ts".to_string()],
            },
        )
        .unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("guarantees.yaml");
        export(&backend, &path, "2026-01-01T00:00:00Z").unwrap();

        // mutate the rule on the graph side after exporting, simulating a
        // later edit that was never re-exported.
        let id = guarantee_node_id("no-eval");
        if let Some(node) = backend.node_mut(&id) {
            if let NodePayload::Guarantee(attrs) = &mut node.payload {
                attrs.rule = r#"violation(X) :- node(X,"CALL"), attr(X,"name","Function")."#.to_string();
            }
        }

        let import_report = import(&mut backend, &path, false).unwrap();
        assert_eq!(import_report.skipped, 1, "existing id is kept unless clear_existing");

        let report = drift(&backend, &path).unwrap();
        assert_eq!(report.modified.len(), 1);
        assert_eq!(report.modified[0].id, "no-eval");
        assert_eq!(report.modified[0].changed_fields, vec!["rule".to_string()]);
        assert!(report.has_drift());
    }
}
