//! Local smoke-testing entry point for the Grafema core pipeline.
//!
//! Not a CLI product — argument parsing/UX is an explicit Non-goal (spec
//! §1). This binary wires the three subsystems end to end over a single
//! filesystem root: discover files, run the buffered extraction pipeline,
//! run the orchestrator's enrichment + validation phases, then print a
//! one-line summary. It exists so the repo has a runnable path for the
//! end-to-end scenarios in spec §8 and for local testing against a real
//! tree, the same way the teacher's `main.rs` wires `commands::index`.

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grafema_core::graph::InMemoryGraph;
use grafema_core::model::NodeKind;
use grafema_enrich::{
    AliasTracker, ArgumentParameterLinker, DanglingEdgeReconciler, InstanceOfResolver,
    MethodCallResolver, RejectionPropagationEnricher,
};
use grafema_extract::config::ProjectConfig;
use grafema_extract::coordinator;
use grafema_orchestrate::Orchestrator;
use grafema_validate::{CallResolverValidator, DataFlowValidator, TypeScriptDeadCodeValidator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "grafema=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let root: PathBuf = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    let root = root.canonicalize().unwrap_or(root);
    tracing::info!(root = %root.display(), "starting grafema analysis");

    let config = ProjectConfig::load(&root)?;

    // Discovery + indexing: synchronous, per-file, CPU-bound (spec §9
    // "Async I/O") — driven directly rather than through the orchestrator,
    // which only schedules the phases plugins actually register for.
    let files = coordinator::discover_files(&root, &config)?;
    tracing::info!(file_count = files.len(), "discovered files");

    let mut backend = InMemoryGraph::new();
    let index_report = coordinator::index_project(&root, &files, &mut backend);
    for (file, message) in &index_report.parse_errors {
        tracing::warn!(file = %file.display(), error = %message, "parse error");
    }

    let orchestrator = Orchestrator::new()
        // Enrichment, in the order spec §4.5 lists its contracts.
        .register(Arc::new(MethodCallResolver::new()))
        .register(Arc::new(ArgumentParameterLinker::new()))
        .register(Arc::new(InstanceOfResolver::new()))
        .register(Arc::new(RejectionPropagationEnricher::new()))
        .register(Arc::new(AliasTracker::new()))
        .register(Arc::new(DanglingEdgeReconciler::new()))
        // Validation, emitting `issue:*` nodes (spec §4.6).
        .register(Arc::new(CallResolverValidator::new()))
        .register(Arc::new(DataFlowValidator::new()))
        .register(Arc::new(TypeScriptDeadCodeValidator::new()));

    let run_report = orchestrator.run(&mut backend, &root).await;

    let issue_count = backend.find_by_type(NodeKind::Issue).len();
    tracing::info!(
        nodes = backend.node_count(),
        edges = backend.edge_count(),
        analyzed = index_report.coverage.analyzed,
        unsupported = index_report.coverage.unsupported,
        unreachable = index_report.coverage.unreachable,
        issues = issue_count,
        plugin_errors = run_report.errors.len(),
        aborted = run_report.aborted,
        "analysis complete"
    );

    if run_report.aborted {
        std::process::exit(1);
    }
    if issue_count > 0 {
        std::process::exit(2);
    }
    Ok(())
}
