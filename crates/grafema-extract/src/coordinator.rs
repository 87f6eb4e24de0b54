//! Per-project file discovery and the indexing driver (spec §4.3):
//! walks the source tree respecting `.gitignore` plus the config's
//! `include`/`exclude` globs, runs the visitor framework + buffered
//! writer over every JS/TS file, and performs the builder's own
//! cross-file `IMPORTS_FROM` resolution post-pass (spec §4.3 step 5,
//! "the only place where async queries against the backend are
//! required" per spec §9). Cross-file `CALLS`/`INSTANCE_OF` resolution
//! is `grafema-enrich`'s job, not the coordinator's.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use grafema_core::backend::GraphBackend;
use grafema_core::ident::{NodeId, SemanticId};
use grafema_core::model::{EdgeKind, GraphEdge, Language, NodeKind, NodePayload};

use crate::builder;
use crate::config::ProjectConfig;
use crate::extractor::ExtractionOutcome;
use crate::languages;
use crate::parser_pool::{ParseRequest, ParserPool};
use crate::visit::{self, VisitCtx};

/// Relative-import extensions tried in order (spec §4.3 step 5).
const RELATIVE_EXTENSIONS: &[&str] = &["", ".js", ".ts", ".jsx", ".tsx", "/index.js", "/index.ts"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Coverage {
    pub analyzed: u32,
    pub unsupported: u32,
    pub unreachable: u32,
}

#[derive(Debug, Default)]
pub struct IndexReport {
    pub coverage: Coverage,
    pub parse_errors: Vec<(PathBuf, String)>,
}

/// Walks `root`, honoring `.gitignore`/`.ignore` plus the config's
/// `include`/`exclude` globs (spec §6). Files excluded here never reach
/// [`index_project`] and are counted as `unreachable` by the caller.
pub fn discover_files(root: &Path, config: &ProjectConfig) -> anyhow::Result<Vec<PathBuf>> {
    let (include, exclude) = config.globs()?;
    let mut files = Vec::new();
    let mut walker = ignore::WalkBuilder::new(root);
    walker.hidden(false).git_ignore(true);
    for entry in walker.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(error = %err, "directory walk error");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let rel = path.strip_prefix(root).unwrap_or(path);
        if exclude.is_match(rel) {
            continue;
        }
        if let Some(include) = &include {
            if !include.is_match(rel) {
                continue;
            }
        }
        files.push(path.to_path_buf());
    }
    Ok(files)
}

/// Extracts every file in `files` into `backend`, then resolves
/// cross-file `IMPORTS_FROM` edges. Each file's nodes and edges are
/// flushed in the two-phase batched write spec §4.3 describes; a
/// single file's `Parse`/`DuplicateId` failure is logged and does not
/// abort the run (spec §7).
pub fn index_project(
    root: &Path,
    files: &[PathBuf],
    backend: &mut dyn GraphBackend,
) -> IndexReport {
    let pool = crate::parser_pool::create_parser_pool();
    let mut coverage = Coverage::default();
    let mut parse_errors = Vec::new();
    let mut modules: HashMap<PathBuf, NodeId> = HashMap::new();

    for path in files {
        let rel = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        let outcome = index_one_file(root, &rel, path, &pool, backend, &mut modules);
        match outcome {
            ExtractionOutcome::Analyzed => coverage.analyzed += 1,
            ExtractionOutcome::Unsupported => coverage.unsupported += 1,
            ExtractionOutcome::Unreachable => coverage.unreachable += 1,
            ExtractionOutcome::ParseFailed { file, message } => {
                coverage.unsupported += 1;
                parse_errors.push((file, message));
            }
        }
    }

    resolve_cross_file_imports(backend, &modules);

    IndexReport {
        coverage,
        parse_errors,
    }
}

fn index_one_file(
    _root: &Path,
    rel: &Path,
    abs: &Path,
    pool: &ParserPool,
    backend: &mut dyn GraphBackend,
    modules: &mut HashMap<PathBuf, NodeId>,
) -> ExtractionOutcome {
    let language = Language::from_path(abs);
    let module_id = module_node_id(rel);

    if !languages::has_deep_extraction(language) {
        let module = builder::module_node(rel, language, module_id.clone());
        let _ = backend.add_nodes(vec![module]);
        modules.insert(rel.to_path_buf(), module_id);
        return ExtractionOutcome::Unsupported;
    }

    let file_type = match languages::file_type(language) {
        Some(t) => t,
        None => return ExtractionOutcome::Unsupported,
    };

    let content = match std::fs::read_to_string(abs) {
        Ok(c) => c,
        Err(err) => {
            return ExtractionOutcome::ParseFailed {
                file: abs.to_path_buf(),
                message: err.to_string(),
            }
        }
    };

    let parsed = pool.parse_blocking(ParseRequest {
        file_type,
        content: content.clone(),
        path: abs.to_path_buf(),
    });
    let tree = match parsed {
        Ok(r) => r.tree,
        Err(err) => {
            tracing::warn!(file = %abs.display(), error = %err, "parse failed");
            return ExtractionOutcome::ParseFailed {
                file: abs.to_path_buf(),
                message: err.to_string(),
            };
        }
    };

    let module = builder::module_node(rel, language, module_id.clone());

    let mut ctx = VisitCtx::new(content.as_bytes(), rel);
    ctx.scopes.push_scope("Module", true);
    visit::walk_file(&mut ctx, tree.root_node());
    ctx.scopes.pop_scope();

    let output = builder::build(rel, module, ctx.collections, ctx.ids);
    if let Err(err) = backend.add_nodes(output.nodes) {
        tracing::warn!(file = %abs.display(), error = %err, "node write dropped duplicate id(s)");
    }
    if let Err(err) = backend.add_edges(output.edges, true) {
        tracing::warn!(file = %abs.display(), error = %err, "edge write dropped signature violation(s)");
    }

    modules.insert(rel.to_path_buf(), module_id);
    ExtractionOutcome::Analyzed
}

fn module_node_id(rel: &Path) -> NodeId {
    SemanticId {
        file: rel.to_path_buf(),
        scope_path: Vec::new(),
        type_tag: "MODULE".to_string(),
        name: rel.display().to_string(),
        discriminator: None,
    }
    .to_node_id()
}

/// Normalizes `base`'s directory joined with `rel_import`, resolving
/// `..`/`.` components without touching the filesystem (candidate paths
/// may not exist for every tried extension).
fn join_relative(base: &Path, rel_import: &str) -> PathBuf {
    let dir = base.parent().unwrap_or_else(|| Path::new(""));
    let mut stack: Vec<std::ffi::OsString> = dir
        .components()
        .map(|c| c.as_os_str().to_os_string())
        .collect();
    for part in rel_import.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other.into()),
        }
    }
    stack.iter().collect()
}

/// Builder's async cross-file post-pass (spec §4.3 step 5): for every
/// `IMPORT` whose source is relative, try each extension against the
/// discovered module set and link to the matching `EXPORT` (preferred)
/// or the `MODULE` node itself.
fn resolve_cross_file_imports(backend: &mut dyn GraphBackend, modules: &HashMap<PathBuf, NodeId>) {
    let import_ids = backend.find_by_type(NodeKind::Import);
    let mut new_edges = Vec::new();

    for import_id in import_ids {
        let Some(import_node) = backend.node(&import_id) else {
            continue;
        };
        let NodePayload::Import(attrs) = &import_node.payload else {
            continue;
        };
        if !attrs.source.starts_with('.') {
            continue;
        }
        let Some(importer_file) = import_node.file.clone() else {
            continue;
        };
        let imported_name = attrs.imported_name.clone();

        let mut target_module: Option<(PathBuf, NodeId)> = None;
        for ext in RELATIVE_EXTENSIONS {
            let candidate = join_relative(&importer_file, &format!("{}{}", attrs.source, ext));
            if let Some(module_id) = modules.get(&candidate) {
                target_module = Some((candidate, module_id.clone()));
                break;
            }
        }

        let Some((target_file, module_id)) = target_module else {
            continue;
        };

        let export_target = imported_name.as_deref().and_then(|name| {
            backend
                .find_by_type(NodeKind::Export)
                .into_iter()
                .find(|id| {
                    backend.node(id).is_some_and(|n| {
                        n.name == name && n.file.as_deref() == Some(target_file.as_path())
                    })
                })
        });

        let target = export_target.unwrap_or(module_id);
        new_edges.push(GraphEdge::structural(
            grafema_core::model::EdgeId(0),
            import_id.clone(),
            target,
            EdgeKind::ImportsFrom,
        ));
    }

    if !new_edges.is_empty() {
        let _ = backend.add_edges(new_edges, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafema_core::graph::InMemoryGraph;

    #[test]
    fn join_relative_resolves_dot_and_dotdot() {
        let base = Path::new("src/services/user.ts");
        assert_eq!(join_relative(base, "./a"), PathBuf::from("src/services/a"));
        assert_eq!(join_relative(base, "../a"), PathBuf::from("src/a"));
    }

    #[test]
    fn discover_files_respects_exclude_glob() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ts"), "export const x = 1;").unwrap();
        std::fs::create_dir_all(dir.path().join("dist")).unwrap();
        std::fs::write(dir.path().join("dist/bundle.js"), "").unwrap();

        let mut config = ProjectConfig::default();
        config.exclude.push("dist/**".to_string());
        let files = discover_files(dir.path(), &config).unwrap();
        assert!(files.iter().any(|f| f.ends_with("a.ts")));
        assert!(!files.iter().any(|f| f.ends_with("bundle.js")));
    }

    #[test]
    fn index_project_creates_module_for_every_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ts"), "export const x = 1;").unwrap();
        let files = vec![dir.path().join("a.ts")];
        let mut backend = InMemoryGraph::new();
        let report = index_project(dir.path(), &files, &mut backend);
        assert_eq!(report.coverage.analyzed, 1);
        assert_eq!(backend.find_by_type(NodeKind::Module).len(), 1);
    }

    #[test]
    fn cross_file_import_resolves_to_export() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ts"), "export const x = 1;").unwrap();
        std::fs::write(dir.path().join("b.ts"), "import { x } from './a';").unwrap();
        let files = vec![dir.path().join("a.ts"), dir.path().join("b.ts")];
        let mut backend = InMemoryGraph::new();
        index_project(dir.path(), &files, &mut backend);

        let imports = backend.find_by_type(NodeKind::Import);
        assert_eq!(imports.len(), 1);
        let has_imports_from = backend
            .edges_from(&imports[0])
            .any(|e| e.kind == EdgeKind::ImportsFrom);
        assert!(has_imports_from);
    }
}
