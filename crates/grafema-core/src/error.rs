//! Closed error taxonomy (spec §7). No language-level exception names —
//! every fallible operation in the core returns one of these variants.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::{EdgeKind, NodeKind};
use crate::model::Severity;

#[derive(Debug, Error)]
pub enum GrafemaError {
    /// Source file could not be parsed. Per-file, non-fatal: caught and
    /// logged by the visitor framework, never propagated past a plugin.
    #[error("failed to parse {file}: {message}")]
    Parse { file: PathBuf, message: String },

    /// Two nodes computed the same id on write. Fatal within the file
    /// that produced them, non-fatal for the pipeline as a whole.
    #[error("duplicate node id {id}")]
    DuplicateId { id: String },

    /// An edge's endpoints don't match its declared kind signature (I4).
    #[error("edge kind {kind:?} cannot connect {source_kind:?} -> {target_kind:?}")]
    UnknownTargetType {
        kind: EdgeKind,
        source_kind: NodeKind,
        target_kind: NodeKind,
    },

    /// A plugin declared a dependency absent from the configured set.
    #[error("plugin {plugin} depends on missing plugin {dependency}")]
    MissingDependency { plugin: String, dependency: String },

    /// A cycle was found among plugin dependencies within a phase.
    #[error("cyclic plugin dependency: {cycle}")]
    CyclicDependency { cycle: String },

    /// The graph backend is unreachable or failed irrecoverably.
    #[error("graph backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A query or validation exceeded its time budget.
    #[error("operation timed out after {budget_ms}ms")]
    Timeout { budget_ms: u64 },

    /// An invariant failure surfaced by a validator.
    #[error("[{phase}/{plugin}] {code} at {file_path}:{line_number}: {message}")]
    Validation {
        severity: Severity,
        code: String,
        file_path: PathBuf,
        line_number: u32,
        phase: String,
        plugin: String,
        message: String,
        remediation: Option<String>,
    },
}

pub type Result<T> = std::result::Result<T, GrafemaError>;
