//! Per-file extraction outcome, used by [`crate::coordinator`] to build
//! `getCoverage`'s `{analyzed, unsupported, unreachable}` counts (spec
//! §6) without re-deriving them from the graph afterwards.

use std::path::PathBuf;

/// What happened when the coordinator tried to extract one file.
#[derive(Debug, Clone)]
pub enum ExtractionOutcome {
    /// Deeply extracted by the visitor framework (spec §4.2).
    Analyzed,
    /// No visitor set for this language — a `MODULE` node was still
    /// created, but no functions/classes/calls/etc.
    Unsupported,
    /// Excluded by `include`/`exclude` globs or `.gitignore`, never read.
    Unreachable,
    /// Matched a deeply-extracted language but the parser rejected it
    /// (`ErrorKind::Parse`, spec §7) — counted as unsupported for
    /// coverage purposes, logged separately for diagnostics.
    ParseFailed { file: PathBuf, message: String },
}

impl ExtractionOutcome {
    pub fn is_analyzed(&self) -> bool {
        matches!(self, ExtractionOutcome::Analyzed)
    }
}
