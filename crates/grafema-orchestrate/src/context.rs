//! Shared execution context passed to every plugin (spec §4.4
//! "Progress & cancellation"): the backend handle, a cooperative cancel
//! token, and a thread-safe progress callback.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use grafema_core::backend::GraphBackend;

use crate::phase::Phase;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub current_plugin: String,
    pub message: String,
    pub total_files: usize,
    pub processed_files: usize,
}

pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Single cooperative cancellation flag, checked at file boundaries and
/// before every batched flush (spec §5). Cheap to clone — every clone
/// shares the same underlying flag.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything a [`crate::plugin::Plugin`] needs: a mutable handle to the
/// exclusive-writer backend (spec §3 "Ownership"), the project root, and
/// the progress/cancellation plumbing. Plugins never hold the backend
/// across `.await` points longer than their own `execute` call — the
/// orchestrator runs plugins strictly sequentially within a phase so this
/// single `&mut` is always exclusive.
pub struct PluginContext<'a> {
    pub backend: &'a mut dyn GraphBackend,
    pub root: PathBuf,
    pub cancel: CancelToken,
    progress: Option<ProgressCallback>,
    pub total_files: usize,
    pub processed_files: usize,
}

impl<'a> PluginContext<'a> {
    pub fn new(backend: &'a mut dyn GraphBackend, root: impl Into<PathBuf>) -> Self {
        PluginContext {
            backend,
            root: root.into(),
            cancel: CancelToken::new(),
            progress: None,
            total_files: 0,
            processed_files: 0,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn report(&self, phase: Phase, current_plugin: &str, message: impl Into<String>) {
        if let Some(cb) = &self.progress {
            cb(ProgressEvent {
                phase,
                current_plugin: current_plugin.to_string(),
                message: message.into(),
                total_files: self.total_files,
                processed_files: self.processed_files,
            });
        }
    }
}
