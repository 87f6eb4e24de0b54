//! Top-level driver: registers plugins, schedules each phase in order,
//! and runs plugins sequentially within a phase (spec §4.4 "Execution
//! model" — per-file work inside a plugin may parallelize, but all of a
//! plugin's writes land before the next plugin starts).

use std::sync::Arc;

use grafema_core::backend::GraphBackend;
use grafema_core::GrafemaError;

use crate::context::{CancelToken, PluginContext, ProgressCallback};
use crate::phase::{Phase, ALL_PHASES};
use crate::plugin::Plugin;
use crate::scheduler::schedule_phase;
use crate::singleton;

#[derive(Debug, Default)]
pub struct RunReport {
    pub phases_run: Vec<Phase>,
    pub errors: Vec<GrafemaError>,
    /// Set when a fatal error aborted the run before every phase ran.
    pub aborted: bool,
}

pub struct Orchestrator {
    plugins: Vec<Arc<dyn Plugin>>,
    cancel: CancelToken,
    progress: Option<ProgressCallback>,
}

impl Orchestrator {
    pub fn new() -> Self {
        Orchestrator {
            plugins: Vec::new(),
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    pub fn register(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs every phase in order against `backend`, rooted at `root`.
    /// Stops immediately (without running later phases) on the first
    /// fatal error; non-fatal plugin errors accumulate into the report
    /// and subsequent plugins still run (spec §7 "Propagation policy").
    pub async fn run(&self, backend: &mut dyn GraphBackend, root: &std::path::Path) -> RunReport {
        let mut report = RunReport::default();

        if let Err(err) = singleton::ensure_plugin_singletons(backend, &self.plugins) {
            report.errors.push(err);
            report.aborted = true;
            return report;
        }

        for phase in ALL_PHASES {
            if self.cancel.is_cancelled() {
                break;
            }

            let ordered = match schedule_phase(phase, &self.plugins) {
                Ok(ordered) => ordered,
                Err(err) => {
                    tracing::error!(phase = %phase, error = %err, "scheduling failed");
                    report.errors.push(err);
                    report.aborted = true;
                    return report;
                }
            };

            for plugin in &ordered {
                if self.cancel.is_cancelled() {
                    break;
                }
                let meta = plugin.metadata();
                let mut ctx = PluginContext::new(backend, root.to_path_buf());
                ctx = ctx.with_cancel(self.cancel.clone());
                if let Some(cb) = &self.progress {
                    ctx = ctx.with_progress(cb.clone());
                }
                ctx.report(phase, &meta.name, "starting");

                let result = plugin.execute(&mut ctx).await;
                let fatal = result.has_fatal();
                report.errors.extend(result.errors);

                if fatal {
                    tracing::error!(phase = %phase, plugin = %meta.name, "fatal plugin error, aborting run");
                    report.aborted = true;
                    return report;
                }
            }

            report.phases_run.push(phase);
        }

        report
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{PluginMetadata, PluginResult};
    use async_trait::async_trait;
    use grafema_core::graph::InMemoryGraph;
    use grafema_core::model::NodeKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        name: &'static str,
        phase: Phase,
        counter: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Plugin for Counting {
        fn metadata(&self) -> PluginMetadata {
            PluginMetadata::new(self.name, self.phase)
        }

        async fn execute(&self, _ctx: &mut PluginContext<'_>) -> PluginResult {
            self.counter.fetch_add(1, Ordering::SeqCst);
            PluginResult::ok()
        }
    }

    #[tokio::test]
    async fn runs_every_phase_and_creates_plugin_singletons() {
        let counter = Arc::new(AtomicUsize::new(0));
        let orchestrator = Orchestrator::new().register(Arc::new(Counting {
            name: "indexer",
            phase: Phase::Indexing,
            counter: counter.clone(),
        }));

        let mut backend = InMemoryGraph::new();
        let report = orchestrator.run(&mut backend, std::path::Path::new(".")).await;

        assert!(!report.aborted);
        assert_eq!(report.phases_run.len(), 5);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(backend.find_by_type(NodeKind::Plugin).len(), 1);
    }

    struct Failing;

    #[async_trait]
    impl Plugin for Failing {
        fn metadata(&self) -> PluginMetadata {
            PluginMetadata::new("broken", Phase::Indexing)
        }

        async fn execute(&self, _ctx: &mut PluginContext<'_>) -> PluginResult {
            let mut result = PluginResult::ok();
            result.push_error(GrafemaError::BackendUnavailable("disk full".to_string()));
            result
        }
    }

    #[tokio::test]
    async fn fatal_error_aborts_remaining_phases() {
        let orchestrator = Orchestrator::new().register(Arc::new(Failing));
        let mut backend = InMemoryGraph::new();
        let report = orchestrator.run(&mut backend, std::path::Path::new(".")).await;
        assert!(report.aborted);
        assert!(!report.phases_run.contains(&Phase::Validation));
    }
}
