//! Plugin contract (spec §4.4): `metadata` describes scheduling
//! constraints, `execute` does the work against a shared
//! [`PluginContext`].

use async_trait::async_trait;
use grafema_core::GrafemaError;

use crate::context::PluginContext;
use crate::phase::Phase;

#[derive(Debug, Clone, Default)]
pub struct PluginCreates {
    pub nodes: Vec<String>,
    pub edges: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PluginMetadata {
    pub name: String,
    pub phase: Phase,
    /// Higher runs first among plugins with no ordering constraint
    /// between them (spec §4.4 "break ties by descending priority").
    pub priority: i32,
    /// Names of plugins that must have run (in any phase, since phases
    /// already order themselves) before this one.
    pub dependencies: Vec<String>,
    /// Advisory, for documentation/coverage only — not enforced.
    pub creates: PluginCreates,
}

impl PluginMetadata {
    pub fn new(name: impl Into<String>, phase: Phase) -> Self {
        PluginMetadata {
            name: name.into(),
            phase,
            priority: 0,
            dependencies: Vec::new(),
            creates: PluginCreates::default(),
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }
}

/// Per-plugin run outcome. A non-empty `errors` list does not by itself
/// abort the pipeline (spec §7 "Propagation policy") — the orchestrator
/// decides based on whether any entry is one of the fatal taxonomy
/// members (`BackendUnavailable`, `CyclicDependency`, `MissingDependency`).
#[derive(Debug, Default)]
pub struct PluginResult {
    pub errors: Vec<GrafemaError>,
}

impl PluginResult {
    pub fn ok() -> Self {
        PluginResult::default()
    }

    pub fn push_error(&mut self, error: GrafemaError) {
        self.errors.push(error);
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_fatal(&self) -> bool {
        self.errors.iter().any(|e| {
            matches!(
                e,
                GrafemaError::BackendUnavailable(_)
                    | GrafemaError::CyclicDependency { .. }
                    | GrafemaError::MissingDependency { .. }
            )
        })
    }
}

#[async_trait]
pub trait Plugin: Send + Sync {
    fn metadata(&self) -> PluginMetadata;

    async fn execute(&self, ctx: &mut PluginContext<'_>) -> PluginResult;
}
