//! Plugin orchestration layer (spec §4.4): ordered phase scheduling,
//! dependency-aware topological sort within a phase, progress reporting,
//! cooperative cancellation, and per-plugin failure isolation.

pub mod context;
pub mod orchestrator;
pub mod phase;
pub mod plugin;
pub mod scheduler;
pub mod singleton;

pub use context::{CancelToken, PluginContext, ProgressCallback, ProgressEvent};
pub use orchestrator::{Orchestrator, RunReport};
pub use phase::{Phase, ALL_PHASES};
pub use plugin::{Plugin, PluginCreates, PluginMetadata, PluginResult};
