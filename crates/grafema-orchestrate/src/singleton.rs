//! `grafema:plugin` singleton creation at startup (spec §4.4), so the
//! pipeline's own shape is queryable through the graph like any other
//! entity.

use std::sync::Arc;

use grafema_core::backend::GraphBackend;
use grafema_core::ident::NodeId;
use grafema_core::model::{GraphNode, NodePayload, PluginAttrs};
use grafema_core::singletons::plugin_key;
use grafema_core::GrafemaError;

use crate::plugin::Plugin;

/// Idempotent: running twice over the same plugin set leaves exactly one
/// `grafema:plugin` node per plugin (spec P4-style singleton idempotence).
pub fn ensure_plugin_singletons(
    backend: &mut dyn GraphBackend,
    plugins: &[Arc<dyn Plugin>],
) -> Result<(), GrafemaError> {
    let mut nodes = Vec::new();
    for plugin in plugins {
        let meta = plugin.metadata();
        let id = NodeId::from_raw(plugin_key(&meta.name));
        if backend.node_exists(&id) {
            continue;
        }
        nodes.push(GraphNode {
            id,
            name: meta.name.clone(),
            file: None,
            line: None,
            column: None,
            payload: NodePayload::Plugin(PluginAttrs {
                phase: meta.phase.to_string(),
                version: None,
            }),
        });
    }
    if nodes.is_empty() {
        return Ok(());
    }
    backend.add_nodes(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PluginContext;
    use crate::phase::Phase;
    use crate::plugin::{PluginMetadata, PluginResult};
    use async_trait::async_trait;
    use grafema_core::graph::InMemoryGraph;
    use grafema_core::model::NodeKind;

    struct Dummy;

    #[async_trait]
    impl Plugin for Dummy {
        fn metadata(&self) -> PluginMetadata {
            PluginMetadata::new("dummy", Phase::Indexing)
        }

        async fn execute(&self, _ctx: &mut PluginContext<'_>) -> PluginResult {
            PluginResult::ok()
        }
    }

    #[test]
    fn running_twice_creates_one_node() {
        let mut backend = InMemoryGraph::new();
        let plugins: Vec<Arc<dyn Plugin>> = vec![Arc::new(Dummy)];
        ensure_plugin_singletons(&mut backend, &plugins).unwrap();
        ensure_plugin_singletons(&mut backend, &plugins).unwrap();
        assert_eq!(backend.find_by_type(NodeKind::Plugin).len(), 1);
    }
}
