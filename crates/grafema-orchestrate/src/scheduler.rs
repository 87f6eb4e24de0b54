//! Dependency-aware scheduling within one phase (spec §4.4 "Scheduling
//! algorithm"): topological sort by `dependencies`, ties broken by
//! descending `priority`, then stable name order.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use grafema_core::GrafemaError;

use crate::phase::Phase;
use crate::plugin::Plugin;

/// Orders the plugins registered for `phase`. `all_plugins` is the full
/// cross-phase registration set, used only to check that a dependency
/// name actually refers to a configured plugin — a dependency on an
/// earlier phase's plugin is satisfied by phase ordering alone and does
/// not constrain this sort.
pub fn schedule_phase(
    phase: Phase,
    all_plugins: &[Arc<dyn Plugin>],
) -> Result<Vec<Arc<dyn Plugin>>, GrafemaError> {
    let known_names: HashSet<String> = all_plugins.iter().map(|p| p.metadata().name).collect();

    let in_phase: Vec<Arc<dyn Plugin>> = all_plugins
        .iter()
        .filter(|p| p.metadata().phase == phase)
        .cloned()
        .collect();

    for plugin in &in_phase {
        let meta = plugin.metadata();
        for dep in &meta.dependencies {
            if !known_names.contains(dep) {
                return Err(GrafemaError::MissingDependency {
                    plugin: meta.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    let in_phase_names: HashSet<String> = in_phase.iter().map(|p| p.metadata().name).collect();

    // indegree[name] = number of same-phase dependencies not yet scheduled.
    let mut indegree: HashMap<String, usize> = HashMap::new();
    let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
    for plugin in &in_phase {
        let meta = plugin.metadata();
        let same_phase_deps: Vec<String> = meta
            .dependencies
            .iter()
            .filter(|d| in_phase_names.contains(*d))
            .cloned()
            .collect();
        indegree.insert(meta.name.clone(), same_phase_deps.len());
        for dep in same_phase_deps {
            dependents.entry(dep).or_default().push(meta.name.clone());
        }
    }

    let by_name: HashMap<String, Arc<dyn Plugin>> = in_phase
        .iter()
        .map(|p| (p.metadata().name.clone(), p.clone()))
        .collect();

    let mut ordered = Vec::with_capacity(in_phase.len());
    let mut remaining: HashSet<String> = indegree.keys().cloned().collect();

    while !remaining.is_empty() {
        let mut ready: Vec<&String> = remaining
            .iter()
            .filter(|name| indegree[*name] == 0)
            .collect();

        if ready.is_empty() {
            let cycle = remaining.iter().cloned().collect::<Vec<_>>().join(" -> ");
            return Err(GrafemaError::CyclicDependency { cycle });
        }

        ready.sort_by(|a, b| {
            let pa = by_name[*a].metadata().priority;
            let pb = by_name[*b].metadata().priority;
            pb.cmp(&pa).then_with(|| a.cmp(b))
        });

        let next = ready[0].clone();
        remaining.remove(&next);
        ordered.push(by_name[&next].clone());

        if let Some(deps) = dependents.get(&next) {
            for dependent in deps {
                if let Some(count) = indegree.get_mut(dependent) {
                    *count -= 1;
                }
            }
        }
    }

    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::PluginContext;
    use crate::plugin::{PluginMetadata, PluginResult};
    use async_trait::async_trait;

    struct Named(&'static str, Phase, i32, Vec<&'static str>);

    #[async_trait]
    impl Plugin for Named {
        fn metadata(&self) -> PluginMetadata {
            PluginMetadata::new(self.0, self.1)
                .with_priority(self.2)
                .with_dependencies(self.3.iter().map(|s| s.to_string()).collect())
        }

        async fn execute(&self, _ctx: &mut PluginContext<'_>) -> PluginResult {
            PluginResult::ok()
        }
    }

    #[test]
    fn orders_by_dependency_then_priority() {
        let plugins: Vec<Arc<dyn Plugin>> = vec![
            Arc::new(Named("b", Phase::Indexing, 0, vec!["a"])),
            Arc::new(Named("a", Phase::Indexing, 0, vec![])),
            Arc::new(Named("c", Phase::Indexing, 10, vec![])),
        ];
        let ordered = schedule_phase(Phase::Indexing, &plugins).unwrap();
        let names: Vec<String> = ordered.iter().map(|p| p.metadata().name).collect();
        assert_eq!(names[0], "c");
        assert!(names.iter().position(|n| n == "a").unwrap() < names.iter().position(|n| n == "b").unwrap());
    }

    #[test]
    fn missing_dependency_is_fatal() {
        let plugins: Vec<Arc<dyn Plugin>> =
            vec![Arc::new(Named("a", Phase::Indexing, 0, vec!["ghost"]))];
        let err = schedule_phase(Phase::Indexing, &plugins).unwrap_err();
        assert!(matches!(err, GrafemaError::MissingDependency { .. }));
    }

    #[test]
    fn cycle_is_fatal() {
        let plugins: Vec<Arc<dyn Plugin>> = vec![
            Arc::new(Named("a", Phase::Indexing, 0, vec!["b"])),
            Arc::new(Named("b", Phase::Indexing, 0, vec!["a"])),
        ];
        let err = schedule_phase(Phase::Indexing, &plugins).unwrap_err();
        assert!(matches!(err, GrafemaError::CyclicDependency { .. }));
    }
}
