//! Singleton registry for `NET_SINGLETON`, `EXTERNAL_MODULE`, and
//! `grafema:plugin` nodes (spec I5/P4: "Exactly one node per distinct
//! singleton key across the whole build, regardless of how many files
//! reference it").
//!
//! Visitors call [`SingletonRegistry::get_or_create`] with a stable key
//! (`"net:stdio"`, `"net:request"`, an external module's source string,
//! a plugin's name) instead of emitting the node themselves; the
//! registry hands back the existing [`NodeId`] on every call after the
//! first, so two files requiring the same package don't produce two
//! `EXTERNAL_MODULE` nodes.

use dashmap::DashMap;

use crate::ident::NodeId;
use crate::model::{GraphNode, NodePayload};

pub struct SingletonRegistry {
    known: DashMap<String, NodeId>,
}

impl SingletonRegistry {
    pub fn new() -> Self {
        SingletonRegistry {
            known: DashMap::new(),
        }
    }

    /// Returns `Some(node)` the first time `key` is seen (caller must
    /// persist it), `None` on every subsequent call for the same key.
    pub fn get_or_create(&self, key: &str, make: impl FnOnce() -> (NodeId, NodePayload, String)) -> Option<GraphNode> {
        if self.known.contains_key(key) {
            return None;
        }
        let (id, payload, name) = make();
        self.known.insert(key.to_string(), id.clone());
        Some(GraphNode {
            id,
            name,
            file: None,
            line: None,
            column: None,
            payload,
        })
    }

    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.known.get(key).map(|r| r.value().clone())
    }
}

impl Default for SingletonRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub const STDIO_KEY: &str = "net:stdio";
pub const REQUEST_KEY: &str = "net:request";

pub fn external_module_key(source: &str) -> String {
    format!("EXTERNAL_MODULE:{source}")
}

pub fn plugin_key(name: &str) -> String {
    format!("grafema:plugin:{name}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SingletonAttrs;

    #[test]
    fn second_request_for_same_key_yields_none() {
        let reg = SingletonRegistry::new();
        let first = reg.get_or_create(STDIO_KEY, || {
            (
                NodeId::from_raw("net:stdio"),
                NodePayload::NetSingleton(SingletonAttrs {
                    sub_kind: "stdio".to_string(),
                }),
                "stdio".to_string(),
            )
        });
        assert!(first.is_some());

        let second = reg.get_or_create(STDIO_KEY, || {
            panic!("must not be called once the key is known")
        });
        assert!(second.is_none());
        assert_eq!(reg.lookup(STDIO_KEY), Some(NodeId::from_raw("net:stdio")));
    }

    #[test]
    fn distinct_external_modules_get_distinct_keys() {
        assert_ne!(
            external_module_key("react"),
            external_module_key("express")
        );
    }
}
