//! Graph cache (spec.md §1 Non-goals: "real-time incremental re-analysis
//! ... delta support is an optimization layer"; SPEC_FULL's "Graph cache"
//! supplement). `.grafema/cache.json` records a content fingerprint per
//! analyzed file plus the serialized node/edge batch it produced, so a
//! re-run can skip re-extracting files whose fingerprint is unchanged.
//! This is an optimization only: a full run with the cache deleted always
//! reproduces the same graph (P1).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::{GraphEdge, GraphNode};

pub const CACHE_DIR: &str = ".grafema";
pub const GRAPH_CACHE: &str = "cache.json";

pub fn cache_dir(root: &Path) -> PathBuf {
    root.join(CACHE_DIR)
}

pub fn graph_cache_path(root: &Path) -> PathBuf {
    cache_dir(root).join(GRAPH_CACHE)
}

pub fn ensure_cache_dir(root: &Path) -> std::io::Result<()> {
    let dir = cache_dir(root);
    if !dir.exists() {
        std::fs::create_dir_all(&dir)?;
    }
    Ok(())
}

/// One analyzed file's fingerprint plus the nodes/edges it produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedFile {
    pub fingerprint: u64,
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphCache {
    pub version: String,
    pub files: HashMap<String, CachedFile>,
}

impl GraphCache {
    pub fn new() -> Self {
        GraphCache {
            version: env!("CARGO_PKG_VERSION").to_string(),
            files: HashMap::new(),
        }
    }

    pub fn is_current(&self, file: &str, fingerprint: u64) -> bool {
        self.files
            .get(file)
            .is_some_and(|c| c.fingerprint == fingerprint)
    }

    pub fn insert(
        &mut self,
        file: String,
        fingerprint: u64,
        nodes: Vec<GraphNode>,
        edges: Vec<GraphEdge>,
    ) {
        self.files.insert(
            file,
            CachedFile {
                fingerprint,
                nodes,
                edges,
            },
        );
    }
}

impl Default for GraphCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Fingerprint a file's bytes (FNV-1a — only needs to detect change, not
/// resist adversarial collision).
pub fn fingerprint(content: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &byte in content {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

pub fn save(cache: &GraphCache, root: &Path) -> anyhow::Result<()> {
    ensure_cache_dir(root)?;
    let path = graph_cache_path(root);
    let json = serde_json::to_string_pretty(cache)?;
    std::fs::write(&path, json)?;
    tracing::debug!(path = %path.display(), files = cache.files.len(), "graph cache saved");
    Ok(())
}

pub fn load(root: &Path) -> anyhow::Result<Option<GraphCache>> {
    let path = graph_cache_path(root);
    if !path.exists() {
        return Ok(None);
    }
    let json = std::fs::read_to_string(&path)?;
    let cache: GraphCache = serde_json::from_str(&json)?;
    tracing::debug!(path = %path.display(), files = cache.files.len(), "graph cache loaded");
    Ok(Some(cache))
}

pub fn clear(root: &Path) -> std::io::Result<()> {
    let dir = cache_dir(root);
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_changes_with_content() {
        assert_ne!(fingerprint(b"a"), fingerprint(b"b"));
        assert_eq!(fingerprint(b"same"), fingerprint(b"same"));
    }

    #[test]
    fn cache_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = GraphCache::new();
        cache.insert("a.ts".to_string(), 42, vec![], vec![]);
        save(&cache, dir.path()).unwrap();

        let loaded = load(dir.path()).unwrap().unwrap();
        assert!(loaded.is_current("a.ts", 42));
        assert!(!loaded.is_current("a.ts", 43));
    }
}
