//! Cross-file symbol table (spec §4.3 step 3, "cross-file import
//! resolution and class lookups"). Populated incrementally as each file
//! is visited, then read by the `GraphBuilder`'s async post-passes and by
//! enrichment plugins (`MethodCallResolver`, `InstanceOfResolver`) that
//! need to resolve a name against another file's exports.

use dashmap::DashMap;

use crate::ident::NodeId;

pub struct SymbolTable {
    symbols: DashMap<String, NodeId>,
    /// file path -> qualified names declared in that file.
    file_symbols: DashMap<String, Vec<String>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            symbols: DashMap::new(),
            file_symbols: DashMap::new(),
        }
    }

    pub fn insert(&self, qualified_name: String, node_id: NodeId, file_path: String) {
        self.symbols.insert(qualified_name.clone(), node_id);
        self.file_symbols
            .entry(file_path)
            .or_default()
            .push(qualified_name);
    }

    pub fn lookup(&self, qualified_name: &str) -> Option<NodeId> {
        self.symbols.get(qualified_name).map(|r| r.value().clone())
    }

    pub fn symbols_in_file(&self, file_path: &str) -> Vec<NodeId> {
        self.file_symbols
            .get(file_path)
            .map(|r| {
                r.value()
                    .iter()
                    .filter_map(|name| self.symbols.get(name).map(|n| n.value().clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drop every symbol declared in `file_path` — used when a file is
    /// re-extracted within the same run (e.g. after a cache miss).
    pub fn remove_file(&self, file_path: &str) {
        if let Some((_, symbols)) = self.file_symbols.remove(file_path) {
            for name in symbols {
                self.symbols.remove(&name);
            }
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_round_trips_through_file_index() {
        let table = SymbolTable::new();
        table.insert(
            "a.ts::Foo".to_string(),
            NodeId::from_raw("CLASS#Foo#a.ts"),
            "a.ts".to_string(),
        );
        assert_eq!(
            table.lookup("a.ts::Foo"),
            Some(NodeId::from_raw("CLASS#Foo#a.ts"))
        );
        assert_eq!(table.symbols_in_file("a.ts").len(), 1);
    }

    #[test]
    fn remove_file_drops_its_symbols() {
        let table = SymbolTable::new();
        table.insert(
            "a.ts::Foo".to_string(),
            NodeId::from_raw("CLASS#Foo#a.ts"),
            "a.ts".to_string(),
        );
        table.remove_file("a.ts");
        assert_eq!(table.lookup("a.ts::Foo"), None);
    }
}
