//! `.grafema/config.{yaml,json}` (spec §6). Loaded once per run and
//! threaded through the coordinator (`include`/`exclude` globs, which
//! plugins to run) and the orchestrator (phase plugin lists).

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

pub const CONFIG_DIR: &str = ".grafema";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PluginLists {
    #[serde(default)]
    pub indexing: Vec<String>,
    #[serde(default)]
    pub analysis: Vec<String>,
    #[serde(default)]
    pub enrichment: Vec<String>,
    #[serde(default)]
    pub validation: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DiscoveryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub custom_only: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisConfig {
    pub service: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Local,
    Rfdb,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub roots: Vec<PathBuf>,
}

/// Mirrors every key enumerated in spec §6's "Project config" table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectConfig {
    #[serde(default)]
    pub plugins: PluginLists,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub backend: Backend,
    pub rfdb_socket: Option<String>,
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    #[serde(default = "default_version")]
    pub version: u32,
}

fn default_version() -> u32 {
    1
}

impl ProjectConfig {
    /// Looks for `<root>/.grafema/config.yaml` then `.json`; a missing
    /// directory or file yields defaults rather than an error — analysis
    /// always yields a graph, even for an unconfigured tree (spec §7
    /// "User-visible failure behavior").
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let dir = root.join(CONFIG_DIR);
        let yaml_path = dir.join("config.yaml");
        let json_path = dir.join("config.json");

        if yaml_path.exists() {
            let text = std::fs::read_to_string(&yaml_path)?;
            return Ok(serde_yaml::from_str(&text)?);
        }
        if json_path.exists() {
            let text = std::fs::read_to_string(&json_path)?;
            return Ok(serde_json::from_str(&text)?);
        }

        // `.env` may override backend connection info without requiring
        // a full config file (spec.md's rfdb_socket key).
        let mut config = ProjectConfig::default();
        if let Ok(iter) = dotenvy::from_path_iter(root.join(".env")) {
            for item in iter.flatten() {
                if item.0 == "GRAFEMA_RFDB_SOCKET" {
                    config.rfdb_socket = Some(item.1);
                }
            }
        }
        Ok(config)
    }

    /// Compiled `include`/`exclude` globs for the discovery phase. An
    /// empty `include` set matches everything (no allowlist configured).
    pub fn globs(&self) -> anyhow::Result<(Option<GlobSet>, GlobSet)> {
        let include = if self.include.is_empty() {
            None
        } else {
            Some(build_globset(&self.include)?)
        };
        let exclude = build_globset(&self.exclude)?;
        Ok((include, exclude))
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_local_backend_and_schema_version_1() {
        let config = ProjectConfig::default();
        assert_eq!(config.backend, Backend::Local);
        assert_eq!(config.version, 1);
    }

    #[test]
    fn missing_config_dir_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProjectConfig::load(dir.path()).unwrap();
        assert_eq!(config.backend, Backend::Local);
    }

    #[test]
    fn yaml_config_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(CONFIG_DIR)).unwrap();
        std::fs::write(
            dir.path().join(CONFIG_DIR).join("config.yaml"),
            "backend: rfdb\nrfdb_socket: /tmp/rfdb.sock\ninclude:\n  - \"src/**\"\n",
        )
        .unwrap();
        let config = ProjectConfig::load(dir.path()).unwrap();
        assert_eq!(config.backend, Backend::Rfdb);
        assert_eq!(config.rfdb_socket.as_deref(), Some("/tmp/rfdb.sock"));
        assert_eq!(config.include, vec!["src/**".to_string()]);
    }
}
