//! Error taxonomy for the query/guarantee layer. Export/import/drift touch
//! the filesystem and YAML directly (unlike the orchestrator-driven
//! crates, where `anyhow` stays at the binary boundary) so this crate
//! gets its own `thiserror` enum wrapping those failure modes alongside
//! the closed taxonomy's `Timeout`/`Validation` members.

use thiserror::Error;

use crate::datalog::DatalogError;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("datalog error: {0}")]
    Datalog(#[from] DatalogError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),
    #[error("{0}")]
    Validation(String),
    #[error("guarantee `{0}` not found")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, QueryError>;
