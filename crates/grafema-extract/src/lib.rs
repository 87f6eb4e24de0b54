//! AST → graph extraction pipeline (spec §4.2/§4.3): the visitor
//! framework, collection buffers, the buffered `GraphBuilder`, and the
//! per-project coordinator that ties file discovery, tree-sitter
//! parsing, and the cross-file import-resolution post-pass together.

pub mod builder;
pub mod collections;
pub mod config;
pub mod coordinator;
pub mod extractor;
pub mod languages;
pub mod parser_pool;
pub mod visit;

#[cfg(test)]
mod tests;
