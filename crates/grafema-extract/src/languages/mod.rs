//! Per-language extraction depth (spec §1: "predominantly JavaScript/
//! TypeScript, with hooks for other languages"). The visitor framework
//! in `crate::visit` matches JS/TS-shaped tree-sitter node kinds
//! (`function_declaration`, `class_declaration`, …) and is the only
//! deep extractor; every other [`grafema_core::model::Language`] gets a
//! `MODULE` node only — a "hook" a future visitor set can fill in
//! without changing the coordinator's discovery/coverage bookkeeping.

use grafema_core::model::Language;

use crate::parser_pool::FileType;

/// Whether `crate::visit`'s visitor set understands this language's
/// syntax. Drives both the coordinator's dispatch and `getCoverage`'s
/// `analyzed` vs `unsupported` split (spec §6).
pub fn has_deep_extraction(language: Language) -> bool {
    matches!(language, Language::JavaScript | Language::TypeScript)
}

/// Maps a deeply-extracted language to the [`FileType`] the parser pool
/// needs to pick a tree-sitter grammar. `None` for languages without a
/// visitor set (callers never need a parse tree for those).
pub fn file_type(language: Language) -> Option<FileType> {
    match language {
        Language::JavaScript => Some(FileType::JavaScript),
        Language::TypeScript => Some(FileType::TypeScript),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_js_and_ts_get_deep_extraction() {
        assert!(has_deep_extraction(Language::JavaScript));
        assert!(has_deep_extraction(Language::TypeScript));
        assert!(!has_deep_extraction(Language::Python));
        assert!(!has_deep_extraction(Language::Rust));
    }
}
