#![warn(missing_docs)]
//! `synedit-rules` - regex rule grammars for `synedit`.
//!
//! This crate tokenizes languages that have no tree-sitter parser using a small TextMate-like
//! rule grammar, plus a helper for highlighting a `synedit_core::Document` with it.

pub mod rules;

mod highlighter;

pub use highlighter::RulesHighlighter;
pub use rules::*;
