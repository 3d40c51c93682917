#![warn(missing_docs)]
//! Synedit Core - text buffer and line bookkeeping for syntax-aware editors
//!
//! # Overview
//!
//! `synedit-core` keeps a document's text, its lines and its undo history, and hands every
//! edit to a pluggable [`LanguageMode`] in the coordinates a parser expects. It does not parse
//! or render anything itself; `synedit-treesitter` provides a tree-sitter language mode and
//! syntax highlighter on top of it.
//!
//! # Coordinates
//!
//! - Buffer offsets and columns are UTF-16 code units.
//! - Parser offsets are [`ByteCount`]s: UTF-16 code units × 2, matching a parser fed
//!   UTF-16LE text.
//! - Rows are zero-based.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Document (replace_text, undo/redo)         │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  LanguageMode (parser seam)                 │  ← Syntax
//! ├─────────────────────────────────────────────┤
//! │  LineManager (red-black line tree)          │  ← Line Access
//! ├─────────────────────────────────────────────┤
//! │  StringView (rope, UTF-16 offsets)          │  ← Text Storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use synedit_core::{Document, DocumentConfig, TextRange};
//!
//! let mut document = Document::new("fn main() {\n}\n", DocumentConfig::default());
//! assert_eq!(document.line_manager().line_count(), 3);
//!
//! let replacement = document
//!     .replace_text(TextRange::new(11, 0), "\n    body();")
//!     .unwrap();
//! assert!(replacement.did_add_or_remove_lines);
//! assert_eq!(document.line_manager().line_count(), 4);
//!
//! document.undo().unwrap();
//! assert_eq!(document.text(), "fn main() {\n}\n");
//! ```
//!
//! # Module Description
//!
//! - [`byte`] - parser byte counts and ranges
//! - [`string_view`] - rope-backed text buffer
//! - [`line_manager`] - offset ↔ row mapping over a red-black tree
//! - [`line_change_set`] - lines touched by an edit
//! - [`text_edit`] - edit descriptor handed to the parser
//! - [`language_mode`] - parser seam
//! - [`document`] - the editable document
//! - [`line_ending`], [`indent`] - detection helpers
//! - [`theme`], [`styled_text`] - highlight styling

pub mod byte;
pub mod document;
mod error;
pub mod indent;
pub mod language_mode;
pub mod line_change_set;
pub mod line_ending;
pub mod line_manager;
mod line_tree;
pub mod string_view;
pub mod styled_text;
pub mod text_edit;
pub mod theme;
mod undo;

pub use byte::{ByteCount, ByteRange, TextRange};
pub use document::{Document, DocumentConfig, TextReplacement};
pub use error::CoreError;
pub use indent::{
    DetectedIndentStrategy, IndentLevelMeasurer, IndentStrategy, InsertLineBreakIndentStrategy,
};
pub use language_mode::{LanguageMode, PlainTextLanguageMode, SyntaxNode};
pub use line_change_set::LineChangeSet;
pub use line_ending::{LineEnding, LineEndingDetector};
pub use line_manager::{DEFAULT_ESTIMATED_LINE_HEIGHT, Line, LineIter, LineManager};
pub use line_tree::LineId;
pub use string_view::StringView;
pub use styled_text::{StyledRun, StyledText, TextAttributes};
pub use text_edit::{LinePosition, TextEdit};
pub use theme::{Color, Font, FontTraits, HighlightStyle, Shadow, SimpleTheme, Theme};
