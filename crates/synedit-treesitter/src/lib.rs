#![warn(missing_docs)]
//! `synedit-treesitter` - Tree-sitter language layers for `synedit-core`.
//!
//! This crate provides [`TreeSitterLanguageMode`], a [`synedit_core::LanguageMode`] that keeps
//! incremental syntax trees for a document and for every language injected into it, and the
//! pieces built on top of those trees:
//!
//! - highlight captures, filtered by text predicates and sorted for application
//! - line highlighting, synchronously or on a cancellable background queue
//! - line-break indentation and indent-strategy detection
//!
//! The parser reads the buffer as UTF-16LE, so tree-sitter byte offsets are
//! [`synedit_core::ByteCount`] values.
//!
//! ```rust,ignore
//! let rust = TreeSitterLanguage::new("rust", tree_sitter_rust::LANGUAGE.into(), HIGHLIGHTS)?;
//! let mode = TreeSitterLanguageMode::new(Arc::new(rust), None);
//! let document = Document::new(source, DocumentConfig::default())
//!     .with_language_mode(Box::new(mode));
//! ```

mod capture;
mod error;
mod highlight_queue;
mod highlighter;
mod indent;
mod injection;
mod input;
mod language;
mod language_mode;
mod layer;
mod predicates;

pub use capture::{Capture, compare_captures, sort_captures};
pub use error::TreeSitterError;
pub use highlight_queue::{HighlightOutcome, HighlightQueue, HighlightTask};
pub use highlighter::{CaptureSource, HighlightToken, LineInput, SyntaxHighlighter};
pub use indent::{TreeSitterIndentController, TreeSitterIndentStrategyDetector};
pub use injection::{InjectedLanguage, InjectionSiteId};
pub use language::{
    LanguageProvider, LanguageQuery, LanguageRegistry, TreeSitterIndentationScopes,
    TreeSitterLanguage,
};
pub use language_mode::{ParseHandle, TreeSitterLanguageMode};
pub use layer::{LayerId, LayerTree, SyntaxSnapshot};
pub use predicates::{TextPredicate, TextPredicatesEvaluator};
