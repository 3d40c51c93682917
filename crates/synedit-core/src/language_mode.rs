//! The seam between the document and its syntax layer.
//!
//! [`Document`](crate::Document) forwards every text change to a [`LanguageMode`] and unions
//! the lines it reports with the lines the line manager touched. Implementations live in other
//! crates (for example the tree-sitter language mode); [`PlainTextLanguageMode`] is the
//! no-syntax fallback.

use crate::indent::{
    DetectedIndentStrategy, IndentLevelMeasurer, IndentStrategy, InsertLineBreakIndentStrategy,
};
use crate::line_change_set::LineChangeSet;
use crate::line_manager::{Line, LineManager};
use crate::string_view::StringView;
use crate::text_edit::{LinePosition, TextEdit};

/// A node of the syntax tree, as exposed to callers that do not know about the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxNode {
    /// Grammar node kind, e.g. `"function_item"`.
    pub kind: String,
    /// Start position.
    pub start: LinePosition,
    /// End position.
    pub end: LinePosition,
}

/// Syntax support for a document.
///
/// All methods run on the thread that owns the document. Implementations may offload work
/// internally but must have applied an edit to every tree they own before
/// [`apply_edit`](LanguageMode::apply_edit) returns.
pub trait LanguageMode: Send {
    /// Parse the whole text from scratch.
    fn parse(&mut self, text: &StringView);

    /// Apply one edit and report the lines whose syntax changed.
    ///
    /// `text` and `lines` already reflect the edit.
    fn apply_edit(
        &mut self,
        edit: &TextEdit,
        text: &StringView,
        lines: &LineManager,
    ) -> LineChangeSet;

    /// Whether syntax information is available yet.
    fn can_highlight(&self) -> bool;

    /// Indent level of `line`.
    fn current_indent_level(&self, text: &StringView, line: &Line, strategy: IndentStrategy) -> usize {
        IndentLevelMeasurer::new(text).indent_level(line, strategy.tab_length())
    }

    /// How to indent a line break inserted over the range `start..end`.
    fn strategy_for_inserting_line_break(
        &self,
        text: &StringView,
        lines: &LineManager,
        start: LinePosition,
        end: LinePosition,
        strategy: IndentStrategy,
    ) -> InsertLineBreakIndentStrategy;

    /// The innermost syntax node at `position`.
    fn syntax_node_at(&self, position: LinePosition) -> Option<SyntaxNode>;

    /// Guess the indentation used by the document.
    fn detect_indent_strategy(&self, text: &StringView, lines: &LineManager)
    -> DetectedIndentStrategy;
}

/// Language mode for documents without syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextLanguageMode;

impl LanguageMode for PlainTextLanguageMode {
    fn parse(&mut self, _text: &StringView) {}

    fn apply_edit(
        &mut self,
        _edit: &TextEdit,
        _text: &StringView,
        _lines: &LineManager,
    ) -> LineChangeSet {
        LineChangeSet::new()
    }

    fn can_highlight(&self) -> bool {
        false
    }

    fn strategy_for_inserting_line_break(
        &self,
        text: &StringView,
        lines: &LineManager,
        start: LinePosition,
        _end: LinePosition,
        strategy: IndentStrategy,
    ) -> InsertLineBreakIndentStrategy {
        let indent_level = lines
            .line_at_row(start.row)
            .map(|line| self.current_indent_level(text, &line, strategy))
            .unwrap_or(0);
        InsertLineBreakIndentStrategy::new(indent_level, false)
    }

    fn syntax_node_at(&self, _position: LinePosition) -> Option<SyntaxNode> {
        None
    }

    fn detect_indent_strategy(
        &self,
        _text: &StringView,
        _lines: &LineManager,
    ) -> DetectedIndentStrategy {
        DetectedIndentStrategy::Unknown
    }
}
