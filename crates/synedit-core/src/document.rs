//! The editable document.
//!
//! [`Document`] ties together the text buffer, the line manager and the language mode. Every
//! mutation goes through [`Document::replace_text`], which keeps the three in step and reports
//! the lines that need to be redrawn.

use crate::byte::{ByteCount, ByteRange, TextRange};
use crate::error::CoreError;
use crate::indent::{DetectedIndentStrategy, IndentStrategy, InsertLineBreakIndentStrategy};
use crate::language_mode::{LanguageMode, PlainTextLanguageMode, SyntaxNode};
use crate::line_change_set::LineChangeSet;
use crate::line_ending::{LineEnding, LineEndingDetector};
use crate::line_manager::{DEFAULT_ESTIMATED_LINE_HEIGHT, LineManager};
use crate::string_view::StringView;
use crate::text_edit::{LinePosition, TextEdit};
use crate::undo::{TextChange, UndoHistory};

/// Document settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocumentConfig {
    /// Display width of a tab, also used as the indent width when measuring indent levels.
    pub tab_length: usize,
    /// Maximum number of undo steps kept.
    pub max_undo: usize,
    /// Height given to lines before layout measures them.
    pub estimated_line_height: f64,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            tab_length: 4,
            max_undo: 1000,
            estimated_line_height: DEFAULT_ESTIMATED_LINE_HEIGHT,
        }
    }
}

impl DocumentConfig {
    /// Set the tab length.
    pub fn with_tab_length(mut self, tab_length: usize) -> Self {
        self.tab_length = tab_length;
        self
    }

    /// Set the undo depth.
    pub fn with_max_undo(mut self, max_undo: usize) -> Self {
        self.max_undo = max_undo;
        self
    }

    /// Set the estimated line height.
    pub fn with_estimated_line_height(mut self, height: f64) -> Self {
        self.estimated_line_height = height;
        self
    }
}

/// Result of [`Document::replace_text`].
#[derive(Debug, Clone)]
pub struct TextReplacement {
    /// Lines inserted, removed or edited by the replacement, including lines whose syntax
    /// changed.
    pub line_change_set: LineChangeSet,
    /// Whether the line count may have changed.
    pub did_add_or_remove_lines: bool,
    /// The edit as seen by the parser.
    pub edit: TextEdit,
}

impl TextReplacement {
    /// The change set and the added-or-removed flag.
    pub fn into_parts(self) -> (LineChangeSet, bool) {
        (self.line_change_set, self.did_add_or_remove_lines)
    }
}

/// A text buffer with line bookkeeping, a language mode and undo history.
pub struct Document {
    string_view: StringView,
    line_manager: LineManager,
    language_mode: Box<dyn LanguageMode>,
    history: UndoHistory,
    config: DocumentConfig,
}

impl Document {
    /// Create a plain-text document.
    pub fn new(text: &str, config: DocumentConfig) -> Self {
        let string_view = StringView::new(text);
        let mut line_manager = LineManager::with_estimated_line_height(config.estimated_line_height);
        line_manager.rebuild(&string_view);
        Self {
            string_view,
            line_manager,
            language_mode: Box::new(PlainTextLanguageMode),
            history: UndoHistory::new(config.max_undo),
            config,
        }
    }

    /// Use `language_mode` and parse the current text with it.
    pub fn with_language_mode(mut self, language_mode: Box<dyn LanguageMode>) -> Self {
        self.set_language_mode(language_mode);
        self
    }

    /// Replace the language mode and parse the current text with it.
    pub fn set_language_mode(&mut self, mut language_mode: Box<dyn LanguageMode>) {
        language_mode.parse(&self.string_view);
        self.language_mode = language_mode;
    }

    /// The configuration.
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// The full text.
    pub fn text(&self) -> String {
        self.string_view.text()
    }

    /// The text buffer.
    pub fn string_view(&self) -> &StringView {
        &self.string_view
    }

    /// The line manager.
    pub fn line_manager(&self) -> &LineManager {
        &self.line_manager
    }

    /// Mutable access to the line manager, for recording measured line heights.
    pub fn line_manager_mut(&mut self) -> &mut LineManager {
        &mut self.line_manager
    }

    /// The language mode.
    pub fn language_mode(&self) -> &dyn LanguageMode {
        self.language_mode.as_ref()
    }

    /// Mutable access to the language mode.
    pub fn language_mode_mut(&mut self) -> &mut dyn LanguageMode {
        self.language_mode.as_mut()
    }

    /// Replace the whole text, rebuild every line and re-parse. Clears the undo history.
    pub fn set_text(&mut self, text: &str) {
        self.string_view.set_text(text);
        self.line_manager.rebuild(&self.string_view);
        self.language_mode.parse(&self.string_view);
        self.history.clear();
    }

    /// Replace `range` with `text` and record the change for undo.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RangeOutOfBounds`] if `range` extends past the end of the text and
    /// [`CoreError::NotCharBoundary`] if a bound splits a surrogate pair. The document is left
    /// unchanged in both cases.
    pub fn replace_text(
        &mut self,
        range: TextRange,
        text: &str,
    ) -> Result<TextReplacement, CoreError> {
        let old_text = self.string_view.substring(range)?;
        let replacement = self.apply_replacement(range, text)?;
        if !old_text.is_empty() || !text.is_empty() {
            self.history.record(TextChange {
                location: range.location,
                old_text,
                new_text: text.to_string(),
            });
        }
        Ok(replacement)
    }

    fn apply_replacement(
        &mut self,
        range: TextRange,
        text: &str,
    ) -> Result<TextReplacement, CoreError> {
        self.string_view.check_range(range)?;
        let byte_range = ByteRange::from(range);
        let old_end_line_position = self.line_manager.line_position_at(range.upper_bound())?;

        let mut line_change_set = LineChangeSet::new();
        self.string_view.replace(range, "")?;
        line_change_set.union(
            self.line_manager
                .remove_characters(&self.string_view, range)?,
        );

        let inserted_length = text.encode_utf16().count();
        self.string_view
            .replace(TextRange::new(range.location, 0), text)?;
        line_change_set.union(
            self.line_manager
                .insert(&self.string_view, text, range.location)?,
        );

        let start_line_position = self.line_manager.line_position_at(range.location)?;
        let new_end_line_position = self
            .line_manager
            .line_position_at(range.location + inserted_length)?;
        let edit = TextEdit {
            byte_range,
            bytes_added: ByteCount::from_utf16_length(inserted_length),
            start_line_position,
            old_end_line_position,
            new_end_line_position,
        };
        let did_add_or_remove_lines = line_change_set.did_add_or_remove_lines();
        line_change_set.union(self.language_mode.apply_edit(
            &edit,
            &self.string_view,
            &self.line_manager,
        ));
        Ok(TextReplacement {
            line_change_set,
            did_add_or_remove_lines,
            edit,
        })
    }

    /// Whether there is a change to undo.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Whether there is an undone change to redo.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Start grouping changes into one undo step.
    pub fn begin_group(&mut self) {
        self.history.begin_group();
    }

    /// Stop grouping changes.
    pub fn end_group(&mut self) {
        self.history.end_group();
    }

    /// Whether the document matches the last clean point.
    pub fn is_clean(&self) -> bool {
        self.history.is_clean()
    }

    /// Mark the current state as clean, e.g. after saving.
    pub fn mark_clean(&mut self) {
        self.history.mark_clean();
    }

    /// Revert the most recent change group.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NothingToUndo`] when the history is empty. If a step fails to apply,
    /// the steps already reverted move to the redo stack and the rest stay undoable.
    pub fn undo(&mut self) -> Result<LineChangeSet, CoreError> {
        let steps = self
            .history
            .pop_undo_group()
            .ok_or(CoreError::NothingToUndo)?;
        let mut changes = LineChangeSet::new();
        let mut steps = steps;
        for index in 0..steps.len() {
            let change = &steps[index].change;
            let range = TextRange::new(change.location, change.new_len());
            let old_text = change.old_text.clone();
            match self.apply_replacement(range, &old_text) {
                Ok(replacement) => changes.union(replacement.line_change_set),
                Err(error) => {
                    let pending = steps.split_off(index);
                    self.history.push_redo(steps);
                    self.history.restore_undo(pending);
                    return Err(error);
                }
            }
        }
        self.history.push_redo(steps);
        Ok(changes)
    }

    /// Re-apply the most recently undone change group.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NothingToRedo`] when nothing has been undone.
    pub fn redo(&mut self) -> Result<LineChangeSet, CoreError> {
        let steps = self
            .history
            .pop_redo_group()
            .ok_or(CoreError::NothingToRedo)?;
        let mut changes = LineChangeSet::new();
        let mut steps = steps;
        for index in 0..steps.len() {
            let change = &steps[index].change;
            let range = TextRange::new(change.location, change.old_len());
            let new_text = change.new_text.clone();
            match self.apply_replacement(range, &new_text) {
                Ok(replacement) => changes.union(replacement.line_change_set),
                Err(error) => {
                    let pending = steps.split_off(index);
                    self.history.push_undo(steps);
                    self.history.restore_redo(pending);
                    return Err(error);
                }
            }
        }
        self.history.push_undo(steps);
        Ok(changes)
    }

    /// The dominant line ending, or `None` when the document has a single line.
    pub fn detect_line_ending(&self) -> Option<LineEnding> {
        LineEndingDetector::new(&self.line_manager, &self.string_view).detect()
    }

    /// Guess the indentation used by the document.
    pub fn detect_indent_strategy(&self) -> DetectedIndentStrategy {
        self.language_mode
            .detect_indent_strategy(&self.string_view, &self.line_manager)
    }

    /// Indent level of the line at `row`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RowOutOfBounds`] for a row past the last line.
    pub fn indent_level_of_line(&self, row: usize) -> Result<usize, CoreError> {
        let line = self.line_manager.line_at_row(row)?;
        Ok(self
            .language_mode
            .current_indent_level(&self.string_view, &line, self.indent_strategy()))
    }

    /// How to indent a line break replacing `range`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RangeOutOfBounds`] if `range` extends past the end of the text.
    pub fn strategy_for_inserting_line_break(
        &self,
        range: TextRange,
        strategy: IndentStrategy,
    ) -> Result<InsertLineBreakIndentStrategy, CoreError> {
        let start = self.line_manager.line_position_at(range.location)?;
        let end = self.line_manager.line_position_at(range.upper_bound())?;
        Ok(self.language_mode.strategy_for_inserting_line_break(
            &self.string_view,
            &self.line_manager,
            start,
            end,
            strategy,
        ))
    }

    /// The innermost syntax node at `position`.
    pub fn syntax_node_at(&self, position: LinePosition) -> Option<SyntaxNode> {
        self.language_mode.syntax_node_at(position)
    }

    fn indent_strategy(&self) -> IndentStrategy {
        IndentStrategy::Space {
            length: self.config.tab_length,
        }
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("length", &self.string_view.len())
            .field("line_count", &self.line_manager.line_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_change() -> TextChange {
        TextChange {
            location: 10,
            old_text: String::new(),
            new_text: "x".to_string(),
        }
    }

    #[test]
    fn test_failed_undo_keeps_remaining_steps() {
        let mut document = Document::new("abc", DocumentConfig::default());
        document.begin_group();
        document.history.record(unreachable_change());
        document.replace_text(TextRange::new(3, 0), "d").unwrap();
        document.end_group();

        let error = document.undo().unwrap_err();
        assert_eq!(
            error,
            CoreError::RangeOutOfBounds {
                location: 10,
                length: 1,
                buffer_length: 3
            }
        );
        assert_eq!(document.text(), "abc");
        assert!(document.can_undo());
        assert!(document.can_redo());
        assert_eq!(document.history.undo_depth(), 1);

        document.redo().unwrap();
        assert_eq!(document.text(), "abcd");
        assert_eq!(document.history.undo_depth(), 2);
    }
}
