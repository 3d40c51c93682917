use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use synedit_core::{
    ByteCount, ByteRange, CoreError, DetectedIndentStrategy, Document, DocumentConfig,
    IndentStrategy, InsertLineBreakIndentStrategy, LanguageMode, LineChangeSet, LineEnding,
    LineManager, LinePosition, StringView, SyntaxNode, TextEdit, TextRange,
};

/// Records every edit and reports the edit's start line as syntax-changed.
#[derive(Default)]
struct RecordingLanguageMode {
    edits: Arc<Mutex<Vec<TextEdit>>>,
    parses: Arc<Mutex<usize>>,
}

impl LanguageMode for RecordingLanguageMode {
    fn parse(&mut self, _text: &StringView) {
        *self.parses.lock().unwrap() += 1;
    }

    fn apply_edit(
        &mut self,
        edit: &TextEdit,
        _text: &StringView,
        lines: &LineManager,
    ) -> LineChangeSet {
        self.edits.lock().unwrap().push(*edit);
        let mut changes = LineChangeSet::new();
        if let Ok(line) = lines.line_at_row(edit.start_line_position.row) {
            changes.mark_edited(line.id);
        }
        changes
    }

    fn can_highlight(&self) -> bool {
        true
    }

    fn strategy_for_inserting_line_break(
        &self,
        _text: &StringView,
        _lines: &LineManager,
        start: LinePosition,
        _end: LinePosition,
        _strategy: IndentStrategy,
    ) -> InsertLineBreakIndentStrategy {
        InsertLineBreakIndentStrategy::new(start.row, true)
    }

    fn syntax_node_at(&self, position: LinePosition) -> Option<SyntaxNode> {
        Some(SyntaxNode {
            kind: "node".to_string(),
            start: position,
            end: position,
        })
    }

    fn detect_indent_strategy(
        &self,
        _text: &StringView,
        _lines: &LineManager,
    ) -> DetectedIndentStrategy {
        DetectedIndentStrategy::Space(4)
    }
}

fn recording_document(text: &str) -> (Document, Arc<Mutex<Vec<TextEdit>>>, Arc<Mutex<usize>>) {
    let mode = RecordingLanguageMode::default();
    let edits = mode.edits.clone();
    let parses = mode.parses.clone();
    let document =
        Document::new(text, DocumentConfig::default()).with_language_mode(Box::new(mode));
    (document, edits, parses)
}

#[test]
fn test_edit_descriptor_positions() {
    let (mut document, edits, parses) = recording_document("ab\ncd\nef");
    assert_eq!(*parses.lock().unwrap(), 1);

    // Replace "d\ne" with "XYZ".
    let replacement = document.replace_text(TextRange::new(4, 3), "XYZ").unwrap();
    assert_eq!(document.text(), "ab\ncXYZf");

    let expected = TextEdit {
        byte_range: ByteRange::new(ByteCount(8), ByteCount(6)),
        bytes_added: ByteCount(6),
        start_line_position: LinePosition::new(1, 1),
        old_end_line_position: LinePosition::new(2, 1),
        new_end_line_position: LinePosition::new(1, 4),
    };
    assert_eq!(replacement.edit, expected);
    assert_eq!(edits.lock().unwrap().as_slice(), &[expected]);
    assert_eq!(replacement.edit.new_end_byte(), ByteCount(14));
}

#[test]
fn test_language_mode_changes_are_merged() {
    let (mut document, _, _) = recording_document("ab\ncd");
    let second = document.line_manager().line_at_row(1).unwrap().id;
    let replacement = document.replace_text(TextRange::new(4, 0), "x").unwrap();
    assert!(replacement.line_change_set.edited_lines().contains(&second));
    let (changes, added_or_removed) = replacement.into_parts();
    assert!(!added_or_removed);
    assert_eq!(changes.edited_lines().len(), 1);
}

#[test]
fn test_out_of_bounds_replacement_is_rejected() {
    let mut document = Document::new("abc", DocumentConfig::default());
    let error = document.replace_text(TextRange::new(2, 5), "x").unwrap_err();
    assert_eq!(
        error,
        CoreError::RangeOutOfBounds {
            location: 2,
            length: 5,
            buffer_length: 3
        }
    );
    assert_eq!(document.text(), "abc");
    assert!(!document.can_undo());
}

#[test]
fn test_utf16_offsets() {
    let mut document = Document::new("a😀b", DocumentConfig::default());
    assert_eq!(document.string_view().len(), 4);
    let replacement = document.replace_text(TextRange::new(3, 1), "c").unwrap();
    assert_eq!(document.text(), "a😀c");
    assert_eq!(replacement.edit.start_byte(), ByteCount(6));
    assert_eq!(replacement.edit.start_line_position, LinePosition::new(0, 3));
}

#[test]
fn test_set_text_rebuilds_and_reparses() {
    let (mut document, _, parses) = recording_document("a");
    document.replace_text(TextRange::new(0, 0), "x").unwrap();
    document.set_text("one\ntwo\nthree");
    assert_eq!(document.line_manager().line_count(), 3);
    assert_eq!(*parses.lock().unwrap(), 2);
    assert!(!document.can_undo());
}

#[test]
fn test_detection_helpers() {
    let document = Document::new("a\r\nb\r\nc\nd", DocumentConfig::default());
    assert_eq!(document.detect_line_ending(), Some(LineEnding::Crlf));
    assert_eq!(
        document.detect_indent_strategy(),
        DetectedIndentStrategy::Unknown
    );

    let document = Document::new("fn f() {\n        body\n\tx\n}", DocumentConfig::default());
    assert_eq!(document.indent_level_of_line(1).unwrap(), 2);
    assert_eq!(document.indent_level_of_line(2).unwrap(), 1);
    assert_eq!(
        document.indent_level_of_line(9),
        Err(CoreError::RowOutOfBounds {
            row: 9,
            line_count: 4
        })
    );
}

#[test]
fn test_language_mode_queries_are_forwarded() {
    let (document, _, _) = recording_document("ab\ncd");
    assert_eq!(
        document.detect_indent_strategy(),
        DetectedIndentStrategy::Space(4)
    );
    let strategy = document
        .strategy_for_inserting_line_break(TextRange::new(4, 0), IndentStrategy::default())
        .unwrap();
    assert_eq!(strategy, InsertLineBreakIndentStrategy::new(1, true));
    assert_eq!(
        document.syntax_node_at(LinePosition::new(1, 1)).unwrap().kind,
        "node"
    );
}

#[test]
fn test_plain_text_line_break_keeps_indent() {
    let document = Document::new(
        "    indented",
        DocumentConfig::default().with_tab_length(2),
    );
    let strategy = document
        .strategy_for_inserting_line_break(
            TextRange::new(12, 0),
            IndentStrategy::Space { length: 2 },
        )
        .unwrap();
    assert_eq!(strategy, InsertLineBreakIndentStrategy::new(2, false));
}

#[test]
fn test_range_splitting_surrogate_pair_is_rejected() {
    let mut document = Document::new("a😀b\nc", DocumentConfig::default());

    let error = document
        .replace_text(TextRange::new(2, 1), "")
        .unwrap_err();

    assert_eq!(error, CoreError::NotCharBoundary { offset: 2 });
    assert_eq!(document.text(), "a😀b\nc");
    assert_eq!(
        document.line_manager().total_length(),
        document.string_view().len()
    );
    assert!(!document.can_undo());
}
