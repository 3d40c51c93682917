use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use synedit_core::{
    Color, Document, DocumentConfig, FontTraits, HighlightStyle, LanguageMode, LineChangeSet,
    SimpleTheme, TextRange,
};
use synedit_treesitter::{
    HighlightOutcome, HighlightQueue, LineInput, SyntaxHighlighter, TreeSitterLanguage,
    TreeSitterLanguageMode,
};

const SOURCE: &str = "// add numbers\nfn add(a: i32) -> i32 {\n    let s = \"hi\";\n    a\n}\n";

const HIGHLIGHTS: &str = r#"
(line_comment) @comment
(string_literal) @string
(primitive_type) @type.builtin
"fn" @keyword
"let" @keyword
(function_item name: (identifier) @function)
"#;

const TIMEOUT: Duration = Duration::from_secs(5);

fn keyword_color() -> Color {
    Color::rgb(0xd7, 0x3a, 0x49)
}

fn string_color() -> Color {
    Color::rgb(0x03, 0x2f, 0x62)
}

fn highlighter() -> SyntaxHighlighter {
    let theme = SimpleTheme::new()
        .with_style("comment", HighlightStyle::color(Color::rgb(0x6a, 0x73, 0x7d)))
        .with_style("string", HighlightStyle::color(string_color()))
        .with_style("type", HighlightStyle::color(Color::rgb(0x00, 0x5c, 0xc5)))
        .with_style(
            "keyword",
            HighlightStyle::color(keyword_color()).with_traits(FontTraits::BOLD),
        );
    SyntaxHighlighter::new(Arc::new(theme))
}

fn rust_mode() -> TreeSitterLanguageMode {
    let rust =
        TreeSitterLanguage::new("rust", tree_sitter_rust::LANGUAGE.into(), HIGHLIGHTS).unwrap();
    TreeSitterLanguageMode::new(Arc::new(rust), None)
}

fn parsed() -> (Document, TreeSitterLanguageMode) {
    let document = Document::new(SOURCE, DocumentConfig::default());
    let mut mode = rust_mode();
    mode.parse(document.string_view());
    (document, mode)
}

fn line_input(document: &Document, row: usize) -> LineInput {
    let line = document.line_manager().line_at_row(row).unwrap();
    LineInput::from_line(document.string_view(), &line).unwrap()
}

#[test]
fn test_highlight_line_with_keyword_and_string() {
    let (document, mode) = parsed();
    let mut input = line_input(&document, 2);

    highlighter().highlight(&mode, &mut input);

    let styled = &input.styled_text;
    assert_eq!(styled.text(), "    let s = \"hi\";");
    let let_attributes = styled.attributes_at(4).unwrap();
    assert_eq!(let_attributes.color, Some(keyword_color()));
    assert!(let_attributes.traits.contains(FontTraits::BOLD));
    assert_eq!(styled.attributes_at(13).unwrap().color, Some(string_color()));
    assert!(styled.attributes_at(8).is_none_or(|attributes| attributes.is_empty()));
}

#[test]
fn test_capture_names_fall_back_to_their_prefix() {
    let (document, mode) = parsed();
    let mut input = line_input(&document, 1);

    highlighter().highlight(&mode, &mut input);

    // `i32` is captured as `type.builtin`, styled through `type`.
    let attributes = input.styled_text.attributes_at(10).unwrap();
    assert_eq!(attributes.color, Some(Color::rgb(0x00, 0x5c, 0xc5)));
}

#[test]
fn test_highlighting_follows_edits() {
    let (mut document, mut mode) = parsed();

    // Turn `let s = "hi";` into `let s = 1;`.
    let replacement = document.replace_text(TextRange::new(51, 4), "1").unwrap();
    let changes = mode.apply_edit(
        &replacement.edit,
        document.string_view(),
        document.line_manager(),
    );
    let line = document.line_manager().line_at_row(2).unwrap();
    assert!(changes.edited_lines().contains(&line.id));

    let mut input = line_input(&document, 2);
    highlighter().highlight(&mode, &mut input);
    assert_eq!(input.styled_text.text(), "    let s = 1;");
    assert!(
        input
            .styled_text
            .runs()
            .iter()
            .all(|run| run.attributes.color != Some(string_color()))
    );
}

#[test]
fn test_queue_delivers_tokens() {
    let (document, mode) = parsed();
    let queue = HighlightQueue::new(highlighter());
    let line = document.line_manager().line_at_row(2).unwrap();
    let input = line_input(&document, 2);

    let task = queue.submit(line.id, input.byte_range, mode.highlight_snapshot());
    assert_eq!(task.line(), line.id);

    match queue.next_outcome(TIMEOUT) {
        Some(HighlightOutcome::Ready { line: ready, tokens }) => {
            assert_eq!(ready, line.id);
            assert_eq!(tokens.len(), 2);
            assert_eq!(tokens[0].range, TextRange::new(4, 3));
            assert_eq!(tokens[1].range, TextRange::new(12, 4));
        }
        other => panic!("expected tokens, got {other:?}"),
    }
}

#[test]
fn test_newer_request_supersedes_older_one() {
    let (document, mode) = parsed();
    let queue = HighlightQueue::new(highlighter());
    let line = document.line_manager().line_at_row(2).unwrap();
    let input = line_input(&document, 2);

    let first = queue.submit(line.id, input.byte_range, mode.highlight_snapshot());
    let second = queue.submit(line.id, input.byte_range, mode.highlight_snapshot());
    assert!(first.is_cancelled());
    assert!(!second.is_cancelled());

    let first_outcome = queue.next_outcome(TIMEOUT).unwrap();
    assert_eq!(first_outcome, HighlightOutcome::Cancelled { line: line.id });
    let second_outcome = queue.next_outcome(TIMEOUT).unwrap();
    assert!(matches!(second_outcome, HighlightOutcome::Ready { .. }));
}

#[test]
fn test_cancelled_request_delivers_nothing() {
    let (document, mode) = parsed();
    let queue = HighlightQueue::new(highlighter());
    let line = document.line_manager().line_at_row(1).unwrap();
    let input = line_input(&document, 1);

    let task = queue.submit(line.id, input.byte_range, mode.highlight_snapshot());
    task.cancel();

    assert_eq!(
        queue.next_outcome(TIMEOUT),
        Some(HighlightOutcome::Cancelled { line: line.id })
    );
}

#[test]
fn test_edited_lines_cancel_their_requests() {
    let (document, mode) = parsed();
    let queue = HighlightQueue::new(highlighter());
    let edited = document.line_manager().line_at_row(1).unwrap();
    let untouched = document.line_manager().line_at_row(2).unwrap();

    let snapshot = mode.highlight_snapshot();
    queue.submit(
        edited.id,
        line_input(&document, 1).byte_range,
        snapshot.clone(),
    );
    queue.submit(
        untouched.id,
        line_input(&document, 2).byte_range,
        snapshot,
    );
    let mut changes = LineChangeSet::new();
    changes.mark_edited(edited.id);
    queue.cancel_lines(&changes);

    let mut outcomes = Vec::new();
    while outcomes.len() < 2 {
        outcomes.push(queue.next_outcome(TIMEOUT).unwrap());
    }
    assert_eq!(outcomes[0], HighlightOutcome::Cancelled { line: edited.id });
    assert!(matches!(&outcomes[1], HighlightOutcome::Ready { line, .. } if *line == untouched.id));
}

#[test]
fn test_background_parse_enables_highlighting() {
    let document = Document::new(SOURCE, DocumentConfig::default());
    let mut mode = rust_mode();
    assert!(!mode.can_highlight());

    let handle = mode.parse_in_background(document.string_view());
    assert!(handle.wait());
    assert!(mode.can_highlight());

    let mut input = line_input(&document, 0);
    highlighter().highlight(&mode, &mut input);
    assert!(input.styled_text.attributes_at(0).is_some_and(|a| !a.is_empty()));
}

#[test]
fn test_edit_before_first_parse_parses_synchronously() {
    let mut document = Document::new(SOURCE, DocumentConfig::default());
    let mut mode = rust_mode();

    let replacement = document.replace_text(TextRange::new(0, 0), "\n").unwrap();
    let changes = mode.apply_edit(
        &replacement.edit,
        document.string_view(),
        document.line_manager(),
    );

    assert!(changes.edited_lines().is_empty());
    assert!(mode.can_highlight());
}
