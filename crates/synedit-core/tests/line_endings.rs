use synedit_core::{LineEnding, LineEndingDetector, LineManager, StringView};

#[test]
fn test_symbols_round_trip() {
    for ending in LineEnding::ALL {
        assert_eq!(LineEnding::from_symbol(ending.symbol()), Some(ending));
    }
    assert_eq!(LineEnding::from_symbol("\n\r"), None);
}

#[test]
fn test_most_frequent_ending_wins() {
    assert_eq!(
        LineEnding::detect_in_text("a\r\nb\r\nc\nd"),
        Some(LineEnding::Crlf)
    );
    assert_eq!(LineEnding::detect_in_text("a\rb\rc\r\n"), Some(LineEnding::Cr));
}

#[test]
fn test_ties_prefer_lf_then_cr() {
    assert_eq!(LineEnding::detect_in_text("a\r\nb\n"), Some(LineEnding::Lf));
    assert_eq!(LineEnding::detect_in_text("a\r\nb\r"), Some(LineEnding::Cr));
}

#[test]
fn test_single_line_has_no_ending() {
    assert_eq!(LineEnding::detect_in_text("no delimiters"), None);
    assert_eq!(LineEnding::detect_in_text(""), None);
}

#[test]
fn test_only_leading_lines_are_sampled() {
    let mut text = "x\n".repeat(20);
    text.push_str(&"y\r\n".repeat(30));
    let view = StringView::new(&text);
    let mut lines = LineManager::new();
    lines.rebuild(&view);
    assert_eq!(
        LineEndingDetector::new(&lines, &view).detect(),
        Some(LineEnding::Lf)
    );
}
