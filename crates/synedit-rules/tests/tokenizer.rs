use pretty_assertions::assert_eq;
use std::sync::Arc;
use synedit_core::{Color, Document, DocumentConfig, HighlightStyle, SimpleTheme};
use synedit_rules::{Grammar, RuleStack, RulesError, RulesHighlighter, Token, Tokenizer};

const TOML_LITE: &str = include_str!("fixtures/toml_lite.yaml");

const CONFIG: &str = "[server]\nhost = \"example.com\" # primary\nport = 8080\nmotd = \"\"\"\nHello \\n\n\"\"\"";

fn tokenizer() -> Tokenizer {
    let grammar = Grammar::from_yaml(TOML_LITE).unwrap().compile().unwrap();
    Tokenizer::new(Arc::new(grammar))
}

fn spans(tokens: &[Token]) -> Vec<(&str, usize, usize)> {
    tokens
        .iter()
        .map(|token| (token.scope.as_str(), token.range.location, token.range.length))
        .collect()
}

fn compile_error(yaml: &str) -> RulesError {
    Grammar::from_yaml(yaml).unwrap().compile().unwrap_err()
}

#[test]
fn test_grammar_loads_and_compiles() {
    let grammar = Grammar::from_yaml(TOML_LITE).unwrap();
    assert_eq!(grammar.name, "TOML lite");
    assert_eq!(grammar.scope_name, "source.toml");

    let compiled = grammar.compile().unwrap();
    // comment, section, key, then the four value rules.
    assert_eq!(compiled.root_candidates().len(), 7);
}

#[test]
fn test_tokenizes_single_line_rules() {
    let lines = tokenizer().tokenize(CONFIG).unwrap();
    assert_eq!(lines.len(), 6);

    assert_eq!(spans(&lines[0]), vec![("meta.section.toml", 0, 8)]);
    assert_eq!(
        spans(&lines[2]),
        vec![
            ("meta.key.toml", 0, 6),
            ("variable.key.toml", 0, 4),
            ("constant.numeric.toml", 7, 4),
        ]
    );
    assert_eq!(lines[2][2].contents, "8080");
}

#[test]
fn test_string_region_and_trailing_comment() {
    let lines = tokenizer().tokenize(CONFIG).unwrap();

    assert_eq!(
        spans(&lines[1]),
        vec![
            ("meta.key.toml", 0, 6),
            ("variable.key.toml", 0, 4),
            ("string.quoted.double.toml", 7, 13),
            ("punctuation.definition.string.toml", 7, 1),
            ("punctuation.definition.string.toml", 19, 1),
            ("comment.line.toml", 21, 9),
        ]
    );
    assert_eq!(lines[1][2].contents, "\"example.com\"");
}

#[test]
fn test_region_spans_lines() {
    let lines = tokenizer().tokenize(CONFIG).unwrap();

    // Ties go to the rule listed first, so `"""` opens a triple string.
    assert_eq!(
        spans(&lines[3]),
        vec![
            ("meta.key.toml", 0, 6),
            ("variable.key.toml", 0, 4),
            ("string.quoted.triple.toml", 7, 3),
            ("punctuation.definition.string.toml", 7, 3),
        ]
    );
    assert_eq!(
        spans(&lines[4]),
        vec![
            ("string.quoted.triple.toml", 0, 8),
            ("constant.character.escape.toml", 6, 2),
        ]
    );
    assert_eq!(
        spans(&lines[5]),
        vec![
            ("string.quoted.triple.toml", 0, 3),
            ("punctuation.definition.string.toml", 0, 3),
        ]
    );
}

#[test]
fn test_rule_stack_carries_open_regions() {
    let tokenizer = tokenizer();
    let mut stack = RuleStack::new();

    tokenizer.tokenize_line("motd = \"\"\"", &mut stack).unwrap();
    assert_eq!(stack.depth(), 1);

    // Rules outside the region do not apply inside it.
    let inside = tokenizer.tokenize_line("port = 1", &mut stack).unwrap();
    assert_eq!(spans(&inside), vec![("string.quoted.triple.toml", 0, 8)]);

    tokenizer.tokenize_line("\"\"\"", &mut stack).unwrap();
    assert!(stack.is_empty());
}

#[test]
fn test_crlf_and_cr_delimiters_split_lines() {
    let lines = tokenizer().tokenize("a = 1\r\nb = true\rc = 2").unwrap();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1][2].scope, "constant.language.toml");
    assert_eq!(lines[2][2].range.location, 4);
}

#[test]
fn test_ranges_are_utf16() {
    let lines = tokenizer().tokenize("name = \"😀\" # ok").unwrap();

    assert_eq!(
        spans(&lines[0]).split_off(2),
        vec![
            ("string.quoted.double.toml", 7, 4),
            ("punctuation.definition.string.toml", 7, 1),
            ("punctuation.definition.string.toml", 10, 1),
            ("comment.line.toml", 12, 4),
        ]
    );
}

#[test]
fn test_unknown_include_is_rejected() {
    let error = compile_error(
        r##"
name: broken
scope_name: source.broken
patterns:
  - type: include
    include: "#missing"
"##,
    );

    assert!(matches!(error, RulesError::UnknownRule(name) if name == "missing"));
}

#[test]
fn test_self_include_is_unsupported() {
    let error = compile_error(
        r#"
name: recursive
scope_name: source.recursive
patterns:
  - type: include
    include: "$self"
"#,
    );

    assert!(matches!(error, RulesError::Unsupported(_)));
}

#[test]
fn test_include_cycle_is_unsupported() {
    let error = compile_error(
        r##"
name: cycle
scope_name: source.cycle
patterns:
  - type: include
    include: "#a"
repository:
  a:
    type: include
    include: "#b"
  b:
    type: patterns
    patterns:
      - type: include
        include: "#a"
"##,
    );

    assert!(matches!(error, RulesError::Unsupported(_)));
}

#[test]
fn test_invalid_regex_is_reported() {
    let error = compile_error(
        r#"
name: bad
scope_name: source.bad
patterns:
  - type: match
    name: broken
    match: "("
"#,
    );

    assert!(matches!(error, RulesError::RegexCompile { pattern, .. } if pattern == "("));
}

#[test]
fn test_rule_without_type_is_a_yaml_error() {
    let result = Grammar::from_yaml(
        r#"
name: untyped
scope_name: source.untyped
patterns:
  - name: keyword
    match: "fn"
"#,
    );

    assert!(matches!(result, Err(RulesError::Yaml(_))));
}

#[test]
fn test_highlighter_styles_document_lines() {
    let number = Color::rgb(0x00, 0x5c, 0xc5);
    let section = Color::rgb(0x6f, 0x42, 0xc1);
    let theme = SimpleTheme::new()
        .with_style("constant", HighlightStyle::color(number))
        .with_style("meta.section", HighlightStyle::color(section));
    let grammar = Grammar::from_yaml(TOML_LITE).unwrap().compile().unwrap();
    let highlighter = RulesHighlighter::new(Arc::new(grammar), Arc::new(theme));

    let document = Document::new("[server]\nport = 8080\n", DocumentConfig::default());
    let lines = highlighter.highlight(&document).unwrap();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0].text(), "[server]");
    assert_eq!(lines[0].attributes_at(3).and_then(|a| a.color), Some(section));
    assert_eq!(lines[1].attributes_at(0).and_then(|a| a.color), None);
    assert_eq!(lines[1].attributes_at(8).and_then(|a| a.color), Some(number));
    assert!(lines[2].is_empty());
}
