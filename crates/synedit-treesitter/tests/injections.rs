use pretty_assertions::assert_eq;
use std::sync::Arc;
use synedit_core::{
    ByteRange, Document, DocumentConfig, LanguageMode, LinePosition, TextRange,
};
use synedit_treesitter::{
    LanguageProvider, LanguageRegistry, LayerTree, TreeSitterLanguage, TreeSitterLanguageMode,
};

const HTML: &str = "<p>hi</p>\n<script>let a = 1;</script>\n";

const HTML_HIGHLIGHTS: &str = "(tag_name) @tag";

const HTML_INJECTIONS: &str = r#"
((script_element (raw_text) @injection.content)
 (#set! injection.language "javascript"))
"#;

const JS_HIGHLIGHTS: &str = r#"
"let" @keyword
(identifier) @variable
(number) @number
"#;

fn html() -> Arc<TreeSitterLanguage> {
    let html = TreeSitterLanguage::new("html", tree_sitter_html::LANGUAGE.into(), HTML_HIGHLIGHTS)
        .unwrap()
        .with_injections_query(HTML_INJECTIONS)
        .unwrap();
    Arc::new(html)
}

fn registry() -> Arc<dyn LanguageProvider> {
    let javascript = TreeSitterLanguage::new(
        "javascript",
        tree_sitter_javascript::LANGUAGE.into(),
        JS_HIGHLIGHTS,
    )
    .unwrap();
    Arc::new(LanguageRegistry::new().with_language(javascript))
}

fn parsed(document: &Document) -> LayerTree {
    let mut layers = LayerTree::new(html(), Some(registry()));
    layers.parse(document.string_view()).unwrap();
    layers
}

fn replace(document: &mut Document, layers: &mut LayerTree, range: TextRange, text: &str) {
    let replacement = document.replace_text(range, text).unwrap();
    layers
        .apply_edit(
            &replacement.edit,
            document.string_view(),
            document.line_manager(),
        )
        .unwrap();
}

/// Bytes of `length` code units starting at code unit `location`.
fn bytes(location: usize, length: usize) -> ByteRange {
    ByteRange::from(TextRange::new(location, length))
}

#[test]
fn test_script_element_gets_a_javascript_layer() {
    let document = Document::new(HTML, DocumentConfig::default());
    let layers = parsed(&document);

    let root = layers.root();
    let children = layers.children(root);
    assert_eq!(children.len(), 1);
    let child = children[0];
    assert_eq!(layers.language(child).unwrap().name(), "javascript");
    assert_eq!(layers.parent(child), Some(root));
    // `let a = 1;` starts at code unit 18.
    assert_eq!(layers.included_range(child), Some(bytes(18, 10)));
    assert_eq!(layers.root_byte_range(child), Some(bytes(18, 10)));
}

#[test]
fn test_injection_without_provider_is_ignored() {
    let document = Document::new(HTML, DocumentConfig::default());
    let mut layers = LayerTree::new(html(), None);
    layers.parse(document.string_view()).unwrap();

    assert!(layers.is_parsed());
    assert_eq!(layers.layer_count(), 1);
    assert!(layers.children(layers.root()).is_empty());
}

#[test]
fn test_unknown_injected_language_is_ignored() {
    let document = Document::new(HTML, DocumentConfig::default());
    let empty: Arc<dyn LanguageProvider> = Arc::new(LanguageRegistry::new());
    let mut layers = LayerTree::new(html(), Some(empty));
    layers.parse(document.string_view()).unwrap();

    assert_eq!(layers.layer_count(), 1);
}

#[test]
fn test_child_layer_survives_edit_before_it() {
    let mut document = Document::new(HTML, DocumentConfig::default());
    let mut layers = parsed(&document);
    let root = layers.root();
    let child = layers.children(root)[0];

    // "hi" -> "hello" shifts the script by three code units.
    replace(&mut document, &mut layers, TextRange::new(3, 2), "hello");

    assert_eq!(layers.children(root), vec![child]);
    assert_eq!(layers.included_range(child), Some(bytes(21, 10)));
    assert_eq!(layers.root_byte_range(child), Some(bytes(21, 10)));
}

#[test]
fn test_child_layer_survives_edit_inside_it() {
    let mut document = Document::new(HTML, DocumentConfig::default());
    let mut layers = parsed(&document);
    let root = layers.root();
    let child = layers.children(root)[0];

    // "1" -> "42" inside the script.
    replace(&mut document, &mut layers, TextRange::new(26, 1), "42");

    assert_eq!(layers.children(root), vec![child]);
    assert_eq!(layers.included_range(child), Some(bytes(18, 11)));
    assert_eq!(layers.layer_count(), 2);
}

#[test]
fn test_removed_script_drops_its_layer() {
    let mut document = Document::new(HTML, DocumentConfig::default());
    let mut layers = parsed(&document);
    let child = layers.children(layers.root())[0];

    let replacement = document
        .replace_text(TextRange::new(10, 27), "<b>x</b>")
        .unwrap();
    let changes = layers
        .apply_edit(
            &replacement.edit,
            document.string_view(),
            document.line_manager(),
        )
        .unwrap();

    assert_eq!(layers.layer_count(), 1);
    assert!(layers.children(layers.root()).is_empty());
    assert!(layers.language(child).is_none());
    let second_line = document.line_manager().line_at_row(1).unwrap();
    assert!(changes.edited_lines().contains(&second_line.id));
}

#[test]
fn test_inserted_script_adds_a_layer() {
    let mut document = Document::new(HTML, DocumentConfig::default());
    let mut layers = parsed(&document);
    let root = layers.root();
    let first = layers.children(root)[0];

    let end = document.string_view().len();
    replace(
        &mut document,
        &mut layers,
        TextRange::new(end, 0),
        "<script>b;</script>\n",
    );

    let children = layers.children(root);
    assert_eq!(children.len(), 2);
    assert_eq!(children[0], first);
    assert_eq!(layers.included_range(children[1]), Some(bytes(end + 8, 2)));
}

#[test]
fn test_empty_script_has_no_layer() {
    let document = Document::new("<script></script>\n", DocumentConfig::default());
    let layers = parsed(&document);

    assert_eq!(layers.layer_count(), 1);
}

#[test]
fn test_captures_come_from_every_layer_in_order() {
    let document = Document::new(HTML, DocumentConfig::default());
    let layers = parsed(&document);

    let all = bytes(0, document.string_view().len());
    let names: Vec<String> = layers
        .captures(all)
        .into_iter()
        .map(|capture| capture.name)
        .collect();
    assert_eq!(
        names,
        vec!["tag", "tag", "tag", "keyword", "variable", "number", "tag"]
    );

    let first_line = layers.captures(bytes(0, 9));
    assert_eq!(first_line.len(), 2);
    assert!(first_line.iter().all(|capture| capture.name == "tag"));
}

#[test]
fn test_captures_stay_in_bounds_after_deleting_text() {
    let mut document = Document::new(HTML, DocumentConfig::default());
    let mut layers = parsed(&document);

    replace(&mut document, &mut layers, TextRange::new(18, 20), "");
    let len = ByteRange::from(TextRange::new(0, document.string_view().len()));

    for capture in layers.captures(len) {
        assert!(capture.byte_range.upper_bound() <= len.upper_bound());
    }
}

#[test]
fn test_node_lookup_prefers_the_injected_layer() {
    let document = Document::new(HTML, DocumentConfig::default());
    let layers = parsed(&document);
    let child = layers.children(layers.root())[0];

    // The `a` in `let a = 1;`.
    let (layer, node) = layers.layer_and_node_at(LinePosition::new(1, 12)).unwrap();
    assert_eq!(layer, child);
    assert_eq!(node.kind(), "identifier");

    let (layer, node) = layers.layer_and_node_at(LinePosition::new(1, 3)).unwrap();
    assert_eq!(layer, layers.root());
    assert_eq!(node.kind(), "tag_name");
}

#[test]
fn test_language_hierarchy_lists_nested_layers() {
    let document = Document::new(HTML, DocumentConfig::default());
    let layers = parsed(&document);

    let hierarchy = layers.language_hierarchy();
    let lines: Vec<&str> = hierarchy.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("● html [0 - "));
    assert_eq!(lines[1], "  ● javascript [36 - 56]");
}

#[test]
fn test_language_mode_tracks_document_edits() {
    let mut document = Document::new(HTML, DocumentConfig::default());
    let mut mode = TreeSitterLanguageMode::new(html(), Some(registry()));
    assert!(!mode.can_highlight());

    mode.parse(document.string_view());
    assert!(mode.can_highlight());

    let replacement = document.replace_text(TextRange::new(22, 1), "b").unwrap();
    mode.apply_edit(
        &replacement.edit,
        document.string_view(),
        document.line_manager(),
    );

    let node = mode.syntax_node_at(LinePosition::new(1, 12)).unwrap();
    assert_eq!(node.kind, "identifier");
    assert_eq!(node.start, LinePosition::new(1, 12));
    assert_eq!(node.end, LinePosition::new(1, 13));
    assert!(mode.language_hierarchy().contains("● javascript"));
}
