use std::sync::Arc;
use synedit_core::{
    Color, Document, DocumentConfig, FontTraits, HighlightStyle, LanguageMode, SimpleTheme,
    TextRange,
};
use synedit_treesitter::{
    LineInput, SyntaxHighlighter, TreeSitterIndentationScopes, TreeSitterLanguage,
    TreeSitterLanguageMode,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let source = r#"// comment
fn add(a: i32, b: i32) -> i32 {
    let s = "hi";
    a + b
}
"#;

    let rust = TreeSitterLanguage::new(
        "rust",
        tree_sitter_rust::LANGUAGE.into(),
        tree_sitter_rust::HIGHLIGHTS_QUERY,
    )?
    .with_indentation_scopes(
        TreeSitterIndentationScopes::new()
            .with_indent(["block", "declaration_list", "field_declaration_list"])
            .with_outdent(["}"]),
    );
    let mut mode = TreeSitterLanguageMode::new(Arc::new(rust), None);

    let mut document = Document::new(source, DocumentConfig::default());
    mode.parse(document.string_view());

    let theme = SimpleTheme::new()
        .with_style("comment", HighlightStyle::color(Color::rgb(0x6a, 0x73, 0x7d)))
        .with_style("string", HighlightStyle::color(Color::rgb(0x03, 0x2f, 0x62)))
        .with_style("type", HighlightStyle::color(Color::rgb(0x00, 0x5c, 0xc5)))
        .with_style(
            "keyword",
            HighlightStyle::color(Color::rgb(0xd7, 0x3a, 0x49)).with_traits(FontTraits::BOLD),
        )
        .with_style("function", HighlightStyle::color(Color::rgb(0x6f, 0x42, 0xc1)));
    let highlighter = SyntaxHighlighter::new(Arc::new(theme));

    for line in document.line_manager().line_iter() {
        let mut input = LineInput::from_line(document.string_view(), &line)?;
        highlighter.highlight(&mode, &mut input);
        println!(
            "{:>2}: {:?} ({} styled runs)",
            line.row,
            input.styled_text.text(),
            input
                .styled_text
                .runs()
                .iter()
                .filter(|run| !run.attributes.is_empty())
                .count()
        );
    }

    // Rename `s` to `greeting` and keep the trees in sync.
    let replacement = document.replace_text(TextRange::new(51, 1), "greeting")?;
    let changes = mode.apply_edit(
        &replacement.edit,
        document.string_view(),
        document.line_manager(),
    );
    println!(
        "edited_lines={} layers:\n{}",
        changes.edited_lines().len(),
        mode.language_hierarchy()
    );
    Ok(())
}
