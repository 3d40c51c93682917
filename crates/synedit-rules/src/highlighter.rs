use crate::rules::{CompiledGrammar, RuleStack, RulesError, Tokenizer};
use std::sync::Arc;
use synedit_core::{Document, StyledText, TextAttributes, Theme};
use tracing::debug;

/// Styles a document's lines with a rule grammar.
///
/// Token scopes resolve through the theme like tree-sitter capture names do, so `string.quoted`
/// falls back to `string`.
#[derive(Clone)]
pub struct RulesHighlighter {
    tokenizer: Tokenizer,
    theme: Arc<dyn Theme>,
}

impl RulesHighlighter {
    /// Create a highlighter for `grammar` using `theme`.
    pub fn new(grammar: Arc<CompiledGrammar>, theme: Arc<dyn Theme>) -> Self {
        Self {
            tokenizer: Tokenizer::new(grammar),
            theme,
        }
    }

    /// The tokenizer.
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// One styled text per line, without delimiters.
    pub fn highlight(&self, document: &Document) -> Result<Vec<StyledText>, RulesError> {
        let text = document.string_view();
        let mut stack = RuleStack::new();
        let mut lines = Vec::with_capacity(document.line_manager().line_count());

        for line in document.line_manager().line_iter() {
            let content = text.substring(line.content_range())?;
            let tokens = self.tokenizer.tokenize_line(&content, &mut stack)?;
            let mut styled = StyledText::new(content);
            for token in &tokens {
                let attributes = TextAttributes::from_theme(self.theme.as_ref(), &token.scope);
                if !attributes.is_empty() {
                    styled.set_attributes(token.range, &attributes);
                }
            }
            lines.push(styled);
        }

        debug!(
            target: "synedit::rules",
            grammar = %self.tokenizer.grammar().name,
            lines = lines.len(),
            "highlighted document"
        );
        Ok(lines)
    }
}
