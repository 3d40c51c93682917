//! Line-level syntax highlighting.
//!
//! Captures for a line's byte range are clipped to the line, resolved through the theme and
//! applied to the line's [`StyledText`] in capture order, so narrower and more specific captures
//! override broader ones.

use crate::capture::Capture;
use crate::language_mode::TreeSitterLanguageMode;
use crate::layer::{LayerTree, SyntaxSnapshot};
use std::sync::Arc;
use synedit_core::{
    ByteRange, CoreError, Line, StringView, StyledText, TextAttributes, TextRange, Theme,
};

/// Anything that can answer capture queries.
pub trait CaptureSource {
    /// Highlight captures overlapping `range`, in application order.
    fn captures(&self, range: ByteRange) -> Vec<Capture>;
}

impl CaptureSource for LayerTree {
    fn captures(&self, range: ByteRange) -> Vec<Capture> {
        LayerTree::captures(self, range)
    }
}

impl CaptureSource for SyntaxSnapshot {
    fn captures(&self, range: ByteRange) -> Vec<Capture> {
        SyntaxSnapshot::captures(self, range)
    }
}

impl CaptureSource for TreeSitterLanguageMode {
    fn captures(&self, range: ByteRange) -> Vec<Capture> {
        TreeSitterLanguageMode::captures(self, range)
    }
}

/// Styling for part of a line. The range is local to the line, in UTF-16 code units.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightToken {
    /// Range within the line.
    pub range: TextRange,
    /// Resolved attributes.
    pub attributes: TextAttributes,
}

/// One line to highlight.
#[derive(Debug, Clone, PartialEq)]
pub struct LineInput {
    /// Bytes of the line's content in the document.
    pub byte_range: ByteRange,
    /// The line's text and current attributes.
    pub styled_text: StyledText,
}

impl LineInput {
    /// Input for the content of `line`, without its delimiter.
    pub fn from_line(text: &StringView, line: &Line) -> Result<Self, CoreError> {
        let range = line.content_range();
        Ok(Self {
            byte_range: ByteRange::from(range),
            styled_text: StyledText::new(text.substring(range)?),
        })
    }
}

/// Turns captures into styled text.
#[derive(Clone)]
pub struct SyntaxHighlighter {
    theme: Arc<dyn Theme>,
}

impl SyntaxHighlighter {
    /// Create a highlighter using `theme`.
    pub fn new(theme: Arc<dyn Theme>) -> Self {
        Self { theme }
    }

    /// The theme.
    pub fn theme(&self) -> &Arc<dyn Theme> {
        &self.theme
    }

    /// Highlight `input` synchronously.
    pub fn highlight(&self, source: &dyn CaptureSource, input: &mut LineInput) {
        let captures = source.captures(input.byte_range);
        let tokens = self.tokens(&captures, input.byte_range);
        Self::apply_tokens(&tokens, &mut input.styled_text);
    }

    /// Tokens for the captures overlapping `line_range`, clipped to the line.
    ///
    /// Captures may start before the line or run past it, e.g. an unterminated string. Empty
    /// tokens and tokens the theme does not style are dropped.
    pub fn tokens(&self, captures: &[Capture], line_range: ByteRange) -> Vec<HighlightToken> {
        captures
            .iter()
            .filter(|capture| capture.byte_range.overlaps(&line_range))
            .filter_map(|capture| {
                let start = capture.byte_range.lower_bound().max(line_range.lower_bound());
                let end = capture.byte_range.upper_bound().min(line_range.upper_bound());
                let local = ByteRange::from_bounds(
                    start - line_range.lower_bound(),
                    end - line_range.lower_bound(),
                );
                if local.is_empty() {
                    return None;
                }
                let attributes = TextAttributes::from_theme(self.theme.as_ref(), &capture.name);
                if attributes.is_empty() {
                    return None;
                }
                Some(HighlightToken {
                    range: local.to_text_range(),
                    attributes,
                })
            })
            .collect()
    }

    /// Overlay `tokens` on `styled_text` in order.
    pub fn apply_tokens(tokens: &[HighlightToken], styled_text: &mut StyledText) {
        for token in tokens {
            styled_text.set_attributes(token.range, &token.attributes);
        }
    }
}

impl std::fmt::Debug for SyntaxHighlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxHighlighter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use synedit_core::{ByteCount, Color, FontTraits, HighlightStyle, SimpleTheme};

    fn capture(start: usize, end: usize, name: &str) -> Capture {
        Capture::new(name, ByteRange::from(start..end))
    }

    fn highlighter() -> SyntaxHighlighter {
        let theme = SimpleTheme::new()
            .with_style("string", HighlightStyle::color(Color::rgb(0, 0x80, 0)))
            .with_style(
                "keyword",
                HighlightStyle::color(Color::rgb(0x80, 0, 0x80)).with_traits(FontTraits::BOLD),
            );
        SyntaxHighlighter::new(Arc::new(theme))
    }

    #[test]
    fn test_tokens_are_clipped_to_the_line() {
        // Line covers code units 10..20, i.e. bytes 20..40.
        let line = ByteRange::new(ByteCount(20), ByteCount(20));
        let captures = [capture(12, 30, "string"), capture(36, 60, "keyword")];
        let tokens = highlighter().tokens(&captures, line);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].range, TextRange::new(0, 5));
        assert_eq!(tokens[1].range, TextRange::new(8, 2));
    }

    #[test]
    fn test_unstyled_and_empty_tokens_are_dropped() {
        let line = ByteRange::from(0..20);
        let captures = [
            capture(0, 4, "punctuation"),
            capture(20, 30, "string"),
            capture(4, 4, "keyword"),
        ];
        assert!(highlighter().tokens(&captures, line).is_empty());
    }
}
