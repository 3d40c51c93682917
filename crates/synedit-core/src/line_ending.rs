//! Line ending helpers.
//!
//! Documents keep whatever delimiters they were loaded with. [`LineEndingDetector`] samples
//! the first lines of a document to decide which delimiter new line breaks should use.

use crate::byte::TextRange;
use crate::line_manager::LineManager;
use crate::string_view::StringView;
use std::collections::HashMap;

/// Lines sampled by [`LineEndingDetector`].
const SAMPLED_LINE_COUNT: usize = 20;

/// A line delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineEnding {
    /// Unix-style LF (`'\n'`).
    Lf,
    /// Classic Mac CR (`'\r'`).
    Cr,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
}

impl LineEnding {
    /// Every line ending, in tie-break order.
    pub const ALL: [LineEnding; 3] = [Self::Lf, Self::Cr, Self::Crlf];

    /// The delimiter text.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Cr => "\r",
            Self::Crlf => "\r\n",
        }
    }

    /// Parse a delimiter.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ending| ending.symbol() == symbol)
    }

    /// Detect the dominant line ending of a standalone text.
    ///
    /// Policy: the most frequent delimiter wins, ties go to the earlier entry of
    /// [`LineEnding::ALL`]. Returns `None` when the text has no delimiters.
    pub fn detect_in_text(text: &str) -> Option<Self> {
        let view = StringView::new(text);
        let mut lines = LineManager::new();
        lines.rebuild(&view);
        LineEndingDetector::new(&lines, &view).detect()
    }
}

/// Samples up to 20 delimited lines of a document and picks the most frequent delimiter.
pub struct LineEndingDetector<'a> {
    lines: &'a LineManager,
    text: &'a StringView,
}

impl<'a> LineEndingDetector<'a> {
    /// Create a detector over a document's lines.
    pub fn new(lines: &'a LineManager, text: &'a StringView) -> Self {
        Self { lines, text }
    }

    /// The dominant delimiter among the sampled lines, or `None` for a single-line document.
    pub fn detect(&self) -> Option<LineEnding> {
        let target = self.lines.line_count().min(SAMPLED_LINE_COUNT);
        let mut counts: HashMap<LineEnding, usize> = HashMap::new();
        let mut scanned = 0;
        for line in self.lines.line_iter() {
            if scanned >= target {
                break;
            }
            let delimiter =
                TextRange::new(line.location + line.length(), line.delimiter_length);
            let Some(ending) = self
                .text
                .substring(delimiter)
                .ok()
                .and_then(|symbol| LineEnding::from_symbol(&symbol))
            else {
                continue;
            };
            scanned += 1;
            *counts.entry(ending).or_default() += 1;
        }
        LineEnding::ALL
            .into_iter()
            .filter_map(|ending| counts.get(&ending).map(|count| (ending, *count)))
            .fold(None, |best: Option<(LineEnding, usize)>, candidate| match best {
                Some((_, count)) if count >= candidate.1 => best,
                _ => Some(candidate),
            })
            .map(|(ending, _)| ending)
    }
}
