//! Indentation helpers.

use crate::line_manager::Line;
use crate::string_view::StringView;

const SPACE: u16 = 0x20;
const TAB: u16 = 0x09;

/// How a document indents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndentStrategy {
    /// Indent with tab characters displayed `length` columns wide.
    Tab {
        /// Display width of one tab.
        length: usize,
    },
    /// Indent with `length` spaces per level.
    Space {
        /// Spaces per indent level.
        length: usize,
    },
}

impl IndentStrategy {
    /// Columns per indent level.
    pub fn tab_length(self) -> usize {
        match self {
            Self::Tab { length } | Self::Space { length } => length,
        }
    }

    /// The text inserted for `level` indent levels.
    pub fn indent_string(self, level: usize) -> String {
        match self {
            Self::Tab { .. } => "\t".repeat(level),
            Self::Space { length } => " ".repeat(length * level),
        }
    }
}

impl Default for IndentStrategy {
    fn default() -> Self {
        Self::Space { length: 2 }
    }
}

/// Result of scanning a document for its indentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedIndentStrategy {
    /// Lines are mostly indented with tabs.
    Tab,
    /// Lines are mostly indented with the given number of spaces.
    Space(usize),
    /// Not enough indented lines to tell.
    Unknown,
}

/// What to do when a line break is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InsertLineBreakIndentStrategy {
    /// Indent level of the new line.
    pub indent_level: usize,
    /// Whether a second line break should follow, placing the caret on an indented line
    /// between an opening and a closing token.
    pub insert_extra_line_break: bool,
}

impl InsertLineBreakIndentStrategy {
    /// Create a strategy.
    pub fn new(indent_level: usize, insert_extra_line_break: bool) -> Self {
        Self {
            indent_level,
            insert_extra_line_break,
        }
    }
}

/// Measures the indent level of lines.
pub struct IndentLevelMeasurer<'a> {
    text: &'a StringView,
}

impl<'a> IndentLevelMeasurer<'a> {
    /// Create a measurer over `text`.
    pub fn new(text: &'a StringView) -> Self {
        Self { text }
    }

    /// Leading whitespace width of `line` in columns. A tab counts as `tab_length` columns.
    pub fn indent_width(&self, line: &Line, tab_length: usize) -> usize {
        let mut width = 0;
        for offset in line.location..line.location + line.length() {
            match self.text.code_unit_at(offset) {
                Some(SPACE) => width += 1,
                Some(TAB) => width += tab_length,
                _ => break,
            }
        }
        width
    }

    /// Indent level of `line`: its leading whitespace width divided by `tab_length`.
    pub fn indent_level(&self, line: &Line, tab_length: usize) -> usize {
        if tab_length == 0 {
            return 0;
        }
        self.indent_width(line, tab_length) / tab_length
    }
}

/// Number of leading spaces of `line`, capped at `limit`.
pub fn leading_space_count(text: &StringView, line: &Line, limit: usize) -> usize {
    (line.location..line.location + line.length())
        .take(limit)
        .take_while(|offset| text.code_unit_at(*offset) == Some(SPACE))
        .count()
}

/// Whether `line` starts with a tab.
pub fn starts_with_tab(text: &StringView, line: &Line) -> bool {
    line.length() > 0 && text.code_unit_at(line.location) == Some(TAB)
}

/// Whether `line` starts with a space.
pub fn starts_with_space(text: &StringView, line: &Line) -> bool {
    line.length() > 0 && text.code_unit_at(line.location) == Some(SPACE)
}
