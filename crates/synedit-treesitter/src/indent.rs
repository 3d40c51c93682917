//! Syntax-aware indentation.

use crate::input::line_position;
use crate::language::TreeSitterIndentationScopes;
use synedit_core::indent::{leading_space_count, starts_with_space, starts_with_tab};
use synedit_core::{
    DetectedIndentStrategy, IndentLevelMeasurer, InsertLineBreakIndentStrategy, LineManager,
    LinePosition, StringView,
};
use tree_sitter::{Node, Point, Tree};

const MAX_SCANNED_LINES: usize = 100;
const MAX_CONTENT_LINES: usize = 20;

/// Guesses whether a document indents with tabs or spaces.
///
/// Scans from the top, skipping empty lines and lines that start inside a comment, until it has
/// seen 100 lines or 20 lines with content. Lines starting with a single space are ignored, as
/// they are usually alignment rather than indentation.
pub struct TreeSitterIndentStrategyDetector<'a> {
    text: &'a StringView,
    lines: &'a LineManager,
    tree: &'a Tree,
}

impl<'a> TreeSitterIndentStrategyDetector<'a> {
    /// Create a detector.
    pub fn new(text: &'a StringView, lines: &'a LineManager, tree: &'a Tree) -> Self {
        Self { text, lines, tree }
    }

    /// Run the detection.
    pub fn detect(&self) -> DetectedIndentStrategy {
        let line_count = self.lines.line_count();
        let enough_lines = MAX_SCANNED_LINES.min(line_count);
        let enough_content_lines = MAX_CONTENT_LINES.min(line_count);
        let mut tab_lines = 0;
        let mut space_lines = 0;
        let mut lowest_space_count = usize::MAX;
        let mut scanned = 0;
        let mut scanned_with_content = 0;

        let decide = |tab_lines: usize, space_lines: usize, lowest_space_count: usize| {
            if tab_lines == 0 && space_lines == 0 {
                None
            } else if tab_lines > space_lines {
                Some(DetectedIndentStrategy::Tab)
            } else {
                Some(DetectedIndentStrategy::Space(lowest_space_count))
            }
        };

        for line in self.lines.line_iter() {
            scanned += 1;
            if self.starts_in_comment(line.row) || line.length() == 0 {
                continue;
            }
            scanned_with_content += 1;
            if starts_with_tab(self.text, &line) {
                tab_lines += 1;
            } else if starts_with_space(self.text, &line) {
                let space_count = leading_space_count(self.text, &line, lowest_space_count);
                if space_count > 1 {
                    lowest_space_count = lowest_space_count.min(space_count);
                    space_lines += 1;
                }
            }
            let has_scanned_enough =
                scanned >= enough_lines || scanned_with_content >= enough_content_lines;
            if has_scanned_enough
                && let Some(strategy) = decide(tab_lines, space_lines, lowest_space_count)
            {
                return strategy;
            }
        }
        // The document ran out before either threshold was met, e.g. a short file ending in
        // an empty line.
        decide(tab_lines, space_lines, lowest_space_count).unwrap_or(DetectedIndentStrategy::Unknown)
    }

    fn starts_in_comment(&self, row: usize) -> bool {
        let point = Point::new(row, 0);
        self.tree
            .root_node()
            .descendant_for_point_range(point, point)
            .is_some_and(|node| node.kind().ends_with("comment"))
    }
}

/// Computes the indentation of a new line from the syntax around the caret.
///
/// Nodes whose kind is in `indent` open a level when they start on the caret's line before the
/// caret. Nodes in `outdent` close one when they start on the caret's line after it. When both
/// apply the caret sits between a pair such as `{|}`, and an extra line break is suggested.
pub struct TreeSitterIndentController<'a> {
    scopes: &'a TreeSitterIndentationScopes,
    text: &'a StringView,
    lines: &'a LineManager,
    tab_length: usize,
}

impl<'a> TreeSitterIndentController<'a> {
    /// Create a controller.
    pub fn new(
        scopes: &'a TreeSitterIndentationScopes,
        text: &'a StringView,
        lines: &'a LineManager,
        tab_length: usize,
    ) -> Self {
        Self {
            scopes,
            text,
            lines,
            tab_length,
        }
    }

    /// Indentation for a line break replacing the text between `caret_start` and `caret_end`.
    /// `start_node` and `end_node` are the innermost nodes at those positions.
    pub fn strategy_for_inserting_line_break(
        &self,
        start_node: Option<Node<'_>>,
        end_node: Option<Node<'_>>,
        caret_start: LinePosition,
        caret_end: LinePosition,
    ) -> InsertLineBreakIndentStrategy {
        let indenting_node =
            start_node.and_then(|node| self.node_increasing_indent_level(node, caret_start));
        let outdenting_node =
            end_node.and_then(|node| self.node_decreasing_indent_level(node, caret_end));
        match (indenting_node, outdenting_node) {
            (Some(node), Some(_)) => InsertLineBreakIndentStrategy::new(
                self.indent_level_of_line(node.start_position().row) + 1,
                true,
            ),
            (Some(node), None) => InsertLineBreakIndentStrategy::new(
                self.indent_level_of_line(node.start_position().row) + 1,
                false,
            ),
            (None, Some(node)) => {
                let row = node.start_position().row;
                let mut starting_node = node;
                while starting_node.start_position().row == row {
                    match starting_node.parent() {
                        Some(parent) => starting_node = parent,
                        None => break,
                    }
                }
                InsertLineBreakIndentStrategy::new(
                    self.indent_level_of_line(starting_node.start_position().row),
                    false,
                )
            }
            (None, None) => InsertLineBreakIndentStrategy::new(
                self.indent_level_of_line(caret_start.row),
                false,
            ),
        }
    }

    fn node_increasing_indent_level<'tree>(
        &self,
        node: Node<'tree>,
        caret: LinePosition,
    ) -> Option<Node<'tree>> {
        let mut current = if self.scopes.whitespace_denotes_blocks {
            deepest_child_containing(node, caret)
        } else {
            Some(node)
        };
        while let Some(node) = current {
            let start = line_position(node.start_position());
            if start.row != caret.row {
                break;
            }
            let kind = node.kind();
            let opens_scope = self.scopes.indents(kind) || self.scopes.inherits_indent(kind);
            if opens_scope && start.column < caret.column {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    fn node_decreasing_indent_level<'tree>(
        &self,
        node: Node<'tree>,
        caret: LinePosition,
    ) -> Option<Node<'tree>> {
        let mut current = Some(node);
        while let Some(node) = current {
            let start = line_position(node.start_position());
            if start.row != caret.row {
                break;
            }
            if self.scopes.outdents(node.kind()) && start.column >= caret.column {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    fn indent_level_of_line(&self, row: usize) -> usize {
        self.lines
            .line_at_row(row)
            .map(|line| IndentLevelMeasurer::new(self.text).indent_level(&line, self.tab_length))
            .unwrap_or(0)
    }
}

/// The deepest descendant of `node` containing `position`, preferring later children.
fn deepest_child_containing(node: Node<'_>, position: LinePosition) -> Option<Node<'_>> {
    let start = line_position(node.start_position());
    let end = line_position(node.end_position());
    if position < start || position > end {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .rev()
        .find_map(|child| deepest_child_containing(child, position))
        .or(Some(node))
}
