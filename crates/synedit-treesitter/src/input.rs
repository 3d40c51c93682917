//! Conversions between the buffer's coordinates and tree-sitter's.
//!
//! The parser reads the buffer as UTF-16LE, so tree-sitter byte offsets equal
//! [`ByteCount`] values and point columns are UTF-16 columns times two.

use std::sync::atomic::{AtomicBool, Ordering};
use synedit_core::{ByteCount, ByteRange, LinePosition, StringView, TextEdit};
use tree_sitter::{InputEdit, Node, Parser, Point, TextProvider, Tree};

/// Code units handed to the parser per read callback.
const CHUNK_UNITS: usize = 4096;

pub(crate) fn point(position: LinePosition) -> Point {
    Point::new(position.row, position.column * 2)
}

pub(crate) fn line_position(point: Point) -> LinePosition {
    LinePosition::new(point.row, point.column / 2)
}

pub(crate) fn input_edit(edit: &TextEdit) -> InputEdit {
    InputEdit {
        start_byte: edit.start_byte().value(),
        old_end_byte: edit.old_end_byte().value(),
        new_end_byte: edit.new_end_byte().value(),
        start_position: point(edit.start_line_position),
        old_end_position: point(edit.old_end_line_position),
        new_end_position: point(edit.new_end_line_position),
    }
}

pub(crate) fn byte_range(node: &Node<'_>) -> ByteRange {
    ByteRange::from_bounds(ByteCount(node.start_byte()), ByteCount(node.end_byte()))
}

/// Parse `text`, reusing `old_tree` when it has been edited to match.
///
/// When `cancel` is raised mid-parse the reader reports end of input and the result is `None`.
pub(crate) fn parse_text(
    parser: &mut Parser,
    text: &StringView,
    old_tree: Option<&Tree>,
    cancel: Option<&AtomicBool>,
) -> Option<Tree> {
    let is_cancelled = || cancel.is_some_and(|flag| flag.load(Ordering::Acquire));
    // Offsets passed to the reader are in code units.
    let mut read = |offset: usize, _position: Point| -> Vec<u16> {
        if is_cancelled() {
            return Vec::new();
        }
        text.utf16_chunk(offset, CHUNK_UNITS)
    };
    let tree = parser.parse_utf16_le_with_options(&mut read, old_tree, None);
    if is_cancelled() { None } else { tree }
}

/// The text of `node` as UTF-8.
pub(crate) fn node_text(text: &StringView, node: &Node<'_>) -> String {
    text.substring(byte_range(node).to_text_range())
        .unwrap_or_default()
}

/// Feeds node text to query predicates as UTF-8, which is what the binding compares against.
pub(crate) struct Utf16TextProvider<'a> {
    text: &'a StringView,
}

impl<'a> Utf16TextProvider<'a> {
    pub(crate) fn new(text: &'a StringView) -> Self {
        Self { text }
    }
}

impl<'a> TextProvider<Vec<u8>> for Utf16TextProvider<'a> {
    type I = std::iter::Once<Vec<u8>>;

    fn text(&mut self, node: Node) -> Self::I {
        std::iter::once(node_text(self.text, &node).into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_columns_are_doubled() {
        let position = LinePosition::new(3, 7);
        assert_eq!(point(position), Point::new(3, 14));
        assert_eq!(line_position(point(position)), position);
    }

    #[test]
    fn test_input_edit_uses_byte_offsets() {
        let edit = TextEdit {
            byte_range: ByteRange::from(4..8),
            bytes_added: ByteCount(6),
            start_line_position: LinePosition::new(0, 2),
            old_end_line_position: LinePosition::new(0, 4),
            new_end_line_position: LinePosition::new(1, 0),
        };
        let input = input_edit(&edit);
        assert_eq!(input.start_byte, 4);
        assert_eq!(input.old_end_byte, 8);
        assert_eq!(input.new_end_byte, 10);
        assert_eq!(input.old_end_position, Point::new(0, 8));
        assert_eq!(input.new_end_position, Point::new(1, 0));
    }
}
