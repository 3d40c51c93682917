//! Line bookkeeping.
//!
//! [`LineManager`] maps UTF-16 offsets to rows and lines and keeps that mapping up to date as
//! text is inserted and removed. Lines are nodes in a red-black tree weighted by their total
//! length, so every lookup is O(log n).
//!
//! The manager does not own the text. Every mutating call takes the [`StringView`] and expects
//! it to already contain the change being applied: remove text from the buffer before calling
//! [`LineManager::remove_characters`] and insert it before calling [`LineManager::insert`].

use crate::byte::{ByteCount, ByteRange, TextRange};
use crate::error::CoreError;
use crate::line_change_set::LineChangeSet;
use crate::line_tree::{LineData, LineId, LineTree, LineTreeIter};
use crate::string_view::StringView;
use crate::text_edit::LinePosition;

const LINE_FEED: u16 = 0x0A;
const CARRIAGE_RETURN: u16 = 0x0D;

/// Default height assigned to lines before layout measures them.
pub const DEFAULT_ESTIMATED_LINE_HEIGHT: f64 = 12.0;

/// A snapshot of one line's position and size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// Stable identity of the line.
    pub id: LineId,
    /// Zero-based row.
    pub row: usize,
    /// Offset of the first code unit.
    pub location: usize,
    /// Length including the delimiter.
    pub total_length: usize,
    /// Length of the delimiter: 0 for none, 1 for LF or CR, 2 for CRLF.
    pub delimiter_length: usize,
    /// Layout height.
    pub height: f64,
    /// Sum of the heights of all preceding lines.
    pub y_position: f64,
}

impl Line {
    /// Length excluding the delimiter.
    pub fn length(&self) -> usize {
        self.total_length - self.delimiter_length
    }

    /// Range of the line including its delimiter.
    pub fn range(&self) -> TextRange {
        TextRange::new(self.location, self.total_length)
    }

    /// Range of the line's content, excluding the delimiter.
    pub fn content_range(&self) -> TextRange {
        TextRange::new(self.location, self.length())
    }

    /// Byte range of the line including its delimiter.
    pub fn byte_range(&self) -> ByteRange {
        ByteRange::from(self.range())
    }
}

/// Maintains the offset ↔ row ↔ line mapping of a document.
#[derive(Debug, Clone)]
pub struct LineManager {
    tree: LineTree,
    estimated_line_height: f64,
    initial_longest_line: Option<LineId>,
}

impl Default for LineManager {
    fn default() -> Self {
        Self::new()
    }
}

impl LineManager {
    /// Create a manager holding a single empty line.
    pub fn new() -> Self {
        Self::with_estimated_line_height(DEFAULT_ESTIMATED_LINE_HEIGHT)
    }

    /// Create a manager whose new lines start out with `height`.
    pub fn with_estimated_line_height(height: f64) -> Self {
        Self {
            tree: LineTree::new(LineData::new(0, 0, height)),
            estimated_line_height: height,
            initial_longest_line: None,
        }
    }

    /// Height given to lines that have not been measured.
    pub fn estimated_line_height(&self) -> f64 {
        self.estimated_line_height
    }

    /// Discard all lines and rebuild them by scanning `text` for delimiters.
    ///
    /// LF, CR and CRLF are recognised; CRLF counts as one two-unit delimiter.
    pub fn rebuild(&mut self, text: &StringView) {
        let height = self.estimated_line_height;
        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut offset = 0;
        let mut chars = text.rope().chars().peekable();
        while let Some(ch) = chars.next() {
            offset += ch.len_utf16();
            let delimiter_length = match ch {
                '\r' if chars.peek() == Some(&'\n') => {
                    chars.next();
                    offset += 1;
                    2
                }
                '\r' | '\n' => 1,
                _ => continue,
            };
            lines.push(LineData::new(offset - line_start, delimiter_length, height));
            line_start = offset;
        }
        lines.push(LineData::new(offset - line_start, 0, height));

        let ids = self.tree.rebuild(&lines);
        let mut longest: Option<(LineId, usize)> = None;
        for (id, data) in ids.iter().zip(&lines) {
            if longest.is_none_or(|(_, length)| data.total_length > length) {
                longest = Some((*id, data.total_length));
            }
        }
        self.initial_longest_line = longest.map(|(id, _)| id);
        tracing::trace!(
            target: "synedit::line_manager",
            line_count = lines.len(),
            "rebuilt line tree"
        );
    }

    /// Number of lines. Always at least one.
    pub fn line_count(&self) -> usize {
        self.tree.node_count()
    }

    /// Sum of all line lengths, which equals the buffer length.
    pub fn total_length(&self) -> usize {
        self.tree.total_length()
    }

    /// Sum of all line heights.
    pub fn content_height(&self) -> f64 {
        self.tree.total_height()
    }

    /// The longest line found by the last [`rebuild`](Self::rebuild).
    ///
    /// Not maintained across edits; `None` once that line has been removed.
    pub fn initial_longest_line(&self) -> Option<Line> {
        self.initial_longest_line.and_then(|id| self.line(id))
    }

    /// Look up a line by id. `None` if the line has been removed.
    pub fn line(&self, id: LineId) -> Option<Line> {
        let data = self.tree.data(id)?;
        Some(Line {
            id,
            row: self.tree.index_of(id)?,
            location: self.tree.location_of(id)?,
            total_length: data.total_length,
            delimiter_length: data.delimiter_length,
            height: data.height,
            y_position: self.tree.y_position_of(id)?,
        })
    }

    fn existing_line(&self, id: LineId) -> Result<Line, CoreError> {
        self.line(id).ok_or(CoreError::StaleLine(id))
    }

    /// The first line.
    pub fn first_line(&self) -> Option<Line> {
        self.tree.first().and_then(|id| self.line(id))
    }

    /// The last line.
    pub fn last_line(&self) -> Option<Line> {
        self.tree.last().and_then(|id| self.line(id))
    }

    /// The line following `id`.
    pub fn next_line(&self, id: LineId) -> Option<Line> {
        self.tree.next(id).and_then(|next| self.line(next))
    }

    /// The line preceding `id`.
    pub fn previous_line(&self, id: LineId) -> Option<Line> {
        self.tree.previous(id).and_then(|previous| self.line(previous))
    }

    /// The line containing the code unit at `location`.
    ///
    /// `location == total_length()` yields the last line. Anything past that is an error.
    pub fn line_containing_character_at(&self, location: usize) -> Result<Line, CoreError> {
        let length = self.total_length();
        let out_of_bounds = CoreError::OffsetOutOfBounds {
            offset: location,
            length,
        };
        if location > length {
            return Err(out_of_bounds);
        }
        let id = self
            .tree
            .node_containing_location(location)
            .ok_or(out_of_bounds)?;
        self.existing_line(id)
    }

    /// The line containing the parser byte `byte`.
    pub fn line_containing_byte(&self, byte: ByteCount) -> Result<Line, CoreError> {
        self.line_containing_character_at(byte.utf16_length())
    }

    /// The line at `row`.
    pub fn line_at_row(&self, row: usize) -> Result<Line, CoreError> {
        let line_count = self.line_count();
        let id = self
            .tree
            .node_at_index(row)
            .ok_or(CoreError::RowOutOfBounds { row, line_count })?;
        self.existing_line(id)
    }

    /// The line whose vertical extent contains `y`.
    pub fn line_containing_y_offset(&self, y: f64) -> Option<Line> {
        self.tree.node_containing_y(y).and_then(|id| self.line(id))
    }

    /// Row and column of `location`.
    pub fn line_position_at(&self, location: usize) -> Result<LinePosition, CoreError> {
        let line = self.line_containing_character_at(location)?;
        Ok(LinePosition::new(line.row, location - line.location))
    }

    /// Offset of a row/column position. The column is clamped to the line's total length.
    pub fn location_at(&self, position: LinePosition) -> Result<usize, CoreError> {
        let line = self.line_at_row(position.row)?;
        Ok(line.location + position.column.min(line.total_length))
    }

    /// All lines overlapping `range`, in document order.
    pub fn lines_in(&self, range: TextRange) -> Result<Vec<Line>, CoreError> {
        let first = self.line_containing_character_at(range.location)?;
        let mut lines = vec![first];
        if range.length > 0 {
            let last = self.line_containing_character_at(range.upper_bound())?;
            let mut current = first;
            while current.id != last.id {
                let Some(next) = self.next_line(current.id) else {
                    break;
                };
                lines.push(next);
                current = next;
            }
        }
        Ok(lines)
    }

    /// The lines containing the start and the end of `range`.
    pub fn start_and_end_line(&self, range: TextRange) -> Result<(Line, Line), CoreError> {
        let start = self.line_containing_character_at(range.location)?;
        if range.is_empty() {
            return Ok((start, start));
        }
        let end = self.line_containing_character_at(range.upper_bound())?;
        Ok((start, end))
    }

    /// Set the layout height of a line. Returns whether the height changed.
    pub fn set_height(&mut self, id: LineId, height: f64) -> Result<bool, CoreError> {
        let data = self.tree.data(id).ok_or(CoreError::StaleLine(id))?;
        if (data.height - height).abs() < f64::EPSILON {
            return Ok(false);
        }
        self.tree.update(id, |data| data.height = height);
        Ok(true)
    }

    /// A lazy forward iterator over all lines. Create a new one to restart.
    pub fn line_iter(&self) -> LineIter<'_> {
        LineIter {
            manager: self,
            ids: self.tree.iter(),
            row: 0,
            location: 0,
            y_position: 0.0,
        }
    }

    /// Update the tree after `range` was removed from the buffer.
    ///
    /// `text` must already have the range removed.
    pub fn remove_characters(
        &mut self,
        text: &StringView,
        range: TextRange,
    ) -> Result<LineChangeSet, CoreError> {
        if range.is_empty() {
            return Ok(LineChangeSet::new());
        }
        let total = self.total_length();
        if range.upper_bound() > total {
            return Err(CoreError::RangeOutOfBounds {
                location: range.location,
                length: range.length,
                buffer_length: total,
            });
        }
        tracing::trace!(
            target: "synedit::line_manager",
            location = range.location,
            length = range.length,
            "remove characters"
        );
        let start_line = self.line_containing_character_at(range.location)?;
        if range.location > start_line.location + start_line.length() {
            // The removal starts between the CR and LF of a CRLF delimiter.
            let (mut changes, _) =
                self.set_length(text, start_line.id, start_line.total_length - 1)?;
            let rest = TextRange::new(range.location, range.length - 1);
            changes.union(self.remove_characters(text, rest)?);
            // The start line now ends in a bare CR; a lone LF after it completes a CRLF.
            if let Some(next) = self.tree.next(start_line.id) {
                let location = self
                    .tree
                    .location_of(next)
                    .ok_or(CoreError::StaleLine(next))?;
                let next_length = self
                    .tree
                    .data(next)
                    .ok_or(CoreError::StaleLine(next))?
                    .total_length;
                if next_length == 1 && text.code_unit_at(location) == Some(LINE_FEED) {
                    let (other, _) = self.set_length(text, next, next_length)?;
                    changes.union(other);
                }
            }
            return Ok(changes);
        }
        if range.upper_bound() < start_line.location + start_line.total_length {
            // Only part of the start line is removed.
            let (changes, _) =
                self.set_length(text, start_line.id, start_line.total_length - range.length)?;
            return Ok(changes);
        }

        // The start line's delimiter was removed, so it merges with the line containing the end
        // of the range. Every line in between disappears.
        let removed_in_start_line = start_line.location + start_line.total_length - range.location;
        let end_line = self.line_containing_character_at(range.upper_bound())?;
        if end_line.id == start_line.id {
            let (changes, _) =
                self.set_length(text, start_line.id, start_line.total_length - range.length)?;
            return Ok(changes);
        }
        let left_in_end_line = end_line.location + end_line.total_length - range.upper_bound();
        let mut changes = LineChangeSet::new();
        loop {
            let next = self
                .tree
                .next(start_line.id)
                .ok_or(CoreError::StaleLine(end_line.id))?;
            changes.mark_removed(next);
            self.tree.remove(next);
            if next == end_line.id {
                break;
            }
        }
        let new_length = start_line.total_length - removed_in_start_line + left_in_end_line;
        let (other, _) = self.set_length(text, start_line.id, new_length)?;
        changes.union(other);
        Ok(changes)
    }

    /// Update the tree after `string` was inserted into the buffer at `location`.
    ///
    /// `text` must already contain the inserted string.
    pub fn insert(
        &mut self,
        text: &StringView,
        string: &str,
        location: usize,
    ) -> Result<LineChangeSet, CoreError> {
        let mut changes = LineChangeSet::new();
        if string.is_empty() {
            return Ok(changes);
        }
        tracing::trace!(
            target: "synedit::line_manager",
            location,
            length = string.len(),
            "insert"
        );
        let mut line = self.line_containing_character_at(location)?;
        if location > line.location + line.length() {
            // Inserting between the CR and LF of a CRLF delimiter splits it in two.
            let (other, _) = self.set_length(text, line.id, line.total_length - 1)?;
            changes.union(other);
            let inserted = self.insert_line(line.id, 1)?;
            changes.mark_inserted(inserted);
            let (other, current) = self.set_length(text, inserted, 1)?;
            changes.union(other);
            line = self.existing_line(current)?;
        }

        let string_length = string.encode_utf16().count();
        let newlines = newline_ranges(string);
        if newlines.is_empty() {
            let (other, _) = self.set_length(text, line.id, line.total_length + string_length)?;
            changes.union(other);
            return Ok(changes);
        }

        let mut current = line.id;
        let mut last_delimiter_end = 0;
        for newline in newlines {
            let line = self.existing_line(current)?;
            let line_break_location = location + newline.upper_bound();
            let length_after_insertion = (line.location + line.total_length)
                .saturating_sub(location + last_delimiter_end);
            let (other, split) =
                self.set_length(text, line.id, line_break_location - line.location)?;
            changes.union(other);
            let inserted = self.insert_line(split, length_after_insertion)?;
            changes.mark_inserted(inserted);
            let (other, inserted) = self.set_length(text, inserted, length_after_insertion)?;
            changes.union(other);
            current = inserted;
            last_delimiter_end = newline.upper_bound();
        }
        if last_delimiter_end != string_length {
            let line = self.existing_line(current)?;
            let new_length = line.total_length + string_length - last_delimiter_end;
            let (other, _) = self.set_length(text, current, new_length)?;
            changes.union(other);
        }
        Ok(changes)
    }

    fn insert_line(&mut self, after: LineId, length: usize) -> Result<LineId, CoreError> {
        self.tree
            .insert_after(after, LineData::new(length, 0, self.estimated_line_height))
            .ok_or(CoreError::StaleLine(after))
    }

    /// Set a line's total length and recompute its delimiter from the buffer.
    ///
    /// A line consisting of a lone LF that directly follows a CR is folded into the previous
    /// line, forming a CRLF. Returns the line that now holds the content, which is the previous
    /// line in that case.
    fn set_length(
        &mut self,
        text: &StringView,
        line: LineId,
        new_total_length: usize,
    ) -> Result<(LineChangeSet, LineId), CoreError> {
        let mut changes = LineChangeSet::new();
        changes.mark_edited(line);
        if !self
            .tree
            .update(line, |data| data.total_length = new_total_length)
        {
            return Err(CoreError::StaleLine(line));
        }
        let location = self
            .tree
            .location_of(line)
            .ok_or(CoreError::StaleLine(line))?;

        let delimiter_length = if new_total_length == 0 {
            0
        } else {
            match text.code_unit_at(location + new_total_length - 1) {
                Some(CARRIAGE_RETURN) => 1,
                Some(LINE_FEED) => {
                    let before = |offset: usize| text.code_unit_at(offset);
                    if new_total_length >= 2
                        && before(location + new_total_length - 2) == Some(CARRIAGE_RETURN)
                    {
                        2
                    } else if new_total_length == 1
                        && location > 0
                        && before(location - 1) == Some(CARRIAGE_RETURN)
                    {
                        let previous = self.tree.previous(line).ok_or(CoreError::StaleLine(line))?;
                        let previous_length = self
                            .tree
                            .data(previous)
                            .ok_or(CoreError::StaleLine(previous))?
                            .total_length;
                        changes.mark_removed(line);
                        self.tree.remove(line);
                        let (other, merged) =
                            self.set_length(text, previous, previous_length + 1)?;
                        changes.union(other);
                        return Ok((changes, merged));
                    } else {
                        1
                    }
                }
                _ => 0,
            }
        };
        self.tree
            .update(line, |data| data.delimiter_length = delimiter_length);
        Ok((changes, line))
    }
}

/// Lazy forward iterator over lines, created by [`LineManager::line_iter`].
pub struct LineIter<'a> {
    manager: &'a LineManager,
    ids: LineTreeIter<'a>,
    row: usize,
    location: usize,
    y_position: f64,
}

impl Iterator for LineIter<'_> {
    type Item = Line;

    fn next(&mut self) -> Option<Line> {
        let id = self.ids.next()?;
        let data = self.manager.tree.data(id)?;
        let line = Line {
            id,
            row: self.row,
            location: self.location,
            total_length: data.total_length,
            delimiter_length: data.delimiter_length,
            height: data.height,
            y_position: self.y_position,
        };
        self.row += 1;
        self.location += data.total_length;
        self.y_position += data.height;
        Some(line)
    }
}

/// UTF-16 ranges of the delimiters in `string`, treating CRLF as one delimiter.
fn newline_ranges(string: &str) -> Vec<TextRange> {
    let mut ranges = Vec::new();
    let mut offset = 0;
    let mut chars = string.chars().peekable();
    while let Some(ch) = chars.next() {
        let start = offset;
        offset += ch.len_utf16();
        match ch {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                offset += 1;
                ranges.push(TextRange::new(start, 2));
            }
            '\r' | '\n' => ranges.push(TextRange::new(start, 1)),
            _ => {}
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newline_ranges() {
        assert_eq!(
            newline_ranges("a\nb\r\nc\rd"),
            vec![
                TextRange::new(1, 1),
                TextRange::new(3, 2),
                TextRange::new(6, 1)
            ]
        );
        assert!(newline_ranges("plain").is_empty());
    }
}
