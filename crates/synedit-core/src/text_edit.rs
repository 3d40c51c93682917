//! The edit descriptor handed from the buffer to the syntax layer.

use crate::byte::{ByteCount, ByteRange};

/// A zero-based row and a UTF-16 column within that row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinePosition {
    /// Zero-based row.
    pub row: usize,
    /// Column in UTF-16 code units from the start of the row.
    pub column: usize,
}

impl LinePosition {
    /// Create a line position.
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// Describes one text mutation in parser coordinates.
///
/// `old_end_line_position` is measured before the mutation; `start_line_position` and
/// `new_end_line_position` afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEdit {
    /// Bytes replaced by the edit, in the pre-edit text.
    pub byte_range: ByteRange,
    /// Bytes inserted in place of `byte_range`.
    pub bytes_added: ByteCount,
    /// Where the edit starts.
    pub start_line_position: LinePosition,
    /// Where the replaced text used to end.
    pub old_end_line_position: LinePosition,
    /// Where the inserted text now ends.
    pub new_end_line_position: LinePosition,
}

impl TextEdit {
    /// Start of the edit.
    pub fn start_byte(&self) -> ByteCount {
        self.byte_range.location
    }

    /// Bytes removed by the edit.
    pub fn bytes_removed(&self) -> ByteCount {
        self.byte_range.length
    }

    /// End of the replaced bytes in the pre-edit text.
    pub fn old_end_byte(&self) -> ByteCount {
        self.byte_range.upper_bound()
    }

    /// End of the inserted bytes in the post-edit text.
    pub fn new_end_byte(&self) -> ByteCount {
        self.byte_range.location + self.bytes_added
    }

    /// Map a pre-edit byte offset into the post-edit text.
    ///
    /// Offsets before the edit are unchanged, offsets after it shift by the size difference and
    /// offsets inside the replaced span collapse to the end of the inserted text.
    pub fn map_byte(&self, byte: ByteCount) -> ByteCount {
        if byte <= self.start_byte() {
            byte
        } else if byte >= self.old_end_byte() {
            byte + self.bytes_added - self.bytes_removed()
        } else {
            self.new_end_byte()
        }
    }

    /// Map a pre-edit byte range into the post-edit text.
    pub fn map_range(&self, range: ByteRange) -> ByteRange {
        ByteRange::from_bounds(
            self.map_byte(range.lower_bound()),
            self.map_byte(range.upper_bound()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(start: usize, removed: usize, added: usize) -> TextEdit {
        TextEdit {
            byte_range: ByteRange::from(start..start + removed),
            bytes_added: ByteCount(added),
            start_line_position: LinePosition::default(),
            old_end_line_position: LinePosition::default(),
            new_end_line_position: LinePosition::default(),
        }
    }

    #[test]
    fn test_map_byte() {
        let e = edit(10, 4, 8);
        assert_eq!(e.map_byte(ByteCount(2)), ByteCount(2));
        assert_eq!(e.map_byte(ByteCount(10)), ByteCount(10));
        assert_eq!(e.map_byte(ByteCount(12)), ByteCount(18));
        assert_eq!(e.map_byte(ByteCount(14)), ByteCount(18));
        assert_eq!(e.map_byte(ByteCount(20)), ByteCount(24));
    }

    #[test]
    fn test_map_range_after_deletion() {
        let e = edit(0, 6, 0);
        assert_eq!(
            e.map_range(ByteRange::from(10..20)),
            ByteRange::from(4..14)
        );
    }
}
