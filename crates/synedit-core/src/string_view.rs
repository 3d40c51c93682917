//! The text buffer.
//!
//! [`StringView`] owns the document text in a [`Rope`] and addresses it in UTF-16 code units,
//! which is the unit every offset in this crate uses. Cloning is O(1) and yields an immutable
//! snapshot, so background parsing and highlighting read a clone while edits keep mutating
//! the original.

use crate::byte::{ByteCount, ByteRange, TextRange};
use crate::error::CoreError;
use ropey::Rope;

/// Owns the document text. All offsets are UTF-16 code units.
#[derive(Debug, Clone, Default)]
pub struct StringView {
    rope: Rope,
}

impl StringView {
    /// Create a buffer holding `text`.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.rope.len_utf16_cu()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Length in parser bytes.
    pub fn byte_len(&self) -> ByteCount {
        ByteCount::from_utf16_length(self.len())
    }

    /// The full text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// The underlying rope.
    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    /// Replace the whole text.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    /// Check that `range` lies inside the buffer and both bounds are character boundaries.
    pub(crate) fn check_range(&self, range: TextRange) -> Result<(), CoreError> {
        let buffer_length = self.len();
        if range.upper_bound() > buffer_length {
            return Err(CoreError::RangeOutOfBounds {
                location: range.location,
                length: range.length,
                buffer_length,
            });
        }
        for offset in [range.location, range.upper_bound()] {
            if !self.is_char_boundary(offset) {
                return Err(CoreError::NotCharBoundary { offset });
            }
        }
        Ok(())
    }

    /// Whether `offset` does not split a surrogate pair. Offsets past the end are not boundaries.
    pub fn is_char_boundary(&self, offset: usize) -> bool {
        offset <= self.len()
            && self
                .rope
                .char_to_utf16_cu(self.rope.utf16_cu_to_char(offset))
                == offset
    }

    fn char_range(&self, range: TextRange) -> std::ops::Range<usize> {
        let start = self.rope.utf16_cu_to_char(range.location);
        let end = self.rope.utf16_cu_to_char(range.upper_bound());
        start..end
    }

    /// Text covered by `range`.
    ///
    /// Fails with [`CoreError::NotCharBoundary`] when a bound splits a surrogate pair.
    pub fn substring(&self, range: TextRange) -> Result<String, CoreError> {
        self.check_range(range)?;
        let chars = self.char_range(range);
        Ok(self.rope.slice(chars).to_string())
    }

    /// The UTF-16 code unit at `offset`, or `None` past the end.
    pub fn code_unit_at(&self, offset: usize) -> Option<u16> {
        if offset >= self.len() {
            return None;
        }
        let char_idx = self.rope.utf16_cu_to_char(offset);
        let ch = self.rope.get_char(char_idx)?;
        let char_start = self.rope.char_to_utf16_cu(char_idx);
        let mut buf = [0u16; 2];
        let units = ch.encode_utf16(&mut buf);
        units.get(offset - char_start).copied()
    }

    /// Replace the text in `range` with `text`.
    ///
    /// Nothing is changed when `range` is rejected.
    pub fn replace(&mut self, range: TextRange, text: &str) -> Result<(), CoreError> {
        self.check_range(range)?;
        let chars = self.char_range(range);
        let start = chars.start;
        if !chars.is_empty() {
            self.rope.remove(chars);
        }
        if !text.is_empty() {
            self.rope.insert(start, text);
        }
        Ok(())
    }

    /// Up to `max_units` code units starting at `offset`.
    ///
    /// Returns an empty chunk at or past the end of the buffer. The chunk may end in the middle
    /// of a surrogate pair; reading the next chunk at the following offset resumes correctly.
    pub fn utf16_chunk(&self, offset: usize, max_units: usize) -> Vec<u16> {
        let len = self.len();
        if offset >= len || max_units == 0 {
            return Vec::new();
        }
        let char_idx = self.rope.utf16_cu_to_char(offset);
        let mut skip = offset - self.rope.char_to_utf16_cu(char_idx);
        let mut out = Vec::with_capacity(max_units.min(len - offset));
        let mut buf = [0u16; 2];
        'chars: for ch in self.rope.chars_at(char_idx) {
            for unit in ch.encode_utf16(&mut buf).iter() {
                if skip > 0 {
                    skip -= 1;
                    continue;
                }
                out.push(*unit);
                if out.len() == max_units {
                    break 'chars;
                }
            }
        }
        out
    }

    /// UTF-16LE bytes covering `range`, or `None` when the range is outside the buffer or
    /// does not start on a code-unit boundary.
    pub fn bytes(&self, range: ByteRange) -> Option<Vec<u8>> {
        if range.location.value() % 2 != 0 || range.length.value() % 2 != 0 {
            return None;
        }
        let text_range = range.to_text_range();
        if text_range.upper_bound() > self.len() {
            return None;
        }
        let units = self.utf16_chunk(text_range.location, text_range.length);
        Some(units.iter().flat_map(|unit| unit.to_le_bytes()).collect())
    }
}

impl From<&str> for StringView {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16_lengths() {
        let view = StringView::new("a😀b");
        assert_eq!(view.len(), 4);
        assert_eq!(view.byte_len(), ByteCount(8));
    }

    #[test]
    fn test_code_unit_at_surrogates() {
        let view = StringView::new("a😀b");
        assert_eq!(view.code_unit_at(0), Some(u16::from(b'a')));
        assert_eq!(view.code_unit_at(1), Some(0xD83D));
        assert_eq!(view.code_unit_at(2), Some(0xDE00));
        assert_eq!(view.code_unit_at(3), Some(u16::from(b'b')));
        assert_eq!(view.code_unit_at(4), None);
    }

    #[test]
    fn test_replace_and_substring() {
        let mut view = StringView::new("hello world");
        view.replace(TextRange::new(6, 5), "there").unwrap();
        assert_eq!(view.text(), "hello there");
        assert_eq!(view.substring(TextRange::new(0, 5)).unwrap(), "hello");
        assert!(view.substring(TextRange::new(8, 10)).is_err());
    }

    #[test]
    fn test_bounds_inside_surrogate_pair_are_rejected() {
        let mut view = StringView::new("a😀b");
        assert!(view.is_char_boundary(1));
        assert!(!view.is_char_boundary(2));
        assert!(view.is_char_boundary(4));
        assert!(!view.is_char_boundary(5));

        assert_eq!(
            view.replace(TextRange::new(2, 1), ""),
            Err(CoreError::NotCharBoundary { offset: 2 })
        );
        assert_eq!(
            view.substring(TextRange::new(0, 2)),
            Err(CoreError::NotCharBoundary { offset: 2 })
        );
        assert_eq!(view.text(), "a😀b");
    }

    #[test]
    fn test_utf16_chunk_resumes_inside_surrogate_pair() {
        let view = StringView::new("x😀y");
        let first = view.utf16_chunk(0, 2);
        let second = view.utf16_chunk(2, 8);
        let mut joined = first;
        joined.extend(second);
        assert_eq!(String::from_utf16(&joined).unwrap(), "x😀y");
    }

    #[test]
    fn test_bytes_little_endian() {
        let view = StringView::new("ab");
        assert_eq!(
            view.bytes(ByteRange::from(0..4)),
            Some(vec![b'a', 0, b'b', 0])
        );
        assert_eq!(view.bytes(ByteRange::from(1..3)), None);
    }
}
