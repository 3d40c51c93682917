//! Byte units shared with the parser.
//!
//! The text buffer counts UTF-16 code units. Tree-sitter is fed the same text as UTF-16LE, so
//! its byte offsets are always exactly twice the code-unit offsets. Every conversion between
//! the two spaces goes through this module so the factor of two lives in one place.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Number of bytes in one UTF-16 code unit.
const BYTES_PER_CODE_UNIT: usize = 2;

/// A length or offset measured in parser bytes (UTF-16 code units × 2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteCount(pub usize);

impl ByteCount {
    /// Zero bytes.
    pub const ZERO: Self = Self(0);

    /// Create a byte count from a raw value.
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Byte count covering `length` UTF-16 code units.
    pub const fn from_utf16_length(length: usize) -> Self {
        Self(length * BYTES_PER_CODE_UNIT)
    }

    /// Number of UTF-16 code units covered by this byte count.
    pub const fn utf16_length(self) -> usize {
        self.0 / BYTES_PER_CODE_UNIT
    }

    /// Raw value.
    pub const fn value(self) -> usize {
        self.0
    }
}

impl fmt::Display for ByteCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for ByteCount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for ByteCount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for ByteCount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for ByteCount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Mul<usize> for ByteCount {
    type Output = Self;

    fn mul(self, rhs: usize) -> Self {
        Self(self.0 * rhs)
    }
}

impl From<usize> for ByteCount {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// A range of UTF-16 code units in the text buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextRange {
    /// First code unit of the range.
    pub location: usize,
    /// Number of code units in the range.
    pub length: usize,
}

impl TextRange {
    /// Create a range from a location and a length.
    pub const fn new(location: usize, length: usize) -> Self {
        Self { location, length }
    }

    /// Create a range from `[lower, upper)`. `upper` is clamped to be at least `lower`.
    pub fn from_bounds(lower: usize, upper: usize) -> Self {
        Self {
            location: lower,
            length: upper.saturating_sub(lower),
        }
    }

    /// Exclusive end of the range.
    pub const fn upper_bound(&self) -> usize {
        self.location + self.length
    }

    /// Whether the range covers no code units.
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether `offset` falls in `[location, upper_bound)`.
    pub const fn contains(&self, offset: usize) -> bool {
        self.location <= offset && offset < self.upper_bound()
    }
}

/// A range of parser bytes: `{location, length}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ByteRange {
    /// Start of the range.
    pub location: ByteCount,
    /// Length of the range.
    pub length: ByteCount,
}

impl ByteRange {
    /// Create a range from a location and a length.
    pub const fn new(location: ByteCount, length: ByteCount) -> Self {
        Self { location, length }
    }

    /// Create a range covering `[lower, upper)`. `upper` is clamped to be at least `lower`.
    pub fn from_bounds(lower: ByteCount, upper: ByteCount) -> Self {
        Self {
            location: lower,
            length: ByteCount(upper.0.saturating_sub(lower.0)),
        }
    }

    /// Start of the range.
    pub const fn lower_bound(&self) -> ByteCount {
        self.location
    }

    /// Exclusive end of the range.
    pub const fn upper_bound(&self) -> ByteCount {
        ByteCount(self.location.0 + self.length.0)
    }

    /// Whether the range has zero length.
    pub const fn is_empty(&self) -> bool {
        self.length.0 == 0
    }

    /// Whether `byte` falls in `[lower_bound, upper_bound)`.
    pub fn contains(&self, byte: ByteCount) -> bool {
        self.lower_bound() <= byte && byte < self.upper_bound()
    }

    /// Whether the two closed-open ranges intersect.
    ///
    /// Ranges that merely touch at a boundary do not overlap. Two empty ranges overlap only
    /// when they sit at the same location; an empty range never overlaps a non-empty range it
    /// touches.
    pub fn overlaps(&self, other: &ByteRange) -> bool {
        if self.is_empty() && other.is_empty() {
            return self.location == other.location;
        }
        if self.is_empty() {
            return other.lower_bound() < self.location && self.location < other.upper_bound();
        }
        if other.is_empty() {
            return self.lower_bound() < other.location && other.location < self.upper_bound();
        }
        self.lower_bound() < other.upper_bound() && other.lower_bound() < self.upper_bound()
    }

    /// Convert back to a UTF-16 range.
    pub const fn to_text_range(&self) -> TextRange {
        TextRange {
            location: self.location.utf16_length(),
            length: self.length.utf16_length(),
        }
    }

    /// Standard library range over the raw byte values.
    pub const fn as_std_range(&self) -> std::ops::Range<usize> {
        self.location.0..self.location.0 + self.length.0
    }
}

impl From<TextRange> for ByteRange {
    fn from(range: TextRange) -> Self {
        Self {
            location: ByteCount::from_utf16_length(range.location),
            length: ByteCount::from_utf16_length(range.length),
        }
    }
}

impl From<std::ops::Range<usize>> for ByteRange {
    fn from(range: std::ops::Range<usize>) -> Self {
        Self::from_bounds(ByteCount(range.start), ByteCount(range.end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_count_conversions() {
        assert_eq!(ByteCount::from_utf16_length(5), ByteCount(10));
        assert_eq!(ByteCount(10).utf16_length(), 5);
        assert_eq!(ByteCount(4) + ByteCount(6), ByteCount(10));
        assert_eq!(ByteCount(6) - ByteCount(4), ByteCount(2));
        assert_eq!(ByteCount(3) * 2, ByteCount(6));
    }

    #[test]
    fn test_text_range_round_trip() {
        for location in 0..20 {
            for length in 0..20 {
                let range = TextRange::new(location, length);
                assert_eq!(ByteRange::from(range).to_text_range(), range);
            }
        }
    }

    #[test]
    fn test_overlaps_closed_open() {
        let a = ByteRange::from(0..10);
        let b = ByteRange::from(5..15);
        let c = ByteRange::from(10..20);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(!c.overlaps(&a));
    }

    #[test]
    fn test_overlaps_empty_ranges() {
        let range = ByteRange::from(0..10);
        assert!(ByteRange::from(4..4).overlaps(&range));
        assert!(!ByteRange::from(0..0).overlaps(&range));
        assert!(!ByteRange::from(10..10).overlaps(&range));
        assert!(ByteRange::from(3..3).overlaps(&ByteRange::from(3..3)));
        assert!(!ByteRange::from(3..3).overlaps(&ByteRange::from(4..4)));
    }
}
