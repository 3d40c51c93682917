use crate::line_tree::LineId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Errors produced by the text buffer, line manager and document.
///
/// These describe misuse (an offset the caller should never have produced) rather than routine
/// control flow. Hosts may log them and skip a frame instead of aborting.
pub enum CoreError {
    #[error("offset {offset} is outside the buffer (length {length})")]
    /// A UTF-16 offset was outside `0..=length`.
    OffsetOutOfBounds {
        /// The offending offset.
        offset: usize,
        /// The buffer length at the time of the call.
        length: usize,
    },

    #[error("range {location}+{length} is outside the buffer (length {buffer_length})")]
    /// A UTF-16 range extended past the end of the buffer.
    RangeOutOfBounds {
        /// Range start.
        location: usize,
        /// Range length.
        length: usize,
        /// The buffer length at the time of the call.
        buffer_length: usize,
    },

    #[error("offset {offset} falls inside a surrogate pair")]
    /// A UTF-16 offset split a character encoded as a surrogate pair.
    NotCharBoundary {
        /// The offending offset.
        offset: usize,
    },

    #[error("row {row} is outside the document ({line_count} lines)")]
    /// A row index was `>= line_count`.
    RowOutOfBounds {
        /// The offending row.
        row: usize,
        /// Number of lines in the document.
        line_count: usize,
    },

    #[error("line {0:?} no longer exists")]
    /// A line id referred to a line that has been removed.
    StaleLine(LineId),

    #[error("nothing to undo")]
    /// `undo()` was called with an empty undo stack.
    NothingToUndo,

    #[error("nothing to redo")]
    /// `redo()` was called with an empty redo stack.
    NothingToRedo,
}
