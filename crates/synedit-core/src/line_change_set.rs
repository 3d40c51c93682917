//! Lines touched by one edit.

use crate::line_tree::LineId;
use std::collections::HashSet;

/// Lines inserted, removed or edited while applying one text change.
///
/// Consumed by the rendering layer to decide which lines need to be redisplayed. A line is in
/// at most one of the three sets: removal wins over insertion and editing, and an inserted line
/// is not additionally reported as edited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineChangeSet {
    inserted: HashSet<LineId>,
    removed: HashSet<LineId>,
    edited: HashSet<LineId>,
}

impl LineChangeSet {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `line` was inserted.
    pub fn mark_inserted(&mut self, line: LineId) {
        self.removed.remove(&line);
        self.edited.remove(&line);
        self.inserted.insert(line);
    }

    /// Record that `line` was removed.
    pub fn mark_removed(&mut self, line: LineId) {
        self.inserted.remove(&line);
        self.edited.remove(&line);
        self.removed.insert(line);
    }

    /// Record that `line` was edited. Ignored for lines already inserted or removed.
    pub fn mark_edited(&mut self, line: LineId) {
        if !self.inserted.contains(&line) && !self.removed.contains(&line) {
            self.edited.insert(line);
        }
    }

    /// Merge `other` into `self`.
    pub fn union(&mut self, other: LineChangeSet) {
        for line in other.removed {
            self.mark_removed(line);
        }
        for line in other.inserted {
            if !self.removed.contains(&line) {
                self.mark_inserted(line);
            }
        }
        for line in other.edited {
            self.mark_edited(line);
        }
    }

    /// Lines inserted by the edit.
    pub fn inserted_lines(&self) -> &HashSet<LineId> {
        &self.inserted
    }

    /// Lines removed by the edit.
    pub fn removed_lines(&self) -> &HashSet<LineId> {
        &self.removed
    }

    /// Lines whose content or syntax changed.
    pub fn edited_lines(&self) -> &HashSet<LineId> {
        &self.edited
    }

    /// Whether the line was inserted or edited.
    pub fn touches(&self, line: LineId) -> bool {
        self.inserted.contains(&line) || self.edited.contains(&line)
    }

    /// Whether lines were added or removed.
    pub fn did_add_or_remove_lines(&self) -> bool {
        !self.inserted.is_empty() || !self.removed.is_empty()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.inserted.is_empty() && self.removed.is_empty() && self.edited.is_empty()
    }
}
