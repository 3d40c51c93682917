//! Linear undo/redo history for [`Document`](crate::Document).

/// One recorded replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextChange {
    /// Location of the replacement in UTF-16 code units.
    pub(crate) location: usize,
    pub(crate) old_text: String,
    pub(crate) new_text: String,
}

impl TextChange {
    pub(crate) fn old_len(&self) -> usize {
        self.old_text.encode_utf16().count()
    }

    pub(crate) fn new_len(&self) -> usize {
        self.new_text.encode_utf16().count()
    }
}

#[derive(Debug, Clone)]
pub(crate) struct UndoStep {
    group_id: usize,
    pub(crate) change: TextChange,
}

#[derive(Debug)]
pub(crate) struct UndoHistory {
    undo_stack: Vec<UndoStep>,
    redo_stack: Vec<UndoStep>,
    max_undo: usize,
    /// Saved position in the linear history, as an `undo_stack` length. May point into the redo
    /// area while `redo_stack` is non-empty.
    clean_index: Option<usize>,
    next_group_id: usize,
    open_group_id: Option<usize>,
}

impl UndoHistory {
    pub(crate) fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_undo,
            clean_index: Some(0),
            next_group_id: 0,
            open_group_id: None,
        }
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub(crate) fn is_clean(&self) -> bool {
        self.clean_index == Some(self.undo_stack.len())
    }

    pub(crate) fn mark_clean(&mut self) {
        self.clean_index = Some(self.undo_stack.len());
        self.end_group();
    }

    /// Changes recorded until [`end_group`](Self::end_group) undo as one step.
    pub(crate) fn begin_group(&mut self) {
        if self.open_group_id.is_none() {
            self.open_group_id = Some(self.allocate_group_id());
        }
    }

    pub(crate) fn end_group(&mut self) {
        self.open_group_id = None;
    }

    pub(crate) fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.clean_index = None;
        self.open_group_id = None;
    }

    pub(crate) fn record(&mut self, change: TextChange) {
        self.clear_redo_and_adjust_clean();

        if self.max_undo == 0 {
            return;
        }
        if self.undo_stack.len() >= self.max_undo {
            self.undo_stack.remove(0);
            self.clean_index = match self.clean_index {
                Some(0) | None => None,
                Some(index) => Some(index - 1),
            };
        }

        let group_id = match self.open_group_id {
            Some(group_id) => group_id,
            None => self.allocate_group_id(),
        };
        self.undo_stack.push(UndoStep { group_id, change });
    }

    /// Steps of the most recent group, newest first.
    pub(crate) fn pop_undo_group(&mut self) -> Option<Vec<UndoStep>> {
        self.end_group();
        Self::pop_group(&mut self.undo_stack)
    }

    /// Steps of the next redo group, oldest first.
    pub(crate) fn pop_redo_group(&mut self) -> Option<Vec<UndoStep>> {
        self.end_group();
        Self::pop_group(&mut self.redo_stack)
    }

    /// Return undone steps (newest first) to the redo stack.
    pub(crate) fn push_redo(&mut self, steps: Vec<UndoStep>) {
        self.redo_stack.extend(steps);
    }

    /// Return redone steps (oldest first) to the undo stack.
    pub(crate) fn push_undo(&mut self, steps: Vec<UndoStep>) {
        self.undo_stack.extend(steps);
    }

    /// Put back undo steps (newest first) that could not be applied.
    pub(crate) fn restore_undo(&mut self, steps: Vec<UndoStep>) {
        self.undo_stack.extend(steps.into_iter().rev());
    }

    /// Put back redo steps (oldest first) that could not be applied.
    pub(crate) fn restore_redo(&mut self, steps: Vec<UndoStep>) {
        self.redo_stack.extend(steps.into_iter().rev());
    }

    fn allocate_group_id(&mut self) -> usize {
        let group_id = self.next_group_id;
        self.next_group_id = self.next_group_id.wrapping_add(1);
        group_id
    }

    fn clear_redo_and_adjust_clean(&mut self) {
        if self.redo_stack.is_empty() {
            return;
        }

        // A clean point in the redo area becomes unreachable.
        if let Some(clean_index) = self.clean_index
            && clean_index > self.undo_stack.len()
        {
            self.clean_index = None;
        }

        self.redo_stack.clear();
    }

    fn pop_group(stack: &mut Vec<UndoStep>) -> Option<Vec<UndoStep>> {
        let group_id = stack.last()?.group_id;
        let mut steps = Vec::new();
        while stack.last().is_some_and(|step| step.group_id == group_id) {
            if let Some(step) = stack.pop() {
                steps.push(step);
            }
        }
        Some(steps)
    }
}
