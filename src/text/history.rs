//! Grouped undo/redo history for [`Buffer`](super::Buffer).

use crate::changes::ChangeKind;
use crate::coord::Coord;

/// Default maximum number of undo groups to retain.
pub const DEFAULT_MAX_HISTORY_DEPTH: usize = 1000;

/// A recorded primitive edit: `content` inserted or erased at `coord`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Modification {
    pub kind: ChangeKind,
    pub coord: Coord,
    pub content: String,
}

impl Modification {
    /// The edit that undoes this one.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let kind = match self.kind {
            ChangeKind::Insert => ChangeKind::Erase,
            ChangeKind::Erase => ChangeKind::Insert,
        };
        Self {
            kind,
            coord: self.coord,
            content: self.content.clone(),
        }
    }
}

/// Edit history with bounded memory usage.
#[derive(Clone, Debug)]
pub(crate) struct History {
    undo_stack: Vec<Vec<Modification>>,
    redo_stack: Vec<Vec<Modification>>,
    current_group: Vec<Modification>,
    /// Oldest groups are dropped past this depth.
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_max_depth(DEFAULT_MAX_HISTORY_DEPTH)
    }
}

impl History {
    pub(crate) fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            current_group: Vec::new(),
            max_depth,
        }
    }

    pub(crate) fn push(&mut self, modification: Modification) {
        self.current_group.push(modification);
        self.redo_stack.clear();
    }

    pub(crate) fn commit(&mut self) {
        if !self.current_group.is_empty() {
            let group = std::mem::take(&mut self.current_group);
            self.push_undo(group);
        }
    }

    pub(crate) fn push_undo(&mut self, group: Vec<Modification>) {
        self.undo_stack.push(group);
        if self.undo_stack.len() > self.max_depth {
            let excess = self.undo_stack.len() - self.max_depth;
            self.undo_stack.drain(..excess);
        }
    }

    pub(crate) fn pop_undo(&mut self) -> Option<Vec<Modification>> {
        self.commit();
        self.undo_stack.pop()
    }

    pub(crate) fn push_redo(&mut self, group: Vec<Modification>) {
        self.redo_stack.push(group);
    }

    pub(crate) fn pop_redo(&mut self) -> Option<Vec<Modification>> {
        self.redo_stack.pop()
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty() || !self.current_group.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub(crate) fn undo_depth(&self) -> usize {
        self.undo_stack.len() + usize::from(!self.current_group.is_empty())
    }
}
