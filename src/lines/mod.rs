//! Line-level view of the change log.
//!
//! Line-oriented consumers (indexers, per-line caches) do not care about
//! byte columns. They need to know which ranges of old lines were replaced
//! by which ranges of new lines. This module reduces buffer [`Change`]s to
//! [`LineChange`] records and folds those into a minimal sorted list of
//! [`LineModification`]s.
//!
//! # Examples
//!
//! ```
//! use seltrack::{Buffer, Coord, LineChangeWatcher, LineModification};
//!
//! let mut buffer = Buffer::new("a\nb\nc");
//! let mut watcher = LineChangeWatcher::new(&buffer);
//! buffer.insert(Coord::new(1, 0), "x\ny\n").unwrap();
//!
//! let modifs = watcher.compute_modifications(&buffer);
//! assert_eq!(
//!     modifs,
//!     [LineModification { old_line: 1, new_line: 1, num_removed: 0, num_added: 2 }]
//! );
//! ```

mod word_index;

pub use word_index::{MAX_WORD_LEN, WordIndex};

use crate::changes::{Change, ChangeKind};
use crate::event::{LogLevel, emit_log_with};
use crate::text::{Buffer, BufferHandle};

/// Lines inserted (`num > 0`) or removed (`num < 0`) starting at `pos`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineChange {
    pub pos: usize,
    pub num: isize,
}

impl LineChange {
    #[must_use]
    pub const fn inserted(pos: usize, count: usize) -> Self {
        Self {
            pos,
            num: count as isize,
        }
    }

    #[must_use]
    pub const fn removed(pos: usize, count: usize) -> Self {
        Self {
            pos,
            num: -(count as isize),
        }
    }
}

/// Line records for one buffer change.
///
/// A change with both ends at column 0 only adds or removes whole lines and
/// yields one record. Anything else touches line content: the touched old
/// lines are reported removed, then the resulting lines inserted, at the same
/// position.
pub fn line_changes(change: &Change) -> impl Iterator<Item = LineChange> + use<> {
    let pos = change.begin.line;
    let lines = change.end.line - change.begin.line;
    let whole_lines = change.begin.column == 0 && change.end.column == 0;
    let (first, second) = match (change.kind, whole_lines) {
        (ChangeKind::Insert, true) => (LineChange::inserted(pos, lines), None),
        (ChangeKind::Insert, false) => (
            LineChange::removed(pos, 1),
            Some(LineChange::inserted(pos, lines + 1)),
        ),
        (ChangeKind::Erase, true) => (LineChange::removed(pos, lines), None),
        (ChangeKind::Erase, false) => (
            LineChange::removed(pos, lines + 1),
            Some(LineChange::inserted(pos, 1)),
        ),
    };
    std::iter::once(first).chain(second)
}

/// Old lines `old_line..old_line + num_removed` became new lines
/// `new_line..new_line + num_added`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LineModification {
    pub old_line: usize,
    pub new_line: usize,
    pub num_removed: usize,
    pub num_added: usize,
}

impl LineModification {
    /// Offset from old to new line numbers for lines after this modification.
    #[must_use]
    pub fn diff(&self) -> isize {
        crate::coord::diff(self.new_end(), self.old_end())
    }

    #[must_use]
    pub const fn old_end(&self) -> usize {
        self.old_line + self.num_removed
    }

    #[must_use]
    pub const fn new_end(&self) -> usize {
        self.new_line + self.num_added
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.num_removed == 0 && self.num_added == 0
    }
}

fn shift_line(line: usize, delta: isize) -> usize {
    debug_assert!(line.checked_add_signed(delta).is_some());
    line.saturating_add_signed(delta)
}

/// Fold line records, in log order, into sorted disjoint modifications.
#[must_use]
pub fn compute_line_modifications<I>(records: I) -> Vec<LineModification>
where
    I: IntoIterator<Item = LineChange>,
{
    let mut res: Vec<LineModification> = Vec::new();
    let mut folded = 0usize;
    for change in records {
        if change.num == 0 {
            continue;
        }
        folded += 1;

        let mut idx = res.partition_point(|m| m.new_line <= change.pos);
        if idx > 0 && change.pos <= res[idx - 1].new_end() {
            idx -= 1;
        } else {
            let old_line = if idx > 0 {
                shift_line(change.pos, -res[idx - 1].diff())
            } else {
                change.pos
            };
            res.insert(
                idx,
                LineModification {
                    old_line,
                    new_line: change.pos,
                    num_removed: 0,
                    num_added: 0,
                },
            );
        }

        let num = change.num.unsigned_abs();
        if change.num > 0 {
            res[idx].num_added += num;
            for modif in &mut res[idx + 1..] {
                modif.new_line += num;
            }
            continue;
        }

        // Later modifications starting inside the removed lines merge into
        // this one.
        let end = change.pos + num;
        let fold_end = idx + 1 + res[idx + 1..].partition_point(|m| m.new_line < end);
        let modif = res[idx];
        let last = if fold_end > idx + 1 {
            res[fold_end - 1]
        } else {
            modif
        };
        let new_end = end.max(modif.new_end()).max(last.new_end());
        let old_end = shift_line(new_end, -last.diff());
        if fold_end > idx + 1 {
            emit_log_with(LogLevel::Debug, || {
                format!(
                    "removing {num} lines at {} merged {} line modifications",
                    change.pos,
                    fold_end - idx - 1
                )
            });
        }
        res.drain(idx + 1..fold_end);

        let modif = &mut res[idx];
        modif.num_removed = old_end - modif.old_line;
        modif.num_added = new_end - modif.new_line - num;
        for modif in &mut res[idx + 1..] {
            modif.new_line -= num;
        }
    }

    res.retain(|m| !m.is_empty());
    emit_log_with(LogLevel::Debug, || {
        format!(
            "folded {folded} line changes into {} line modifications",
            res.len()
        )
    });
    res
}

/// Line modifications made to `buffer` since `timestamp`.
#[must_use]
pub fn modifications_since(buffer: &Buffer, timestamp: usize) -> Vec<LineModification> {
    compute_line_modifications(buffer.changes_since(timestamp).iter().flat_map(line_changes))
}

/// Tracks line modifications of a buffer between successive queries.
#[derive(Clone, Debug)]
pub struct LineChangeWatcher {
    buffer: BufferHandle,
    timestamp: usize,
}

impl LineChangeWatcher {
    /// Start watching `buffer` from its current state.
    #[must_use]
    pub fn new(buffer: &Buffer) -> Self {
        Self {
            buffer: buffer.handle(),
            timestamp: buffer.timestamp(),
        }
    }

    #[must_use]
    pub const fn buffer(&self) -> &BufferHandle {
        &self.buffer
    }

    /// Buffer timestamp of the last query.
    #[must_use]
    pub const fn timestamp(&self) -> usize {
        self.timestamp
    }

    /// Modifications since the last call (or since creation), then move on
    /// to the current buffer state.
    pub fn compute_modifications(&mut self, buffer: &Buffer) -> Vec<LineModification> {
        debug_assert!(self.buffer.refers_to(buffer));
        let res = modifications_since(buffer, self.timestamp);
        self.timestamp = buffer.timestamp();
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::Coord;

    fn modif(old_line: usize, new_line: usize, num_removed: usize, num_added: usize) -> LineModification {
        LineModification {
            old_line,
            new_line,
            num_removed,
            num_added,
        }
    }

    fn c(line: usize, column: usize) -> Coord {
        Coord::new(line, column)
    }

    #[test]
    fn test_pure_insert() {
        let res = compute_line_modifications([LineChange::inserted(2, 3)]);
        assert_eq!(res, [modif(2, 2, 0, 3)]);
    }

    #[test]
    fn test_pure_removal() {
        let res = compute_line_modifications([LineChange::removed(5, 2)]);
        assert_eq!(res, [modif(5, 5, 2, 0)]);
    }

    #[test]
    fn test_removal_shifts_later_modification() {
        let res = compute_line_modifications([
            LineChange::inserted(7, 1),
            LineChange::removed(5, 2),
        ]);
        assert_eq!(res, [modif(5, 5, 2, 0), modif(7, 5, 0, 1)]);
    }

    #[test]
    fn test_insert_after_gap_uses_offset() {
        let res = compute_line_modifications([
            LineChange::inserted(1, 2),
            LineChange::removed(4, 1),
        ]);
        assert_eq!(res, [modif(1, 1, 0, 2), modif(2, 4, 1, 0)]);
    }

    #[test]
    fn test_removal_inside_inserted_lines() {
        let res = compute_line_modifications([
            LineChange::inserted(2, 3),
            LineChange::removed(3, 1),
        ]);
        assert_eq!(res, [modif(2, 2, 0, 2)]);
    }

    #[test]
    fn test_undone_insert_vanishes() {
        let res = compute_line_modifications([
            LineChange::inserted(2, 3),
            LineChange::removed(2, 3),
        ]);
        assert!(res.is_empty());
    }

    #[test]
    fn test_removal_swallows_later_modification() {
        let res = compute_line_modifications([
            LineChange::inserted(4, 2),
            LineChange::removed(1, 5),
        ]);
        assert_eq!(res, [modif(1, 1, 3, 0)]);
    }

    #[test]
    fn test_removal_overlaps_start_of_later_modification() {
        let res = compute_line_modifications([
            LineChange::inserted(4, 2),
            LineChange::removed(3, 2),
        ]);
        assert_eq!(res, [modif(3, 3, 1, 1)]);
    }

    #[test]
    fn test_line_changes_rules() {
        let whole = line_changes(&Change::insert(c(1, 0), c(3, 0))).collect::<Vec<_>>();
        assert_eq!(whole, [LineChange::inserted(1, 2)]);

        let partial = line_changes(&Change::insert(c(1, 2), c(1, 3))).collect::<Vec<_>>();
        assert_eq!(
            partial,
            [LineChange::removed(1, 1), LineChange::inserted(1, 1)]
        );

        let erase_whole = line_changes(&Change::erase(c(2, 0), c(4, 0))).collect::<Vec<_>>();
        assert_eq!(erase_whole, [LineChange::removed(2, 2)]);

        let erase_partial = line_changes(&Change::erase(c(1, 6), c(4, 0))).collect::<Vec<_>>();
        assert_eq!(
            erase_partial,
            [LineChange::removed(1, 4), LineChange::inserted(1, 1)]
        );
    }

    #[test]
    fn test_watcher_pulls_from_buffer() {
        let mut buffer = Buffer::new("a\nb\nc\nd");
        let mut watcher = LineChangeWatcher::new(&buffer);
        buffer.insert(c(1, 0), "x\ny\n").unwrap();
        buffer.erase(c(4, 0), c(5, 0)).unwrap();
        assert_eq!(buffer.text(), "a\nx\ny\nb\nd");

        let res = watcher.compute_modifications(&buffer);
        assert_eq!(res, [modif(1, 1, 0, 2), modif(2, 4, 1, 0)]);
        assert_eq!(watcher.timestamp(), 2);
        assert!(watcher.compute_modifications(&buffer).is_empty());
    }

    #[test]
    fn test_watcher_partial_line_edit() {
        let mut buffer = Buffer::new("abc\ndef");
        let mut watcher = LineChangeWatcher::new(&buffer);
        buffer.insert(c(0, 1), "X").unwrap();
        assert_eq!(watcher.compute_modifications(&buffer), [modif(0, 0, 1, 1)]);
    }

    #[test]
    fn test_diff() {
        assert_eq!(modif(2, 4, 1, 0).diff(), 1);
        assert_eq!(modif(5, 5, 2, 0).diff(), -2);
    }
}
