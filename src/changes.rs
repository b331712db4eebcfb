//! Change records and coordinate remapping across them.
//!
//! A [`Buffer`](crate::text::Buffer) logs one [`Change`] per primitive edit.
//! Anything holding coordinates from an older buffer state replays the
//! suffix of that log through a [`ChangeTracker`] to bring them up to date.
//!
//! # Examples
//!
//! ```
//! use seltrack::{Change, ChangeTracker, Coord};
//!
//! // "X" inserted at 0:1 pushes 0:2 one byte to the right.
//! let mut tracker = ChangeTracker::new();
//! tracker.update(&Change::insert(Coord::new(0, 1), Coord::new(0, 2)));
//! assert_eq!(tracker.get_new_coord(Coord::new(0, 2)), Coord::new(0, 3));
//! ```

use crate::coord::{Coord, diff};
use crate::text::Buffer;

/// What a [`Change`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Insert,
    Erase,
}

/// One primitive edit.
///
/// For an insert, `begin..end` is the inserted text in the resulting buffer
/// state. For an erase, it is the removed text in the prior state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Change {
    pub kind: ChangeKind,
    pub begin: Coord,
    pub end: Coord,
}

impl Change {
    #[must_use]
    pub const fn insert(begin: Coord, end: Coord) -> Self {
        Self {
            kind: ChangeKind::Insert,
            begin,
            end,
        }
    }

    #[must_use]
    pub const fn erase(begin: Coord, end: Coord) -> Self {
        Self {
            kind: ChangeKind::Erase,
            begin,
            end,
        }
    }

    #[must_use]
    pub const fn is_insert(&self) -> bool {
        matches!(self.kind, ChangeKind::Insert)
    }
}

/// Running state of a single forward pass over changes.
///
/// `cur_pos` is the last change position in the current state and `old_pos`
/// the same position in the reference state. Changes must be fed in
/// non-decreasing position order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChangeTracker {
    pub cur_pos: Coord,
    pub old_pos: Coord,
}

impl ChangeTracker {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cur_pos: Coord::ZERO,
            old_pos: Coord::ZERO,
        }
    }

    /// Integrate one change.
    pub fn update(&mut self, change: &Change) {
        debug_assert!(
            change.begin >= self.cur_pos,
            "change at {} precedes tracker position {}",
            change.begin,
            self.cur_pos
        );
        match change.kind {
            ChangeKind::Insert => {
                self.old_pos = self.get_old_coord(change.begin);
                self.cur_pos = change.end;
            }
            ChangeKind::Erase => {
                self.old_pos = self.get_old_coord(change.end);
                self.cur_pos = change.begin;
            }
        }
    }

    /// Integrate every change `buffer` logged since `timestamp`, then bring
    /// `timestamp` up to date.
    pub fn update_from(&mut self, buffer: &Buffer, timestamp: &mut usize) {
        for change in buffer.changes_since(*timestamp) {
            self.update(change);
        }
        *timestamp = buffer.timestamp();
    }

    /// Map a coordinate at or after `cur_pos` back to the reference state.
    #[must_use]
    pub fn get_old_coord(&self, coord: Coord) -> Coord {
        debug_assert!(self.cur_pos <= coord);
        let columns = if self.cur_pos.line == coord.line {
            diff(self.old_pos.column, self.cur_pos.column)
        } else {
            0
        };
        let res = coord.offset_by(diff(self.old_pos.line, self.cur_pos.line), columns);
        debug_assert!(self.old_pos <= res);
        res
    }

    /// Map a reference-state coordinate at or after `old_pos` forward.
    #[must_use]
    pub fn get_new_coord(&self, coord: Coord) -> Coord {
        debug_assert!(self.old_pos <= coord);
        let columns = if self.old_pos.line == coord.line {
            diff(self.cur_pos.column, self.old_pos.column)
        } else {
            0
        };
        let res = coord.offset_by(diff(self.cur_pos.line, self.old_pos.line), columns);
        debug_assert!(self.cur_pos <= res);
        res
    }

    /// Like [`get_new_coord`](Self::get_new_coord), but a coordinate already
    /// consumed by integrated changes lands on `cur_pos`.
    #[must_use]
    pub fn get_new_coord_tolerant(&self, coord: Coord) -> Coord {
        if coord < self.old_pos {
            self.cur_pos
        } else {
            self.get_new_coord(coord)
        }
    }

    /// Whether `change` must be integrated before `old_coord` can be mapped.
    ///
    /// An insert at the position pushes it; an erase starting at the position
    /// does not.
    #[must_use]
    pub fn relevant(&self, change: &Change, old_coord: Coord) -> bool {
        let new_coord = self.get_new_coord_tolerant(old_coord);
        match change.kind {
            ChangeKind::Insert => change.begin <= new_coord,
            ChangeKind::Erase => change.begin < new_coord,
        }
    }

    /// Re-express a change through the changes integrated so far.
    pub(crate) fn project(&self, change: &Change) -> Change {
        Change {
            kind: change.kind,
            begin: self.get_new_coord(change.begin),
            end: self.get_new_coord(change.end),
        }
    }
}

/// Length of the longest prefix of `changes` that a forward pass can replay.
#[must_use]
pub fn forward_sorted_until(changes: &[Change]) -> usize {
    for (i, pair) in changes.windows(2).enumerate() {
        let reference = match pair[0].kind {
            ChangeKind::Insert => pair[0].end,
            ChangeKind::Erase => pair[0].begin,
        };
        if pair[1].begin <= reference {
            return i + 1;
        }
    }
    changes.len()
}

/// Length of the longest prefix of `changes` in which every change lies
/// before its predecessor, so that it can be replayed in reverse.
#[must_use]
pub fn backward_sorted_until(changes: &[Change]) -> usize {
    for (i, pair) in changes.windows(2).enumerate() {
        if pair[0].begin < pair[1].end {
            return i + 1;
        }
    }
    changes.len()
}

/// Something with a first and optional last coordinate that can be remapped.
///
/// Sequences handed to [`update_forward`] and [`update_backward`] must be
/// sorted by [`first`](Self::first).
pub trait TrackedRange {
    fn first(&self) -> Coord;
    fn last(&self) -> Coord;
    /// Mutable access to the first and, if distinct, last coordinate.
    fn ends_mut(&mut self) -> (&mut Coord, Option<&mut Coord>);
}

impl TrackedRange for Coord {
    fn first(&self) -> Coord {
        *self
    }

    fn last(&self) -> Coord {
        *self
    }

    fn ends_mut(&mut self) -> (&mut Coord, Option<&mut Coord>) {
        (self, None)
    }
}

/// Remap sorted ranges across a forward sorted run of changes.
pub fn update_forward<R: TrackedRange>(changes: &[Change], ranges: &mut [R]) {
    let Some(front) = changes.first() else {
        return;
    };
    let mut tracker = ChangeTracker::new();
    let mut next = 0;
    let start = ranges.partition_point(|range| range.last() < front.begin);
    for range in &mut ranges[start..] {
        let (first, last) = range.ends_mut();
        for pos in std::iter::once(first).chain(last) {
            while next < changes.len() && tracker.relevant(&changes[next], *pos) {
                tracker.update(&changes[next]);
                next += 1;
            }
            *pos = tracker.get_new_coord_tolerant(*pos);
        }
    }
}

/// Remap sorted ranges across a backward sorted run of changes.
///
/// The run is replayed from its last change, each change first re-expressed
/// through those already integrated so the pass stays forward internally.
pub fn update_backward<R: TrackedRange>(changes: &[Change], ranges: &mut [R]) {
    let mut tracker = ChangeTracker::new();
    let mut pending = changes.iter().rev().peekable();
    for range in ranges.iter_mut() {
        let (first, last) = range.ends_mut();
        for pos in std::iter::once(first).chain(last) {
            while let Some(change) = pending.peek() {
                let change = tracker.project(change);
                if !tracker.relevant(&change, *pos) {
                    break;
                }
                tracker.update(&change);
                pending.next();
            }
            *pos = tracker.get_new_coord_tolerant(*pos);
        }
    }
}

/// Remap sorted ranges across an arbitrary slice of the change log.
///
/// The slice is split into maximal forward or backward runs; `after_run` is
/// called once per run so callers can restore their own invariants (merging
/// ranges that collapsed onto each other) before the next one.
pub fn update_ranges<R, F>(changes: &[Change], ranges: &mut Vec<R>, mut after_run: F)
where
    R: TrackedRange,
    F: FnMut(&mut Vec<R>),
{
    let mut rest = changes;
    while !rest.is_empty() {
        let forward_end = forward_sorted_until(rest);
        let backward_end = backward_sorted_until(rest);
        let consumed = if forward_end >= backward_end {
            update_forward(&rest[..forward_end], ranges);
            forward_end
        } else {
            update_backward(&rest[..backward_end], ranges);
            backward_end
        };
        after_run(ranges);
        rest = &rest[consumed..];
    }
}

/// Move `coord` across text inserted at `begin..end`.
#[must_use]
pub fn update_insert(coord: Coord, begin: Coord, end: Coord) -> Coord {
    if coord < begin {
        return coord;
    }
    let columns = if coord.line == begin.line {
        diff(end.column, begin.column)
    } else {
        0
    };
    coord.offset_by(diff(end.line, begin.line), columns)
}

/// Move `coord` across text erased at `begin..end`.
///
/// Coordinates inside the erased text collapse onto `begin`.
#[must_use]
pub fn update_erase(coord: Coord, begin: Coord, end: Coord) -> Coord {
    if coord < begin {
        return coord;
    }
    if coord <= end {
        return begin;
    }
    let columns = if coord.line == end.line {
        diff(begin.column, end.column)
    } else {
        0
    };
    coord.offset_by(diff(begin.line, end.line), columns)
}
