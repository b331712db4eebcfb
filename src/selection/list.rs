//! Buffer-bound selection lists.

use std::ops::{Index, IndexMut};

use super::{Selection, compare_selections, overlaps};
use crate::changes::{
    ChangeKind, ChangeTracker, TrackedRange, backward_sorted_until, forward_sorted_until,
    update_backward, update_forward, update_insert, update_ranges,
};
use crate::coord::Coord;
use crate::error::Result;
use crate::event::{LogLevel, emit_log_with};
use crate::text::{Buffer, BufferHandle};

/// Where [`SelectionList::insert`] puts text relative to each selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertMode {
    /// Before the selection.
    Insert,
    /// At the cursor.
    InsertCursor,
    /// After the selection.
    Append,
    /// At the start of the selection's first line.
    InsertAtLineBegin,
    /// At the end of the selection's last line.
    AppendAtLineEnd,
}

/// Mutable buffer access handed to [`SelectionList::for_each`] callbacks.
pub struct EditContext<'a> {
    buffer: &'a mut Buffer,
    may_append: bool,
    appended: Vec<(usize, Selection)>,
}

impl EditContext<'_> {
    pub fn buffer(&mut self) -> &mut Buffer {
        self.buffer
    }

    /// Queue a selection, valid in the current buffer state, for the end of
    /// the list. It is kept up to date with later edits and not visited.
    pub fn push(&mut self, selection: Selection) {
        debug_assert!(self.may_append, "for_each called without may_append");
        self.appended.push((self.buffer.timestamp(), selection));
    }
}

/// A non-empty list of selections on one buffer, valid at `timestamp`.
///
/// Once [`sort_and_merge_overlapping`](Self::sort_and_merge_overlapping) has
/// run, selections are ordered and pairwise disjoint. The list only holds a
/// [`BufferHandle`]; every operation that reads or edits text takes the
/// buffer explicitly.
#[derive(Clone, Debug)]
pub struct SelectionList {
    selections: Vec<Selection>,
    main: usize,
    buffer: BufferHandle,
    timestamp: usize,
}

impl SelectionList {
    /// A single selection, current with `buffer`.
    #[must_use]
    pub fn new(buffer: &Buffer, selection: Selection) -> Self {
        Self {
            selections: vec![selection],
            main: 0,
            buffer: buffer.handle(),
            timestamp: buffer.timestamp(),
        }
    }

    /// Selections current with `buffer`. The last one is main.
    #[must_use]
    pub fn from_vec(buffer: &Buffer, selections: Vec<Selection>) -> Self {
        Self::with_timestamp(buffer, selections, buffer.timestamp())
    }

    /// Selections valid at an older `timestamp` of `buffer`.
    #[must_use]
    pub fn with_timestamp(buffer: &Buffer, selections: Vec<Selection>, timestamp: usize) -> Self {
        debug_assert!(!selections.is_empty());
        debug_assert!(timestamp <= buffer.timestamp());
        Self {
            main: selections.len().saturating_sub(1),
            selections,
            buffer: buffer.handle(),
            timestamp,
        }
    }

    #[must_use]
    pub const fn buffer(&self) -> &BufferHandle {
        &self.buffer
    }

    #[must_use]
    pub const fn timestamp(&self) -> usize {
        self.timestamp
    }

    /// Declare the selections valid at `timestamp` without remapping them.
    pub fn force_timestamp(&mut self, timestamp: usize) {
        self.timestamp = timestamp;
    }

    #[must_use]
    pub fn main(&self) -> &Selection {
        &self.selections[self.main]
    }

    pub fn main_mut(&mut self) -> &mut Selection {
        &mut self.selections[self.main]
    }

    #[must_use]
    pub const fn main_index(&self) -> usize {
        self.main
    }

    pub fn set_main_index(&mut self, main: usize) {
        debug_assert!(main < self.len());
        self.main = main;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    /// Always false outside of a broken invariant.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Selection> {
        self.selections.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Selection> {
        self.selections.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Selection> {
        self.selections.iter_mut()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Selection] {
        &self.selections
    }

    pub fn push(&mut self, selection: Selection) {
        self.selections.push(selection);
    }

    /// Remove a selection; main stays on the same selection when it survives.
    pub fn remove(&mut self, index: usize) -> Selection {
        debug_assert!(self.len() > 1, "cannot remove the last selection");
        let removed = self.selections.remove(index);
        if index < self.main || self.main == self.selections.len() {
            self.main = self.main.saturating_sub(1);
        }
        removed
    }

    /// Replace every selection with `selections`, current with `buffer`.
    pub fn set(&mut self, buffer: &Buffer, selections: Vec<Selection>, main: usize) {
        debug_assert!(self.buffer.refers_to(buffer));
        debug_assert!(main < selections.len());
        self.selections = selections;
        self.main = main;
        self.timestamp = buffer.timestamp();
        self.sort_and_merge_overlapping();
    }

    /// Stable sort by start then end; main follows its selection.
    pub fn sort(&mut self) {
        sort_selections(&mut self.selections, &mut self.main);
    }

    /// Fold overlapping neighbours of a sorted list into single selections.
    pub fn merge_overlapping(&mut self) {
        merge_overlapping_by(&mut self.selections, &mut self.main, overlaps);
    }

    /// Fold sorted neighbours that touch, i.e. with no character in between.
    pub fn merge_consecutive(&mut self, buffer: &Buffer) {
        merge_overlapping_by(&mut self.selections, &mut self.main, |lhs, rhs| {
            buffer.char_next(lhs.max()) >= rhs.min()
        });
    }

    pub fn sort_and_merge_overlapping(&mut self) {
        self.sort();
        self.merge_overlapping();
    }

    /// Snap every selection to valid positions of `buffer`.
    pub fn clamp(&mut self, buffer: &Buffer) {
        for sel in &mut self.selections {
            sel.clamp(buffer);
        }
    }

    /// Bring the selections up to date with `buffer`.
    ///
    /// With `merge`, the list is sorted, remapped run by run and merged
    /// after every run, so it comes out sorted and disjoint. Without it,
    /// every anchor and cursor is remapped as an independent point and the
    /// list keeps its order and count.
    pub fn update(&mut self, buffer: &Buffer, merge: bool) {
        debug_assert!(self.buffer.refers_to(buffer), "selections from another buffer");
        debug_assert!(self.timestamp <= buffer.timestamp());
        if self.timestamp == buffer.timestamp() {
            return;
        }
        let changes = buffer.changes_since(self.timestamp);
        emit_log_with(LogLevel::Debug, || {
            format!(
                "updating {} selections across {} changes (merge: {merge})",
                self.selections.len(),
                changes.len()
            )
        });

        if merge {
            self.sort_and_merge_overlapping();
            let main = &mut self.main;
            update_ranges(changes, &mut self.selections, |sels| {
                merge_overlapping_by(sels, &mut *main, overlaps);
            });
            self.clamp(buffer);
            self.merge_overlapping();
        } else {
            self.update_points(buffer);
        }
        self.timestamp = buffer.timestamp();
    }

    fn update_points(&mut self, buffer: &Buffer) {
        let mut points: Vec<Endpoint> = self
            .selections
            .iter()
            .enumerate()
            .flat_map(|(index, sel)| {
                [
                    Endpoint {
                        coord: sel.anchor(),
                        index,
                        is_cursor: false,
                    },
                    Endpoint {
                        coord: sel.cursor(),
                        index,
                        is_cursor: true,
                    },
                ]
            })
            .collect();
        points.sort_by_key(|point| point.coord);
        update_ranges(buffer.changes_since(self.timestamp), &mut points, |_| {});
        for point in points {
            let coord = buffer.clamp(point.coord);
            let sel = &mut self.selections[point.index];
            if point.is_cursor {
                let target = sel.target();
                sel.set_cursor(coord);
                sel.set_target(target);
            } else {
                sel.set_anchor(coord);
            }
        }
    }

    /// Apply `apply` to every selection, in order, with mutable buffer access.
    ///
    /// Each selection is remapped through the edits earlier callbacks made
    /// before being handed out, so those edits must go forward through the
    /// buffer. With `may_append`, callbacks can queue extra selections through
    /// [`EditContext::push`]; they land at the end of the list. The first
    /// error stops further callbacks but the list is still brought up to date.
    pub fn for_each<F>(&mut self, buffer: &mut Buffer, may_append: bool, mut apply: F) -> Result<()>
    where
        F: FnMut(usize, &mut Selection, &mut EditContext<'_>) -> Result<()>,
    {
        self.update(buffer, true);
        let mut timestamp = buffer.timestamp();
        let mut tracker = ChangeTracker::new();
        let mut ctx = EditContext {
            buffer,
            may_append,
            appended: Vec::new(),
        };
        let mut outcome = Ok(());

        for (index, sel) in self.selections.iter_mut().enumerate() {
            let (anchor, cursor) = (sel.anchor(), sel.cursor());
            let target = sel.target();
            sel.set_anchor(tracker.get_new_coord_tolerant(anchor));
            sel.set_cursor(tracker.get_new_coord_tolerant(cursor));
            sel.set_target(target);
            if outcome.is_ok() {
                outcome = apply(index, sel, &mut ctx);
                tracker.update_from(&*ctx.buffer, &mut timestamp);
            }
        }

        let buffer = ctx.buffer;
        for (pushed_at, sel) in ctx.appended {
            let mut pending = vec![sel];
            update_ranges(buffer.changes_since(pushed_at), &mut pending, |_| {});
            for mut sel in pending {
                sel.clamp(buffer);
                self.selections.push(sel);
            }
        }
        self.timestamp = buffer.timestamp();
        outcome
    }

    /// Replace each selection's text with the matching string, the last
    /// string repeating. Each selection then covers its new text.
    pub fn replace<S: AsRef<str>>(&mut self, buffer: &mut Buffer, strings: &[S]) -> Result<()> {
        if strings.is_empty() {
            return Ok(());
        }
        let outcome = self.for_each(buffer, false, |index, sel, ctx| {
            let text = strings[index.min(strings.len() - 1)].as_ref();
            replace_selection(ctx.buffer(), sel, text)
        });
        self.fix_overflowing(buffer);
        outcome
    }

    /// Insert the matching string next to each selection.
    pub fn insert<S: AsRef<str>>(
        &mut self,
        buffer: &mut Buffer,
        strings: &[S],
        mode: InsertMode,
    ) -> Result<()> {
        if strings.is_empty() {
            return Ok(());
        }
        self.for_each(buffer, false, |index, sel, ctx| {
            let text = strings[index.min(strings.len() - 1)].as_ref();
            let buffer = ctx.buffer();
            let pos = insert_pos(buffer, sel, mode);
            let range = buffer.insert(pos, text)?;
            if range.start != range.end {
                let target = sel.target();
                let anchor = update_insert(sel.anchor(), range.start, range.end);
                let cursor = update_insert(sel.cursor(), range.start, range.end);
                sel.set(buffer.clamp(anchor), buffer.clamp(cursor));
                sel.set_target(target);
            }
            Ok(())
        })
    }

    /// Erase the text of every selection, leaving a point where each was.
    pub fn erase(&mut self, buffer: &mut Buffer) -> Result<()> {
        let outcome = self.for_each(buffer, false, |_, sel, ctx| {
            let buffer = ctx.buffer();
            let end = buffer.char_next(sel.max());
            let pos = buffer.erase(sel.min(), end)?;
            *sel = Selection::point(pos).with_captures(std::mem::take(&mut sel.captures));
            Ok(())
        });
        self.fix_overflowing(buffer);
        outcome
    }

    /// Selections may end up past the last character after text removal.
    fn fix_overflowing(&mut self, buffer: &Buffer) {
        self.clamp(buffer);
        self.merge_overlapping();
    }

    /// Debug-build consistency check against `buffer`.
    pub fn check_invariant(&self, buffer: &Buffer) {
        debug_assert!(!self.selections.is_empty());
        debug_assert!(self.main < self.selections.len());
        debug_assert!(self.buffer.refers_to(buffer));
        debug_assert!(self.timestamp <= buffer.timestamp());
        if cfg!(debug_assertions) && self.timestamp == buffer.timestamp() {
            for pair in self.selections.windows(2) {
                debug_assert!(pair[0].min() <= pair[1].min());
            }
            for sel in &self.selections {
                debug_assert!(buffer.is_valid(sel.anchor()));
                debug_assert!(buffer.is_valid(sel.cursor()));
            }
        }
    }
}

impl Index<usize> for SelectionList {
    type Output = Selection;

    fn index(&self, index: usize) -> &Selection {
        &self.selections[index]
    }
}

impl IndexMut<usize> for SelectionList {
    fn index_mut(&mut self, index: usize) -> &mut Selection {
        &mut self.selections[index]
    }
}

impl<'a> IntoIterator for &'a SelectionList {
    type Item = &'a Selection;
    type IntoIter = std::slice::Iter<'a, Selection>;

    fn into_iter(self) -> Self::IntoIter {
        self.selections.iter()
    }
}

impl PartialEq for SelectionList {
    fn eq(&self, other: &Self) -> bool {
        self.buffer == other.buffer && self.selections == other.selections
    }
}

/// Selections covering the text changed in `buffer` since `timestamp`.
///
/// Inserted text is selected whole and an erase leaves a single-character
/// selection where the text used to be. Ranges that overlap or touch are
/// merged, so the result is sorted and disjoint. Empty when nothing changed.
#[must_use]
pub fn compute_modified_ranges(buffer: &Buffer, timestamp: usize) -> Vec<Selection> {
    let mut ranges: Vec<Selection> = Vec::new();
    let mut main = 0;
    let mut rest = buffer.changes_since(timestamp);
    while !rest.is_empty() {
        let forward_end = forward_sorted_until(rest);
        let backward_end = backward_sorted_until(rest);
        debug_assert!(ranges.is_sorted_by(|a, b| compare_selections(a, b).is_le()));

        let (run, added) = if forward_end >= backward_end {
            let run = &rest[..forward_end];
            update_forward(run, &mut ranges);
            // Later changes of a forward run never move earlier ones.
            (run, run.iter().copied().collect::<Vec<_>>())
        } else {
            let run = &rest[..backward_end];
            update_backward(run, &mut ranges);
            let mut tracker = ChangeTracker::new();
            let projected = run
                .iter()
                .rev()
                .map(|change| {
                    let change = tracker.project(change);
                    tracker.update(&change);
                    change
                })
                .collect::<Vec<_>>();
            (run, projected)
        };
        merge_overlapping_by(&mut ranges, &mut main, overlaps);

        let prev_len = ranges.len();
        ranges.extend(added.iter().map(|change| match change.kind {
            ChangeKind::Insert => Selection::new(change.begin, change.end),
            ChangeKind::Erase => Selection::point(change.begin),
        }));
        debug_assert!(ranges[prev_len..].is_sorted_by(|a, b| compare_selections(a, b).is_le()));
        // Both halves are sorted; the stable sort merges them.
        ranges.sort_by(compare_selections);
        merge_overlapping_by(&mut ranges, &mut main, overlaps);
        rest = &rest[run.len()..];
    }

    let end = buffer.end_coord();
    for range in &mut ranges {
        range.set_anchor(range.anchor().min(end));
        range.set_cursor(range.cursor().min(end));
    }
    merge_overlapping_by(&mut ranges, &mut main, |lhs, rhs| {
        lhs.max() == end || buffer.char_next(lhs.max()) >= rhs.min()
    });

    let back = buffer.char_prev(end);
    for range in &mut ranges {
        debug_assert!(buffer.is_valid(range.anchor()) && buffer.is_valid(range.cursor()));
        if buffer.is_end(range.anchor()) {
            range.set_anchor(back);
        }
        if buffer.is_end(range.cursor()) {
            range.set_cursor(back);
        }
        if range.anchor() != range.cursor() {
            range.set_cursor(buffer.char_prev(range.cursor()));
        }
    }
    emit_log_with(LogLevel::Debug, || {
        format!(
            "{} modified ranges since timestamp {timestamp}",
            ranges.len()
        )
    });
    ranges
}

/// One end of a selection, remapped on its own.
struct Endpoint {
    coord: Coord,
    index: usize,
    is_cursor: bool,
}

impl TrackedRange for Endpoint {
    fn first(&self) -> Coord {
        self.coord
    }

    fn last(&self) -> Coord {
        self.coord
    }

    fn ends_mut(&mut self) -> (&mut Coord, Option<&mut Coord>) {
        (&mut self.coord, None)
    }
}

pub(crate) fn sort_selections(selections: &mut Vec<Selection>, main: &mut usize) {
    if selections.len() <= 1 {
        return;
    }
    let main_index = *main;
    let mut indexed: Vec<(usize, Selection)> =
        std::mem::take(selections).into_iter().enumerate().collect();
    indexed.sort_by(|a, b| compare_selections(&a.1, &b.1));
    *main = indexed
        .iter()
        .position(|(index, _)| *index == main_index)
        .unwrap_or(0);
    selections.extend(indexed.into_iter().map(|(_, sel)| sel));
}

/// Fold sorted neighbours for which `should_merge` holds into the covering
/// selection, keeping the direction and captures of the first.
pub(crate) fn merge_overlapping_by<F>(selections: &mut Vec<Selection>, main: &mut usize, should_merge: F)
where
    F: Fn(&Selection, &Selection) -> bool,
{
    if selections.len() <= 1 {
        return;
    }
    let mut write = 0;
    let mut new_main = 0;
    for read in 1..selections.len() {
        if should_merge(&selections[write], &selections[read]) {
            let min = selections[write].min().min(selections[read].min());
            let max = selections[write].max().max(selections[read].max());
            selections[write].set_extent(min, max);
        } else {
            write += 1;
            selections.swap(write, read);
        }
        if read == *main {
            new_main = write;
        }
    }
    selections.truncate(write + 1);
    *main = new_main;
}

fn insert_pos(buffer: &Buffer, sel: &Selection, mode: InsertMode) -> Coord {
    match mode {
        InsertMode::Insert => sel.min(),
        InsertMode::InsertCursor => sel.cursor(),
        InsertMode::Append => buffer.char_next(sel.max()),
        InsertMode::InsertAtLineBegin => Coord::new(sel.min().line, 0),
        InsertMode::AppendAtLineEnd => {
            let line = sel.max().line;
            Coord::new(line, buffer.line_len(line))
        }
    }
}

fn replace_selection(buffer: &mut Buffer, sel: &mut Selection, text: &str) -> Result<()> {
    let end = buffer.char_next(sel.max());
    let range = buffer.replace(sel.min(), end, text)?;
    if range.start == range.end {
        let pos = buffer.clamp(range.start);
        sel.set(pos, pos);
    } else {
        sel.set_extent(range.start, buffer.char_prev(range.end));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(line: usize, column: usize) -> Coord {
        Coord::new(line, column)
    }

    fn sel(a: (usize, usize), b: (usize, usize)) -> Selection {
        Selection::new(a.into(), b.into())
    }

    #[test]
    fn test_insert_remaps_selection() {
        let mut buffer = Buffer::new("abc\ndef");
        let mut list = SelectionList::from_vec(
            &buffer,
            vec![Selection::point(c(0, 0)), Selection::point(c(0, 2))],
        );
        buffer.insert(c(0, 1), "X").unwrap();
        list.update(&buffer, true);
        assert_eq!(list[0], Selection::point(c(0, 0)));
        assert_eq!(list[1], Selection::point(c(0, 3)));
        assert_eq!(list.timestamp(), 1);
    }

    #[test]
    fn test_erase_at_position_does_not_push() {
        let mut buffer = Buffer::new("abc\ndef");
        let mut list = SelectionList::new(&buffer, Selection::point(c(0, 2)));
        buffer.erase(c(0, 1), c(0, 2)).unwrap();
        list.update(&buffer, true);
        assert_eq!(list[0], Selection::point(c(0, 1)));
    }

    #[test]
    fn test_sort_tracks_main() {
        let buffer = Buffer::new("0123456789");
        let mut list = SelectionList::from_vec(
            &buffer,
            vec![sel((0, 6), (0, 7)), sel((0, 0), (0, 1)), sel((0, 3), (0, 4))],
        );
        list.set_main_index(0);
        list.sort();
        assert_eq!(list.main_index(), 2);
        assert_eq!(*list.main(), sel((0, 6), (0, 7)));
    }

    #[test]
    fn test_merge_overlapping_covers_union() {
        let buffer = Buffer::new("0123456789");
        let mut list = SelectionList::from_vec(
            &buffer,
            vec![
                sel((0, 0), (0, 5)),
                sel((0, 1), (0, 2)),
                sel((0, 4), (0, 6)),
                sel((0, 8), (0, 9)),
            ],
        );
        list.set_main_index(2);
        list.sort_and_merge_overlapping();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], sel((0, 0), (0, 6)));
        assert_eq!(list[1], sel((0, 8), (0, 9)));
        assert_eq!(list.main_index(), 0);
    }

    #[test]
    fn test_merge_consecutive() {
        let buffer = Buffer::new("0123456789");
        let mut list = SelectionList::from_vec(
            &buffer,
            vec![sel((0, 0), (0, 2)), sel((0, 3), (0, 4)), sel((0, 6), (0, 6))],
        );
        list.merge_consecutive(&buffer);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], sel((0, 0), (0, 4)));
        assert_eq!(list.main_index(), 1);
    }

    #[test]
    fn test_remove_adjusts_main() {
        let buffer = Buffer::new("0123456789");
        let mut list = SelectionList::from_vec(
            &buffer,
            vec![sel((0, 0), (0, 0)), sel((0, 2), (0, 2)), sel((0, 4), (0, 4))],
        );
        assert_eq!(list.main_index(), 2);
        list.remove(0);
        assert_eq!(list.main_index(), 1);
        list.remove(1);
        assert_eq!(list.main_index(), 0);
        assert_eq!(*list.main(), sel((0, 2), (0, 2)));
    }

    #[test]
    fn test_update_merges_collapsed_selections() {
        let mut buffer = Buffer::new("abcdefgh");
        let mut list = SelectionList::from_vec(
            &buffer,
            vec![sel((0, 2), (0, 2)), sel((0, 4), (0, 5))],
        );
        buffer.erase(c(0, 1), c(0, 6)).unwrap();
        list.update(&buffer, true);
        assert_eq!(list.len(), 1);
        assert_eq!(list[0], sel((0, 1), (0, 1)));
    }

    #[test]
    fn test_update_without_merge_keeps_count_and_order() {
        let mut buffer = Buffer::new("abcdefgh");
        let mut list = SelectionList::from_vec(
            &buffer,
            vec![sel((0, 5), (0, 4)), sel((0, 2), (0, 2))],
        );
        buffer.erase(c(0, 1), c(0, 6)).unwrap();
        buffer.insert(c(0, 0), "__").unwrap();
        list.update(&buffer, false);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0], sel((0, 3), (0, 3)));
        assert_eq!(list[1], sel((0, 3), (0, 3)));
    }

    #[test]
    fn test_update_across_undo() {
        let mut buffer = Buffer::new("one two three");
        buffer.insert(c(0, 3), ",").unwrap();
        buffer.insert(c(0, 8), ",").unwrap();
        buffer.commit_undo_group();
        let mut list = SelectionList::from_vec(
            &buffer,
            vec![sel((0, 5), (0, 7)), sel((0, 10), (0, 14))],
        );
        assert!(buffer.undo());
        list.update(&buffer, true);
        assert_eq!(list[0], sel((0, 4), (0, 6)));
        assert_eq!(list[1], sel((0, 8), (0, 12)));
        list.check_invariant(&buffer);
    }

    #[test]
    fn test_replace() {
        let mut buffer = Buffer::new("foo bar baz");
        let mut list = SelectionList::from_vec(
            &buffer,
            vec![sel((0, 0), (0, 2)), sel((0, 8), (0, 10))],
        );
        list.replace(&mut buffer, &["hello", "x"]).unwrap();
        assert_eq!(buffer.text(), "hello bar x");
        assert_eq!(list[0], sel((0, 0), (0, 4)));
        assert_eq!(list[1], sel((0, 10), (0, 10)));
        assert_eq!(list.timestamp(), buffer.timestamp());
    }

    #[test]
    fn test_replace_with_empty_collapses() {
        let mut buffer = Buffer::new("foo bar");
        let mut list = SelectionList::new(&buffer, sel((0, 4), (0, 6)));
        list.replace(&mut buffer, &[""]).unwrap();
        assert_eq!(buffer.text(), "foo ");
        assert_eq!(list[0], Selection::point(c(0, 4)));
    }

    #[test]
    fn test_insert_and_append() {
        let mut buffer = Buffer::new("ab cd");
        let mut list = SelectionList::from_vec(
            &buffer,
            vec![sel((0, 0), (0, 1)), sel((0, 3), (0, 4))],
        );
        list.insert(&mut buffer, &["<"], InsertMode::Insert).unwrap();
        assert_eq!(buffer.text(), "<ab <cd");
        assert_eq!(list[0], sel((0, 1), (0, 2)));
        assert_eq!(list[1], sel((0, 5), (0, 6)));

        list.insert(&mut buffer, &[">"], InsertMode::Append).unwrap();
        assert_eq!(buffer.text(), "<ab> <cd>");
        assert_eq!(list[0], sel((0, 1), (0, 2)));
        assert_eq!(list[1], sel((0, 6), (0, 7)));
    }

    #[test]
    fn test_erase() {
        let mut buffer = Buffer::new("foo bar baz");
        let mut list = SelectionList::from_vec(
            &buffer,
            vec![sel((0, 0), (0, 3)), sel((0, 8), (0, 10))],
        );
        list.erase(&mut buffer).unwrap();
        assert_eq!(buffer.text(), "bar ");
        assert_eq!(list[0], Selection::point(c(0, 0)));
        assert_eq!(list[1], Selection::point(c(0, 4)));
    }

    #[test]
    fn test_for_each_appends() {
        let mut buffer = Buffer::new("a b c");
        let mut list = SelectionList::from_vec(
            &buffer,
            vec![Selection::point(c(0, 0)), Selection::point(c(0, 4))],
        );
        list.for_each(&mut buffer, true, |index, sel, ctx| {
            let pos = sel.min();
            ctx.buffer().insert(pos, "xx")?;
            if index == 0 {
                ctx.push(Selection::point(c(0, 1)));
            }
            sel.set(Coord::new(pos.line, pos.column), Coord::new(pos.line, pos.column + 1));
            Ok(())
        })
        .unwrap();
        assert_eq!(buffer.text(), "xxa b xxc");
        assert_eq!(list.len(), 3);
        assert_eq!(list[0], sel((0, 0), (0, 1)));
        assert_eq!(list[1], sel((0, 6), (0, 7)));
        // Queued after the first insert, untouched by the later one.
        assert_eq!(list[2], Selection::point(c(0, 1)));
    }

    #[test]
    fn test_for_each_stops_on_error() {
        let mut buffer = Buffer::new("abc");
        let mut list = SelectionList::from_vec(
            &buffer,
            vec![Selection::point(c(0, 0)), Selection::point(c(0, 2))],
        );
        let mut visited = 0;
        let result = list.for_each(&mut buffer, false, |_, sel, ctx| {
            visited += 1;
            ctx.buffer().insert(sel.min(), "x")?;
            ctx.buffer().set_flags(crate::text::BufferFlags::READ_ONLY);
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(visited, 2);
        assert_eq!(buffer.text(), "xabc");
        assert_eq!(list[1], Selection::point(c(0, 3)));
        assert_eq!(list.timestamp(), 1);
    }

    #[test]
    fn test_modified_ranges_forward_batch() {
        let mut buffer = Buffer::new("abcdef\nghij\n");
        let start = buffer.timestamp();
        assert!(compute_modified_ranges(&buffer, start).is_empty());

        buffer.insert(c(0, 1), "XY").unwrap();
        buffer.erase(c(0, 5), c(0, 7)).unwrap();
        buffer.insert(c(1, 2), "Z").unwrap();
        assert_eq!(buffer.text(), "aXYbcf\nghZij\n");

        let ranges = compute_modified_ranges(&buffer, start);
        assert_eq!(
            ranges,
            [
                sel((0, 1), (0, 2)),
                Selection::point(c(0, 5)),
                Selection::point(c(1, 2)),
            ]
        );
        assert!(compute_modified_ranges(&buffer, buffer.timestamp()).is_empty());
    }

    #[test]
    fn test_modified_ranges_join_typed_text() {
        let mut buffer = Buffer::new("ab\n");
        buffer.insert(c(0, 0), "X").unwrap();
        buffer.insert(c(0, 1), "Y").unwrap();
        assert_eq!(compute_modified_ranges(&buffer, 0), [sel((0, 0), (0, 1))]);
    }

    #[test]
    fn test_modified_ranges_merge_touching() {
        let mut buffer = Buffer::new("abcd\n");
        buffer.erase(c(0, 1), c(0, 2)).unwrap();
        buffer.insert(c(0, 2), "Z").unwrap();
        assert_eq!(buffer.text(), "acZd\n");
        assert_eq!(compute_modified_ranges(&buffer, 0), [sel((0, 1), (0, 2))]);
    }

    #[test]
    fn test_modified_ranges_after_undo() {
        let mut buffer = Buffer::new("abcdef\n");
        buffer.erase(c(0, 1), c(0, 2)).unwrap();
        buffer.erase(c(0, 3), c(0, 4)).unwrap();
        assert_eq!(buffer.text(), "acdf\n");
        buffer.commit_undo_group();
        let before_undo = buffer.timestamp();

        assert!(buffer.undo());
        assert_eq!(buffer.text(), "abcdef\n");
        // The restored "b" and "e".
        assert_eq!(
            compute_modified_ranges(&buffer, before_undo),
            [Selection::point(c(0, 1)), Selection::point(c(0, 4))]
        );
    }

    #[test]
    fn test_modified_ranges_at_buffer_end() {
        let mut buffer = Buffer::new("abc");
        buffer.erase(c(0, 2), c(0, 3)).unwrap();
        assert_eq!(compute_modified_ranges(&buffer, 0), [Selection::point(c(0, 1))]);
    }
}
