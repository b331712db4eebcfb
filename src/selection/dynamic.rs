//! Selections that follow every buffer edit as it happens.
//!
//! A [`DynamicSelectionList`] registers a listener on its buffer when it is
//! built and unregisters it when dropped. Each insert or erase moves every
//! anchor and cursor individually, so the list is valid between any two edits
//! without a deferred [`SelectionList::update`] call. This suits small,
//! long-lived sets such as a jump history.

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use super::list::{merge_overlapping_by, sort_selections};
use super::{EditContext, Selection, SelectionList, overlaps};
use crate::changes::{update_erase, update_insert};
use crate::coord::Coord;
use crate::error::Result;
use crate::event::{LogLevel, emit_log_with};
use crate::text::{Buffer, BufferHandle, ChangeListener, ListenerId};

/// The selection list state shared with the buffer's listener registry.
#[derive(Debug)]
struct TrackedSelections {
    selections: Vec<Selection>,
    main: usize,
}

impl TrackedSelections {
    fn new(buffer: &Buffer, selections: Vec<Selection>, main: usize) -> Self {
        debug_assert!(!selections.is_empty(), "dynamic selection list needs a selection");
        debug_assert!(main < selections.len());
        Self {
            selections: clamped(buffer, selections),
            main,
        }
    }

    fn remap(&mut self, update: impl Fn(Coord) -> Coord) {
        for sel in &mut self.selections {
            let anchor = update(sel.anchor);
            let cursor = update(sel.cursor);
            sel.anchor = anchor;
            sel.cursor = cursor;
        }
        debug_assert!(self.main < self.selections.len());
    }
}

impl ChangeListener for TrackedSelections {
    fn on_insert(&mut self, _buffer: &Buffer, begin: Coord, end: Coord) {
        self.remap(|coord| update_insert(coord, begin, end));
    }

    fn on_erase(&mut self, _buffer: &Buffer, begin: Coord, end: Coord) {
        self.remap(|coord| update_erase(coord, begin, end));
    }
}

/// A non-empty selection list kept current by a change listener on its
/// buffer.
///
/// Like a [`SelectionList`] it has a main selection, which edits never move
/// to another index. Moving the list keeps its registration. Cloning
/// registers the clone separately; dropping releases the registration.
///
/// Holding the [`selections`](Self::selections) borrow across a buffer edit
/// is a bug: the listener cannot update the list while it is borrowed.
#[derive(Debug)]
pub struct DynamicSelectionList {
    state: Rc<RefCell<TrackedSelections>>,
    buffer: BufferHandle,
    listener: Option<ListenerId>,
}

impl DynamicSelectionList {
    /// Track `selections` on `buffer`, clamping each first. The last one is
    /// main.
    #[must_use]
    pub fn new(buffer: &Buffer, selections: Vec<Selection>) -> Self {
        let main = selections.len().saturating_sub(1);
        Self::with_state(buffer, TrackedSelections::new(buffer, selections, main))
    }

    /// Track a copy of `list`, which must be current with `buffer`.
    #[must_use]
    pub fn from_list(buffer: &Buffer, list: &SelectionList) -> Self {
        debug_assert!(list.buffer().refers_to(buffer));
        debug_assert_eq!(list.timestamp(), buffer.timestamp());
        let state = TrackedSelections::new(buffer, list.as_slice().to_vec(), list.main_index());
        Self::with_state(buffer, state)
    }

    fn with_state(buffer: &Buffer, state: TrackedSelections) -> Self {
        let state = Rc::new(RefCell::new(state));
        let listener = buffer.add_change_listener(as_listener(&state));
        Self {
            state,
            buffer: buffer.handle(),
            listener: Some(listener),
        }
    }

    #[must_use]
    pub const fn buffer(&self) -> &BufferHandle {
        &self.buffer
    }

    /// Whether the list still receives edits from a live buffer.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.listener.is_some() && self.buffer.is_live()
    }

    #[must_use]
    pub fn selections(&self) -> Ref<'_, [Selection]> {
        Ref::map(self.state.borrow(), |state| state.selections.as_slice())
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Selection> {
        self.state.borrow().selections.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().selections.len()
    }

    /// Always false outside of a broken invariant.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.borrow().selections.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Selection> {
        self.state.borrow().selections.get(index).cloned()
    }

    #[must_use]
    pub fn main(&self) -> Selection {
        let state = self.state.borrow();
        state.selections[state.main].clone()
    }

    #[must_use]
    pub fn main_index(&self) -> usize {
        self.state.borrow().main
    }

    pub fn set_main_index(&mut self, main: usize) {
        let mut state = self.state.borrow_mut();
        debug_assert!(main < state.selections.len());
        state.main = main;
    }

    /// Append a selection, clamped to `buffer`.
    pub fn push(&mut self, buffer: &Buffer, mut selection: Selection) {
        debug_assert!(self.buffer.refers_to(buffer));
        selection.clamp(buffer);
        self.state.borrow_mut().selections.push(selection);
    }

    /// Remove a selection; main stays on the same selection when it survives.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> Selection {
        let mut state = self.state.borrow_mut();
        debug_assert!(state.selections.len() > 1, "cannot remove the last selection");
        let removed = state.selections.remove(index);
        if index < state.main || state.main == state.selections.len() {
            state.main = state.main.saturating_sub(1);
        }
        removed
    }

    /// Stable sort by start then end; main follows its selection.
    pub fn sort(&mut self) {
        let state = &mut *self.state.borrow_mut();
        sort_selections(&mut state.selections, &mut state.main);
    }

    /// Fold overlapping neighbours of a sorted list into single selections.
    pub fn merge_overlapping(&mut self) {
        let state = &mut *self.state.borrow_mut();
        merge_overlapping_by(&mut state.selections, &mut state.main, overlaps);
    }

    pub fn sort_and_merge_overlapping(&mut self) {
        self.sort();
        self.merge_overlapping();
    }

    /// Apply `apply` to every selection with mutable buffer access, as
    /// [`SelectionList::for_each`] does.
    ///
    /// The list comes out sorted and merged, current with `buffer` even when
    /// a callback fails.
    pub fn for_each<F>(&mut self, buffer: &mut Buffer, may_append: bool, apply: F) -> Result<()>
    where
        F: FnMut(usize, &mut Selection, &mut EditContext<'_>) -> Result<()>,
    {
        debug_assert!(self.buffer.refers_to(buffer));
        let mut list = SelectionList::from_vec(buffer, self.to_vec());
        list.set_main_index(self.main_index());
        list.sort_and_merge_overlapping();
        let outcome = list.for_each(buffer, may_append, apply);
        // The listener kept the stale copy moving during the edits; the
        // batch result replaces it.
        *self.state.borrow_mut() =
            TrackedSelections::new(buffer, list.as_slice().to_vec(), list.main_index());
        outcome
    }

    /// Replace the tracked selections and main with those of `list`, which
    /// must be current with `buffer`. Rebinds when `buffer` is a different
    /// buffer.
    pub fn reset(&mut self, buffer: &Buffer, list: &SelectionList) {
        debug_assert!(list.buffer().refers_to(buffer));
        debug_assert_eq!(list.timestamp(), buffer.timestamp());
        self.rebind(buffer, list.as_slice().to_vec());
        self.set_main_index(list.main_index());
    }

    /// Track `selections` on `buffer`, moving the registration there if the
    /// list was bound to another buffer. The last selection becomes main.
    pub fn rebind(&mut self, buffer: &Buffer, selections: Vec<Selection>) {
        if !self.buffer.refers_to(buffer) || self.listener.is_none() {
            self.unregister();
            self.listener = Some(buffer.add_change_listener(as_listener(&self.state)));
            self.buffer = buffer.handle();
            emit_log_with(LogLevel::Debug, || {
                format!(
                    "dynamic selection list bound to buffer {}",
                    self.buffer.id().get()
                )
            });
        }
        let main = selections.len().saturating_sub(1);
        *self.state.borrow_mut() = TrackedSelections::new(buffer, selections, main);
    }

    /// A batch list with the tracked selections sorted and merged, main
    /// following its selection.
    ///
    /// Returns `None` when the list is bound to another buffer.
    #[must_use]
    pub fn to_selection_list(&self, buffer: &Buffer) -> Option<SelectionList> {
        if !self.buffer.refers_to(buffer) {
            return None;
        }
        let mut list = SelectionList::from_vec(buffer, self.to_vec());
        list.set_main_index(self.main_index());
        list.sort_and_merge_overlapping();
        Some(list)
    }

    /// Debug-build check that the list is non-empty with a valid main, and
    /// that every tracked coordinate is valid in `buffer`.
    pub fn check_invariant(&self, buffer: &Buffer) {
        debug_assert!(self.buffer.refers_to(buffer));
        if cfg!(debug_assertions) {
            let state = self.state.borrow();
            debug_assert!(!state.selections.is_empty());
            debug_assert!(state.main < state.selections.len());
            for sel in &state.selections {
                debug_assert!(buffer.is_valid(sel.anchor()));
                debug_assert!(buffer.is_valid(sel.cursor()));
            }
        }
    }

    fn unregister(&mut self) {
        let Some(id) = self.listener.take() else {
            return;
        };
        // A dead buffer took its registry, and every registration, with it.
        if let Some(registry) = self.buffer.registry() {
            let removed = registry.remove(id);
            debug_assert!(removed, "listener {id:?} was not registered");
        }
    }
}

impl Clone for DynamicSelectionList {
    fn clone(&self) -> Self {
        let state = {
            let current = self.state.borrow();
            Rc::new(RefCell::new(TrackedSelections {
                selections: current.selections.clone(),
                main: current.main,
            }))
        };
        let listener = self
            .buffer
            .registry()
            .map(|registry| registry.add(as_listener(&state)));
        Self {
            state,
            buffer: self.buffer.clone(),
            listener,
        }
    }
}

impl Drop for DynamicSelectionList {
    fn drop(&mut self) {
        self.unregister();
    }
}

fn as_listener(state: &Rc<RefCell<TrackedSelections>>) -> Weak<RefCell<dyn ChangeListener>> {
    Rc::<RefCell<TrackedSelections>>::downgrade(state)
}

fn clamped(buffer: &Buffer, mut selections: Vec<Selection>) -> Vec<Selection> {
    for sel in &mut selections {
        sel.clamp(buffer);
    }
    selections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::ListenerStats;

    fn c(line: usize, column: usize) -> Coord {
        Coord::new(line, column)
    }

    #[test]
    fn test_follows_insert_and_erase() {
        let mut buffer = Buffer::new("abc\ndef");
        let list = DynamicSelectionList::new(
            &buffer,
            vec![Selection::new(c(0, 2), c(1, 1)), Selection::point(c(0, 0))],
        );

        buffer.insert(c(0, 1), "XY").unwrap();
        assert_eq!(list.get(0), Some(Selection::new(c(0, 4), c(1, 1))));
        assert_eq!(list.get(1), Some(Selection::point(c(0, 0))));

        buffer.erase(c(0, 3), c(1, 0)).unwrap();
        assert_eq!(buffer.text(), "aXYdef");
        assert_eq!(list.get(0), Some(Selection::new(c(0, 3), c(0, 4))));
    }

    #[test]
    fn test_insert_at_position_pushes_forward() {
        let mut buffer = Buffer::new("abc");
        let list = DynamicSelectionList::new(&buffer, vec![Selection::point(c(0, 1))]);
        buffer.insert(c(0, 1), "\n").unwrap();
        assert_eq!(list.get(0), Some(Selection::point(c(1, 0))));
    }

    #[test]
    fn test_drop_unregisters() {
        let buffer = Buffer::new("abc");
        {
            let list = DynamicSelectionList::new(&buffer, vec![Selection::point(c(0, 0))]);
            assert!(list.is_registered());
            assert_eq!(buffer.listener_stats().active(), 1);
        }
        assert_eq!(
            buffer.listener_stats(),
            ListenerStats {
                registered: 1,
                unregistered: 1
            }
        );
        assert_eq!(buffer.live_handles(), 0);
    }

    #[test]
    fn test_clone_registers_separately() {
        let mut buffer = Buffer::new("abc");
        let list = DynamicSelectionList::new(&buffer, vec![Selection::point(c(0, 2))]);
        let copy = list.clone();
        assert_eq!(buffer.listener_stats().active(), 2);

        buffer.insert(c(0, 0), "x").unwrap();
        assert_eq!(list.get(0), copy.get(0));
        assert_eq!(copy.get(0), Some(Selection::point(c(0, 3))));

        drop(list);
        buffer.insert(c(0, 0), "y").unwrap();
        assert_eq!(copy.get(0), Some(Selection::point(c(0, 4))));
        drop(copy);
        assert_eq!(buffer.listener_stats().active(), 0);
    }

    #[test]
    fn test_moved_list_keeps_registration() {
        let mut buffer = Buffer::new("abc");
        let list = DynamicSelectionList::new(&buffer, vec![Selection::point(c(0, 1))]);
        let mut lists = vec![list];
        buffer.insert(c(0, 0), "x").unwrap();
        assert_eq!(lists[0].get(0), Some(Selection::point(c(0, 2))));
        assert_eq!(buffer.listener_stats().registered, 1);
        lists.clear();
        assert_eq!(buffer.listener_stats().active(), 0);
    }

    #[test]
    fn test_rebind_moves_registration() {
        let first = Buffer::new("abc");
        let second = Buffer::new("hello");
        let mut list = DynamicSelectionList::new(&first, vec![Selection::point(c(0, 1))]);
        list.rebind(&second, vec![Selection::point(c(0, 9))]);

        assert!(list.buffer().refers_to(&second));
        assert_eq!(first.listener_stats().active(), 0);
        assert_eq!(second.listener_stats().active(), 1);
        assert_eq!(list.get(0), Some(Selection::point(c(0, 5))));
        drop(list);
        assert_eq!(second.listener_stats().active(), 0);
    }

    #[test]
    fn test_reset_and_to_selection_list() {
        let mut buffer = Buffer::new("abcdef");
        let mut list = DynamicSelectionList::new(&buffer, vec![Selection::point(c(0, 5))]);
        let other = Buffer::new("xyz");
        assert!(list.to_selection_list(&other).is_none());

        let mut batch = SelectionList::from_vec(
            &buffer,
            vec![
                Selection::new(c(0, 3), c(0, 4)),
                Selection::new(c(0, 0), c(0, 1)),
            ],
        );
        batch.set_main_index(0);
        list.reset(&buffer, &batch);
        assert_eq!(buffer.listener_stats().registered, 1);
        assert_eq!(list.main_index(), 0);

        buffer.erase(c(0, 0), c(0, 1)).unwrap();
        let current = list.to_selection_list(&buffer).unwrap();
        assert_eq!(current.len(), 2);
        assert_eq!(current[0], Selection::point(c(0, 0)));
        assert_eq!(current[1], Selection::new(c(0, 2), c(0, 3)));
        assert_eq!(current.main_index(), 1);
        assert_eq!(current.timestamp(), buffer.timestamp());
        current.check_invariant(&buffer);
        list.check_invariant(&buffer);
    }

    #[test]
    fn test_push_remove_keep_main() {
        let buffer = Buffer::new("ab");
        let mut list = DynamicSelectionList::new(&buffer, vec![Selection::point(c(0, 1))]);
        list.push(&buffer, Selection::point(c(3, 3)));
        assert_eq!(list.get(1), Some(Selection::point(c(0, 2))));
        list.push(&buffer, Selection::point(c(0, 0)));
        list.set_main_index(2);

        assert_eq!(list.remove(0), Selection::point(c(0, 1)));
        assert_eq!(list.len(), 2);
        assert_eq!(list.main_index(), 1);
        assert_eq!(list.main(), Selection::point(c(0, 0)));

        assert_eq!(list.remove(1), Selection::point(c(0, 0)));
        assert_eq!(list.main_index(), 0);
        assert_eq!(list.main(), Selection::point(c(0, 2)));
    }

    #[test]
    fn test_main_follows_edits_and_merges() {
        let mut buffer = Buffer::new("0123456789");
        let mut list = DynamicSelectionList::new(
            &buffer,
            vec![
                Selection::new(c(0, 6), c(0, 8)),
                Selection::new(c(0, 1), c(0, 2)),
                Selection::point(c(0, 4)),
            ],
        );
        list.set_main_index(2);

        buffer.erase(c(0, 2), c(0, 6)).unwrap();
        assert_eq!(buffer.text(), "016789");
        assert_eq!(list.main_index(), 2);
        assert_eq!(list.main(), Selection::point(c(0, 2)));

        list.sort_and_merge_overlapping();
        assert_eq!(
            list.to_vec(),
            [Selection::new(c(0, 1), c(0, 4))]
        );
        assert_eq!(list.main_index(), 0);
        list.check_invariant(&buffer);
    }

    #[test]
    fn test_for_each_edits_through_batch_list() {
        let mut buffer = Buffer::new("ab cd");
        let mut list = DynamicSelectionList::new(
            &buffer,
            vec![Selection::point(c(0, 3)), Selection::point(c(0, 0))],
        );
        list.for_each(&mut buffer, false, |_, sel, ctx| {
            ctx.buffer().insert(sel.min(), "-")?;
            Ok(())
        })
        .unwrap();
        assert_eq!(buffer.text(), "-ab -cd");
        // Sorted first, each on the dash inserted before it.
        assert_eq!(
            list.to_vec(),
            [Selection::point(c(0, 0)), Selection::point(c(0, 4))]
        );
        assert_eq!(list.main_index(), 0);

        buffer.insert(c(0, 0), ">").unwrap();
        assert_eq!(list.get(1), Some(Selection::point(c(0, 5))));
        assert_eq!(buffer.listener_stats().active(), 1);
    }
}
