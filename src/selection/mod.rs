//! Selections: anchor/cursor pairs and the lists that keep them valid.
//!
//! Key types:
//!
//! - [`Selection`]: one anchor/cursor pair with target column and captures
//! - [`SelectionList`]: buffer-bound, sorted, non-overlapping selections
//!   refreshed lazily from the change log
//! - [`DynamicSelectionList`]: selections updated synchronously on every edit
//!
//! # Examples
//!
//! ```
//! use seltrack::{Coord, Selection, overlaps};
//!
//! let mut a = Selection::new(Coord::new(0, 0), Coord::new(0, 5));
//! let b = Selection::new(Coord::new(0, 3), Coord::new(0, 8));
//! assert!(overlaps(&a, &b));
//! a.merge_with(&b);
//! assert_eq!(a.cursor(), Coord::new(0, 8));
//! ```

mod desc;
mod dynamic;
mod list;

use std::cmp::Ordering;

pub use desc::{
    selection_from_string, selection_list_from_strings, selection_list_to_string,
    selection_to_string,
};
pub use dynamic::DynamicSelectionList;
pub use list::{EditContext, InsertMode, SelectionList, compute_modified_ranges};

use crate::changes::TrackedRange;
use crate::coord::Coord;
use crate::text::Buffer;

/// An anchor/cursor pair.
///
/// Both ends are inclusive: the selection covers the characters from
/// [`min`](Self::min) through [`max`](Self::max). Direction is forward when
/// `anchor <= cursor`.
#[derive(Clone, Debug, Default)]
pub struct Selection {
    anchor: Coord,
    cursor: Coord,
    /// Display column vertical motion aims for.
    target: Option<usize>,
    captures: Vec<String>,
}

impl Selection {
    #[must_use]
    pub const fn new(anchor: Coord, cursor: Coord) -> Self {
        Self {
            anchor,
            cursor,
            target: None,
            captures: Vec::new(),
        }
    }

    /// A single-character selection.
    #[must_use]
    pub const fn point(coord: Coord) -> Self {
        Self::new(coord, coord)
    }

    #[must_use]
    pub fn with_captures(mut self, captures: Vec<String>) -> Self {
        self.captures = captures;
        self
    }

    #[must_use]
    pub const fn anchor(&self) -> Coord {
        self.anchor
    }

    #[must_use]
    pub const fn cursor(&self) -> Coord {
        self.cursor
    }

    #[must_use]
    pub const fn target(&self) -> Option<usize> {
        self.target
    }

    pub fn set_target(&mut self, target: Option<usize>) {
        self.target = target;
    }

    #[must_use]
    pub fn captures(&self) -> &[String] {
        &self.captures
    }

    pub fn set_captures(&mut self, captures: Vec<String>) {
        self.captures = captures;
    }

    /// Start of the selection in buffer order. Ties go to the anchor.
    #[must_use]
    pub fn min(&self) -> Coord {
        self.anchor.min(self.cursor)
    }

    #[must_use]
    pub fn max(&self) -> Coord {
        self.anchor.max(self.cursor)
    }

    #[must_use]
    pub fn is_forward(&self) -> bool {
        self.anchor <= self.cursor
    }

    pub fn set(&mut self, anchor: Coord, cursor: Coord) {
        self.anchor = anchor;
        self.set_cursor(cursor);
    }

    pub fn set_anchor(&mut self, anchor: Coord) {
        self.anchor = anchor;
    }

    /// Move the cursor, forgetting the target column.
    pub fn set_cursor(&mut self, cursor: Coord) {
        self.cursor = cursor;
        self.target = None;
    }

    /// Cover `min..=max` while keeping the current direction.
    pub fn set_extent(&mut self, min: Coord, max: Coord) {
        debug_assert!(min <= max);
        if self.is_forward() {
            self.anchor = min;
            self.cursor = max;
        } else {
            self.anchor = max;
            self.cursor = min;
        }
    }

    /// Extend towards `other`, keeping this selection's direction.
    ///
    /// The cursor moves to `other`'s cursor; the anchor only ever moves
    /// outwards.
    pub fn merge_with(&mut self, other: &Self) {
        if self.is_forward() {
            self.anchor = self.anchor.min(other.anchor);
        } else {
            self.anchor = self.anchor.max(other.anchor);
        }
        self.cursor = other.cursor;
    }

    /// Snap both ends to valid buffer positions.
    pub fn clamp(&mut self, buffer: &Buffer) {
        self.anchor = buffer.clamp(self.anchor);
        self.cursor = buffer.clamp(self.cursor);
    }

    /// Move the cursor `offset` lines up or down, keeping to the target column.
    ///
    /// Without `extend`, the anchor follows the cursor.
    pub fn move_vertically(&mut self, buffer: &Buffer, offset: isize, extend: bool) {
        let tabstop = buffer.options().tabstop;
        let target = self
            .target
            .unwrap_or_else(|| buffer.display_column(self.cursor, tabstop));
        self.cursor = buffer.offset_coord_vertical(self.cursor, offset, Some(target), tabstop);
        self.target = Some(target);
        if !extend {
            self.anchor = self.cursor;
        }
    }

    fn min_max_mut(&mut self) -> (&mut Coord, &mut Coord) {
        if self.anchor <= self.cursor {
            (&mut self.anchor, &mut self.cursor)
        } else {
            (&mut self.cursor, &mut self.anchor)
        }
    }
}

/// Equality ignores target column and captures.
impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.anchor == other.anchor && self.cursor == other.cursor
    }
}

impl Eq for Selection {}

impl From<Coord> for Selection {
    fn from(coord: Coord) -> Self {
        Self::point(coord)
    }
}

impl TrackedRange for Selection {
    fn first(&self) -> Coord {
        self.min()
    }

    fn last(&self) -> Coord {
        self.max()
    }

    fn ends_mut(&mut self) -> (&mut Coord, Option<&mut Coord>) {
        let (min, max) = self.min_max_mut();
        (min, Some(max))
    }
}

/// Closed-interval intersection of two selections.
#[must_use]
pub fn overlaps(a: &Selection, b: &Selection) -> bool {
    a.min() <= b.max() && b.min() <= a.max()
}

/// Order by start, then by end.
#[must_use]
pub fn compare_selections(a: &Selection, b: &Selection) -> Ordering {
    a.min().cmp(&b.min()).then_with(|| a.max().cmp(&b.max()))
}
