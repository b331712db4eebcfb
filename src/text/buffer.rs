//! Rope-backed text store with a change log, undo history and listeners.

use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::rc::Rc;

use bitflags::bitflags;

use super::handle::{
    BufferHandle, BufferId, ChangeListener, ListenerId, ListenerStats, WatchRegistry,
};
use super::history::{DEFAULT_MAX_HISTORY_DEPTH, History, Modification};
use super::rope::RopeWrapper;
use crate::changes::{Change, ChangeKind};
use crate::coord::Coord;
use crate::error::{Error, Result};
use crate::event::{LogLevel, emit_event, emit_log_with};

bitflags! {
    /// Buffer behavior flags.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct BufferFlags: u8 {
        /// Edits fail with [`Error::ReadOnly`].
        const READ_ONLY = 0b0000_0001;
        /// Edits are not recorded for undo.
        const NO_UNDO   = 0b0000_0010;
    }
}

/// Buffer configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferOptions {
    pub flags: BufferFlags,
    /// Maximum number of undo groups retained.
    pub max_history_depth: usize,
    /// Tab width used for display columns.
    pub tabstop: usize,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            flags: BufferFlags::empty(),
            max_history_depth: DEFAULT_MAX_HISTORY_DEPTH,
            tabstop: 8,
        }
    }
}

/// Single-writer text store.
///
/// Every primitive edit appends one [`Change`] to the log, so
/// [`timestamp`](Self::timestamp) is the number of changes made so far and
/// [`changes_since`](Self::changes_since) hands out the exact suffix a stale
/// consumer has not seen. Registered [`ChangeListener`]s are notified
/// synchronously from inside the edit.
///
/// # Examples
///
/// ```
/// use seltrack::{Buffer, Coord};
///
/// let mut buffer = Buffer::new("abc\ndef");
/// let range = buffer.insert(Coord::new(0, 1), "X").unwrap();
/// assert_eq!(range, Coord::new(0, 1)..Coord::new(0, 2));
/// assert_eq!(buffer.timestamp(), 1);
/// assert_eq!(buffer.line(0).as_deref(), Some("aXbc"));
/// ```
pub struct Buffer {
    id: BufferId,
    rope: RopeWrapper,
    options: BufferOptions,
    changes: Vec<Change>,
    history: History,
    registry: Rc<WatchRegistry>,
}

impl Buffer {
    /// Create a buffer with default options.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self::with_options(text, BufferOptions::default())
    }

    /// Create a buffer with explicit options.
    #[must_use]
    pub fn with_options(text: &str, options: BufferOptions) -> Self {
        let id = BufferId::next();
        Self {
            id,
            rope: RopeWrapper::from_str(text),
            options,
            changes: Vec::new(),
            history: History::with_max_depth(options.max_history_depth),
            registry: Rc::new(WatchRegistry::new(id)),
        }
    }

    #[must_use]
    pub const fn id(&self) -> BufferId {
        self.id
    }

    #[must_use]
    pub const fn options(&self) -> &BufferOptions {
        &self.options
    }

    #[must_use]
    pub const fn flags(&self) -> BufferFlags {
        self.options.flags
    }

    pub fn set_flags(&mut self, flags: BufferFlags) {
        self.options.flags = flags;
    }

    // ----- Change log -----

    /// Number of changes logged so far.
    #[must_use]
    pub fn timestamp(&self) -> usize {
        self.changes.len()
    }

    /// Changes logged at or after `timestamp`, in order.
    #[must_use]
    pub fn changes_since(&self, timestamp: usize) -> &[Change] {
        debug_assert!(timestamp <= self.timestamp());
        self.changes.get(timestamp..).unwrap_or(&[])
    }

    // ----- Content access -----

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Content of a line without its newline.
    #[must_use]
    pub fn line(&self, idx: usize) -> Option<String> {
        let line = self.rope.line(idx)?;
        let mut text = line.to_string();
        if text.ends_with('\n') {
            text.pop();
        }
        Some(text)
    }

    /// Byte length of a line, excluding its newline.
    #[must_use]
    pub fn line_len(&self, idx: usize) -> usize {
        self.rope.line_len(idx)
    }

    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rope.is_empty()
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Text between two coordinates.
    #[must_use]
    pub fn string(&self, begin: Coord, end: Coord) -> String {
        let begin = self.offset_of(begin);
        let end = self.offset_of(end).max(begin);
        self.rope.slice_to_string(begin..end)
    }

    // ----- Coordinates -----

    /// Position just past the last character.
    #[must_use]
    pub fn end_coord(&self) -> Coord {
        let last = self.line_count() - 1;
        Coord::new(last, self.line_len(last))
    }

    #[must_use]
    pub fn is_valid(&self, coord: Coord) -> bool {
        coord.line < self.line_count()
            && coord.column <= self.line_len(coord.line)
            && self
                .rope
                .is_char_boundary(self.rope.line_to_byte(coord.line) + coord.column)
    }

    #[must_use]
    pub fn is_end(&self, coord: Coord) -> bool {
        coord >= self.end_coord()
    }

    /// Nearest valid coordinate at or before `coord`.
    #[must_use]
    pub fn clamp(&self, coord: Coord) -> Coord {
        let line = coord.line.min(self.line_count() - 1);
        let column = coord.column.min(self.line_len(line));
        let start = self.rope.line_to_byte(line);
        Coord::new(line, self.rope.char_start(start + column) - start)
    }

    /// Byte offset of a coordinate.
    #[must_use]
    pub fn offset_of(&self, coord: Coord) -> usize {
        let start = self.rope.line_to_byte(coord.line);
        (start + coord.column).min(self.len_bytes())
    }

    /// Coordinate of a byte offset.
    #[must_use]
    pub fn coord_at(&self, offset: usize) -> Coord {
        let offset = offset.min(self.len_bytes());
        let line = self.rope.byte_to_line(offset);
        Coord::new(line, offset - self.rope.line_to_byte(line))
    }

    /// Coordinate of the next character, or the end coordinate.
    #[must_use]
    pub fn char_next(&self, coord: Coord) -> Coord {
        self.coord_at(self.rope.next_char(self.offset_of(coord)))
    }

    /// Coordinate of the previous character, or the start of the buffer.
    #[must_use]
    pub fn char_prev(&self, coord: Coord) -> Coord {
        self.coord_at(self.rope.prev_char(self.offset_of(coord)))
    }

    // ----- Edits -----

    /// Insert `text` at `pos`, returning the inserted range.
    pub fn insert(&mut self, pos: Coord, text: &str) -> Result<Range<Coord>> {
        self.check_writable()?;
        self.check_coord(pos)?;
        if text.is_empty() {
            return Ok(pos..pos);
        }
        self.record(ChangeKind::Insert, pos, text.to_string());
        Ok(self.do_insert(pos, text))
    }

    /// Erase `begin..end`, returning the collapsed position.
    pub fn erase(&mut self, begin: Coord, end: Coord) -> Result<Coord> {
        self.check_writable()?;
        self.check_coord(begin)?;
        self.check_coord(end)?;
        if end < begin {
            return Err(Error::InvalidCoord {
                line: end.line,
                column: end.column,
            });
        }
        if begin == end {
            return Ok(begin);
        }
        let content = self.string(begin, end);
        self.record(ChangeKind::Erase, begin, content);
        Ok(self.do_erase(begin, end))
    }

    /// Replace `begin..end` with `text`, returning the inserted range.
    ///
    /// Logs an erase followed by an insert.
    pub fn replace(&mut self, begin: Coord, end: Coord, text: &str) -> Result<Range<Coord>> {
        let pos = self.erase(begin, end)?;
        self.insert(pos, text)
    }

    // ----- Undo -----

    /// Close the current undo group.
    pub fn commit_undo_group(&mut self) {
        self.history.commit();
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Revert the last undo group.
    ///
    /// The group's modifications are reverted last to first, so forward edits
    /// come back as a backward run in the change log.
    pub fn undo(&mut self) -> bool {
        if self.flags().contains(BufferFlags::READ_ONLY) {
            return false;
        }
        let Some(group) = self.history.pop_undo() else {
            return false;
        };
        for modification in group.iter().rev() {
            self.apply(&modification.inverse());
        }
        emit_event("buffer.undo", &format!("{{\"modifications\":{}}}", group.len()));
        self.history.push_redo(group);
        true
    }

    /// Reapply the last undone group.
    pub fn redo(&mut self) -> bool {
        if self.flags().contains(BufferFlags::READ_ONLY) {
            return false;
        }
        let Some(group) = self.history.pop_redo() else {
            return false;
        };
        for modification in &group {
            self.apply(modification);
        }
        emit_event("buffer.redo", &format!("{{\"modifications\":{}}}", group.len()));
        self.history.push_undo(group);
        true
    }

    // ----- Listeners and handles -----

    /// Non-owning handle to this buffer.
    #[must_use]
    pub fn handle(&self) -> BufferHandle {
        BufferHandle::new(self.id, &self.registry)
    }

    /// Number of handles still referring to this buffer.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        Rc::weak_count(&self.registry)
    }

    pub fn add_change_listener(
        &self,
        listener: std::rc::Weak<RefCell<dyn ChangeListener>>,
    ) -> ListenerId {
        self.registry.add(listener)
    }

    pub fn remove_change_listener(&self, id: ListenerId) -> bool {
        self.registry.remove(id)
    }

    #[must_use]
    pub fn listener_stats(&self) -> ListenerStats {
        self.registry.stats()
    }

    // ----- Internals -----

    fn check_writable(&self) -> Result<()> {
        if self.flags().contains(BufferFlags::READ_ONLY) {
            Err(Error::ReadOnly)
        } else {
            Ok(())
        }
    }

    fn check_coord(&self, coord: Coord) -> Result<()> {
        if self.is_valid(coord) {
            Ok(())
        } else {
            Err(Error::InvalidCoord {
                line: coord.line,
                column: coord.column,
            })
        }
    }

    fn record(&mut self, kind: ChangeKind, coord: Coord, content: String) {
        if !self.flags().contains(BufferFlags::NO_UNDO) {
            self.history.push(Modification {
                kind,
                coord,
                content,
            });
        }
    }

    fn apply(&mut self, modification: &Modification) {
        match modification.kind {
            ChangeKind::Insert => {
                self.do_insert(modification.coord, &modification.content);
            }
            ChangeKind::Erase => {
                let end = self.offset_of(modification.coord) + modification.content.len();
                let end = self.coord_at(end);
                self.do_erase(modification.coord, end);
            }
        }
    }

    fn do_insert(&mut self, pos: Coord, text: &str) -> Range<Coord> {
        let offset = self.offset_of(pos);
        self.rope.insert(offset, text);
        let end = self.coord_at(offset + text.len());
        self.changes.push(Change::insert(pos, end));
        self.notify(|listener, buffer| listener.on_insert(buffer, pos, end));
        pos..end
    }

    fn do_erase(&mut self, begin: Coord, end: Coord) -> Coord {
        let range = self.offset_of(begin)..self.offset_of(end);
        self.rope.remove(range);
        self.changes.push(Change::erase(begin, end));
        self.notify(|listener, buffer| listener.on_erase(buffer, begin, end));
        begin
    }

    fn notify<F>(&self, mut call: F)
    where
        F: FnMut(&mut dyn ChangeListener, &Self),
    {
        for listener in self.registry.snapshot() {
            let borrowed = listener.try_borrow_mut();
            debug_assert!(
                borrowed.is_ok(),
                "change listener borrowed during a buffer edit"
            );
            match borrowed {
                Ok(mut listener) => call(&mut *listener, self),
                Err(_) => emit_log_with(LogLevel::Error, || {
                    format!("buffer {}: listener busy during edit", self.id.get())
                }),
            }
        }
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id.get())
            .field("lines", &self.line_count())
            .field("bytes", &self.len_bytes())
            .field("timestamp", &self.timestamp())
            .field("flags", &self.options.flags)
            .field("undo_groups", &self.history.undo_depth())
            .field("listeners", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        let handles = self.live_handles();
        let listeners = self.registry.stats().active();
        if handles > 0 || listeners > 0 {
            emit_log_with(LogLevel::Warn, || {
                format!(
                    "buffer {} dropped with {handles} live handles and {listeners} listeners",
                    self.id.get()
                )
            });
        }
        debug_assert!(
            std::thread::panicking() || handles == 0,
            "buffer dropped while {handles} handles still refer to it"
        );
    }
}
