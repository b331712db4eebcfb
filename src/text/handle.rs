//! Non-owning buffer handles and the change-listener registry.
//!
//! A [`Buffer`] owns an `Rc<WatchRegistry>`. Everything that refers back to
//! the buffer (selection lists, dynamic lists, line watchers) holds a
//! [`BufferHandle`], which is only a `Weak` to that registry plus the
//! buffer's id. Handles never keep the buffer alive, and the buffer can
//! count them to catch dangling watchers at teardown.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use super::Buffer;
use crate::coord::Coord;
use crate::event::{LogLevel, emit_log_with};

/// Process-unique buffer identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Identity of one listener registration on one buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Receives buffer edits synchronously, from inside the edit call.
///
/// `begin..end` are the coordinates of the logged [`Change`](crate::Change);
/// the buffer passed in already reflects the edit.
pub trait ChangeListener {
    fn on_insert(&mut self, buffer: &Buffer, begin: Coord, end: Coord);
    fn on_erase(&mut self, buffer: &Buffer, begin: Coord, end: Coord);
}

/// Shared, weakly referenced listener.
pub type SharedListener = Weak<RefCell<dyn ChangeListener>>;

/// Registration counters for a buffer's listener registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ListenerStats {
    pub registered: usize,
    pub unregistered: usize,
}

impl ListenerStats {
    /// Registrations not yet released.
    #[must_use]
    pub const fn active(&self) -> usize {
        self.registered - self.unregistered
    }
}

/// Registry owned by a buffer: its listeners and registration counters.
pub(crate) struct WatchRegistry {
    id: BufferId,
    listeners: RefCell<Vec<(ListenerId, SharedListener)>>,
    next_listener: Cell<u64>,
    stats: Cell<ListenerStats>,
}

impl WatchRegistry {
    pub(crate) fn new(id: BufferId) -> Self {
        Self {
            id,
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
            stats: Cell::new(ListenerStats::default()),
        }
    }

    pub(crate) fn add(&self, listener: SharedListener) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        let mut listeners = self.listeners.borrow_mut();
        self.prune(&mut listeners);
        listeners.push((id, listener));
        let mut stats = self.stats.get();
        stats.registered += 1;
        self.stats.set(stats);
        id
    }

    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(idx) = listeners.iter().position(|(lid, _)| *lid == id) else {
            return false;
        };
        listeners.remove(idx);
        let mut stats = self.stats.get();
        stats.unregistered += 1;
        self.stats.set(stats);
        true
    }

    pub(crate) fn stats(&self) -> ListenerStats {
        self.stats.get()
    }

    /// Live listeners, in registration order. Dead entries are dropped.
    pub(crate) fn snapshot(&self) -> Vec<Rc<RefCell<dyn ChangeListener>>> {
        let mut listeners = self.listeners.borrow_mut();
        self.prune(&mut listeners);
        listeners
            .iter()
            .filter_map(|(_, listener)| listener.upgrade())
            .collect()
    }

    /// Drop registrations whose listener died without being removed. They
    /// count as unregistered.
    fn prune(&self, listeners: &mut Vec<(ListenerId, SharedListener)>) {
        let before = listeners.len();
        listeners.retain(|(_, listener)| listener.strong_count() > 0);
        let pruned = before - listeners.len();
        if pruned == 0 {
            return;
        }
        let mut stats = self.stats.get();
        stats.unregistered += pruned;
        self.stats.set(stats);
        emit_log_with(LogLevel::Warn, || {
            format!(
                "buffer {}: pruned {pruned} listeners dropped without unregistering",
                self.id.get()
            )
        });
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.borrow().len()
    }
}

/// Non-owning reference to a [`Buffer`].
///
/// Compares equal to another handle on the same buffer.
#[derive(Clone)]
pub struct BufferHandle {
    id: BufferId,
    registry: Weak<WatchRegistry>,
}

impl BufferHandle {
    pub(crate) fn new(id: BufferId, registry: &Rc<WatchRegistry>) -> Self {
        Self {
            id,
            registry: Rc::downgrade(registry),
        }
    }

    #[must_use]
    pub const fn id(&self) -> BufferId {
        self.id
    }

    /// Whether the buffer still exists.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.registry.strong_count() > 0
    }

    /// Whether this handle refers to `buffer`.
    #[must_use]
    pub fn refers_to(&self, buffer: &Buffer) -> bool {
        self.id == buffer.id()
    }

    pub(crate) fn registry(&self) -> Option<Rc<WatchRegistry>> {
        let registry = self.registry.upgrade()?;
        debug_assert_eq!(registry.id, self.id);
        Some(registry)
    }
}

impl PartialEq for BufferHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for BufferHandle {}

impl std::fmt::Debug for BufferHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferHandle")
            .field("id", &self.id.0)
            .field("live", &self.is_live())
            .finish()
    }
}
