//! `seltrack` - Coordinate and selection consistency for text editing
//!
//! Keeps positions into a text buffer valid while the buffer changes. Every
//! edit is logged as a [`Change`]; selection lists, dynamic selection lists
//! and line watchers replay that log to remap what they hold.
//!
//! # Examples
//!
//! ```
//! use seltrack::{Buffer, Coord, Selection, SelectionList};
//!
//! let mut buffer = Buffer::new("abc\ndef");
//! let mut sels = SelectionList::new(&buffer, Selection::point(Coord::new(0, 2)));
//!
//! buffer.insert(Coord::new(0, 1), "X").unwrap();
//! sels.update(&buffer, true);
//! assert_eq!(sels.main().cursor(), Coord::new(0, 3));
//! ```

// Crate-level lint configuration
#![allow(clippy::cast_possible_truncation)] // Intentional coordinate casts
#![allow(clippy::cast_sign_loss)] // Intentional coordinate conversions
#![allow(clippy::cast_possible_wrap)] // Line counts fit in isize
#![allow(clippy::module_name_repetitions)] // Allow SelectionList in selection etc
#![allow(clippy::missing_errors_doc)] // Docs WIP
#![allow(clippy::missing_panics_doc)] // Docs WIP
#![allow(clippy::missing_const_for_fn)] // Many functions could be const, not critical
#![allow(clippy::doc_markdown)] // Allow technical names without backticks
#![allow(clippy::use_self)] // Allow explicit type names in impl blocks
#![allow(clippy::needless_pass_by_value)] // Allow pass by value for small Copy types
#![allow(clippy::collapsible_if)] // Sometimes nested ifs are clearer
#![allow(clippy::items_after_statements)] // Common pattern in tests
#![allow(clippy::redundant_clone)] // Clones in tests for clarity are fine

pub mod changes;
pub mod coord;
pub mod error;
pub mod event;
pub mod lines;
pub mod selection;
pub mod text;

// Re-export core types at crate root
pub use changes::{Change, ChangeKind, ChangeTracker, TrackedRange};
pub use coord::Coord;
pub use error::{Error, Result};
pub use event::{
    LogLevel, clear_log_callback, emit_event, emit_log, log_enabled, set_event_callback,
    set_log_callback,
};

// Re-export text store types
pub use text::{
    Buffer, BufferFlags, BufferHandle, BufferId, BufferOptions, ChangeListener, ListenerId,
    ListenerStats,
};

// Re-export selection types
pub use selection::{
    DynamicSelectionList, EditContext, InsertMode, Selection, SelectionList, compare_selections,
    compute_modified_ranges, overlaps, selection_from_string, selection_list_from_strings,
    selection_list_to_string, selection_to_string,
};

// Re-export line types
pub use lines::{LineChange, LineChangeWatcher, LineModification, WordIndex};
