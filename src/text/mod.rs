//! Text storage: the buffer every coordinate in this crate refers to.
//!
//! Key types:
//!
//! - [`Buffer`]: rope-backed text with a change log, undo and listeners
//! - [`BufferHandle`]: non-owning reference held by selection lists and watchers
//! - [`ChangeListener`]: synchronous edit notifications
//!
//! # Examples
//!
//! ```
//! use seltrack::{Buffer, Coord};
//!
//! let mut buffer = Buffer::new("Hello");
//! buffer.insert(Coord::new(0, 5), " World").unwrap();
//! buffer.commit_undo_group();
//! assert_eq!(buffer.text(), "Hello World");
//!
//! buffer.undo();
//! assert_eq!(buffer.text(), "Hello");
//! assert_eq!(buffer.timestamp(), 2);
//! ```

mod buffer;
mod columns;
mod handle;
mod history;
mod rope;

pub use buffer::{Buffer, BufferFlags, BufferOptions};
pub use handle::{BufferHandle, BufferId, ChangeListener, ListenerId, ListenerStats};
pub use history::{DEFAULT_MAX_HISTORY_DEPTH, Modification};
pub use rope::RopeWrapper;
