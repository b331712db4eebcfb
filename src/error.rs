//! Error types for seltrack.
//!
//! Only text-store edits and selection description parsing fail at runtime.
//! Contract violations inside the coordinate core are debug assertions.

use std::fmt;

/// Result type alias for seltrack operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for seltrack operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// The buffer is flagged read-only.
    ReadOnly,
    /// Coordinate does not address a position in the buffer.
    InvalidCoord { line: usize, column: usize },
    /// Malformed selection description.
    InvalidSelection(String),
    /// A selection list description with no selections.
    EmptySelectionList,
    /// Main selection index past the end of the list.
    InvalidMainIndex { main: usize, len: usize },
    /// Timestamp newer than the buffer it refers to.
    InvalidTimestamp { timestamp: usize, current: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => write!(f, "buffer is read-only"),
            Self::InvalidCoord { line, column } => {
                write!(f, "invalid coordinate {line}:{column}")
            }
            Self::InvalidSelection(desc) => write!(f, "invalid selection description: {desc}"),
            Self::EmptySelectionList => write!(f, "empty selection list description"),
            Self::InvalidMainIndex { main, len } => {
                write!(f, "main index {main} out of range for {len} selections")
            }
            Self::InvalidTimestamp { timestamp, current } => {
                write!(
                    f,
                    "timestamp {timestamp} is ahead of buffer timestamp {current}"
                )
            }
        }
    }
}

impl std::error::Error for Error {}
