//! Line/column positions.

use std::fmt;

/// A position in a buffer: zero-based line index and byte column.
///
/// Coordinates order lexicographically, line first. Column `line_len`
/// addresses the end of the line (its `'\n'`, or the end of the buffer on
/// the last line).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub line: usize,
    pub column: usize,
}

impl Coord {
    /// The first position of any buffer.
    pub const ZERO: Self = Self { line: 0, column: 0 };

    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Shift by a signed line/column delta.
    ///
    /// Callers guarantee the result is non-negative; underflow saturates at
    /// zero in release builds.
    #[must_use]
    pub(crate) fn offset_by(self, lines: isize, columns: isize) -> Self {
        debug_assert!(self.line.checked_add_signed(lines).is_some());
        debug_assert!(self.column.checked_add_signed(columns).is_some());
        Self {
            line: self.line.saturating_add_signed(lines),
            column: self.column.saturating_add_signed(columns),
        }
    }
}

/// Signed difference `a - b`.
pub(crate) fn diff(a: usize, b: usize) -> isize {
    if a >= b {
        (a - b) as isize
    } else {
        -((b - a) as isize)
    }
}

impl From<(usize, usize)> for Coord {
    fn from((line, column): (usize, usize)) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
