//! Byte-addressed wrapper around `ropey::Rope`.

use ropey::{Rope, RopeSlice};

/// Wrapper around ropey::Rope with byte-offset helpers.
///
/// Lines are split on `'\n'` only. A trailing newline yields a final empty
/// line, so a rope always has at least one line.
#[derive(Clone, Debug, Default)]
pub struct RopeWrapper {
    rope: Rope,
}

impl RopeWrapper {
    /// Create an empty rope.
    #[must_use]
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Create a rope from a string.
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        Self {
            rope: Rope::from_str(s),
        }
    }

    /// Get the number of bytes.
    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    /// Get the number of lines.
    #[must_use]
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    /// Get a line by index, including its terminating newline.
    #[must_use]
    pub fn line(&self, idx: usize) -> Option<RopeSlice<'_>> {
        self.rope.get_line(idx)
    }

    /// Byte length of a line, excluding its terminating newline.
    #[must_use]
    pub fn line_len(&self, idx: usize) -> usize {
        self.line(idx).map_or(0, |line| {
            let len = line.len_bytes();
            if len > 0 && line.byte(len - 1) == b'\n' {
                len - 1
            } else {
                len
            }
        })
    }

    /// Get the byte index at the start of a line.
    #[must_use]
    pub fn line_to_byte(&self, line_idx: usize) -> usize {
        if line_idx >= self.len_lines() {
            self.len_bytes()
        } else {
            self.rope.line_to_byte(line_idx)
        }
    }

    /// Convert byte index to line index.
    #[must_use]
    pub fn byte_to_line(&self, byte_idx: usize) -> usize {
        self.rope.byte_to_line(byte_idx.min(self.len_bytes()))
    }

    /// Whether a byte index falls on a character boundary.
    #[must_use]
    pub fn is_char_boundary(&self, byte_idx: usize) -> bool {
        byte_idx <= self.len_bytes()
            && self.rope.char_to_byte(self.rope.byte_to_char(byte_idx)) == byte_idx
    }

    /// Start of the character containing `byte_idx`.
    #[must_use]
    pub fn char_start(&self, byte_idx: usize) -> usize {
        let byte_idx = byte_idx.min(self.len_bytes());
        self.rope.char_to_byte(self.rope.byte_to_char(byte_idx))
    }

    /// Byte index of the character after the one at `byte_idx`.
    #[must_use]
    pub fn next_char(&self, byte_idx: usize) -> usize {
        let char_idx = self.rope.byte_to_char(byte_idx.min(self.len_bytes()));
        self.rope
            .char_to_byte((char_idx + 1).min(self.rope.len_chars()))
    }

    /// Byte index of the character before the one at `byte_idx`.
    #[must_use]
    pub fn prev_char(&self, byte_idx: usize) -> usize {
        let char_idx = self.rope.byte_to_char(byte_idx.min(self.len_bytes()));
        self.rope.char_to_byte(char_idx.saturating_sub(1))
    }

    /// Insert text at a byte position on a character boundary.
    pub fn insert(&mut self, byte_idx: usize, text: &str) {
        debug_assert!(self.is_char_boundary(byte_idx));
        let char_idx = self.rope.byte_to_char(byte_idx);
        self.rope.insert(char_idx, text);
    }

    /// Remove a byte range whose ends lie on character boundaries.
    pub fn remove(&mut self, range: std::ops::Range<usize>) {
        debug_assert!(self.is_char_boundary(range.start) && self.is_char_boundary(range.end));
        let start = self.rope.byte_to_char(range.start);
        let end = self.rope.byte_to_char(range.end);
        self.rope.remove(start..end);
    }

    /// Copy a byte range out of the rope.
    #[must_use]
    pub fn slice_to_string(&self, range: std::ops::Range<usize>) -> String {
        self.rope
            .get_byte_slice(range)
            .map(|slice| slice.to_string())
            .unwrap_or_default()
    }

    /// Convert to string.
    #[must_use]
    pub fn to_string(&self) -> String {
        self.rope.to_string()
    }

    /// Get access to the underlying rope.
    #[must_use]
    pub fn inner(&self) -> &Rope {
        &self.rope
    }
}

impl From<&str> for RopeWrapper {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}
