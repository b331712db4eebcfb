//! Incremental per-line word index.

use std::collections::BTreeMap;
use std::ops::Bound;

use unicode_segmentation::UnicodeSegmentation;

use super::LineChangeWatcher;
use crate::event::{LogLevel, emit_log_with};
use crate::text::Buffer;

/// Words this long (in chars) or longer are not indexed.
pub const MAX_WORD_LEN: usize = 50;

fn split_words(line: &str) -> Vec<String> {
    line.unicode_words()
        .filter(|word| word.chars().count() < MAX_WORD_LEN)
        .map(str::to_owned)
        .collect()
}

/// Words of a buffer with their occurrence counts.
///
/// Built once from the whole buffer, then patched from line modifications:
/// only lines that changed since the last [`update`](Self::update) are
/// re-split.
#[derive(Clone, Debug)]
pub struct WordIndex {
    watcher: LineChangeWatcher,
    lines: Vec<Vec<String>>,
    words: BTreeMap<String, usize>,
}

impl WordIndex {
    #[must_use]
    pub fn new(buffer: &Buffer) -> Self {
        let mut index = Self {
            watcher: LineChangeWatcher::new(buffer),
            lines: Vec::with_capacity(buffer.line_count()),
            words: BTreeMap::new(),
        };
        for line in 0..buffer.line_count() {
            let words = split_words(&buffer.line(line).unwrap_or_default());
            index.add_words(&words);
            index.lines.push(words);
        }
        index
    }

    /// Buffer timestamp the index reflects.
    #[must_use]
    pub const fn timestamp(&self) -> usize {
        self.watcher.timestamp()
    }

    /// Bring the index up to date with `buffer`.
    pub fn update(&mut self, buffer: &Buffer) {
        let modifs = self.watcher.compute_modifications(buffer);
        if modifs.is_empty() {
            return;
        }

        let mut old_lines = std::mem::take(&mut self.lines).into_iter();
        let mut new_lines = Vec::with_capacity(buffer.line_count());
        let mut old_line = 0;
        for modif in &modifs {
            debug_assert!(old_line <= modif.old_line);
            while old_line < modif.old_line {
                new_lines.extend(old_lines.next());
                old_line += 1;
            }
            debug_assert_eq!(new_lines.len(), modif.new_line);

            while old_line < modif.old_end() {
                if let Some(words) = old_lines.next() {
                    self.remove_words(&words);
                }
                old_line += 1;
            }
            for line in modif.new_line..modif.new_end() {
                let words = split_words(&buffer.line(line).unwrap_or_default());
                self.add_words(&words);
                new_lines.push(words);
            }
        }
        new_lines.extend(old_lines);
        debug_assert_eq!(new_lines.len(), buffer.line_count());
        self.lines = new_lines;

        emit_log_with(LogLevel::Debug, || {
            format!(
                "word index patched {} line modifications, {} distinct words",
                modifs.len(),
                self.words.len()
            )
        });
    }

    /// Occurrences of `word` in the indexed buffer state.
    #[must_use]
    pub fn occurrences(&self, word: &str) -> usize {
        self.words.get(word).copied().unwrap_or(0)
    }

    /// Distinct words, sorted.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.keys().map(String::as_str)
    }

    /// Distinct words starting with `prefix`, sorted.
    #[must_use]
    pub fn find_prefix(&self, prefix: &str) -> Vec<&str> {
        self.words
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(word, _)| word.as_str())
            .take_while(|word| word.starts_with(prefix))
            .collect()
    }

    fn add_words(&mut self, words: &[String]) {
        for word in words {
            *self.words.entry(word.clone()).or_insert(0) += 1;
        }
    }

    fn remove_words(&mut self, words: &[String]) {
        for word in words {
            let count = self.words.get_mut(word);
            debug_assert!(count.is_some(), "word {word:?} was not indexed");
            let Some(count) = count else {
                continue;
            };
            *count -= 1;
            if *count == 0 {
                self.words.remove(word);
            }
        }
    }
}
