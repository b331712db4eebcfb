//! Display columns: byte columns measured in terminal cells.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::Buffer;
use crate::coord::Coord;

fn grapheme_width(grapheme: &str, col: usize, tabstop: usize) -> usize {
    if grapheme == "\t" {
        let tabstop = tabstop.max(1);
        tabstop - (col % tabstop)
    } else {
        UnicodeWidthStr::width(grapheme)
    }
}

impl Buffer {
    /// Display column of `coord`, with tabs advancing to the next tabstop.
    #[must_use]
    pub fn display_column(&self, coord: Coord, tabstop: usize) -> usize {
        let Some(line) = self.line(coord.line) else {
            return 0;
        };
        let end = coord.column.min(line.len());
        let mut col = 0;
        for (idx, grapheme) in line.grapheme_indices(true) {
            if idx >= end {
                break;
            }
            col += grapheme_width(grapheme, col, tabstop);
        }
        col
    }

    /// Coordinate on `line` whose display column is at or just before
    /// `target`, clamped to the line end.
    #[must_use]
    pub fn coord_at_display_column(&self, line: usize, target: usize, tabstop: usize) -> Coord {
        let line = line.min(self.line_count() - 1);
        let Some(text) = self.line(line) else {
            return Coord::new(line, 0);
        };
        let mut col = 0;
        for (idx, grapheme) in text.grapheme_indices(true) {
            let width = grapheme_width(grapheme, col, tabstop);
            if col + width > target {
                return Coord::new(line, idx);
            }
            col += width;
        }
        Coord::new(line, text.len())
    }

    /// Move `coord` by `offset` lines, aiming for display column `target`
    /// (or the current one).
    #[must_use]
    pub fn offset_coord_vertical(
        &self,
        coord: Coord,
        offset: isize,
        target: Option<usize>,
        tabstop: usize,
    ) -> Coord {
        let target = target.unwrap_or_else(|| self.display_column(coord, tabstop));
        let last = self.line_count() - 1;
        let line = coord.line.saturating_add_signed(offset).min(last);
        self.coord_at_display_column(line, target, tabstop)
    }
}
