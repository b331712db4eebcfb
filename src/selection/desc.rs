//! Textual selection descriptions: `<line>.<column>,<line>.<column>`.
//!
//! Lines and byte columns are 1-based. A list is written as space-separated
//! descriptions with the main selection first.

use super::Selection;
use super::list::{SelectionList, merge_overlapping_by, sort_selections};
use crate::coord::Coord;
use crate::error::{Error, Result};
use crate::text::Buffer;

/// Format one selection as `anchor,cursor`.
#[must_use]
pub fn selection_to_string(selection: &Selection) -> String {
    let anchor = selection.anchor();
    let cursor = selection.cursor();
    format!(
        "{}.{},{}.{}",
        anchor.line + 1,
        anchor.column + 1,
        cursor.line + 1,
        cursor.column + 1
    )
}

fn parse_coord(desc: &str, part: &str) -> Result<Coord> {
    let invalid = || {
        Error::InvalidSelection(format!(
            "'{desc}' does not follow <line>.<column>,<line>.<column> format"
        ))
    };
    let (line, column) = part.split_once('.').ok_or_else(invalid)?;
    let line: usize = line.trim().parse().map_err(|_| invalid())?;
    let column: usize = column.trim().parse().map_err(|_| invalid())?;
    if line == 0 || column == 0 {
        return Err(Error::InvalidSelection(format!(
            "coordinates must be >= 1: '{desc}'"
        )));
    }
    Ok(Coord::new(line - 1, column - 1))
}

/// Parse one `anchor,cursor` description.
pub fn selection_from_string(desc: &str) -> Result<Selection> {
    let (anchor, cursor) = desc.split_once(',').ok_or_else(|| {
        Error::InvalidSelection(format!(
            "'{desc}' does not follow <line>.<column>,<line>.<column> format"
        ))
    })?;
    Ok(Selection::new(
        parse_coord(desc, anchor)?,
        parse_coord(desc, cursor)?,
    ))
}

/// Format a list, main selection first, then the rest in list order
/// wrapping around.
#[must_use]
pub fn selection_list_to_string(list: &SelectionList) -> String {
    let sels = list.as_slice();
    let (before, from_main) = sels.split_at(list.main_index());
    from_main
        .iter()
        .chain(before)
        .map(selection_to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build a list from descriptions taken at `timestamp` of `buffer`.
///
/// Descriptions are sorted and merged, then remapped to the current buffer
/// state when `timestamp` is older, or clamped to it otherwise.
pub fn selection_list_from_strings<S: AsRef<str>>(
    buffer: &Buffer,
    descs: &[S],
    timestamp: usize,
    main: usize,
) -> Result<SelectionList> {
    if timestamp > buffer.timestamp() {
        return Err(Error::InvalidTimestamp {
            timestamp,
            current: buffer.timestamp(),
        });
    }
    let mut sels = descs
        .iter()
        .map(|desc| selection_from_string(desc.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    if sels.is_empty() {
        return Err(Error::EmptySelectionList);
    }
    if main >= sels.len() {
        return Err(Error::InvalidMainIndex {
            main,
            len: sels.len(),
        });
    }

    let mut main = main;
    sort_selections(&mut sels, &mut main);
    merge_overlapping_by(&mut sels, &mut main, super::overlaps);

    let mut list = SelectionList::with_timestamp(buffer, sels, timestamp);
    list.set_main_index(main);
    if timestamp < buffer.timestamp() {
        list.update(buffer, true);
    } else {
        list.clamp(buffer);
    }
    Ok(list)
}
