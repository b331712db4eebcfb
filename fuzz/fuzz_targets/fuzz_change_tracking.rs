//! Fuzz target for change tracking.
//!
//! Replays arbitrary edits on a buffer and checks that lazily updated lists,
//! dynamic lists and line modifications all stay consistent with the text.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use seltrack::lines::modifications_since;
use seltrack::{Buffer, DynamicSelectionList, Selection, SelectionList};

#[derive(Arbitrary, Debug)]
enum Op {
    Insert { at: u16, text: String },
    Erase { at: u16, len: u8 },
    Commit,
    Undo,
    Redo,
}

#[derive(Arbitrary, Debug)]
struct Input {
    text: String,
    points: Vec<(u16, u16)>,
    ops: Vec<Op>,
}

fuzz_target!(|input: Input| {
    let mut buffer = Buffer::new(&input.text);
    let old_lines = buffer.line_count();
    let len = buffer.len_bytes();
    let at = |offset: u16| buffer.coord_at(usize::from(offset) % (len + 1));
    let sels: Vec<Selection> = input
        .points
        .iter()
        .take(32)
        .map(|&(a, c)| Selection::new(at(a), at(c)))
        .collect();
    if sels.is_empty() {
        return;
    }

    let dynamic = DynamicSelectionList::new(&buffer, sels.clone());
    let mut merged = SelectionList::from_vec(&buffer, sels.clone());
    let mut points = SelectionList::from_vec(&buffer, sels);

    for op in input.ops.iter().take(64) {
        let len = buffer.len_bytes();
        match op {
            Op::Insert { at, text } => {
                let pos = buffer.coord_at(usize::from(*at) % (len + 1));
                let _ = buffer.insert(pos, text);
            }
            Op::Erase { at, len: count } => {
                if len > 0 {
                    let begin = usize::from(*at) % len;
                    let end = (begin + usize::from(*count)).min(len);
                    let (begin, end) = (buffer.coord_at(begin), buffer.coord_at(end));
                    let _ = buffer.erase(begin, end);
                }
            }
            Op::Commit => buffer.commit_undo_group(),
            Op::Undo => {
                buffer.undo();
            }
            Op::Redo => {
                buffer.redo();
            }
        }
        dynamic.check_invariant(&buffer);
    }

    merged.update(&buffer, true);
    merged.check_invariant(&buffer);
    points.update(&buffer, false);
    assert_eq!(points.len(), dynamic.len());
    for sel in points.iter().chain(dynamic.to_vec().iter()) {
        assert!(buffer.is_valid(sel.anchor()) && buffer.is_valid(sel.cursor()));
    }

    let modifs = modifications_since(&buffer, 0);
    let removed: usize = modifs.iter().map(|m| m.num_removed).sum();
    let added: usize = modifs.iter().map(|m| m.num_added).sum();
    assert_eq!(old_lines + added - removed, buffer.line_count());

    drop(dynamic);
    drop(merged);
    drop(points);
});
