//! Fuzz target for selection descriptions.
//!
//! Parsing arbitrary text must never panic, and anything that parses must
//! print back to a description that parses to the same selection.

#![no_main]

use libfuzzer_sys::fuzz_target;
use seltrack::{Buffer, selection_from_string, selection_list_from_strings, selection_to_string};

fuzz_target!(|data: &str| {
    if let Ok(sel) = selection_from_string(data) {
        let printed = selection_to_string(&sel);
        assert_eq!(selection_from_string(&printed).ok(), Some(sel));
    }

    // Whole lists are clamped into the buffer and come out sorted and disjoint.
    let buffer = Buffer::new("fuzz\nselection\n\ndescriptions");
    let descs: Vec<&str> = data.split_whitespace().take(64).collect();
    if let Ok(list) = selection_list_from_strings(&buffer, &descs, buffer.timestamp(), 0) {
        list.check_invariant(&buffer);
    }
});
