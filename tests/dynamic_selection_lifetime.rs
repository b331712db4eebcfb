//! Lifetime and registration tests for dynamic selection lists.
//!
//! A dynamic list must register exactly once per live copy, unregister when
//! dropped, and keep every coordinate valid after each individual edit.

use std::cell::RefCell;
use std::rc::Rc;

use seltrack::{
    Buffer, ChangeListener, Coord, DynamicSelectionList, ListenerStats, Selection, SelectionList,
};

fn c(line: usize, column: usize) -> Coord {
    Coord::new(line, column)
}

fn assert_all_valid(buffer: &Buffer, list: &DynamicSelectionList) {
    for sel in list.selections().iter() {
        assert!(buffer.is_valid(sel.anchor()), "{sel:?} in {:?}", buffer.text());
        assert!(buffer.is_valid(sel.cursor()), "{sel:?} in {:?}", buffer.text());
    }
}

// ============================================================================
// Jump history
// ============================================================================

#[test]
fn test_jump_list_valid_after_every_edit() {
    let mut buffer = Buffer::new("first line\nsecond line\nthird line\n");
    let jumps = DynamicSelectionList::new(
        &buffer,
        vec![
            Selection::point(c(0, 6)),
            Selection::point(c(1, 7)),
            Selection::new(c(2, 0), c(2, 4)),
        ],
    );

    buffer.erase(c(0, 5), c(1, 7)).unwrap();
    assert_all_valid(&buffer, &jumps);
    assert_eq!(buffer.line(0).as_deref(), Some("firstline"));
    assert_eq!(jumps.get(0), Some(Selection::point(c(0, 5))));
    assert_eq!(jumps.get(1), Some(Selection::point(c(0, 5))));

    buffer.insert(c(0, 0), "zeroth\n").unwrap();
    assert_all_valid(&buffer, &jumps);
    assert_eq!(jumps.get(2), Some(Selection::new(c(2, 0), c(2, 4))));

    buffer.erase(c(0, 0), buffer.end_coord()).unwrap();
    assert_all_valid(&buffer, &jumps);
    assert!(jumps.selections().iter().all(|sel| sel.min() == c(0, 0)));
}

#[test]
fn test_dynamic_list_survives_undo_redo() {
    let mut buffer = Buffer::new("alpha beta gamma");
    let jumps = DynamicSelectionList::new(&buffer, vec![Selection::new(c(0, 11), c(0, 15))]);

    buffer.replace(c(0, 0), c(0, 5), "A").unwrap();
    buffer.commit_undo_group();
    assert_eq!(jumps.get(0), Some(Selection::new(c(0, 7), c(0, 11))));

    assert!(buffer.undo());
    assert_all_valid(&buffer, &jumps);
    assert_eq!(jumps.get(0), Some(Selection::new(c(0, 11), c(0, 15))));

    assert!(buffer.redo());
    assert_all_valid(&buffer, &jumps);
    assert_eq!(jumps.get(0), Some(Selection::new(c(0, 7), c(0, 11))));
}

#[test]
fn test_dynamic_and_batch_lists_agree() {
    let mut buffer = Buffer::new("one\ntwo\nthree\nfour");
    let initial = vec![
        Selection::new(c(0, 1), c(0, 2)),
        Selection::new(c(2, 0), c(2, 3)),
        Selection::point(c(3, 2)),
    ];
    let dynamic = DynamicSelectionList::new(&buffer, initial.clone());
    let mut batch = SelectionList::from_vec(&buffer, initial);

    buffer.insert(c(1, 0), "inserted\n").unwrap();
    buffer.insert(c(0, 0), ">").unwrap();
    buffer.erase(c(4, 0), c(4, 2)).unwrap();

    batch.update(&buffer, false);
    assert_eq!(dynamic.to_vec(), batch.as_slice());
}

#[test]
fn test_main_selection_survives_edits_and_copies() {
    let mut buffer = Buffer::new("one two three");
    let mut batch = SelectionList::from_vec(
        &buffer,
        vec![
            Selection::new(c(0, 0), c(0, 2)),
            Selection::new(c(0, 4), c(0, 6)),
            Selection::new(c(0, 8), c(0, 12)),
        ],
    );
    batch.set_main_index(1);
    let jumps = DynamicSelectionList::from_list(&buffer, &batch);
    drop(batch);

    buffer.replace(c(0, 0), c(0, 3), "1").unwrap();
    let copy = jumps.clone();
    buffer.insert(c(0, 1), "!").unwrap();

    for list in [&jumps, &copy] {
        assert_eq!(list.main_index(), 1);
        assert_eq!(list.main(), Selection::new(c(0, 3), c(0, 5)));
        list.check_invariant(&buffer);
    }
    assert_eq!(buffer.text(), "1! two three");
}

// ============================================================================
// Listener symmetry
// ============================================================================

#[test]
fn test_listener_symmetry_across_copies() {
    let buffer = Buffer::new("abc");
    {
        let list = DynamicSelectionList::new(&buffer, vec![Selection::point(c(0, 0))]);
        let copies: Vec<_> = (0..4).map(|_| list.clone()).collect();
        assert_eq!(buffer.listener_stats().active(), 5);

        let moved = copies;
        let boxed = Box::new(list);
        assert_eq!(buffer.listener_stats().active(), 5);
        drop(moved);
        drop(boxed);
    }
    assert_eq!(
        buffer.listener_stats(),
        ListenerStats {
            registered: 5,
            unregistered: 5
        }
    );
    assert_eq!(buffer.live_handles(), 0);
}

#[test]
fn test_listener_symmetry_across_rebinds() {
    let a = Buffer::new("first");
    let b = Buffer::new("second");
    {
        let mut list = DynamicSelectionList::new(&a, vec![Selection::point(c(0, 1))]);
        for round in 0..3 {
            let (target, other) = if round % 2 == 0 { (&b, &a) } else { (&a, &b) };
            list.rebind(target, vec![Selection::point(c(0, 2))]);
            assert!(list.buffer().refers_to(target));
            assert_eq!(target.listener_stats().active(), 1);
            assert_eq!(other.listener_stats().active(), 0);
        }

        // Same buffer: keeps the registration.
        let registered = b.listener_stats().registered;
        list.rebind(&b, vec![Selection::point(c(0, 0)), Selection::point(c(0, 4))]);
        assert_eq!(b.listener_stats().registered, registered);
        assert_eq!(list.main(), Selection::point(c(0, 4)));
    }
    for buffer in [&a, &b] {
        let stats = buffer.listener_stats();
        assert_eq!(stats.registered, stats.unregistered);
    }
}

#[test]
fn test_reset_from_batch_list_on_other_buffer() {
    let a = Buffer::new("aaaa");
    let mut b = Buffer::new("bbbb\nbbbb");
    let mut list = DynamicSelectionList::new(&a, vec![Selection::point(c(0, 3))]);

    let batch = SelectionList::new(&b, Selection::new(c(1, 0), c(1, 2)));
    list.reset(&b, &batch);
    assert_eq!(a.listener_stats().active(), 0);

    b.insert(c(0, 0), "\n").unwrap();
    assert_eq!(list.get(0), Some(Selection::new(c(2, 0), c(2, 2))));
    drop(batch);
    drop(list);
    assert_eq!(b.listener_stats().active(), 0);
}

// ============================================================================
// Listener dispatch
// ============================================================================

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl ChangeListener for Recorder {
    fn on_insert(&mut self, buffer: &Buffer, begin: Coord, end: Coord) {
        self.events
            .push(format!("insert {begin}..{end} ({} bytes)", buffer.len_bytes()));
    }

    fn on_erase(&mut self, buffer: &Buffer, begin: Coord, end: Coord) {
        self.events
            .push(format!("erase {begin}..{end} ({} bytes)", buffer.len_bytes()));
    }
}

#[test]
fn test_custom_listener_sees_edits_in_order() {
    let mut buffer = Buffer::new("hello");
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    let weak = Rc::downgrade(&recorder);
    let id = buffer.add_change_listener(weak);

    buffer.insert(c(0, 5), " world").unwrap();
    buffer.replace(c(0, 0), c(0, 1), "J").unwrap();
    assert!(buffer.remove_change_listener(id));
    buffer.insert(c(0, 0), "!").unwrap();

    insta::assert_snapshot!(recorder.borrow().events.join("\n"), @r"
    insert 0:5..0:11 (11 bytes)
    erase 0:0..0:1 (10 bytes)
    insert 0:0..0:1 (11 bytes)
    ");
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "handles still refer to it")]
fn test_dropping_buffer_with_live_list_is_caught() {
    let buffer = Buffer::new("abc");
    let list = DynamicSelectionList::new(&buffer, vec![Selection::point(c(0, 0))]);
    drop(buffer);
    drop(list);
}
