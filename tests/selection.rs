// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `SelectionManager` behavior: merge-on-overlap insertion, extension by
//! granularity, and `desired_x` column-memory across vertical motion.

use lineweave::testing::{FixedWidthTypesetter, StubTextStore};
use lineweave::{
    Affinity, Direction, EngineConfig, Granularity, LayoutManager, Point, Rect, Selection,
    SelectionManager,
};

fn laid_out(text: &str) -> (StubTextStore, LayoutManager) {
    let mut store = StubTextStore::new("");
    let mut manager = LayoutManager::new(
        Box::new(FixedWidthTypesetter::default()),
        EngineConfig::default(),
    );
    let edit = store.replace_and_describe(0..0, text);
    manager.handle_edit(&store, edit).unwrap();
    let viewport = Rect::new(0.0, 0.0, 1_000.0, 1_000_000.0);
    manager.layout_lines(&store, viewport);
    manager.layout_lines(&store, viewport);
    (store, manager)
}

#[test]
fn new_manager_starts_with_a_caret_at_zero() {
    let sm = SelectionManager::new();
    assert_eq!(sm.selections().len(), 1);
    assert!(sm.selections()[0].is_caret());
    assert_eq!(sm.selections()[0].range, 0..0);
}

#[test]
fn add_selection_merges_overlapping_ranges() {
    let mut sm = SelectionManager::new();
    sm.set_selection(Selection {
        range: 2..4,
        affinity: Affinity::Downstream,
        desired_x: None,
    });
    sm.add_selection(Selection {
        range: 3..6,
        affinity: Affinity::Downstream,
        desired_x: None,
    });
    assert_eq!(sm.selections().len(), 1);
    assert_eq!(sm.selections()[0].range, 2..6);
}

#[test]
fn add_selection_keeps_disjoint_ranges_separate() {
    let mut sm = SelectionManager::new();
    sm.set_selection(Selection {
        range: 0..1,
        affinity: Affinity::Downstream,
        desired_x: None,
    });
    sm.add_selection(Selection {
        range: 5..6,
        affinity: Affinity::Downstream,
        desired_x: None,
    });
    assert_eq!(sm.selections().len(), 2);
    assert_eq!(sm.selections()[0].range, 0..1);
    assert_eq!(sm.selections()[1].range, 5..6);
}

#[test]
fn add_selection_merges_touching_ranges() {
    // Touching (not just overlapping) ranges merge too -- a caret
    // exactly at an existing selection's edge joins it rather than
    // sitting beside it.
    let mut sm = SelectionManager::new();
    sm.set_selection(Selection {
        range: 2..4,
        affinity: Affinity::Downstream,
        desired_x: None,
    });
    sm.add_selection(Selection::caret(4, Affinity::Downstream));
    assert_eq!(sm.selections().len(), 1);
    assert_eq!(sm.selections()[0].range, 2..4);
}

#[test]
fn extend_by_character_moves_one_offset_and_clears_desired_x() {
    let (_store, manager) = laid_out("A\nB\nC\nD");
    let mut sm = SelectionManager::new();
    sm.extend(&manager, Granularity::Character, Direction::Forward);
    assert_eq!(sm.selections()[0].range, 0..1);
    assert_eq!(sm.selections()[0].desired_x, None);
}

#[test]
fn extend_by_word_jumps_to_the_scan_cap() {
    let (_store, manager) = laid_out("A\nB\nC\nD");
    let mut sm = SelectionManager::new();
    sm.extend(&manager, Granularity::Word, Direction::Forward);
    // The document (7 units) is far shorter than the word-break scan
    // cap, so a forward word step lands on the document end.
    assert_eq!(sm.selections()[0].range, 0..7);
}

#[test]
fn extend_backward_from_zero_stays_at_zero() {
    let (_store, manager) = laid_out("A\nB\nC\nD");
    let mut sm = SelectionManager::new();
    sm.extend(&manager, Granularity::Character, Direction::Backward);
    assert_eq!(sm.selections()[0].range, 0..0);
}

#[test]
fn hit_test_places_a_caret_and_records_desired_x() {
    let (_store, manager) = laid_out("A\nB\nC\nD");
    let mut sm = SelectionManager::new();
    sm.hit_test(&manager, Point::new(5.0, 20.0));
    assert!(sm.selections()[0].is_caret());
    assert_eq!(sm.selections()[0].range, 3..3);
    assert_eq!(sm.selections()[0].desired_x, Some(5.0));
}

#[test]
fn vertical_extension_preserves_desired_x_until_horizontal_motion() {
    let (_store, manager) = laid_out("A\nB\nC\nD");
    let mut sm = SelectionManager::new();
    sm.hit_test(&manager, Point::new(5.0, 20.0));
    assert_eq!(sm.selections()[0].desired_x, Some(5.0));

    sm.extend(&manager, Granularity::Line, Direction::Forward);
    assert_eq!(sm.selections()[0].range, 3..5);
    assert_eq!(sm.selections()[0].desired_x, Some(5.0));

    sm.extend(&manager, Granularity::Character, Direction::Forward);
    assert_eq!(sm.selections()[0].range, 3..6);
    assert_eq!(sm.selections()[0].desired_x, None);
}

#[test]
fn rects_for_selection_are_non_empty_once_laid_out() {
    let (_store, manager) = laid_out("A\nB\nC\nD");
    let mut sm = SelectionManager::new();
    sm.set_selection(Selection {
        range: 0..3,
        affinity: Affinity::Downstream,
        desired_x: None,
    });
    let rects = sm.rects(&manager);
    assert_eq!(rects.len(), 2);
    for rect in rects {
        assert!(rect.y1 > rect.y0);
    }
}
