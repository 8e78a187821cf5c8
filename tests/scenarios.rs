// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic end-to-end scenarios driving `LayoutManager` the way a
//! host would: mutate a `TextStore`, report the resulting `EditDelta`,
//! then assert on line count, total length, and layout-derived height.

use lineweave::testing::{FixedGlyphRun, FixedWidthTypesetter, RecordingRenderDelegate, StubTextStore};
use lineweave::{EngineConfig, LayoutManager, Rect, TypesetResult, Typesetter};

fn huge_viewport() -> Rect {
    Rect::new(0.0, 0.0, 1_000.0, 1_000_000.0)
}

/// A typesetter that, unlike `FixedWidthTypesetter`, does nothing to
/// keep a CRLF pair together -- it breaks at exactly `constraining_width`
/// worth of characters regardless of what lands on either side. Used to
/// verify that `LayoutManager` itself (not just a well-behaved
/// typesetter) refuses to let a break fall inside a CRLF sequence.
#[derive(Debug, Clone, Copy)]
struct CrlfAgnosticTypesetter {
    char_width: f64,
}

impl Typesetter for CrlfAgnosticTypesetter {
    fn typeset(&mut self, substring: &str, start_offset: usize, constraining_width: f64) -> TypesetResult {
        let chars: Vec<char> = substring[start_offset..].chars().collect();
        if chars.is_empty() {
            return TypesetResult {
                break_offset: start_offset,
                ascent: 12.0,
                descent: 4.0,
                width: 0.0,
                glyph_run: Box::new(FixedGlyphRun),
            };
        }
        let max_chars = ((constraining_width / self.char_width).floor() as usize).max(1);
        let count = max_chars.min(chars.len());
        TypesetResult {
            break_offset: start_offset + count,
            ascent: 12.0,
            descent: 4.0,
            width: count as f64 * self.char_width,
            glyph_run: Box::new(FixedGlyphRun),
        }
    }
}

fn seeded(text: &str) -> (StubTextStore, LayoutManager) {
    let mut store = StubTextStore::new("");
    let mut manager = LayoutManager::new(
        Box::new(FixedWidthTypesetter::default()),
        EngineConfig::default(),
    );
    let edit = store.replace_and_describe(0..0, text);
    manager.handle_edit(&store, edit).unwrap();
    (store, manager)
}

#[test]
fn base_document_has_four_lines() {
    let (_store, manager) = seeded("A\nB\nC\nD");
    assert_eq!(manager.line_count(), 4);
    assert_eq!(manager.line_storage().total_length(), 7);
}

#[test]
fn insert_before_terminal_line_splits_it() {
    let (mut store, mut manager) = seeded("A\nB\nC\nD");
    let edit = store.replace_and_describe(6..6, "\nE");
    manager.handle_edit(&store, edit).unwrap();
    assert_eq!(manager.line_count(), 5);
    assert_eq!(manager.line_storage().total_length(), 9);
}

#[test]
fn delete_across_a_newline_merges_lines() {
    let (mut store, mut manager) = seeded("A\nB\nC\nD");
    let edit = store.replace_and_describe(5..7, "");
    manager.handle_edit(&store, edit).unwrap();
    assert_eq!(manager.line_count(), 3);
    assert_eq!(manager.line_storage().total_length(), 5);
}

#[test]
fn replacing_with_crlf_and_a_trailing_cr_adds_a_terminal_line() {
    let (mut store, mut manager) = seeded("A\nB\nC\nD");
    let edit = store.replace_and_describe(0..7, "A\r\nB\nC\r");
    manager.handle_edit(&store, edit).unwrap();
    // "A\r\n", "B\n", "C\r" are three real lines; since the document now
    // ends exactly on a newline sequence, a fourth zero-length terminal
    // line follows it (spec.md s:3's "+1" addressed without inflating
    // `sum(line.length)` past the document length).
    assert_eq!(manager.line_count(), 4);
    assert_eq!(manager.line_storage().total_length(), 7);
}

#[test]
fn crlf_mid_document_does_not_spawn_an_extra_line() {
    let (mut store, mut manager) = seeded("A\nB\nC\nD");
    let edit = store.replace_and_describe(0..0, "0\n1\r\n2\r");
    manager.handle_edit(&store, edit).unwrap();
    // The inserted CR here is immediately followed by more document
    // content ("A\n..."), so it is an ordinary mid-document break, not
    // the document's actual end.
    assert_eq!(manager.line_count(), 7);
    assert_eq!(manager.line_storage().total_length(), 14);
}

#[test]
fn render_delegate_overrides_line_height() {
    let (store, mut manager) = seeded("A\nB\nC\nD");
    let mut delegate = RecordingRenderDelegate::default();
    delegate.forced_fragment_height = Some(2.0);
    manager.set_render_delegate(Box::new(delegate));

    manager.layout_lines(&store, huge_viewport());
    assert_eq!(manager.estimated_height(), 8.0);
}

#[test]
fn render_delegate_keeps_overriding_newly_inserted_lines() {
    let (mut store, mut manager) = seeded("A\nB\nC\nD");
    let mut delegate = RecordingRenderDelegate::default();
    delegate.forced_fragment_height = Some(2.0);
    manager.set_render_delegate(Box::new(delegate));
    manager.layout_lines(&store, huge_viewport());

    let edit = store.replace_and_describe(0..0, "0\n1\r\n2\r");
    manager.handle_edit(&store, edit).unwrap();
    manager.layout_lines(&store, huge_viewport());

    assert_eq!(manager.line_count(), 7);
    assert_eq!(manager.estimated_height(), 14.0);
}

#[test]
fn empty_lines_between_blank_runs_are_not_skipped() {
    let (_store, manager) = seeded("A\n\nB\n\nC");
    assert_eq!(manager.line_count(), 5);
    let storage = manager.line_storage();
    let starts: Vec<usize> = storage
        .lines_in_range(0..storage.total_length())
        .map(|(_, start, _)| start)
        .collect();
    let lengths: Vec<usize> = storage
        .lines_in_range(0..storage.total_length())
        .map(|(_, _, line)| line.length())
        .collect();
    assert_eq!(starts, vec![0, 2, 3, 5, 6]);
    assert_eq!(lengths, vec![2, 1, 2, 1, 1]);
}

#[test]
fn invalidate_layout_for_range_only_dirties_overlapping_lines() {
    let (store, mut manager) = seeded("A\nB\nC\nD");
    // `needs_layout` only clears once a pass finds nothing dirty anywhere,
    // not merely nothing dirty in the viewport just typeset -- two passes
    // settle a freshly seeded document.
    manager.layout_lines(&store, huge_viewport());
    manager.layout_lines(&store, huge_viewport());
    assert!(!manager.needs_layout());

    manager.invalidate_layout_for_range(2..4);
    assert!(manager.needs_layout());

    let storage = manager.line_storage();
    let dirty: Vec<bool> = storage
        .lines_in_range(0..storage.total_length())
        .map(|(id, _, _)| storage.get(id).unwrap().needs_layout())
        .collect();
    assert_eq!(dirty, vec![false, true, false, false]);
}

#[test]
fn empty_document_is_one_zero_length_line() {
    let (_store, manager) = seeded("");
    assert_eq!(manager.line_count(), 1);
    assert_eq!(manager.line_storage().total_length(), 0);
}

#[test]
fn lone_newline_document_has_two_lines() {
    let (_store, manager) = seeded("\n");
    assert_eq!(manager.line_count(), 2);
    assert_eq!(manager.line_storage().total_length(), 1);
}

#[test]
fn line_break_policy_never_splits_a_crlf_pair() {
    let mut store = StubTextStore::new("");
    let mut manager = LayoutManager::new(
        Box::new(CrlfAgnosticTypesetter { char_width: 8.0 }),
        EngineConfig::default(),
    );
    let edit = store.replace_and_describe(0..0, "A\r\nB");
    manager.handle_edit(&store, edit).unwrap();

    // 16.0 / 8.0 == 2 characters per fragment, which would land the
    // first break exactly between '\r' and '\n' if nothing protected it.
    let narrow = Rect::new(0.0, 0.0, 16.0, 1_000_000.0);
    manager.layout_lines(&store, narrow);

    let storage = manager.line_storage();
    let (id, _) = storage.line_at_index(0).unwrap();
    let fragments = storage.get(id).unwrap().fragments();
    let starts: Vec<usize> = fragments
        .fragments_in_range(0..fragments.total_length())
        .map(|(_, start, _)| start)
        .collect();
    // No fragment boundary falls at offset 2, the midpoint of "\r\n".
    assert!(!starts.contains(&2));
}

#[test]
fn narrow_viewport_wraps_a_long_line_into_multiple_fragments() {
    let (store, mut manager) = seeded("AAAAAAAAAAAAAAAAAAAA");
    // `FixedWidthTypesetter::default()` advances 8.0 per character, so a
    // 40.0-wide viewport fits 5 characters per fragment -- the 20-
    // character line should come back as four fragments, not one.
    let narrow = Rect::new(0.0, 0.0, 40.0, 1_000_000.0);
    manager.layout_lines(&store, narrow);
    let storage = manager.line_storage();
    let (id, _) = storage.line_at_index(0).unwrap();
    let fragments = storage.get(id).unwrap().fragments();
    assert_eq!(fragments.len(), 4);
}

#[test]
fn layout_lines_is_idempotent_once_clean() {
    let (store, mut manager) = seeded("A\nB\nC\nD");
    let touched = manager.layout_lines(&store, huge_viewport());
    assert_eq!(touched.len(), 4);
    let touched_again = manager.layout_lines(&store, huge_viewport());
    assert!(touched_again.is_empty());
    assert!(!manager.needs_layout());
}
