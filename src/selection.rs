// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The selection and cursor model (spec.md s:4.4), generalizing parley's
//! `editing::Cursor`/`Selection` (leading/trailing affinity at a
//! soft-wrap boundary) from a single cursor to a sorted, non-overlapping
//! set of selections with merge-on-overlap insertion.

use core::ops::Range;

use crate::geometry::{Point, Rect};
use crate::layout_manager::LayoutManager;

/// A caret's preference when two adjacent fragments both claim the same
/// offset as a boundary: the end of the fragment before it, or the start
/// of the fragment after (spec.md Glossary, mirrors
/// `parley::layout::Affinity`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Affinity {
    /// The caret belongs to the end of the preceding fragment.
    Upstream,
    /// The caret belongs to the start of the following fragment.
    #[default]
    Downstream,
}

/// A single text selection: a range, its caret affinity at the active
/// edge, and the horizontal column vertical motion tries to preserve.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub range: Range<usize>,
    pub affinity: Affinity,
    /// Set on horizontal motion or a fresh hit-test; cleared only by the
    /// next horizontal motion, not by vertical motion itself (spec.md
    /// s:4.4).
    pub desired_x: Option<f64>,
}

impl Selection {
    pub fn caret(offset: usize, affinity: Affinity) -> Self {
        Self {
            range: offset..offset,
            affinity,
            desired_x: None,
        }
    }

    pub fn is_caret(&self) -> bool {
        self.range.is_empty()
    }

    fn overlaps_or_touches(&self, other: &Range<usize>) -> bool {
        self.range.start <= other.end && other.start <= self.range.end
    }

    fn merge_with(&self, other: &Range<usize>) -> Range<usize> {
        self.range.start.min(other.start)..self.range.end.max(other.end)
    }
}

/// Up/down/page motion direction, independent of affinity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalDirection {
    Up,
    Down,
}

/// A granularity to extend a selection by (spec.md s:4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Character,
    Word,
    Line,
    Page,
}

/// A direction along the logical axis (used for word/character extension).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Maintains a sorted, non-overlapping sequence of [`Selection`]s over a
/// [`LayoutManager`]'s geometry (spec.md s:4.4). Selections that come to
/// overlap, by insertion or by extension, are merged rather than kept as
/// separate entries.
#[derive(Debug, Default)]
pub struct SelectionManager {
    selections: Vec<Selection>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self {
            selections: vec![Selection::caret(0, Affinity::Downstream)],
        }
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// Replaces the whole selection set with a single selection.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selections.clear();
        self.selections.push(selection);
    }

    /// Inserts `selection` into the set, merging it with any selection it
    /// overlaps (spec.md s:4.4).
    pub fn add_selection(&mut self, mut selection: Selection) {
        let mut merged_range = selection.range.clone();
        self.selections.retain(|existing| {
            if existing.overlaps_or_touches(&merged_range) {
                merged_range = existing.merge_with(&merged_range);
                false
            } else {
                true
            }
        });
        selection.range = merged_range;
        let insert_at = self
            .selections
            .partition_point(|s| s.range.start < selection.range.start);
        self.selections.insert(insert_at, selection);
    }

    /// Places a single caret at the offset/affinity the given point hit-
    /// tests to, replacing the current selection set.
    pub fn hit_test(&mut self, manager: &LayoutManager, point: Point) {
        let (offset, affinity) = manager.offset_and_affinity_at_point(point);
        let mut caret = Selection::caret(offset, affinity);
        caret.desired_x = Some(point.x);
        self.set_selection(caret);
    }

    /// Extends the last selection by one `granularity` step in
    /// `direction`. Resets `desired_x` on horizontal (character/word)
    /// motion; vertical motion (line/page) preserves it across lines of
    /// varying width until the caller moves horizontally (spec.md s:4.4).
    pub fn extend(
        &mut self,
        manager: &LayoutManager,
        granularity: Granularity,
        direction: Direction,
    ) {
        let Some(active) = self.selections.last().cloned() else {
            return;
        };
        let anchor = active.range.start;
        let focus = active.range.end;
        let (new_focus, new_affinity, desired_x) = match granularity {
            Granularity::Character => {
                let next = manager.offset_by_character(focus, direction);
                (next, Affinity::Downstream, None)
            }
            Granularity::Word => {
                let next = manager.offset_by_word(focus, direction);
                (next, Affinity::Downstream, None)
            }
            Granularity::Line | Granularity::Page => {
                let x = active.desired_x.unwrap_or_else(|| manager.x_for_offset(focus));
                let vdir = match direction {
                    Direction::Forward => VerticalDirection::Down,
                    Direction::Backward => VerticalDirection::Up,
                };
                let lines = if granularity == Granularity::Page { 20 } else { 1 };
                let next = manager.offset_by_vertical_motion(focus, x, vdir, lines);
                (next, Affinity::Downstream, Some(x))
            }
        };
        let range = if new_focus <= anchor {
            new_focus..anchor
        } else {
            anchor..new_focus
        };
        self.set_selection(Selection {
            range,
            affinity: new_affinity,
            desired_x,
        });
    }

    /// Caret or selection highlight rectangles for every selection,
    /// derived from `manager`'s geometry.
    pub fn rects(&self, manager: &LayoutManager) -> Vec<Rect> {
        self.selections
            .iter()
            .flat_map(|s| manager.rects_for(s.range.clone()))
            .collect()
    }
}
