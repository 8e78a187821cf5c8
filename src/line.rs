// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line storage (spec.md s:3): an order-statistic tree of [`TextLine`]
//! elements keyed by a stable [`LineId`], always containing at least one
//! element -- an empty document is one zero-length terminal line, never
//! zero lines.

use slotmap::new_key_type;

use crate::error::LayoutError;
use crate::fragment::LineFragmentStore;
use crate::storage::{HeightRangeIter, Metrics, OffsetRangeIter, OrderStatTree};

new_key_type! {
    /// A stable identity for one line, valid across edits and re-layout
    /// as long as the line itself is not deleted (spec.md s:3).
    pub struct LineId;
}

/// One line's layout state: its character span length, its current
/// height, whether it still needs typesetting, and the fragments already
/// produced for it.
pub struct TextLine {
    length: usize,
    height: f64,
    needs_layout: bool,
    fragments: LineFragmentStore,
}

impl TextLine {
    /// A freshly created line spanning `length` characters, marked dirty.
    /// `height` starts at the caller's estimate (spec.md s:4.2) until the
    /// typesetter has actually run.
    pub fn new(length: usize, estimated_height: f64) -> Self {
        Self {
            length,
            height: estimated_height,
            needs_layout: true,
            fragments: LineFragmentStore::new(),
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn needs_layout(&self) -> bool {
        self.needs_layout
    }

    pub fn mark_dirty(&mut self) {
        self.needs_layout = true;
    }

    pub fn fragments(&self) -> &LineFragmentStore {
        &self.fragments
    }

    pub fn fragments_mut(&mut self) -> &mut LineFragmentStore {
        &mut self.fragments
    }

    /// Replaces this line's laid-out fragments and clears its dirty flag.
    /// `new_height` is the sum of the fragments' heights.
    pub fn commit_layout(&mut self, fragments: LineFragmentStore, new_height: f64) {
        self.fragments = fragments;
        self.height = new_height;
        self.needs_layout = false;
    }
}

impl Metrics for TextLine {
    fn length(&self) -> usize {
        self.length
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn apply_delta(&mut self, delta_length: i64, delta_height: f64) {
        self.length = (self.length as i64 + delta_length).max(0) as usize;
        self.height = (self.height + delta_height).max(0.0);
        self.needs_layout = true;
    }
}

impl core::fmt::Debug for TextLine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TextLine")
            .field("length", &self.length)
            .field("height", &self.height)
            .field("needs_layout", &self.needs_layout)
            .finish_non_exhaustive()
    }
}

/// The document's ordered sequence of lines (spec.md s:3). Maintains one
/// invariant beyond the underlying tree's: there is always at least one
/// line, so `text_offset_at_point` and `line_containing` never need to
/// special-case an empty document.
#[derive(Debug)]
pub struct LineStorage {
    tree: OrderStatTree<LineId, TextLine>,
}

impl Default for LineStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl LineStorage {
    /// A storage holding a single empty terminal line, matching a
    /// freshly opened empty document.
    pub fn new() -> Self {
        let mut tree = OrderStatTree::new();
        tree.insert_at_offset(TextLine::new(0, 0.0), 0)
            .expect("inserting into an empty tree cannot fail");
        Self { tree }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn total_length(&self) -> usize {
        self.tree.total_length()
    }

    pub fn total_height(&self) -> f64 {
        self.tree.total_height()
    }

    pub fn get(&self, id: LineId) -> Option<&TextLine> {
        self.tree.get(id)
    }

    pub fn get_mut(&mut self, id: LineId) -> Option<&mut TextLine> {
        self.tree.get_mut(id)
    }

    /// The line containing `offset`, with the document's final line
    /// absorbing `offset == total_length()` (spec.md s:3, terminal line).
    pub fn line_containing(&self, offset: usize) -> (LineId, usize, &TextLine) {
        self.tree
            .get_by_offset(offset)
            .expect("at least one line always exists")
    }

    pub fn line_at_index(&self, index: usize) -> Option<(LineId, usize)> {
        self.tree.get_by_index(index)
    }

    /// As [`Self::line_containing`], additionally returning the y
    /// position where the line starts, computed in the same descent.
    pub fn line_containing_with_height(&self, offset: usize) -> (LineId, usize, f64, &TextLine) {
        self.tree
            .get_by_offset_with_height(offset)
            .expect("at least one line always exists")
    }

    /// The line whose vertical span contains `y` (spec.md s:4.2).
    pub fn line_at_position(&self, y: f64) -> (LineId, f64, &TextLine) {
        self.tree
            .get_by_position(y)
            .expect("at least one line always exists")
    }

    /// As [`Self::line_at_position`], additionally returning the
    /// character offset where the line starts.
    pub fn line_at_position_with_offset(&self, y: f64) -> (LineId, f64, usize, &TextLine) {
        self.tree
            .get_by_position_with_offset(y)
            .expect("at least one line always exists")
    }

    pub fn lines_in_range(
        &self,
        range: core::ops::Range<usize>,
    ) -> OffsetRangeIter<'_, LineId, TextLine> {
        OffsetRangeIter::new(&self.tree, range)
    }

    pub fn lines_in_height_range(
        &self,
        min_y: f64,
        max_y: f64,
    ) -> HeightRangeIter<'_, LineId, TextLine> {
        HeightRangeIter::new(&self.tree, min_y, max_y)
    }

    /// Inserts a new line at `offset`, which must land on an existing
    /// line boundary. Callers wanting to split a line midway first shrink
    /// the existing line with [`Self::shrink_at`], then insert here at
    /// the resulting boundary (spec.md s:4.1).
    pub fn insert_line_at(
        &mut self,
        offset: usize,
        length: usize,
        estimated_height: f64,
    ) -> Result<LineId, LayoutError> {
        self.tree
            .insert_at_offset(TextLine::new(length, estimated_height), offset)
    }

    /// Shrinks the line covering `offset` by `delta_length` characters
    /// and `delta_height` of height; `delta_length` is typically negative
    /// when carving room for a line split.
    pub fn shrink_at(
        &mut self,
        offset: usize,
        delta_length: i64,
        delta_height: f64,
    ) -> Result<(), LayoutError> {
        self.tree.update_at_offset(offset, delta_length, delta_height)
    }

    /// Drops the lone zero-length line representing an entirely empty
    /// document, leaving the tree with zero lines. Only valid when
    /// `total_length() == 0`; callers must insert something (even another
    /// zero-length line) immediately afterward, since `LineStorage`
    /// otherwise guarantees at least one line always exists.
    pub(crate) fn clear_placeholder(&mut self) {
        debug_assert_eq!(self.total_length(), 0);
        self.tree = OrderStatTree::new();
    }

    /// Removes every line fully covered by `range`. A no-op if doing so
    /// would remove every line in the document -- the terminal line
    /// survives a delete-everything edit as a single empty line rather
    /// than vanishing (spec.md s:4.1 edge cases).
    pub fn delete_lines_in(
        &mut self,
        range: core::ops::Range<usize>,
    ) -> Result<Vec<TextLine>, LayoutError> {
        if range.start == 0 && range.end >= self.total_length() && self.len() > 0 {
            let removed = self.tree.delete_covered(range)?;
            if self.tree.is_empty() {
                self.tree
                    .insert_at_offset(TextLine::new(0, 0.0), 0)
                    .expect("inserting into an empty tree cannot fail");
            }
            return Ok(removed);
        }
        self.tree.delete_covered(range)
    }
}
