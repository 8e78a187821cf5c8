// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line fragments (spec.md s:3, s:4.3): the sub-spans a single line is
//! broken into when it is wider than the viewport, each holding an
//! opaque shaped glyph run. Stored in their own per-line order-statistic
//! tree so a line with many fragments supports the same sub-linear
//! range queries as the document's line tree.

use slotmap::new_key_type;

use crate::error::LayoutError;
use crate::storage::{Metrics, OffsetRangeIter, OrderStatTree};
use crate::typesetter::GlyphRun;

new_key_type! {
    /// A stable identity for one fragment, valid until its owning line
    /// is next re-laid-out.
    pub struct FragmentId;
}

/// One typeset fragment: its character span length within the owning
/// line, its box metrics, and the glyph run that draws it.
pub struct LineFragment {
    length: usize,
    width: f64,
    ascent: f64,
    descent: f64,
    glyph_run: Box<dyn GlyphRun>,
}

impl LineFragment {
    pub fn new(
        length: usize,
        width: f64,
        ascent: f64,
        descent: f64,
        glyph_run: Box<dyn GlyphRun>,
    ) -> Self {
        Self {
            length,
            width,
            ascent,
            descent,
            glyph_run,
        }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn ascent(&self) -> f64 {
        self.ascent
    }

    pub fn descent(&self) -> f64 {
        self.descent
    }

    /// Total vertical extent this fragment occupies in its line.
    pub fn scaled_height(&self) -> f64 {
        self.ascent + self.descent
    }

    pub fn glyph_run(&self) -> &dyn GlyphRun {
        self.glyph_run.as_ref()
    }
}

impl Metrics for LineFragment {
    fn length(&self) -> usize {
        self.length
    }

    fn height(&self) -> f64 {
        self.scaled_height()
    }

    fn apply_delta(&mut self, delta_length: i64, delta_height: f64) {
        self.length = (self.length as i64 + delta_length).max(0) as usize;
        self.descent = (self.descent + delta_height).max(0.0);
    }
}

impl core::fmt::Debug for LineFragment {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LineFragment")
            .field("length", &self.length)
            .field("width", &self.width)
            .field("ascent", &self.ascent)
            .field("descent", &self.descent)
            .finish_non_exhaustive()
    }
}

/// A line's ordered sequence of fragments. Empty until the line's first
/// successful `typeset` pass; a dirty line with no fragments yet is a
/// normal, expected state (spec.md s:4.3).
#[derive(Debug, Default)]
pub struct LineFragmentStore {
    tree: OrderStatTree<FragmentId, LineFragment>,
}

impl LineFragmentStore {
    pub fn new() -> Self {
        Self {
            tree: OrderStatTree::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn total_length(&self) -> usize {
        self.tree.total_length()
    }

    pub fn total_height(&self) -> f64 {
        self.tree.total_height()
    }

    pub fn get(&self, id: FragmentId) -> Option<&LineFragment> {
        self.tree.get(id)
    }

    pub fn fragment_containing(&self, offset: usize) -> Option<(FragmentId, usize, &LineFragment)> {
        self.tree.get_by_offset(offset)
    }

    /// As [`Self::fragment_containing`], additionally returning the y
    /// position (relative to the owning line) where the fragment starts.
    pub fn fragment_containing_with_height(
        &self,
        offset: usize,
    ) -> Option<(FragmentId, usize, f64, &LineFragment)> {
        self.tree.get_by_offset_with_height(offset)
    }

    pub fn fragment_at_position(&self, y: f64) -> Option<(FragmentId, f64, &LineFragment)> {
        self.tree.get_by_position(y)
    }

    /// As [`Self::fragment_at_position`], additionally returning the
    /// character offset (relative to the owning line) where the fragment
    /// starts.
    pub fn fragment_at_position_with_offset(
        &self,
        y: f64,
    ) -> Option<(FragmentId, f64, usize, &LineFragment)> {
        self.tree.get_by_position_with_offset(y)
    }

    pub fn fragments_in_range(
        &self,
        range: core::ops::Range<usize>,
    ) -> OffsetRangeIter<'_, FragmentId, LineFragment> {
        OffsetRangeIter::new(&self.tree, range)
    }

    pub fn push(&mut self, fragment: LineFragment) -> Result<FragmentId, LayoutError> {
        let at = self.tree.total_length();
        self.tree.insert_at_offset(fragment, at)
    }

    /// Applies a height delta to the fragment starting at `start_offset`,
    /// used by a [`crate::render_delegate::RenderDelegate`] to override a
    /// height post-typesetting (spec.md s:4.2, s:4.6).
    pub fn update_height(&mut self, start_offset: usize, delta_height: f64) -> Result<(), LayoutError> {
        self.tree.update_at_offset(start_offset, 0, delta_height)
    }
}
