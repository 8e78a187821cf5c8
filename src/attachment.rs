// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The attachment index (spec.md s:4.5): inline, non-text content (an
//! image, a widget placeholder) addressed by the character range it
//! occupies. Backed by a `BTreeMap` keyed by start offset since
//! attachments are sparse relative to document length and overlap
//! queries only ever need the handful of entries near a given range.

use core::ops::Range;
use std::collections::BTreeMap;

use crate::error::LayoutError;
use crate::geometry::Point;
use crate::typesetter::{GlyphRun, GraphicsContext};

/// A zero-content stand-in glyph run for an attachment's fragment-
/// internal placeholder (spec.md s:4.3: "replacing their range with a
/// single fragment-internal placeholder"). Real drawing for an
/// attachment is the host's responsibility; this crate only reserves
/// its box.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentGlyph;

impl GlyphRun for AttachmentGlyph {
    fn draw(&self, _ctx: &mut dyn GraphicsContext, _origin: Point) {}
}

/// An opaque inline attachment: its footprint and whether it substitutes
/// for real characters in the host's string (a placeholder glyph) or
/// sits alongside them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttachmentDescriptor {
    pub width: f64,
    pub height: f64,
    pub is_character_substitute: bool,
}

/// Maps non-overlapping character ranges to [`AttachmentDescriptor`]s.
#[derive(Debug, Default)]
pub struct AttachmentIndex {
    by_start: BTreeMap<usize, (usize, AttachmentDescriptor)>,
}

impl AttachmentIndex {
    pub fn new() -> Self {
        Self {
            by_start: BTreeMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_start.is_empty()
    }

    fn overlaps(&self, range: &Range<usize>) -> bool {
        self.neighbors_overlapping(range).next().is_some()
    }

    fn neighbors_overlapping(
        &self,
        range: &Range<usize>,
    ) -> impl Iterator<Item = (Range<usize>, &AttachmentDescriptor)> {
        // An attachment starting before `range.start` can still overlap
        // it, so scan from the nearest start at or before `range.start`.
        let lower_bound = self
            .by_start
            .range(..=range.start)
            .next_back()
            .map(|(&s, _)| s)
            .unwrap_or(0);
        self.by_start
            .range(lower_bound..)
            .filter_map(move |(&start, (end, desc))| {
                let span = start..*end;
                if span.start < range.end && range.start < span.end {
                    Some((span, desc))
                } else {
                    None
                }
            })
    }

    /// Inserts a new attachment at `range`. Fails with
    /// [`LayoutError::OverlapsExisting`] if any existing attachment
    /// overlaps it (spec.md s:4.5).
    pub fn insert(
        &mut self,
        range: Range<usize>,
        descriptor: AttachmentDescriptor,
    ) -> Result<(), LayoutError> {
        if range.start >= range.end {
            return Err(LayoutError::IndexOutOfRange(range));
        }
        if self.overlaps(&range) {
            return Err(LayoutError::OverlapsExisting);
        }
        self.by_start.insert(range.start, (range.end, descriptor));
        Ok(())
    }

    /// Removes the attachment starting exactly at `range.start`, if any.
    pub fn remove(&mut self, range: Range<usize>) -> Option<AttachmentDescriptor> {
        self.by_start.remove(&range.start).map(|(_, desc)| desc)
    }

    /// Attachments whose range overlaps `range`, in document order.
    pub fn attachments(
        &self,
        range: Range<usize>,
    ) -> impl Iterator<Item = (Range<usize>, &AttachmentDescriptor)> {
        self.neighbors_overlapping(&range)
    }

    /// Applies an edit's effect on stored attachments (spec.md s:4.5): an
    /// edit fully inside an attachment destroys it; an edit overlapping
    /// its boundary deletes it; an edit entirely before an attachment
    /// shifts its location by `delta`.
    pub fn apply_edit(&mut self, edited_range: Range<usize>, delta: i64) {
        let mut destroyed = Vec::new();
        let mut shifted = Vec::new();
        for (&start, &(end, desc)) in self.by_start.iter() {
            let span = start..end;
            let fully_inside_edit = edited_range.start <= span.start && span.end <= edited_range.end;
            let overlaps_boundary =
                !fully_inside_edit && span.start < edited_range.end && edited_range.start < span.end;
            if fully_inside_edit || overlaps_boundary {
                destroyed.push(start);
            } else if span.start >= edited_range.end {
                let new_start = (span.start as i64 + delta).max(0) as usize;
                let new_end = (span.end as i64 + delta).max(0) as usize;
                shifted.push((start, new_start, new_end, desc));
            }
        }
        for start in destroyed {
            self.by_start.remove(&start);
        }
        for (old_start, new_start, new_end, desc) in shifted {
            self.by_start.remove(&old_start);
            self.by_start.insert(new_start, (new_end, desc));
        }
    }
}
