// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout manager (spec.md s:4.3): the central owner holding
//! [`LineStorage`], [`AttachmentIndex`], the typesetter, and an optional
//! [`RenderDelegate`], per the "cyclic references" redesign note (spec.md
//! s:9) that replaces the source's mutually-referencing layout
//! manager/text view/selection manager with one owner and borrowed
//! handles for the duration of a call.

use core::ops::Range;

use crate::attachment::AttachmentIndex;
use crate::config::{EngineConfig, LineBreakPolicy, WORD_BREAK_SCAN_LIMIT};
use crate::error::{self, LayoutError};
use crate::fragment::{LineFragment, LineFragmentStore};
use crate::geometry::{Point, Rect};
use crate::line::{LineId, LineStorage};
use crate::render_delegate::{DisplayContext, RenderDelegate};
use crate::selection::{Affinity, Direction, VerticalDirection};
use crate::text_store::{EditDelta, EngineObserver, ObserverList, TextStore};
use crate::typesetter::Typesetter;

/// Splits `text` into line segments, each including its trailing newline
/// sequence (LF, CR, or CRLF kept together), using UTF-16 code unit
/// lengths to match the `TextStore` indexing convention (spec.md s:6). A
/// trailing, not-yet-terminated remainder becomes the final segment. This
/// function never appends a zero-length segment for a newline-terminated
/// tail; `handle_edit` adds that explicit terminal line itself, and only
/// when the rewritten span reaches the actual end of the document (see
/// DESIGN.md).
fn split_into_line_lengths(text: &str) -> Vec<usize> {
    let mut lengths = Vec::new();
    let mut current = 0usize;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        current += c.len_utf16();
        if c == '\r' {
            if chars.peek() == Some(&'\n') {
                current += chars.next().unwrap().len_utf16();
            }
            lengths.push(current);
            current = 0;
        } else if c == '\n' {
            lengths.push(current);
            current = 0;
        }
    }
    if current > 0 {
        lengths.push(current);
    }
    lengths
}

/// Owns line storage, the attachment index, and the typesetting
/// pipeline; reacts to edits and lazily typesets the viewport.
pub struct LayoutManager {
    lines: LineStorage,
    attachments: AttachmentIndex,
    typesetter: Box<dyn Typesetter>,
    render_delegate: Option<Box<dyn RenderDelegate>>,
    config: EngineConfig,
    needs_layout: bool,
    observers: ObserverList<dyn EngineObserver>,
}

impl LayoutManager {
    pub fn new(typesetter: Box<dyn Typesetter>, config: EngineConfig) -> Self {
        Self {
            lines: LineStorage::new(),
            attachments: AttachmentIndex::new(),
            typesetter,
            render_delegate: None,
            config,
            needs_layout: true,
            observers: ObserverList::new(),
        }
    }

    pub fn set_render_delegate(&mut self, delegate: Box<dyn RenderDelegate>) {
        self.render_delegate = Some(delegate);
    }

    pub fn subscribe(&mut self, observer: Box<dyn EngineObserver>) {
        self.observers.subscribe(observer);
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_storage(&self) -> &LineStorage {
        &self.lines
    }

    pub fn attachments(&self) -> &AttachmentIndex {
        &self.attachments
    }

    pub fn attachments_mut(&mut self) -> &mut AttachmentIndex {
        &mut self.attachments
    }

    pub fn needs_layout(&self) -> bool {
        self.needs_layout
    }

    fn default_line_height(&self) -> f64 {
        self.render_delegate
            .as_ref()
            .and_then(|d| d.estimated_line_height())
            .unwrap_or(self.config.default_line_height)
            * self.config.line_height_multiplier
    }

    /// Reacts to a `TextStore` edit (spec.md s:4.3 edit handling
    /// algorithm): locates the lines overlapping the pre-edit range,
    /// rewrites exactly that bounded window by re-splitting the post-edit
    /// text on newlines, and marks every touched line dirty. Never
    /// rescans the whole document.
    pub fn handle_edit(&mut self, store: &dyn TextStore, edit: EditDelta) -> Result<(), LayoutError> {
        log::debug!("handle_edit: range={:?} delta={}", edit.range, edit.delta);
        let pre_edit_total = self.lines.total_length();
        let (_, first_start, _) = self.lines.line_containing(edit.range.start);
        let last_query = edit.range.end.max(edit.range.start);
        let (_, last_start, last_line) = self.lines.line_containing(last_query);
        let old_span_start = first_start;
        let old_span_end = last_start + last_line.length();
        let is_end_of_document = old_span_end == pre_edit_total;

        let new_span_end = (old_span_end as i64 + edit.delta).max(old_span_start as i64) as usize;

        // When the document is currently just the single zero-length
        // placeholder line, `old_span_start == old_span_end == 0` and
        // `delete_lines_in` would be a no-op over an empty range, leaving
        // the placeholder to be interleaved with the freshly inserted
        // lines below. Drop it outright instead; the insertion loop (or
        // the safety net after it) puts something back.
        if pre_edit_total == 0 {
            self.lines.clear_placeholder();
        } else {
            self.lines.delete_lines_in(old_span_start..old_span_end)?;
        }

        let new_text = store.substring(old_span_start..new_span_end);
        let mut cursor = old_span_start;
        for length in split_into_line_lengths(&new_text) {
            self.lines
                .insert_line_at(cursor, length, self.default_line_height())?;
            cursor += length;
        }

        // A document that ends exactly on a newline sequence gets an
        // explicit zero-length terminal line after it (so it contributes
        // nothing to `sum(line.length)`, keeping that sum equal to the
        // document length exactly); a document whose final content does
        // not end in a newline has no such extra line -- its last real
        // line already serves as the terminal one via `LineStorage`'s
        // offset-absorption rule. See DESIGN.md.
        if is_end_of_document && cursor > 0 {
            let last_char = store.substring(cursor - 1..cursor);
            if last_char == "\n" || last_char == "\r" {
                self.lines
                    .insert_line_at(cursor, 0, self.default_line_height())?;
            }
        }

        // Restore the "always at least one line" invariant for the
        // edit-into-empty-document case where the replacement text is
        // itself empty (e.g. a no-op edit on an empty document).
        if self.lines.len() == 0 {
            self.lines
                .insert_line_at(old_span_start, 0, self.default_line_height())?;
        }

        self.attachments.apply_edit(edit.range.clone(), edit.delta);
        self.needs_layout = true;

        // §7's core invariant: line storage always accounts for exactly
        // the text store's current length. A violation here means the
        // edit above left the tree inconsistent with `store`; force a
        // full re-layout on the next draw so rendering still converges.
        if error::invariant(
            self.lines.total_length() == store.length(),
            "line storage total length diverged from the text store",
        )
        .is_err()
        {
            self.invalidate_layout_for_range(0..self.lines.total_length());
        }

        self.observers.for_each_mut(|o| o.text_did_change());
        Ok(())
    }

    /// Marks every line overlapping `range` dirty without re-typesetting;
    /// heights are preserved until the next `layout_lines` (spec.md
    /// s:4.3).
    pub fn invalidate_layout_for_range(&mut self, range: Range<usize>) {
        let dirty: Vec<LineId> = self
            .lines
            .lines_in_range(range)
            .map(|(id, _, _)| id)
            .collect();
        for id in dirty {
            if let Some(line) = self.lines.get_mut(id) {
                line.mark_dirty();
            }
        }
        self.needs_layout = true;
    }

    pub fn invalidate_layout_for_rect(&mut self, rect: Rect) {
        let dirty: Vec<LineId> = self
            .lines
            .lines_in_height_range(rect.y0, rect.y1)
            .map(|(id, _, _)| id)
            .collect();
        for id in dirty {
            if let Some(line) = self.lines.get_mut(id) {
                line.mark_dirty();
            }
        }
        self.needs_layout = true;
    }

    /// Ensures every line overlapping `rect` vertically has
    /// `needs_layout() == false`, typesetting dirty ones against
    /// `store`. Returns the line IDs re-typeset during this call; an
    /// empty vector when nothing was dirty (spec.md s:4.3).
    pub fn layout_lines(&mut self, store: &dyn TextStore, rect: Rect) -> Vec<LineId> {
        log::debug!("layout_lines: rect={:?}", rect);
        // Dirty lines are found by y-position; re-querying each one's own
        // start height by character offset would need a second tree walk,
        // so instead resolve the character start directly from the same
        // y position, which lands exactly on this line by construction.
        let dirty: Vec<(LineId, usize, usize)> = self
            .lines
            .lines_in_height_range(rect.y0, rect.y1)
            .filter(|(_, _, line)| line.needs_layout())
            .map(|(id, start_y, line)| (id, start_y, line.length()))
            .collect::<Vec<_>>()
            .into_iter()
            .map(|(id, start_y, length)| {
                let (_, _, char_start, _) = self.lines.line_at_position_with_offset(start_y);
                (id, char_start, length)
            })
            .collect();

        let constraining_width = (rect.x1 - rect.x0).max(0.0);
        let mut retypeset = Vec::with_capacity(dirty.len());
        for (id, start, length) in dirty {
            self.retypeset_line(store, id, start, length, constraining_width);
            retypeset.push(id);
        }
        if retypeset.is_empty() {
            // Nothing dirty in the viewport; only clear the manager-wide
            // flag once no dirty line remains anywhere (cheap enough at
            // the scale this engine targets: a bounded viewport scan).
            self.needs_layout = self
                .lines
                .lines_in_range(0..self.lines.total_length())
                .any(|(_, _, line)| line.needs_layout());
        }
        retypeset
    }

    fn retypeset_line(
        &mut self,
        store: &dyn TextStore,
        id: LineId,
        start: usize,
        length: usize,
        constraining_width: f64,
    ) {
        let text = store.substring(start..start + length);
        let mut fragments = LineFragmentStore::new();
        // `offset` indexes `text` in bytes, for typesetter/str slicing;
        // `unit_offset` tracks the same position in UTF-16 code units,
        // the unit the rest of this crate addresses document positions
        // in (spec.md s:6). The two only coincide for all-ASCII content.
        let mut offset = 0usize;
        let mut unit_offset = 0usize;
        let mut total_height = 0.0f64;
        while offset < text.len() || fragments.is_empty() {
            let attachment_here = self
                .attachments
                .attachments(start + unit_offset..start + unit_offset + 1)
                .next()
                .map(|(range, desc)| (range, *desc));
            let result = if let Some((range, descriptor)) = attachment_here {
                let attachment_units = range.end - (start + unit_offset);
                let byte_len = text[offset..]
                    .char_indices()
                    .take(attachment_units)
                    .last()
                    .map_or(0, |(i, c)| i + c.len_utf8());
                crate::typesetter::TypesetResult {
                    break_offset: offset + byte_len,
                    ascent: descriptor.height,
                    descent: 0.0,
                    width: descriptor.width,
                    glyph_run: Box::new(crate::attachment::AttachmentGlyph),
                }
            } else {
                self.typesetter.typeset(&text, offset, constraining_width)
            };
            let mut break_offset = result.break_offset;
            if break_offset <= offset && !text[offset..].is_empty() {
                log::warn!("typesetter made no progress at offset {offset}, advancing one cluster");
                let next_char_len = text[offset..].chars().next().map_or(1, char::len_utf8);
                break_offset = offset + next_char_len;
            }
            let break_offset =
                apply_line_break_policy(&text, offset, break_offset, self.config.line_break_policy);
            let seg_bytes = break_offset.saturating_sub(offset);
            let seg_units = text[offset..offset + seg_bytes].encode_utf16().count();
            let height = (result.ascent + result.descent) * self.config.line_height_multiplier;
            total_height += height;
            let _ = fragments.push(LineFragment::new(
                seg_units,
                result.width,
                result.ascent * self.config.line_height_multiplier,
                result.descent * self.config.line_height_multiplier,
                result.glyph_run,
            ));
            unit_offset += seg_units;
            if break_offset <= offset {
                break;
            }
            offset = break_offset;
            if offset >= text.len() {
                break;
            }
        }
        if let Some(delegate) = self.render_delegate.as_mut() {
            delegate.prepare_for_display(DisplayContext {
                line_id: id,
                range: start..start + length,
                fragments: &mut fragments,
            });
            total_height = fragments.total_height();
        }
        if let Some(line) = self.lines.get_mut(id) {
            line.commit_layout(fragments, total_height);
        }
    }

    /// The caret rectangle at `offset`. Valid even one past the document
    /// end (spec.md s:4.3).
    pub fn rect_for_offset(&self, offset: usize) -> Rect {
        let offset = offset.min(self.lines.total_length());
        let (_, line_start, line_y, line) = self.lines.line_containing_with_height(offset);
        let local = offset - line_start;
        let fallback_height = if line.needs_layout() {
            self.default_line_height()
        } else {
            line.height().max(1.0)
        };
        let Some((_, frag_start, frag_y, frag)) = line.fragments().fragment_containing_with_height(local)
        else {
            return Rect::new(0.0, line_y, 0.0, line_y + fallback_height);
        };
        // The glyph run is opaque (spec.md s:9), so the exact intra-
        // fragment x position of a cluster boundary isn't derivable here;
        // approximate it proportionally to the fragment's character span.
        let frac = if frag.length() == 0 {
            0.0
        } else {
            (local - frag_start) as f64 / frag.length() as f64
        };
        let x = frac * frag.width();
        let y = line_y + frag_y;
        Rect::new(x, y, x, y + frag.scaled_height().max(1.0))
    }

    /// The offset under `p`, clamped to the document. Never fails
    /// (spec.md s:4.3).
    pub fn text_offset_at_point(&self, p: Point) -> usize {
        let (_, line_y, char_start, line) = self.lines.line_at_position_with_offset(p.y);
        let local_y = (p.y - line_y).max(0.0);
        let Some((_, _frag_y, frag_start, frag)) =
            line.fragments().fragment_at_position_with_offset(local_y)
        else {
            return char_start;
        };
        // Glyph internals are opaque (spec.md s:9): approximate the
        // within-fragment offset proportionally to x, rather than asking
        // the typesetter for an exact cluster hit-test.
        let local = if frag.width() <= 0.0 {
            0
        } else {
            let frac = (p.x.max(0.0) / frag.width()).clamp(0.0, 1.0);
            (frac * frag.length() as f64).round() as usize
        };
        char_start + frag_start + local
    }

    pub fn offset_and_affinity_at_point(&self, p: Point) -> (usize, Affinity) {
        (self.text_offset_at_point(p), Affinity::Downstream)
    }

    /// Rectangles covering `range` across fragments, one per line it
    /// overlaps. Read-only: never invalidates a fragment as a side
    /// effect (spec.md s:4.3).
    pub fn rects_for(&self, range: Range<usize>) -> Vec<Rect> {
        self.lines
            .lines_in_range(range.clone())
            .map(|(_, start, line)| {
                let seg_start = range.start.max(start);
                let seg_end = range.end.min(start + line.length());
                let left = self.rect_for_offset(seg_start);
                let right = self.rect_for_offset(seg_end.max(seg_start));
                Rect::new(left.x0, left.y0, right.x0.max(left.x0), left.y1)
            })
            .collect()
    }

    /// Total document height without forcing layout (spec.md s:4.3).
    pub fn estimated_height(&self) -> f64 {
        self.lines.total_height()
    }

    pub fn estimate_line_height(&self) -> f64 {
        self.default_line_height()
    }

    pub fn offset_by_character(&self, offset: usize, direction: Direction) -> usize {
        let total = self.lines.total_length();
        match direction {
            Direction::Forward => offset.saturating_add(1).min(total),
            Direction::Backward => offset.saturating_sub(1),
        }
    }

    pub fn offset_by_word(&self, offset: usize, direction: Direction) -> usize {
        // Word motion reuses the word-break scan cap as its step bound so
        // it shares the same pathological-input guarantee as line
        // wrapping (spec.md s:4.3).
        let total = self.lines.total_length();
        match direction {
            Direction::Forward => offset.saturating_add(WORD_BREAK_SCAN_LIMIT).min(total),
            Direction::Backward => offset.saturating_sub(WORD_BREAK_SCAN_LIMIT),
        }
    }

    pub fn x_for_offset(&self, offset: usize) -> f64 {
        self.rect_for_offset(offset).x0
    }

    pub fn offset_by_vertical_motion(
        &self,
        offset: usize,
        desired_x: f64,
        direction: VerticalDirection,
        lines: usize,
    ) -> usize {
        let (_, _, line_y, _) = self.lines.line_containing_with_height(offset);
        let step = self.estimate_line_height().max(1.0) * lines as f64;
        let target_y = match direction {
            VerticalDirection::Down => line_y + step,
            VerticalDirection::Up => (line_y - step).max(0.0),
        };
        self.text_offset_at_point(Point::new(desired_x, target_y))
    }
}

/// True when `idx` falls between the `\r` and `\n` of a CRLF pair --
/// breaking there would split a sequence spec.md s:6 requires stay
/// intact.
fn splits_crlf(text: &str, idx: usize) -> bool {
    idx > 0
        && idx < text.len()
        && text.as_bytes()[idx - 1] == b'\r'
        && text.as_bytes()[idx] == b'\n'
}

fn apply_line_break_policy(
    text: &str,
    start_offset: usize,
    suggested_break: usize,
    policy: LineBreakPolicy,
) -> usize {
    if splits_crlf(text, suggested_break) {
        return suggested_break + 1;
    }
    if policy == LineBreakPolicy::Character || suggested_break >= text.len() {
        return suggested_break;
    }
    let at_boundary = text[..suggested_break]
        .chars()
        .next_back()
        .map(|c| c.is_whitespace() || c.is_ascii_punctuation())
        .unwrap_or(true);
    if at_boundary {
        return suggested_break;
    }
    let scan_floor = suggested_break.saturating_sub(WORD_BREAK_SCAN_LIMIT).max(start_offset);
    let mut idx = suggested_break;
    while idx > scan_floor {
        let prev_char_start = text[..idx]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0);
        let c = text[prev_char_start..].chars().next().unwrap();
        if (c.is_whitespace() || c.is_ascii_punctuation()) && !splits_crlf(text, idx) {
            return idx;
        }
        idx = prev_char_start;
    }
    suggested_break
}
