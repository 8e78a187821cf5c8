// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The typesetter capability (spec.md s:4, s:6) and the opaque glyph run
//! it produces. This crate never inspects glyph internals (spec.md s:9)
//! -- a glyph run is a capability object with one operation, "draw
//! yourself here."

use crate::geometry::Point;

/// A platform-drawable run of shaped glyphs, owned exclusively by the
/// [`crate::fragment::LineFragment`] that holds it.
pub trait GlyphRun {
    /// Draws this run into `ctx` with its baseline origin at `origin`.
    fn draw(&self, ctx: &mut dyn GraphicsContext, origin: Point);
}

/// The narrow surface a glyph run needs to paint itself. Real
/// implementations wrap a platform graphics context; the engine never
/// constructs or inspects one.
pub trait GraphicsContext {}

/// One typesetting step's result: where the next fragment should start,
/// and the metrics of the fragment just produced.
pub struct TypesetResult {
    /// Offset, relative to the input substring, of the next fragment's
    /// start. `break_offset > start_offset` unless the input was empty
    /// (spec.md s:6).
    pub break_offset: usize,
    pub ascent: f64,
    pub descent: f64,
    pub width: f64,
    pub glyph_run: Box<dyn GlyphRun>,
}

impl core::fmt::Debug for TypesetResult {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypesetResult")
            .field("break_offset", &self.break_offset)
            .field("ascent", &self.ascent)
            .field("descent", &self.descent)
            .field("width", &self.width)
            .finish_non_exhaustive()
    }
}

/// A contract over a platform typesetting service (spec.md s:4.3, s:6).
/// Given a substring, a starting offset within it, and a constraining
/// width, produces the next cluster-break offset and that fragment's
/// metrics. Pluggable so tests can stub it without a real font backend.
pub trait Typesetter {
    fn typeset(
        &mut self,
        substring: &str,
        start_offset: usize,
        constraining_width: f64,
    ) -> TypesetResult;
}

#[cfg(feature = "testing")]
pub mod testing {
    //! Deterministic typesetter and glyph run stand-ins for tests. Every
    //! character advances by a fixed width; this is enough to exercise
    //! line-breaking and viewport layout without a real font backend.

    use super::*;

    #[derive(Debug, Clone, Copy)]
    pub struct FixedGlyphRun;

    impl GlyphRun for FixedGlyphRun {
        fn draw(&self, _ctx: &mut dyn GraphicsContext, _origin: Point) {}
    }

    /// Breaks at the first cluster boundary at or before `constraining_width`,
    /// using a fixed per-character advance. CRLF is kept intact. Never
    /// makes zero progress on non-empty input.
    #[derive(Debug, Clone, Copy)]
    pub struct FixedWidthTypesetter {
        pub char_width: f64,
        pub ascent: f64,
        pub descent: f64,
    }

    impl Default for FixedWidthTypesetter {
        fn default() -> Self {
            Self {
                char_width: 8.0,
                ascent: 12.0,
                descent: 4.0,
            }
        }
    }

    impl Typesetter for FixedWidthTypesetter {
        fn typeset(
            &mut self,
            substring: &str,
            start_offset: usize,
            constraining_width: f64,
        ) -> TypesetResult {
            let chars: Vec<char> = substring[start_offset..].chars().collect();
            if chars.is_empty() {
                return TypesetResult {
                    break_offset: start_offset,
                    ascent: self.ascent,
                    descent: self.descent,
                    width: 0.0,
                    glyph_run: Box::new(FixedGlyphRun),
                };
            }
            let max_chars = ((constraining_width / self.char_width).floor() as usize).max(1);
            let mut count = max_chars.min(chars.len());
            // Keep CRLF intact.
            if count < chars.len() && count > 0 && chars[count - 1] == '\r' && chars[count] == '\n'
            {
                count += 1;
            }
            let width = count as f64 * self.char_width;
            TypesetResult {
                break_offset: start_offset + count,
                ascent: self.ascent,
                descent: self.descent,
                width,
                glyph_run: Box::new(FixedGlyphRun),
            }
        }
    }
}
