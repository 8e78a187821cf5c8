// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render delegate capability (spec.md s:4.6, s:9): an optional hook
//! a host installs to override fragment heights and the never-typeset
//! line height estimate, without subclassing the layout manager.

use crate::fragment::LineFragmentStore;
use crate::line::LineId;

/// A line about to be typeset, and the bits of context a delegate is
/// allowed to see while doing so.
pub struct DisplayContext<'a> {
    pub line_id: LineId,
    pub range: core::ops::Range<usize>,
    pub fragments: &'a mut LineFragmentStore,
}

/// Optional override for line-fragment preparation and estimated line
/// height (spec.md s:4.6). Modeled as a capability trait, per the
/// "dynamic dispatch for the render delegate" design note (spec.md s:9);
/// tests substitute a mock that records calls and forces heights.
pub trait RenderDelegate {
    /// Called after a line's fragments are produced but before
    /// `needsLayout` is cleared. May override fragment heights by
    /// applying deltas through `ctx.fragments`; must leave fragment
    /// ranges intact.
    fn prepare_for_display(&mut self, ctx: DisplayContext<'_>);

    /// A custom baseline height for lines that have never been typeset,
    /// in place of the engine's configured default.
    fn estimated_line_height(&self) -> Option<f64> {
        None
    }
}

#[cfg(feature = "testing")]
pub mod testing {
    //! A delegate double that records every call and can force a fixed
    //! fragment height, for exercising spec.md s:8 scenario 4.

    use super::*;

    #[derive(Debug, Clone)]
    pub struct RecordingRenderDelegate {
        pub forced_fragment_height: Option<f64>,
        pub forced_line_height: Option<f64>,
        pub prepared_lines: Vec<LineId>,
    }

    impl Default for RecordingRenderDelegate {
        fn default() -> Self {
            Self {
                forced_fragment_height: None,
                forced_line_height: None,
                prepared_lines: Vec::new(),
            }
        }
    }

    impl RenderDelegate for RecordingRenderDelegate {
        fn prepare_for_display(&mut self, ctx: DisplayContext<'_>) {
            self.prepared_lines.push(ctx.line_id);
            let Some(forced) = self.forced_fragment_height else {
                return;
            };
            let starts: Vec<_> = ctx
                .fragments
                .fragments_in_range(0..ctx.fragments.total_length())
                .map(|(_, start, frag)| (start, frag.height()))
                .collect();
            for (start, current_height) in starts {
                let delta = forced - current_height;
                if delta != 0.0 {
                    let _ = ctx.fragments.update_height(start, delta);
                }
            }
        }

        fn estimated_line_height(&self) -> Option<f64> {
            self.forced_line_height
        }
    }
}
