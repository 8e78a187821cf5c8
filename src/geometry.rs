// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared 2D geometry, re-exported from `kurbo` so callers don't need a
//! direct dependency just to pass rectangles and points across the API
//! boundary. This is the same crate the rest of the linebender layout
//! stack (parley, via `peniko::kurbo`) builds its geometry on.

pub use kurbo::{Point, Rect, Size};
