// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The order-statistic tree shared by [`crate::line::LineStorage`] and
//! [`crate::fragment::LineFragmentStore`].

mod iter;
mod tree;

pub use iter::{HeightRangeIter, OffsetRangeIter};
pub use tree::{Metrics, OrderStatTree};
