// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lazy in-order iteration over [`OrderStatTree`] slices, by character
//! offset or by vertical position. Neither iterator materializes more of
//! the tree than the subtrees overlapping the query range plus the node
//! immediately preceding and following it, so scanning a viewport's worth
//! of lines out of a multi-megabyte document stays cheap.

use core::ops::Range;
use slotmap::Key;

use super::tree::{Metrics, OrderStatTree};

fn overlaps_offset(node_start: usize, own_len: usize, range: &Range<usize>) -> bool {
    if own_len == 0 {
        node_start >= range.start && node_start <= range.end
    } else {
        node_start < range.end && range.start < node_start + own_len
    }
}

fn skip_before_offset(node_start: usize, own_len: usize, range_start: usize) -> bool {
    if own_len == 0 {
        node_start < range_start
    } else {
        node_start + own_len <= range_start
    }
}

/// Lazily yields `(key, start_offset)` pairs for every element whose span
/// overlaps a character-offset range, never skipping zero-length elements
/// whose single point falls inside the range.
pub struct OffsetRangeIter<'a, K: Key, D: Metrics> {
    tree: &'a OrderStatTree<K, D>,
    stack: Vec<(K, usize)>,
    range: Range<usize>,
    finished: bool,
}

impl<'a, K: Key, D: Metrics> OffsetRangeIter<'a, K, D> {
    pub(crate) fn new(tree: &'a OrderStatTree<K, D>, range: Range<usize>) -> Self {
        let mut iter = Self {
            tree,
            stack: Vec::new(),
            range,
            finished: false,
        };
        iter.seed();
        iter
    }

    fn seed(&mut self) {
        let mut node = self.tree.root_key();
        let mut acc = 0usize;
        while let Some(k) = node {
            let left = self.tree.left_of(k);
            let left_len = self.tree.subtree_len_of(left);
            let node_start = acc + left_len;
            let own_len = self.tree.own_len(k);
            if skip_before_offset(node_start, own_len, self.range.start) {
                acc = node_start + own_len;
                node = self.tree.right_of(k);
            } else {
                self.stack.push((k, node_start));
                node = left;
            }
        }
    }

    fn push_left_spine(&mut self, mut node: Option<K>, mut acc: usize) {
        while let Some(k) = node {
            let left = self.tree.left_of(k);
            let left_len = self.tree.subtree_len_of(left);
            self.stack.push((k, acc + left_len));
            node = left;
        }
    }
}

impl<'a, K: Key, D: Metrics> Iterator for OffsetRangeIter<'a, K, D> {
    type Item = (K, usize, &'a D);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        while let Some((k, node_start)) = self.stack.pop() {
            if node_start > self.range.end {
                self.stack.clear();
                self.finished = true;
                return None;
            }
            let own_len = self.tree.own_len(k);
            if let Some(right) = self.tree.right_of(k) {
                self.push_left_spine(Some(right), node_start + own_len);
            }
            if overlaps_offset(node_start, own_len, &self.range) {
                return self.tree.get(k).map(|payload| (k, node_start, payload));
            }
        }
        self.finished = true;
        None
    }
}

fn overlaps_height(node_start: f64, own_height: f64, min_y: f64, max_y: f64) -> bool {
    if own_height == 0.0 {
        node_start >= min_y && node_start <= max_y
    } else {
        node_start < max_y && min_y < node_start + own_height
    }
}

fn skip_before_height(node_start: f64, own_height: f64, min_y: f64) -> bool {
    if own_height == 0.0 {
        node_start < min_y
    } else {
        node_start + own_height <= min_y
    }
}

/// Lazily yields `(key, start_y)` pairs for every element whose vertical
/// span overlaps `[min_y, max_y)`.
pub struct HeightRangeIter<'a, K: Key, D: Metrics> {
    tree: &'a OrderStatTree<K, D>,
    stack: Vec<(K, f64)>,
    min_y: f64,
    max_y: f64,
    finished: bool,
}

impl<'a, K: Key, D: Metrics> HeightRangeIter<'a, K, D> {
    pub(crate) fn new(tree: &'a OrderStatTree<K, D>, min_y: f64, max_y: f64) -> Self {
        let mut iter = Self {
            tree,
            stack: Vec::new(),
            min_y,
            max_y,
            finished: false,
        };
        iter.seed();
        iter
    }

    fn seed(&mut self) {
        let mut node = self.tree.root_key();
        let mut acc = 0.0f64;
        while let Some(k) = node {
            let left = self.tree.left_of(k);
            let left_h = self.tree.subtree_height_of(left);
            let node_start = acc + left_h;
            let own_h = self.tree.own_height(k);
            if skip_before_height(node_start, own_h, self.min_y) {
                acc = node_start + own_h;
                node = self.tree.right_of(k);
            } else {
                self.stack.push((k, node_start));
                node = left;
            }
        }
    }

    fn push_left_spine(&mut self, mut node: Option<K>, mut acc: f64) {
        while let Some(k) = node {
            let left = self.tree.left_of(k);
            let left_h = self.tree.subtree_height_of(left);
            self.stack.push((k, acc + left_h));
            node = left;
        }
    }
}

impl<'a, K: Key, D: Metrics> Iterator for HeightRangeIter<'a, K, D> {
    type Item = (K, f64, &'a D);

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        while let Some((k, node_start)) = self.stack.pop() {
            if node_start > self.max_y {
                self.stack.clear();
                self.finished = true;
                return None;
            }
            let own_h = self.tree.own_height(k);
            if let Some(right) = self.tree.right_of(k) {
                self.push_left_spine(Some(right), node_start + own_h);
            }
            if overlaps_height(node_start, own_h, self.min_y, self.max_y) {
                return self.tree.get(k).map(|payload| (k, node_start, payload));
            }
        }
        self.finished = true;
        None
    }
}
