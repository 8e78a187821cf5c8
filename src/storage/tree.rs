// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A randomized, order-statistic balanced binary search tree keyed purely
//! by in-order rank (a treap), used for both [`crate::line::LineStorage`]
//! and [`crate::fragment::LineFragmentStore`].
//!
//! Nodes carry no explicit key: position is entirely implicit, determined
//! by two independently maintained subtree aggregates (`subtree_len`,
//! `subtree_height`) plus a subtree element count used for index lookups.
//! Balance is kept by assigning each node an independent random priority
//! and maintaining heap order on priority via `split`/`merge`, which play
//! the role rotations play in an AVL or red-black tree. Because split and
//! merge only rewire `left`/`right` pointers between existing arena slots,
//! a node's [`slotmap`] key never changes for as long as the node remains
//! in the tree, which is what lets `Line`/`LineFragment` ids stay valid
//! across edits.

use rand::Rng;
use slotmap::{Key, SlotMap};

use core::ops::Range;

use crate::error::LayoutError;

/// The two metrics every [`OrderStatTree`] payload must expose, and the
/// means by which `update` mutates them in place.
pub trait Metrics {
    /// Character length contributed by this element.
    fn length(&self) -> usize;
    /// Vertical height contributed by this element.
    fn height(&self) -> f64;
    /// Apply a length/height delta in place (used by `update_at_offset`).
    fn apply_delta(&mut self, delta_length: i64, delta_height: f64);
}

struct Node<K: Key, D> {
    payload: D,
    subtree_len: usize,
    subtree_height: f64,
    subtree_count: usize,
    priority: u32,
    left: Option<K>,
    right: Option<K>,
}

/// A balanced binary search tree over a sequence of `D` payloads,
/// order-indexable by position, by cumulative character length, and by
/// cumulative height.
pub struct OrderStatTree<K: Key, D: Metrics> {
    arena: SlotMap<K, Node<K, D>>,
    root: Option<K>,
}

impl<K: Key, D: Metrics> Default for OrderStatTree<K, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, D: Metrics> OrderStatTree<K, D> {
    pub fn new() -> Self {
        Self {
            arena: SlotMap::with_key(),
            root: None,
        }
    }

    pub fn len(&self) -> usize {
        self.subtree_count(self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn total_length(&self) -> usize {
        self.subtree_len(self.root)
    }

    pub fn total_height(&self) -> f64 {
        self.subtree_height(self.root)
    }

    pub fn get(&self, key: K) -> Option<&D> {
        self.arena.get(key).map(|n| &n.payload)
    }

    pub fn get_mut(&mut self, key: K) -> Option<&mut D> {
        self.arena.get_mut(key).map(|n| &mut n.payload)
    }

    fn subtree_len(&self, node: Option<K>) -> usize {
        node.map_or(0, |k| self.arena[k].subtree_len)
    }

    fn subtree_height(&self, node: Option<K>) -> f64 {
        node.map_or(0.0, |k| self.arena[k].subtree_height)
    }

    fn subtree_count(&self, node: Option<K>) -> usize {
        node.map_or(0, |k| self.arena[k].subtree_count)
    }

    fn recompute(&mut self, k: K) {
        let (left, right) = (self.arena[k].left, self.arena[k].right);
        let own_len = self.arena[k].payload.length();
        let own_height = self.arena[k].payload.height();
        let len = own_len + self.subtree_len(left) + self.subtree_len(right);
        let height = own_height + self.subtree_height(left) + self.subtree_height(right);
        let count = 1 + self.subtree_count(left) + self.subtree_count(right);
        let node = &mut self.arena[k];
        node.subtree_len = len;
        node.subtree_height = height;
        node.subtree_count = count;
    }

    /// Heap-ordered merge of two treaps where every element of `left`
    /// precedes every element of `right` in document order.
    fn merge(&mut self, left: Option<K>, right: Option<K>) -> Option<K> {
        match (left, right) {
            (None, r) => r,
            (l, None) => l,
            (Some(l), Some(r)) => {
                if self.arena[l].priority > self.arena[r].priority {
                    let right_of_l = self.arena[l].right;
                    let merged = self.merge(right_of_l, Some(r));
                    self.arena[l].right = merged;
                    self.recompute(l);
                    Some(l)
                } else {
                    let left_of_r = self.arena[r].left;
                    let merged = self.merge(Some(l), left_of_r);
                    self.arena[r].left = merged;
                    self.recompute(r);
                    Some(r)
                }
            }
        }
    }

    /// Splits so the left part holds the first `target` characters of
    /// in-order content and the right part holds the rest. `target` must
    /// land on a node boundary (the sum of lengths of some prefix of
    /// nodes) -- callers establish this before calling.
    fn split_by_offset(&mut self, node: Option<K>, target: usize) -> (Option<K>, Option<K>) {
        let Some(k) = node else {
            return (None, None);
        };
        let left_len = self.subtree_len(self.arena[k].left);
        if target <= left_len {
            let (ll, lr) = self.split_by_offset(self.arena[k].left, target);
            self.arena[k].left = lr;
            self.recompute(k);
            (ll, Some(k))
        } else {
            let own_len = self.arena[k].payload.length();
            debug_assert!(
                target >= left_len + own_len,
                "split target does not land on a node boundary"
            );
            let remainder = target - left_len - own_len;
            let (rl, rr) = self.split_by_offset(self.arena[k].right, remainder);
            self.arena[k].right = rl;
            self.recompute(k);
            (Some(k), rr)
        }
    }

    /// The node containing `offset` under half-open `[start, start+len)`
    /// semantics, with the rightmost node in the tree absorbing
    /// `offset == total_length()` regardless of its own length (the
    /// terminal-line rule, spec.md s:4.3). Also returns the cumulative
    /// height of every node preceding it in document order, so an offset
    /// can be mapped to a vertical position in the same descent that
    /// locates it.
    fn locate_by_offset(&self, offset: usize) -> Option<(K, usize, f64)> {
        let mut node = self.root?;
        let mut offset = offset;
        let mut acc_len = 0usize;
        let mut acc_height = 0.0f64;
        loop {
            let left = self.arena[node].left;
            let left_len = self.subtree_len(left);
            let left_height = self.subtree_height(left);
            if offset < left_len {
                node = left?;
                continue;
            }
            let local = offset - left_len;
            let own_len = self.arena[node].payload.length();
            let right = self.arena[node].right;
            let node_start = acc_len + left_len;
            let node_start_height = acc_height + left_height;
            if local < own_len || (right.is_none() && local == own_len) {
                return Some((node, node_start, node_start_height));
            }
            acc_len = node_start + own_len;
            acc_height = node_start_height + self.arena[node].payload.height();
            offset = local - own_len;
            node = right?;
        }
    }

    pub fn get_by_offset(&self, offset: usize) -> Option<(K, usize, &D)> {
        let total = self.total_length();
        let offset = offset.min(total);
        let (key, start, _) = self.locate_by_offset(offset)?;
        Some((key, start, &self.arena[key].payload))
    }

    /// As [`Self::get_by_offset`], additionally returning the vertical
    /// position where the located element starts.
    pub fn get_by_offset_with_height(&self, offset: usize) -> Option<(K, usize, f64, &D)> {
        let total = self.total_length();
        let offset = offset.min(total);
        let (key, start, start_height) = self.locate_by_offset(offset)?;
        Some((key, start, start_height, &self.arena[key].payload))
    }

    pub fn get_by_index(&self, index: usize) -> Option<(K, usize)> {
        if index >= self.len() {
            return None;
        }
        let mut node = self.root?;
        let mut idx = index;
        let mut acc = 0usize;
        loop {
            let left = self.arena[node].left;
            let left_count = self.subtree_count(left);
            let left_len = self.subtree_len(left);
            match idx.cmp(&left_count) {
                core::cmp::Ordering::Less => {
                    node = left?;
                }
                core::cmp::Ordering::Equal => {
                    return Some((node, acc + left_len));
                }
                core::cmp::Ordering::Greater => {
                    idx -= left_count + 1;
                    let own_len = self.arena[node].payload.length();
                    acc += left_len + own_len;
                    node = self.arena[node].right?;
                }
            }
        }
    }

    /// The node whose half-open vertical interval `[y, y+height)` contains
    /// `y`. A point exactly on a boundary belongs to the line starting at
    /// that boundary (spec.md s:4.3).
    pub fn get_by_position(&self, y: f64) -> Option<(K, f64, &D)> {
        let (key, start_y, _) = self.locate_by_position(y)?;
        Some((key, start_y, &self.arena[key].payload))
    }

    /// As [`Self::get_by_position`], additionally returning the
    /// character offset where the located element starts.
    pub fn get_by_position_with_offset(&self, y: f64) -> Option<(K, f64, usize, &D)> {
        let (key, start_y, start_offset) = self.locate_by_position(y)?;
        Some((key, start_y, start_offset, &self.arena[key].payload))
    }

    fn locate_by_position(&self, y: f64) -> Option<(K, f64, usize)> {
        let total = self.total_height();
        if self.is_empty() {
            return None;
        }
        let y = y.clamp(0.0, (total - f64::EPSILON).max(0.0));
        let mut node = self.root?;
        let mut local = y;
        let mut acc_height = 0.0f64;
        let mut acc_len = 0usize;
        loop {
            let left = self.arena[node].left;
            let left_h = self.subtree_height(left);
            let left_len = self.subtree_len(left);
            if local < left_h {
                node = left?;
                continue;
            }
            let rem = local - left_h;
            let own_h = self.arena[node].payload.height();
            let right = self.arena[node].right;
            let node_start = acc_height + left_h;
            let node_start_len = acc_len + left_len;
            if rem < own_h || right.is_none() {
                return Some((node, node_start, node_start_len));
            }
            acc_height = node_start + own_h;
            acc_len = node_start_len + self.arena[node].payload.length();
            local = rem - own_h;
            node = right?;
        }
    }

    pub fn insert_at_offset(&mut self, payload: D, at_offset: usize) -> Result<K, LayoutError> {
        let total = self.total_length();
        if at_offset > total {
            return Err(LayoutError::IndexOutOfRange(at_offset..at_offset));
        }
        if at_offset < total {
            if let Some((_, start, _)) = self.locate_by_offset(at_offset) {
                if start != at_offset {
                    return Err(LayoutError::IndexOutOfRange(at_offset..at_offset));
                }
            }
        }
        let (left, right) = self.split_by_offset(self.root, at_offset);
        let priority = rand::thread_rng().gen::<u32>();
        let node = Node {
            subtree_len: payload.length(),
            subtree_height: payload.height(),
            subtree_count: 1,
            payload,
            priority,
            left: None,
            right: None,
        };
        let key = self.arena.insert(node);
        let with_left = self.merge(left, Some(key));
        self.root = self.merge(with_left, right);
        Ok(key)
    }

    /// Removes every node fully covered by `range`, returning their
    /// payloads in document order. Nodes only partially overlapping
    /// `range` are left untouched.
    pub fn delete_covered(&mut self, range: Range<usize>) -> Result<Vec<D>, LayoutError> {
        let total = self.total_length();
        if range.end > total || range.start > range.end {
            return Err(LayoutError::IndexOutOfRange(range));
        }
        if range.start == range.end {
            return Ok(Vec::new());
        }
        let lo = self.boundary_at_or_after(range.start);
        let hi = self.boundary_at_or_before(range.end);
        if lo >= hi {
            return Ok(Vec::new());
        }
        let (before, rest) = self.split_by_offset(self.root, lo);
        let (removed, after) = self.split_by_offset(rest, hi - lo);
        self.root = self.merge(before, after);
        Ok(self.drain_subtree(removed))
    }

    fn drain_subtree(&mut self, node: Option<K>) -> Vec<D> {
        let mut out = Vec::new();
        self.drain_into(node, &mut out);
        out
    }

    fn drain_into(&mut self, node: Option<K>, out: &mut Vec<D>) {
        let Some(k) = node else { return };
        let (left, right) = (self.arena[k].left, self.arena[k].right);
        self.drain_into(left, out);
        if let Some(removed) = self.arena.remove(k) {
            out.push(removed.payload);
        }
        self.drain_into(right, out);
    }

    fn boundary_at_or_after(&self, offset: usize) -> usize {
        let total = self.total_length();
        if offset == 0 || offset >= total {
            return offset.min(total);
        }
        let Some((key, start, _)) = self.locate_by_offset(offset) else {
            return offset;
        };
        if start == offset {
            offset
        } else {
            start + self.arena[key].payload.length()
        }
    }

    fn boundary_at_or_before(&self, offset: usize) -> usize {
        let total = self.total_length();
        if offset == 0 || offset >= total {
            return offset.min(total);
        }
        match self.locate_by_offset(offset) {
            Some((_, start, _)) => start,
            None => offset,
        }
    }

    /// Applies `(delta_length, delta_height)` to the element containing
    /// `at_offset`, propagating updated aggregates to the root.
    pub fn update_at_offset(
        &mut self,
        at_offset: usize,
        delta_length: i64,
        delta_height: f64,
    ) -> Result<(), LayoutError> {
        let total = self.total_length();
        if at_offset > total {
            return Err(LayoutError::IndexOutOfRange(at_offset..at_offset));
        }
        let Some(root) = self.root else {
            return Err(LayoutError::IndexOutOfRange(at_offset..at_offset));
        };
        self.update_rec(root, at_offset, delta_length, delta_height);
        Ok(())
    }

    fn update_rec(&mut self, node: K, offset: usize, delta_length: i64, delta_height: f64) {
        let left = self.arena[node].left;
        let left_len = self.subtree_len(left);
        if offset < left_len {
            self.update_rec(left.unwrap(), offset, delta_length, delta_height);
        } else {
            let local = offset - left_len;
            let own_len = self.arena[node].payload.length();
            let right = self.arena[node].right;
            if local < own_len || right.is_none() {
                self.arena[node].payload.apply_delta(delta_length, delta_height);
            } else {
                self.update_rec(right.unwrap(), local - own_len, delta_length, delta_height);
            }
        }
        self.recompute(node);
    }

    pub(crate) fn child_len(&self, node: K, left: bool) -> usize {
        let child = if left {
            self.arena[node].left
        } else {
            self.arena[node].right
        };
        self.subtree_len(child)
    }

    pub(crate) fn own_len(&self, node: K) -> usize {
        self.arena[node].payload.length()
    }

    pub(crate) fn own_height(&self, node: K) -> f64 {
        self.arena[node].payload.height()
    }

    pub(crate) fn left_of(&self, node: K) -> Option<K> {
        self.arena[node].left
    }

    pub(crate) fn right_of(&self, node: K) -> Option<K> {
        self.arena[node].right
    }

    pub(crate) fn root_key(&self) -> Option<K> {
        self.root
    }

    pub(crate) fn subtree_len_of(&self, node: Option<K>) -> usize {
        self.subtree_len(node)
    }

    pub(crate) fn subtree_height_of(&self, node: Option<K>) -> f64 {
        self.subtree_height(node)
    }
}
