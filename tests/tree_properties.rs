// Copyright 2026 the Lineweave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests over the bare `OrderStatTree`, independent of the line
//! or fragment stores built on top of it. Exercises a local `Metrics`
//! payload so these properties hold for the tree itself, not whatever
//! `TextLine`/`LineFragment` happen to do on commit.

use lineweave::{LineId, Metrics, OrderStatTree};
use proptest::collection::vec;
use proptest::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Span {
    len: usize,
    height: f64,
}

impl Metrics for Span {
    fn length(&self) -> usize {
        self.len
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn apply_delta(&mut self, delta_length: i64, delta_height: f64) {
        self.len = (self.len as i64 + delta_length).max(0) as usize;
        self.height = (self.height + delta_height).max(0.0);
    }
}

fn span_strategy() -> impl Strategy<Value = Span> {
    (0usize..64, 0.0f64..32.0).prop_map(|(len, height)| Span { len, height })
}

fn build_by_appending(spans: &[Span]) -> OrderStatTree<LineId, Span> {
    let mut tree = OrderStatTree::new();
    for span in spans {
        let at = tree.total_length();
        tree.insert_at_offset(*span, at).unwrap();
    }
    tree
}

proptest! {
    #[test]
    fn appending_sums_length_and_height(spans in vec(span_strategy(), 0..64)) {
        let tree = build_by_appending(&spans);
        let expected_len: usize = spans.iter().map(|s| s.len).sum();
        let expected_height: f64 = spans.iter().map(|s| s.height).sum();
        prop_assert_eq!(tree.total_length(), expected_len);
        prop_assert!((tree.total_height() - expected_height).abs() < 1e-6);
        prop_assert_eq!(tree.len(), spans.len());
    }

    #[test]
    fn get_by_index_matches_insertion_order(spans in vec(span_strategy(), 1..64)) {
        let tree = build_by_appending(&spans);
        let mut expected_start = 0usize;
        for (i, span) in spans.iter().enumerate() {
            let (key, start) = tree.get_by_index(i).unwrap();
            prop_assert_eq!(start, expected_start);
            prop_assert_eq!(tree.get(key).copied(), Some(*span));
            expected_start += span.len;
        }
        prop_assert!(tree.get_by_index(spans.len()).is_none());
    }

    #[test]
    fn get_by_offset_finds_the_owning_span(spans in vec(span_strategy(), 1..64)) {
        let tree = build_by_appending(&spans);
        let mut start = 0usize;
        for span in &spans {
            if span.len > 0 {
                let (_, found_start, found) = tree.get_by_offset(start).unwrap();
                prop_assert_eq!(found_start, start);
                prop_assert_eq!(found.len, span.len);
            }
            start += span.len;
        }
        // The last span absorbs an `offset == total_length()` query even
        // when it is itself zero-length.
        let total = tree.total_length();
        let last = spans.last().unwrap();
        let expected_last_start = total - last.len;
        let (_, found_start, found) = tree.get_by_offset(total).unwrap();
        prop_assert_eq!(found_start, expected_last_start);
        prop_assert_eq!(found.len, last.len);
    }

    #[test]
    fn offset_and_height_descents_agree_with_plain_queries(spans in vec(span_strategy(), 1..64)) {
        let tree = build_by_appending(&spans);
        let total = tree.total_length();
        for offset in [0, total / 2, total] {
            let (plain_key, plain_start, _) = tree.get_by_offset(offset).unwrap();
            let (dual_key, dual_start, _, _) = tree.get_by_offset_with_height(offset).unwrap();
            prop_assert_eq!(plain_key, dual_key);
            prop_assert_eq!(plain_start, dual_start);
        }
    }

    #[test]
    fn update_at_offset_changes_totals_by_the_delta(
        spans in vec(span_strategy(), 1..32),
        delta_len in -16i64..16,
        delta_height in -8.0f64..8.0,
    ) {
        let mut tree = build_by_appending(&spans);
        let before_len = tree.total_length();
        let before_height = tree.total_height();
        let (_, start, payload) = tree.get_by_offset(0).unwrap();
        let new_node_len = (payload.len as i64 + delta_len).max(0) as usize;
        let new_node_height = (payload.height + delta_height).max(0.0);
        tree.update_at_offset(start, delta_len, delta_height).unwrap();
        let expected_len = before_len - payload.len + new_node_len;
        prop_assert_eq!(tree.total_length(), expected_len);
        let expected_height = before_height - payload.height + new_node_height;
        prop_assert!((tree.total_height() - expected_height).abs() < 1e-6);
    }

    #[test]
    fn deleting_a_fully_covered_prefix_removes_exactly_that_much(
        spans in vec(span_strategy().prop_filter("non-zero", |s| s.len > 0), 2..32),
    ) {
        let mut tree = build_by_appending(&spans);
        let (_, first_end) = tree.get_by_index(1).unwrap();
        let removed = tree.delete_covered(0..first_end).unwrap();
        prop_assert_eq!(removed.len(), 1);
        prop_assert_eq!(removed[0].len, spans[0].len);
        let expected_total: usize = spans[1..].iter().map(|s| s.len).sum();
        prop_assert_eq!(tree.total_length(), expected_total);
        prop_assert_eq!(tree.len(), spans.len() - 1);
    }
}

#[test]
fn empty_tree_has_no_elements() {
    let tree: OrderStatTree<LineId, Span> = OrderStatTree::new();
    assert!(tree.is_empty());
    assert_eq!(tree.total_length(), 0);
    assert_eq!(tree.total_height(), 0.0);
    assert!(tree.get_by_index(0).is_none());
}

#[test]
fn insert_at_offset_rejects_a_mid_span_boundary() {
    let mut tree = OrderStatTree::new();
    tree.insert_at_offset(Span { len: 4, height: 10.0 }, 0).unwrap();
    assert!(tree.insert_at_offset(Span { len: 1, height: 1.0 }, 2).is_err());
}
