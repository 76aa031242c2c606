/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use itertools::Itertools;
use radixtree::prelude::*;

type Tree = BinaryRadixTree<u32, 16>;
type Bp = BinaryPath<16>;

fn bp(digits: &[u8]) -> Bp {
    Bp::from_digits(digits).unwrap()
}

fn sample_tree() -> Tree {
    let mut tree = Tree::new();
    for (i, digits) in [
        &[0u8, 0][..],
        &[0],
        &[0, 1],
        &[],
        &[1, 0],
        &[1],
        &[1, 1],
        &[1, 1, 0, 1],
    ]
    .iter()
    .enumerate()
    {
        tree.insert(&bp(digits), i as u32);
    }
    tree
}

#[test]
fn pre_order_iterator_equals_recursive_walk() {
    let tree = sample_tree();
    let mut walked = Vec::new();
    let mut cursor = tree.cursor();
    pre_order_walk(&mut cursor, ChildOrder::Forward, |c| {
        walked.push((c.path().clone(), *c.value().unwrap()));
    });
    let iterated: Vec<_> = PreOrderIter::new(tree.cursor()).collect();
    assert_eq!(walked, iterated);
    // Same through the walking cursor.
    let iterated_walk: Vec<_> = PreOrderIter::new(tree.walk_cursor()).collect();
    assert_eq!(walked, iterated_walk);
}

#[test]
fn post_order_iterator_equals_recursive_walk() {
    let tree = sample_tree();
    let mut walked = Vec::new();
    let mut cursor = tree.cursor();
    post_order_walk(&mut cursor, ChildOrder::Forward, |c| {
        walked.push((c.path().clone(), *c.value().unwrap()));
    });
    let iterated: Vec<_> = PostOrderIter::new(tree.cursor()).collect();
    assert_eq!(walked, iterated);
}

#[test]
fn in_order_visits_radix_lexicographic_order() {
    let tree = sample_tree();
    let paths: Vec<_> = InOrderIter::new(tree.cursor()).map(|(p, _)| p).collect();
    let expected = vec![
        bp(&[0, 0]),
        bp(&[0]),
        bp(&[0, 1]),
        bp(&[]),
        bp(&[1, 0]),
        bp(&[1]),
        bp(&[1, 1, 0, 1]),
        bp(&[1, 1]),
    ];
    assert_eq!(paths, expected);
}

#[test]
fn reversed_pre_order_is_mirrored_post_order() {
    let tree = sample_tree();
    let pre: Vec<_> = PreOrderIter::new(tree.cursor()).collect();
    let post_mirror: Vec<_> =
        PostOrderIter::with_options(tree.cursor(), ChildOrder::Reverse, StopAt::Values).collect();
    assert_eq!(pre.iter().rev().cloned().collect_vec(), post_mirror);
}

#[test]
fn reverse_children_mirrors_in_order() {
    let tree = sample_tree();
    let forward: Vec<_> = InOrderIter::new(tree.cursor()).map(|(p, _)| p).collect();
    let reverse: Vec<_> =
        InOrderIter::with_options(tree.cursor(), ChildOrder::Reverse, StopAt::Values)
            .map(|(p, _)| p)
            .collect();
    assert_eq!(forward.iter().rev().cloned().collect_vec(), reverse);
}

#[test]
fn stop_at_nodes_includes_branches() {
    let mut tree = Tree::new();
    tree.insert(&bp(&[0, 0]), 1);
    tree.insert(&bp(&[0, 1]), 2);
    // The branch at [0] exists but has no value.
    let mut iter =
        PreOrderIter::with_options(tree.cursor(), ChildOrder::Forward, StopAt::Nodes);
    let mut nodes = Vec::new();
    while !iter.finished() {
        nodes.push((iter.cursor().path().clone(), iter.cursor().at_value()));
        iter.advance();
    }
    assert_eq!(
        nodes,
        vec![
            (bp(&[]), false),
            (bp(&[0]), false),
            (bp(&[0, 0]), true),
            (bp(&[0, 1]), true),
        ]
    );
}

#[test]
fn iterator_reset_restarts() {
    let tree = sample_tree();
    let mut iter = PreOrderIter::new(tree.cursor());
    let first: Vec<_> = iter.by_ref().take(3).collect();
    iter.reset();
    let again: Vec<_> = iter.collect();
    assert_eq!(&again[..3], &first[..]);
    assert_eq!(again.len(), 8);
}

#[test]
fn alphabet_dictionary_enumeration() {
    // Words over a radix-26 alphabet, digit = letter - 'a'.
    let word_path = |w: &str| {
        SimplePath::<26, 10>::from_digits(
            &w.bytes().map(|b| b - b'a').collect::<Vec<_>>(),
        )
        .unwrap()
    };
    let mut tree = MapRadixTree::<String, 26, 10, 8>::new();
    for word in ["cat", "cart", "car", "dog"] {
        tree.insert(&word_path(word), word.to_string());
    }

    let words: Vec<_> = PreOrderIter::new(tree.cursor()).map(|(_, w)| w).collect();
    assert_eq!(words, vec!["car", "cart", "cat", "dog"]);

    // Enumerate the subtree under the prefix "ca".
    let mut cursor = tree.cursor();
    cursor.go_child(b'c' - b'a');
    cursor.go_child(b'a' - b'a');
    let under_ca: Vec<_> = PreOrderIter::new(cursor).map(|(_, w)| w).collect();
    assert_eq!(under_ca, vec!["car", "cart", "cat"]);
}
