/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Randomized torture tests against a sorted-map reference model.

use std::collections::BTreeMap;

use anyhow::Result;
use dsi_progress_logger::no_logging;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use radixtree::prelude::*;

const DEPTH: usize = 24;
type Tree = BinaryRadixTree<u32, DEPTH>;
type Bp = BinaryPath<DEPTH>;

fn random_path(rng: &mut SmallRng) -> Vec<u8> {
    let len = rng.random_range(0..=DEPTH);
    (0..len).map(|_| rng.random_range(0..2u8)).collect()
}

fn reference_covering(reference: &BTreeMap<Vec<u8>, u32>, query: &[u8]) -> Option<(u32, usize)> {
    (0..=query.len())
        .rev()
        .find_map(|len| reference.get(&query[..len]).map(|v| (*v, len)))
}

#[test]
fn random_inserts_match_reference() {
    let mut rng = SmallRng::seed_from_u64(0x5eed);
    let mut tree = Tree::new();
    let mut reference = BTreeMap::new();

    for i in 0..400u32 {
        let digits = random_path(&mut rng);
        tree.insert(&Bp::from_digits(&digits).unwrap(), i);
        reference.insert(digits, i);
    }

    // Exact lookups on every stored path.
    for (digits, value) in &reference {
        let path = Bp::from_digits(digits).unwrap();
        assert_eq!(tree.get(&path).map(|v| *v), Some(*value));
    }

    // Longest-prefix lookups on random queries.
    for _ in 0..500 {
        let digits = random_path(&mut rng);
        let path = Bp::from_digits(&digits).unwrap();
        assert_eq!(
            tree.longest_prefix(&path).map(|(v, d)| (*v, d)),
            reference_covering(&reference, &digits),
            "covering mismatch at {digits:?}"
        );
    }

    // Pre-order enumeration is radix-lexicographic with prefixes first,
    // which is exactly the reference map's key order.
    let enumerated: Vec<_> = PreOrderIter::new(tree.cursor())
        .map(|(p, v)| (p.to_digits(), v))
        .collect();
    let expected: Vec<_> = reference.iter().map(|(k, v)| (k.clone(), *v)).collect();
    assert_eq!(enumerated, expected);
}

#[test]
fn random_removals_match_reference() {
    let mut rng = SmallRng::seed_from_u64(0xfeed);
    let mut tree = Tree::new();
    let mut reference = BTreeMap::new();

    let mut paths = Vec::new();
    for i in 0..200u32 {
        let digits = random_path(&mut rng);
        tree.insert(&Bp::from_digits(&digits).unwrap(), i);
        reference.insert(digits.clone(), i);
        paths.push(digits);
    }

    // Remove a random half, including repeated removals of the same path.
    for _ in 0..150 {
        let digits = &paths[rng.random_range(0..paths.len())];
        let expected = reference.remove(digits);
        assert_eq!(
            tree.remove(&Bp::from_digits(digits).unwrap()),
            expected,
            "remove mismatch at {digits:?}"
        );
    }

    for (digits, value) in &reference {
        assert_eq!(
            tree.get(&Bp::from_digits(digits).unwrap()).map(|v| *v),
            Some(*value)
        );
    }
    let enumerated: Vec<_> = PreOrderIter::new(tree.cursor())
        .map(|(p, v)| (p.to_digits(), v))
        .collect();
    let expected: Vec<_> = reference.iter().map(|(k, v)| (k.clone(), *v)).collect();
    assert_eq!(enumerated, expected);
}

#[test]
fn random_walks_agree_across_cursor_flavors() {
    let mut rng = SmallRng::seed_from_u64(0xace);
    let mut tree = Tree::new();
    for i in 0..120u32 {
        let digits = random_path(&mut rng);
        tree.insert(&Bp::from_digits(&digits).unwrap(), i);
    }

    for _ in 0..80 {
        let digits = random_path(&mut rng);
        let mut full = tree.cursor();
        let mut walk = tree.walk_cursor();
        let mut lookup = tree.lookup_cursor();
        for &d in &digits {
            assert_eq!(full.can_go_child_node(d), walk.can_go_child_node(d));
            assert_eq!(full.can_go_child_node(d), lookup.can_go_child_node(d));
            full.go_child(d);
            walk.go_child(d);
            lookup.go_child(d);
            assert_eq!(full.at_node(), walk.at_node());
            assert_eq!(full.at_node(), lookup.at_node());
            assert_eq!(full.at_value(), walk.at_value());
        }
        assert_eq!(
            full.covering_value().map(|(v, d)| (*v, d)),
            walk.covering_value().map(|(v, d)| (*v, d)),
        );
        assert_eq!(
            full.covering_value().map(|(v, d)| (*v, d)),
            lookup.covering_value().map(|(v, d)| (*v, d)),
        );
        // Retreat the navigable cursors all the way up again.
        while full.can_go_parent() {
            full.go_parent();
            walk.go_parent();
            assert_eq!(full.at_node(), walk.at_node());
        }
        assert!(full.path().is_empty() && walk.path().is_empty());
    }
}

#[test]
fn random_worm_round_trip() -> Result<()> {
    let mut rng = SmallRng::seed_from_u64(0xb0b);
    let mut tree = Tree::new();
    let mut reference = BTreeMap::new();
    for i in 0..250u32 {
        let digits = random_path(&mut rng);
        tree.insert(&Bp::from_digits(&digits).unwrap(), i);
        reference.insert(digits, i);
    }

    let params = find_minimum_worm_params(tree.cursor())?;
    let worm = build_worm_tree(params, tree.cursor(), no_logging![])?;

    // Same value set in the same order.
    let from_worm: Vec<_> = PreOrderIter::new(worm.cursor())
        .map(|(p, v)| (p.to_digits(), v as u32))
        .collect();
    let expected: Vec<_> = reference.iter().map(|(k, v)| (k.clone(), *v)).collect();
    assert_eq!(from_worm, expected);

    // Covering lookups agree with the in-memory tree on random queries.
    for _ in 0..300 {
        let digits = random_path(&mut rng);
        let mut lookup = worm.lookup_cursor();
        for &d in &digits {
            lookup.go_child(d);
        }
        assert_eq!(
            lookup.covering_value().map(|(v, d)| (*v as u32, d)),
            reference_covering(&reference, &digits),
            "worm covering mismatch at {digits:?}"
        );
    }
    Ok(())
}
