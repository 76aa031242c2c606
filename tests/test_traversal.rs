/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use radixtree::prelude::*;

type Tree = BinaryRadixTree<u32, 8>;
type Bp = BinaryPath<8>;

fn bp(digits: &[u8]) -> Bp {
    Bp::from_digits(digits).unwrap()
}

fn tree_with(paths: &[&[u8]], base: u32) -> Tree {
    let mut tree = Tree::new();
    for (i, digits) in paths.iter().enumerate() {
        tree.insert(&bp(digits), base + i as u32);
    }
    tree
}

#[test]
fn union_walk_visits_union_of_values() {
    let a = tree_with(&[&[0, 0], &[1]], 0);
    let b = tree_with(&[&[0, 1], &[1]], 10);
    let mut compound = CompoundCursor::union((a.cursor(), b.cursor()));
    let mut visited = Vec::new();
    pre_order_walk(&mut compound, ChildOrder::Forward, |cc| {
        let (ca, cb) = cc.cursors();
        visited.push((
            ca.path().clone(),
            ca.value().map(|v| *v),
            cb.value().map(|v| *v),
        ));
    });
    assert_eq!(
        visited,
        vec![
            (bp(&[0, 0]), Some(0), None),
            (bp(&[0, 1]), None, Some(10)),
            (bp(&[1]), Some(1), Some(11)),
        ]
    );
}

#[test]
fn compound_all_predicates() {
    let a = tree_with(&[&[1]], 0);
    let b = tree_with(&[&[1], &[0]], 10);
    let mut compound = CompoundCursor::union((a.cursor(), b.cursor()));
    compound.go_child(1);
    assert!(compound.at_value());
    assert!(compound.all_at_value());
    assert!(compound.go_parent());
    compound.go_child(0);
    // Only b has a value here; a is off-node.
    assert!(compound.at_value());
    assert!(!compound.all_at_value());
    assert!(!compound.all_at_node());
}

/// The three leader/follower configurations of the three-tree counting
/// scenario: leaders hold four values each, the follower holds four
/// reachable extras plus overlaps.
fn follow_fixture() -> (Tree, Tree, Tree) {
    let l1 = tree_with(&[&[1, 0, 0], &[1, 0, 1], &[1, 1, 0], &[1, 1, 1]], 0);
    let l2 = tree_with(&[&[0, 0, 0], &[0, 0, 1], &[0, 1, 0], &[0, 1, 1]], 10);
    let follower = tree_with(
        &[
            &[0, 0],
            &[0, 1],
            &[1, 0],
            &[1, 1],
            // Overlapping the leaders' own value positions.
            &[1, 0, 0],
            &[1, 0, 1],
            &[0, 0, 0],
            &[0, 0, 1],
        ],
        20,
    );
    (follower, l1, l2)
}

#[test]
fn follow_over_counts_leader_and_follower_positions() {
    let (follower, l1, l2) = follow_fixture();
    let mut count = 0;
    pre_order_follow_over(
        (follower.cursor(), l1.cursor(), l2.cursor()),
        ChildOrder::Forward,
        |_| count += 1,
    );
    // 4 + 4 leader positions plus the 4 follower-only depth-2 positions.
    assert_eq!(count, 12);
}

#[test]
fn follow_ignores_follower_positions() {
    let (follower, l1, l2) = follow_fixture();
    let mut count = 0;
    pre_order_follow(
        (follower.cursor(), l1.cursor(), l2.cursor()),
        ChildOrder::Forward,
        |_| count += 1,
    );
    assert_eq!(count, 8);
}

#[test]
fn follower_is_driven_along_the_leader_path() {
    let (follower, l1, l2) = follow_fixture();
    let mut follower_paths = Vec::new();
    pre_order_follow(
        (follower.cursor(), l1.cursor(), l2.cursor()),
        ChildOrder::Forward,
        |cc| {
            let (f, l1c, _) = cc.cursors();
            assert_eq!(f.path(), l1c.path());
            follower_paths.push(f.path().clone());
        },
    );
    assert_eq!(follower_paths.len(), 8);
}

#[test]
fn follow_accumulates_into_mutable_follower() {
    // Sum the two leader trees into the follower wherever either has a
    // value.
    let l1 = tree_with(&[&[0], &[1, 1]], 1);
    let l2 = tree_with(&[&[0], &[1, 0]], 10);
    let mut out = Tree::new();
    pre_order_follow(
        (out.cursor_mut(), l1.cursor(), l2.cursor()),
        ChildOrder::Forward,
        |cc| {
            let sum = {
                let (_, c1, c2) = cc.cursors();
                c1.value().map(|v| *v).unwrap_or(0) + c2.value().map(|v| *v).unwrap_or(0)
            };
            let (f, _, _) = cc.cursors_mut();
            f.add_node().set(sum);
        },
    );
    assert_eq!(*out.get(&bp(&[0])).unwrap(), 11);
    assert_eq!(*out.get(&bp(&[1, 1])).unwrap(), 2);
    assert_eq!(*out.get(&bp(&[1, 0])).unwrap(), 10);
}

#[test]
fn pre_post_order_pairs_up() {
    let tree = tree_with(&[&[0], &[0, 0], &[0, 1], &[1]], 0);
    let events = std::cell::RefCell::new(Vec::new());
    let mut cursor = tree.cursor();
    pre_post_order_walk(
        &mut cursor,
        ChildOrder::Forward,
        |c| events.borrow_mut().push(("pre", c.path().clone())),
        |c| events.borrow_mut().push(("post", c.path().clone())),
    );
    let events = events.into_inner();
    assert_eq!(
        events,
        vec![
            ("pre", bp(&[0])),
            ("pre", bp(&[0, 0])),
            ("post", bp(&[0, 0])),
            ("pre", bp(&[0, 1])),
            ("post", bp(&[0, 1])),
            ("post", bp(&[0])),
            ("pre", bp(&[1])),
            ("post", bp(&[1])),
        ]
    );
}

#[test]
fn in_order_walk_matches_iterator() {
    let tree = tree_with(&[&[0, 0], &[0], &[], &[1, 0], &[1, 1]], 0);
    let mut walked = Vec::new();
    let mut cursor = tree.cursor();
    in_order_walk(&mut cursor, ChildOrder::Forward, |c| {
        walked.push(c.path().clone());
    });
    let iterated: Vec<_> = InOrderIter::new(tree.cursor()).map(|(p, _)| p).collect();
    assert_eq!(walked, iterated);
}

#[test]
fn worm_cursor_participates_in_compound_walks() -> anyhow::Result<()> {
    // A WORM tree and an in-memory tree walked in lockstep.
    let mem = tree_with(&[&[0, 1], &[1, 0, 1]], 1);
    let params = find_minimum_worm_params(mem.cursor())?;
    let worm = build_worm_tree(params, mem.cursor(), dsi_progress_logger::no_logging![])?;

    let other = tree_with(&[&[0, 1], &[1, 1]], 30);
    let mut compound = CompoundCursor::union((worm.cursor(), other.cursor()));
    let mut visited = Vec::new();
    pre_order_walk(&mut compound, ChildOrder::Forward, |cc| {
        let (w, o) = cc.cursors();
        visited.push((w.path().clone(), w.value().map(|v| *v), o.value().map(|v| *v)));
    });
    assert_eq!(
        visited,
        vec![
            (bp(&[0, 1]), Some(1), Some(30)),
            (bp(&[1, 0, 1]), Some(2), None),
            (bp(&[1, 1]), None, Some(31)),
        ]
    );
    Ok(())
}
