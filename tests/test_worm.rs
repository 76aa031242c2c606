/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use dsi_bitstream::traits::{BE, LE};
use dsi_progress_logger::no_logging;
use radixtree::prelude::*;

type Tree = BinaryRadixTree<u32, 16>;
type Bp = BinaryPath<16>;

fn bp(digits: &[u8]) -> Bp {
    Bp::from_digits(digits).unwrap()
}

fn tree_with(pairs: &[(&[u8], u32)]) -> Tree {
    let mut tree = Tree::new();
    for (digits, v) in pairs {
        tree.insert(&bp(digits), *v);
    }
    tree
}

#[test]
fn three_value_round_trip_is_byte_exact() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    // Root value 37 plus a deep value at the end of a six-digit edge.
    let tree = tree_with(&[(&[], 37), (&[1, 1, 1, 1, 1, 1, 0], 12348)]);

    let params = find_minimum_worm_params(tree.cursor())?;
    assert_eq!(params.offset_size, 1);
    assert_eq!(params.value_size, 2);

    let worm = build_worm_tree(params, tree.cursor(), no_logging![])?;
    // Two nodes of 2-byte header + 2-byte value each; no offset fields.
    assert_eq!(
        worm.as_bytes(),
        &[0x60, 0x00, 0x00, 0x25, 0x2D, 0xF0, 0x30, 0x3C]
    );

    let mut lookup = worm.lookup_cursor();
    assert_eq!(lookup.value().map(|v| *v), Some(37));
    for d in [1, 1, 1, 1, 1, 1, 0] {
        lookup.go_child(d);
    }
    assert_eq!(lookup.value().map(|v| *v), Some(12348));
    Ok(())
}

#[test]
fn right_child_offset_layout() -> Result<()> {
    let tree = tree_with(&[(&[0], 1), (&[1], 2)]);
    let params = find_minimum_worm_params(tree.cursor())?;
    assert_eq!(params, WormTreeParams {
        offset_size: 1,
        value_size: 1,
        little_endian: false,
    });
    let worm = build_worm_tree(params, tree.cursor(), no_logging![])?;
    // Root: header 2 + offset 1; children: header 2 + value 1 each.
    assert_eq!(worm.as_bytes().len(), 9);
    // The right child sits 6 bytes past the root header.
    assert_eq!(worm.as_bytes()[2], 6);

    let mut cursor = worm.cursor();
    cursor.go_child(0);
    assert_eq!(cursor.value().map(|v| *v), Some(1));
    cursor.go_parent();
    cursor.go_child(1);
    assert_eq!(cursor.value().map(|v| *v), Some(2));
    Ok(())
}

#[test]
fn worm_matches_source_at_every_position() -> Result<()> {
    let pairs: &[(&[u8], u32)] = &[
        (&[], 9),
        (&[0, 0, 1], 1),
        (&[0, 0, 1, 1, 0], 2),
        (&[0, 1], 3),
        (&[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1], 4),
        (&[1, 0], 5),
    ];
    let tree = tree_with(pairs);
    let params = find_minimum_worm_params(tree.cursor())?;
    let worm = build_worm_tree(params, tree.cursor(), no_logging![])?;

    // Exact and covering lookups agree on stored, covered, and absent
    // paths alike.
    let queries: &[&[u8]] = &[
        &[],
        &[0],
        &[0, 0, 1],
        &[0, 0, 1, 1, 0],
        &[0, 0, 1, 1, 1],
        &[0, 1, 1],
        &[1],
        &[1, 1, 1, 1, 1, 1],
        &[1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
        &[1, 0, 0, 0],
    ];
    for digits in queries {
        let mut mem = tree.cursor();
        let mut wrm = worm.cursor();
        for &d in *digits {
            assert_eq!(mem.can_go_child_node(d), wrm.can_go_child_node(d));
            mem.go_child(d);
            wrm.go_child(d);
            assert_eq!(mem.at_node(), wrm.at_node(), "at {digits:?}");
        }
        assert_eq!(
            mem.value().map(|v| *v as u64),
            wrm.value().map(|v| *v),
            "value at {digits:?}"
        );
        assert_eq!(
            mem.covering_value().map(|(v, d)| (*v as u64, d)),
            wrm.covering_value().map(|(v, d)| (*v, d)),
            "covering at {digits:?}"
        );
    }

    // Pre-order enumeration produces the same pairs, and a tree rebuilt
    // from it is structurally equal.
    let from_mem: Vec<_> = PreOrderIter::new(tree.cursor())
        .map(|(p, v)| (p, v as u64))
        .collect();
    let from_worm: Vec<_> = PreOrderIter::new(worm.cursor()).collect();
    assert_eq!(from_mem, from_worm);

    let mut rebuilt = BinaryRadixTree::<u64, 16>::new();
    for (p, v) in &from_worm {
        rebuilt.insert(p, *v);
    }
    let again: Vec<_> = PreOrderIter::new(rebuilt.cursor()).collect();
    assert_eq!(again, from_worm);
    Ok(())
}

#[test]
fn little_endian_build_reads_back() -> Result<()> {
    let tree = tree_with(&[(&[0], 0x0a0b), (&[1, 1], 0x0102)]);
    let mut params = find_minimum_worm_params(tree.cursor())?;
    params.little_endian = true;
    let worm = build_worm_tree(params, tree.cursor(), no_logging![])?;
    assert!(worm.params().little_endian);
    assert_eq!(worm.params().value_type_id(), "AKAMAI-UINT-LITTLEENDIAN-2");

    let mut c = worm.lookup_cursor();
    c.go_child(0);
    assert_eq!(c.value().map(|v| *v), Some(0x0a0b));
    let mut c = worm.lookup_cursor();
    c.go_child(1);
    c.go_child(1);
    assert_eq!(c.value().map(|v| *v), Some(0x0102));
    Ok(())
}

#[test]
fn builder_protocol_violations() -> Result<()> {
    let codec = UIntCodec::<BE>::new(1)?;
    let mut builder = WormTreeBuilder::<BE, _, Bp>::new(1, codec)?;

    // Not started yet.
    assert!(builder.add_node(&bp(&[]), Some(&1), [false, false]).is_err());
    assert!(builder.finish().is_err());

    builder.start(false)?;
    // Double start while open.
    assert!(builder.start(false).is_err());

    // Root with both children, then a node under the wrong side.
    builder.add_node(&bp(&[]), None, [true, true])?;
    assert!(builder
        .add_node(&bp(&[1]), Some(&1), [false, false])
        .is_err());
    builder.add_node(&bp(&[0]), Some(&1), [false, false])?;
    // Left done, right still missing.
    assert!(matches!(
        builder.finish(),
        Err(radixtree::Error::PendingChildren { count: 1 })
    ));
    builder.add_node(&bp(&[1]), Some(&2), [false, false])?;
    builder.finish()?;
    assert!(builder.finished());
    let buffer = builder.extract_buffer();
    assert!(!buffer.is_empty());
    Ok(())
}

#[test]
fn empty_leaf_rejection_spares_the_root() -> Result<()> {
    let codec = UIntCodec::<BE>::new(1)?;
    let mut builder = WormTreeBuilder::<BE, _, Bp>::new(1, codec)?.reject_empty_leaves(true);
    builder.start(false)?;
    // An empty-leaf root is allowed.
    builder.add_node(&bp(&[]), None, [false, false])?;
    builder.finish()?;

    let mut builder = WormTreeBuilder::<BE, _, Bp>::new(1, codec)?.reject_empty_leaves(true);
    builder.start(false)?;
    builder.add_node(&bp(&[]), None, [true, false])?;
    assert!(matches!(
        builder.add_node(&bp(&[0]), None, [false, false]),
        Err(radixtree::Error::EmptyLeaf)
    ));
    Ok(())
}

#[test]
fn scaffolding_nodes_are_ignored_on_input() -> Result<()> {
    // Feeding single-child valueless nodes is harmless: the builder
    // re-creates scaffolding as needed.
    let codec = UIntCodec::<BE>::new(1)?;
    let mut builder = WormTreeBuilder::<BE, _, Bp>::new(1, codec)?;
    builder.start(false)?;
    builder.add_node(&bp(&[]), None, [false, true])?;
    builder.add_node(&bp(&[1]), None, [true, false])?;
    builder.add_node(&bp(&[1, 0]), Some(&7), [false, false])?;
    builder.finish()?;
    let buffer = builder.extract_buffer();

    let worm = make_worm_tree_generic::<Bp>(
        WormTreeParams {
            offset_size: 1,
            value_size: 1,
            little_endian: false,
        },
        buffer,
    )?;
    let mut c = worm.lookup_cursor();
    c.go_child(1);
    c.go_child(0);
    assert_eq!(c.value().map(|v| *v), Some(7));
    Ok(())
}

#[test]
fn dry_run_writes_no_bytes_but_counts_them() -> Result<()> {
    let tree = tree_with(&[(&[0, 0], 1), (&[0, 1], 2), (&[1], 200)]);
    let codec = UIntCodec::<BE>::new(8)?;
    let mut builder = WormTreeBuilder::<BE, _, Bp>::new(8, codec)?;
    builder.start(true)?;
    let mut iter = PreOrderIter::with_options(tree.cursor(), ChildOrder::Forward, StopAt::Nodes);
    while !iter.finished() {
        let c = iter.cursor();
        let has_child = [c.can_go_child_node(0), c.can_go_child_node(1)];
        let value = c.value().map(|v| *v as u64);
        let path = c.path().clone();
        builder.add_node(&path, value.as_ref(), has_child)?;
        iter.advance();
    }
    builder.finish()?;
    assert!(builder.buffer().is_empty());
    assert!(builder.size_of_buffer() > 0);

    let stats = builder.tree_stats();
    assert_eq!(stats.all.values.count, 3);
    // Root and the branch at [0] have two children.
    assert_eq!(stats.all.two_children.count, 2);
    assert_eq!(stats.all.no_children.count, 3);
    assert_eq!(stats.min_bytes_for_offset(), 1);
    assert_eq!(stats.all.bytes() as usize, builder.size_of_buffer());
    // Re-projection at the minimum width shrinks only the offset fields.
    let shrunk = stats.all.bytes_at_offset_size(1, 8);
    assert_eq!(stats.all.bytes() - shrunk, 2 * 7);
    Ok(())
}

#[test]
fn generic_cursor_full_navigation() -> Result<()> {
    let tree = tree_with(&[(&[0, 0, 1], 1), (&[0, 1], 2), (&[1], 3)]);
    let params = find_minimum_worm_params(tree.cursor())?;
    let worm = build_worm_tree(params, tree.cursor(), no_logging![])?;

    let mut c = worm.cursor();
    assert!(c.at_node());
    c.go_child(0);
    // Inside the tree there is a branch node at [0].
    assert!(c.at_node());
    assert!(!c.at_value());
    c.go_child(0);
    c.go_child(1);
    assert_eq!(c.value().map(|v| *v), Some(1));
    assert!(c.go_parent());
    assert!(c.go_parent());
    c.go_child(1);
    assert_eq!(c.value().map(|v| *v), Some(2));
    Ok(())
}

#[test]
fn store_and_load_round_trip() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let tree = tree_with(&[(&[], 1), (&[0, 1, 1], 77), (&[1, 0], 12)]);
    let params = find_minimum_worm_params(tree.cursor())?;
    let worm = build_worm_tree(params, tree.cursor(), no_logging![])?;

    let dir = tempfile::tempdir()?;
    let basename = dir.path().join("prefixes");
    worm.store(&basename)?;

    // Memory-mapped load.
    let mapped = WormTreeGeneric::<Bp>::load(&basename)?;
    assert_eq!(mapped.params(), worm.params());
    assert_eq!(mapped.as_bytes(), worm.as_bytes());
    let mut c = mapped.lookup_cursor();
    for d in [0, 1, 1] {
        c.go_child(d);
    }
    assert_eq!(c.value().map(|v| *v), Some(77));

    // Owned-buffer load.
    let owned = WormTreeGeneric::<Bp>::load_in_mem(&basename)?;
    assert_eq!(owned.as_bytes(), worm.as_bytes());
    let values: Vec<_> = PreOrderIter::new(owned.cursor()).collect();
    assert_eq!(
        values,
        vec![(bp(&[]), 1), (bp(&[0, 1, 1]), 77), (bp(&[1, 0]), 12)]
    );
    Ok(())
}

#[test]
fn load_rejects_mismatched_depth() -> Result<()> {
    let tree = tree_with(&[(&[1], 1)]);
    let params = find_minimum_worm_params(tree.cursor())?;
    let worm = build_worm_tree(params, tree.cursor(), no_logging![])?;
    let dir = tempfile::tempdir()?;
    let basename = dir.path().join("depth16");
    worm.store(&basename)?;

    assert!(matches!(
        WormTreeGeneric::<BinaryPath<8>>::load(&basename),
        Err(radixtree::Error::MetadataMismatch(_))
    ));
    Ok(())
}

#[test]
fn le_store_load_round_trip() -> Result<()> {
    let tree = tree_with(&[(&[1, 1, 0], 513)]);
    let mut params = find_minimum_worm_params(tree.cursor())?;
    params.little_endian = true;
    let worm = build_worm_tree(params, tree.cursor(), no_logging![])?;
    let dir = tempfile::tempdir()?;
    let basename = dir.path().join("le");
    worm.store(&basename)?;
    let loaded = WormTreeGeneric::<Bp>::load(&basename)?;
    assert!(loaded.params().little_endian);
    let mut c = loaded.lookup_cursor();
    for d in [1, 1, 0] {
        c.go_child(d);
    }
    assert_eq!(c.covering_value().map(|(v, d)| (*v, d)), Some((513, 3)));
    Ok(())
}

#[test]
fn offset_overflow_is_reported() -> Result<()> {
    // Offset width 1 cannot span a left subtree larger than 255 bytes.
    let mut tree = Tree::new();
    tree.insert(&bp(&[1]), 1);
    // 60 left-side values, 4 bytes each once laid out, push the right
    // child past the 255-byte horizon.
    for i in 0..60u32 {
        let digits: Vec<u8> = (0..8).map(|b| ((i >> b) & 1) as u8).collect();
        let mut path = vec![0u8];
        path.extend(digits);
        tree.insert(&bp(&path), i);
    }
    let params = WormTreeParams {
        offset_size: 1,
        value_size: 1,
        little_endian: false,
    };
    assert!(matches!(
        build_worm_tree(params, tree.cursor(), no_logging![]),
        Err(radixtree::Error::OffsetOverflow { width: 1, .. })
    ));
    // The dry run knows a wider offset is needed.
    let minimal = find_minimum_worm_params(tree.cursor())?;
    assert_eq!(minimal.offset_size, 2);
    let worm = build_worm_tree(minimal, tree.cursor(), no_logging![])?;
    assert_eq!(worm.lookup_cursor().covering_value(), None);
    let mut c = worm.cursor();
    c.go_child(1);
    assert_eq!(c.value().map(|v| *v), Some(1));
    Ok(())
}

#[test]
fn uses_both_endianness_markers() {
    // The endianness selectors come from dsi-bitstream; make sure both
    // instantiate the codec family.
    assert_eq!(UIntCodec::<BE>::new(3).unwrap().type_id(), "AKAMAI-UINT-BIGENDIAN-3");
    assert_eq!(
        UIntCodec::<LE>::new(3).unwrap().type_id(),
        "AKAMAI-UINT-LITTLEENDIAN-3"
    );
}
