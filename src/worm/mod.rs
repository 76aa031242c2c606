/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The WORM (Write-Once-Read-Many) serialized binary tree format.
//!
//! A WORM tree is a contiguous byte buffer laid out as a pre-order dump of
//! the nodes of a binary radix tree, built in one pass by
//! [`WormTreeBuilder`] and walked by [`WormCursor`]/[`WormLookupCursor`].
//! After [`finish`](WormTreeBuilder::finish) the buffer is immutable and
//! freely shareable; any number of read-only cursors may traverse it
//! concurrently, which is the intended production configuration.
//!
//! # On-wire format
//!
//! Two parameters are fixed per tree before building and carried
//! out-of-band as [`WormTreeParams`]: the *offset width* and the *value
//! width*, both in `1..=8` bytes, plus the endianness of multi-byte
//! integer fields. Each node is laid out as:
//!
//! 1. a 2-byte *base header*;
//! 2. iff the node has both children: a right-child offset integer of
//!    `offset_size` bytes;
//! 3. iff the node has a value: the value blob (`value_size` bytes for the
//!    built-in unsigned-integer codec).
//!
//! The base header bits, numbered from the MSB of byte 0 and packed
//! MSB-first across both bytes:
//!
//! | bits  | field             |
//! |-------|-------------------|
//! | 0     | `has_left_child`  |
//! | 1     | `has_right_child` |
//! | 2     | `has_value`       |
//! | 3–6   | `edge_length`     |
//! | 7–15  | edge digits, MSB-first, capacity 9, zero past `edge_length` |
//!
//! The left child (if any) immediately follows the node; the right child
//! (if any) starts `right_child_offset` bytes after the start of this
//! node's header. A single child is always adjacent and no offset field is
//! written. The root node sits at byte offset 0. Runs of more than 9
//! edge digits are carried by chains of single-child scaffolding nodes,
//! synthesized by the builder and invisible to cursors.
//!
//! The base header layout is identical for every offset width; only the
//! offset field scales. A dry-run build (statistics mode) therefore
//! predicts, for every candidate width, the exact longest gap a
//! right-child offset must span, and
//! [`min_bytes_for_offset`](WormTreeStats::min_bytes_for_offset) picks the
//! smallest sufficient width. The canonical two-pass sequence is automated
//! by [`find_minimum_worm_params`] and [`build_worm_tree`].
//!
//! Values are encoded through a [`ValueCodec`], identified by a string id;
//! the built-in family is `AKAMAI-UINT-<BIGENDIAN|LITTLEENDIAN>-<size>`
//! ([`UIntCodec`]).

mod builder;
mod codec;
mod cursor;
mod generic;
mod header;
mod load;
mod tree;

pub use builder::{WormNodeStats, WormStatsTotal, WormTreeBuilder, WormTreeStats};
pub use codec::{UIntCodec, ValueCodec, WormEndian};
pub use cursor::{WormCursor, WormLookupCursor};
pub use generic::{
    build_worm_tree, find_minimum_worm_params, make_worm_tree_generic, WormCursorGeneric,
    WormLookupCursorGeneric, WormTreeGeneric, WormTreeParams,
};
pub use load::{BufferRo, MmapBuffer, PROPERTIES_EXTENSION, WORM_EXTENSION};
pub use tree::WormTree;
