/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Endianness-generic WORM trees storing unsigned-integer values.
//!
//! The `(offset_size, value_size, endianness)` triple is chosen at build
//! time, so code handling arbitrary WORM buffers would otherwise have to
//! be generic over the endianness selector. [`WormTreeGeneric`] dispatches
//! to the matching concrete [`WormTree`] at construction and exposes
//! cursors returning the widest value type, `u64`.
//!
//! [`find_minimum_worm_params`] and [`build_worm_tree`] automate the
//! canonical two-pass sequence: a stats-only dry run at maximum widths,
//! then a real build at the minimum sufficient ones.

use dsi_bitstream::traits::{BE, LE};
use dsi_progress_logger::prelude::*;
use log::info;

use super::builder::WormTreeBuilder;
use super::codec::{UIntCodec, ValueCodec, WormEndian};
use super::cursor::{WormCursor, WormLookupCursor};
use super::load::BufferRo;
use super::tree::WormTree;
use crate::cursors::{ChildOrder, PreOrderIter, StopAt, TreeCursor, ValueCursor};
use crate::errors::Result;
use crate::paths::Path;
use crate::trees::ValueRef;

/// The out-of-band parameter triple of a WORM buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WormTreeParams {
    /// Width in bytes of right-child offsets, `1..=8`.
    pub offset_size: usize,
    /// Width in bytes of value integers, `1..=8`.
    pub value_size: usize,
    /// Whether multi-byte integer fields are little-endian.
    pub little_endian: bool,
}

impl WormTreeParams {
    /// Returns the value-codec identifier these parameters imply.
    pub fn value_type_id(&self) -> String {
        format!(
            "AKAMAI-UINT-{}-{}",
            if self.little_endian {
                LE::CODEC_NAME
            } else {
                BE::CODEC_NAME
            },
            self.value_size
        )
    }
}

/// Object-safe surface of the navigable WORM walk cursor.
trait CursorDyn<P: Path> {
    fn at_node(&self) -> bool;
    fn at_value(&self) -> bool;
    fn can_go_child(&self, child: u8) -> bool;
    fn can_go_child_node(&self, child: u8) -> bool;
    fn go_child(&mut self, child: u8) -> bool;
    fn can_go_parent(&self) -> bool;
    fn go_parent(&mut self) -> bool;
    fn path(&self) -> &P;
    fn value_u64(&self) -> Option<u64>;
    fn covering_u64(&self) -> Option<(u64, usize)>;
}

impl<P: Path, E: WormEndian> CursorDyn<P> for WormCursor<'_, P, E, UIntCodec<E>> {
    fn at_node(&self) -> bool {
        TreeCursor::at_node(self)
    }
    fn at_value(&self) -> bool {
        TreeCursor::at_value(self)
    }
    fn can_go_child(&self, child: u8) -> bool {
        TreeCursor::can_go_child(self, child)
    }
    fn can_go_child_node(&self, child: u8) -> bool {
        TreeCursor::can_go_child_node(self, child)
    }
    fn go_child(&mut self, child: u8) -> bool {
        TreeCursor::go_child(self, child)
    }
    fn can_go_parent(&self) -> bool {
        TreeCursor::can_go_parent(self)
    }
    fn go_parent(&mut self) -> bool {
        TreeCursor::go_parent(self)
    }
    fn path(&self) -> &P {
        TreeCursor::path(self)
    }
    fn value_u64(&self) -> Option<u64> {
        self.value().map(|v| *v)
    }
    fn covering_u64(&self) -> Option<(u64, usize)> {
        self.covering_value().map(|(v, d)| (*v, d))
    }
}

/// Object-safe surface of the descend-only WORM cursor. No upward
/// movement exists here, so none can leak through the wrapper.
trait LookupDyn<P: Path> {
    fn at_node(&self) -> bool;
    fn at_value(&self) -> bool;
    fn can_go_child(&self, child: u8) -> bool;
    fn can_go_child_node(&self, child: u8) -> bool;
    fn go_child(&mut self, child: u8) -> bool;
    fn path(&self) -> &P;
    fn value_u64(&self) -> Option<u64>;
    fn covering_u64(&self) -> Option<(u64, usize)>;
}

impl<P: Path, E: WormEndian> LookupDyn<P> for WormLookupCursor<'_, P, E, UIntCodec<E>> {
    fn at_node(&self) -> bool {
        WormLookupCursor::at_node(self)
    }
    fn at_value(&self) -> bool {
        WormLookupCursor::at_value(self)
    }
    fn can_go_child(&self, child: u8) -> bool {
        WormLookupCursor::can_go_child(self, child)
    }
    fn can_go_child_node(&self, child: u8) -> bool {
        WormLookupCursor::can_go_child_node(self, child)
    }
    fn go_child(&mut self, child: u8) -> bool {
        WormLookupCursor::go_child(self, child)
    }
    fn path(&self) -> &P {
        WormLookupCursor::path(self)
    }
    fn value_u64(&self) -> Option<u64> {
        self.value().map(|v| *v)
    }
    fn covering_u64(&self) -> Option<(u64, usize)> {
        self.covering_value().map(|(v, d)| (*v, d))
    }
}

/// A full-navigation cursor over a [`WormTreeGeneric`], yielding `u64`
/// values.
///
/// Always backed by a walk cursor, so the [`TreeCursor`] contract holds
/// in full; the descend-only flavor is the separate
/// [`WormLookupCursorGeneric`], which does not implement [`TreeCursor`].
pub struct WormCursorGeneric<'a, P: Path> {
    inner: Box<dyn CursorDyn<P> + 'a>,
}

impl<P: Path> TreeCursor for WormCursorGeneric<'_, P> {
    type Path = P;

    fn path(&self) -> &P {
        self.inner.path()
    }
    fn at_node(&self) -> bool {
        self.inner.at_node()
    }
    fn at_value(&self) -> bool {
        self.inner.at_value()
    }
    fn can_go_child(&self, child: u8) -> bool {
        self.inner.can_go_child(child)
    }
    fn can_go_child_node(&self, child: u8) -> bool {
        self.inner.can_go_child_node(child)
    }
    fn go_child(&mut self, child: u8) -> bool {
        self.inner.go_child(child)
    }
    fn can_go_parent(&self) -> bool {
        self.inner.can_go_parent()
    }
    fn go_parent(&mut self) -> bool {
        self.inner.go_parent()
    }
}

impl<P: Path> ValueCursor for WormCursorGeneric<'_, P> {
    type Value = u64;

    fn value(&self) -> Option<ValueRef<'_, u64>> {
        self.inner.value_u64().map(ValueRef::Copied)
    }

    fn covering_value(&self) -> Option<(ValueRef<'_, u64>, usize)> {
        self.inner
            .covering_u64()
            .map(|(v, d)| (ValueRef::Copied(v), d))
    }
}

/// A descend-only lookup cursor over a [`WormTreeGeneric`], yielding
/// `u64` values.
///
/// Like the in-memory [`LookupCursor`](crate::cursors::LookupCursor) and
/// the concrete [`WormLookupCursor`], it cannot retreat and therefore
/// does not implement [`TreeCursor`]: only the one-way lookup surface is
/// exposed.
pub struct WormLookupCursorGeneric<'a, P: Path> {
    inner: Box<dyn LookupDyn<P> + 'a>,
}

impl<P: Path> WormLookupCursorGeneric<'_, P> {
    /// Returns the current position.
    pub fn path(&self) -> &P {
        self.inner.path()
    }

    /// Returns whether the position coincides with a node.
    pub fn at_node(&self) -> bool {
        self.inner.at_node()
    }

    /// Returns whether the position is at a node carrying a value.
    pub fn at_value(&self) -> bool {
        self.inner.at_value()
    }

    /// Returns whether the cursor may descend one digit.
    pub fn can_go_child(&self, child: u8) -> bool {
        self.inner.can_go_child(child)
    }

    /// Returns whether direction `child` stays on a path leading to a
    /// materialized node.
    pub fn can_go_child_node(&self, child: u8) -> bool {
        self.inner.can_go_child_node(child)
    }

    /// Alias for [`can_go_child_node`](Self::can_go_child_node).
    pub fn has_child_node(&self, child: u8) -> bool {
        self.inner.can_go_child_node(child)
    }

    /// Descends one digit. Fails only at maximum depth.
    pub fn go_child(&mut self, child: u8) -> bool {
        self.inner.go_child(child)
    }

    /// Returns a copy of the value at the current position, if any.
    pub fn value(&self) -> Option<ValueRef<'_, u64>> {
        self.inner.value_u64().map(ValueRef::Copied)
    }

    /// Returns the deepest value seen along the descent and its depth.
    pub fn covering_value(&self) -> Option<(ValueRef<'_, u64>, usize)> {
        self.inner
            .covering_u64()
            .map(|(v, d)| (ValueRef::Copied(v), d))
    }
}

/// Object-safe tree surface behind [`WormTreeGeneric`].
trait TreeDyn<P: Path> {
    fn walk_cursor(&self) -> WormCursorGeneric<'_, P>;
    fn lookup_cursor(&self) -> WormLookupCursorGeneric<'_, P>;
    fn as_bytes(&self) -> &[u8];
}

impl<P: Path, E: WormEndian> TreeDyn<P> for WormTree<P, E, UIntCodec<E>, BufferRo> {
    fn walk_cursor(&self) -> WormCursorGeneric<'_, P> {
        WormCursorGeneric {
            inner: Box::new(self.cursor()),
        }
    }

    fn lookup_cursor(&self) -> WormLookupCursorGeneric<'_, P> {
        WormLookupCursorGeneric {
            inner: Box::new(WormTree::lookup_cursor(self)),
        }
    }

    fn as_bytes(&self) -> &[u8] {
        WormTree::as_bytes(self)
    }
}

/// A WORM tree of unsigned-integer values with build-time parameters
/// carried as metadata.
///
/// Construct with [`make_worm_tree_generic`] (existing buffer),
/// [`build_worm_tree`] (from a source cursor), or
/// [`load`](Self::load)/[`load_in_mem`](Self::load_in_mem) (from disk).
pub struct WormTreeGeneric<P: Path> {
    params: WormTreeParams,
    inner: Box<dyn TreeDyn<P>>,
}

impl<P: Path + 'static> WormTreeGeneric<P> {
    pub(crate) fn from_parts(params: WormTreeParams, buffer: BufferRo) -> Result<Self> {
        let inner: Box<dyn TreeDyn<P>> = if params.little_endian {
            Box::new(WormTree::<P, LE, _, _>::new(
                buffer,
                params.offset_size,
                UIntCodec::<LE>::new(params.value_size)?,
            )?)
        } else {
            Box::new(WormTree::<P, BE, _, _>::new(
                buffer,
                params.offset_size,
                UIntCodec::<BE>::new(params.value_size)?,
            )?)
        };
        Ok(Self { params, inner })
    }

    /// Returns the parameter triple.
    pub fn params(&self) -> &WormTreeParams {
        &self.params
    }

    /// Returns the tree bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    /// Returns a full-navigation cursor at the root.
    pub fn cursor(&self) -> WormCursorGeneric<'_, P> {
        self.inner.walk_cursor()
    }

    /// Returns a descend-only lookup cursor at the root.
    pub fn lookup_cursor(&self) -> WormLookupCursorGeneric<'_, P> {
        self.inner.lookup_cursor()
    }
}

/// Wraps an existing buffer in a generic WORM tree with the given
/// parameters.
pub fn make_worm_tree_generic<P: Path + 'static>(
    params: WormTreeParams,
    buffer: impl Into<BufferRo>,
) -> Result<WormTreeGeneric<P>> {
    WormTreeGeneric::from_parts(params, buffer.into())
}

/// Dry-runs a WORM build over `cursor`'s tree and returns the minimum
/// sufficient offset and value widths (big-endian by default; flip
/// [`little_endian`](WormTreeParams::little_endian) as desired before the
/// real build).
///
/// The source must be a full-navigation cursor (the build backtracks out
/// of every subtree), which the [`TreeCursor`] bound guarantees: when
/// re-encoding an existing WORM tree, pass
/// [`WormTreeGeneric::cursor`], not the descend-only
/// [`lookup_cursor`](WormTreeGeneric::lookup_cursor).
pub fn find_minimum_worm_params<SC>(cursor: SC) -> Result<WormTreeParams>
where
    SC: TreeCursor + ValueCursor,
    SC::Value: Clone + Into<u64>,
{
    let mut builder =
        WormTreeBuilder::<BE, _, SC::Path>::new(8, UIntCodec::<BE>::new(8)?)?;
    builder.start(true)?;
    let mut max_value = 0u64;
    let mut iter = PreOrderIter::with_options(cursor, ChildOrder::Forward, StopAt::Nodes);
    while !iter.finished() {
        let c = iter.cursor();
        let has_child = [c.can_go_child_node(0), c.can_go_child_node(1)];
        let value: Option<u64> = c.value().map(|v| v.into_owned().into());
        if let Some(v) = value {
            max_value = max_value.max(v);
        }
        let path = c.path().clone();
        builder.add_node(&path, value.as_ref(), has_child)?;
        iter.advance();
    }
    builder.finish()?;

    let value_size = ((64 - max_value.leading_zeros() as usize).div_ceil(8)).max(1);
    let params = WormTreeParams {
        offset_size: builder.tree_stats().min_bytes_for_offset(),
        value_size,
        little_endian: false,
    };
    info!(
        "WORM dry run: {} candidate bytes at 8/8, minimum widths offset={} value={}",
        builder.size_of_buffer(),
        params.offset_size,
        params.value_size,
    );
    Ok(params)
}

fn build_worm_buffer<E: WormEndian, SC>(
    params: &WormTreeParams,
    cursor: SC,
    pl: &mut impl ProgressLog,
) -> Result<Vec<u8>>
where
    SC: TreeCursor + ValueCursor,
    SC::Value: Clone + Into<u64>,
{
    let mut builder = WormTreeBuilder::<E, _, SC::Path>::new(
        params.offset_size,
        UIntCodec::<E>::new(params.value_size)?,
    )?;
    builder.start(false)?;
    let mut iter = PreOrderIter::with_options(cursor, ChildOrder::Forward, StopAt::Nodes);
    while !iter.finished() {
        let c = iter.cursor();
        let has_child = [c.can_go_child_node(0), c.can_go_child_node(1)];
        let value: Option<u64> = c.value().map(|v| v.into_owned().into());
        let path = c.path().clone();
        builder.add_node(&path, value.as_ref(), has_child)?;
        pl.light_update();
        iter.advance();
    }
    builder.finish()?;
    Ok(builder.extract_buffer())
}

/// Builds a generic WORM tree from a source cursor with the given
/// parameters, logging progress per node.
///
/// Combine with [`find_minimum_worm_params`] for the canonical two-pass
/// build; pass `no_logging![]` to skip progress output. As with the dry
/// run, the source must be a full-navigation cursor such as
/// [`WormTreeGeneric::cursor`].
pub fn build_worm_tree<SC>(
    params: WormTreeParams,
    cursor: SC,
    pl: &mut impl ProgressLog,
) -> Result<WormTreeGeneric<SC::Path>>
where
    SC: TreeCursor + ValueCursor,
    SC::Path: 'static,
    SC::Value: Clone + Into<u64>,
{
    pl.item_name("node");
    pl.start("Building WORM tree...");
    let buffer = if params.little_endian {
        build_worm_buffer::<LE, _>(&params, cursor, pl)?
    } else {
        build_worm_buffer::<BE, _>(&params, cursor, pl)?
    };
    pl.done();
    make_worm_tree_generic(params, buffer)
}
