/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! One-pass pre-order WORM tree builder with a statistics-only dry-run
//! mode.
//!
//! Nodes must arrive in pre-order and only *significant* nodes need to be
//! fed in: those with two children or with a value. The builder keeps a
//! stack of parents still awaiting a child, synthesizes single-child
//! scaffolding chains whenever a connecting path is longer than one
//! header's edge capacity, and patches each parent's right-child offset
//! when that child finally arrives.
//!
//! The offset width cannot be known before the tree is laid out, so the
//! canonical sequence is two passes: a dry run at width 8 collecting
//! [`WormTreeStats`], then a real build at
//! [`min_bytes_for_offset`](WormTreeStats::min_bytes_for_offset).

use core::marker::PhantomData;

use log::{debug, info};

use super::codec::{ValueCodec, WormEndian};
use super::header::{max_uint_for_bytes, StagedNode};
use crate::errors::{Error, Result};
use crate::paths::Path;
use crate::trees::EdgeOps;

/// Count and byte consumption of one node category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WormNodeStats {
    /// Number of nodes (or values) in the category.
    pub count: u64,
    /// Bytes they occupy.
    pub bytes: u64,
}

impl core::ops::AddAssign for WormNodeStats {
    fn add_assign(&mut self, rhs: Self) {
        self.count += rhs.count;
        self.bytes += rhs.bytes;
    }
}

/// Per-category statistics of a (sub)tree: value blobs plus headers split
/// by child count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WormStatsTotal {
    /// Value blobs.
    pub values: WormNodeStats,
    /// Headers of nodes without children.
    pub no_children: WormNodeStats,
    /// Headers of nodes with one child.
    pub one_child: WormNodeStats,
    /// Headers of nodes with both children.
    pub two_children: WormNodeStats,
}

impl WormStatsTotal {
    fn add(&mut self, node: &StagedNode, offset_size: usize) {
        if node.has_value {
            self.values.count += 1;
            self.values.bytes += node.value_bytes.len() as u64;
        }
        let header = node.header_size(offset_size) as u64;
        let cat = if node.has_both() {
            &mut self.two_children
        } else if node.has_any_child() {
            &mut self.one_child
        } else {
            &mut self.no_children
        };
        cat.count += 1;
        cat.bytes += header;
    }

    /// Total bytes at the offset width the statistics were collected with.
    pub fn bytes(&self) -> u64 {
        self.values.bytes + self.no_children.bytes + self.one_child.bytes + self.two_children.bytes
    }

    /// Re-projects the total onto a different offset width.
    ///
    /// Only two-children headers carry an offset field, and the base
    /// header block is the same at every width, so the projection is
    /// exact.
    pub fn bytes_at_offset_size(&self, target: usize, native: usize) -> u64 {
        let baseline = self.bytes();
        if target == native {
            return baseline;
        }
        let diff = target.abs_diff(native) as u64 * self.two_children.count;
        if target < native {
            baseline - diff
        } else {
            baseline + diff
        }
    }
}

impl core::ops::AddAssign for WormStatsTotal {
    fn add_assign(&mut self, rhs: Self) {
        self.values += rhs.values;
        self.no_children += rhs.no_children;
        self.one_child += rhs.one_child;
        self.two_children += rhs.two_children;
    }
}

/// Statistics of a whole build, including the offset-gap table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WormTreeStats {
    /// Per-category totals for the entire tree.
    pub all: WormStatsTotal,
    /// For each candidate offset width `w` in `0..=8`, the longest gap (in
    /// bytes, as laid out at width `w`) that any right-child offset must
    /// span.
    pub longest_offset_gap: [u64; 9],
    /// The offset width the build ran with.
    pub offset_size: usize,
}

impl WormTreeStats {
    /// Smallest offset width in `1..=8` whose gaps all fit.
    pub fn min_bytes_for_offset(&self) -> usize {
        for width in 1..=8 {
            if self.longest_offset_gap[width] <= max_uint_for_bytes(width) {
                return width;
            }
        }
        8
    }
}

/// A written node still awaiting one or both of its children.
struct Pending<P> {
    node: StagedNode,
    path: P,
    node_written_at: usize,
    needs_child: u8,
    /// Stats of this node's chain plus everything written below it so
    /// far; projected per width, this bounds the right-child offset.
    stats_total: WormStatsTotal,
}

/// Result of writing one scaffolding chain.
struct ChainWrite {
    total: WormStatsTotal,
    chain_starts_at: usize,
    node_written_at: usize,
}

/// Builds a WORM buffer from nodes fed in pre-order.
///
/// `E` fixes the endianness of offset and value integers, `C` encodes the
/// values, and `P` is the (binary) path type of the source tree. See the
/// [module docs](self) for the protocol.
pub struct WormTreeBuilder<E: WormEndian, C: ValueCodec, P: Path> {
    codec: C,
    offset_size: usize,
    reject_empty_leaf: bool,
    started: bool,
    finished: bool,
    stats_only: bool,
    cur_size: usize,
    buffer: Vec<u8>,
    stats: WormTreeStats,
    parents: Vec<Pending<P>>,
    _marker: PhantomData<E>,
}

impl<E: WormEndian, C: ValueCodec, P: Path> WormTreeBuilder<E, C, P> {
    const BINARY: () = assert!(P::RADIX == 2, "WORM trees are binary");

    /// Creates a builder writing offsets of `offset_size` bytes and values
    /// through `codec`.
    pub fn new(offset_size: usize, codec: C) -> Result<Self> {
        #[allow(clippy::let_unit_value)]
        let _ = Self::BINARY;
        if !(1..=8).contains(&offset_size) {
            return Err(Error::BadWidth {
                what: "offset",
                width: offset_size,
            });
        }
        Ok(Self {
            codec,
            offset_size,
            reject_empty_leaf: false,
            started: false,
            finished: false,
            stats_only: false,
            cur_size: 0,
            buffer: Vec::new(),
            stats: WormTreeStats::default(),
            parents: Vec::new(),
            _marker: PhantomData,
        })
    }

    /// Rejects leaves with neither value nor children (the root is
    /// exempt). Off by default.
    pub fn reject_empty_leaves(mut self, reject: bool) -> Self {
        self.reject_empty_leaf = reject;
        self
    }

    /// Opens a build. With `stats_only` no bytes are written, only
    /// [`tree_stats`](Self::tree_stats) are collected.
    pub fn start(&mut self, stats_only: bool) -> Result<()> {
        if self.started && !self.finished {
            return Err(Error::AlreadyStarted);
        }
        self.cur_size = 0;
        self.buffer.clear();
        self.stats_only = stats_only;
        self.stats = WormTreeStats {
            offset_size: self.offset_size,
            ..WormTreeStats::default()
        };
        self.parents.clear();
        self.started = true;
        self.finished = false;
        Ok(())
    }

    /// Returns whether a build is open.
    pub fn started(&self) -> bool {
        self.started && !self.finished
    }

    /// Returns whether a build was opened and then finished.
    pub fn finished(&self) -> bool {
        self.started && self.finished
    }

    /// Adds the node at `path`. Nodes must arrive in pre-order; only nodes
    /// with a value or with both children are significant, others are
    /// accepted and ignored (the builder re-creates scaffolding itself).
    pub fn add_node(
        &mut self,
        path: &P,
        value: Option<&C::Value>,
        has_child: [bool; 2],
    ) -> Result<()> {
        if !self.started() {
            return Err(Error::NotStarted);
        }
        let is_root = path.is_empty();
        let has_both = has_child[0] && has_child[1];
        let has_any = has_child[0] || has_child[1];
        let is_empty_leaf = !has_any && value.is_none();
        let is_scaffolding = !(value.is_some() || has_both);

        if self.reject_empty_leaf && is_empty_leaf && !is_root {
            return Err(Error::EmptyLeaf);
        }

        if self.parents.is_empty() {
            if self.cur_size != 0 {
                return Err(Error::OutOfOrder {
                    reason: "no parent awaits this node",
                });
            }
            // First node in: either it is the root, or a root compatible
            // with it must be synthesized first.
            let mut root = StagedNode::default();
            if is_root {
                root.has_child = has_child;
                root.has_value = value.is_some();
                if let Some(v) = value {
                    root.value_bytes = self.encode_value(v);
                }
            } else {
                root.has_child[path.at(0) as usize] = true;
            }
            let chain = vec![root];
            let write = self.write_node_chain(&chain)?;
            self.add_written_chain(P::default(), chain, write)?;
            if is_root {
                return Ok(());
            }
        }

        // Scaffolding is quietly ignored; allowed empty leaves do land in
        // the buffer as childless headers.
        if is_scaffolding && !(is_empty_leaf && !self.reject_empty_leaf) {
            return Ok(());
        }

        let connecting = self.path_from_parent(path)?;
        let mut new_node = StagedNode {
            has_child,
            has_value: value.is_some(),
            ..StagedNode::default()
        };
        if let Some(v) = value {
            new_node.value_bytes = self.encode_value(v);
        }
        let chain = build_chain(&connecting, new_node);
        let write = self.write_node_chain(&chain)?;
        self.add_written_chain(path.clone(), chain, write)
    }

    /// Declares the tree complete. Fails while any written node still
    /// awaits a child.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        if !self.started {
            return Err(Error::NotStarted);
        }
        if !self.parents.is_empty() {
            return Err(Error::PendingChildren {
                count: self.parents.len(),
            });
        }
        if self.cur_size == 0 {
            return Err(Error::NothingWritten);
        }
        self.finished = true;
        info!(
            "WORM build finished: {} bytes, {} value(s), headers {}/{}/{} (no/one/two children){}",
            self.cur_size,
            self.stats.all.values.count,
            self.stats.all.no_children.count,
            self.stats.all.one_child.count,
            self.stats.all.two_children.count,
            if self.stats_only { " [stats only]" } else { "" },
        );
        Ok(())
    }

    /// Returns the current buffer size in bytes (also in stats-only mode,
    /// where nothing is actually written).
    pub fn size_of_buffer(&self) -> usize {
        self.cur_size
    }

    /// Returns the bytes written so far.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Moves the buffer out and resets the builder.
    pub fn extract_buffer(&mut self) -> Vec<u8> {
        self.cur_size = 0;
        self.stats_only = false;
        self.stats = WormTreeStats::default();
        self.started = false;
        self.finished = false;
        self.parents.clear();
        core::mem::take(&mut self.buffer)
    }

    /// Statistics of the tree under construction (or just finished).
    pub fn tree_stats(&self) -> &WormTreeStats {
        &self.stats
    }

    fn encode_value(&self, value: &C::Value) -> Vec<u8> {
        let mut bytes = vec![0u8; self.codec.write_size(value)];
        self.codec.write(value, &mut bytes);
        bytes
    }

    /// Digits connecting the awaiting parent to `path`, validating
    /// pre-order arrival.
    fn path_from_parent(&self, path: &P) -> Result<Vec<u8>> {
        let parent = self.parents.last().unwrap();
        if parent.path.len() >= path.len() {
            return Err(Error::OutOfOrder {
                reason: "new node path not below parent",
            });
        }
        for i in 0..parent.path.len() {
            if parent.path.at(i) != path.at(i) {
                return Err(Error::OutOfOrder {
                    reason: "new node path does not extend parent",
                });
            }
        }
        if path.at(parent.path.len()) != parent.needs_child {
            return Err(Error::OutOfOrder {
                reason: "new node descends the wrong child of parent",
            });
        }
        Ok((parent.path.len()..path.len()).map(|i| path.at(i)).collect())
    }

    /// Lays out a chain of nodes in the buffer (or just counts it).
    fn write_node_chain(&mut self, chain: &[StagedNode]) -> Result<ChainWrite> {
        let mut total = WormStatsTotal::default();
        for node in &chain[..chain.len() - 1] {
            if node.has_value || !node.has_one_child() {
                return Err(Error::OutOfOrder {
                    reason: "scaffolding chain node must be single-child and valueless",
                });
            }
            total.add(node, self.offset_size);
        }
        let last = chain.last().unwrap();
        total.add(last, self.offset_size);

        let chain_starts_at = self.cur_size;
        self.cur_size += total.bytes() as usize;
        let node_written_at = self.cur_size - last.size(self.offset_size);
        if !self.stats_only {
            self.buffer.resize(self.cur_size, 0);
            let mut at = chain_starts_at;
            for node in chain {
                at += node.write::<E>(&mut self.buffer, at, self.offset_size)?;
            }
            debug_assert_eq!(at, self.cur_size);
        }
        Ok(ChainWrite {
            total,
            chain_starts_at,
            node_written_at,
        })
    }

    /// Books a written chain: resolves the parent's pending child, records
    /// offset gaps, and pushes the new node if it awaits children itself.
    fn add_written_chain(&mut self, path: P, chain: Vec<StagedNode>, write: ChainWrite) -> Result<()> {
        let mut parent_finished = false;
        if self.parents.is_empty() {
            if !path.is_empty() {
                return Err(Error::OutOfOrder {
                    reason: "non-root node added to an empty tree",
                });
            }
        } else {
            let parent = self.parents.last().unwrap();
            if parent.node.has_both() {
                if parent.needs_child == 0 {
                    self.parents.last_mut().unwrap().needs_child = 1;
                } else {
                    // The right child just arrived: this parent's subtree
                    // span is now known for every candidate width.
                    for (width, slot) in self.stats.longest_offset_gap.iter_mut().enumerate() {
                        let gap = parent
                            .stats_total
                            .bytes_at_offset_size(width, self.offset_size);
                        if gap > *slot {
                            *slot = gap;
                        }
                    }
                    let offset = (write.chain_starts_at - parent.node_written_at) as u64;
                    if offset > max_uint_for_bytes(self.offset_size) {
                        return Err(Error::OffsetOverflow {
                            offset,
                            max: max_uint_for_bytes(self.offset_size),
                            width: self.offset_size,
                        });
                    }
                    let parent = self.parents.last_mut().unwrap();
                    parent.node.right_offset = offset;
                    if !self.stats_only {
                        parent
                            .node
                            .write::<E>(&mut self.buffer, parent.node_written_at, self.offset_size)?;
                    }
                    parent_finished = true;
                }
            } else {
                parent_finished = true;
            }
        }

        if parent_finished {
            let done = self.parents.pop().unwrap();
            debug!(
                "WORM parent complete at depth {} ({} bytes below)",
                done.path.len(),
                done.stats_total.bytes(),
            );
            if let Some(above) = self.parents.last_mut() {
                above.stats_total += done.stats_total;
            }
        }

        let last = chain.last().unwrap();
        if last.has_any_child() {
            let needs_child = if last.has_both() || last.has_child[0] {
                0
            } else {
                1
            };
            self.parents.push(Pending {
                node: chain.into_iter().next_back().unwrap(),
                path,
                node_written_at: write.node_written_at,
                needs_child,
                stats_total: write.total,
            });
        } else if let Some(above) = self.parents.last_mut() {
            // Terminal node: its stats roll straight up.
            above.stats_total += write.total;
        }
        self.stats.all += write.total;
        debug_assert_eq!(self.stats.all.bytes() as usize, self.cur_size);
        Ok(())
    }
}

/// Strings the connecting path into a scaffolding chain ending in
/// `new_node`.
///
/// The first connecting digit is carried by the parent's child slot, so
/// the walk starts at index 1; each time an edge fills, the current digit
/// becomes a child slot and a new chain node starts.
fn build_chain(connecting: &[u8], new_node: StagedNode) -> Vec<StagedNode> {
    let mut chain = vec![StagedNode::default()];
    for &digit in &connecting[1..] {
        let back = chain.last_mut().unwrap();
        if back.edge.is_full() {
            back.has_child[digit as usize] = true;
            chain.push(StagedNode::default());
        } else {
            back.edge.push(digit);
        }
    }
    let edge = chain.last().unwrap().edge.clone();
    let back = chain.last_mut().unwrap();
    *back = new_node;
    back.edge = edge;
    chain
}
