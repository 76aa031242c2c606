/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Binary node models packed into a few host machine words.
//!
//! Nodes are fixed-size chunks of `u32` or `u64` words in a slab; a node
//! handle is the word-typed 1-based chunk index, `0` meaning no node. Word 0
//! holds the metadata: the value-presence flag at the MSB, compact values
//! just below it, and the bit-packed inbound edge at the low end. Words 1
//! and 2 hold the left and right child handles.
//!
//! Variants:
//!
//! - [`WordNodeModel`]: 4 words, full-word value in word 3, aliasing value
//!   views;
//! - [`CompactU8NodeModel`]: 3 words, 8-bit value inside the metadata word;
//! - [`CompactBoolNodeModel`]: 3 words, 1-bit boolean value;
//! - [`CompactVoidNodeModel`]: 3 words, presence only (`Value = ()`).
//!
//! The compact variants trade edge capacity for the embedded value and
//! return value views flagged as copies.

use sealed::sealed;

use super::edge::EdgeOps;
use super::model::{NodeModel, ValueRef};
use super::word_edge::{
    Word, WordEdge32Bool, WordEdge32Flag, WordEdge32U8, WordEdge64Bool, WordEdge64Flag,
    WordEdge64U8,
};

/// A bit-packed edge that can move in and out of a host word it shares
/// with node metadata.
pub trait PackedEdge<W>: EdgeOps {
    /// Mask of the host-word bits owned by the edge.
    const EDGE_MASK: u64;
    /// Extracts the edge fields, ignoring reserved bits.
    fn from_raw(word: W) -> Self;
    /// Returns the host word with only the edge fields populated.
    fn raw(&self) -> W;
}

macro_rules! impl_packed_edge {
    ($edge:ty, $word:ty) => {
        impl PackedEdge<$word> for $edge {
            const EDGE_MASK: u64 = <$edge>::EDGE_MASK;
            #[inline(always)]
            fn from_raw(word: $word) -> Self {
                <$edge>::from_raw(word)
            }
            #[inline(always)]
            fn raw(&self) -> $word {
                <$edge>::raw(self)
            }
        }
    };
}

impl_packed_edge!(WordEdge32Flag, u32);
impl_packed_edge!(WordEdge32Bool, u32);
impl_packed_edge!(WordEdge32U8, u32);
impl_packed_edge!(WordEdge64Flag, u64);
impl_packed_edge!(WordEdge64Bool, u64);
impl_packed_edge!(WordEdge64U8, u64);

/// A host word together with the edge layouts of each node variant.
#[sealed]
pub trait NodeWord: Word {
    /// Edge layout with one reserved metadata bit.
    type FlagEdge: PackedEdge<Self>;
    /// Edge layout with two reserved metadata bits.
    type BoolEdge: PackedEdge<Self>;
    /// Edge layout with nine reserved metadata bits.
    type U8Edge: PackedEdge<Self>;
}

#[sealed]
impl NodeWord for u32 {
    type FlagEdge = WordEdge32Flag;
    type BoolEdge = WordEdge32Bool;
    type U8Edge = WordEdge32U8;
}

#[sealed]
impl NodeWord for u64 {
    type FlagEdge = WordEdge64Flag;
    type BoolEdge = WordEdge64Bool;
    type U8Edge = WordEdge64U8;
}

/// Slab of fixed-size word chunks with a free list.
///
/// Chunk handles are 1-based and word-typed so they can be stored directly
/// in the child words of other chunks.
#[derive(Clone, Debug, Default)]
pub struct WordSlab<W: Word, const CHUNK: usize> {
    words: Vec<W>,
    free: Vec<W>,
}

impl<W: Word, const CHUNK: usize> WordSlab<W, CHUNK> {
    fn new() -> Self {
        Self {
            words: Vec::new(),
            free: Vec::new(),
        }
    }

    fn alloc(&mut self) -> W {
        if let Some(r) = self.free.pop() {
            let at = Self::base(r);
            for w in &mut self.words[at..at + CHUNK] {
                *w = W::from_u64(0);
            }
            r
        } else {
            self.words
                .extend(core::iter::repeat_n(W::from_u64(0), CHUNK));
            W::from_u64((self.words.len() / CHUNK) as u64)
        }
    }

    fn free(&mut self, r: W) {
        if r.to_u64() == 0 {
            return;
        }
        self.free.push(r);
    }

    #[inline(always)]
    fn base(r: W) -> usize {
        (r.to_u64() as usize - 1) * CHUNK
    }

    #[inline(always)]
    fn word(&self, r: W, i: usize) -> W {
        self.words[Self::base(r) + i]
    }

    #[inline(always)]
    fn word_ref(&self, r: W, i: usize) -> &W {
        &self.words[Self::base(r) + i]
    }

    #[inline(always)]
    fn set_word(&mut self, r: W, i: usize, w: W) {
        self.words[Self::base(r) + i] = w;
    }

    /// Pre-allocates room for `chunks` more chunks.
    pub fn reserve(&mut self, chunks: usize) {
        self.words.reserve(chunks * CHUNK);
    }

    /// Returns the number of chunks parked on the free list.
    pub fn unused(&self) -> usize {
        self.free.len()
    }

    /// Returns the number of live chunks.
    pub fn allocated(&self) -> usize {
        self.words.len() / CHUNK - self.free.len()
    }

    /// Returns the backing word vector.
    pub fn words(&self) -> &[W] {
        &self.words
    }
}

const META: usize = 0;
const LEFT: usize = 1;
const RIGHT: usize = 2;
const VALUE: usize = 3;

macro_rules! forward_children {
    () => {
        #[inline(always)]
        fn child(&self, node: W, child: u8) -> W {
            debug_assert!(child < 2);
            self.slab.word(node, LEFT + child as usize)
        }

        fn set_child(&mut self, node: W, child: u8, new_child: W) -> W {
            debug_assert!(child < 2);
            let prev = self.slab.word(node, LEFT + child as usize);
            self.slab.set_word(node, LEFT + child as usize, new_child);
            prev
        }

        fn alloc_node(&mut self) -> W {
            self.slab.alloc()
        }

        fn free_node(&mut self, node: W) {
            self.slab.free(node);
        }

        fn edge(&self, node: W) -> Self::Edge {
            <Self::Edge as PackedEdge<W>>::from_raw(self.slab.word(node, META))
        }

        fn set_edge(&mut self, node: W, edge: Self::Edge) {
            let meta = self.slab.word(node, META).to_u64();
            let merged =
                (meta & !<Self::Edge as PackedEdge<W>>::EDGE_MASK) | edge.raw().to_u64();
            self.slab.set_word(node, META, W::from_u64(merged));
        }
    };
}

/// Four-word binary node: metadata/edge, left child, right child, value.
///
/// The value is a full host word stored at word 3, so value views alias the
/// slab (`VALUE_IS_COPY = false`).
#[derive(Clone, Debug, Default)]
pub struct WordNodeModel<W: NodeWord> {
    slab: WordSlab<W, 4>,
}

impl<W: NodeWord> WordNodeModel<W> {
    const HAS_VALUE: u64 = 1 << (W::BITS - 1);

    /// Creates an empty model.
    pub fn new() -> Self {
        Self {
            slab: WordSlab::new(),
        }
    }

    /// Returns the backing slab.
    pub fn slab(&self) -> &WordSlab<W, 4> {
        &self.slab
    }
}

impl<W: NodeWord> NodeModel for WordNodeModel<W> {
    const RADIX: usize = 2;
    const VALUE_IS_COPY: bool = false;
    type Ref = W;
    type Value = W;
    type Edge = W::FlagEdge;

    const NULL: W = W::ZERO_WORD;

    forward_children!();

    fn has_value(&self, node: W) -> bool {
        self.slab.word(node, META).to_u64() & Self::HAS_VALUE != 0
    }

    fn value(&self, node: W) -> Option<ValueRef<'_, W>> {
        if self.has_value(node) {
            Some(ValueRef::Borrowed(self.slab.word_ref(node, VALUE)))
        } else {
            None
        }
    }

    fn set_value(&mut self, node: W, value: W) {
        self.slab.set_word(node, VALUE, value);
        let meta = self.slab.word(node, META).to_u64() | Self::HAS_VALUE;
        self.slab.set_word(node, META, W::from_u64(meta));
    }

    fn clear_value(&mut self, node: W) -> Option<W> {
        if !self.has_value(node) {
            return None;
        }
        let old = self.slab.word(node, VALUE);
        self.slab.set_word(node, VALUE, W::from_u64(0));
        let meta = self.slab.word(node, META).to_u64() & !Self::HAS_VALUE;
        self.slab.set_word(node, META, W::from_u64(meta));
        Some(old)
    }
}

/// Three-word binary node with an 8-bit value inside the metadata word.
#[derive(Clone, Debug, Default)]
pub struct CompactU8NodeModel<W: NodeWord> {
    slab: WordSlab<W, 3>,
}

impl<W: NodeWord> CompactU8NodeModel<W> {
    const HAS_VALUE: u64 = 1 << (W::BITS - 1);
    const VALUE_SHIFT: u32 = W::BITS - 9;
    const VALUE_MASK: u64 = 0xff << Self::VALUE_SHIFT;

    /// Creates an empty model.
    pub fn new() -> Self {
        Self {
            slab: WordSlab::new(),
        }
    }

    /// Returns the backing slab.
    pub fn slab(&self) -> &WordSlab<W, 3> {
        &self.slab
    }
}

impl<W: NodeWord> NodeModel for CompactU8NodeModel<W> {
    const RADIX: usize = 2;
    const VALUE_IS_COPY: bool = true;
    type Ref = W;
    type Value = u8;
    type Edge = W::U8Edge;

    const NULL: W = W::ZERO_WORD;

    forward_children!();

    fn has_value(&self, node: W) -> bool {
        self.slab.word(node, META).to_u64() & Self::HAS_VALUE != 0
    }

    fn value(&self, node: W) -> Option<ValueRef<'_, u8>> {
        if self.has_value(node) {
            let meta = self.slab.word(node, META).to_u64();
            Some(ValueRef::Copied(
                ((meta & Self::VALUE_MASK) >> Self::VALUE_SHIFT) as u8,
            ))
        } else {
            None
        }
    }

    fn set_value(&mut self, node: W, value: u8) {
        let meta = self.slab.word(node, META).to_u64();
        let merged = (meta & !Self::VALUE_MASK)
            | ((value as u64) << Self::VALUE_SHIFT)
            | Self::HAS_VALUE;
        self.slab.set_word(node, META, W::from_u64(merged));
    }

    fn clear_value(&mut self, node: W) -> Option<u8> {
        if !self.has_value(node) {
            return None;
        }
        let meta = self.slab.word(node, META).to_u64();
        let old = ((meta & Self::VALUE_MASK) >> Self::VALUE_SHIFT) as u8;
        self.slab.set_word(
            node,
            META,
            W::from_u64(meta & !(Self::HAS_VALUE | Self::VALUE_MASK)),
        );
        Some(old)
    }
}

/// Three-word binary node with a 1-bit boolean value.
#[derive(Clone, Debug, Default)]
pub struct CompactBoolNodeModel<W: NodeWord> {
    slab: WordSlab<W, 3>,
}

impl<W: NodeWord> CompactBoolNodeModel<W> {
    const HAS_VALUE: u64 = 1 << (W::BITS - 1);
    const VALUE_BIT: u64 = 1 << (W::BITS - 2);

    /// Creates an empty model.
    pub fn new() -> Self {
        Self {
            slab: WordSlab::new(),
        }
    }

    /// Returns the backing slab.
    pub fn slab(&self) -> &WordSlab<W, 3> {
        &self.slab
    }
}

impl<W: NodeWord> NodeModel for CompactBoolNodeModel<W> {
    const RADIX: usize = 2;
    const VALUE_IS_COPY: bool = true;
    type Ref = W;
    type Value = bool;
    type Edge = W::BoolEdge;

    const NULL: W = W::ZERO_WORD;

    forward_children!();

    fn has_value(&self, node: W) -> bool {
        self.slab.word(node, META).to_u64() & Self::HAS_VALUE != 0
    }

    fn value(&self, node: W) -> Option<ValueRef<'_, bool>> {
        if self.has_value(node) {
            let meta = self.slab.word(node, META).to_u64();
            Some(ValueRef::Copied(meta & Self::VALUE_BIT != 0))
        } else {
            None
        }
    }

    fn set_value(&mut self, node: W, value: bool) {
        let mut meta = self.slab.word(node, META).to_u64() | Self::HAS_VALUE;
        if value {
            meta |= Self::VALUE_BIT;
        } else {
            meta &= !Self::VALUE_BIT;
        }
        self.slab.set_word(node, META, W::from_u64(meta));
    }

    fn clear_value(&mut self, node: W) -> Option<bool> {
        if !self.has_value(node) {
            return None;
        }
        let meta = self.slab.word(node, META).to_u64();
        let old = meta & Self::VALUE_BIT != 0;
        self.slab.set_word(
            node,
            META,
            W::from_u64(meta & !(Self::HAS_VALUE | Self::VALUE_BIT)),
        );
        Some(old)
    }
}

/// Three-word binary node with presence-only values (`Value = ()`).
///
/// Functions as a set of paths, e.g. a set of address blocks.
#[derive(Clone, Debug, Default)]
pub struct CompactVoidNodeModel<W: NodeWord> {
    slab: WordSlab<W, 3>,
}

impl<W: NodeWord> CompactVoidNodeModel<W> {
    const HAS_VALUE: u64 = 1 << (W::BITS - 1);

    /// Creates an empty model.
    pub fn new() -> Self {
        Self {
            slab: WordSlab::new(),
        }
    }

    /// Returns the backing slab.
    pub fn slab(&self) -> &WordSlab<W, 3> {
        &self.slab
    }
}

impl<W: NodeWord> NodeModel for CompactVoidNodeModel<W> {
    const RADIX: usize = 2;
    const VALUE_IS_COPY: bool = true;
    type Ref = W;
    type Value = ();
    type Edge = W::FlagEdge;

    const NULL: W = W::ZERO_WORD;

    forward_children!();

    fn has_value(&self, node: W) -> bool {
        self.slab.word(node, META).to_u64() & Self::HAS_VALUE != 0
    }

    fn value(&self, node: W) -> Option<ValueRef<'_, ()>> {
        if self.has_value(node) {
            Some(ValueRef::Copied(()))
        } else {
            None
        }
    }

    fn set_value(&mut self, node: W, _value: ()) {
        let meta = self.slab.word(node, META).to_u64() | Self::HAS_VALUE;
        self.slab.set_word(node, META, W::from_u64(meta));
    }

    fn clear_value(&mut self, node: W) -> Option<()> {
        if !self.has_value(node) {
            return None;
        }
        let meta = self.slab.word(node, META).to_u64() & !Self::HAS_VALUE;
        self.slab.set_word(node, META, W::from_u64(meta));
        Some(())
    }
}
