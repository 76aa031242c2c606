/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The tree object: a node model plus a root, vending cursors.

use core::marker::PhantomData;

use super::model::{NodeModel, ValueRef};
use super::simple_node::{MapNodeModel, SimpleNodeModel};
use super::word_node::{
    CompactBoolNodeModel, CompactU8NodeModel, CompactVoidNodeModel, WordNodeModel,
};
use crate::cursors::{Cursor, CursorMut, InsertCursor, LookupCursor, TreeCursor, WalkCursor};
use crate::paths::{BinaryPath, Path, SimplePath};

/// An edge-compressed radix tree over node model `M` keyed by paths `P`.
///
/// The root node always exists, as an empty branch. Dropping the tree
/// releases every reachable node with an explicit work list, so deep trees
/// do not recurse.
pub struct RadixTree<M: NodeModel, P: Path> {
    model: M,
    root: M::Ref,
    _marker: PhantomData<P>,
}

impl<M: NodeModel + Default, P: Path> Default for RadixTree<M, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: NodeModel + Default, P: Path> RadixTree<M, P> {
    /// Creates an empty tree with a default-constructed model.
    pub fn new() -> Self {
        Self::with_model(M::default())
    }
}

impl<M: NodeModel, P: Path> RadixTree<M, P> {
    const RADIX_MATCHES: () = assert!(M::RADIX == P::RADIX, "node radix and path radix mismatch");

    /// Creates an empty tree over a caller-provided model (e.g. one with
    /// pre-reserved slab capacity).
    pub fn with_model(mut model: M) -> Self {
        #[allow(clippy::let_unit_value)]
        let _ = Self::RADIX_MATCHES;
        let root = model.alloc_node();
        Self {
            model,
            root,
            _marker: PhantomData,
        }
    }

    /// Returns a read-only cursor at the root.
    pub fn cursor(&self) -> Cursor<'_, M, P> {
        Cursor::new(&self.model, self.root)
    }

    /// Returns a read-write cursor at the root. Exclusive.
    pub fn cursor_mut(&mut self) -> CursorMut<'_, M, P> {
        CursorMut::new(&mut self.model, self.root)
    }

    /// Returns a walking read-only cursor at the root.
    ///
    /// Somewhat faster than [`cursor`](Self::cursor), with weaker
    /// guarantees if reads and writes are interleaved.
    pub fn walk_cursor(&self) -> WalkCursor<'_, M, P> {
        WalkCursor::new(&self.model, self.root)
    }

    /// Returns a descend-only lookup cursor at the root.
    ///
    /// The fastest option for a single longest-prefix lookup.
    pub fn lookup_cursor(&self) -> LookupCursor<'_, M, P> {
        LookupCursor::new(&self.model, self.root)
    }

    /// Returns a descend-only inserting cursor at the root.
    ///
    /// Materializes the traced path; the fastest option for adding one
    /// value.
    pub fn insert_cursor(&mut self) -> InsertCursor<'_, M, P> {
        InsertCursor::new(&mut self.model, self.root)
    }

    /// Returns the node model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Stores `value` at `path`, materializing nodes as needed.
    pub fn insert(&mut self, path: &P, value: M::Value) {
        let mut cursor = self.insert_cursor();
        for i in 0..path.len() {
            cursor.go_child(path.at(i));
        }
        cursor.set_value(value);
    }

    /// Returns the value stored exactly at `path`, if any.
    pub fn get(&self, path: &P) -> Option<ValueRef<'_, M::Value>> {
        let mut cursor = self.lookup_cursor();
        for i in 0..path.len() {
            cursor.go_child(path.at(i));
        }
        cursor.value()
    }

    /// Returns the value of the longest stored prefix of `path` and its
    /// length.
    pub fn longest_prefix(&self, path: &P) -> Option<(ValueRef<'_, M::Value>, usize)> {
        let mut cursor = self.lookup_cursor();
        for i in 0..path.len() {
            cursor.go_child(path.at(i));
        }
        cursor.covering_value()
    }

    /// Removes and returns the value at `path`, pruning any nodes the
    /// removal leaves behind with neither value nor children.
    pub fn remove(&mut self, path: &P) -> Option<M::Value> {
        let mut cursor = self.cursor_mut();
        for i in 0..path.len() {
            if !cursor.can_go_child_node(path.at(i)) {
                return None;
            }
            cursor.go_child(path.at(i));
        }
        let value = cursor.take_value();
        while cursor.at_node() && cursor.can_remove_node() {
            cursor.remove_node();
            if cursor.go_parent_node() == 0 {
                break;
            }
        }
        value
    }

    /// Releases every node and starts over with a fresh empty root.
    pub fn clear(&mut self) {
        self.release_all();
        self.root = self.model.alloc_node();
    }

    /// Frees all reachable nodes with an explicit work list.
    fn release_all(&mut self) {
        let mut work = vec![self.root];
        while let Some(node) = work.pop() {
            for c in 0..M::RADIX {
                let child = self.model.child(node, c as u8);
                if !M::is_null(child) {
                    work.push(child);
                }
            }
            self.model.clear_value(node);
            self.model.free_node(node);
        }
    }
}

impl<M: NodeModel, P: Path> Drop for RadixTree<M, P> {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Tree with array-children slab nodes: any radix, edge capacity `E`.
pub type SimpleRadixTree<V, const R: usize, const D: usize, const E: usize> =
    RadixTree<SimpleNodeModel<V, R, E>, SimplePath<R, D>>;

/// Tree with map-children slab nodes, for large sparse radixes.
pub type MapRadixTree<V, const R: usize, const D: usize, const E: usize> =
    RadixTree<MapNodeModel<V, R, E>, SimplePath<R, D>>;

/// Binary tree with slab nodes and bit-packed paths.
pub type BinaryRadixTree<V, const D: usize> = RadixTree<SimpleNodeModel<V, 2, 16>, BinaryPath<D>>;

/// Binary tree of 4-word nodes storing one word-sized value per node.
pub type BinaryWordTree<W, const D: usize> = RadixTree<WordNodeModel<W>, BinaryPath<D>>;

/// Binary tree of 3-word nodes with an embedded 8-bit value.
pub type BinaryCompactU8Tree<W, const D: usize> =
    RadixTree<CompactU8NodeModel<W>, BinaryPath<D>>;

/// Binary tree of 3-word nodes with an embedded boolean value.
pub type BinaryCompactBoolTree<W, const D: usize> =
    RadixTree<CompactBoolNodeModel<W>, BinaryPath<D>>;

/// Binary tree of 3-word nodes storing presence only.
pub type BinaryCompactSetTree<W, const D: usize> =
    RadixTree<CompactVoidNodeModel<W>, BinaryPath<D>>;
