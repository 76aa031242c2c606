/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Cursors: position pointers over radix trees.
//!
//! A cursor names a position in a tree at some prefix of at most
//! `MAX_DEPTH` digits. The position does not have to coincide with a
//! materialized node: it may sit inside a compressed edge between two
//! nodes, or in empty space below the deepest node. Predicates never fail;
//! asking to move somewhere impossible returns `false` and absent values
//! are [`None`].
//!
//! Cursor families:
//!
//! - [`Cursor`]/[`CursorMut`]: full navigation, the mutating form can
//!   materialize and remove nodes;
//! - [`WalkCursor`]: read-only full navigation with more aggressive
//!   per-step caching, slightly faster, weaker guarantees under
//!   interleaved writes;
//! - [`LookupCursor`]: descend-only, memoizes the deepest value seen so
//!   longest-prefix queries are O(1) at the bottom;
//! - [`InsertCursor`]: descend-only, materializes nodes as it is driven,
//!   suited to adding one value at a path;
//! - [`CompoundCursor`]: N cursors over N trees driven in lockstep.
//!
//! The descend-only cursors intentionally do not implement [`TreeCursor`]:
//! they cannot retreat, so they cannot back general traversal.

use crate::paths::Path;
use crate::trees::ValueRef;

mod compound;
mod cursor;
mod iter;
mod lookup;
pub mod traversal;
mod walk;

pub use compound::{CompoundCursor, CompoundMode};
pub use cursor::{Cursor, CursorMut};
pub use iter::{ChildOrder, InOrderIter, PostOrderIter, PreOrderIter, StopAt};
pub use lookup::{InsertCursor, LookupCursor};
pub use walk::WalkCursor;

/// Navigation and position predicates common to every navigable cursor.
///
/// Implementing this trait asserts full navigability: [`go_parent`]
/// genuinely retreats. Descend-only cursors (the lookup and insert
/// families) must expose their one-way surface as inherent methods
/// instead of implementing this trait, so generic traversal code can
/// never drive them somewhere they cannot go.
///
/// [`go_parent`]: TreeCursor::go_parent
pub trait TreeCursor {
    /// The path type naming positions; fixes radix and maximum depth.
    type Path: Path;

    /// Returns the current position.
    fn path(&self) -> &Self::Path;
    /// Returns whether the position coincides with a materialized node.
    fn at_node(&self) -> bool;
    /// Returns whether the position is at a node that carries a value.
    fn at_value(&self) -> bool;
    /// Returns whether the cursor may descend one digit (it may unless at
    /// maximum depth; no node needs to exist below).
    fn can_go_child(&self, child: u8) -> bool;
    /// Returns whether descending in direction `child` stays on a path
    /// that leads to some materialized node.
    fn can_go_child_node(&self, child: u8) -> bool;
    /// Alias for [`can_go_child_node`](Self::can_go_child_node).
    fn has_child_node(&self, child: u8) -> bool {
        self.can_go_child_node(child)
    }
    /// Appends `child` to the position. Fails only at maximum depth.
    fn go_child(&mut self, child: u8) -> bool;
    /// Returns whether the position is below the root.
    fn can_go_parent(&self) -> bool;
    /// Retreats one digit. Fails only at the root.
    fn go_parent(&mut self) -> bool;
}

/// Typed value access for cursors over a single tree.
pub trait ValueCursor: TreeCursor {
    /// The value type stored in the tree.
    type Value;

    /// Returns a view of the value at the current position, if the cursor
    /// is at a node carrying one.
    fn value(&self) -> Option<ValueRef<'_, Self::Value>>;
    /// Returns the value of the deepest ancestor-or-self node carrying one
    /// along the current path, together with that node's depth.
    fn covering_value(&self) -> Option<(ValueRef<'_, Self::Value>, usize)>;
}
