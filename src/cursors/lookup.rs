/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Descend-only cursors.
//!
//! These keep only a single node-and-edge state instead of a stack, which
//! makes them markedly cheaper to drive than the full cursors. The price
//! is that they can never move back up, so they do not implement
//! [`TreeCursor`](super::TreeCursor): a longest-prefix lookup or a single
//! insertion is a one-way trip.

use crate::paths::Path;
use crate::trees::{EdgeOps, NodeModel, NodeValueMut, ValueRef};

/// Read-only descend-only cursor.
///
/// Memoizes the deepest value seen on the way down, so
/// [`covering_value`](Self::covering_value) is O(1) wherever the cursor
/// stops. The cursor of choice for longest-prefix lookups.
pub struct LookupCursor<'a, M: NodeModel, P: Path> {
    model: &'a M,
    node_at_above: M::Ref,
    depth_below: usize,
    edge_to_below: M::Edge,
    node_below: M::Ref,
    covering: Option<(M::Ref, usize)>,
    path: P,
}

impl<'a, M: NodeModel, P: Path> LookupCursor<'a, M, P> {
    pub(crate) fn new(model: &'a M, root: M::Ref) -> Self {
        let covering = model.has_value(root).then_some((root, 0));
        Self {
            model,
            node_at_above: root,
            depth_below: 0,
            edge_to_below: M::Edge::default(),
            node_below: M::NULL,
            covering,
            path: P::default(),
        }
    }

    /// Returns the current position.
    pub fn path(&self) -> &P {
        &self.path
    }

    /// Returns whether the position coincides with a materialized node.
    pub fn at_node(&self) -> bool {
        self.depth_below == 0
    }

    /// Returns whether the position is at a node carrying a value.
    pub fn at_value(&self) -> bool {
        self.at_node() && self.model.has_value(self.node_at_above)
    }

    /// Returns whether the cursor may descend one digit.
    pub fn can_go_child(&self, _child: u8) -> bool {
        !self.path.is_full()
    }

    /// Returns whether direction `child` stays on a path leading to a
    /// materialized node.
    pub fn can_go_child_node(&self, child: u8) -> bool {
        if self.path.is_full() {
            return false;
        }
        if self.depth_below == 0 {
            return self.model.has_child(self.node_at_above, child);
        }
        if M::is_null(self.node_below) {
            return false;
        }
        self.edge_to_below.at(0) == child
    }

    /// Alias for [`can_go_child_node`](Self::can_go_child_node).
    pub fn has_child_node(&self, child: u8) -> bool {
        self.can_go_child_node(child)
    }

    /// Descends one digit. Fails only at maximum depth.
    pub fn go_child(&mut self, child: u8) -> bool {
        debug_assert!((child as usize) < M::RADIX);
        if self.path.is_full() {
            return false;
        }
        if self.depth_below == 0 {
            self.node_below = self.model.child(self.node_at_above, child);
            if !M::is_null(self.node_below) {
                self.edge_to_below = self.model.edge(self.node_below);
            }
        } else if !M::is_null(self.node_below) {
            if child == self.edge_to_below.at(0) {
                self.edge_to_below.trim_front(1);
            } else {
                // Left the edge; the node below drops out of view for good.
                self.edge_to_below.clear();
                self.node_below = M::NULL;
            }
        }
        self.depth_below += 1;
        if !M::is_null(self.node_below) && self.edge_to_below.is_empty() {
            self.node_at_above = self.node_below;
            self.node_below = M::NULL;
            self.depth_below = 0;
            self.path.push(child);
            if self.model.has_value(self.node_at_above) {
                self.covering = Some((self.node_at_above, self.path.len()));
            }
            return true;
        }
        self.path.push(child);
        true
    }

    /// Returns a view of the value at the current position, if any.
    pub fn value(&self) -> Option<ValueRef<'a, M::Value>> {
        if self.at_node() {
            self.model.value(self.node_at_above)
        } else {
            None
        }
    }

    /// Returns the deepest value seen along the descent and its depth.
    pub fn covering_value(&self) -> Option<(ValueRef<'a, M::Value>, usize)> {
        self.covering
            .map(|(node, depth)| (self.model.value(node).unwrap(), depth))
    }
}

/// Write-only descend-only cursor that materializes nodes as it is driven.
///
/// The path traced with [`go_child`](Self::go_child) is created in the
/// tree on the way down, so writing a single value at a known path needs
/// no backtracking state at all.
pub struct InsertCursor<'a, M: NodeModel, P: Path> {
    model: &'a mut M,
    node_at_above: M::Ref,
    depth_below: usize,
    child_from_above: Option<u8>,
    edge_from_above: M::Edge,
    edge_to_below: M::Edge,
    node_below: M::Ref,
    path: P,
}

impl<'a, M: NodeModel, P: Path> InsertCursor<'a, M, P> {
    pub(crate) fn new(model: &'a mut M, root: M::Ref) -> Self {
        Self {
            model,
            node_at_above: root,
            depth_below: 0,
            child_from_above: None,
            edge_from_above: M::Edge::default(),
            edge_to_below: M::Edge::default(),
            node_below: M::NULL,
            path: P::default(),
        }
    }

    /// Returns the current position.
    pub fn path(&self) -> &P {
        &self.path
    }

    /// Returns whether the position coincides with a materialized node.
    pub fn at_node(&self) -> bool {
        self.depth_below == 0
    }

    /// Returns whether the position is at a node carrying a value.
    pub fn at_value(&self) -> bool {
        self.at_node() && self.model.has_value(self.node_at_above)
    }

    /// Returns whether the cursor may descend one digit.
    pub fn can_go_child(&self, _child: u8) -> bool {
        !self.path.is_full()
    }

    /// Returns whether direction `child` stays on a path leading to a
    /// materialized node.
    pub fn can_go_child_node(&self, child: u8) -> bool {
        if self.path.is_full() {
            return false;
        }
        if self.depth_below == 0 {
            return self.model.has_child(self.node_at_above, child);
        }
        if M::is_null(self.node_below) {
            return false;
        }
        self.edge_to_below.at(0) == child
    }

    /// Descends one digit, materializing nodes as required. Fails only at
    /// maximum depth.
    pub fn go_child(&mut self, child: u8) -> bool {
        debug_assert!((child as usize) < M::RADIX);
        if self.path.is_full() {
            return false;
        }
        let mut at_node = self.depth_below == 0;
        let mut in_edge = !M::is_null(self.node_below);
        let running_free = !in_edge && !at_node;

        // Filling the tracking edge, or breaking out of the edge we are
        // descending: pin a node here first.
        if (running_free && self.edge_from_above.is_full())
            || (in_edge && child != self.edge_to_below.at(0))
        {
            self.add_node();
            at_node = true;
            in_edge = false;
        }

        if in_edge {
            self.edge_from_above.push(child);
            self.edge_to_below.trim_front(1);
            if self.edge_to_below.is_empty() {
                // Arrived at the node below.
                self.node_at_above = self.node_below;
                self.node_below = M::NULL;
                self.edge_from_above.clear();
                self.depth_below = 0;
                self.child_from_above = None;
            } else {
                self.depth_below += 1;
            }
        } else if at_node {
            self.child_from_above = Some(child);
            let child_ref = self.model.child(self.node_at_above, child);
            if !M::is_null(child_ref) {
                self.edge_to_below = self.model.edge(child_ref);
                if self.edge_to_below.is_empty() {
                    self.node_at_above = child_ref;
                    self.edge_from_above.clear();
                    self.node_below = M::NULL;
                    self.depth_below = 0;
                    self.child_from_above = None;
                } else {
                    self.node_below = child_ref;
                    self.depth_below = 1;
                }
            } else {
                self.depth_below = 1;
            }
        } else {
            // Running free below the deepest node.
            self.edge_from_above.push(child);
            self.depth_below += 1;
        }
        self.path.push(child);
        true
    }

    /// Materializes a node at the current position, splitting the edge
    /// below if the position sits inside one.
    pub fn add_node(&mut self) -> NodeValueMut<'_, M> {
        if self.depth_below == 0 {
            return NodeValueMut::new(self.model, self.node_at_above);
        }
        let new_node = self.model.alloc_node();
        self.model.set_edge(new_node, self.edge_from_above.clone());
        self.model
            .set_child(self.node_at_above, self.child_from_above.unwrap(), new_node);
        if !M::is_null(self.node_below) {
            // Split: the first remaining edge digit becomes the new node's
            // child slot for the node below; the rest stays its edge.
            self.model
                .set_child(new_node, self.edge_to_below.at(0), self.node_below);
            let mut below_edge = self.model.edge(self.node_below);
            below_edge.trim_front(self.depth_below);
            self.model.set_edge(self.node_below, below_edge);
        }
        self.node_at_above = new_node;
        self.node_below = M::NULL;
        self.depth_below = 0;
        self.child_from_above = None;
        self.edge_from_above.clear();
        self.edge_to_below.clear();
        NodeValueMut::new(self.model, new_node)
    }

    /// Materializes a node at the current position and stores `value` in
    /// it.
    pub fn set_value(&mut self, value: M::Value) {
        self.add_node().set(value);
    }

    /// Returns a view of the value at the current position, if any.
    pub fn value(&self) -> Option<ValueRef<'_, M::Value>> {
        if self.at_node() {
            self.model.value(self.node_at_above)
        } else {
            None
        }
    }
}
