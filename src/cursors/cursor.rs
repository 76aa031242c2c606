/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The baseline cursors: full navigation, and mutation through
//! [`CursorMut`].

use super::{TreeCursor, ValueCursor};
use crate::paths::Path;
use crate::trees::{EdgeOps, NodeModel, NodeValueMut, ValueRef};

/// A node reference together with its depth in the path (root depth 0).
#[derive(Debug, Clone, Copy)]
struct NodePos<R> {
    node: R,
    depth: usize,
}

/// Position state shared by [`Cursor`] and [`CursorMut`].
///
/// The stack holds every materialized node at or above the current
/// position. When the position is below the deepest such node,
/// `node_child` is the direction the path takes when leaving it and
/// `node_edge` collects the digits walked after that direction (up to one
/// edge's capacity, which is as far as any single edge can reach).
struct State<M: NodeModel, P> {
    stack: Vec<NodePos<M::Ref>>,
    path: P,
    node_child: Option<u8>,
    node_edge: M::Edge,
}

impl<M: NodeModel, P: Path> Clone for State<M, P> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            path: self.path.clone(),
            node_child: self.node_child,
            node_edge: self.node_edge.clone(),
        }
    }
}

impl<M: NodeModel, P: Path> core::fmt::Debug for State<M, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("State")
            .field("path", &self.path)
            .field("node_child", &self.node_child)
            .field("node_edge", &self.node_edge)
            .finish_non_exhaustive()
    }
}

impl<M: NodeModel, P: Path> State<M, P> {
    fn new(root: M::Ref) -> Self {
        let mut stack = Vec::with_capacity(P::MAX_DEPTH + 1);
        stack.push(NodePos {
            node: root,
            depth: 0,
        });
        Self {
            stack,
            path: P::default(),
            node_child: None,
            node_edge: M::Edge::default(),
        }
    }

    #[inline(always)]
    fn back(&self) -> NodePos<M::Ref> {
        *self.stack.last().unwrap()
    }

    #[inline(always)]
    fn depth_below(&self) -> usize {
        self.path.len() - self.back().depth
    }

    fn at_node(&self) -> bool {
        self.depth_below() == 0
    }

    fn at_value(&self, model: &M) -> bool {
        self.at_node() && model.has_value(self.back().node)
    }

    fn go_child(&mut self, model: &M, child: u8) -> bool {
        debug_assert!((child as usize) < M::RADIX);
        if self.path.is_full() {
            return false;
        }
        let depth_below = self.depth_below();
        if depth_below == 0 {
            // Stepping just below the back node: remember the direction
            // taken and start a fresh edge.
            self.node_child = Some(child);
            self.node_edge.clear();
        } else if !self.node_edge.is_full() {
            self.node_edge.push(child);
        }
        self.path.push(child);

        // Did this step land exactly on the node below?
        if let Some(nc) = self.node_child {
            let child_ref = model.child(self.back().node, nc);
            if !M::is_null(child_ref) {
                let child_edge = model.edge(child_ref);
                if depth_below == child_edge.len() && child_edge == self.node_edge {
                    let depth = self.back().depth + depth_below + 1;
                    self.stack.push(NodePos {
                        node: child_ref,
                        depth,
                    });
                    self.node_edge.clear();
                    self.node_child = None;
                }
            }
        }
        true
    }

    fn go_parent(&mut self, model: &M) -> bool {
        if self.path.is_empty() {
            return false;
        }
        let depth_below = self.depth_below();
        if depth_below == 0 {
            // Popping off a node: rebuild the edge tracking for the
            // position one above it under the new back node.
            let mut cur_edge = model.edge(self.back().node);
            self.stack.pop();
            let new_depth_below = (self.path.len() - 1) - self.back().depth;
            if new_depth_below == 0 {
                self.node_edge.clear();
                self.node_child = None;
            } else {
                cur_edge.pop();
                self.node_edge = cur_edge;
                self.node_child = Some(self.path.at(self.back().depth));
            }
        } else if depth_below == 1 {
            self.node_child = None;
            self.node_edge.clear();
        } else if depth_below <= self.node_edge.capacity() + 1 {
            self.node_edge.pop();
        }
        self.path.pop();
        true
    }

    /// The node reached by descending one digit in direction `child`, if
    /// that digit stays on a path leading to a materialized node.
    fn child_node(&self, model: &M, child: u8) -> M::Ref {
        let depth_below = self.depth_below();
        let back = self.back().node;
        if depth_below == 0 {
            return model.child(back, child);
        }
        let child_ref = match self.node_child {
            Some(nc) => model.child(back, nc),
            None => M::NULL,
        };
        if M::is_null(child_ref) {
            return M::NULL;
        }
        let node_edge = model.edge(child_ref);
        if depth_below > node_edge.len() {
            return M::NULL;
        }
        let mut walked = self.node_edge.clone();
        walked.push(child);
        if walked.covered_by(&node_edge) {
            child_ref
        } else {
            M::NULL
        }
    }

    /// The longest prefix of the edge below the back node matched by the
    /// digits already walked.
    fn edge_match(&self, model: &M) -> M::Edge {
        if self.depth_below() < 2 {
            return M::Edge::default();
        }
        let edge_node = match self.node_child {
            Some(nc) => model.child(self.back().node, nc),
            None => M::NULL,
        };
        if M::is_null(edge_node) {
            return M::Edge::default();
        }
        let mut matched = self.node_edge.clone();
        let len = matched.matching(&model.edge(edge_node));
        matched.trim_back(matched.len() - len);
        matched
    }

    fn parent_node_distance(&self) -> usize {
        if self.path.is_empty() {
            return 0;
        }
        let depth_below = self.depth_below();
        if depth_below == 0 {
            self.path.len() - self.stack[self.stack.len() - 2].depth
        } else {
            depth_below
        }
    }

    fn go_parent_node(&mut self) -> usize {
        if self.path.is_empty() {
            return 0;
        }
        let mut depth_below = self.depth_below();
        if depth_below == 0 {
            self.stack.pop();
            depth_below = self.path.len() - self.back().depth;
        }
        self.path.trim_back(depth_below);
        self.node_child = None;
        self.node_edge.clear();
        depth_below
    }

    fn go_child_node(&mut self, model: &M, child: u8) -> P {
        let child_ref = self.child_node(model, child);
        let mut walked = P::default();
        if M::is_null(child_ref) {
            return walked;
        }
        let ext = model.edge(child_ref);
        let depth_below = self.depth_below();
        let depth = self.back().depth + ext.len() + 1;
        self.stack.push(NodePos {
            node: child_ref,
            depth,
        });
        self.node_edge.clear();
        self.node_child = None;
        let ext_start = if depth_below == 0 {
            self.path.push(child);
            walked.push(child);
            0
        } else {
            depth_below - 1
        };
        for i in ext_start..ext.len() {
            self.path.push(ext.at(i));
            walked.push(ext.at(i));
        }
        walked
    }

    fn child_node_path(&self, model: &M, child: u8) -> P {
        let child_ref = self.child_node(model, child);
        let mut walked = P::default();
        if M::is_null(child_ref) {
            return walked;
        }
        let ext = model.edge(child_ref);
        let depth_below = self.depth_below();
        let ext_start = if depth_below == 0 {
            walked.push(child);
            0
        } else {
            depth_below - 1
        };
        for i in ext_start..ext.len() {
            walked.push(ext.at(i));
        }
        walked
    }

    /// Deepest node at or above the position that carries a value.
    fn covering(&self, model: &M) -> Option<(M::Ref, usize)> {
        self.stack
            .iter()
            .rev()
            .find(|pos| model.has_value(pos.node))
            .map(|pos| (pos.node, pos.depth))
    }
}

/// Read-only cursor with full navigation.
///
/// Safe to use concurrently with other read-only cursors on the same
/// tree; a writer excludes all other cursors.
pub struct Cursor<'a, M: NodeModel, P: Path> {
    model: &'a M,
    state: State<M, P>,
}

impl<M: NodeModel, P: Path> Clone for Cursor<'_, M, P> {
    fn clone(&self) -> Self {
        Self {
            model: self.model,
            state: self.state.clone(),
        }
    }
}

impl<M: NodeModel, P: Path> core::fmt::Debug for Cursor<'_, M, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cursor").field("state", &self.state).finish()
    }
}

impl<'a, M: NodeModel, P: Path> Cursor<'a, M, P> {
    pub(crate) fn new(model: &'a M, root: M::Ref) -> Self {
        Self {
            model,
            state: State::new(root),
        }
    }

    /// Returns the number of `go_parent` steps to the nearest node at or
    /// above the position one digit up (0 at the root).
    pub fn parent_node_distance(&self) -> usize {
        self.state.parent_node_distance()
    }

    /// Moves straight to the nearest ancestor node, returning the number
    /// of digits retreated.
    pub fn go_parent_node(&mut self) -> usize {
        self.state.go_parent_node()
    }

    /// Jumps past any edge to the nearest descendant node in direction
    /// `child`, returning the path walked (empty if there is none).
    pub fn go_child_node(&mut self, child: u8) -> P {
        self.state.go_child_node(self.model, child)
    }

    /// Returns the path [`go_child_node`](Self::go_child_node) would walk.
    pub fn child_node_path(&self, child: u8) -> P {
        self.state.child_node_path(self.model, child)
    }
}

impl<M: NodeModel, P: Path> TreeCursor for Cursor<'_, M, P> {
    type Path = P;

    fn path(&self) -> &P {
        &self.state.path
    }

    fn at_node(&self) -> bool {
        self.state.at_node()
    }

    fn at_value(&self) -> bool {
        self.state.at_value(self.model)
    }

    fn can_go_child(&self, _child: u8) -> bool {
        !self.state.path.is_full()
    }

    fn can_go_child_node(&self, child: u8) -> bool {
        !M::is_null(self.state.child_node(self.model, child))
    }

    fn go_child(&mut self, child: u8) -> bool {
        self.state.go_child(self.model, child)
    }

    fn can_go_parent(&self) -> bool {
        !self.state.path.is_empty()
    }

    fn go_parent(&mut self) -> bool {
        self.state.go_parent(self.model)
    }
}

impl<M: NodeModel, P: Path> ValueCursor for Cursor<'_, M, P> {
    type Value = M::Value;

    fn value(&self) -> Option<ValueRef<'_, M::Value>> {
        if self.state.at_node() {
            self.model.value(self.state.back().node)
        } else {
            None
        }
    }

    fn covering_value(&self) -> Option<(ValueRef<'_, M::Value>, usize)> {
        self.state
            .covering(self.model)
            .map(|(node, depth)| (self.model.value(node).unwrap(), depth))
    }
}

/// Read-write cursor: everything [`Cursor`] does, plus node
/// materialization, removal, and value mutation.
///
/// Holding one excludes every other cursor on the tree.
pub struct CursorMut<'a, M: NodeModel, P: Path> {
    model: &'a mut M,
    state: State<M, P>,
}

impl<M: NodeModel, P: Path> core::fmt::Debug for CursorMut<'_, M, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CursorMut")
            .field("state", &self.state)
            .finish()
    }
}

impl<'a, M: NodeModel, P: Path> CursorMut<'a, M, P> {
    pub(crate) fn new(model: &'a mut M, root: M::Ref) -> Self {
        Self {
            model,
            state: State::new(root),
        }
    }

    /// See [`Cursor::parent_node_distance`].
    pub fn parent_node_distance(&self) -> usize {
        self.state.parent_node_distance()
    }

    /// See [`Cursor::go_parent_node`].
    pub fn go_parent_node(&mut self) -> usize {
        self.state.go_parent_node()
    }

    /// See [`Cursor::go_child_node`].
    pub fn go_child_node(&mut self, child: u8) -> P {
        self.state.go_child_node(self.model, child)
    }

    /// See [`Cursor::child_node_path`].
    pub fn child_node_path(&self, child: u8) -> P {
        self.state.child_node_path(self.model, child)
    }

    /// Materializes a node at the current position and returns a mutable
    /// handle on its value slot.
    ///
    /// Idempotent when already at a node. When the position lies inside an
    /// existing edge the edge is split: a branch node takes over the
    /// matched prefix, the displaced child keeps the rest (minus its new
    /// branching digit), and single-child scaffolding nodes extend the
    /// chain when the position is deeper than one edge can span.
    pub fn add_node(&mut self) -> NodeValueMut<'_, M> {
        let depth_below = self.state.depth_below();
        if depth_below == 0 {
            let node = self.state.back().node;
            return NodeValueMut::new(self.model, node);
        }

        // A branch node replaces whatever child slot the path leaves the
        // covering node through.
        let branch = self.model.alloc_node();
        let ext_match = self.state.edge_match(self.model);
        let back_pos = self.state.back();
        let prev_child_index = self.state.path.at(back_pos.depth);
        let prev_child = self
            .model
            .set_child(back_pos.node, prev_child_index, branch);
        if !M::is_null(prev_child) {
            // The displaced child must have an edge, otherwise it would be
            // the covering node. Its first unmatched digit becomes the
            // branch's child slot for it.
            let mut prev_edge = self.model.edge(prev_child);
            let branch_digit = prev_edge.at(ext_match.len());
            self.model.set_child(branch, branch_digit, prev_child);
            prev_edge.trim_front(ext_match.len() + 1);
            self.model.set_edge(prev_child, prev_edge);
            self.model.set_edge(branch, ext_match.clone());
        }

        let branch_depth = back_pos.depth + 1 + ext_match.len();
        self.state.stack.push(NodePos {
            node: branch,
            depth: branch_depth,
        });

        // Reconcile any remaining distance between the branch node and the
        // cursor position with edge digits, adding scaffolding nodes
        // whenever an edge fills up.
        if branch_depth < self.state.path.len() {
            let mut child = branch;
            let mut reached = branch_depth;
            let has_children = (0..M::RADIX).any(|c| self.model.has_child(branch, c as u8));
            if has_children {
                child = self.model.alloc_node();
                let step = self.state.path.at(reached);
                self.model.set_child(branch, step, child);
                reached += 1;
                self.state.stack.push(NodePos {
                    node: child,
                    depth: reached,
                });
            }
            while reached < self.state.path.len() {
                let step = self.state.path.at(reached);
                let mut edge = self.model.edge(child);
                if edge.is_full() {
                    let next = self.model.alloc_node();
                    self.model.set_child(child, step, next);
                    reached += 1;
                    self.state.stack.push(NodePos {
                        node: next,
                        depth: reached,
                    });
                    child = next;
                } else {
                    edge.push(step);
                    self.model.set_edge(child, edge);
                    reached += 1;
                    self.state.stack.last_mut().unwrap().depth = reached;
                }
            }
        }

        self.state.node_edge.clear();
        self.state.node_child = None;
        let node = self.state.back().node;
        NodeValueMut::new(self.model, node)
    }

    /// Removes the node at the current position if it has no value and no
    /// children. The cursor stays at the same position, now off-node.
    ///
    /// Returns `true` when no node remains at the position afterwards
    /// (including when there was none to begin with). The root cannot be
    /// removed.
    pub fn remove_node(&mut self) -> bool {
        if !self.state.at_node() {
            return true;
        }
        if !self.can_remove_node() {
            return false;
        }
        let removed = self.state.stack.pop().unwrap().node;
        let back_pos = self.state.back();
        let prev_child_index = self.state.path.at(back_pos.depth);
        let detached = self.model.detach_child(back_pos.node, prev_child_index);
        debug_assert_eq!(detached, removed);
        // The removed node's edge becomes the tracked edge for our
        // now-off-node position.
        self.state.node_edge = self.model.edge(removed);
        self.state.node_child = Some(prev_child_index);
        self.model.free_node(removed);
        true
    }

    /// Returns whether [`remove_node`](Self::remove_node) would succeed.
    pub fn can_remove_node(&self) -> bool {
        if !self.state.at_node() {
            return true;
        }
        if self.state.at_value(self.model) {
            return false;
        }
        if self.state.stack.len() <= 1 {
            return false;
        }
        (0..M::RADIX).all(|c| M::is_null(self.state.child_node(self.model, c as u8)))
    }

    /// Returns a mutable value handle if the cursor is at a node.
    pub fn node_value(&mut self) -> Option<NodeValueMut<'_, M>> {
        if self.state.at_node() {
            let node = self.state.back().node;
            Some(NodeValueMut::new(self.model, node))
        } else {
            None
        }
    }

    /// Stores a value at the current node.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is not at a node; use
    /// [`add_node`](Self::add_node) to materialize one first.
    pub fn set_value(&mut self, value: M::Value) {
        assert!(self.state.at_node(), "set_value off-node");
        let node = self.state.back().node;
        self.model.set_value(node, value);
    }

    /// Removes any value at the current position. Returns whether one was
    /// removed. The node itself stays.
    pub fn clear_value(&mut self) -> bool {
        if !self.state.at_value(self.model) {
            return false;
        }
        let node = self.state.back().node;
        self.model.clear_value(node).is_some()
    }

    /// Moves the value out of the current node, if any.
    pub fn take_value(&mut self) -> Option<M::Value> {
        if !self.state.at_node() {
            return None;
        }
        let node = self.state.back().node;
        self.model.clear_value(node)
    }
}

impl<M: NodeModel, P: Path> TreeCursor for CursorMut<'_, M, P> {
    type Path = P;

    fn path(&self) -> &P {
        &self.state.path
    }

    fn at_node(&self) -> bool {
        self.state.at_node()
    }

    fn at_value(&self) -> bool {
        self.state.at_value(self.model)
    }

    fn can_go_child(&self, _child: u8) -> bool {
        !self.state.path.is_full()
    }

    fn can_go_child_node(&self, child: u8) -> bool {
        !M::is_null(self.state.child_node(self.model, child))
    }

    fn go_child(&mut self, child: u8) -> bool {
        self.state.go_child(self.model, child)
    }

    fn can_go_parent(&self) -> bool {
        !self.state.path.is_empty()
    }

    fn go_parent(&mut self) -> bool {
        self.state.go_parent(self.model)
    }
}

impl<M: NodeModel, P: Path> ValueCursor for CursorMut<'_, M, P> {
    type Value = M::Value;

    fn value(&self) -> Option<ValueRef<'_, M::Value>> {
        if self.state.at_node() {
            self.model.value(self.state.back().node)
        } else {
            None
        }
    }

    fn covering_value(&self) -> Option<(ValueRef<'_, M::Value>, usize)> {
        self.state
            .covering(self.model)
            .map(|(node, depth)| (self.model.value(node).unwrap(), depth))
    }
}
