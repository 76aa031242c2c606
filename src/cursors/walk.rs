/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A read-only cursor that caches one frame of node/edge state per path
//! step.

use super::{TreeCursor, ValueCursor};
use crate::paths::Path;
use crate::trees::{EdgeOps, NodeModel, ValueRef};

/// Per-step frame: the node at or above the position, how far below it the
/// position sits, and the not-yet-walked remainder of the edge down to the
/// node below (if one is in view).
struct Frame<M: NodeModel> {
    node_at_above: M::Ref,
    depth_below: usize,
    edge_to_below: M::Edge,
    node_below: M::Ref,
}

impl<M: NodeModel> Clone for Frame<M> {
    fn clone(&self) -> Self {
        Self {
            node_at_above: self.node_at_above,
            depth_below: self.depth_below,
            edge_to_below: self.edge_to_below.clone(),
            node_below: self.node_below,
        }
    }
}

/// Read-only cursor with full navigation and per-step frame caching.
///
/// Observably equivalent to [`Cursor`](super::Cursor) and usually a bit
/// faster to drive, at the price of staler state if the tree is mutated
/// while the cursor exists.
pub struct WalkCursor<'a, M: NodeModel, P: Path> {
    model: &'a M,
    frames: Vec<Frame<M>>,
    path: P,
}

impl<M: NodeModel, P: Path> Clone for WalkCursor<'_, M, P> {
    fn clone(&self) -> Self {
        Self {
            model: self.model,
            frames: self.frames.clone(),
            path: self.path.clone(),
        }
    }
}

impl<'a, M: NodeModel, P: Path> WalkCursor<'a, M, P> {
    pub(crate) fn new(model: &'a M, root: M::Ref) -> Self {
        let mut frames = Vec::with_capacity(P::MAX_DEPTH + 1);
        frames.push(Frame {
            node_at_above: root,
            depth_below: 0,
            edge_to_below: M::Edge::default(),
            node_below: M::NULL,
        });
        Self {
            model,
            frames,
            path: P::default(),
        }
    }

    #[inline(always)]
    fn back(&self) -> &Frame<M> {
        self.frames.last().unwrap()
    }

    /// Returns the number of digits between the position one digit up and
    /// the nearest node at or above it (0 at the root).
    pub fn parent_node_distance(&self) -> usize {
        if self.path.is_empty() {
            return 0;
        }
        let back = self.back();
        if back.depth_below == 0 {
            self.frames[self.frames.len() - 2].depth_below + 1
        } else {
            back.depth_below
        }
    }

    /// Moves straight to the nearest ancestor node, returning the number
    /// of digits retreated.
    pub fn go_parent_node(&mut self) -> usize {
        if self.path.is_empty() {
            return 0;
        }
        let mut steps = 0;
        if self.back().depth_below == 0 {
            self.frames.pop();
            self.path.pop();
            steps += 1;
        }
        while self.back().depth_below > 0 {
            self.frames.pop();
            self.path.pop();
            steps += 1;
        }
        steps
    }

    /// Jumps past any edge to the nearest descendant node in direction
    /// `child`, returning the path walked (empty if there is none).
    pub fn go_child_node(&mut self, child: u8) -> P {
        let mut walked = P::default();
        if !self.can_go_child_node(child) {
            return walked;
        }
        self.go_child(child);
        walked.push(child);
        while !self.at_node() {
            let step = self.back().edge_to_below.at(0);
            self.go_child(step);
            walked.push(step);
        }
        walked
    }

    /// Returns the path [`go_child_node`](Self::go_child_node) would walk.
    pub fn child_node_path(&self, child: u8) -> P {
        let mut walked = P::default();
        if !self.can_go_child_node(child) {
            return walked;
        }
        let back = self.back();
        if back.depth_below == 0 {
            walked.push(child);
            let edge = self.model.edge(self.model.child(back.node_at_above, child));
            for i in 0..edge.len() {
                walked.push(edge.at(i));
            }
        } else {
            // The remaining edge starts with `child` itself.
            for i in 0..back.edge_to_below.len() {
                walked.push(back.edge_to_below.at(i));
            }
        }
        walked
    }
}

impl<M: NodeModel, P: Path> TreeCursor for WalkCursor<'_, M, P> {
    type Path = P;

    fn path(&self) -> &P {
        &self.path
    }

    fn at_node(&self) -> bool {
        self.back().depth_below == 0
    }

    fn at_value(&self) -> bool {
        self.at_node() && self.model.has_value(self.back().node_at_above)
    }

    fn can_go_child(&self, _child: u8) -> bool {
        !self.path.is_full()
    }

    fn can_go_child_node(&self, child: u8) -> bool {
        if self.path.is_full() {
            return false;
        }
        let back = self.back();
        if back.depth_below == 0 {
            return self.model.has_child(back.node_at_above, child);
        }
        if M::is_null(back.node_below) {
            return false;
        }
        back.edge_to_below.at(0) == child
    }

    fn go_child(&mut self, child: u8) -> bool {
        debug_assert!((child as usize) < M::RADIX);
        if self.path.is_full() {
            return false;
        }
        let mut next = self.back().clone();
        if next.depth_below == 0 {
            next.node_below = self.model.child(next.node_at_above, child);
            if !M::is_null(next.node_below) {
                next.edge_to_below = self.model.edge(next.node_below);
            }
        } else if !M::is_null(next.node_below) {
            // Either we follow the edge one more digit or we leave it, at
            // which point the node below drops out of view.
            if child == next.edge_to_below.at(0) {
                next.edge_to_below.trim_front(1);
            } else {
                next.edge_to_below.clear();
                next.node_below = M::NULL;
            }
        }
        next.depth_below += 1;
        if !M::is_null(next.node_below) && next.edge_to_below.is_empty() {
            next.node_at_above = next.node_below;
            next.node_below = M::NULL;
            next.depth_below = 0;
        }
        self.frames.push(next);
        self.path.push(child);
        true
    }

    fn can_go_parent(&self) -> bool {
        !self.path.is_empty()
    }

    fn go_parent(&mut self) -> bool {
        if self.path.is_empty() {
            return false;
        }
        self.frames.pop();
        self.path.pop();
        true
    }
}

impl<M: NodeModel, P: Path> ValueCursor for WalkCursor<'_, M, P> {
    type Value = M::Value;

    fn value(&self) -> Option<ValueRef<'_, M::Value>> {
        if self.at_node() {
            self.model.value(self.back().node_at_above)
        } else {
            None
        }
    }

    fn covering_value(&self) -> Option<(ValueRef<'_, M::Value>, usize)> {
        for (i, frame) in self.frames.iter().enumerate().rev() {
            if self.model.has_value(frame.node_at_above) {
                let depth = i - frame.depth_below;
                return Some((self.model.value(frame.node_at_above).unwrap(), depth));
            }
        }
        None
    }
}
