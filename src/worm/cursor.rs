/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Cursors over a WORM byte buffer.
//!
//! Node positions are byte offsets into the buffer; right children are
//! resolved through the header offset field on demand. Values are decoded
//! on access, so value views are always copies
//! ([`ValueRef::Copied`](crate::trees::ValueRef)).

use core::marker::PhantomData;

use super::codec::{ValueCodec, WormEndian};
use super::header::{EdgeBits, NodeView};
use crate::cursors::{TreeCursor, ValueCursor};
use crate::paths::Path;
use crate::trees::ValueRef;

/// Per-step frame mirroring the in-memory walk cursor: nearest node at or
/// above, distance below it, the unconsumed remainder of the edge to the
/// node below, and that node's offset.
#[derive(Debug, Clone, Copy)]
struct Frame {
    node_at_above: usize,
    depth_below: usize,
    edge: EdgeBits,
    node_below: Option<usize>,
}

/// Read-only WORM cursor with full navigation.
pub struct WormCursor<'a, P: Path, E: WormEndian, C: ValueCodec> {
    buf: &'a [u8],
    codec: &'a C,
    offset_size: usize,
    frames: Vec<Frame>,
    path: P,
    _marker: PhantomData<E>,
}

impl<P: Path, E: WormEndian, C: ValueCodec> Clone for WormCursor<'_, P, E, C> {
    fn clone(&self) -> Self {
        Self {
            buf: self.buf,
            codec: self.codec,
            offset_size: self.offset_size,
            frames: self.frames.clone(),
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<'a, P: Path, E: WormEndian, C: ValueCodec> WormCursor<'a, P, E, C> {
    pub(crate) fn new(buf: &'a [u8], offset_size: usize, codec: &'a C) -> Self {
        let mut frames = Vec::with_capacity(P::MAX_DEPTH + 1);
        frames.push(Frame {
            node_at_above: 0,
            depth_below: 0,
            edge: EdgeBits::default(),
            node_below: None,
        });
        Self {
            buf,
            codec,
            offset_size,
            frames,
            path: P::default(),
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    fn back(&self) -> &Frame {
        self.frames.last().unwrap()
    }

    #[inline(always)]
    fn view(&self, at: usize) -> NodeView<'a> {
        NodeView::new(self.buf, at, self.offset_size)
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
            let step = self.back().edge.first();
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
            let below = self.view(back.node_at_above).child::<E, C>(self.codec, child);
            let mut edge = self.view(below.unwrap()).edge();
            while !edge.is_empty() {
                walked.push(edge.first());
                edge.advance();
            }
        } else {
            let mut edge = back.edge;
            while !edge.is_empty() {
                walked.push(edge.first());
                edge.advance();
            }
        }
        walked
    }
}

impl<P: Path, E: WormEndian, C: ValueCodec> TreeCursor for WormCursor<'_, P, E, C> {
    type Path = P;

    fn path(&self) -> &P {
        &self.path
    }

    fn at_node(&self) -> bool {
        self.back().depth_below == 0
    }

    fn at_value(&self) -> bool {
        self.at_node() && self.view(self.back().node_at_above).has_value()
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
            return self.view(back.node_at_above).has_child(child);
        }
        match back.node_below {
            Some(_) => back.edge.first() == child,
            None => false,
        }
    }

    fn go_child(&mut self, child: u8) -> bool {
        debug_assert!(child < 2);
        if self.path.is_full() {
            return false;
        }
        let mut next = *self.back();
        if next.depth_below == 0 {
            next.node_below = self.view(next.node_at_above).child::<E, C>(self.codec, child);
            if let Some(below) = next.node_below {
                next.edge = self.view(below).edge();
            }
        } else if next.node_below.is_some() {
            if child == next.edge.first() {
                next.edge.advance();
            } else {
                next.edge.clear();
                next.node_below = None;
            }
        }
        next.depth_below += 1;
        if let Some(below) = next.node_below {
            if next.edge.is_empty() {
                next.node_at_above = below;
                next.node_below = None;
                next.depth_below = 0;
            }
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

impl<P: Path, E: WormEndian, C: ValueCodec> ValueCursor for WormCursor<'_, P, E, C> {
    type Value = C::Value;

    fn value(&self) -> Option<ValueRef<'_, C::Value>> {
        if !self.at_node() {
            return None;
        }
        let view = self.view(self.back().node_at_above);
        view.has_value()
            .then(|| ValueRef::Copied(self.codec.read(&self.buf[view.value_at()..])))
    }

    fn covering_value(&self) -> Option<(ValueRef<'_, C::Value>, usize)> {
        for (i, frame) in self.frames.iter().enumerate().rev() {
            let view = self.view(frame.node_at_above);
            if view.has_value() {
                let depth = i - frame.depth_below;
                let value = self.codec.read(&self.buf[view.value_at()..]);
                return Some((ValueRef::Copied(value), depth));
            }
        }
        None
    }
}

/// Descend-only WORM cursor with a memoized covering value.
///
/// The WORM equivalent of [`LookupCursor`](crate::cursors::LookupCursor):
/// one-way down, O(1) longest-prefix answer at the bottom.
pub struct WormLookupCursor<'a, P: Path, E: WormEndian, C: ValueCodec> {
    buf: &'a [u8],
    codec: &'a C,
    offset_size: usize,
    node_at_above: usize,
    depth_below: usize,
    edge: EdgeBits,
    node_below: Option<usize>,
    covering: Option<(usize, usize)>,
    path: P,
    _marker: PhantomData<E>,
}

impl<'a, P: Path, E: WormEndian, C: ValueCodec> WormLookupCursor<'a, P, E, C> {
    pub(crate) fn new(buf: &'a [u8], offset_size: usize, codec: &'a C) -> Self {
        let covering = NodeView::new(buf, 0, offset_size)
            .has_value()
            .then_some((0, 0));
        Self {
            buf,
            codec,
            offset_size,
            node_at_above: 0,
            depth_below: 0,
            edge: EdgeBits::default(),
            node_below: None,
            covering,
            path: P::default(),
            _marker: PhantomData,
        }
    }

    #[inline(always)]
    fn view(&self, at: usize) -> NodeView<'a> {
        NodeView::new(self.buf, at, self.offset_size)
    }

    /// Returns the current position.
    pub fn path(&self) -> &P {
        &self.path
    }

    /// Returns whether the position coincides with a node.
    pub fn at_node(&self) -> bool {
        self.depth_below == 0
    }

    /// Returns whether the position is at a node carrying a value.
    pub fn at_value(&self) -> bool {
        self.at_node() && self.view(self.node_at_above).has_value()
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
            return self.view(self.node_at_above).has_child(child);
        }
        match self.node_below {
            Some(_) => self.edge.first() == child,
            None => false,
        }
    }

    /// Descends one digit. Fails only at maximum depth.
    pub fn go_child(&mut self, child: u8) -> bool {
        debug_assert!(child < 2);
        if self.path.is_full() {
            return false;
        }
        if self.depth_below == 0 {
            self.node_below = self.view(self.node_at_above).child::<E, C>(self.codec, child);
            if let Some(below) = self.node_below {
                self.edge = self.view(below).edge();
            }
        } else if self.node_below.is_some() {
            if child == self.edge.first() {
                self.edge.advance();
            } else {
                self.edge.clear();
                self.node_below = None;
            }
        }
        self.depth_below += 1;
        self.path.push(child);
        if let Some(below) = self.node_below {
            if self.edge.is_empty() {
                self.node_at_above = below;
                self.node_below = None;
                self.depth_below = 0;
                if self.view(below).has_value() {
                    self.covering = Some((below, self.path.len()));
                }
            }
        }
        true
    }

    /// Returns a copy of the value at the current position, if any.
    pub fn value(&self) -> Option<ValueRef<'_, C::Value>> {
        if !self.at_node() {
            return None;
        }
        let view = self.view(self.node_at_above);
        view.has_value()
            .then(|| ValueRef::Copied(self.codec.read(&self.buf[view.value_at()..])))
    }

    /// Returns the deepest value seen along the descent and its depth.
    pub fn covering_value(&self) -> Option<(ValueRef<'_, C::Value>, usize)> {
        self.covering.map(|(node, depth)| {
            let view = self.view(node);
            (
                ValueRef::Copied(self.codec.read(&self.buf[view.value_at()..])),
                depth,
            )
        })
    }
}
