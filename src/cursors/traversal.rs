/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Recursive traversal combinators over cursors.
//!
//! The walk functions visit every value position reachable from the
//! cursor's current position, invoking the callback with the cursor parked
//! there. Recursion depth is bounded by the maximum tree depth. Multiple
//! trees are traversed together by walking a
//! [`CompoundCursor`](super::CompoundCursor): the `*_follow` and
//! `*_follow_over` functions build one from a `(follower, leader, ...)`
//! tuple and apply the corresponding predicate mode, so the callback fires
//! at the union of the leader values (and, for follow-over, the follower's
//! too) while the follower is dragged along the same path.

use super::compound::CompoundCursor;
use super::iter::ChildOrder;
use super::TreeCursor;
use crate::paths::Path;

#[inline(always)]
fn radix<C: TreeCursor>() -> usize {
    <C::Path as Path>::RADIX
}

#[inline(always)]
fn child_at<C: TreeCursor>(order: ChildOrder, i: usize) -> u8 {
    match order {
        ChildOrder::Forward => i as u8,
        ChildOrder::Reverse => (radix::<C>() - 1 - i) as u8,
    }
}

/// Visits value positions before their subtrees.
pub fn pre_order_walk<C: TreeCursor>(
    cursor: &mut C,
    order: ChildOrder,
    mut callback: impl FnMut(&mut C),
) {
    rec_pre(cursor, order, &mut callback);
}

fn rec_pre<C: TreeCursor>(c: &mut C, order: ChildOrder, cb: &mut impl FnMut(&mut C)) {
    if c.at_value() {
        cb(c);
    }
    for i in 0..radix::<C>() {
        let child = child_at::<C>(order, i);
        if c.can_go_child_node(child) {
            c.go_child(child);
            rec_pre(c, order, cb);
            c.go_parent();
        }
    }
}

/// Visits value positions after their subtrees.
pub fn post_order_walk<C: TreeCursor>(
    cursor: &mut C,
    order: ChildOrder,
    mut callback: impl FnMut(&mut C),
) {
    rec_post(cursor, order, &mut callback);
}

fn rec_post<C: TreeCursor>(c: &mut C, order: ChildOrder, cb: &mut impl FnMut(&mut C)) {
    for i in 0..radix::<C>() {
        let child = child_at::<C>(order, i);
        if c.can_go_child_node(child) {
            c.go_child(child);
            rec_post(c, order, cb);
            c.go_parent();
        }
    }
    if c.at_value() {
        cb(c);
    }
}

/// Visits value positions between the lower and upper halves of their
/// children.
///
/// # Panics
///
/// Panics if the radix is odd.
pub fn in_order_walk<C: TreeCursor>(
    cursor: &mut C,
    order: ChildOrder,
    mut callback: impl FnMut(&mut C),
) {
    assert!(
        radix::<C>() % 2 == 0,
        "in-order traversal requires an even radix"
    );
    rec_in(cursor, order, &mut callback);
}

fn rec_in<C: TreeCursor>(c: &mut C, order: ChildOrder, cb: &mut impl FnMut(&mut C)) {
    let r = radix::<C>();
    for i in 0..r {
        let child = child_at::<C>(order, i);
        if c.can_go_child_node(child) {
            c.go_child(child);
            rec_in(c, order, cb);
            c.go_parent();
        }
        // Midpoint falls at the same loop index in both child orders.
        if i == r / 2 - 1 && c.at_value() {
            cb(c);
        }
    }
}

/// Visits value positions twice: once on descent, once on ascent.
///
/// Lets a caller push state down the tree in the pre callback and pop it
/// back up in the post callback.
pub fn pre_post_order_walk<C: TreeCursor>(
    cursor: &mut C,
    order: ChildOrder,
    mut pre: impl FnMut(&mut C),
    mut post: impl FnMut(&mut C),
) {
    rec_pre_post(cursor, order, &mut pre, &mut post);
}

fn rec_pre_post<C: TreeCursor>(
    c: &mut C,
    order: ChildOrder,
    pre: &mut impl FnMut(&mut C),
    post: &mut impl FnMut(&mut C),
) {
    if c.at_value() {
        pre(c);
    }
    for i in 0..radix::<C>() {
        let child = child_at::<C>(order, i);
        if c.can_go_child_node(child) {
            c.go_child(child);
            rec_pre_post(c, order, pre, post);
            c.go_parent();
        }
    }
    if c.at_value() {
        post(c);
    }
}

macro_rules! follow_fns {
    ($($(#[$doc:meta])* $name:ident / $(#[$odoc:meta])* $over_name:ident => $walk:ident;)*) => {$(
        $(#[$doc])*
        ///
        /// `cursors` is a `(follower, leader, ...)` tuple; the follower is
        /// driven along but ignored by every predicate.
        pub fn $name<T>(
            cursors: T,
            order: ChildOrder,
            callback: impl FnMut(&mut CompoundCursor<T>),
        ) where
            CompoundCursor<T>: TreeCursor,
        {
            let mut compound = CompoundCursor::follow(cursors);
            $walk(&mut compound, order, callback);
        }

        $(#[$odoc])*
        ///
        /// `cursors` is a `(follower, leader, ...)` tuple; the callback
        /// also fires where the follower alone has a value, but the
        /// follower never steers which children are explored.
        pub fn $over_name<T>(
            cursors: T,
            order: ChildOrder,
            callback: impl FnMut(&mut CompoundCursor<T>),
        ) where
            CompoundCursor<T>: TreeCursor,
        {
            let mut compound = CompoundCursor::follow_over(cursors);
            $walk(&mut compound, order, callback);
        }
    )*};
}

follow_fns! {
    /// Pre-order walk of the leaders with a passive follower.
    pre_order_follow /
    /// Pre-order walk of the leaders and the follower's values.
    pre_order_follow_over => pre_order_walk;
    /// Post-order walk of the leaders with a passive follower.
    post_order_follow /
    /// Post-order walk of the leaders and the follower's values.
    post_order_follow_over => post_order_walk;
    /// In-order walk of the leaders with a passive follower.
    in_order_follow /
    /// In-order walk of the leaders and the follower's values.
    in_order_follow_over => in_order_walk;
}

/// Pre/post-order walk of the leaders with a passive follower.
pub fn pre_post_order_follow<T>(
    cursors: T,
    order: ChildOrder,
    pre: impl FnMut(&mut CompoundCursor<T>),
    post: impl FnMut(&mut CompoundCursor<T>),
) where
    CompoundCursor<T>: TreeCursor,
{
    let mut compound = CompoundCursor::follow(cursors);
    pre_post_order_walk(&mut compound, order, pre, post);
}

/// Pre/post-order walk of the leaders and the follower's values.
pub fn pre_post_order_follow_over<T>(
    cursors: T,
    order: ChildOrder,
    pre: impl FnMut(&mut CompoundCursor<T>),
    post: impl FnMut(&mut CompoundCursor<T>),
) where
    CompoundCursor<T>: TreeCursor,
{
    let mut compound = CompoundCursor::follow_over(cursors);
    pre_post_order_walk(&mut compound, order, pre, post);
}
