/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Error types shared across the crate.
//!
//! Navigation predicates never fail: a cursor asked to move somewhere it
//! cannot go returns `false`, and absent values are [`None`]. Errors are
//! reserved for fallible input (string parsing, digit sequences from the
//! outside world) and for protocol violations in the WORM builder, where
//! the only recovery is to rebuild from scratch.

use thiserror::Error;

/// The error type of this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// A path operation would exceed the maximum depth.
    #[error("path is full (maximum depth {max_depth})")]
    PathFull { max_depth: usize },
    /// A digit does not fit the alphabet of the tree.
    #[error("digit {digit} out of range for radix {radix}")]
    DigitOutOfRange { digit: usize, radix: usize },
    /// A trim or pop would remove more digits than are present.
    #[error("cannot trim {trim} digits from a path of length {len}")]
    TrimOutOfRange { trim: usize, len: usize },
    /// A right-child offset does not fit the offset width chosen for a
    /// WORM tree.
    #[error("right-child offset {offset} exceeds the maximum {max} for an offset width of {width} bytes")]
    OffsetOverflow { offset: u64, max: u64, width: usize },
    /// A WORM parameter (offset or value width) is outside `1..=8`.
    #[error("WORM {what} width {width} is not in 1..=8")]
    BadWidth { what: &'static str, width: usize },

    /// A builder operation was issued before [`start`](crate::worm::WormTreeBuilder::start).
    #[error("WORM builder has not been started")]
    NotStarted,
    /// `start` was called on a builder with an unfinished tree.
    #[error("WORM builder already has a tree under construction")]
    AlreadyStarted,
    /// `finish` was called while nodes still await children.
    #[error("WORM builder cannot finish: {count} node(s) still await children")]
    PendingChildren { count: usize },
    /// A node was added out of pre-order, or under the wrong parent.
    #[error("WORM builder node out of pre-order: {reason}")]
    OutOfOrder { reason: &'static str },
    /// `finish` was called before any node was added.
    #[error("WORM builder has nothing written")]
    NothingWritten,
    /// A leaf with neither value nor children was added while rejection
    /// is configured. The root is exempt.
    #[error("empty leaf node added to WORM tree")]
    EmptyLeaf,

    /// A string could not be parsed as a path.
    #[error("cannot parse path: {0}")]
    Parse(String),
    /// Stored WORM metadata does not match the requested tree shape.
    #[error("WORM metadata mismatch: {0}")]
    MetadataMismatch(String),

    /// An underlying I/O failure while storing or loading a WORM tree.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A [`Result`](std::result::Result) with this crate's [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
