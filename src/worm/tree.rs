/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! The WORM tree object: an immutable byte buffer plus its read
//! parameters, vending cursors.

use core::marker::PhantomData;

use super::codec::{ValueCodec, WormEndian};
use super::cursor::{WormCursor, WormLookupCursor};
use crate::errors::{Error, Result};
use crate::paths::Path;

/// A built WORM tree over any byte buffer.
///
/// `B` may be an owned `Vec<u8>`, a borrowed slice, or a memory mapping;
/// anything `AsRef<[u8]>` works. The buffer is never mutated and any
/// number of cursors may read it concurrently.
pub struct WormTree<P: Path, E: WormEndian, C: ValueCodec, B: AsRef<[u8]>> {
    buffer: B,
    codec: C,
    offset_size: usize,
    _marker: PhantomData<(P, E)>,
}

impl<P: Path, E: WormEndian, C: ValueCodec, B: AsRef<[u8]>> WormTree<P, E, C, B> {
    /// Wraps `buffer` as a WORM tree read with the given offset width and
    /// value codec.
    ///
    /// The parameters must match the ones the buffer was built with; they
    /// are carried out-of-band (see
    /// [`WormTreeGeneric`](super::WormTreeGeneric)).
    pub fn new(buffer: B, offset_size: usize, codec: C) -> Result<Self> {
        if !(1..=8).contains(&offset_size) {
            return Err(Error::BadWidth {
                what: "offset",
                width: offset_size,
            });
        }
        Ok(Self {
            buffer,
            codec,
            offset_size,
            _marker: PhantomData,
        })
    }

    /// Returns a full-navigation cursor at the root.
    pub fn cursor(&self) -> WormCursor<'_, P, E, C> {
        WormCursor::new(self.buffer.as_ref(), self.offset_size, &self.codec)
    }

    /// Returns a descend-only lookup cursor at the root.
    pub fn lookup_cursor(&self) -> WormLookupCursor<'_, P, E, C> {
        WormLookupCursor::new(self.buffer.as_ref(), self.offset_size, &self.codec)
    }

    /// Returns the tree bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_ref()
    }

    /// Returns the offset width in bytes.
    pub fn offset_size(&self) -> usize {
        self.offset_size
    }

    /// Returns the value codec.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Consumes the tree, returning the buffer.
    pub fn into_buffer(self) -> B {
        self.buffer
    }
}
