/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
#![deny(unstable_features)]
#![deny(trivial_casts)]
#![deny(unconditional_recursion)]
#![deny(clippy::empty_loop)]
#![deny(unreachable_code)]
#![deny(unreachable_pub)]
#![deny(unreachable_patterns)]
#![deny(unused_macro_rules)]
#![deny(unused_doc_comments)]
#![allow(clippy::type_complexity)]

pub mod cursors;
pub mod errors;
pub mod paths;
pub mod trees;
pub mod worm;

pub use errors::{Error, Result};

/// Prelude module to import everything from this crate.
pub mod prelude {
    pub use crate::cursors::traversal::*;
    pub use crate::cursors::*;
    pub use crate::errors::*;
    pub use crate::paths::*;
    pub use crate::trees::*;
    pub use crate::worm::*;
}
