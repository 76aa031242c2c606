/*
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Storing and loading WORM trees by basename.
//!
//! A stored tree with basename `BASENAME` consists of:
//!
//! - `BASENAME.worm`: the tree bytes;
//! - `BASENAME.properties`: the parameter triple and value-codec id, in
//!   java-properties format.
//!
//! Loading memory-maps the buffer by default (the format is designed for
//! it: offsets are plain byte distances), or reads it into an owned
//! vector with [`WormTreeGeneric::load_in_mem`].

use std::collections::HashMap;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path as FsPath;

use dsi_bitstream::traits::{Endianness, BE, LE};
use log::info;
use mmap_rs::{Mmap, MmapFlags};

use super::generic::{WormTreeGeneric, WormTreeParams};
use crate::errors::{Error, Result};
use crate::paths::Path;

/// Extension of the tree-bytes file.
pub const WORM_EXTENSION: &str = "worm";
/// Extension of the metadata file.
pub const PROPERTIES_EXTENSION: &str = "properties";

const PROP_OFFSET_SIZE: &str = "offsetsize";
const PROP_VALUE_SIZE: &str = "valuesize";
const PROP_ENDIANNESS: &str = "endianness";
const PROP_VALUE_TYPE: &str = "valuetype";
const PROP_MAX_DEPTH: &str = "maxdepth";

/// A read-only memory mapping of a file.
pub struct MmapBuffer {
    mmap: Mmap,
    len: usize,
}

impl MmapBuffer {
    /// Maps the file at `path` read-only.
    pub fn mmap(path: impl AsRef<FsPath>) -> Result<Self> {
        let len = path.as_ref().metadata()?.len() as usize;
        let file = std::fs::File::open(path.as_ref())?;
        let mmap = unsafe {
            // A zero-length mapping is not allowed; map one page and keep
            // the logical length at zero.
            mmap_rs::MmapOptions::new(len.max(1))
                .map_err(std::io::Error::other)?
                .with_flags(MmapFlags::empty())
                .with_file(&file, 0)
                .map()
                .map_err(std::io::Error::other)?
        };
        Ok(Self { mmap, len })
    }

    /// Returns the mapped length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for MmapBuffer {
    fn as_ref(&self) -> &[u8] {
        // The mapping is at least `len` bytes long and lives as long as
        // `self`.
        unsafe { std::slice::from_raw_parts(self.mmap.as_ptr(), self.len) }
    }
}

/// An owned or memory-mapped read-only WORM buffer.
pub enum BufferRo {
    /// Heap-allocated bytes.
    Owned(Vec<u8>),
    /// A file mapping.
    Mapped(MmapBuffer),
}

impl AsRef<[u8]> for BufferRo {
    fn as_ref(&self) -> &[u8] {
        match self {
            BufferRo::Owned(v) => v,
            BufferRo::Mapped(m) => m.as_ref(),
        }
    }
}

impl From<Vec<u8>> for BufferRo {
    fn from(v: Vec<u8>) -> Self {
        BufferRo::Owned(v)
    }
}

impl From<MmapBuffer> for BufferRo {
    fn from(m: MmapBuffer) -> Self {
        BufferRo::Mapped(m)
    }
}

fn read_properties(path: &FsPath) -> Result<HashMap<String, String>> {
    let file = std::fs::File::open(path)?;
    java_properties::read(BufReader::new(file))
        .map_err(|e| Error::Parse(format!("{}: {e}", path.display())))
}

fn get_prop<'a>(map: &'a HashMap<String, String>, key: &str, path: &FsPath) -> Result<&'a str> {
    map.get(key)
        .map(String::as_str)
        .ok_or_else(|| Error::Parse(format!("missing property {key} in {}", path.display())))
}

fn parse_params<P: Path>(path: &FsPath) -> Result<WormTreeParams> {
    let map = read_properties(path)?;
    let offset_size: usize = get_prop(&map, PROP_OFFSET_SIZE, path)?
        .parse()
        .map_err(|_| Error::Parse(format!("bad {PROP_OFFSET_SIZE}")))?;
    let value_size: usize = get_prop(&map, PROP_VALUE_SIZE, path)?
        .parse()
        .map_err(|_| Error::Parse(format!("bad {PROP_VALUE_SIZE}")))?;
    let endianness = get_prop(&map, PROP_ENDIANNESS, path)?;
    let little_endian = if endianness == <LE as Endianness>::NAME {
        true
    } else if endianness == <BE as Endianness>::NAME {
        false
    } else {
        return Err(Error::Parse(format!("unknown endianness {endianness:?}")));
    };
    let params = WormTreeParams {
        offset_size,
        value_size,
        little_endian,
    };
    let value_type = get_prop(&map, PROP_VALUE_TYPE, path)?;
    if value_type != params.value_type_id() {
        return Err(Error::MetadataMismatch(format!(
            "value type {value_type:?} does not match parameters ({})",
            params.value_type_id()
        )));
    }
    let max_depth: usize = get_prop(&map, PROP_MAX_DEPTH, path)?
        .parse()
        .map_err(|_| Error::Parse(format!("bad {PROP_MAX_DEPTH}")))?;
    if max_depth != P::MAX_DEPTH {
        return Err(Error::MetadataMismatch(format!(
            "stored max depth {max_depth} does not match requested {}",
            P::MAX_DEPTH
        )));
    }
    Ok(params)
}

impl<P: Path + 'static> WormTreeGeneric<P> {
    /// Writes the tree bytes and metadata under `basename`.
    pub fn store(&self, basename: impl AsRef<FsPath>) -> Result<()> {
        let basename = basename.as_ref();
        std::fs::write(basename.with_extension(WORM_EXTENSION), self.as_bytes())?;

        let params = self.params();
        let mut map = HashMap::new();
        map.insert(PROP_OFFSET_SIZE.into(), params.offset_size.to_string());
        map.insert(PROP_VALUE_SIZE.into(), params.value_size.to_string());
        map.insert(
            PROP_ENDIANNESS.into(),
            if params.little_endian {
                <LE as Endianness>::NAME
            } else {
                <BE as Endianness>::NAME
            }
            .to_string(),
        );
        map.insert(PROP_VALUE_TYPE.into(), params.value_type_id());
        map.insert(PROP_MAX_DEPTH.into(), P::MAX_DEPTH.to_string());

        let file = std::fs::File::create(basename.with_extension(PROPERTIES_EXTENSION))?;
        let mut writer = BufWriter::new(file);
        java_properties::write(&mut writer, &map)
            .map_err(|e| Error::Parse(format!("cannot write properties: {e}")))?;
        writer.flush()?;
        Ok(())
    }

    /// Loads a stored tree, memory-mapping the buffer.
    pub fn load(basename: impl AsRef<FsPath>) -> Result<Self> {
        let basename = basename.as_ref();
        let params = parse_params::<P>(&basename.with_extension(PROPERTIES_EXTENSION))?;
        let buffer = MmapBuffer::mmap(basename.with_extension(WORM_EXTENSION))?;
        info!(
            "loaded WORM tree {} (mmap, {} bytes, offset={} value={} {})",
            basename.display(),
            buffer.len(),
            params.offset_size,
            params.value_size,
            if params.little_endian { "LE" } else { "BE" },
        );
        Self::from_parts(params, buffer.into())
    }

    /// Loads a stored tree into an owned heap buffer.
    pub fn load_in_mem(basename: impl AsRef<FsPath>) -> Result<Self> {
        let basename = basename.as_ref();
        let params = parse_params::<P>(&basename.with_extension(PROPERTIES_EXTENSION))?;
        let buffer = std::fs::read(basename.with_extension(WORM_EXTENSION))?;
        info!(
            "loaded WORM tree {} ({} bytes, offset={} value={} {})",
            basename.display(),
            buffer.len(),
            params.offset_size,
            params.value_size,
            if params.little_endian { "LE" } else { "BE" },
        );
        Self::from_parts(params, buffer.into())
    }
}
