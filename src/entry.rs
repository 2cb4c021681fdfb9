//! Directory entry model and its 128-byte binary projection.
//!
//! Every storage and stream in a compound file is described by one
//! fixed-size directory record. The record stores the entry name as a
//! zero-padded UTF-16LE field together with the red-black sibling links
//! that the reader uses to navigate each storage level.

use crate::consts::*;
use crate::rbtree::{Color, RbTree};
use std::cmp::Ordering;
use zerocopy::{IntoBytes, LE, U16, U32, U64};
use zerocopy_derive::{Immutable as DeriveImmutable, IntoBytes as DeriveIntoBytes};

/// Entry name carrying the format's mandated total order.
///
/// Names compare by UTF-16 length first (shorter sorts before longer) and
/// only between equal-length names by case-folded lexical order. Names
/// that compare equal under this order are duplicates, so `"A"` and `"a"`
/// cannot coexist at the same storage level.
#[derive(Debug, Clone)]
pub struct EntryName(String);

impl EntryName {
    /// Create an entry name, truncating to the 31 UTF-16 code units the
    /// directory record can hold.
    pub fn new(name: &str) -> Self {
        let mut units = 0;
        let mut end = 0;

        for (offset, ch) in name.char_indices() {
            if units + ch.len_utf16() > MAX_NAME_LEN {
                break;
            }
            units += ch.len_utf16();
            end = offset + ch.len_utf8();
        }

        Self(name[..end].to_string())
    }

    /// The stored name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the name in UTF-16 code units.
    fn utf16_len(&self) -> usize {
        self.0.encode_utf16().count()
    }

    /// Encode the name as UTF-16LE, zero-padded to 64 bytes.
    fn encode_utf16le(&self) -> [u8; 64] {
        let mut field = [0u8; 64];

        for (i, unit) in self.0.encode_utf16().enumerate() {
            let bytes = unit.to_le_bytes();
            field[i * 2] = bytes[0];
            field[i * 2 + 1] = bytes[1];
        }

        field
    }
}

impl Ord for EntryName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.utf16_len()
            .cmp(&other.utf16_len())
            .then_with(|| self.0.to_uppercase().cmp(&other.0.to_uppercase()))
    }
}

impl PartialOrd for EntryName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for EntryName {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for EntryName {}

impl std::fmt::Display for EntryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of object a directory entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjType {
    /// The root storage
    Root,
    /// A storage (directory-like container)
    Storage,
    /// A stream (leaf payload)
    Stream,
}

impl ObjType {
    fn as_byte(self) -> u8 {
        match self {
            ObjType::Root => STGTY_ROOT,
            ObjType::Storage => STGTY_STORAGE,
            ObjType::Stream => STGTY_STREAM,
        }
    }
}

/// In-memory model of one storage or stream.
///
/// Entries are created once, when the corresponding object is discovered,
/// and mutated only to record their final placement. The `stream_id`
/// doubles as the entry's index in the directory arena, so parent links
/// are plain ids and each entry owns the ordered index over its direct
/// children without forming reference cycles.
#[derive(Debug)]
pub struct Entry {
    /// Entry name
    pub name: EntryName,
    /// Object kind
    pub obj_type: ObjType,
    /// Dense directory-table index; root is 0
    pub stream_id: u32,
    /// Head sector of the entry's chain (ministream chain for the root)
    pub sector: u32,
    /// Byte size of the stream (ministream length for the root)
    pub size: u64,
    /// Parent entry id; `NOSTREAM` for the root
    #[allow(dead_code)] // Exercised by the test suite
    pub parent: u32,
    /// Ordered index over this entry's direct children
    pub children: RbTree<EntryName, u32>,
}

impl Entry {
    /// Create the root entry. Its placement is filled in when the
    /// ministream is flushed.
    pub fn root() -> Self {
        Self {
            name: EntryName::new(ROOT_ENTRY_NAME),
            obj_type: ObjType::Root,
            stream_id: 0,
            sector: ENDOFCHAIN,
            size: 0,
            parent: NOSTREAM,
            children: RbTree::new(),
        }
    }

    /// Create a storage entry.
    pub fn storage(name: EntryName, stream_id: u32, parent: u32) -> Self {
        Self {
            name,
            obj_type: ObjType::Storage,
            stream_id,
            sector: 0,
            size: 0,
            parent,
            children: RbTree::new(),
        }
    }

    /// Create a stream entry with its recorded placement.
    pub fn stream(name: EntryName, stream_id: u32, parent: u32, sector: u32, size: u64) -> Self {
        Self {
            name,
            obj_type: ObjType::Stream,
            stream_id,
            sector,
            size,
            parent,
            children: RbTree::new(),
        }
    }

    /// Serialize this entry as one 128-byte directory record.
    ///
    /// `left` and `right` are the sibling ids of this entry inside its
    /// parent's index, `child` is the root id of its own child index, and
    /// `color` is its red-black color there; all of them default to
    /// `NOSTREAM` when absent.
    pub fn to_record(&self, left: u32, right: u32, child: u32, color: Color) -> [u8; 128] {
        let raw = RawDirEntry {
            name: self.name.encode_utf16le(),
            name_len: U16::new(((self.name.utf16_len() + 1) * 2) as u16),
            obj_type: self.obj_type.as_byte(),
            color: match color {
                Color::Red => COLOR_RED,
                Color::Black => COLOR_BLACK,
            },
            sid_left: U32::new(left),
            sid_right: U32::new(right),
            sid_child: U32::new(child),
            clsid: [0; 16],
            state_bits: U32::new(0),
            creation_time: U64::new(0),
            modified_time: U64::new(0),
            start_sector: U32::new(self.sector),
            stream_size: U64::new(self.size),
        };

        let mut record = [0u8; 128];
        record.copy_from_slice(raw.as_bytes());
        record
    }
}

/// Raw directory entry structure (128 bytes).
///
/// This mirrors the on-disk format of a directory entry.
#[derive(DeriveIntoBytes, DeriveImmutable)]
#[repr(C)]
struct RawDirEntry {
    /// Entry name in UTF-16LE (64 bytes, zero-padded)
    name: [u8; 64],
    /// Length of name in bytes (including null terminator)
    name_len: U16<LE>,
    /// Entry type (1 = storage, 2 = stream, 5 = root)
    obj_type: u8,
    /// Node color (0 = red, 1 = black)
    color: u8,
    /// Left sibling SID
    sid_left: U32<LE>,
    /// Right sibling SID
    sid_right: U32<LE>,
    /// Child SID
    sid_child: U32<LE>,
    /// CLSID (16 bytes)
    clsid: [u8; 16],
    /// State bits
    state_bits: U32<LE>,
    /// Creation time (FILETIME)
    creation_time: U64<LE>,
    /// Modified time (FILETIME)
    modified_time: U64<LE>,
    /// Starting sector
    start_sector: U32<LE>,
    /// Stream size
    stream_size: U64<LE>,
}
