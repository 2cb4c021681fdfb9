//! High-performance writer for CFB (Compound File Binary) containers,
//! the structured-storage format behind legacy Office documents, MSI
//! packages, and other OLE2-based files.
//!
//! The writer builds a complete container in memory from a tree of named
//! storages and streams, then emits it as a single sequential byte
//! stream. Small streams are packed into the ministream, sibling entries
//! are kept in the red-black order the format mandates, and the
//! FAT/MiniFAT/DIFAT allocation tables are derived from the data itself,
//! so the output is internally consistent by construction.
//!
//! # Quick Start
//!
//! ```rust
//! use longan_cfb::CfbWriter;
//!
//! let mut writer = CfbWriter::new();
//! writer.create_storage(&["Workbook"])?;
//! writer.create_stream(&["Workbook", "Summary"], b"Hello, World!")?;
//!
//! let mut buffer = Vec::new();
//! writer.write_to(&mut buffer)?;
//! # Ok::<(), longan_cfb::CfbError>(())
//! ```
//!
//! Writing to a file goes through the same finalization:
//!
//! ```rust,no_run
//! use longan_cfb::CfbWriter;
//!
//! let mut writer = CfbWriter::new();
//! writer.create_stream(&["Contents"], b"document body")?;
//! writer.save("document.cfb")?;
//! # Ok::<(), longan_cfb::CfbError>(())
//! ```
//!
//! # Scope
//!
//! This crate only writes containers. Reading an existing container is a
//! separate concern served by dedicated reader crates, and in-place
//! modification, property-set streams, and encryption are out of scope.
#![forbid(unsafe_code)]

/// Constants for the CFB file format
pub mod consts;

/// Compound file writer and its options
mod builder;

/// Directory forest and canonical flattening order
mod directory;

/// Directory entry model and binary projection
mod entry;

/// Error types
mod error;

/// Header generation
mod header;

/// Balanced ordered map for directory sibling sets
mod rbtree;

/// Sector allocation and FAT/MiniFAT/DIFAT bookkeeping
mod sector;

/// Integration tests for the writer
#[cfg(test)]
mod tests;

// Re-export public types
pub use builder::{CfbOptions, CfbWriter};
pub use error::{CfbError, Result};
