//! Compound file writer.
//!
//! The writer accumulates the whole container in memory and emits it in a
//! single sequential pass, so a failed build never leaves a partial file
//! behind.
//!
//! # Stream Allocation vs Directory Ordering
//!
//! Streams are allocated sectors in the order they are added via
//! [`CfbWriter::create_stream`], while directory entries are ordered by
//! the format's name comparator (length first, then case-folded). The two
//! orders are independent: a stream added first keeps the lowest sectors
//! even when its name sorts last.
//!
//! # Example
//!
//! ```rust,no_run
//! use longan_cfb::CfbWriter;
//!
//! let mut writer = CfbWriter::new();
//!
//! writer.create_storage(&["MyStorage"])?;
//! writer.create_stream(&["MyStorage", "Nested"], b"Nested content")?;
//! writer.create_stream(&["Top"], b"Hello, World!")?;
//!
//! writer.save("output.cfb")?;
//! # Ok::<(), longan_cfb::CfbError>(())
//! ```

use crate::consts::*;
use crate::directory::DirectoryBuilder;
use crate::error::Result;
use crate::header::HeaderBuilder;
use crate::sector::SectorPool;
use std::io::Write;
use tracing::debug;

/// Container layout parameters.
///
/// One explicit configuration value threaded through the build instead of
/// ambient globals. The defaults describe the common version 3 layout:
/// 512-byte sectors, 64-byte mini-sectors, 4096-byte cutoff.
#[derive(Debug, Clone)]
pub struct CfbOptions {
    /// Sector size as a power of two (9 for 512, 12 for 4096)
    pub sector_shift: u16,
    /// Mini-sector size as a power of two (6 for 64)
    pub mini_sector_shift: u16,
    /// Streams strictly below this size go to the ministream
    pub mini_stream_cutoff: u32,
    /// File signature bytes
    pub signature: [u8; 8],
}

impl CfbOptions {
    /// Sector size in bytes.
    pub fn sector_size(&self) -> usize {
        1 << self.sector_shift
    }

    /// Mini-sector size in bytes.
    pub fn mini_sector_size(&self) -> usize {
        1 << self.mini_sector_shift
    }
}

impl Default for CfbOptions {
    fn default() -> Self {
        Self {
            sector_shift: 9,
            mini_sector_shift: 6,
            mini_stream_cutoff: 4096,
            signature: *MAGIC,
        }
    }
}

/// Compound file writer.
///
/// Collects storages and streams, then finalizes the allocation
/// structures and writes the container as one contiguous byte stream.
/// The writer is consumed by [`CfbWriter::write_to`] and
/// [`CfbWriter::save`]; a build is used once and discarded.
pub struct CfbWriter {
    options: CfbOptions,
    pool: SectorPool,
    directory: DirectoryBuilder,
}

impl CfbWriter {
    /// Create a writer with default options (512-byte sectors).
    pub fn new() -> Self {
        Self::with_options(CfbOptions::default())
    }

    /// Create a writer with the given options.
    ///
    /// # Panics
    ///
    /// Panics if the sector shift is not 9 or 12.
    pub fn with_options(options: CfbOptions) -> Self {
        assert!(
            options.sector_shift == 9 || options.sector_shift == 12,
            "Sector shift must be 9 or 12"
        );

        let pool = SectorPool::new(options.sector_size(), options.mini_sector_size());
        Self {
            options,
            pool,
            directory: DirectoryBuilder::new(),
        }
    }

    /// Create a storage at the given path.
    ///
    /// All parent segments must already exist; a missing segment fails
    /// with [`CfbError::PathNotFound`](crate::CfbError::PathNotFound) and
    /// a sibling with an equal name with
    /// [`CfbError::DuplicateName`](crate::CfbError::DuplicateName).
    pub fn create_storage(&mut self, path: &[&str]) -> Result<()> {
        self.directory.insert_storage(path)?;
        Ok(())
    }

    /// Create a stream at the given path with the given contents.
    ///
    /// Payloads strictly below the mini-stream cutoff are placed in
    /// mini-sectors; payloads at or above it go to big sectors. The
    /// payload is allocated immediately and its chain head recorded on
    /// the new entry.
    pub fn create_stream(&mut self, path: &[&str], payload: &[u8]) -> Result<()> {
        let head = if payload.len() < self.options.mini_stream_cutoff as usize {
            self.pool.allocate_mini(payload)?
        } else {
            self.pool.allocate_big(payload)?
        };

        self.directory
            .insert_stream(path, head, payload.len() as u64)?;
        Ok(())
    }

    /// Finalize the container and write it to `writer`.
    ///
    /// Finalization runs in dependency order: the ministream is flushed
    /// into big sectors and recorded on the root entry, then the MiniFAT,
    /// the flattened directory array, and finally the FAT itself (which
    /// populates the DIFAT). Only after every structure is placed are the
    /// header and the sector pool written, sequentially.
    pub fn write_to<W: Write>(mut self, writer: &mut W) -> Result<()> {
        let sector_size = self.options.sector_size();

        let (ministream_start, ministream_size) = self.pool.flush_ministream()?;
        self.directory
            .set_root_placement(ministream_start, ministream_size);
        debug!(
            "Ministream: {} bytes at sector {}",
            ministream_size, ministream_start
        );

        let (minifat_start, num_minifat_sectors) = self.pool.allocate_minifat()?;
        debug!(
            "MiniFAT: {} sector(s) at {}",
            num_minifat_sectors, minifat_start
        );

        let dir_stream = self.directory.build_directory_stream();
        let num_dir_sectors = dir_stream.len().div_ceil(sector_size) as u32;
        let dir_start = self.pool.allocate_big(&dir_stream)?;
        debug!(
            "Directory: {} entries in {} sector(s) at {}",
            self.directory.entry_count(),
            num_dir_sectors,
            dir_start
        );

        let num_fat_sectors = self.pool.allocate_fat()?;
        debug!("FAT: {} sector(s)", num_fat_sectors);

        let mut header = HeaderBuilder::new(&self.options);
        header.set_directory(dir_start, num_dir_sectors);
        header.set_minifat(minifat_start, num_minifat_sectors);
        header.set_fat(self.pool.difat());

        writer.write_all(&header.generate())?;
        writer.write_all(self.pool.sectors())?;
        writer.flush()?;

        Ok(())
    }

    /// Finalize the container and save it to a file.
    pub fn save<P: AsRef<std::path::Path>>(self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut buffered = std::io::BufWriter::new(file);
        self.write_to(&mut buffered)?;
        Ok(())
    }
}

impl Default for CfbWriter {
    fn default() -> Self {
        Self::new()
    }
}
