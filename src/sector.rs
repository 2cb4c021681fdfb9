//! Sector allocation for compound file containers.
//!
//! The pool owns two append-only block sequences: big sectors addressed by
//! the FAT and mini-sectors addressed by the MiniFAT. Payloads are chunked
//! into consecutive blocks whose FAT entries form a singly-linked chain
//! terminated by `ENDOFCHAIN`. The mini pool is not written to the file
//! directly; finalization flushes it as one ordinary big-sector stream
//! (the ministream) whose placement is recorded on the root entry.
//!
//! # Implementation Notes
//!
//! The FAT must describe its own sectors, so `allocate_fat` first reserves
//! the required sector count (computed to a fixed point, since adding FAT
//! sectors can itself grow the table), marks the reservation with
//! `FATSECT`, and only then serializes the table into those sectors. The
//! index of every sector so consumed is recorded in the DIFAT.

use crate::consts::*;
use crate::error::{CfbError, Result};
use tracing::trace;

/// Append-only big-sector and mini-sector storage with chain bookkeeping.
#[derive(Debug)]
pub struct SectorPool {
    /// Big-sector size in bytes
    sector_size: usize,
    /// Mini-sector size in bytes
    mini_sector_size: usize,
    /// Concatenated big-sector data; always a whole number of sectors
    sectors: Vec<u8>,
    /// The FAT table (maps sector ID to next sector in chain)
    fat: Vec<u32>,
    /// Concatenated mini-sector data; always a whole number of mini-sectors
    mini_sectors: Vec<u8>,
    /// The MiniFAT table (maps mini-sector ID to next in chain)
    minifat: Vec<u32>,
    /// Absolute indices of the sectors holding the FAT table
    difat: Vec<u32>,
}

#[allow(dead_code)] // Table accessors are exercised by the test suite
impl SectorPool {
    /// Create an empty pool with the given block sizes.
    pub fn new(sector_size: usize, mini_sector_size: usize) -> Self {
        Self {
            sector_size,
            mini_sector_size,
            sectors: Vec::new(),
            fat: Vec::new(),
            mini_sectors: Vec::new(),
            minifat: Vec::new(),
            difat: Vec::new(),
        }
    }

    /// Allocate a chain of big sectors for `payload`.
    ///
    /// The payload is split into consecutive sector-size blocks with the
    /// final block zero-padded. Returns the chain head, or `ENDOFCHAIN`
    /// for an empty payload. Once returned, a chain head's contents never
    /// change.
    pub fn allocate_big(&mut self, payload: &[u8]) -> Result<u32> {
        if payload.is_empty() {
            return Ok(ENDOFCHAIN);
        }

        let num_sectors = payload.len().div_ceil(self.sector_size);
        ensure_addressable(self.fat.len(), num_sectors)?;

        let start = self.fat.len() as u32;
        for i in 0..num_sectors {
            let next = if i < num_sectors - 1 {
                start + i as u32 + 1
            } else {
                ENDOFCHAIN
            };
            self.fat.push(next);
        }

        self.sectors.extend_from_slice(payload);
        self.sectors.resize(self.fat.len() * self.sector_size, 0);

        trace!(
            "Allocated {} big sector(s) at {} for {} bytes",
            num_sectors,
            start,
            payload.len()
        );

        Ok(start)
    }

    /// Allocate a chain of mini-sectors for `payload`.
    ///
    /// Identical chunking against the mini pool and the MiniFAT.
    pub fn allocate_mini(&mut self, payload: &[u8]) -> Result<u32> {
        if payload.is_empty() {
            return Ok(ENDOFCHAIN);
        }

        let num_sectors = payload.len().div_ceil(self.mini_sector_size);
        ensure_addressable(self.minifat.len(), num_sectors)?;

        let start = self.minifat.len() as u32;
        for i in 0..num_sectors {
            let next = if i < num_sectors - 1 {
                start + i as u32 + 1
            } else {
                ENDOFCHAIN
            };
            self.minifat.push(next);
        }

        self.mini_sectors.extend_from_slice(payload);
        self.mini_sectors
            .resize(self.minifat.len() * self.mini_sector_size, 0);

        trace!(
            "Allocated {} mini-sector(s) at {} for {} bytes",
            num_sectors,
            start,
            payload.len()
        );

        Ok(start)
    }

    /// Flush the accumulated mini pool into the big-sector pool as the
    /// ministream.
    ///
    /// Returns the ministream's chain head and length, which the caller
    /// records on the root entry. An empty pool yields `ENDOFCHAIN` and
    /// length 0.
    pub fn flush_ministream(&mut self) -> Result<(u32, u64)> {
        if self.mini_sectors.is_empty() {
            return Ok((ENDOFCHAIN, 0));
        }

        let data = std::mem::take(&mut self.mini_sectors);
        let head = self.allocate_big(&data)?;
        Ok((head, data.len() as u64))
    }

    /// Serialize the MiniFAT and allocate it as a big-sector chain.
    ///
    /// Returns the chain head and the number of sectors consumed, for the
    /// header fields. Unused trailing entries in the last sector are
    /// marked `FREESECT`.
    pub fn allocate_minifat(&mut self) -> Result<(u32, u32)> {
        if self.minifat.is_empty() {
            return Ok((ENDOFCHAIN, 0));
        }

        let num_sectors = (self.minifat.len() * 4).div_ceil(self.sector_size);
        let mut data = Vec::with_capacity(num_sectors * self.sector_size);
        for &entry in &self.minifat {
            data.extend_from_slice(&entry.to_le_bytes());
        }
        data.resize(num_sectors * self.sector_size, 0xFF);

        let head = self.allocate_big(&data)?;
        Ok((head, num_sectors as u32))
    }

    /// Reserve and write the FAT table itself, populating the DIFAT.
    ///
    /// Returns the number of FAT sectors written. Fails with
    /// `CapacityExceeded` when the table would need more DIFAT entries
    /// than the header holds inline; DIFAT-extension sectors are not
    /// emitted.
    pub fn allocate_fat(&mut self) -> Result<u32> {
        let entries_per_sector = self.sector_size / 4;

        // The reservation grows the table, so iterate to a fixed point.
        let mut num_sectors = 0;
        loop {
            let needed = (self.fat.len() + num_sectors).div_ceil(entries_per_sector);
            if needed == num_sectors {
                break;
            }
            num_sectors = needed;
        }

        if num_sectors > HEADER_DIFAT_ENTRIES {
            return Err(CfbError::CapacityExceeded {
                fat_sectors: num_sectors,
                limit: HEADER_DIFAT_ENTRIES,
            });
        }

        ensure_addressable(self.fat.len(), num_sectors)?;

        let start = self.fat.len() as u32;
        for i in 0..num_sectors as u32 {
            self.fat.push(FATSECT);
            self.difat.push(start + i);
        }

        let mut data = Vec::with_capacity(num_sectors * self.sector_size);
        for &entry in &self.fat {
            data.extend_from_slice(&entry.to_le_bytes());
        }
        data.resize(num_sectors * self.sector_size, 0xFF);
        self.sectors.extend_from_slice(&data);

        trace!("Wrote FAT in {} sector(s) starting at {}", num_sectors, start);

        Ok(num_sectors as u32)
    }

    /// The concatenated big-sector pool.
    pub fn sectors(&self) -> &[u8] {
        &self.sectors
    }

    /// Total number of big sectors allocated.
    pub fn sector_count(&self) -> u32 {
        self.fat.len() as u32
    }

    /// Total number of mini-sectors allocated.
    pub fn mini_sector_count(&self) -> u32 {
        self.minifat.len() as u32
    }

    /// The FAT table.
    pub fn fat(&self) -> &[u32] {
        &self.fat
    }

    /// The MiniFAT table.
    pub fn minifat(&self) -> &[u32] {
        &self.minifat
    }

    /// The DIFAT sequence of FAT sector indices.
    pub fn difat(&self) -> &[u32] {
        &self.difat
    }
}

/// Check that `additional` more blocks keep indices out of the sentinel
/// range (the last six 32-bit values).
fn ensure_addressable(current: usize, additional: usize) -> Result<()> {
    if current + additional > MAXREGSECT as usize {
        return Err(CfbError::OversizedAddress);
    }
    Ok(())
}
