//! Header generation for compound file containers.
//!
//! The header is a 512-byte block carrying the signature, version and
//! layout parameters, the counts and head pointers of every allocation
//! structure, and the first 109 DIFAT entries. For version 4 (4096-byte
//! sectors) the first big block spans a full sector, so the builder
//! returns a sector-size buffer with the 512-byte header populated and
//! the remainder zero-filled.

use crate::builder::CfbOptions;
use crate::consts::*;

/// Header builder.
///
/// Head pointers default to `ENDOFCHAIN` and counts to zero, matching an
/// empty container; the finalization sequence fills them in as each
/// structure is allocated.
pub struct HeaderBuilder<'a> {
    options: &'a CfbOptions,
    first_dir_sector: u32,
    num_dir_sectors: u32,
    first_minifat_sector: u32,
    num_minifat_sectors: u32,
    num_fat_sectors: u32,
    difat: &'a [u32],
}

impl<'a> HeaderBuilder<'a> {
    /// Create a header builder for the given container options.
    pub fn new(options: &'a CfbOptions) -> Self {
        Self {
            options,
            first_dir_sector: ENDOFCHAIN,
            num_dir_sectors: 0,
            first_minifat_sector: ENDOFCHAIN,
            num_minifat_sectors: 0,
            num_fat_sectors: 0,
            difat: &[],
        }
    }

    /// Set the directory chain placement.
    ///
    /// For 512-byte sectors the count field must be written as zero.
    pub fn set_directory(&mut self, first_sector: u32, num_sectors: u32) {
        self.first_dir_sector = first_sector;
        self.num_dir_sectors = if self.options.sector_shift == 9 {
            0
        } else {
            num_sectors
        };
    }

    /// Set the MiniFAT chain placement.
    pub fn set_minifat(&mut self, first_sector: u32, num_sectors: u32) {
        self.first_minifat_sector = first_sector;
        self.num_minifat_sectors = num_sectors;
    }

    /// Set the DIFAT sequence locating the FAT sectors.
    pub fn set_fat(&mut self, difat: &'a [u32]) {
        self.num_fat_sectors = difat.len() as u32;
        self.difat = difat;
    }

    /// Generate the header block.
    pub fn generate(&self) -> Vec<u8> {
        let mut header = vec![0u8; self.options.sector_size().max(HEADER_SIZE)];

        // Signature (8 bytes)
        header[0..8].copy_from_slice(&self.options.signature);

        // CLSID (16 bytes, all zeros)
        // header[8..24] already zeros

        // Minor version (2 bytes)
        header[24..26].copy_from_slice(&0x003Eu16.to_le_bytes());

        // Major version (2 bytes): 3 for 512-byte sectors, 4 for 4096
        let major_version = if self.options.sector_shift == 9 {
            3u16
        } else {
            4u16
        };
        header[26..28].copy_from_slice(&major_version.to_le_bytes());

        // Byte order marker (2 bytes): little-endian
        header[28..30].copy_from_slice(&0xFFFEu16.to_le_bytes());

        // Sector and mini-sector shifts (2 bytes each)
        header[30..32].copy_from_slice(&self.options.sector_shift.to_le_bytes());
        header[32..34].copy_from_slice(&self.options.mini_sector_shift.to_le_bytes());

        // Reserved (6 bytes)
        // header[34..40] already zeros

        // Number of directory sectors (4 bytes)
        header[40..44].copy_from_slice(&self.num_dir_sectors.to_le_bytes());

        // Number of FAT sectors (4 bytes)
        header[44..48].copy_from_slice(&self.num_fat_sectors.to_le_bytes());

        // First directory sector (4 bytes)
        header[48..52].copy_from_slice(&self.first_dir_sector.to_le_bytes());

        // Transaction signature (4 bytes) - 0
        // header[52..56] already zeros

        // Mini stream cutoff size (4 bytes)
        header[56..60].copy_from_slice(&self.options.mini_stream_cutoff.to_le_bytes());

        // First MiniFAT sector and MiniFAT sector count (4 bytes each)
        header[60..64].copy_from_slice(&self.first_minifat_sector.to_le_bytes());
        header[64..68].copy_from_slice(&self.num_minifat_sectors.to_le_bytes());

        // First DIFAT sector and DIFAT sector count (4 bytes each).
        // Every FAT sector index fits in the header, so no DIFAT
        // extension sectors exist.
        header[68..72].copy_from_slice(&ENDOFCHAIN.to_le_bytes());
        header[72..76].copy_from_slice(&0u32.to_le_bytes());

        // The first 109 DIFAT entries, padded with FREESECT
        for (i, &sector_id) in self.difat.iter().take(HEADER_DIFAT_ENTRIES).enumerate() {
            let offset = 76 + i * 4;
            header[offset..offset + 4].copy_from_slice(&sector_id.to_le_bytes());
        }
        for i in self.difat.len()..HEADER_DIFAT_ENTRIES {
            let offset = 76 + i * 4;
            header[offset..offset + 4].copy_from_slice(&FREESECT.to_le_bytes());
        }

        header
    }
}
