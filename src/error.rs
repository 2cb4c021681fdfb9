//! Error types for compound file writing.

use thiserror::Error;

/// Main error type for compound file write operations.
///
/// All structural errors are detected at the point of insertion or
/// allocation, before any output bytes are written. A failed build never
/// leaves a partial or corrupt file behind.
#[derive(Error, Debug)]
pub enum CfbError {
    /// Two siblings at the same storage level compare equal under the
    /// format's name ordering
    #[error("Duplicate entry name: {name}")]
    DuplicateName { name: String },

    /// An insertion referenced a parent path that is not present
    #[error("Path not found: {path}")]
    PathNotFound { path: String },

    /// The FAT needs more DIFAT entries than the header can hold inline
    #[error("FAT requires {fat_sectors} sectors, exceeding the {limit} DIFAT entries the header can hold")]
    CapacityExceeded { fat_sectors: usize, limit: usize },

    /// Sector count would run into the reserved sentinel range
    #[error("Sector address space exhausted")]
    OversizedAddress,

    /// IO error while saving
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for compound file write operations.
pub type Result<T> = std::result::Result<T, CfbError>;
