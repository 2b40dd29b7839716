//! Redundant-Copy Codec
//!
//! Fixed byte layout of one boot info copy, independent of which copy is
//! selected as current.
//!
//! ## Copy Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Header Block (512 bytes)                                    │
//! │ ┌──────────┬─────────┬───────┬────────┬─────────┐           │
//! │ │Magic (8) │Ver (2)  │Flg (1)│Fail (1)│HdrCRC(4)│           │
//! │ ├──────────┼─────────┼───────┴────────┴─────────┘           │
//! │ │Serial(1) │Rsvd (1) │ExtSectors (2)│ variables...          │
//! │ └──────────┴─────────┴──────────────┴───────────────────────┤
//! ├─────────────────────────────────────────────────────────────┤
//! │ Extension Region (ext_sectors * 512 bytes)                  │
//! │   ... variables continued ...                  │ ExtCRC (4) │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. The header checksum covers the whole
//! header block (with the checksum field zeroed) and is written on every
//! commit, but discovery only checks it when explicitly configured to.
//! The extension checksum covers the extension region minus its own field.

mod header;
mod layout;

pub use header::{
    decode_header, encode_copy, extension_checksum_ok, header_checksum, header_checksum_ok, seal,
    Header, HeaderError,
};
pub use layout::{Layout, Slot};

// =============================================================================
// Shared Constants
// =============================================================================

/// Magic bytes identifying a boot info copy
pub const MAGIC: &[u8; 8] = b"BOOTINFO";

/// Current (and minimum accepted) format version
pub const VERSION: u16 = 4;

/// Size of the header block, header fields included
pub const BLOCK_SIZE: usize = 512;

/// Size of one extension sector
pub const SECTOR_SIZE: usize = 512;

/// Header fields: Magic (8) + Version (2) + Flags (1) + FailedBoots (1)
/// + CRC (4) + Serial (1) + Reserved (1) + ExtSectors (2) = 20 bytes
pub const HEADER_SIZE: usize = 20;

/// Size of a stored CRC-32
pub const CRC_SIZE: usize = 4;

/// Upper bound for the extension sector count
pub const MAX_EXTENSION_SECTORS: u16 = 1023;

/// Header flag: a boot was started but not yet marked successful
pub const FLAG_BOOT_IN_PROGRESS: u8 = 1 << 0;
