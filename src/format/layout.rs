//! Copy layout
//!
//! Sizes and device offsets derived from the configured extension size.

use std::fmt;
use std::ops::Range;

use super::{BLOCK_SIZE, CRC_SIZE, HEADER_SIZE, SECTOR_SIZE};

/// One of the two redundant copies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::A, Slot::B];

    /// The sibling copy
    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Slot::A => "A",
            Slot::B => "B",
        })
    }
}

/// On-device geometry of the two copies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    extension_sectors: u16,
    offsets: [u64; 2],
}

impl Layout {
    /// Build a layout. Copy B defaults to directly after copy A.
    ///
    /// Offsets are not range-checked here; [`Config::layout`] rejects copies
    /// that would run past the end of the 64-bit offset space.
    ///
    /// [`Config::layout`]: crate::Config::layout
    pub fn new(extension_sectors: u16, offset_a: u64, offset_b: Option<u64>) -> Self {
        let copy_size = (BLOCK_SIZE + extension_sectors as usize * SECTOR_SIZE) as u64;
        Self {
            extension_sectors,
            offsets: [
                offset_a,
                offset_b.unwrap_or(offset_a.saturating_add(copy_size)),
            ],
        }
    }

    pub fn extension_sectors(&self) -> u16 {
        self.extension_sectors
    }

    /// Bytes in the extension region, trailing checksum included
    pub fn extension_size(&self) -> usize {
        self.extension_sectors as usize * SECTOR_SIZE
    }

    /// Bytes in one full copy (header block + extension region)
    pub fn copy_size(&self) -> usize {
        BLOCK_SIZE + self.extension_size()
    }

    /// Byte range within a copy that holds packed variables
    pub fn var_range(&self) -> Range<usize> {
        HEADER_SIZE..self.copy_size() - CRC_SIZE
    }

    /// Bytes available for packed variables
    pub fn var_space(&self) -> usize {
        self.copy_size() - (HEADER_SIZE + CRC_SIZE)
    }

    /// Limit on total stored variable bytes, leaving room for the shortest
    /// name, both terminators and the end-of-list marker
    pub fn max_value_size(&self) -> usize {
        self.var_space() - 4
    }

    /// Device offset of a copy's header block
    pub fn offset(&self, slot: Slot) -> u64 {
        self.offsets[slot.index()]
    }

    /// Device offset of a copy's extension region
    pub fn extension_offset(&self, slot: Slot) -> u64 {
        self.offset(slot) + BLOCK_SIZE as u64
    }
}
