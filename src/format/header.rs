//! Header codec and copy checksums

use std::ops::Range;

use bytes::{Buf, BufMut};
use thiserror::Error;

use crate::error::{BootinfoError, Result};

use super::{Layout, BLOCK_SIZE, CRC_SIZE, FLAG_BOOT_IN_PROGRESS, HEADER_SIZE, MAGIC, VERSION};

/// Position of the header checksum within the header block
const HEADER_CRC_RANGE: Range<usize> = 12..16;

/// Decoded header fields of one copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub version: u16,
    pub flags: u8,
    pub failed_boots: u8,
    pub checksum: u32,
    pub serial: u8,
    pub extension_sectors: u16,
}

/// Reasons a header block is not a usable copy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("header truncated: {0} bytes")]
    Truncated(usize),

    #[error("invalid magic")]
    InvalidMagic,

    #[error("unsupported version {0}")]
    UnsupportedVersion(u16),
}

impl Header {
    /// Header for a new copy at the current format version
    pub fn new(flags: u8, failed_boots: u8, serial: u8, extension_sectors: u16) -> Self {
        Self {
            version: VERSION,
            flags,
            failed_boots,
            checksum: 0,
            serial,
            extension_sectors,
        }
    }

    pub fn boot_in_progress(&self) -> bool {
        self.flags & FLAG_BOOT_IN_PROGRESS != 0
    }

    fn write_to(&self, mut dst: &mut [u8]) {
        dst.put_slice(MAGIC);
        dst.put_u16_le(self.version);
        dst.put_u8(self.flags);
        dst.put_u8(self.failed_boots);
        dst.put_u32_le(self.checksum);
        dst.put_u8(self.serial);
        dst.put_u8(0);
        dst.put_u16_le(self.extension_sectors);
    }
}

/// Decode the header fields at the start of a copy.
///
/// Any version at or above [`VERSION`] is accepted; newer versions only add
/// header fields past the ones decoded here.
pub fn decode_header(bytes: &[u8]) -> std::result::Result<Header, HeaderError> {
    if bytes.len() < HEADER_SIZE {
        return Err(HeaderError::Truncated(bytes.len()));
    }
    let mut buf = &bytes[..HEADER_SIZE];

    let mut magic = [0u8; 8];
    buf.copy_to_slice(&mut magic);
    if &magic != MAGIC {
        return Err(HeaderError::InvalidMagic);
    }

    let version = buf.get_u16_le();
    if version < VERSION {
        return Err(HeaderError::UnsupportedVersion(version));
    }

    let flags = buf.get_u8();
    let failed_boots = buf.get_u8();
    let checksum = buf.get_u32_le();
    let serial = buf.get_u8();
    buf.advance(1);
    let extension_sectors = buf.get_u16_le();

    Ok(Header {
        version,
        flags,
        failed_boots,
        checksum,
        serial,
        extension_sectors,
    })
}

/// CRC-32 of the header block with its checksum field taken as zero
pub fn header_checksum(copy: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&copy[..HEADER_CRC_RANGE.start]);
    hasher.update(&[0u8; CRC_SIZE]);
    hasher.update(&copy[HEADER_CRC_RANGE.end..BLOCK_SIZE]);
    hasher.finalize()
}

/// Whether the stored header checksum matches the header block
pub fn header_checksum_ok(copy: &[u8]) -> bool {
    if copy.len() < BLOCK_SIZE {
        return false;
    }
    let stored = (&copy[HEADER_CRC_RANGE]).get_u32_le();
    header_checksum(copy) == stored
}

/// Whether the trailing extension checksum matches the extension region
pub fn extension_checksum_ok(copy: &[u8]) -> bool {
    if copy.len() < BLOCK_SIZE + CRC_SIZE {
        return false;
    }
    let (data, mut stored) = copy[BLOCK_SIZE..].split_at(copy.len() - BLOCK_SIZE - CRC_SIZE);
    crc32fast::hash(data) == stored.get_u32_le()
}

/// Write the header fields into `copy` and compute both checksums.
///
/// Variables must already be packed into the copy. The header block outside
/// the fields is left as-is so it is covered by the header checksum.
/// Returns the header with its checksum filled in.
pub fn seal(header: &Header, copy: &mut [u8]) -> Header {
    let mut sealed = Header {
        checksum: 0,
        ..*header
    };
    sealed.write_to(&mut copy[..HEADER_SIZE]);
    sealed.checksum = header_checksum(copy);
    (&mut copy[HEADER_CRC_RANGE]).put_u32_le(sealed.checksum);

    let crc_at = copy.len() - CRC_SIZE;
    let ext_crc = crc32fast::hash(&copy[BLOCK_SIZE..crc_at]);
    (&mut copy[crc_at..]).put_u32_le(ext_crc);

    sealed
}

/// Build a complete copy from header fields and already-packed variable bytes
pub fn encode_copy(layout: &Layout, header: &Header, packed: &[u8]) -> Result<Vec<u8>> {
    if packed.len() > layout.var_space() {
        return Err(BootinfoError::SizeExceeded(format!(
            "{} packed bytes exceed {} bytes of variable space",
            packed.len(),
            layout.var_space()
        )));
    }
    let mut copy = vec![0u8; layout.copy_size()];
    let start = layout.var_range().start;
    copy[start..start + packed.len()].copy_from_slice(packed);
    seal(header, &mut copy);
    Ok(copy)
}
