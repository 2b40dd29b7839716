//! Discovery & Validation
//!
//! Reads both copies, validates each on its own, and picks the current one.

use thiserror::Error;

use crate::device::BlockDevice;
use crate::format::{
    decode_header, extension_checksum_ok, header_checksum_ok, Header, HeaderError, Layout, Slot,
    BLOCK_SIZE,
};

/// Why a copy was not accepted
#[derive(Debug, Error)]
pub enum CopyRejection {
    #[error("read failed: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error("extension is {found} sectors, expected {expected}")]
    ExtensionSize { found: u16, expected: u16 },

    #[error("header checksum mismatch")]
    HeaderChecksum,

    #[error("extension checksum mismatch")]
    ExtensionChecksum,
}

/// Outcome of reading both copies
#[derive(Debug)]
pub struct Discovery {
    /// Raw bytes of each copy as read (zeroed where unreadable)
    pub copies: [Box<[u8]>; 2],
    /// Decoded header of each copy that passed validation
    pub headers: [Option<Header>; 2],
    /// The authoritative copy, if any copy is valid
    pub current: Option<Slot>,
}

/// Validate one copy held in memory.
///
/// The header-block checksum is only checked when `verify_header_checksum`
/// is set; by default corruption confined to the header block goes unnoticed.
pub fn validate_copy(
    layout: &Layout,
    copy: &[u8],
    verify_header_checksum: bool,
) -> Result<Header, CopyRejection> {
    let header = decode_header(copy)?;
    if header.extension_sectors != layout.extension_sectors() {
        return Err(CopyRejection::ExtensionSize {
            found: header.extension_sectors,
            expected: layout.extension_sectors(),
        });
    }
    if verify_header_checksum && !header_checksum_ok(copy) {
        return Err(CopyRejection::HeaderChecksum);
    }
    if !extension_checksum_ok(copy) {
        return Err(CopyRejection::ExtensionChecksum);
    }
    Ok(header)
}

/// Pick the newer of two copies from their serial numbers.
///
/// Serials advance by one per commit and wrap at 256, so a 0 beside a 255
/// is the newer copy. Otherwise the larger serial wins and ties go to A.
pub fn select_current(serials: [Option<u8>; 2]) -> Option<Slot> {
    match serials {
        [None, None] => None,
        [Some(_), None] => Some(Slot::A),
        [None, Some(_)] => Some(Slot::B),
        [Some(a), Some(b)] => {
            if a == 255 && b == 0 {
                Some(Slot::B)
            } else if b == 255 && a == 0 {
                Some(Slot::A)
            } else if b > a {
                Some(Slot::B)
            } else {
                Some(Slot::A)
            }
        }
    }
}

/// Read both copies from the device and rank them
pub fn discover(
    device: &mut dyn BlockDevice,
    layout: &Layout,
    verify_header_checksum: bool,
) -> Discovery {
    let mut copies: [Box<[u8]>; 2] = [
        vec![0u8; layout.copy_size()].into_boxed_slice(),
        vec![0u8; layout.copy_size()].into_boxed_slice(),
    ];
    let mut headers = [None, None];

    for slot in Slot::ALL {
        let copy = &mut copies[slot.index()];
        match read_copy(device, layout, slot, copy, verify_header_checksum) {
            Ok(header) => {
                tracing::debug!(
                    "Copy {} valid: version={} serial={} failed_boots={}",
                    slot,
                    header.version,
                    header.serial,
                    header.failed_boots
                );
                headers[slot.index()] = Some(header);
            }
            Err(reason) => tracing::debug!("Copy {} rejected: {}", slot, reason),
        }
    }

    let current = select_current(headers.map(|h| h.map(|h| h.serial)));
    match current {
        Some(slot) => tracing::debug!("Copy {} is current", slot),
        None => tracing::info!("No valid boot info copy found"),
    }

    Discovery {
        copies,
        headers,
        current,
    }
}

fn read_copy(
    device: &mut dyn BlockDevice,
    layout: &Layout,
    slot: Slot,
    copy: &mut [u8],
    verify_header_checksum: bool,
) -> Result<Header, CopyRejection> {
    device.read_region(layout.offset(slot), &mut copy[..BLOCK_SIZE])?;

    // Only read the extension once the header says it belongs to this layout
    let header = decode_header(copy)?;
    if header.extension_sectors != layout.extension_sectors() {
        return Err(CopyRejection::ExtensionSize {
            found: header.extension_sectors,
            expected: layout.extension_sectors(),
        });
    }

    device.read_region(layout.extension_offset(slot), &mut copy[BLOCK_SIZE..])?;
    validate_copy(layout, copy, verify_header_checksum)
}
