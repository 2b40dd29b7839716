//! Tests for the copy format
//!
//! These tests verify:
//! - Exact header byte layout
//! - Magic and version checks
//! - Header and extension checksums
//! - Layout geometry and config validation

#[path = "../common/mod.rs"]
mod common;

use bootinfo::format::{
    decode_header, encode_copy, extension_checksum_ok, header_checksum, header_checksum_ok,
    Header, HeaderError, Layout, Slot, BLOCK_SIZE, FLAG_BOOT_IN_PROGRESS, HEADER_SIZE, VERSION,
};
use bootinfo::{BootinfoError, Config};
use common::{packed, test_layout, TEST_SECTORS};

// =============================================================================
// Helper Functions
// =============================================================================

fn sample_copy() -> Vec<u8> {
    let header = Header::new(FLAG_BOOT_IN_PROGRESS, 2, 7, TEST_SECTORS);
    encode_copy(&test_layout(), &header, &packed(&[("hostname", "device-7")])).unwrap()
}

// =============================================================================
// Byte Layout Tests
// =============================================================================

#[test]
fn test_header_field_offsets() {
    let copy = sample_copy();

    assert_eq!(&copy[0..8], b"BOOTINFO");
    assert_eq!(&copy[8..10], &VERSION.to_le_bytes());
    assert_eq!(copy[10], FLAG_BOOT_IN_PROGRESS);
    assert_eq!(copy[11], 2);
    assert_eq!(copy[16], 7);
    assert_eq!(copy[17], 0);
    assert_eq!(&copy[18..20], &TEST_SECTORS.to_le_bytes());
}

#[test]
fn test_variables_start_after_header_fields() {
    let copy = sample_copy();

    assert_eq!(&copy[HEADER_SIZE..HEADER_SIZE + 9], b"hostname\0");
    assert_eq!(&copy[HEADER_SIZE + 9..HEADER_SIZE + 18], b"device-7\0");
    assert_eq!(copy[HEADER_SIZE + 18], 0);
}

#[test]
fn test_copy_size_matches_layout() {
    let layout = test_layout();
    let copy = sample_copy();

    assert_eq!(copy.len(), layout.copy_size());
    assert_eq!(copy.len(), BLOCK_SIZE + TEST_SECTORS as usize * 512);
}

#[test]
fn test_decode_roundtrips_fields() {
    let copy = sample_copy();
    let header = decode_header(&copy).unwrap();

    assert_eq!(header.version, VERSION);
    assert_eq!(header.flags, FLAG_BOOT_IN_PROGRESS);
    assert!(header.boot_in_progress());
    assert_eq!(header.failed_boots, 2);
    assert_eq!(header.serial, 7);
    assert_eq!(header.extension_sectors, TEST_SECTORS);
    assert_eq!(header.checksum, u32::from_le_bytes(copy[12..16].try_into().unwrap()));
}

// =============================================================================
// Magic / Version Tests
// =============================================================================

#[test]
fn test_decode_rejects_bad_magic() {
    let mut copy = sample_copy();
    copy[0] = b'X';

    assert_eq!(decode_header(&copy), Err(HeaderError::InvalidMagic));
}

#[test]
fn test_decode_rejects_blank_copy() {
    let copy = vec![0u8; BLOCK_SIZE];

    assert_eq!(decode_header(&copy), Err(HeaderError::InvalidMagic));
}

#[test]
fn test_decode_rejects_older_version() {
    let mut copy = sample_copy();
    copy[8..10].copy_from_slice(&3u16.to_le_bytes());

    assert_eq!(decode_header(&copy), Err(HeaderError::UnsupportedVersion(3)));
}

#[test]
fn test_decode_accepts_newer_version() {
    let mut copy = sample_copy();
    copy[8..10].copy_from_slice(&5u16.to_le_bytes());

    assert_eq!(decode_header(&copy).unwrap().version, 5);
}

#[test]
fn test_decode_rejects_truncated_header() {
    let copy = sample_copy();

    assert_eq!(decode_header(&copy[..10]), Err(HeaderError::Truncated(10)));
}

// =============================================================================
// Checksum Tests
// =============================================================================

#[test]
fn test_fresh_copy_checksums_verify() {
    let copy = sample_copy();

    assert!(header_checksum_ok(&copy));
    assert!(extension_checksum_ok(&copy));
}

#[test]
fn test_header_checksum_computed_with_field_zeroed() {
    let copy = sample_copy();
    let mut zeroed = copy.clone();
    zeroed[12..16].fill(0);

    assert_eq!(header_checksum(&copy), crc32fast::hash(&zeroed[..BLOCK_SIZE]));
}

#[test]
fn test_extension_checksum_covers_extension_only() {
    let copy = sample_copy();
    let stored = u32::from_le_bytes(copy[copy.len() - 4..].try_into().unwrap());

    assert_eq!(stored, crc32fast::hash(&copy[BLOCK_SIZE..copy.len() - 4]));
}

#[test]
fn test_header_tail_change_leaves_extension_checksum_valid() {
    let mut copy = sample_copy();
    copy[HEADER_SIZE + 3] ^= 0x01;

    assert!(extension_checksum_ok(&copy));
    assert!(!header_checksum_ok(&copy));
}

#[test]
fn test_extension_change_breaks_extension_checksum() {
    let mut copy = sample_copy();
    copy[BLOCK_SIZE + 100] ^= 0x80;

    assert!(!extension_checksum_ok(&copy));
    assert!(header_checksum_ok(&copy));
}

#[test]
fn test_encode_rejects_oversized_variables() {
    let layout = test_layout();
    let too_big = vec![b'a'; layout.var_space() + 1];

    let result = encode_copy(&layout, &Header::default(), &too_big);

    assert!(matches!(result, Err(BootinfoError::SizeExceeded(_))));
}

// =============================================================================
// Layout Tests
// =============================================================================

#[test]
fn test_default_layout_geometry() {
    let layout = Config::default().layout().unwrap();

    assert_eq!(layout.extension_sectors(), 1023);
    assert_eq!(layout.copy_size(), 512 * 1024);
    assert_eq!(layout.var_space(), 512 * 1024 - 24);
    assert_eq!(layout.max_value_size(), 512 * 1024 - 28);
    assert_eq!(layout.offset(Slot::A), 0);
    assert_eq!(layout.offset(Slot::B), 512 * 1024);
    assert_eq!(layout.extension_offset(Slot::B), 512 * 1024 + 512);
}

#[test]
fn test_layout_explicit_offsets() {
    let layout = Layout::new(2, 4096, Some(1024 * 1024));

    assert_eq!(layout.offset(Slot::A), 4096);
    assert_eq!(layout.extension_offset(Slot::A), 4096 + 512);
    assert_eq!(layout.offset(Slot::B), 1024 * 1024);
    assert_eq!(layout.var_range(), HEADER_SIZE..1536 - 4);
}

#[test]
fn test_config_rejects_sector_count_out_of_range() {
    for sectors in [0, 1024] {
        let config = Config::builder().extension_sectors(sectors).build();
        assert!(matches!(
            config.layout(),
            Err(BootinfoError::InvalidArgument(_))
        ));
    }
}

#[test]
fn test_config_rejects_overlapping_copies() {
    let config = Config::builder()
        .extension_sectors(4)
        .offset_a(0)
        .offset_b(1024)
        .build();

    assert!(matches!(
        config.layout(),
        Err(BootinfoError::InvalidArgument(_))
    ));
}

#[test]
fn test_config_rejects_offsets_past_address_space() {
    let near_end = u64::MAX - 10;
    let configs = [
        Config::builder().offset_a(near_end).build(),
        Config::builder().offset_a(0).offset_b(near_end).build(),
    ];

    for config in configs {
        assert!(matches!(
            config.layout(),
            Err(BootinfoError::InvalidArgument(_))
        ));
    }
}

#[test]
fn test_config_accepts_copy_ending_at_address_space_end() {
    let size = test_layout().copy_size() as u64;
    let config = Config::builder()
        .extension_sectors(TEST_SECTORS)
        .offset_a(0)
        .offset_b(u64::MAX - size)
        .build();

    assert_eq!(config.layout().unwrap().offset(Slot::B), u64::MAX - size);
}

#[test]
fn test_slot_other() {
    assert_eq!(Slot::A.other(), Slot::B);
    assert_eq!(Slot::B.other(), Slot::A);
    assert_eq!(Slot::B.index(), 1);
}
