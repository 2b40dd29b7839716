//! Tests for the variable list
//!
//! These tests verify:
//! - Name and value validation
//! - Set / replace / delete semantics and ordering
//! - Size accounting and limits
//! - Parsing and packing of the variable region

use bootinfo::vars::{pack, parse, parse_lossy, validate_name, validate_value, VarList};
use bootinfo::BootinfoError;

const MAX: usize = 2000;

// =============================================================================
// Helper Functions
// =============================================================================

fn list_of(pairs: &[(&str, &str)]) -> VarList {
    let mut vars = VarList::new();
    for (name, value) in pairs {
        vars.set(name, Some(*value), MAX).unwrap();
    }
    vars
}

fn collect(vars: &VarList) -> Vec<(String, String)> {
    vars.iter()
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_valid_names() {
    for name in ["a", "_", "_keep", "hostname", "Boot_Slot2", "x9"] {
        assert!(validate_name(name).is_ok(), "{} should be valid", name);
    }
}

#[test]
fn test_invalid_names() {
    for name in ["", "9lives", "has-dash", "has space", "dot.ted", "é"] {
        assert!(
            matches!(validate_name(name), Err(BootinfoError::InvalidArgument(_))),
            "{:?} should be invalid",
            name
        );
    }
}

#[test]
fn test_value_must_be_printable() {
    assert!(validate_value("root=/dev/mmcblk0p2 quiet ~!").is_ok());
    assert!(validate_value("line\n").is_err());
    assert!(validate_value("tab\there").is_err());
    assert!(validate_value("caf\u{e9}").is_err());
}

#[test]
fn test_set_rejects_bad_value() {
    let mut vars = VarList::new();

    let result = vars.set("name", Some("bad\x07"), MAX);

    assert!(matches!(result, Err(BootinfoError::InvalidArgument(_))));
    assert!(vars.is_empty());
}

// =============================================================================
// Set / Delete Tests
// =============================================================================

#[test]
fn test_set_appends_in_insertion_order() {
    let vars = list_of(&[("zeta", "1"), ("alpha", "2"), ("mid", "3")]);

    let names: Vec<&str> = vars.iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn test_set_replaces_in_place() {
    let mut vars = list_of(&[("a", "1"), ("b", "2"), ("c", "3")]);

    vars.set("b", Some("two"), MAX).unwrap();

    assert_eq!(
        collect(&vars),
        vec![
            ("a".into(), "1".into()),
            ("b".into(), "two".into()),
            ("c".into(), "3".into())
        ]
    );
}

#[test]
fn test_lookup_is_case_sensitive() {
    let vars = list_of(&[("Name", "upper")]);

    assert_eq!(vars.get("Name"), Some("upper"));
    assert_eq!(vars.get("name"), None);
}

#[test]
fn test_empty_value_deletes() {
    let mut vars = list_of(&[("a", "1"), ("b", "2")]);

    vars.set("a", Some(""), MAX).unwrap();

    assert_eq!(vars.get("a"), None);
    assert_eq!(vars.len(), 1);
}

#[test]
fn test_none_value_deletes() {
    let mut vars = list_of(&[("a", "1")]);

    vars.set("a", None, MAX).unwrap();

    assert!(vars.is_empty());
    assert_eq!(vars.varsize(), 0);
}

#[test]
fn test_delete_missing_is_not_found() {
    let mut vars = list_of(&[("a", "1")]);

    assert!(matches!(
        vars.set("never", Some(""), MAX),
        Err(BootinfoError::NotFound(_))
    ));
    assert!(matches!(vars.remove("never"), Err(BootinfoError::NotFound(_))));
}

#[test]
fn test_delete_then_readd_goes_to_tail() {
    let mut vars = list_of(&[("a", "1"), ("b", "2")]);

    vars.remove("a").unwrap();
    vars.set("a", Some("again"), MAX).unwrap();

    let names: Vec<&str> = vars.iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["b", "a"]);
}

// =============================================================================
// Size Accounting Tests
// =============================================================================

#[test]
fn test_varsize_tracks_packed_bytes() {
    let mut vars = list_of(&[("ab", "123"), ("c", "4")]);
    assert_eq!(vars.varsize(), (2 + 3 + 2) + (1 + 1 + 2));

    vars.set("ab", Some("1"), MAX).unwrap();
    assert_eq!(vars.varsize(), (2 + 1 + 2) + (1 + 1 + 2));

    vars.remove("c").unwrap();
    assert_eq!(vars.varsize(), 2 + 1 + 2);
}

#[test]
fn test_name_too_long() {
    let mut vars = VarList::new();
    let name = "n".repeat(512);

    let result = vars.set(&name, Some("v"), 100_000);

    assert!(matches!(result, Err(BootinfoError::SizeExceeded(_))));
}

#[test]
fn test_name_just_under_limit() {
    let mut vars = VarList::new();
    let name = "n".repeat(511);

    vars.set(&name, Some("v"), 100_000).unwrap();

    assert_eq!(vars.get(&name), Some("v"));
}

#[test]
fn test_value_at_max_rejected() {
    let mut vars = VarList::new();
    let value = "v".repeat(MAX);

    assert!(matches!(
        vars.set("a", Some(&value), MAX),
        Err(BootinfoError::SizeExceeded(_))
    ));
}

#[test]
fn test_total_size_limit() {
    let mut vars = VarList::new();
    // 1 + 995 + 2 = 998 bytes each
    let value = "v".repeat(995);
    vars.set("a", Some(&value), MAX).unwrap();
    vars.set("b", Some(&value), MAX).unwrap();
    assert_eq!(vars.varsize(), 1996);

    assert!(matches!(
        vars.set("c", Some("xx"), MAX),
        Err(BootinfoError::SizeExceeded(_))
    ));
    vars.set("c", Some("x"), MAX).unwrap();
    assert_eq!(vars.varsize(), MAX);
}

#[test]
fn test_replace_counts_released_bytes() {
    let mut vars = VarList::new();
    let big = "v".repeat(1990);
    vars.set("a", Some(&big), MAX).unwrap();

    // Same size again only fits if the old value is discounted
    vars.set("a", Some(&big), MAX).unwrap();

    assert_eq!(vars.varsize(), 1 + 1990 + 2);
}

#[test]
fn test_preserved_keeps_underscore_names() {
    let vars = list_of(&[("_keep", "1"), ("other", "2"), ("_also", "3")]);

    let kept = vars.preserved();

    assert_eq!(
        collect(&kept),
        vec![("_keep".into(), "1".into()), ("_also".into(), "3".into())]
    );
    assert_eq!(kept.varsize(), (5 + 1 + 2) + (5 + 1 + 2));
}

// =============================================================================
// Pack / Parse Tests
// =============================================================================

#[test]
fn test_pack_format() {
    let vars = list_of(&[("a", "1"), ("bc", "23")]);
    let mut region = vec![0xffu8; 16];

    let written = pack(&vars, &mut region).unwrap();

    assert_eq!(written, 11);
    assert_eq!(&region[..11], b"a\x001\x00bc\x0023\x00\x00");
}

#[test]
fn test_pack_empty_list() {
    let mut region = vec![0xffu8; 4];

    let written = pack(&VarList::new(), &mut region).unwrap();

    assert_eq!(written, 1);
    assert_eq!(region[0], 0);
}

#[test]
fn test_pack_then_parse_preserves_order_and_values() {
    let vars = list_of(&[
        ("hostname", "device-7"),
        ("_serial", "A1B2C3"),
        ("boot_args", "console=ttyS2,1500000 quiet"),
        ("z", "last"),
    ]);
    let mut region = vec![0u8; 256];

    pack(&vars, &mut region).unwrap();
    let parsed = parse(&region).unwrap();

    assert_eq!(parsed, vars);
    assert_eq!(parsed.varsize(), vars.varsize());
}

#[test]
fn test_pack_rejects_overflow() {
    let vars = list_of(&[("name", "value")]);
    // needs 4 + 5 + 2 + 1 = 12 bytes
    let mut exact = vec![0u8; 12];
    let mut short = vec![0u8; 11];

    assert!(pack(&vars, &mut exact).is_ok());
    assert!(matches!(
        pack(&vars, &mut short),
        Err(BootinfoError::SizeExceeded(_))
    ));
}

#[test]
fn test_parse_stops_at_empty_name() {
    let region = b"a\x001\x00\x00b\x002\x00";

    let parsed = parse(region).unwrap();

    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed.get("a"), Some("1"));
    assert_eq!(parsed.varsize(), 4);
}

#[test]
fn test_parse_blank_region() {
    let parsed = parse(&[0u8; 64]).unwrap();

    assert!(parsed.is_empty());
}

#[test]
fn test_parse_stops_when_space_exhausted() {
    // No end-of-list marker, but the last entry is complete
    let region = b"a\x001\x00b\x002\x00";

    let parsed = parse(region).unwrap();

    assert_eq!(parsed.len(), 2);
}

#[test]
fn test_parse_keeps_empty_stored_value() {
    let region = b"a\x00\x00b\x002\x00\x00";

    let parsed = parse(region).unwrap();

    assert_eq!(parsed.get("a"), Some(""));
    assert_eq!(parsed.get("b"), Some("2"));
}

#[test]
fn test_parse_truncated_value_is_error() {
    let region = b"a\x001\x00b\x00unterminated";

    assert!(matches!(parse(region), Err(BootinfoError::Parse(_))));
}

#[test]
fn test_parse_truncated_name_is_error() {
    let region = b"a\x001\x00name_without_end";

    assert!(matches!(parse(region), Err(BootinfoError::Parse(_))));
}

#[test]
fn test_parse_lossy_keeps_prefix() {
    let region = b"_keep\x001\x00other\x002\x00broken";

    let (vars, err) = parse_lossy(region);

    assert!(matches!(err, Some(BootinfoError::Parse(_))));
    assert_eq!(vars.len(), 2);
    assert_eq!(vars.get("_keep"), Some("1"));
    assert_eq!(vars.get("other"), Some("2"));
}

#[test]
fn test_parse_rejects_invalid_utf8() {
    let region = b"a\x00\xff\xfe\x00\x00";

    assert!(matches!(parse(region), Err(BootinfoError::Parse(_))));
}
