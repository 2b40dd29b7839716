//! Variable List Module
//!
//! Named boot variables kept in insertion order.
//!
//! ## Responsibilities
//! - Validate variable names and values
//! - Track the packed size of all variables for admission control
//! - Parse variables out of a copy's variable region
//! - Pack variables back into a copy's variable region
//!
//! ## Packed Format
//! ```text
//! ┌──────┬────┬───────┬────┬──────┬────┬───────┬────┬────┐
//! │ name │ \0 │ value │ \0 │ name │ \0 │ value │ \0 │ \0 │
//! └──────┴────┴───────┴────┴──────┴────┴───────┴────┴────┘
//!                                                 end of list
//! ```

mod list;
mod packing;

pub use list::{Iter, VarList, Variable};
pub use packing::{pack, parse, parse_lossy};

use crate::error::{BootinfoError, Result};

/// Check a variable name against `[A-Za-z_][A-Za-z0-9_]*`
pub fn validate_name(name: &str) -> Result<()> {
    let mut chars = name.bytes();
    let valid = match chars.next() {
        Some(first) if first == b'_' || first.is_ascii_alphabetic() => {
            chars.all(|c| c == b'_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(BootinfoError::InvalidArgument(format!(
            "invalid variable name {:?}",
            name
        )))
    }
}

/// Check that a value holds only printable ASCII characters
pub fn validate_value(value: &str) -> Result<()> {
    match value.bytes().position(|c| !(b' '..=b'~').contains(&c)) {
        None => Ok(()),
        Some(pos) => Err(BootinfoError::InvalidArgument(format!(
            "non-printable character at offset {} in value",
            pos
        ))),
    }
}
