//! Variable region parse/pack

use crate::error::{BootinfoError, Result};

use super::VarList;

/// Parse a packed variable region.
///
/// Parsing stops at an empty name or when the region is exhausted. A
/// truncated or non-UTF-8 entry is an error.
pub fn parse(region: &[u8]) -> Result<VarList> {
    match parse_lossy(region) {
        (vars, None) => Ok(vars),
        (_, Some(err)) => Err(err),
    }
}

/// Parse a packed variable region, keeping every entry before the first
/// malformed one.
///
/// Returns the parsed list and, if parsing stopped early, the reason.
pub fn parse_lossy(region: &[u8]) -> (VarList, Option<BootinfoError>) {
    let mut vars = VarList::new();
    let mut pos = 0;

    while pos < region.len() && region[pos] != 0 {
        let rest = &region[pos..];

        let Some(name_len) = rest.iter().position(|&b| b == 0) else {
            return (vars, Some(truncated(pos, "name")));
        };
        let Some(value_len) = rest[name_len + 1..].iter().position(|&b| b == 0) else {
            return (vars, Some(truncated(pos, "value")));
        };

        let name = &rest[..name_len];
        let value = &rest[name_len + 1..name_len + 1 + value_len];
        match (std::str::from_utf8(name), std::str::from_utf8(value)) {
            (Ok(name), Ok(value)) => vars.push(name.to_string(), value.to_string()),
            _ => {
                return (
                    vars,
                    Some(BootinfoError::Parse(format!(
                        "entry at offset {} is not valid UTF-8",
                        pos
                    ))),
                )
            }
        }

        pos += name_len + value_len + 2;
    }

    (vars, None)
}

fn truncated(pos: usize, what: &str) -> BootinfoError {
    BootinfoError::Parse(format!("unterminated {} at offset {}", what, pos))
}

/// Pack variables into a region as `name\0value\0` pairs followed by a
/// single `\0`.
///
/// On failure the region holds a partial list and must not be committed.
/// Returns the number of bytes written, end-of-list marker included.
pub fn pack(vars: &VarList, region: &mut [u8]) -> Result<usize> {
    let capacity = region.len();
    let too_large = || {
        BootinfoError::SizeExceeded(format!(
            "variables need {} bytes, region holds {}",
            vars.varsize() + 1,
            capacity
        ))
    };

    let mut remain = capacity.checked_sub(1).ok_or_else(too_large)?;
    let mut pos = 0;

    for (name, value) in vars {
        let needed = name.len() + value.len() + 2;
        if needed > remain {
            return Err(too_large());
        }
        for part in [name, value] {
            region[pos..pos + part.len()].copy_from_slice(part.as_bytes());
            pos += part.len();
            region[pos] = 0;
            pos += 1;
        }
        remain -= needed;
    }

    region[pos] = 0;
    Ok(pos + 1)
}
