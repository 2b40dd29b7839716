//! Device Locator

use std::path::PathBuf;

use crate::error::{BootinfoError, Result};

/// Return the first candidate device path that exists
pub fn locate(candidates: &[PathBuf]) -> Result<PathBuf> {
    match candidates.iter().find(|path| path.exists()) {
        Some(path) => {
            tracing::debug!("Using storage device {}", path.display());
            Ok(path.clone())
        }
        None => Err(BootinfoError::DeviceNotFound(candidates.to_vec())),
    }
}
