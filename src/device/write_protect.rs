//! Write-protect toggle
//!
//! eMMC boot partitions carry a kernel read-only switch in sysfs. Writers
//! flip it off for the length of a session and back on when done.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::WriteProtectMode;

/// Changes a device's write-protect state
pub trait WriteProtect {
    /// Make the device writable or protected. Returns true if the state
    /// was changed.
    fn set_writable(&self, device: &Path, writable: bool) -> bool;
}

/// Toggles `<sysfs_root>/<dev>/force_ro` after checking `<dev>/ro`
#[derive(Debug, Clone)]
pub struct SysfsWriteProtect {
    sysfs_root: PathBuf,
}

impl SysfsWriteProtect {
    pub fn new(sysfs_root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: sysfs_root.into(),
        }
    }

    fn block_dir(&self, device: &Path) -> Option<PathBuf> {
        let name = device.strip_prefix("/dev").ok()?;
        let len = name.as_os_str().len();
        if len == 0 || len > 27 {
            return None;
        }
        Some(self.sysfs_root.join(name))
    }
}

impl WriteProtect for SysfsWriteProtect {
    fn set_writable(&self, device: &Path, writable: bool) -> bool {
        let Some(dir) = self.block_dir(device) else {
            return false;
        };
        let is_writable = match fs::read(dir.join("ro")) {
            Ok(state) if !state.is_empty() => state[0] == b'0',
            _ => return false,
        };
        if is_writable == writable {
            return false;
        }

        let Ok(mut force_ro) = OpenOptions::new().write(true).open(dir.join("force_ro")) else {
            return false;
        };
        if let Err(e) = force_ro.write_all(if writable { b"0" } else { b"1" }) {
            tracing::warn!(
                "Could not change write status of {}: {}",
                device.display(),
                e
            );
        }
        true
    }
}

/// Leaves the device alone
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWriteProtect;

impl WriteProtect for NoWriteProtect {
    fn set_writable(&self, _device: &Path, _writable: bool) -> bool {
        false
    }
}

impl WriteProtectMode {
    /// Toggler implementing this mode
    pub fn toggler(&self) -> Box<dyn WriteProtect + Send> {
        match self {
            WriteProtectMode::Sysfs { sysfs_root } => Box::new(SysfsWriteProtect::new(sysfs_root)),
            WriteProtectMode::Disabled => Box::new(NoWriteProtect),
        }
    }
}

/// Keeps a device writable while alive; protects it again on release or drop
pub struct WriteEnableGuard {
    toggler: Box<dyn WriteProtect + Send>,
    device: PathBuf,
    active: bool,
}

impl WriteEnableGuard {
    /// Make `device` writable until the guard goes away
    pub fn enable(toggler: Box<dyn WriteProtect + Send>, device: &Path) -> Self {
        if toggler.set_writable(device, true) {
            tracing::debug!("Write-enabled {}", device.display());
        }
        Self {
            toggler,
            device: device.to_path_buf(),
            active: true,
        }
    }

    /// Protect the device now rather than at drop
    pub fn release(mut self) {
        self.restore();
    }

    fn restore(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if self.toggler.set_writable(&self.device, false) {
            tracing::debug!("Write-protected {}", self.device.display());
        }
    }
}

impl Drop for WriteEnableGuard {
    fn drop(&mut self) {
        self.restore();
    }
}
