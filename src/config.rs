//! Configuration for bootinfo
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{BootinfoError, Result};
use crate::format::{Layout, Slot, MAX_EXTENSION_SECTORS};

/// Main configuration for a bootinfo store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Device Configuration
    // -------------------------------------------------------------------------
    /// Candidate storage devices, tried in order. First existing path wins.
    pub device_paths: Vec<PathBuf>,

    /// Byte offset of copy A on the device
    pub offset_a: u64,

    /// Byte offset of copy B. `None` places it directly after copy A.
    /// Depending on the storage, it may need to move so the two copies
    /// do not share an erase block.
    pub offset_b: Option<u64>,

    // -------------------------------------------------------------------------
    // Format Configuration
    // -------------------------------------------------------------------------
    /// Number of 512-byte extension sectors following each header block
    pub extension_sectors: u16,

    /// Also verify the header-block checksum when validating a copy.
    ///
    /// Off by default: existing stores have only ever been validated on the
    /// extension checksum, so turning this on rejects some stores that were
    /// previously accepted.
    pub verify_header_checksum: bool,

    // -------------------------------------------------------------------------
    // Lifecycle Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the advisory lock file
    pub lock_dir: PathBuf,

    /// How the device's kernel write-protect switch is handled
    pub write_protect: WriteProtectMode,
}

/// Write-protect handling for read-write sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteProtectMode {
    /// Toggle `force_ro` under the given sysfs block directory
    Sysfs { sysfs_root: PathBuf },

    /// Leave the device's write-protect state alone
    Disabled,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_paths: vec![PathBuf::from("/dev/mmcblk0boot1")],
            offset_a: 0,
            offset_b: None,
            extension_sectors: MAX_EXTENSION_SECTORS,
            verify_header_checksum: false,
            lock_dir: PathBuf::from("/run/rk-bootinfo"),
            write_protect: WriteProtectMode::Sysfs {
                sysfs_root: PathBuf::from("/sys/block"),
            },
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the settings and derive the on-device layout from them
    pub fn layout(&self) -> Result<Layout> {
        if self.extension_sectors == 0 || self.extension_sectors > MAX_EXTENSION_SECTORS {
            return Err(BootinfoError::InvalidArgument(format!(
                "extension sector count {} out of range 1..={}",
                self.extension_sectors, MAX_EXTENSION_SECTORS
            )));
        }
        let layout = Layout::new(self.extension_sectors, self.offset_a, self.offset_b);
        let (a, b) = (layout.offset(Slot::A), layout.offset(Slot::B));
        let size = layout.copy_size() as u64;
        let (Some(end_a), Some(end_b)) = (a.checked_add(size), b.checked_add(size)) else {
            return Err(BootinfoError::InvalidArgument(format!(
                "copy offsets {} and {} exceed the device address range ({} bytes per copy)",
                a, b, size
            )));
        };
        if a < end_b && b < end_a {
            return Err(BootinfoError::InvalidArgument(format!(
                "copy offsets {} and {} overlap ({} bytes per copy)",
                a, b, size
            )));
        }
        Ok(layout)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Use a single storage device instead of the default candidate list
    pub fn device_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.device_paths = vec![path.into()];
        self
    }

    /// Set the candidate storage devices, tried in order
    pub fn device_paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.config.device_paths = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Set the byte offset of copy A
    pub fn offset_a(mut self, offset: u64) -> Self {
        self.config.offset_a = offset;
        self
    }

    /// Set the byte offset of copy B
    pub fn offset_b(mut self, offset: u64) -> Self {
        self.config.offset_b = Some(offset);
        self
    }

    /// Set the number of extension sectors per copy
    pub fn extension_sectors(mut self, sectors: u16) -> Self {
        self.config.extension_sectors = sectors;
        self
    }

    /// Also reject copies whose header-block checksum does not match
    pub fn verify_header_checksum(mut self, verify: bool) -> Self {
        self.config.verify_header_checksum = verify;
        self
    }

    /// Set the directory holding the lock file
    pub fn lock_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.lock_dir = path.into();
        self
    }

    /// Set the write-protect handling
    pub fn write_protect(mut self, mode: WriteProtectMode) -> Self {
        self.config.write_protect = mode;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
