//! Block device access
//!
//! Copies are read and written as whole regions at fixed offsets.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::path::Path;

/// Positional access to the storage holding both copies
pub trait BlockDevice {
    /// Fill `buf` from `offset`. A short read is an error.
    fn read_region(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;

    /// Write all of `buf` at `offset`. The data must be durable on return.
    fn write_region(&mut self, offset: u64, buf: &[u8]) -> io::Result<()>;
}

impl BlockDevice for File {
    fn read_region(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        FileExt::read_exact_at(self, buf, offset)
    }

    fn write_region(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        FileExt::write_all_at(self, buf, offset)
    }
}

/// Open the storage device. Read-write opens use `O_DSYNC` so each write
/// is on the media when it returns.
pub fn open_block_device(path: &Path, read_only: bool) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true);
    if !read_only {
        options.write(true).custom_flags(libc::O_DSYNC);
    }
    options.open(path)
}
