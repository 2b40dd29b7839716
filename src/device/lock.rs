//! Store lock
//!
//! Advisory `flock` on a lock file shared by every process using the store.
//! Acquisition never waits: a contended lock fails immediately.

use std::fs::{DirBuilder, File, OpenOptions};
use std::io;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::{Flock, FlockArg};

use crate::error::{BootinfoError, Result};

/// Held advisory lock; released on drop
pub struct StoreLock {
    _lock: Flock<File>,
    path: PathBuf,
    exclusive: bool,
}

impl StoreLock {
    const FILE_NAME: &'static str = "lockfile";

    /// Take the lock in `dir`, shared for readers and exclusive for writers
    pub fn acquire(dir: &Path, exclusive: bool) -> Result<Self> {
        match DirBuilder::new().mode(0o2770).create(dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }

        let path = dir.join(Self::FILE_NAME);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .mode(0o770)
            .open(&path)?;

        let arg = if exclusive {
            FlockArg::LockExclusiveNonblock
        } else {
            FlockArg::LockSharedNonblock
        };

        match Flock::lock(file, arg) {
            Ok(lock) => {
                tracing::debug!(
                    "Acquired {} lock on {}",
                    if exclusive { "exclusive" } else { "shared" },
                    path.display()
                );
                Ok(Self {
                    _lock: lock,
                    path,
                    exclusive,
                })
            }
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => {
                Err(BootinfoError::LockContended(path))
            }
            Err((_, errno)) => Err(io::Error::from(errno).into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }
}
