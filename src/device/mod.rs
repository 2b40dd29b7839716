//! Device Module
//!
//! Everything that touches the backing storage outside the copy format.
//!
//! ## Responsibilities
//! - Locate the raw storage device
//! - Positional whole-region reads and write-through writes
//! - Process-level advisory locking of the store
//! - Toggling the device's kernel write-protect switch around writes

mod block;
mod locator;
mod lock;
mod write_protect;

pub use block::{open_block_device, BlockDevice};
pub use locator::locate;
pub use lock::StoreLock;
pub use write_protect::{NoWriteProtect, SysfsWriteProtect, WriteEnableGuard, WriteProtect};
