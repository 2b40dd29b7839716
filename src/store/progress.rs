//! Boot-Progress Counters
//!
//! Boot-in-progress flag and failed-boot count carried in the header.
//! Each operation changes the header and commits immediately.

use crate::error::Result;
use crate::format::FLAG_BOOT_IN_PROGRESS;

use super::BootInfo;

impl BootInfo {
    /// Record the start of a boot.
    ///
    /// If the previous boot never reached [`mark_successful`](Self::mark_successful),
    /// the flag is still set and this counts as a failed boot. Returns the
    /// resulting failure count; callers compare it against their failover
    /// threshold.
    pub fn mark_in_progress(&mut self) -> Result<u8> {
        let mut header = *self.header();
        if header.boot_in_progress() {
            header.failed_boots = header.failed_boots.saturating_add(1);
        } else {
            header.flags |= FLAG_BOOT_IN_PROGRESS;
        }
        self.commit_header(header)?;
        tracing::info!("Boot marked in progress, failed boots: {}", header.failed_boots);
        Ok(header.failed_boots)
    }

    /// Record a healthy boot: clear the flag and reset the failure count.
    ///
    /// Returns the failure count from before the reset.
    pub fn mark_successful(&mut self) -> Result<u8> {
        let mut header = *self.header();
        let failed_boots = header.failed_boots;
        header.flags &= !FLAG_BOOT_IN_PROGRESS;
        header.failed_boots = 0;
        self.commit_header(header)?;
        tracing::info!("Boot marked successful after {} failed boots", failed_boots);
        Ok(failed_boots)
    }
}
