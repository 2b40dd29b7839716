//! Boot info context
//!
//! An open store: the device handle, both copy buffers, the decoded header
//! of the current copy and the live variable list.

use crate::config::Config;
use crate::device::{locate, open_block_device, BlockDevice, StoreLock, WriteEnableGuard};
use crate::error::{BootinfoError, Result};
use crate::format::{decode_header, seal, Header, Layout, Slot, BLOCK_SIZE, HEADER_SIZE};
use crate::vars::{self, VarList};

use super::discovery::{discover, select_current, Discovery};

/// How a context is opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenFlags {
    /// Open for reading only; no commits are allowed
    pub read_only: bool,
    /// Reinitialize the store even if a valid copy exists
    pub force_init: bool,
}

impl OpenFlags {
    pub const READ_WRITE: OpenFlags = OpenFlags {
        read_only: false,
        force_init: false,
    };

    pub const READ_ONLY: OpenFlags = OpenFlags {
        read_only: true,
        force_init: false,
    };

    pub const FORCE_INIT: OpenFlags = OpenFlags {
        read_only: false,
        force_init: true,
    };

    fn validate(self) -> Result<()> {
        if self.read_only && self.force_init {
            return Err(BootinfoError::InvalidArgument(
                "read-only and force-init are mutually exclusive".to_string(),
            ));
        }
        Ok(())
    }
}

/// An open boot info store
///
/// ## Lifecycle
/// - `open()` locks the store, write-enables the device for writers, then
///   discovers the current copy (initializing the store when a writer finds
///   none, or when asked to)
/// - variable and counter changes stay in memory until `commit()`
/// - dropping or `close()` protects the device again and releases the lock
///
/// A copy whose variable region fails to parse still opens, but degraded:
/// the variables read before the damage are visible and the context is
/// read-only until reopened.
pub struct BootInfo {
    device: Box<dyn BlockDevice + Send>,
    layout: Layout,
    read_only: bool,
    degraded: bool,
    copies: [Box<[u8]>; 2],
    current: Option<Slot>,
    /// Header of the current copy, including uncommitted counter changes
    header: Header,
    vars: VarList,
    // Dropped after the device handle
    write_guard: Option<WriteEnableGuard>,
    lock: Option<StoreLock>,
}

impl BootInfo {
    /// Open the store on the configured device
    pub fn open(config: &Config, flags: OpenFlags) -> Result<Self> {
        flags.validate()?;
        let layout = config.layout()?;
        let path = locate(&config.device_paths)?;

        let lock = StoreLock::acquire(&config.lock_dir, !flags.read_only)?;
        let write_guard = (!flags.read_only)
            .then(|| WriteEnableGuard::enable(config.write_protect.toggler(), &path));

        let device = open_block_device(&path, flags.read_only)?;
        let mut ctx = Self::open_inner(
            Box::new(device),
            layout,
            config.verify_header_checksum,
            flags,
        )?;

        ctx.lock = Some(lock);
        ctx.write_guard = match write_guard {
            Some(guard) if ctx.read_only => {
                guard.release();
                None
            }
            other => other,
        };

        tracing::debug!(
            "Opened boot info on {} ({})",
            path.display(),
            if ctx.read_only { "read-only" } else { "read-write" }
        );
        Ok(ctx)
    }

    /// Open the store on an already-open device.
    ///
    /// Skips device lookup, locking and the write-protect toggle; the caller
    /// is responsible for exclusive access.
    pub fn open_device(
        device: Box<dyn BlockDevice + Send>,
        config: &Config,
        flags: OpenFlags,
    ) -> Result<Self> {
        flags.validate()?;
        let layout = config.layout()?;
        Self::open_inner(device, layout, config.verify_header_checksum, flags)
    }

    fn open_inner(
        mut device: Box<dyn BlockDevice + Send>,
        layout: Layout,
        verify_header_checksum: bool,
        flags: OpenFlags,
    ) -> Result<Self> {
        let found = discover(device.as_mut(), &layout, verify_header_checksum);
        let ctx = Self::from_discovery(device, layout, flags.read_only, found);

        let current = ctx.current;
        match current {
            None if flags.read_only => Err(BootinfoError::NoValidStore),
            Some(_) if !flags.force_init => Ok(ctx),
            _ => ctx.initialize(),
        }
    }

    fn from_discovery(
        device: Box<dyn BlockDevice + Send>,
        layout: Layout,
        read_only: bool,
        found: Discovery,
    ) -> Self {
        let mut ctx = Self {
            device,
            layout,
            read_only,
            degraded: false,
            copies: found.copies,
            current: found.current,
            header: Header::default(),
            vars: VarList::new(),
            write_guard: None,
            lock: None,
        };

        if let Some(slot) = found.current {
            ctx.header = found.headers[slot.index()].unwrap_or_default();
            let region = &ctx.copies[slot.index()][layout.var_range()];
            let (vars, err) = vars::parse_lossy(region);
            ctx.vars = vars;
            if let Some(err) = err {
                tracing::warn!("Copy {} variables unreadable, opening read-only: {}", slot, err);
                ctx.degraded = true;
                ctx.read_only = true;
            }
        }
        ctx
    }

    /// Blank both copies and write a fresh one, keeping `_`-prefixed
    /// variables from the current copy.
    fn initialize(mut self) -> Result<Self> {
        let preserved = self.vars.preserved();
        tracing::info!(
            "Initializing boot info store ({} variables preserved)",
            preserved.len()
        );

        let blank = vec![0u8; self.layout.copy_size()];
        for slot in Slot::ALL {
            self.device
                .write_region(self.layout.offset(slot), &blank[..BLOCK_SIZE])?;
            self.device
                .write_region(self.layout.extension_offset(slot), &blank[BLOCK_SIZE..])?;
        }

        for copy in self.copies.iter_mut() {
            copy.fill(0);
        }
        self.current = None;
        self.header = Header::default();
        self.vars = preserved;
        self.read_only = false;
        self.degraded = false;

        if let Err(e) = self.commit() {
            tracing::error!("Both copies blanked but initial commit failed: {}", e);
            return Err(BootinfoError::StoreIndeterminate(Box::new(e)));
        }
        Ok(self)
    }

    // =========================================================================
    // Update Protocol
    // =========================================================================

    /// Write the in-memory state to the inactive copy.
    ///
    /// The current copy is never touched, so a failure at any point leaves
    /// it as the copy the next discovery will pick.
    pub fn commit(&mut self) -> Result<()> {
        if self.read_only {
            return Err(BootinfoError::ReadOnly);
        }
        let target = self.current.map_or(Slot::A, Slot::other);
        let header = Header::new(
            self.header.flags,
            self.header.failed_boots,
            self.header.serial.wrapping_add(1),
            self.layout.extension_sectors(),
        );

        let stale_wins = self.stale_header_outranks(target);

        let copy = &mut self.copies[target.index()];
        let mut last_seen = [0u8; HEADER_SIZE];
        last_seen.copy_from_slice(&copy[..HEADER_SIZE]);
        copy.fill(0);
        if let Err(e) = vars::pack(&self.vars, &mut copy[self.layout.var_range()]) {
            // The device was not touched; keep what it holds for the next attempt
            copy[..HEADER_SIZE].copy_from_slice(&last_seen);
            return Err(e);
        }
        let sealed = seal(&header, copy);

        if stale_wins {
            tracing::debug!("Clearing stale header of copy {} before commit", target);
            self.device
                .write_region(self.layout.offset(target), &[0u8; BLOCK_SIZE])?;
        }

        // Extension first: until the header block lands, the target carries a
        // header that loses to the current copy and cannot win discovery.
        self.device
            .write_region(self.layout.extension_offset(target), &copy[BLOCK_SIZE..])?;
        self.device
            .write_region(self.layout.offset(target), &copy[..BLOCK_SIZE])?;

        tracing::debug!(
            "Committed copy {} (serial {}, {} variables)",
            target,
            sealed.serial,
            self.vars.len()
        );
        self.current = Some(target);
        self.header = sealed;
        Ok(())
    }

    /// Whether the header last seen in `target` would be picked over the
    /// current copy if paired with a freshly written extension
    fn stale_header_outranks(&self, target: Slot) -> bool {
        let Some(current) = self.current else {
            return false;
        };
        let Ok(stale) = decode_header(&self.copies[target.index()]) else {
            return false;
        };
        let mut serials = [None, None];
        serials[current.index()] = Some(self.header.serial);
        serials[target.index()] = Some(stale.serial);
        select_current(serials) == Some(target)
    }

    /// Commit with a changed header, keeping the old header if the commit fails
    pub(super) fn commit_header(&mut self, header: Header) -> Result<()> {
        if self.read_only {
            return Err(BootinfoError::ReadOnly);
        }
        let previous = std::mem::replace(&mut self.header, header);
        self.commit().map_err(|e| {
            self.header = previous;
            e
        })
    }

    /// Release the device, write protection and lock
    pub fn close(self) {
        drop(self);
    }

    // =========================================================================
    // Variables
    // =========================================================================

    /// Look up a variable by exact name
    pub fn get(&self, name: &str) -> Result<&str> {
        self.vars
            .get(name)
            .ok_or_else(|| BootinfoError::NotFound(name.to_string()))
    }

    /// Set a variable, or delete it when `value` is `None` or empty.
    ///
    /// Only the in-memory list changes; call [`commit`](Self::commit) to
    /// persist.
    pub fn set(&mut self, name: &str, value: Option<&str>) -> Result<()> {
        if self.read_only {
            return Err(BootinfoError::ReadOnly);
        }
        self.vars.set(name, value, self.layout.max_value_size())
    }

    /// Delete a variable
    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.set(name, None)
    }

    /// Iterate over `(name, value)` pairs in stored order
    pub fn vars(&self) -> vars::Iter<'_> {
        self.vars.iter()
    }

    /// Packed bytes used by all variables
    pub fn varsize(&self) -> usize {
        self.vars.varsize()
    }

    /// Largest total packed size the variables may reach
    pub fn max_value_size(&self) -> usize {
        self.layout.max_value_size()
    }

    // =========================================================================
    // Header Queries
    // =========================================================================

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn is_in_progress(&self) -> bool {
        self.header.boot_in_progress()
    }

    pub fn version(&self) -> u16 {
        self.header.version
    }

    pub fn failed_boot_count(&self) -> u8 {
        self.header.failed_boots
    }

    pub fn extension_sectors(&self) -> u16 {
        self.header.extension_sectors
    }

    pub fn generation(&self) -> u8 {
        self.header.serial
    }

    pub fn current_slot(&self) -> Option<Slot> {
        self.current
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether the current copy's variables failed to parse
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}
