//! # bootinfo
//!
//! A small, crash-resilient store for boot variables, kept on raw storage
//! outside any filesystem:
//! - Two redundant copies at fixed device offsets
//! - CRC-32 checksums and a wrapping serial number to find the current copy
//! - Commits only ever write the inactive copy
//! - Boot-in-progress flag and failed-boot counter for failover decisions
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  BootInfo (open context)                     │
//! │        lock → write-enable → discover → use → commit         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Discovery  │          │   VarList   │
//!   │ (select A/B)│          │(parse/pack) │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────────────────────────────┐
//!   │      Copy Format (header + CRC)      │
//!   └──────────────────┬──────────────────┘
//!                      ▼
//!   ┌─────────────────────────────────────┐
//!   │  Block Device (copy A │ copy B)      │
//!   └─────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use bootinfo::{BootInfo, Config, OpenFlags};
//!
//! let config = Config::default();
//! let mut ctx = BootInfo::open(&config, OpenFlags::READ_WRITE)?;
//! ctx.set("hostname", Some("device-7"))?;
//! ctx.commit()?;
//! ctx.close();
//! # Ok::<(), bootinfo::BootinfoError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod device;
pub mod format;
pub mod vars;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BootinfoError, Result};
pub use config::{Config, WriteProtectMode};
pub use store::{BootInfo, OpenFlags};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of bootinfo
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
