//! Error types for bootinfo
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using BootinfoError
pub type Result<T> = std::result::Result<T, BootinfoError>;

/// Unified error type for bootinfo operations
#[derive(Debug, Error)]
pub enum BootinfoError {
    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Store is read-only")]
    ReadOnly,

    #[error("Variable not found: {0}")]
    NotFound(String),

    #[error("Size exceeded: {0}")]
    SizeExceeded(String),

    // -------------------------------------------------------------------------
    // Device Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No storage device found (tried {0:?})")]
    DeviceNotFound(Vec<PathBuf>),

    #[error("Store lock is held by another process: {0}")]
    LockContended(PathBuf),

    // -------------------------------------------------------------------------
    // Store State Errors
    // -------------------------------------------------------------------------
    #[error("No valid boot info copy found")]
    NoValidStore,

    #[error("Variable region malformed: {0}")]
    Parse(String),

    /// Both copies were blanked during initialization but the fresh copy
    /// could not be written. The store has no valid copy until the next
    /// successful initialization.
    #[error("Store indeterminate after failed initialization: {0}")]
    StoreIndeterminate(#[source] Box<BootinfoError>),
}
