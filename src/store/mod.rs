//! Store Module
//!
//! The boot info store proper, built on the copy format and variable list.
//!
//! ## Responsibilities
//! - Discover and validate both copies, pick the current one
//! - Initialize the store when no copy is valid (or when forced)
//! - Commit changes to the inactive copy only
//! - Track boot progress and failed boots
//!
//! ## Update Protocol
//! ```text
//!   current = A (serial n)          current = B (serial n+1)
//! ┌───────────┬───────────┐       ┌───────────┬───────────┐
//! │  A: n     │  B: n-1   │ ────► │  A: n     │  B: n+1   │
//! └───────────┴───────────┘       └───────────┴───────────┘
//!                  ▲ commit writes here; A stays as fallback
//! ```

mod context;
mod discovery;
mod progress;

pub use context::{BootInfo, OpenFlags};
pub use discovery::{discover, select_current, validate_copy, CopyRejection, Discovery};
