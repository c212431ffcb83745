//! Repository modules implementing storage operations for Tidings.
//!
//! Each module adds methods to `TideDb` via `impl TideDb` blocks.

pub mod briefing;
pub mod document;
pub mod lease;
