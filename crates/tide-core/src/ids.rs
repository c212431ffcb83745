//! ID prefix constants.
//!
//! Generated ids have the shape `{prefix}-{16 hex chars}`, e.g. `brf-3f9a0c1de4b27a55`.

/// Stored briefings.
pub const PREFIX_BRIEFING: &str = "brf";

/// Pipeline run lease holders.
pub const PREFIX_RUN: &str = "run";

/// Every prefix the workspace generates ids for.
pub const ALL_PREFIXES: &[&str] = &[PREFIX_BRIEFING, PREFIX_RUN];
