//! # tide-core
//!
//! Core types, ID prefixes, and error types for Tidings.
//!
//! This crate provides the foundational types shared across all Tidings crates:
//! - Entity structs for the briefing domain (documents, insights, clusters, briefings)
//! - Sentiment enums and their lenient parsers
//! - ID prefix constants
//! - Cross-cutting error types

pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
