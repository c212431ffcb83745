//! # tide-pipeline
//!
//! Incremental map-reduce pipeline that turns a window of newsletters into a
//! stored intelligence briefing.
//!
//! Flow per run: [`window`] resolves the `(start, end]` interval, [`map`]
//! extracts one Insight per document, [`reduce`] synthesizes a draft
//! briefing (with [`repair`] for broken output), [`verify`] recomputes
//! cluster sentiment from the cited insights, [`validate`] records contract
//! violations, and [`run`] ties it together under a single-flight lease.

pub mod error;
pub mod map;
pub mod ports;
pub mod reduce;
pub mod repair;
pub mod run;
pub mod text;
pub mod validate;
pub mod verify;
pub mod window;

pub use error::PipelineError;
pub use ports::{BriefingStore, DocumentSource};
pub use run::{BriefingPipeline, PIPELINE_LEASE, PipelineSettings};
pub use validate::ContractPolicy;
pub use window::{RunOptions, TimeWindow, WindowSource};
