pub mod archive;
pub mod dispatch;
pub mod get;
pub mod ingest;
pub mod latest;
pub mod run;
