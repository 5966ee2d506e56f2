// file: src/pipeline/mod.rs
// description: module declarations for pipeline orchestration

pub mod orchestrator;
pub mod summary;

pub use orchestrator::{PipelineOrchestrator, RunOptions};
pub use summary::{FailureRecord, IngestSummary};
