//! Pipeline stages and their fixed-order orchestration.

pub mod orchestrator;
pub mod stage;

pub use orchestrator::{Orchestrator, PipelineError, RunSummary, StageSelection};
pub use stage::{parse_reply, GenerationStage, ParsedReply, StageKind, StageReport};
