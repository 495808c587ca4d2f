//! Execution layer: per-category inference, the worker barrier and report
//! assembly.

pub mod assembler;
pub mod orchestrator;
pub mod pipeline;
pub mod progress_layer;
pub mod prompt;
pub mod retry;

pub use assembler::PersonaAssembler;
pub use orchestrator::InferenceOrchestrator;
pub use pipeline::PersonaPipeline;
pub use progress_layer::{PipelineEvent, PipelineEventLayer};
pub use prompt::PromptBuilder;
pub use retry::{RetryFailure, RetryPolicy};
