//! Research workflow module.
//!
//! The workflow walks a fixed set of stages: plan the investigation, pause
//! for an optional human review of the plan, execute the plan against the
//! analytics backend, write the final report, and augment its tables with
//! rendered charts. State accumulates in [`types::ResearchState`] and is
//! threaded through every stage.

pub mod analyze;
pub mod plan;
pub mod report;
pub mod review;
pub mod types;
pub mod workflow;

// Re-export commonly used types
pub use review::{PlanCheckpoint, ResumeDecision};
pub use types::{ResearchPlan, ResearchState, Stage, StepAnalysis, StepSpec};
pub use workflow::{ResearchWorkflow, RunOutcome, WorkflowOptions};
