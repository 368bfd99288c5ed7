//! Human-review checkpoint.
//!
//! After planning, the run can suspend so a person inspects the plan. The
//! checkpoint is an explicit JSON snapshot written to disk, so a resume can
//! happen from a different process days later; there is no in-process wait
//! and no timeout.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::research::types::{ResearchPlan, ResearchState, Stage};

/// Snapshot of a run suspended at the review point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanCheckpoint {
    pub state: ResearchState,
    /// Session namespace the run was writing artifacts into; restored on
    /// resume so all artifacts of one run share a folder.
    pub namespace: String,
    pub created_at: DateTime<Utc>,
}

/// The single resume signal a suspended run accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "lowercase")]
pub enum ResumeDecision {
    /// Proceed with the plan as-is.
    Accept,
    /// Replace the plan wholesale; the payload must be valid plan JSON.
    Edit { plan_json: String },
    /// Abort further analysis.
    Ignore,
}

/// Result of applying a resume decision.
#[derive(Debug)]
pub enum ReviewOutcome {
    Proceed(ResearchState),
    Aborted(ResearchState),
}

impl PlanCheckpoint {
    pub fn new(mut state: ResearchState, namespace: impl Into<String>) -> Self {
        state.stage = Stage::AwaitingHumanReview;
        Self {
            state,
            namespace: namespace.into(),
            created_at: Utc::now(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write checkpoint {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read checkpoint {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("checkpoint {} is not valid JSON", path.display()))
    }

    /// Apply the external actor's decision. An edit replaces the plan
    /// object entirely (no merge); an unparseable replacement is an error
    /// and the checkpoint stays usable.
    pub fn apply(self, decision: ResumeDecision) -> Result<ReviewOutcome> {
        let mut state = self.state;
        match decision {
            ResumeDecision::Accept => {
                state.stage = Stage::Analyzing;
                Ok(ReviewOutcome::Proceed(state))
            }
            ResumeDecision::Edit { plan_json } => {
                let plan: ResearchPlan = serde_json::from_str(&plan_json)
                    .context("replacement plan is not valid plan JSON")?;
                state.plan = plan;
                state.push_assistant_message("研究计划已按人工审核结果替换。");
                state.stage = Stage::Analyzing;
                Ok(ReviewOutcome::Proceed(state))
            }
            ResumeDecision::Ignore => {
                state.push_assistant_message("人工审核选择忽略，停止后续分析。");
                state.stage = Stage::Done;
                Ok(ReviewOutcome::Aborted(state))
            }
        }
    }
}
